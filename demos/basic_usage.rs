//! Basic usage: authenticate and read the water figures for the default
//! contract.
//!
//! Credentials are taken from environment variables:
//! - AGUR_EMAIL
//! - AGUR_PASSWORD
//! - AGUR_PROVIDER (optional, "agur" or "grandparissud")
//!
//! Usage:
//!   AGUR_EMAIL=me@example.com AGUR_PASSWORD=secret cargo run --example basic_usage

use eau_agur_rs::{AgurClient, Error, ProviderConfig};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt::init();

    let email = std::env::var("AGUR_EMAIL")?;
    let password = std::env::var("AGUR_PASSWORD")?;
    let provider_key = std::env::var("AGUR_PROVIDER").unwrap_or_else(|_| "agur".to_string());

    let provider = ProviderConfig::from_key(&provider_key)
        .ok_or_else(|| format!("unknown provider `{provider_key}`"))?;
    println!("Provider: {}", provider.display_name);

    let client = AgurClient::builder().provider(provider).build()?;
    client.generate_temporary_token().await?;
    client.login(&email, &password).await?;

    let contract = client.default_contract().await?;
    println!("Default contract: {contract}");

    let liters = client.consumption(&contract).await?;
    println!("Last metered consumption: {liters} L");

    match client.last_invoice(&contract).await {
        Ok(amount) => println!("Last invoice: {amount} EUR"),
        Err(Error::NoBill) => println!("No bill available yet"),
        Err(err) => return Err(err.into()),
    }

    Ok(())
}
