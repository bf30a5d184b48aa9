//! # eau-agur-rs
//!
//! Async Rust client for the "EAU par Agur" water consumption API and other
//! white-label deployments of the same backend.
//!
//! ## Overview
//!
//! The backend requires a two-step handshake before anything can be read: a
//! pre-shared access key is exchanged for a short-lived temporary token, then
//! user credentials are exchanged for a session token. Once authenticated,
//! three read operations are available: the account's default contract
//! number, the last metered consumption index and the last invoice amount.
//!
//! [`AgurClient`] implements the handshake and the reads; [`Poller`] runs the
//! whole sequence on a fixed interval the way a home-automation integration
//! would, distinguishing credential failures (fatal until re-entry) from
//! transient ones (retried at the next interval).
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use eau_agur_rs::{AgurClient, ProviderConfig};
//!
//! #[tokio::main]
//! async fn main() -> eau_agur_rs::Result<()> {
//!     let client = AgurClient::builder()
//!         .provider(ProviderConfig::agur())
//!         .build()?;
//!
//!     client.generate_temporary_token().await?;
//!     client.login("user@example.com", "hunter2").await?;
//!
//!     let contract = client.default_contract().await?;
//!     let liters = client.consumption(&contract).await?;
//!     println!("contract {contract}: {liters} L");
//!     Ok(())
//! }
//! ```
//!
//! ## Module organization
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`client`] | API client, builder and session state |
//! | [`error`] | Closed error taxonomy callers pattern-match on |
//! | [`provider`] | Provider presets, endpoints and wire constants |
//! | [`poller`] | Fixed-interval polling of consumption and invoices |

pub mod client;
pub mod error;
pub mod poller;
pub mod provider;

pub use client::{AgurClient, AgurClientBuilder, SessionState};
pub use error::Error;
pub use poller::{PollError, Poller, WaterData};
pub use provider::ProviderConfig;

/// Result type alias for the library.
pub type Result<T> = std::result::Result<T, Error>;
