use serde_json::{json, Value};
use thiserror::Error;

/// Unified error type for the Agur API client.
///
/// Callers are expected to pattern-match on the variants rather than inspect
/// message strings: the polling layer treats [`Error::Unauthorized`] as fatal
/// until credentials are re-entered and everything else as retryable.
#[derive(Debug, Error)]
pub enum Error {
    /// Timeout or transport-level failure while talking to the API.
    #[error("error communicating with the Agur API: {0}")]
    Connection(#[from] reqwest::Error),

    /// The provider rejected the user credentials (HTTP 401 on login).
    #[error("invalid credentials for the Agur API")]
    Unauthorized,

    /// The session token is stale or invalid; a fresh token + login cycle is
    /// needed, as opposed to re-entering credentials.
    #[error("the Agur API session is no longer valid")]
    InvalidSession,

    /// The queried invoice field was absent or null. Distinct from a zero
    /// amount due: there is no bill to report yet.
    #[error("no bill is available for this contract")]
    NoBill,

    /// Any other non-2xx response or unexpected body shape, carrying the
    /// status and decoded body for diagnostics.
    #[error("Agur API error (HTTP {status}): {body}")]
    Api { status: u16, body: Value },

    /// Invalid client configuration (bad host, base path, or HTTP setup).
    #[error("configuration error: {0}")]
    Configuration(String),
}

impl Error {
    /// A 2xx response whose body lacks the field the operation needs.
    pub(crate) fn missing_field(field: &str, body: &Value) -> Self {
        Error::Api {
            status: 200,
            body: json!({
                "message": format!("expected `{field}` in the response body"),
                "body": body,
            }),
        }
    }
}
