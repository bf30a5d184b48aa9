//! Fixed-interval polling of consumption and invoice figures.
//!
//! Each cycle runs the full token + login handshake before reading, so a
//! session that went stale since the previous cycle heals on its own. A cycle
//! that fails for a transient reason is retried at the next interval;
//! rejected credentials stop the loop, since retrying cannot succeed until
//! the user re-enters them.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::{mpsc, watch};
use tracing::{debug, warn};

use crate::client::AgurClient;
use crate::error::Error;
use crate::provider;

/// Figures produced by one polling cycle.
///
/// A field is `None` when it could not be read this cycle (transient
/// connection failure) or, for the invoice, when no bill exists yet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WaterData {
    pub consumption: Option<f64>,
    pub last_invoice: Option<f64>,
}

/// How a failed cycle should be handled.
#[derive(Debug, Error)]
pub enum PollError {
    /// The provider rejected the credentials; polling cannot recover until
    /// they are re-entered.
    #[error("authentication failed, credentials must be re-entered: {0}")]
    AuthFailed(#[source] Error),

    /// Anything else; the next scheduled cycle will try again.
    #[error("update failed, will retry at the next interval: {0}")]
    Retryable(#[source] Error),
}

/// Polls one contract on a fixed interval.
pub struct Poller {
    client: AgurClient,
    email: String,
    password: String,
    contract_id: String,
    interval: Duration,
}

impl Poller {
    pub fn new(
        client: AgurClient,
        email: impl Into<String>,
        password: impl Into<String>,
        contract_id: impl Into<String>,
    ) -> Self {
        Self {
            client,
            email: email.into(),
            password: password.into(),
            contract_id: contract_id.into(),
            interval: provider::DEFAULT_SCAN_INTERVAL,
        }
    }

    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    /// Run one complete auth + fetch cycle.
    ///
    /// The handshake must succeed; an individual read that fails with a
    /// connection error only blanks its own field, matching the behavior of
    /// a dashboard that keeps its other tiles when one fails to refresh.
    pub async fn poll_once(&self) -> Result<WaterData, PollError> {
        debug!("refreshing the Agur session");
        self.client
            .generate_temporary_token()
            .await
            .map_err(classify)?;
        self.client
            .login(&self.email, &self.password)
            .await
            .map_err(classify)?;

        let consumption = match self.client.consumption(&self.contract_id).await {
            Ok(index) => Some(index),
            Err(err @ Error::Connection(_)) => {
                warn!(error = %err, "could not read the consumption index");
                None
            }
            Err(err) => return Err(classify(err)),
        };

        let last_invoice = match self.client.last_invoice(&self.contract_id).await {
            Ok(amount) => Some(amount),
            Err(Error::NoBill) => None,
            Err(err @ Error::Connection(_)) => {
                warn!(error = %err, "could not read the last invoice");
                None
            }
            Err(err) => return Err(classify(err)),
        };

        Ok(WaterData {
            consumption,
            last_invoice,
        })
    }

    /// Poll on the configured interval until shut down.
    ///
    /// Polls once immediately, then at each interval tick. Successful cycles
    /// are delivered on `data`; retryable failures are logged and skipped.
    /// Returns when `shutdown` fires or the receiver is dropped, or with
    /// [`PollError::AuthFailed`] when the credentials are rejected.
    pub async fn run(
        &self,
        data: mpsc::Sender<WaterData>,
        mut shutdown: watch::Receiver<bool>,
    ) -> Result<(), PollError> {
        let mut ticker = tokio::time::interval(self.interval);
        loop {
            tokio::select! {
                _ = ticker.tick() => match self.poll_once().await {
                    Ok(figures) => {
                        if data.send(figures).await.is_err() {
                            return Ok(());
                        }
                    }
                    Err(err @ PollError::AuthFailed(_)) => return Err(err),
                    Err(PollError::Retryable(err)) => {
                        warn!(error = %err, "polling cycle failed");
                    }
                },
                _ = shutdown.changed() => return Ok(()),
            }
        }
    }
}

fn classify(err: Error) -> PollError {
    match err {
        Error::Unauthorized => PollError::AuthFailed(Error::Unauthorized),
        other => PollError::Retryable(other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unauthorized_is_fatal_everything_else_retries() {
        assert!(matches!(
            classify(Error::Unauthorized),
            PollError::AuthFailed(_)
        ));
        assert!(matches!(
            classify(Error::InvalidSession),
            PollError::Retryable(Error::InvalidSession)
        ));
        assert!(matches!(
            classify(Error::Api {
                status: 503,
                body: serde_json::json!({ "message": "maintenance" }),
            }),
            PollError::Retryable(Error::Api { status: 503, .. })
        ));
    }
}
