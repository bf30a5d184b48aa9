//! Client for the Agur web API: request primitive, two-step authentication
//! and the domain read operations.

use std::sync::Arc;
use std::time::Duration;

use arc_swap::ArcSwap;
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use reqwest::Method;
use serde_json::{json, Value};
use tracing::debug;
use url::Url;

use crate::error::Error;
use crate::provider::{self, ProviderConfig};
use crate::Result;

/// Tokens held by the client, replaced as a whole on each successful auth
/// call. Both start absent and are only cleared by rebuilding the client;
/// the backend has no logout endpoint.
#[derive(Debug, Default, Clone)]
pub struct SessionState {
    /// Short-lived token obtained from the pre-shared access key.
    pub temporary_token: Option<String>,
    /// Token obtained from user login, preferred for domain reads.
    pub session_token: Option<String>,
}

impl SessionState {
    /// The token to attach to outgoing requests, if any.
    fn active_token(&self) -> Option<&str> {
        self.session_token
            .as_deref()
            .or(self.temporary_token.as_deref())
    }
}

/// Asynchronous client for one deployment of the Agur web API.
///
/// Construct with [`AgurClient::builder`]. The client holds one shared
/// [`reqwest::Client`] and the current [`SessionState`]; all methods take
/// `&self` and the session is swapped atomically, so a single instance can be
/// shared freely even though each polling cycle runs one call at a time.
pub struct AgurClient {
    http_client: reqwest::Client,
    base: Url,
    timeout: Duration,
    conversation_id: String,
    client_id: String,
    access_key: String,
    session: ArcSwap<SessionState>,
}

impl AgurClient {
    pub fn builder() -> AgurClientBuilder {
        AgurClientBuilder::new()
    }

    /// Snapshot of the current session tokens.
    pub fn session_state(&self) -> Arc<SessionState> {
        self.session.load_full()
    }

    /// Make a request to the Agur API and classify the response.
    ///
    /// Always sends the JSON content-type and conversation-id headers and,
    /// once authenticated, the token header. A 2xx JSON response yields the
    /// parsed body; a 2xx non-JSON response yields `{"message": <text>}`.
    /// The body of a response is read exactly once, either as the success
    /// value or as the error detail.
    pub async fn request(
        &self,
        uri: &str,
        method: Method,
        body: Option<&Value>,
        query: Option<&[(&str, &str)]>,
        headers: Option<&[(&str, &str)]>,
    ) -> Result<Value> {
        let url = self
            .base
            .join(uri.trim_start_matches('/'))
            .map_err(|e| Error::Configuration(format!("invalid endpoint `{uri}`: {e}")))?;

        let mut request = self
            .http_client
            .request(method, url.clone())
            .timeout(self.timeout)
            .header(CONTENT_TYPE, "application/json")
            .header(ACCEPT, "application/json")
            .header(provider::CONVERSATION_ID_HEADER, &self.conversation_id);

        if let Some(token) = self.session.load().active_token() {
            request = request.header(provider::TOKEN_HEADER, token);
        }
        if let Some(body) = body {
            request = request.json(body);
        }
        if let Some(query) = query {
            request = request.query(query);
        }
        if let Some(headers) = headers {
            for (name, value) in headers {
                request = request.header(*name, *value);
            }
        }

        debug!(%url, "sending request to the Agur API");
        let response = request.send().await.map_err(Error::Connection)?;

        let status = response.status();
        let is_json = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(|v| v.contains("application/json"))
            .unwrap_or(false);
        let text = response.text().await.map_err(Error::Connection)?;

        if status.is_client_error() || status.is_server_error() {
            let body = if is_json {
                serde_json::from_str(&text).unwrap_or_else(|_| json!({ "message": text }))
            } else {
                json!({ "message": text })
            };
            return Err(Error::Api {
                status: status.as_u16(),
                body,
            });
        }

        if is_json {
            serde_json::from_str(&text).map_err(|e| Error::Api {
                status: status.as_u16(),
                body: json!({ "message": format!("invalid JSON body: {e}") }),
            })
        } else {
            Ok(json!({ "message": text }))
        }
    }

    /// Exchange the pre-shared access key for a temporary token.
    ///
    /// Must be called before [`login`](Self::login). Any API-level failure is
    /// reported with a fixed message; the underlying status is not
    /// distinguished at this step.
    pub async fn generate_temporary_token(&self) -> Result<()> {
        let body = json!({
            "ConversationId": self.conversation_id,
            "ClientId": self.client_id,
            "AccessKey": self.access_key,
        });
        let response = self
            .request(
                provider::GENERATE_TOKEN_PATH,
                Method::POST,
                Some(&body),
                None,
                None,
            )
            .await
            .map_err(|err| match err {
                Error::Api { status, .. } => Error::Api {
                    status,
                    body: json!({ "message": "unable to generate a temporary token" }),
                },
                other => other,
            })?;

        let token = response
            .get(provider::FIELD_TEMPORARY_TOKEN)
            .and_then(Value::as_str)
            .ok_or_else(|| Error::missing_field(provider::FIELD_TEMPORARY_TOKEN, &response))?
            .to_string();

        debug!("obtained a temporary token");
        let current = self.session.load();
        self.session.store(Arc::new(SessionState {
            temporary_token: Some(token),
            session_token: current.session_token.clone(),
        }));
        Ok(())
    }

    /// Authenticate the user and store the session token.
    ///
    /// A 401 response means the credentials were rejected
    /// ([`Error::Unauthorized`]); a 400 response whose body points at the
    /// session means the temporary token went stale
    /// ([`Error::InvalidSession`]).
    pub async fn login(&self, email: &str, password: &str) -> Result<()> {
        let body = json!({
            "identifiant": email,
            "motDePasse": password,
        });
        let response = self
            .request(provider::LOGIN_PATH, Method::POST, Some(&body), None, None)
            .await
            .map_err(classify_login_error)?;

        let token = response
            .get(provider::FIELD_SESSION_TOKEN)
            .and_then(Value::as_str)
            .ok_or_else(|| Error::missing_field(provider::FIELD_SESSION_TOKEN, &response))?
            .to_string();

        debug!("authenticated against the Agur API");
        let current = self.session.load();
        self.session.store(Arc::new(SessionState {
            temporary_token: current.temporary_token.clone(),
            session_token: Some(token),
        }));
        Ok(())
    }

    /// Contract number the account is subscribed to by default.
    pub async fn default_contract(&self) -> Result<String> {
        let response = self
            .request(
                provider::GET_DEFAULT_CONTRACT_PATH,
                Method::GET,
                None,
                None,
                None,
            )
            .await?;
        response
            .get(provider::FIELD_CONTRACT_NUMBER)
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or_else(|| Error::missing_field(provider::FIELD_CONTRACT_NUMBER, &response))
    }

    /// Last metered consumption index for the contract, in liters.
    pub async fn consumption(&self, contract_id: &str) -> Result<f64> {
        let uri = format!("{}{contract_id}", provider::GET_CONSUMPTION_PATH);
        let response = self.request(&uri, Method::GET, None, None, None).await?;
        response
            .get(provider::FIELD_CONSUMPTION_INDEX)
            .and_then(Value::as_f64)
            .ok_or_else(|| Error::missing_field(provider::FIELD_CONSUMPTION_INDEX, &response))
    }

    /// Amount of the last invoice for the contract, in euros.
    ///
    /// A null or absent amount is [`Error::NoBill`]: the account has no bill
    /// yet, which is not the same thing as owing zero.
    pub async fn last_invoice(&self, contract_id: &str) -> Result<f64> {
        let uri = format!("{}{contract_id}", provider::GET_LAST_INVOICE_PATH);
        let response = self.request(&uri, Method::GET, None, None, None).await?;
        match response.get(provider::FIELD_INVOICE_AMOUNT) {
            None | Some(Value::Null) => Err(Error::NoBill),
            Some(amount) => amount
                .as_f64()
                .ok_or_else(|| Error::missing_field(provider::FIELD_INVOICE_AMOUNT, &response)),
        }
    }
}

fn classify_login_error(err: Error) -> Error {
    match err {
        Error::Api { status: 401, .. } => Error::Unauthorized,
        Error::Api { status: 400, body } if body_mentions_session(&body) => Error::InvalidSession,
        other => other,
    }
}

// The backend is inconsistent about how it reports a stale session on a 400;
// match on the message text rather than a specific error code.
fn body_mentions_session(body: &Value) -> bool {
    body.get("message")
        .and_then(Value::as_str)
        .map(|message| message.to_ascii_lowercase().contains("session"))
        .unwrap_or(false)
}

/// Builder for [`AgurClient`].
///
/// Starts from the [`ProviderConfig::agur`] preset; individual setters
/// override single fields, [`provider`](Self::provider) swaps the whole
/// preset. Supplying an external [`reqwest::Client`] reuses it as-is, which
/// is how a host application shares one connection pool across clients.
pub struct AgurClientBuilder {
    config: ProviderConfig,
    base_url_override: Option<String>,
    http_client: Option<reqwest::Client>,
}

impl AgurClientBuilder {
    pub fn new() -> Self {
        Self {
            config: ProviderConfig::agur(),
            base_url_override: None,
            http_client: None,
        }
    }

    pub fn provider(mut self, config: ProviderConfig) -> Self {
        self.config = config;
        self
    }

    pub fn host(mut self, host: impl Into<String>) -> Self {
        self.config.host = host.into();
        self
    }

    pub fn base_path(mut self, base_path: impl Into<String>) -> Self {
        self.config.base_path = base_path.into();
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.config.timeout = timeout;
        self
    }

    pub fn conversation_id(mut self, conversation_id: impl Into<String>) -> Self {
        self.config.conversation_id = conversation_id.into();
        self
    }

    pub fn client_id(mut self, client_id: impl Into<String>) -> Self {
        self.config.client_id = client_id.into();
        self
    }

    pub fn access_key(mut self, access_key: impl Into<String>) -> Self {
        self.config.access_key = access_key.into();
        self
    }

    /// Replace the `https://{host}` origin with a full URL, scheme included.
    pub fn base_url(mut self, origin: impl Into<String>) -> Self {
        self.base_url_override = Some(origin.into());
        self
    }

    pub fn http_client(mut self, http_client: reqwest::Client) -> Self {
        self.http_client = Some(http_client);
        self
    }

    pub fn build(self) -> Result<AgurClient> {
        let origin = self
            .base_url_override
            .unwrap_or_else(|| format!("https://{}", self.config.host));
        let origin = Url::parse(&origin)
            .map_err(|e| Error::Configuration(format!("invalid base URL `{origin}`: {e}")))?;

        let base = match self.config.base_path.trim_matches('/') {
            "" => origin,
            path => origin
                .join(&format!("{path}/"))
                .map_err(|e| Error::Configuration(format!("invalid base path `{path}`: {e}")))?,
        };

        let http_client = match self.http_client {
            Some(client) => client,
            None => reqwest::Client::builder()
                .build()
                .map_err(|e| Error::Configuration(format!("failed to create HTTP client: {e}")))?,
        };

        Ok(AgurClient {
            http_client,
            base,
            timeout: self.config.timeout,
            conversation_id: self.config.conversation_id,
            client_id: self.config.client_id,
            access_key: self.config.access_key,
            session: ArcSwap::from_pointee(SessionState::default()),
        })
    }
}

impl Default for AgurClientBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_joins_host_and_base_path() {
        let client = AgurClient::builder().build().unwrap();
        assert_eq!(client.base.as_str(), "https://ael.agur.fr/webapi/");

        let client = AgurClient::builder()
            .host("example.com")
            .base_path("/api/v2/")
            .build()
            .unwrap();
        assert_eq!(client.base.as_str(), "https://example.com/api/v2/");
    }

    #[test]
    fn builder_base_url_override_wins_over_host() {
        let client = AgurClient::builder()
            .host("ignored.example")
            .base_url("http://127.0.0.1:8080")
            .base_path("")
            .build()
            .unwrap();
        assert_eq!(client.base.as_str(), "http://127.0.0.1:8080/");
    }

    #[test]
    fn session_prefers_the_session_token() {
        let state = SessionState {
            temporary_token: Some("tmp".to_string()),
            session_token: Some("sess".to_string()),
        };
        assert_eq!(state.active_token(), Some("sess"));

        let state = SessionState {
            temporary_token: Some("tmp".to_string()),
            session_token: None,
        };
        assert_eq!(state.active_token(), Some("tmp"));
        assert_eq!(SessionState::default().active_token(), None);
    }

    #[test]
    fn login_errors_map_to_the_closed_set() {
        let err = classify_login_error(Error::Api {
            status: 401,
            body: serde_json::json!({ "message": "bad credentials" }),
        });
        assert!(matches!(err, Error::Unauthorized));

        let err = classify_login_error(Error::Api {
            status: 400,
            body: serde_json::json!({ "message": "La session est invalide" }),
        });
        assert!(matches!(err, Error::InvalidSession));

        let err = classify_login_error(Error::Api {
            status: 400,
            body: serde_json::json!({ "message": "champ manquant" }),
        });
        assert!(matches!(err, Error::Api { status: 400, .. }));

        let err = classify_login_error(Error::Api {
            status: 500,
            body: serde_json::json!({ "message": "session interne" }),
        });
        assert!(matches!(err, Error::Api { status: 500, .. }));
    }
}
