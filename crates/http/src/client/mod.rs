//! Ballot HTTP client
//!
//! [`Gateway`] talks to a single backend. It carries the voter and admin
//! session tokens as default headers and, when the backend rejects them
//! with a 401, logs out the affected sessions and sends the UI back to the
//! matching login page before handing the error back to the caller.

pub mod config;
pub mod error;
pub mod session;

pub use config::GatewayConfig;
pub use error::ClientError;
pub use session::{CredentialSlot, ExpiryPolicy, Navigator, SessionGuard, SessionStore};

use arc_swap::ArcSwap;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::{Client, ClientBuilder, Method, RequestBuilder, Response};
use session::ExpiryHandler;
use std::sync::Arc;
use std::time::Duration;

/// Authenticated client for the ballot backend.
///
/// Clones share the same default headers, so a token set through one clone
/// is sent by every other.
#[derive(Clone)]
pub struct Gateway {
    client: Client,
    base_url: String,
    headers: Arc<ArcSwap<HeaderMap>>,
    expiry: ExpiryHandler,
}

impl Gateway {
    /// Create a gateway for `base_url` with no session guards
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Configuration`] for an empty base URL, or
    /// [`ClientError::Request`] if the HTTP client cannot be built.
    pub fn new(base_url: impl Into<String>) -> Result<Self, ClientError> {
        Self::builder().base_url(base_url).build()
    }

    /// Create a new gateway builder
    pub fn builder() -> GatewayBuilder {
        GatewayBuilder::default()
    }

    /// Get the base URL
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Set or clear the voter session token
    ///
    /// # Errors
    ///
    /// See [`Gateway::set_token`].
    pub fn set_user_token(&self, token: Option<&str>) -> Result<(), ClientError> {
        self.set_token(CredentialSlot::User, token)
    }

    /// Set or clear the admin session token
    ///
    /// # Errors
    ///
    /// See [`Gateway::set_token`].
    pub fn set_admin_token(&self, token: Option<&str>) -> Result<(), ClientError> {
        self.set_token(CredentialSlot::Admin, token)
    }

    /// Set the default header for `slot`, or remove it when `token` is
    /// absent or empty.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::InvalidToken`] if the token is not a legal
    /// header value; the slot keeps its previous token in that case.
    pub fn set_token(&self, slot: CredentialSlot, token: Option<&str>) -> Result<(), ClientError> {
        let name = HeaderName::from_static(slot.header_name());
        let value = match token.filter(|t| !t.is_empty()) {
            Some(token) => {
                let mut value =
                    HeaderValue::from_str(token).map_err(|e| ClientError::InvalidToken {
                        header: slot.header_name(),
                        reason: e.to_string(),
                    })?;
                value.set_sensitive(true);
                Some(value)
            }
            None => None,
        };

        self.headers.rcu(|current| {
            let mut headers = HeaderMap::clone(current);
            match &value {
                Some(value) => {
                    headers.insert(name.clone(), value.clone());
                }
                None => {
                    headers.remove(&name);
                }
            }
            headers
        });

        tracing::debug!(%slot, present = value.is_some(), "Updated session token");
        Ok(())
    }

    /// Snapshot of the headers merged into every request
    pub fn default_headers(&self) -> HeaderMap {
        HeaderMap::clone(&self.headers.load())
    }

    /// Resolve `path` against the base URL
    pub fn url(&self, path: &str) -> String {
        if is_absolute(path) {
            return path.to_string();
        }
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    /// Create a request builder for `path`
    pub fn request(&self, method: Method, path: &str) -> RequestBuilder {
        self.client.request(method, self.url(path))
    }

    /// Create a GET request builder for `path`
    pub fn get(&self, path: &str) -> RequestBuilder {
        self.request(Method::GET, path)
    }

    /// Create a POST request builder for `path`
    pub fn post(&self, path: &str) -> RequestBuilder {
        self.request(Method::POST, path)
    }

    /// Create a PUT request builder for `path`
    pub fn put(&self, path: &str) -> RequestBuilder {
        self.request(Method::PUT, path)
    }

    /// Create a PATCH request builder for `path`
    pub fn patch(&self, path: &str) -> RequestBuilder {
        self.request(Method::PATCH, path)
    }

    /// Create a DELETE request builder for `path`
    pub fn delete(&self, path: &str) -> RequestBuilder {
        self.request(Method::DELETE, path)
    }

    /// Send a request with the session headers attached.
    ///
    /// Headers already set on `request` win over the defaults. A 2xx
    /// response is returned untouched; any other status becomes an error.
    /// A 401 first expires the authenticated sessions, then the error is
    /// still returned.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Request`] for transport failures and the
    /// status-specific variant from [`ClientError::from_status`] for any
    /// non-2xx response.
    pub async fn dispatch(&self, request: RequestBuilder) -> Result<Response, ClientError> {
        let mut request = request.build()?;

        let defaults = self.headers.load_full();
        let headers = request.headers_mut();
        for (name, value) in defaults.iter() {
            if !headers.contains_key(name) {
                headers.insert(name.clone(), value.clone());
            }
        }

        tracing::debug!(method = %request.method(), url = %request.url(), "Dispatching request");

        let response = self.client.execute(request).await?;
        let status = response.status();

        if status.is_success() {
            return Ok(response);
        }

        let message = response.text().await.unwrap_or_else(|_| status.to_string());
        let error = ClientError::from_status(status, message);
        if error.is_auth_expired() {
            self.expiry.expire_sessions();
        }
        Err(error)
    }

    /// Dispatch a request and decode the JSON response body
    ///
    /// # Errors
    ///
    /// Everything [`Gateway::dispatch`] returns, plus
    /// [`ClientError::Serialization`] when the body is not the expected JSON.
    pub async fn execute<T: serde::de::DeserializeOwned>(
        &self,
        request: RequestBuilder,
    ) -> Result<T, ClientError> {
        let response = self.dispatch(request).await?;
        let body = response.bytes().await?;
        Ok(serde_json::from_slice(&body)?)
    }
}

impl std::fmt::Debug for Gateway {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Gateway")
            .field("base_url", &self.base_url)
            .field("headers", &self.default_headers())
            .field("expiry", &self.expiry)
            .finish_non_exhaustive()
    }
}

fn is_absolute(path: &str) -> bool {
    url::Url::parse(path).is_ok_and(|url| matches!(url.scheme(), "http" | "https"))
}

/// Builder for [`Gateway`]
#[derive(Default)]
pub struct GatewayBuilder {
    config: GatewayConfig,
    guards: Vec<SessionGuard>,
    navigator: Option<Arc<dyn Navigator>>,
    policy: ExpiryPolicy,
}

impl GatewayBuilder {
    /// Replace the whole configuration, e.g. with [`GatewayConfig::load`]
    pub fn config(mut self, config: GatewayConfig) -> Self {
        self.config = config;
        self
    }

    /// Set the base URL
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.config.api_base = url.into();
        self
    }

    /// Set the request timeout
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.config.timeout_secs = Some(timeout.as_secs().max(1));
        self
    }

    /// Set the user agent
    pub fn user_agent(mut self, agent: impl Into<String>) -> Self {
        self.config.user_agent = agent.into();
        self
    }

    /// Register a session to expire when the backend answers 401.
    ///
    /// Guards are consulted in registration order.
    pub fn guard(mut self, slot: CredentialSlot, store: Arc<dyn SessionStore>) -> Self {
        self.guards.push(SessionGuard::new(slot, store));
        self
    }

    /// Router used to reach the login pages
    pub fn navigator(mut self, navigator: Arc<dyn Navigator>) -> Self {
        self.navigator = Some(navigator);
        self
    }

    /// Choose which sessions a single 401 expires
    pub fn expiry_policy(mut self, policy: ExpiryPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Build the gateway
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Configuration`] if the configuration fails
    /// [`GatewayConfig::validate`], or [`ClientError::Request`] if the HTTP
    /// client cannot be built (e.g. an invalid user agent).
    pub fn build(self) -> Result<Gateway, ClientError> {
        self.config.validate()?;

        let base_url = self.config.api_base.trim_end_matches('/').to_string();

        let mut client_builder = ClientBuilder::new().user_agent(self.config.user_agent.clone());
        if let Some(timeout) = self.config.timeout() {
            client_builder = client_builder.timeout(timeout);
        }
        let client = client_builder.build()?;

        Ok(Gateway {
            client,
            base_url,
            headers: Arc::new(ArcSwap::from_pointee(HeaderMap::new())),
            expiry: ExpiryHandler::new(self.guards, self.navigator, self.policy),
        })
    }
}
