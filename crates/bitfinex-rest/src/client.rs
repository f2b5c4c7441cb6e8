//! Main REST client implementation

use crate::error::{RestError, RestResult};
use bitfinex_auth::{Credentials, SignedHeaders, Signer};
use reqwest::{Client, Method, RequestBuilder};
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use std::time::Duration;
use tracing::{debug, info, instrument, warn};

/// Base URL of the public v2 API
pub const PUBLIC_BASE_URL: &str = "https://api-pub.bitfinex.com/v2/";
/// Base URL of the authenticated API (both versions)
pub const AUTH_BASE_URL: &str = "https://api.bitfinex.com/";

/// Default request timeout
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Client configuration
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Base URL for public endpoints
    pub public_url: String,
    /// Base URL for signed endpoints
    pub auth_url: String,
    /// Request timeout
    pub timeout: Duration,
    /// Custom user agent
    pub user_agent: Option<String>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            public_url: PUBLIC_BASE_URL.to_string(),
            auth_url: AUTH_BASE_URL.to_string(),
            timeout: DEFAULT_TIMEOUT,
            user_agent: None,
        }
    }
}

impl ClientConfig {
    /// Create a new configuration builder
    pub fn new() -> Self {
        Self::default()
    }

    /// Set both base URLs (test servers, proxies)
    pub fn with_base_urls(
        mut self,
        public_url: impl Into<String>,
        auth_url: impl Into<String>,
    ) -> Self {
        self.public_url = public_url.into();
        self.auth_url = auth_url.into();
        self
    }

    /// Set timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set user agent
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = Some(user_agent.into());
        self
    }
}

/// Bitfinex REST client
///
/// Public endpoints need nothing; signed ones need credentials on the
/// signer and fail with [`AuthError::CredentialsNotSet`](bitfinex_auth::AuthError)
/// otherwise.
///
/// # Example
///
/// ```no_run
/// use bitfinex_rest::RestClient;
/// use bitfinex_auth::Credentials;
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let client = RestClient::new()?.with_credentials(Credentials::from_env()?);
///
///     let tickers = client.tickers(&["tBTCUSD"]).await?;
///     let wallets = client.wallets().await?;
///
///     println!("{} tickers, {} wallets", tickers.len(), wallets.len());
///     Ok(())
/// }
/// ```
#[derive(Clone)]
pub struct RestClient {
    http: Client,
    config: ClientConfig,
    signer: Signer,
}

impl RestClient {
    /// Create a client with default configuration
    pub fn new() -> RestResult<Self> {
        Self::with_config(ClientConfig::default())
    }

    /// Create a client with custom configuration
    pub fn with_config(config: ClientConfig) -> RestResult<Self> {
        let http = Client::builder()
            .timeout(config.timeout)
            .user_agent(config.user_agent.as_deref().unwrap_or(concat!(
                "bitfinex-rest/",
                env!("CARGO_PKG_VERSION")
            )))
            .build()?;

        info!(public = %config.public_url, auth = %config.auth_url, "Created Bitfinex REST client");

        Ok(Self {
            http,
            config,
            signer: Signer::new(),
        })
    }

    /// Use a configured signer (credentials, nonce source)
    pub fn with_signer(mut self, signer: Signer) -> Self {
        self.signer = signer;
        self
    }

    /// Set credentials for signed endpoints
    pub fn with_credentials(mut self, credentials: Credentials) -> Self {
        self.signer.set_credentials(credentials);
        self
    }

    /// Check if the client has credentials for signed endpoints
    pub fn has_credentials(&self) -> bool {
        self.signer.has_credentials()
    }

    /// Get the configuration
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    // ========================================================================
    // Request Builders
    // ========================================================================

    /// Unsigned GET against the public API
    pub fn public_request(&self, path: &str) -> RequestBuilder {
        self.http.get(join(&self.config.public_url, path))
    }

    /// v2 signed POST (`bfx-*` headers over `/api/v2/<path>` + nonce + body)
    pub fn v2_request(&self, path: &str, body: &Value) -> RestResult<RequestBuilder> {
        let path = path.trim_start_matches('/');
        let body = serde_json::to_string(body).map_err(|e| RestError::Parse(e.to_string()))?;
        let headers = self.signer.v2_headers(path, &body)?;
        let url = join(&self.config.auth_url, &format!("v2/{}", path));
        Ok(self.signed(Method::POST, url, headers))
    }

    /// v1 signed POST (`X-BFX-*` headers carrying the base64 envelope)
    pub fn v1_request(&self, path: &str, extra: &Map<String, Value>) -> RestResult<RequestBuilder> {
        let request = format!("/v1/{}", path.trim_start_matches('/'));
        let headers = self.signer.v1_headers(&request, extra)?;
        let url = join(&self.config.auth_url, request.trim_start_matches('/'));
        Ok(self.signed(Method::POST, url, headers))
    }

    fn signed(&self, method: Method, url: String, headers: SignedHeaders) -> RequestBuilder {
        debug!(%method, %url, nonce = headers.nonce(), "Signed request");
        let builder = self
            .http
            .request(method, url)
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .body(headers.body().to_string());
        headers
            .iter()
            .fold(builder, |builder, (name, value)| builder.header(name, value))
    }

    // ========================================================================
    // Execution
    // ========================================================================

    /// GET a public endpoint and parse the JSON body
    #[instrument(skip(self))]
    pub async fn public_get<T: DeserializeOwned>(&self, path: &str) -> RestResult<T> {
        self.execute(self.public_request(path)).await
    }

    /// POST a v2 signed endpoint and parse the JSON body
    #[instrument(skip(self, body))]
    pub async fn signed_v2<T: DeserializeOwned>(&self, path: &str, body: &Value) -> RestResult<T> {
        self.execute(self.v2_request(path, body)?).await
    }

    /// POST a v1 signed endpoint and parse the JSON body
    #[instrument(skip(self, extra))]
    pub async fn signed_v1<T: DeserializeOwned>(
        &self,
        path: &str,
        extra: &Map<String, Value>,
    ) -> RestResult<T> {
        self.execute(self.v1_request(path, extra)?).await
    }

    async fn execute<T: DeserializeOwned>(&self, builder: RequestBuilder) -> RestResult<T> {
        let request = builder.build()?;
        let method = request.method().to_string();
        let url = request.url().to_string();

        let response = self.http.execute(request).await?;
        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            let err = RestError::from_response(method, url, status.as_u16(), &body);
            warn!(error = %err, "Request failed");
            return Err(err);
        }

        serde_json::from_str(&body).map_err(|e| RestError::Parse(format!("{}: {}", e, body)))
    }
}

impl std::fmt::Debug for RestClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RestClient")
            .field("config", &self.config)
            .field("has_credentials", &self.has_credentials())
            .finish()
    }
}

fn join(base: &str, path: &str) -> String {
    format!(
        "{}/{}",
        base.trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use bitfinex_auth::{AuthError, SequenceNonce};
    use serde_json::json;
    use std::sync::Arc;

    fn client() -> RestClient {
        RestClient::new().unwrap().with_signer(
            Signer::new()
                .with_credentials(Credentials::new("abc", "123").unwrap())
                .with_nonce_source(Arc::new(SequenceNonce::new(152145189228798))),
        )
    }

    fn header<'a>(request: &'a reqwest::Request, name: &str) -> Option<&'a str> {
        request.headers().get(name).and_then(|v| v.to_str().ok())
    }

    fn body(request: &reqwest::Request) -> &str {
        request
            .body()
            .and_then(|b| b.as_bytes())
            .and_then(|b| std::str::from_utf8(b).ok())
            .unwrap_or_default()
    }

    #[test]
    fn test_client_config_builder() {
        let config = ClientConfig::new()
            .with_timeout(Duration::from_secs(5))
            .with_user_agent("test-agent");

        assert_eq!(config.timeout, Duration::from_secs(5));
        assert_eq!(config.user_agent.as_deref(), Some("test-agent"));
        assert_eq!(config.public_url, PUBLIC_BASE_URL);
    }

    #[test]
    fn test_public_request_url() {
        let request = client().public_request("tickers?symbols=tBTCUSD").build().unwrap();
        assert_eq!(request.method(), Method::GET);
        assert_eq!(
            request.url().as_str(),
            "https://api-pub.bitfinex.com/v2/tickers?symbols=tBTCUSD"
        );
        assert!(request.headers().get("bfx-signature").is_none());
    }

    #[test]
    fn test_v2_request_headers() {
        let request = client()
            .v2_request("auth/r/orders/BTCUSD/hist", &json!({}))
            .unwrap()
            .build()
            .unwrap();

        assert_eq!(request.method(), Method::POST);
        assert_eq!(
            request.url().as_str(),
            "https://api.bitfinex.com/v2/auth/r/orders/BTCUSD/hist"
        );
        assert_eq!(header(&request, "bfx-apikey"), Some("abc"));
        assert_eq!(header(&request, "bfx-nonce"), Some("152145189228798"));
        assert_eq!(
            header(&request, "bfx-signature"),
            Some("2936ac13384ea81505386777bf3089ca0aa5d3cb41e9bf2ba57077f230daef1b1dc8ce426b3ca4cb792ab58be936ed5d")
        );
        assert_eq!(header(&request, "content-type"), Some("application/json"));
        assert_eq!(body(&request), "{}");
    }

    #[test]
    fn test_v1_request_headers() {
        let request = client().v1_request("balances", &Map::new()).unwrap().build().unwrap();

        assert_eq!(request.url().as_str(), "https://api.bitfinex.com/v1/balances");
        assert_eq!(
            header(&request, "X-BFX-PAYLOAD"),
            Some("eyJub25jZSI6MTUyMTQ1MTg5MjI4Nzk4LCJyZXF1ZXN0IjoiL3YxL2JhbGFuY2VzIn0=")
        );
        assert_eq!(
            header(&request, "x-bfx-signature"),
            Some("ca4348123167ef6c720fe8549a02249442f2e749ceeebb1a30fc6ff6ede452d1f484b5423ccbfb254b0d3f4034705805")
        );
        assert_eq!(body(&request), r#"{"nonce":152145189228798,"request":"/v1/balances"}"#);
    }

    #[test]
    fn test_signed_request_without_credentials() {
        let client = RestClient::new().unwrap();
        assert!(!client.has_credentials());
        assert!(matches!(
            client.v2_request("auth/r/wallets", &json!({})),
            Err(RestError::Auth(AuthError::CredentialsNotSet))
        ));
        assert!(matches!(
            client.v1_request("balances", &Map::new()),
            Err(RestError::Auth(AuthError::CredentialsNotSet))
        ));
    }

    #[test]
    fn test_join() {
        assert_eq!(join("https://a/v2/", "/tickers"), "https://a/v2/tickers");
        assert_eq!(join("https://a", "v1/balances"), "https://a/v1/balances");
    }
}
