//! Request signing
//!
//! One byte-level contract serves every transport:
//!
//! ```text
//! signature = hex(HMAC-SHA384(secret, path || nonce || body))
//! ```
//!
//! The transports only differ in how the result travels:
//!
//! - v2 REST: `bfx-apikey`, `bfx-nonce`, `bfx-signature` headers, signed over
//!   `/api/v2/<path>` + nonce + JSON body
//! - v1 REST: `X-BFX-APIKEY`, `X-BFX-PAYLOAD` (base64 of a JSON envelope holding
//!   the request path and nonce), `X-BFX-SIGNATURE` over the base64 string
//! - WebSocket: an `auth` event carrying `authPayload = "AUTH" + nonce` and its
//!   signature

use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use serde::Serialize;
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::debug;

use crate::credentials::Credentials;
use crate::error::{AuthError, AuthResult};
use crate::nonce::{EpochNonce, NonceSource};

/// Path prefix signed into v2 REST requests
pub const V2_PATH_PREFIX: &str = "/api/v2/";

/// Prefix of the WebSocket auth payload
pub const WS_AUTH_PREFIX: &str = "AUTH";

/// Authentication headers ready to attach to an HTTP request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedHeaders {
    headers: Vec<(&'static str, String)>,
    nonce: u64,
    /// Request body the signature covers
    body: String,
}

impl SignedHeaders {
    /// Header value by name (case-insensitive)
    pub fn get(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    /// All headers, in insertion order
    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &str)> {
        self.headers.iter().map(|(k, v)| (*k, v.as_str()))
    }

    /// Nonce consumed by this signature
    pub fn nonce(&self) -> u64 {
        self.nonce
    }

    /// Body to send with the request (the JSON body for v2, the decoded
    /// envelope for v1)
    pub fn body(&self) -> &str {
        &self.body
    }
}

/// Fields of the WebSocket `auth` event
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WsAuthPayload {
    pub api_key: String,
    pub auth_sig: String,
    pub auth_payload: String,
    pub auth_nonce: u64,
}

/// Signs requests with a credential and a nonce source
///
/// Cheap to clone: the nonce source is shared, so clones never hand out the
/// same nonce.
#[derive(Clone)]
pub struct Signer {
    credentials: Option<Credentials>,
    nonce: Arc<dyn NonceSource>,
}

impl Default for Signer {
    fn default() -> Self {
        Self::new()
    }
}

impl Signer {
    /// Signer without credentials, using the clock-based nonce
    pub fn new() -> Self {
        Self {
            credentials: None,
            nonce: Arc::new(EpochNonce::new()),
        }
    }

    /// Set credentials (builder style)
    pub fn with_credentials(mut self, credentials: Credentials) -> Self {
        self.set_credentials(credentials);
        self
    }

    /// Replace the nonce source
    pub fn with_nonce_source(mut self, source: Arc<dyn NonceSource>) -> Self {
        self.nonce = source;
        self
    }

    /// Set credentials
    pub fn set_credentials(&mut self, credentials: Credentials) {
        debug!(credentials = ?credentials, "Signer credentials set");
        self.credentials = Some(credentials);
    }

    /// Check if credentials are set
    pub fn has_credentials(&self) -> bool {
        self.credentials.is_some()
    }

    /// API key of the configured credentials
    pub fn api_key(&self) -> AuthResult<&str> {
        self.credentials().map(Credentials::api_key)
    }

    /// Draw the next nonce
    pub fn next_nonce(&self) -> u64 {
        self.nonce.next_nonce()
    }

    /// Sign `path || nonce || body`
    pub fn sign(&self, path: &str, nonce: u64, body: &str) -> AuthResult<String> {
        self.sign_payload(&format!("{}{}{}", path, nonce, body))
    }

    /// Sign an already composed payload
    pub fn sign_payload(&self, payload: &str) -> AuthResult<String> {
        self.credentials()?.hmac_hex(payload.as_bytes())
    }

    /// v2 REST headers for `path` (without the `/api/v2/` prefix) and JSON `body`
    pub fn v2_headers(&self, path: &str, body: &str) -> AuthResult<SignedHeaders> {
        let credentials = self.credentials()?;
        self.v2_headers_with_nonce_for(credentials, path, self.next_nonce(), body)
    }

    /// v2 REST headers with a caller-supplied nonce
    pub fn v2_headers_with_nonce(
        &self,
        path: &str,
        nonce: u64,
        body: &str,
    ) -> AuthResult<SignedHeaders> {
        let credentials = self.credentials()?;
        self.v2_headers_with_nonce_for(credentials, path, nonce, body)
    }

    fn v2_headers_with_nonce_for(
        &self,
        credentials: &Credentials,
        path: &str,
        nonce: u64,
        body: &str,
    ) -> AuthResult<SignedHeaders> {
        let signed_path = format!("{}{}", V2_PATH_PREFIX, path.trim_start_matches('/'));
        let signature = self.sign(&signed_path, nonce, body)?;

        Ok(SignedHeaders {
            headers: vec![
                ("bfx-apikey", credentials.api_key().to_string()),
                ("bfx-nonce", nonce.to_string()),
                ("bfx-signature", signature),
            ],
            nonce,
            body: body.to_string(),
        })
    }

    /// v1 REST headers for the request path (`/v1/balances`) and extra
    /// envelope fields
    pub fn v1_headers(
        &self,
        request: &str,
        extra: &Map<String, Value>,
    ) -> AuthResult<SignedHeaders> {
        let credentials = self.credentials()?;
        self.v1_headers_for(credentials, request, self.next_nonce(), extra)
    }

    /// v1 REST headers with a caller-supplied nonce
    pub fn v1_headers_with_nonce(
        &self,
        request: &str,
        nonce: u64,
        extra: &Map<String, Value>,
    ) -> AuthResult<SignedHeaders> {
        let credentials = self.credentials()?;
        self.v1_headers_for(credentials, request, nonce, extra)
    }

    fn v1_headers_for(
        &self,
        credentials: &Credentials,
        request: &str,
        nonce: u64,
        extra: &Map<String, Value>,
    ) -> AuthResult<SignedHeaders> {
        let envelope = v1_envelope(request, nonce, extra)?;
        let payload = BASE64.encode(&envelope);
        let signature = self.sign_payload(&payload)?;

        Ok(SignedHeaders {
            headers: vec![
                ("X-BFX-APIKEY", credentials.api_key().to_string()),
                ("X-BFX-PAYLOAD", payload),
                ("X-BFX-SIGNATURE", signature),
            ],
            nonce,
            body: envelope,
        })
    }

    /// Fields for the WebSocket `auth` event
    pub fn ws_auth(&self) -> AuthResult<WsAuthPayload> {
        self.credentials()?;
        self.ws_auth_with_nonce(self.next_nonce())
    }

    /// WebSocket auth fields with a caller-supplied nonce
    pub fn ws_auth_with_nonce(&self, nonce: u64) -> AuthResult<WsAuthPayload> {
        let credentials = self.credentials()?;
        Ok(WsAuthPayload {
            api_key: credentials.api_key().to_string(),
            auth_sig: self.sign(WS_AUTH_PREFIX, nonce, "")?,
            auth_payload: format!("{}{}", WS_AUTH_PREFIX, nonce),
            auth_nonce: nonce,
        })
    }

    fn credentials(&self) -> AuthResult<&Credentials> {
        self.credentials.as_ref().ok_or(AuthError::CredentialsNotSet)
    }
}

impl std::fmt::Debug for Signer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Signer")
            .field("credentials", &self.credentials)
            .field("nonce", &self.nonce)
            .finish()
    }
}

/// JSON envelope of a v1 request, keys in sorted order
fn v1_envelope(request: &str, nonce: u64, extra: &Map<String, Value>) -> AuthResult<String> {
    let mut envelope: BTreeMap<&str, Value> =
        extra.iter().map(|(k, v)| (k.as_str(), v.clone())).collect();
    envelope.insert("request", Value::from(request));
    envelope.insert("nonce", Value::from(nonce));
    serde_json::to_string(&envelope).map_err(|e| AuthError::Serialize(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::nonce::SequenceNonce;
    use serde_json::json;

    const NONCE: u64 = 152145189228798;
    const PATH: &str = "auth/r/orders/BTCUSD/hist";

    fn signer() -> Signer {
        Signer::new().with_credentials(Credentials::new("abc", "123").unwrap())
    }

    #[test]
    fn test_v2_regression_vectors() {
        let signer = signer();

        let headers = signer.v2_headers_with_nonce(PATH, NONCE, "{}").unwrap();
        assert_eq!(headers.get("bfx-apikey"), Some("abc"));
        assert_eq!(headers.get("bfx-nonce"), Some("152145189228798"));
        assert_eq!(
            headers.get("bfx-signature"),
            Some("2936ac13384ea81505386777bf3089ca0aa5d3cb41e9bf2ba57077f230daef1b1dc8ce426b3ca4cb792ab58be936ed5d")
        );

        let body = json!({"limit": 2}).to_string();
        let headers = signer.v2_headers_with_nonce(PATH, NONCE, &body).unwrap();
        assert_eq!(
            headers.get("bfx-signature"),
            Some("cafd073d91b816269147d46985c2ddfbeb90d79e8418c15243b85938c5bc5e758d82001195024a45ab223787593b3206")
        );
    }

    #[test]
    fn test_raw_sign_vector() {
        assert_eq!(
            signer().sign(PATH, NONCE, "").unwrap(),
            "94fe06ccd594f372e2ee8a64fcc150a0e118403164724ba2cc03dbd70e2ce4238e39b2cbaa56745fc6b93921eafea16a"
        );
    }

    #[test]
    fn test_sign_is_deterministic_and_input_sensitive() {
        let signer = signer();
        let base = signer.sign(PATH, NONCE, "").unwrap();
        assert_eq!(base, signer.sign(PATH, NONCE, "").unwrap());
        assert_ne!(base, signer.sign(PATH, NONCE + 1, "").unwrap());
        assert_ne!(base, signer.sign("auth/r/wallets", NONCE, "").unwrap());
        assert_ne!(base, signer.sign(PATH, NONCE, "{}").unwrap());

        let other = Signer::new().with_credentials(Credentials::new("abc", "124").unwrap());
        assert_ne!(base, other.sign(PATH, NONCE, "").unwrap());
    }

    #[test]
    fn test_ws_auth_vector() {
        let auth = signer().ws_auth_with_nonce(NONCE).unwrap();
        assert_eq!(auth.api_key, "abc");
        assert_eq!(auth.auth_payload, "AUTH152145189228798");
        assert_eq!(auth.auth_nonce, NONCE);
        assert_eq!(
            auth.auth_sig,
            "ab8f9d706473e0359a9eb74fd5e94e6c872b71d08e29b7ec52d3f1045f593a6047beb3109bf21cede14a62f06f434a90"
        );
    }

    #[test]
    fn test_v1_regression_vectors() {
        let signer = signer();

        let headers = signer.v1_headers_with_nonce("/v1/balances", NONCE, &Map::new()).unwrap();
        assert_eq!(headers.get("X-BFX-APIKEY"), Some("abc"));
        assert_eq!(
            headers.get("X-BFX-PAYLOAD"),
            Some("eyJub25jZSI6MTUyMTQ1MTg5MjI4Nzk4LCJyZXF1ZXN0IjoiL3YxL2JhbGFuY2VzIn0=")
        );
        assert_eq!(
            headers.get("x-bfx-signature"),
            Some("ca4348123167ef6c720fe8549a02249442f2e749ceeebb1a30fc6ff6ede452d1f484b5423ccbfb254b0d3f4034705805")
        );
        assert_eq!(headers.body(), r#"{"nonce":152145189228798,"request":"/v1/balances"}"#);

        let mut extra = Map::new();
        extra.insert("limit".into(), json!(2));
        let headers = signer.v1_headers_with_nonce("/v1/mytrades", NONCE, &extra).unwrap();
        assert_eq!(
            headers.get("X-BFX-PAYLOAD"),
            Some("eyJsaW1pdCI6Miwibm9uY2UiOjE1MjE0NTE4OTIyODc5OCwicmVxdWVzdCI6Ii92MS9teXRyYWRlcyJ9")
        );
        assert_eq!(
            headers.get("X-BFX-SIGNATURE"),
            Some("33bba18aee63f2b937af44b46cb6838771278dc2abbe74e3e07325d8c9f21f7c5416124d7282a55ef59e25bf18adb9a3")
        );
    }

    #[test]
    fn test_v1_envelope_reserved_keys_win() {
        let mut extra = Map::new();
        extra.insert("nonce".into(), json!("spoofed"));
        extra.insert("request".into(), json!("/v1/other"));
        let envelope = v1_envelope("/v1/balances", 7, &extra).unwrap();
        assert_eq!(envelope, r#"{"nonce":7,"request":"/v1/balances"}"#);
    }

    #[test]
    fn test_missing_credentials_fail_fast() {
        let signer = Signer::new();
        assert!(!signer.has_credentials());
        assert_eq!(signer.sign(PATH, NONCE, ""), Err(AuthError::CredentialsNotSet));
        assert_eq!(signer.ws_auth(), Err(AuthError::CredentialsNotSet));
        assert!(matches!(
            signer.v2_headers(PATH, "{}"),
            Err(AuthError::CredentialsNotSet)
        ));
        assert!(matches!(
            signer.v1_headers("/v1/balances", &Map::new()),
            Err(AuthError::CredentialsNotSet)
        ));
    }

    #[test]
    fn test_pluggable_nonce_source() {
        let signer = signer().with_nonce_source(Arc::new(SequenceNonce::new(NONCE)));
        let first = signer.v2_headers(PATH, "{}").unwrap();
        let second = signer.clone().v2_headers(PATH, "{}").unwrap();
        assert_eq!(first.nonce(), NONCE);
        assert_eq!(second.nonce(), NONCE + 1);
        assert_eq!(
            first.get("bfx-signature"),
            Some("2936ac13384ea81505386777bf3089ca0aa5d3cb41e9bf2ba57077f230daef1b1dc8ce426b3ca4cb792ab58be936ed5d")
        );

        let auth = signer.ws_auth().unwrap();
        assert_eq!(auth.auth_nonce, NONCE + 2);
    }

    #[test]
    fn test_debug_does_not_leak_secret() {
        let debug = format!("{:?}", signer());
        assert!(debug.contains("[REDACTED]"));
        assert!(!debug.contains("123"));
    }
}
