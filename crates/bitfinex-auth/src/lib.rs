//! Request signing and credentials for the Bitfinex API
//!
//! Both transports share one signing primitive (hex HMAC-SHA384 keyed by the
//! API secret). This crate owns that primitive, the credentials it needs and
//! the monotonic nonce sources that make each signature single-use.
//!
//! # Example
//!
//! ```
//! use bitfinex_auth::{Credentials, Signer};
//!
//! let signer = Signer::new().with_credentials(Credentials::new("abc", "123")?);
//!
//! // v2 REST headers
//! let headers = signer.v2_headers("auth/r/wallets", "{}")?;
//! assert!(headers.get("bfx-signature").is_some());
//!
//! // WebSocket auth event fields
//! let auth = signer.ws_auth()?;
//! assert!(auth.auth_payload.starts_with("AUTH"));
//! # Ok::<(), bitfinex_auth::AuthError>(())
//! ```

mod credentials;
mod error;
mod nonce;
mod signer;

pub use credentials::{Credentials, API_KEY_ENV, API_SECRET_ENV};
pub use error::{AuthError, AuthResult};
pub use nonce::{EpochNonce, NonceSource, SequenceNonce};
pub use signer::{SignedHeaders, Signer, WsAuthPayload, V2_PATH_PREFIX, WS_AUTH_PREFIX};
