//! REST client for the Bitfinex API
//!
//! A thin signed-request pipeline over `reqwest`: unsigned GETs against the
//! public v2 host, v2 signed POSTs (`bfx-*` headers) and v1 signed POSTs
//! (`X-BFX-*` headers with a base64 envelope). Responses are positional
//! arrays and go through the same codec as the WebSocket feeds.
//!
//! # Example
//!
//! ```no_run
//! use bitfinex_rest::RestClient;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = RestClient::new()?;
//!     for ticker in client.tickers(&["tBTCUSD", "tETHUSD"]).await? {
//!         match ticker {
//!             Ok(t) => println!("{}: {}", t.symbol, t.last_price),
//!             Err(e) => eprintln!("skipped row: {}", e),
//!         }
//!     }
//!     Ok(())
//! }
//! ```
//!
//! # Errors
//!
//! Non-success statuses surface as [`RestError::Status`] with the message
//! pulled from Bitfinex's `["error", code, text]` body. Use
//! [`RestError::is_retryable`] to decide on a retry.

pub mod client;
pub mod endpoints;
pub mod error;

pub use client::{ClientConfig, RestClient, AUTH_BASE_URL, PUBLIC_BASE_URL};
pub use endpoints::Balance;
pub use error::{error_message, RestError, RestResult};

// Re-export for convenience
pub use bitfinex_auth::{Credentials, Signer};
