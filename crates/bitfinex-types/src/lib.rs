//! Shared types for the Bitfinex API v2
//!
//! This crate provides the wire frames and positional-array codec used across
//! the SDK. It has no async or networking dependencies and can be used on its
//! own to decode captured payloads.
//!
//! # Key Types
//!
//! - [`Frame`], [`DataFrame`], [`Payload`], [`EventMessage`] - Classified inbound frames
//! - [`Row`], [`Decode`] - Index-addressed decoding of positional arrays
//! - [`Schema`], [`DomainEvent`] - Runtime layout selection and decoded events
//! - [`Ticker`], [`Trade`], [`BookLevel`], [`Candle`] - Market data records
//! - [`Order`], [`Position`], [`WalletEntry`], [`FundingOffer`], [`Execution`] - Account records
//! - [`Post`], [`Profile`] - Pulse records
//! - [`DecodeError`], [`ProtocolError`] - Error types

pub mod book;
pub mod candle;
pub mod codec;
pub mod enums;
pub mod error;
pub mod execution;
pub mod funding;
pub mod messages;
pub mod order;
pub mod position;
pub mod pulse;
pub mod schema;
pub mod symbol;
pub mod ticker;
pub mod trade;
pub mod wallet;

// Re-export commonly used types
pub use book::*;
pub use candle::*;
pub use codec::*;
pub use enums::*;
pub use error::*;
pub use execution::*;
pub use funding::*;
pub use messages::*;
pub use order::*;
pub use position::*;
pub use pulse::*;
pub use schema::*;
pub use symbol::*;
pub use ticker::*;
pub use trade::*;
pub use wallet::*;

// Re-export rust_decimal for users
pub use rust_decimal::Decimal;
