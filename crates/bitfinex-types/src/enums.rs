//! Channel, Side, Precision and book enums

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Streaming channel types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Channel {
    /// Ticker channel - best bid/ask and daily stats
    Ticker,
    /// Trades channel - executed public trades
    Trades,
    /// Book channel - raw or aggregated order book
    Book,
    /// Candles channel - OHLCV bars, addressed by key
    Candles,
    /// Account channel (chanId 0) - orders, positions, wallets, notifications
    Account,
}

impl Channel {
    /// Returns the channel name as used in API messages
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Ticker => "ticker",
            Self::Trades => "trades",
            Self::Book => "book",
            Self::Candles => "candles",
            Self::Account => "account",
        }
    }

    /// Returns true if this channel needs an authenticated connection
    pub fn is_private(&self) -> bool {
        matches!(self, Self::Account)
    }

    /// Parse a channel name from an acknowledgement
    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "ticker" => Some(Self::Ticker),
            "trades" => Some(Self::Trades),
            "book" => Some(Self::Book),
            "candles" => Some(Self::Candles),
            "account" => Some(Self::Account),
            _ => None,
        }
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Trade or book side
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    /// Buy / bid
    Buy,
    /// Sell / ask
    Sell,
}

impl Side {
    /// Positive amounts are buys, everything else is a sell
    pub fn from_amount(amount: rust_decimal::Decimal) -> Self {
        if amount.is_sign_positive() && !amount.is_zero() {
            Self::Buy
        } else {
            Self::Sell
        }
    }

    /// Returns the opposite side
    pub fn opposite(&self) -> Self {
        match self {
            Self::Buy => Self::Sell,
            Self::Sell => Self::Buy,
        }
    }
}

/// What a book level update does to the local book
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BookAction {
    /// Insert or replace the level
    Upsert,
    /// Remove the level
    Remove,
}

/// Book precision tag
///
/// `R0` is the raw (per-order) book, `P0`..`P4` are aggregated levels with
/// decreasing price precision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum Precision {
    /// Raw book, one entry per order
    R0,
    /// Aggregated, 5 significant figures
    #[default]
    P0,
    /// Aggregated, 4 significant figures
    P1,
    /// Aggregated, 3 significant figures
    P2,
    /// Aggregated, 2 significant figures
    P3,
    /// Aggregated, 1 significant figure
    P4,
}

impl Precision {
    /// Returns the tag as sent on the wire
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::R0 => "R0",
            Self::P0 => "P0",
            Self::P1 => "P1",
            Self::P2 => "P2",
            Self::P3 => "P3",
            Self::P4 => "P4",
        }
    }

    /// Positional layout used by book rows at this precision
    pub fn layout(&self) -> BookLayout {
        match self {
            Self::R0 => BookLayout::Raw,
            _ => BookLayout::Aggregated,
        }
    }
}

impl FromStr for Precision {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "R0" => Ok(Self::R0),
            "P0" => Ok(Self::P0),
            "P1" => Ok(Self::P1),
            "P2" => Ok(Self::P2),
            "P3" => Ok(Self::P3),
            "P4" => Ok(Self::P4),
            other => Err(format!("unknown book precision: {}", other)),
        }
    }
}

impl fmt::Display for Precision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Field order of a book row
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BookLayout {
    /// `[ORDER_ID, PRICE, AMOUNT]`
    Raw,
    /// `[PRICE, COUNT, AMOUNT]`
    Aggregated,
}

/// Book update frequency
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum Frequency {
    /// Realtime
    #[default]
    F0,
    /// Every two seconds
    F1,
}

impl Frequency {
    /// Returns the tag as sent on the wire
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::F0 => "F0",
            Self::F1 => "F1",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_side_from_amount() {
        assert_eq!(Side::from_amount(dec!(0.5)), Side::Buy);
        assert_eq!(Side::from_amount(dec!(-0.5)), Side::Sell);
        assert_eq!(Side::from_amount(dec!(0)), Side::Sell);
        assert_eq!(Side::Buy.opposite(), Side::Sell);
    }

    #[test]
    fn test_precision_layout() {
        assert_eq!(Precision::R0.layout(), BookLayout::Raw);
        assert_eq!(Precision::P2.layout(), BookLayout::Aggregated);
        assert_eq!("P3".parse::<Precision>().unwrap(), Precision::P3);
        assert!("X9".parse::<Precision>().is_err());
    }

    #[test]
    fn test_channel_names() {
        assert_eq!(Channel::Book.as_str(), "book");
        assert_eq!(Channel::parse("trades"), Some(Channel::Trades));
        assert_eq!(Channel::parse("nope"), None);
        assert!(Channel::Account.is_private());
        assert!(!Channel::Ticker.is_private());
    }
}
