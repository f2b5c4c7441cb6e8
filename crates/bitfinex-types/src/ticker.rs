//! Ticker records
//!
//! REST ticker rows carry the symbol at index 0; streaming ticker updates
//! omit it (the channel already identifies the symbol), shifting every field
//! left by one. Both forms decode through the same field table.

use crate::codec::{Decode, Row};
use crate::error::DecodeResult;
use crate::symbol::normalize_symbol;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Trading pair ticker
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ticker {
    /// Normalized symbol (`btcusd`)
    pub symbol: String,
    pub bid: Decimal,
    pub bid_size: Decimal,
    pub ask: Decimal,
    pub ask_size: Decimal,
    pub daily_change: Decimal,
    pub daily_change_relative: Decimal,
    pub last_price: Decimal,
    pub volume: Decimal,
    pub high: Decimal,
    pub low: Decimal,
}

impl Ticker {
    /// Fields after the symbol
    const STREAM_LEN: usize = 10;

    /// Decode a streaming update for `symbol` (no symbol element in the row)
    pub fn from_stream(symbol: &str, values: &[Value]) -> DecodeResult<Self> {
        let row = Row::new(Self::NAME, Self::STREAM_LEN, values)?;
        Self::decode_fields(&row, 0, symbol)
    }

    /// Spread between best ask and best bid
    pub fn spread(&self) -> Decimal {
        self.ask - self.bid
    }

    fn decode_fields(row: &Row<'_>, at: usize, symbol: &str) -> DecodeResult<Self> {
        Ok(Self {
            symbol: normalize_symbol(symbol),
            bid: row.decimal(at, "bid")?,
            bid_size: row.decimal(at + 1, "bid_size")?,
            ask: row.decimal(at + 2, "ask")?,
            ask_size: row.decimal(at + 3, "ask_size")?,
            daily_change: row.decimal(at + 4, "daily_change")?,
            daily_change_relative: row.decimal(at + 5, "daily_change_relative")?,
            last_price: row.decimal(at + 6, "last_price")?,
            volume: row.decimal(at + 7, "volume")?,
            high: row.decimal(at + 8, "high")?,
            low: row.decimal(at + 9, "low")?,
        })
    }
}

impl Decode for Ticker {
    const NAME: &'static str = "ticker";
    const MIN_LEN: usize = 11;

    fn decode(row: &Row<'_>) -> DecodeResult<Self> {
        let symbol = row.string(0, "symbol")?;
        Self::decode_fields(row, 1, &symbol)
    }
}

/// Funding currency ticker
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FundingTicker {
    /// Normalized currency (`usd`)
    pub symbol: String,
    /// Flash return rate
    pub frr: Decimal,
    pub bid: Decimal,
    pub bid_period: i64,
    pub bid_size: Decimal,
    pub ask: Decimal,
    pub ask_period: i64,
    pub ask_size: Decimal,
    pub daily_change: Decimal,
    pub daily_change_relative: Decimal,
    pub last_price: Decimal,
    pub volume: Decimal,
    pub high: Decimal,
    pub low: Decimal,
    pub frr_amount_available: Decimal,
}

impl FundingTicker {
    /// Required fields after the symbol, `frr` through `low`.
    ///
    /// Two placeholders and `frr_amount_available` follow. Older rows stop
    /// at `low`, so the trailing field decodes as zero when absent.
    const STREAM_LEN: usize = 13;

    /// Decode a streaming update for `symbol`
    pub fn from_stream(symbol: &str, values: &[Value]) -> DecodeResult<Self> {
        let row = Row::new(Self::NAME, Self::STREAM_LEN, values)?;
        Self::decode_fields(&row, 0, symbol)
    }

    fn decode_fields(row: &Row<'_>, at: usize, symbol: &str) -> DecodeResult<Self> {
        Ok(Self {
            symbol: normalize_symbol(symbol),
            frr: row.decimal(at, "frr")?,
            bid: row.decimal(at + 1, "bid")?,
            bid_period: row.int(at + 2, "bid_period")?,
            bid_size: row.decimal(at + 3, "bid_size")?,
            ask: row.decimal(at + 4, "ask")?,
            ask_period: row.int(at + 5, "ask_period")?,
            ask_size: row.decimal(at + 6, "ask_size")?,
            daily_change: row.decimal(at + 7, "daily_change")?,
            daily_change_relative: row.decimal(at + 8, "daily_change_relative")?,
            last_price: row.decimal(at + 9, "last_price")?,
            volume: row.decimal(at + 10, "volume")?,
            high: row.decimal(at + 11, "high")?,
            low: row.decimal(at + 12, "low")?,
            // at + 13 and at + 14 are placeholders; optional past the gate
            frr_amount_available: row.decimal(at + 15, "frr_amount_available")?,
        })
    }
}

impl Decode for FundingTicker {
    const NAME: &'static str = "funding_ticker";
    const MIN_LEN: usize = Self::STREAM_LEN + 1;

    fn decode(row: &Row<'_>) -> DecodeResult<Self> {
        let symbol = row.string(0, "symbol")?;
        Self::decode_fields(row, 1, &symbol)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DecodeError;
    use rust_decimal_macros::dec;
    use serde_json::json;

    #[test]
    fn test_rest_ticker() {
        let raw = json!([
            "tBTCUSD", 7239.4, 39.1, 7239.5, 63.2, -51.1, -0.0070, 7239.4, 2735.1, 7316.3, 7185
        ]);
        let ticker = Ticker::from_value(&raw).unwrap();

        assert_eq!(ticker.symbol, "btcusd");
        assert_eq!(ticker.bid, dec!(7239.4));
        assert_eq!(ticker.ask, dec!(7239.5));
        assert_eq!(ticker.daily_change_relative, dec!(-0.007));
        assert_eq!(ticker.low, dec!(7185));
        assert_eq!(ticker.spread(), dec!(0.1));
    }

    #[test]
    fn test_bid_and_low_track_positions() {
        // Property over a handful of shapes: bid is element 1, low is the last
        for n in 0..5_i64 {
            let mut row: Vec<Value> = vec![json!("tETHUSD")];
            row.extend((1..=10).map(|i| json!(i * 10 + n)));
            let ticker = Ticker::from_raw(&row).unwrap();
            assert_eq!(ticker.symbol, "ethusd");
            assert_eq!(ticker.bid, Decimal::from(10 + n));
            assert_eq!(ticker.low, Decimal::from(100 + n));
        }
    }

    #[test]
    fn test_trailing_fields_ignored() {
        let raw = json!(["tBTCUSD", 1, 2, 3, 4, 5, 6, 7, 8, 9, 10, "extra", [1, 2]]);
        let ticker = Ticker::from_value(&raw).unwrap();
        assert_eq!(ticker.low, dec!(10));
    }

    #[test]
    fn test_short_ticker_is_rejected() {
        let raw = json!(["tBTCUSD", 1, 2, 3]);
        let err = Ticker::from_value(&raw).unwrap_err();
        assert!(matches!(
            err,
            DecodeError::TooShort { expected: 11, actual: 4, .. }
        ));
    }

    #[test]
    fn test_stream_ticker() {
        let raw = json!([7239.4, 39.1, 7239.5, 63.2, -51.1, -0.007, 7239.4, 2735.1, 7316.3, 7185]);
        let ticker = Ticker::from_stream("tBTCUSD", raw.as_array().unwrap()).unwrap();
        assert_eq!(ticker.symbol, "btcusd");
        assert_eq!(ticker.bid, dec!(7239.4));
        assert_eq!(ticker.low, dec!(7185));
    }

    #[test]
    fn test_stream_funding_ticker() {
        let raw = json!([
            0.0002, 0.00018, 30, 1254530.5, 0.00019, 2, 120.6, 0.00001, 0.05, 0.00019, 30000000,
            0.0003, 0.0001, null, null, 55000
        ]);
        let ticker = FundingTicker::from_stream("fUSD", raw.as_array().unwrap()).unwrap();
        assert_eq!(ticker.symbol, "usd");
        assert_eq!(ticker.frr, dec!(0.0002));
        assert_eq!(ticker.bid_period, 30);
        assert_eq!(ticker.low, dec!(0.0001));
        assert_eq!(ticker.frr_amount_available, dec!(55000));
    }

    #[test]
    fn test_rest_funding_ticker() {
        let raw = json!([
            "fUSD", 0.0002, 0.00018, 30, 1254530.5, 0.00019, 2, 120.6, 0.00001, 0.05, 0.00019,
            30000000, 0.0003, 0.0001, null, null, 55000
        ]);
        let ticker = FundingTicker::from_value(&raw).unwrap();
        assert_eq!(ticker.symbol, "usd");
        assert_eq!(ticker.ask_period, 2);
        assert_eq!(ticker.low, dec!(0.0001));
        assert_eq!(ticker.frr_amount_available, dec!(55000));
    }

    #[test]
    fn test_funding_ticker_without_trailing_amount() {
        let raw = json!([
            "fUSD", 0.0002, 0.00018, 30, 1254530.5, 0.00019, 2, 120.6, 0.00001, 0.05, 0.00019,
            30000000, 0.0003, 0.0001
        ]);
        let ticker = FundingTicker::from_value(&raw).unwrap();
        assert_eq!(ticker.low, dec!(0.0001));
        assert_eq!(ticker.frr_amount_available, Decimal::ZERO);

        let short = json!(["fUSD", 0.0002, 0.00018, 30]);
        assert!(matches!(
            FundingTicker::from_value(&short).unwrap_err(),
            DecodeError::TooShort { expected: 14, actual: 4, .. }
        ));
    }
}
