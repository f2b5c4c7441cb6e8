//! Candle (OHLCV) records

use crate::codec::{Decode, Row};
use crate::error::DecodeResult;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// One candle. Note the wire order is open, *close*, high, low.
///
/// Wire layout: `[MTS, OPEN, CLOSE, HIGH, LOW, VOLUME]`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Candle {
    pub mts: i64,
    pub open: Decimal,
    pub close: Decimal,
    pub high: Decimal,
    pub low: Decimal,
    pub volume: Decimal,
}

impl Decode for Candle {
    const NAME: &'static str = "candle";
    const MIN_LEN: usize = 6;

    fn decode(row: &Row<'_>) -> DecodeResult<Self> {
        Ok(Self {
            mts: row.int(0, "mts")?,
            open: row.decimal(1, "open")?,
            close: row.decimal(2, "close")?,
            high: row.decimal(3, "high")?,
            low: row.decimal(4, "low")?,
            volume: row.decimal(5, "volume")?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use serde_json::json;

    #[test]
    fn test_candle_field_order() {
        let candle =
            Candle::from_value(&json!([1574698260000_i64, 7379.8, 7379.9, 7380, 7379.7, 2.5]))
                .unwrap();
        assert_eq!(candle.open, dec!(7379.8));
        assert_eq!(candle.close, dec!(7379.9));
        assert_eq!(candle.high, dec!(7380));
        assert_eq!(candle.low, dec!(7379.7));
        assert_eq!(candle.volume, dec!(2.5));
    }
}
