//! Order records (account channel and order history)

use crate::codec::{Decode, Row};
use crate::enums::Side;
use crate::error::DecodeResult;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Order lifecycle status, parsed from the free-form status string
/// (`"EXECUTED @ 7245.3(0.005)"`, `"PARTIALLY FILLED @ ..."`, ...)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OrderStatus {
    Active,
    Executed,
    PartiallyFilled,
    Canceled,
    InsufficientMargin,
    RsnDust,
    RsnPause,
    Unknown,
}

impl OrderStatus {
    /// Parse the leading status word(s)
    pub fn parse(status: &str) -> Self {
        let upper = status.trim().to_uppercase();
        if upper.starts_with("ACTIVE") {
            Self::Active
        } else if upper.starts_with("EXECUTED") {
            Self::Executed
        } else if upper.starts_with("PARTIALLY FILLED") {
            Self::PartiallyFilled
        } else if upper.starts_with("CANCELED") {
            Self::Canceled
        } else if upper.starts_with("INSUFFICIENT MARGIN") {
            Self::InsufficientMargin
        } else if upper.starts_with("RSN_DUST") {
            Self::RsnDust
        } else if upper.starts_with("RSN_PAUSE") {
            Self::RsnPause
        } else {
            Self::Unknown
        }
    }

    /// Check if the order can still be filled
    pub fn is_active(&self) -> bool {
        matches!(self, Self::Active | Self::PartiallyFilled)
    }
}

/// An order as reported by the account channel or order history
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub id: i64,
    /// Group id
    pub gid: i64,
    /// Client id
    pub cid: i64,
    pub symbol: String,
    pub mts_create: i64,
    pub mts_update: i64,
    /// Remaining amount, signed (positive buy, negative sell)
    pub amount: Decimal,
    /// Original amount, signed
    pub amount_orig: Decimal,
    pub order_type: String,
    pub type_prev: String,
    /// Time-in-force expiry timestamp
    pub mts_tif: i64,
    pub flags: i64,
    /// Raw status string
    pub status: String,
    pub price: Decimal,
    pub price_avg: Decimal,
    pub price_trailing: Decimal,
    pub price_aux_limit: Decimal,
    pub notify: bool,
    pub hidden: bool,
    pub placed_id: i64,
    pub routing: String,
    /// Free-form metadata object
    pub meta: Value,
}

impl Order {
    /// Side derived from the original amount's sign
    pub fn side(&self) -> Side {
        Side::from_amount(self.amount_orig)
    }

    /// Parsed status
    pub fn status_kind(&self) -> OrderStatus {
        OrderStatus::parse(&self.status)
    }

    /// Absolute amount filled so far
    pub fn filled(&self) -> Decimal {
        (self.amount_orig - self.amount).abs()
    }
}

impl Decode for Order {
    const NAME: &'static str = "order";
    const MIN_LEN: usize = 26;

    fn decode(row: &Row<'_>) -> DecodeResult<Self> {
        Ok(Self {
            id: row.int(0, "id")?,
            gid: row.int(1, "gid")?,
            cid: row.int(2, "cid")?,
            symbol: row.string(3, "symbol")?,
            mts_create: row.int(4, "mts_create")?,
            mts_update: row.int(5, "mts_update")?,
            amount: row.decimal(6, "amount")?,
            amount_orig: row.decimal(7, "amount_orig")?,
            order_type: row.string(8, "order_type")?,
            type_prev: row.string(9, "type_prev")?,
            mts_tif: row.int(10, "mts_tif")?,
            flags: row.int(12, "flags")?,
            status: row.string(13, "status")?,
            price: row.decimal(16, "price")?,
            price_avg: row.decimal(17, "price_avg")?,
            price_trailing: row.decimal(18, "price_trailing")?,
            price_aux_limit: row.decimal(19, "price_aux_limit")?,
            notify: row.flag(23, "notify")?,
            hidden: row.flag(24, "hidden")?,
            placed_id: row.int(25, "placed_id")?,
            routing: row.string(28, "routing")?,
            meta: row.raw_value(31),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DecodeError;
    use rust_decimal_macros::dec;
    use serde_json::json;

    pub(crate) fn sample_order() -> Value {
        json!([
            33961681942_i64, 1227, 1337, "tBTCUSD", 1573482478000_i64, 1573485373000_i64,
            0.001, 0.004, "EXCHANGE LIMIT", null, null, null, 4096,
            "PARTIALLY FILLED @ 15.33(0.003)", null, null, 15.33, 15.33, 0, 0,
            null, null, null, 0, 0, null, null, null, "API>BFX", null, null, {"aff_code": "x"}
        ])
    }

    #[test]
    fn test_decode_order() {
        let order = Order::from_value(&sample_order()).unwrap();
        assert_eq!(order.id, 33961681942);
        assert_eq!(order.cid, 1337);
        assert_eq!(order.symbol, "tBTCUSD");
        assert_eq!(order.amount_orig, dec!(0.004));
        assert_eq!(order.type_prev, "");
        assert_eq!(order.flags, 4096);
        assert_eq!(order.status_kind(), OrderStatus::PartiallyFilled);
        assert_eq!(order.filled(), dec!(0.003));
        assert_eq!(order.side(), Side::Buy);
        assert_eq!(order.routing, "API>BFX");
        assert_eq!(order.meta["aff_code"], "x");
        assert!(!order.hidden);
    }

    #[test]
    fn test_order_without_optional_tail() {
        let mut raw = sample_order().as_array().cloned().unwrap();
        raw.truncate(26);
        let order = Order::from_raw(&raw).unwrap();
        assert_eq!(order.routing, "");
        assert!(order.meta.is_null());
    }

    #[test]
    fn test_short_order() {
        let raw = vec![json!(1); 20];
        let err = Order::from_raw(&raw).unwrap_err();
        assert!(matches!(err, DecodeError::TooShort { expected: 26, actual: 20, .. }));
    }

    #[test]
    fn test_status_parse() {
        assert_eq!(OrderStatus::parse("ACTIVE"), OrderStatus::Active);
        assert_eq!(OrderStatus::parse("EXECUTED @ 7245.3(0.005)"), OrderStatus::Executed);
        assert_eq!(OrderStatus::parse("CANCELED"), OrderStatus::Canceled);
        assert_eq!(OrderStatus::parse("something new"), OrderStatus::Unknown);
        assert!(OrderStatus::PartiallyFilled.is_active());
        assert!(!OrderStatus::Executed.is_active());
    }
}
