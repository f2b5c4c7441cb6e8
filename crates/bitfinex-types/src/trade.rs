//! Public trade records

use crate::codec::{Decode, Row};
use crate::enums::Side;
use crate::error::DecodeResult;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Executed trade on a trading pair
///
/// Wire layout: `[ID, MTS, AMOUNT, PRICE]`. A negative amount is a sell;
/// `amount` here is always the absolute value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Trade {
    pub id: i64,
    /// Millisecond timestamp
    pub mts: i64,
    pub side: Side,
    pub amount: Decimal,
    pub price: Decimal,
}

impl Decode for Trade {
    const NAME: &'static str = "trade";
    const MIN_LEN: usize = 4;

    fn decode(row: &Row<'_>) -> DecodeResult<Self> {
        let amount = row.decimal(2, "amount")?;
        Ok(Self {
            id: row.int(0, "id")?,
            mts: row.int(1, "mts")?,
            side: Side::from_amount(amount),
            amount: amount.abs(),
            price: row.decimal(3, "price")?,
        })
    }
}

/// Executed trade on a funding currency
///
/// Wire layout: `[ID, MTS, AMOUNT, RATE, PERIOD]`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FundingTrade {
    pub id: i64,
    pub mts: i64,
    pub side: Side,
    pub amount: Decimal,
    pub rate: Decimal,
    /// Funding period in days
    pub period: i64,
}

impl Decode for FundingTrade {
    const NAME: &'static str = "funding_trade";
    const MIN_LEN: usize = 5;

    fn decode(row: &Row<'_>) -> DecodeResult<Self> {
        let amount = row.decimal(2, "amount")?;
        Ok(Self {
            id: row.int(0, "id")?,
            mts: row.int(1, "mts")?,
            side: Side::from_amount(amount),
            amount: amount.abs(),
            rate: row.decimal(3, "rate")?,
            period: row.int(4, "period")?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::decode_snapshot;
    use rust_decimal_macros::dec;
    use serde_json::json;

    #[test]
    fn test_sell_trade() {
        let trade =
            Trade::from_value(&json!([401597395, 1574694478808_i64, -0.005, 7245.3])).unwrap();
        assert_eq!(trade.id, 401597395);
        assert_eq!(trade.side, Side::Sell);
        assert_eq!(trade.amount, dec!(0.005));
        assert_eq!(trade.price, dec!(7245.3));
    }

    #[test]
    fn test_snapshot_keeps_order_and_isolates_errors() {
        let rows = vec![
            vec![json!(1), json!(10), json!(0.5), json!(100)],
            vec![json!(2), json!(11)],
            vec![json!(3), json!(12), json!(-1), json!(101)],
        ];
        let decoded = decode_snapshot::<Trade>(&rows);

        assert_eq!(decoded.len(), 3);
        assert_eq!(decoded[0].as_ref().unwrap().id, 1);
        assert!(decoded[1].is_err());
        assert_eq!(decoded[2].as_ref().unwrap().id, 3);
        assert_eq!(decoded[2].as_ref().unwrap().side, Side::Sell);
    }

    #[test]
    fn test_funding_trade() {
        let raw = json!([133323543, 1574694605000_i64, -59.84, 0.00023647, 2]);
        let trade = FundingTrade::from_value(&raw).unwrap();
        assert_eq!(trade.side, Side::Sell);
        assert_eq!(trade.amount, dec!(59.84));
        assert_eq!(trade.rate, dec!(0.00023647));
        assert_eq!(trade.period, 2);
    }
}
