//! Account trade executions and notifications

use crate::codec::{Decode, Row};
use crate::enums::Side;
use crate::error::DecodeResult;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A fill on one of the account's orders
///
/// Wire layout: `[ID, SYMBOL, MTS_CREATE, ORDER_ID, EXEC_AMOUNT, EXEC_PRICE,
/// ORDER_TYPE, ORDER_PRICE, MAKER, FEE, FEE_CURRENCY, CID]`. The `te`
/// (executed) variant stops after `MAKER`; fees arrive with `tu`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Execution {
    pub id: i64,
    pub symbol: String,
    pub mts: i64,
    pub order_id: i64,
    pub side: Side,
    /// Absolute executed amount
    pub amount: Decimal,
    pub price: Decimal,
    pub order_type: String,
    pub order_price: Decimal,
    pub maker: bool,
    /// Fee, negative when charged
    pub fee: Decimal,
    pub fee_currency: String,
    pub cid: i64,
}

impl Decode for Execution {
    const NAME: &'static str = "execution";
    const MIN_LEN: usize = 6;

    fn decode(row: &Row<'_>) -> DecodeResult<Self> {
        let amount = row.decimal(4, "exec_amount")?;
        Ok(Self {
            id: row.int(0, "id")?,
            symbol: row.string(1, "symbol")?,
            mts: row.int(2, "mts")?,
            order_id: row.int(3, "order_id")?,
            side: Side::from_amount(amount),
            amount: amount.abs(),
            price: row.decimal(5, "exec_price")?,
            order_type: row.string(6, "order_type")?,
            order_price: row.decimal(7, "order_price")?,
            // maker is 1, taker is -1
            maker: row.int(8, "maker")? > 0,
            fee: row.decimal(9, "fee")?,
            fee_currency: row.string(10, "fee_currency")?,
            cid: row.int(11, "cid")?,
        })
    }
}

/// Server notification (order submit/cancel results and similar)
///
/// Wire layout: `[MTS, TYPE, MESSAGE_ID, _, NOTIFY_INFO, CODE, STATUS, TEXT]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notification {
    pub mts: i64,
    /// e.g. `on-req`, `oc-req`, `fon-req`
    pub kind: String,
    pub message_id: i64,
    /// Nested payload, shape depends on `kind`
    pub info: Value,
    pub code: i64,
    /// `SUCCESS`, `ERROR`, `FAILURE`, ...
    pub status: String,
    pub text: String,
}

impl Notification {
    /// Check if the notification reports success
    pub fn is_success(&self) -> bool {
        self.status.eq_ignore_ascii_case("SUCCESS")
    }
}

impl Decode for Notification {
    const NAME: &'static str = "notification";
    const MIN_LEN: usize = 8;

    fn decode(row: &Row<'_>) -> DecodeResult<Self> {
        Ok(Self {
            mts: row.int(0, "mts")?,
            kind: row.string(1, "type")?,
            message_id: row.int(2, "message_id")?,
            info: row.raw_value(4),
            code: row.int(5, "code")?,
            status: row.string(6, "status")?,
            text: row.string(7, "text")?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use serde_json::json;

    #[test]
    fn test_executed_without_fee() {
        let raw = json!([
            402088407, "tETHUST", 1574963975602_i64, 34938060782_i64, -0.2, 153.57, "MARKET", 0, -1
        ]);
        let exec = Execution::from_value(&raw).unwrap();
        assert_eq!(exec.side, Side::Sell);
        assert_eq!(exec.amount, dec!(0.2));
        assert!(!exec.maker);
        assert_eq!(exec.fee, Decimal::ZERO);
        assert_eq!(exec.fee_currency, "");
    }

    #[test]
    fn test_execution_update_with_fee() {
        let raw = json!([
            402088407, "tETHUST", 1574963975602_i64, 34938060782_i64, 0.2, 153.57, "EXCHANGE LIMIT",
            153.57, 1, -0.061, "USD", 1574963975001_i64
        ]);
        let exec = Execution::from_value(&raw).unwrap();
        assert!(exec.maker);
        assert_eq!(exec.fee, dec!(-0.061));
        assert_eq!(exec.fee_currency, "USD");
        assert_eq!(exec.cid, 1574963975001);
    }

    #[test]
    fn test_notification() {
        let raw = json!([
            1575289447641_i64, "ou-req", null, null,
            [1185815100, null, 1575289350475_i64, "tETHUSD"],
            null, "SUCCESS", "Submitting update to limit buy order for 0.1 ETH."
        ]);
        let note = Notification::from_value(&raw).unwrap();
        assert_eq!(note.kind, "ou-req");
        assert!(note.is_success());
        assert_eq!(note.message_id, 0);
        assert_eq!(note.info[3], "tETHUSD");
    }
}
