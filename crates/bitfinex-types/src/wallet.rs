//! Wallet records

use crate::codec::{Decode, Row};
use crate::error::DecodeResult;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One wallet line: a (wallet type, currency) balance
///
/// Wire layout: `[WALLET_TYPE, CURRENCY, BALANCE, UNSETTLED_INTEREST,
/// AVAILABLE_BALANCE, LAST_CHANGE, TRADE_DETAILS]`. The available balance is
/// often `null` on streaming updates until a balance calculation is requested.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WalletEntry {
    /// `exchange`, `margin` or `funding`
    pub wallet_type: String,
    pub currency: String,
    pub balance: Decimal,
    pub unsettled_interest: Decimal,
    pub available_balance: Decimal,
    /// Description of the last balance change
    pub last_change: String,
    pub trade_details: Value,
}

impl Decode for WalletEntry {
    const NAME: &'static str = "wallet";
    const MIN_LEN: usize = 4;

    fn decode(row: &Row<'_>) -> DecodeResult<Self> {
        Ok(Self {
            wallet_type: row.string(0, "wallet_type")?,
            currency: row.string(1, "currency")?,
            balance: row.decimal(2, "balance")?,
            unsettled_interest: row.decimal(3, "unsettled_interest")?,
            available_balance: row.decimal(4, "available_balance")?,
            last_change: row.string(5, "last_change")?,
            trade_details: row.raw_value(6),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::decode_list;
    use rust_decimal_macros::dec;
    use serde_json::json;

    #[test]
    fn test_wallet_with_null_available() {
        let entry =
            WalletEntry::from_value(&json!(["exchange", "BTC", 1.61169184, 0, null])).unwrap();
        assert_eq!(entry.wallet_type, "exchange");
        assert_eq!(entry.balance, dec!(1.61169184));
        assert_eq!(entry.available_balance, Decimal::ZERO);
        assert_eq!(entry.last_change, "");
    }

    #[test]
    fn test_wallet_list() {
        let list = json!([
            ["exchange", "USD", 100, 0, 100, "Exchange 0.1 BTC for USD", null],
            ["margin", "BTC"]
        ]);
        let decoded = decode_list::<WalletEntry>(list.as_array().unwrap());
        assert_eq!(decoded.len(), 2);
        assert_eq!(decoded[0].as_ref().unwrap().last_change, "Exchange 0.1 BTC for USD");
        assert!(decoded[1].is_err());
    }
}
