//! Funding offer records

use crate::codec::{Decode, Row};
use crate::error::DecodeResult;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// An offer to lend (or borrow) on the funding market
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FundingOffer {
    pub id: i64,
    pub symbol: String,
    pub mts_create: i64,
    pub mts_update: i64,
    pub amount: Decimal,
    pub amount_orig: Decimal,
    /// `LIMIT` or `FRRDELTAVAR`
    pub offer_type: String,
    pub flags: i64,
    pub status: String,
    pub rate: Decimal,
    /// Period in days
    pub period: i64,
    pub notify: bool,
    pub hidden: bool,
    pub renew: bool,
}

impl Decode for FundingOffer {
    const NAME: &'static str = "funding_offer";
    const MIN_LEN: usize = 16;

    fn decode(row: &Row<'_>) -> DecodeResult<Self> {
        Ok(Self {
            id: row.int(0, "id")?,
            symbol: row.string(1, "symbol")?,
            mts_create: row.int(2, "mts_create")?,
            mts_update: row.int(3, "mts_update")?,
            amount: row.decimal(4, "amount")?,
            amount_orig: row.decimal(5, "amount_orig")?,
            offer_type: row.string(6, "offer_type")?,
            flags: row.int(9, "flags")?,
            status: row.string(10, "status")?,
            rate: row.decimal(14, "rate")?,
            period: row.int(15, "period")?,
            notify: row.flag(16, "notify")?,
            hidden: row.flag(17, "hidden")?,
            renew: row.flag(19, "renew")?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use serde_json::json;

    #[test]
    fn test_funding_offer() {
        let raw = json!([
            41237920, "fETH", 1573912039000_i64, 1573912039000_i64, 0.5, 0.5, "LIMIT", null, null,
            0, "ACTIVE", null, null, null, 0.0024, 2, 0, 0, null, 0, null
        ]);
        let offer = FundingOffer::from_value(&raw).unwrap();
        assert_eq!(offer.id, 41237920);
        assert_eq!(offer.symbol, "fETH");
        assert_eq!(offer.rate, dec!(0.0024));
        assert_eq!(offer.period, 2);
        assert!(!offer.renew);
    }

    #[test]
    fn test_funding_offer_rejects_wrong_status_type() {
        let raw = json!([
            41237920, "fETH", 0, 0, 0.5, 0.5, "LIMIT", null, null, 0, 17, null, null, null,
            0.0024, 2
        ]);
        assert!(FundingOffer::from_value(&raw).is_err());
    }
}
