//! Margin position records

use crate::codec::{Decode, Row};
use crate::enums::Side;
use crate::error::DecodeResult;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A margin position
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub symbol: String,
    /// `ACTIVE` or `CLOSED`
    pub status: String,
    /// Signed size: positive long, negative short
    pub amount: Decimal,
    pub base_price: Decimal,
    pub margin_funding: Decimal,
    /// 0 for daily, 1 for term
    pub margin_funding_type: i64,
    pub profit_loss: Decimal,
    pub profit_loss_percent: Decimal,
    pub liquidation_price: Decimal,
    pub leverage: Decimal,
    pub id: i64,
    pub mts_create: i64,
    pub mts_update: i64,
    pub position_type: i64,
    pub collateral: Decimal,
    pub collateral_min: Decimal,
    pub meta: Value,
}

impl Position {
    /// Long or short
    pub fn side(&self) -> Side {
        Side::from_amount(self.amount)
    }

    /// Check if the position is still open
    pub fn is_active(&self) -> bool {
        self.status.eq_ignore_ascii_case("ACTIVE")
    }
}

impl Decode for Position {
    const NAME: &'static str = "position";
    const MIN_LEN: usize = 6;

    fn decode(row: &Row<'_>) -> DecodeResult<Self> {
        Ok(Self {
            symbol: row.string(0, "symbol")?,
            status: row.string(1, "status")?,
            amount: row.decimal(2, "amount")?,
            base_price: row.decimal(3, "base_price")?,
            margin_funding: row.decimal(4, "margin_funding")?,
            margin_funding_type: row.int(5, "margin_funding_type")?,
            profit_loss: row.decimal(6, "profit_loss")?,
            profit_loss_percent: row.decimal(7, "profit_loss_percent")?,
            liquidation_price: row.decimal(8, "liquidation_price")?,
            leverage: row.decimal(9, "leverage")?,
            id: row.int(11, "id")?,
            mts_create: row.int(12, "mts_create")?,
            mts_update: row.int(13, "mts_update")?,
            position_type: row.int(15, "position_type")?,
            collateral: row.decimal(17, "collateral")?,
            collateral_min: row.decimal(18, "collateral_min")?,
            meta: row.raw_value(19),
        })
    }
}
