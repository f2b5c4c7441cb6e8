//! Order book level records
//!
//! The book channel sends one of two row layouts depending on the precision
//! the subscription asked for. The layout is picked from the precision tag
//! before decoding; signs then carry meaning:
//!
//! | Layout     | Row                   | Remove when  | Side           |
//! |------------|-----------------------|--------------|----------------|
//! | Raw        | `[ID, PRICE, AMOUNT]` | `PRICE <= 0` | bid if AMOUNT > 0 |
//! | Aggregated | `[PRICE, COUNT, AMOUNT]` | `COUNT <= 0` | bid if AMOUNT > 0 |

use crate::codec::Row;
use crate::enums::{BookAction, BookLayout, Precision};
use crate::error::DecodeResult;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Book side
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BookSide {
    Bid,
    Ask,
}

/// A single book update
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookLevel {
    /// Order id (raw books only)
    pub id: Option<i64>,
    /// Absolute price
    pub price: Decimal,
    /// Number of orders at this level (aggregated books only, 1 for raw)
    pub count: i64,
    /// Absolute amount
    pub amount: Decimal,
    pub side: BookSide,
    pub action: BookAction,
}

impl BookLevel {
    pub const NAME: &'static str = "book_level";
    pub const MIN_LEN: usize = 3;

    /// Decode one row using the given layout
    pub fn from_raw(layout: BookLayout, values: &[Value]) -> DecodeResult<Self> {
        let row = Row::new(Self::NAME, Self::MIN_LEN, values)?;
        match layout {
            BookLayout::Raw => Self::decode_raw(&row),
            BookLayout::Aggregated => Self::decode_aggregated(&row),
        }
    }

    /// Decode one row, choosing the layout from a precision tag
    pub fn with_precision(precision: Precision, values: &[Value]) -> DecodeResult<Self> {
        Self::from_raw(precision.layout(), values)
    }

    /// Decode every row of a snapshot, one result per row
    pub fn snapshot(layout: BookLayout, rows: &[Vec<Value>]) -> Vec<DecodeResult<Self>> {
        rows.iter().map(|row| Self::from_raw(layout, row)).collect()
    }

    /// True if this update removes the level
    pub fn is_removal(&self) -> bool {
        self.action == BookAction::Remove
    }

    fn decode_raw(row: &Row<'_>) -> DecodeResult<Self> {
        let id = row.int(0, "id")?;
        let price = row.decimal(1, "price")?;
        let amount = row.decimal(2, "amount")?;
        let action = if price <= Decimal::ZERO {
            BookAction::Remove
        } else {
            BookAction::Upsert
        };

        Ok(Self {
            id: Some(id),
            price: price.abs(),
            count: 1,
            amount: amount.abs(),
            side: side_of(amount),
            action,
        })
    }

    fn decode_aggregated(row: &Row<'_>) -> DecodeResult<Self> {
        let price = row.decimal(0, "price")?;
        let count = row.int(1, "count")?;
        let amount = row.decimal(2, "amount")?;
        let action = if count <= 0 {
            BookAction::Remove
        } else {
            BookAction::Upsert
        };

        Ok(Self {
            id: None,
            price: price.abs(),
            count,
            amount: amount.abs(),
            side: side_of(amount),
            action,
        })
    }
}

fn side_of(amount: Decimal) -> BookSide {
    if amount > Decimal::ZERO {
        BookSide::Bid
    } else {
        BookSide::Ask
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DecodeError;
    use rust_decimal_macros::dec;
    use serde_json::json;

    fn raw(v: Value) -> Vec<Value> {
        v.as_array().cloned().unwrap_or_default()
    }

    #[test]
    fn test_raw_layout() {
        let cases = [
            (json!([34668, 7239.5, 0.5]), BookAction::Upsert, BookSide::Bid),
            (json!([34669, 7239.6, -1.2]), BookAction::Upsert, BookSide::Ask),
            (json!([34670, 0, 1]), BookAction::Remove, BookSide::Bid),
            (json!([34671, 0, -1]), BookAction::Remove, BookSide::Ask),
            (json!([34672, -5, 2]), BookAction::Remove, BookSide::Bid),
        ];

        for (row, action, side) in cases {
            let level = BookLevel::from_raw(BookLayout::Raw, &raw(row.clone())).unwrap();
            assert_eq!(level.action, action, "row {row}");
            assert_eq!(level.side, side, "row {row}");
            assert!(level.price >= Decimal::ZERO);
            assert!(level.amount >= Decimal::ZERO);
        }

        let level = BookLevel::from_raw(BookLayout::Raw, &raw(json!([7, -5, -2.5]))).unwrap();
        assert_eq!(level.id, Some(7));
        assert_eq!(level.price, dec!(5));
        assert_eq!(level.amount, dec!(2.5));
    }

    #[test]
    fn test_aggregated_layout() {
        let level =
            BookLevel::with_precision(Precision::P0, &raw(json!([7254.7, 3, 3.3]))).unwrap();
        assert_eq!(level.id, None);
        assert_eq!(level.price, dec!(7254.7));
        assert_eq!(level.count, 3);
        assert_eq!(level.side, BookSide::Bid);
        assert_eq!(level.action, BookAction::Upsert);

        let removal =
            BookLevel::with_precision(Precision::P1, &raw(json!([7254.7, 0, -1]))).unwrap();
        assert!(removal.is_removal());
        assert_eq!(removal.side, BookSide::Ask);
        assert_eq!(removal.amount, dec!(1));
    }

    #[test]
    fn test_same_row_differs_by_layout() {
        // [10, 20, 1] is id=10/price=20 raw, but price=10/count=20 aggregated
        let row = raw(json!([10, 20, 1]));
        let as_raw = BookLevel::from_raw(BookLayout::Raw, &row).unwrap();
        let as_agg = BookLevel::from_raw(BookLayout::Aggregated, &row).unwrap();
        assert_eq!(as_raw.price, dec!(20));
        assert_eq!(as_agg.price, dec!(10));
        assert_eq!(as_agg.count, 20);
    }

    #[test]
    fn test_short_row() {
        let err = BookLevel::from_raw(BookLayout::Raw, &raw(json!([1, 2]))).unwrap_err();
        assert!(matches!(err, DecodeError::TooShort { expected: 3, actual: 2, .. }));
    }

    #[test]
    fn test_snapshot() {
        let rows = vec![
            raw(json!([7254.7, 3, 3.3])),
            raw(json!([7254.8, 1, -0.3])),
            raw(json!(["bad", 1, 1])),
        ];
        let levels = BookLevel::snapshot(BookLayout::Aggregated, &rows);
        assert_eq!(levels.len(), 3);
        assert_eq!(levels[1].as_ref().unwrap().side, BookSide::Ask);
        assert!(matches!(
            levels[2],
            Err(DecodeError::TypeMismatch { field: "price", .. })
        ));
    }
}
