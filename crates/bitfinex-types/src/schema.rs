//! Runtime schema selection and the decoded event union

use crate::book::BookLevel;
use crate::candle::Candle;
use crate::codec::Decode;
use crate::enums::{BookLayout, Channel, Precision};
use crate::error::DecodeResult;
use crate::execution::{Execution, Notification};
use crate::funding::FundingOffer;
use crate::order::Order;
use crate::position::Position;
use crate::pulse::Post;
use crate::symbol::SymbolKind;
use crate::ticker::{FundingTicker, Ticker};
use crate::trade::{FundingTrade, Trade};
use crate::wallet::WalletEntry;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Positional layout to apply to a row, chosen at runtime
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Schema {
    /// Streaming trading ticker (symbol supplied by the subscription)
    Ticker { symbol: String },
    /// Streaming funding ticker
    FundingTicker { symbol: String },
    Trade,
    FundingTrade,
    Book(BookLayout),
    Candle,
    Order,
    Position,
    Wallet,
    FundingOffer,
    Execution,
    Notification,
    Post,
}

impl Schema {
    /// Schema of the data frames on a public channel
    ///
    /// `precision` only matters for the book channel. Returns `None` for the
    /// account channel, whose rows are typed per message tag.
    pub fn for_channel(channel: Channel, symbol: &str, precision: Precision) -> Option<Self> {
        let funding = SymbolKind::of(symbol) == SymbolKind::Funding;
        match channel {
            Channel::Ticker if funding => Some(Self::FundingTicker { symbol: symbol.to_string() }),
            Channel::Ticker => Some(Self::Ticker { symbol: symbol.to_string() }),
            Channel::Trades if funding => Some(Self::FundingTrade),
            Channel::Trades => Some(Self::Trade),
            Channel::Book => Some(Self::Book(precision.layout())),
            Channel::Candles => Some(Self::Candle),
            Channel::Account => None,
        }
    }

    /// Schema of an account channel message, by its tag
    pub fn for_account_tag(tag: &str) -> Option<Self> {
        match tag {
            "os" | "on" | "ou" | "oc" => Some(Self::Order),
            "ps" | "pn" | "pu" | "pc" => Some(Self::Position),
            "ws" | "wu" => Some(Self::Wallet),
            "fos" | "fon" | "fou" | "foc" => Some(Self::FundingOffer),
            "te" | "tu" => Some(Self::Execution),
            "n" => Some(Self::Notification),
            _ => None,
        }
    }

    /// Decode one row with this schema
    pub fn decode(&self, values: &[Value]) -> DecodeResult<DomainEvent> {
        Ok(match self {
            Self::Ticker { symbol } => DomainEvent::Ticker(Ticker::from_stream(symbol, values)?),
            Self::FundingTicker { symbol } => {
                DomainEvent::FundingTicker(FundingTicker::from_stream(symbol, values)?)
            }
            Self::Trade => DomainEvent::Trade(Trade::from_raw(values)?),
            Self::FundingTrade => DomainEvent::FundingTrade(FundingTrade::from_raw(values)?),
            Self::Book(layout) => DomainEvent::BookLevel(BookLevel::from_raw(*layout, values)?),
            Self::Candle => DomainEvent::Candle(Candle::from_raw(values)?),
            Self::Order => DomainEvent::Order(Order::from_raw(values)?),
            Self::Position => DomainEvent::Position(Position::from_raw(values)?),
            Self::Wallet => DomainEvent::Wallet(WalletEntry::from_raw(values)?),
            Self::FundingOffer => DomainEvent::FundingOffer(FundingOffer::from_raw(values)?),
            Self::Execution => DomainEvent::Execution(Execution::from_raw(values)?),
            Self::Notification => DomainEvent::Notification(Notification::from_raw(values)?),
            Self::Post => DomainEvent::Post(Post::from_raw(values)?),
        })
    }

    /// Decode every row of a snapshot, one result per row
    pub fn decode_all(&self, rows: &[Vec<Value>]) -> Vec<DecodeResult<DomainEvent>> {
        rows.iter().map(|row| self.decode(row)).collect()
    }
}

/// A decoded data row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum DomainEvent {
    Ticker(Ticker),
    FundingTicker(FundingTicker),
    Trade(Trade),
    FundingTrade(FundingTrade),
    BookLevel(BookLevel),
    Candle(Candle),
    Order(Order),
    Position(Position),
    Wallet(WalletEntry),
    FundingOffer(FundingOffer),
    Execution(Execution),
    Notification(Notification),
    Post(Post),
}

impl DomainEvent {
    /// Short name of the entity kind
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Ticker(_) => "ticker",
            Self::FundingTicker(_) => "funding_ticker",
            Self::Trade(_) => "trade",
            Self::FundingTrade(_) => "funding_trade",
            Self::BookLevel(_) => "book_level",
            Self::Candle(_) => "candle",
            Self::Order(_) => "order",
            Self::Position(_) => "position",
            Self::Wallet(_) => "wallet",
            Self::FundingOffer(_) => "funding_offer",
            Self::Execution(_) => "execution",
            Self::Notification(_) => "notification",
            Self::Post(_) => "post",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::enums::BookAction;
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;
    use serde_json::json;

    #[test]
    fn test_schema_for_channel() {
        assert_eq!(
            Schema::for_channel(Channel::Trades, "tBTCUSD", Precision::P0),
            Some(Schema::Trade)
        );
        assert_eq!(
            Schema::for_channel(Channel::Trades, "fUSD", Precision::P0),
            Some(Schema::FundingTrade)
        );
        assert_eq!(
            Schema::for_channel(Channel::Book, "tBTCUSD", Precision::R0),
            Some(Schema::Book(BookLayout::Raw))
        );
        assert_eq!(Schema::for_channel(Channel::Account, "", Precision::P0), None);
    }

    #[test]
    fn test_precision_selects_layout_before_decoding() {
        let row = json!([7245, 0, 1.5]);
        let row = row.as_array().unwrap();

        let aggregated = Schema::Book(Precision::P0.layout()).decode(row).unwrap();
        let DomainEvent::BookLevel(level) = aggregated else {
            panic!("expected book level");
        };
        assert_eq!(level.action, BookAction::Remove);
        assert_eq!(level.price, dec!(7245));

        // Same numbers read as [id, price, amount]
        let raw = Schema::Book(Precision::R0.layout()).decode(row).unwrap();
        let DomainEvent::BookLevel(level) = raw else {
            panic!("expected book level");
        };
        assert_eq!(level.id, Some(7245));
        assert_eq!(level.price, Decimal::ZERO);
    }

    #[test]
    fn test_account_tags() {
        assert_eq!(Schema::for_account_tag("on"), Some(Schema::Order));
        assert_eq!(Schema::for_account_tag("wu"), Some(Schema::Wallet));
        assert_eq!(Schema::for_account_tag("foc"), Some(Schema::FundingOffer));
        assert_eq!(Schema::for_account_tag("bu"), None);
    }

    #[test]
    fn test_decode_all_isolates_failures() {
        let rows = vec![
            vec![json!(1), json!(1574694478808_i64), json!(0.1), json!(100)],
            vec![json!(2)],
            vec![json!(3), json!(1574694478809_i64), json!(-0.2), json!(101)],
        ];
        let results = Schema::Trade.decode_all(&rows);
        assert_eq!(results.len(), 3);
        assert!(results[0].is_ok());
        assert!(results[1].is_err());
        assert_eq!(results[2].as_ref().unwrap().kind(), "trade");
    }

    #[test]
    fn test_stream_ticker_symbol_normalized() {
        let row = json!([7000, 1, 7001, 2, -5, -0.01, 7000.5, 1000, 7100, 6900]);
        let schema = Schema::for_channel(Channel::Ticker, "tBTCUSD", Precision::P0).unwrap();
        let DomainEvent::Ticker(ticker) = schema.decode(row.as_array().unwrap()).unwrap() else {
            panic!("expected ticker");
        };
        assert_eq!(ticker.symbol, "btcusd");
        assert_eq!(ticker.low, dec!(6900));
    }
}
