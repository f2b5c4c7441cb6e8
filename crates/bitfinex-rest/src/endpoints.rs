//! Endpoint helpers that decode positional responses with the codec
//!
//! Each helper returns one result per row, so a single malformed row never
//! hides the others.

use crate::client::RestClient;
use crate::error::RestResult;
use bitfinex_types::{
    decode_list, DecodeResult, Decimal, FundingTicker, Order, Post, Ticker, WalletEntry,
};
use serde::Deserialize;
use serde_json::{json, Map, Value};
use tracing::debug;

/// v1 balance line (`/v1/balances`)
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Balance {
    #[serde(rename = "type")]
    pub wallet_type: String,
    pub currency: String,
    pub amount: Decimal,
    pub available: Decimal,
}

impl RestClient {
    /// Trading tickers (`tBTCUSD`, ...)
    pub async fn tickers(&self, symbols: &[&str]) -> RestResult<Vec<DecodeResult<Ticker>>> {
        let rows: Vec<Value> = self
            .public_get(&format!("tickers?symbols={}", symbols.join(",")))
            .await?;
        debug!(count = rows.len(), "Fetched tickers");
        Ok(decode_list(&rows))
    }

    /// Funding tickers (`fUSD`, ...)
    pub async fn funding_tickers(
        &self,
        currencies: &[&str],
    ) -> RestResult<Vec<DecodeResult<FundingTicker>>> {
        let rows: Vec<Value> = self
            .public_get(&format!("tickers?symbols={}", currencies.join(",")))
            .await?;
        Ok(decode_list(&rows))
    }

    /// Latest public Pulse posts
    pub async fn pulse_history(&self, limit: Option<u32>) -> RestResult<Vec<DecodeResult<Post>>> {
        let path = match limit {
            Some(limit) => format!("pulse/hist?limit={}", limit),
            None => "pulse/hist".to_string(),
        };
        let rows: Vec<Value> = self.public_get(&path).await?;
        Ok(decode_list(&rows))
    }

    /// Closed orders, for one symbol or all of them
    pub async fn order_history(
        &self,
        symbol: Option<&str>,
        limit: Option<u32>,
    ) -> RestResult<Vec<DecodeResult<Order>>> {
        let path = match symbol {
            Some(symbol) => format!("auth/r/orders/{}/hist", symbol),
            None => "auth/r/orders/hist".to_string(),
        };
        let body = match limit {
            Some(limit) => json!({ "limit": limit }),
            None => json!({}),
        };
        let rows: Vec<Value> = self.signed_v2(&path, &body).await?;
        Ok(decode_list(&rows))
    }

    /// Wallet balances
    pub async fn wallets(&self) -> RestResult<Vec<DecodeResult<WalletEntry>>> {
        let rows: Vec<Value> = self.signed_v2("auth/r/wallets", &json!({})).await?;
        Ok(decode_list(&rows))
    }

    /// Wallet balances from the v1 API
    pub async fn balances(&self) -> RestResult<Vec<Balance>> {
        self.signed_v1("balances", &Map::new()).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_balance_from_v1_json() {
        let raw = r#"[{"type":"exchange","currency":"btc","amount":"0.5","available":"0.25"}]"#;
        let balances: Vec<Balance> = serde_json::from_str(raw).unwrap();
        assert_eq!(balances[0].wallet_type, "exchange");
        assert_eq!(balances[0].amount, dec!(0.5));
        assert_eq!(balances[0].available, dec!(0.25));
    }
}
