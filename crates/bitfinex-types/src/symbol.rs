//! Symbol helpers
//!
//! Bitfinex prefixes symbols with a single-character type tag: `t` for
//! trading pairs (`tBTCUSD`) and `f` for funding currencies (`fUSD`).

/// Kind of instrument a symbol refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SymbolKind {
    /// Trading pair, `t` prefix
    Trading,
    /// Funding currency, `f` prefix
    Funding,
}

impl SymbolKind {
    /// Classify a symbol by its prefix; unprefixed symbols count as trading
    pub fn of(symbol: &str) -> Self {
        if symbol.starts_with('f') {
            Self::Funding
        } else {
            Self::Trading
        }
    }
}

/// Lowercase a symbol and strip its type prefix: `tBTCUSD` -> `btcusd`
pub fn normalize_symbol(symbol: &str) -> String {
    let stripped = match symbol.chars().next() {
        Some('t') | Some('f') if symbol.len() > 1 => &symbol[1..],
        _ => symbol,
    };
    stripped.to_lowercase()
}

/// Canonical wire form of a symbol: `BTCUSD` and `btcusd` -> `tBTCUSD`.
///
/// Symbols that already carry a type prefix (`tBTCUSD`, `fUSD`) are kept.
pub fn wire_symbol(symbol: &str) -> String {
    let mut chars = symbol.chars();
    match (chars.next(), chars.next()) {
        (Some('t' | 'f'), Some(c)) if !c.is_ascii_lowercase() => symbol.to_string(),
        _ if symbol.is_empty() => String::new(),
        _ => format!("t{}", symbol.to_uppercase()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_symbol() {
        assert_eq!(normalize_symbol("tBTCUSD"), "btcusd");
        assert_eq!(normalize_symbol("fUSD"), "usd");
        assert_eq!(normalize_symbol("tETH:USTF0"), "eth:ustf0");
        assert_eq!(normalize_symbol("t"), "t");
        assert_eq!(normalize_symbol(""), "");
    }

    #[test]
    fn test_wire_symbol() {
        assert_eq!(wire_symbol("tBTCUSD"), "tBTCUSD");
        assert_eq!(wire_symbol("fUSD"), "fUSD");
        assert_eq!(wire_symbol("BTCUSD"), "tBTCUSD");
        assert_eq!(wire_symbol("btcusd"), "tBTCUSD");
        assert_eq!(wire_symbol("tETH:USTF0"), "tETH:USTF0");
        assert_eq!(wire_symbol(""), "");
    }

    #[test]
    fn test_symbol_kind() {
        assert_eq!(SymbolKind::of("tBTCUSD"), SymbolKind::Trading);
        assert_eq!(SymbolKind::of("fUSD"), SymbolKind::Funding);
    }
}
