//! Lifecycle manager configuration.

use execution_core::JitterRange;
use rust_decimal::Decimal;
use std::time::Duration;

/// Configuration of one [`Bargain`](crate::Bargain) instance.
#[derive(Debug, Clone, PartialEq)]
pub struct BargainConfig {
    /// Symbol orders are placed and closed on.
    pub symbol: String,

    /// Prefix of every client order id this bot issues.
    pub order_id_prefix: String,

    /// Contracts included in the portfolio delta.
    pub contracts: Vec<String>,

    /// Default window of [`Bargain::find_recent_by_key`](crate::Bargain::find_recent_by_key).
    pub recent_window: Duration,

    /// Bounds of the randomized reference price refresh interval.
    pub ref_price_jitter: JitterRange,

    /// Price views are rounded to this tick when the venue reports none.
    pub tick_size: Decimal,

    /// Return `MalformedExecutionBatch` instead of dropping minority-shaped
    /// execution rows.
    pub strict_execution_batches: bool,
}

impl Default for BargainConfig {
    fn default() -> Self {
        Self {
            symbol: "XBTUSD".to_string(),
            order_id_prefix: "mlk_".to_string(),
            contracts: vec!["XBTUSD".to_string()],
            recent_window: Duration::from_secs(30),
            ref_price_jitter: JitterRange::default(),
            tick_size: Decimal::new(5, 1), // 0.5
            strict_execution_batches: false,
        }
    }
}

impl BargainConfig {
    /// Create a config with all default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Load overrides from `BARGAIN_SYMBOL`, `BARGAIN_ORDER_ID_PREFIX`,
    /// `BARGAIN_CONTRACTS` (comma separated), `BARGAIN_TICK_SIZE` and
    /// `BARGAIN_STRICT_EXECUTIONS`.
    ///
    /// Unset or unparsable values keep their defaults.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(symbol) = std::env::var("BARGAIN_SYMBOL") {
            if !symbol.trim().is_empty() {
                config.symbol = symbol.trim().to_string();
            }
        }

        if let Ok(prefix) = std::env::var("BARGAIN_ORDER_ID_PREFIX") {
            config.order_id_prefix = prefix;
        }

        if let Ok(contracts) = std::env::var("BARGAIN_CONTRACTS") {
            let contracts = parse_contracts(&contracts);
            if !contracts.is_empty() {
                config.contracts = contracts;
            }
        }

        if let Some(tick) = std::env::var("BARGAIN_TICK_SIZE")
            .ok()
            .and_then(|v| parse_tick_size(&v))
        {
            config.tick_size = tick;
        }

        if let Some(strict) = std::env::var("BARGAIN_STRICT_EXECUTIONS")
            .ok()
            .and_then(|v| v.parse::<bool>().ok())
        {
            config.strict_execution_batches = strict;
        }

        config
    }

    /// Builder method to set the traded symbol.
    pub fn with_symbol(mut self, symbol: impl Into<String>) -> Self {
        self.symbol = symbol.into();
        self
    }

    /// Builder method to set the client order id prefix.
    pub fn with_order_id_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.order_id_prefix = prefix.into();
        self
    }

    /// Builder method to set the portfolio contracts.
    pub fn with_contracts(mut self, contracts: Vec<String>) -> Self {
        self.contracts = contracts;
        self
    }

    /// Builder method to set the recent correlation window.
    pub fn with_recent_window(mut self, window: Duration) -> Self {
        self.recent_window = window;
        self
    }

    /// Builder method to set the reference price jitter.
    pub fn with_ref_price_jitter(mut self, jitter: JitterRange) -> Self {
        self.ref_price_jitter = jitter;
        self
    }

    /// Builder method to set the price tick.
    pub fn with_tick_size(mut self, tick_size: Decimal) -> Self {
        self.tick_size = tick_size;
        self
    }

    /// Builder method to enable/disable strict execution batches.
    pub fn with_strict_execution_batches(mut self, strict: bool) -> Self {
        self.strict_execution_batches = strict;
        self
    }
}

fn parse_contracts(list: &str) -> Vec<String> {
    list.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

fn parse_tick_size(value: &str) -> Option<Decimal> {
    value
        .trim()
        .parse::<Decimal>()
        .ok()
        .filter(|tick| *tick > Decimal::ZERO)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_defaults() {
        let config = BargainConfig::default();
        assert_eq!(config.symbol, "XBTUSD");
        assert_eq!(config.order_id_prefix, "mlk_");
        assert_eq!(config.contracts, vec!["XBTUSD".to_string()]);
        assert_eq!(config.recent_window, Duration::from_secs(30));
        assert_eq!(config.ref_price_jitter.min, Duration::from_secs(2));
        assert_eq!(config.ref_price_jitter.max, Duration::from_secs(8));
        assert_eq!(config.tick_size, dec!(0.5));
        assert!(!config.strict_execution_batches);
    }

    #[test]
    fn test_parse_contracts() {
        assert_eq!(
            parse_contracts(" XBTUSD, ETHUSD ,,"),
            vec!["XBTUSD".to_string(), "ETHUSD".to_string()]
        );
        assert!(parse_contracts("").is_empty());
    }

    #[test]
    fn test_parse_tick_size() {
        assert_eq!(parse_tick_size(" 0.01 "), Some(dec!(0.01)));
        assert_eq!(parse_tick_size("0"), None);
        assert_eq!(parse_tick_size("-0.5"), None);
        assert_eq!(parse_tick_size("half"), None);
    }

    #[test]
    fn test_builders() {
        let config = BargainConfig::new()
            .with_symbol("ETHUSD")
            .with_order_id_prefix("bot_")
            .with_contracts(vec!["ETHUSD".into()])
            .with_tick_size(dec!(0.05))
            .with_strict_execution_batches(true);

        assert_eq!(config.symbol, "ETHUSD");
        assert_eq!(config.order_id_prefix, "bot_");
        assert_eq!(config.tick_size, dec!(0.05));
        assert!(config.strict_execution_batches);
    }
}
