//! BitMEX connection settings.

use std::time::Duration;

/// Default request timeout.
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(12);

/// Default client order id prefix.
const DEFAULT_ORDER_ID_PREFIX: &str = "mlk_";

/// Behaviour of the BitMEX adapter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BitmexSettings {
    /// Send limit orders as `ParticipateDoNotInitiate` (maker only).
    pub post_only: bool,
    /// HTTP request timeout.
    pub timeout: Duration,
    /// Prefix of generated client order ids.
    pub order_id_prefix: String,
}

impl Default for BitmexSettings {
    fn default() -> Self {
        Self {
            post_only: false,
            timeout: DEFAULT_TIMEOUT,
            order_id_prefix: DEFAULT_ORDER_ID_PREFIX.to_string(),
        }
    }
}

impl BitmexSettings {
    /// Load overrides from `BITMEX_POST_ONLY` and `BITMEX_TIMEOUT_SECS`.
    ///
    /// Unset or unparsable values keep their defaults.
    pub fn from_env() -> Self {
        let mut settings = Self::default();

        if let Some(post_only) = std::env::var("BITMEX_POST_ONLY")
            .ok()
            .and_then(|v| v.parse::<bool>().ok())
        {
            settings.post_only = post_only;
        }

        if let Some(secs) = std::env::var("BITMEX_TIMEOUT_SECS")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
        {
            settings.timeout = Duration::from_secs(secs);
        }

        settings
    }

    /// Builder method to enable or disable post-only limit orders.
    pub fn with_post_only(mut self, post_only: bool) -> Self {
        self.post_only = post_only;
        self
    }

    /// Builder method to set the client order id prefix.
    pub fn with_order_id_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.order_id_prefix = prefix.into();
        self
    }
}
