//! Runtime Configuration
//!
//! Two-tier philosophy: hot-path-sensitive tunables (bucket size, slot
//! count, fixed-point scale) stay compile-time constants in
//! [`crate::core::types`]. Everything cold-path loads at runtime from a
//! TOML file into [`Config`]:
//!
//! - `[meta]` — symbol identity
//! - `[orderbook]` — price-ladder bounds
//! - `[orders]` — slot TTLs and replace thresholds
//! - `[venue]` — venue order-size/rate filters
//! - `[exchange]` — market-data endpoints
//! - `[cpu_info]` — clock rebase interval
//! - `[strategy]` — strategy-specific, opaque to this crate
//!
//! `TICKS_`-prefixed environment variables override the file after
//! load, with double-underscore section/field nesting, e.g.
//! `TICKS_ORDERBOOK__TICK_MULTIPLIER_INT=10`.

pub mod types;

pub use types::{
    Config, CpuInfoConfig, ExchangeConfig, MetaConfig, OrderbookConfig, OrdersConfig,
    StrategyConfig, VenueConfig,
};

use anyhow::{Context, Result};
use std::path::Path;

impl Config {
    /// Load from a TOML file, then apply `TICKS_`-prefixed env var
    /// overrides on top.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("reading config file {}", path.display()))?;
        let mut config: Config = toml::from_str(&raw)
            .with_context(|| format!("parsing config file {}", path.display()))?;
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    pub fn load_default() -> Result<Self> {
        Self::load("config/default.toml")
    }

    /// Overlay `TICKS_SECTION__FIELD=value` environment variables onto
    /// an already-parsed config. Unrecognized keys are ignored; a
    /// recognized key with a value that won't parse is also ignored —
    /// malformed overrides should not crash a running process.
    fn apply_env_overrides(&mut self) {
        for (key, value) in std::env::vars() {
            let Some(rest) = key.strip_prefix("TICKS_") else {
                continue;
            };
            let Some((section, field)) = rest.split_once("__") else {
                continue;
            };
            let section = section.to_ascii_lowercase();
            let field = field.to_ascii_lowercase();
            match (section.as_str(), field.as_str()) {
                ("meta", "ticker") => self.meta.ticker = value,
                ("meta", "ticker_size") => {
                    if let Ok(v) = value.parse() {
                        self.meta.ticker_size = v;
                    }
                }
                ("orderbook", "min_price_int") => {
                    if let Ok(v) = value.parse() {
                        self.orderbook.min_price_int = v;
                    }
                }
                ("orderbook", "max_price_int") => {
                    if let Ok(v) = value.parse() {
                        self.orderbook.max_price_int = v;
                    }
                }
                ("orderbook", "tick_multiplier_int") => {
                    if let Ok(v) = value.parse() {
                        self.orderbook.tick_multiplier_int = v;
                    }
                }
                ("orders", "ttl_reserved_ns") => {
                    if let Ok(v) = value.parse() {
                        self.orders.ttl_reserved_ns = v;
                    }
                }
                ("orders", "ttl_live_ns") => {
                    if let Ok(v) = value.parse() {
                        self.orders.ttl_live_ns = v;
                    }
                }
                ("exchange", "md_api_host") => self.exchange.md_api_host = value,
                ("exchange", "md_stream_host") => self.exchange.md_stream_host = value,
                ("exchange", "md_port") => {
                    if let Ok(v) = value.parse() {
                        self.exchange.md_port = v;
                    }
                }
                _ => {}
            }
        }
    }

    /// Reject inconsistent configuration up front rather than failing
    /// later on the hot path.
    pub fn validate(&self) -> Result<()> {
        if self.meta.ticker.trim().is_empty() {
            anyhow::bail!("meta.ticker must not be empty");
        }
        if self.meta.ticker_size <= 0.0 {
            anyhow::bail!("meta.ticker_size must be positive");
        }

        if self.orderbook.min_price_int > self.orderbook.max_price_int {
            anyhow::bail!(
                "orderbook.min_price_int ({}) must be <= orderbook.max_price_int ({})",
                self.orderbook.min_price_int,
                self.orderbook.max_price_int
            );
        }
        if self.orderbook.tick_multiplier_int <= 0 {
            anyhow::bail!("orderbook.tick_multiplier_int must be positive");
        }

        if self.orders.ttl_reserved_ns == 0 {
            anyhow::bail!("orders.ttl_reserved_ns must be positive");
        }
        if self.orders.ttl_live_ns == 0 {
            anyhow::bail!("orders.ttl_live_ns must be positive");
        }

        if self.venue.minimum_order_qty > 0.0
            && self.venue.maximum_order_qty > 0.0
            && self.venue.minimum_order_qty > self.venue.maximum_order_qty
        {
            anyhow::bail!(
                "venue.minimum_order_qty ({}) must be <= venue.maximum_order_qty ({})",
                self.venue.minimum_order_qty,
                self.venue.maximum_order_qty
            );
        }

        if self.cpu_info.interval == 0 {
            anyhow::bail!("cpu_info.interval must be positive");
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_config() -> Config {
        Config {
            meta: MetaConfig {
                ticker: "BTCUSDT".to_string(),
                ticker_size: 0.1,
                level: 20,
            },
            orderbook: OrderbookConfig::default(),
            orders: OrdersConfig::default(),
            venue: VenueConfig::default(),
            exchange: ExchangeConfig::default(),
            cpu_info: CpuInfoConfig::default(),
            strategy: StrategyConfig::default(),
        }
    }

    #[test]
    fn default_config_validates() {
        assert!(valid_config().validate().is_ok());
    }

    #[test]
    fn empty_ticker_rejected() {
        let mut config = valid_config();
        config.meta.ticker.clear();
        assert!(config.validate().is_err());
    }

    #[test]
    fn inverted_price_bounds_rejected() {
        let mut config = valid_config();
        config.orderbook.min_price_int = 100;
        config.orderbook.max_price_int = 50;
        assert!(config.validate().is_err());
    }

    #[test]
    fn inverted_venue_qty_bounds_rejected() {
        let mut config = valid_config();
        config.venue.minimum_order_qty = 10.0;
        config.venue.maximum_order_qty = 1.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn env_override_replaces_ticker() {
        let mut config = valid_config();
        std::env::set_var("TICKS_META__TICKER", "ETHUSDT");
        config.apply_env_overrides();
        std::env::remove_var("TICKS_META__TICKER");
        assert_eq!(config.meta.ticker, "ETHUSDT");
    }
}
