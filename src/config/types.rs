//! Runtime configuration record.
//!
//! Every section is optional in the TOML file; [`Config::validate`]
//! only enforces a handful of cross-field invariants (non-empty
//! ticker, `min <= max` price bounds, positive TTLs, consistent venue
//! filters). All numeric sections use plain `f64`/`i64`/`u64` rather
//! than `Decimal` — this is cold-path configuration, not the hot-path
//! fixed-point types in [`crate::core::types`].

use serde::{Deserialize, Serialize};

/// Top-level configuration, loaded from a TOML file with `TICKS_`
/// env-var overrides layered on top (double-underscore nesting, e.g.
/// `TICKS_ORDERBOOK__TICK_MULTIPLIER_INT=10`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub meta: MetaConfig,
    #[serde(default)]
    pub orderbook: OrderbookConfig,
    #[serde(default)]
    pub orders: OrdersConfig,
    #[serde(default)]
    pub venue: VenueConfig,
    #[serde(default)]
    pub exchange: ExchangeConfig,
    #[serde(default)]
    pub cpu_info: CpuInfoConfig,
    #[serde(default)]
    pub strategy: StrategyConfig,
}

/// `[meta]`: identity of the symbol this process trades.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetaConfig {
    pub ticker: String,
    /// Display tick size, e.g. `0.1` for a symbol quoted to one decimal.
    pub ticker_size: f64,
    /// Book depth level subscribed to (venue-specific, e.g. 20 or 100).
    pub level: u32,
}

/// `[orderbook]`: integer price-ladder bounds, scaled by
/// [`crate::core::types::PRICE_SCALE`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderbookConfig {
    #[serde(default = "default_min_price_int")]
    pub min_price_int: i64,
    #[serde(default = "default_max_price_int")]
    pub max_price_int: i64,
    /// Bucket width as a multiple of the venue's raw tick size.
    #[serde(default = "default_tick_multiplier")]
    pub tick_multiplier_int: i64,
}

impl Default for OrderbookConfig {
    fn default() -> Self {
        Self {
            min_price_int: default_min_price_int(),
            max_price_int: default_max_price_int(),
            tick_multiplier_int: default_tick_multiplier(),
        }
    }
}

/// `[orders]`: slot TTLs and the thresholds below which a replace is
/// skipped as not worth the round trip.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrdersConfig {
    #[serde(default = "default_ttl_reserved_ns")]
    pub ttl_reserved_ns: u64,
    #[serde(default = "default_ttl_live_ns")]
    pub ttl_live_ns: u64,
    #[serde(default)]
    pub min_replace_qty_delta: i64,
    #[serde(default)]
    pub min_replace_tick_delta: i64,
}

impl Default for OrdersConfig {
    fn default() -> Self {
        Self {
            ttl_reserved_ns: default_ttl_reserved_ns(),
            ttl_live_ns: default_ttl_live_ns(),
            min_replace_qty_delta: 0,
            min_replace_tick_delta: 0,
        }
    }
}

/// `[venue]`: venue-imposed order filters, independent of any one
/// [`crate::execution::venue::VenueRules`] instance.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct VenueConfig {
    #[serde(default)]
    pub minimum_order_usdt: f64,
    #[serde(default)]
    pub minimum_order_qty: f64,
    #[serde(default)]
    pub maximum_order_qty: f64,
    #[serde(default)]
    pub minimum_order_time_gap: u64,
}

/// `[exchange]`: market-data endpoint connection settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExchangeConfig {
    #[serde(default = "default_md_api_host")]
    pub md_api_host: String,
    #[serde(default = "default_md_stream_host")]
    pub md_stream_host: String,
    #[serde(default = "default_md_ws_path")]
    pub md_ws_path: String,
    #[serde(default = "default_md_port")]
    pub md_port: u16,
    #[serde(default = "default_true")]
    pub md_use_ssl: bool,
}

impl Default for ExchangeConfig {
    fn default() -> Self {
        Self {
            md_api_host: default_md_api_host(),
            md_stream_host: default_md_stream_host(),
            md_ws_path: default_md_ws_path(),
            md_port: default_md_port(),
            md_use_ssl: true,
        }
    }
}

/// `[cpu_info]`: [`crate::core::clock::FastClock`] rebase parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CpuInfoConfig {
    /// TSC frequency in Hz; 0 means "measure at startup".
    #[serde(default)]
    pub clock: u64,
    /// Hours between rebasing the TSC interpolation against the wall clock.
    #[serde(default = "default_rebase_interval_hours")]
    pub interval: u64,
}

impl Default for CpuInfoConfig {
    fn default() -> Self {
        Self {
            clock: 0,
            interval: default_rebase_interval_hours(),
        }
    }
}

/// `[strategy]`: strategy-specific, out of scope for this crate beyond
/// carrying the raw TOML table through to whatever `Strategy` impl the
/// binary wires up.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct StrategyConfig {
    #[serde(flatten)]
    pub params: std::collections::BTreeMap<String, toml::Value>,
}

fn default_min_price_int() -> i64 {
    0
}
fn default_max_price_int() -> i64 {
    i64::MAX
}
fn default_tick_multiplier() -> i64 {
    1
}
fn default_ttl_reserved_ns() -> u64 {
    50_000_000 // 50ms
}
fn default_ttl_live_ns() -> u64 {
    2_000_000_000 // 2s
}
fn default_md_api_host() -> String {
    String::new()
}
fn default_md_stream_host() -> String {
    String::new()
}
fn default_md_ws_path() -> String {
    "/ws".to_string()
}
fn default_md_port() -> u16 {
    443
}
fn default_rebase_interval_hours() -> u64 {
    6
}
fn default_true() -> bool {
    true
}
