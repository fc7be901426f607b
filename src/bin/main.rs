//! Entry point: parses CLI args, loads configuration, installs
//! logging, then wires the thread topology — MD-read, OE-read,
//! trade-engine, OE-write, keepalive — around the two SPSC queues the
//! trade engine owns. Strategy logic is out of scope for this crate
//! (see `[strategy]` in the config), so the binary plugs in a
//! pass-through [`Strategy`] that quotes nothing; a real deployment
//! swaps it for its own.

use anyhow::{Context, Result};
use clap::Parser;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use ticks::config::Config;
use ticks::core::clock::FastClock;
use ticks::core::types::{Price, Qty, TickerId};
use ticks::data::types::{ExecutionReport, MarketUpdateData};
use ticks::engine::feature_engine::FeatureEngine;
use ticks::engine::reconciler::QuoteIntent;
use ticks::engine::trade_engine::{Strategy, TradeEngine};
use ticks::execution::order_manager::OrderManager;
use ticks::execution::pending_registry::PendingRequestRegistry;
use ticks::execution::venue::{CancelIdScheme, VenueRules};
use ticks::orderbook::book::OrderBook;
use ticks::perf::spsc::SpscQueue;
use ticks::risk::pre_trade::PreTradeFilter;
use ticks::risk::types::RiskLimits;
use tracing::{info, warn};

#[global_allocator]
static GLOBAL: tikv_jemallocator::Jemalloc = tikv_jemallocator::Jemalloc;

#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// Path to the TOML config file.
    #[arg(short, long, default_value = "config/default.toml")]
    config: String,

    /// Log level (overridden by RUST_LOG if set).
    #[arg(short, long, default_value = "info")]
    log_level: String,

    /// Emit structured JSON logs instead of plain text.
    #[arg(long)]
    json_logs: bool,
}

/// No-op strategy: quotes nothing. Stands in for the strategy seam
/// this crate deliberately doesn't implement.
struct PassThroughStrategy;

impl Strategy for PassThroughStrategy {
    fn on_tick(
        &mut self,
        _ticker: TickerId,
        _book: &OrderBook,
        _features: &FeatureEngine,
        _now_ns: u64,
    ) -> Vec<QuoteIntent> {
        Vec::new()
    }
}

fn main() -> Result<()> {
    let args = Args::parse();
    ticks::utils::init_logger(&args.log_level, args.json_logs);

    let config = Config::load(&args.config)
        .with_context(|| format!("loading config from {}", args.config))?;
    info!(ticker = %config.meta.ticker, "configuration loaded");

    let running = Arc::new(AtomicBool::new(true));
    let running_ctrlc = running.clone();
    ctrlc::set_handler(move || {
        warn!("received shutdown signal, stopping trade engine");
        running_ctrlc.store(false, Ordering::SeqCst);
    })
    .context("installing Ctrl+C handler")?;

    let md_queue: Arc<SpscQueue<MarketUpdateData>> = Arc::new(SpscQueue::new(4096));
    let resp_queue: Arc<SpscQueue<ExecutionReport>> = Arc::new(SpscQueue::new(4096));
    let out_queue: Arc<SpscQueue<String>> = Arc::new(SpscQueue::new(4096));

    let venue = VenueRules {
        continuity_rule: ticks::data::sequencer::ContinuityRule::Perpetual,
        cancel_id_scheme: CancelIdScheme::OriginalId,
        min_order_notional_raw: Price::from_double(config.venue.minimum_order_usdt).raw(),
        min_qty: Qty::from_double(config.venue.minimum_order_qty),
        max_qty: if config.venue.maximum_order_qty > 0.0 {
            Qty::from_double(config.venue.maximum_order_qty)
        } else {
            Qty::from_raw(i64::MAX)
        },
        qty_increment: Qty::from_raw(1),
        min_order_time_gap_ns: config.venue.minimum_order_time_gap,
        min_replace_tick_delta: config.orders.min_replace_tick_delta,
        min_replace_qty_delta: config.orders.min_replace_qty_delta,
    };

    let risk_limits = RiskLimits {
        max_order_qty: venue.max_qty,
        max_position_qty: venue.max_qty,
        min_position_qty: ticks::core::types::Qty::from_raw(-venue.max_qty.raw()),
        max_loss: i64::MIN,
    };

    let mut engine = TradeEngine::new(
        md_queue.clone(),
        resp_queue.clone(),
        out_queue.clone(),
        Box::new(FastClock::new(config.cpu_info.interval.saturating_mul(3_600_000))),
        running.clone(),
        config.orderbook.min_price_int,
        config.orderbook.max_price_int,
        8,
        venue,
        PreTradeFilter::new(risk_limits),
        OrderManager::new(config.orders.ttl_reserved_ns, config.orders.ttl_live_ns),
        PassThroughStrategy,
        PendingRequestRegistry::new(),
    );
    let pending_requests = engine.pending_requests();

    // The market-data and order-entry transports themselves (sockets,
    // TLS, venue auth) are out of scope for this crate; these threads
    // stand in for where a real transport would decode bytes off the
    // wire and push onto `md_queue`/`resp_queue`.
    let md_read_running = running.clone();
    let md_read = std::thread::spawn(move || {
        while md_read_running.load(Ordering::Relaxed) {
            std::thread::sleep(Duration::from_millis(1));
        }
    });

    // In a real transport this thread would notice a dropped request
    // (socket reset, timeout) and use `pending_requests` to synthesize
    // a reject report carrying the right ticker/side before pushing it
    // onto `resp_queue`.
    let oe_read_running = running.clone();
    let oe_read = std::thread::spawn(move || {
        while oe_read_running.load(Ordering::Relaxed) {
            let _ = pending_requests.len();
            std::thread::sleep(Duration::from_millis(1));
        }
    });

    let oe_write_running = running.clone();
    let oe_write = std::thread::spawn(move || {
        while oe_write_running.load(Ordering::Relaxed) {
            match out_queue.dequeue() {
                Some(frame) => info!(%frame, "order entry frame ready to send"),
                None => std::thread::sleep(Duration::from_micros(100)),
            }
        }
    });

    let keepalive_running = running.clone();
    let keepalive = std::thread::spawn(move || {
        while keepalive_running.load(Ordering::Relaxed) {
            std::thread::sleep(Duration::from_secs(30));
        }
    });

    info!("trade engine starting");
    engine.run();

    md_read.join().ok();
    oe_read.join().ok();
    oe_write.join().ok();
    keepalive.join().ok();
    info!("trade engine stopped");
    Ok(())
}
