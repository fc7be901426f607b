//! Trade Engine Event Loop
//!
//! Single consumer of both SPSC queues, owning the order book, feature
//! engine, reconciler, venue policy filter, risk filter, order manager,
//! expiry manager, order state manager, and position keeper. Never
//! awaits; busy-polls up to `BATCH_LIMIT_MD`/`BATCH_LIMIT_RESP` items
//! per queue, then backs off through a progressive idle strategy.

use crate::core::clock::Clock;
use crate::core::types::{Price, Side, TickerId};
use crate::data::sequencer::{MarketDataSequencer, SequencerOutput};
use crate::data::types::{ExecutionReport, MarketUpdateData};
use crate::engine::reconciler::{QuoteIntent, Reconciler};
use crate::engine::venue_policy::apply_venue_policy;
use crate::engine::feature_engine::FeatureEngine;
use crate::execution::encoder::encode_json;
use crate::execution::expiry::ExpiryManager;
use crate::execution::order_manager::{OrderManager, SlotState};
use crate::execution::order_state::OrderStateManager;
use crate::execution::pending_registry::PendingRequestRegistry;
use crate::execution::position_keeper::PositionKeeper;
use crate::execution::venue::VenueRules;
use crate::orderbook::book::OrderBook;
use crate::perf::spsc::SpscQueue;
use crate::risk::pre_trade::PreTradeFilter;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

pub const BATCH_LIMIT_MD: usize = 128;
pub const BATCH_LIMIT_RESP: usize = 64;

/// Per-symbol book + feature state, plus the sequencer that gates what
/// reaches the book.
struct SymbolState {
    sequencer: MarketDataSequencer,
    book: OrderBook,
    features: FeatureEngine,
}

/// Pluggable strategy hook: given the current book/feature state for one
/// symbol, return the desired resting-order set. Strategy logic itself is
/// out of scope; this trait is the seam the trade engine ticks through.
pub trait Strategy {
    fn on_tick(
        &mut self,
        ticker: TickerId,
        book: &OrderBook,
        features: &FeatureEngine,
        now_ns: u64,
    ) -> Vec<QuoteIntent>;
}

pub struct TradeEngine<S: Strategy> {
    md_queue: Arc<SpscQueue<MarketUpdateData>>,
    resp_queue: Arc<SpscQueue<ExecutionReport>>,
    out_queue: Arc<SpscQueue<String>>,
    clock: Box<dyn Clock>,
    running: Arc<AtomicBool>,

    symbols: HashMap<TickerId, SymbolState>,
    min_price_int: i64,
    max_price_int: i64,
    vwap_window_pow2: usize,

    reconciler: Reconciler,
    order_manager: OrderManager,
    expiry: ExpiryManager,
    risk: PreTradeFilter,
    position_keeper: PositionKeeper,
    venue: VenueRules,
    strategy: S,
    pending: PendingRequestRegistry,
}

impl<S: Strategy> TradeEngine<S> {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        md_queue: Arc<SpscQueue<MarketUpdateData>>,
        resp_queue: Arc<SpscQueue<ExecutionReport>>,
        out_queue: Arc<SpscQueue<String>>,
        clock: Box<dyn Clock>,
        running: Arc<AtomicBool>,
        min_price_int: i64,
        max_price_int: i64,
        vwap_window_pow2: usize,
        venue: VenueRules,
        risk: PreTradeFilter,
        order_manager: OrderManager,
        strategy: S,
        pending: PendingRequestRegistry,
    ) -> Self {
        Self {
            md_queue,
            resp_queue,
            out_queue,
            clock,
            running,
            symbols: HashMap::new(),
            min_price_int,
            max_price_int,
            vwap_window_pow2,
            reconciler: Reconciler::new(),
            order_manager,
            expiry: ExpiryManager::new(),
            risk,
            position_keeper: PositionKeeper::new(),
            venue,
            strategy,
            pending,
        }
    }

    /// Shared handle the OE-read thread can poll to synthesize reject
    /// reports for requests the transport never delivered.
    pub fn pending_requests(&self) -> PendingRequestRegistry {
        self.pending.clone()
    }

    fn symbol_mut(&mut self, ticker: TickerId) -> &mut SymbolState {
        let min_price_int = self.min_price_int;
        let max_price_int = self.max_price_int;
        let vwap_window_pow2 = self.vwap_window_pow2;
        let rule = self.venue.continuity_rule;
        self.symbols.entry(ticker).or_insert_with(|| SymbolState {
            sequencer: MarketDataSequencer::new(rule),
            book: OrderBook::new(min_price_int, max_price_int),
            features: FeatureEngine::new(vwap_window_pow2),
        })
    }

    /// Drain and process one batch of each queue. Returns `true` if any
    /// work was done, so the caller can decide whether to idle.
    pub fn run_once(&mut self) -> bool {
        let did_md = self.drain_market_data();
        let did_resp = self.drain_execution_reports();
        let did_expiry = self.sweep_expiries();
        did_md || did_resp || did_expiry
    }

    fn drain_market_data(&mut self) -> bool {
        let mut processed = 0;
        while processed < BATCH_LIMIT_MD {
            let Some(msg) = self.md_queue.dequeue() else {
                break;
            };
            processed += 1;
            self.apply_market_update(msg);
        }
        processed > 0
    }

    fn apply_market_update(&mut self, msg: MarketUpdateData) {
        let Some(ticker) = msg.entries.first().map(|e| e.ticker) else {
            return;
        };

        if !msg.is_sequenced() {
            self.apply_events_and_tick(ticker, &msg);
            return;
        }

        let state = self.symbol_mut(ticker);
        match state.sequencer.on_depth_message(msg) {
            SequencerOutput::Pending => {}
            SequencerOutput::Forward(events) => {
                for event in events {
                    self.apply_events_and_tick(ticker, &event);
                }
            }
            SequencerOutput::RequestSnapshot => {
                debug!(ticker = %ticker, "sequencer requested a fresh snapshot");
            }
            SequencerOutput::Fatal(err) => {
                warn!(ticker = %ticker, %err, "sequencer retries exhausted");
            }
        }
    }

    fn apply_events_and_tick(&mut self, ticker: TickerId, msg: &MarketUpdateData) {
        let now_ns = self.clock.now_ns();
        let state = self.symbol_mut(ticker);
        for entry in &msg.entries {
            state.book.on_update(entry);
            if matches!(entry.kind, crate::data::types::MdType::Trade) {
                state.features.on_trade(entry.price.raw(), entry.qty.raw());
            }
        }
        let bbo = state.book.bbo();
        state.features.on_book_update(&bbo);
        self.position_keeper
            .mark_to_market(ticker, (bbo.bid_price.raw() + bbo.ask_price.raw()) / 2);

        let intents = {
            let state = self.symbols.get(&ticker).unwrap();
            self.strategy
                .on_tick(ticker, &state.book, &state.features, now_ns)
        };
        if !intents.is_empty() {
            self.reconcile_and_emit(&intents, now_ns);
        }
    }

    fn reconcile_and_emit(&mut self, intents: &[QuoteIntent], now_ns: u64) {
        let mut actions =
            self.reconciler
                .reconcile(intents, &self.order_manager.slots, now_ns, &self.venue);
        apply_venue_policy(&mut actions, &self.order_manager.slots, now_ns, &self.venue);

        actions.news.retain(|a| {
            self.risk
                .check_and_record(a.ticker, a.side, a.qty)
                .is_allowed()
        });
        actions.replaces.retain(|a| {
            let delta = crate::core::types::Qty::from_raw(a.qty.raw() - a.last_qty.raw());
            self.risk.check_and_record(a.ticker, a.side, delta).is_allowed()
        });

        for action in &actions.news {
            if let Some(req) = self.order_manager.apply_new(action, now_ns, &mut self.expiry) {
                self.emit(&req);
            }
        }
        for action in &actions.replaces {
            if let Some(req) = self
                .order_manager
                .apply_replace(action, now_ns, &mut self.expiry)
            {
                self.emit(&req);
            }
        }
        for action in &actions.cancels {
            if let Some(req) = self.order_manager.apply_cancel(action, now_ns) {
                self.emit(&req);
            }
        }
    }

    fn emit(&self, request: &crate::execution::order_manager::OrderRequest) {
        self.register_pending(request);
        let encoded = encode_json(request);
        if self.out_queue.enqueue(encoded).is_err() {
            warn!("outbound queue full, dropping order request");
        }
    }

    /// Track the request the OE-write thread is about to send so the
    /// OE-read thread can synthesize a reject if the venue never
    /// answers.
    fn register_pending(&self, request: &crate::execution::order_manager::OrderRequest) {
        use crate::execution::order_manager::OrderRequest;
        let now_ns = self.clock.now_ns();
        match *request {
            OrderRequest::New {
                ticker,
                side,
                position_side,
                cl_order_id,
                ..
            } => self
                .pending
                .insert(cl_order_id, ticker, side, position_side, now_ns),
            OrderRequest::Replace {
                ticker,
                side,
                position_side,
                new_id,
                ..
            } => self
                .pending
                .insert(new_id, ticker, side, position_side, now_ns),
            OrderRequest::Cancel { .. } => {}
        }
    }

    fn drain_execution_reports(&mut self) -> bool {
        let mut processed = 0;
        while processed < BATCH_LIMIT_RESP {
            let Some(report) = self.resp_queue.dequeue() else {
                break;
            };
            processed += 1;
            self.apply_execution_report(&report);
        }
        processed > 0
    }

    fn apply_execution_report(&mut self, report: &ExecutionReport) {
        self.pending.remove(report.client_order_id);
        let now_ns = self.clock.now_ns();
        let fill = OrderStateManager::on_execution_report(
            &mut self.order_manager,
            report,
            now_ns,
            &self.venue,
            &mut self.expiry,
        );
        if let Some(fill) = fill {
            let pnl_delta = self.position_keeper.on_fill(
                fill.ticker,
                fill.side,
                fill.price.raw(),
                fill.qty,
            );
            self.risk.apply_realized_pnl(fill.ticker, pnl_delta);
        }
    }

    fn sweep_expiries(&mut self) -> bool {
        let now_ns = self.clock.now_ns();
        let expired = self.expiry.sweep_expired(now_ns);
        for cancel in &expired {
            let Some(side_book) =
                self.order_manager
                    .slots
                    .side_book_ref(cancel.key.ticker, cancel.key.side, cancel.key.position_side)
            else {
                continue;
            };
            let slot = side_book.slots[cancel.key.layer];
            if slot.cl_order_id != cancel.key.cl_order_id
                || !matches!(slot.state, SlotState::Reserved | SlotState::Live)
            {
                continue;
            }
            let action = crate::engine::reconciler::CancelAction {
                layer: cancel.key.layer,
                ticker: cancel.key.ticker,
                side: cancel.key.side,
                position_side: cancel.key.position_side,
                cl_order_id: cancel.key.cl_order_id,
            };
            if let Some(req) = self.order_manager.apply_cancel(&action, now_ns) {
                self.emit(&req);
            }
        }
        !expired.is_empty()
    }

    /// Run until `running` goes false, busy-polling with a progressive
    /// idle backoff when both queues are empty.
    pub fn run(&mut self) {
        let mut idle_streak = 0u32;
        while self.running.load(Ordering::Relaxed) {
            if self.run_once() {
                idle_streak = 0;
                continue;
            }
            idle_streak = idle_streak.saturating_add(1);
            if idle_streak < 64 {
                std::hint::spin_loop();
            } else if idle_streak < 1024 {
                std::thread::yield_now();
            } else {
                std::thread::sleep(Duration::from_micros(50));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::clock::ManualClock;
    use crate::core::types::{OrdStatus, PositionSide, Qty};
    use crate::data::types::{MarketData, MdType};
    use crate::execution::venue::CancelIdScheme;
    use crate::risk::types::RiskLimits;

    struct NoopStrategy;
    impl Strategy for NoopStrategy {
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

    fn venue() -> VenueRules {
        VenueRules {
            continuity_rule: crate::data::sequencer::ContinuityRule::Perpetual,
            cancel_id_scheme: CancelIdScheme::OriginalId,
            min_order_notional_raw: 0,
            min_qty: Qty::from_raw(0),
            max_qty: Qty::from_raw(i64::MAX),
            qty_increment: Qty::from_raw(1),
            min_order_time_gap_ns: 0,
            min_replace_tick_delta: 1,
            min_replace_qty_delta: 1,
        }
    }

    fn limits() -> RiskLimits {
        RiskLimits {
            max_order_qty: Qty::from_raw(i64::MAX),
            max_position_qty: Qty::from_raw(i64::MAX),
            min_position_qty: Qty::from_raw(i64::MIN),
            max_loss: i64::MIN,
        }
    }

    fn engine() -> TradeEngine<NoopStrategy> {
        TradeEngine::new(
            Arc::new(SpscQueue::new(16)),
            Arc::new(SpscQueue::new(16)),
            Arc::new(SpscQueue::new(16)),
            Box::new(ManualClock::new(1_000)),
            Arc::new(AtomicBool::new(true)),
            0,
            10_000,
            4,
            venue(),
            PreTradeFilter::new(limits()),
            OrderManager::new(1_000, 1_000),
            NoopStrategy,
            PendingRequestRegistry::new(),
        )
    }

    #[test]
    fn book_update_reaches_orderbook_and_feature_engine() {
        let mut engine = engine();
        let ticker = TickerId::new("BTCUSDT");
        let msg = MarketUpdateData::immediate(
            MdType::BookTicker,
            vec![MarketData {
                kind: MdType::BookTicker,
                order_id: Default::default(),
                ticker,
                side: Side::Buy,
                price: Price::from_raw(100),
                qty: Qty::from_raw(5),
            }],
        );
        engine.md_queue.enqueue(msg).unwrap();
        assert!(engine.run_once());
        let state = engine.symbols.get(&ticker).unwrap();
        assert_eq!(state.book.bbo().bid_price, Price::from_raw(100));
    }

    #[test]
    fn execution_report_with_no_matching_slot_is_ignored() {
        let mut engine = engine();
        let report = ExecutionReport {
            client_order_id: crate::core::types::OrderId::from_nanos(1),
            ticker: TickerId::new("BTCUSDT"),
            side: Side::Buy,
            position_side: PositionSide::Both,
            status: OrdStatus::New,
            cum_qty: Qty::from_raw(0),
            last_qty: Qty::from_raw(0),
            leaves_qty: Qty::from_raw(0),
            price: Price::from_raw(100),
            is_maker: true,
        };
        engine.resp_queue.enqueue(report).unwrap();
        // No panic, no crash: unmatched reports are simply dropped.
        engine.run_once();
    }

    #[test]
    fn run_once_returns_false_when_everything_is_idle() {
        let mut engine = engine();
        assert!(!engine.run_once());
    }

    #[test]
    fn emitted_new_order_registers_in_pending_requests() {
        let mut engine = engine();
        let request = crate::execution::order_manager::OrderRequest::New {
            ticker: TickerId::new("BTCUSDT"),
            side: Side::Buy,
            position_side: PositionSide::Both,
            price: Price::from_raw(100),
            qty: Qty::from_raw(5),
            cl_order_id: crate::core::types::OrderId::from_nanos(7),
        };
        engine.emit(&request);
        let pending = engine.pending_requests();
        assert_eq!(pending.len(), 1);
        assert!(pending
            .get(crate::core::types::OrderId::from_nanos(7))
            .is_some());
    }
}
