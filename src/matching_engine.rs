//--------------------------------------------------------------------------------------------------
// MODULE OVERVIEW
//--------------------------------------------------------------------------------------------------
// This module implements the core matching engine: command dispatch, validation, the limit and
// market matching loops, modify/cancel, the logical clock and the read-only query facade.
// Matching follows strict price-time priority and emits each execution to the trade sink.
//
// | Component                | Description                                                |
// |--------------------------|-----------------------------------------------------------|
// | MatchingEngine           | Engine state: both side books, clock, id counter, sink    |
// | MatchResult              | Outcome of a submit: trades + optional resting remainder  |
// | BookSummary              | Snapshot of best prices, side volumes and engine time     |
//
//--------------------------------------------------------------------------------------------------
// FUNCTIONS
//--------------------------------------------------------------------------------------------------
// | Name                    | Description                                       | Return Type      |
// |-------------------------|---------------------------------------------------|------------------|
// | submit                  | Validate, stamp and match an incoming order       | BookResult<...>  |
// | cancel                  | Remove a resting order                            | BookResult<()>   |
// | modify                  | Reprice or resize a resting order                 | BookResult<()>   |
// | get_order / list        | Read resting orders                               | ...              |
// | best_bid / best_ask     | Price extremes                                    | Option<Decimal>  |
// | summary / depth_snapshot| Aggregated views                                  | ...              |
//--------------------------------------------------------------------------------------------------

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::depth::{DepthLevel, DepthSnapshot};
use crate::error::{BookResult, OrderBookError};
use crate::side_book::SideBook;
use crate::trade::{NullSink, TradeParty, TradeRecord, TradeSink};
use crate::types::{OrderData, OrderRequest, OrderType, OrderUpdate, RestingOrder, Side};

/// Default minimum price increment; informational, not enforced by matching.
pub const DEFAULT_TICK_SIZE: Decimal = dec!(0.0001);

/// Outcome of a submit: the trades executed against the book, in matched
/// order, and the remainder left resting (limit orders only).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MatchResult {
    /// Trades generated while matching, best price first, FIFO within a level.
    pub trades: Vec<TradeRecord>,
    /// The remainder resting on the book; `None` for market orders and
    /// fully-filled limit orders.
    pub resting_order: Option<RestingOrder>,
}

/// Snapshot of best prices, side volumes and the engine clock.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BookSummary {
    pub best_bid: Option<Decimal>,
    pub best_ask: Option<Decimal>,
    pub bid_volume: Decimal,
    pub ask_volume: Decimal,
    pub time: u64,
}

/// The incoming order currently consuming liquidity.
struct Aggressor<'a> {
    order_id: u64,
    side: Side,
    trade_id: &'a str,
    wage: Option<&'a str>,
}

/// The core matching engine for a single trading instrument.
///
/// Single-threaded and non-suspending: every command runs to completion
/// before the next one starts, so the book invariants hold at command
/// boundaries without locks. Multi-threaded deployments serialize command
/// entry through one owning thread.
pub struct MatchingEngine {
    bids: SideBook,
    asks: SideBook,
    /// Monotonic logical clock, advanced once per live command.
    time: u64,
    next_order_id: u64,
    tick_size: Decimal,
    market_name: String,
    is_closed: bool,
    closed_reason: Option<String>,
    sink: Box<dyn TradeSink + Send>,
}

impl MatchingEngine {
    /// Creates an engine that discards its trade records.
    pub fn new(market_name: impl Into<String>, tick_size: Decimal) -> Self {
        Self::with_sink(market_name, tick_size, Box::new(NullSink))
    }

    /// Creates an engine forwarding trade records to `sink`.
    ///
    /// The sink is invoked synchronously from inside the matching loop and
    /// must be non-blocking; see [`TradeSink`].
    pub fn with_sink(
        market_name: impl Into<String>,
        tick_size: Decimal,
        sink: Box<dyn TradeSink + Send>,
    ) -> Self {
        Self {
            bids: SideBook::new(Side::Bid),
            asks: SideBook::new(Side::Ask),
            time: 0,
            next_order_id: 0,
            tick_size,
            market_name: market_name.into(),
            is_closed: false,
            closed_reason: None,
            sink,
        }
    }

    //----------------------------------------------------------------------------------------------
    // Command surface
    //----------------------------------------------------------------------------------------------

    /// Validates, stamps and matches an incoming order.
    ///
    /// With `from_data` set the command is a replay: the supplied
    /// `order_id` and `timestamp` are trusted and the clock adopts the
    /// timestamp. Live commands advance the clock and get the next
    /// monotonic id. `verbose` raises per-trade logging to info level.
    ///
    /// # Returns
    /// The trades executed and, for limit orders with a remainder, the
    /// order left resting on the same side.
    pub fn submit(
        &mut self,
        request: OrderRequest,
        from_data: bool,
        verbose: bool,
    ) -> BookResult<MatchResult> {
        // Validation precedes every state change, including the clock.
        let limit_price = match request.order_type {
            OrderType::Limit => Some(Self::require_limit_price(&request)?),
            OrderType::Market => None,
        };
        if request.quantity <= Decimal::ZERO {
            return Err(OrderBookError::InvalidQuantity(format!(
                "order quantity must be > 0, got: {}",
                request.quantity
            )));
        }

        let (order_id, timestamp) = match (from_data, request.order_id, request.timestamp) {
            (true, Some(order_id), Some(timestamp)) => {
                self.time = timestamp;
                (order_id, timestamp)
            }
            (true, _, _) => {
                return Err(OrderBookError::InvalidOrderType(
                    "replayed orders must carry order_id and timestamp".to_string(),
                ));
            }
            (false, _, _) => {
                self.time += 1;
                self.next_order_id += 1;
                (self.next_order_id, self.time)
            }
        };

        let trade_id = request
            .trade_id
            .clone()
            .unwrap_or_else(|| order_id.to_string());

        let result = match limit_price {
            None => MatchResult {
                trades: self.match_market_order(&request, order_id, &trade_id, verbose),
                resting_order: None,
            },
            Some(price) => {
                self.match_limit_order(&request, price, order_id, &trade_id, timestamp, verbose)
            }
        };
        Ok(result)
    }

    /// Removes a resting order from the stated side.
    ///
    /// `time` is set verbatim when supplied, otherwise the clock advances.
    /// A missing id — including an id resting on the other side — fails
    /// with `OrderNotFound`.
    pub fn cancel(&mut self, side: Side, order_id: u64, time: Option<u64>) -> BookResult<()> {
        self.update_time_if_needed(time);
        match self.book_mut(side).remove_by_id(order_id) {
            Some(_) => {
                debug!(order_id, %side, "order cancelled");
                Ok(())
            }
            None => Err(OrderBookError::OrderNotFound(format!(
                "order {order_id} not found on side {side}"
            ))),
        }
    }

    /// Reprices or resizes a resting order.
    ///
    /// A changed price takes the reprice path: the order is removed and
    /// reinserted at the tail of the target level with a fresh timestamp,
    /// exactly as a cancel followed by a submit. An unchanged price applies
    /// the quantity rule: a strict increase loses time priority, a decrease
    /// or equal quantity keeps it. Modify never matches against the
    /// opposite side, even when the new price would cross.
    pub fn modify(
        &mut self,
        order_id: u64,
        update: OrderUpdate,
        time: Option<u64>,
    ) -> BookResult<()> {
        if update.quantity <= Decimal::ZERO {
            return Err(OrderBookError::InvalidQuantity(format!(
                "order quantity must be > 0, got: {}",
                update.quantity
            )));
        }
        if update.price <= Decimal::ZERO {
            return Err(OrderBookError::InvalidOrderType(format!(
                "limit price must be > 0, got: {}",
                update.price
            )));
        }

        self.update_time_if_needed(time);
        let timestamp = self.time;

        let book = self.book_mut(update.side);
        let (trade_id, wage) = match book.get(order_id) {
            Some(order) => (order.trade_id.clone(), order.wage.clone()),
            None => {
                return Err(OrderBookError::OrderNotFound(format!(
                    "order {order_id} not found on side {}",
                    update.side
                )));
            }
        };
        book.update(OrderData {
            order_id,
            price: update.price,
            quantity: update.quantity,
            timestamp,
            trade_id,
            wage,
        });
        debug!(order_id, side = %update.side, price = %update.price, "order modified");
        Ok(())
    }

    //----------------------------------------------------------------------------------------------
    // Query facade
    //----------------------------------------------------------------------------------------------

    /// Reads one resting order.
    pub fn get_order(&self, side: Side, order_id: u64) -> BookResult<RestingOrder> {
        match self.book(side).get(order_id) {
            Some(order) => Ok(RestingOrder::from(order)),
            None => Err(OrderBookError::OrderNotFound(format!(
                "order {order_id} not found on side {side}"
            ))),
        }
    }

    /// All resting orders of one side, ascending by price, FIFO within a
    /// level.
    pub fn list(&self, side: Side) -> Vec<RestingOrder> {
        self.book(side).iter().map(RestingOrder::from).collect()
    }

    /// Highest resting bid price.
    pub fn best_bid(&self) -> Option<Decimal> {
        self.bids.max_price()
    }

    /// Lowest resting bid price.
    pub fn worst_bid(&self) -> Option<Decimal> {
        self.bids.min_price()
    }

    /// Lowest resting ask price.
    pub fn best_ask(&self) -> Option<Decimal> {
        self.asks.min_price()
    }

    /// Highest resting ask price.
    pub fn worst_ask(&self) -> Option<Decimal> {
        self.asks.max_price()
    }

    /// Resting volume at one price; zero for an absent level.
    pub fn volume_at(&self, side: Side, price: Decimal) -> Decimal {
        self.book(side).volume_at(price)
    }

    /// Best prices, side volumes and the engine clock.
    pub fn summary(&self) -> BookSummary {
        BookSummary {
            best_bid: self.best_bid(),
            best_ask: self.best_ask(),
            bid_volume: self.bids.volume(),
            ask_volume: self.asks.volume(),
            time: self.time,
        }
    }

    /// Aggregated ladders, best price first, at most `levels` per side.
    pub fn depth_snapshot(&self, levels: usize) -> DepthSnapshot {
        let aggregate = |level: &crate::price_level::PriceLevel| DepthLevel {
            price: level.price(),
            volume: level.volume(),
            order_count: level.order_count(),
        };
        let bids = self.bids.levels().rev().take(levels).map(aggregate).collect();
        let asks = self.asks.levels().take(levels).map(aggregate).collect();
        DepthSnapshot::new(bids, asks)
    }

    /// Borrows one side of the book.
    pub fn book(&self, side: Side) -> &SideBook {
        match side {
            Side::Bid => &self.bids,
            Side::Ask => &self.asks,
        }
    }

    /// Current engine time.
    pub fn time(&self) -> u64 {
        self.time
    }

    /// Market pair served by this engine.
    pub fn market_name(&self) -> &str {
        &self.market_name
    }

    /// Minimum price increment; informational only.
    pub fn tick_size(&self) -> Decimal {
        self.tick_size
    }

    /// Returns true when the market session is flagged closed.
    ///
    /// The flag is informational: matching itself never gates on it.
    pub fn is_closed(&self) -> bool {
        self.is_closed
    }

    /// Reason the session was closed, if it is.
    pub fn closed_reason(&self) -> Option<&str> {
        self.closed_reason.as_deref()
    }

    /// Flags the market session closed.
    pub fn close_market(&mut self, reason: impl Into<String>) {
        self.is_closed = true;
        self.closed_reason = Some(reason.into());
    }

    /// Clears the closed flag.
    pub fn reopen_market(&mut self) {
        self.is_closed = false;
        self.closed_reason = None;
    }

    //----------------------------------------------------------------------------------------------
    // Matching loops
    //----------------------------------------------------------------------------------------------

    /// Matches a market order against the opposite book until it is filled
    /// or liquidity runs out. Market orders never rest; a remainder is
    /// discarded.
    fn match_market_order(
        &mut self,
        request: &OrderRequest,
        order_id: u64,
        trade_id: &str,
        verbose: bool,
    ) -> Vec<TradeRecord> {
        let aggressor = Aggressor {
            order_id,
            side: request.side,
            trade_id,
            wage: request.wage.as_deref(),
        };
        let maker_side = request.side.opposite();
        let mut trades = Vec::new();
        let mut remaining = request.quantity;

        while remaining > Decimal::ZERO {
            let Some(best_price) = maker_side.best_price(self.book(maker_side)) else {
                break;
            };
            remaining =
                self.consume_level(maker_side, best_price, remaining, &aggressor, &mut trades, verbose);
        }

        if remaining > Decimal::ZERO {
            warn!(
                order_id,
                side = %request.side,
                %remaining,
                "market order exhausted book liquidity, remainder discarded"
            );
        }
        trades
    }

    /// Matches a limit order against every crossing level, then rests the
    /// remainder on the same side.
    fn match_limit_order(
        &mut self,
        request: &OrderRequest,
        price: Decimal,
        order_id: u64,
        trade_id: &str,
        timestamp: u64,
        verbose: bool,
    ) -> MatchResult {
        let aggressor = Aggressor {
            order_id,
            side: request.side,
            trade_id,
            wage: request.wage.as_deref(),
        };
        let maker_side = request.side.opposite();
        let mut trades = Vec::new();
        let mut remaining = request.quantity;

        while remaining > Decimal::ZERO {
            let Some(best_price) = maker_side.best_price(self.book(maker_side)) else {
                break;
            };
            if !request.side.crosses(price, best_price) {
                break;
            }
            remaining =
                self.consume_level(maker_side, best_price, remaining, &aggressor, &mut trades, verbose);
        }

        let resting_order = if remaining > Decimal::ZERO {
            self.book_mut(request.side).insert(OrderData {
                order_id,
                price,
                quantity: remaining,
                timestamp,
                trade_id: trade_id.to_string(),
                wage: request.wage.clone(),
            });
            debug!(order_id, side = %request.side, %price, quantity = %remaining, "order resting");
            Some(RestingOrder {
                order_id,
                side: request.side,
                quantity: remaining,
                price,
                timestamp,
                trade_id: trade_id.to_string(),
                wage: request.wage.clone(),
            })
        } else {
            None
        };

        MatchResult {
            trades,
            resting_order,
        }
    }

    /// Consumes one price level head-first until the level empties or the
    /// aggressor is filled, emitting one trade record per match.
    ///
    /// A partially consumed head keeps its position and its timestamp;
    /// a fully consumed head is removed from the book, which also removes
    /// the level when it empties. Volume accounting happens entirely inside
    /// the book mutators called from here.
    fn consume_level(
        &mut self,
        maker_side: Side,
        price: Decimal,
        mut remaining: Decimal,
        aggressor: &Aggressor<'_>,
        trades: &mut Vec<TradeRecord>,
        verbose: bool,
    ) -> Decimal {
        while remaining > Decimal::ZERO {
            let Some(head) = self.book(maker_side).head_at(price) else {
                break;
            };
            let maker_id = head.order_id;
            let maker_quantity = head.quantity;
            let maker_timestamp = head.timestamp;
            let maker_trade_id = head.trade_id.clone();
            let maker_wage = head.wage.clone();

            let (traded_quantity, new_book_quantity) = if remaining < maker_quantity {
                (remaining, Some(maker_quantity - remaining))
            } else {
                (maker_quantity, None)
            };

            match new_book_quantity {
                // Partial fill: reduce the head at its existing timestamp so
                // it keeps its place in the queue.
                Some(residual) => {
                    self.book_mut(maker_side)
                        .update_quantity(maker_id, residual, maker_timestamp);
                }
                None => {
                    self.book_mut(maker_side).remove_by_id(maker_id);
                }
            }
            remaining -= traded_quantity;

            let record = TradeRecord::new(
                self.time,
                price,
                traded_quantity,
                TradeParty {
                    trade_id: maker_trade_id,
                    side: maker_side,
                    order_id: maker_id,
                    new_book_quantity,
                    wage: maker_wage,
                },
                TradeParty {
                    trade_id: aggressor.trade_id.to_string(),
                    side: aggressor.side,
                    order_id: aggressor.order_id,
                    new_book_quantity: None,
                    wage: aggressor.wage.map(str::to_string),
                },
            );
            if verbose {
                info!(
                    time = self.time,
                    %price,
                    quantity = %traded_quantity,
                    maker = %record.party1.trade_id,
                    taker = %record.party2.trade_id,
                    "trade"
                );
            } else {
                debug!(time = self.time, %price, quantity = %traded_quantity, "trade");
            }
            self.sink.record_trade(&record);
            trades.push(record);
        }
        remaining
    }

    //----------------------------------------------------------------------------------------------
    // Helpers
    //----------------------------------------------------------------------------------------------

    fn require_limit_price(request: &OrderRequest) -> BookResult<Decimal> {
        match request.price {
            Some(price) if price > Decimal::ZERO => Ok(price),
            Some(price) => Err(OrderBookError::InvalidOrderType(format!(
                "limit price must be > 0, got: {price}"
            ))),
            None => Err(OrderBookError::InvalidOrderType(
                "price is required for limit orders".to_string(),
            )),
        }
    }

    /// Sets the clock verbatim when a time is supplied, otherwise advances
    /// it by one tick.
    fn update_time_if_needed(&mut self, time: Option<u64>) {
        match time {
            Some(time) => self.time = time,
            None => self.time += 1,
        }
    }

    fn book_mut(&mut self, side: Side) -> &mut SideBook {
        match side {
            Side::Bid => &mut self.bids,
            Side::Ask => &mut self.asks,
        }
    }
}

//--------------------------------------------------------------------------------------------------
//  TESTS
//--------------------------------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn engine() -> MatchingEngine {
        MatchingEngine::new("TEST/PAIR", DEFAULT_TICK_SIZE)
    }

    fn limit(side: Side, price: Decimal, quantity: Decimal) -> OrderRequest {
        OrderRequest {
            side,
            order_type: OrderType::Limit,
            quantity,
            price: Some(price),
            trade_id: None,
            wage: None,
            order_id: None,
            timestamp: None,
        }
    }

    fn market(side: Side, quantity: Decimal) -> OrderRequest {
        OrderRequest {
            side,
            order_type: OrderType::Market,
            quantity,
            price: None,
            trade_id: None,
            wage: None,
            order_id: None,
            timestamp: None,
        }
    }

    fn submit(engine: &mut MatchingEngine, request: OrderRequest) -> MatchResult {
        match engine.submit(request, false, false) {
            Ok(result) => result,
            Err(e) => panic!("failed to submit order: {:?}", e),
        }
    }

    #[test]
    fn test_resting_limit_order() {
        let mut engine = engine();
        let result = submit(&mut engine, limit(Side::Bid, dec!(100), dec!(2)));

        assert!(result.trades.is_empty());
        let resting = match result.resting_order {
            Some(order) => order,
            None => panic!("expected the order to rest"),
        };
        assert_eq!(resting.order_id, 1);
        assert_eq!(resting.timestamp, 1);
        assert_eq!(resting.trade_id, "1");
        assert_eq!(engine.best_bid(), Some(dec!(100)));
        assert_eq!(engine.time(), 1);
    }

    #[test]
    fn test_validation_rejects_before_any_state_change() {
        let mut engine = engine();

        let mut no_price = limit(Side::Bid, dec!(100), dec!(1));
        no_price.price = None;
        assert!(matches!(
            engine.submit(no_price, false, false),
            Err(OrderBookError::InvalidOrderType(_))
        ));

        assert!(matches!(
            engine.submit(limit(Side::Bid, dec!(0), dec!(1)), false, false),
            Err(OrderBookError::InvalidOrderType(_))
        ));

        assert!(matches!(
            engine.submit(limit(Side::Bid, dec!(100), dec!(0)), false, false),
            Err(OrderBookError::InvalidQuantity(_))
        ));

        // Nothing moved: clock and id counter untouched
        assert_eq!(engine.time(), 0);
        let result = submit(&mut engine, limit(Side::Bid, dec!(100), dec!(1)));
        assert_eq!(result.resting_order.map(|o| o.order_id), Some(1));
    }

    #[test]
    fn test_market_order_price_is_not_validated() {
        let mut engine = engine();
        submit(&mut engine, limit(Side::Ask, dec!(100), dec!(1)));

        // A market order never carries a price, and none is required
        let result = submit(&mut engine, market(Side::Bid, dec!(1)));
        assert_eq!(result.trades.len(), 1);
        assert!(result.resting_order.is_none());
    }

    #[test]
    fn test_full_fill_single_maker() {
        let mut engine = engine();
        submit(&mut engine, limit(Side::Ask, dec!(100), dec!(5)));
        let result = submit(&mut engine, limit(Side::Bid, dec!(101), dec!(5)));

        assert_eq!(result.trades.len(), 1);
        let trade = &result.trades[0];
        assert_eq!(trade.price, dec!(100));
        assert_eq!(trade.quantity, dec!(5));
        assert_eq!(trade.party1.side, Side::Ask);
        assert_eq!(trade.party1.new_book_quantity, None);
        assert_eq!(trade.party2.side, Side::Bid);
        assert_eq!(trade.party2.new_book_quantity, None);
        assert!(result.resting_order.is_none());
        assert!(engine.book(Side::Ask).is_empty());
        assert!(engine.book(Side::Bid).is_empty());
        assert_eq!(engine.time(), 2);
    }

    #[test]
    fn test_partial_fill_leaves_maker_in_place() {
        let mut engine = engine();
        submit(&mut engine, limit(Side::Ask, dec!(100), dec!(10)));
        let result = submit(&mut engine, limit(Side::Bid, dec!(101), dec!(4)));

        assert_eq!(result.trades.len(), 1);
        assert_eq!(result.trades[0].quantity, dec!(4));
        assert_eq!(result.trades[0].party1.new_book_quantity, Some(dec!(6)));
        assert!(result.resting_order.is_none());

        let maker = match engine.get_order(Side::Ask, 1) {
            Ok(order) => order,
            Err(e) => panic!("maker should still rest: {:?}", e),
        };
        assert_eq!(maker.quantity, dec!(6));
        // Reduced at its original timestamp
        assert_eq!(maker.timestamp, 1);
    }

    #[test]
    fn test_sweep_and_rest_remainder() {
        let mut engine = engine();
        submit(&mut engine, limit(Side::Ask, dec!(100), dec!(6)));
        let result = submit(&mut engine, limit(Side::Bid, dec!(101), dec!(10)));

        assert_eq!(result.trades.len(), 1);
        assert_eq!(result.trades[0].quantity, dec!(6));
        let resting = match result.resting_order {
            Some(order) => order,
            None => panic!("expected a resting remainder"),
        };
        assert_eq!(resting.quantity, dec!(4));
        assert_eq!(resting.price, dec!(101));
        assert!(engine.book(Side::Ask).is_empty());
        assert_eq!(engine.volume_at(Side::Bid, dec!(101)), dec!(4));
    }

    #[test]
    fn test_market_sweep_across_levels() {
        let mut engine = engine();
        submit(&mut engine, limit(Side::Ask, dec!(10), dec!(2)));
        submit(&mut engine, limit(Side::Ask, dec!(11), dec!(3)));

        let result = submit(&mut engine, market(Side::Bid, dec!(5)));
        assert_eq!(result.trades.len(), 2);
        assert_eq!(result.trades[0].price, dec!(10));
        assert_eq!(result.trades[0].quantity, dec!(2));
        assert_eq!(result.trades[1].price, dec!(11));
        assert_eq!(result.trades[1].quantity, dec!(3));
        assert!(engine.book(Side::Ask).is_empty());
        assert!(engine.book(Side::Bid).is_empty());
    }

    #[test]
    fn test_market_remainder_is_discarded() {
        let mut engine = engine();
        submit(&mut engine, limit(Side::Ask, dec!(10), dec!(2)));

        let result = submit(&mut engine, market(Side::Bid, dec!(5)));
        assert_eq!(result.trades.len(), 1);
        assert!(result.resting_order.is_none());
        assert!(engine.book(Side::Bid).is_empty());
        assert!(engine.book(Side::Ask).is_empty());
    }

    #[test]
    fn test_limit_respects_price_limit() {
        let mut engine = engine();
        submit(&mut engine, limit(Side::Ask, dec!(100), dec!(2)));
        submit(&mut engine, limit(Side::Ask, dec!(105), dec!(2)));

        // Crosses only the first level; remainder rests
        let result = submit(&mut engine, limit(Side::Bid, dec!(102), dec!(5)));
        assert_eq!(result.trades.len(), 1);
        assert_eq!(result.trades[0].price, dec!(100));
        let resting = match result.resting_order {
            Some(order) => order,
            None => panic!("expected a resting remainder"),
        };
        assert_eq!(resting.quantity, dec!(3));
        assert_eq!(engine.best_ask(), Some(dec!(105)));
        assert_eq!(engine.best_bid(), Some(dec!(102)));
    }

    #[test]
    fn test_fifo_within_level() {
        let mut engine = engine();
        let first = submit(&mut engine, limit(Side::Ask, dec!(100), dec!(1)));
        let second = submit(&mut engine, limit(Side::Ask, dec!(100), dec!(1)));
        let first_id = first.resting_order.map(|o| o.order_id);
        let second_id = second.resting_order.map(|o| o.order_id);

        let result = submit(&mut engine, limit(Side::Bid, dec!(100), dec!(2)));
        assert_eq!(result.trades.len(), 2);
        assert_eq!(Some(result.trades[0].party1.order_id), first_id);
        assert_eq!(Some(result.trades[1].party1.order_id), second_id);
    }

    #[test]
    fn test_cancel() {
        let mut engine = engine();
        submit(&mut engine, limit(Side::Bid, dec!(10), dec!(1)));

        match engine.cancel(Side::Bid, 1, None) {
            Ok(()) => {}
            Err(e) => panic!("cancel failed: {:?}", e),
        }
        assert!(engine.book(Side::Bid).is_empty());
        assert_eq!(engine.time(), 2);

        // A second cancel of the same id fails without touching the book
        assert!(matches!(
            engine.cancel(Side::Bid, 1, None),
            Err(OrderBookError::OrderNotFound(_))
        ));
    }

    #[test]
    fn test_cancel_wrong_side_is_not_found() {
        let mut engine = engine();
        submit(&mut engine, limit(Side::Bid, dec!(10), dec!(1)));

        assert!(matches!(
            engine.cancel(Side::Ask, 1, None),
            Err(OrderBookError::OrderNotFound(_))
        ));
        assert_eq!(engine.volume_at(Side::Bid, dec!(10)), dec!(1));
    }

    #[test]
    fn test_cancel_with_explicit_time() {
        let mut engine = engine();
        submit(&mut engine, limit(Side::Bid, dec!(10), dec!(1)));
        match engine.cancel(Side::Bid, 1, Some(99)) {
            Ok(()) => {}
            Err(e) => panic!("cancel failed: {:?}", e),
        }
        assert_eq!(engine.time(), 99);
    }

    #[test]
    fn test_modify_reprice_moves_to_new_level_tail() {
        let mut engine = engine();
        submit(&mut engine, limit(Side::Bid, dec!(100), dec!(5)));
        submit(&mut engine, limit(Side::Bid, dec!(100), dec!(5)));

        let update = OrderUpdate {
            side: Side::Bid,
            quantity: dec!(5),
            price: dec!(101),
        };
        match engine.modify(1, update, None) {
            Ok(()) => {}
            Err(e) => panic!("modify failed: {:?}", e),
        }

        assert_eq!(engine.volume_at(Side::Bid, dec!(100)), dec!(5));
        assert_eq!(engine.volume_at(Side::Bid, dec!(101)), dec!(5));
        assert_eq!(engine.best_bid(), Some(dec!(101)));
        let moved = match engine.get_order(Side::Bid, 1) {
            Ok(order) => order,
            Err(e) => panic!("order should rest at the new price: {:?}", e),
        };
        assert_eq!(moved.timestamp, 3);
        // The client tag survives a reprice
        assert_eq!(moved.trade_id, "1");
    }

    #[test]
    fn test_modify_does_not_match_even_when_crossing() {
        let mut engine = engine();
        submit(&mut engine, limit(Side::Ask, dec!(105), dec!(1)));
        submit(&mut engine, limit(Side::Bid, dec!(100), dec!(1)));

        let update = OrderUpdate {
            side: Side::Bid,
            quantity: dec!(1),
            price: dec!(110),
        };
        match engine.modify(2, update, None) {
            Ok(()) => {}
            Err(e) => panic!("modify failed: {:?}", e),
        }

        // Book-local mutation: the crossing bid rests, nothing traded
        assert_eq!(engine.best_bid(), Some(dec!(110)));
        assert_eq!(engine.best_ask(), Some(dec!(105)));
        assert_eq!(engine.book(Side::Ask).len(), 1);
    }

    #[test]
    fn test_modify_missing_order() {
        let mut engine = engine();
        let update = OrderUpdate {
            side: Side::Bid,
            quantity: dec!(1),
            price: dec!(10),
        };
        assert!(matches!(
            engine.modify(1, update, None),
            Err(OrderBookError::OrderNotFound(_))
        ));
    }

    #[test]
    fn test_replay_trusts_ids_and_timestamps() {
        let mut engine = engine();
        let request = OrderRequest {
            order_id: Some(41),
            timestamp: Some(900),
            ..limit(Side::Bid, dec!(100), dec!(2))
        };
        let result = match engine.submit(request, true, false) {
            Ok(result) => result,
            Err(e) => panic!("replay failed: {:?}", e),
        };
        let resting = match result.resting_order {
            Some(order) => order,
            None => panic!("expected the replayed order to rest"),
        };
        assert_eq!(resting.order_id, 41);
        assert_eq!(resting.timestamp, 900);
        assert_eq!(engine.time(), 900);

        // A replayed command without its identity is rejected
        assert!(matches!(
            engine.submit(limit(Side::Bid, dec!(100), dec!(2)), true, false),
            Err(OrderBookError::InvalidOrderType(_))
        ));
    }

    #[test]
    fn test_summary_and_extremes() {
        let mut engine = engine();
        submit(&mut engine, limit(Side::Bid, dec!(99), dec!(1)));
        submit(&mut engine, limit(Side::Bid, dec!(100), dec!(2)));
        submit(&mut engine, limit(Side::Ask, dec!(101), dec!(3)));
        submit(&mut engine, limit(Side::Ask, dec!(102), dec!(4)));

        assert_eq!(engine.best_bid(), Some(dec!(100)));
        assert_eq!(engine.worst_bid(), Some(dec!(99)));
        assert_eq!(engine.best_ask(), Some(dec!(101)));
        assert_eq!(engine.worst_ask(), Some(dec!(102)));

        let summary = engine.summary();
        assert_eq!(summary.best_bid, Some(dec!(100)));
        assert_eq!(summary.best_ask, Some(dec!(101)));
        assert_eq!(summary.bid_volume, dec!(3));
        assert_eq!(summary.ask_volume, dec!(7));
        assert_eq!(summary.time, 4);
    }

    #[test]
    fn test_depth_snapshot_orders_best_first() {
        let mut engine = engine();
        submit(&mut engine, limit(Side::Bid, dec!(99), dec!(1)));
        submit(&mut engine, limit(Side::Bid, dec!(100), dec!(2)));
        submit(&mut engine, limit(Side::Ask, dec!(102), dec!(4)));
        submit(&mut engine, limit(Side::Ask, dec!(101), dec!(3)));

        let snapshot = engine.depth_snapshot(10);
        assert_eq!(snapshot.bids[0].price, dec!(100));
        assert_eq!(snapshot.bids[1].price, dec!(99));
        assert_eq!(snapshot.asks[0].price, dec!(101));
        assert_eq!(snapshot.asks[1].price, dec!(102));
        assert_eq!(snapshot.spread(), Some(dec!(1)));

        let truncated = engine.depth_snapshot(1);
        assert_eq!(truncated.bids.len(), 1);
        assert_eq!(truncated.asks.len(), 1);
    }

    #[test]
    fn test_market_session_flag() {
        let mut engine = engine();
        assert!(!engine.is_closed());
        engine.close_market("maintenance");
        assert!(engine.is_closed());
        assert_eq!(engine.closed_reason(), Some("maintenance"));
        engine.reopen_market();
        assert!(!engine.is_closed());
        assert_eq!(engine.closed_reason(), None);
    }
}
