//--------------------------------------------------------------------------------------------------
// MODULE OVERVIEW
//--------------------------------------------------------------------------------------------------
// This module defines the trade record emitted by the matching loop and the sink interface that
// receives it. The engine calls the sink synchronously from inside matching, so every sink here is
// infallible: a full tape evicts, a closed channel drops.
//
// | Component     | Description                                                               |
// |--------------|---------------------------------------------------------------------------|
// | TradeParty   | One side of an executed trade (maker or taker)                            |
// | TradeRecord  | Wire-compatible record of a single execution                              |
// | TradeSink    | Narrow interface receiving executed trades                                |
// | NullSink     | Discards every record                                                     |
// | TradeTape    | Bounded shared ring of recent trades                                      |
// | ChannelSink  | Forwards records over a crossbeam channel                                 |
//--------------------------------------------------------------------------------------------------

use std::collections::VecDeque;
use std::sync::Arc;

use crossbeam_channel::Sender;
use parking_lot::Mutex;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::types::Side;

/// One party of an executed trade.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradeParty {
    /// Opaque client tag of the party's order.
    pub trade_id: String,
    /// Side the party's order was on.
    pub side: Side,
    /// Engine order id of the party's order.
    pub order_id: u64,
    /// Residual quantity left resting on the maker after this trade;
    /// `None` when fully consumed, and always `None` for the taker.
    pub new_book_quantity: Option<Decimal>,
    /// Opaque fee tag carried verbatim from the order.
    pub wage: Option<String>,
}

/// Record of a single execution.
///
/// `party1` is the maker (the resting order, whose price is the traded
/// price) and `party2` the taker. `time` duplicates `timestamp`; the field
/// is retained for wire compatibility with downstream consumers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradeRecord {
    /// Engine time at execution.
    pub timestamp: u64,
    /// The maker's resting price.
    pub price: Decimal,
    /// Traded quantity.
    pub quantity: Decimal,
    /// Duplicate of `timestamp`.
    pub time: u64,
    /// The maker.
    pub party1: TradeParty,
    /// The taker.
    pub party2: TradeParty,
}

impl TradeRecord {
    /// Builds a record for a trade executed at `timestamp`.
    pub fn new(
        timestamp: u64,
        price: Decimal,
        quantity: Decimal,
        maker: TradeParty,
        taker: TradeParty,
    ) -> Self {
        Self {
            timestamp,
            price,
            quantity,
            time: timestamp,
            party1: maker,
            party2: taker,
        }
    }

    /// Side of the order that consumed liquidity.
    pub fn aggressor_side(&self) -> Side {
        self.party2.side
    }
}

/// Receives executed trade records for downstream storage or analytics.
///
/// Called synchronously from inside the matching loop; implementations must
/// be non-blocking and must not fail. The engine does not own trade history.
pub trait TradeSink {
    fn record_trade(&mut self, trade: &TradeRecord);
}

/// A sink that discards every record.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl TradeSink for NullSink {
    fn record_trade(&mut self, _trade: &TradeRecord) {}
}

/// Bounded in-memory ring of recent trades.
///
/// Clones share the underlying buffer, so a clone handed to the engine as
/// its sink stays readable from the outside while matching runs.
#[derive(Debug, Clone)]
pub struct TradeTape {
    inner: Arc<Mutex<VecDeque<TradeRecord>>>,
    capacity: usize,
}

impl TradeTape {
    /// Creates a tape retaining at most `capacity` records; the oldest
    /// record is evicted when the tape is full.
    pub fn new(capacity: usize) -> Self {
        Self {
            inner: Arc::new(Mutex::new(VecDeque::with_capacity(capacity))),
            capacity,
        }
    }

    /// Most recent trades, newest last, at most `limit` of them.
    pub fn recent(&self, limit: usize) -> Vec<TradeRecord> {
        let tape = self.inner.lock();
        let skip = tape.len().saturating_sub(limit);
        tape.iter().skip(skip).cloned().collect()
    }

    /// Number of retained records.
    pub fn len(&self) -> usize {
        self.inner.lock().len()
    }

    /// Returns true when no records are retained.
    pub fn is_empty(&self) -> bool {
        self.inner.lock().is_empty()
    }
}

impl TradeSink for TradeTape {
    fn record_trade(&mut self, trade: &TradeRecord) {
        let mut tape = self.inner.lock();
        if tape.len() == self.capacity {
            tape.pop_front();
        }
        tape.push_back(trade.clone());
    }
}

/// Forwards records over a crossbeam channel, e.g. to a writer thread.
///
/// A disconnected receiver is ignored so the sink stays infallible.
#[derive(Debug, Clone)]
pub struct ChannelSink {
    sender: Sender<TradeRecord>,
}

impl ChannelSink {
    pub fn new(sender: Sender<TradeRecord>) -> Self {
        Self { sender }
    }
}

impl TradeSink for ChannelSink {
    fn record_trade(&mut self, trade: &TradeRecord) {
        let _ = self.sender.send(trade.clone());
    }
}
