//--------------------------------------------------------------------------------------------------
// MODULE OVERVIEW
//--------------------------------------------------------------------------------------------------
// This module implements one side of the order book: the price-ordered map of FIFO levels, the
// order-id index, and the side-wide aggregates. All volume and count accounting for resting orders
// happens here and in PriceLevel; nothing above this layer adjusts totals directly.
//
// | Component     | Description                                                               |
// |--------------|---------------------------------------------------------------------------|
// | SideBook     | levels: BTreeMap<Decimal, PriceLevel> + by_id index + arena + totals      |
//
//--------------------------------------------------------------------------------------------------
// FUNCTIONS
//--------------------------------------------------------------------------------------------------
// | Name                  | Description                               | Return Type             |
// |-----------------------|-------------------------------------------|------------------------|
// | insert                | Insert (or replace) a resting order       | ()                     |
// | update                | Apply a reprice or quantity update        | bool                   |
// | update_quantity       | Apply the quantity/priority rule          | bool                   |
// | remove_by_id          | Remove an order, cleaning empty levels    | Option<Order>          |
// | min_price / max_price | Price extremes                            | Option<Decimal>        |
// | head_at               | Peek at the FIFO head of one level        | Option<&Order>         |
// | iter                  | Ascending price, FIFO within level        | impl Iterator          |
//--------------------------------------------------------------------------------------------------

use std::collections::{BTreeMap, HashMap};

use rust_decimal::Decimal;

use crate::price_level::{OrderArena, OrderHandle, PriceLevel};
use crate::types::{Order, OrderData, Side};

/// One side of the order book.
///
/// Levels are kept in a `BTreeMap` sorted ascending by price, so the best
/// bid is the last key and the best ask the first. A level exists in the
/// map if and only if it holds at least one order; [`SideBook::remove_by_id`]
/// is the sole cleanup point for emptied levels.
#[derive(Debug)]
pub struct SideBook {
    side: Side,
    arena: OrderArena,
    levels: BTreeMap<Decimal, PriceLevel>,
    by_id: HashMap<u64, OrderHandle>,
    total_volume: Decimal,
    total_orders: u64,
}

impl SideBook {
    /// Creates an empty book for `side`.
    pub fn new(side: Side) -> Self {
        Self {
            side,
            arena: OrderArena::new(),
            levels: BTreeMap::new(),
            by_id: HashMap::new(),
            total_volume: Decimal::ZERO,
            total_orders: 0,
        }
    }

    /// The side this book holds orders for.
    pub fn side(&self) -> Side {
        self.side
    }

    /// Inserts a resting order built from `data`.
    ///
    /// If the order id is already present the existing order is removed
    /// first, making insert an idempotent replace. The level for
    /// `data.price` is created on demand and the new order is appended at
    /// its tail.
    pub fn insert(&mut self, data: OrderData) {
        if self.by_id.contains_key(&data.order_id) {
            self.remove_by_id(data.order_id);
        }

        let order = Order {
            order_id: data.order_id,
            side: self.side,
            price: data.price,
            quantity: data.quantity,
            timestamp: data.timestamp,
            trade_id: data.trade_id,
            wage: data.wage,
            prev: None,
            next: None,
        };
        let order_id = order.order_id;
        let price = order.price;
        let quantity = order.quantity;

        let handle = self.arena.insert(order);
        let level = self
            .levels
            .entry(price)
            .or_insert_with(|| PriceLevel::new(price));
        level.append(&mut self.arena, handle);

        self.by_id.insert(order_id, handle);
        self.total_orders += 1;
        self.total_volume += quantity;
    }

    /// Applies an update to an existing order.
    ///
    /// A changed price takes the reprice path: remove (cleaning an emptied
    /// level) and reinsert at the tail of the target level, equivalent to
    /// cancel+submit for priority purposes. An unchanged price delegates to
    /// [`SideBook::update_quantity`].
    ///
    /// # Returns
    /// `false` when `data.order_id` is not resting on this side.
    pub fn update(&mut self, data: OrderData) -> bool {
        let Some(&handle) = self.by_id.get(&data.order_id) else {
            return false;
        };
        let current_price = self.arena.get(handle).price;

        if data.price != current_price {
            self.remove_by_id(data.order_id);
            self.insert(data);
            true
        } else {
            self.update_quantity(data.order_id, data.quantity, data.timestamp)
        }
    }

    /// Updates quantity and timestamp of a resting order, applying the
    /// time-priority rule: a strict increase on a non-tail order moves it
    /// to the tail of its level; a decrease or equal quantity keeps its
    /// position.
    ///
    /// # Returns
    /// `false` when `order_id` is not resting on this side.
    pub fn update_quantity(&mut self, order_id: u64, new_quantity: Decimal, new_timestamp: u64) -> bool {
        let Some(&handle) = self.by_id.get(&order_id) else {
            return false;
        };
        let price = self.arena.get(handle).price;
        let level = self
            .levels
            .get_mut(&price)
            .expect("indexed order has no price level");
        let delta = level.set_quantity(&mut self.arena, handle, new_quantity, new_timestamp);
        self.total_volume += delta;
        true
    }

    /// Removes an order from the book.
    ///
    /// Detaches it from its level, drops the level when it empties, updates
    /// the totals and the id index.
    ///
    /// # Returns
    /// * `Some(Order)` - The removed order
    /// * `None` - If no order with `order_id` rests on this side
    pub fn remove_by_id(&mut self, order_id: u64) -> Option<Order> {
        let handle = self.by_id.remove(&order_id)?;
        let price = self.arena.get(handle).price;

        let level = self
            .levels
            .get_mut(&price)
            .expect("indexed order has no price level");
        level.remove(&mut self.arena, handle);
        if level.is_empty() {
            self.levels.remove(&price);
        }

        let order = self.arena.remove(handle);
        self.total_orders -= 1;
        self.total_volume -= order.quantity;
        Some(order)
    }

    /// Returns true if an order with `order_id` rests on this side.
    pub fn order_exists(&self, order_id: u64) -> bool {
        self.by_id.contains_key(&order_id)
    }

    /// Returns true if a level exists at `price`.
    pub fn price_exists(&self, price: Decimal) -> bool {
        self.levels.contains_key(&price)
    }

    /// Borrows a resting order by id.
    pub fn get(&self, order_id: u64) -> Option<&Order> {
        self.by_id.get(&order_id).map(|&handle| self.arena.get(handle))
    }

    /// Borrows the level at `price`, if any.
    pub fn level(&self, price: Decimal) -> Option<&PriceLevel> {
        self.levels.get(&price)
    }

    /// Lowest price with resting orders.
    pub fn min_price(&self) -> Option<Decimal> {
        self.levels.keys().next().copied()
    }

    /// Highest price with resting orders.
    pub fn max_price(&self) -> Option<Decimal> {
        self.levels.keys().next_back().copied()
    }

    /// Level at the lowest price.
    pub fn min_level(&self) -> Option<&PriceLevel> {
        self.levels.values().next()
    }

    /// Level at the highest price.
    pub fn max_level(&self) -> Option<&PriceLevel> {
        self.levels.values().next_back()
    }

    /// FIFO head of the level at `price`, if the level exists.
    pub fn head_at(&self, price: Decimal) -> Option<&Order> {
        self.levels
            .get(&price)
            .and_then(|level| level.head_order(&self.arena))
    }

    /// Total resting quantity at `price`; zero for an absent level.
    pub fn volume_at(&self, price: Decimal) -> Decimal {
        self.levels
            .get(&price)
            .map_or(Decimal::ZERO, |level| level.volume())
    }

    /// Number of resting orders on this side.
    pub fn len(&self) -> u64 {
        self.total_orders
    }

    /// Returns true when no orders rest on this side.
    pub fn is_empty(&self) -> bool {
        self.total_orders == 0
    }

    /// Total resting quantity on this side.
    pub fn volume(&self) -> Decimal {
        self.total_volume
    }

    /// Number of distinct price levels.
    pub fn depth(&self) -> usize {
        self.levels.len()
    }

    /// Yields the levels in ascending price order.
    pub fn levels(&self) -> impl DoubleEndedIterator<Item = &PriceLevel> {
        self.levels.values()
    }

    /// Yields every resting order in ascending price order, FIFO within
    /// each level.
    pub fn iter(&self) -> impl Iterator<Item = &Order> {
        self.levels.values().flat_map(|level| level.iter(&self.arena))
    }

    /// Test support: walks the whole structure and checks the aggregate
    /// invariants hold. Returns false on the first violation.
    pub fn is_consistent(&self) -> bool {
        let mut orders_seen = 0u64;
        let mut volume_seen = Decimal::ZERO;

        for (&price, level) in &self.levels {
            if level.is_empty() {
                return false;
            }
            let mut level_count = 0u64;
            let mut level_volume = Decimal::ZERO;
            for order in level.iter(&self.arena) {
                if order.price != price || order.side != self.side {
                    return false;
                }
                if order.quantity <= Decimal::ZERO {
                    return false;
                }
                // Every queued order must be reachable through the index
                match self.by_id.get(&order.order_id) {
                    Some(&handle) if self.arena.get(handle).order_id == order.order_id => {}
                    _ => return false,
                }
                level_count += 1;
                level_volume += order.quantity;
            }
            if level_count != level.order_count() || level_volume != level.volume() {
                return false;
            }
            orders_seen += level_count;
            volume_seen += level_volume;
        }

        orders_seen == self.total_orders
            && volume_seen == self.total_volume
            && self.by_id.len() as u64 == self.total_orders
            && self.arena.len() as u64 == self.total_orders
    }
}
