//--------------------------------------------------------------------------------------------------
// MODULE OVERVIEW
//--------------------------------------------------------------------------------------------------
// This module defines the core data types used throughout the matching engine:
// order sides and types, resting orders, and the command payloads the engine accepts.
//
// | Section            | Description                                                      |
// |--------------------|------------------------------------------------------------------|
// | ENUMS              | Side and OrderType with their string/wire forms.                 |
// | STRUCTS            | Order, OrderData, OrderRequest, OrderUpdate, RestingOrder.       |
// | TESTS              | Unit tests for parsing, crossing rules and conversions.          |
//--------------------------------------------------------------------------------------------------

use std::fmt;
use std::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::OrderBookError;
use crate::price_level::OrderHandle;
use crate::side_book::SideBook;

//--------------------------------------------------------------------------------------------------
//  ENUMS
//--------------------------------------------------------------------------------------------------
// | Name          | Description                                 |
// |---------------|---------------------------------------------|
// | Side          | Represents the side of an order (Bid/Ask).  |
// | OrderType     | Represents the type of an order.            |
//--------------------------------------------------------------------------------------------------

/// Represents the side of an order (Bid or Ask).
///
/// Serializes as `"bid"` / `"ask"` on the wire. The min-vs-max asymmetry
/// between the two books is localized here: [`Side::best_price`] and
/// [`Side::crosses`] are the only places that know bids want high prices
/// and asks want low ones.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    /// A buy order.
    Bid,
    /// A sell order.
    Ask,
}

impl Side {
    /// Returns the opposite side.
    pub fn opposite(self) -> Side {
        match self {
            Side::Bid => Side::Ask,
            Side::Ask => Side::Bid,
        }
    }

    /// Returns the best price of a book holding orders of this side:
    /// the highest price for bids, the lowest for asks.
    pub fn best_price(self, book: &SideBook) -> Option<Decimal> {
        match self {
            Side::Bid => book.max_price(),
            Side::Ask => book.min_price(),
        }
    }

    /// Returns true when an incoming order of this side priced at
    /// `incoming_price` crosses the opposite side's best price.
    pub fn crosses(self, incoming_price: Decimal, opposite_best: Decimal) -> bool {
        match self {
            Side::Bid => incoming_price >= opposite_best,
            Side::Ask => incoming_price <= opposite_best,
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::Bid => write!(f, "bid"),
            Side::Ask => write!(f, "ask"),
        }
    }
}

impl FromStr for Side {
    type Err = OrderBookError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "bid" => Ok(Side::Bid),
            "ask" => Ok(Side::Ask),
            other => Err(OrderBookError::InvalidOrderType(format!(
                "side must be one of 'bid', 'ask', got: {other}"
            ))),
        }
    }
}

/// Represents the type of an order, influencing its matching behavior.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderType {
    /// An order that executes at a specific price or better and may rest.
    Limit,
    /// An order that executes immediately against the best available prices.
    Market,
}

impl fmt::Display for OrderType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OrderType::Limit => write!(f, "limit"),
            OrderType::Market => write!(f, "market"),
        }
    }
}

impl FromStr for OrderType {
    type Err = OrderBookError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "limit" => Ok(OrderType::Limit),
            "market" => Ok(OrderType::Market),
            other => Err(OrderBookError::InvalidOrderType(format!(
                "order type must be one of 'limit', 'market', got: {other}"
            ))),
        }
    }
}

//--------------------------------------------------------------------------------------------------
//  STRUCTS
//--------------------------------------------------------------------------------------------------
// | Name          | Description                                           |
// |---------------|-------------------------------------------------------|
// | Order         | A resting order inside a price level queue.           |
// | OrderData     | Payload used to insert/replace an order in a book.    |
// | OrderRequest  | An incoming submit command.                           |
// | OrderUpdate   | Replacement values carried by a modify command.       |
// | RestingOrder  | Read-only echo of a resting order.                    |
//--------------------------------------------------------------------------------------------------

/// A resting order inside a [`crate::side_book::SideBook`].
///
/// Orders live in the side's arena and are chained into their price level's
/// FIFO queue through the `prev`/`next` handles. The owning level is
/// recoverable through `price`, so no separate back-pointer is kept.
#[derive(Debug, Clone, PartialEq)]
pub struct Order {
    /// Engine-assigned identifier, monotonic unless replaying.
    pub order_id: u64,
    /// Side of the book this order rests on.
    pub side: Side,
    /// Resting limit price, strictly positive.
    pub price: Decimal,
    /// Remaining quantity, strictly positive while resting.
    pub quantity: Decimal,
    /// Engine time of creation or last priority-losing update.
    pub timestamp: u64,
    /// Opaque client tag; defaults to the decimal form of `order_id`.
    pub trade_id: String,
    /// Opaque fee tag carried verbatim into trade records.
    pub wage: Option<String>,
    /// Previous order in the price level queue (`None` at the head).
    pub(crate) prev: Option<OrderHandle>,
    /// Next order in the price level queue (`None` at the tail).
    pub(crate) next: Option<OrderHandle>,
}

/// Payload used to insert or replace an order in a [`SideBook`].
#[derive(Debug, Clone, PartialEq)]
pub struct OrderData {
    pub order_id: u64,
    pub price: Decimal,
    pub quantity: Decimal,
    pub timestamp: u64,
    pub trade_id: String,
    pub wage: Option<String>,
}

/// An incoming submit command.
///
/// `order_id` and `timestamp` are only honored when replaying from recorded
/// data; live submissions have both assigned by the engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderRequest {
    pub side: Side,
    #[serde(rename = "type")]
    pub order_type: OrderType,
    pub quantity: Decimal,
    /// Required for limit orders, never set for market orders.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price: Option<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trade_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wage: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order_id: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<u64>,
}

/// Replacement values carried by a modify command.
///
/// Modify is a full replacement of price and quantity on the stated side;
/// partial updates are merged by the caller before reaching the engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderUpdate {
    pub side: Side,
    pub quantity: Decimal,
    pub price: Decimal,
}

/// Read-only echo of a resting order, returned from submit and the query
/// facade.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RestingOrder {
    pub order_id: u64,
    pub side: Side,
    pub quantity: Decimal,
    pub price: Decimal,
    pub timestamp: u64,
    pub trade_id: String,
    pub wage: Option<String>,
}

impl From<&Order> for RestingOrder {
    fn from(order: &Order) -> Self {
        Self {
            order_id: order.order_id,
            side: order.side,
            quantity: order.quantity,
            price: order.price,
            timestamp: order.timestamp,
            trade_id: order.trade_id.clone(),
            wage: order.wage.clone(),
        }
    }
}

//--------------------------------------------------------------------------------------------------
//  TESTS
//--------------------------------------------------------------------------------------------------
