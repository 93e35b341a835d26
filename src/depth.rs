//--------------------------------------------------------------------------------------------------
// MODULE OVERVIEW
//--------------------------------------------------------------------------------------------------
// This module defines aggregated, read-only views of the book ladder for API consumers.
//
// | Component       | Description                                                |
// |-----------------|------------------------------------------------------------|
// | DepthLevel      | Aggregated volume and order count at one price             |
// | DepthSnapshot   | Immutable point-in-time view of both ladders               |
//--------------------------------------------------------------------------------------------------

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Aggregated information at one price of one ladder.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DepthLevel {
    /// The price for this level
    pub price: Decimal,
    /// Total resting quantity at this price
    pub volume: Decimal,
    /// Number of orders at this price
    pub order_count: u64,
}

/// An immutable snapshot of order book depth at a specific point in time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DepthSnapshot {
    /// Bid levels ordered by price descending (best bids first)
    pub bids: Vec<DepthLevel>,
    /// Ask levels ordered by price ascending (best asks first)
    pub asks: Vec<DepthLevel>,
    /// Wall-clock time the snapshot was taken
    pub generated_at: DateTime<Utc>,
}

impl DepthSnapshot {
    /// Creates a snapshot stamped with the current wall-clock time.
    pub fn new(bids: Vec<DepthLevel>, asks: Vec<DepthLevel>) -> Self {
        Self {
            bids,
            asks,
            generated_at: Utc::now(),
        }
    }

    /// Best bid price, if any.
    pub fn best_bid(&self) -> Option<Decimal> {
        self.bids.first().map(|level| level.price)
    }

    /// Best ask price, if any.
    pub fn best_ask(&self) -> Option<Decimal> {
        self.asks.first().map(|level| level.price)
    }

    /// Spread between best ask and best bid, if both exist.
    pub fn spread(&self) -> Option<Decimal> {
        match (self.best_ask(), self.best_bid()) {
            (Some(ask), Some(bid)) => Some(ask - bid),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn level(price: Decimal, volume: Decimal) -> DepthLevel {
        DepthLevel {
            price,
            volume,
            order_count: 1,
        }
    }

    #[test]
    fn test_empty_snapshot() {
        let snapshot = DepthSnapshot::new(Vec::new(), Vec::new());
        assert_eq!(snapshot.best_bid(), None);
        assert_eq!(snapshot.best_ask(), None);
        assert_eq!(snapshot.spread(), None);
    }

    #[test]
    fn test_best_prices_and_spread() {
        let snapshot = DepthSnapshot::new(
            vec![level(dec!(100), dec!(2)), level(dec!(99), dec!(1))],
            vec![level(dec!(101), dec!(3)), level(dec!(102), dec!(4))],
        );
        assert_eq!(snapshot.best_bid(), Some(dec!(100)));
        assert_eq!(snapshot.best_ask(), Some(dec!(101)));
        assert_eq!(snapshot.spread(), Some(dec!(1)));
    }
}
