//--------------------------------------------------------------------------------------------------
// STRUCTS
//--------------------------------------------------------------------------------------------------
// | Name                 | Description                                    | Key Methods         |
// |----------------------|------------------------------------------------|---------------------|
// | OrderProcessResult   | Response envelope for a submitted order        |                     |
// | ModifyOrderRequest   | Partial update merged onto a resting order     | apply               |
// | MarketStatusResponse | Health/market session payload                  | from_engine         |
// | DepthQuery           | Query parameters for the depth endpoint        |                     |
// | TradesQuery          | Query parameters for the trades endpoint       |                     |
//--------------------------------------------------------------------------------------------------

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::matching_engine::MatchingEngine;
use crate::trade::TradeRecord;
use crate::types::{OrderUpdate, RestingOrder, Side};

/// Response envelope for a submitted order: the trades it produced and the
/// remainder left resting, if any.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderProcessResult {
    pub trades: Vec<TradeRecord>,
    pub order: Option<RestingOrder>,
}

/// Partial update for a resting order; omitted fields keep their current
/// values.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ModifyOrderRequest {
    #[serde(default)]
    pub quantity: Option<Decimal>,
    #[serde(default)]
    pub price: Option<Decimal>,
}

impl ModifyOrderRequest {
    /// Merges this partial update onto the resting order it targets,
    /// producing the full replacement values the engine expects.
    pub fn apply(&self, side: Side, existing: &RestingOrder) -> OrderUpdate {
        OrderUpdate {
            side,
            quantity: self.quantity.unwrap_or(existing.quantity),
            price: self.price.unwrap_or(existing.price),
        }
    }
}

/// Health/market session payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarketStatusResponse {
    pub status: String,
    pub market_name: String,
    pub tick_size: Decimal,
    pub is_closed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub closed_reason: Option<String>,
}

impl MarketStatusResponse {
    pub fn from_engine(engine: &MatchingEngine) -> Self {
        Self {
            status: "ok".to_string(),
            market_name: engine.market_name().to_string(),
            tick_size: engine.tick_size(),
            is_closed: engine.is_closed(),
            closed_reason: engine.closed_reason().map(str::to_string),
        }
    }
}

/// Query parameters for the depth endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct DepthQuery {
    #[serde(default = "default_depth_levels")]
    pub levels: usize,
}

fn default_depth_levels() -> usize {
    10
}

/// Query parameters for the trades endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct TradesQuery {
    #[serde(default = "default_trades_limit")]
    pub limit: usize,
}

fn default_trades_limit() -> usize {
    50
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn resting() -> RestingOrder {
        RestingOrder {
            order_id: 1,
            side: Side::Bid,
            quantity: dec!(2),
            price: dec!(100),
            timestamp: 1,
            trade_id: "1".to_string(),
            wage: None,
        }
    }

    #[test]
    fn test_modify_merge_keeps_omitted_fields() {
        let partial = ModifyOrderRequest {
            quantity: Some(dec!(5)),
            price: None,
        };
        let update = partial.apply(Side::Bid, &resting());
        assert_eq!(update.quantity, dec!(5));
        assert_eq!(update.price, dec!(100));
        assert_eq!(update.side, Side::Bid);
    }

    #[test]
    fn test_modify_merge_empty_is_identity() {
        let update = ModifyOrderRequest::default().apply(Side::Bid, &resting());
        assert_eq!(update.quantity, dec!(2));
        assert_eq!(update.price, dec!(100));
    }
}
