//--------------------------------------------------------------------------------------------------
// MODULE OVERVIEW
//--------------------------------------------------------------------------------------------------
// The HTTP front door: deserializes commands, hands them to the engine behind a mutex, and
// serializes the responses. Error kinds map 1:1 to status codes (InvalidQuantity and
// InvalidOrderType to 400, OrderNotFound to 404).
//
// | Component     | Description                                                |
// |---------------|------------------------------------------------------------|
// | AppState      | Mutex-guarded engine plus the shared trade tape            |
// | router        | Route table with request tracing                           |
//--------------------------------------------------------------------------------------------------

pub mod dto;
mod error;
mod routes;

use std::sync::Arc;

use axum::{
    Extension, Router,
    routing::{get, post},
};
use parking_lot::Mutex;
use rust_decimal::Decimal;
use tower_http::trace::TraceLayer;

pub use error::{ApiError, ApiResult};

use crate::matching_engine::MatchingEngine;
use crate::trade::TradeTape;

/// Number of trades retained for the recent-trades endpoint.
const TRADE_TAPE_CAPACITY: usize = 1_000;

/// Shared application state.
///
/// Commands from every connection serialize through the engine mutex, so
/// the single-threaded engine sees one command at a time. The tape is a
/// clone of the engine's sink and reads the same buffer.
pub struct AppState {
    pub engine: Mutex<MatchingEngine>,
    pub tape: TradeTape,
}

impl AppState {
    /// Creates the state for one market, wiring the engine's trade sink to
    /// a shared tape.
    pub fn new(market_name: &str, tick_size: Decimal) -> Self {
        let tape = TradeTape::new(TRADE_TAPE_CAPACITY);
        let engine = MatchingEngine::with_sink(market_name, tick_size, Box::new(tape.clone()));
        Self {
            engine: Mutex::new(engine),
            tape,
        }
    }
}

/// Builds the route table for the given state.
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(routes::health))
        .route("/api/orders", post(routes::create_order))
        .route("/api/orders/:side", get(routes::list_orders))
        .route(
            "/api/orders/:side/:order_id",
            get(routes::get_order)
                .patch(routes::modify_order)
                .delete(routes::cancel_order),
        )
        .route("/api/summary", get(routes::summary))
        .route("/api/depth", get(routes::depth))
        .route("/api/trades", get(routes::trades))
        .layer(TraceLayer::new_for_http())
        .layer(Extension(state))
}
