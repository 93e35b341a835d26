//--------------------------------------------------------------------------------------------------
// FUNCTIONS
//--------------------------------------------------------------------------------------------------
// | Name                  | Description                            | Return Type         |
// |-----------------------|----------------------------------------|---------------------|
// | health                | Health check / market session status   | Response            |
// | create_order          | Submit and match a new order           | ApiResult<Response> |
// | list_orders           | List resting orders for one side       | ApiResult<Response> |
// | get_order             | Get one resting order                  | ApiResult<Response> |
// | modify_order          | Partially update a resting order       | ApiResult<Response> |
// | cancel_order          | Cancel a resting order                 | ApiResult<Response> |
// | summary               | Best prices, volumes and engine time   | ApiResult<Response> |
// | depth                 | Aggregated ladder snapshot             | ApiResult<Response> |
// | trades                | Recent trades from the shared tape     | ApiResult<Response> |
//--------------------------------------------------------------------------------------------------

use std::sync::Arc;

use axum::{
    Json,
    extract::{Extension, Path, Query},
    http::StatusCode,
    response::{IntoResponse, Response},
};

use super::{ApiResult, AppState};
use super::dto::{DepthQuery, MarketStatusResponse, ModifyOrderRequest, OrderProcessResult, TradesQuery};
use crate::types::{OrderRequest, Side};

/// Health check and market session status
pub async fn health(Extension(state): Extension<Arc<AppState>>) -> impl IntoResponse {
    let engine = state.engine.lock();
    Json(MarketStatusResponse::from_engine(&engine))
}

/// Submit and match a new order
pub async fn create_order(
    Extension(state): Extension<Arc<AppState>>,
    Json(request): Json<OrderRequest>,
) -> ApiResult<Response> {
    let mut engine = state.engine.lock();
    let result = engine.submit(request, false, false)?;

    let response = OrderProcessResult {
        trades: result.trades,
        order: result.resting_order,
    };
    Ok((StatusCode::CREATED, Json(response)).into_response())
}

/// List resting orders for one side, best-to-worst within ascending prices
pub async fn list_orders(
    Extension(state): Extension<Arc<AppState>>,
    Path(side): Path<String>,
) -> ApiResult<Response> {
    let side: Side = side.parse()?;
    let engine = state.engine.lock();
    Ok((StatusCode::OK, Json(engine.list(side))).into_response())
}

/// Get one resting order
pub async fn get_order(
    Extension(state): Extension<Arc<AppState>>,
    Path((side, order_id)): Path<(String, u64)>,
) -> ApiResult<Response> {
    let side: Side = side.parse()?;
    let engine = state.engine.lock();
    let order = engine.get_order(side, order_id)?;
    Ok((StatusCode::OK, Json(order)).into_response())
}

/// Partially update a resting order; omitted fields keep their values
pub async fn modify_order(
    Extension(state): Extension<Arc<AppState>>,
    Path((side, order_id)): Path<(String, u64)>,
    Json(updates): Json<ModifyOrderRequest>,
) -> ApiResult<Response> {
    let side: Side = side.parse()?;
    let mut engine = state.engine.lock();

    let existing = engine.get_order(side, order_id)?;
    let update = updates.apply(side, &existing);
    engine.modify(order_id, update, None)?;

    let updated = engine.get_order(side, order_id)?;
    Ok((StatusCode::OK, Json(updated)).into_response())
}

/// Cancel a resting order
pub async fn cancel_order(
    Extension(state): Extension<Arc<AppState>>,
    Path((side, order_id)): Path<(String, u64)>,
) -> ApiResult<Response> {
    let side: Side = side.parse()?;
    let mut engine = state.engine.lock();
    engine.cancel(side, order_id, None)?;
    Ok(StatusCode::NO_CONTENT.into_response())
}

/// Best prices, side volumes and engine time
pub async fn summary(Extension(state): Extension<Arc<AppState>>) -> ApiResult<Response> {
    let engine = state.engine.lock();
    Ok((StatusCode::OK, Json(engine.summary())).into_response())
}

/// Aggregated ladder snapshot, best price first
pub async fn depth(
    Extension(state): Extension<Arc<AppState>>,
    Query(query): Query<DepthQuery>,
) -> ApiResult<Response> {
    let engine = state.engine.lock();
    Ok((StatusCode::OK, Json(engine.depth_snapshot(query.levels))).into_response())
}

/// Recent trades, oldest first
pub async fn trades(
    Extension(state): Extension<Arc<AppState>>,
    Query(query): Query<TradesQuery>,
) -> ApiResult<Response> {
    Ok((StatusCode::OK, Json(state.tape.recent(query.limit))).into_response())
}
