use thiserror::Error;

/// Type alias for Result with OrderBookError
pub type BookResult<T> = Result<T, OrderBookError>;

/// Errors surfaced by the order book engine.
///
/// Every failure is raised before the book is touched, so a returned error
/// always leaves the resting book exactly as it was.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum OrderBookError {
    /// The order quantity is zero or negative.
    #[error("Invalid quantity: {0}")]
    InvalidQuantity(String),

    /// Bad side, bad order type, or a limit order without a usable price.
    #[error("Invalid order type: {0}")]
    InvalidOrderType(String),

    /// Cancel/modify/get targeted a (side, order_id) pair that is not resting.
    #[error("Order not found: {0}")]
    OrderNotFound(String),
}
