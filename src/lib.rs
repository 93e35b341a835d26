// Expose the modules
pub mod api;
pub mod config;
pub mod depth;
pub mod error;
pub mod matching_engine;
pub mod price_level;
pub mod side_book;
pub mod trade;
pub mod types;

// Re-export key types for easier usage
pub use config::Config;
pub use depth::{DepthLevel, DepthSnapshot};
pub use error::{BookResult, OrderBookError};
pub use matching_engine::{BookSummary, DEFAULT_TICK_SIZE, MatchResult, MatchingEngine};
pub use price_level::{OrderArena, OrderHandle, PriceLevel};
pub use side_book::SideBook;
pub use trade::{ChannelSink, NullSink, TradeParty, TradeRecord, TradeSink, TradeTape};
pub use types::{Order, OrderData, OrderRequest, OrderType, OrderUpdate, RestingOrder, Side};
