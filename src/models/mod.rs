pub mod chat;
pub mod stock;

pub use chat::{derive_title, Chat, ChatSummary, Message, Role, DEFAULT_TITLE};
pub use stock::StockComparison;
