pub mod api;

pub use api::{normalize_symbols, ApiError, ResearchClient};
