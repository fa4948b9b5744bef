//! Company Research - terminal client for the Company Research Assistant
//!
//! This library keeps a chat history that survives backend outages: every
//! history operation goes to the backend first and lands in a local store
//! when the backend cannot answer.

pub mod cli;
mod config;
pub mod core;
pub mod models;
pub mod service;
pub mod session;
pub mod storage;
pub mod utils;

pub use self::config::{ApiConfig, LoggingConfig, Settings, StorageConfig};
pub use self::core::{ApiError, ResearchClient};
pub use self::models::{derive_title, Chat, ChatSummary, Message, Role, DEFAULT_TITLE};
pub use self::service::ChatService;
pub use self::session::{BackendStatus, ChatController, ControllerError, HealthMonitor};
pub use self::storage::{ChatStore, StoreError};
