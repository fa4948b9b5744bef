//! Chat History Storage Abstraction
//!
//! Information Hiding:
//! - Where a chat lives (backend API, file, memory) is hidden behind `ChatStore`
//! - Local persistence primitives are hidden behind `KeyValueStore`
//! - Online/offline switching is a `ChatStore` of its own (`FallbackChatStore`)

use crate::models::{Chat, Message};
use async_trait::async_trait;
use thiserror::Error;

pub mod fallback;
pub mod filesystem;
pub mod local;
pub mod memory;
pub mod remote;

pub use fallback::FallbackChatStore;
pub use filesystem::FileKeyValueStore;
pub use local::{LocalChatStore, LOCAL_STORAGE_KEY};
pub use memory::InMemoryKeyValueStore;
pub use remote::RemoteChatStore;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("remote store returned status {0}")]
    Status(u16),

    #[error("failed to decode response: {0}")]
    Decode(String),

    #[error("invalid base url '{0}'")]
    InvalidBaseUrl(String),

    #[error("local storage I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to encode chats: {0}")]
    Encode(#[from] serde_json::Error),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Uniform contract over a collection of chats
#[async_trait]
pub trait ChatStore: Send + Sync {
    /// Short name used in log lines
    fn name(&self) -> &'static str;

    async fn list_chats(&self) -> StoreResult<Vec<Chat>>;

    /// `Ok(None)` when the store holds no chat with this id
    async fn get_chat(&self, chat_id: &str) -> StoreResult<Option<Chat>>;

    /// Insert or replace by id
    async fn save_chat(&self, chat: &Chat) -> StoreResult<()>;

    async fn delete_chat(&self, chat_id: &str) -> StoreResult<()>;

    async fn update_title(&self, chat_id: &str, title: &str) -> StoreResult<()>;

    async fn add_message(&self, chat_id: &str, message: &Message) -> StoreResult<()>;
}

/// String key-value persistence, the local equivalent of browser storage
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// `Ok(None)` if the key was never written
    async fn get(&self, key: &str) -> StoreResult<Option<String>>;

    async fn set(&self, key: &str, value: &str) -> StoreResult<()>;

    async fn remove(&self, key: &str) -> StoreResult<()>;

    async fn contains(&self, key: &str) -> StoreResult<bool> {
        Ok(self.get(key).await?.is_some())
    }
}
