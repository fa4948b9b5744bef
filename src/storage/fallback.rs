//! Online/Offline Fallback Store
//!
//! Information Hiding:
//! - Callers see one `ChatStore`; which backend answered is only visible in logs
//! - Primary failures of any kind are absorbed, never retried
//! - Results are never merged across the two stores

use super::{ChatStore, StoreError, StoreResult};
use crate::models::{Chat, Message};
use async_trait::async_trait;
use std::sync::Arc;

/// Tries `primary` for every operation and hands the operation to `secondary`
/// when `primary` returns any error.
pub struct FallbackChatStore {
    primary: Arc<dyn ChatStore>,
    secondary: Arc<dyn ChatStore>,
}

impl FallbackChatStore {
    pub fn new(primary: Arc<dyn ChatStore>, secondary: Arc<dyn ChatStore>) -> Self {
        Self { primary, secondary }
    }

    fn log_fallback(&self, operation: &str, error: &StoreError) {
        tracing::warn!(
            "[FallbackChatStore] {} failed on {} store, using {} store: {}",
            operation,
            self.primary.name(),
            self.secondary.name(),
            error
        );
    }
}

#[async_trait]
impl ChatStore for FallbackChatStore {
    fn name(&self) -> &'static str {
        "fallback"
    }

    async fn list_chats(&self) -> StoreResult<Vec<Chat>> {
        match self.primary.list_chats().await {
            Ok(chats) => Ok(chats),
            Err(e) => {
                self.log_fallback("list_chats", &e);
                self.secondary.list_chats().await
            }
        }
    }

    async fn get_chat(&self, chat_id: &str) -> StoreResult<Option<Chat>> {
        match self.primary.get_chat(chat_id).await {
            Ok(chat) => Ok(chat),
            Err(e) => {
                self.log_fallback("get_chat", &e);
                self.secondary.get_chat(chat_id).await
            }
        }
    }

    async fn save_chat(&self, chat: &Chat) -> StoreResult<()> {
        match self.primary.save_chat(chat).await {
            Ok(()) => Ok(()),
            Err(e) => {
                self.log_fallback("save_chat", &e);
                self.secondary.save_chat(chat).await
            }
        }
    }

    async fn delete_chat(&self, chat_id: &str) -> StoreResult<()> {
        match self.primary.delete_chat(chat_id).await {
            Ok(()) => Ok(()),
            Err(e) => {
                self.log_fallback("delete_chat", &e);
                self.secondary.delete_chat(chat_id).await
            }
        }
    }

    async fn update_title(&self, chat_id: &str, title: &str) -> StoreResult<()> {
        match self.primary.update_title(chat_id, title).await {
            Ok(()) => Ok(()),
            Err(e) => {
                self.log_fallback("update_title", &e);
                self.secondary.update_title(chat_id, title).await
            }
        }
    }

    async fn add_message(&self, chat_id: &str, message: &Message) -> StoreResult<()> {
        match self.primary.add_message(chat_id, message).await {
            Ok(()) => Ok(()),
            Err(e) => {
                self.log_fallback("add_message", &e);
                self.secondary.add_message(chat_id, message).await
            }
        }
    }
}
