//! Local Chat Store
//!
//! Information Hiding:
//! - The whole collection lives as one JSON array under one key
//! - Every mutation is read-modify-write of that array
//! - A corrupt array reads as an empty history instead of an error

use super::{ChatStore, KeyValueStore, StoreResult};
use crate::models::{Chat, Message};
use async_trait::async_trait;
use std::sync::Arc;

pub const LOCAL_STORAGE_KEY: &str = "company_research_chats";

pub struct LocalChatStore {
    kv: Arc<dyn KeyValueStore>,
}

impl LocalChatStore {
    pub fn new(kv: Arc<dyn KeyValueStore>) -> Self {
        Self { kv }
    }

    async fn read_all(&self) -> StoreResult<Vec<Chat>> {
        let Some(json) = self.kv.get(LOCAL_STORAGE_KEY).await? else {
            return Ok(Vec::new());
        };

        match serde_json::from_str::<Vec<Chat>>(&json) {
            Ok(chats) => Ok(chats),
            Err(e) => {
                tracing::error!(
                    "[LocalChatStore] Error parsing stored chats, treating as empty: {}",
                    e
                );
                Ok(Vec::new())
            }
        }
    }

    async fn write_all(&self, chats: &[Chat]) -> StoreResult<()> {
        let json = serde_json::to_string(chats)?;
        self.kv.set(LOCAL_STORAGE_KEY, &json).await?;
        tracing::debug!("[LocalChatStore] Wrote {} chats", chats.len());
        Ok(())
    }

    /// Apply `f` to the chat with `chat_id`, if any, and write the collection back
    async fn modify<F>(&self, chat_id: &str, f: F) -> StoreResult<()>
    where
        F: FnOnce(&mut Chat) + Send,
    {
        let mut chats = self.read_all().await?;
        match chats.iter_mut().find(|c| c.id == chat_id) {
            Some(chat) => f(chat),
            None => tracing::debug!("[LocalChatStore] Chat '{}' not found locally", chat_id),
        }
        self.write_all(&chats).await
    }
}

#[async_trait]
impl ChatStore for LocalChatStore {
    fn name(&self) -> &'static str {
        "local"
    }

    async fn list_chats(&self) -> StoreResult<Vec<Chat>> {
        self.read_all().await
    }

    async fn get_chat(&self, chat_id: &str) -> StoreResult<Option<Chat>> {
        let chats = self.read_all().await?;
        Ok(chats.into_iter().find(|c| c.id == chat_id))
    }

    async fn save_chat(&self, chat: &Chat) -> StoreResult<()> {
        let mut chats = self.read_all().await?;
        match chats.iter_mut().find(|c| c.id == chat.id) {
            Some(existing) => *existing = chat.clone(),
            None => chats.push(chat.clone()),
        }
        self.write_all(&chats).await
    }

    async fn delete_chat(&self, chat_id: &str) -> StoreResult<()> {
        let mut chats = self.read_all().await?;
        chats.retain(|c| c.id != chat_id);
        self.write_all(&chats).await
    }

    async fn update_title(&self, chat_id: &str, title: &str) -> StoreResult<()> {
        let title = title.to_string();
        self.modify(chat_id, move |chat| chat.set_title(title)).await
    }

    async fn add_message(&self, chat_id: &str, message: &Message) -> StoreResult<()> {
        let message = message.clone();
        self.modify(chat_id, move |chat| chat.push_message(message)).await
    }
}
