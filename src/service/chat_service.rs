use crate::config::Settings;
use crate::models::{Chat, Message};
use crate::storage::{
    ChatStore, FallbackChatStore, FileKeyValueStore, KeyValueStore, LocalChatStore,
    RemoteChatStore, StoreResult,
};
use std::sync::Arc;

#[derive(Clone)]
pub struct ChatService {
    store: Arc<dyn ChatStore>,
}

impl ChatService {
    pub fn new(store: Arc<dyn ChatStore>) -> Self {
        Self { store }
    }

    /// Remote store at `base_url`, falling back to `kv`
    pub fn with_fallback(base_url: &str, kv: Arc<dyn KeyValueStore>) -> StoreResult<Self> {
        let remote = RemoteChatStore::new(base_url)?;
        let local = LocalChatStore::new(kv);
        Ok(Self::new(Arc::new(FallbackChatStore::new(
            Arc::new(remote),
            Arc::new(local),
        ))))
    }

    /// Remote store from `api.base_url`, local files under `storage.dir`
    pub async fn from_settings(settings: &Settings) -> StoreResult<Self> {
        let kv = FileKeyValueStore::new(settings.storage.dir.clone()).await?;
        Self::with_fallback(&settings.api.base_url, Arc::new(kv))
    }

    pub async fn create_chat(&self) -> StoreResult<Chat> {
        let chat = Chat::new();
        self.store.save_chat(&chat).await?;
        tracing::info!("Created chat '{}'", chat.id);
        Ok(chat)
    }

    pub async fn get_chats(&self) -> StoreResult<Vec<Chat>> {
        self.store.list_chats().await
    }

    pub async fn get_chat(&self, chat_id: &str) -> StoreResult<Option<Chat>> {
        self.store.get_chat(chat_id).await
    }

    /// Stamps `updated_at` on the caller's value before persisting it
    pub async fn save_chat(&self, chat: &mut Chat) -> StoreResult<()> {
        chat.touch();
        self.store.save_chat(chat).await
    }

    pub async fn delete_chat(&self, chat_id: &str) -> StoreResult<()> {
        self.store.delete_chat(chat_id).await?;
        tracing::info!("Deleted chat '{}'", chat_id);
        Ok(())
    }

    pub async fn update_chat_title(&self, chat_id: &str, title: &str) -> StoreResult<()> {
        self.store.update_title(chat_id, title).await
    }

    pub async fn add_message_to_chat(&self, chat_id: &str, message: &Message) -> StoreResult<()> {
        self.store.add_message(chat_id, message).await
    }
}
