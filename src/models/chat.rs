//! Chat and Message records
//!
//! The serialized shape (`id, title, messages, createdAt, updatedAt`) is shared
//! by the remote API and the local store, so it must not drift.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

pub const DEFAULT_TITLE: &str = "New Conversation";

const TITLE_MAX_CHARS: usize = 30;
const TITLE_ELLIPSIS: char = '…';

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::User => write!(f, "user"),
            Role::Assistant => write!(f, "assistant"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

impl Message {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Chat {
    pub id: String,
    pub title: String,
    pub messages: Vec<Message>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Chat {
    /// Fresh chat: new id, default title, no messages, `created_at == updated_at`
    pub fn new() -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4().to_string(),
            title: DEFAULT_TITLE.to_string(),
            messages: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Refresh `updated_at`. Never moves it backwards, even if the clock does.
    pub fn touch(&mut self) {
        self.updated_at = Utc::now().max(self.updated_at);
    }

    pub fn set_title(&mut self, title: impl Into<String>) {
        self.title = title.into();
        self.touch();
    }

    /// Append a message. The first user message of a chat that still carries
    /// the default title names the chat.
    pub fn push_message(&mut self, message: Message) {
        if self.messages.is_empty() && message.role == Role::User && self.title == DEFAULT_TITLE {
            self.title = derive_title(&message.content);
        }
        self.messages.push(message);
        self.touch();
    }

    pub fn summary(&self) -> ChatSummary {
        ChatSummary::from(self)
    }
}

impl Default for Chat {
    fn default() -> Self {
        Self::new()
    }
}

/// Sidebar row for the history list
#[derive(Debug, Clone, PartialEq)]
pub struct ChatSummary {
    pub id: String,
    pub title: String,
    pub message_count: usize,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<&Chat> for ChatSummary {
    fn from(chat: &Chat) -> Self {
        Self {
            id: chat.id.clone(),
            title: chat.title.clone(),
            message_count: chat.messages.len(),
            created_at: chat.created_at,
            updated_at: chat.updated_at,
        }
    }
}

/// Title for a chat named after its first message: the content itself, or its
/// first 30 characters plus an ellipsis when longer.
pub fn derive_title(content: &str) -> String {
    if content.chars().count() > TITLE_MAX_CHARS {
        let mut title: String = content.chars().take(TITLE_MAX_CHARS).collect();
        title.push(TITLE_ELLIPSIS);
        title
    } else {
        content.to_string()
    }
}
