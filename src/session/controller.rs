//! Chat Controller
//!
//! Information Hiding:
//! - Owns the state the front end renders: history list, open chat, backend status
//! - Persistence goes through `ChatService`, completions through `ResearchClient`
//! - Completion failures become assistant messages instead of errors

use super::health_monitor::{probe, BackendStatus, HealthReport};
use crate::core::{ApiError, ResearchClient};
use crate::models::{Chat, ChatSummary, Message};
use crate::service::ChatService;
use crate::storage::StoreError;
use chrono::{DateTime, Utc};
use thiserror::Error;
use uuid::Uuid;

pub const TIMEOUT_REPLY: &str =
    "The request took too long to complete. This might be due to high server load or connection issues.";
pub const CONNECTION_REPLY: &str =
    "Unable to connect to the server. Please check if the backend is running.";
pub const GENERIC_REPLY: &str = "Sorry, I encountered an error. Please try again later.";

#[derive(Debug, Error)]
pub enum ControllerError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("chat '{0}' not found")]
    ChatNotFound(String),

    #[error("backend is not available (status: {0})")]
    BackendUnavailable(BackendStatus),

    #[error("message is empty")]
    EmptyMessage,
}

pub struct ChatController {
    service: ChatService,
    client: ResearchClient,
    user_id: String,
    chats: Vec<ChatSummary>,
    current: Option<Chat>,
    status: BackendStatus,
    status_seen_at: Option<DateTime<Utc>>,
}

impl ChatController {
    pub fn new(service: ChatService, client: ResearchClient) -> Self {
        let mut user_id = Uuid::new_v4().simple().to_string();
        user_id.truncate(13);

        Self {
            service,
            client,
            user_id,
            chats: Vec::new(),
            current: None,
            status: BackendStatus::Checking,
            status_seen_at: None,
        }
    }

    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    pub fn chats(&self) -> &[ChatSummary] {
        &self.chats
    }

    pub fn current(&self) -> Option<&Chat> {
        self.current.as_ref()
    }

    pub fn status(&self) -> BackendStatus {
        self.status
    }

    /// Override the backend status without a probe
    pub fn set_status(&mut self, status: BackendStatus) {
        self.status = status;
    }

    /// Adopt a health monitor report if it was taken after the status we
    /// already hold. Returns whether the status changed hands.
    pub fn apply_health_report(&mut self, report: &HealthReport) -> bool {
        let Some(checked) = report.last_checked else {
            return false;
        };
        if report.status == BackendStatus::Checking
            || self.status_seen_at.is_some_and(|seen| checked <= seen)
        {
            return false;
        }

        self.status = report.status;
        self.status_seen_at = Some(checked);
        true
    }

    fn observe_status(&mut self, status: BackendStatus) {
        self.status = status;
        self.status_seen_at = Some(Utc::now());
    }

    pub async fn check_backend(&mut self) -> BackendStatus {
        self.status = BackendStatus::Checking;
        let status = probe(&self.client).await;
        self.observe_status(status);
        self.status
    }

    /// Health check and history load, run side by side
    pub async fn start(&mut self) -> Result<(), ControllerError> {
        self.status = BackendStatus::Checking;
        let (status, chats) = futures::join!(probe(&self.client), self.service.get_chats());
        self.observe_status(status);
        self.chats = summarize(chats?);
        Ok(())
    }

    pub async fn refresh_history(&mut self) -> Result<(), ControllerError> {
        let chats = self.service.get_chats().await?;
        self.chats = summarize(chats);
        Ok(())
    }

    pub async fn new_chat(&mut self) -> Result<&Chat, ControllerError> {
        let chat = self.service.create_chat().await?;
        self.refresh_history().await?;
        Ok(self.current.insert(chat))
    }

    pub async fn select_chat(&mut self, chat_id: &str) -> Result<&Chat, ControllerError> {
        let chat = self
            .service
            .get_chat(chat_id)
            .await?
            .ok_or_else(|| ControllerError::ChatNotFound(chat_id.to_string()))?;
        Ok(self.current.insert(chat))
    }

    /// Blank titles are ignored
    pub async fn rename_chat(&mut self, chat_id: &str, title: &str) -> Result<(), ControllerError> {
        if title.trim().is_empty() {
            return Ok(());
        }

        self.service.update_chat_title(chat_id, title).await?;
        if let Some(chat) = self.current.as_mut().filter(|c| c.id == chat_id) {
            chat.set_title(title);
        }
        self.refresh_history().await
    }

    pub async fn delete_chat(&mut self, chat_id: &str) -> Result<(), ControllerError> {
        self.service.delete_chat(chat_id).await?;
        if self.current.as_ref().is_some_and(|c| c.id == chat_id) {
            self.current = None;
        }
        self.refresh_history().await
    }

    /// Send `text` to the assistant in the current chat (creating one if none is
    /// open) and return the assistant's reply. Nothing is sent unless the
    /// backend was last seen online.
    pub async fn send_message(&mut self, text: &str) -> Result<Message, ControllerError> {
        if text.trim().is_empty() {
            return Err(ControllerError::EmptyMessage);
        }
        if self.status != BackendStatus::Online {
            return Err(ControllerError::BackendUnavailable(self.status));
        }

        if self.current.is_none() {
            self.new_chat().await?;
        }

        let user_message = Message::user(text);
        self.append(&user_message).await?;

        let completion = self.client.send_chat_message(&self.user_id, text).await;
        let reply = match completion {
            Ok(content) => Message::assistant(content),
            Err(e) => {
                tracing::error!("Chat completion failed: {}", e);
                Message::assistant(self.failure_reply(&e))
            }
        };
        self.append(&reply).await?;

        self.refresh_history().await?;
        Ok(reply)
    }

    fn failure_reply(&mut self, error: &ApiError) -> &'static str {
        match error {
            ApiError::Timeout(_) => TIMEOUT_REPLY,
            ApiError::Connect(_) | ApiError::Transport(_) => {
                self.observe_status(BackendStatus::Offline);
                CONNECTION_REPLY
            }
            _ => GENERIC_REPLY,
        }
    }

    /// Persist to the current chat and mirror it in memory
    async fn append(&mut self, message: &Message) -> Result<(), ControllerError> {
        let Some(chat) = self.current.as_mut() else {
            return Ok(());
        };
        self.service.add_message_to_chat(&chat.id, message).await?;
        chat.push_message(message.clone());
        Ok(())
    }
}

/// Most recently updated first
fn summarize(chats: Vec<Chat>) -> Vec<ChatSummary> {
    let mut summaries: Vec<ChatSummary> = chats.iter().map(ChatSummary::from).collect();
    summaries.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
    summaries
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ApiConfig;
    use crate::storage::InMemoryKeyValueStore;
    use serde_json::json;
    use std::sync::Arc;
    use std::time::Duration;
    use wiremock::matchers::{method, path, path_regex};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    /// Backend whose health check and completion endpoint work but whose
    /// history endpoints are missing, so history lands in the local store.
    async fn backend(reply: ResponseTemplate) -> MockServer {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/"))
            .respond_with(ResponseTemplate::new(200))
            .mount(&mock_server)
            .await;
        Mock::given(method("POST"))
            .and(path("/api/chat/"))
            .respond_with(reply)
            .mount(&mock_server)
            .await;
        Mock::given(path_regex(r"^/api/chats/.*"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&mock_server)
            .await;
        mock_server
    }

    fn controller(base_url: &str, chat_timeout_secs: u64) -> ChatController {
        let service =
            ChatService::with_fallback(base_url, Arc::new(InMemoryKeyValueStore::new())).unwrap();
        let client = ResearchClient::new(&ApiConfig {
            base_url: base_url.to_string(),
            chat_timeout_secs,
            health_timeout_secs: 1,
            ..ApiConfig::default()
        })
        .unwrap();
        ChatController::new(service, client)
    }

    #[tokio::test]
    async fn test_send_message_round_trip() {
        let server = backend(
            ResponseTemplate::new(200)
                .set_body_json(json!({"response": "Tesla reported record revenue."})),
        )
        .await;
        let mut ctrl = controller(&server.uri(), 30);
        ctrl.start().await.unwrap();
        assert_eq!(ctrl.status(), BackendStatus::Online);

        let reply = ctrl
            .send_message("What are Tesla's latest financial results?")
            .await
            .unwrap();
        assert_eq!(reply, Message::assistant("Tesla reported record revenue."));

        let current = ctrl.current().unwrap();
        assert_eq!(current.title, "What are Tesla's latest financ…");
        assert_eq!(current.messages.len(), 2);

        assert_eq!(ctrl.chats().len(), 1);
        assert_eq!(ctrl.chats()[0].title, "What are Tesla's latest financ…");
        assert_eq!(ctrl.chats()[0].message_count, 2);
    }

    #[tokio::test]
    async fn test_offline_backend_blocks_completion() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/"))
            .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(3)))
            .mount(&mock_server)
            .await;
        Mock::given(method("POST"))
            .and(path("/api/chat/"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"response": "x"})))
            .expect(0)
            .mount(&mock_server)
            .await;

        let mut ctrl = controller(&mock_server.uri(), 30);
        assert_eq!(ctrl.check_backend().await, BackendStatus::Offline);

        let err = ctrl.send_message("hello").await.unwrap_err();
        assert!(matches!(err, ControllerError::BackendUnavailable(BackendStatus::Offline)));
        assert!(ctrl.current().is_none());
    }

    #[tokio::test]
    async fn test_completion_timeout_reply() {
        let server = backend(
            ResponseTemplate::new(200)
                .set_body_json(json!({"response": "late"}))
                .set_delay(Duration::from_secs(3)),
        )
        .await;
        let mut ctrl = controller(&server.uri(), 1);
        ctrl.check_backend().await;

        let reply = ctrl.send_message("slow question").await.unwrap();
        assert_eq!(reply, Message::assistant(TIMEOUT_REPLY));
        assert_eq!(ctrl.status(), BackendStatus::Online);
    }

    #[tokio::test]
    async fn test_completion_server_error_reply() {
        let server = backend(ResponseTemplate::new(500)).await;
        let mut ctrl = controller(&server.uri(), 30);
        ctrl.check_backend().await;

        let reply = ctrl.send_message("question").await.unwrap();
        assert_eq!(reply, Message::assistant(GENERIC_REPLY));
    }

    #[tokio::test]
    async fn test_connection_failure_marks_offline() {
        let mut ctrl = controller("http://127.0.0.1:9", 30);
        // Pretend a stale health check said the backend was up
        ctrl.set_status(BackendStatus::Online);

        let reply = ctrl.send_message("anyone there?").await.unwrap();
        assert_eq!(reply, Message::assistant(CONNECTION_REPLY));
        assert_eq!(ctrl.status(), BackendStatus::Offline);

        let chat = ctrl.current().unwrap();
        assert_eq!(chat.messages.len(), 2);
    }

    #[tokio::test]
    async fn test_older_health_report_does_not_undo_offline() {
        let mut ctrl = controller("http://127.0.0.1:9", 30);
        let before_failure = HealthReport {
            status: BackendStatus::Online,
            last_checked: Some(Utc::now() - chrono::Duration::seconds(10)),
        };
        assert!(ctrl.apply_health_report(&before_failure));
        assert_eq!(ctrl.status(), BackendStatus::Online);

        let reply = ctrl.send_message("anyone there?").await.unwrap();
        assert_eq!(reply, Message::assistant(CONNECTION_REPLY));

        assert!(!ctrl.apply_health_report(&before_failure));
        assert_eq!(ctrl.status(), BackendStatus::Offline);
        assert!(matches!(
            ctrl.send_message("still there?").await,
            Err(ControllerError::BackendUnavailable(BackendStatus::Offline))
        ));

        let newer = HealthReport {
            status: BackendStatus::Online,
            last_checked: Some(Utc::now() + chrono::Duration::seconds(1)),
        };
        assert!(ctrl.apply_health_report(&newer));
        assert_eq!(ctrl.status(), BackendStatus::Online);
    }

    #[test]
    fn test_unchecked_health_report_is_ignored() {
        let mut ctrl = controller("http://127.0.0.1:9", 30);
        assert!(!ctrl.apply_health_report(&HealthReport::default()));

        let in_flight = HealthReport {
            status: BackendStatus::Checking,
            last_checked: Some(Utc::now()),
        };
        assert!(!ctrl.apply_health_report(&in_flight));
        assert_eq!(ctrl.status(), BackendStatus::Checking);
    }

    #[tokio::test]
    async fn test_empty_message_rejected() {
        let mut ctrl = controller("http://127.0.0.1:9", 30);
        ctrl.set_status(BackendStatus::Online);

        assert!(matches!(
            ctrl.send_message("   ").await,
            Err(ControllerError::EmptyMessage)
        ));
    }

    #[tokio::test]
    async fn test_history_management() {
        let mut ctrl = controller("http://127.0.0.1:9", 30);

        let first = ctrl.new_chat().await.unwrap().id.clone();
        let second = ctrl.new_chat().await.unwrap().id.clone();
        assert_eq!(ctrl.chats().len(), 2);

        ctrl.select_chat(&first).await.unwrap();
        ctrl.rename_chat(&first, "Amazon news").await.unwrap();
        assert_eq!(ctrl.current().unwrap().title, "Amazon news");
        assert!(ctrl.chats().iter().any(|c| c.title == "Amazon news"));

        ctrl.rename_chat(&first, "  ").await.unwrap();
        assert_eq!(ctrl.current().unwrap().title, "Amazon news");

        ctrl.delete_chat(&first).await.unwrap();
        assert!(ctrl.current().is_none());
        assert_eq!(ctrl.chats().len(), 1);
        assert_eq!(ctrl.chats()[0].id, second);

        assert!(matches!(
            ctrl.select_chat(&first).await,
            Err(ControllerError::ChatNotFound(_))
        ));
    }
}
