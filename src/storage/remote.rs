//! Remote Chat Store
//!
//! Information Hiding:
//! - REST paths and JSON envelopes hidden behind `ChatStore`
//! - One request per operation, no retries
//! - Any non-2xx status is reported as `StoreError::Status`

use super::{ChatStore, StoreError, StoreResult};
use crate::models::{Chat, Message};
use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response, Url};
use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize)]
struct ChatsEnvelope {
    chats: Vec<Chat>,
}

#[derive(Debug, Deserialize)]
struct ChatEnvelope {
    #[serde(default)]
    chat: Option<Chat>,
}

#[derive(Serialize)]
struct ChatBody<'a> {
    chat: &'a Chat,
}

#[derive(Serialize)]
struct TitleBody<'a> {
    title: &'a str,
}

#[derive(Serialize)]
struct MessageBody<'a> {
    message: &'a Message,
}

pub struct RemoteChatStore {
    client: Client,
    base_url: Url,
}

impl RemoteChatStore {
    pub fn new(base_url: &str) -> StoreResult<Self> {
        Self::with_client(Client::new(), base_url)
    }

    pub fn with_client(client: Client, base_url: &str) -> StoreResult<Self> {
        let base_url =
            Url::parse(base_url).map_err(|_| StoreError::InvalidBaseUrl(base_url.to_string()))?;
        if base_url.cannot_be_a_base() {
            return Err(StoreError::InvalidBaseUrl(base_url.to_string()));
        }
        Ok(Self { client, base_url })
    }

    /// `{base}/api/chats/{segments...}`; an empty trailing segment yields a trailing slash
    fn chats_url(&self, segments: &[&str]) -> StoreResult<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| StoreError::InvalidBaseUrl(self.base_url.to_string()))?
            .pop_if_empty()
            .extend(["api", "chats"])
            .extend(segments);
        Ok(url)
    }

    async fn send(&self, request: RequestBuilder) -> StoreResult<Response> {
        let response = request
            .header("Content-Type", "application/json")
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(StoreError::Status(status.as_u16()));
        }
        Ok(response)
    }
}

#[async_trait]
impl ChatStore for RemoteChatStore {
    fn name(&self) -> &'static str {
        "remote"
    }

    async fn list_chats(&self) -> StoreResult<Vec<Chat>> {
        let url = self.chats_url(&[""])?;
        let response = self.send(self.client.get(url)).await?;
        let envelope: ChatsEnvelope = response
            .json()
            .await
            .map_err(|e| StoreError::Decode(e.to_string()))?;

        tracing::debug!("[RemoteChatStore] Listed {} chats", envelope.chats.len());
        Ok(envelope.chats)
    }

    async fn get_chat(&self, chat_id: &str) -> StoreResult<Option<Chat>> {
        let url = self.chats_url(&[chat_id])?;
        let response = self.send(self.client.get(url)).await?;
        let envelope: ChatEnvelope = response
            .json()
            .await
            .map_err(|e| StoreError::Decode(e.to_string()))?;
        Ok(envelope.chat)
    }

    async fn save_chat(&self, chat: &Chat) -> StoreResult<()> {
        let url = self.chats_url(&[&chat.id])?;
        self.send(self.client.put(url).json(&ChatBody { chat })).await?;
        tracing::debug!("[RemoteChatStore] Saved chat '{}'", chat.id);
        Ok(())
    }

    async fn delete_chat(&self, chat_id: &str) -> StoreResult<()> {
        let url = self.chats_url(&[chat_id])?;
        self.send(self.client.delete(url)).await?;
        tracing::debug!("[RemoteChatStore] Deleted chat '{}'", chat_id);
        Ok(())
    }

    async fn update_title(&self, chat_id: &str, title: &str) -> StoreResult<()> {
        let url = self.chats_url(&[chat_id, "title"])?;
        self.send(self.client.patch(url).json(&TitleBody { title })).await?;
        Ok(())
    }

    async fn add_message(&self, chat_id: &str, message: &Message) -> StoreResult<()> {
        let url = self.chats_url(&[chat_id, "messages"])?;
        self.send(self.client.post(url).json(&MessageBody { message })).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn test_list_chats_decodes_envelope() {
        let mock_server = MockServer::start().await;
        let chat = Chat::new();

        Mock::given(method("GET"))
            .and(path("/api/chats/"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "chats": [chat] })))
            .mount(&mock_server)
            .await;

        let store = RemoteChatStore::new(&mock_server.uri()).unwrap();
        let chats = store.list_chats().await.unwrap();

        assert_eq!(chats, vec![chat]);
    }

    #[tokio::test]
    async fn test_get_chat_null_is_not_found() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/api/chats/abc"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "chat": null })))
            .mount(&mock_server)
            .await;

        let store = RemoteChatStore::new(&mock_server.uri()).unwrap();
        assert!(store.get_chat("abc").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_non_success_status_is_error() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/api/chats/abc"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&mock_server)
            .await;

        let store = RemoteChatStore::new(&mock_server.uri()).unwrap();
        let err = store.get_chat("abc").await.unwrap_err();

        assert!(matches!(err, StoreError::Status(404)));
    }

    #[tokio::test]
    async fn test_malformed_body_is_decode_error() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/api/chats/"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
            .mount(&mock_server)
            .await;

        let store = RemoteChatStore::new(&mock_server.uri()).unwrap();
        let err = store.list_chats().await.unwrap_err();

        assert!(matches!(err, StoreError::Decode(_)));
    }

    #[tokio::test]
    async fn test_mutations_use_expected_verbs_and_bodies() {
        let mock_server = MockServer::start().await;
        let chat = Chat::new();
        let chat_path = format!("/api/chats/{}", chat.id);

        Mock::given(method("PUT"))
            .and(path(chat_path.as_str()))
            .and(body_json(json!({ "chat": chat })))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&mock_server)
            .await;
        Mock::given(method("PATCH"))
            .and(path(format!("{}/title", chat_path)))
            .and(body_json(json!({ "title": "Renamed" })))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&mock_server)
            .await;
        Mock::given(method("POST"))
            .and(path(format!("{}/messages", chat_path)))
            .and(body_json(json!({ "message": { "role": "user", "content": "hi" } })))
            .respond_with(ResponseTemplate::new(201))
            .expect(1)
            .mount(&mock_server)
            .await;
        Mock::given(method("DELETE"))
            .and(path(chat_path.as_str()))
            .respond_with(ResponseTemplate::new(204))
            .expect(1)
            .mount(&mock_server)
            .await;

        let store = RemoteChatStore::new(&mock_server.uri()).unwrap();
        store.save_chat(&chat).await.unwrap();
        store.update_title(&chat.id, "Renamed").await.unwrap();
        store.add_message(&chat.id, &Message::user("hi")).await.unwrap();
        store.delete_chat(&chat.id).await.unwrap();
    }

    #[tokio::test]
    async fn test_unreachable_host_is_transport_error() {
        // Port 9 (discard) is almost never listening locally
        let store = RemoteChatStore::new("http://127.0.0.1:9").unwrap();
        let err = store.list_chats().await.unwrap_err();

        assert!(matches!(err, StoreError::Transport(_)));
    }

    #[test]
    fn test_invalid_base_url() {
        assert!(matches!(
            RemoteChatStore::new("not a url"),
            Err(StoreError::InvalidBaseUrl(_))
        ));
    }

    #[test]
    fn test_urls_respect_base_path() {
        let store = RemoteChatStore::new("http://host:8000/prefix/").unwrap();
        let url = store.chats_url(&["abc", "title"]).unwrap();
        assert_eq!(url.as_str(), "http://host:8000/prefix/api/chats/abc/title");

        let list = store.chats_url(&[""]).unwrap();
        assert_eq!(list.as_str(), "http://host:8000/prefix/api/chats/");
    }
}
