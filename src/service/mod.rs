//! Chat Persistence Service
//!
//! The seven history operations the front end relies on, answered by the
//! remote store when it is reachable and by the local store otherwise.

mod chat_service;

pub use chat_service::ChatService;
