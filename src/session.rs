// src/session.rs
//
// Chat sessions: history, pending input and language for one conversation,
// plus the in-memory store the HTTP layer keeps them in

use chrono::{DateTime, Utc};
use log::{debug, info};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};
use uuid::Uuid;

use crate::assistant::Assistant;
use crate::services::translation::DEFAULT_LANGUAGE;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

#[derive(Debug, Clone, Serialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
    pub sent_at: DateTime<Utc>,
}

impl ChatMessage {
    fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
            sent_at: Utc::now(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ChatSession {
    pub id: Uuid,
    pub history: Vec<ChatMessage>,
    pub input_text: String,
    pub language: String,
    pub created_at: DateTime<Utc>,
}

impl Default for ChatSession {
    fn default() -> Self {
        Self::new()
    }
}

impl ChatSession {
    pub fn new() -> Self {
        Self {
            id: Uuid::new_v4(),
            history: Vec::new(),
            input_text: String::new(),
            language: DEFAULT_LANGUAGE.to_string(),
            created_at: Utc::now(),
        }
    }

    pub fn set_input(&mut self, text: impl Into<String>) {
        self.input_text = text.into();
    }

    /// Send the pending input and record the reply.
    ///
    /// Whitespace-only input is ignored and returns `false`. The input buffer
    /// is cleared only once the assistant's reply is in the history.
    pub async fn send_message(&mut self, assistant: &Assistant) -> bool {
        if self.input_text.trim().is_empty() {
            return false;
        }

        let query = self.input_text.clone();
        self.history.push(ChatMessage::new(Role::User, query.as_str()));

        let reply = assistant.chatbot_response(&query, &self.language).await;
        self.history.push(ChatMessage::new(Role::Assistant, reply));

        self.input_text.clear();
        true
    }

    pub fn clear(&mut self) {
        self.history.clear();
        self.input_text.clear();
    }
}

/// Live sessions by id. Each session has its own lock so a slow reply in one
/// conversation does not hold up the others.
#[derive(Clone, Default)]
pub struct SessionStore {
    sessions: Arc<RwLock<HashMap<Uuid, Arc<Mutex<ChatSession>>>>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn create(&self) -> ChatSession {
        let session = ChatSession::new();
        let snapshot = session.clone();
        self.sessions
            .write()
            .await
            .insert(session.id, Arc::new(Mutex::new(session)));
        info!("Started chat session {}", snapshot.id);
        snapshot
    }

    async fn handle(&self, id: &Uuid) -> Option<Arc<Mutex<ChatSession>>> {
        self.sessions.read().await.get(id).cloned()
    }

    pub async fn get(&self, id: &Uuid) -> Option<ChatSession> {
        let session = self.handle(id).await?;
        let snapshot = session.lock().await.clone();
        Some(snapshot)
    }

    /// `None` for an unknown session; otherwise the session after the exchange
    pub async fn send_message(
        &self,
        id: &Uuid,
        content: &str,
        assistant: &Assistant,
    ) -> Option<ChatSession> {
        let session = self.handle(id).await?;
        let mut session = session.lock().await;

        session.set_input(content);
        if session.send_message(assistant).await {
            debug!("Session {} now has {} messages", id, session.history.len());
        }
        Some(session.clone())
    }

    pub async fn clear(&self, id: &Uuid) -> bool {
        match self.handle(id).await {
            Some(session) => {
                session.lock().await.clear();
                true
            }
            None => false,
        }
    }

    pub async fn remove(&self, id: &Uuid) -> bool {
        let removed = self.sessions.write().await.remove(id).is_some();
        if removed {
            info!("Ended chat session {}", id);
        }
        removed
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.sessions.read().await.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assistant::CHAT_STATUS_FALLBACK;
    use crate::services::gemini::GenerateContentRequest;
    use crate::services::{ApiError, CompletionService, TranslationService};
    use async_trait::async_trait;
    use std::collections::BTreeMap;

    struct EchoCompletion;

    #[async_trait]
    impl CompletionService for EchoCompletion {
        async fn complete(&self, request: &GenerateContentRequest) -> Result<String, ApiError> {
            let prompt = serde_json::to_string(request).unwrap();
            if prompt.contains("overload") {
                Err(ApiError::Status {
                    status: 503,
                    body: String::new(),
                })
            } else {
                Ok("Stay calm and call 112.".to_string())
            }
        }
    }

    struct NoTranslation;

    #[async_trait]
    impl TranslationService for NoTranslation {
        async fn translate_text(&self, text: &str, _: &str) -> Result<String, ApiError> {
            Ok(text.to_string())
        }

        async fn detect_language(&self, _: &str) -> Result<String, ApiError> {
            Ok("en".to_string())
        }

        async fn supported_languages(&self) -> Result<BTreeMap<String, String>, ApiError> {
            Ok(BTreeMap::new())
        }
    }

    fn assistant() -> Assistant {
        Assistant::new(Arc::new(EchoCompletion), Arc::new(NoTranslation))
    }

    #[tokio::test]
    async fn test_send_records_exchange_and_clears_input() {
        let mut session = ChatSession::new();
        session.set_input("Someone fainted");

        assert!(session.send_message(&assistant()).await);
        assert_eq!(session.history.len(), 2);
        assert_eq!(session.history[0].role, Role::User);
        assert_eq!(session.history[0].content, "Someone fainted");
        assert_eq!(session.history[1].role, Role::Assistant);
        assert_eq!(session.history[1].content, "Stay calm and call 112.");
        assert!(session.input_text.is_empty());
    }

    #[tokio::test]
    async fn test_whitespace_input_is_ignored() {
        let mut session = ChatSession::new();
        session.set_input("  \n\t");

        assert!(!session.send_message(&assistant()).await);
        assert!(session.history.is_empty());
        assert_eq!(session.input_text, "  \n\t");
    }

    #[tokio::test]
    async fn test_failed_reply_still_recorded() {
        let mut session = ChatSession::new();
        session.set_input("overload");

        assert!(session.send_message(&assistant()).await);
        assert_eq!(session.history[1].content, CHAT_STATUS_FALLBACK);
    }

    #[tokio::test]
    async fn test_store_lifecycle() {
        let store = SessionStore::new();
        let assistant = assistant();
        let created = store.create().await;
        assert_eq!(created.language, "en");
        assert_eq!(store.len().await, 1);

        let after = store
            .send_message(&created.id, "Burned my hand", &assistant)
            .await
            .unwrap();
        assert_eq!(after.history.len(), 2);
        assert_eq!(store.get(&created.id).await.unwrap().history.len(), 2);

        assert!(store.clear(&created.id).await);
        assert!(store.get(&created.id).await.unwrap().history.is_empty());

        assert!(store.remove(&created.id).await);
        assert!(!store.remove(&created.id).await);
        assert!(store.get(&created.id).await.is_none());
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn test_unknown_session() {
        let store = SessionStore::new();
        let id = Uuid::new_v4();
        assert!(store.send_message(&id, "hello", &assistant()).await.is_none());
        assert!(!store.clear(&id).await);
    }
}
