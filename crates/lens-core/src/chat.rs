//! Session-scoped chat memory
//!
//! Sessions live for the whole process and are never evicted. Each session
//! has its own lock, held for the full turn (append, generate, append), so
//! concurrent requests for one session are serialized while different
//! sessions never contend.

use crate::collaborators::Generator;
use crate::config::LensConfig;
use crate::error::CollaboratorError;
use crate::prompts;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;

/// Reply when the generator answers with nothing
pub const REPHRASE_FALLBACK: &str =
    "I'm having trouble understanding that. Could you rephrase your question?";
/// Reply when the generator fails
pub const ERROR_FALLBACK: &str = "Oops! Something went wrong on my end. Let's try that again!";

/// Speaker of a turn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// The person asking
    User,
    /// The generated reply
    Assistant,
}

impl Role {
    /// Lowercase name used in prompts
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One stored message
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Turn {
    /// Speaker
    pub role: Role,
    /// Message text
    pub text: String,
}

/// Ordered turn history of one session
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatSession {
    /// Session id
    pub id: String,
    /// Turns, oldest first; append-only
    pub turns: Vec<Turn>,
    /// Creation time
    pub created_at: DateTime<Utc>,
}

impl ChatSession {
    fn new(id: &str) -> Self {
        Self {
            id: id.to_string(),
            turns: Vec::new(),
            created_at: Utc::now(),
        }
    }

    fn push(&mut self, role: Role, text: impl Into<String>) {
        self.turns.push(Turn {
            role,
            text: text.into(),
        });
    }

    /// Most recent `k` turns, oldest first
    #[must_use]
    pub fn window(&self, k: usize) -> &[Turn] {
        &self.turns[self.turns.len().saturating_sub(k)..]
    }
}

/// Process-wide session store
pub struct ChatSessionStore {
    sessions: DashMap<String, Arc<Mutex<ChatSession>>>,
    generator: Arc<dyn Generator>,
    window: usize,
    timeout: Option<Duration>,
}

impl fmt::Debug for ChatSessionStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChatSessionStore")
            .field("sessions", &self.sessions.len())
            .field("window", &self.window)
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

impl ChatSessionStore {
    /// Create store
    #[must_use]
    pub fn new(generator: Arc<dyn Generator>, config: &LensConfig) -> Self {
        Self {
            sessions: DashMap::new(),
            generator,
            window: config.chat_history_window,
            timeout: config.chat_timeout(),
        }
    }

    /// Record the message, answer it and record the answer
    ///
    /// The prompt carries the repository context plus the last K stored
    /// turns, the new user turn included. On failure a fixed apology is
    /// returned and no assistant turn is stored.
    pub async fn append_and_respond(
        &self,
        session_id: &str,
        message: &str,
        summary: &str,
        content: &str,
    ) -> String {
        let session = self.session_handle(session_id);
        let mut session = session.lock().await;

        session.push(Role::User, message);
        let prompt = prompts::chat(
            summary,
            content,
            session
                .window(self.window)
                .iter()
                .map(|t| (t.role.as_str(), t.text.as_str())),
            message,
        );
        tracing::debug!(session = session_id, prompt_chars = prompt.len(), "chat prompt built");

        match self.generate(&prompt).await {
            Ok(reply) => {
                let reply = reply.trim().to_string();
                if reply.is_empty() {
                    tracing::warn!(session = session_id, "empty chat reply");
                    return REPHRASE_FALLBACK.to_string();
                }
                session.push(Role::Assistant, reply.clone());
                reply
            }
            Err(err) => {
                tracing::warn!(session = session_id, error = %err, "chat generation failed");
                ERROR_FALLBACK.to_string()
            }
        }
    }

    /// Snapshot of a session
    pub async fn session(&self, session_id: &str) -> Option<ChatSession> {
        let handle = self.sessions.get(session_id).map(|s| Arc::clone(s.value()))?;
        let snapshot = handle.lock().await.clone();
        Some(snapshot)
    }

    /// Whether a session exists
    #[inline]
    #[must_use]
    pub fn contains(&self, session_id: &str) -> bool {
        self.sessions.contains_key(session_id)
    }

    /// Number of sessions
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    /// True when no session exists
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    // The map guard is released before the session lock is awaited
    fn session_handle(&self, session_id: &str) -> Arc<Mutex<ChatSession>> {
        if let Some(existing) = self.sessions.get(session_id) {
            return Arc::clone(existing.value());
        }
        Arc::clone(
            self.sessions
                .entry(session_id.to_string())
                .or_insert_with(|| Arc::new(Mutex::new(ChatSession::new(session_id))))
                .value(),
        )
    }

    async fn generate(&self, prompt: &str) -> Result<String, CollaboratorError> {
        match self.timeout {
            Some(limit) => tokio::time::timeout(limit, self.generator.generate(prompt))
                .await
                .unwrap_or(Err(CollaboratorError::Timeout(limit))),
            None => self.generator.generate(prompt).await,
        }
    }
}

/// Chat request
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatRequest {
    /// User message
    pub message: String,
    /// Repository summary context
    #[serde(default)]
    pub summary: String,
    /// Repository content context
    #[serde(default)]
    pub content: String,
    /// Existing session, if any
    #[serde(default)]
    pub session_id: Option<String>,
}

/// Chat response
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatResponse {
    /// Reply text
    pub response: String,
    /// Body format; replies may contain markdown
    pub format: String,
}

impl ChatResponse {
    /// Markdown reply
    #[must_use]
    pub fn markdown(response: impl Into<String>) -> Self {
        Self {
            response: response.into(),
            format: "markdown".to_string(),
        }
    }
}

/// Request-level chat entry point
#[derive(Debug, Clone)]
pub struct ChatService {
    store: Arc<ChatSessionStore>,
}

impl ChatService {
    /// Create service over a store
    #[must_use]
    pub fn new(store: Arc<ChatSessionStore>) -> Self {
        Self { store }
    }

    /// Underlying store
    #[must_use]
    pub fn store(&self) -> &Arc<ChatSessionStore> {
        &self.store
    }

    /// Answer a request, assigning a fresh session id when none is given
    ///
    /// Returns the session id used together with the response.
    pub async fn handle(&self, request: ChatRequest) -> (String, ChatResponse) {
        let session_id = request
            .session_id
            .filter(|id| !id.is_empty())
            .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());
        let reply = self
            .store
            .append_and_respond(&session_id, &request.message, &request.summary, &request.content)
            .await;
        (session_id, ChatResponse::markdown(reply))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collaborators::MockGenerator;

    fn store(generator: MockGenerator) -> ChatSessionStore {
        ChatSessionStore::new(Arc::new(generator), &LensConfig::new())
    }

    #[tokio::test]
    async fn first_message_creates_session() {
        let mut generator = MockGenerator::new();
        generator.expect_generate().returning(|_| Ok(" hi there ".into()));
        let store = store(generator);

        assert!(!store.contains("s1"));
        let reply = store.append_and_respond("s1", "hello", "sum", "body").await;
        assert_eq!(reply, "hi there");
        assert_eq!(store.len(), 1);

        let session = store.session("s1").await.unwrap();
        assert_eq!(
            session.turns,
            vec![
                Turn { role: Role::User, text: "hello".into() },
                Turn { role: Role::Assistant, text: "hi there".into() },
            ]
        );
    }

    #[tokio::test]
    async fn failure_keeps_only_user_turn() {
        let mut generator = MockGenerator::new();
        generator
            .expect_generate()
            .returning(|_| Err(CollaboratorError::network("down")));
        let store = store(generator);

        let reply = store.append_and_respond("s1", "hello", "", "").await;
        assert_eq!(reply, ERROR_FALLBACK);
        let session = store.session("s1").await.unwrap();
        assert_eq!(session.turns.len(), 1);
        assert_eq!(session.turns[0].role, Role::User);
    }

    #[tokio::test]
    async fn empty_reply_asks_to_rephrase() {
        let mut generator = MockGenerator::new();
        generator.expect_generate().returning(|_| Ok("\n".into()));
        let store = store(generator);

        assert_eq!(store.append_and_respond("s", "?", "", "").await, REPHRASE_FALLBACK);
        assert_eq!(store.session("s").await.unwrap().turns.len(), 1);
    }

    #[tokio::test]
    async fn prompt_includes_context() {
        let mut generator = MockGenerator::new();
        generator
            .expect_generate()
            .withf(|p| p.contains("Summary: a parser") && p.contains("user: explain lexing"))
            .times(1)
            .returning(|_| Ok("sure".into()));
        store(generator)
            .append_and_respond("s", "explain lexing", "a parser", "fn lex()")
            .await;
    }

    #[tokio::test(start_paused = true)]
    async fn slow_generation_times_out() {
        struct Stalled;

        #[async_trait::async_trait]
        impl Generator for Stalled {
            async fn generate(&self, _prompt: &str) -> Result<String, CollaboratorError> {
                tokio::time::sleep(Duration::from_secs(600)).await;
                Ok("late".into())
            }
        }

        let store = ChatSessionStore::new(
            Arc::new(Stalled),
            &LensConfig::new().with_chat_timeout_secs(1),
        );
        assert_eq!(store.append_and_respond("s", "hi", "", "").await, ERROR_FALLBACK);
    }

    #[test]
    fn window_takes_most_recent() {
        let mut session = ChatSession::new("s");
        for i in 0..7 {
            session.push(Role::User, format!("m{i}"));
        }
        let texts: Vec<_> = session.window(5).iter().map(|t| t.text.as_str()).collect();
        assert_eq!(texts, vec!["m2", "m3", "m4", "m5", "m6"]);
        assert_eq!(session.window(50).len(), 7);
    }

    #[tokio::test]
    async fn service_assigns_session_id() {
        let mut generator = MockGenerator::new();
        generator.expect_generate().returning(|_| Ok("ok".into()));
        let service = ChatService::new(Arc::new(store(generator)));

        let (id, response) = service
            .handle(ChatRequest {
                message: "hello".into(),
                ..ChatRequest::default()
            })
            .await;
        assert!(uuid::Uuid::parse_str(&id).is_ok());
        assert_eq!(response, ChatResponse::markdown("ok"));

        let (same, _) = service
            .handle(ChatRequest {
                message: "again".into(),
                session_id: Some(id.clone()),
                ..ChatRequest::default()
            })
            .await;
        assert_eq!(same, id);
        assert_eq!(service.store().session(&id).await.unwrap().turns.len(), 4);
    }
}
