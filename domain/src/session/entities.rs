//! Session domain entities

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Title given to sessions started without one.
pub const DEFAULT_SESSION_TITLE: &str = "Untitled Chat";

/// Role of a message in a conversation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::System => "system",
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One turn of a conversation (Entity).
///
/// Messages are immutable once appended to a session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatMessage {
    pub id: String,
    pub role: Role,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

impl ChatMessage {
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            role,
            content: content.into(),
            created_at: Utc::now(),
        }
    }

    pub fn system(content: impl Into<String>) -> Self {
        Self::new(Role::System, content)
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(Role::Assistant, content)
    }
}

/// State of a session.
///
/// ```text
/// Idle ──submit──▶ Running ──success──▶ Idle
///                  Running ──failure──▶ Error
/// Error ──submit──▶ Running
/// any  ──switch model──▶ Idle
/// ```
///
/// The error text lives inside the `Error` variant, so a message can only be
/// present while the session is in the error state.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum SessionStatus {
    #[default]
    Idle,
    Running,
    Error {
        message: String,
    },
}

impl SessionStatus {
    pub fn is_idle(&self) -> bool {
        matches!(self, SessionStatus::Idle)
    }

    pub fn is_running(&self) -> bool {
        matches!(self, SessionStatus::Running)
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            SessionStatus::Error { message } => Some(message),
            _ => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            SessionStatus::Idle => "idle",
            SessionStatus::Running => "running",
            SessionStatus::Error { .. } => "error",
        }
    }
}

/// One ongoing conversation (Entity).
///
/// Fields are read-only from outside; every mutation goes through methods that
/// keep `updated_at` current and never remove or reorder messages.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatSession {
    id: String,
    clip_id: Option<String>,
    model_id: String,
    title: String,
    messages: Vec<ChatMessage>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    #[serde(flatten)]
    status: SessionStatus,
}

impl ChatSession {
    pub fn new(model_id: impl Into<String>, title: Option<String>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4().to_string(),
            clip_id: None,
            model_id: model_id.into(),
            title: title.unwrap_or_else(|| DEFAULT_SESSION_TITLE.to_string()),
            messages: Vec::new(),
            created_at: now,
            updated_at: now,
            status: SessionStatus::Idle,
        }
    }

    pub fn with_clip(mut self, clip_id: Option<String>) -> Self {
        self.clip_id = clip_id;
        self
    }

    pub fn with_system_prompt(mut self, system_prompt: Option<String>) -> Self {
        if let Some(prompt) = system_prompt {
            self.messages.push(ChatMessage::system(prompt));
        }
        self
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn clip_id(&self) -> Option<&str> {
        self.clip_id.as_deref()
    }

    pub fn model_id(&self) -> &str {
        &self.model_id
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    pub fn status(&self) -> &SessionStatus {
        &self.status
    }

    pub fn error(&self) -> Option<&str> {
        self.status.error()
    }

    pub fn last_message(&self) -> Option<&ChatMessage> {
        self.messages.last()
    }

    pub fn rename(&mut self, title: impl Into<String>) {
        self.title = title.into();
    }

    pub fn append(&mut self, message: ChatMessage) {
        self.updated_at = message.created_at;
        self.messages.push(message);
    }

    pub fn set_status(&mut self, status: SessionStatus) {
        self.status = status;
        self.updated_at = Utc::now();
    }

    /// Repoint the session at another deployment. Always lands in `Idle`.
    pub fn switch_model(&mut self, model_id: impl Into<String>) {
        self.model_id = model_id.into();
        self.set_status(SessionStatus::Idle);
    }
}
