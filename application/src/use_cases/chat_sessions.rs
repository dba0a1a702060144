//! Chat session manager.
//!
//! Owns every active [`ChatSession`] and mediates message submission:
//! resolve the deployment, build the wire request, call the transport,
//! normalize the reply and apply it to the session.
//!
//! # Supersession
//!
//! Each session has at most one request in flight. Submitting again (or
//! closing the session) cancels the previous request's token. Every request
//! carries a generation number taken from a manager-wide counter; when a
//! request completes, its result is applied only if its generation is still
//! the one recorded for the session. Stale results are dropped without
//! touching session state.

use crate::ports::conversation_logger::{
    ConversationEvent, ConversationLogger, NoConversationLogger,
};
use crate::ports::transport::{ChatTransport, TransportError};
use crate::use_cases::deployment_catalog::DeploymentCatalog;
use atlas_domain::{
    CanonicalChatResponse, ChatMessage, ChatPayload, ChatSession, DomainError, OutboundRequest,
    PayloadMessage, RequestBuilder, ResponseError, SessionStatus, normalize, preview,
};
use serde_json::{Map, Value, json};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Options for [`SessionManager::start_session`].
#[derive(Debug, Clone, Default)]
pub struct StartSessionOptions {
    /// Deployment to bind; the catalog default when absent.
    pub model_id: Option<String>,
    pub clip_id: Option<String>,
    pub title: Option<String>,
    /// Becomes the leading system message.
    pub system_prompt: Option<String>,
}

/// Options for [`SessionManager::send_message`].
#[derive(Debug, Clone, Default)]
pub struct SendMessageOptions {
    /// Extra clip metadata merged into the request metadata.
    pub clip_context: Option<Map<String, Value>>,
}

impl SendMessageOptions {
    pub fn with_clip_context(mut self, context: Map<String, Value>) -> Self {
        self.clip_context = Some(context);
        self
    }
}

/// What happened to a submitted message.
#[derive(Debug, Clone, PartialEq)]
pub enum SendOutcome {
    /// The assistant reply was appended and the session is idle again.
    Replied(ChatMessage),
    /// The request failed; the session is in the error state with this text.
    Failed(String),
    /// The request was aborted (session closed). No state was changed.
    Cancelled,
    /// A newer submission replaced this one. Its result was discarded.
    Superseded,
}

#[derive(Error, Debug)]
enum ExchangeError {
    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error(transparent)]
    Response(#[from] ResponseError),
}

impl ExchangeError {
    fn is_cancelled(&self) -> bool {
        matches!(self, ExchangeError::Transport(e) if e.is_cancelled())
    }
}

struct InFlight {
    generation: u64,
    token: CancellationToken,
}

#[derive(Default)]
struct SessionTable {
    /// Most recently started first.
    sessions: Vec<ChatSession>,
    in_flight: HashMap<String, InFlight>,
    next_generation: u64,
}

impl SessionTable {
    fn find_mut(&mut self, session_id: &str) -> Option<&mut ChatSession> {
        self.sessions.iter_mut().find(|s| s.id() == session_id)
    }

    fn is_current(&self, session_id: &str, generation: u64) -> bool {
        self.in_flight
            .get(session_id)
            .is_some_and(|f| f.generation == generation)
    }
}

/// Manages concurrent, independently-stateful chat sessions.
///
/// All state lives behind one mutex that is never held across an await; the
/// only suspension point is the transport call inside
/// [`send_message`](Self::send_message).
pub struct SessionManager {
    catalog: Arc<DeploymentCatalog>,
    transport: Arc<dyn ChatTransport>,
    conversation_logger: Arc<dyn ConversationLogger>,
    state: Mutex<SessionTable>,
}

impl SessionManager {
    pub fn new(catalog: Arc<DeploymentCatalog>, transport: Arc<dyn ChatTransport>) -> Self {
        Self {
            catalog,
            transport,
            conversation_logger: Arc::new(NoConversationLogger),
            state: Mutex::new(SessionTable::default()),
        }
    }

    /// Create with a conversation logger.
    pub fn with_conversation_logger(mut self, logger: Arc<dyn ConversationLogger>) -> Self {
        self.conversation_logger = logger;
        self
    }

    pub fn catalog(&self) -> &Arc<DeploymentCatalog> {
        &self.catalog
    }

    /// Start a new idle session and put it at the front of the active set.
    pub fn start_session(&self, options: StartSessionOptions) -> Result<ChatSession, DomainError> {
        let deployment = self.catalog.resolve(options.model_id.as_deref())?;

        let session = ChatSession::new(deployment.id.clone(), options.title)
            .with_clip(options.clip_id)
            .with_system_prompt(options.system_prompt);

        info!(
            "Started session {} on '{}' ({})",
            session.id(),
            deployment.id,
            session.title()
        );
        self.conversation_logger.log(ConversationEvent::new(
            "session_started",
            session.id(),
            json!({
                "model_id": session.model_id(),
                "title": session.title(),
                "clip_id": session.clip_id(),
            }),
        ));

        self.lock().sessions.insert(0, session.clone());
        Ok(session)
    }

    /// Cancel any in-flight request and drop the session. Unknown ids are ignored.
    pub fn close_session(&self, session_id: &str) {
        let mut state = self.lock();
        if let Some(in_flight) = state.in_flight.remove(session_id) {
            debug!("Cancelling in-flight request for session {}", session_id);
            in_flight.token.cancel();
        }

        let before = state.sessions.len();
        state.sessions.retain(|s| s.id() != session_id);
        if state.sessions.len() == before {
            return;
        }
        drop(state);

        info!("Closed session {}", session_id);
        self.conversation_logger.log(ConversationEvent::new(
            "session_closed",
            session_id,
            Value::Null,
        ));
    }

    /// Change a session's title.
    pub fn rename_session(
        &self,
        session_id: &str,
        title: impl Into<String>,
    ) -> Result<ChatSession, DomainError> {
        let title = title.into();
        let mut state = self.lock();
        let session = state
            .find_mut(session_id)
            .ok_or_else(|| DomainError::SessionNotFound(session_id.to_string()))?;
        session.rename(title.clone());
        let snapshot = session.clone();
        drop(state);

        self.conversation_logger.log(ConversationEvent::new(
            "session_renamed",
            session_id,
            json!({ "title": title }),
        ));
        Ok(snapshot)
    }

    /// Rebind a session to another deployment and reset it to idle.
    ///
    /// An in-flight request is left running; if it is still current when it
    /// completes its result is applied as usual.
    pub fn switch_model(
        &self,
        session_id: &str,
        model_id: &str,
    ) -> Result<ChatSession, DomainError> {
        let deployment = self.catalog.resolve(Some(model_id))?;

        let mut state = self.lock();
        let session = state
            .find_mut(session_id)
            .ok_or_else(|| DomainError::SessionNotFound(session_id.to_string()))?;
        let previous = session.model_id().to_string();
        session.switch_model(deployment.id.clone());
        let snapshot = session.clone();
        drop(state);

        info!(
            "Session {} switched from '{}' to '{}'",
            session_id, previous, deployment.id
        );
        self.conversation_logger.log(ConversationEvent::new(
            "model_switched",
            session_id,
            json!({ "from": previous, "to": deployment.id }),
        ));
        Ok(snapshot)
    }

    /// Submit a user message and wait for the reply.
    ///
    /// Returns `Err` only when the session is unknown or no deployment can be
    /// resolved; both are checked before the session is touched. Every other
    /// outcome, including failures, is reported through [`SendOutcome`].
    pub async fn send_message(
        &self,
        session_id: &str,
        content: impl Into<String>,
        options: SendMessageOptions,
    ) -> Result<SendOutcome, DomainError> {
        let content = content.into();

        let (deployment, payload, generation, token, superseded) = {
            let mut state = self.lock();
            let session = state
                .find_mut(session_id)
                .ok_or_else(|| DomainError::SessionNotFound(session_id.to_string()))?;
            let deployment = self.catalog.resolve(Some(session.model_id()))?;

            session.append(ChatMessage::user(content.clone()));
            session.set_status(SessionStatus::Running);
            let payload = build_payload(session, options.clip_context);

            let superseded = state.in_flight.remove(session_id).map(|previous| {
                debug!(
                    "Superseding request #{} for session {}",
                    previous.generation, session_id
                );
                previous.token.cancel();
                previous.generation
            });

            state.next_generation += 1;
            let generation = state.next_generation;
            let token = CancellationToken::new();
            state.in_flight.insert(
                session_id.to_string(),
                InFlight {
                    generation,
                    token: token.clone(),
                },
            );
            (deployment, payload, generation, token, superseded)
        };

        if let Some(previous) = superseded {
            self.conversation_logger.log(ConversationEvent::new(
                "request_superseded",
                session_id,
                json!({ "generation": previous }),
            ));
        }
        self.conversation_logger.log(ConversationEvent::new(
            "user_message",
            session_id,
            json!({ "content": content, "model_id": deployment.id }),
        ));
        info!(
            "Session {} -> '{}': {}",
            session_id,
            deployment.id,
            preview(&content, 80)
        );

        let request = RequestBuilder::build(&deployment, &payload);
        debug!("{} {}", request.method, request.url);

        let result = self.exchange(&request, token).await;

        let mut state = self.lock();
        if !state.is_current(session_id, generation) {
            let exists = state.sessions.iter().any(|s| s.id() == session_id);
            drop(state);
            return Ok(if exists {
                debug!("Discarding superseded result #{} for {}", generation, session_id);
                SendOutcome::Superseded
            } else {
                debug!("Discarding result #{} for closed session {}", generation, session_id);
                SendOutcome::Cancelled
            });
        }
        state.in_flight.remove(session_id);

        let Some(session) = state.find_mut(session_id) else {
            return Ok(SendOutcome::Cancelled);
        };

        match result {
            Ok(response) => {
                let reply = ChatMessage::assistant(response.content);
                session.append(reply.clone());
                session.set_status(SessionStatus::Idle);
                drop(state);

                self.conversation_logger.log(ConversationEvent::new(
                    "assistant_message",
                    session_id,
                    json!({
                        "content": reply.content,
                        "shape": response.shape,
                        "usage": response.usage,
                        "latency_ms": response.latency_ms,
                    }),
                ));
                Ok(SendOutcome::Replied(reply))
            }
            Err(e) if e.is_cancelled() => {
                session.set_status(SessionStatus::Idle);
                Ok(SendOutcome::Cancelled)
            }
            Err(e) => {
                let message = e.to_string();
                session.set_status(SessionStatus::Error {
                    message: message.clone(),
                });
                drop(state);

                warn!("Session {} request failed: {}", session_id, message);
                self.conversation_logger.log(ConversationEvent::new(
                    "session_error",
                    session_id,
                    json!({ "error": message }),
                ));
                Ok(SendOutcome::Failed(message))
            }
        }
    }

    /// Snapshot of all active sessions, most recently started first.
    pub fn sessions(&self) -> Vec<ChatSession> {
        self.lock().sessions.clone()
    }

    pub fn session(&self, session_id: &str) -> Option<ChatSession> {
        self.lock()
            .sessions
            .iter()
            .find(|s| s.id() == session_id)
            .cloned()
    }

    async fn exchange(
        &self,
        request: &OutboundRequest,
        token: CancellationToken,
    ) -> Result<CanonicalChatResponse, ExchangeError> {
        let body = self.transport.perform_request(request, token).await?;
        Ok(normalize(&body)?)
    }

    fn lock(&self) -> MutexGuard<'_, SessionTable> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

fn build_payload(session: &ChatSession, clip_context: Option<Map<String, Value>>) -> ChatPayload {
    let messages = session.messages().iter().map(PayloadMessage::from).collect();

    // Clip context keys, including its own `clipId`, override the session's clip
    let mut metadata = Map::new();
    if let Some(clip_id) = session.clip_id() {
        metadata.insert("clipId".to_string(), Value::String(clip_id.to_string()));
    }
    metadata.extend(clip_context.unwrap_or_default());

    ChatPayload::new(session.id(), messages).with_metadata(metadata)
}
