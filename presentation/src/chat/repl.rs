//! REPL (Read-Eval-Print Loop) for interactive chat

use super::command::ReplCommand;
use crate::{ConsoleFormatter, ProgressReporter};
use atlas_application::{
    DiscoverModelsUseCase, SendMessageOptions, SendOutcome, SessionManager, StartSessionOptions,
};
use atlas_domain::{ChatSession, Role};
use colored::Colorize;
use reedline::{DefaultPrompt, DefaultPromptSegment, FileBackedHistory, Reedline, Signal};
use std::path::PathBuf;
use std::sync::Arc;

const HISTORY_CAPACITY: usize = 1000;

/// Whether the loop keeps going after a line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Exit,
}

/// Interactive chat REPL
///
/// Holds a "current" session that plain lines are sent to; slash commands
/// manage the session set.
pub struct ChatRepl {
    sessions: Arc<SessionManager>,
    discovery: Arc<DiscoverModelsUseCase>,
    discovery_base: String,
    defaults: StartSessionOptions,
    progress: ProgressReporter,
    current: Option<String>,
}

impl ChatRepl {
    /// Create a new ChatRepl
    pub fn new(
        sessions: Arc<SessionManager>,
        discovery: Arc<DiscoverModelsUseCase>,
        discovery_base: impl Into<String>,
    ) -> Self {
        Self {
            sessions,
            discovery,
            discovery_base: discovery_base.into(),
            defaults: StartSessionOptions::default(),
            progress: ProgressReporter::default(),
            current: None,
        }
    }

    /// Options used for the first session and inherited by `/new` and `/clip`.
    pub fn with_session_defaults(mut self, defaults: StartSessionOptions) -> Self {
        self.defaults = defaults;
        self
    }

    /// Set whether to show progress
    pub fn with_progress(mut self, show: bool) -> Self {
        self.progress = ProgressReporter::new(show);
        self
    }

    /// Id of the session plain messages go to.
    pub fn current_session(&self) -> Option<&str> {
        self.current.as_deref()
    }

    /// Run the interactive REPL
    pub async fn run(&mut self) -> std::io::Result<()> {
        let mut editor = Reedline::create();
        if let Some(path) = Self::history_path() {
            if let Some(parent) = path.parent() {
                let _ = std::fs::create_dir_all(parent);
            }
            match FileBackedHistory::with_file(HISTORY_CAPACITY, path) {
                Ok(history) => editor = editor.with_history(Box::new(history)),
                Err(e) => tracing::debug!("Chat history disabled: {}", e),
            }
        }

        self.print_welcome();
        self.open_session(self.defaults.clone());

        loop {
            let prompt = DefaultPrompt::new(
                DefaultPromptSegment::Basic(self.prompt_label()),
                DefaultPromptSegment::Empty,
            );

            match editor.read_line(&prompt)? {
                Signal::Success(line) => {
                    if self.handle_line(&line).await == Flow::Exit {
                        break;
                    }
                }
                Signal::CtrlC => {
                    println!("^C");
                }
                Signal::CtrlD => {
                    println!("Bye!");
                    break;
                }
            }
        }

        Ok(())
    }

    /// Process one input line.
    pub async fn handle_line(&mut self, line: &str) -> Flow {
        let line = line.trim();
        if line.is_empty() {
            return Flow::Continue;
        }

        if line.starts_with('/') {
            return match ReplCommand::parse(line) {
                Ok(command) => self.execute(command).await,
                Err(message) => {
                    println!("{}", message);
                    Flow::Continue
                }
            };
        }

        self.send(line).await;
        Flow::Continue
    }

    /// Execute a parsed command.
    pub async fn execute(&mut self, command: ReplCommand) -> Flow {
        match command {
            ReplCommand::New(title) => {
                let options = StartSessionOptions {
                    model_id: self.current_model().or_else(|| self.defaults.model_id.clone()),
                    title,
                    ..self.defaults.clone()
                };
                self.open_session(options);
            }
            ReplCommand::Clip(clip_id) => {
                let options = StartSessionOptions {
                    model_id: self.current_model().or_else(|| self.defaults.model_id.clone()),
                    clip_id: Some(clip_id.clone()),
                    title: Some(format!("Clip {}", clip_id)),
                    ..self.defaults.clone()
                };
                self.open_session(options);
            }
            ReplCommand::Sessions => {
                println!(
                    "{}",
                    ConsoleFormatter::format_sessions(
                        &self.sessions.sessions(),
                        self.current.as_deref()
                    )
                );
            }
            ReplCommand::Use(selector) => match self.find_session(&selector) {
                Some(session) => {
                    println!("{}", ConsoleFormatter::format_session_banner(&session));
                    Self::print_recent(&session);
                    self.current = Some(session.id().to_string());
                }
                None => println!("No session matches '{}'", selector),
            },
            ReplCommand::Rename(title) => {
                let Some(id) = self.current.clone() else {
                    println!("No current session");
                    return Flow::Continue;
                };
                match self.sessions.rename_session(&id, title) {
                    Ok(session) => println!("Renamed to '{}'", session.title()),
                    Err(e) => println!("{}", ConsoleFormatter::format_error(&e.to_string())),
                }
            }
            ReplCommand::Model(model_id) => self.switch_model(&model_id),
            ReplCommand::Models => {
                println!(
                    "{}",
                    ConsoleFormatter::format_deployments(&self.sessions.catalog().list())
                );
            }
            ReplCommand::Discover => {
                let added = self
                    .discovery
                    .register(&self.discovery_base, self.sessions.catalog())
                    .await;
                println!("{}", ConsoleFormatter::format_discovered(&added));
            }
            ReplCommand::Close => {
                let Some(id) = self.current.take() else {
                    println!("No current session");
                    return Flow::Continue;
                };
                self.sessions.close_session(&id);
                self.current = self
                    .sessions
                    .sessions()
                    .first()
                    .map(|s| s.id().to_string());
                println!("Session closed");
            }
            ReplCommand::Help => {
                println!();
                println!("{}", ReplCommand::help());
                println!();
            }
            ReplCommand::Quit => {
                println!("Bye!");
                return Flow::Exit;
            }
        }
        Flow::Continue
    }

    async fn send(&mut self, content: &str) {
        if self.current.is_none() {
            self.open_session(self.defaults.clone());
        }
        let Some(id) = self.current.clone() else {
            return;
        };
        let model_id = self.current_model().unwrap_or_default();

        println!();
        let spinner = self.progress.start(&model_id);
        let result = self
            .sessions
            .send_message(&id, content, SendMessageOptions::default())
            .await;

        match result {
            Ok(SendOutcome::Replied(message)) => {
                spinner.succeed();
                println!("{}", ConsoleFormatter::format_reply(&message, &model_id));
            }
            Ok(SendOutcome::Failed(error)) => {
                spinner.fail("request failed");
                println!("{}", ConsoleFormatter::format_error(&error));
                println!("{}", "Resend your message to retry.".dimmed());
            }
            Ok(SendOutcome::Cancelled) | Ok(SendOutcome::Superseded) => {
                spinner.succeed();
                println!("{}", "(request discarded)".dimmed());
            }
            Err(e) => {
                spinner.fail("not sent");
                println!("{}", ConsoleFormatter::format_error(&e.to_string()));
            }
        }
    }

    fn open_session(&mut self, options: StartSessionOptions) {
        match self.sessions.start_session(options) {
            Ok(session) => {
                println!("{}", ConsoleFormatter::format_session_banner(&session));
                self.current = Some(session.id().to_string());
            }
            Err(e) => {
                println!("{}", ConsoleFormatter::format_error(&e.to_string()));
                println!("{}", "Use /discover or add [[deployments]] to the config.".dimmed());
            }
        }
    }

    fn switch_model(&mut self, model_id: &str) {
        let Some(id) = self.current.clone() else {
            println!("No current session");
            return;
        };
        if self.sessions.catalog().get(model_id).is_none() {
            println!("Unknown deployment '{}'. Use /models to list them.", model_id);
            return;
        }
        match self.sessions.switch_model(&id, model_id) {
            Ok(session) => println!("Now talking to {}", session.model_id().bold()),
            Err(e) => println!("{}", ConsoleFormatter::format_error(&e.to_string())),
        }
    }

    /// Resolve `/use` selectors: 1-based list position, exact id, or id prefix.
    fn find_session(&self, selector: &str) -> Option<ChatSession> {
        let sessions = self.sessions.sessions();
        if let Ok(position) = selector.parse::<usize>() {
            return position
                .checked_sub(1)
                .and_then(|index| sessions.get(index))
                .cloned();
        }
        sessions
            .iter()
            .find(|s| s.id() == selector)
            .or_else(|| sessions.iter().find(|s| s.id().starts_with(selector)))
            .cloned()
    }

    fn current_model(&self) -> Option<String> {
        let id = self.current.as_deref()?;
        self.sessions
            .session(id)
            .map(|session| session.model_id().to_string())
    }

    fn prompt_label(&self) -> String {
        self.current
            .as_deref()
            .and_then(|id| self.sessions.session(id))
            .map(|session| session.title().to_string())
            .unwrap_or_else(|| "atlas".to_string())
    }

    fn print_recent(session: &ChatSession) {
        let recent = session
            .messages()
            .iter()
            .filter(|m| m.role != Role::System)
            .rev()
            .take(2)
            .collect::<Vec<_>>();
        for message in recent.into_iter().rev() {
            println!(
                "{}",
                ConsoleFormatter::indent(&format!("{}: {}", message.role, message.content), "  ")
            );
        }
    }

    fn print_welcome(&self) {
        println!();
        println!("╭─────────────────────────────────────────────╮");
        println!("│          Atlas Console - Chat Mode          │");
        println!("╰─────────────────────────────────────────────╯");
        println!();
        println!("{}", ReplCommand::help());
        println!();
    }

    fn history_path() -> Option<PathBuf> {
        dirs::data_dir().map(|p| p.join("atlas-console").join("history.txt"))
    }
}
