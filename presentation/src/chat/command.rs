//! Slash-command parsing for the chat REPL

/// A parsed REPL command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReplCommand {
    /// Start a new session, optionally titled.
    New(Option<String>),
    /// List open sessions.
    Sessions,
    /// Make another session current, by list position (1-based) or id.
    Use(String),
    Rename(String),
    /// Rebind the current session to another deployment.
    Model(String),
    /// List configured deployments.
    Models,
    /// Start a new session bound to a clip.
    Clip(String),
    Discover,
    Close,
    Help,
    Quit,
}

impl ReplCommand {
    /// Parse a line starting with `/`. `Err` carries a user-facing message.
    pub fn parse(line: &str) -> Result<Self, String> {
        let line = line.trim();
        let (name, rest) = line.split_once(char::is_whitespace).unwrap_or((line, ""));
        let arg = rest.trim();
        let required = |usage: &str| {
            if arg.is_empty() {
                Err(format!("Usage: {}", usage))
            } else {
                Ok(arg.to_string())
            }
        };

        match name {
            "/new" => Ok(Self::New((!arg.is_empty()).then(|| arg.to_string()))),
            "/sessions" | "/ls" => Ok(Self::Sessions),
            "/use" => required("/use <number|id>").map(Self::Use),
            "/rename" => required("/rename <title>").map(Self::Rename),
            "/model" => required("/model <deployment id>").map(Self::Model),
            "/models" => Ok(Self::Models),
            "/clip" => required("/clip <clip id>").map(Self::Clip),
            "/discover" => Ok(Self::Discover),
            "/close" => Ok(Self::Close),
            "/help" | "/h" | "/?" => Ok(Self::Help),
            "/quit" | "/exit" | "/q" => Ok(Self::Quit),
            _ => Err(format!(
                "Unknown command: {}\nType /help for available commands",
                name
            )),
        }
    }

    /// Help text listing every command.
    pub fn help() -> &'static str {
        "Commands:
  /new [title]        - Start a new session
  /sessions           - List open sessions
  /use <n|id>         - Switch to another session
  /rename <title>     - Rename the current session
  /model <id>         - Point the current session at another deployment
  /models             - List configured deployments
  /clip <id>          - Start a new session bound to a clip
  /discover           - Discover and register local models
  /close              - Close the current session
  /help, /h, /?       - Show this help
  /quit, /exit, /q    - Exit chat"
    }
}
