//! CLI command definitions

use clap::Parser;
use std::path::PathBuf;

/// CLI arguments for atlas-console
#[derive(Parser, Debug)]
#[command(name = "atlas-console")]
#[command(author, version, about = "Chat with Atlas model deployments")]
#[command(long_about = r#"
Atlas Console talks to the model deployments configured for the Atlas media
pipeline. Each conversation is a session bound to one deployment; a session
can carry a clip id that is sent along as request metadata.

Configuration files are loaded from (in priority order):
1. --config <path>     Explicit config file
2. ./atlas.toml        Project-level config
3. ~/.config/atlas-console/config.toml   Global config

Example:
  atlas-console "Summarise the attached clip" --clip clip-42
  atlas-console -m lm-studio-local --system "Answer in one sentence." "What is a keyframe?"
  atlas-console --chat
  atlas-console --discover
"#)]
pub struct Cli {
    /// Message to send (not required in chat mode)
    pub message: Option<String>,

    /// Start interactive chat mode
    #[arg(short, long)]
    pub chat: bool,

    /// Deployment id to talk to (defaults to the default deployment)
    #[arg(short, long, value_name = "ID")]
    pub model: Option<String>,

    /// Clip id to bind the session to
    #[arg(long, value_name = "CLIP_ID")]
    pub clip: Option<String>,

    /// System prompt placed at the start of the session
    #[arg(long, value_name = "PROMPT")]
    pub system: Option<String>,

    /// Session title
    #[arg(long, value_name = "TITLE")]
    pub title: Option<String>,

    /// Verbosity level (-v = info, -vv = debug, -vvv = trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Suppress progress indicators
    #[arg(short, long)]
    pub quiet: bool,

    /// Path to configuration file
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Disable loading of configuration files and saved deployments
    #[arg(long)]
    pub no_config: bool,

    /// Show configuration file locations and the effective configuration, then exit
    #[arg(long)]
    pub show_config: bool,

    /// List configured deployments and exit
    #[arg(long)]
    pub list_models: bool,

    /// Discover models on the configured server, register new ones and exit
    #[arg(long)]
    pub discover: bool,

    /// Write diagnostic logs to this file instead of stderr
    #[arg(long, value_name = "PATH")]
    pub log_file: Option<PathBuf>,
}

impl Cli {
    /// Tracing filter directive for the `-v` count.
    pub fn log_level(&self) -> &'static str {
        match self.verbose {
            0 => "warn",
            1 => "info",
            2 => "debug",
            _ => "trace",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_one_shot_arguments() {
        let cli = Cli::parse_from([
            "atlas-console",
            "-m",
            "vision",
            "--clip",
            "clip-42",
            "-vv",
            "Describe it",
        ]);
        assert_eq!(cli.message.as_deref(), Some("Describe it"));
        assert_eq!(cli.model.as_deref(), Some("vision"));
        assert_eq!(cli.clip.as_deref(), Some("clip-42"));
        assert_eq!(cli.log_level(), "debug");
        assert!(!cli.chat);
    }

    #[test]
    fn test_chat_and_flags() {
        let cli = Cli::parse_from(["atlas-console", "--chat", "-q", "--no-config"]);
        assert!(cli.chat && cli.quiet && cli.no_config);
        assert!(cli.message.is_none());
        assert_eq!(cli.log_level(), "warn");
    }

    #[test]
    fn test_verbosity_caps_at_trace() {
        let cli = Cli::parse_from(["atlas-console", "-vvvv", "--list-models"]);
        assert_eq!(cli.log_level(), "trace");
        assert!(cli.list_models);
    }
}
