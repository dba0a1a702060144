//! Console output formatter for sessions and deployments

use atlas_domain::{ChatMessage, ChatSession, DiscoveredModel, ModelDeployment, Role, preview};
use colored::Colorize;

/// Formats chat state for console display
pub struct ConsoleFormatter;

impl ConsoleFormatter {
    /// An assistant reply, headed by the deployment that produced it.
    pub fn format_reply(message: &ChatMessage, model_id: &str) -> String {
        format!(
            "{}\n{}\n",
            format!("── {} ──", model_id).yellow().bold(),
            message.content
        )
    }

    /// A request failure as stored on the session.
    pub fn format_error(message: &str) -> String {
        format!("{} {}", "Error:".red().bold(), message)
    }

    /// Numbered session list; `current` is marked with `*`.
    pub fn format_sessions(sessions: &[ChatSession], current: Option<&str>) -> String {
        if sessions.is_empty() {
            return "No open sessions. Use /new to start one.".dimmed().to_string();
        }

        let mut output = String::new();
        output.push_str(&format!("{}\n", "Sessions:".cyan().bold()));
        for (index, session) in sessions.iter().enumerate() {
            let marker = if Some(session.id()) == current { "*" } else { " " };
            let status = match session.error() {
                Some(error) => format!("error: {}", preview(error, 40)).red().to_string(),
                None => session.status().label().dimmed().to_string(),
            };
            let clip = session
                .clip_id()
                .map(|clip| format!(" clip={}", clip))
                .unwrap_or_default();
            output.push_str(&format!(
                "{} {}. {} [{}{}] {} message(s), {}\n",
                marker,
                index + 1,
                session.title().bold(),
                session.model_id(),
                clip,
                Self::visible_message_count(session),
                status
            ));
        }
        output
    }

    /// Configured deployments, default first-marked.
    pub fn format_deployments(deployments: &[ModelDeployment]) -> String {
        if deployments.is_empty() {
            return "No deployments configured.".yellow().to_string();
        }

        let mut output = String::new();
        output.push_str(&format!("{}\n", "Deployments:".cyan().bold()));
        for deployment in deployments {
            let default = if deployment.default {
                " (default)".green().to_string()
            } else {
                String::new()
            };
            output.push_str(&format!(
                "  - {}{}  {}\n",
                deployment.id.bold(),
                default,
                deployment.endpoint.dimmed()
            ));
            if let Some(description) = &deployment.description {
                output.push_str(&format!("      {}\n", description));
            }
        }
        output
    }

    /// Result of a discovery run.
    pub fn format_discovered(models: &[DiscoveredModel]) -> String {
        if models.is_empty() {
            return "No new models discovered.".dimmed().to_string();
        }

        let mut output = String::new();
        output.push_str(&format!(
            "{}\n",
            format!("Registered {} model(s):", models.len()).green().bold()
        ));
        for model in models {
            output.push_str(&format!("  + {}  {}\n", model.id.bold(), model.endpoint.dimmed()));
        }
        output
    }

    /// One-line session banner shown when a session becomes current.
    pub fn format_session_banner(session: &ChatSession) -> String {
        let clip = session
            .clip_id()
            .map(|clip| format!(", clip {}", clip))
            .unwrap_or_default();
        format!(
            "{} {} ({}{})",
            "Session:".cyan().bold(),
            session.title(),
            session.model_id(),
            clip
        )
    }

    fn visible_message_count(session: &ChatSession) -> usize {
        session
            .messages()
            .iter()
            .filter(|m| m.role != Role::System)
            .count()
    }

    /// Indent a multi-line string
    pub fn indent(text: &str, prefix: &str) -> String {
        text.lines()
            .map(|line| format!("{}{}", prefix, line))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use atlas_domain::SessionStatus;

    fn plain() {
        colored::control::set_override(false);
    }

    #[test]
    fn test_format_sessions_marks_current_and_errors() {
        plain();
        let mut first = ChatSession::new("lm-studio-local", Some("Review".to_string()))
            .with_clip(Some("clip-9".to_string()));
        first.append(ChatMessage::user("hi"));
        let mut second = ChatSession::new("vision", None)
            .with_system_prompt(Some("Be brief.".to_string()));
        second.set_status(SessionStatus::Error {
            message: "Request timed out".to_string(),
        });

        let output = ConsoleFormatter::format_sessions(
            &[first.clone(), second],
            Some(first.id()),
        );

        assert!(output.contains("* 1. Review [lm-studio-local clip=clip-9] 1 message(s), idle"));
        assert!(output.contains("  2. Untitled Chat [vision] 0 message(s), error: Request timed out"));
    }

    #[test]
    fn test_format_deployments() {
        plain();
        let deployments = vec![
            ModelDeployment::new("local", "Local", "http://localhost:1234/v1").as_default(),
            ModelDeployment::new("vision", "Vision", "http://gpu:9000").with_description("Frames"),
        ];
        let output = ConsoleFormatter::format_deployments(&deployments);
        assert!(output.contains("- local (default)  http://localhost:1234/v1"));
        assert!(output.contains("      Frames"));
    }

    #[test]
    fn test_empty_lists() {
        plain();
        assert!(ConsoleFormatter::format_sessions(&[], None).starts_with("No open sessions"));
        assert_eq!(
            ConsoleFormatter::format_deployments(&[]),
            "No deployments configured."
        );
        assert_eq!(
            ConsoleFormatter::format_discovered(&[]),
            "No new models discovered."
        );
    }

    #[test]
    fn test_indent() {
        assert_eq!(ConsoleFormatter::indent("a\nb", "> "), "> a\n> b");
    }
}
