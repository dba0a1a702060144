//! CLI entrypoint for Atlas Console
//!
//! This is the main binary that wires together all layers using
//! dependency injection.

use anyhow::{Context, Result, bail};
use atlas_application::{
    BehaviorConfig, DeploymentCatalog, DeploymentStore, DiscoverModelsUseCase, NoDeploymentStore,
    SendMessageOptions, SendOutcome, SessionManager, StartSessionOptions,
};
use atlas_infrastructure::{
    ConfigLoader, FileConfig, JsonDeploymentStore, JsonlConversationLogger, ReqwestModelDiscovery,
    ReqwestTransport,
};
use atlas_presentation::{ChatRepl, Cli, ConsoleFormatter, ProgressReporter};
use clap::Parser;
use std::path::Path;
use std::sync::Arc;
use tracing::{info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Keep the guard alive so buffered log lines are flushed on exit
    let _log_guard = init_tracing(&cli)?;

    info!("Starting atlas-console");

    let config = load_config(&cli)?;

    if cli.show_config {
        ConfigLoader::print_config_sources();
        println!();
        println!("{}", toml::to_string_pretty(&config)?);
        return Ok(());
    }

    for issue in config.ensure_valid()? {
        warn!("{}", issue.message);
    }

    // === Dependency Injection ===
    let store: Arc<dyn DeploymentStore> = match ConfigLoader::deployment_store_path() {
        Some(path) if !cli.no_config => Arc::new(JsonDeploymentStore::new(path)),
        _ => Arc::new(NoDeploymentStore),
    };
    let catalog = Arc::new(DeploymentCatalog::load(store, config.deployments_or_builtin()));

    let behavior = BehaviorConfig::from_timeout_seconds(config.http.timeout_seconds);
    let transport = Arc::new(ReqwestTransport::new(&behavior));

    let mut sessions = SessionManager::new(catalog.clone(), transport);
    if let Some(logger) = config
        .logging
        .conversation_log_path()
        .and_then(JsonlConversationLogger::new)
    {
        info!("Conversation log: {}", logger.path().display());
        sessions = sessions.with_conversation_logger(Arc::new(logger));
    }
    let sessions = Arc::new(sessions);

    let discovery = Arc::new(DiscoverModelsUseCase::new(Arc::new(
        ReqwestModelDiscovery::new(&behavior),
    )));
    let discovery_base = config.console.discovery_base().to_string();

    if cli.list_models {
        println!("{}", ConsoleFormatter::format_deployments(&catalog.list()));
        return Ok(());
    }

    if cli.discover {
        let added = discovery.register(&discovery_base, &catalog).await;
        println!("{}", ConsoleFormatter::format_discovered(&added));
        return Ok(());
    }

    let defaults = StartSessionOptions {
        model_id: cli.model.clone(),
        clip_id: cli.clip.clone(),
        title: cli.title.clone(),
        system_prompt: cli.system.clone(),
    };

    // Chat mode
    if cli.chat {
        let mut repl = ChatRepl::new(sessions, discovery, discovery_base)
            .with_session_defaults(defaults)
            .with_progress(!cli.quiet);

        repl.run().await?;
        return Ok(());
    }

    // Single message mode - message is required
    let Some(message) = cli.message.clone() else {
        bail!("Message is required. Use --chat for interactive mode.");
    };

    let session = sessions.start_session(defaults)?;
    let spinner = ProgressReporter::new(!cli.quiet).start(session.model_id());

    match sessions
        .send_message(session.id(), message, SendMessageOptions::default())
        .await?
    {
        SendOutcome::Replied(reply) => {
            spinner.succeed();
            println!("{}", ConsoleFormatter::format_reply(&reply, session.model_id()));
            Ok(())
        }
        SendOutcome::Failed(error) => {
            spinner.fail("request failed");
            bail!(error)
        }
        SendOutcome::Cancelled | SendOutcome::Superseded => {
            spinner.fail("discarded");
            bail!("Request was discarded before a reply arrived")
        }
    }
}

/// Initialize logging based on verbosity level, to stderr or `--log-file`.
fn init_tracing(cli: &Cli) -> Result<Option<WorkerGuard>> {
    let filter = if cli.verbose > 0 {
        EnvFilter::new(cli.log_level())
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(cli.log_level()))
    };

    let Some(path) = &cli.log_file else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .with_writer(std::io::stderr)
            .init();
        return Ok(None);
    };

    let file_name = path
        .file_name()
        .with_context(|| format!("Invalid log file path: {}", path.display()))?;
    let directory = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));

    let appender = tracing_appender::rolling::never(directory, file_name);
    let (writer, guard) = tracing_appender::non_blocking(appender);

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_ansi(false)
        .with_writer(writer)
        .init();

    Ok(Some(guard))
}

fn load_config(cli: &Cli) -> Result<FileConfig> {
    if cli.no_config {
        return Ok(ConfigLoader::load_defaults());
    }
    ConfigLoader::load(cli.config.as_ref()).context("Failed to load configuration")
}
