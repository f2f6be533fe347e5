mod cli;
mod components;
mod config;
mod session;
mod tui;

use crate::cli::{ConfigCommand, SetupArgs};
use clap::Parser;
use color_eyre::Result;
use compvault_core::{contents::ContentsApi, revision::RevisionState};
use compvault_records::ComponentSession;
use serde_json::json;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Entry point wiring the CLI to the session and the TUI.
#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    init_tracing();

    let cli = cli::Cli::parse();
    let config = config::load()?;
    match cli.command.unwrap_or(cli::Command::Tui) {
        cli::Command::Tui => {
            let mut session = session::github_session(&config)?;
            session.load().await.map_err(session::report)?;
            let location = session.handle().location.to_string();
            tui::launch(session.components(), &location)?
        }
        cli::Command::Version => print_version(),
        cli::Command::Health => run_health_check(&config).await?,
        cli::Command::List { search } => {
            let mut session = session::github_session(&config)?;
            components::list(&mut session, search.as_deref()).await?
        }
        cli::Command::Add(args) => {
            let mut session = session::github_session(&config)?;
            components::add(&mut session, args).await?
        }
        cli::Command::Edit(args) => {
            let mut session = session::github_session(&config)?;
            components::edit(&mut session, args).await?
        }
        cli::Command::Delete { id, yes } => {
            let mut session = session::github_session(&config)?;
            components::delete(&mut session, &id, yes).await?
        }
        cli::Command::Setup(args) => run_setup(args, config)?,
        cli::Command::Config(ConfigCommand::Init) => init_config()?,
        cli::Command::Config(ConfigCommand::Path) => {
            println!("{}", config::default_path()?.display())
        }
    }

    Ok(())
}

const DEFAULT_LOG_FILTER: &str = "info";

fn init_tracing() {
    // Respect user-provided filters; logs go to stderr so command output stays clean.
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| default_filter());
    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_target(false)
        .with_writer(std::io::stderr);
    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .init();
}

fn default_filter() -> EnvFilter {
    EnvFilter::new(DEFAULT_LOG_FILTER)
}

fn print_version() {
    println!("compvault {}", env!("CARGO_PKG_VERSION"));
}

/// Checks config, a local seal/open round-trip and the remote file.
async fn run_health_check(config: &config::Config) -> Result<()> {
    config.github.validate().map_err(session::report)?;
    envelope_self_check(&config.github.encryption_password)?;
    println!("Envelope: ok");

    let mut session = session::github_session(config)?;
    run_remote_health(&mut session).await?;
    Ok(())
}

fn envelope_self_check(passphrase: &str) -> Result<()> {
    let probe = json!({ "probe": "ok" });
    let blob = compvault_envelope::seal(&probe, passphrase).map_err(session::report)?;
    let opened = compvault_envelope::open_value(&blob, passphrase).map_err(session::report)?;
    if opened != probe {
        color_eyre::eyre::bail!("envelope round-trip failed");
    }
    Ok(())
}

async fn run_remote_health<C: ContentsApi>(session: &mut ComponentSession<C>) -> Result<()> {
    let count = session.load().await.map_err(session::report)?.len();
    match &session.handle().revision {
        RevisionState::Known(sha) => println!("Remote: ok ({count} components, revision {sha})"),
        RevisionState::Absent => println!("Remote: ok (no data file yet)"),
        RevisionState::Unknown => color_eyre::eyre::bail!("remote state unknown after read"),
    }
    Ok(())
}

fn run_setup(args: SetupArgs, mut config: config::Config) -> Result<()> {
    let settings = &mut config.github;
    settings.username = args.username.trim().to_string();
    if let Some(repo) = args.repo {
        settings.repo = repo.trim().to_string();
    }
    if let Some(branch) = args.branch {
        settings.branch = branch.trim().to_string();
    }
    settings.token = args.token.trim().to_string();
    settings.encryption_password = args.password.trim().to_string();
    settings.validate().map_err(session::report)?;

    let path = config::default_path()?;
    config::save_to_path(&config, &path)?;
    info!(path = %path.display(), "configuration saved");
    println!(
        "Configuration saved to {}. Your data will be encrypted before storage.",
        path.display()
    );
    Ok(())
}

fn init_config() -> Result<()> {
    let path = config::write_default_if_missing()?;
    println!("Config initialized at {}", path.display());
    Ok(())
}
