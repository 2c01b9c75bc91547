mod discord;
mod logging;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use tracing::{error, info, warn};

use encore_api::AppleMediaClient;
use encore_core::{AppConfig, EncoreError, Scheduler};
use encore_probe::{platform, AppleMusicProbe, PgrepMonitor};

use crate::discord::DiscordHandle;

#[derive(Parser)]
#[command(name = "encore", version, about = "Show what Apple Music is playing on Discord")]
struct Cli {
    /// Config file to use instead of the platform default.
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Log level (`debug`) or a full filter directive. Overrides LOG_LEVEL.
    #[arg(long, value_name = "LEVEL")]
    log_level: Option<String>,

    /// Run a single cycle, print what happened, and exit.
    #[arg(long)]
    once: bool,

    /// Print the effective configuration and exit.
    #[arg(long, conflicts_with = "write_config")]
    print_config: bool,

    /// Write the effective configuration to the config file and exit.
    #[arg(long)]
    write_config: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %e, "exiting");
            eprintln!("encore: {e}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<(), EncoreError> {
    let config_path = cli.config.clone().unwrap_or_else(AppConfig::config_path);
    let config = AppConfig::load_from(&config_path)?;

    if cli.print_config {
        print!("{}", config.to_toml()?);
        return Ok(());
    }
    if cli.write_config {
        config.save_to(&config_path)?;
        println!("{}", config_path.display());
        return Ok(());
    }

    let env_level = std::env::var("LOG_LEVEL").ok();
    let level = logging::resolve_level(
        cli.log_level.as_deref(),
        env_level.as_deref(),
        &config.general.log_level,
    );
    let _guard = logging::init(&level, &config.general)?;

    if !platform::supported() {
        warn!("no player adapter for this platform; the player will never be found");
    }

    let probe = AppleMusicProbe::new(config.player.app_name.clone(), config.probe_timeout());
    let host = PgrepMonitor::new(
        config.player.process_pattern.clone(),
        config.presence.peer_patterns.clone(),
        config.probe_timeout(),
    );
    let search = AppleMediaClient::new(config.metadata.storefront.clone(), config.search_timeout())
        .map_err(|e| EncoreError::Config(format!("cannot build search client: {e}")))?;
    let presence = DiscordHandle::start(config.probe_timeout())?;

    let mut scheduler = Scheduler::new(&config, probe, host, search, presence);

    if cli.once {
        let report = scheduler.cycle().await;
        scheduler.teardown().await;
        let report = report?;
        let json = serde_json::to_string_pretty(&report)
            .map_err(|e| EncoreError::Config(format!("cannot render report: {e}")))?;
        println!("{json}");
        return Ok(());
    }

    info!(config = %config_path.display(), "encore started");
    scheduler.run(shutdown_signal()).await
}

/// Resolves on Ctrl-C, or SIGTERM on unix.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "cannot listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "cannot listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
}
