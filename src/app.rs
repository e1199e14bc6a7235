//! Wiring between the command line, the Docker client and the engine.

use std::io::{self, BufWriter, IsTerminal};
use std::sync::Arc;

use anyhow::{bail, Context};
use logweave_core::config::{ColorMode, Config};
use logweave_core::Palette;
use logweave_feeds::docker::DockerClient;
use logweave_feeds::StartCheck;
use logweave_mux::{Engine, EngineSettings, Renderer};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};
use tracing_subscriber::EnvFilter;

use crate::cli::Cli;

pub const DEBUG_LOG: &str = "/tmp/logweave-debug.log";

/// Install the global subscriber.
///
/// Diagnostics go to stderr at `warn` (or `RUST_LOG`) so they never mix with
/// the merged logs on stdout. `debug` sends everything to [`DEBUG_LOG`].
pub fn init_tracing(debug: bool) -> anyhow::Result<()> {
    if debug {
        let file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(DEBUG_LOG)
            .with_context(|| format!("open {DEBUG_LOG}"))?;
        tracing_subscriber::fmt()
            .with_writer(std::sync::Mutex::new(file))
            .with_ansi(false)
            .with_env_filter(
                EnvFilter::try_from_env("RUST_LOG").unwrap_or_else(|_| EnvFilter::new("debug")),
            )
            .init();
        tracing::info!("logweave debug log started, tail -f {DEBUG_LOG}");
    } else {
        tracing_subscriber::fmt()
            .with_writer(io::stderr)
            .with_env_filter(
                EnvFilter::try_from_env("RUST_LOG").unwrap_or_else(|_| EnvFilter::new("warn")),
            )
            .init();
    }
    Ok(())
}

/// Pick the Docker endpoint: flag, then `DOCKER_HOST`, then configuration.
pub fn resolve_host(flag: Option<&str>, env: Option<String>, configured: &str) -> String {
    flag.map(str::to_string)
        .or(env.filter(|host| !host.is_empty()))
        .unwrap_or_else(|| configured.to_string())
}

pub fn use_color(mode: ColorMode, is_terminal: bool) -> bool {
    match mode {
        ColorMode::Always => true,
        ColorMode::Never => false,
        ColorMode::Auto => is_terminal,
    }
}

/// Fail unless every service has started at least once. Logs only exist for
/// containers that have run.
pub async fn ensure_started(check: &dyn StartCheck, services: &[String]) -> anyhow::Result<()> {
    for service in services {
        let started = check
            .has_ever_started(service)
            .await
            .with_context(|| format!("look up {service}"))?;
        if !started {
            bail!("{service} has not started yet");
        }
    }
    Ok(())
}

/// A token that is cancelled on SIGINT or SIGTERM.
pub fn interrupt_token() -> CancellationToken {
    let token = CancellationToken::new();
    let trigger = token.clone();
    tokio::spawn(async move {
        wait_for_signal().await;
        debug!("Interrupt received, shutting down");
        trigger.cancel();
    });
    token
}

#[cfg(unix)]
async fn wait_for_signal() {
    use tokio::signal::unix::{signal, SignalKind};

    match signal(SignalKind::terminate()) {
        Ok(mut terminate) => {
            tokio::select! {
                _ = tokio::signal::ctrl_c() => {}
                _ = terminate.recv() => {}
            }
        }
        Err(err) => {
            warn!(error = %err, "Failed to install SIGTERM handler");
            let _ = tokio::signal::ctrl_c().await;
        }
    }
}

#[cfg(not(unix))]
async fn wait_for_signal() {
    let _ = tokio::signal::ctrl_c().await;
}

pub async fn run(cli: Cli) -> anyhow::Result<()> {
    let config = Config::load(cli.config.as_deref()).context("load configuration")?;
    let host = resolve_host(
        cli.docker_host.as_deref(),
        std::env::var("DOCKER_HOST").ok(),
        &config.docker.host,
    );
    let docker = Arc::new(
        DockerClient::new(&host).with_context(|| format!("use Docker host {host}"))?,
    );

    ensure_started(docker.as_ref(), &cli.services).await?;

    let stdout = io::stdout();
    let color = use_color(
        cli.color.map(Into::into).unwrap_or(config.output.color),
        stdout.is_terminal(),
    );
    let mut renderer = Renderer::new(BufWriter::new(stdout.lock()))
        .with_separator(config.output.separator.as_str());
    if color {
        renderer = renderer.with_palette(Palette::from_names(&config.output.palette));
    }

    let engine = Engine::new(docker.clone(), docker)
        .with_settings(EngineSettings::from(&config.engine));
    let cancel = interrupt_token();
    engine
        .run(&cli.services, cli.run_options(), renderer, &cancel)
        .await?;
    Ok(())
}
