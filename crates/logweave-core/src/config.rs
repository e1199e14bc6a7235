//! Configuration types for logweave.
//!
//! [`Config::load`] layers `~/.config/logweave/config.toml` (or an explicit
//! path) and `LOGWEAVE_*` environment variables on top of the embedded
//! defaults. [`Config::defaults`] returns the same defaults without touching
//! the filesystem (useful in tests).

use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

// ---------------------------------------------------------------------------
// Embedded defaults
// ---------------------------------------------------------------------------

const DEFAULT_CONFIG: &str = r#"
[engine]
window_ms         = 100
restart_settle_ms = 500
queue_per_service = 32

[output]
color     = "auto"
separator = "›"
palette   = ["blue", "cyan", "green", "magenta", "red", "yellow"]

[docker]
host = "unix:///var/run/docker.sock"
"#;

// ---------------------------------------------------------------------------
// Public config types
// ---------------------------------------------------------------------------

/// Top-level application configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub engine: EngineConfig,
    #[serde(default)]
    pub output: OutputConfig,
    #[serde(default)]
    pub docker: DockerConfig,
}

/// `[engine]` section of `config.toml`.
#[derive(Debug, Clone, Deserialize)]
pub struct EngineConfig {
    /// Length of one reordering window. Lines that arrive within one window
    /// are printed sorted by their embedded timestamp.
    #[serde(default = "default_window_ms")]
    pub window_ms: u64,
    /// Pause after a stream ends before waiting for the replacement instance.
    #[serde(default = "default_restart_settle_ms")]
    pub restart_settle_ms: u64,
    /// Queue slots per followed service.
    #[serde(default = "default_queue_per_service")]
    pub queue_per_service: usize,
}

fn default_window_ms() -> u64 { 100 }
fn default_restart_settle_ms() -> u64 { 500 }
fn default_queue_per_service() -> usize { 32 }

impl EngineConfig {
    pub fn window(&self) -> Duration {
        Duration::from_millis(self.window_ms)
    }

    pub fn restart_settle(&self) -> Duration {
        Duration::from_millis(self.restart_settle_ms)
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            window_ms: default_window_ms(),
            restart_settle_ms: default_restart_settle_ms(),
            queue_per_service: default_queue_per_service(),
        }
    }
}

/// When service labels are coloured.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColorMode {
    /// Colour only when stdout is a terminal.
    #[default]
    Auto,
    Always,
    Never,
}

/// `[output]` section of `config.toml`.
#[derive(Debug, Clone, Deserialize)]
pub struct OutputConfig {
    #[serde(default)]
    pub color: ColorMode,
    #[serde(default = "default_separator")]
    pub separator: String,
    #[serde(default = "default_palette")]
    pub palette: Vec<String>,
}

fn default_separator() -> String { "›".to_string() }
fn default_palette() -> Vec<String> {
    ["blue", "cyan", "green", "magenta", "red", "yellow"]
        .iter()
        .map(|c| c.to_string())
        .collect()
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            color: ColorMode::default(),
            separator: default_separator(),
            palette: default_palette(),
        }
    }
}

/// `[docker]` section of `config.toml`.
#[derive(Debug, Clone, Deserialize)]
pub struct DockerConfig {
    /// `unix:///path/to/docker.sock`, `tcp://host:port` or `http://host:port`.
    #[serde(default = "default_docker_host")]
    pub host: String,
}

fn default_docker_host() -> String { "unix:///var/run/docker.sock".to_string() }

impl Default for DockerConfig {
    fn default() -> Self {
        Self {
            host: default_docker_host(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::defaults()
    }
}

impl Config {
    /// Load the configuration, layered on top of the built-in defaults.
    ///
    /// `path` overrides the default location. A missing default file is not an
    /// error; a missing explicit file is.
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        let file = match path {
            Some(path) => config::File::from(path).required(true),
            None => config::File::from(config_path().as_path()).required(false),
        };

        config::Config::builder()
            .add_source(config::File::from_str(DEFAULT_CONFIG, config::FileFormat::Toml))
            .add_source(file)
            .add_source(
                config::Environment::with_prefix("LOGWEAVE")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()
            .map_err(Into::into)
    }

    /// Return the built-in defaults without touching the filesystem.
    pub fn defaults() -> Self {
        config::Config::builder()
            .add_source(config::File::from_str(DEFAULT_CONFIG, config::FileFormat::Toml))
            .build()
            .expect("built-in default config must be valid TOML")
            .try_deserialize()
            .expect("built-in default config must deserialize correctly")
    }
}

// ---------------------------------------------------------------------------
// Path helpers
// ---------------------------------------------------------------------------

fn config_path() -> PathBuf {
    std::env::var("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| {
            PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| ".".to_string()))
                .join(".config")
        })
        .join("logweave")
        .join("config.toml")
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
