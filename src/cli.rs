use std::path::PathBuf;

use clap::{Parser, ValueEnum};
use logweave_core::config::ColorMode;
use logweave_core::RunOptions;

#[derive(Debug, Parser)]
#[command(
    name = "logweave",
    version,
    about = "Follow the logs of several containers as one time-ordered stream"
)]
pub struct Cli {
    /// Keep streaming, and re-attach to containers that restart.
    #[arg(short, long)]
    pub follow: bool,

    /// Print the logs of the previous instance of each container.
    #[arg(short, long)]
    pub previous: bool,

    /// Read configuration from PATH instead of ~/.config/logweave/config.toml.
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Docker Engine endpoint. Overrides DOCKER_HOST and the config file.
    #[arg(long, value_name = "URL")]
    pub docker_host: Option<String>,

    /// When to colour service labels.
    #[arg(long, value_enum, value_name = "WHEN")]
    pub color: Option<ColorChoice>,

    /// Write debug logs to /tmp/logweave-debug.log (tail -f to inspect).
    #[arg(long)]
    pub debug: bool,

    /// Containers to read logs from.
    #[arg(required = true, value_name = "SERVICE")]
    pub services: Vec<String>,
}

impl Cli {
    pub fn run_options(&self) -> RunOptions {
        RunOptions {
            follow: self.follow,
            previous: self.previous,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ColorChoice {
    Auto,
    Always,
    Never,
}

impl From<ColorChoice> for ColorMode {
    fn from(choice: ColorChoice) -> Self {
        match choice {
            ColorChoice::Auto => ColorMode::Auto,
            ColorChoice::Always => ColorMode::Always,
            ColorChoice::Never => ColorMode::Never,
        }
    }
}
