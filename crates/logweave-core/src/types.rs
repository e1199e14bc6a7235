//! Records exchanged between the forwarders and the merge-printer.

use std::sync::Arc;

use chrono::{DateTime, Utc};

/// An error that can be handed across the shared queue and still be returned
/// to the caller that spawned the forwarder.
pub type SharedError = Arc<dyn std::error::Error + Send + Sync + 'static>;

/// One unit of work sent from a forwarder to the merge-printer.
///
/// Each variant carries exactly the data that is meaningful for it, so a
/// failure never has a timestamp to sort by and a line never has an error.
#[derive(Debug, Clone)]
pub enum RawRecord {
    /// One complete line, newline stripped, timestamp prefix still attached.
    Data {
        service: String,
        text: String,
        received_at: DateTime<Utc>,
    },
    /// The service's current stream has no more data. `trailing` holds a
    /// final line that was not newline-terminated, if any.
    Terminal {
        service: String,
        trailing: Option<String>,
        received_at: DateTime<Utc>,
    },
    /// A genuine read error on the service's stream.
    Failure { service: String, error: SharedError },
}

impl RawRecord {
    pub fn data(service: impl Into<String>, text: impl Into<String>) -> Self {
        RawRecord::Data {
            service: service.into(),
            text: text.into(),
            received_at: Utc::now(),
        }
    }

    pub fn terminal(service: impl Into<String>, trailing: Option<String>) -> Self {
        RawRecord::Terminal {
            service: service.into(),
            trailing,
            received_at: Utc::now(),
        }
    }

    pub fn failure(service: impl Into<String>, error: SharedError) -> Self {
        RawRecord::Failure {
            service: service.into(),
            error,
        }
    }

    /// The service that produced this record.
    pub fn service(&self) -> &str {
        match self {
            RawRecord::Data { service, .. }
            | RawRecord::Terminal { service, .. }
            | RawRecord::Failure { service, .. } => service,
        }
    }
}

/// A record after timestamp extraction, ready to be sorted and rendered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedRecord {
    pub service: String,
    pub display_text: String,
    /// Best-known generation time: the embedded timestamp, or the receive
    /// time when the line had none.
    pub logged_at: DateTime<Utc>,
    /// A complete line that replaces the `service › text` rendering.
    pub render_override: Option<String>,
}

impl ParsedRecord {
    pub fn new(
        service: impl Into<String>,
        display_text: impl Into<String>,
        logged_at: DateTime<Utc>,
    ) -> Self {
        Self {
            service: service.into(),
            display_text: display_text.into(),
            logged_at,
            render_override: None,
        }
    }

    /// The synthetic "container exited" notice emitted in follow mode.
    pub fn exit_notice(service: &str, at: DateTime<Utc>) -> Self {
        Self {
            service: service.to_string(),
            display_text: "container exited".to_string(),
            logged_at: at,
            render_override: Some(format!("The {service} container exited.")),
        }
    }
}

/// Options for a whole `run` of the engine.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunOptions {
    /// Keep streaming and re-attach to services across restarts.
    pub follow: bool,
    /// Print the logs of the previous instance of each container.
    pub previous: bool,
}

/// Options for opening one log stream. Timestamps are always requested.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StreamOptions {
    pub follow: bool,
    pub previous: bool,
    /// Only return lines written after this instant. Set when re-attaching
    /// to a restarted container so earlier output is not repeated.
    pub since: Option<DateTime<Utc>>,
}

impl From<RunOptions> for StreamOptions {
    fn from(options: RunOptions) -> Self {
        Self {
            follow: options.follow,
            previous: options.previous,
            since: None,
        }
    }
}
