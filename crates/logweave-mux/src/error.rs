use logweave_core::SharedError;
use thiserror::Error;

/// Errors that end a whole [`Engine::run`](crate::Engine::run).
#[derive(Debug, Error)]
pub enum MuxError {
    #[error("at least one service is required")]
    NoServices,
    #[error("read logs for {service}")]
    Read {
        service: String,
        #[source]
        source: SharedError,
    },
    #[error("write logs")]
    Output(#[from] std::io::Error),
}
