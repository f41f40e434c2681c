use molcrowd::engine::error::EngineError;
use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, CliError>;

#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Core(#[from] EngineError),

    #[error("failed to load scenario '{path}': {source}", path = path.display())]
    Scenario {
        path: PathBuf,
        #[source]
        source: anyhow::Error,
    },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("table output failed: {0}")]
    Table(#[from] csv::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}
