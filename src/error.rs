use std::collections::TryReserveError;
use std::io;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("failed to reserve storage: {0}")]
    Allocation(#[from] TryReserveError),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("failed to parse configuration: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("no error has been recorded for this response")]
    NoErrorRecorded,

    #[error("response headers have already been sent")]
    HeadersAlreadySent,
}

pub type Result<T> = std::result::Result<T, Error>;
