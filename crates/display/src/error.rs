use std::io;

/// Errors from the plumbing around the display components.
///
/// Parsing and image transforms never fail; they produce "no result"
/// instead. These cover configuration and the worker pool.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("io error: {0}")]
    Io(#[from] io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("job pool closed")]
    PoolClosed,

    #[error("invalid log filter: {0}")]
    LogFilter(String),

    #[error("generic error: {0}")]
    Generic(String),
}

impl From<String> for Error {
    fn from(s: String) -> Self {
        Error::Generic(s)
    }
}
