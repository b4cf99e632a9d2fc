use thiserror::Error;

/// Errors surfaced by the helper layer.
#[derive(Error, Debug)]
pub enum Error {
    /// Input rejected locally, before any statement reached the engine.
    #[error("invalid input: {0}")]
    Validation(String),

    #[error("can't open database {path}: {source}")]
    Open {
        path: String,
        #[source]
        source: rusqlite::Error,
    },

    #[error("SQL error: {source} (statement: {sql})")]
    Execute {
        sql: String,
        #[source]
        source: rusqlite::Error,
    },

    #[error("failed to close database: {0}")]
    Close(#[source] rusqlite::Error),
}

impl Error {
    pub(crate) fn validation(msg: impl Into<String>) -> Self {
        Error::Validation(msg.into())
    }

    pub(crate) fn execute(sql: &str, source: rusqlite::Error) -> Self {
        Error::Execute {
            sql: sql.to_string(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
