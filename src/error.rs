use std::path::PathBuf;

use thiserror::Error;

use crate::types::Side;

/// Failures of the command shell around the engine. The engine itself never fails.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("{context}: {source}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{context}: {source}")]
    Json {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("No tournament at {}; run `bracket-tool generate` first.", .0.display())]
    MissingState(PathBuf),

    #[error("Unknown match `{0}`. Use a match id, `round.index` (e.g. 2.0) or `3rd`.")]
    UnknownMatch(String),

    #[error("Match {reference} has no contestant on side {side:?}.")]
    EmptySlot { reference: String, side: Side },

    #[error("Need at least 2 entrants, got {0}.")]
    TooFewEntrants(usize),

    #[error("{0}")]
    InvalidArgument(String),

    #[error("Server error: {0}")]
    Server(String),
}

impl AppError {
    pub fn io(context: impl Into<String>) -> impl FnOnce(std::io::Error) -> AppError {
        let context = context.into();
        move |source| AppError::Io { context, source }
    }

    pub fn json(context: impl Into<String>) -> impl FnOnce(serde_json::Error) -> AppError {
        let context = context.into();
        move |source| AppError::Json { context, source }
    }
}

pub type AppResult<T> = Result<T, AppError>;
