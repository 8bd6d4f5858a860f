use thiserror::Error;

/// Failures inside the persistence layer. These never cross the ledger
/// boundary: callers see defaults or `false` instead.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("failed to create storage directory: {0}")]
    Io(#[from] std::io::Error),

    #[error("could not write the {0} ledger")]
    WriteFailed(&'static str),
}

/// User-facing validation failures raised by the quiz engine.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum QuizError {
    #[error("Please select at least one chapter")]
    NoChapterSelected,

    #[error("No questions available for the selected chapters")]
    NoQuestions,

    #[error("No quiz in progress")]
    NoActiveSession,

    #[error("Unknown chapter: {0}")]
    UnknownChapter(String),
}
