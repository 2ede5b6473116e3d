use teloxide::types::ChatId;
use thiserror::Error;

use crate::state::QuizState;

#[derive(Error, Debug)]
pub enum QuizError {
    #[error("failed to fetch questions: {0}")]
    QuestionFetch(String),

    #[error("quiz provider returned no questions")]
    NoQuestions,

    #[error("failed to fetch quotes: {0}")]
    QuoteFetch(String),

    #[error("quote provider returned no quotes")]
    NoQuotes,

    #[error("answer for unknown poll '{0}'")]
    UnknownPoll(String),

    #[error("record key '{0}' is not a chat id")]
    InvalidChatKey(String),

    #[error("no quiz session for chat {0}")]
    NoSession(ChatId),

    #[error("selection '{data}' does not fit step {state:?}")]
    UnexpectedSelection { state: QuizState, data: String },

    #[error("telegram request failed: {0}")]
    Telegram(#[from] teloxide::RequestError),

    #[error("store error: {0}")]
    Store(#[from] sqlx::Error),

    #[error("migration failed: {0}")]
    Migrate(#[from] sqlx::migrate::MigrateError),

    #[error("malformed record: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("{0} should be set")]
    Missing(&'static str),

    #[error("{name} is invalid: {reason}")]
    Invalid { name: &'static str, reason: String },
}
