use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;

use crate::{
    error::QuizError,
    state::{Question, QuizFilter},
};

pub mod quotes;
pub mod trivia;

pub use quotes::{Quote, ZenQuotes};
pub use trivia::TriviaApi;

#[async_trait]
pub trait QuestionSource: Send + Sync {
    async fn fetch(&self, filter: &QuizFilter) -> Result<Vec<Question>, QuizError>;
}

#[async_trait]
pub trait QuoteSource: Send + Sync {
    async fn fetch(&self) -> Result<Vec<Quote>, QuizError>;
}

/// Client shared by the provider wrappers. Every call is bounded by `timeout`.
pub fn http_client(timeout: Duration) -> Result<Client, reqwest::Error> {
    Client::builder().timeout(timeout).build()
}
