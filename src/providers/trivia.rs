use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use tracing::{info, instrument, warn};
use url::Url;

use crate::{
    error::QuizError,
    state::{Question, QuizFilter},
};

use super::QuestionSource;

/// Client for the trivia API's `questions` endpoint.
#[derive(Debug, Clone)]
pub struct TriviaApi {
    client: Client,
    base: Url,
}

impl TriviaApi {
    pub fn new(client: Client, base: Url) -> Self {
        Self { client, base }
    }

    pub(crate) fn request_url(&self, filter: &QuizFilter) -> Url {
        let mut url = self.base.clone();
        {
            let mut query = url.query_pairs_mut();
            if !filter.categories.is_empty() {
                let categories: Vec<&str> = filter.categories.iter().map(|c| c.id()).collect();
                query.append_pair("categories", &categories.join(","));
            }
            query.append_pair("limit", &filter.limit.to_string());
            if let Some(difficulty) = filter.difficulty {
                query.append_pair("difficulty", difficulty.id());
            }
        }
        url
    }
}

#[async_trait]
impl QuestionSource for TriviaApi {
    #[instrument(level = "info", skip(self))]
    async fn fetch(&self, filter: &QuizFilter) -> Result<Vec<Question>, QuizError> {
        let url = self.request_url(filter);
        let response = self.client.get(url).send().await.map_err(|e| {
            warn!("trivia request failed: {e}");
            QuizError::QuestionFetch(e.to_string())
        })?;

        if response.status() != StatusCode::OK {
            warn!("trivia api answered {}", response.status());
            return Err(QuizError::QuestionFetch(format!(
                "unexpected status {}",
                response.status()
            )));
        }

        let questions: Vec<Question> = response
            .json()
            .await
            .map_err(|e| QuizError::QuestionFetch(e.to_string()))?;
        info!("fetched {} questions", questions.len());
        Ok(questions)
    }
}
