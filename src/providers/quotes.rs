use async_trait::async_trait;
use rand::seq::SliceRandom;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use tracing::{instrument, warn};
use url::Url;

use crate::error::QuizError;

use super::QuoteSource;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Quote {
    #[serde(rename = "q")]
    pub text: String,
    #[serde(rename = "a")]
    pub author: String,
}

impl Quote {
    /// Quote followed by its author, as sent for `/motivation`.
    pub fn attributed(&self) -> String {
        format!("{}\n\n{}", self.text, self.author)
    }
}

pub fn pick(quotes: &[Quote]) -> Option<&Quote> {
    quotes.choose(&mut rand::thread_rng())
}

#[derive(Debug, Clone)]
pub struct ZenQuotes {
    client: Client,
    url: Url,
}

impl ZenQuotes {
    pub fn new(client: Client, url: Url) -> Self {
        Self { client, url }
    }
}

#[async_trait]
impl QuoteSource for ZenQuotes {
    #[instrument(level = "info", skip(self))]
    async fn fetch(&self) -> Result<Vec<Quote>, QuizError> {
        let response = self
            .client
            .get(self.url.clone())
            .send()
            .await
            .map_err(|e| {
                warn!("quote request failed: {e}");
                QuizError::QuoteFetch(e.to_string())
            })?;

        if response.status() != StatusCode::OK {
            warn!("quote api answered {}", response.status());
            return Err(QuizError::QuoteFetch(format!(
                "unexpected status {}",
                response.status()
            )));
        }

        let quotes: Vec<Quote> = response
            .json()
            .await
            .map_err(|e| QuizError::QuoteFetch(e.to_string()))?;
        if quotes.is_empty() {
            return Err(QuizError::NoQuotes);
        }
        Ok(quotes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_zenquotes_payload() {
        let payload = r#"[
            {"q": "Well begun is half done.", "a": "Aristotle", "h": "<blockquote/>"},
            {"q": "Act as if what you do makes a difference.", "a": "William James"}
        ]"#;
        let quotes: Vec<Quote> = serde_json::from_str(payload).unwrap();
        assert_eq!(quotes.len(), 2);
        assert_eq!(quotes[0].attributed(), "Well begun is half done.\n\nAristotle");
    }

    #[test]
    fn pick_handles_empty() {
        assert!(pick(&[]).is_none());
        let quotes = vec![Quote {
            text: "Keep going.".into(),
            author: "Anon".into(),
        }];
        assert_eq!(pick(&quotes), quotes.first());
    }
}
