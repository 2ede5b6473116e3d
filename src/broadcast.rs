use std::time::Duration;

use serde::Serialize;
use teloxide::types::ChatId;
use tracing::{info, instrument, warn};

use crate::{
    database::{fetch_all, ChatRecord, ChatStore, Collection},
    error::QuizError,
    messenger::Messenger,
    providers::{quotes::pick, Quote, QuoteSource},
};

/// How often a broadcast rests to stay under Telegram's rate limits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pacing {
    pub batch: usize,
    pub pause: Duration,
}

impl Default for Pacing {
    fn default() -> Self {
        Self {
            batch: 30,
            pause: Duration::from_secs(1),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BroadcastReport {
    pub recipients: usize,
    pub delivered: usize,
    pub failed: usize,
    pub pauses: usize,
}

/// Sends a motivational quote to every known user.
///
/// A failed send is counted and skipped. Only a failure to load the
/// recipients or the quotes aborts the run, before anything is sent.
#[instrument(level = "info", skip_all)]
pub async fn broadcast(
    store: &dyn ChatStore,
    quotes: &dyn QuoteSource,
    messenger: &dyn Messenger,
    pacing: Pacing,
) -> Result<BroadcastReport, QuizError> {
    let recipients = fetch_all(store, Collection::Users).await?;
    let quotes = quotes.fetch().await?;
    if quotes.is_empty() {
        return Err(QuizError::NoQuotes);
    }

    let mut report = BroadcastReport {
        recipients: recipients.len(),
        ..BroadcastReport::default()
    };

    for (idx, record) in recipients.iter().enumerate() {
        match send_quote(messenger, record, &quotes).await {
            Ok(()) => report.delivered += 1,
            Err(e) => {
                report.failed += 1;
                warn!("broadcast to {} failed: {e}", record.key);
            }
        }

        let attempted = idx + 1;
        if pacing.batch > 0 && attempted % pacing.batch == 0 && attempted < recipients.len() {
            tokio::time::sleep(pacing.pause).await;
            report.pauses += 1;
        }
    }

    info!(
        "broadcast done: {} delivered, {} failed",
        report.delivered, report.failed
    );
    Ok(report)
}

async fn send_quote(
    messenger: &dyn Messenger,
    record: &ChatRecord,
    quotes: &[Quote],
) -> Result<(), QuizError> {
    let chat = record
        .key
        .parse::<i64>()
        .map(ChatId)
        .map_err(|_| QuizError::InvalidChatKey(record.key.clone()))?;
    let text = pick(quotes)
        .map(|quote| quote.text.clone())
        .ok_or(QuizError::NoQuotes)?;
    messenger.send_text(chat, &text).await?;
    Ok(())
}
