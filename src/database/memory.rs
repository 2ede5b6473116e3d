use std::{collections::BTreeMap, ops::Bound};

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::Mutex;

use crate::error::QuizError;

use super::{ChatRecord, ChatStore, Collection, Page, PAGE_SIZE};

/// Process-local store, used when no database is configured.
#[derive(Debug, Default)]
pub struct MemoryStore {
    records: Mutex<BTreeMap<(Collection, String), Value>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ChatStore for MemoryStore {
    async fn get(&self, collection: Collection, key: &str) -> Result<Option<ChatRecord>, QuizError> {
        let records = self.records.lock().await;
        Ok(records
            .get(&(collection, key.to_owned()))
            .map(|data| ChatRecord::new(key, data.clone())))
    }

    async fn put(&self, collection: Collection, record: ChatRecord) -> Result<(), QuizError> {
        self.records
            .lock()
            .await
            .insert((collection, record.key), record.data);
        Ok(())
    }

    async fn fetch(&self, collection: Collection, last: Option<&str>) -> Result<Page, QuizError> {
        let records = self.records.lock().await;
        let start = match last {
            Some(last) => Bound::Excluded((collection, last.to_owned())),
            None => Bound::Included((collection, String::new())),
        };
        let mut items: Vec<ChatRecord> = records
            .range((start, Bound::Unbounded))
            .take_while(|((owner, _), _)| *owner == collection)
            .take(PAGE_SIZE + 1)
            .map(|((_, key), data)| ChatRecord::new(key.clone(), data.clone()))
            .collect();

        let last = if items.len() > PAGE_SIZE {
            items.truncate(PAGE_SIZE);
            items.last().map(|record| record.key.clone())
        } else {
            None
        };
        Ok(Page { items, last })
    }
}
