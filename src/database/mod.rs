use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;
use teloxide::types::Chat;
use tracing::debug;

use crate::{
    error::QuizError,
    state::{ChatKind, ChatRef},
};

pub mod connection;
pub mod memory;

pub use connection::Connection;
pub use memory::MemoryStore;

/// Number of records returned by one `fetch` call.
pub const PAGE_SIZE: usize = 100;

/// The bases chat records are kept in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Collection {
    Users,
    Groups,
    Private,
}

impl Collection {
    pub fn name(self) -> &'static str {
        match self {
            Collection::Users => "quiz_user",
            Collection::Groups => "quiz_group",
            Collection::Private => "quiz_private",
        }
    }
}

/// A chat as stored: its id as the key and the raw Telegram metadata.
#[derive(Debug, Clone, PartialEq)]
pub struct ChatRecord {
    pub key: String,
    pub data: Value,
}

impl ChatRecord {
    pub fn new(key: impl Into<String>, data: Value) -> Self {
        Self {
            key: key.into(),
            data,
        }
    }

    /// Serializes `chat` and attaches an empty `data` list to it.
    pub fn from_chat(chat: &Chat) -> Result<Self, QuizError> {
        Self::from_metadata(chat.id.0, chat)
    }

    pub fn from_metadata(id: i64, metadata: &impl Serialize) -> Result<Self, QuizError> {
        let mut data = serde_json::to_value(metadata)?;
        if let Value::Object(fields) = &mut data {
            fields.insert("key".to_owned(), Value::String(id.to_string()));
            fields.insert("data".to_owned(), Value::Array(Vec::new()));
        }
        Ok(Self::new(id.to_string(), data))
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Page {
    pub items: Vec<ChatRecord>,
    /// Key to continue after, `None` on the last page.
    pub last: Option<String>,
}

#[async_trait]
pub trait ChatStore: Send + Sync {
    async fn get(&self, collection: Collection, key: &str) -> Result<Option<ChatRecord>, QuizError>;

    /// Inserts or replaces the record under its key.
    async fn put(&self, collection: Collection, record: ChatRecord) -> Result<(), QuizError>;

    /// Scans records in key order, starting after `last`.
    async fn fetch(&self, collection: Collection, last: Option<&str>) -> Result<Page, QuizError>;
}

pub async fn fetch_all(
    store: &dyn ChatStore,
    collection: Collection,
) -> Result<Vec<ChatRecord>, QuizError> {
    let mut page = store.fetch(collection, None).await?;
    let mut items = std::mem::take(&mut page.items);
    while let Some(last) = page.last.take() {
        page = store.fetch(collection, Some(&last)).await?;
        items.append(&mut page.items);
    }
    Ok(items)
}

/// Stores the user on first contact. Returns whether it was new.
pub async fn remember_user(store: &dyn ChatStore, record: ChatRecord) -> Result<bool, QuizError> {
    if store.get(Collection::Users, &record.key).await?.is_some() {
        return Ok(false);
    }
    debug!("new user {}", record.key);
    store.put(Collection::Users, record).await?;
    Ok(true)
}

/// Refreshes the record of a chat a quiz was started in. Channels are skipped.
pub async fn remember_chat(
    store: &dyn ChatStore,
    chat: ChatRef,
    record: ChatRecord,
) -> Result<(), QuizError> {
    let collection = match chat.kind {
        ChatKind::Private => Collection::Private,
        ChatKind::Group => Collection::Groups,
        ChatKind::Channel => return Ok(()),
    };
    store.put(collection, record).await
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use teloxide::types::ChatId;

    use super::*;

    #[test]
    fn metadata_gains_key_and_data() {
        let record =
            ChatRecord::from_metadata(7, &json!({"id": 7, "type": "private", "first_name": "Ann"}))
                .unwrap();
        assert_eq!(record.key, "7");
        assert_eq!(record.data["key"], "7");
        assert_eq!(record.data["data"], json!([]));
        assert_eq!(record.data["first_name"], "Ann");
    }

    #[tokio::test]
    async fn users_are_stored_once() {
        let store = MemoryStore::new();
        let first = ChatRecord::new("1", json!({"first_name": "Ann"}));
        let renamed = ChatRecord::new("1", json!({"first_name": "Annie"}));

        assert!(remember_user(&store, first.clone()).await.unwrap());
        assert!(!remember_user(&store, renamed).await.unwrap());
        assert_eq!(store.get(Collection::Users, "1").await.unwrap(), Some(first));
    }

    #[tokio::test]
    async fn chats_go_to_their_collection() {
        let store = MemoryStore::new();
        let group = ChatRef::new(ChatId(-5), ChatKind::Group);
        let private = ChatRef::new(ChatId(5), ChatKind::Private);
        let channel = ChatRef::new(ChatId(-100), ChatKind::Channel);

        remember_chat(&store, group, ChatRecord::new("-5", json!({}))).await.unwrap();
        remember_chat(&store, group, ChatRecord::new("-5", json!({"title": "x"}))).await.unwrap();
        remember_chat(&store, private, ChatRecord::new("5", json!({}))).await.unwrap();
        remember_chat(&store, channel, ChatRecord::new("-100", json!({}))).await.unwrap();

        let groups = fetch_all(&store, Collection::Groups).await.unwrap();
        assert_eq!(groups, vec![ChatRecord::new("-5", json!({"title": "x"}))]);
        assert_eq!(fetch_all(&store, Collection::Private).await.unwrap().len(), 1);
        assert!(fetch_all(&store, Collection::Users).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn fetch_all_walks_every_page() {
        let store = MemoryStore::new();
        for id in 0..(PAGE_SIZE * 2 + 7) {
            store
                .put(Collection::Users, ChatRecord::new(format!("{id:05}"), json!({})))
                .await
                .unwrap();
        }
        let all = fetch_all(&store, Collection::Users).await.unwrap();
        assert_eq!(all.len(), PAGE_SIZE * 2 + 7);
        assert_eq!(all.first().unwrap().key, "00000");
        assert_eq!(all.last().unwrap().key, format!("{:05}", PAGE_SIZE * 2 + 6));
    }
}
