use std::borrow::Cow;

use async_trait::async_trait;
use sqlx::postgres::PgPool;
use tracing::info;

use crate::error::QuizError;

use super::{ChatRecord, ChatStore, Collection, Page, PAGE_SIZE};

/// Postgres-backed chat store.
pub struct Connection {
    pool: PgPool,
}

impl Connection {
    pub async fn connect(connection_string: Cow<'_, str>) -> Result<Self, QuizError> {
        let pool = PgPool::connect(&connection_string).await?;
        Ok(Self { pool })
    }

    pub async fn run_migrations(&self) -> Result<(), QuizError> {
        sqlx::migrate!().run(&self.pool).await?;
        info!("database migrations applied");
        Ok(())
    }
}

fn decode(key: String, data: String) -> Result<ChatRecord, QuizError> {
    Ok(ChatRecord::new(key, serde_json::from_str(&data)?))
}

#[async_trait]
impl ChatStore for Connection {
    async fn get(&self, collection: Collection, key: &str) -> Result<Option<ChatRecord>, QuizError> {
        let row: Option<(String, String)> =
            sqlx::query_as("SELECT key, data FROM chat_records WHERE collection = $1 AND key = $2")
                .bind(collection.name())
                .bind(key)
                .fetch_optional(&self.pool)
                .await?;

        row.map(|(key, data)| decode(key, data)).transpose()
    }

    async fn put(&self, collection: Collection, record: ChatRecord) -> Result<(), QuizError> {
        sqlx::query(
            "INSERT INTO chat_records (collection, key, data) VALUES ($1, $2, $3) \
             ON CONFLICT (collection, key) DO UPDATE SET data = EXCLUDED.data",
        )
        .bind(collection.name())
        .bind(&record.key)
        .bind(serde_json::to_string(&record.data)?)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn fetch(&self, collection: Collection, last: Option<&str>) -> Result<Page, QuizError> {
        let rows: Vec<(String, String)> = sqlx::query_as(
            "SELECT key, data FROM chat_records \
             WHERE collection = $1 AND ($2::TEXT IS NULL OR key > $2) \
             ORDER BY key LIMIT $3",
        )
        .bind(collection.name())
        .bind(last)
        .bind((PAGE_SIZE + 1) as i64)
        .fetch_all(&self.pool)
        .await?;

        let more = rows.len() > PAGE_SIZE;
        let items = rows
            .into_iter()
            .take(PAGE_SIZE)
            .map(|(key, data)| decode(key, data))
            .collect::<Result<Vec<_>, _>>()?;
        let last = if more {
            items.last().map(|record| record.key.clone())
        } else {
            None
        };
        Ok(Page { items, last })
    }
}
