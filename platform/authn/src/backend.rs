use std::{
    collections::HashMap,
    sync::{Mutex, PoisonError},
};

use anyhow::Context;
use async_trait::async_trait;
use chrono::Utc;
use entity::session_entries;
use sea_orm::{
    ActiveValue::Set, Database, DatabaseConnection, EntityTrait, sea_query::OnConflict,
};

/// Durable key/value storage for session entries.
#[async_trait]
pub trait SessionBackend: Send + Sync {
    async fn load(&self) -> anyhow::Result<HashMap<String, String>>;

    async fn put(&self, key: &str, value: &str) -> anyhow::Result<()>;

    async fn remove(&self, key: &str) -> anyhow::Result<()>;
}

#[derive(Debug, Default)]
pub struct MemorySessionBackend {
    entries: Mutex<HashMap<String, String>>,
}

impl MemorySessionBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_entries<I, K, V>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            entries: Mutex::new(
                entries
                    .into_iter()
                    .map(|(key, value)| (key.into(), value.into()))
                    .collect(),
            ),
        }
    }

    pub fn entries(&self) -> HashMap<String, String> {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

#[async_trait]
impl SessionBackend for MemorySessionBackend {
    async fn load(&self) -> anyhow::Result<HashMap<String, String>> {
        Ok(self.entries())
    }

    async fn put(&self, key: &str, value: &str) -> anyhow::Result<()> {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key.to_owned(), value.to_owned());
        Ok(())
    }

    async fn remove(&self, key: &str) -> anyhow::Result<()> {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(key);
        Ok(())
    }
}

/// Session entries kept in the `session_entries` table.
#[derive(Clone, Debug)]
pub struct DbSessionBackend {
    db: DatabaseConnection,
}

impl DbSessionBackend {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    pub async fn connect(url: &str) -> anyhow::Result<Self> {
        let db = Database::connect(url)
            .await
            .with_context(|| format!("failed to open session database {url}"))?;
        Ok(Self::new(db))
    }

    pub fn connection(&self) -> &DatabaseConnection {
        &self.db
    }
}

#[async_trait]
impl SessionBackend for DbSessionBackend {
    async fn load(&self) -> anyhow::Result<HashMap<String, String>> {
        let rows = session_entries::Entity::find().all(&self.db).await?;
        Ok(rows.into_iter().map(|row| (row.key, row.value)).collect())
    }

    async fn put(&self, key: &str, value: &str) -> anyhow::Result<()> {
        let model = session_entries::ActiveModel {
            key: Set(key.to_owned()),
            value: Set(value.to_owned()),
            updated_at: Set(Utc::now()),
        };
        session_entries::Entity::insert(model)
            .on_conflict(
                OnConflict::column(session_entries::Column::Key)
                    .update_columns([
                        session_entries::Column::Value,
                        session_entries::Column::UpdatedAt,
                    ])
                    .to_owned(),
            )
            .exec_without_returning(&self.db)
            .await?;
        Ok(())
    }

    async fn remove(&self, key: &str) -> anyhow::Result<()> {
        session_entries::Entity::delete_by_id(key.to_owned())
            .exec(&self.db)
            .await?;
        Ok(())
    }
}
