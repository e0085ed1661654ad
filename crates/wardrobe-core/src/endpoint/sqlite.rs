//! SQLite-backed endpoint store.
//!
//! Holds the `api_config` table shared by every process that analyzes
//! images. Usage increments are a single `UPDATE ... + 1` statement, so
//! concurrent writers never lose counts. All database work runs on the
//! blocking thread pool.

use super::store::EndpointStore;
use crate::error::StoreError;
use crate::types::{Capability, EndpointConfig, NewEndpoint};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection};
use std::path::Path;
use std::sync::{Arc, Mutex};

const CREATE_TABLE_SQL: &str = "CREATE TABLE IF NOT EXISTS api_config (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    api_base TEXT NOT NULL,
    api_key TEXT NOT NULL,
    api_type TEXT NOT NULL,
    model TEXT,
    usage_count INTEGER NOT NULL DEFAULT 0,
    del_flag INTEGER NOT NULL DEFAULT 0,
    created_at TEXT NOT NULL
)";

const SELECT_COLUMNS: &str =
    "SELECT id, api_base, api_key, api_type, model, usage_count, del_flag, created_at FROM api_config";

/// Raw column values, converted to `EndpointConfig` outside the row closure.
type EndpointRow = (i64, String, String, String, Option<String>, i64, i64, String);

/// Endpoint store persisted in a SQLite file.
#[derive(Clone)]
pub struct SqliteEndpointStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteEndpointStore {
    /// Open (or create) the store at `path`, creating parent directories.
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                StoreError::Task(format!("Failed to create store directory: {e}"))
            })?;
        }
        let conn = Connection::open(path)?;
        Self::init(conn)
    }

    /// Open a private in-memory database.
    pub fn open_in_memory() -> Result<Self, StoreError> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(conn: Connection) -> Result<Self, StoreError> {
        conn.execute(CREATE_TABLE_SQL, [])?;
        conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_api_config_type ON api_config(api_type, del_flag)",
            [],
        )?;
        tracing::debug!("Endpoint store initialized");
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Register a new endpoint and return its id.
    pub async fn insert(&self, endpoint: NewEndpoint) -> Result<i64, StoreError> {
        self.with_conn(move |conn| {
            conn.execute(
                "INSERT INTO api_config (api_base, api_key, api_type, model, usage_count, del_flag, created_at)
                 VALUES (?1, ?2, ?3, ?4, 0, 0, ?5)",
                params![
                    endpoint.api_base,
                    endpoint.api_key,
                    endpoint.capability.as_str(),
                    endpoint.model,
                    Utc::now().to_rfc3339(),
                ],
            )?;
            Ok(conn.last_insert_rowid())
        })
        .await
    }

    /// Soft-delete an endpoint. Returns false if no active endpoint had the id.
    pub async fn soft_delete(&self, id: i64) -> Result<bool, StoreError> {
        self.with_conn(move |conn| {
            let changed = conn.execute(
                "UPDATE api_config SET del_flag = 1 WHERE id = ?1 AND del_flag = 0",
                params![id],
            )?;
            Ok(changed > 0)
        })
        .await
    }

    /// Every endpoint, deleted ones included, in id order.
    pub async fn list_all(&self) -> Result<Vec<EndpointConfig>, StoreError> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(&format!("{SELECT_COLUMNS} ORDER BY id ASC"))?;
            let rows = stmt
                .query_map([], read_row)?
                .collect::<Result<Vec<_>, _>>()?;
            rows.into_iter().map(into_endpoint).collect()
        })
        .await
    }

    /// Run a closure against the connection on the blocking pool.
    async fn with_conn<T, F>(&self, f: F) -> Result<T, StoreError>
    where
        T: Send + 'static,
        F: FnOnce(&Connection) -> Result<T, StoreError> + Send + 'static,
    {
        let conn = self.conn.clone();
        tokio::task::spawn_blocking(move || {
            let conn = conn
                .lock()
                .map_err(|e| StoreError::Task(format!("Connection lock poisoned: {e}")))?;
            f(&conn)
        })
        .await
        .map_err(|e| StoreError::Task(format!("Task join error: {e}")))?
    }
}

fn read_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<EndpointRow> {
    Ok((
        row.get(0)?,
        row.get(1)?,
        row.get(2)?,
        row.get(3)?,
        row.get(4)?,
        row.get(5)?,
        row.get(6)?,
        row.get(7)?,
    ))
}

fn into_endpoint(row: EndpointRow) -> Result<EndpointConfig, StoreError> {
    let (id, api_base, api_key, api_type, model, usage_count, del_flag, created_at) = row;
    let capability: Capability = api_type
        .parse()
        .map_err(|e: String| StoreError::InvalidRow(format!("id {id}: {e}")))?;
    let created_at = DateTime::parse_from_rfc3339(&created_at)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|e| StoreError::InvalidRow(format!("id {id}: bad created_at: {e}")))?;

    Ok(EndpointConfig {
        id,
        capability,
        api_base,
        api_key,
        model: model.filter(|m| !m.trim().is_empty()),
        usage_count: usage_count.max(0) as u64,
        deleted: del_flag != 0,
        created_at,
    })
}

#[async_trait]
impl EndpointStore for SqliteEndpointStore {
    async fn list_active(
        &self,
        capability: Capability,
    ) -> Result<Vec<EndpointConfig>, StoreError> {
        self.with_conn(move |conn| {
            let mut stmt = conn.prepare(&format!(
                "{SELECT_COLUMNS} WHERE del_flag = 0 AND api_type = ?1 ORDER BY usage_count ASC, id ASC"
            ))?;
            let rows = stmt
                .query_map(params![capability.as_str()], read_row)?
                .collect::<Result<Vec<_>, _>>()?;
            rows.into_iter().map(into_endpoint).collect()
        })
        .await
    }

    async fn increment_usage(&self, id: i64) -> Result<bool, StoreError> {
        self.with_conn(move |conn| {
            let changed = conn.execute(
                "UPDATE api_config SET usage_count = usage_count + 1 WHERE id = ?1 AND del_flag = 0",
                params![id],
            )?;
            Ok(changed > 0)
        })
        .await
    }
}
