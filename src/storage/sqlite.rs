use std::collections::VecDeque;

use anyhow::{Context, Result};
use sqlx::pool::PoolConnection;
use sqlx::{Row, Sqlite, SqlitePool};

use super::{MIGRATION_001_INITIAL, ScanCursor, StateStore};

/// Number of rows fetched per round trip while scanning.
const SCAN_PAGE_SIZE: i64 = 128;

/// World state persisted in a single SQLite table.
#[derive(Clone)]
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    /// Create a new store with the given SQLite connection pool.
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Connect to a SQLite database at the given URL.
    pub async fn connect(database_url: &str) -> Result<Self> {
        let pool = SqlitePool::connect(database_url)
            .await
            .context("Failed to connect to database")?;
        Ok(Self::new(pool))
    }

    /// Run database migrations.
    pub async fn migrate(&self) -> Result<()> {
        sqlx::query(MIGRATION_001_INITIAL)
            .execute(&self.pool)
            .await
            .context("Failed to run migration 001")?;
        Ok(())
    }

    /// Initialize a new database (connect + migrate).
    pub async fn init(database_url: &str) -> Result<Self> {
        let store = Self::connect(database_url).await?;
        store.migrate().await?;
        Ok(store)
    }
}

impl StateStore for SqliteStore {
    type Cursor = SqliteCursor;

    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        let row = sqlx::query("SELECT value FROM state WHERE key = ?")
            .bind(key)
            .fetch_optional(&self.pool)
            .await
            .with_context(|| format!("Failed to read {} from world state", key))?;

        Ok(row.map(|row| row.get("value")))
    }

    async fn put(&self, key: &str, value: &[u8]) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO state (key, value)
            VALUES (?, ?)
            ON CONFLICT(key) DO UPDATE SET value = excluded.value
            "#,
        )
        .bind(key)
        .bind(value)
        .execute(&self.pool)
        .await
        .with_context(|| format!("Failed to put {} to world state", key))?;
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<()> {
        sqlx::query("DELETE FROM state WHERE key = ?")
            .bind(key)
            .execute(&self.pool)
            .await
            .with_context(|| format!("Failed to delete {} from world state", key))?;
        Ok(())
    }

    async fn scan(&self, start: &str, end: &str) -> Result<SqliteCursor> {
        let conn = self
            .pool
            .acquire()
            .await
            .context("Failed to acquire connection for range scan")?;

        Ok(SqliteCursor {
            conn,
            start: start.to_string(),
            end: end.to_string(),
            after: None,
            buffer: VecDeque::new(),
            exhausted: false,
        })
    }
}

/// Range scan over the state table.
///
/// Holds a pooled connection for its whole lifetime and walks the range in
/// key order, one page at a time. The connection goes back to the pool when
/// the cursor is closed or dropped.
pub struct SqliteCursor {
    conn: PoolConnection<Sqlite>,
    start: String,
    end: String,
    /// Last key handed out, pages resume strictly after it.
    after: Option<String>,
    buffer: VecDeque<(String, Vec<u8>)>,
    exhausted: bool,
}

impl SqliteCursor {
    async fn fetch_page(&mut self) -> Result<()> {
        let rows = sqlx::query(
            r#"
            SELECT key, value FROM state
            WHERE key >= ?
              AND (? = '' OR key < ?)
              AND (? IS NULL OR key > ?)
            ORDER BY key
            LIMIT ?
            "#,
        )
        .bind(&self.start)
        .bind(&self.end)
        .bind(&self.end)
        .bind(self.after.as_deref())
        .bind(self.after.as_deref())
        .bind(SCAN_PAGE_SIZE)
        .fetch_all(&mut *self.conn)
        .await
        .context("Failed to scan world state")?;

        if (rows.len() as i64) < SCAN_PAGE_SIZE {
            self.exhausted = true;
        }

        for row in rows {
            self.buffer.push_back((row.get("key"), row.get("value")));
        }
        if let Some((key, _)) = self.buffer.back() {
            self.after = Some(key.clone());
        }
        Ok(())
    }
}

impl ScanCursor for SqliteCursor {
    async fn next_entry(&mut self) -> Result<Option<(String, Vec<u8>)>> {
        if self.buffer.is_empty() && !self.exhausted {
            self.fetch_page().await?;
        }
        Ok(self.buffer.pop_front())
    }

    async fn close(self) -> Result<()> {
        drop(self.conn);
        Ok(())
    }
}
