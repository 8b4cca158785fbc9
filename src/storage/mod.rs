mod memory;
mod sqlite;

use std::future::Future;

use anyhow::Result;

pub use memory::*;
pub use sqlite::*;

/// SQL migration for the key-value state table
pub const MIGRATION_001_INITIAL: &str = include_str!("migrations/001_initial.sql");

/// A durable key-value store holding the world state.
///
/// Every individual `put` or `delete` is atomic. Reads observe earlier writes
/// made through the same handle. A missing key is `Ok(None)`, never an error.
pub trait StateStore {
    type Cursor: ScanCursor;

    /// Read the value stored under `key`.
    fn get(&self, key: &str) -> impl Future<Output = Result<Option<Vec<u8>>>> + Send;

    /// Insert or overwrite the value stored under `key`.
    fn put(&self, key: &str, value: &[u8]) -> impl Future<Output = Result<()>> + Send;

    /// Remove `key`. Removing a missing key is not an error.
    fn delete(&self, key: &str) -> impl Future<Output = Result<()>> + Send;

    /// Open a cursor over the keys in `[start, end)`.
    /// An empty `start` or `end` leaves that side of the range unbounded.
    fn scan(&self, start: &str, end: &str) -> impl Future<Output = Result<Self::Cursor>> + Send;
}

/// A range scan over a [`StateStore`].
///
/// A cursor holds store resources until it is closed or dropped.
pub trait ScanCursor: Send {
    /// Fetch the next `(key, value)` pair, or `None` once the range is exhausted.
    fn next_entry(&mut self) -> impl Future<Output = Result<Option<(String, Vec<u8>)>>> + Send;

    /// Release the cursor.
    fn close(self) -> impl Future<Output = Result<()>> + Send;
}
