use std::collections::{BTreeMap, VecDeque};
use std::ops::Bound;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use anyhow::{Result, anyhow, bail};

use super::{ScanCursor, StateStore};

/// In-memory world state, ordered by key.
///
/// Clones share the same state, so a caller can keep a handle for inspection
/// after moving another one into a service. Reads and writes can be made to
/// fail on demand, and open scans are counted.
#[derive(Clone, Default)]
pub struct MemoryStore {
    inner: Arc<Inner>,
}

#[derive(Default)]
struct Inner {
    entries: Mutex<BTreeMap<String, Vec<u8>>>,
    fail_reads: AtomicBool,
    fail_writes: AtomicBool,
    /// Remaining reads allowed before every read fails. `None` means unlimited.
    read_budget: Mutex<Option<usize>>,
    /// Remaining writes allowed before every write fails. `None` means unlimited.
    write_budget: Mutex<Option<usize>>,
    writes: AtomicUsize,
    open_scans: AtomicUsize,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every read (`get` and scan iteration) fail.
    pub fn fail_reads(&self, fail: bool) {
        self.inner.fail_reads.store(fail, Ordering::SeqCst);
    }

    /// Make every write (`put` and `delete`) fail.
    pub fn fail_writes(&self, fail: bool) {
        self.inner.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Allow `count` more reads to succeed, then fail the rest.
    /// Opening a scan and fetching each entry count as one read.
    pub fn fail_reads_after(&self, count: usize) -> Result<()> {
        *lock(&self.inner.read_budget)? = Some(count);
        Ok(())
    }

    /// Allow `count` more writes to succeed, then fail the rest.
    pub fn fail_writes_after(&self, count: usize) -> Result<()> {
        *lock(&self.inner.write_budget)? = Some(count);
        Ok(())
    }

    /// Number of successful writes since creation.
    pub fn write_count(&self) -> usize {
        self.inner.writes.load(Ordering::SeqCst)
    }

    /// Number of cursors opened and not yet released.
    pub fn open_scans(&self) -> usize {
        self.inner.open_scans.load(Ordering::SeqCst)
    }

    pub fn len(&self) -> Result<usize> {
        Ok(lock(&self.inner.entries)?.len())
    }

    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }

    fn check_read(&self) -> Result<()> {
        self.inner.check_read()
    }

    fn check_write(&self) -> Result<()> {
        if self.inner.fail_writes.load(Ordering::SeqCst) {
            bail!("write rejected by memory store");
        }
        let mut budget = lock(&self.inner.write_budget)?;
        if let Some(remaining) = budget.as_mut() {
            if *remaining == 0 {
                bail!("write budget of memory store exhausted");
            }
            *remaining -= 1;
        }
        Ok(())
    }
}

impl Inner {
    fn check_read(&self) -> Result<()> {
        if self.fail_reads.load(Ordering::SeqCst) {
            bail!("read rejected by memory store");
        }
        let mut budget = lock(&self.read_budget)?;
        if let Some(remaining) = budget.as_mut() {
            if *remaining == 0 {
                bail!("read budget of memory store exhausted");
            }
            *remaining -= 1;
        }
        Ok(())
    }
}

fn lock<T>(mutex: &Mutex<T>) -> Result<MutexGuard<'_, T>> {
    mutex
        .lock()
        .map_err(|_| anyhow!("memory store lock poisoned"))
}

impl StateStore for MemoryStore {
    type Cursor = MemoryCursor;

    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        self.check_read()?;
        Ok(lock(&self.inner.entries)?.get(key).cloned())
    }

    async fn put(&self, key: &str, value: &[u8]) -> Result<()> {
        self.check_write()?;
        lock(&self.inner.entries)?.insert(key.to_string(), value.to_vec());
        self.inner.writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<()> {
        self.check_write()?;
        lock(&self.inner.entries)?.remove(key);
        self.inner.writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn scan(&self, start: &str, end: &str) -> Result<MemoryCursor> {
        self.check_read()?;

        let lower = match start {
            "" => Bound::Unbounded,
            start => Bound::Included(start),
        };
        let upper = match end {
            "" => Bound::Unbounded,
            end => Bound::Excluded(end),
        };

        // BTreeMap::range panics on inverted bounds
        let entries = if !start.is_empty() && !end.is_empty() && start >= end {
            VecDeque::new()
        } else {
            lock(&self.inner.entries)?
                .range::<str, _>((lower, upper))
                .map(|(key, value)| (key.clone(), value.clone()))
                .collect()
        };

        self.inner.open_scans.fetch_add(1, Ordering::SeqCst);
        Ok(MemoryCursor {
            store: Arc::clone(&self.inner),
            entries,
            released: false,
        })
    }
}

/// Snapshot of a key range taken when the scan was opened.
pub struct MemoryCursor {
    store: Arc<Inner>,
    entries: VecDeque<(String, Vec<u8>)>,
    released: bool,
}

impl MemoryCursor {
    fn release(&mut self) {
        if !self.released {
            self.released = true;
            self.store.open_scans.fetch_sub(1, Ordering::SeqCst);
        }
    }
}

impl ScanCursor for MemoryCursor {
    async fn next_entry(&mut self) -> Result<Option<(String, Vec<u8>)>> {
        self.store.check_read()?;
        Ok(self.entries.pop_front())
    }

    async fn close(mut self) -> Result<()> {
        self.release();
        Ok(())
    }
}

impl Drop for MemoryCursor {
    fn drop(&mut self) {
        self.release();
    }
}
