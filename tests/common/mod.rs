// Allow dead_code because these helpers are used across different test files
// which are compiled separately
#![allow(dead_code)]

use account_ledger::MemoryStore;
use account_ledger::application::LedgerService;
use anyhow::Result;
use rust_decimal::Decimal;
use tempfile::TempDir;

/// Helper to create a test service with a temporary database
pub async fn test_service() -> Result<(LedgerService, TempDir)> {
    let temp_dir = TempDir::new()?;
    let db_path = temp_dir.path().join("test.db");
    let service = LedgerService::init(db_path.to_str().unwrap()).await?;
    Ok((service, temp_dir))
}

/// Helper to create a test service with the seed accounts already written
pub async fn seeded_service() -> Result<(LedgerService, TempDir)> {
    let (service, temp_dir) = test_service().await?;
    service.initialize_ledger().await?;
    Ok((service, temp_dir))
}

/// Helper to create a service over an in-memory store.
/// The returned store shares state with the one owned by the service.
pub fn memory_service() -> (LedgerService<MemoryStore>, MemoryStore) {
    let store = MemoryStore::new();
    (LedgerService::new(store.clone()), store)
}

/// Fetch the balance of an account, failing the test if it can't be read
pub async fn balance_of<S: account_ledger::StateStore>(
    service: &LedgerService<S>,
    id: &str,
) -> Result<Decimal> {
    Ok(service.read_account(id).await?.balance)
}
