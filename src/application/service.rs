use rust_decimal::Decimal;
use tracing::{debug, info, warn};

use crate::domain::{Account, decode_account, encode_account, is_valid_account_id, seed_accounts};
use crate::storage::{ScanCursor, SqliteStore, StateStore};

use super::AppError;

/// Ledger service - the account operations over a state store.
///
/// The service keeps no state of its own: every call re-reads what it needs
/// from the store and performs its writes in a fixed order. Callers that run
/// operations concurrently must serialize writes to the same keys.
pub struct LedgerService<S = SqliteStore> {
    store: S,
}

/// Both accounts as written by a successful transfer.
#[derive(Debug, Clone)]
pub struct TransferReceipt {
    pub from: Account,
    pub to: Account,
    pub amount: Decimal,
}

impl LedgerService<SqliteStore> {
    /// Initialize a new database at the given path.
    pub async fn init(database_path: &str) -> Result<Self, AppError> {
        let db_url = format!("sqlite:{}?mode=rwc", database_path);
        let store = SqliteStore::init(&db_url).await?;
        Ok(Self::new(store))
    }

    /// Connect to an existing database.
    pub async fn connect(database_path: &str) -> Result<Self, AppError> {
        let db_url = format!("sqlite:{}", database_path);
        let store = SqliteStore::connect(&db_url).await?;
        Ok(Self::new(store))
    }
}

impl<S: StateStore> LedgerService<S> {
    /// Create a new ledger service over the given store.
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// The underlying store.
    pub fn store(&self) -> &S {
        &self.store
    }

    // ========================
    // Record helpers
    // ========================

    async fn write_account(&self, account: &Account) -> Result<(), AppError> {
        let bytes = encode_account(account).map_err(|source| AppError::Encoding {
            id: account.id.clone(),
            source,
        })?;
        self.store.put(&account.id, &bytes).await?;
        Ok(())
    }

    fn decode(key: &str, bytes: &[u8]) -> Result<Account, AppError> {
        decode_account(bytes).map_err(|source| AppError::Decoding {
            key: key.to_string(),
            source,
        })
    }

    // ========================
    // Account operations
    // ========================

    /// Write the seed accounts, replacing any records with the same ids.
    ///
    /// Writes are not rolled back if a later one fails.
    pub async fn initialize_ledger(&self) -> Result<usize, AppError> {
        let accounts = seed_accounts();
        for account in &accounts {
            self.write_account(account).await?;
        }
        info!(count = accounts.len(), "Ledger initialized with seed accounts");
        Ok(accounts.len())
    }

    /// Create a new account. Fails if the id is already taken.
    pub async fn create_account(
        &self,
        id: &str,
        owner: &str,
        balance: Decimal,
    ) -> Result<Account, AppError> {
        if !is_valid_account_id(id) {
            return Err(AppError::InvalidAccountId(id.to_string()));
        }
        if self.account_exists(id).await? {
            return Err(AppError::AccountAlreadyExists(id.to_string()));
        }

        let account = Account::new(id, owner, balance);
        self.write_account(&account).await?;
        info!(id, owner, %balance, "Account created");
        Ok(account)
    }

    /// Get an account by id.
    pub async fn read_account(&self, id: &str) -> Result<Account, AppError> {
        debug!(id, "Reading account");
        let bytes = self
            .store
            .get(id)
            .await?
            .ok_or_else(|| AppError::AccountNotFound(id.to_string()))?;
        Self::decode(id, &bytes)
    }

    /// Replace the owner and balance of an existing account.
    pub async fn update_account(
        &self,
        id: &str,
        owner: &str,
        balance: Decimal,
    ) -> Result<Account, AppError> {
        if !self.account_exists(id).await? {
            return Err(AppError::AccountNotFound(id.to_string()));
        }

        let account = Account::new(id, owner, balance);
        self.write_account(&account).await?;
        info!(id, owner, %balance, "Account updated");
        Ok(account)
    }

    /// Delete an existing account.
    pub async fn delete_account(&self, id: &str) -> Result<(), AppError> {
        if !self.account_exists(id).await? {
            return Err(AppError::AccountNotFound(id.to_string()));
        }

        self.store.delete(id).await?;
        info!(id, "Account deleted");
        Ok(())
    }

    /// Returns true if a record is stored under `id`. The record is not decoded.
    pub async fn account_exists(&self, id: &str) -> Result<bool, AppError> {
        Ok(self.store.get(id).await?.is_some())
    }

    /// List every account in the store's key order.
    ///
    /// A single undecodable record fails the whole listing.
    pub async fn list_accounts(&self) -> Result<Vec<Account>, AppError> {
        let mut cursor = self.store.scan("", "").await?;
        let collected = Self::collect_accounts(&mut cursor).await;
        let closed = cursor.close().await;

        let accounts = collected?;
        closed?;
        debug!(count = accounts.len(), "Listed accounts");
        Ok(accounts)
    }

    async fn collect_accounts(cursor: &mut S::Cursor) -> Result<Vec<Account>, AppError> {
        let mut accounts = Vec::new();
        while let Some((key, bytes)) = cursor.next_entry().await? {
            accounts.push(Self::decode(&key, &bytes)?);
        }
        Ok(accounts)
    }

    // ========================
    // Transfer operations
    // ========================

    /// Move `amount` from one account to another.
    ///
    /// Every check happens before the first write. The source account is
    /// written first, then the destination.
    pub async fn transfer_funds(
        &self,
        from_id: &str,
        to_id: &str,
        amount: Decimal,
    ) -> Result<TransferReceipt, AppError> {
        if amount <= Decimal::ZERO {
            return Err(AppError::InvalidAmount(format!(
                "transfer amount must be positive, got {}",
                amount
            )));
        }
        if from_id == to_id {
            return Err(AppError::SelfTransfer(from_id.to_string()));
        }

        let mut from = self.read_account(from_id).await?;
        let mut to = self.read_account(to_id).await?;

        if from.balance < amount {
            warn!(from_id, balance = %from.balance, %amount, "Transfer rejected: insufficient funds");
            return Err(AppError::InsufficientFunds {
                account_id: from_id.to_string(),
                balance: from.balance,
                required: amount,
            });
        }

        from.balance = from
            .balance
            .checked_sub(amount)
            .ok_or_else(|| AppError::InvalidAmount(format!("{} overflows {}", amount, from_id)))?;
        to.balance = to
            .balance
            .checked_add(amount)
            .ok_or_else(|| AppError::InvalidAmount(format!("{} overflows {}", amount, to_id)))?;

        self.write_account(&from).await?;
        self.write_account(&to).await?;

        info!(from_id, to_id, %amount, "Funds transferred");
        Ok(TransferReceipt { from, to, amount })
    }
}
