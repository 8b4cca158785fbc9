use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

pub type AccountId = String;

/// An account as persisted in the store, keyed by its `id`.
///
/// Field names on the wire are `ID`, `Owner` and `Balance`; the balance is
/// written as a JSON number carrying every decimal digit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    #[serde(rename = "ID")]
    pub id: AccountId,
    #[serde(rename = "Owner")]
    pub owner: String,
    /// Signed currency units. Only transfers require it to cover the amount moved.
    #[serde(rename = "Balance", with = "rust_decimal::serde::arbitrary_precision")]
    pub balance: Decimal,
}

impl Account {
    pub fn new(id: impl Into<AccountId>, owner: impl Into<String>, balance: Decimal) -> Self {
        Self {
            id: id.into(),
            owner: owner.into(),
            balance,
        }
    }
}

/// Returns true if `id` can be used as a store key for a new account.
pub fn is_valid_account_id(id: &str) -> bool {
    !id.trim().is_empty()
}

/// The fixed set of accounts written by ledger initialization.
pub fn seed_accounts() -> Vec<Account> {
    [
        ("account1", "Tomoko", 1000),
        ("account2", "Brad", 2000),
        ("account3", "Jin Soo", 3000),
        ("account4", "Max", 4000),
        ("account5", "Adriana", 5000),
        ("account6", "Michel", 6000),
    ]
    .into_iter()
    .map(|(id, owner, balance)| Account::new(id, owner, Decimal::from(balance)))
    .collect()
}
