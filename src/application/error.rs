use rust_decimal::Decimal;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Account not found: {0}")]
    AccountNotFound(String),

    #[error("Account already exists: {0}")]
    AccountAlreadyExists(String),

    #[error("Invalid account id: {0:?}")]
    InvalidAccountId(String),

    #[error("Insufficient funds in account {account_id}: balance {balance}, required {required}")]
    InsufficientFunds {
        account_id: String,
        balance: Decimal,
        required: Decimal,
    },

    #[error("Invalid amount: {0}")]
    InvalidAmount(String),

    #[error("Cannot transfer from account {0} to itself")]
    SelfTransfer(String),

    #[error("Failed to encode account {id}")]
    Encoding {
        id: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Failed to decode account record {key}")]
    Decoding {
        key: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Store error: {0:#}")]
    Store(#[from] anyhow::Error),
}
