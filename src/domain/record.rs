//! Byte encoding of account records.
//!
//! Records carry no version tag. Unknown fields are ignored when decoding, so
//! fields can be added later without rewriting existing records.

use super::Account;

/// Encode an account into the bytes stored under its id.
pub fn encode_account(account: &Account) -> Result<Vec<u8>, serde_json::Error> {
    serde_json::to_vec(account)
}

/// Decode stored bytes into an account.
pub fn decode_account(bytes: &[u8]) -> Result<Account, serde_json::Error> {
    serde_json::from_slice(bytes)
}
