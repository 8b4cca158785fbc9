// Application layer - the ledger operations over an injected state store.

pub mod error;
pub mod service;

pub use error::*;
pub use service::*;
