mod account;
mod record;

pub use account::*;
pub use record::*;
