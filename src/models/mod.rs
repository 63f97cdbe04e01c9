//! Shared types: currency, merchant/budget categories and the transaction
//! ledger types. Use chrono types for timestamps and dates.

pub mod category;
pub mod currency;
pub mod transaction;

pub use category::Category;
pub use currency::Currency;
pub use transaction::{Transaction, TransactionMetadata, TransactionStatus, TransactionType};
