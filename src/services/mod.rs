pub mod budgets;
pub mod cashback;
pub mod error;
pub mod ledger;
pub mod seed_data;
pub mod splits;

pub use error::ServiceError;
