//! # qwallet-core
//! Foundation types, the currency catalog, and the randomness/clock/oracle
//! seams shared by the qwallet crates.

pub mod amount;
pub mod catalog;
pub mod clock;
pub mod constants;
pub mod error;
pub mod rng;
pub mod traits;
pub mod types;

pub use catalog::{CurrencyCatalog, CurrencyEntry};
pub use error::{BalanceError, CatalogError, OracleError};
pub use traits::{BalanceOracle, Clock, RandomSource};
pub use types::{BalanceSnapshot, CurrencyCode, Trend, WalletIdentity};
