//! Ledger engine for personal finance tracking.
//!
//! The engine owns accounts, categories and transactions, posts every
//! transaction to the balances of the accounts it references and aggregates
//! statistics over the history. All operations take the id of an already
//! authenticated user and only ever touch data that user may see.

pub use accounts::{Account, AccountType, BalanceSummary};
pub use categories::{Category, CategoryType};
pub use commands::{
    AccountPatch, CategoryPatch, MAX_AMOUNT_MINOR, NewAccount, NewCategory, NewTransaction,
    TransactionPatch,
};
pub use currency::Currency;
pub use error::EngineError;
pub use money::Money;
pub use ops::{
    BulkResult, CategoryStatistic, DEFAULT_PAGE_SIZE, Engine, EngineBuilder, MAX_BATCH_CREATE,
    MAX_BATCH_DELETE, MAX_PAGE_SIZE, MonthlyStatistics, SortField, SortOrder,
    TransactionListFilter, TransactionPage, TransactionStatistics,
};
pub use transactions::{Transaction, TransactionDetail, TransactionKind};

mod accounts;
mod categories;
mod commands;
mod currency;
mod error;
mod money;
mod ops;
mod transactions;

type ResultEngine<T> = Result<T, EngineError>;
