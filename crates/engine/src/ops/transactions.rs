//! Transaction operations.
//!
//! Writes validate the request, check that every reference belongs to the
//! caller, write the row and post balance changes in one database
//! transaction. Reads resolve category and account references for display.

mod batch;
mod detail;
mod list;
mod write;

pub use batch::{BulkResult, MAX_BATCH_CREATE, MAX_BATCH_DELETE};
pub(crate) use list::ApplyTxFilters;
pub use list::{
    DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE, SortField, SortOrder, TransactionListFilter,
    TransactionPage,
};
