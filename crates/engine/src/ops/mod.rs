use sea_orm::DatabaseConnection;

use crate::{EngineError, ResultEngine};

mod access;
mod accounts;
mod balances;
mod categories;
mod statistics;
mod transactions;

pub use statistics::{CategoryStatistic, MonthlyStatistics, TransactionStatistics};
pub use transactions::{
    BulkResult, DEFAULT_PAGE_SIZE, MAX_BATCH_CREATE, MAX_BATCH_DELETE, MAX_PAGE_SIZE, SortField,
    SortOrder, TransactionListFilter, TransactionPage,
};

/// Run a block inside a DB transaction, committing on success and rolling back on error.
///
/// Raw database errors leaving the block are tagged with the operation name.
macro_rules! with_tx {
    ($self:expr, $op:literal, |$tx:ident| $body:expr) => {{
        let result = async {
            let $tx = $self.database.begin().await?;
            let value = match $body {
                Ok(value) => value,
                Err(err) => return Err(err),
            };
            $tx.commit().await?;
            Ok::<_, $crate::EngineError>(value)
        }
        .await;
        result.map_err(|err| err.during($op))
    }};
}

pub(crate) use with_tx;

/// The ledger engine.
///
/// Every write path runs in a single database transaction: reference checks,
/// the transaction row and the balance postings commit or roll back together.
#[derive(Debug)]
pub struct Engine {
    database: DatabaseConnection,
}

impl Engine {
    /// Return a builder for `Engine`. Help to build the struct.
    pub fn builder() -> EngineBuilder {
        EngineBuilder::default()
    }
}

fn normalize_required_name(value: &str, label: &str, max_len: usize) -> ResultEngine<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(EngineError::Validation(format!(
            "{label} name must not be empty"
        )));
    }
    if trimmed.chars().count() > max_len {
        return Err(EngineError::Validation(format!(
            "{label} name must be at most {max_len} characters"
        )));
    }
    Ok(trimmed.to_string())
}

fn normalize_optional_text(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(ToString::to_string)
}

/// The builder for `Engine`
#[derive(Default)]
pub struct EngineBuilder {
    database: DatabaseConnection,
}

impl EngineBuilder {
    /// Pass the required database
    pub fn database(mut self, db: DatabaseConnection) -> EngineBuilder {
        self.database = db;
        self
    }

    /// Construct `Engine`
    pub async fn build(self) -> ResultEngine<Engine> {
        Ok(Engine {
            database: self.database,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn required_names_are_trimmed_and_bounded() {
        assert_eq!(
            normalize_required_name("  Cash ", "account", 100).unwrap(),
            "Cash"
        );
        assert!(normalize_required_name("   ", "account", 100).is_err());
        assert!(normalize_required_name(&"x".repeat(51), "category", 50).is_err());
    }

    #[test]
    fn optional_text_drops_blanks() {
        assert_eq!(normalize_optional_text(Some("  ")), None);
        assert_eq!(normalize_optional_text(Some(" red ")), Some("red".to_string()));
        assert_eq!(normalize_optional_text(None), None);
    }
}
