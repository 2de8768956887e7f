use serde::{Deserialize, Serialize};
use sea_orm::TransactionTrait;

use crate::{EngineError, NewTransaction, ResultEngine};

use crate::ops::{Engine, with_tx};

pub const MAX_BATCH_CREATE: usize = 100;
pub const MAX_BATCH_DELETE: usize = 1000;

/// Outcome of a batch operation.
///
/// Items are processed independently: each one commits or rolls back on its
/// own, and failures are reported as `"item {index}: {reason}"` with the
/// 0-based index of the input.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BulkResult {
    pub success_count: usize,
    pub failure_count: usize,
    pub errors: Vec<String>,
}

impl BulkResult {
    fn record(&mut self, index: usize, outcome: ResultEngine<()>) {
        match outcome {
            Ok(()) => self.success_count += 1,
            Err(err) => {
                tracing::debug!(index, error = %err, "batch item failed");
                self.failure_count += 1;
                self.errors.push(format!("item {index}: {err}"));
            }
        }
    }
}

fn check_batch_len(len: usize, max: usize) -> ResultEngine<()> {
    if len == 0 || len > max {
        return Err(EngineError::Validation(format!(
            "batch must contain between 1 and {max} items"
        )));
    }
    Ok(())
}

impl Engine {
    /// Creates each transaction in its own database transaction.
    pub async fn create_transactions(
        &self,
        user_id: i64,
        cmds: Vec<NewTransaction>,
    ) -> ResultEngine<BulkResult> {
        check_batch_len(cmds.len(), MAX_BATCH_CREATE)?;

        let mut result = BulkResult::default();
        for (index, cmd) in cmds.into_iter().enumerate() {
            let outcome = self.create_transaction(user_id, cmd).await.map(|_| ());
            result.record(index, outcome);
        }
        tracing::info!(
            user_id,
            success = result.success_count,
            failure = result.failure_count,
            "batch create finished"
        );
        Ok(result)
    }

    /// Deletes each transaction in its own database transaction, reversing
    /// its postings.
    pub async fn delete_transactions(
        &self,
        user_id: i64,
        transaction_ids: &[i64],
    ) -> ResultEngine<BulkResult> {
        check_batch_len(transaction_ids.len(), MAX_BATCH_DELETE)?;

        let mut result = BulkResult::default();
        for (index, transaction_id) in transaction_ids.iter().copied().enumerate() {
            let outcome = with_tx!(self, "delete transaction", |db_tx| {
                self.remove_transaction(&db_tx, user_id, transaction_id)
                    .await
            });
            result.record(index, outcome);
        }
        tracing::info!(
            user_id,
            success = result.success_count,
            failure = result.failure_count,
            "batch delete finished"
        );
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn batch_bounds() {
        assert!(check_batch_len(0, MAX_BATCH_CREATE).is_err());
        assert!(check_batch_len(1, MAX_BATCH_CREATE).is_ok());
        assert!(check_batch_len(100, MAX_BATCH_CREATE).is_ok());
        assert!(check_batch_len(101, MAX_BATCH_CREATE).is_err());
        assert!(check_batch_len(1000, MAX_BATCH_DELETE).is_ok());
    }

    #[test]
    fn failures_carry_the_item_index() {
        let mut result = BulkResult::default();
        result.record(0, Ok(()));
        result.record(
            1,
            Err(EngineError::InvalidReference("invalid category".to_string())),
        );
        assert_eq!(result.success_count, 1);
        assert_eq!(result.failure_count, 1);
        assert_eq!(result.errors, vec!["item 1: invalid category".to_string()]);
    }
}
