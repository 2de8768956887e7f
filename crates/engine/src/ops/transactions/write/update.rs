use chrono::Utc;
use sea_orm::{ActiveValue, TransactionTrait, prelude::*};

use crate::{
    NewTransaction, ResultEngine, Transaction, TransactionDetail, TransactionPatch, transactions,
};

use crate::ops::{Engine, balances::BalanceDeltas, with_tx};

impl Engine {
    /// Applies a partial update and reconciles balances.
    ///
    /// The postings of the stored row are reversed and those of the merged
    /// row applied, netted per account, in the same database transaction as
    /// the row update. Changing kind, amount or accounts therefore keeps every
    /// balance consistent with the ledger.
    pub async fn update_transaction(
        &self,
        user_id: i64,
        transaction_id: i64,
        patch: TransactionPatch,
    ) -> ResultEngine<TransactionDetail> {
        with_tx!(self, "update transaction", |db_tx| {
            let current = self
                .require_transaction(&db_tx, user_id, transaction_id)
                .await?;
            let current = Transaction::try_from(current)?;

            let mut draft = patch.apply_to(NewTransaction::from(&current))?;
            draft.validate()?;
            self.check_references(&db_tx, user_id, &draft).await?;

            let mut active = transactions::ActiveModel::from(&draft);
            active.id = ActiveValue::Set(transaction_id);
            active.updated_at = ActiveValue::Set(Utc::now());
            let model = active.update(&db_tx).await?;

            let mut deltas = BalanceDeltas::default();
            deltas.reverse(&current.postings());
            deltas.apply(&draft.postings());
            self.persist_balance_deltas(&db_tx, deltas).await?;

            tracing::info!(transaction_id, user_id, "transaction updated");
            self.resolve_detail(&db_tx, model).await
        })
    }
}
