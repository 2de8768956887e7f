use sea_orm::{TransactionTrait, prelude::*};

use crate::{ResultEngine, Transaction, transactions};

use crate::ops::{Engine, balances::BalanceDeltas, with_tx};

impl Engine {
    /// Deletes a transaction and reverses its postings.
    ///
    /// The reversal and the delete commit together.
    pub async fn delete_transaction(&self, user_id: i64, transaction_id: i64) -> ResultEngine<()> {
        with_tx!(self, "delete transaction", |db_tx| {
            self.remove_transaction(&db_tx, user_id, transaction_id)
                .await
        })
    }

    pub(in crate::ops::transactions) async fn remove_transaction<C: ConnectionTrait>(
        &self,
        db: &C,
        user_id: i64,
        transaction_id: i64,
    ) -> ResultEngine<()> {
        let model = self
            .require_transaction(db, user_id, transaction_id)
            .await?;
        let tx = Transaction::try_from(model)?;

        let mut deltas = BalanceDeltas::default();
        deltas.reverse(&tx.postings());
        self.persist_balance_deltas(db, deltas).await?;

        transactions::Entity::delete_by_id(transaction_id)
            .exec(db)
            .await?;
        tracing::info!(transaction_id, user_id, "transaction deleted");
        Ok(())
    }
}
