use sea_orm::TransactionTrait;

use crate::{Money, NewTransaction, ResultEngine, TransactionDetail};

use crate::ops::{Engine, with_tx};

impl Engine {
    /// Records a transaction and applies its postings.
    ///
    /// Nothing is written when validation or a reference check fails.
    pub async fn create_transaction(
        &self,
        user_id: i64,
        mut cmd: NewTransaction,
    ) -> ResultEngine<TransactionDetail> {
        cmd.validate()?;
        with_tx!(self, "create transaction", |db_tx| {
            self.check_references(&db_tx, user_id, &cmd).await?;
            let model = self.insert_transaction(&db_tx, user_id, &cmd).await?;
            tracing::info!(
                transaction_id = model.id,
                user_id,
                kind = cmd.kind.as_str(),
                amount = %Money::new(cmd.amount_minor),
                "transaction created"
            );
            self.resolve_detail(&db_tx, model).await
        })
    }
}
