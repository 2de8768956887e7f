use std::collections::{BTreeSet, HashMap};

use sea_orm::{ConnectionTrait, QueryFilter, TransactionTrait, prelude::*};

use crate::{
    Account, Category, ResultEngine, Transaction, TransactionDetail, accounts, categories,
    transactions,
};

use crate::ops::{Engine, with_tx};

impl Engine {
    /// Returns one transaction with its category and accounts.
    pub async fn transaction(
        &self,
        user_id: i64,
        transaction_id: i64,
    ) -> ResultEngine<TransactionDetail> {
        with_tx!(self, "get transaction", |db_tx| {
            let model = self
                .require_transaction(&db_tx, user_id, transaction_id)
                .await?;
            self.resolve_detail(&db_tx, model).await
        })
    }

    pub(super) async fn resolve_detail<C: ConnectionTrait>(
        &self,
        db: &C,
        model: transactions::Model,
    ) -> ResultEngine<TransactionDetail> {
        let mut details = self.resolve_details(db, vec![model]).await?;
        details.pop().ok_or_else(|| {
            crate::EngineError::NotFound("transaction".to_string())
        })
    }

    /// Loads the referenced accounts and categories with one query each.
    ///
    /// References that no longer resolve are left empty.
    pub(super) async fn resolve_details<C: ConnectionTrait>(
        &self,
        db: &C,
        models: Vec<transactions::Model>,
    ) -> ResultEngine<Vec<TransactionDetail>> {
        let txs = models
            .into_iter()
            .map(Transaction::try_from)
            .collect::<ResultEngine<Vec<_>>>()?;

        let account_ids: BTreeSet<i64> = txs
            .iter()
            .flat_map(|tx| [tx.account_id, tx.to_account_id])
            .flatten()
            .collect();
        let category_ids: BTreeSet<i64> = txs.iter().filter_map(|tx| tx.category_id).collect();

        let mut accounts_by_id: HashMap<i64, Account> = HashMap::new();
        if !account_ids.is_empty() {
            for model in accounts::Entity::find()
                .filter(accounts::Column::Id.is_in(account_ids))
                .all(db)
                .await?
            {
                let account = Account::try_from(model)?;
                accounts_by_id.insert(account.id, account);
            }
        }

        let mut categories_by_id: HashMap<i64, Category> = HashMap::new();
        if !category_ids.is_empty() {
            for model in categories::Entity::find()
                .filter(categories::Column::Id.is_in(category_ids))
                .all(db)
                .await?
            {
                let category = Category::try_from(model)?;
                categories_by_id.insert(category.id, category);
            }
        }

        Ok(txs
            .into_iter()
            .map(|tx| TransactionDetail {
                category: tx.category_id.and_then(|id| categories_by_id.get(&id).cloned()),
                account: tx.account_id.and_then(|id| accounts_by_id.get(&id).cloned()),
                to_account: tx.to_account_id.and_then(|id| accounts_by_id.get(&id).cloned()),
                transaction: tx,
            })
            .collect())
    }
}
