use chrono::Utc;
use sea_orm::{ActiveValue, ConnectionTrait, prelude::*};

use crate::{NewTransaction, ResultEngine, transactions};

use crate::ops::{Engine, balances::BalanceDeltas};

impl Engine {
    /// Every account and category a draft points at must be usable by the
    /// caller: accounts are owned, categories are owned or system ones.
    pub(in crate::ops::transactions) async fn check_references<C: ConnectionTrait>(
        &self,
        db: &C,
        user_id: i64,
        draft: &NewTransaction,
    ) -> ResultEngine<()> {
        if let Some(account_id) = draft.account_id {
            self.require_account_reference(db, user_id, account_id, "account")
                .await?;
        }
        if let Some(to_account_id) = draft.to_account_id {
            self.require_account_reference(db, user_id, to_account_id, "to_account")
                .await?;
        }
        if let Some(category_id) = draft.category_id {
            self.require_category_reference(db, user_id, category_id)
                .await?;
        }
        Ok(())
    }

    /// Inserts a validated, reference-checked draft and posts its balance
    /// changes on the same connection.
    pub(in crate::ops::transactions) async fn insert_transaction<C: ConnectionTrait>(
        &self,
        db: &C,
        user_id: i64,
        draft: &NewTransaction,
    ) -> ResultEngine<transactions::Model> {
        let now = Utc::now();
        let mut active = transactions::ActiveModel::from(draft);
        active.user_id = ActiveValue::Set(user_id);
        active.created_at = ActiveValue::Set(now);
        active.updated_at = ActiveValue::Set(now);
        let model = active.insert(db).await?;

        let mut deltas = BalanceDeltas::default();
        deltas.apply(&draft.postings());
        self.persist_balance_deltas(db, deltas).await?;
        Ok(model)
    }
}
