use std::collections::BTreeMap;

use chrono::Utc;
use sea_orm::{
    ActiveValue, ConnectionTrait, QueryFilter, QueryOrder, TransactionTrait, prelude::*,
    sea_query::Expr,
};

use crate::{
    Account, EngineError, MAX_AMOUNT_MINOR, Money, ResultEngine, Transaction, accounts,
    transactions,
};

use super::{Engine, with_tx};

/// Net balance change per account collected while an operation runs.
///
/// Keyed by account id so rows are always touched in ascending id order.
#[derive(Debug, Default)]
pub(super) struct BalanceDeltas(BTreeMap<i64, i64>);

impl BalanceDeltas {
    pub(super) fn apply(&mut self, postings: &[(i64, i64)]) {
        for (account_id, delta) in postings {
            *self.0.entry(*account_id).or_default() += delta;
        }
    }

    pub(super) fn reverse(&mut self, postings: &[(i64, i64)]) {
        for (account_id, delta) in postings {
            *self.0.entry(*account_id).or_default() -= delta;
        }
    }
}

impl Engine {
    /// Adds the collected deltas to the account balances in place.
    ///
    /// Each account gets a single `balance = balance + delta` statement, so
    /// concurrent writers never overwrite each other's postings. The statement
    /// only matches while the new balance stays within [`MAX_AMOUNT_MINOR`];
    /// otherwise the operation fails with `Validation` and the caller's
    /// transaction rolls back. A leg whose account row is gone is skipped.
    pub(super) async fn persist_balance_deltas<C: ConnectionTrait>(
        &self,
        db: &C,
        deltas: BalanceDeltas,
    ) -> ResultEngine<()> {
        let now = Utc::now();
        for (account_id, delta) in deltas.0 {
            if delta == 0 {
                continue;
            }
            let result = accounts::Entity::update_many()
                .col_expr(
                    accounts::Column::Balance,
                    Expr::col(accounts::Column::Balance).add(delta),
                )
                .col_expr(accounts::Column::UpdatedAt, Expr::value(now))
                .filter(accounts::Column::Id.eq(account_id))
                .filter(
                    Expr::expr(Expr::col(accounts::Column::Balance).add(delta))
                        .between(-MAX_AMOUNT_MINOR, MAX_AMOUNT_MINOR),
                )
                .exec(db)
                .await?;
            if result.rows_affected == 0 {
                if accounts::Entity::find_by_id(account_id).one(db).await?.is_some() {
                    return Err(EngineError::Validation(format!(
                        "balance of account {account_id} would exceed ±{MAX_AMOUNT_MINOR} minor units"
                    )));
                }
                tracing::warn!(account_id, delta, "posting skipped: account row missing");
            } else {
                tracing::debug!(account_id, delta = %Money::new(delta), "balance posted");
            }
        }
        Ok(())
    }

    /// Recomputes every account balance of a user from the ledger.
    ///
    /// Each balance becomes `initial_balance` plus the postings of all the
    /// user's transactions. Manual corrections are discarded.
    pub async fn recompute_balances(&self, user_id: i64) -> ResultEngine<Vec<Account>> {
        with_tx!(self, "recompute balances", |db_tx| {
            let account_models = accounts::Entity::find()
                .filter(accounts::Column::UserId.eq(user_id))
                .order_by_asc(accounts::Column::Id)
                .all(&db_tx)
                .await?;

            let mut balances: BTreeMap<i64, i64> = account_models
                .iter()
                .map(|model| (model.id, model.initial_balance))
                .collect();

            let tx_models = transactions::Entity::find()
                .filter(transactions::Column::UserId.eq(user_id))
                .all(&db_tx)
                .await?;
            for model in tx_models {
                let tx = Transaction::try_from(model)?;
                for (account_id, delta) in tx.postings() {
                    if let Some(balance) = balances.get_mut(&account_id) {
                        *balance += delta;
                    }
                }
            }

            let now = Utc::now();
            let mut out = Vec::with_capacity(account_models.len());
            for model in account_models {
                let balance = balances
                    .get(&model.id)
                    .copied()
                    .unwrap_or(model.initial_balance);
                if balance == model.balance {
                    out.push(Account::try_from(model)?);
                    continue;
                }

                tracing::info!(
                    account_id = model.id,
                    from = %Money::new(model.balance),
                    to = %Money::new(balance),
                    "balance recomputed"
                );
                let updated = accounts::ActiveModel {
                    id: ActiveValue::Set(model.id),
                    balance: ActiveValue::Set(balance),
                    updated_at: ActiveValue::Set(now),
                    ..Default::default()
                }
                .update(&db_tx)
                .await?;
                out.push(Account::try_from(updated)?);
            }

            Ok(out)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reversal_and_new_posting_net_per_account() {
        let mut deltas = BalanceDeltas::default();
        deltas.reverse(&[(1, -100)]);
        deltas.apply(&[(1, -150)]);
        deltas.apply(&[(2, 40)]);
        assert_eq!(deltas.0.get(&1), Some(&-50));
        assert_eq!(deltas.0.get(&2), Some(&40));
    }

    #[test]
    fn unchanged_posting_nets_to_zero() {
        let mut deltas = BalanceDeltas::default();
        deltas.reverse(&[(3, 100), (4, -100)]);
        deltas.apply(&[(3, 100), (4, -100)]);
        assert!(deltas.0.values().all(|delta| *delta == 0));
    }
}
