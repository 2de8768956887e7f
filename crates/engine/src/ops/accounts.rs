use chrono::Utc;
use sea_orm::{ActiveValue, QueryFilter, QueryOrder, TransactionTrait, prelude::*};

use crate::{
    Account, AccountPatch, BalanceSummary, Money, NewAccount, ResultEngine, accounts,
    commands::check_amount,
};

use super::{Engine, normalize_optional_text, normalize_required_name, with_tx};

const MAX_ACCOUNT_NAME_LEN: usize = 100;

impl Engine {
    /// Creates an account whose balance starts at its initial balance.
    pub async fn create_account(&self, user_id: i64, cmd: NewAccount) -> ResultEngine<Account> {
        let name = normalize_required_name(&cmd.name, "account", MAX_ACCOUNT_NAME_LEN)?;
        check_amount(cmd.initial_balance_minor, "initial balance")?;
        with_tx!(self, "create account", |db_tx| {
            let now = Utc::now();
            let model = accounts::ActiveModel {
                id: ActiveValue::NotSet,
                user_id: ActiveValue::Set(user_id),
                account_type: ActiveValue::Set(cmd.account_type.as_str().to_string()),
                account_name: ActiveValue::Set(name),
                account_number: ActiveValue::Set(normalize_optional_text(cmd.number.as_deref())),
                icon: ActiveValue::Set(normalize_optional_text(cmd.icon.as_deref())),
                color: ActiveValue::Set(normalize_optional_text(cmd.color.as_deref())),
                balance: ActiveValue::Set(cmd.initial_balance_minor),
                initial_balance: ActiveValue::Set(cmd.initial_balance_minor),
                include_in_total: ActiveValue::Set(cmd.include_in_total),
                display_order: ActiveValue::Set(cmd.display_order),
                is_active: ActiveValue::Set(true),
                created_at: ActiveValue::Set(now),
                updated_at: ActiveValue::Set(now),
            }
            .insert(&db_tx)
            .await?;
            tracing::info!(account_id = model.id, user_id, "account created");
            Account::try_from(model)
        })
    }

    /// Active accounts of a user, in display order.
    pub async fn accounts(&self, user_id: i64) -> ResultEngine<Vec<Account>> {
        with_tx!(self, "list accounts", |db_tx| {
            let models = accounts::Entity::find()
                .filter(accounts::Column::UserId.eq(user_id))
                .filter(accounts::Column::IsActive.eq(true))
                .order_by_asc(accounts::Column::DisplayOrder)
                .order_by_asc(accounts::Column::CreatedAt)
                .order_by_asc(accounts::Column::Id)
                .all(&db_tx)
                .await?;
            models
                .into_iter()
                .map(Account::try_from)
                .collect::<ResultEngine<Vec<_>>>()
        })
    }

    /// Returns a single account, active or not.
    pub async fn account(&self, user_id: i64, account_id: i64) -> ResultEngine<Account> {
        with_tx!(self, "get account", |db_tx| {
            let model = self.require_account(&db_tx, user_id, account_id).await?;
            Account::try_from(model)
        })
    }

    /// Applies a partial update. A `balance_minor` in the patch is a manual
    /// correction and bypasses the ledger.
    pub async fn update_account(
        &self,
        user_id: i64,
        account_id: i64,
        patch: AccountPatch,
    ) -> ResultEngine<Account> {
        let name = patch
            .name
            .as_deref()
            .map(|name| normalize_required_name(name, "account", MAX_ACCOUNT_NAME_LEN))
            .transpose()?;
        if let Some(balance) = patch.balance_minor {
            check_amount(balance, "balance")?;
        }
        with_tx!(self, "update account", |db_tx| {
            let current = self.require_account(&db_tx, user_id, account_id).await?;

            let mut active = accounts::ActiveModel {
                id: ActiveValue::Set(account_id),
                updated_at: ActiveValue::Set(Utc::now()),
                ..Default::default()
            };
            if let Some(name) = name {
                active.account_name = ActiveValue::Set(name);
            }
            if let Some(number) = patch.number.as_deref() {
                active.account_number = ActiveValue::Set(normalize_optional_text(Some(number)));
            }
            if let Some(icon) = patch.icon.as_deref() {
                active.icon = ActiveValue::Set(normalize_optional_text(Some(icon)));
            }
            if let Some(color) = patch.color.as_deref() {
                active.color = ActiveValue::Set(normalize_optional_text(Some(color)));
            }
            if let Some(include) = patch.include_in_total {
                active.include_in_total = ActiveValue::Set(include);
            }
            if let Some(order) = patch.display_order {
                active.display_order = ActiveValue::Set(order);
            }
            if let Some(is_active) = patch.is_active {
                active.is_active = ActiveValue::Set(is_active);
            }
            if let Some(balance) = patch.balance_minor {
                tracing::warn!(
                    account_id,
                    user_id,
                    from = %Money::new(current.balance),
                    to = %Money::new(balance),
                    "manual balance correction"
                );
                active.balance = ActiveValue::Set(balance);
            }

            let model = active.update(&db_tx).await?;
            Account::try_from(model)
        })
    }

    /// Soft-deletes an account. Its history and balance are kept.
    pub async fn delete_account(&self, user_id: i64, account_id: i64) -> ResultEngine<()> {
        with_tx!(self, "delete account", |db_tx| {
            self.require_account(&db_tx, user_id, account_id).await?;
            accounts::ActiveModel {
                id: ActiveValue::Set(account_id),
                is_active: ActiveValue::Set(false),
                updated_at: ActiveValue::Set(Utc::now()),
                ..Default::default()
            }
            .update(&db_tx)
            .await?;
            tracing::info!(account_id, user_id, "account deactivated");
            Ok(())
        })
    }

    /// Totals over the active accounts that are included in totals.
    pub async fn balance_summary(&self, user_id: i64) -> ResultEngine<BalanceSummary> {
        with_tx!(self, "balance summary", |db_tx| {
            let models = accounts::Entity::find()
                .filter(accounts::Column::UserId.eq(user_id))
                .filter(accounts::Column::IsActive.eq(true))
                .filter(accounts::Column::IncludeInTotal.eq(true))
                .all(&db_tx)
                .await?;
            Ok(BalanceSummary::from_balances(
                models.into_iter().map(|model| model.balance),
            ))
        })
    }
}
