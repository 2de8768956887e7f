//! The module contains `Account` struct and its persistence model.

use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use crate::EngineError;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccountType {
    Bank,
    Alipay,
    Wechat,
    Cash,
    Credit,
    Other,
}

impl AccountType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Bank => "bank",
            Self::Alipay => "alipay",
            Self::Wechat => "wechat",
            Self::Cash => "cash",
            Self::Credit => "credit",
            Self::Other => "other",
        }
    }
}

impl TryFrom<&str> for AccountType {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "bank" => Ok(Self::Bank),
            "alipay" => Ok(Self::Alipay),
            "wechat" => Ok(Self::Wechat),
            "cash" => Ok(Self::Cash),
            "credit" => Ok(Self::Credit),
            "other" => Ok(Self::Other),
            other => Err(EngineError::Validation(format!(
                "invalid account type: {other}"
            ))),
        }
    }
}

/// A funding account: a bank account, a payment app, a wallet of cash.
///
/// `balance` is a cache of `initial_balance` plus every posting made by the
/// owner's transactions. The only writes that bypass postings are manual
/// corrections through `Engine::update_account`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    pub id: i64,
    pub user_id: i64,
    pub account_type: AccountType,
    pub name: String,
    pub number: Option<String>,
    pub icon: Option<String>,
    pub color: Option<String>,
    pub balance: i64,
    /// Snapshot taken at creation, never changed afterwards.
    pub initial_balance: i64,
    /// Whether the balance counts towards the user's totals.
    pub include_in_total: bool,
    pub display_order: i32,
    /// `false` once the account is deleted. Rows are never removed.
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Aggregate of the balances that count towards the user's totals.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BalanceSummary {
    /// `asset - debt`.
    pub total: i64,
    /// Sum of the positive balances.
    pub asset: i64,
    /// Sum of the magnitudes of the negative balances.
    pub debt: i64,
}

impl BalanceSummary {
    pub(crate) fn from_balances(balances: impl IntoIterator<Item = i64>) -> Self {
        let mut summary = Self::default();
        for balance in balances {
            if balance >= 0 {
                summary.asset += balance;
            } else {
                summary.debt += -balance;
            }
        }
        summary.total = summary.asset - summary.debt;
        summary
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "accounts")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub user_id: i64,
    pub account_type: String,
    pub account_name: String,
    pub account_number: Option<String>,
    pub icon: Option<String>,
    pub color: Option<String>,
    pub balance: i64,
    pub initial_balance: i64,
    pub include_in_total: bool,
    pub display_order: i32,
    pub is_active: bool,
    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl TryFrom<Model> for Account {
    type Error = EngineError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: model.id,
            user_id: model.user_id,
            account_type: AccountType::try_from(model.account_type.as_str())?,
            name: model.account_name,
            number: model.account_number,
            icon: model.icon,
            color: model.color,
            balance: model.balance,
            initial_balance: model.initial_balance,
            include_in_total: model.include_in_total,
            display_order: model.display_order,
            is_active: model.is_active,
            created_at: model.created_at,
            updated_at: model.updated_at,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn summary_splits_assets_and_debts() {
        let summary = BalanceSummary::from_balances([1000, -300, 0, 250]);
        assert_eq!(summary.asset, 1250);
        assert_eq!(summary.debt, 300);
        assert_eq!(summary.total, 950);
    }

    #[test]
    fn account_type_round_trips_through_str() {
        for kind in [
            AccountType::Bank,
            AccountType::Alipay,
            AccountType::Wechat,
            AccountType::Cash,
            AccountType::Credit,
            AccountType::Other,
        ] {
            assert_eq!(AccountType::try_from(kind.as_str()).unwrap(), kind);
        }
        assert!(AccountType::try_from("crypto").is_err());
    }
}
