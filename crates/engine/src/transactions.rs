//! Transaction primitives.
//!
//! A `Transaction` is a single income, expense or transfer event. Its
//! *postings* are the balance changes it applies to the referenced accounts:
//!
//! - expense: `account -= amount`
//! - income: `account += amount`
//! - transfer: `account -= amount`, `to_account += amount`
//!
//! Every change to an account balance made by the engine is a posting (or the
//! reversal of one).

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use sea_orm::{ActiveValue, entity::prelude::*};
use serde::{Deserialize, Serialize};

use crate::{Account, Category, Currency, EngineError, NewTransaction};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionKind {
    Expense,
    Income,
    Transfer,
}

impl TransactionKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Expense => "expense",
            Self::Income => "income",
            Self::Transfer => "transfer",
        }
    }
}

impl TryFrom<&str> for TransactionKind {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "expense" => Ok(Self::Expense),
            "income" => Ok(Self::Income),
            "transfer" => Ok(Self::Transfer),
            other => Err(EngineError::Validation(format!(
                "invalid transaction kind: {other}"
            ))),
        }
    }
}

/// Balance changes applied by a transaction, as `(account_id, delta_minor)`.
///
/// Legs whose account is absent are skipped; the other leg still applies.
pub(crate) fn postings(
    kind: TransactionKind,
    account_id: Option<i64>,
    to_account_id: Option<i64>,
    amount_minor: i64,
) -> Vec<(i64, i64)> {
    match kind {
        TransactionKind::Expense => account_id.map(|id| (id, -amount_minor)).into_iter().collect(),
        TransactionKind::Income => account_id.map(|id| (id, amount_minor)).into_iter().collect(),
        TransactionKind::Transfer => account_id
            .map(|id| (id, -amount_minor))
            .into_iter()
            .chain(to_account_id.map(|id| (id, amount_minor)))
            .collect(),
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    pub id: i64,
    pub user_id: i64,
    pub kind: TransactionKind,
    pub category_id: Option<i64>,
    pub account_id: Option<i64>,
    pub to_account_id: Option<i64>,
    /// Always positive; the direction comes from `kind`.
    pub amount_minor: i64,
    pub currency: Currency,
    pub title: Option<String>,
    pub description: Option<String>,
    pub location: Option<String>,
    pub transaction_date: NaiveDate,
    pub transaction_time: Option<NaiveTime>,
    pub bill_id: Option<i64>,
    pub wishlist_id: Option<i64>,
    pub tags: Vec<String>,
    pub images: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Transaction {
    /// Balance changes this transaction applied when it was recorded.
    pub fn postings(&self) -> Vec<(i64, i64)> {
        postings(
            self.kind,
            self.account_id,
            self.to_account_id,
            self.amount_minor,
        )
    }
}

/// A transaction with its references resolved for display.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionDetail {
    pub transaction: Transaction,
    pub category: Option<Category>,
    pub account: Option<Account>,
    pub to_account: Option<Account>,
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "transactions")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub user_id: i64,
    pub kind: String,
    pub category_id: Option<i64>,
    pub account_id: Option<i64>,
    pub to_account_id: Option<i64>,
    pub amount_minor: i64,
    pub currency: String,
    pub title: Option<String>,
    pub description: Option<String>,
    pub location: Option<String>,
    pub transaction_date: Date,
    pub transaction_time: Option<Time>,
    pub bill_id: Option<i64>,
    pub wishlist_id: Option<i64>,
    /// JSON array of strings.
    pub tags: String,
    /// JSON array of strings.
    pub images: String,
    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::categories::Entity",
        from = "Column::CategoryId",
        to = "super::categories::Column::Id",
        on_update = "NoAction",
        on_delete = "SetNull"
    )]
    Category,
}

impl Related<super::categories::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Category.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

fn encode_list(values: &[String]) -> String {
    serde_json::to_string(values).unwrap_or_else(|_| "[]".to_string())
}

fn decode_list(raw: &str) -> Vec<String> {
    serde_json::from_str(raw).unwrap_or_default()
}

/// Row values for a validated draft. Identity, owner and timestamps are left
/// unset for the caller.
impl From<&NewTransaction> for ActiveModel {
    fn from(draft: &NewTransaction) -> Self {
        Self {
            id: ActiveValue::NotSet,
            user_id: ActiveValue::NotSet,
            kind: ActiveValue::Set(draft.kind.as_str().to_string()),
            category_id: ActiveValue::Set(draft.category_id),
            account_id: ActiveValue::Set(draft.account_id),
            to_account_id: ActiveValue::Set(draft.to_account_id),
            amount_minor: ActiveValue::Set(draft.amount_minor),
            currency: ActiveValue::Set(draft.currency.unwrap_or_default().code().to_string()),
            title: ActiveValue::Set(draft.title.clone()),
            description: ActiveValue::Set(draft.description.clone()),
            location: ActiveValue::Set(draft.location.clone()),
            transaction_date: ActiveValue::Set(draft.transaction_date),
            transaction_time: ActiveValue::Set(draft.transaction_time),
            bill_id: ActiveValue::Set(draft.bill_id),
            wishlist_id: ActiveValue::Set(draft.wishlist_id),
            tags: ActiveValue::Set(encode_list(&draft.tags)),
            images: ActiveValue::Set(encode_list(&draft.images)),
            created_at: ActiveValue::NotSet,
            updated_at: ActiveValue::NotSet,
        }
    }
}

impl TryFrom<Model> for Transaction {
    type Error = EngineError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: model.id,
            user_id: model.user_id,
            kind: TransactionKind::try_from(model.kind.as_str())?,
            category_id: model.category_id,
            account_id: model.account_id,
            to_account_id: model.to_account_id,
            amount_minor: model.amount_minor,
            currency: Currency::try_from(model.currency.as_str()).unwrap_or_default(),
            title: model.title,
            description: model.description,
            location: model.location,
            transaction_date: model.transaction_date,
            transaction_time: model.transaction_time,
            bill_id: model.bill_id,
            wishlist_id: model.wishlist_id,
            tags: decode_list(&model.tags),
            images: decode_list(&model.images),
            created_at: model.created_at,
            updated_at: model.updated_at,
        })
    }
}
