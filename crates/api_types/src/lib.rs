//! Request and response bodies of the HTTP API.
//!
//! Amounts are integer minor units (`amount_minor: 1250` is 12.50). Dates are
//! `YYYY-MM-DD`, times `HH:MM:SS`.

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Currency {
    #[default]
    Cny,
    Usd,
    Eur,
    Hkd,
    Gbp,
    Jpy,
}

/// Body of every error response.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}

pub mod account {
    use super::*;

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

    #[derive(Debug, Serialize, Deserialize)]
    pub struct AccountNew {
        pub account_type: AccountType,
        pub account_name: String,
        pub account_number: Option<String>,
        pub icon: Option<String>,
        pub color: Option<String>,
        #[serde(default)]
        pub initial_balance_minor: i64,
        /// Defaults to `true`.
        pub include_in_total: Option<bool>,
        #[serde(default)]
        pub display_order: i32,
    }

    /// Partial update. `balance_minor` is a manual correction.
    #[derive(Debug, Default, Serialize, Deserialize)]
    pub struct AccountUpdate {
        pub account_name: Option<String>,
        pub account_number: Option<String>,
        pub icon: Option<String>,
        pub color: Option<String>,
        pub include_in_total: Option<bool>,
        pub display_order: Option<i32>,
        pub is_active: Option<bool>,
        pub balance_minor: Option<i64>,
    }

    #[derive(Clone, Debug, Serialize, Deserialize)]
    pub struct AccountView {
        pub id: i64,
        pub account_type: AccountType,
        pub account_name: String,
        pub account_number: Option<String>,
        pub icon: Option<String>,
        pub color: Option<String>,
        pub balance_minor: i64,
        pub initial_balance_minor: i64,
        pub include_in_total: bool,
        pub display_order: i32,
        pub is_active: bool,
        pub created_at: DateTime<Utc>,
        pub updated_at: DateTime<Utc>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct BalanceSummary {
        pub total_balance_minor: i64,
        pub total_asset_minor: i64,
        pub total_debt_minor: i64,
    }
}

pub mod category {
    use super::*;

    #[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(rename_all = "snake_case")]
    pub enum CategoryType {
        Expense,
        Income,
    }

    #[derive(Debug, Default, Serialize, Deserialize)]
    pub struct CategoryQuery {
        #[serde(rename = "type")]
        pub kind: Option<CategoryType>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct CategoryNew {
        #[serde(rename = "type")]
        pub kind: CategoryType,
        pub name: String,
        pub icon: Option<String>,
        pub color: Option<String>,
        #[serde(default)]
        pub display_order: i32,
    }

    #[derive(Debug, Default, Serialize, Deserialize)]
    pub struct CategoryUpdate {
        pub name: Option<String>,
        pub icon: Option<String>,
        pub color: Option<String>,
        pub display_order: Option<i32>,
        pub is_active: Option<bool>,
    }

    #[derive(Clone, Debug, Serialize, Deserialize)]
    pub struct CategoryView {
        pub id: i64,
        #[serde(rename = "type")]
        pub kind: CategoryType,
        pub name: String,
        pub icon: Option<String>,
        pub color: Option<String>,
        pub display_order: i32,
        pub is_system: bool,
        pub is_active: bool,
    }
}

pub mod transaction {
    use super::*;
    use crate::{account::AccountView, category::CategoryView};

    #[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(rename_all = "snake_case")]
    pub enum TransactionKind {
        Expense,
        Income,
        Transfer,
    }

    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(rename_all = "snake_case")]
    pub enum SortField {
        #[default]
        Date,
        Amount,
    }

    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(rename_all = "snake_case")]
    pub enum SortOrder {
        Asc,
        #[default]
        Desc,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct TransactionNew {
        #[serde(rename = "type")]
        pub kind: TransactionKind,
        pub category_id: Option<i64>,
        pub account_id: Option<i64>,
        /// Required for transfers, ignored otherwise.
        pub to_account_id: Option<i64>,
        /// Must be > 0. The kind gives the direction.
        pub amount_minor: i64,
        pub currency: Option<Currency>,
        pub title: Option<String>,
        pub description: Option<String>,
        pub location: Option<String>,
        pub transaction_date: NaiveDate,
        pub transaction_time: Option<NaiveTime>,
        pub bill_id: Option<i64>,
        pub wishlist_id: Option<i64>,
        #[serde(default)]
        pub tags: Vec<String>,
        #[serde(default)]
        pub images: Vec<String>,
    }

    /// Partial update.
    ///
    /// `amount_minor: 0` and empty `tags`/`images` leave the stored values
    /// unchanged.
    #[derive(Debug, Default, Serialize, Deserialize)]
    pub struct TransactionUpdate {
        #[serde(rename = "type")]
        pub kind: Option<TransactionKind>,
        pub category_id: Option<i64>,
        pub account_id: Option<i64>,
        pub to_account_id: Option<i64>,
        pub amount_minor: Option<i64>,
        pub currency: Option<Currency>,
        pub title: Option<String>,
        pub description: Option<String>,
        pub location: Option<String>,
        pub transaction_date: Option<NaiveDate>,
        pub transaction_time: Option<NaiveTime>,
        pub bill_id: Option<i64>,
        pub wishlist_id: Option<i64>,
        pub tags: Option<Vec<String>>,
        pub images: Option<Vec<String>>,
    }

    #[derive(Debug, Default, Serialize, Deserialize)]
    pub struct TransactionListQuery {
        #[serde(rename = "type")]
        pub kind: Option<TransactionKind>,
        pub category_id: Option<i64>,
        pub account_id: Option<i64>,
        pub start_date: Option<NaiveDate>,
        pub end_date: Option<NaiveDate>,
        pub keyword: Option<String>,
        pub sort_by: Option<SortField>,
        pub sort_order: Option<SortOrder>,
        pub page: Option<u64>,
        pub page_size: Option<u64>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct TransactionView {
        pub id: i64,
        #[serde(rename = "type")]
        pub kind: TransactionKind,
        pub category_id: Option<i64>,
        pub account_id: Option<i64>,
        pub to_account_id: Option<i64>,
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
        pub category: Option<CategoryView>,
        pub account: Option<AccountView>,
        pub to_account: Option<AccountView>,
        pub created_at: DateTime<Utc>,
        pub updated_at: DateTime<Utc>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct TransactionListResponse {
        pub items: Vec<TransactionView>,
        pub total: u64,
        pub page: u64,
        pub page_size: u64,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct BatchCreate {
        pub transactions: Vec<TransactionNew>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct BatchDelete {
        pub ids: Vec<i64>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct BulkResult {
        pub success_count: usize,
        pub failure_count: usize,
        pub errors: Vec<String>,
    }
}

pub mod stats {
    use super::*;
    use crate::category::CategoryView;

    #[derive(Debug, Default, Serialize, Deserialize)]
    pub struct DateRangeQuery {
        pub start_date: Option<NaiveDate>,
        pub end_date: Option<NaiveDate>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct MonthQuery {
        /// `YYYY-MM`
        pub month: String,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct Statistics {
        pub total_income_minor: i64,
        pub total_expense_minor: i64,
        pub net_minor: i64,
        pub count: u64,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct MonthlyStatistics {
        pub month: String,
        #[serde(flatten)]
        pub totals: Statistics,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct CategoryStatistic {
        pub category_id: i64,
        pub category: Option<CategoryView>,
        pub total_minor: i64,
        pub transaction_count: u64,
        pub percentage: f64,
    }
}
