use chrono::NaiveDate;
use sea_orm::{
    Condition, PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, TransactionTrait,
    prelude::*,
    sea_query::{Expr, Func, LikeExpr},
};
use serde::{Deserialize, Serialize};

use crate::{EngineError, ResultEngine, TransactionDetail, TransactionKind, transactions};

use crate::ops::{Engine, with_tx};

pub const DEFAULT_PAGE_SIZE: u64 = 20;
pub const MAX_PAGE_SIZE: u64 = 100;
const MAX_KEYWORD_LEN: usize = 100;

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

/// Filters for listing transactions.
///
/// Date bounds are inclusive. `page` starts at 1; `page_size` is capped at
/// [`MAX_PAGE_SIZE`] and falls back to [`DEFAULT_PAGE_SIZE`] when absent or 0.
#[derive(Clone, Debug, Default)]
pub struct TransactionListFilter {
    pub kind: Option<TransactionKind>,
    pub category_id: Option<i64>,
    /// Matches either side of a transfer.
    pub account_id: Option<i64>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    /// Substring match on title, description and location. `%` and `_` are
    /// literal characters. Case is folded for ASCII letters only, the same
    /// way SQLite's `lower()` does.
    pub search_keyword: Option<String>,
    pub sort_by: SortField,
    pub sort_order: SortOrder,
    pub page: Option<u64>,
    pub page_size: Option<u64>,
}

impl TransactionListFilter {
    fn page(&self) -> u64 {
        self.page.filter(|page| *page > 0).unwrap_or(1)
    }

    fn page_size(&self) -> u64 {
        match self.page_size {
            None | Some(0) => DEFAULT_PAGE_SIZE,
            Some(size) => size.min(MAX_PAGE_SIZE),
        }
    }

    fn keyword(&self) -> Option<String> {
        self.search_keyword
            .as_deref()
            .map(str::trim)
            .filter(|k| !k.is_empty())
            .map(str::to_ascii_lowercase)
    }
}

/// One page of results plus the total number of matching rows.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionPage {
    pub items: Vec<TransactionDetail>,
    pub total: u64,
    pub page: u64,
    pub page_size: u64,
}

/// `%keyword%` with the `LIKE` metacharacters escaped by a backslash.
fn like_pattern(keyword: &str) -> String {
    let mut pattern = String::with_capacity(keyword.len() + 2);
    pattern.push('%');
    for ch in keyword.chars() {
        if matches!(ch, '\\' | '%' | '_') {
            pattern.push('\\');
        }
        pattern.push(ch);
    }
    pattern.push('%');
    pattern
}

fn validate_list_filter(filter: &TransactionListFilter) -> ResultEngine<()> {
    if let (Some(start), Some(end)) = (filter.start_date, filter.end_date)
        && start > end
    {
        return Err(EngineError::Validation(
            "invalid range: start_date must be <= end_date".to_string(),
        ));
    }
    if filter
        .search_keyword
        .as_deref()
        .is_some_and(|k| k.trim().chars().count() > MAX_KEYWORD_LEN)
    {
        return Err(EngineError::Validation(format!(
            "search keyword must be at most {MAX_KEYWORD_LEN} characters"
        )));
    }
    Ok(())
}

pub(crate) trait ApplyTxFilters: QueryFilter + Sized {
    fn apply_tx_filters(self, filter: &TransactionListFilter) -> Self;
}

impl<T> ApplyTxFilters for T
where
    T: QueryFilter + Sized,
{
    fn apply_tx_filters(mut self, filter: &TransactionListFilter) -> Self {
        if let Some(kind) = filter.kind {
            self = self.filter(transactions::Column::Kind.eq(kind.as_str()));
        }
        if let Some(category_id) = filter.category_id {
            self = self.filter(transactions::Column::CategoryId.eq(category_id));
        }
        if let Some(account_id) = filter.account_id {
            self = self.filter(
                Condition::any()
                    .add(transactions::Column::AccountId.eq(account_id))
                    .add(transactions::Column::ToAccountId.eq(account_id)),
            );
        }
        if let Some(start) = filter.start_date {
            self = self.filter(transactions::Column::TransactionDate.gte(start));
        }
        if let Some(end) = filter.end_date {
            self = self.filter(transactions::Column::TransactionDate.lte(end));
        }
        if let Some(keyword) = filter.keyword() {
            let pattern = like_pattern(&keyword);
            let lowered = |col: transactions::Column| {
                Expr::expr(Func::lower(Expr::col(col)))
                    .like(LikeExpr::new(pattern.clone()).escape('\\'))
            };
            self = self.filter(
                Condition::any()
                    .add(lowered(transactions::Column::Title))
                    .add(lowered(transactions::Column::Description))
                    .add(lowered(transactions::Column::Location)),
            );
        }
        self
    }
}

impl Engine {
    /// Lists the user's transactions with their references resolved.
    ///
    /// Ties in the sort column are broken by id in the same direction, so
    /// pages never overlap.
    pub async fn list_transactions(
        &self,
        user_id: i64,
        filter: &TransactionListFilter,
    ) -> ResultEngine<TransactionPage> {
        validate_list_filter(filter)?;
        let page = filter.page();
        let page_size = filter.page_size();

        with_tx!(self, "list transactions", |db_tx| {
            let query = transactions::Entity::find()
                .filter(transactions::Column::UserId.eq(user_id))
                .apply_tx_filters(filter);

            let total = query.clone().count(&db_tx).await?;

            let sort_col = match filter.sort_by {
                SortField::Date => transactions::Column::TransactionDate,
                SortField::Amount => transactions::Column::AmountMinor,
            };
            let query = match filter.sort_order {
                SortOrder::Asc => query
                    .order_by_asc(sort_col)
                    .order_by_asc(transactions::Column::Id),
                SortOrder::Desc => query
                    .order_by_desc(sort_col)
                    .order_by_desc(transactions::Column::Id),
            };

            let models = query
                .offset((page - 1).saturating_mul(page_size))
                .limit(page_size)
                .all(&db_tx)
                .await?;
            let items = self.resolve_details(&db_tx, models).await?;

            Ok(TransactionPage {
                items,
                total,
                page,
                page_size,
            })
        })
    }
}
