use std::collections::HashMap;

use chrono::{Months, NaiveDate};
use sea_orm::{
    ConnectionTrait, QueryFilter, QuerySelect, TransactionTrait, prelude::*, sea_query::Expr,
};
use serde::{Deserialize, Serialize};

use crate::{
    Category, EngineError, ResultEngine, TransactionKind, categories, transactions,
};

use super::{
    Engine,
    transactions::{ApplyTxFilters, TransactionListFilter},
    with_tx,
};

/// Income and expense totals over a date range.
///
/// Transfers count towards `count` but not towards either total.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionStatistics {
    pub total_income: i64,
    pub total_expense: i64,
    pub net: i64,
    pub count: u64,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonthlyStatistics {
    /// `YYYY-MM`
    pub month: String,
    #[serde(flatten)]
    pub totals: TransactionStatistics,
}

/// Expense share of one category.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CategoryStatistic {
    pub category_id: i64,
    pub category: Option<Category>,
    pub total_minor: i64,
    pub transaction_count: u64,
    /// Share of all expenses in the range, uncategorized ones included.
    pub percentage: f64,
}

fn range_filter(
    start: Option<NaiveDate>,
    end: Option<NaiveDate>,
) -> ResultEngine<TransactionListFilter> {
    if let (Some(start), Some(end)) = (start, end)
        && start > end
    {
        return Err(EngineError::Validation(
            "invalid range: start_date must be <= end_date".to_string(),
        ));
    }
    Ok(TransactionListFilter {
        start_date: start,
        end_date: end,
        ..Default::default()
    })
}

fn month_bounds(year: i32, month: u32) -> ResultEngine<(NaiveDate, NaiveDate)> {
    let first = NaiveDate::from_ymd_opt(year, month, 1)
        .ok_or_else(|| EngineError::Validation(format!("invalid month: {year}-{month:02}")))?;
    let last = first
        .checked_add_months(Months::new(1))
        .and_then(|next| next.pred_opt())
        .ok_or_else(|| EngineError::Validation(format!("invalid month: {year}-{month:02}")))?;
    Ok((first, last))
}

fn percentage(part: i64, total: i64) -> f64 {
    if total == 0 {
        return 0.0;
    }
    (part as f64 * 100.0) / total as f64
}

impl Engine {
    /// Totals over `[start, end]`, both bounds inclusive and optional.
    pub async fn transaction_statistics(
        &self,
        user_id: i64,
        start: Option<NaiveDate>,
        end: Option<NaiveDate>,
    ) -> ResultEngine<TransactionStatistics> {
        let filter = range_filter(start, end)?;
        with_tx!(self, "transaction statistics", |db_tx| {
            self.totals(&db_tx, user_id, &filter).await
        })
    }

    /// Totals for one calendar month.
    pub async fn monthly_statistics(
        &self,
        user_id: i64,
        year: i32,
        month: u32,
    ) -> ResultEngine<MonthlyStatistics> {
        let (first, last) = month_bounds(year, month)?;
        let filter = range_filter(Some(first), Some(last))?;
        with_tx!(self, "monthly statistics", |db_tx| {
            let totals = self.totals(&db_tx, user_id, &filter).await?;
            Ok(MonthlyStatistics {
                month: first.format("%Y-%m").to_string(),
                totals,
            })
        })
    }

    /// Expense breakdown by category, largest first.
    ///
    /// Uncategorized expenses are part of the total the percentages are
    /// computed against but get no entry of their own.
    pub async fn category_statistics(
        &self,
        user_id: i64,
        start: Option<NaiveDate>,
        end: Option<NaiveDate>,
    ) -> ResultEngine<Vec<CategoryStatistic>> {
        let filter = range_filter(start, end)?;
        with_tx!(self, "category statistics", |db_tx| {
            let rows: Vec<(Option<i64>, i64, i64)> = transactions::Entity::find()
                .select_only()
                .column(transactions::Column::CategoryId)
                .column_as(Expr::col(transactions::Column::AmountMinor).sum(), "total")
                .column_as(Expr::col(transactions::Column::Id).count(), "count")
                .filter(transactions::Column::UserId.eq(user_id))
                .filter(transactions::Column::Kind.eq(TransactionKind::Expense.as_str()))
                .apply_tx_filters(&filter)
                .group_by(transactions::Column::CategoryId)
                .into_tuple()
                .all(&db_tx)
                .await?;

            let total_expense: i64 = rows.iter().map(|(_, total, _)| total).sum();

            let category_ids: Vec<i64> = rows.iter().filter_map(|(id, _, _)| *id).collect();
            let mut by_id: HashMap<i64, Category> = HashMap::new();
            if !category_ids.is_empty() {
                for model in categories::Entity::find()
                    .filter(categories::Column::Id.is_in(category_ids))
                    .all(&db_tx)
                    .await?
                {
                    let category = Category::try_from(model)?;
                    by_id.insert(category.id, category);
                }
            }

            let mut out: Vec<CategoryStatistic> = rows
                .into_iter()
                .filter_map(|(category_id, total, count)| {
                    let category_id = category_id?;
                    Some(CategoryStatistic {
                        category_id,
                        category: by_id.get(&category_id).cloned(),
                        total_minor: total,
                        transaction_count: u64::try_from(count).unwrap_or_default(),
                        percentage: percentage(total, total_expense),
                    })
                })
                .collect();
            out.sort_by(|a, b| {
                b.total_minor
                    .cmp(&a.total_minor)
                    .then(a.category_id.cmp(&b.category_id))
            });
            Ok(out)
        })
    }

    async fn totals<C: ConnectionTrait>(
        &self,
        db: &C,
        user_id: i64,
        filter: &TransactionListFilter,
    ) -> ResultEngine<TransactionStatistics> {
        let rows: Vec<(String, i64, i64)> = transactions::Entity::find()
            .select_only()
            .column(transactions::Column::Kind)
            .column_as(Expr::col(transactions::Column::AmountMinor).sum(), "total")
            .column_as(Expr::col(transactions::Column::Id).count(), "count")
            .filter(transactions::Column::UserId.eq(user_id))
            .apply_tx_filters(filter)
            .group_by(transactions::Column::Kind)
            .into_tuple()
            .all(db)
            .await?;

        let mut stats = TransactionStatistics::default();
        for (kind, total, count) in rows {
            match TransactionKind::try_from(kind.as_str())? {
                TransactionKind::Income => stats.total_income += total,
                TransactionKind::Expense => stats.total_expense += total,
                TransactionKind::Transfer => {}
            }
            stats.count += u64::try_from(count).unwrap_or_default();
        }
        stats.net = stats.total_income - stats.total_expense;
        Ok(stats)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn month_bounds_cover_the_whole_month() {
        let (first, last) = month_bounds(2024, 2).unwrap();
        assert_eq!(first, NaiveDate::from_ymd_opt(2024, 2, 1).unwrap());
        assert_eq!(last, NaiveDate::from_ymd_opt(2024, 2, 29).unwrap());

        let (_, last) = month_bounds(2023, 12).unwrap();
        assert_eq!(last, NaiveDate::from_ymd_opt(2023, 12, 31).unwrap());

        assert!(month_bounds(2024, 13).is_err());
    }

    #[test]
    fn percentage_of_empty_total_is_zero() {
        assert_eq!(percentage(10, 0), 0.0);
        assert!((percentage(30, 100) - 30.0).abs() < f64::EPSILON);
    }

    #[test]
    fn inverted_range_is_rejected() {
        let start = NaiveDate::from_ymd_opt(2024, 3, 2);
        let end = NaiveDate::from_ymd_opt(2024, 3, 1);
        assert!(matches!(
            range_filter(start, end),
            Err(EngineError::Validation(_))
        ));
    }
}
