//! Statistics API endpoints

use api_types::stats::{
    CategoryStatistic, DateRangeQuery, MonthQuery, MonthlyStatistics, Statistics,
};
use axum::{
    Extension, Json,
    extract::{Query, State},
};
use chrono::{Datelike, NaiveDate};

use crate::{ServerError, categories::map_category, server::ServerState, user};

fn map_totals(stats: engine::TransactionStatistics) -> Statistics {
    Statistics {
        total_income_minor: stats.total_income,
        total_expense_minor: stats.total_expense,
        net_minor: stats.net,
        count: stats.count,
    }
}

/// Parses `YYYY-MM` into `(year, month)`.
fn parse_month(raw: &str) -> Result<(i32, u32), ServerError> {
    let first = NaiveDate::parse_from_str(&format!("{}-01", raw.trim()), "%Y-%m-%d")
        .map_err(|_| ServerError::Generic(format!("invalid month \"{raw}\", expected YYYY-MM")))?;
    Ok((first.year(), first.month()))
}

/// Handle requests for income/expense totals over a date range
pub async fn range(
    Extension(user): Extension<user::Model>,
    State(state): State<ServerState>,
    Query(query): Query<DateRangeQuery>,
) -> Result<Json<Statistics>, ServerError> {
    let stats = state
        .engine
        .transaction_statistics(user.id, query.start_date, query.end_date)
        .await?;
    Ok(Json(map_totals(stats)))
}

pub async fn monthly(
    Extension(user): Extension<user::Model>,
    State(state): State<ServerState>,
    Query(query): Query<MonthQuery>,
) -> Result<Json<MonthlyStatistics>, ServerError> {
    let (year, month) = parse_month(&query.month)?;
    let stats = state
        .engine
        .monthly_statistics(user.id, year, month)
        .await?;
    Ok(Json(MonthlyStatistics {
        month: stats.month,
        totals: map_totals(stats.totals),
    }))
}

pub async fn categories(
    Extension(user): Extension<user::Model>,
    State(state): State<ServerState>,
    Query(query): Query<DateRangeQuery>,
) -> Result<Json<Vec<CategoryStatistic>>, ServerError> {
    let stats = state
        .engine
        .category_statistics(user.id, query.start_date, query.end_date)
        .await?
        .into_iter()
        .map(|stat| CategoryStatistic {
            category_id: stat.category_id,
            category: stat.category.map(map_category),
            total_minor: stat.total_minor,
            transaction_count: stat.transaction_count,
            percentage: stat.percentage,
        })
        .collect();
    Ok(Json(stats))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn month_query_parses_year_and_month() {
        assert!(matches!(parse_month("2024-03"), Ok((2024, 3))));
        assert!(parse_month("2024-13").is_err());
        assert!(parse_month("March").is_err());
    }
}
