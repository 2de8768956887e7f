//! Transactions API endpoints

use api_types::transaction::{
    BatchCreate, BatchDelete, BulkResult, SortField as ApiSortField, SortOrder as ApiSortOrder,
    TransactionKind as ApiKind, TransactionListQuery, TransactionListResponse, TransactionNew,
    TransactionUpdate, TransactionView,
};
use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use engine::{
    NewTransaction, SortField, SortOrder, TransactionDetail, TransactionKind,
    TransactionListFilter, TransactionPatch,
};

use crate::{
    ServerError, accounts::map_account, categories::map_category, server::ServerState, user,
};

fn map_kind(kind: TransactionKind) -> ApiKind {
    match kind {
        TransactionKind::Expense => ApiKind::Expense,
        TransactionKind::Income => ApiKind::Income,
        TransactionKind::Transfer => ApiKind::Transfer,
    }
}

fn parse_kind(kind: ApiKind) -> TransactionKind {
    match kind {
        ApiKind::Expense => TransactionKind::Expense,
        ApiKind::Income => TransactionKind::Income,
        ApiKind::Transfer => TransactionKind::Transfer,
    }
}

fn map_currency(currency: engine::Currency) -> api_types::Currency {
    match currency {
        engine::Currency::Cny => api_types::Currency::Cny,
        engine::Currency::Usd => api_types::Currency::Usd,
        engine::Currency::Eur => api_types::Currency::Eur,
        engine::Currency::Hkd => api_types::Currency::Hkd,
        engine::Currency::Gbp => api_types::Currency::Gbp,
        engine::Currency::Jpy => api_types::Currency::Jpy,
    }
}

fn parse_currency(currency: api_types::Currency) -> engine::Currency {
    match currency {
        api_types::Currency::Cny => engine::Currency::Cny,
        api_types::Currency::Usd => engine::Currency::Usd,
        api_types::Currency::Eur => engine::Currency::Eur,
        api_types::Currency::Hkd => engine::Currency::Hkd,
        api_types::Currency::Gbp => engine::Currency::Gbp,
        api_types::Currency::Jpy => engine::Currency::Jpy,
    }
}

fn map_detail(detail: TransactionDetail) -> TransactionView {
    let tx = detail.transaction;
    TransactionView {
        id: tx.id,
        kind: map_kind(tx.kind),
        category_id: tx.category_id,
        account_id: tx.account_id,
        to_account_id: tx.to_account_id,
        amount_minor: tx.amount_minor,
        currency: map_currency(tx.currency),
        title: tx.title,
        description: tx.description,
        location: tx.location,
        transaction_date: tx.transaction_date,
        transaction_time: tx.transaction_time,
        bill_id: tx.bill_id,
        wishlist_id: tx.wishlist_id,
        tags: tx.tags,
        images: tx.images,
        category: detail.category.map(map_category),
        account: detail.account.map(map_account),
        to_account: detail.to_account.map(map_account),
        created_at: tx.created_at,
        updated_at: tx.updated_at,
    }
}

fn new_transaction(payload: TransactionNew) -> NewTransaction {
    let mut cmd = NewTransaction::new(
        parse_kind(payload.kind),
        payload.amount_minor,
        payload.transaction_date,
    );
    cmd.account_id = payload.account_id;
    cmd.to_account_id = payload.to_account_id;
    cmd.category_id = payload.category_id;
    cmd.currency = payload.currency.map(parse_currency);
    cmd.title = payload.title;
    cmd.description = payload.description;
    cmd.location = payload.location;
    cmd.transaction_time = payload.transaction_time;
    cmd.bill_id = payload.bill_id;
    cmd.wishlist_id = payload.wishlist_id;
    cmd.tags = payload.tags;
    cmd.images = payload.images;
    cmd
}

pub async fn list(
    Extension(user): Extension<user::Model>,
    State(state): State<ServerState>,
    Query(query): Query<TransactionListQuery>,
) -> Result<Json<TransactionListResponse>, ServerError> {
    let filter = TransactionListFilter {
        kind: query.kind.map(parse_kind),
        category_id: query.category_id,
        account_id: query.account_id,
        start_date: query.start_date,
        end_date: query.end_date,
        search_keyword: query.keyword,
        sort_by: match query.sort_by.unwrap_or_default() {
            ApiSortField::Date => SortField::Date,
            ApiSortField::Amount => SortField::Amount,
        },
        sort_order: match query.sort_order.unwrap_or_default() {
            ApiSortOrder::Asc => SortOrder::Asc,
            ApiSortOrder::Desc => SortOrder::Desc,
        },
        page: query.page,
        page_size: query.page_size,
    };

    let page = state.engine.list_transactions(user.id, &filter).await?;
    Ok(Json(TransactionListResponse {
        items: page.items.into_iter().map(map_detail).collect(),
        total: page.total,
        page: page.page,
        page_size: page.page_size,
    }))
}

pub async fn create(
    Extension(user): Extension<user::Model>,
    State(state): State<ServerState>,
    Json(payload): Json<TransactionNew>,
) -> Result<(StatusCode, Json<TransactionView>), ServerError> {
    let detail = state
        .engine
        .create_transaction(user.id, new_transaction(payload))
        .await?;
    Ok((StatusCode::CREATED, Json(map_detail(detail))))
}

pub async fn get(
    Extension(user): Extension<user::Model>,
    State(state): State<ServerState>,
    Path(id): Path<i64>,
) -> Result<Json<TransactionView>, ServerError> {
    let detail = state.engine.transaction(user.id, id).await?;
    Ok(Json(map_detail(detail)))
}

pub async fn update(
    Extension(user): Extension<user::Model>,
    State(state): State<ServerState>,
    Path(id): Path<i64>,
    Json(payload): Json<TransactionUpdate>,
) -> Result<Json<TransactionView>, ServerError> {
    let patch = TransactionPatch {
        kind: payload.kind.map(parse_kind),
        category_id: payload.category_id,
        account_id: payload.account_id,
        to_account_id: payload.to_account_id,
        amount_minor: payload.amount_minor,
        currency: payload.currency.map(parse_currency),
        title: payload.title,
        description: payload.description,
        location: payload.location,
        transaction_date: payload.transaction_date,
        transaction_time: payload.transaction_time,
        bill_id: payload.bill_id,
        wishlist_id: payload.wishlist_id,
        tags: payload.tags,
        images: payload.images,
    };
    let detail = state.engine.update_transaction(user.id, id, patch).await?;
    Ok(Json(map_detail(detail)))
}

pub async fn delete(
    Extension(user): Extension<user::Model>,
    State(state): State<ServerState>,
    Path(id): Path<i64>,
) -> Result<StatusCode, ServerError> {
    state.engine.delete_transaction(user.id, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn batch_create(
    Extension(user): Extension<user::Model>,
    State(state): State<ServerState>,
    Json(payload): Json<BatchCreate>,
) -> Result<Json<BulkResult>, ServerError> {
    let cmds = payload
        .transactions
        .into_iter()
        .map(new_transaction)
        .collect();
    let result = state.engine.create_transactions(user.id, cmds).await?;
    Ok(Json(BulkResult {
        success_count: result.success_count,
        failure_count: result.failure_count,
        errors: result.errors,
    }))
}

pub async fn batch_delete(
    Extension(user): Extension<user::Model>,
    State(state): State<ServerState>,
    Json(payload): Json<BatchDelete>,
) -> Result<Json<BulkResult>, ServerError> {
    let result = state
        .engine
        .delete_transactions(user.id, &payload.ids)
        .await?;
    Ok(Json(BulkResult {
        success_count: result.success_count,
        failure_count: result.failure_count,
        errors: result.errors,
    }))
}
