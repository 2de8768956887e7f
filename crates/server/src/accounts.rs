//! Accounts API endpoints

use api_types::account::{
    AccountNew, AccountType as ApiAccountType, AccountUpdate, AccountView, BalanceSummary,
};
use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
};
use engine::{AccountPatch, AccountType, NewAccount};

use crate::{ServerError, server::ServerState, user};

fn map_type(account_type: AccountType) -> ApiAccountType {
    match account_type {
        AccountType::Bank => ApiAccountType::Bank,
        AccountType::Alipay => ApiAccountType::Alipay,
        AccountType::Wechat => ApiAccountType::Wechat,
        AccountType::Cash => ApiAccountType::Cash,
        AccountType::Credit => ApiAccountType::Credit,
        AccountType::Other => ApiAccountType::Other,
    }
}

fn parse_type(account_type: ApiAccountType) -> AccountType {
    match account_type {
        ApiAccountType::Bank => AccountType::Bank,
        ApiAccountType::Alipay => AccountType::Alipay,
        ApiAccountType::Wechat => AccountType::Wechat,
        ApiAccountType::Cash => AccountType::Cash,
        ApiAccountType::Credit => AccountType::Credit,
        ApiAccountType::Other => AccountType::Other,
    }
}

pub(crate) fn map_account(account: engine::Account) -> AccountView {
    AccountView {
        id: account.id,
        account_type: map_type(account.account_type),
        account_name: account.name,
        account_number: account.number,
        icon: account.icon,
        color: account.color,
        balance_minor: account.balance,
        initial_balance_minor: account.initial_balance,
        include_in_total: account.include_in_total,
        display_order: account.display_order,
        is_active: account.is_active,
        created_at: account.created_at,
        updated_at: account.updated_at,
    }
}

pub async fn list(
    Extension(user): Extension<user::Model>,
    State(state): State<ServerState>,
) -> Result<Json<Vec<AccountView>>, ServerError> {
    let accounts = state
        .engine
        .accounts(user.id)
        .await?
        .into_iter()
        .map(map_account)
        .collect();
    Ok(Json(accounts))
}

pub async fn create(
    Extension(user): Extension<user::Model>,
    State(state): State<ServerState>,
    Json(payload): Json<AccountNew>,
) -> Result<(StatusCode, Json<AccountView>), ServerError> {
    let mut cmd = NewAccount::new(parse_type(payload.account_type), payload.account_name)
        .initial_balance(payload.initial_balance_minor)
        .include_in_total(payload.include_in_total.unwrap_or(true))
        .display_order(payload.display_order);
    cmd.number = payload.account_number;
    cmd.icon = payload.icon;
    cmd.color = payload.color;

    let account = state.engine.create_account(user.id, cmd).await?;
    Ok((StatusCode::CREATED, Json(map_account(account))))
}

pub async fn get(
    Extension(user): Extension<user::Model>,
    State(state): State<ServerState>,
    Path(id): Path<i64>,
) -> Result<Json<AccountView>, ServerError> {
    let account = state.engine.account(user.id, id).await?;
    Ok(Json(map_account(account)))
}

pub async fn update(
    Extension(user): Extension<user::Model>,
    State(state): State<ServerState>,
    Path(id): Path<i64>,
    Json(payload): Json<AccountUpdate>,
) -> Result<Json<AccountView>, ServerError> {
    let patch = AccountPatch {
        name: payload.account_name,
        number: payload.account_number,
        icon: payload.icon,
        color: payload.color,
        include_in_total: payload.include_in_total,
        display_order: payload.display_order,
        is_active: payload.is_active,
        balance_minor: payload.balance_minor,
    };
    let account = state.engine.update_account(user.id, id, patch).await?;
    Ok(Json(map_account(account)))
}

pub async fn delete(
    Extension(user): Extension<user::Model>,
    State(state): State<ServerState>,
    Path(id): Path<i64>,
) -> Result<StatusCode, ServerError> {
    state.engine.delete_account(user.id, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn balance(
    Extension(user): Extension<user::Model>,
    State(state): State<ServerState>,
) -> Result<Json<BalanceSummary>, ServerError> {
    let summary = state.engine.balance_summary(user.id).await?;
    Ok(Json(BalanceSummary {
        total_balance_minor: summary.total,
        total_asset_minor: summary.asset,
        total_debt_minor: summary.debt,
    }))
}
