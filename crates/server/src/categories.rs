//! Categories API endpoints.

use api_types::category::{
    CategoryNew, CategoryQuery, CategoryType as ApiCategoryType, CategoryUpdate, CategoryView,
};
use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use engine::{CategoryPatch, CategoryType, NewCategory};

use crate::{ServerError, server::ServerState, user};

fn map_type(kind: CategoryType) -> ApiCategoryType {
    match kind {
        CategoryType::Expense => ApiCategoryType::Expense,
        CategoryType::Income => ApiCategoryType::Income,
    }
}

fn parse_type(kind: ApiCategoryType) -> CategoryType {
    match kind {
        ApiCategoryType::Expense => CategoryType::Expense,
        ApiCategoryType::Income => CategoryType::Income,
    }
}

pub(crate) fn map_category(category: engine::Category) -> CategoryView {
    CategoryView {
        id: category.id,
        kind: map_type(category.kind),
        name: category.name,
        icon: category.icon,
        color: category.color,
        display_order: category.display_order,
        is_system: category.is_system,
        is_active: category.is_active,
    }
}

pub async fn list(
    Extension(user): Extension<user::Model>,
    State(state): State<ServerState>,
    Query(query): Query<CategoryQuery>,
) -> Result<Json<Vec<CategoryView>>, ServerError> {
    let categories = state
        .engine
        .categories(user.id, query.kind.map(parse_type))
        .await?
        .into_iter()
        .map(map_category)
        .collect();
    Ok(Json(categories))
}

pub async fn system(
    State(state): State<ServerState>,
    Query(query): Query<CategoryQuery>,
) -> Result<Json<Vec<CategoryView>>, ServerError> {
    let categories = state
        .engine
        .system_categories(query.kind.map(parse_type))
        .await?
        .into_iter()
        .map(map_category)
        .collect();
    Ok(Json(categories))
}

pub async fn create(
    Extension(user): Extension<user::Model>,
    State(state): State<ServerState>,
    Json(payload): Json<CategoryNew>,
) -> Result<(StatusCode, Json<CategoryView>), ServerError> {
    let mut cmd =
        NewCategory::new(parse_type(payload.kind), payload.name).display_order(payload.display_order);
    cmd.icon = payload.icon;
    cmd.color = payload.color;

    let category = state.engine.create_category(user.id, cmd).await?;
    Ok((StatusCode::CREATED, Json(map_category(category))))
}

pub async fn get(
    Extension(user): Extension<user::Model>,
    State(state): State<ServerState>,
    Path(id): Path<i64>,
) -> Result<Json<CategoryView>, ServerError> {
    let category = state.engine.category(user.id, id).await?;
    Ok(Json(map_category(category)))
}

pub async fn update(
    Extension(user): Extension<user::Model>,
    State(state): State<ServerState>,
    Path(id): Path<i64>,
    Json(payload): Json<CategoryUpdate>,
) -> Result<Json<CategoryView>, ServerError> {
    let patch = CategoryPatch {
        name: payload.name,
        icon: payload.icon,
        color: payload.color,
        display_order: payload.display_order,
        is_active: payload.is_active,
    };
    let category = state.engine.update_category(user.id, id, patch).await?;
    Ok(Json(map_category(category)))
}

pub async fn delete(
    Extension(user): Extension<user::Model>,
    State(state): State<ServerState>,
    Path(id): Path<i64>,
) -> Result<StatusCode, ServerError> {
    state.engine.delete_category(user.id, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
