use axum::{
    Router,
    extract::{Request, State},
    http::StatusCode,
    middleware::{self, Next},
    response::Response,
    routing::{get, post},
};
use axum_extra::{
    TypedHeader,
    headers::{Authorization, authorization::Basic},
};
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter};

use std::sync::Arc;

use crate::{accounts, categories, statistics, transactions, user};
use engine::Engine;

#[derive(Clone)]
pub struct ServerState {
    pub engine: Arc<Engine>,
    pub db: DatabaseConnection,
}

/// Resolves the Basic credentials to a user and stores it in the request
/// extensions for the handlers.
async fn auth(
    auth_header: Option<TypedHeader<Authorization<Basic>>>,
    State(state): State<ServerState>,
    mut request: Request,
    next: Next,
) -> Result<Response, StatusCode> {
    let Some(TypedHeader(auth_header)) = auth_header else {
        return Err(StatusCode::UNAUTHORIZED);
    };
    if auth_header.username().is_empty() || auth_header.password().is_empty() {
        return Err(StatusCode::UNAUTHORIZED);
    }

    let user: Option<user::Model> = user::Entity::find()
        .filter(user::Column::Username.eq(auth_header.username()))
        .filter(user::Column::Password.eq(auth_header.password()))
        .one(&state.db)
        .await
        .map_err(|err| {
            tracing::error!("failed to load user: {err}");
            StatusCode::UNAUTHORIZED
        })?;

    let Some(user) = user else {
        return Err(StatusCode::UNAUTHORIZED);
    };

    request.extensions_mut().insert(user);
    Ok(next.run(request).await)
}

async fn health() -> &'static str {
    "ok"
}

fn api(state: ServerState) -> Router<ServerState> {
    Router::new()
        .route(
            "/transactions",
            get(transactions::list).post(transactions::create),
        )
        .route("/transactions/batch", post(transactions::batch_create))
        .route(
            "/transactions/batch/delete",
            post(transactions::batch_delete),
        )
        .route("/transactions/stats", get(statistics::range))
        .route("/transactions/stats/monthly", get(statistics::monthly))
        .route(
            "/transactions/stats/categories",
            get(statistics::categories),
        )
        .route(
            "/transactions/{id}",
            get(transactions::get)
                .put(transactions::update)
                .delete(transactions::delete),
        )
        .route("/accounts", get(accounts::list).post(accounts::create))
        .route("/accounts/balance", get(accounts::balance))
        .route(
            "/accounts/{id}",
            get(accounts::get)
                .put(accounts::update)
                .delete(accounts::delete),
        )
        .route(
            "/categories",
            get(categories::list).post(categories::create),
        )
        .route("/categories/system", get(categories::system))
        .route(
            "/categories/{id}",
            get(categories::get)
                .put(categories::update)
                .delete(categories::delete),
        )
        .route_layer(middleware::from_fn_with_state(state, auth))
}

fn router(state: ServerState) -> Router {
    Router::new()
        .route("/health", get(health))
        .nest("/api/v1", api(state.clone()))
        .with_state(state)
}

/// Binds `addr` and serves until the listener fails.
pub async fn run(engine: Engine, db: DatabaseConnection, addr: &str) {
    let listener = match tokio::net::TcpListener::bind(addr).await {
        Ok(listener) => listener,
        Err(err) => {
            tracing::error!("failed to bind server listener on {addr}: {err}");
            return;
        }
    };
    if let Err(err) = run_with_listener(engine, db, listener).await {
        tracing::error!("server failed: {err}");
    }
}

pub async fn run_with_listener(
    engine: Engine,
    db: DatabaseConnection,
    listener: tokio::net::TcpListener,
) -> Result<(), std::io::Error> {
    let addr = listener.local_addr()?;
    tracing::info!("Server listening on {}", addr);

    let state = ServerState {
        engine: Arc::new(engine),
        db,
    };

    axum::serve(listener, router(state)).await
}

pub fn spawn_with_listener(
    engine: Engine,
    db: DatabaseConnection,
    listener: tokio::net::TcpListener,
) -> Result<std::net::SocketAddr, std::io::Error> {
    let addr = listener.local_addr()?;

    tokio::spawn(async move {
        if let Err(err) = run_with_listener(engine, db, listener).await {
            tracing::error!("server failed: {err}");
        }
    });

    Ok(addr)
}

#[cfg(test)]
mod tests {
    use super::*;

    use axum::{
        body::Body,
        http::{Method, header},
    };
    use base64::Engine as _;
    use http_body_util::BodyExt;
    use migration::MigratorTrait;
    use sea_orm::{ConnectionTrait, Database, Statement};
    use serde_json::{Value, json};
    use tower::ServiceExt;

    async fn test_state() -> ServerState {
        let db = Database::connect("sqlite::memory:").await.unwrap();
        migration::Migrator::up(&db, None).await.unwrap();
        let backend = db.get_database_backend();
        db.execute(Statement::from_sql_and_values(
            backend,
            "INSERT INTO users (username, password) VALUES (?, ?)",
            vec!["alice".into(), "password".into()],
        ))
        .await
        .unwrap();
        let engine = Engine::builder()
            .database(db.clone())
            .build()
            .await
            .unwrap();
        ServerState {
            engine: Arc::new(engine),
            db,
        }
    }

    fn basic(user: &str, password: &str) -> String {
        let token = base64::engine::general_purpose::STANDARD.encode(format!("{user}:{password}"));
        format!("Basic {token}")
    }

    async fn call(
        state: &ServerState,
        method: Method,
        uri: &str,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder()
            .method(method)
            .uri(uri)
            .header(header::AUTHORIZATION, basic("alice", "password"));
        let body = match body {
            Some(body) => {
                builder = builder.header(header::CONTENT_TYPE, "application/json");
                Body::from(body.to_string())
            }
            None => Body::empty(),
        };
        let response = router(state.clone())
            .oneshot(builder.body(body).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, value)
    }

    #[tokio::test]
    async fn health_needs_no_credentials() {
        let state = test_state().await;
        let response = router(state)
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn api_rejects_missing_or_wrong_credentials() {
        let state = test_state().await;
        let response = router(state.clone())
            .oneshot(
                Request::builder()
                    .uri("/api/v1/accounts")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let response = router(state)
            .oneshot(
                Request::builder()
                    .uri("/api/v1/accounts")
                    .header(header::AUTHORIZATION, basic("alice", "nope"))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn expense_round_trip_updates_account_balance() {
        let state = test_state().await;

        let (status, account) = call(
            &state,
            Method::POST,
            "/api/v1/accounts",
            Some(json!({
                "account_type": "bank",
                "account_name": "Checking",
                "initial_balance_minor": 100000
            })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        let account_id = account["id"].as_i64().unwrap();

        let (status, tx) = call(
            &state,
            Method::POST,
            "/api/v1/transactions",
            Some(json!({
                "type": "expense",
                "account_id": account_id,
                "amount_minor": 2500,
                "title": "Groceries",
                "transaction_date": "2024-03-15"
            })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(tx["account"]["balance_minor"], json!(97500));
        let tx_id = tx["id"].as_i64().unwrap();

        let (status, page) = call(&state, Method::GET, "/api/v1/transactions?keyword=grocer", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(page["total"], json!(1));

        let (status, _) = call(
            &state,
            Method::DELETE,
            &format!("/api/v1/transactions/{tx_id}"),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::NO_CONTENT);

        let (_, account) = call(
            &state,
            Method::GET,
            &format!("/api/v1/accounts/{account_id}"),
            None,
        )
        .await;
        assert_eq!(account["balance_minor"], json!(100000));
    }

    #[tokio::test]
    async fn errors_map_to_status_codes() {
        let state = test_state().await;
        let system = state
            .engine
            .create_system_category(engine::NewCategory::new(
                engine::CategoryType::Expense,
                "Food",
            ))
            .await
            .unwrap();

        let (status, body) = call(
            &state,
            Method::PUT,
            &format!("/api/v1/categories/{}", system.id),
            Some(json!({ "name": "Snacks" })),
        )
        .await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert!(body["error"].as_str().is_some());

        let (status, _) = call(&state, Method::GET, "/api/v1/transactions/999", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, _) = call(
            &state,
            Method::POST,
            "/api/v1/transactions",
            Some(json!({
                "type": "expense",
                "account_id": 42,
                "amount_minor": 100,
                "transaction_date": "2024-03-15"
            })),
        )
        .await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

        let (status, _) = call(
            &state,
            Method::GET,
            "/api/v1/transactions/stats/monthly?month=2024-3x",
            None,
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }
}
