use chrono::NaiveDate;
use sea_orm::{ConnectionTrait, Database, DatabaseConnection, Statement};

use engine::{
    AccountType, CategoryType, Engine, EngineError, MAX_AMOUNT_MINOR, NewAccount, NewCategory,
    NewTransaction,
};
use migration::MigratorTrait;

const ALICE: i64 = 1;
const BOB: i64 = 2;

async fn engine_with_db() -> (Engine, DatabaseConnection) {
    let db = Database::connect("sqlite::memory:").await.unwrap();
    migration::Migrator::up(&db, None).await.unwrap();
    let backend = db.get_database_backend();
    for name in ["alice", "bob"] {
        db.execute(Statement::from_sql_and_values(
            backend,
            "INSERT INTO users (username, password) VALUES (?, ?)",
            vec![name.into(), "password".into()],
        ))
        .await
        .unwrap();
    }
    let engine = Engine::builder()
        .database(db.clone())
        .build()
        .await
        .unwrap();
    (engine, db)
}

fn date(month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, month, day).unwrap()
}

async fn account(engine: &Engine, user_id: i64, name: &str) -> i64 {
    engine
        .create_account(
            user_id,
            NewAccount::new(AccountType::Bank, name).initial_balance(100_000),
        )
        .await
        .unwrap()
        .id
}

async fn expense_category(engine: &Engine, name: &str) -> i64 {
    engine
        .create_category(ALICE, NewCategory::new(CategoryType::Expense, name))
        .await
        .unwrap()
        .id
}

#[tokio::test]
async fn range_totals_ignore_transfers_but_count_them() {
    let (engine, _db) = engine_with_db().await;
    let a = account(&engine, ALICE, "A").await;
    let b = account(&engine, ALICE, "B").await;
    let other = account(&engine, BOB, "Other").await;

    for cmd in [
        NewTransaction::income(a, 5000, date(3, 1)),
        NewTransaction::expense(a, 1200, date(3, 5)),
        NewTransaction::expense(b, 300, date(3, 20)),
        NewTransaction::transfer(a, b, 700, date(3, 21)),
        NewTransaction::expense(a, 999, date(4, 1)),
    ] {
        engine.create_transaction(ALICE, cmd).await.unwrap();
    }
    engine
        .create_transaction(BOB, NewTransaction::income(other, 1, date(3, 2)))
        .await
        .unwrap();

    let stats = engine
        .transaction_statistics(ALICE, Some(date(3, 1)), Some(date(3, 31)))
        .await
        .unwrap();
    assert_eq!(stats.total_income, 5000);
    assert_eq!(stats.total_expense, 1500);
    assert_eq!(stats.net, 3500);
    assert_eq!(stats.count, 4);

    let all = engine.transaction_statistics(ALICE, None, None).await.unwrap();
    assert_eq!(all.total_expense, 2499);
    assert_eq!(all.count, 5);

    let err = engine
        .transaction_statistics(ALICE, Some(date(3, 31)), Some(date(3, 1)))
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::Validation(_)));
}

#[tokio::test]
async fn monthly_statistics_cover_the_calendar_month() {
    let (engine, _db) = engine_with_db().await;
    let a = account(&engine, ALICE, "A").await;

    for cmd in [
        NewTransaction::expense(a, 100, date(1, 31)),
        NewTransaction::expense(a, 200, date(2, 1)),
        NewTransaction::income(a, 900, date(2, 29)),
        NewTransaction::expense(a, 400, date(3, 1)),
    ] {
        engine.create_transaction(ALICE, cmd).await.unwrap();
    }

    let february = engine.monthly_statistics(ALICE, 2024, 2).await.unwrap();
    assert_eq!(february.month, "2024-02");
    assert_eq!(february.totals.total_income, 900);
    assert_eq!(february.totals.total_expense, 200);
    assert_eq!(february.totals.net, 700);
    assert_eq!(february.totals.count, 2);

    let empty = engine.monthly_statistics(ALICE, 2023, 7).await.unwrap();
    assert_eq!(empty.totals.count, 0);
    assert_eq!(empty.totals.net, 0);

    let err = engine.monthly_statistics(ALICE, 2024, 13).await.unwrap_err();
    assert!(matches!(err, EngineError::Validation(_)));
}

#[tokio::test]
async fn category_breakdown_shares_add_up() {
    let (engine, _db) = engine_with_db().await;
    let a = account(&engine, ALICE, "A").await;
    let food = expense_category(&engine, "Food").await;
    let rent = expense_category(&engine, "Rent").await;
    let fun = expense_category(&engine, "Fun").await;

    for cmd in [
        NewTransaction::expense(a, 100, date(3, 1)).category_id(food),
        NewTransaction::expense(a, 200, date(3, 2)).category_id(food),
        NewTransaction::expense(a, 500, date(3, 3)).category_id(rent),
        NewTransaction::expense(a, 200, date(3, 4)).category_id(fun),
        NewTransaction::income(a, 10_000, date(3, 5)),
    ] {
        engine.create_transaction(ALICE, cmd).await.unwrap();
    }

    let stats = engine
        .category_statistics(ALICE, Some(date(3, 1)), Some(date(3, 31)))
        .await
        .unwrap();
    assert_eq!(stats.len(), 3);

    assert_eq!(stats[0].category_id, rent);
    assert_eq!(stats[0].total_minor, 500);
    assert!((stats[0].percentage - 50.0).abs() < 1e-9);

    assert_eq!(stats[1].category_id, food);
    assert_eq!(stats[1].total_minor, 300);
    assert_eq!(stats[1].transaction_count, 2);
    assert!((stats[1].percentage - 30.0).abs() < 1e-9);
    assert_eq!(
        stats[1].category.as_ref().map(|c| c.name.as_str()),
        Some("Food")
    );

    assert_eq!(stats[2].category_id, fun);
    assert!((stats[2].percentage - 20.0).abs() < 1e-9);

    let sum: f64 = stats.iter().map(|s| s.percentage).sum();
    assert!((sum - 100.0).abs() < 1e-9);
}

#[tokio::test]
async fn uncategorized_expenses_count_towards_the_total() {
    let (engine, _db) = engine_with_db().await;
    let a = account(&engine, ALICE, "A").await;
    let food = expense_category(&engine, "Food").await;

    engine
        .create_transaction(ALICE, NewTransaction::expense(a, 250, date(6, 1)).category_id(food))
        .await
        .unwrap();
    engine
        .create_transaction(ALICE, NewTransaction::expense(a, 750, date(6, 2)))
        .await
        .unwrap();

    let stats = engine.category_statistics(ALICE, None, None).await.unwrap();
    assert_eq!(stats.len(), 1);
    assert_eq!(stats[0].total_minor, 250);
    assert!((stats[0].percentage - 25.0).abs() < 1e-9);

    assert!(engine.category_statistics(BOB, None, None).await.unwrap().is_empty());
}

#[tokio::test]
async fn totals_hold_amounts_at_the_limit() {
    let (engine, _db) = engine_with_db().await;
    let mut accounts = Vec::new();
    for name in ["A", "B"] {
        let id = engine
            .create_account(ALICE, NewAccount::new(AccountType::Bank, name))
            .await
            .unwrap()
            .id;
        accounts.push(id);
    }
    for id in &accounts {
        engine
            .create_transaction(ALICE, NewTransaction::income(*id, MAX_AMOUNT_MINOR, date(7, 1)))
            .await
            .unwrap();
    }

    let stats = engine.transaction_statistics(ALICE, None, None).await.unwrap();
    assert_eq!(stats.total_income, 2 * MAX_AMOUNT_MINOR);
    assert_eq!(stats.net, 2 * MAX_AMOUNT_MINOR);
    assert_eq!(stats.count, 2);
}
