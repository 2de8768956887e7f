use chrono::NaiveDate;
use sea_orm::{ConnectionTrait, Database, DatabaseConnection, Statement};

use engine::{
    AccountType, CategoryPatch, CategoryType, Engine, EngineError, NewAccount, NewCategory,
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

#[tokio::test]
async fn listing_shows_own_and_system_categories() {
    let (engine, _db) = engine_with_db().await;
    let system = engine
        .create_system_category(NewCategory::new(CategoryType::Expense, "Food").display_order(1))
        .await
        .unwrap();
    let mine = engine
        .create_category(ALICE, NewCategory::new(CategoryType::Expense, "Coffee"))
        .await
        .unwrap();
    let salary = engine
        .create_category(ALICE, NewCategory::new(CategoryType::Income, "Salary"))
        .await
        .unwrap();
    engine
        .create_category(BOB, NewCategory::new(CategoryType::Expense, "Bob only"))
        .await
        .unwrap();

    assert!(system.is_system);
    assert_eq!(system.user_id, None);
    assert!(!mine.is_system);

    let ids: Vec<i64> = engine
        .categories(ALICE, None)
        .await
        .unwrap()
        .into_iter()
        .map(|c| c.id)
        .collect();
    // display order first, then id
    assert_eq!(ids, vec![mine.id, salary.id, system.id]);

    let expense: Vec<i64> = engine
        .categories(ALICE, Some(CategoryType::Expense))
        .await
        .unwrap()
        .into_iter()
        .map(|c| c.id)
        .collect();
    assert_eq!(expense, vec![mine.id, system.id]);

    let shared = engine.system_categories(None).await.unwrap();
    assert_eq!(shared.len(), 1);
    assert_eq!(shared[0].id, system.id);
}

#[tokio::test]
async fn system_categories_are_read_only() {
    let (engine, db) = engine_with_db().await;
    let system = engine
        .create_system_category(NewCategory::new(CategoryType::Expense, "Transport"))
        .await
        .unwrap();

    let err = engine
        .update_category(ALICE, system.id, CategoryPatch::new().name("Taxi"))
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::Forbidden(_)));
    let err = engine.delete_category(ALICE, system.id).await.unwrap_err();
    assert!(matches!(err, EngineError::Forbidden(_)));

    // a creator recorded on a system row grants nothing
    db.execute(Statement::from_sql_and_values(
        db.get_database_backend(),
        "UPDATE categories SET user_id = ? WHERE id = ?",
        vec![ALICE.into(), system.id.into()],
    ))
    .await
    .unwrap();
    let err = engine
        .update_category(ALICE, system.id, CategoryPatch::new().name("Taxi"))
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::Forbidden(_)));
    let err = engine.delete_category(ALICE, system.id).await.unwrap_err();
    assert!(matches!(err, EngineError::Forbidden(_)));

    assert_eq!(
        engine.category(BOB, system.id).await.unwrap().name,
        "Transport"
    );
}

#[tokio::test]
async fn other_users_categories_are_hidden_and_locked() {
    let (engine, _db) = engine_with_db().await;
    let theirs = engine
        .create_category(BOB, NewCategory::new(CategoryType::Expense, "Hobbies"))
        .await
        .unwrap();

    assert_eq!(
        engine.category(ALICE, theirs.id).await.unwrap_err(),
        EngineError::NotFound("category".to_string())
    );
    let err = engine
        .update_category(ALICE, theirs.id, CategoryPatch::new().name("Mine now"))
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::Forbidden(_)));
    let err = engine.delete_category(ALICE, theirs.id).await.unwrap_err();
    assert!(matches!(err, EngineError::Forbidden(_)));

    assert_eq!(
        engine.delete_category(ALICE, 777).await.unwrap_err(),
        EngineError::NotFound("category".to_string())
    );
}

#[tokio::test]
async fn update_renames_and_deactivates() {
    let (engine, _db) = engine_with_db().await;
    let category = engine
        .create_category(ALICE, NewCategory::new(CategoryType::Expense, "Snacks"))
        .await
        .unwrap();

    let err = engine
        .update_category(ALICE, category.id, CategoryPatch::new().name("x".repeat(51)))
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::Validation(_)));

    let updated = engine
        .update_category(
            ALICE,
            category.id,
            CategoryPatch::new().name(" Treats ").is_active(false),
        )
        .await
        .unwrap();
    assert_eq!(updated.name, "Treats");
    assert!(!updated.is_active);
    assert!(engine.categories(ALICE, None).await.unwrap().is_empty());
}

#[tokio::test]
async fn deleting_a_category_clears_transaction_references() {
    let (engine, _db) = engine_with_db().await;
    let account = engine
        .create_account(
            ALICE,
            NewAccount::new(AccountType::Cash, "Cash").initial_balance(1000),
        )
        .await
        .unwrap();
    let category = engine
        .create_category(ALICE, NewCategory::new(CategoryType::Expense, "Books"))
        .await
        .unwrap();
    let date = NaiveDate::from_ymd_opt(2024, 4, 2).unwrap();
    let tx = engine
        .create_transaction(
            ALICE,
            NewTransaction::expense(account.id, 300, date).category_id(category.id),
        )
        .await
        .unwrap();

    engine.delete_category(ALICE, category.id).await.unwrap();

    let detail = engine.transaction(ALICE, tx.transaction.id).await.unwrap();
    assert_eq!(detail.transaction.category_id, None);
    assert_eq!(detail.category, None);
    assert_eq!(detail.transaction.amount_minor, 300);
    assert_eq!(engine.account(ALICE, account.id).await.unwrap().balance, 700);
}
