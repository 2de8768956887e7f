use chrono::NaiveDate;
use sea_orm::{ConnectionTrait, Database, DatabaseConnection, Statement};

use engine::{
    AccountPatch, AccountType, Engine, EngineError, MAX_AMOUNT_MINOR, NewAccount, NewTransaction,
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

fn date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 5, 1).unwrap()
}

#[tokio::test]
async fn create_account_starts_at_initial_balance() {
    let (engine, _db) = engine_with_db().await;
    let account = engine
        .create_account(
            ALICE,
            NewAccount::new(AccountType::Alipay, "  Wallet  ")
                .initial_balance(1234)
                .color("#00aaff"),
        )
        .await
        .unwrap();

    assert_eq!(account.name, "Wallet");
    assert_eq!(account.balance, 1234);
    assert_eq!(account.initial_balance, 1234);
    assert_eq!(account.account_type, AccountType::Alipay);
    assert!(account.is_active);
    assert!(account.include_in_total);
}

#[tokio::test]
async fn blank_or_long_names_are_rejected() {
    let (engine, _db) = engine_with_db().await;
    let err = engine
        .create_account(ALICE, NewAccount::new(AccountType::Cash, "   "))
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::Validation(_)));

    let err = engine
        .create_account(ALICE, NewAccount::new(AccountType::Cash, "x".repeat(101)))
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::Validation(_)));
    assert!(engine.accounts(ALICE).await.unwrap().is_empty());
}

#[tokio::test]
async fn accounts_are_private_to_their_owner() {
    let (engine, _db) = engine_with_db().await;
    let account = engine
        .create_account(ALICE, NewAccount::new(AccountType::Bank, "Checking"))
        .await
        .unwrap();

    assert!(engine.accounts(BOB).await.unwrap().is_empty());
    assert_eq!(
        engine.account(BOB, account.id).await.unwrap_err(),
        EngineError::NotFound("account".to_string())
    );
    assert_eq!(
        engine
            .update_account(BOB, account.id, AccountPatch::new().name("Mine"))
            .await
            .unwrap_err(),
        EngineError::NotFound("account".to_string())
    );
    assert_eq!(
        engine.delete_account(BOB, account.id).await.unwrap_err(),
        EngineError::NotFound("account".to_string())
    );
}

#[tokio::test]
async fn delete_is_soft_and_keeps_history() {
    let (engine, _db) = engine_with_db().await;
    let account = engine
        .create_account(
            ALICE,
            NewAccount::new(AccountType::Bank, "Old card").initial_balance(500),
        )
        .await
        .unwrap();
    let tx = engine
        .create_transaction(ALICE, NewTransaction::expense(account.id, 200, date()))
        .await
        .unwrap();

    engine.delete_account(ALICE, account.id).await.unwrap();

    assert!(engine.accounts(ALICE).await.unwrap().is_empty());
    let stored = engine.account(ALICE, account.id).await.unwrap();
    assert!(!stored.is_active);
    assert_eq!(stored.balance, 300);

    let detail = engine.transaction(ALICE, tx.transaction.id).await.unwrap();
    assert_eq!(detail.account.map(|a| a.id), Some(account.id));
}

#[tokio::test]
async fn balance_summary_splits_assets_and_debts() {
    let (engine, _db) = engine_with_db().await;
    engine
        .create_account(
            ALICE,
            NewAccount::new(AccountType::Bank, "Checking").initial_balance(10_000),
        )
        .await
        .unwrap();
    engine
        .create_account(
            ALICE,
            NewAccount::new(AccountType::Credit, "Visa").initial_balance(-2_500),
        )
        .await
        .unwrap();
    engine
        .create_account(
            ALICE,
            NewAccount::new(AccountType::Other, "Hidden")
                .initial_balance(99_999)
                .include_in_total(false),
        )
        .await
        .unwrap();
    let closed = engine
        .create_account(
            ALICE,
            NewAccount::new(AccountType::Cash, "Closed").initial_balance(700),
        )
        .await
        .unwrap();
    engine.delete_account(ALICE, closed.id).await.unwrap();

    let summary = engine.balance_summary(ALICE).await.unwrap();
    assert_eq!(summary.asset, 10_000);
    assert_eq!(summary.debt, 2_500);
    assert_eq!(summary.total, 7_500);

    let empty = engine.balance_summary(BOB).await.unwrap();
    assert_eq!(empty.total, 0);
}

#[tokio::test]
async fn manual_correction_is_undone_by_recompute() {
    let (engine, _db) = engine_with_db().await;
    let account = engine
        .create_account(
            ALICE,
            NewAccount::new(AccountType::Bank, "Checking").initial_balance(1000),
        )
        .await
        .unwrap();
    engine
        .create_transaction(ALICE, NewTransaction::income(account.id, 250, date()))
        .await
        .unwrap();

    let corrected = engine
        .update_account(ALICE, account.id, AccountPatch::new().balance(42))
        .await
        .unwrap();
    assert_eq!(corrected.balance, 42);
    assert_eq!(corrected.initial_balance, 1000);

    let recomputed = engine.recompute_balances(ALICE).await.unwrap();
    assert_eq!(recomputed.len(), 1);
    assert_eq!(recomputed[0].balance, 1250);
    assert_eq!(engine.account(ALICE, account.id).await.unwrap().balance, 1250);
}

#[tokio::test]
async fn update_patches_only_given_fields() {
    let (engine, _db) = engine_with_db().await;
    let account = engine
        .create_account(
            ALICE,
            NewAccount::new(AccountType::Wechat, "Pay")
                .initial_balance(300)
                .display_order(3),
        )
        .await
        .unwrap();

    let updated = engine
        .update_account(
            ALICE,
            account.id,
            AccountPatch::new().name("WeChat Pay").include_in_total(false),
        )
        .await
        .unwrap();
    assert_eq!(updated.name, "WeChat Pay");
    assert!(!updated.include_in_total);
    assert_eq!(updated.display_order, 3);
    assert_eq!(updated.balance, 300);
}

#[tokio::test]
async fn balances_beyond_the_limit_are_rejected() {
    let (engine, _db) = engine_with_db().await;
    let err = engine
        .create_account(
            ALICE,
            NewAccount::new(AccountType::Bank, "Too rich").initial_balance(MAX_AMOUNT_MINOR + 1),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::Validation(_)), "{err:?}");
    assert!(engine.accounts(ALICE).await.unwrap().is_empty());

    let account = engine
        .create_account(
            ALICE,
            NewAccount::new(AccountType::Credit, "Card").initial_balance(-MAX_AMOUNT_MINOR),
        )
        .await
        .unwrap();
    let err = engine
        .update_account(ALICE, account.id, AccountPatch::new().balance(i64::MIN))
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::Validation(_)), "{err:?}");
    assert_eq!(
        engine.account(ALICE, account.id).await.unwrap().balance,
        -MAX_AMOUNT_MINOR
    );
}
