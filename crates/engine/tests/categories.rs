use chrono::{TimeZone, Utc};
use sea_orm::Database;

use engine::{
    DEFAULT_CATEGORIES, Engine, EngineError, ErrorKind, NewPlanCmd, NewTransactionCmd,
    TransactionKind, WalletKind,
};
use migration::MigratorTrait;

async fn engine_with_db() -> Engine {
    let db = Database::connect("sqlite::memory:").await.unwrap();
    migration::Migrator::up(&db, None).await.unwrap();
    Engine::builder().database(db).build().await.unwrap()
}

#[tokio::test]
async fn default_categories_are_seeded_once() {
    let engine = engine_with_db().await;
    let added = engine.seed_default_categories("alice").await.unwrap();
    assert_eq!(added, DEFAULT_CATEGORIES.len());
    assert_eq!(engine.seed_default_categories("alice").await.unwrap(), 0);

    let expenses = engine
        .list_categories("alice", Some(TransactionKind::Expense))
        .await
        .unwrap();
    assert!(expenses.iter().all(|c| c.kind == TransactionKind::Expense));
    assert!(expenses.iter().any(|c| c.name == "Dining out"));
    let incomes = engine
        .list_categories("alice", Some(TransactionKind::Income))
        .await
        .unwrap();
    assert_eq!(expenses.len() + incomes.len(), DEFAULT_CATEGORIES.len());
    assert!(engine.list_categories("bob", None).await.unwrap().is_empty());
}

#[tokio::test]
async fn seeding_keeps_user_categories() {
    let engine = engine_with_db().await;
    let own = engine
        .new_category("alice", "groceries", TransactionKind::Expense, Some("cart"))
        .await
        .unwrap();

    let added = engine.seed_default_categories("alice").await.unwrap();
    assert_eq!(added, DEFAULT_CATEGORIES.len() - 1);
    let category = engine.category(own).await.unwrap();
    assert_eq!(category.name, "groceries");
    assert_eq!(category.icon, "cart");
}

#[tokio::test]
async fn category_names_collide_after_normalization() {
    let engine = engine_with_db().await;
    engine
        .new_category("alice", "Dining out", TransactionKind::Expense, None)
        .await
        .unwrap();

    for name in ["dining-out", "  DINING   OUT ", "Dïning out"] {
        let err = engine
            .new_category("alice", name, TransactionKind::Expense, None)
            .await
            .unwrap_err();
        assert!(matches!(err, EngineError::ExistingKey(_)), "{name}");
    }

    let err = engine
        .new_category("alice", "?!", TransactionKind::Expense, None)
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::InvalidName(_)));
}

#[tokio::test]
async fn update_category_renames_and_changes_icon() {
    let engine = engine_with_db().await;
    let id = engine
        .new_category("alice", "Travel", TransactionKind::Expense, None)
        .await
        .unwrap();
    engine
        .new_category("alice", "Fuel", TransactionKind::Expense, None)
        .await
        .unwrap();
    assert_eq!(engine.category(id).await.unwrap().icon, "default");

    let err = engine
        .update_category(id, Some("fuel"), None)
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Conflict);

    let updated = engine
        .update_category(id, Some("Holidays"), Some("plane"))
        .await
        .unwrap();
    assert_eq!(updated.name, "Holidays");
    assert_eq!(updated.icon, "plane");
    assert_eq!(engine.category(id).await.unwrap(), updated);
}

#[tokio::test]
async fn deleting_category_cascades_consistently() {
    let engine = engine_with_db().await;
    let wallet_id = engine
        .new_wallet("alice", "Main", WalletKind::Private, None)
        .await
        .unwrap();
    let food = engine
        .new_category("alice", "Food", TransactionKind::Expense, None)
        .await
        .unwrap();
    let snacks = engine
        .new_category("alice", "Snacks", TransactionKind::Expense, None)
        .await
        .unwrap();
    let at = Utc.with_ymd_and_hms(2024, 8, 10, 12, 0, 0).unwrap();

    engine
        .create_transaction(
            NewTransactionCmd::expense(wallet_id, "alice", 1_000, food, "Lunch").created_at(at),
        )
        .await
        .unwrap();
    let chips = engine
        .create_transaction(
            NewTransactionCmd::expense(wallet_id, "alice", 250, snacks, "Chips").created_at(at),
        )
        .await
        .unwrap();
    let budget = engine
        .create_plan(NewPlanCmd::budget(
            wallet_id,
            "Eating",
            10_000,
            Utc.with_ymd_and_hms(2024, 8, 1, 0, 0, 0).unwrap(),
            Utc.with_ymd_and_hms(2024, 9, 1, 0, 0, 0).unwrap(),
            vec![food, snacks],
        ))
        .await
        .unwrap();
    assert_eq!(budget.budget().unwrap().spent_amount, 1_250);

    engine.delete_category(food).await.unwrap();

    assert_eq!(engine.category(food).await.unwrap_err().kind(), ErrorKind::NotFound);
    let wallet = engine.wallet(wallet_id).await.unwrap();
    assert_eq!(wallet.balance, -250);
    assert_eq!(wallet.transactions, vec![chips.id]);

    let budget = engine.plan(wallet_id, budget.id).await.unwrap();
    let facet = budget.budget().unwrap();
    assert_eq!(facet.categories, vec![snacks]);
    assert_eq!(facet.spent_amount, 250);
    assert_eq!(facet.records, vec![chips.id]);
    assert!(engine.check_wallet(wallet_id).await.unwrap().is_consistent());
}
