use chrono::{DateTime, TimeZone, Utc};
use sea_orm::Database;

use engine::{
    Engine, EngineError, ErrorKind, NewPlanCmd, NewTransactionCmd, PlanKind, PlanListFilter,
    TransactionKind, UpdatePlanCmd, WalletKind,
};
use migration::MigratorTrait;
use uuid::Uuid;

async fn engine_with_wallet() -> (Engine, Uuid, Uuid, Uuid) {
    let db = Database::connect("sqlite::memory:").await.unwrap();
    migration::Migrator::up(&db, None).await.unwrap();
    let engine = Engine::builder().database(db).build().await.unwrap();

    let wallet_id = engine
        .new_wallet("bob", "Household", WalletKind::Shared, Some("house"))
        .await
        .unwrap();
    let groceries = engine
        .new_category("bob", "Groceries", TransactionKind::Expense, None)
        .await
        .unwrap();
    let transport = engine
        .new_category("bob", "Transportation", TransactionKind::Expense, None)
        .await
        .unwrap();
    (engine, wallet_id, groceries, transport)
}

fn day(month: u32, day: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, month, day, 10, 0, 0).unwrap()
}

fn goal_end() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2030, 1, 1, 0, 0, 0).unwrap()
}

#[tokio::test]
async fn goal_records_drive_current_amount() {
    let (engine, wallet_id, _, _) = engine_with_wallet().await;
    let goal = engine
        .create_plan(NewPlanCmd::goal(wallet_id, "New car", 5_000_000, goal_end()))
        .await
        .unwrap();
    assert_eq!(goal.kind(), PlanKind::Goal);
    assert_eq!(goal.goal().unwrap().current_amount, 0);

    let plan = engine
        .add_goal_record(wallet_id, goal.id, 1_000_000, Some("bonus"))
        .await
        .unwrap();
    let record_id = plan.goal().unwrap().records[0].id;
    assert_eq!(plan.goal().unwrap().current_amount, 1_000_000);

    let plan = engine
        .update_goal_record(wallet_id, goal.id, record_id, 10_000)
        .await
        .unwrap();
    assert_eq!(plan.goal().unwrap().current_amount, 10_000);

    let plan = engine
        .delete_goal_record(wallet_id, goal.id, record_id)
        .await
        .unwrap();
    assert_eq!(plan.goal().unwrap().current_amount, 0);
    assert!(plan.goal().unwrap().records.is_empty());

    let stored = engine.plan(wallet_id, goal.id).await.unwrap();
    assert_eq!(stored, plan);
}

#[tokio::test]
async fn negative_goal_record_is_invalid_input() {
    let (engine, wallet_id, _, _) = engine_with_wallet().await;
    let goal = engine
        .create_plan(NewPlanCmd::goal(wallet_id, "Trip", 100_000, goal_end()))
        .await
        .unwrap();

    let err = engine
        .add_goal_record(wallet_id, goal.id, -1, None)
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidInput);
    assert!(matches!(err, EngineError::InvalidAmount(_)));

    let stored = engine.plan(wallet_id, goal.id).await.unwrap();
    assert_eq!(stored.goal().unwrap().current_amount, 0);
    assert!(stored.goal().unwrap().records.is_empty());
}

#[tokio::test]
async fn unknown_goal_record_is_not_found() {
    let (engine, wallet_id, _, _) = engine_with_wallet().await;
    let goal = engine
        .create_plan(NewPlanCmd::goal(wallet_id, "Trip", 100_000, goal_end()))
        .await
        .unwrap();

    let err = engine
        .update_goal_record(wallet_id, goal.id, Uuid::new_v4(), 5)
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
    let err = engine
        .delete_goal_record(wallet_id, goal.id, Uuid::new_v4())
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
}

#[tokio::test]
async fn goal_opening_amount_becomes_first_record() {
    let (engine, wallet_id, _, _) = engine_with_wallet().await;
    let goal = engine
        .create_plan(
            NewPlanCmd::goal(wallet_id, "Emergency fund", 1_000_000, goal_end())
                .current_amount(250_000),
        )
        .await
        .unwrap();

    let stored = engine.plan(wallet_id, goal.id).await.unwrap();
    let facet = stored.goal().unwrap();
    assert_eq!(facet.current_amount, 250_000);
    assert_eq!(facet.records.len(), 1);
    assert_eq!(facet.records[0].amount, 250_000);
    assert_eq!(engine.check_wallet(wallet_id).await.unwrap().issues, vec![]);
}

#[tokio::test]
async fn new_budget_tracks_existing_expenses() {
    let (engine, wallet_id, groceries, transport) = engine_with_wallet().await;
    let inside = engine
        .create_transaction(
            NewTransactionCmd::expense(wallet_id, "bob", 12_000, groceries, "Market")
                .created_at(day(6, 3)),
        )
        .await
        .unwrap();
    engine
        .create_transaction(
            NewTransactionCmd::expense(wallet_id, "bob", 3_000, transport, "Bus")
                .created_at(day(6, 4)),
        )
        .await
        .unwrap();
    engine
        .create_transaction(
            NewTransactionCmd::expense(wallet_id, "bob", 9_000, groceries, "May market")
                .created_at(day(5, 28)),
        )
        .await
        .unwrap();

    let budget = engine
        .create_plan(
            NewPlanCmd::budget(wallet_id, "June food", 300_000, day(6, 1), day(7, 1), vec![
                groceries,
            ])
            .description("weekly shopping"),
        )
        .await
        .unwrap();

    let facet = budget.budget().unwrap();
    assert_eq!(facet.spent_amount, 12_000);
    assert_eq!(facet.records, vec![inside.id]);
    assert_eq!(facet.remaining(), 288_000);
    assert_eq!(budget.description.as_deref(), Some("weekly shopping"));
}

#[tokio::test]
async fn budget_update_rescans_transactions() {
    let (engine, wallet_id, groceries, transport) = engine_with_wallet().await;
    let market = engine
        .create_transaction(
            NewTransactionCmd::expense(wallet_id, "bob", 12_000, groceries, "Market")
                .created_at(day(6, 3)),
        )
        .await
        .unwrap();
    let bus = engine
        .create_transaction(
            NewTransactionCmd::expense(wallet_id, "bob", 3_000, transport, "Bus")
                .created_at(day(6, 4)),
        )
        .await
        .unwrap();
    let budget = engine
        .create_plan(NewPlanCmd::budget(
            wallet_id,
            "June",
            300_000,
            day(6, 1),
            day(7, 1),
            vec![groceries],
        ))
        .await
        .unwrap();

    let updated = engine
        .update_plan(
            UpdatePlanCmd::new(wallet_id, PlanKind::Budget, budget.id)
                .categories(vec![groceries, transport])
                .target_amount(400_000),
        )
        .await
        .unwrap();
    let facet = updated.budget().unwrap();
    assert_eq!(facet.spent_amount, 15_000);
    assert_eq!(facet.records, vec![market.id, bus.id]);
    assert_eq!(facet.target_amount, 400_000);

    let updated = engine
        .update_plan(
            UpdatePlanCmd::new(wallet_id, PlanKind::Budget, budget.id).start_date(day(6, 4)),
        )
        .await
        .unwrap();
    let facet = updated.budget().unwrap();
    assert_eq!(facet.spent_amount, 3_000);
    assert_eq!(facet.records, vec![bus.id]);

    // same patch twice gives the same state
    let again = engine
        .update_plan(
            UpdatePlanCmd::new(wallet_id, PlanKind::Budget, budget.id).start_date(day(6, 4)),
        )
        .await
        .unwrap();
    assert_eq!(again, updated);
    assert_eq!(engine.plan(wallet_id, budget.id).await.unwrap(), updated);
}

#[tokio::test]
async fn budget_end_must_follow_start() {
    let (engine, wallet_id, groceries, _) = engine_with_wallet().await;
    let err = engine
        .create_plan(NewPlanCmd::budget(
            wallet_id,
            "Backwards",
            1_000,
            day(6, 10),
            day(6, 10),
            vec![groceries],
        ))
        .await
        .unwrap_err();
    assert_eq!(
        err,
        EngineError::InvalidDate("end date must be greater than start date".to_string())
    );

    let budget = engine
        .create_plan(NewPlanCmd::budget(
            wallet_id,
            "Forwards",
            1_000,
            day(6, 10),
            day(6, 20),
            vec![groceries],
        ))
        .await
        .unwrap();
    let err = engine
        .update_plan(UpdatePlanCmd::new(wallet_id, PlanKind::Budget, budget.id).end_date(day(6, 1)))
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::InvalidDate(_)));
}

#[tokio::test]
async fn budget_needs_existing_categories() {
    let (engine, wallet_id, _, _) = engine_with_wallet().await;
    let err = engine
        .create_plan(NewPlanCmd::budget(
            wallet_id,
            "Nothing",
            1_000,
            day(6, 1),
            day(7, 1),
            vec![],
        ))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidInput);
    assert!(matches!(err, EngineError::InvalidCategories(_)));

    let err = engine
        .create_plan(NewPlanCmd::budget(
            wallet_id,
            "Ghost",
            1_000,
            day(6, 1),
            day(7, 1),
            vec![Uuid::new_v4()],
        ))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
    assert!(engine.plans(wallet_id, &PlanListFilter::default()).await.unwrap().is_empty());
}

#[tokio::test]
async fn plan_kind_must_match() {
    let (engine, wallet_id, groceries, _) = engine_with_wallet().await;
    let goal = engine
        .create_plan(NewPlanCmd::goal(wallet_id, "House", 10_000_000, goal_end()))
        .await
        .unwrap();
    let budget = engine
        .create_plan(NewPlanCmd::budget(
            wallet_id,
            "Food",
            1_000,
            day(6, 1),
            day(7, 1),
            vec![groceries],
        ))
        .await
        .unwrap();

    let err = engine
        .update_plan(UpdatePlanCmd::new(wallet_id, PlanKind::Budget, goal.id).target_amount(1))
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::InvalidPlanType(_)));

    let err = engine
        .update_plan(
            UpdatePlanCmd::new(wallet_id, PlanKind::Goal, goal.id).categories(vec![groceries]),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::InvalidPlanType(_)));

    let err = engine
        .create_plan(
            NewPlanCmd::goal(wallet_id, "Boat", 1_000, goal_end()).start_date(day(6, 1)),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::InvalidPlanType(_)));

    let err = engine
        .add_goal_record(wallet_id, budget.id, 10, None)
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::InvalidPlanType(_)));

    let err = engine
        .delete_plan(wallet_id, PlanKind::Goal, budget.id)
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::InvalidPlanType(_)));
    assert!(engine.plan(wallet_id, budget.id).await.is_ok());

    let err = "savings".parse::<PlanKind>().unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidInput);
}

#[tokio::test]
async fn goal_update_changes_target_only() {
    let (engine, wallet_id, _, _) = engine_with_wallet().await;
    let goal = engine
        .create_plan(
            NewPlanCmd::goal(wallet_id, "Laptop", 200_000, goal_end()).current_amount(50_000),
        )
        .await
        .unwrap();

    let updated = engine
        .update_plan(
            UpdatePlanCmd::new(wallet_id, PlanKind::Goal, goal.id)
                .target_amount(300_000)
                .name("Gaming laptop")
                .description(Some("with a good GPU".to_string())),
        )
        .await
        .unwrap();

    assert_eq!(updated.name, "Gaming laptop");
    let facet = updated.goal().unwrap();
    assert_eq!(facet.target_amount, 300_000);
    assert_eq!(facet.current_amount, 50_000);
    assert_eq!(facet.records, goal.goal().unwrap().records);
}

#[tokio::test]
async fn plan_names_are_unique_per_wallet() {
    let (engine, wallet_id, _, _) = engine_with_wallet().await;
    engine
        .create_plan(NewPlanCmd::goal(wallet_id, "Holiday", 1_000, goal_end()))
        .await
        .unwrap();

    let err = engine
        .create_plan(NewPlanCmd::goal(wallet_id, "  holiday ", 2_000, goal_end()))
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::ExistingKey(_)));
    assert_eq!(err.kind(), ErrorKind::Conflict);

    let other = engine
        .new_wallet("bob", "Personal", WalletKind::Private, None)
        .await
        .unwrap();
    engine
        .create_plan(NewPlanCmd::goal(other, "Holiday", 1_000, goal_end()))
        .await
        .unwrap();
}

#[tokio::test]
async fn plans_list_filters_by_kind_and_activity() {
    let (engine, wallet_id, groceries, _) = engine_with_wallet().await;
    let old_budget = engine
        .create_plan(NewPlanCmd::budget(
            wallet_id,
            "January",
            1_000,
            day(1, 1),
            day(2, 1),
            vec![groceries],
        ))
        .await
        .unwrap();
    let budget = engine
        .create_plan(NewPlanCmd::budget(
            wallet_id,
            "December",
            1_000,
            day(12, 1),
            Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap(),
            vec![groceries],
        ))
        .await
        .unwrap();
    let goal = engine
        .create_plan(NewPlanCmd::goal(wallet_id, "Bike", 1_000, goal_end()))
        .await
        .unwrap();

    let ids = |plans: Vec<engine::Plan>| plans.into_iter().map(|p| p.id).collect::<Vec<_>>();

    let all = engine.plans(wallet_id, &PlanListFilter::default()).await.unwrap();
    assert_eq!(ids(all), vec![old_budget.id, budget.id, goal.id]);

    let budgets = engine
        .plans(wallet_id, &PlanListFilter {
            kind: Some(PlanKind::Budget),
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(ids(budgets), vec![old_budget.id, budget.id]);

    let active = engine
        .plans(wallet_id, &PlanListFilter {
            active_at: Some(day(6, 1)),
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(ids(active), vec![budget.id, goal.id]);

    let wallet = engine.wallet(wallet_id).await.unwrap();
    assert_eq!(wallet.financial_plans, vec![old_budget.id, budget.id, goal.id]);
}

#[tokio::test]
async fn deleted_plan_is_gone_with_its_facet() {
    let (engine, wallet_id, groceries, _) = engine_with_wallet().await;
    engine
        .create_transaction(
            NewTransactionCmd::expense(wallet_id, "bob", 500, groceries, "Milk")
                .created_at(day(6, 2)),
        )
        .await
        .unwrap();
    let budget = engine
        .create_plan(NewPlanCmd::budget(
            wallet_id,
            "Food",
            1_000,
            day(6, 1),
            day(7, 1),
            vec![groceries],
        ))
        .await
        .unwrap();

    engine
        .delete_plan(wallet_id, PlanKind::Budget, budget.id)
        .await
        .unwrap();

    let err = engine.plan(wallet_id, budget.id).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
    assert!(engine.wallet(wallet_id).await.unwrap().financial_plans.is_empty());

    // the transaction survives and later writes do not touch the old budget
    engine
        .create_transaction(
            NewTransactionCmd::expense(wallet_id, "bob", 700, groceries, "Bread")
                .created_at(day(6, 3)),
        )
        .await
        .unwrap();
    assert_eq!(engine.wallet(wallet_id).await.unwrap().balance, -1_200);
}

#[tokio::test]
async fn budget_transactions_are_newest_first() {
    let (engine, wallet_id, groceries, _) = engine_with_wallet().await;
    let budget = engine
        .create_plan(NewPlanCmd::budget(
            wallet_id,
            "Food",
            1_000_000,
            day(6, 1),
            day(7, 1),
            vec![groceries],
        ))
        .await
        .unwrap();
    let first = engine
        .create_transaction(
            NewTransactionCmd::expense(wallet_id, "bob", 100, groceries, "First")
                .created_at(day(6, 2)),
        )
        .await
        .unwrap();
    let second = engine
        .create_transaction(
            NewTransactionCmd::expense(wallet_id, "bob", 200, groceries, "Second")
                .created_at(day(6, 9)),
        )
        .await
        .unwrap();

    let txs = engine
        .budget_transactions(wallet_id, budget.id)
        .await
        .unwrap();
    assert_eq!(txs, vec![second, first]);
}

#[tokio::test]
async fn goal_current_overflow_keeps_stored_amount() {
    let (engine, wallet_id, _, _) = engine_with_wallet().await;
    let goal = engine
        .create_plan(NewPlanCmd::goal(wallet_id, "Moon", i64::MAX, goal_end()))
        .await
        .unwrap();
    engine
        .add_goal_record(wallet_id, goal.id, i64::MAX, None)
        .await
        .unwrap();

    let err = engine
        .add_goal_record(wallet_id, goal.id, 1, None)
        .await
        .unwrap_err();
    assert_eq!(
        err,
        EngineError::InvalidAmount("goal current amount is out of range".to_string())
    );

    let plan = engine
        .add_goal_record(wallet_id, goal.id, 0, Some("pledge"))
        .await
        .unwrap();
    let pledge = plan
        .goal()
        .unwrap()
        .records
        .iter()
        .find(|record| record.amount == 0)
        .unwrap()
        .id;
    let err = engine
        .update_goal_record(wallet_id, goal.id, pledge, 1)
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::InvalidAmount(_)));

    let stored = engine.plan(wallet_id, goal.id).await.unwrap();
    let stored_goal = stored.goal().unwrap();
    assert_eq!(stored_goal.current_amount, i64::MAX);
    assert_eq!(stored_goal.records.len(), 2);
    assert!(stored_goal.records.iter().any(|record| record.id == pledge && record.amount == 0));
    assert!(engine.check_wallet(wallet_id).await.unwrap().is_consistent());
}

#[tokio::test]
async fn budget_over_huge_expenses_is_rejected() {
    let (engine, wallet_id, groceries, _) = engine_with_wallet().await;
    for title in ["Warehouse", "Second warehouse"] {
        engine
            .create_transaction(
                NewTransactionCmd::expense(wallet_id, "bob", i64::MAX / 2 + 1, groceries, title)
                    .created_at(day(6, 10)),
            )
            .await
            .unwrap();
    }
    assert_eq!(engine.wallet(wallet_id).await.unwrap().balance, i64::MIN);

    let err = engine
        .create_plan(NewPlanCmd::budget(
            wallet_id,
            "Groceries",
            1_000,
            day(6, 1),
            day(7, 1),
            vec![groceries],
        ))
        .await
        .unwrap_err();
    assert_eq!(
        err,
        EngineError::InvalidAmount("budget spent amount is out of range".to_string())
    );
    assert!(engine.plans(wallet_id, &PlanListFilter::default()).await.unwrap().is_empty());
}
