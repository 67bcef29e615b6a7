use chrono::Utc;
use clap::Parser;
use engine::{
    Engine, NewPlanCmd, NewTransactionCmd, PlanListFilter, TransactionListFilter, UpdatePlanCmd,
    UpdateTransactionCmd,
};
use migration::{Migrator, MigratorTrait};
use serde::Serialize;

use cli::{CategoryCommand, Cli, Command, GoalCommand, PlanCommand, TxCommand, WalletCommand};

mod cli;
mod settings;

type AppResult<T> = Result<T, Box<dyn std::error::Error + Send + Sync>>;

#[tokio::main]
async fn main() -> AppResult<()> {
    let cli = Cli::parse();
    let mut settings = settings::Settings::load(cli.config.as_deref())?;
    if let Some(level) = &cli.level {
        settings.app.level = level.clone();
    }

    tracing_subscriber::fmt()
        .with_env_filter(format!(
            "fintrack={level},engine={level}",
            level = settings.app.level
        ))
        .with_writer(std::io::stderr)
        .init();

    let url = cli
        .database_url
        .clone()
        .unwrap_or_else(|| settings.database.url());
    let db = connect(&url).await?;
    let engine = Engine::builder().database(db).build().await?;

    run(&engine, cli.command).await
}

async fn connect(url: &str) -> AppResult<sea_orm::DatabaseConnection> {
    tracing::debug!(url, "opening database");
    let database = sea_orm::Database::connect(url).await?;
    Migrator::up(&database, None).await?;
    Ok(database)
}

fn print<T: Serialize>(value: &T) -> AppResult<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

async fn run(engine: &Engine, command: Command) -> AppResult<()> {
    match command {
        Command::Wallet(cmd) => wallet(engine, cmd).await,
        Command::Category(cmd) => category(engine, cmd).await,
        Command::Tx(cmd) => tx(engine, cmd).await,
        Command::Plan(cmd) => plan(engine, cmd).await,
        Command::Goal(cmd) => goal(engine, cmd).await,
        Command::Check { wallet, repair } => {
            let report = if repair {
                engine.recompute_wallet(wallet).await?
            } else {
                engine.check_wallet(wallet).await?
            };
            print(&report)
        }
    }
}

async fn wallet(engine: &Engine, cmd: WalletCommand) -> AppResult<()> {
    match cmd {
        WalletCommand::Create {
            owner,
            name,
            kind,
            icon,
        } => {
            let id = engine
                .new_wallet(&owner, &name, kind, icon.as_deref())
                .await?;
            print(&engine.wallet(id).await?)
        }
        WalletCommand::List { user } => print(&engine.list_wallets(&user).await?),
        WalletCommand::Show { wallet } => print(&engine.wallet(wallet).await?),
        WalletCommand::Rename { wallet, name } => {
            engine.rename_wallet(wallet, &name).await?;
            print(&engine.wallet(wallet).await?)
        }
        WalletCommand::Delete { wallet } => {
            engine.delete_wallet(wallet).await?;
            print(&serde_json::json!({ "deleted": wallet }))
        }
        WalletCommand::AddMember {
            wallet,
            actor,
            user,
        } => {
            engine.add_wallet_member(wallet, &actor, &user).await?;
            print(&engine.wallet(wallet).await?)
        }
        WalletCommand::RemoveMember {
            wallet,
            actor,
            user,
        } => {
            engine.remove_wallet_member(wallet, &actor, &user).await?;
            print(&engine.wallet(wallet).await?)
        }
        WalletCommand::SetAdmin {
            wallet,
            owner,
            user,
            revoke,
        } => {
            engine
                .set_wallet_admin(wallet, &owner, &user, !revoke)
                .await?;
            print(&engine.wallet(wallet).await?)
        }
    }
}

async fn category(engine: &Engine, cmd: CategoryCommand) -> AppResult<()> {
    match cmd {
        CategoryCommand::Seed { owner } => {
            let added = engine.seed_default_categories(&owner).await?;
            print(&serde_json::json!({ "added": added }))
        }
        CategoryCommand::Create {
            owner,
            name,
            kind,
            icon,
        } => {
            let id = engine
                .new_category(&owner, &name, kind, icon.as_deref())
                .await?;
            print(&engine.category(id).await?)
        }
        CategoryCommand::List { owner, kind } => {
            print(&engine.list_categories(&owner, kind).await?)
        }
        CategoryCommand::Delete { category } => {
            engine.delete_category(category).await?;
            print(&serde_json::json!({ "deleted": category }))
        }
    }
}

async fn tx(engine: &Engine, cmd: TxCommand) -> AppResult<()> {
    match cmd {
        TxCommand::Add(new) => {
            let mut cmd = NewTransactionCmd::new(
                new.wallet,
                new.user,
                new.kind,
                new.amount,
                new.category,
                new.title,
            );
            if let Some(description) = new.description {
                cmd = cmd.description(description);
            }
            if let Some(at) = new.at {
                cmd = cmd.created_at(at);
            }
            print(&engine.create_transaction(cmd).await?)
        }
        TxCommand::Update {
            wallet,
            transaction,
            kind,
            amount,
            category,
            title,
            at,
        } => {
            let cmd = UpdateTransactionCmd {
                kind,
                amount_minor: amount,
                category_id: category,
                title,
                created_at: at,
                ..UpdateTransactionCmd::new(wallet, transaction)
            };
            print(&engine.update_transaction(cmd).await?)
        }
        TxCommand::Delete {
            wallet,
            transaction,
        } => {
            engine.delete_transaction(wallet, transaction).await?;
            print(&serde_json::json!({ "deleted": transaction }))
        }
        TxCommand::List {
            wallet,
            period,
            kind,
            search,
            limit,
            cursor,
        } => {
            let filter = TransactionListFilter {
                period,
                kinds: (!kind.is_empty()).then_some(kind),
                search,
                limit,
                cursor,
                ..Default::default()
            };
            let (items, next_cursor) = engine.list_transactions(wallet, &filter).await?;
            print(&serde_json::json!({ "items": items, "next_cursor": next_cursor }))
        }
    }
}

async fn plan(engine: &Engine, cmd: PlanCommand) -> AppResult<()> {
    match cmd {
        PlanCommand::Budget {
            wallet,
            name,
            target,
            start,
            end,
            categories,
        } => {
            let cmd = NewPlanCmd::budget(wallet, name, target, start, end, categories);
            print(&engine.create_plan(cmd).await?)
        }
        PlanCommand::Goal {
            wallet,
            name,
            target,
            end,
            current,
        } => {
            let mut cmd = NewPlanCmd::goal(wallet, name, target, end);
            if let Some(current) = current {
                cmd = cmd.current_amount(current);
            }
            print(&engine.create_plan(cmd).await?)
        }
        PlanCommand::Show { wallet, plan } => print(&engine.plan(wallet, plan).await?),
        PlanCommand::Records { wallet, plan } => {
            print(&engine.budget_transactions(wallet, plan).await?)
        }
        PlanCommand::List {
            wallet,
            kind,
            active,
        } => {
            let filter = PlanListFilter {
                kind,
                active_at: active.then(Utc::now),
            };
            print(&engine.plans(wallet, &filter).await?)
        }
        PlanCommand::Update {
            wallet,
            kind,
            plan,
            name,
            target,
            start,
            end,
            categories,
        } => {
            let cmd = UpdatePlanCmd {
                name,
                target_amount: target,
                start_date: start,
                end_date: end,
                categories: (!categories.is_empty()).then_some(categories),
                ..UpdatePlanCmd::new(wallet, kind, plan)
            };
            print(&engine.update_plan(cmd).await?)
        }
        PlanCommand::Delete { wallet, kind, plan } => {
            engine.delete_plan(wallet, kind, plan).await?;
            print(&serde_json::json!({ "deleted": plan }))
        }
    }
}

async fn goal(engine: &Engine, cmd: GoalCommand) -> AppResult<()> {
    let plan = match cmd {
        GoalCommand::Add {
            wallet,
            plan,
            amount,
            note,
        } => {
            engine
                .add_goal_record(wallet, plan, amount, note.as_deref())
                .await?
        }
        GoalCommand::Update {
            wallet,
            plan,
            record,
            amount,
        } => {
            engine
                .update_goal_record(wallet, plan, record, amount)
                .await?
        }
        GoalCommand::Delete {
            wallet,
            plan,
            record,
        } => engine.delete_goal_record(wallet, plan, record).await?,
    };
    print(&plan)
}
