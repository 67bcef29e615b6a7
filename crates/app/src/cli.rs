use chrono::{DateTime, Utc};
use clap::{Args, Parser, Subcommand};
use engine::{PlanKind, TransactionKind, WalletKind};
use uuid::Uuid;

#[derive(Debug, Parser)]
#[command(name = "fintrack", version, about = "Wallets, budgets and goals")]
pub struct Cli {
    /// Optional config file path (TOML).
    #[arg(long, global = true)]
    pub config: Option<String>,
    /// Override the configured database (e.g. sqlite:./fintrack.db?mode=rwc).
    #[arg(long, env = "FINTRACK_DATABASE_URL", global = true)]
    pub database_url: Option<String>,
    /// Override the configured log level.
    #[arg(long, global = true)]
    pub level: Option<String>,
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    #[command(subcommand)]
    Wallet(WalletCommand),
    #[command(subcommand)]
    Category(CategoryCommand),
    #[command(subcommand)]
    Tx(TxCommand),
    #[command(subcommand)]
    Plan(PlanCommand),
    #[command(subcommand)]
    Goal(GoalCommand),
    /// Verify (or with --repair, rebuild) the derived values of a wallet.
    Check {
        wallet: Uuid,
        #[arg(long)]
        repair: bool,
    },
}

#[derive(Debug, Subcommand)]
pub enum WalletCommand {
    Create {
        #[arg(long)]
        owner: String,
        #[arg(long)]
        name: String,
        #[arg(long, value_parser = parse_wallet_kind, default_value = "private")]
        kind: WalletKind,
        #[arg(long)]
        icon: Option<String>,
    },
    List {
        #[arg(long)]
        user: String,
    },
    Show {
        wallet: Uuid,
    },
    Rename {
        wallet: Uuid,
        name: String,
    },
    Delete {
        wallet: Uuid,
    },
    AddMember {
        wallet: Uuid,
        #[arg(long)]
        actor: String,
        #[arg(long)]
        user: String,
    },
    RemoveMember {
        wallet: Uuid,
        #[arg(long)]
        actor: String,
        #[arg(long)]
        user: String,
    },
    /// Promote a member to admin, or demote with --revoke.
    SetAdmin {
        wallet: Uuid,
        #[arg(long)]
        owner: String,
        #[arg(long)]
        user: String,
        #[arg(long)]
        revoke: bool,
    },
}

#[derive(Debug, Subcommand)]
pub enum CategoryCommand {
    /// Insert the default categories for a user.
    Seed {
        #[arg(long)]
        owner: String,
    },
    Create {
        #[arg(long)]
        owner: String,
        #[arg(long)]
        name: String,
        #[arg(long, value_parser = parse_tx_kind)]
        kind: TransactionKind,
        #[arg(long)]
        icon: Option<String>,
    },
    List {
        #[arg(long)]
        owner: String,
        #[arg(long, value_parser = parse_tx_kind)]
        kind: Option<TransactionKind>,
    },
    Delete {
        category: Uuid,
    },
}

#[derive(Debug, Args)]
pub struct NewTx {
    #[arg(long)]
    pub wallet: Uuid,
    #[arg(long)]
    pub user: String,
    #[arg(long, value_parser = parse_tx_kind)]
    pub kind: TransactionKind,
    /// Amount in minor units (cents).
    #[arg(long)]
    pub amount: i64,
    #[arg(long)]
    pub category: Uuid,
    #[arg(long)]
    pub title: String,
    #[arg(long)]
    pub description: Option<String>,
    /// RFC 3339 instant, defaults to now.
    #[arg(long)]
    pub at: Option<DateTime<Utc>>,
}

#[derive(Debug, Subcommand)]
pub enum TxCommand {
    Add(NewTx),
    Update {
        wallet: Uuid,
        transaction: Uuid,
        #[arg(long, value_parser = parse_tx_kind)]
        kind: Option<TransactionKind>,
        #[arg(long)]
        amount: Option<i64>,
        #[arg(long)]
        category: Option<Uuid>,
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        at: Option<DateTime<Utc>>,
    },
    Delete {
        wallet: Uuid,
        transaction: Uuid,
    },
    List {
        wallet: Uuid,
        /// all, day, week, month, quarter or year.
        #[arg(long, default_value = "all")]
        period: engine::Period,
        #[arg(long, value_parser = parse_tx_kind)]
        kind: Vec<TransactionKind>,
        #[arg(long)]
        search: Option<String>,
        #[arg(long, default_value_t = 50)]
        limit: u64,
        #[arg(long)]
        cursor: Option<String>,
    },
}

#[derive(Debug, Subcommand)]
pub enum PlanCommand {
    Budget {
        #[arg(long)]
        wallet: Uuid,
        #[arg(long)]
        name: String,
        #[arg(long)]
        target: i64,
        #[arg(long)]
        start: DateTime<Utc>,
        #[arg(long)]
        end: DateTime<Utc>,
        #[arg(long = "category", required = true)]
        categories: Vec<Uuid>,
    },
    Goal {
        #[arg(long)]
        wallet: Uuid,
        #[arg(long)]
        name: String,
        #[arg(long)]
        target: i64,
        #[arg(long)]
        end: DateTime<Utc>,
        #[arg(long)]
        current: Option<i64>,
    },
    Show {
        wallet: Uuid,
        plan: Uuid,
    },
    /// Tracked transactions of a budget.
    Records {
        wallet: Uuid,
        plan: Uuid,
    },
    List {
        wallet: Uuid,
        #[arg(long)]
        kind: Option<PlanKind>,
        /// Only plans not ended yet.
        #[arg(long)]
        active: bool,
    },
    Update {
        wallet: Uuid,
        kind: PlanKind,
        plan: Uuid,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        target: Option<i64>,
        #[arg(long)]
        start: Option<DateTime<Utc>>,
        #[arg(long)]
        end: Option<DateTime<Utc>>,
        #[arg(long = "category")]
        categories: Vec<Uuid>,
    },
    Delete {
        wallet: Uuid,
        kind: PlanKind,
        plan: Uuid,
    },
}

#[derive(Debug, Subcommand)]
pub enum GoalCommand {
    Add {
        wallet: Uuid,
        plan: Uuid,
        amount: i64,
        #[arg(long)]
        note: Option<String>,
    },
    Update {
        wallet: Uuid,
        plan: Uuid,
        record: Uuid,
        amount: i64,
    },
    Delete {
        wallet: Uuid,
        plan: Uuid,
        record: Uuid,
    },
}

fn parse_tx_kind(value: &str) -> Result<TransactionKind, engine::EngineError> {
    TransactionKind::try_from(value.trim().to_ascii_lowercase().as_str())
}

fn parse_wallet_kind(value: &str) -> Result<WalletKind, engine::EngineError> {
    WalletKind::try_from(value.trim().to_ascii_lowercase().as_str())
}
