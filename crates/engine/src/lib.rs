//! Fintrack engine.
//!
//! Wallets hold transactions; plans (budgets and goals) live in a wallet. The
//! engine keeps three derived values consistent on every write:
//!
//! - the wallet balance (signed sum of its transactions);
//! - each budget's records and spent amount (matching expenses);
//! - each goal's current amount (sum of its records).
//!
//! Every public operation runs inside a single database transaction.

pub use budgets::Budget;
pub use categories::{Category, DEFAULT_CATEGORIES};
pub use commands::{NewPlanCmd, NewTransactionCmd, UpdatePlanCmd, UpdateTransactionCmd};
pub use error::{EngineError, ErrorKind};
pub use goals::{Goal, GoalRecord};
pub use ops::{
    ConsistencyIssue, ConsistencyReport, Engine, EngineBuilder, PlanListFilter,
    TransactionListFilter,
};
pub use period::Period;
pub use plans::{Plan, PlanDetails, PlanKind};
pub use propagation::BudgetChange;
pub use transactions::{Transaction, TransactionKind};
pub use wallet_memberships::WalletRole;
pub use wallets::{MAX_WALLETS_PER_USER, Wallet, WalletKind};

mod budget_categories;
mod budget_records;
mod budgets;
mod categories;
mod commands;
mod error;
mod goal_records;
mod goals;
mod ops;
mod period;
mod plans;
pub mod propagation;
mod transactions;
mod util;
mod wallet_memberships;
mod wallets;

pub type ResultEngine<T> = Result<T, EngineError>;
