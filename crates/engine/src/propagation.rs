//! Transaction → budget propagation.
//!
//! Pure functions: given a transaction mutation and the budgets of its
//! wallet, compute the balance delta and the [`BudgetChange`]s that keep
//! every budget consistent. The engine applies them in the same DB
//! transaction as the transaction write.
//!
//! Budget plans passed in are expected to be the full set of budgets of the
//! wallet; goals are ignored.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    Plan, ResultEngine, Transaction,
    util::{add_amounts, sub_amounts},
};

/// A single edit to one budget.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum BudgetChange {
    /// Start tracking `transaction_id`; spent grows by `amount_minor`.
    Add {
        plan_id: Uuid,
        transaction_id: Uuid,
        amount_minor: i64,
    },
    /// Stop tracking `transaction_id`; spent shrinks by `amount_minor`.
    Remove {
        plan_id: Uuid,
        transaction_id: Uuid,
        amount_minor: i64,
    },
    /// Transaction stays tracked, its amount changed.
    Adjust { plan_id: Uuid, delta_minor: i64 },
}

impl BudgetChange {
    pub fn plan_id(&self) -> Uuid {
        match *self {
            Self::Add { plan_id, .. }
            | Self::Remove { plan_id, .. }
            | Self::Adjust { plan_id, .. } => plan_id,
        }
    }

    /// Effect on the budget `spent_amount`. Transaction amounts are `> 0`,
    /// so negating one or taking the difference of two never overflows.
    pub fn spent_delta(&self) -> i64 {
        match *self {
            Self::Add { amount_minor, .. } => amount_minor,
            Self::Remove { amount_minor, .. } => -amount_minor,
            Self::Adjust { delta_minor, .. } => delta_minor,
        }
    }

    /// Apply the change to an in-memory plan. Returns `Ok(false)` if `plan`
    /// is not the targeted budget, and `InvalidAmount` when the spent amount
    /// would leave the `i64` range.
    pub fn apply_to(&self, plan: &mut Plan) -> ResultEngine<bool> {
        if plan.id != self.plan_id() {
            return Ok(false);
        }
        let Some(budget) = plan.budget_mut() else {
            return Ok(false);
        };
        let spent_amount =
            add_amounts(budget.spent_amount, self.spent_delta(), "budget spent amount")?;
        match *self {
            Self::Add { transaction_id, .. } => budget.records.push(transaction_id),
            Self::Remove { transaction_id, .. } => {
                budget.records.retain(|id| *id != transaction_id);
            }
            Self::Adjust { .. } => {}
        }
        budget.spent_amount = spent_amount;
        Ok(true)
    }
}

pub fn wallet_delta_on_create(tx: &Transaction) -> ResultEngine<i64> {
    tx.signed_amount()
}

/// `signed(current) - signed(previous)`. Flipping the kind of a large
/// transaction doubles its weight and can leave the `i64` range.
pub fn wallet_delta_on_update(previous: &Transaction, current: &Transaction) -> ResultEngine<i64> {
    sub_amounts(
        current.signed_amount()?,
        previous.signed_amount()?,
        "wallet balance delta",
    )
}

pub fn wallet_delta_on_delete(tx: &Transaction) -> ResultEngine<i64> {
    sub_amounts(0, tx.signed_amount()?, "wallet balance delta")
}

/// Budgets gaining a newly created transaction.
pub fn on_create(tx: &Transaction, budgets: &[Plan]) -> Vec<BudgetChange> {
    budgets
        .iter()
        .filter(|plan| plan.budget_matches(tx) && !plan.budget_contains(tx.id))
        .map(|plan| BudgetChange::Add {
            plan_id: plan.id,
            transaction_id: tx.id,
            amount_minor: tx.amount_minor,
        })
        .collect()
}

/// Changes caused by editing `previous` into `current`.
///
/// A budget that already tracks the transaction either drops it (with the
/// previous amount) when it no longer matches, or is adjusted by the amount
/// difference; never both. Any budget that does not track it yet gains it
/// when the new state matches.
pub fn on_update(
    previous: &Transaction,
    current: &Transaction,
    budgets: &[Plan],
) -> Vec<BudgetChange> {
    let mut changes = Vec::new();
    for plan in budgets.iter().filter(|plan| plan.budget().is_some()) {
        if plan.budget_contains(previous.id) {
            if !plan.budget_matches(current) {
                changes.push(BudgetChange::Remove {
                    plan_id: plan.id,
                    transaction_id: previous.id,
                    amount_minor: previous.amount_minor,
                });
            } else if current.amount_minor != previous.amount_minor {
                changes.push(BudgetChange::Adjust {
                    plan_id: plan.id,
                    delta_minor: current.amount_minor - previous.amount_minor,
                });
            }
        } else if plan.budget_matches(current) {
            changes.push(BudgetChange::Add {
                plan_id: plan.id,
                transaction_id: current.id,
                amount_minor: current.amount_minor,
            });
        }
    }
    changes
}

/// Budgets losing a deleted transaction.
pub fn on_delete(tx: &Transaction, budgets: &[Plan]) -> Vec<BudgetChange> {
    budgets
        .iter()
        .filter(|plan| plan.budget_contains(tx.id))
        .map(|plan| BudgetChange::Remove {
            plan_id: plan.id,
            transaction_id: tx.id,
            amount_minor: tx.amount_minor,
        })
        .collect()
}
