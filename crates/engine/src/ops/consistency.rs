use std::collections::BTreeSet;

use sea_orm::{
    ActiveValue, DatabaseTransaction, QueryFilter, QueryOrder, TransactionTrait, prelude::*,
};
use serde::Serialize;
use uuid::Uuid;

use crate::{
    Plan, PlanKind, ResultEngine, Transaction, goals, plans, transactions, util::sum_amounts,
    wallets,
};

use super::{Engine, with_tx};

/// One derived value that disagrees with the rows it is derived from.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "issue", rename_all = "snake_case")]
pub enum ConsistencyIssue {
    WalletBalance {
        stored: i64,
        expected: i64,
    },
    BudgetSpent {
        plan_id: Uuid,
        stored: i64,
        expected: i64,
    },
    BudgetRecords {
        plan_id: Uuid,
        /// Matching transactions the budget does not track.
        missing: Vec<Uuid>,
        /// Tracked transactions that do not match.
        unexpected: Vec<Uuid>,
    },
    GoalCurrent {
        plan_id: Uuid,
        stored: i64,
        expected: i64,
    },
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ConsistencyReport {
    pub wallet_id: Uuid,
    pub issues: Vec<ConsistencyIssue>,
}

impl ConsistencyReport {
    pub fn is_consistent(&self) -> bool {
        self.issues.is_empty()
    }
}

/// Expected derived values of a wallet, rebuilt from transactions and goal
/// records.
struct WalletAudit {
    report: ConsistencyReport,
    balance: i64,
    budgets: Vec<Plan>,
    goals: Vec<(Uuid, i64)>,
}

impl Engine {
    /// Recomputes the wallet balance, budgets and goals from the source rows
    /// without writing anything, and reports every mismatch.
    pub async fn check_wallet(&self, wallet_id: Uuid) -> ResultEngine<ConsistencyReport> {
        with_tx!(self, |db_tx| {
            let audit = self.audit_wallet(&db_tx, wallet_id).await?;
            for issue in &audit.report.issues {
                tracing::warn!(wallet_id = %wallet_id, ?issue, "wallet inconsistency");
            }
            Ok(audit.report)
        })
    }

    /// Rewrites the derived values of a wallet from the source rows.
    ///
    /// Returns the issues that were repaired; running it twice yields an
    /// empty report the second time.
    pub async fn recompute_wallet(&self, wallet_id: Uuid) -> ResultEngine<ConsistencyReport> {
        with_tx!(self, |db_tx| {
            let audit = self.audit_wallet(&db_tx, wallet_id).await?;

            wallets::ActiveModel {
                id: ActiveValue::Set(wallet_id.to_string()),
                balance: ActiveValue::Set(audit.balance),
                ..Default::default()
            }
            .update(&db_tx)
            .await?;

            for plan in &audit.budgets {
                self.store_budget(&db_tx, plan).await?;
            }

            for (plan_id, current_amount) in &audit.goals {
                goals::ActiveModel {
                    plan_id: ActiveValue::Set(plan_id.to_string()),
                    current_amount: ActiveValue::Set(*current_amount),
                    ..Default::default()
                }
                .update(&db_tx)
                .await?;
            }

            tracing::info!(
                wallet_id = %wallet_id,
                repaired = audit.report.issues.len(),
                "wallet recomputed"
            );
            Ok(audit.report)
        })
    }

    async fn audit_wallet(
        &self,
        db: &DatabaseTransaction,
        wallet_id: Uuid,
    ) -> ResultEngine<WalletAudit> {
        let wallet = self.require_wallet(db, wallet_id).await?;
        let mut issues = Vec::new();

        let ledger = transactions::Entity::find()
            .filter(transactions::Column::WalletId.eq(wallet_id.to_string()))
            .order_by_asc(transactions::Column::CreatedAt)
            .order_by_asc(transactions::Column::Id)
            .all(db)
            .await?
            .into_iter()
            .map(Transaction::try_from)
            .collect::<ResultEngine<Vec<_>>>()?;

        let signed = ledger
            .iter()
            .map(Transaction::signed_amount)
            .collect::<ResultEngine<Vec<_>>>()?;
        let balance = sum_amounts(signed, "wallet balance")?;
        if wallet.balance != balance {
            issues.push(ConsistencyIssue::WalletBalance {
                stored: wallet.balance,
                expected: balance,
            });
        }

        let mut budgets = self.wallet_budgets(db, wallet_id).await?;
        for plan in &mut budgets {
            let (stored_spent, stored_records) = match plan.budget() {
                Some(budget) => (budget.spent_amount, budget.records.clone()),
                None => continue,
            };
            plan.rebuild_budget(&ledger)?;
            let Some(rebuilt) = plan.budget() else {
                continue;
            };

            if stored_spent != rebuilt.spent_amount {
                issues.push(ConsistencyIssue::BudgetSpent {
                    plan_id: plan.id,
                    stored: stored_spent,
                    expected: rebuilt.spent_amount,
                });
            }
            let stored: BTreeSet<Uuid> = stored_records.into_iter().collect();
            let expected: BTreeSet<Uuid> = rebuilt.records.iter().copied().collect();
            if stored != expected {
                issues.push(ConsistencyIssue::BudgetRecords {
                    plan_id: plan.id,
                    missing: expected.difference(&stored).copied().collect(),
                    unexpected: stored.difference(&expected).copied().collect(),
                });
            }
        }

        let goal_models = plans::Entity::find()
            .filter(plans::Column::WalletId.eq(wallet_id.to_string()))
            .filter(plans::Column::Kind.eq(PlanKind::Goal.as_str()))
            .order_by_asc(plans::Column::CreatedAt)
            .all(db)
            .await?;
        let mut goal_totals = Vec::with_capacity(goal_models.len());
        for model in goal_models {
            let plan = self.load_plan(db, model).await?;
            let Some(goal) = plan.goal() else {
                continue;
            };
            let expected = sum_amounts(
                goal.records.iter().map(|record| record.amount),
                "goal current amount",
            )?;
            if goal.current_amount != expected {
                issues.push(ConsistencyIssue::GoalCurrent {
                    plan_id: plan.id,
                    stored: goal.current_amount,
                    expected,
                });
            }
            goal_totals.push((plan.id, expected));
        }

        Ok(WalletAudit {
            report: ConsistencyReport { wallet_id, issues },
            balance,
            budgets,
            goals: goal_totals,
        })
    }
}
