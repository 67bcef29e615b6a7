use sea_orm::{
    ActiveValue, DatabaseTransaction, QueryFilter, QueryOrder, TransactionTrait, prelude::*,
};
use uuid::Uuid;

use crate::{
    Budget, BudgetChange, EngineError, Plan, PlanDetails, PlanKind, ResultEngine, Transaction,
    TransactionKind, budget_categories, budget_records, budgets, plans, transactions,
    util::parse_uuid,
};

use super::{Engine, with_tx};

impl Engine {
    /// Transactions currently tracked by a budget, newest first.
    pub async fn budget_transactions(
        &self,
        wallet_id: Uuid,
        plan_id: Uuid,
    ) -> ResultEngine<Vec<Transaction>> {
        with_tx!(self, |db_tx| {
            let plan = self.require_plan_in_wallet(&db_tx, wallet_id, plan_id).await?;
            if PlanKind::try_from(plan.kind.as_str())? != PlanKind::Budget {
                return Err(EngineError::InvalidPlanType(format!(
                    "plan {plan_id} is not a budget"
                )));
            }
            let record_ids: Vec<String> = budget_records::Entity::find()
                .filter(budget_records::Column::PlanId.eq(plan.id))
                .all(&db_tx)
                .await?
                .into_iter()
                .map(|r| r.transaction_id)
                .collect();

            transactions::Entity::find()
                .filter(transactions::Column::Id.is_in(record_ids))
                .order_by_desc(transactions::Column::CreatedAt)
                .order_by_desc(transactions::Column::Id)
                .all(&db_tx)
                .await?
                .into_iter()
                .map(Transaction::try_from)
                .collect()
        })
    }

    pub(super) async fn load_budget(
        &self,
        db: &DatabaseTransaction,
        plan_id: &str,
    ) -> ResultEngine<Budget> {
        let model = budgets::Entity::find_by_id(plan_id.to_string())
            .one(db)
            .await?
            .ok_or_else(|| EngineError::KeyNotFound("budget not exists".to_string()))?;

        let categories = budget_categories::Entity::find()
            .filter(budget_categories::Column::PlanId.eq(plan_id.to_string()))
            .order_by_asc(budget_categories::Column::CategoryId)
            .all(db)
            .await?
            .iter()
            .map(|row| parse_uuid(&row.category_id, "category"))
            .collect::<ResultEngine<Vec<_>>>()?;

        let record_ids: Vec<String> = budget_records::Entity::find()
            .filter(budget_records::Column::PlanId.eq(plan_id.to_string()))
            .all(db)
            .await?
            .into_iter()
            .map(|row| row.transaction_id)
            .collect();
        // Keep records in transaction order so snapshots are stable.
        let records = transactions::Entity::find()
            .filter(transactions::Column::Id.is_in(record_ids))
            .order_by_asc(transactions::Column::CreatedAt)
            .order_by_asc(transactions::Column::Id)
            .all(db)
            .await?
            .iter()
            .map(|tx| parse_uuid(&tx.id, "transaction"))
            .collect::<ResultEngine<Vec<_>>>()?;

        Ok(Budget {
            target_amount: model.target_amount,
            spent_amount: model.spent_amount,
            start_date: model.start_date,
            categories,
            records,
        })
    }

    /// Every budget plan of the wallet, fully loaded.
    pub(super) async fn wallet_budgets(
        &self,
        db: &DatabaseTransaction,
        wallet_id: Uuid,
    ) -> ResultEngine<Vec<Plan>> {
        let models = plans::Entity::find()
            .filter(plans::Column::WalletId.eq(wallet_id.to_string()))
            .filter(plans::Column::Kind.eq(PlanKind::Budget.as_str()))
            .order_by_asc(plans::Column::CreatedAt)
            .order_by_asc(plans::Column::Id)
            .all(db)
            .await?;
        let mut out = Vec::with_capacity(models.len());
        for model in models {
            let budget = self.load_budget(db, &model.id).await?;
            out.push(Plan::from_model(model, PlanDetails::Budget(budget))?);
        }
        Ok(out)
    }

    /// Wallet expenses in the budget categories and window, oldest first.
    pub(super) async fn matching_transactions(
        &self,
        db: &DatabaseTransaction,
        plan: &Plan,
    ) -> ResultEngine<Vec<Transaction>> {
        let Some(budget) = plan.budget() else {
            return Ok(Vec::new());
        };
        let categories: Vec<String> = budget.categories.iter().map(Uuid::to_string).collect();
        let rows = transactions::Entity::find()
            .filter(transactions::Column::WalletId.eq(plan.wallet_id.to_string()))
            .filter(transactions::Column::Kind.eq(TransactionKind::Expense.as_str()))
            .filter(transactions::Column::CategoryId.is_in(categories))
            .filter(transactions::Column::CreatedAt.gte(budget.start_date))
            .filter(transactions::Column::CreatedAt.lt(plan.end_date))
            .order_by_asc(transactions::Column::CreatedAt)
            .order_by_asc(transactions::Column::Id)
            .all(db)
            .await?;
        rows.into_iter().map(Transaction::try_from).collect()
    }

    /// Recompute records and spent amount of a budget from the wallet
    /// transactions and persist the whole facet.
    pub(super) async fn rescan_and_store_budget(
        &self,
        db: &DatabaseTransaction,
        plan: &mut Plan,
    ) -> ResultEngine<()> {
        let candidates = self.matching_transactions(db, plan).await?;
        plan.rebuild_budget(&candidates)?;
        self.store_budget(db, plan).await
    }

    /// Replace the stored budget facet (row, categories, records) with `plan`.
    pub(super) async fn store_budget(
        &self,
        db: &DatabaseTransaction,
        plan: &Plan,
    ) -> ResultEngine<()> {
        let Some(budget) = plan.budget() else {
            return Err(EngineError::InvalidPlanType(format!(
                "plan {} is not a budget",
                plan.id
            )));
        };
        let plan_key = plan.id.to_string();

        let exists = budgets::Entity::find_by_id(plan_key.clone())
            .one(db)
            .await?
            .is_some();
        let row = budgets::ActiveModel::from_budget(plan.id, budget);
        if exists {
            row.update(db).await?;
        } else {
            row.insert(db).await?;
        }

        budget_categories::Entity::delete_many()
            .filter(budget_categories::Column::PlanId.eq(plan_key.clone()))
            .exec(db)
            .await?;
        for category_id in &budget.categories {
            budget_categories::ActiveModel {
                plan_id: ActiveValue::Set(plan_key.clone()),
                category_id: ActiveValue::Set(category_id.to_string()),
            }
            .insert(db)
            .await?;
        }

        budget_records::Entity::delete_many()
            .filter(budget_records::Column::PlanId.eq(plan_key.clone()))
            .exec(db)
            .await?;
        for transaction_id in &budget.records {
            budget_records::ActiveModel {
                plan_id: ActiveValue::Set(plan_key.clone()),
                transaction_id: ActiveValue::Set(transaction_id.to_string()),
            }
            .insert(db)
            .await?;
        }

        tracing::debug!(
            plan_id = %plan.id,
            records = budget.records.len(),
            spent_amount = budget.spent_amount,
            "budget stored"
        );
        Ok(())
    }

    /// Apply propagation results to `budgets` (the plans they were computed
    /// from) and persist them as record inserts/deletes and the new spent
    /// amounts.
    pub(super) async fn apply_budget_changes(
        &self,
        db: &DatabaseTransaction,
        budgets: &mut [Plan],
        changes: &[BudgetChange],
    ) -> ResultEngine<()> {
        for change in changes {
            let plan_id = change.plan_id();
            let plan = budgets
                .iter_mut()
                .find(|plan| plan.id == plan_id)
                .ok_or_else(|| EngineError::KeyNotFound(format!("budget {plan_id}")))?;
            change.apply_to(plan)?;
            let spent_amount = plan.budget().map_or(0, |budget| budget.spent_amount);

            let plan_key = plan_id.to_string();
            match *change {
                BudgetChange::Add { transaction_id, .. } => {
                    budget_records::ActiveModel {
                        plan_id: ActiveValue::Set(plan_key.clone()),
                        transaction_id: ActiveValue::Set(transaction_id.to_string()),
                    }
                    .insert(db)
                    .await?;
                }
                BudgetChange::Remove { transaction_id, .. } => {
                    budget_records::Entity::delete_by_id((
                        plan_key.clone(),
                        transaction_id.to_string(),
                    ))
                    .exec(db)
                    .await?;
                }
                BudgetChange::Adjust { .. } => {}
            }

            budgets::ActiveModel {
                plan_id: ActiveValue::Set(plan_key),
                spent_amount: ActiveValue::Set(spent_amount),
                ..Default::default()
            }
            .update(db)
            .await?;

            tracing::debug!(?change, spent_amount, "budget change applied");
        }
        Ok(())
    }
}
