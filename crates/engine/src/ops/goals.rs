use chrono::Utc;
use sea_orm::{
    ActiveValue, DatabaseTransaction, QueryFilter, QueryOrder, TransactionTrait, prelude::*,
};
use uuid::Uuid;

use crate::{
    EngineError, Goal, GoalRecord, Plan, PlanDetails, PlanKind, ResultEngine, goal_records, goals,
};

use super::{Engine, normalize_optional_text, with_tx};

impl Engine {
    /// Appends a contribution to a goal and returns the updated plan.
    pub async fn add_goal_record(
        &self,
        wallet_id: Uuid,
        plan_id: Uuid,
        amount: i64,
        note: Option<&str>,
    ) -> ResultEngine<Plan> {
        let note = normalize_optional_text(note);
        with_tx!(self, |db_tx| {
            let mut plan = self.require_goal_plan(&db_tx, wallet_id, plan_id).await?;
            let record = goal_mut(&mut plan)?.add_record(amount, note, Utc::now())?;

            goal_records::ActiveModel::from_record(plan_id, &record)
                .insert(&db_tx)
                .await?;
            self.store_goal_current(&db_tx, &plan).await?;

            tracing::info!(
                plan_id = %plan_id,
                record_id = %record.id,
                amount = record.amount,
                "goal record added"
            );
            Ok(plan)
        })
    }

    /// Changes the amount of a goal record.
    pub async fn update_goal_record(
        &self,
        wallet_id: Uuid,
        plan_id: Uuid,
        record_id: Uuid,
        amount: i64,
    ) -> ResultEngine<Plan> {
        with_tx!(self, |db_tx| {
            let mut plan = self.require_goal_plan(&db_tx, wallet_id, plan_id).await?;
            let delta = goal_mut(&mut plan)?.update_record(record_id, amount)?;

            goal_records::ActiveModel {
                id: ActiveValue::Set(record_id.to_string()),
                amount: ActiveValue::Set(amount),
                ..Default::default()
            }
            .update(&db_tx)
            .await?;
            self.store_goal_current(&db_tx, &plan).await?;

            tracing::info!(
                plan_id = %plan_id,
                record_id = %record_id,
                delta,
                "goal record updated"
            );
            Ok(plan)
        })
    }

    pub async fn delete_goal_record(
        &self,
        wallet_id: Uuid,
        plan_id: Uuid,
        record_id: Uuid,
    ) -> ResultEngine<Plan> {
        with_tx!(self, |db_tx| {
            let mut plan = self.require_goal_plan(&db_tx, wallet_id, plan_id).await?;
            let removed = goal_mut(&mut plan)?.delete_record(record_id)?;

            goal_records::Entity::delete_by_id(record_id.to_string())
                .exec(&db_tx)
                .await?;
            self.store_goal_current(&db_tx, &plan).await?;

            tracing::info!(
                plan_id = %plan_id,
                record_id = %record_id,
                amount = removed.amount,
                "goal record deleted"
            );
            Ok(plan)
        })
    }

    pub(super) async fn load_goal(
        &self,
        db: &DatabaseTransaction,
        plan_id: &str,
    ) -> ResultEngine<Goal> {
        let model = goals::Entity::find_by_id(plan_id.to_string())
            .one(db)
            .await?
            .ok_or_else(|| EngineError::KeyNotFound("goal not exists".to_string()))?;
        let records = goal_records::Entity::find()
            .filter(goal_records::Column::PlanId.eq(plan_id.to_string()))
            .order_by_asc(goal_records::Column::CreatedAt)
            .order_by_asc(goal_records::Column::Id)
            .all(db)
            .await?
            .into_iter()
            .map(GoalRecord::try_from)
            .collect::<ResultEngine<Vec<_>>>()?;

        Ok(Goal {
            target_amount: model.target_amount,
            current_amount: model.current_amount,
            records,
        })
    }

    /// Insert the goal facet of a new plan, records included.
    pub(super) async fn insert_goal(
        &self,
        db: &DatabaseTransaction,
        plan_id: Uuid,
        goal: &Goal,
    ) -> ResultEngine<()> {
        goals::ActiveModel::from_goal(plan_id, goal)
            .insert(db)
            .await?;
        for record in &goal.records {
            goal_records::ActiveModel::from_record(plan_id, record)
                .insert(db)
                .await?;
        }
        Ok(())
    }

    async fn require_goal_plan(
        &self,
        db: &DatabaseTransaction,
        wallet_id: Uuid,
        plan_id: Uuid,
    ) -> ResultEngine<Plan> {
        let model = self.require_plan_in_wallet(db, wallet_id, plan_id).await?;
        if PlanKind::try_from(model.kind.as_str())? != PlanKind::Goal {
            return Err(EngineError::InvalidPlanType(format!(
                "plan {plan_id} is not a goal"
            )));
        }
        let goal = self.load_goal(db, &model.id).await?;
        Plan::from_model(model, PlanDetails::Goal(goal))
    }

    /// Writes the in-memory `current_amount`, already range-checked by the
    /// [`Goal`] mutators.
    async fn store_goal_current(&self, db: &DatabaseTransaction, plan: &Plan) -> ResultEngine<()> {
        let Some(goal) = plan.goal() else {
            return Ok(());
        };
        goals::ActiveModel {
            plan_id: ActiveValue::Set(plan.id.to_string()),
            current_amount: ActiveValue::Set(goal.current_amount),
            ..Default::default()
        }
        .update(db)
        .await?;
        Ok(())
    }
}

fn goal_mut(plan: &mut Plan) -> ResultEngine<&mut Goal> {
    let plan_id = plan.id;
    plan.goal_mut()
        .ok_or_else(|| EngineError::InvalidPlanType(format!("plan {plan_id} is not a goal")))
}
