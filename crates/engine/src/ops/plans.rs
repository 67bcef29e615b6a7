use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveValue, DatabaseTransaction, QueryFilter, QueryOrder, TransactionTrait, prelude::*,
};
use uuid::Uuid;

use crate::{
    Budget, EngineError, Goal, NewPlanCmd, Plan, PlanDetails, PlanKind, ResultEngine,
    UpdatePlanCmd, goals, plans,
    util::{ensure_non_negative, ensure_positive, name_with_key, validate_date_window},
};

use super::{Engine, normalize_optional_text, with_tx};

const OPENING_RECORD_NOTE: &str = "opening amount";

/// Filters for listing the plans of a wallet.
#[derive(Clone, Debug, Default)]
pub struct PlanListFilter {
    /// Only plans of this kind.
    pub kind: Option<PlanKind>,
    /// Only plans still running at this instant (`end_date > active_at`).
    pub active_at: Option<DateTime<Utc>>,
}

fn wrong_kind_field(field: &str, kind: PlanKind) -> EngineError {
    EngineError::InvalidPlanType(format!("{field} is not a {kind} field"))
}

fn normalize_categories(mut categories: Vec<Uuid>) -> ResultEngine<Vec<Uuid>> {
    categories.sort_unstable();
    categories.dedup();
    if categories.is_empty() {
        return Err(EngineError::InvalidCategories(
            "budget categories must not be empty".to_string(),
        ));
    }
    Ok(categories)
}

/// Build the kind-specific facet of a new plan. Every check runs before any
/// write.
fn new_plan_details(cmd: &mut NewPlanCmd) -> ResultEngine<PlanDetails> {
    ensure_positive(cmd.target_amount, "target_amount")?;
    match cmd.kind {
        PlanKind::Budget => {
            if cmd.current_amount.is_some() {
                return Err(wrong_kind_field("current_amount", PlanKind::Budget));
            }
            let start_date = cmd.start_date.ok_or_else(|| {
                EngineError::InvalidDate("budget start date is required".to_string())
            })?;
            validate_date_window(start_date, cmd.end_date)?;
            let categories = normalize_categories(cmd.categories.take().unwrap_or_default())?;
            Ok(PlanDetails::Budget(Budget {
                target_amount: cmd.target_amount,
                spent_amount: 0,
                start_date,
                categories,
                records: Vec::new(),
            }))
        }
        PlanKind::Goal => {
            if cmd.start_date.is_some() {
                return Err(wrong_kind_field("start_date", PlanKind::Goal));
            }
            if cmd.categories.is_some() {
                return Err(wrong_kind_field("categories", PlanKind::Goal));
            }
            let opening = cmd.current_amount.unwrap_or(0);
            ensure_non_negative(opening, "current_amount")?;
            let mut goal = Goal::new(cmd.target_amount);
            if opening > 0 {
                goal.add_record(opening, Some(OPENING_RECORD_NOTE.to_string()), Utc::now())?;
            }
            Ok(PlanDetails::Goal(goal))
        }
    }
}

impl Engine {
    /// Creates a budget or a goal in a wallet.
    ///
    /// A new budget immediately tracks every matching expense already in the
    /// wallet. A goal opening `current_amount` is stored as its first record.
    pub async fn create_plan(&self, mut cmd: NewPlanCmd) -> ResultEngine<Plan> {
        let (name, name_norm) = name_with_key(&cmd.name, "plan")?;
        let details = new_plan_details(&mut cmd)?;
        let description = normalize_optional_text(cmd.description.as_deref());

        with_tx!(self, |db_tx| {
            self.require_wallet(&db_tx, cmd.wallet_id).await?;
            self.ensure_plan_name_free(&db_tx, cmd.wallet_id, &name_norm, None)
                .await?;
            if let PlanDetails::Budget(budget) = &details {
                self.require_categories(&db_tx, &budget.categories).await?;
            }

            let mut plan = Plan {
                id: Uuid::new_v4(),
                wallet_id: cmd.wallet_id,
                name,
                description,
                end_date: cmd.end_date,
                created_at: Utc::now(),
                details,
            };
            plans::ActiveModel::from_plan(&plan, name_norm)
                .insert(&db_tx)
                .await?;

            match plan.kind() {
                PlanKind::Budget => self.rescan_and_store_budget(&db_tx, &mut plan).await?,
                PlanKind::Goal => {
                    if let Some(goal) = plan.goal() {
                        self.insert_goal(&db_tx, plan.id, goal).await?;
                    }
                }
            }

            tracing::info!(
                plan_id = %plan.id,
                wallet_id = %plan.wallet_id,
                kind = plan.kind().as_str(),
                "plan created"
            );
            Ok(plan)
        })
    }

    /// Patches a plan. Budgets are rescanned against the wallet transactions
    /// after every update.
    pub async fn update_plan(&self, cmd: UpdatePlanCmd) -> ResultEngine<Plan> {
        let renamed = cmd
            .name
            .as_deref()
            .map(|name| name_with_key(name, "plan"))
            .transpose()?;
        if let Some(target_amount) = cmd.target_amount {
            ensure_positive(target_amount, "target_amount")?;
        }
        let categories = cmd.categories.clone().map(normalize_categories).transpose()?;
        if cmd.kind == PlanKind::Goal {
            if cmd.start_date.is_some() {
                return Err(wrong_kind_field("start_date", PlanKind::Goal));
            }
            if categories.is_some() {
                return Err(wrong_kind_field("categories", PlanKind::Goal));
            }
        }

        with_tx!(self, |db_tx| {
            let model = self
                .require_plan_in_wallet(&db_tx, cmd.wallet_id, cmd.plan_id)
                .await?;
            let stored_kind = PlanKind::try_from(model.kind.as_str())?;
            if stored_kind != cmd.kind {
                return Err(EngineError::InvalidPlanType(format!(
                    "plan {} is a {stored_kind}, not a {}",
                    cmd.plan_id, cmd.kind
                )));
            }
            let mut name_norm = model.name_norm.clone();
            let mut plan = self.load_plan(&db_tx, model).await?;

            if let Some((name, key)) = renamed {
                self.ensure_plan_name_free(&db_tx, plan.wallet_id, &key, Some(plan.id))
                    .await?;
                plan.name = name;
                name_norm = key;
            }
            if let Some(description) = &cmd.description {
                plan.description = normalize_optional_text(description.as_deref());
            }
            if let Some(end_date) = cmd.end_date {
                plan.end_date = end_date;
            }

            match &mut plan.details {
                PlanDetails::Budget(budget) => {
                    if let Some(target_amount) = cmd.target_amount {
                        budget.target_amount = target_amount;
                    }
                    if let Some(start_date) = cmd.start_date {
                        budget.start_date = start_date;
                    }
                    if let Some(categories) = categories {
                        budget.categories = categories;
                    }
                }
                PlanDetails::Goal(goal) => {
                    if let Some(target_amount) = cmd.target_amount {
                        goal.target_amount = target_amount;
                    }
                }
            }
            if let Some(budget) = plan.budget() {
                validate_date_window(budget.start_date, plan.end_date)?;
                self.require_categories(&db_tx, &budget.categories).await?;
            }

            plans::ActiveModel::from_plan(&plan, name_norm)
                .update(&db_tx)
                .await?;
            match plan.kind() {
                PlanKind::Budget => self.rescan_and_store_budget(&db_tx, &mut plan).await?,
                PlanKind::Goal => {
                    if let Some(goal) = plan.goal() {
                        goals::ActiveModel {
                            plan_id: ActiveValue::Set(plan.id.to_string()),
                            target_amount: ActiveValue::Set(goal.target_amount),
                            ..Default::default()
                        }
                        .update(&db_tx)
                        .await?;
                    }
                }
            }

            tracing::info!(plan_id = %plan.id, kind = plan.kind().as_str(), "plan updated");
            Ok(plan)
        })
    }

    /// Deletes a plan with its facet. `kind` must match the stored plan.
    pub async fn delete_plan(
        &self,
        wallet_id: Uuid,
        kind: PlanKind,
        plan_id: Uuid,
    ) -> ResultEngine<()> {
        with_tx!(self, |db_tx| {
            let model = self
                .require_plan_in_wallet(&db_tx, wallet_id, plan_id)
                .await?;
            let stored_kind = PlanKind::try_from(model.kind.as_str())?;
            if stored_kind != kind {
                return Err(EngineError::InvalidPlanType(format!(
                    "plan {plan_id} is a {stored_kind}, not a {kind}"
                )));
            }
            self.delete_plan_rows(&db_tx, vec![model.id]).await?;
            tracing::info!(plan_id = %plan_id, wallet_id = %wallet_id, "plan deleted");
            Ok(())
        })
    }

    pub async fn plan(&self, wallet_id: Uuid, plan_id: Uuid) -> ResultEngine<Plan> {
        with_tx!(self, |db_tx| {
            let model = self
                .require_plan_in_wallet(&db_tx, wallet_id, plan_id)
                .await?;
            self.load_plan(&db_tx, model).await
        })
    }

    /// Plans of a wallet ordered by end date.
    pub async fn plans(
        &self,
        wallet_id: Uuid,
        filter: &PlanListFilter,
    ) -> ResultEngine<Vec<Plan>> {
        with_tx!(self, |db_tx| {
            self.require_wallet(&db_tx, wallet_id).await?;
            let mut query = plans::Entity::find()
                .filter(plans::Column::WalletId.eq(wallet_id.to_string()))
                .order_by_asc(plans::Column::EndDate)
                .order_by_asc(plans::Column::Id);
            if let Some(kind) = filter.kind {
                query = query.filter(plans::Column::Kind.eq(kind.as_str()));
            }
            if let Some(active_at) = filter.active_at {
                query = query.filter(plans::Column::EndDate.gt(active_at));
            }

            let models = query.all(&db_tx).await?;
            let mut out = Vec::with_capacity(models.len());
            for model in models {
                out.push(self.load_plan(&db_tx, model).await?);
            }
            Ok(out)
        })
    }

    /// Envelope plus the live facet.
    pub(super) async fn load_plan(
        &self,
        db: &DatabaseTransaction,
        model: plans::Model,
    ) -> ResultEngine<Plan> {
        let details = match PlanKind::try_from(model.kind.as_str())? {
            PlanKind::Budget => PlanDetails::Budget(self.load_budget(db, &model.id).await?),
            PlanKind::Goal => PlanDetails::Goal(self.load_goal(db, &model.id).await?),
        };
        Plan::from_model(model, details)
    }

    async fn ensure_plan_name_free(
        &self,
        db: &DatabaseTransaction,
        wallet_id: Uuid,
        name_norm: &str,
        except: Option<Uuid>,
    ) -> ResultEngine<()> {
        let mut query = plans::Entity::find()
            .filter(plans::Column::WalletId.eq(wallet_id.to_string()))
            .filter(plans::Column::NameNorm.eq(name_norm.to_string()));
        if let Some(plan_id) = except {
            query = query.filter(plans::Column::Id.ne(plan_id.to_string()));
        }
        if let Some(existing) = query.one(db).await? {
            return Err(EngineError::ExistingKey(existing.name));
        }
        Ok(())
    }
}
