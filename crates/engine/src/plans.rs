//! Financial plans.
//!
//! A `Plan` is the envelope shared by every plan kind (name, wallet, end
//! date). The kind-specific state lives in [`PlanDetails`]: a [`Budget`]
//! tracks expenses automatically, a [`Goal`] accumulates user-entered
//! contributions. Envelope and facet share the same id and are always written
//! together.

use std::{fmt, str::FromStr};

use chrono::{DateTime, Utc};
use sea_orm::entity::{ActiveValue, prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    Budget, EngineError, Goal, ResultEngine, Transaction, TransactionKind,
    util::{parse_uuid, sum_amounts},
};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlanKind {
    Budget,
    Goal,
}

impl PlanKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Budget => "budget",
            Self::Goal => "goal",
        }
    }
}

impl fmt::Display for PlanKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for PlanKind {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "budget" => Ok(Self::Budget),
            "goal" => Ok(Self::Goal),
            other => Err(EngineError::InvalidPlanType(format!(
                "unknown plan type: {other}"
            ))),
        }
    }
}

impl FromStr for PlanKind {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::try_from(s.trim().to_ascii_lowercase().as_str())
    }
}

/// Kind-specific plan state.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PlanDetails {
    Budget(Budget),
    Goal(Goal),
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Plan {
    pub id: Uuid,
    pub wallet_id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub end_date: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub details: PlanDetails,
}

impl Plan {
    pub fn kind(&self) -> PlanKind {
        match self.details {
            PlanDetails::Budget(_) => PlanKind::Budget,
            PlanDetails::Goal(_) => PlanKind::Goal,
        }
    }

    pub fn budget(&self) -> Option<&Budget> {
        match &self.details {
            PlanDetails::Budget(budget) => Some(budget),
            PlanDetails::Goal(_) => None,
        }
    }

    pub fn goal(&self) -> Option<&Goal> {
        match &self.details {
            PlanDetails::Goal(goal) => Some(goal),
            PlanDetails::Budget(_) => None,
        }
    }

    pub(crate) fn budget_mut(&mut self) -> Option<&mut Budget> {
        match &mut self.details {
            PlanDetails::Budget(budget) => Some(budget),
            PlanDetails::Goal(_) => None,
        }
    }

    pub(crate) fn goal_mut(&mut self) -> Option<&mut Goal> {
        match &mut self.details {
            PlanDetails::Goal(goal) => Some(goal),
            PlanDetails::Budget(_) => None,
        }
    }

    /// Whether `tx` belongs in this budget: same wallet, an expense, one of
    /// the budget categories, and `start_date <= created_at < end_date`.
    ///
    /// Always `false` for goals.
    pub fn budget_matches(&self, tx: &Transaction) -> bool {
        let Some(budget) = self.budget() else {
            return false;
        };
        tx.wallet_id == self.wallet_id
            && tx.kind == TransactionKind::Expense
            && budget.categories.contains(&tx.category_id)
            && budget.start_date <= tx.created_at
            && tx.created_at < self.end_date
    }

    /// Whether the budget currently lists `transaction_id` among its records.
    pub fn budget_contains(&self, transaction_id: Uuid) -> bool {
        self.budget()
            .is_some_and(|budget| budget.records.contains(&transaction_id))
    }

    /// Replace the budget records and spent amount with the matching subset
    /// of `transactions`. No-op for goals. Fails, leaving the budget as it
    /// was, when the matching amounts do not fit an `i64`.
    pub fn rebuild_budget<'a, I>(&mut self, transactions: I) -> ResultEngine<()>
    where
        I: IntoIterator<Item = &'a Transaction>,
    {
        let matching: Vec<(Uuid, i64)> = transactions
            .into_iter()
            .filter(|tx| self.budget_matches(tx))
            .map(|tx| (tx.id, tx.amount_minor))
            .collect();
        let spent_amount = sum_amounts(
            matching.iter().map(|(_, amount)| *amount),
            "budget spent amount",
        )?;
        if let Some(budget) = self.budget_mut() {
            budget.spent_amount = spent_amount;
            budget.records = matching.into_iter().map(|(id, _)| id).collect();
        }
        Ok(())
    }

    pub(crate) fn from_model(model: Model, details: PlanDetails) -> ResultEngine<Self> {
        let plan = Self {
            id: parse_uuid(&model.id, "plan")?,
            wallet_id: parse_uuid(&model.wallet_id, "wallet")?,
            name: model.name,
            description: model.description,
            end_date: model.end_date,
            created_at: model.created_at,
            details,
        };
        if plan.kind().as_str() != model.kind {
            return Err(EngineError::InvalidPlanType(format!(
                "plan {} is stored as {} but has {} details",
                plan.id,
                model.kind,
                plan.kind()
            )));
        }
        Ok(plan)
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "plans")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub wallet_id: String,
    pub name: String,
    pub name_norm: String,
    pub description: Option<String>,
    pub kind: String,
    pub end_date: DateTimeUtc,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::wallets::Entity",
        from = "Column::WalletId",
        to = "super::wallets::Column::Id",
        on_update = "NoAction",
        on_delete = "Cascade"
    )]
    Wallets,
    #[sea_orm(has_one = "super::budgets::Entity")]
    Budgets,
    #[sea_orm(has_one = "super::goals::Entity")]
    Goals,
}

impl Related<super::wallets::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Wallets.def()
    }
}

impl Related<super::budgets::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Budgets.def()
    }
}

impl Related<super::goals::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Goals.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl ActiveModel {
    pub(crate) fn from_plan(plan: &Plan, name_norm: String) -> Self {
        Self {
            id: ActiveValue::Set(plan.id.to_string()),
            wallet_id: ActiveValue::Set(plan.wallet_id.to_string()),
            name: ActiveValue::Set(plan.name.clone()),
            name_norm: ActiveValue::Set(name_norm),
            description: ActiveValue::Set(plan.description.clone()),
            kind: ActiveValue::Set(plan.kind().as_str().to_string()),
            end_date: ActiveValue::Set(plan.end_date),
            created_at: ActiveValue::Set(plan.created_at),
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    fn at(day: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, day, 12, 0, 0).unwrap()
    }

    fn budget_plan(wallet_id: Uuid, category_id: Uuid) -> Plan {
        Plan {
            id: Uuid::new_v4(),
            wallet_id,
            name: "Food".to_string(),
            description: None,
            end_date: at(20),
            created_at: at(1),
            details: PlanDetails::Budget(Budget {
                target_amount: 100_000,
                spent_amount: 0,
                start_date: at(10),
                categories: vec![category_id],
                records: Vec::new(),
            }),
        }
    }

    fn expense(wallet_id: Uuid, category_id: Uuid, amount: i64, day: u32) -> Transaction {
        Transaction::new(
            wallet_id,
            category_id,
            TransactionKind::Expense,
            amount,
            "tx".to_string(),
            None,
            at(day),
            "alice".to_string(),
        )
        .unwrap()
    }

    #[test]
    fn plan_kind_parses_known_names_only() {
        assert_eq!("budget".parse::<PlanKind>().unwrap(), PlanKind::Budget);
        assert_eq!(" Goal ".parse::<PlanKind>().unwrap(), PlanKind::Goal);
        let err = "saving".parse::<PlanKind>().unwrap_err();
        assert_eq!(err, EngineError::InvalidPlanType("unknown plan type: saving".into()));
    }

    #[test]
    fn predicate_checks_every_condition() {
        let wallet = Uuid::new_v4();
        let category = Uuid::new_v4();
        let plan = budget_plan(wallet, category);

        assert!(plan.budget_matches(&expense(wallet, category, 10, 10)));
        assert!(plan.budget_matches(&expense(wallet, category, 10, 19)));
        // end date is exclusive
        let mut at_end = expense(wallet, category, 10, 19);
        at_end.created_at = plan.end_date;
        assert!(!plan.budget_matches(&at_end));
        assert!(!plan.budget_matches(&expense(wallet, category, 10, 9)));
        assert!(!plan.budget_matches(&expense(Uuid::new_v4(), category, 10, 12)));
        assert!(!plan.budget_matches(&expense(wallet, Uuid::new_v4(), 10, 12)));

        let mut income = expense(wallet, category, 10, 12);
        income.kind = TransactionKind::Income;
        assert!(!plan.budget_matches(&income));
    }

    #[test]
    fn goals_never_match() {
        let wallet = Uuid::new_v4();
        let category = Uuid::new_v4();
        let mut plan = budget_plan(wallet, category);
        plan.details = PlanDetails::Goal(Goal::new(1_000));
        assert!(!plan.budget_matches(&expense(wallet, category, 10, 12)));
    }

    #[test]
    fn rebuild_keeps_only_matching_transactions() {
        let wallet = Uuid::new_v4();
        let category = Uuid::new_v4();
        let mut plan = budget_plan(wallet, category);
        let inside = expense(wallet, category, 300, 11);
        let also_inside = expense(wallet, category, 200, 15);
        let outside = expense(wallet, category, 999, 25);

        plan.rebuild_budget([&inside, &also_inside, &outside]).unwrap();

        let budget = plan.budget().unwrap();
        assert_eq!(budget.spent_amount, 500);
        assert_eq!(budget.records, vec![inside.id, also_inside.id]);

        plan.rebuild_budget([&inside, &also_inside, &outside]).unwrap();
        assert_eq!(plan.budget().unwrap().spent_amount, 500);
    }

    #[test]
    fn rebuild_rejects_spent_overflow() {
        let wallet = Uuid::new_v4();
        let category = Uuid::new_v4();
        let mut plan = budget_plan(wallet, category);
        let small = expense(wallet, category, 300, 11);
        plan.rebuild_budget([&small]).unwrap();

        let huge = expense(wallet, category, i64::MAX, 12);
        assert!(matches!(
            plan.rebuild_budget([&small, &huge]),
            Err(EngineError::InvalidAmount(_))
        ));
        let budget = plan.budget().unwrap();
        assert_eq!(budget.spent_amount, 300);
        assert_eq!(budget.records, vec![small.id]);
    }
}
