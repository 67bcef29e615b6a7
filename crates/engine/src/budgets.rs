//! Budget facet of a plan.
//!
//! Invariants kept by the engine:
//!
//! - `spent_amount` is the sum of the amounts of the transactions in
//!   `records`;
//! - `records` holds exactly the wallet expenses matching the budget (see
//!   [`Plan::budget_matches`](crate::Plan::budget_matches)).

use chrono::{DateTime, Utc};
use sea_orm::entity::{ActiveValue, prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Budget {
    pub target_amount: i64,
    pub spent_amount: i64,
    pub start_date: DateTime<Utc>,
    pub categories: Vec<Uuid>,
    /// Ids of the matching transactions.
    pub records: Vec<Uuid>,
}

impl Budget {
    /// How much can still be spent before reaching the target. Negative when
    /// the budget is exceeded.
    pub fn remaining(&self) -> i64 {
        self.target_amount - self.spent_amount
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "budgets")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub plan_id: String,
    pub target_amount: i64,
    pub spent_amount: i64,
    pub start_date: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::plans::Entity",
        from = "Column::PlanId",
        to = "super::plans::Column::Id",
        on_update = "NoAction",
        on_delete = "Cascade"
    )]
    Plans,
    #[sea_orm(has_many = "super::budget_categories::Entity")]
    Categories,
    #[sea_orm(has_many = "super::budget_records::Entity")]
    Records,
}

impl Related<super::plans::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Plans.def()
    }
}

impl Related<super::budget_categories::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Categories.def()
    }
}

impl Related<super::budget_records::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Records.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl ActiveModel {
    pub(crate) fn from_budget(plan_id: Uuid, budget: &Budget) -> Self {
        Self {
            plan_id: ActiveValue::Set(plan_id.to_string()),
            target_amount: ActiveValue::Set(budget.target_amount),
            spent_amount: ActiveValue::Set(budget.spent_amount),
            start_date: ActiveValue::Set(budget.start_date),
        }
    }
}
