//! Goal facet of a plan.
//!
//! A goal never reacts to transactions: its records are contributions the
//! user enters by hand, and `current_amount` is always their sum.

use chrono::{DateTime, Utc};
use sea_orm::entity::{ActiveValue, prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    EngineError, ResultEngine,
    util::{add_amounts, ensure_non_negative, parse_uuid, sub_amounts},
};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GoalRecord {
    pub id: Uuid,
    pub amount: i64,
    pub note: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Goal {
    pub target_amount: i64,
    pub current_amount: i64,
    pub records: Vec<GoalRecord>,
}

impl Goal {
    pub fn new(target_amount: i64) -> Self {
        Self {
            target_amount,
            current_amount: 0,
            records: Vec::new(),
        }
    }

    pub fn is_reached(&self) -> bool {
        self.current_amount >= self.target_amount
    }

    /// Append a contribution. `amount` must be `>= 0`.
    pub fn add_record(
        &mut self,
        amount: i64,
        note: Option<String>,
        created_at: DateTime<Utc>,
    ) -> ResultEngine<GoalRecord> {
        ensure_non_negative(amount, "goal record amount")?;
        let current_amount = add_amounts(self.current_amount, amount, "goal current amount")?;
        let record = GoalRecord {
            id: Uuid::new_v4(),
            amount,
            note,
            created_at,
        };
        self.current_amount = current_amount;
        self.records.push(record.clone());
        Ok(record)
    }

    /// Change the amount of a record, returning `new - old`.
    pub fn update_record(&mut self, record_id: Uuid, amount: i64) -> ResultEngine<i64> {
        ensure_non_negative(amount, "goal record amount")?;
        let record = self
            .records
            .iter_mut()
            .find(|record| record.id == record_id)
            .ok_or_else(|| EngineError::KeyNotFound(format!("goal record {record_id}")))?;
        // Both amounts are >= 0, so the difference fits.
        let delta = amount - record.amount;
        let current_amount = add_amounts(self.current_amount, delta, "goal current amount")?;
        record.amount = amount;
        self.current_amount = current_amount;
        Ok(delta)
    }

    pub fn delete_record(&mut self, record_id: Uuid) -> ResultEngine<GoalRecord> {
        let index = self
            .records
            .iter()
            .position(|record| record.id == record_id)
            .ok_or_else(|| EngineError::KeyNotFound(format!("goal record {record_id}")))?;
        self.current_amount = sub_amounts(
            self.current_amount,
            self.records[index].amount,
            "goal current amount",
        )?;
        Ok(self.records.remove(index))
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "goals")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub plan_id: String,
    pub target_amount: i64,
    pub current_amount: i64,
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
    #[sea_orm(has_many = "super::goal_records::Entity")]
    Records,
}

impl Related<super::plans::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Plans.def()
    }
}

impl Related<super::goal_records::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Records.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl ActiveModel {
    pub(crate) fn from_goal(plan_id: Uuid, goal: &Goal) -> Self {
        Self {
            plan_id: ActiveValue::Set(plan_id.to_string()),
            target_amount: ActiveValue::Set(goal.target_amount),
            current_amount: ActiveValue::Set(goal.current_amount),
        }
    }
}

impl super::goal_records::ActiveModel {
    pub(crate) fn from_record(plan_id: Uuid, record: &GoalRecord) -> Self {
        Self {
            id: ActiveValue::Set(record.id.to_string()),
            plan_id: ActiveValue::Set(plan_id.to_string()),
            amount: ActiveValue::Set(record.amount),
            note: ActiveValue::Set(record.note.clone()),
            created_at: ActiveValue::Set(record.created_at),
        }
    }
}

impl TryFrom<super::goal_records::Model> for GoalRecord {
    type Error = EngineError;

    fn try_from(model: super::goal_records::Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: parse_uuid(&model.id, "goal record")?,
            amount: model.amount,
            note: model.note,
            created_at: model.created_at,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn records_drive_current_amount() {
        let mut goal = Goal::new(5_000_000);
        let record = goal.add_record(1_000_000, None, Utc::now()).unwrap();
        assert_eq!(goal.records, vec![record.clone()]);
        assert_eq!(goal.current_amount, 1_000_000);
        let id = record.id;

        assert_eq!(goal.update_record(id, 10_000).unwrap(), -990_000);
        assert_eq!(goal.current_amount, 10_000);

        let removed = goal.delete_record(id).unwrap();
        assert_eq!(removed.amount, 10_000);
        assert_eq!(goal.current_amount, 0);
        assert!(goal.records.is_empty());
    }

    #[test]
    fn negative_amounts_are_rejected() {
        let mut goal = Goal::new(100);
        let err = goal.add_record(-1, None, Utc::now()).unwrap_err();
        assert_eq!(
            err,
            EngineError::InvalidAmount("goal record amount must be >= 0".to_string())
        );
        assert_eq!(goal.current_amount, 0);

        let id = goal.add_record(0, None, Utc::now()).unwrap().id;
        assert!(goal.update_record(id, -5).is_err());
        assert_eq!(goal.current_amount, 0);
    }

    #[test]
    fn unknown_record_is_not_found() {
        let mut goal = Goal::new(100);
        let missing = Uuid::new_v4();
        assert!(matches!(
            goal.update_record(missing, 1),
            Err(EngineError::KeyNotFound(_))
        ));
        assert!(matches!(
            goal.delete_record(missing),
            Err(EngineError::KeyNotFound(_))
        ));
    }

    #[test]
    fn reached_when_current_meets_target() {
        let mut goal = Goal::new(100);
        assert!(!goal.is_reached());
        goal.add_record(100, Some("bonus".into()), Utc::now()).unwrap();
        assert!(goal.is_reached());
    }

    #[test]
    fn overflowing_current_amount_is_rejected() {
        let mut goal = Goal::new(100);
        let big = goal.add_record(i64::MAX, None, Utc::now()).unwrap().id;
        let small = goal.add_record(0, None, Utc::now()).unwrap().id;

        let err = goal.add_record(1, None, Utc::now()).unwrap_err();
        assert_eq!(
            err,
            EngineError::InvalidAmount("goal current amount is out of range".to_string())
        );
        assert!(goal.update_record(small, 1).is_err());
        assert_eq!(goal.current_amount, i64::MAX);
        assert_eq!(goal.records.len(), 2);
        assert_eq!(goal.records[1].amount, 0);

        assert_eq!(goal.update_record(big, 0).unwrap(), -i64::MAX);
        assert_eq!(goal.current_amount, 0);
    }

}
