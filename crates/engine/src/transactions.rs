//! Transaction primitives.
//!
//! A `Transaction` is a single income or expense recorded in a wallet. Its
//! signed amount is what the wallet balance is made of, and expenses are what
//! budgets track.

use chrono::{DateTime, Utc};
use sea_orm::{ActiveValue, entity::prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    EngineError, ResultEngine,
    util::{ensure_positive, parse_uuid},
};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionKind {
    Income,
    Expense,
}

impl TransactionKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Income => "income",
            Self::Expense => "expense",
        }
    }

    /// `+1` for income, `-1` for expense.
    pub fn sign(self) -> i64 {
        match self {
            Self::Income => 1,
            Self::Expense => -1,
        }
    }
}

impl TryFrom<&str> for TransactionKind {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "income" => Ok(Self::Income),
            "expense" => Ok(Self::Expense),
            other => Err(EngineError::InvalidKind(format!(
                "invalid transaction kind: {other}"
            ))),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    pub id: Uuid,
    pub wallet_id: Uuid,
    pub category_id: Uuid,
    pub kind: TransactionKind,
    pub amount_minor: i64,
    pub title: String,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
    pub created_by: String,
}

impl Transaction {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        wallet_id: Uuid,
        category_id: Uuid,
        kind: TransactionKind,
        amount_minor: i64,
        title: String,
        description: Option<String>,
        created_at: DateTime<Utc>,
        created_by: String,
    ) -> ResultEngine<Self> {
        ensure_positive(amount_minor, "amount_minor")?;
        Ok(Self {
            id: Uuid::new_v4(),
            wallet_id,
            category_id,
            kind,
            amount_minor,
            title,
            description,
            created_at,
            created_by,
        })
    }

    /// Contribution of this transaction to the wallet balance.
    pub fn signed_amount(&self) -> ResultEngine<i64> {
        self.kind
            .sign()
            .checked_mul(self.amount_minor)
            .ok_or_else(|| EngineError::InvalidAmount("amount_minor is out of range".to_string()))
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "transactions")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub wallet_id: String,
    pub category_id: String,
    pub kind: String,
    pub amount_minor: i64,
    pub title: String,
    pub description: Option<String>,
    pub created_at: DateTimeUtc,
    pub created_by: String,
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
    #[sea_orm(
        belongs_to = "super::categories::Entity",
        from = "Column::CategoryId",
        to = "super::categories::Column::Id",
        on_update = "NoAction",
        on_delete = "NoAction"
    )]
    Categories,
    #[sea_orm(has_many = "super::budget_records::Entity")]
    BudgetRecords,
}

impl Related<super::wallets::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Wallets.def()
    }
}

impl Related<super::categories::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Categories.def()
    }
}

impl Related<super::budget_records::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::BudgetRecords.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<&Transaction> for ActiveModel {
    fn from(tx: &Transaction) -> Self {
        Self {
            id: ActiveValue::Set(tx.id.to_string()),
            wallet_id: ActiveValue::Set(tx.wallet_id.to_string()),
            category_id: ActiveValue::Set(tx.category_id.to_string()),
            kind: ActiveValue::Set(tx.kind.as_str().to_string()),
            amount_minor: ActiveValue::Set(tx.amount_minor),
            title: ActiveValue::Set(tx.title.clone()),
            description: ActiveValue::Set(tx.description.clone()),
            created_at: ActiveValue::Set(tx.created_at),
            created_by: ActiveValue::Set(tx.created_by.clone()),
        }
    }
}

impl TryFrom<Model> for Transaction {
    type Error = EngineError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        ensure_positive(model.amount_minor, "amount_minor")?;
        Ok(Self {
            id: parse_uuid(&model.id, "transaction")?,
            wallet_id: parse_uuid(&model.wallet_id, "wallet")?,
            category_id: parse_uuid(&model.category_id, "category")?,
            kind: TransactionKind::try_from(model.kind.as_str())?,
            amount_minor: model.amount_minor,
            title: model.title,
            description: model.description,
            created_at: model.created_at,
            created_by: model.created_by,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_non_positive_amounts() {
        let err = Transaction::new(
            Uuid::new_v4(),
            Uuid::new_v4(),
            TransactionKind::Expense,
            0,
            "Lunch".to_string(),
            None,
            Utc::now(),
            "alice".to_string(),
        )
        .unwrap_err();
        assert_eq!(
            err,
            EngineError::InvalidAmount("amount_minor must be > 0".to_string())
        );
    }

    #[test]
    fn signed_amount_follows_kind() {
        let mut tx = Transaction::new(
            Uuid::new_v4(),
            Uuid::new_v4(),
            TransactionKind::Expense,
            500,
            "Lunch".to_string(),
            None,
            Utc::now(),
            "alice".to_string(),
        )
        .unwrap();
        assert_eq!(tx.signed_amount(), Ok(-500));
        tx.kind = TransactionKind::Income;
        assert_eq!(tx.signed_amount(), Ok(500));

        tx.amount_minor = i64::MAX;
        assert_eq!(tx.signed_amount(), Ok(i64::MAX));
        tx.kind = TransactionKind::Expense;
        assert_eq!(tx.signed_amount(), Ok(-i64::MAX));
    }

    #[test]
    fn unknown_kind_is_rejected() {
        assert_eq!(
            TransactionKind::try_from("transfer"),
            Err(EngineError::InvalidKind(
                "invalid transaction kind: transfer".to_string()
            ))
        );
    }

    #[test]
    fn model_round_trip_keeps_ids() {
        let tx = Transaction::new(
            Uuid::new_v4(),
            Uuid::new_v4(),
            TransactionKind::Income,
            42,
            "Salary".to_string(),
            Some("march".to_string()),
            Utc::now(),
            "alice".to_string(),
        )
        .unwrap();
        let model = Model {
            id: tx.id.to_string(),
            wallet_id: tx.wallet_id.to_string(),
            category_id: tx.category_id.to_string(),
            kind: "income".to_string(),
            amount_minor: 42,
            title: tx.title.clone(),
            description: tx.description.clone(),
            created_at: tx.created_at,
            created_by: tx.created_by.clone(),
        };
        assert_eq!(Transaction::try_from(model).unwrap(), tx);
    }
}
