//! Category registry per user.
//!
//! Categories classify transactions and select which expenses a budget
//! tracks. Names are unique per owner on their normalized key.

use sea_orm::entity::{ActiveValue, prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{EngineError, TransactionKind, util::parse_uuid};

/// Categories seeded for a new user: `(name, kind, icon)`.
pub const DEFAULT_CATEGORIES: &[(&str, TransactionKind, &str)] = &[
    ("Clothing", TransactionKind::Expense, "clothing"),
    ("Dining out", TransactionKind::Expense, "dining-out"),
    ("Education", TransactionKind::Expense, "education"),
    ("Entertainment", TransactionKind::Expense, "entertainment"),
    ("Groceries", TransactionKind::Expense, "groceries"),
    ("Healthcare", TransactionKind::Expense, "healthcare"),
    ("Rent/Mortgage", TransactionKind::Expense, "rent"),
    ("Transportation", TransactionKind::Expense, "transportation"),
    (
        "Utilities (Electricity, Water, Gas)",
        TransactionKind::Expense,
        "utilities",
    ),
    ("Insurance", TransactionKind::Expense, "insurance"),
    ("Salary", TransactionKind::Income, "salary"),
    ("Freelance", TransactionKind::Income, "freelance"),
    ("Investments", TransactionKind::Income, "investments"),
    ("Rental Income", TransactionKind::Income, "rental"),
    ("Business Revenue", TransactionKind::Income, "business"),
    ("Dividends", TransactionKind::Income, "dividends"),
    ("Royalties", TransactionKind::Income, "royalties"),
    ("Gifts", TransactionKind::Income, "gifts"),
    ("Side Jobs", TransactionKind::Income, "side-jobs"),
    ("Bonuses", TransactionKind::Income, "bonuses"),
    ("Donations", TransactionKind::Income, "gifts"),
];

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub id: Uuid,
    pub owner_id: String,
    pub name: String,
    pub kind: TransactionKind,
    pub icon: String,
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "categories")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub owner_id: String,
    pub name: String,
    pub name_norm: String,
    pub kind: String,
    pub icon: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::transactions::Entity")]
    Transactions,
    #[sea_orm(has_many = "super::budget_categories::Entity")]
    BudgetCategories,
}

impl Related<super::transactions::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Transactions.def()
    }
}

impl Related<super::budget_categories::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::BudgetCategories.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl ActiveModel {
    pub(crate) fn from_category(category: &Category, name_norm: String) -> Self {
        Self {
            id: ActiveValue::Set(category.id.to_string()),
            owner_id: ActiveValue::Set(category.owner_id.clone()),
            name: ActiveValue::Set(category.name.clone()),
            name_norm: ActiveValue::Set(name_norm),
            kind: ActiveValue::Set(category.kind.as_str().to_string()),
            icon: ActiveValue::Set(category.icon.clone()),
        }
    }
}

impl TryFrom<Model> for Category {
    type Error = EngineError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: parse_uuid(&model.id, "category")?,
            owner_id: model.owner_id,
            name: model.name,
            kind: TransactionKind::try_from(model.kind.as_str())?,
            icon: model.icon,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;
    use crate::util::normalize_name_key;

    #[test]
    fn default_categories_have_distinct_keys() {
        let keys: HashSet<String> = DEFAULT_CATEGORIES
            .iter()
            .filter_map(|(name, _, _)| normalize_name_key(name))
            .collect();
        assert_eq!(keys.len(), DEFAULT_CATEGORIES.len());
    }

    #[test]
    fn default_categories_cover_both_kinds() {
        let expenses = DEFAULT_CATEGORIES
            .iter()
            .filter(|(_, kind, _)| *kind == TransactionKind::Expense)
            .count();
        assert_eq!(expenses, 10);
        assert_eq!(DEFAULT_CATEGORIES.len() - expenses, 11);
    }
}
