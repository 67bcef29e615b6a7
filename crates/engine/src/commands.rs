//! Command structs for engine operations.
//!
//! These types group parameters for write operations (transactions and
//! plans), keeping call sites readable and avoiding long argument lists.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::{PlanKind, TransactionKind};

/// Record an income or an expense in a wallet.
#[derive(Clone, Debug)]
pub struct NewTransactionCmd {
    pub wallet_id: Uuid,
    pub category_id: Uuid,
    pub kind: TransactionKind,
    pub amount_minor: i64,
    pub title: String,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
    pub user_id: String,
}

impl NewTransactionCmd {
    #[must_use]
    pub fn new(
        wallet_id: Uuid,
        user_id: impl Into<String>,
        kind: TransactionKind,
        amount_minor: i64,
        category_id: Uuid,
        title: impl Into<String>,
    ) -> Self {
        Self {
            wallet_id,
            category_id,
            kind,
            amount_minor,
            title: title.into(),
            description: None,
            created_at: Utc::now(),
            user_id: user_id.into(),
        }
    }

    #[must_use]
    pub fn expense(
        wallet_id: Uuid,
        user_id: impl Into<String>,
        amount_minor: i64,
        category_id: Uuid,
        title: impl Into<String>,
    ) -> Self {
        Self::new(
            wallet_id,
            user_id,
            TransactionKind::Expense,
            amount_minor,
            category_id,
            title,
        )
    }

    #[must_use]
    pub fn income(
        wallet_id: Uuid,
        user_id: impl Into<String>,
        amount_minor: i64,
        category_id: Uuid,
        title: impl Into<String>,
    ) -> Self {
        Self::new(
            wallet_id,
            user_id,
            TransactionKind::Income,
            amount_minor,
            category_id,
            title,
        )
    }

    #[must_use]
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    #[must_use]
    pub fn created_at(mut self, created_at: DateTime<Utc>) -> Self {
        self.created_at = created_at;
        self
    }
}

/// Patch an existing transaction.
///
/// `None` keeps the stored value. `description: Some(None)` clears it.
#[derive(Clone, Debug)]
pub struct UpdateTransactionCmd {
    pub wallet_id: Uuid,
    pub transaction_id: Uuid,
    pub kind: Option<TransactionKind>,
    pub amount_minor: Option<i64>,
    pub category_id: Option<Uuid>,
    pub title: Option<String>,
    pub description: Option<Option<String>>,
    pub created_at: Option<DateTime<Utc>>,
}

impl UpdateTransactionCmd {
    #[must_use]
    pub fn new(wallet_id: Uuid, transaction_id: Uuid) -> Self {
        Self {
            wallet_id,
            transaction_id,
            kind: None,
            amount_minor: None,
            category_id: None,
            title: None,
            description: None,
            created_at: None,
        }
    }

    #[must_use]
    pub fn kind(mut self, kind: TransactionKind) -> Self {
        self.kind = Some(kind);
        self
    }

    #[must_use]
    pub fn amount_minor(mut self, amount_minor: i64) -> Self {
        self.amount_minor = Some(amount_minor);
        self
    }

    #[must_use]
    pub fn category_id(mut self, category_id: Uuid) -> Self {
        self.category_id = Some(category_id);
        self
    }

    #[must_use]
    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    #[must_use]
    pub fn description(mut self, description: Option<String>) -> Self {
        self.description = Some(description);
        self
    }

    #[must_use]
    pub fn created_at(mut self, created_at: DateTime<Utc>) -> Self {
        self.created_at = Some(created_at);
        self
    }
}

/// Create a plan of the given kind.
///
/// Budgets need `start_date` and `categories`; goals accept an opening
/// `current_amount`. Fields of the other kind are rejected.
#[derive(Clone, Debug)]
pub struct NewPlanCmd {
    pub wallet_id: Uuid,
    pub kind: PlanKind,
    pub name: String,
    pub description: Option<String>,
    pub target_amount: i64,
    pub end_date: DateTime<Utc>,
    pub start_date: Option<DateTime<Utc>>,
    pub categories: Option<Vec<Uuid>>,
    pub current_amount: Option<i64>,
}

impl NewPlanCmd {
    #[must_use]
    pub fn new(
        wallet_id: Uuid,
        kind: PlanKind,
        name: impl Into<String>,
        target_amount: i64,
        end_date: DateTime<Utc>,
    ) -> Self {
        Self {
            wallet_id,
            kind,
            name: name.into(),
            description: None,
            target_amount,
            end_date,
            start_date: None,
            categories: None,
            current_amount: None,
        }
    }

    #[must_use]
    pub fn budget(
        wallet_id: Uuid,
        name: impl Into<String>,
        target_amount: i64,
        start_date: DateTime<Utc>,
        end_date: DateTime<Utc>,
        categories: Vec<Uuid>,
    ) -> Self {
        Self::new(wallet_id, PlanKind::Budget, name, target_amount, end_date)
            .start_date(start_date)
            .categories(categories)
    }

    #[must_use]
    pub fn goal(
        wallet_id: Uuid,
        name: impl Into<String>,
        target_amount: i64,
        end_date: DateTime<Utc>,
    ) -> Self {
        Self::new(wallet_id, PlanKind::Goal, name, target_amount, end_date)
    }

    #[must_use]
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    #[must_use]
    pub fn start_date(mut self, start_date: DateTime<Utc>) -> Self {
        self.start_date = Some(start_date);
        self
    }

    #[must_use]
    pub fn categories(mut self, categories: Vec<Uuid>) -> Self {
        self.categories = Some(categories);
        self
    }

    #[must_use]
    pub fn current_amount(mut self, current_amount: i64) -> Self {
        self.current_amount = Some(current_amount);
        self
    }
}

/// Patch a plan. `kind` must match the stored plan kind.
#[derive(Clone, Debug)]
pub struct UpdatePlanCmd {
    pub wallet_id: Uuid,
    pub plan_id: Uuid,
    pub kind: PlanKind,
    pub name: Option<String>,
    pub description: Option<Option<String>>,
    pub target_amount: Option<i64>,
    pub end_date: Option<DateTime<Utc>>,
    pub start_date: Option<DateTime<Utc>>,
    pub categories: Option<Vec<Uuid>>,
}

impl UpdatePlanCmd {
    #[must_use]
    pub fn new(wallet_id: Uuid, kind: PlanKind, plan_id: Uuid) -> Self {
        Self {
            wallet_id,
            plan_id,
            kind,
            name: None,
            description: None,
            target_amount: None,
            end_date: None,
            start_date: None,
            categories: None,
        }
    }

    #[must_use]
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    #[must_use]
    pub fn description(mut self, description: Option<String>) -> Self {
        self.description = Some(description);
        self
    }

    #[must_use]
    pub fn target_amount(mut self, target_amount: i64) -> Self {
        self.target_amount = Some(target_amount);
        self
    }

    #[must_use]
    pub fn end_date(mut self, end_date: DateTime<Utc>) -> Self {
        self.end_date = Some(end_date);
        self
    }

    #[must_use]
    pub fn start_date(mut self, start_date: DateTime<Utc>) -> Self {
        self.start_date = Some(start_date);
        self
    }

    #[must_use]
    pub fn categories(mut self, categories: Vec<Uuid>) -> Self {
        self.categories = Some(categories);
        self
    }
}
