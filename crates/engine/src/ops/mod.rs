use sea_orm::DatabaseConnection;

use crate::ResultEngine;

mod access;
mod budgets;
mod categories;
mod consistency;
mod goals;
mod memberships;
mod plans;
mod transactions;
mod wallets;

pub use consistency::{ConsistencyIssue, ConsistencyReport};
pub use plans::PlanListFilter;
pub use transactions::TransactionListFilter;

/// Runs `$body` with `$tx` bound to a fresh DB transaction. The transaction
/// is committed when the body returns `Ok`; on `Err` it is dropped, which
/// rolls it back.
macro_rules! with_tx {
    ($self:expr, |$tx:ident| $body:expr) => {{
        let $tx = $self.database.begin().await?;
        let result = $body;
        match result {
            Ok(value) => {
                $tx.commit().await?;
                Ok(value)
            }
            Err(err) => Err(err),
        }
    }};
}

pub(crate) use with_tx;

#[derive(Debug)]
pub struct Engine {
    database: DatabaseConnection,
}

impl Engine {
    pub fn builder() -> EngineBuilder {
        EngineBuilder::default()
    }
}

fn normalize_optional_text(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(ToString::to_string)
}

#[derive(Default)]
pub struct EngineBuilder {
    database: DatabaseConnection,
}

impl EngineBuilder {
    /// Connection the engine runs on; migrations must already be applied.
    pub fn database(mut self, db: DatabaseConnection) -> EngineBuilder {
        self.database = db;
        self
    }

    pub async fn build(self) -> ResultEngine<Engine> {
        Ok(Engine {
            database: self.database,
        })
    }
}
