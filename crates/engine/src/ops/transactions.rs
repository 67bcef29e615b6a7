use sea_orm::{DatabaseTransaction, TransactionTrait, prelude::*};
use uuid::Uuid;

use crate::{
    EngineError, NewTransactionCmd, ResultEngine, Transaction, UpdateTransactionCmd, propagation,
    transactions,
    util::{ensure_positive, normalize_display_name},
};

use super::{Engine, normalize_optional_text, with_tx};

mod list;

pub use list::TransactionListFilter;

fn normalize_title(title: &str) -> ResultEngine<String> {
    normalize_display_name(title).ok_or_else(|| {
        EngineError::InvalidName("transaction title must not be empty".to_string())
    })
}

impl Engine {
    /// Records an income or an expense.
    ///
    /// The wallet balance and every matching budget are updated in the same
    /// DB transaction.
    pub async fn create_transaction(&self, cmd: NewTransactionCmd) -> ResultEngine<Transaction> {
        let title = normalize_title(&cmd.title)?;
        let tx = Transaction::new(
            cmd.wallet_id,
            cmd.category_id,
            cmd.kind,
            cmd.amount_minor,
            title,
            normalize_optional_text(cmd.description.as_deref()),
            cmd.created_at,
            cmd.user_id,
        )?;

        with_tx!(self, |db_tx| {
            self.require_wallet(&db_tx, tx.wallet_id).await?;
            self.require_category(&db_tx, tx.category_id).await?;

            let model: transactions::ActiveModel = (&tx).into();
            model.insert(&db_tx).await?;
            let delta = propagation::wallet_delta_on_create(&tx)?;
            self.bump_wallet_balance(&db_tx, tx.wallet_id, delta).await?;

            let mut budgets = self.wallet_budgets(&db_tx, tx.wallet_id).await?;
            let changes = propagation::on_create(&tx, &budgets);
            self.apply_budget_changes(&db_tx, &mut budgets, &changes).await?;

            tracing::info!(
                transaction_id = %tx.id,
                wallet_id = %tx.wallet_id,
                kind = tx.kind.as_str(),
                amount_minor = tx.amount_minor,
                budgets = changes.len(),
                "transaction created"
            );
            Ok(tx)
        })
    }

    /// Patches a transaction and moves it between budgets as needed.
    pub async fn update_transaction(
        &self,
        cmd: UpdateTransactionCmd,
    ) -> ResultEngine<Transaction> {
        let title = cmd.title.as_deref().map(normalize_title).transpose()?;
        if let Some(amount_minor) = cmd.amount_minor {
            ensure_positive(amount_minor, "amount_minor")?;
        }

        with_tx!(self, |db_tx| {
            let previous = self
                .require_transaction_in_wallet(&db_tx, cmd.wallet_id, cmd.transaction_id)
                .await?;

            let mut current = previous.clone();
            if let Some(kind) = cmd.kind {
                current.kind = kind;
            }
            if let Some(amount_minor) = cmd.amount_minor {
                current.amount_minor = amount_minor;
            }
            if let Some(category_id) = cmd.category_id {
                self.require_category(&db_tx, category_id).await?;
                current.category_id = category_id;
            }
            if let Some(title) = title {
                current.title = title;
            }
            if let Some(description) = &cmd.description {
                current.description = normalize_optional_text(description.as_deref());
            }
            if let Some(created_at) = cmd.created_at {
                current.created_at = created_at;
            }
            if current == previous {
                return Ok(current);
            }

            let model: transactions::ActiveModel = (&current).into();
            model.update(&db_tx).await?;
            self.bump_wallet_balance(
                &db_tx,
                current.wallet_id,
                propagation::wallet_delta_on_update(&previous, &current)?,
            )
            .await?;

            let mut budgets = self.wallet_budgets(&db_tx, current.wallet_id).await?;
            let changes = propagation::on_update(&previous, &current, &budgets);
            self.apply_budget_changes(&db_tx, &mut budgets, &changes).await?;

            tracing::info!(
                transaction_id = %current.id,
                budgets = changes.len(),
                "transaction updated"
            );
            Ok(current)
        })
    }

    /// Deletes a transaction, restoring the wallet balance and the budgets
    /// tracking it.
    pub async fn delete_transaction(
        &self,
        wallet_id: Uuid,
        transaction_id: Uuid,
    ) -> ResultEngine<()> {
        with_tx!(self, |db_tx| {
            let tx = self
                .require_transaction_in_wallet(&db_tx, wallet_id, transaction_id)
                .await?;
            self.remove_transaction(&db_tx, &tx).await?;
            tracing::info!(transaction_id = %tx.id, wallet_id = %wallet_id, "transaction deleted");
            Ok(())
        })
    }

    pub async fn transaction(
        &self,
        wallet_id: Uuid,
        transaction_id: Uuid,
    ) -> ResultEngine<Transaction> {
        with_tx!(self, |db_tx| {
            self.require_transaction_in_wallet(&db_tx, wallet_id, transaction_id)
                .await
        })
    }

    /// On-delete propagation, then the row itself.
    pub(super) async fn remove_transaction(
        &self,
        db: &DatabaseTransaction,
        tx: &Transaction,
    ) -> ResultEngine<()> {
        let mut budgets = self.wallet_budgets(db, tx.wallet_id).await?;
        let changes = propagation::on_delete(tx, &budgets);
        self.apply_budget_changes(db, &mut budgets, &changes).await?;

        transactions::Entity::delete_by_id(tx.id.to_string())
            .exec(db)
            .await?;
        let delta = propagation::wallet_delta_on_delete(tx)?;
        self.bump_wallet_balance(db, tx.wallet_id, delta).await
    }
}
