use sea_orm::{
    ActiveValue, DatabaseTransaction, PaginatorTrait, QueryFilter, QueryOrder, TransactionTrait,
    prelude::*, sea_query::Expr,
};
use uuid::Uuid;

use crate::{
    EngineError, MAX_WALLETS_PER_USER, ResultEngine, Wallet, WalletKind, WalletRole,
    budget_categories, budget_records, budgets, goal_records, goals, plans, transactions,
    util::{add_amounts, normalize_display_name, parse_uuid},
    wallet_memberships, wallets,
};

use super::{Engine, normalize_optional_text, with_tx};

fn normalize_wallet_name(name: &str) -> ResultEngine<String> {
    normalize_display_name(name)
        .ok_or_else(|| EngineError::InvalidName("wallet name must not be empty".to_string()))
}

impl Engine {
    /// Return a wallet snapshot from DB, with members, transaction ids (newest
    /// first) and plan ids.
    pub async fn wallet(&self, wallet_id: Uuid) -> ResultEngine<Wallet> {
        with_tx!(self, |db_tx| {
            let model = self.require_wallet(&db_tx, wallet_id).await?;
            self.wallet_snapshot(&db_tx, model).await
        })
    }

    /// Wallets the user has access to, oldest first.
    pub async fn list_wallets(&self, user_id: &str) -> ResultEngine<Vec<Wallet>> {
        with_tx!(self, |db_tx| {
            let wallet_ids: Vec<String> = wallet_memberships::Entity::find()
                .filter(wallet_memberships::Column::UserId.eq(user_id.to_string()))
                .all(&db_tx)
                .await?
                .into_iter()
                .map(|m| m.wallet_id)
                .collect();

            let models = wallets::Entity::find()
                .filter(wallets::Column::Id.is_in(wallet_ids))
                .order_by_asc(wallets::Column::CreatedAt)
                .order_by_asc(wallets::Column::Id)
                .all(&db_tx)
                .await?;

            let mut out = Vec::with_capacity(models.len());
            for model in models {
                out.push(self.wallet_snapshot(&db_tx, model).await?);
            }
            Ok(out)
        })
    }

    /// Add a new wallet owned by `owner_id`, with a 0 balance.
    ///
    /// Wallet names are unique (case-insensitive) among the wallets of the
    /// owner, and an owner can have at most [`MAX_WALLETS_PER_USER`] wallets.
    pub async fn new_wallet(
        &self,
        owner_id: &str,
        name: &str,
        kind: WalletKind,
        icon: Option<&str>,
    ) -> ResultEngine<Uuid> {
        let name = normalize_wallet_name(name)?;
        let icon = normalize_optional_text(icon);
        with_tx!(self, |db_tx| {
            let owned = wallets::Entity::find()
                .filter(wallets::Column::OwnerId.eq(owner_id.to_string()))
                .count(&db_tx)
                .await?;
            if owned >= MAX_WALLETS_PER_USER {
                return Err(EngineError::LimitReached(format!(
                    "cannot create more than {MAX_WALLETS_PER_USER} wallets"
                )));
            }

            self.ensure_wallet_name_free(&db_tx, owner_id, &name, None)
                .await?;

            let wallet = Wallet::new(name, icon, kind, owner_id.to_string());
            let wallet_model: wallets::ActiveModel = (&wallet).into();
            wallet_model.insert(&db_tx).await?;

            wallet_memberships::ActiveModel {
                wallet_id: ActiveValue::Set(wallet.id.to_string()),
                user_id: ActiveValue::Set(owner_id.to_string()),
                role: ActiveValue::Set(WalletRole::Owner.as_str().to_string()),
            }
            .insert(&db_tx)
            .await?;

            tracing::info!(
                wallet_id = %wallet.id,
                owner_id,
                kind = kind.as_str(),
                "wallet created"
            );
            Ok(wallet.id)
        })
    }

    /// Renames an existing wallet.
    pub async fn rename_wallet(&self, wallet_id: Uuid, new_name: &str) -> ResultEngine<()> {
        let new_name = normalize_wallet_name(new_name)?;
        with_tx!(self, |db_tx| {
            let model = self.require_wallet(&db_tx, wallet_id).await?;
            self.ensure_wallet_name_free(&db_tx, &model.owner_id, &new_name, Some(wallet_id))
                .await?;

            let active = wallets::ActiveModel {
                id: ActiveValue::Set(wallet_id.to_string()),
                name: ActiveValue::Set(new_name),
                ..Default::default()
            };
            active.update(&db_tx).await?;
            Ok(())
        })
    }

    /// Sets or clears the wallet icon.
    pub async fn set_wallet_icon(&self, wallet_id: Uuid, icon: Option<&str>) -> ResultEngine<()> {
        let icon = normalize_optional_text(icon);
        with_tx!(self, |db_tx| {
            self.require_wallet(&db_tx, wallet_id).await?;
            let active = wallets::ActiveModel {
                id: ActiveValue::Set(wallet_id.to_string()),
                icon: ActiveValue::Set(icon),
                ..Default::default()
            };
            active.update(&db_tx).await?;
            Ok(())
        })
    }

    /// Deletes a wallet together with its transactions, plans (budget and
    /// goal facets included) and memberships.
    pub async fn delete_wallet(&self, wallet_id: Uuid) -> ResultEngine<()> {
        with_tx!(self, |db_tx| {
            self.require_wallet(&db_tx, wallet_id).await?;
            let wallet_key = wallet_id.to_string();

            let plan_ids: Vec<String> = plans::Entity::find()
                .filter(plans::Column::WalletId.eq(wallet_key.clone()))
                .all(&db_tx)
                .await?
                .into_iter()
                .map(|p| p.id)
                .collect();
            self.delete_plan_rows(&db_tx, plan_ids).await?;

            transactions::Entity::delete_many()
                .filter(transactions::Column::WalletId.eq(wallet_key.clone()))
                .exec(&db_tx)
                .await?;
            wallet_memberships::Entity::delete_many()
                .filter(wallet_memberships::Column::WalletId.eq(wallet_key.clone()))
                .exec(&db_tx)
                .await?;
            wallets::Entity::delete_by_id(wallet_key).exec(&db_tx).await?;

            tracing::info!(wallet_id = %wallet_id, "wallet deleted");
            Ok(())
        })
    }

    /// Removes plan envelopes and every facet row for `plan_ids`.
    pub(super) async fn delete_plan_rows(
        &self,
        db: &DatabaseTransaction,
        plan_ids: Vec<String>,
    ) -> ResultEngine<()> {
        if plan_ids.is_empty() {
            return Ok(());
        }
        budget_records::Entity::delete_many()
            .filter(budget_records::Column::PlanId.is_in(plan_ids.clone()))
            .exec(db)
            .await?;
        budget_categories::Entity::delete_many()
            .filter(budget_categories::Column::PlanId.is_in(plan_ids.clone()))
            .exec(db)
            .await?;
        budgets::Entity::delete_many()
            .filter(budgets::Column::PlanId.is_in(plan_ids.clone()))
            .exec(db)
            .await?;
        goal_records::Entity::delete_many()
            .filter(goal_records::Column::PlanId.is_in(plan_ids.clone()))
            .exec(db)
            .await?;
        goals::Entity::delete_many()
            .filter(goals::Column::PlanId.is_in(plan_ids.clone()))
            .exec(db)
            .await?;
        plans::Entity::delete_many()
            .filter(plans::Column::Id.is_in(plan_ids))
            .exec(db)
            .await?;
        Ok(())
    }

    /// Adds `delta_minor` to the stored wallet balance.
    pub(super) async fn bump_wallet_balance(
        &self,
        db: &DatabaseTransaction,
        wallet_id: Uuid,
        delta_minor: i64,
    ) -> ResultEngine<()> {
        if delta_minor == 0 {
            return Ok(());
        }
        let wallet = self.require_wallet(db, wallet_id).await?;
        let balance = add_amounts(wallet.balance, delta_minor, "wallet balance")?;
        let mut model: wallets::ActiveModel = wallet.into();
        model.balance = ActiveValue::Set(balance);
        model.update(db).await?;
        Ok(())
    }

    async fn ensure_wallet_name_free(
        &self,
        db: &DatabaseTransaction,
        owner_id: &str,
        name: &str,
        except: Option<Uuid>,
    ) -> ResultEngine<()> {
        let mut query = wallets::Entity::find()
            .filter(wallets::Column::OwnerId.eq(owner_id.to_string()))
            .filter(Expr::cust("LOWER(name)").eq(name.to_lowercase()));
        if let Some(wallet_id) = except {
            query = query.filter(wallets::Column::Id.ne(wallet_id.to_string()));
        }
        if query.one(db).await?.is_some() {
            return Err(EngineError::ExistingKey(name.to_string()));
        }
        Ok(())
    }

    async fn wallet_snapshot(
        &self,
        db: &DatabaseTransaction,
        model: wallets::Model,
    ) -> ResultEngine<Wallet> {
        let mut wallet = Wallet::try_from(model)?;
        let wallet_key = wallet.id.to_string();

        let memberships = wallet_memberships::Entity::find()
            .filter(wallet_memberships::Column::WalletId.eq(wallet_key.clone()))
            .order_by_asc(wallet_memberships::Column::UserId)
            .all(db)
            .await?;
        for membership in memberships {
            if WalletRole::try_from(membership.role.as_str())? == WalletRole::Admin {
                wallet.admins.push(membership.user_id.clone());
            }
            if membership.user_id != wallet.owner_id {
                wallet.members.push(membership.user_id);
            }
        }
        wallet.members.insert(0, wallet.owner_id.clone());

        wallet.transactions = transactions::Entity::find()
            .filter(transactions::Column::WalletId.eq(wallet_key.clone()))
            .order_by_desc(transactions::Column::CreatedAt)
            .order_by_desc(transactions::Column::Id)
            .all(db)
            .await?
            .iter()
            .map(|tx| parse_uuid(&tx.id, "transaction"))
            .collect::<ResultEngine<_>>()?;

        wallet.financial_plans = plans::Entity::find()
            .filter(plans::Column::WalletId.eq(wallet_key))
            .order_by_asc(plans::Column::CreatedAt)
            .order_by_asc(plans::Column::Id)
            .all(db)
            .await?
            .iter()
            .map(|plan| parse_uuid(&plan.id, "plan"))
            .collect::<ResultEngine<_>>()?;

        Ok(wallet)
    }
}
