use sea_orm::{
    ActiveValue, DatabaseTransaction, QueryFilter, QueryOrder, TransactionTrait, prelude::*,
};
use uuid::Uuid;

use crate::{
    Category, DEFAULT_CATEGORIES, EngineError, PlanDetails, ResultEngine, Transaction,
    TransactionKind, budget_categories, categories, plans, transactions, util::name_with_key,
};

use super::{Engine, normalize_optional_text, with_tx};

const DEFAULT_ICON: &str = "default";

impl Engine {
    /// Adds a category for `owner_id`. Names are unique per owner after
    /// normalization ("Dining out" and "dining-out" collide).
    pub async fn new_category(
        &self,
        owner_id: &str,
        name: &str,
        kind: TransactionKind,
        icon: Option<&str>,
    ) -> ResultEngine<Uuid> {
        let (name, name_norm) = name_with_key(name, "category")?;
        let icon = normalize_optional_text(icon).unwrap_or_else(|| DEFAULT_ICON.to_string());
        with_tx!(self, |db_tx| {
            self.ensure_category_name_free(&db_tx, owner_id, &name_norm, None)
                .await?;
            let category = Category {
                id: Uuid::new_v4(),
                owner_id: owner_id.to_string(),
                name,
                kind,
                icon,
            };
            categories::ActiveModel::from_category(&category, name_norm)
                .insert(&db_tx)
                .await?;
            tracing::info!(category_id = %category.id, owner_id, "category created");
            Ok(category.id)
        })
    }

    pub async fn category(&self, category_id: Uuid) -> ResultEngine<Category> {
        with_tx!(self, |db_tx| {
            let model = self.require_category(&db_tx, category_id).await?;
            Category::try_from(model)
        })
    }

    /// Categories of a user sorted by name, optionally of a single kind.
    pub async fn list_categories(
        &self,
        owner_id: &str,
        kind: Option<TransactionKind>,
    ) -> ResultEngine<Vec<Category>> {
        with_tx!(self, |db_tx| {
            let mut query = categories::Entity::find()
                .filter(categories::Column::OwnerId.eq(owner_id.to_string()))
                .order_by_asc(categories::Column::NameNorm);
            if let Some(kind) = kind {
                query = query.filter(categories::Column::Kind.eq(kind.as_str()));
            }
            query
                .all(&db_tx)
                .await?
                .into_iter()
                .map(Category::try_from)
                .collect()
        })
    }

    /// Renames a category and/or changes its icon.
    pub async fn update_category(
        &self,
        category_id: Uuid,
        name: Option<&str>,
        icon: Option<&str>,
    ) -> ResultEngine<Category> {
        let renamed = name.map(|n| name_with_key(n, "category")).transpose()?;
        let icon = normalize_optional_text(icon);
        with_tx!(self, |db_tx| {
            let model = self.require_category(&db_tx, category_id).await?;
            if renamed.is_none() && icon.is_none() {
                return Category::try_from(model);
            }
            let mut active = categories::ActiveModel {
                id: ActiveValue::Set(model.id.clone()),
                ..Default::default()
            };
            if let Some((name, name_norm)) = renamed {
                self.ensure_category_name_free(
                    &db_tx,
                    &model.owner_id,
                    &name_norm,
                    Some(category_id),
                )
                .await?;
                active.name = ActiveValue::Set(name);
                active.name_norm = ActiveValue::Set(name_norm);
            }
            if let Some(icon) = icon {
                active.icon = ActiveValue::Set(icon);
            }
            let updated = active.update(&db_tx).await?;
            Category::try_from(updated)
        })
    }

    /// Inserts the default income and expense categories, skipping names the
    /// owner already has. Returns how many were added.
    pub async fn seed_default_categories(&self, owner_id: &str) -> ResultEngine<usize> {
        with_tx!(self, |db_tx| {
            let mut added = 0;
            for (name, kind, icon) in DEFAULT_CATEGORIES {
                let (name, name_norm) = name_with_key(name, "category")?;
                let exists = categories::Entity::find()
                    .filter(categories::Column::OwnerId.eq(owner_id.to_string()))
                    .filter(categories::Column::NameNorm.eq(name_norm.clone()))
                    .one(&db_tx)
                    .await?
                    .is_some();
                if exists {
                    continue;
                }
                let category = Category {
                    id: Uuid::new_v4(),
                    owner_id: owner_id.to_string(),
                    name,
                    kind: *kind,
                    icon: (*icon).to_string(),
                };
                categories::ActiveModel::from_category(&category, name_norm)
                    .insert(&db_tx)
                    .await?;
                added += 1;
            }
            tracing::info!(owner_id, added, "default categories seeded");
            Ok(added)
        })
    }

    /// Deletes a category, every transaction filed under it, and drops it
    /// from the budgets selecting it.
    ///
    /// Transactions go through the regular delete path, so wallet balances
    /// and budgets stay consistent.
    pub async fn delete_category(&self, category_id: Uuid) -> ResultEngine<()> {
        with_tx!(self, |db_tx| {
            self.require_category(&db_tx, category_id).await?;
            let category_key = category_id.to_string();

            let doomed = transactions::Entity::find()
                .filter(transactions::Column::CategoryId.eq(category_key.clone()))
                .all(&db_tx)
                .await?
                .into_iter()
                .map(Transaction::try_from)
                .collect::<ResultEngine<Vec<_>>>()?;
            for tx in &doomed {
                self.remove_transaction(&db_tx, tx).await?;
            }

            let plan_ids: Vec<String> = budget_categories::Entity::find()
                .filter(budget_categories::Column::CategoryId.eq(category_key.clone()))
                .all(&db_tx)
                .await?
                .into_iter()
                .map(|row| row.plan_id)
                .collect();
            budget_categories::Entity::delete_many()
                .filter(budget_categories::Column::CategoryId.eq(category_key.clone()))
                .exec(&db_tx)
                .await?;
            self.rescan_budgets(&db_tx, plan_ids).await?;

            categories::Entity::delete_by_id(category_key)
                .exec(&db_tx)
                .await?;
            tracing::info!(
                category_id = %category_id,
                transactions = doomed.len(),
                "category deleted"
            );
            Ok(())
        })
    }

    async fn rescan_budgets(
        &self,
        db: &DatabaseTransaction,
        plan_ids: Vec<String>,
    ) -> ResultEngine<()> {
        let models = plans::Entity::find()
            .filter(plans::Column::Id.is_in(plan_ids))
            .all(db)
            .await?;
        for model in models {
            let mut plan = self.load_plan(db, model).await?;
            if matches!(plan.details, PlanDetails::Budget(_)) {
                self.rescan_and_store_budget(db, &mut plan).await?;
            }
        }
        Ok(())
    }

    async fn ensure_category_name_free(
        &self,
        db: &DatabaseTransaction,
        owner_id: &str,
        name_norm: &str,
        except: Option<Uuid>,
    ) -> ResultEngine<()> {
        let mut query = categories::Entity::find()
            .filter(categories::Column::OwnerId.eq(owner_id.to_string()))
            .filter(categories::Column::NameNorm.eq(name_norm.to_string()));
        if let Some(category_id) = except {
            query = query.filter(categories::Column::Id.ne(category_id.to_string()));
        }
        if let Some(existing) = query.one(db).await? {
            return Err(EngineError::ExistingKey(existing.name));
        }
        Ok(())
    }
}
