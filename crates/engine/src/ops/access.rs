use sea_orm::{DatabaseTransaction, QueryFilter, TransactionTrait, prelude::*};
use uuid::Uuid;

use crate::{
    EngineError, ResultEngine, Transaction, WalletRole, categories, plans, transactions,
    wallet_memberships, wallets,
};

use super::{Engine, with_tx};

/// Generates a `require_*` method loading a row by id, failing with
/// `KeyNotFound` when it does not exist.
macro_rules! impl_require_by_id {
    ($require_fn:ident, $entity:path, $model:path, $err_msg:literal) => {
        pub(super) async fn $require_fn(
            &self,
            db: &DatabaseTransaction,
            id: Uuid,
        ) -> ResultEngine<$model> {
            <$entity>::find_by_id(id.to_string())
                .one(db)
                .await?
                .ok_or_else(|| EngineError::KeyNotFound($err_msg.to_string()))
        }
    };
}

impl Engine {
    impl_require_by_id!(
        require_wallet,
        wallets::Entity,
        wallets::Model,
        "wallet not exists"
    );

    impl_require_by_id!(
        require_category,
        categories::Entity,
        categories::Model,
        "category not exists"
    );

    /// Load a plan envelope, checking it belongs to `wallet_id`.
    pub(super) async fn require_plan_in_wallet(
        &self,
        db: &DatabaseTransaction,
        wallet_id: Uuid,
        plan_id: Uuid,
    ) -> ResultEngine<plans::Model> {
        plans::Entity::find_by_id(plan_id.to_string())
            .filter(plans::Column::WalletId.eq(wallet_id.to_string()))
            .one(db)
            .await?
            .ok_or_else(|| EngineError::KeyNotFound("plan not exists".to_string()))
    }

    /// Load a transaction, checking it belongs to `wallet_id`.
    pub(super) async fn require_transaction_in_wallet(
        &self,
        db: &DatabaseTransaction,
        wallet_id: Uuid,
        transaction_id: Uuid,
    ) -> ResultEngine<Transaction> {
        let model = transactions::Entity::find_by_id(transaction_id.to_string())
            .filter(transactions::Column::WalletId.eq(wallet_id.to_string()))
            .one(db)
            .await?
            .ok_or_else(|| EngineError::KeyNotFound("transaction not exists".to_string()))?;
        Transaction::try_from(model)
    }

    /// Every id in `category_ids` must be an existing category.
    pub(super) async fn require_categories(
        &self,
        db: &DatabaseTransaction,
        category_ids: &[Uuid],
    ) -> ResultEngine<()> {
        for category_id in category_ids {
            self.require_category(db, *category_id).await?;
        }
        Ok(())
    }

    pub(super) async fn membership_role(
        &self,
        db: &DatabaseTransaction,
        wallet_id: Uuid,
        user_id: &str,
    ) -> ResultEngine<Option<WalletRole>> {
        let row = wallet_memberships::Entity::find_by_id((
            wallet_id.to_string(),
            user_id.to_string(),
        ))
        .one(db)
        .await?;
        row.as_ref()
            .map(|m| WalletRole::try_from(m.role.as_str()))
            .transpose()
    }

    /// Owners and admins only.
    pub(super) async fn require_member_manager(
        &self,
        db: &DatabaseTransaction,
        wallet_id: Uuid,
        user_id: &str,
    ) -> ResultEngine<WalletRole> {
        match self.membership_role(db, wallet_id, user_id).await? {
            Some(role) if role.can_manage_members() => Ok(role),
            _ => Err(EngineError::Forbidden(format!(
                "user {user_id} cannot manage members of wallet {wallet_id}"
            ))),
        }
    }

    /// Role of `user_id` in the wallet, `None` when the user has no access.
    ///
    /// Plan and transaction operations do not authorize; callers use this to
    /// check access first.
    pub async fn wallet_role(
        &self,
        wallet_id: Uuid,
        user_id: &str,
    ) -> ResultEngine<Option<WalletRole>> {
        with_tx!(self, |db_tx| {
            self.require_wallet(&db_tx, wallet_id).await?;
            self.membership_role(&db_tx, wallet_id, user_id).await
        })
    }
}
