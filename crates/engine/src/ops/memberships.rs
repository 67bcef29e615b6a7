use sea_orm::{ActiveValue, TransactionTrait, prelude::*};
use uuid::Uuid;

use crate::{EngineError, ResultEngine, WalletKind, WalletRole, wallet_memberships};

use super::{Engine, with_tx};

impl Engine {
    /// Adds `user_id` as a plain member of a shared wallet.
    ///
    /// Authorization: `actor_id` must be the owner or an admin.
    pub async fn add_wallet_member(
        &self,
        wallet_id: Uuid,
        actor_id: &str,
        user_id: &str,
    ) -> ResultEngine<()> {
        let user_id = user_id.trim();
        if user_id.is_empty() {
            return Err(EngineError::InvalidName(
                "member id must not be empty".to_string(),
            ));
        }
        with_tx!(self, |db_tx| {
            let wallet = self.require_wallet(&db_tx, wallet_id).await?;
            if WalletKind::try_from(wallet.kind.as_str())? != WalletKind::Shared {
                return Err(EngineError::Forbidden(
                    "only shared wallets can have members".to_string(),
                ));
            }
            self.require_member_manager(&db_tx, wallet_id, actor_id)
                .await?;
            if self
                .membership_role(&db_tx, wallet_id, user_id)
                .await?
                .is_some()
            {
                return Err(EngineError::ExistingKey(user_id.to_string()));
            }

            wallet_memberships::ActiveModel {
                wallet_id: ActiveValue::Set(wallet_id.to_string()),
                user_id: ActiveValue::Set(user_id.to_string()),
                role: ActiveValue::Set(WalletRole::Member.as_str().to_string()),
            }
            .insert(&db_tx)
            .await?;
            tracing::info!(wallet_id = %wallet_id, user_id, "wallet member added");
            Ok(())
        })
    }

    /// Removes a member. The owner cannot be removed.
    ///
    /// Authorization: the owner removes anyone, an admin removes plain
    /// members, and every member can leave.
    pub async fn remove_wallet_member(
        &self,
        wallet_id: Uuid,
        actor_id: &str,
        user_id: &str,
    ) -> ResultEngine<()> {
        with_tx!(self, |db_tx| {
            self.require_wallet(&db_tx, wallet_id).await?;
            let target = self
                .membership_role(&db_tx, wallet_id, user_id)
                .await?
                .ok_or_else(|| EngineError::KeyNotFound(format!("member {user_id}")))?;
            if target == WalletRole::Owner {
                return Err(EngineError::Forbidden(
                    "the wallet owner cannot be removed".to_string(),
                ));
            }
            if actor_id != user_id {
                let actor = self
                    .require_member_manager(&db_tx, wallet_id, actor_id)
                    .await?;
                if actor == WalletRole::Admin && target == WalletRole::Admin {
                    return Err(EngineError::Forbidden(
                        "only the owner can remove an admin".to_string(),
                    ));
                }
            }

            wallet_memberships::Entity::delete_by_id((
                wallet_id.to_string(),
                user_id.to_string(),
            ))
            .exec(&db_tx)
            .await?;
            tracing::info!(wallet_id = %wallet_id, user_id, "wallet member removed");
            Ok(())
        })
    }

    /// Promotes a member to admin (`admin = true`) or demotes an admin.
    ///
    /// Authorization: owner only.
    pub async fn set_wallet_admin(
        &self,
        wallet_id: Uuid,
        owner_id: &str,
        user_id: &str,
        admin: bool,
    ) -> ResultEngine<()> {
        with_tx!(self, |db_tx| {
            let wallet = self.require_wallet(&db_tx, wallet_id).await?;
            if wallet.owner_id != owner_id {
                return Err(EngineError::Forbidden(
                    "only the owner can change admins".to_string(),
                ));
            }
            let current = self
                .membership_role(&db_tx, wallet_id, user_id)
                .await?
                .ok_or_else(|| EngineError::KeyNotFound(format!("member {user_id}")))?;
            let next = match (current, admin) {
                (WalletRole::Owner, _) => {
                    return Err(EngineError::Forbidden(
                        "the owner role cannot change".to_string(),
                    ));
                }
                (WalletRole::Admin, true) => {
                    return Err(EngineError::ExistingKey(format!(
                        "{user_id} is already an admin"
                    )));
                }
                (WalletRole::Member, false) => {
                    return Err(EngineError::KeyNotFound(format!(
                        "{user_id} is not an admin"
                    )));
                }
                (_, true) => WalletRole::Admin,
                (_, false) => WalletRole::Member,
            };

            wallet_memberships::ActiveModel {
                wallet_id: ActiveValue::Set(wallet_id.to_string()),
                user_id: ActiveValue::Set(user_id.to_string()),
                role: ActiveValue::Set(next.as_str().to_string()),
            }
            .update(&db_tx)
            .await?;
            tracing::info!(
                wallet_id = %wallet_id,
                user_id,
                role = next.as_str(),
                "wallet role changed"
            );
            Ok(())
        })
    }
}
