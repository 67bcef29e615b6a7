//! The module contains `Wallet` struct and its implementation.

use chrono::{DateTime, Utc};
use sea_orm::entity::{ActiveValue, prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{EngineError, ResultEngine, util::parse_uuid};

/// At most this many wallets can be owned by one user.
pub const MAX_WALLETS_PER_USER: u64 = 5;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WalletKind {
    /// Only the owner uses it.
    Private,
    /// Members can be added.
    Shared,
}

impl WalletKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Private => "private",
            Self::Shared => "shared",
        }
    }
}

impl TryFrom<&str> for WalletKind {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "private" => Ok(Self::Private),
            "shared" => Ok(Self::Shared),
            other => Err(EngineError::InvalidKind(format!(
                "invalid wallet kind: {other}"
            ))),
        }
    }
}

/// A wallet.
///
/// A wallet is a representation of a real wallet, a bank account or anything
/// else where money are kept. The balance is denormalized: it always equals
/// the signed sum of the wallet transactions.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Wallet {
    /// Stable identifier for this wallet.
    ///
    /// This is a UUID generated once and persisted in the database, so the
    /// wallet can be renamed without breaking references.
    pub id: Uuid,
    pub name: String,
    pub icon: Option<String>,
    pub kind: WalletKind,
    pub balance: i64,
    pub owner_id: String,
    pub created_at: DateTime<Utc>,
    /// Every user with access, owner included.
    pub members: Vec<String>,
    pub admins: Vec<String>,
    pub transactions: Vec<Uuid>,
    pub financial_plans: Vec<Uuid>,
}

impl Wallet {
    pub fn new(name: String, icon: Option<String>, kind: WalletKind, owner_id: String) -> Self {
        Self {
            id: Uuid::new_v4(),
            name,
            icon,
            kind,
            balance: 0,
            members: vec![owner_id.clone()],
            owner_id,
            created_at: Utc::now(),
            admins: Vec::new(),
            transactions: Vec::new(),
            financial_plans: Vec::new(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "wallets")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub name: String,
    pub icon: Option<String>,
    pub kind: String,
    pub balance: i64,
    pub owner_id: String,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::transactions::Entity")]
    Transactions,
    #[sea_orm(has_many = "super::plans::Entity")]
    Plans,
    #[sea_orm(has_many = "super::wallet_memberships::Entity")]
    Memberships,
}

impl Related<super::transactions::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Transactions.def()
    }
}

impl Related<super::plans::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Plans.def()
    }
}

impl Related<super::wallet_memberships::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Memberships.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<&Wallet> for ActiveModel {
    fn from(value: &Wallet) -> Self {
        Self {
            id: ActiveValue::Set(value.id.to_string()),
            name: ActiveValue::Set(value.name.clone()),
            icon: ActiveValue::Set(value.icon.clone()),
            kind: ActiveValue::Set(value.kind.as_str().to_string()),
            balance: ActiveValue::Set(value.balance),
            owner_id: ActiveValue::Set(value.owner_id.clone()),
            created_at: ActiveValue::Set(value.created_at),
        }
    }
}

/// Builds the scalar part of a wallet; collections are filled by the caller.
impl TryFrom<Model> for Wallet {
    type Error = EngineError;

    fn try_from(model: Model) -> ResultEngine<Self> {
        Ok(Self {
            id: parse_uuid(&model.id, "wallet")?,
            name: model.name,
            icon: model.icon,
            kind: WalletKind::try_from(model.kind.as_str())?,
            balance: model.balance,
            owner_id: model.owner_id,
            created_at: model.created_at,
            members: Vec::new(),
            admins: Vec::new(),
            transactions: Vec::new(),
            financial_plans: Vec::new(),
        })
    }
}
