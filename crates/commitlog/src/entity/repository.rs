//! Repository entity - a named collection of commits owned by one contributor.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Repository model, unique by `(name, owner_id)`.
///
/// Created on the first ingestion request that names it and never updated.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "repositories")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    /// Repository name (URL slug on the remote host).
    pub name: String,
    /// Owning contributor.
    pub owner_id: Uuid,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::contributor::Entity",
        from = "Column::OwnerId",
        to = "super::contributor::Column::Id",
        on_delete = "Cascade"
    )]
    Owner,
    #[sea_orm(has_many = "super::commit::Entity")]
    Commits,
}

impl Related<super::contributor::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Owner.def()
    }
}

impl Related<super::commit::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Commits.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
