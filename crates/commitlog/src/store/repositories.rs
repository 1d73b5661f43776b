use sea_orm::{
    ActiveValue::Set, ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter,
    sea_query::OnConflict,
};
use uuid::Uuid;

use crate::entity::contributor;
use crate::entity::repository::{ActiveModel, Column, Entity as Repository, Model};

use super::errors::{Result, StoreError};
use super::{Lookup, contributors};

/// Find a repository by its natural key `(name, owner_id)`.
pub async fn find_by_natural_key<C: ConnectionTrait>(
    db: &C,
    name: &str,
    owner_id: Uuid,
) -> Result<Lookup<Model>> {
    let found = Repository::find()
        .filter(Column::Name.eq(name))
        .filter(Column::OwnerId.eq(owner_id))
        .one(db)
        .await?;
    Ok(found.into())
}

/// Find a repository by its owner's contributor name and its own name.
pub async fn find_by_owner_and_name<C: ConnectionTrait>(
    db: &C,
    owner_name: &str,
    name: &str,
) -> Result<Lookup<Model>> {
    match contributors::find_by_name(db, owner_name).await? {
        Lookup::Found(owner) => find_by_natural_key(db, name, owner.id).await,
        Lookup::NotFound => Ok(Lookup::NotFound),
    }
}

/// Return the repository `name` owned by `owner`, creating it if absent.
///
/// Existing repositories are returned untouched.
pub async fn get_or_create<C: ConnectionTrait>(
    db: &C,
    name: &str,
    owner: &contributor::Model,
) -> Result<Model> {
    if name.trim().is_empty() {
        return Err(StoreError::blank("repository name"));
    }

    if let Lookup::Found(existing) = find_by_natural_key(db, name, owner.id).await? {
        return Ok(existing);
    }

    tracing::debug!(name, owner = %owner.name, "Creating repository");
    let model = ActiveModel {
        id: Set(Uuid::new_v4()),
        name: Set(name.to_string()),
        owner_id: Set(owner.id),
    };
    Repository::insert(model)
        .on_conflict(
            OnConflict::columns([Column::Name, Column::OwnerId])
                .do_nothing()
                .to_owned(),
        )
        .exec_without_returning(db)
        .await?;

    find_by_natural_key(db, name, owner.id)
        .await?
        .found()
        .ok_or_else(|| StoreError::repository_not_found(name, owner.id))
}
