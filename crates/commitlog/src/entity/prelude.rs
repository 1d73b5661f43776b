//! Common re-exports for convenient entity usage.

pub use super::commit::{
    ActiveModel as CommitActiveModel, Column as CommitColumn, CommitPayload, Entity as Commit,
    Model as CommitModel,
};
pub use super::contributor::{
    ActiveModel as ContributorActiveModel, Column as ContributorColumn, Entity as Contributor,
    Model as ContributorModel,
};
pub use super::repository::{
    ActiveModel as RepositoryActiveModel, Column as RepositoryColumn, Entity as Repository,
    Model as RepositoryModel,
};
