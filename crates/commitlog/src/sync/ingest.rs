//! Fetch-then-sync ingestion.

use sea_orm::TransactionTrait;

use super::engine::sync_commits;
use super::error::IngestError;
use super::progress::ProgressCallback;
use super::types::IngestRequest;
use crate::entity::commit;
use crate::github::GitHubClient;

/// Fetch the commits `request` selects and persist them.
///
/// Every page is fetched before anything is written, so a remote failure
/// leaves storage untouched. Remote errors are returned unchanged as
/// [`IngestError::Remote`].
pub async fn ingest<D: TransactionTrait>(
    client: &GitHubClient,
    db: &D,
    request: &IngestRequest,
    on_progress: Option<&ProgressCallback>,
) -> Result<Vec<commit::Model>, IngestError> {
    let query = request.commit_query();
    let raw_commits = client
        .fetch_commits_with_progress(&query, on_progress)
        .await?;

    tracing::debug!(
        repository = %request.repository,
        fetched = raw_commits.len(),
        "Fetched commits"
    );

    let persisted = sync_commits(db, &request.repository, &raw_commits, on_progress).await?;
    Ok(persisted)
}
