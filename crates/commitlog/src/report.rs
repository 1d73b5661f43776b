//! The authors query: ingest a slice of history and group it for display.
//!
//! [`run_authors_query`] validates raw parameters, ingests the matching
//! commits and groups them by contributor and date. [`local_report`] builds
//! the same grouping from commits already in storage.

mod grouping;
mod query;

use sea_orm::{ConnectionTrait, TransactionTrait};
use thiserror::Error;

pub use grouping::{AuthorGroup, AuthorsReport, CommitView, build_report};
pub use query::{AuthorsQuery, ValidatedQuery, ValidationErrors};

use crate::github::{GitHubClient, GitHubError};
use crate::store::{self, CommitFilter, Lookup, StoreError};
use crate::sync::{IngestError, ProgressCallback, SyncError, ingest};

/// Result of an authors query that did not fail.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthorsOutcome {
    /// Nothing matched; there is no body to return.
    NoContent,
    Report(AuthorsReport),
}

impl AuthorsOutcome {
    fn from_report(report: AuthorsReport) -> Self {
        if report.authors.is_empty() {
            Self::NoContent
        } else {
            Self::Report(report)
        }
    }
}

/// Errors surfaced by [`run_authors_query`].
#[derive(Debug, Error)]
pub enum QueryError {
    #[error("Invalid query: {0}")]
    Validation(#[from] ValidationErrors),

    /// The remote API failed. The remote body is kept as the source but
    /// never shown.
    #[error("Something went wrong")]
    Remote(#[source] GitHubError),

    #[error(transparent)]
    Sync(#[from] SyncError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl From<IngestError> for QueryError {
    fn from(err: IngestError) -> Self {
        match err {
            IngestError::Remote(remote) => Self::Remote(remote),
            IngestError::Sync(sync) => Self::Sync(sync),
        }
    }
}

/// Validate `query`, ingest what it selects and group the result.
pub async fn run_authors_query<D>(
    client: &GitHubClient,
    db: &D,
    query: &AuthorsQuery,
    on_progress: Option<&ProgressCallback>,
) -> Result<AuthorsOutcome, QueryError>
where
    D: TransactionTrait + ConnectionTrait,
{
    let validated = query.validate()?;
    let commits = ingest(client, db, &validated.request, on_progress)
        .await
        .inspect_err(|e| {
            if let IngestError::Remote(remote) = e {
                tracing::warn!(error = %remote, "Remote API failed during authors query");
            }
        })?;

    if commits.is_empty() {
        return Ok(AuthorsOutcome::NoContent);
    }

    let report = build_report(db, &commits).await?;
    Ok(AuthorsOutcome::from_report(report))
}

/// Build the authors report from stored commits without contacting the API.
pub async fn local_report<C: ConnectionTrait>(
    db: &C,
    owner: &str,
    repository: &str,
    filter: &CommitFilter,
) -> Result<AuthorsOutcome, StoreError> {
    let Lookup::Found(stored) =
        store::repositories::find_by_owner_and_name(db, owner, repository).await?
    else {
        return Ok(AuthorsOutcome::NoContent);
    };

    let commits = store::commits::find_for_repository(db, stored.id, filter).await?;
    let report = build_report(db, &commits).await?;
    Ok(AuthorsOutcome::from_report(report))
}

#[cfg(all(test, feature = "sqlite", feature = "migrate"))]
mod tests {
    use std::sync::Arc;

    use chrono::NaiveDate;
    use sea_orm::DatabaseConnection;

    use super::*;
    use crate::connect_and_migrate;
    use crate::http::{HttpResponse, MockTransport};

    const API: &str = "https://api.test";

    async fn setup_db() -> DatabaseConnection {
        connect_and_migrate("sqlite::memory:")
            .await
            .expect("Failed to create test database")
    }

    fn client(transport: &MockTransport) -> GitHubClient {
        GitHubClient::new_with_transport("secret", API, Arc::new(transport.clone())).unwrap()
    }

    fn raw(sha: &str, author: &str, day: u32) -> serde_json::Value {
        serde_json::json!({
            "sha": sha,
            "url": format!("https://api.test/repos/octocat/hello/commits/{sha}"),
            "commit": {
                "author": {
                    "name": author,
                    "email": format!("{author}@example.com"),
                    "date": format!("2024-03-{day:02}T12:00:00Z")
                },
                "message": format!("work by {author}")
            }
        })
    }

    fn respond(transport: &MockTransport, url: &str, body: serde_json::Value) {
        transport.push_response(
            url,
            HttpResponse {
                status: 200,
                headers: Vec::new(),
                body: serde_json::to_vec(&body).unwrap(),
            },
        );
    }

    fn hello_query() -> AuthorsQuery {
        AuthorsQuery {
            repository: Some("hello".to_string()),
            owner: Some("octocat".to_string()),
            ..Default::default()
        }
    }

    const HELLO_URL: &str = "https://api.test/repos/octocat/hello/commits?per_page=100&page=1";

    #[tokio::test]
    async fn seven_commits_group_into_five_authors_and_five_dates() {
        let db = setup_db().await;
        let transport = MockTransport::new();
        respond(
            &transport,
            HELLO_URL,
            serde_json::json!([
                raw("c1", "ada", 1),
                raw("c2", "brian", 2),
                raw("c3", "cleo", 3),
                raw("c4", "dmitri", 4),
                raw("c5", "eve", 5),
                raw("c6", "ada", 1),
                raw("c7", "brian", 2),
            ]),
        );

        let outcome = run_authors_query(&client(&transport), &db, &hello_query(), None)
            .await
            .expect("query should succeed");
        let AuthorsOutcome::Report(report) = outcome else {
            panic!("expected a report");
        };

        assert_eq!(report.authors.len(), 5);
        assert_eq!(report.dates.len(), 5);
        assert_eq!(
            report.dates.first(),
            NaiveDate::from_ymd_opt(2024, 3, 1).as_ref()
        );

        let names: Vec<&str> = report.authors.iter().map(|a| a.name.as_str()).collect();
        assert_eq!(names, vec!["ada", "brian", "cleo", "dmitri", "eve"]);

        for group in &report.authors[..2] {
            assert_eq!(group.commits.len(), 1);
            let bucket = group.commits.values().next().unwrap();
            assert_eq!(bucket.len(), 2);
        }
        for group in &report.authors[2..] {
            assert_eq!(group.commits.len(), 1);
            assert_eq!(group.commits.values().next().unwrap().len(), 1);
        }

        let ada = &report.authors[0];
        let shas: Vec<&str> = ada.commits.values().flatten().map(|c| c.sha.as_str()).collect();
        assert_eq!(shas, vec!["c1", "c6"]);
        assert_eq!(ada.email.as_deref(), Some("ada@example.com"));
    }

    #[tokio::test]
    async fn report_serializes_with_date_keys() {
        let db = setup_db().await;
        let transport = MockTransport::new();
        respond(&transport, HELLO_URL, serde_json::json!([raw("c1", "ada", 9)]));

        let AuthorsOutcome::Report(report) =
            run_authors_query(&client(&transport), &db, &hello_query(), None)
                .await
                .unwrap()
        else {
            panic!("expected a report");
        };

        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["dates"], serde_json::json!(["2024-03-09"]));
        assert_eq!(
            json["authors"][0]["commits"]["2024-03-09"][0]["message"],
            "work by ada"
        );
    }

    #[tokio::test]
    async fn zero_commits_is_no_content() {
        let db = setup_db().await;
        let transport = MockTransport::new();
        respond(&transport, HELLO_URL, serde_json::json!([]));

        let outcome = run_authors_query(&client(&transport), &db, &hello_query(), None)
            .await
            .unwrap();
        assert_eq!(outcome, AuthorsOutcome::NoContent);
    }

    #[tokio::test]
    async fn invalid_query_never_reaches_the_api() {
        let db = setup_db().await;
        let transport = MockTransport::new();

        let err = run_authors_query(&client(&transport), &db, &AuthorsQuery::default(), None)
            .await
            .expect_err("missing fields must fail");
        assert!(matches!(err, QueryError::Validation(_)));
        assert!(transport.requests().is_empty());
    }

    #[tokio::test]
    async fn remote_failure_is_reported_generically() {
        let db = setup_db().await;
        let transport = MockTransport::new();
        transport.push_response(
            HELLO_URL,
            HttpResponse {
                status: 403,
                headers: Vec::new(),
                body: br#"{"message":"API rate limit exceeded for 10.0.0.1"}"#.to_vec(),
            },
        );

        let err = run_authors_query(&client(&transport), &db, &hello_query(), None)
            .await
            .expect_err("403 must fail");
        assert!(matches!(err, QueryError::Remote(_)));
        assert_eq!(err.to_string(), "Something went wrong");
    }

    #[tokio::test]
    async fn local_report_reads_stored_commits_only() {
        let db = setup_db().await;
        let filter = CommitFilter::default();

        let before = local_report(&db, "octocat", "hello", &filter).await.unwrap();
        assert_eq!(before, AuthorsOutcome::NoContent);

        let transport = MockTransport::new();
        respond(
            &transport,
            HELLO_URL,
            serde_json::json!([raw("c1", "ada", 1), raw("c2", "brian", 2)]),
        );
        run_authors_query(&client(&transport), &db, &hello_query(), None)
            .await
            .unwrap();

        let AuthorsOutcome::Report(report) =
            local_report(&db, "octocat", "hello", &filter).await.unwrap()
        else {
            panic!("expected a report");
        };
        assert_eq!(report.authors.len(), 2);
        assert_eq!(report.dates.len(), 2);
        assert_eq!(transport.requests().len(), 1);

        let since = chrono::DateTime::parse_from_rfc3339("2024-03-02T00:00:00Z").unwrap();
        let AuthorsOutcome::Report(recent) =
            local_report(&db, "octocat", "hello", &CommitFilter::default().with_since(since))
                .await
                .unwrap()
        else {
            panic!("expected a report");
        };
        assert_eq!(recent.authors.len(), 1);
        assert_eq!(recent.authors[0].name, "brian");
    }
}
