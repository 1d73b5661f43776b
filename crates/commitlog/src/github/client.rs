//! GitHub commits client.

use std::sync::Arc;

use tokio::task::JoinSet;
use url::Url;

use super::error::GitHubError;
use super::pagination::{LinkPagination, parse_link_header};
use super::types::{CommitQuery, RawCommit};
use crate::http::{HttpRequest, HttpResponse, HttpTransport};
use crate::sync::{ProgressCallback, SyncProgress, emit};

/// Public GitHub REST API root.
pub const DEFAULT_API_URL: &str = "https://api.github.com";

const USER_AGENT: &str = "commitlog";

/// One fetched page: its commits plus whatever pagination it advertised.
#[derive(Debug)]
struct FetchedPage {
    commits: Vec<RawCommit>,
    pagination: LinkPagination,
}

/// Client for the commit-listing endpoint.
///
/// Cheap to clone; clones share the transport and credential.
#[derive(Clone)]
pub struct GitHubClient {
    transport: Arc<dyn HttpTransport>,
    base_url: String,
    token: Arc<String>,
}

impl std::fmt::Debug for GitHubClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GitHubClient")
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

impl GitHubClient {
    /// Create a client for api.github.com backed by reqwest.
    ///
    /// # Errors
    /// Returns [`GitHubError::MissingToken`] if `token` is empty.
    #[cfg(feature = "github")]
    pub fn new(token: &str) -> Result<Self, GitHubError> {
        Self::with_timeout(
            token,
            DEFAULT_API_URL,
            crate::http::reqwest_transport::DEFAULT_TIMEOUT,
        )
    }

    /// Create a reqwest-backed client for a custom API root and timeout.
    #[cfg(feature = "github")]
    pub fn with_timeout(
        token: &str,
        base_url: &str,
        timeout: std::time::Duration,
    ) -> Result<Self, GitHubError> {
        use crate::http::reqwest_transport::ReqwestTransport;

        validate_token(token)?;
        let transport = ReqwestTransport::with_timeout(timeout)?;
        Self::new_with_transport(token, base_url, Arc::new(transport))
    }

    /// Create a client over an arbitrary transport.
    pub fn new_with_transport(
        token: &str,
        base_url: &str,
        transport: Arc<dyn HttpTransport>,
    ) -> Result<Self, GitHubError> {
        validate_token(token)?;
        Ok(Self {
            transport,
            base_url: base_url.trim_end_matches('/').to_string(),
            token: Arc::new(token.trim().to_string()),
        })
    }

    /// The API root requests are sent to.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Fetch every commit matching `query`.
    pub async fn fetch_commits(&self, query: &CommitQuery) -> Result<Vec<RawCommit>, GitHubError> {
        self.fetch_commits_with_progress(query, None).await
    }

    /// Fetch every commit matching `query`, reporting each page.
    ///
    /// Page 1 is fetched first. If its Link header advertises a last page,
    /// pages `2..=last` are fetched concurrently, one task per page. The
    /// result is page 1 followed by pages 2..N in page order, each page in
    /// the API's native order, regardless of completion order. The first
    /// failing page aborts the remaining tasks and its error is returned.
    pub async fn fetch_commits_with_progress(
        &self,
        query: &CommitQuery,
        on_progress: Option<&ProgressCallback>,
    ) -> Result<Vec<RawCommit>, GitHubError> {
        let first_url = self.commits_url(query)?;
        let first = self.get_page(&first_url).await?;

        let remaining_urls = first.pagination.remaining_page_urls();
        let total_pages = 1 + remaining_urls.len() as u32;
        emit(
            on_progress,
            SyncProgress::FetchedPage {
                page: 1,
                count: first.commits.len(),
                total_pages,
            },
        );
        tracing::debug!(
            owner = %query.owner,
            repo = %query.repo,
            total_pages,
            "Fetched first commits page"
        );

        let mut commits = first.commits;
        if !remaining_urls.is_empty() {
            let pages = self
                .fetch_remaining_pages(remaining_urls, total_pages, on_progress)
                .await?;
            for page in pages {
                commits.extend(page);
            }
        }

        emit(
            on_progress,
            SyncProgress::FetchComplete {
                repository: format!("{}/{}", query.owner, query.repo),
                total: commits.len(),
            },
        );

        Ok(commits)
    }

    /// Fan out over pages 2..N and return their commits indexed by page.
    async fn fetch_remaining_pages(
        &self,
        urls: Vec<String>,
        total_pages: u32,
        on_progress: Option<&ProgressCallback>,
    ) -> Result<Vec<Vec<RawCommit>>, GitHubError> {
        let mut slots: Vec<Option<Vec<RawCommit>>> = vec![None; urls.len()];
        let mut tasks = JoinSet::new();

        for (index, url) in urls.into_iter().enumerate() {
            let client = self.clone();
            tasks.spawn(async move { (index, client.get_page(&url).await) });
        }

        while let Some(joined) = tasks.join_next().await {
            let (index, result) =
                joined.map_err(|e| GitHubError::Internal(format!("page task failed: {e}")))?;
            let page = index as u32 + 2;

            match result {
                Ok(fetched) => {
                    emit(
                        on_progress,
                        SyncProgress::FetchedPage {
                            page,
                            count: fetched.commits.len(),
                            total_pages,
                        },
                    );
                    slots[index] = Some(fetched.commits);
                }
                Err(e) => {
                    tracing::warn!(page, error = %e, "Commits page failed, aborting fetch");
                    tasks.abort_all();
                    return Err(e);
                }
            }
        }

        slots
            .into_iter()
            .enumerate()
            .map(|(index, slot)| {
                slot.ok_or_else(|| {
                    GitHubError::Internal(format!("page {} produced no result", index + 2))
                })
            })
            .collect()
    }

    /// Build the page-1 URL for `query`.
    fn commits_url(&self, query: &CommitQuery) -> Result<String, GitHubError> {
        if query.owner.trim().is_empty() || query.repo.trim().is_empty() {
            return Err(GitHubError::InvalidQuery(
                "owner and repository must not be empty".to_string(),
            ));
        }

        let mut url = Url::parse(&self.base_url)
            .map_err(|e| GitHubError::InvalidQuery(format!("bad API url {}: {e}", self.base_url)))?;
        url.path_segments_mut()
            .map_err(|_| GitHubError::InvalidQuery(format!("bad API url {}", self.base_url)))?
            .pop_if_empty()
            .extend(["repos", query.owner.as_str(), query.repo.as_str(), "commits"]);
        url.query_pairs_mut().extend_pairs(query.query_pairs(1));

        Ok(url.into())
    }

    async fn get_page(&self, url: &str) -> Result<FetchedPage, GitHubError> {
        let request = HttpRequest::get(url)
            .header("Accept", "application/vnd.github+json")
            .header("User-Agent", USER_AGENT)
            .header("Authorization", format!("token {}", self.token));

        let response = self.transport.get(request).await?;
        log_rate_limit(&response);

        if !response.is_success() {
            tracing::debug!(url, status = response.status, "Commits request failed");
            return Err(GitHubError::Api { response });
        }

        let pagination = response
            .header("link")
            .map(parse_link_header)
            .unwrap_or_default();
        let commits: Vec<RawCommit> = response.json()?;

        Ok(FetchedPage {
            commits,
            pagination,
        })
    }
}

fn validate_token(token: &str) -> Result<(), GitHubError> {
    if token.trim().is_empty() {
        return Err(GitHubError::MissingToken);
    }
    Ok(())
}

fn log_rate_limit(response: &HttpResponse) {
    if let Some(remaining) = response
        .header("x-ratelimit-remaining")
        .and_then(|v| v.parse::<u64>().ok())
    {
        let reset = response
            .header("x-ratelimit-reset")
            .and_then(|v| v.parse::<i64>().ok())
            .and_then(|epoch| chrono::DateTime::from_timestamp(epoch, 0));
        tracing::debug!(remaining, reset_at = ?reset, "GitHub rate limit");
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;
    use std::time::Duration;

    use super::*;
    use crate::http::{HttpError, MockTransport};

    const API: &str = "https://api.test";

    fn commit_json(sha: &str, author: &str) -> serde_json::Value {
        serde_json::json!({
            "sha": sha,
            "url": format!("https://api.test/repos/octocat/hello/commits/{sha}"),
            "commit": {
                "author": {
                    "name": author,
                    "email": format!("{author}@example.com"),
                    "date": "2024-03-01T06:00:00Z"
                },
                "message": format!("commit {sha}")
            }
        })
    }

    fn page_body(shas: &[&str]) -> Vec<u8> {
        let commits: Vec<_> = shas.iter().map(|sha| commit_json(sha, "dev")).collect();
        serde_json::to_vec(&commits).unwrap()
    }

    fn ok(body: Vec<u8>, link: Option<String>) -> HttpResponse {
        let mut headers = vec![("Content-Type".to_string(), "application/json".to_string())];
        if let Some(link) = link {
            headers.push(("Link".to_string(), link));
        }
        HttpResponse {
            status: 200,
            headers,
            body,
        }
    }

    fn page_url(page: u32) -> String {
        format!("{API}/repositories/42/commits?per_page=100&page={page}")
    }

    fn first_url() -> String {
        format!("{API}/repos/octocat/hello/commits?per_page=100&page=1")
    }

    fn last_link(last: u32) -> String {
        format!(
            r#"<{}>; rel="next", <{}>; rel="last""#,
            page_url(2),
            page_url(last)
        )
    }

    fn client(transport: &MockTransport) -> GitHubClient {
        GitHubClient::new_with_transport("secret", API, Arc::new(transport.clone()))
            .expect("client should build")
    }

    fn shas(commits: &[RawCommit]) -> Vec<&str> {
        commits.iter().map(|c| c.sha.as_str()).collect()
    }

    #[test]
    fn empty_token_is_rejected_before_any_request() {
        let transport = MockTransport::new();
        for token in ["", "   "] {
            let err = GitHubClient::new_with_transport(token, API, Arc::new(transport.clone()))
                .expect_err("empty token must fail");
            assert!(matches!(err, GitHubError::MissingToken));
        }
        assert!(transport.requests().is_empty());
    }

    #[test]
    fn base_url_trailing_slash_is_trimmed() {
        let transport = MockTransport::new();
        let client = GitHubClient::new_with_transport("t", "https://api.test//", Arc::new(transport))
            .unwrap();
        assert_eq!(client.base_url(), "https://api.test");
    }

    #[test]
    fn commits_url_encodes_filters() {
        let transport = MockTransport::new();
        let query = CommitQuery::new("octocat", "hello")
            .with_author("mona lisa")
            .with_since("2024-01-01T00:00:00Z");
        let url = client(&transport).commits_url(&query).unwrap();

        let parsed = Url::parse(&url).unwrap();
        assert_eq!(parsed.path(), "/repos/octocat/hello/commits");
        let pairs: Vec<(String, String)> = parsed.query_pairs().into_owned().collect();
        assert_eq!(
            pairs,
            vec![
                ("author".to_string(), "mona lisa".to_string()),
                ("since".to_string(), "2024-01-01T00:00:00Z".to_string()),
                ("per_page".to_string(), "100".to_string()),
                ("page".to_string(), "1".to_string()),
            ]
        );
    }

    #[test]
    fn commits_url_rejects_blank_owner() {
        let transport = MockTransport::new();
        let err = client(&transport)
            .commits_url(&CommitQuery::new(" ", "hello"))
            .expect_err("blank owner");
        assert!(matches!(err, GitHubError::InvalidQuery(_)));
    }

    #[tokio::test]
    async fn single_page_without_link_header() {
        let transport = MockTransport::new();
        transport.push_response(first_url(), ok(page_body(&["a", "b"]), None));

        let commits = client(&transport)
            .fetch_commits(&CommitQuery::new("octocat", "hello"))
            .await
            .expect("fetch should succeed");

        assert_eq!(shas(&commits), vec!["a", "b"]);
        let requests = transport.requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(
            crate::http::header_get(&requests[0].headers, "authorization"),
            Some("token secret")
        );
    }

    #[tokio::test]
    async fn empty_result_is_an_empty_list() {
        let transport = MockTransport::new();
        transport.push_response(first_url(), ok(b"[]".to_vec(), None));

        let commits = client(&transport)
            .fetch_commits(&CommitQuery::new("octocat", "hello"))
            .await
            .unwrap();
        assert!(commits.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn pages_are_assembled_in_page_order_regardless_of_completion() {
        let transport = MockTransport::new();
        transport.push_response(first_url(), ok(page_body(&["p1a", "p1b"]), Some(last_link(3))));
        // Page 2 finishes last.
        transport.push_delayed_response(
            page_url(2),
            ok(page_body(&["p2a", "p2b"]), Some(last_link(3))),
            Duration::from_millis(300),
        );
        transport.push_delayed_response(
            page_url(3),
            ok(page_body(&["p3a"]), None),
            Duration::from_millis(10),
        );

        let completion = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&completion);
        let callback: ProgressCallback = Box::new(move |event| {
            if let SyncProgress::FetchedPage { page, .. } = event {
                sink.lock().unwrap().push(page);
            }
        });

        let commits = client(&transport)
            .fetch_commits_with_progress(&CommitQuery::new("octocat", "hello"), Some(&callback))
            .await
            .expect("fetch should succeed");

        assert_eq!(shas(&commits), vec!["p1a", "p1b", "p2a", "p2b", "p3a"]);
        assert_eq!(*completion.lock().unwrap(), vec![1, 3, 2]);
        assert_eq!(transport.requests().len(), 3);
    }

    #[tokio::test]
    async fn first_page_failure_carries_raw_response() {
        let transport = MockTransport::new();
        transport.push_response(
            first_url(),
            HttpResponse {
                status: 404,
                headers: Vec::new(),
                body: br#"{"message":"Not Found"}"#.to_vec(),
            },
        );

        let err = client(&transport)
            .fetch_commits(&CommitQuery::new("octocat", "hello"))
            .await
            .expect_err("404 must fail");

        assert_eq!(err.status(), Some(404));
        assert_eq!(err.message().as_deref(), Some("Not Found"));
        assert_eq!(transport.requests().len(), 1);
    }

    #[tokio::test]
    async fn failing_later_page_aborts_the_whole_fetch() {
        let transport = MockTransport::new();
        transport.push_response(first_url(), ok(page_body(&["p1"]), Some(last_link(4))));
        transport.push_response(page_url(2), ok(page_body(&["p2"]), None));
        transport.push_response(
            page_url(3),
            HttpResponse {
                status: 500,
                headers: Vec::new(),
                body: b"boom".to_vec(),
            },
        );
        transport.push_response(page_url(4), ok(page_body(&["p4"]), None));

        let err = client(&transport)
            .fetch_commits(&CommitQuery::new("octocat", "hello"))
            .await
            .expect_err("a failed page must fail the fetch");
        assert_eq!(err.status(), Some(500));
    }

    #[tokio::test]
    async fn transport_failure_propagates() {
        let transport = MockTransport::new();
        transport.push_response(first_url(), ok(page_body(&["p1"]), Some(last_link(2))));
        // Nothing registered for page 2.

        let err = client(&transport)
            .fetch_commits(&CommitQuery::new("octocat", "hello"))
            .await
            .expect_err("missing page must fail");
        assert!(matches!(
            err,
            GitHubError::Transport(HttpError::NoMockResponse { .. })
        ));
    }

    #[tokio::test]
    async fn malformed_body_is_a_json_error() {
        let transport = MockTransport::new();
        transport.push_response(first_url(), ok(b"{not json".to_vec(), None));

        let err = client(&transport)
            .fetch_commits(&CommitQuery::new("octocat", "hello"))
            .await
            .expect_err("bad json must fail");
        assert!(matches!(err, GitHubError::Json(_)));
    }
}
