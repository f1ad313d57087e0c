//! HTTP query surface.
//!
//! JSON over HTTP in front of the store and the ingestion pipeline:
//!
//! | Method | Path | Effect |
//! |--------|------|--------|
//! | `POST` | `/api/repos/{owner}/{name}/monitor` | Enqueue an intake request |
//! | `GET`  | `/api/repos/{owner}/{name}` | Read repository metadata |
//! | `GET`  | `/api/repos/{owner}/{name}/commits?page=&page_size=` | Paginated commit list |
//! | `GET`  | `/api/repos/{owner}/{name}/top-authors?limit=` | Top author aggregate |
//! | `POST` | `/api/repos/{owner}/{name}/reset-collection?start_time=` | Reset the commit window |
//!
//! Errors map by kind: invalid input is 400, a missing repository is 404,
//! everything else is 500 with an `{"error": ...}` body.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use gitpulse::entity::commit::Model as CommitModel;
use gitpulse::entity::repository::Model as RepositoryModel;
use gitpulse::store::{self, CommitAuthor, StoreError};
use gitpulse::sync::{self, SyncContext, SyncError};
use gitpulse::PipelineHandle;

const DEFAULT_PAGE: u64 = 1;
const DEFAULT_PAGE_SIZE: u64 = 10;
const DEFAULT_AUTHOR_LIMIT: u64 = 10;

/// Shared state for all route handlers.
#[derive(Clone)]
pub struct AppState {
    pub ctx: SyncContext,
    pub pipeline: PipelineHandle,
}

/// Build the API router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/repos/{owner}/{name}", get(get_repository))
        .route("/api/repos/{owner}/{name}/commits", get(list_commits))
        .route("/api/repos/{owner}/{name}/top-authors", get(top_authors))
        .route("/api/repos/{owner}/{name}/monitor", post(monitor_repository))
        .route(
            "/api/repos/{owner}/{name}/reset-collection",
            post(reset_collection),
        )
        .with_state(state)
}

// ─── Error mapping ───────────────────────────────────────────────────────────

/// Error type that renders as a JSON body with the mapped status code.
struct AppError {
    status: StatusCode,
    message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let body = serde_json::json!({ "error": self.message });
        (self.status, Json(body)).into_response()
    }
}

fn bad_request(message: impl Into<String>) -> AppError {
    AppError {
        status: StatusCode::BAD_REQUEST,
        message: message.into(),
    }
}

fn not_found(message: impl Into<String>) -> AppError {
    AppError {
        status: StatusCode::NOT_FOUND,
        message: message.into(),
    }
}

fn internal_error(message: impl Into<String>) -> AppError {
    AppError {
        status: StatusCode::INTERNAL_SERVER_ERROR,
        message: message.into(),
    }
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        match &err {
            StoreError::NotFound { .. } => not_found(err.to_string()),
            StoreError::InvalidInput { .. } => bad_request(err.to_string()),
            StoreError::Database(_) => {
                tracing::error!(error = %err, "store error");
                internal_error(err.to_string())
            }
        }
    }
}

impl From<SyncError> for AppError {
    fn from(err: SyncError) -> Self {
        if err.is_not_found() {
            not_found(err.to_string())
        } else {
            tracing::error!(error = %err, "sync error");
            internal_error(err.to_string())
        }
    }
}

// ─── Handlers ────────────────────────────────────────────────────────────────

#[derive(Serialize)]
struct Message {
    message: String,
}

async fn monitor_repository(
    State(state): State<AppState>,
    Path((owner, name)): Path<(String, String)>,
) -> Result<Json<Message>, AppError> {
    state
        .pipeline
        .request_monitor(&owner, &name)
        .await
        .map_err(|err| internal_error(err.to_string()))?;

    tracing::info!(%owner, %name, "repository monitoring triggered");
    Ok(Json(Message {
        message: "repository monitoring triggered".to_string(),
    }))
}

async fn get_repository(
    State(state): State<AppState>,
    Path((owner, name)): Path<(String, String)>,
) -> Result<Json<RepositoryModel>, AppError> {
    let repo = store::repos::find_by_owner_name(&state.ctx.db, &owner, &name)
        .await?
        .ok_or_else(|| not_found(format!("repository {owner}/{name}")))?;
    Ok(Json(repo))
}

#[derive(Debug, Deserialize)]
struct PageParams {
    page: Option<i64>,
    page_size: Option<i64>,
}

impl PageParams {
    /// Non-positive or missing values fall back to the defaults.
    fn normalize(&self) -> (u64, u64) {
        let page = match self.page {
            Some(page) if page > 0 => page as u64,
            _ => DEFAULT_PAGE,
        };
        let page_size = match self.page_size {
            Some(size) if size > 0 => size as u64,
            _ => DEFAULT_PAGE_SIZE,
        };
        (page, page_size)
    }
}

#[derive(Serialize)]
struct Pagination {
    page: u64,
    page_size: u64,
    total_pages: u64,
    total_items: u64,
}

#[derive(Serialize)]
struct PagedResponse<T> {
    pagination: Pagination,
    data: Vec<T>,
}

async fn list_commits(
    State(state): State<AppState>,
    Path((owner, name)): Path<(String, String)>,
    Query(params): Query<PageParams>,
) -> Result<Json<PagedResponse<CommitModel>>, AppError> {
    let (page, page_size) = params.normalize();

    let (commits, total) =
        store::commits::list_by_repository_name(&state.ctx.db, &owner, &name, page, page_size)
            .await?;

    Ok(Json(PagedResponse {
        pagination: Pagination {
            page,
            page_size,
            total_pages: total.div_ceil(page_size),
            total_items: total,
        },
        data: commits,
    }))
}

#[derive(Debug, Deserialize)]
struct LimitParams {
    limit: Option<i64>,
}

async fn top_authors(
    State(state): State<AppState>,
    Path((owner, name)): Path<(String, String)>,
    Query(params): Query<LimitParams>,
) -> Result<Json<Vec<CommitAuthor>>, AppError> {
    let limit = match params.limit {
        Some(limit) if limit > 0 => limit as u64,
        _ => DEFAULT_AUTHOR_LIMIT,
    };

    // Read endpoint over an aggregate: an unknown repository has no authors,
    // which is an empty result rather than an error.
    let authors = match store::repos::find_by_owner_name(&state.ctx.db, &owner, &name).await? {
        Some(repo) => store::commits::top_authors(&state.ctx.db, repo.id, limit).await?,
        None => Vec::new(),
    };
    Ok(Json(authors))
}

#[derive(Debug, Deserialize)]
struct ResetParams {
    start_time: Option<String>,
}

async fn reset_collection(
    State(state): State<AppState>,
    Path((owner, name)): Path<(String, String)>,
    Query(params): Query<ResetParams>,
) -> Result<Json<Message>, AppError> {
    let start_time = params
        .start_time
        .as_deref()
        .filter(|value| !value.is_empty())
        .ok_or_else(|| bad_request("start_time query parameter is required"))?;
    let start_time: DateTime<Utc> = DateTime::parse_from_rfc3339(start_time)
        .map_err(|_| bad_request("invalid start_time, must be RFC3339"))?
        .with_timezone(&Utc);

    sync::reset_collection(&state.ctx, &state.pipeline, &owner, &name, start_time).await?;

    tracing::info!(%owner, %name, %start_time, "commit collection reset");
    Ok(Json(Message {
        message: "collection reset successfully".to_string(),
    }))
}

#[cfg(test)]
mod tests {
    use std::net::SocketAddr;
    use std::time::Duration;

    use chrono::TimeZone;
    use gitpulse::github::CommitWindow;
    use gitpulse::scheduler::{PollConfig, PollScheduler};
    use gitpulse::shutdown::{self, ShutdownHandle};
    use gitpulse::store::{NewCommit, NewRepository};
    use gitpulse::{connect_and_migrate, pipeline};
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    struct TestServer {
        addr: SocketAddr,
        github: MockServer,
        ctx: SyncContext,
        _shutdown_handle: ShutdownHandle,
    }

    /// Full stack behind a real TCP listener: wiremock GitHub, in-memory
    /// SQLite, live pipeline and scheduler.
    async fn serve() -> TestServer {
        let github = MockServer::start().await;
        let db = connect_and_migrate("sqlite::memory:").await.unwrap();
        let client =
            gitpulse::github::GitHubClient::new(&github.uri(), "test-token").unwrap();
        let (shutdown_handle, shutdown) = shutdown::channel();

        let ctx = SyncContext { db, github: client };
        let scheduler = PollScheduler::new(
            ctx.clone(),
            shutdown.clone(),
            PollConfig {
                interval: Duration::from_secs(3600),
                ..PollConfig::default()
            },
        );
        let (pipeline, _workers) =
            pipeline::spawn(ctx.clone(), scheduler, shutdown, CommitWindow::default());

        let app = router(AppState {
            ctx: ctx.clone(),
            pipeline,
        });
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        TestServer {
            addr,
            github,
            ctx,
            _shutdown_handle: shutdown_handle,
        }
    }

    async fn seed_repo_with_commits(ctx: &SyncContext) -> i64 {
        let repo = store::repos::upsert(
            &ctx.db,
            NewRepository {
                owner: "octocat".to_string(),
                name: "hello".to_string(),
                description: Some("test".to_string()),
                url: "https://api.github.com/repos/octocat/hello".to_string(),
                language: Some("Rust".to_string()),
                forks_count: 1,
                stargazers_count: 2,
                open_issues_count: 0,
                watchers_count: 2,
                created_at: Utc.with_ymd_and_hms(2023, 1, 1, 0, 0, 0).unwrap(),
                updated_at: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
            },
        )
        .await
        .unwrap();

        let commits = (1..=15)
            .map(|day| NewCommit {
                repository_id: repo.id,
                hash: format!("hash-{day:02}"),
                message: format!("commit {day}"),
                author_name: if day % 3 == 0 { "bob" } else { "alice" }.to_string(),
                author_email: if day % 3 == 0 { "bob" } else { "alice" }.to_string() + "@x.com",
                commit_date: Utc.with_ymd_and_hms(2024, 1, day, 0, 0, 0).unwrap(),
                url: "https://example.invalid".to_string(),
            })
            .collect();
        store::commits::save(&ctx.db, commits).await.unwrap();
        repo.id
    }

    #[tokio::test]
    async fn get_repository_returns_404_for_unknown() {
        let server = serve().await;
        let response = reqwest::get(format!("http://{}/api/repos/ghost/missing", server.addr))
            .await
            .unwrap();
        assert_eq!(response.status(), 404);

        let body: serde_json::Value = response.json().await.unwrap();
        assert!(body["error"].as_str().unwrap().contains("ghost/missing"));
    }

    #[tokio::test]
    async fn get_repository_returns_stored_metadata() {
        let server = serve().await;
        seed_repo_with_commits(&server.ctx).await;

        let response = reqwest::get(format!("http://{}/api/repos/octocat/hello", server.addr))
            .await
            .unwrap();
        assert_eq!(response.status(), 200);

        let body: serde_json::Value = response.json().await.unwrap();
        assert_eq!(body["name"], "hello");
        assert_eq!(body["stargazers_count"], 2);
        assert_eq!(body["language"], "Rust");
    }

    #[tokio::test]
    async fn list_commits_paginates_with_defaults() {
        let server = serve().await;
        seed_repo_with_commits(&server.ctx).await;

        // No params: page 1, page_size 10, newest first.
        let response = reqwest::get(format!(
            "http://{}/api/repos/octocat/hello/commits",
            server.addr
        ))
        .await
        .unwrap();
        assert_eq!(response.status(), 200);
        let body: serde_json::Value = response.json().await.unwrap();
        assert_eq!(body["pagination"]["page"], 1);
        assert_eq!(body["pagination"]["page_size"], 10);
        assert_eq!(body["pagination"]["total_items"], 15);
        assert_eq!(body["pagination"]["total_pages"], 2);
        let data = body["data"].as_array().unwrap();
        assert_eq!(data.len(), 10);
        assert_eq!(data[0]["hash"], "hash-15");

        // Non-positive values fall back to the defaults.
        let response = reqwest::get(format!(
            "http://{}/api/repos/octocat/hello/commits?page=0&page_size=-5",
            server.addr
        ))
        .await
        .unwrap();
        let body: serde_json::Value = response.json().await.unwrap();
        assert_eq!(body["pagination"]["page"], 1);
        assert_eq!(body["pagination"]["page_size"], 10);

        // Second page holds the remainder.
        let response = reqwest::get(format!(
            "http://{}/api/repos/octocat/hello/commits?page=2&page_size=10",
            server.addr
        ))
        .await
        .unwrap();
        let body: serde_json::Value = response.json().await.unwrap();
        assert_eq!(body["data"].as_array().unwrap().len(), 5);
    }

    #[tokio::test]
    async fn top_authors_defaults_to_ten_and_orders_by_count() {
        let server = serve().await;
        seed_repo_with_commits(&server.ctx).await;

        let response = reqwest::get(format!(
            "http://{}/api/repos/octocat/hello/top-authors",
            server.addr
        ))
        .await
        .unwrap();
        assert_eq!(response.status(), 200);
        let body: serde_json::Value = response.json().await.unwrap();
        let authors = body.as_array().unwrap();
        assert_eq!(authors.len(), 2);
        assert_eq!(authors[0]["author_name"], "alice");
        assert_eq!(authors[0]["commit_count"], 10);
        assert_eq!(authors[1]["author_name"], "bob");
        assert_eq!(authors[1]["commit_count"], 5);

        let response = reqwest::get(format!(
            "http://{}/api/repos/octocat/hello/top-authors?limit=1",
            server.addr
        ))
        .await
        .unwrap();
        let body: serde_json::Value = response.json().await.unwrap();
        assert_eq!(body.as_array().unwrap().len(), 1);

        let response = reqwest::get(format!(
            "http://{}/api/repos/ghost/missing/top-authors",
            server.addr
        ))
        .await
        .unwrap();
        assert_eq!(response.status(), 200);
        let body: serde_json::Value = response.json().await.unwrap();
        assert_eq!(body, serde_json::json!([]));
    }

    #[tokio::test]
    async fn monitor_endpoint_accepts_and_ingests() {
        let server = serve().await;

        Mock::given(method("GET"))
            .and(path("/repos/octocat/hello"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "name": "hello",
                "description": "test repo",
                "url": format!("{}/repos/octocat/hello", server.github.uri()),
                "language": "Rust",
                "forks_count": 1,
                "stargazers_count": 3,
                "open_issues_count": 0,
                "watchers_count": 3,
                "created_at": "2023-01-01T00:00:00Z",
                "updated_at": "2024-01-01T00:00:00Z"
            })))
            .mount(&server.github)
            .await;
        Mock::given(method("GET"))
            .and(path("/repos/octocat/hello/commits"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([])))
            .mount(&server.github)
            .await;

        let client = reqwest::Client::new();
        let response = client
            .post(format!(
                "http://{}/api/repos/octocat/hello/monitor",
                server.addr
            ))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), 200);

        // The pipeline runs in the background; wait for the row to land.
        let deadline = tokio::time::Instant::now() + Duration::from_secs(5);
        loop {
            let found = store::repos::find_by_owner_name(&server.ctx.db, "octocat", "hello")
                .await
                .unwrap();
            if found.is_some() {
                break;
            }
            assert!(
                tokio::time::Instant::now() < deadline,
                "repository was never ingested"
            );
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
    }

    #[tokio::test]
    async fn reset_collection_validates_start_time() {
        let server = serve().await;
        seed_repo_with_commits(&server.ctx).await;
        let client = reqwest::Client::new();

        let response = client
            .post(format!(
                "http://{}/api/repos/octocat/hello/reset-collection",
                server.addr
            ))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), 400);

        let response = client
            .post(format!(
                "http://{}/api/repos/octocat/hello/reset-collection?start_time=yesterday",
                server.addr
            ))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), 400);

        let response = client
            .post(format!(
                "http://{}/api/repos/ghost/missing/reset-collection?start_time=2024-01-01T00:00:00Z",
                server.addr
            ))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), 404);
    }

    #[tokio::test]
    async fn reset_collection_deletes_commits() {
        let server = serve().await;
        let repo_id = seed_repo_with_commits(&server.ctx).await;

        // The refill fetch the pipeline performs afterwards.
        Mock::given(method("GET"))
            .and(path("/repos/octocat/hello/commits"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([])))
            .mount(&server.github)
            .await;

        let client = reqwest::Client::new();
        let response = client
            .post(format!(
                "http://{}/api/repos/octocat/hello/reset-collection?start_time=2024-01-01T00:00:00Z",
                server.addr
            ))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), 200);

        let latest = store::commits::latest_by_repository(&server.ctx.db, repo_id)
            .await
            .unwrap();
        assert!(latest.is_none(), "all commits deleted by the reset");
    }
}
