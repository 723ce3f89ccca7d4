//! The pull request aggregate and the operations clients run against it.
//!
//! A [`PullRequest`] is a snapshot of the server state at its last fetch. Its
//! sub-collections (review comments, commits, changed files) are never cached:
//! each accessor issues fresh requests against a URL derived from the pull
//! request's own `api_url`. Every collection is offered twice, as a lazy
//! stream with an optional limit and as an eager `*_all` vector, and the eager
//! form is nothing more than the unbounded stream collected.
//!
//! `update` and `refresh` swap in a brand-new snapshot built from the server
//! response; nothing is patched field by field. They take `&mut self`, so a
//! shared pull request must be wrapped in the caller's own lock.

use std::fmt;

use chrono::{DateTime, Utc};
use futures::stream::{BoxStream, StreamExt, TryStreamExt};
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::{debug, info, instrument, warn};

use super::comment::{ApiReviewComment, ReviewComment};
use super::types::{null_default, ApiCommit, ApiDestination, ChangedFile, Commit, Destination, Direction, User};
use super::PrError;
use crate::session::{build_url, GitHubSession};

/// Lazy sequence of items from one of a pull request's sub-collections.
pub type PrStream<T> = BoxStream<'static, Result<T, PrError>>;

/// Hypermedia links, rebuilt from `api_url` and `html_url` rather than read
/// from the payload's `_links`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Links {
    pub self_url: String,
    /// Issue comments (the conversation tab).
    pub comments: String,
    pub issue: String,
    pub html: String,
    /// Diff comments.
    pub review_comments: String,
}

impl Links {
    fn derive(api_url: &str, html_url: &str) -> Self {
        let issue = issue_url_for(api_url);
        Self {
            self_url: api_url.to_string(),
            comments: build_url(&issue, &["comments"]),
            issue,
            html: html_url.to_string(),
            review_comments: build_url(api_url, &["comments"]),
        }
    }
}

/// `.../repos/o/r/pulls/42` becomes `.../repos/o/r/issues/42`.
fn issue_url_for(api_url: &str) -> String {
    match api_url.rsplit_once("/pulls/") {
        Some((repo, number)) => format!("{repo}/issues/{number}"),
        None => api_url.to_string(),
    }
}

/// Drop any query string or fragment from the resource URL.
fn normalize_api_url(url: &str) -> String {
    match reqwest::Url::parse(url) {
        Ok(mut parsed) => {
            parsed.set_query(None);
            parsed.set_fragment(None);
            parsed.to_string()
        }
        Err(_) => url.to_string(),
    }
}

/// Fields to change on a pull request. Unset fields are left out of the
/// request body entirely.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PullRequestUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,
    /// "open" or "closed".
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
}

impl PullRequestUpdate {
    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn body(mut self, body: impl Into<String>) -> Self {
        self.body = Some(body.into());
        self
    }

    pub fn state(mut self, state: impl Into<String>) -> Self {
        self.state = Some(state.into());
        self
    }

    pub fn is_empty(&self) -> bool {
        self.title.is_none() && self.body.is_none() && self.state.is_none()
    }
}

#[derive(Debug, Deserialize)]
struct ApiPullRequest {
    #[serde(default, deserialize_with = "null_default")]
    url: String,
    base: Option<ApiDestination>,
    head: Option<ApiDestination>,
    body: Option<String>,
    body_html: Option<String>,
    body_text: Option<String>,
    closed_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    #[serde(default, deserialize_with = "null_default")]
    diff_url: String,
    #[serde(default, deserialize_with = "null_default")]
    html_url: String,
    #[serde(default, deserialize_with = "null_default")]
    id: u64,
    #[serde(default, deserialize_with = "null_default")]
    issue_url: String,
    merged_at: Option<DateTime<Utc>>,
    mergeable: Option<bool>,
    merged_by: Option<User>,
    #[serde(default, deserialize_with = "null_default")]
    number: u64,
    #[serde(default, deserialize_with = "null_default")]
    patch_url: String,
    #[serde(default, deserialize_with = "null_default")]
    state: String,
    #[serde(default, deserialize_with = "null_default")]
    title: String,
    updated_at: DateTime<Utc>,
    user: Option<User>,
}

#[derive(Debug, Deserialize)]
struct MergeResult {
    #[serde(default)]
    merged: bool,
    message: Option<String>,
}

/// A pull request as last reported by GitHub.
#[derive(Debug, Clone)]
pub struct PullRequest {
    session: GitHubSession,
    json: Value,
    /// Canonical REST URL; every sub-resource URL is derived from it.
    pub api_url: String,
    pub base: Destination,
    pub head: Destination,
    pub body: Option<String>,
    pub body_html: Option<String>,
    pub body_text: Option<String>,
    pub closed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub diff_url: String,
    pub html_url: String,
    /// Global identifier, distinct from `number`.
    pub id: u64,
    pub issue_url: String,
    pub links: Links,
    pub merged_at: Option<DateTime<Utc>>,
    /// `None` while GitHub is still computing mergeability.
    pub mergeable: Option<bool>,
    pub merged_by: Option<User>,
    /// Number shown in the UI (`#42`).
    pub number: u64,
    pub patch_url: String,
    /// "open" or "closed"; not validated.
    pub state: String,
    pub title: String,
    pub updated_at: DateTime<Utc>,
    /// Author.
    pub user: Option<User>,
}

impl PullRequest {
    /// Build a pull request from a decoded response body. Sub-objects are
    /// built eagerly; `created_at` and `updated_at` are required.
    pub fn from_json(session: GitHubSession, json: Value) -> Result<Self, PrError> {
        let raw = ApiPullRequest::deserialize(&json)?;
        let api_url = normalize_api_url(&raw.url);
        let links = Links::derive(&api_url, &raw.html_url);

        Ok(Self {
            session,
            api_url,
            base: Destination::new(raw.base.unwrap_or_default(), Direction::Base),
            head: Destination::new(raw.head.unwrap_or_default(), Direction::Head),
            body: raw.body,
            body_html: raw.body_html,
            body_text: raw.body_text,
            closed_at: raw.closed_at,
            created_at: raw.created_at,
            diff_url: raw.diff_url,
            html_url: raw.html_url,
            id: raw.id,
            issue_url: raw.issue_url,
            links,
            merged_at: raw.merged_at,
            mergeable: raw.mergeable,
            merged_by: raw.merged_by,
            number: raw.number,
            patch_url: raw.patch_url,
            state: raw.state,
            title: raw.title,
            updated_at: raw.updated_at,
            user: raw.user,
            json,
        })
    }

    pub fn session(&self) -> &GitHubSession {
        &self.session
    }

    /// The response body this snapshot was built from.
    pub fn to_json(&self) -> &Value {
        &self.json
    }

    /// Cached mergeability, with "not computed yet" reported as false.
    /// Never touches the network; see [`PullRequest::is_merged`] for the
    /// authoritative merge check.
    pub fn is_mergeable(&self) -> bool {
        self.mergeable.unwrap_or(false)
    }

    /// Ask GitHub whether this pull request has been merged.
    ///
    /// 204 means merged, 404 means not merged; anything else is an error.
    #[instrument(skip(self), fields(pr = self.number))]
    pub async fn is_merged(&self) -> Result<bool, PrError> {
        let url = build_url(&self.api_url, &["merge"]);
        let merged = self
            .session
            .boolean(&url, StatusCode::NO_CONTENT, StatusCode::NOT_FOUND)
            .await?;
        debug!(merged, "merge status");
        Ok(merged)
    }

    /// Review comments in server order. `limit` of `None` means all of them.
    pub fn comments(&self, limit: Option<usize>) -> PrStream<ReviewComment> {
        self.collection::<ApiReviewComment, ReviewComment>("comments", limit)
    }

    pub async fn comments_all(&self) -> Result<Vec<ReviewComment>, PrError> {
        self.comments(None).try_collect().await
    }

    pub fn commits(&self, limit: Option<usize>) -> PrStream<Commit> {
        self.collection::<ApiCommit, Commit>("commits", limit)
    }

    pub async fn commits_all(&self) -> Result<Vec<Commit>, PrError> {
        self.commits(None).try_collect().await
    }

    pub fn files(&self, limit: Option<usize>) -> PrStream<ChangedFile> {
        self.collection::<ChangedFile, ChangedFile>("files", limit)
    }

    pub async fn files_all(&self) -> Result<Vec<ChangedFile>, PrError> {
        self.files(None).try_collect().await
    }

    fn collection<R, T>(&self, resource: &str, limit: Option<usize>) -> PrStream<T>
    where
        R: DeserializeOwned + Send + 'static,
        T: From<R> + Send + 'static,
    {
        let url = build_url(&self.api_url, &[resource]);
        debug!(%url, ?limit, "listing pull request {resource}");
        self.session
            .paginate::<R, T>(&url, limit)
            .map_err(PrError::from)
            .boxed()
    }

    /// Merge this pull request, optionally with a commit message.
    ///
    /// Returns GitHub's `merged` flag. A 405 (not mergeable) or 409 (head
    /// moved) is reported as `false`. The snapshot itself is not refreshed;
    /// call [`PullRequest::refresh`] to observe the merged state.
    #[instrument(skip(self, commit_message), fields(pr = self.number))]
    pub async fn merge(&self, commit_message: Option<&str>) -> Result<bool, PrError> {
        let auth = self.session.authenticated()?;
        let body = commit_message
            .filter(|message| !message.is_empty())
            .map(|message| json!({ "commit_message": message }));
        let url = build_url(&self.api_url, &["merge"]);

        let response = auth.put(&url, body.as_ref()).await?;
        let status = response.status();
        if status == StatusCode::METHOD_NOT_ALLOWED || status == StatusCode::CONFLICT {
            let reason = GitHubSession::status_error(response).await;
            warn!(status = status.as_u16(), %reason, "merge rejected");
            return Ok(false);
        }

        let result: Option<MergeResult> =
            GitHubSession::decode_json(response, StatusCode::OK).await?;
        let merged = result.as_ref().is_some_and(|result| result.merged);
        let message = result.and_then(|result| result.message).unwrap_or_default();
        info!(merged, %message, "merge requested");
        Ok(merged)
    }

    /// Change title, body and/or state.
    ///
    /// An empty update sends nothing and returns false. On success the whole
    /// snapshot is replaced by the one GitHub returns and true is returned.
    #[instrument(skip(self, changes), fields(pr = self.number))]
    pub async fn update(&mut self, changes: &PullRequestUpdate) -> Result<bool, PrError> {
        let auth = self.session.authenticated()?;
        if changes.is_empty() {
            debug!("nothing to update");
            return Ok(false);
        }

        let response = auth.patch(&self.api_url, changes).await?;
        let Some(json) = GitHubSession::decode_json::<Value>(response, StatusCode::OK).await?
        else {
            return Ok(false);
        };

        let fresh = Self::from_json(self.session.clone(), json)?;
        *self = fresh;
        info!(state = %self.state, title = %self.title, "pull request updated");
        Ok(true)
    }

    /// Re-fetch this pull request and replace the snapshot.
    #[instrument(skip(self), fields(pr = self.number))]
    pub async fn refresh(&mut self) -> Result<(), PrError> {
        let json: Value = self.session.get_json(&self.api_url).await?;
        let fresh = Self::from_json(self.session.clone(), json)?;
        *self = fresh;
        debug!(state = %self.state, "pull request refreshed");
        Ok(())
    }
}

impl fmt::Display for PullRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<Pull Request [#{}]>", self.number)
    }
}
