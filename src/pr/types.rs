use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer};

use crate::session::GitHubSession;

/// Deserialize a value that GitHub may send as `null`, falling back to the
/// type's default.
pub(crate) fn null_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Represents the parsed components of a GitHub PR URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrUrl {
    pub owner: String,
    pub repo: String,
    pub pr_number: u64,
}

impl PrUrl {
    /// REST endpoint for this pull request under the session's API root.
    pub fn api_url(&self, session: &GitHubSession) -> String {
        session.build_url(&[
            "repos",
            &self.owner,
            &self.repo,
            "pulls",
            &self.pr_number.to_string(),
        ])
    }
}

/// A GitHub account (user, organization or bot).
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct User {
    #[serde(default, deserialize_with = "null_default")]
    pub login: String,
    #[serde(default, deserialize_with = "null_default")]
    pub id: u64,
    /// "User", "Organization" or "Bot".
    #[serde(rename = "type")]
    pub kind: Option<String>,
    #[serde(default, deserialize_with = "null_default")]
    pub avatar_url: String,
    #[serde(default, deserialize_with = "null_default")]
    pub html_url: String,
    #[serde(rename = "url", default, deserialize_with = "null_default")]
    pub api_url: String,
    pub name: Option<String>,
    pub email: Option<String>,
    pub company: Option<String>,
    pub location: Option<String>,
    pub blog: Option<String>,
    pub bio: Option<String>,
}

impl fmt::Display for User {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "<{} [{}:{}]>",
            self.kind.as_deref().unwrap_or("User"),
            self.login,
            self.name.as_deref().unwrap_or_default()
        )
    }
}

/// Which side of the merge a [`Destination`] describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Base,
    Head,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Base => write!(f, "Base"),
            Direction::Head => write!(f, "Head"),
        }
    }
}

/// Owner login and name of the repository a destination lives in. Both are
/// empty when GitHub omits the repository (e.g. a deleted fork).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RepositoryRef {
    pub owner: String,
    pub name: String,
}

impl fmt::Display for RepositoryRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.owner, self.name)
    }
}

/// One end (base or head) of a pull request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Destination {
    pub direction: Direction,
    /// Branch name, e.g. "main".
    pub git_ref: String,
    /// "owner:branch"
    pub label: String,
    pub user: Option<User>,
    pub sha: String,
    pub repository: RepositoryRef,
}

impl Destination {
    pub(crate) fn new(raw: ApiDestination, direction: Direction) -> Self {
        let repository = raw
            .repo
            .map(|repo| RepositoryRef {
                owner: repo.owner.map(|owner| owner.login).unwrap_or_default(),
                name: repo.name,
            })
            .unwrap_or_default();

        Self {
            direction,
            git_ref: raw.git_ref,
            label: raw.label,
            user: raw.user,
            sha: raw.sha,
            repository,
        }
    }
}

impl fmt::Display for Destination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<{} [{}]>", self.direction, self.label)
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub(crate) struct ApiDestination {
    #[serde(rename = "ref", default, deserialize_with = "null_default")]
    git_ref: String,
    #[serde(default, deserialize_with = "null_default")]
    label: String,
    user: Option<User>,
    #[serde(default, deserialize_with = "null_default")]
    sha: String,
    repo: Option<ApiRepository>,
}

#[derive(Debug, Clone, Deserialize)]
struct ApiRepository {
    #[serde(default, deserialize_with = "null_default")]
    name: String,
    owner: Option<ApiOwner>,
}

#[derive(Debug, Clone, Deserialize)]
struct ApiOwner {
    #[serde(default, deserialize_with = "null_default")]
    login: String,
}

/// A file touched by a pull request, as listed by `.../pulls/N/files`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ChangedFile {
    #[serde(default, deserialize_with = "null_default")]
    pub sha: String,
    #[serde(default, deserialize_with = "null_default")]
    pub filename: String,
    /// "added", "removed", "modified", "renamed", ... kept verbatim.
    #[serde(default, deserialize_with = "null_default")]
    pub status: String,
    #[serde(default, deserialize_with = "null_default")]
    pub additions: u64,
    #[serde(default, deserialize_with = "null_default")]
    pub deletions: u64,
    #[serde(default, deserialize_with = "null_default")]
    pub changes: u64,
    #[serde(default, deserialize_with = "null_default")]
    pub blob_url: String,
    #[serde(default, deserialize_with = "null_default")]
    pub raw_url: String,
    /// Unified diff of this file; absent for binary or very large files.
    pub patch: Option<String>,
}

impl fmt::Display for ChangedFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<Pull Request File [{}]>", self.filename)
    }
}

/// Name/email/date triple recorded in a git commit.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct GitActor {
    #[serde(default, deserialize_with = "null_default")]
    pub name: String,
    #[serde(default, deserialize_with = "null_default")]
    pub email: String,
    pub date: Option<DateTime<Utc>>,
}

/// A commit belonging to a pull request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Commit {
    pub sha: String,
    pub message: Option<String>,
    /// Author as recorded in git.
    pub git_author: Option<GitActor>,
    pub git_committer: Option<GitActor>,
    /// GitHub account matched to the git author, if any.
    pub author: Option<User>,
    pub committer: Option<User>,
    pub parents: Vec<String>,
    pub html_url: String,
    pub api_url: String,
}

impl Commit {
    pub fn short_sha(&self) -> &str {
        self.sha.get(..7).unwrap_or(&self.sha)
    }

    /// First line of the commit message.
    pub fn summary(&self) -> &str {
        self.message
            .as_deref()
            .and_then(|message| message.lines().next())
            .unwrap_or_default()
    }
}

impl fmt::Display for Commit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<Commit [{}]>", self.short_sha())
    }
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct ApiCommit {
    sha: Option<String>,
    #[serde(default, deserialize_with = "null_default")]
    url: String,
    #[serde(default, deserialize_with = "null_default")]
    html_url: String,
    commit: Option<ApiGitCommit>,
    message: Option<String>,
    author: Option<User>,
    committer: Option<User>,
    #[serde(default, deserialize_with = "null_default")]
    parents: Vec<ApiParent>,
}

#[derive(Debug, Clone, Deserialize)]
struct ApiGitCommit {
    message: Option<String>,
    author: Option<GitActor>,
    committer: Option<GitActor>,
}

#[derive(Debug, Clone, Deserialize)]
struct ApiParent {
    #[serde(default, deserialize_with = "null_default")]
    sha: String,
}

impl From<ApiCommit> for Commit {
    fn from(raw: ApiCommit) -> Self {
        let sha = raw
            .sha
            .filter(|sha| !sha.is_empty())
            .unwrap_or_else(|| raw.url.rsplit('/').next().unwrap_or_default().to_string());
        let (message, git_author, git_committer) = match raw.commit {
            Some(commit) => (
                commit.message.or(raw.message),
                commit.author,
                commit.committer,
            ),
            None => (raw.message, None, None),
        };

        Self {
            sha,
            message,
            git_author,
            git_committer,
            author: raw.author,
            committer: raw.committer,
            parents: raw.parents.into_iter().map(|parent| parent.sha).collect(),
            html_url: raw.html_url,
            api_url: raw.url,
        }
    }
}
