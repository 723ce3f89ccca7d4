pub mod comment;
pub mod patch;
pub mod pull_request;
pub mod types;

pub use comment::{Comment, ReviewComment};
pub use patch::Hunk;
pub use pull_request::{Links, PrStream, PullRequest, PullRequestUpdate};
pub use types::{ChangedFile, Commit, Destination, Direction, GitActor, PrUrl, RepositoryRef, User};

use thiserror::Error;
use tracing::{debug, instrument};

use crate::session::{GitHubSession, SessionError};

#[derive(Debug, Error)]
pub enum PrError {
    #[error(transparent)]
    Session(#[from] SessionError),

    #[error("Invalid PR URL: {0}")]
    InvalidUrl(String),

    #[error("Pull request payload did not match the expected shape: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("Failed to parse patch: {0}")]
    PatchParse(String),
}

impl PrError {
    /// True when the failure is the missing-credentials guard.
    pub fn is_authentication_required(&self) -> bool {
        matches!(self, PrError::Session(SessionError::AuthenticationRequired))
    }
}

/// Parse a GitHub PR URL into its component parts.
///
/// Expected format: https://{host}/{owner}/{repo}/pull/{number}
pub fn parse_pr_url(url: &str) -> Result<PrUrl, PrError> {
    let parsed = reqwest::Url::parse(url).map_err(|_| PrError::InvalidUrl(url.to_string()))?;

    if !matches!(parsed.scheme(), "http" | "https") || parsed.host_str().is_none() {
        return Err(PrError::InvalidUrl(url.to_string()));
    }

    let segments: Vec<_> = parsed
        .path_segments()
        .ok_or_else(|| PrError::InvalidUrl(url.to_string()))?
        .filter(|segment| !segment.is_empty())
        .collect();

    if segments.len() != 4 || segments[2] != "pull" {
        return Err(PrError::InvalidUrl(url.to_string()));
    }

    let pr_number = segments[3]
        .parse::<u64>()
        .map_err(|_| PrError::InvalidUrl(url.to_string()))?;

    Ok(PrUrl {
        owner: segments[0].to_string(),
        repo: segments[1].to_string(),
        pr_number,
    })
}

/// Fetch a pull request through the session's API root.
#[instrument(skip(session), fields(owner = %pr_url.owner, repo = %pr_url.repo, pr = pr_url.pr_number))]
pub async fn fetch_pull_request(
    session: &GitHubSession,
    pr_url: &PrUrl,
) -> Result<PullRequest, PrError> {
    let url = pr_url.api_url(session);
    debug!(%url, "fetching pull request");
    let json: serde_json::Value = session.get_json(&url).await?;
    let pull_request = PullRequest::from_json(session.clone(), json)?;
    debug!(title = %pull_request.title, state = %pull_request.state, "received pull request");
    Ok(pull_request)
}

#[cfg(test)]
pub(crate) mod test_support;
