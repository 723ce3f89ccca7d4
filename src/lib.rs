//! Client-side model of GitHub pull requests.
//!
//! A [`pr::PullRequest`] is built from the JSON GitHub returns and exposes
//! its review comments, commits and changed files both as lazy streams and as
//! eagerly collected vectors. Merging and updating go through the session's
//! authentication guard and report success as a boolean.

pub mod config;
pub mod pr;
pub mod report;
pub mod session;

pub use pr::{PrError, PullRequest, PullRequestUpdate};
pub use session::{GitHubSession, SessionError};
