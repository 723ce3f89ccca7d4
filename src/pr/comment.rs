//! Comments attached to a pull request.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::Deserialize;

use super::types::{null_default, User};

/// Fields every GitHub comment carries, whatever it is attached to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Comment {
    pub id: u64,
    /// Markdown as written by the commenter.
    pub body: Option<String>,
    pub body_text: Option<String>,
    pub body_html: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub api_url: String,
    /// Empty when the payload has no `_links`.
    pub html_url: String,
    pub pull_request_url: String,
    pub user: Option<User>,
}

/// A comment anchored to a file and diff position of a pull request.
///
/// `position` is 0 both when GitHub sends 0 and when it sends nothing (an
/// outdated comment); `original_position` keeps the difference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReviewComment {
    pub comment: Comment,
    pub original_position: Option<u64>,
    pub position: u64,
    pub commit_id: String,
    pub path: String,
}

impl ReviewComment {
    pub fn user(&self) -> Option<&User> {
        self.comment.user.as_ref()
    }

    pub fn id(&self) -> u64 {
        self.comment.id
    }

    pub fn body(&self) -> Option<&str> {
        self.comment.body.as_deref()
    }
}

impl fmt::Display for ReviewComment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let login = self.user().map(|user| user.login.as_str()).unwrap_or_default();
        write!(f, "<Review Comment [{login}]>")
    }
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct ApiReviewComment {
    #[serde(default, deserialize_with = "null_default")]
    id: u64,
    body: Option<String>,
    body_text: Option<String>,
    body_html: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    #[serde(default, deserialize_with = "null_default")]
    url: String,
    #[serde(rename = "_links")]
    links: Option<ApiCommentLinks>,
    user: Option<User>,
    original_position: Option<u64>,
    position: Option<u64>,
    #[serde(default, deserialize_with = "null_default")]
    commit_id: String,
    #[serde(default, deserialize_with = "null_default")]
    path: String,
}

#[derive(Debug, Clone, Deserialize)]
struct ApiCommentLinks {
    html: Option<ApiHref>,
    pull_request: Option<ApiHref>,
}

#[derive(Debug, Clone, Deserialize)]
struct ApiHref {
    #[serde(default, deserialize_with = "null_default")]
    href: String,
}

impl From<ApiReviewComment> for ReviewComment {
    fn from(raw: ApiReviewComment) -> Self {
        let (html_url, pull_request_url) = match raw.links {
            Some(links) => (
                links.html.map(|link| link.href).unwrap_or_default(),
                links.pull_request.map(|link| link.href).unwrap_or_default(),
            ),
            None => (String::new(), String::new()),
        };

        Self {
            comment: Comment {
                id: raw.id,
                body: raw.body,
                body_text: raw.body_text,
                body_html: raw.body_html,
                created_at: raw.created_at,
                updated_at: raw.updated_at,
                api_url: raw.url,
                html_url,
                pull_request_url,
                user: raw.user,
            },
            original_position: raw.original_position,
            position: raw.position.unwrap_or(0),
            commit_id: raw.commit_id,
            path: raw.path,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pr::test_support;

    fn parse(value: serde_json::Value) -> ReviewComment {
        serde_json::from_value::<ApiReviewComment>(value)
            .unwrap()
            .into()
    }

    #[test]
    fn test_review_comment_fields() {
        let comment = parse(test_support::review_comment_json(10, "alice"));
        assert_eq!(comment.id(), 10);
        assert_eq!(comment.body(), Some("comment 10"));
        assert_eq!(comment.path, "src/widget.rs");
        assert_eq!(comment.position, 4);
        assert_eq!(comment.original_position, Some(4));
        assert_eq!(comment.commit_id, "6dcb09b5b57875f334f61aebed695e2e4193db5e");
        assert_eq!(
            comment.comment.html_url,
            "https://github.com/octo/widgets/pull/42#discussion_r10"
        );
        assert_eq!(
            comment.comment.pull_request_url,
            "https://api.github.com/repos/octo/widgets/pulls/42"
        );
        assert_eq!(comment.to_string(), "<Review Comment [alice]>");
    }

    #[test]
    fn test_outdated_comment_position_defaults_to_zero() {
        let mut value = test_support::review_comment_json(11, "bob");
        value["position"] = serde_json::Value::Null;
        value["original_position"] = serde_json::json!(9);
        let comment = parse(value);
        assert_eq!(comment.position, 0);
        assert_eq!(comment.original_position, Some(9));
    }

    #[test]
    fn test_comment_without_links() {
        let mut value = test_support::review_comment_json(12, "carol");
        value.as_object_mut().unwrap().remove("_links");
        value.as_object_mut().unwrap().remove("position");
        let comment = parse(value);
        assert_eq!(comment.comment.html_url, "");
        assert_eq!(comment.comment.pull_request_url, "");
        assert_eq!(comment.position, 0);
    }

    #[test]
    fn test_comment_requires_created_at() {
        let mut value = test_support::review_comment_json(13, "dave");
        value.as_object_mut().unwrap().remove("created_at");
        assert!(serde_json::from_value::<ApiReviewComment>(value).is_err());
    }
}
