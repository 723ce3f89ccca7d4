//! JSON fixtures shaped like GitHub REST payloads.

use serde_json::{json, Value};

pub(crate) fn user_json(login: &str) -> Value {
    json!({
        "login": login,
        "id": 1,
        "type": "User",
        "avatar_url": "https://avatars.githubusercontent.com/u/1",
        "html_url": format!("https://github.com/{login}"),
        "url": format!("https://api.github.com/users/{login}"),
        "site_admin": false
    })
}

/// An open, unmerged pull request whose `url` points under `api_base`.
pub(crate) fn pull_json(api_base: &str, number: u64) -> Value {
    let api_url = format!("{api_base}/repos/octo/widgets/pulls/{number}");
    json!({
        "url": api_url,
        "id": 1_000 + number,
        "number": number,
        "state": "open",
        "title": "Add widget frobnicator",
        "body": "Frobnicates widgets.",
        "body_html": "<p>Frobnicates widgets.</p>",
        "body_text": "Frobnicates widgets.",
        "html_url": format!("https://github.com/octo/widgets/pull/{number}"),
        "diff_url": format!("https://github.com/octo/widgets/pull/{number}.diff"),
        "patch_url": format!("https://github.com/octo/widgets/pull/{number}.patch"),
        "issue_url": format!("{api_base}/repos/octo/widgets/issues/{number}"),
        "created_at": "2024-03-01T10:00:00Z",
        "updated_at": "2024-03-02T11:30:00Z",
        "closed_at": null,
        "merged_at": null,
        "mergeable": true,
        "merged_by": null,
        "user": user_json("alice"),
        "base": {
            "ref": "main",
            "label": "octo:main",
            "sha": "1111111111111111111111111111111111111111",
            "user": user_json("octo"),
            "repo": {"name": "widgets", "owner": user_json("octo")}
        },
        "head": {
            "ref": "frobnicate",
            "label": "alice:frobnicate",
            "sha": "2222222222222222222222222222222222222222",
            "user": user_json("alice"),
            "repo": {"name": "widgets", "owner": user_json("alice")}
        },
        "_links": {"self": {"href": "ignored"}}
    })
}

/// The same pull request after it has been merged.
pub(crate) fn merged_pull_json(api_base: &str, number: u64) -> Value {
    let mut value = pull_json(api_base, number);
    value["state"] = json!("closed");
    value["closed_at"] = json!("2024-03-03T09:00:00Z");
    value["merged_at"] = json!("2024-03-03T09:00:00Z");
    value["mergeable"] = Value::Null;
    value["merged_by"] = user_json("octo");
    value
}

pub(crate) fn review_comment_json(id: u64, login: &str) -> Value {
    json!({
        "id": id,
        "url": format!("https://api.github.com/repos/octo/widgets/pulls/comments/{id}"),
        "body": format!("comment {id}"),
        "path": "src/widget.rs",
        "position": 4,
        "original_position": 4,
        "commit_id": "6dcb09b5b57875f334f61aebed695e2e4193db5e",
        "user": user_json(login),
        "created_at": "2024-03-01T12:00:00Z",
        "updated_at": "2024-03-01T12:05:00Z",
        "_links": {
            "self": {"href": format!("https://api.github.com/repos/octo/widgets/pulls/comments/{id}")},
            "html": {"href": format!("https://github.com/octo/widgets/pull/42#discussion_r{id}")},
            "pull_request": {"href": "https://api.github.com/repos/octo/widgets/pulls/42"}
        }
    })
}

pub(crate) fn commit_json(sha: &str, message: &str) -> Value {
    json!({
        "sha": sha,
        "url": format!("https://api.github.com/repos/octo/widgets/commits/{sha}"),
        "html_url": format!("https://github.com/octo/widgets/commit/{sha}"),
        "commit": {
            "message": message,
            "author": {"name": "Alice", "email": "alice@example.com", "date": "2024-03-01T09:00:00Z"},
            "committer": {"name": "Alice", "email": "alice@example.com", "date": "2024-03-01T09:00:00Z"}
        },
        "author": user_json("alice"),
        "committer": user_json("alice"),
        "parents": [{"sha": "1111111111111111111111111111111111111111"}]
    })
}

pub(crate) fn file_json(filename: &str) -> Value {
    json!({
        "sha": "bbcd538c8e72b8c175046e27cc8f907076331401",
        "filename": filename,
        "status": "modified",
        "additions": 2,
        "deletions": 1,
        "changes": 3,
        "blob_url": format!("https://github.com/octo/widgets/blob/2222222/{filename}"),
        "raw_url": format!("https://github.com/octo/widgets/raw/2222222/{filename}"),
        "patch": "@@ -1,3 +1,4 @@\n fn main() {\n-    old();\n+    new();\n+    newer();\n }"
    })
}
