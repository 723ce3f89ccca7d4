pub mod types;

pub use types::{FileSummary, PrStatus, Report};

use crate::pr::{ChangedFile, PullRequest};
use colored::Colorize;
use std::path::Path;
use thiserror::Error;
use tracing::{debug, instrument};

#[derive(Debug, Error)]
pub enum ReportError {
    #[error("Failed to write report file: {0}")]
    FileWrite(#[from] std::io::Error),
}

/// Build a Report from a pull request snapshot and (optionally) its files.
pub fn build(pr: &PullRequest, files: &[ChangedFile]) -> Report {
    Report {
        pr_number: pr.number,
        pr_title: pr.title.clone(),
        author: pr
            .user
            .as_ref()
            .map(|user| user.login.clone())
            .unwrap_or_else(|| "unknown".to_string()),
        status: PrStatus::of(pr),
        branches: format!("{} <- {}", pr.base.label, pr.head.label),
        mergeable: pr.mergeable,
        html_url: pr.html_url.clone(),
        body: pr.body.clone().filter(|body| !body.trim().is_empty()),
        files: files
            .iter()
            .map(|file| FileSummary {
                filename: file.filename.clone(),
                status: file.status.clone(),
                additions: file.additions,
                deletions: file.deletions,
            })
            .collect(),
    }
}

/// Output the report to terminal (default) or to a markdown file.
#[instrument(skip(report), fields(pr = report.pr_number, status = %report.status))]
pub fn output(report: &Report, output_path: Option<&Path>) -> Result<(), ReportError> {
    match output_path {
        None => {
            debug!("writing report to terminal");
            print_terminal_report(report);
            Ok(())
        }
        Some(path) => {
            debug!(path = %path.display(), "writing report to file");
            write_markdown_report(report, path)
        }
    }
}

/// PR #42: "Add OAuth2 login flow" [OPEN]
/// Author: alice | octo:main <- alice:oauth | Mergeable: yes
fn print_terminal_report(report: &Report) {
    println!();
    println!(
        "PR #{}: \"{}\" [{}]",
        report.pr_number,
        report.pr_title,
        colorize_status(report.status)
    );
    println!(
        "Author: {} | {} | Mergeable: {}",
        report.author,
        report.branches,
        mergeable_label(report.mergeable)
    );
    println!("{}", report.html_url.dimmed());

    if let Some(body) = &report.body {
        println!();
        for line in body.lines() {
            println!("  {}", line);
        }
    }

    if !report.files.is_empty() {
        println!();
        println!(
            "═══ Files changed: {} (+{} -{}) ═══",
            report.files.len(),
            report.additions(),
            report.deletions()
        );
        for file in &report.files {
            println!(
                "  {} {} {} {}",
                format!("{:<9}", file.status).cyan(),
                format!("+{}", file.additions).green(),
                format!("-{}", file.deletions).red(),
                file.filename
            );
        }
    }
    println!();
}

fn write_markdown_report(report: &Report, path: &Path) -> Result<(), ReportError> {
    let mut md = String::new();
    md.push_str(&format!(
        "# PR #{}: \"{}\"\n\n",
        report.pr_number, report.pr_title
    ));
    md.push_str(&format!(
        "**Status:** {} | **Author:** {} | **Branches:** `{}` | **Mergeable:** {}\n\n",
        report.status,
        report.author,
        report.branches,
        mergeable_label(report.mergeable)
    ));
    md.push_str(&format!("<{}>\n\n", report.html_url));

    if let Some(body) = &report.body {
        md.push_str(body.trim_end());
        md.push_str("\n\n");
    }

    if !report.files.is_empty() {
        md.push_str(&format!(
            "## Files changed ({}, +{} -{})\n\n",
            report.files.len(),
            report.additions(),
            report.deletions()
        ));
        for file in &report.files {
            md.push_str(&format!(
                "- `{}` ({}, +{} -{})\n",
                file.filename, file.status, file.additions, file.deletions
            ));
        }
    }

    std::fs::write(path, md)?;
    Ok(())
}

fn mergeable_label(mergeable: Option<bool>) -> &'static str {
    match mergeable {
        Some(true) => "yes",
        Some(false) => "no",
        None => "unknown",
    }
}

/// Helper to colorize a status for terminal output.
fn colorize_status(status: PrStatus) -> colored::ColoredString {
    match status {
        PrStatus::Open => "OPEN".green().bold(),
        PrStatus::Closed => "CLOSED".red().bold(),
        PrStatus::Merged => "MERGED".magenta().bold(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pr::test_support::{file_json, merged_pull_json, pull_json};
    use crate::session::GitHubSession;

    fn sample_pr(json: serde_json::Value) -> PullRequest {
        let session = GitHubSession::new("https://api.github.com", "pullreq-tests").unwrap();
        PullRequest::from_json(session, json).unwrap()
    }

    fn sample_files() -> Vec<ChangedFile> {
        vec![
            serde_json::from_value(file_json("src/a.rs")).unwrap(),
            serde_json::from_value(file_json("src/b.rs")).unwrap(),
        ]
    }

    #[test]
    fn test_build_report_metadata() {
        let pr = sample_pr(pull_json("https://api.github.com", 42));
        let report = build(&pr, &[]);
        assert_eq!(report.pr_number, 42);
        assert_eq!(report.author, "alice");
        assert_eq!(report.status, PrStatus::Open);
        assert_eq!(report.branches, "octo:main <- alice:frobnicate");
        assert_eq!(report.mergeable, Some(true));
        assert!(report.files.is_empty());
    }

    #[test]
    fn test_status_of_snapshot() {
        let merged = sample_pr(merged_pull_json("https://api.github.com", 42));
        assert_eq!(PrStatus::of(&merged), PrStatus::Merged);

        let mut closed = pull_json("https://api.github.com", 42);
        closed["state"] = serde_json::json!("closed");
        assert_eq!(PrStatus::of(&sample_pr(closed)), PrStatus::Closed);
    }

    #[test]
    fn test_build_report_totals() {
        let pr = sample_pr(pull_json("https://api.github.com", 42));
        let report = build(&pr, &sample_files());
        assert_eq!(report.files.len(), 2);
        assert_eq!(report.additions(), 4);
        assert_eq!(report.deletions(), 2);
    }

    #[test]
    fn test_write_markdown_report() {
        let pr = sample_pr(pull_json("https://api.github.com", 42));
        let report = build(&pr, &sample_files());

        let path = std::env::temp_dir().join("pullreq_test_report.md");
        write_markdown_report(&report, &path).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.contains("# PR #42"));
        assert!(content.contains("**Author:** alice"));
        assert!(content.contains("**Mergeable:** yes"));
        assert!(content.contains("## Files changed (2, +4 -2)"));
        assert!(content.contains("- `src/a.rs` (modified, +2 -1)"));

        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn test_output_to_terminal() {
        let pr = sample_pr(pull_json("https://api.github.com", 42));
        let report = build(&pr, &sample_files());
        // Should not panic
        output(&report, None).unwrap();
    }
}
