use crate::pr::PullRequest;

/// Display status of a pull request, derived from `state` and `merged_at`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrStatus {
    Open,
    Closed,
    Merged,
}

impl PrStatus {
    pub fn of(pr: &PullRequest) -> Self {
        if pr.merged_at.is_some() {
            PrStatus::Merged
        } else if pr.state == "closed" {
            PrStatus::Closed
        } else {
            PrStatus::Open
        }
    }
}

impl std::fmt::Display for PrStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PrStatus::Open => write!(f, "OPEN"),
            PrStatus::Closed => write!(f, "CLOSED"),
            PrStatus::Merged => write!(f, "MERGED"),
        }
    }
}

/// One changed file as listed in a report.
#[derive(Debug, Clone)]
pub struct FileSummary {
    pub filename: String,
    pub status: String,
    pub additions: u64,
    pub deletions: u64,
}

/// Everything printed by `pullreq show`.
#[derive(Debug)]
pub struct Report {
    /// PR number
    pub pr_number: u64,
    /// PR title
    pub pr_title: String,
    /// Author login, "unknown" when GitHub omits the user
    pub author: String,
    pub status: PrStatus,
    /// "octo:main <- alice:feature"
    pub branches: String,
    /// None while GitHub is still computing it
    pub mergeable: Option<bool>,
    pub html_url: String,
    pub body: Option<String>,
    /// Empty unless files were requested
    pub files: Vec<FileSummary>,
}

impl Report {
    pub fn additions(&self) -> u64 {
        self.files.iter().map(|file| file.additions).sum()
    }

    pub fn deletions(&self) -> u64 {
        self.files.iter().map(|file| file.deletions).sum()
    }
}
