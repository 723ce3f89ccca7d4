use clap::{Args, Parser, Subcommand};
use futures::TryStreamExt;
use pullreq::config::Config;
use pullreq::pr::{self, ChangedFile, Commit, PullRequest, PullRequestUpdate, ReviewComment};
use pullreq::{report, GitHubSession};
use std::path::PathBuf;
use tracing::{debug, info, info_span, Instrument};
use tracing_subscriber::EnvFilter;

/// pullreq: inspect, merge and edit GitHub pull requests from the terminal.
#[derive(Parser, Debug)]
#[command(name = "pullreq", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print a summary of the pull request
    Show {
        #[command(flatten)]
        target: Target,

        /// Also list changed files
        #[arg(long)]
        files: bool,

        /// Optional output file path for a markdown report
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Ask GitHub whether the pull request has been merged
    Merged {
        #[command(flatten)]
        target: Target,
    },

    /// List review comments
    Comments {
        #[command(flatten)]
        target: Target,

        #[command(flatten)]
        limit: Limit,
    },

    /// List commits
    Commits {
        #[command(flatten)]
        target: Target,

        #[command(flatten)]
        limit: Limit,
    },

    /// List changed files
    Files {
        #[command(flatten)]
        target: Target,

        #[command(flatten)]
        limit: Limit,

        /// Print hunk headers for each file
        #[arg(long)]
        hunks: bool,
    },

    /// Merge the pull request (requires a token)
    Merge {
        #[command(flatten)]
        target: Target,

        /// Commit message for the merge commit
        #[arg(short, long)]
        message: Option<String>,
    },

    /// Change title, body or state (requires a token)
    Update {
        #[command(flatten)]
        target: Target,

        #[arg(long)]
        title: Option<String>,

        #[arg(long)]
        body: Option<String>,

        /// "open" or "closed"
        #[arg(long)]
        state: Option<String>,
    },
}

#[derive(Args, Debug)]
struct Target {
    /// GitHub Pull Request URL (e.g., https://github.com/org/repo/pull/42)
    pr_url: String,
}

#[derive(Args, Debug)]
struct Limit {
    /// Stop after N items; negative means all. Without it everything is
    /// fetched up front.
    #[arg(short = 'n', long, allow_negative_numbers = true)]
    limit: Option<i64>,
}

impl Limit {
    /// `None` = eager listing, `Some(None)` = unbounded stream.
    fn stream_limit(&self) -> Option<Option<usize>> {
        self.limit.map(|n| usize::try_from(n).ok())
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    info!("loading configuration");
    let config = Config::load()?;
    let session = GitHubSession::from_config(&config)?;
    debug!(api = session.api_base(), authenticated = session.is_authenticated(), "session ready");

    match cli.command {
        Command::Show {
            target,
            files,
            output,
        } => {
            let pull = load(&session, &target).await?;
            let changed = if files { pull.files_all().await? } else { Vec::new() };
            let built_report = report::build(&pull, &changed);
            report::output(&built_report, output.as_deref())?;
        }
        Command::Merged { target } => {
            let pull = load(&session, &target).await?;
            let merged = pull.is_merged().await?;
            println!("{}", if merged { "merged" } else { "not merged" });
        }
        Command::Comments { target, limit } => {
            let pull = load(&session, &target).await?;
            match limit.stream_limit() {
                None => pull.comments_all().await?.iter().for_each(print_comment),
                Some(n) => {
                    let mut stream = pull.comments(n);
                    while let Some(comment) = stream.try_next().await? {
                        print_comment(&comment);
                    }
                }
            }
        }
        Command::Commits { target, limit } => {
            let pull = load(&session, &target).await?;
            match limit.stream_limit() {
                None => pull.commits_all().await?.iter().for_each(print_commit),
                Some(n) => {
                    let mut stream = pull.commits(n);
                    while let Some(commit) = stream.try_next().await? {
                        print_commit(&commit);
                    }
                }
            }
        }
        Command::Files {
            target,
            limit,
            hunks,
        } => {
            let pull = load(&session, &target).await?;
            match limit.stream_limit() {
                None => {
                    for file in pull.files_all().await? {
                        print_file(&file, hunks)?;
                    }
                }
                Some(n) => {
                    let mut stream = pull.files(n);
                    while let Some(file) = stream.try_next().await? {
                        print_file(&file, hunks)?;
                    }
                }
            }
        }
        Command::Merge { target, message } => {
            let mut pull = load(&session, &target).await?;
            if pull.merge(message.as_deref()).await? {
                pull.refresh().await?;
                println!("merged #{} ({})", pull.number, report::PrStatus::of(&pull));
            } else {
                println!("#{} was not merged", pull.number);
            }
        }
        Command::Update {
            target,
            title,
            body,
            state,
        } => {
            let mut pull = load(&session, &target).await?;
            let changes = PullRequestUpdate { title, body, state };
            if pull.update(&changes).await? {
                let built_report = report::build(&pull, &[]);
                report::output(&built_report, None)?;
            } else {
                println!("nothing changed");
            }
        }
    }

    Ok(())
}

async fn load(session: &GitHubSession, target: &Target) -> Result<PullRequest, pr::PrError> {
    let parsed_url = pr::parse_pr_url(&target.pr_url)?;
    debug!(owner = %parsed_url.owner, repo = %parsed_url.repo, pr = parsed_url.pr_number, "parsed PR URL");

    info!("fetching pull request from GitHub");
    pr::fetch_pull_request(session, &parsed_url)
        .instrument(info_span!("pullreq", pr_url = %target.pr_url))
        .await
}

fn print_comment(comment: &ReviewComment) {
    let login = comment.user().map(|user| user.login.as_str()).unwrap_or("?");
    println!(
        "{}:{} @{} ({})",
        comment.path,
        comment.position,
        login,
        comment.comment.created_at.format("%Y-%m-%d %H:%M")
    );
    for line in comment.body().unwrap_or_default().lines() {
        println!("    {line}");
    }
}

fn print_commit(commit: &Commit) {
    let author = commit
        .git_author
        .as_ref()
        .map(|actor| actor.name.as_str())
        .unwrap_or("?");
    println!("{} {} ({})", commit.short_sha(), commit.summary(), author);
}

fn print_file(file: &ChangedFile, hunks: bool) -> Result<(), pr::PrError> {
    println!(
        "{:<9} +{:<5} -{:<5} {}",
        file.status, file.additions, file.deletions, file.filename
    );
    if hunks {
        for hunk in file.hunks()? {
            println!("    {}", hunk.header());
        }
    }
    Ok(())
}
