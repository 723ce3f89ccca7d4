use super::types::ChangedFile;
use super::PrError;

/// A contiguous region of changes within a file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Hunk {
    /// Starting line number in the old file
    pub old_start: usize,
    /// Number of lines in the old file
    pub old_count: usize,
    /// Starting line number in the new file
    pub new_start: usize,
    /// Number of lines in the new file
    pub new_count: usize,
    /// Raw lines of the hunk (prefixed with +, -, or space)
    pub lines: Vec<String>,
}

impl Hunk {
    pub fn additions(&self) -> usize {
        self.lines.iter().filter(|line| line.starts_with('+')).count()
    }

    pub fn deletions(&self) -> usize {
        self.lines.iter().filter(|line| line.starts_with('-')).count()
    }

    /// The `@@ -a,b +c,d @@` header line.
    pub fn header(&self) -> String {
        format!(
            "@@ -{},{} +{},{} @@",
            self.old_start, self.old_count, self.new_start, self.new_count
        )
    }
}

impl ChangedFile {
    /// Split this file's patch into hunks. Files without a patch (binary or
    /// oversized diffs) have none.
    pub fn hunks(&self) -> Result<Vec<Hunk>, PrError> {
        match self.patch.as_deref() {
            Some(patch) => parse_hunks(patch),
            None => Ok(Vec::new()),
        }
    }
}

/// Parse the per-file patch text GitHub returns for a changed file.
///
/// Unlike a full `git diff`, the text has no `diff --git` or `---`/`+++`
/// headers: it starts directly at the first `@@` line. Lines before the
/// first hunk header are rejected.
pub fn parse_hunks(patch: &str) -> Result<Vec<Hunk>, PrError> {
    let mut hunks = Vec::new();
    let mut current: Option<Hunk> = None;

    for line in patch.lines() {
        if line.starts_with("@@") {
            if let Some(hunk) = current.take() {
                hunks.push(hunk);
            }
            let (old_start, old_count, new_start, new_count) = parse_hunk_header(line)?;
            current = Some(Hunk {
                old_start,
                old_count,
                new_start,
                new_count,
                lines: Vec::new(),
            });
            continue;
        }

        match current.as_mut() {
            Some(hunk) => {
                if line.starts_with('+') || line.starts_with('-') || line.starts_with(' ') {
                    hunk.lines.push(line.to_string());
                } else if line.is_empty() {
                    hunk.lines.push(" ".to_string());
                }
                // "\ No newline at end of file" is dropped
            }
            None if line.trim().is_empty() => {}
            None => {
                return Err(PrError::PatchParse(format!(
                    "content before first hunk header: {line}"
                )))
            }
        }
    }

    if let Some(hunk) = current {
        hunks.push(hunk);
    }
    Ok(hunks)
}

fn parse_hunk_header(line: &str) -> Result<(usize, usize, usize, usize), PrError> {
    let header = line
        .trim()
        .strip_prefix("@@")
        .ok_or_else(|| PrError::PatchParse("Invalid hunk header".to_string()))?;
    // Anything after the closing @@ is section context, e.g. a function name.
    let header = header.split("@@").next().unwrap_or_default().trim();
    let mut parts = header.split_whitespace();
    let old_part = parts
        .next()
        .ok_or_else(|| PrError::PatchParse("Missing old range".to_string()))?;
    let new_part = parts
        .next()
        .ok_or_else(|| PrError::PatchParse("Missing new range".to_string()))?;

    let (old_start, old_count) = parse_range(old_part, '-')?;
    let (new_start, new_count) = parse_range(new_part, '+')?;

    Ok((old_start, old_count, new_start, new_count))
}

fn parse_range(part: &str, prefix: char) -> Result<(usize, usize), PrError> {
    let range = part
        .strip_prefix(prefix)
        .ok_or_else(|| PrError::PatchParse("Invalid range prefix".to_string()))?;
    let (start_str, count_str) = match range.split_once(',') {
        Some((start, count)) => (start, count),
        None => (range, "1"),
    };
    let start = start_str
        .parse::<usize>()
        .map_err(|_| PrError::PatchParse(format!("Invalid range start in {}", part)))?;
    let count = count_str
        .parse::<usize>()
        .map_err(|_| PrError::PatchParse(format!("Invalid range count in {}", part)))?;
    Ok((start, count))
}
