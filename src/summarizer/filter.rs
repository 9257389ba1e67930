use std::collections::BTreeSet;
use std::sync::LazyLock;

use regex::Regex;

/// Only the end of a log is sent to the model.
pub const MAX_LOG_LINES: usize = 500;

/// Lines kept on each side of a matching line.
const CONTEXT_LINES: usize = 2;

/// Sent instead of an empty excerpt.
pub const EMPTY_EXCERPT_PLACEHOLDER: &str =
    "No failed test or error lines found in this log excerpt.";

static FAILURE_KEYWORDS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)fail|error|assert|exception|not equal|expected|at assertion")
        .expect("invalid failure keyword regex")
});

/// Reduces a console log to the lines worth summarising.
///
/// Takes the last [`MAX_LOG_LINES`] lines and keeps every line that mentions a
/// failure keyword together with two lines of context either side, in
/// original order. With no keyword hits the whole tail is kept.
pub fn filter_log(log: &str) -> String {
    let lines = split_lines(log);
    let tail = &lines[lines.len().saturating_sub(MAX_LOG_LINES)..];

    let mut keep = BTreeSet::new();
    for (idx, line) in tail.iter().enumerate() {
        if FAILURE_KEYWORDS.is_match(line) {
            let start = idx.saturating_sub(CONTEXT_LINES);
            let end = (idx + CONTEXT_LINES).min(tail.len() - 1);
            keep.extend(start..=end);
        }
    }

    let excerpt = if keep.is_empty() {
        tail.join("\n")
    } else {
        keep.into_iter()
            .map(|idx| tail[idx])
            .collect::<Vec<_>>()
            .join("\n")
    };

    if excerpt.trim().is_empty() {
        EMPTY_EXCERPT_PLACEHOLDER.to_string()
    } else {
        excerpt
    }
}

/// Splits on `\n`, `\r\n` and bare `\r`. Progress output rewrites its line
/// with carriage returns.
fn split_lines(log: &str) -> Vec<&str> {
    log.lines()
        .flat_map(|line| line.strip_suffix('\r').unwrap_or(line).split('\r'))
        .collect()
}
