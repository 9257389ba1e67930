//! Console scraping heuristics.
//!
//! Jenkins does not expose the build triggered by a `build` step in its
//! workflow API, so the downstream job is recovered from console markup.
//! Everything here is brittle and vendor-version-dependent: the patterns
//! match what current Jenkins releases print, not a documented contract.

use std::borrow::Cow;
use std::sync::LazyLock;

use regex::Regex;

/// Separator Jenkins prints between folder and job names in full display names.
const BREADCRUMB_SEPARATOR: char = '\u{bb}';

/// Where a downstream build was found in a console.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DownstreamLink {
    /// Absolute path of the build, e.g. `/job/deploy/12/`
    Path(String),
    /// Job name segments plus build number, from `Starting building: a » b #12`
    Named {
        segments: Vec<String>,
        build_number: String,
    },
}

/// Locates downstream builds and extracts log text from console pages.
#[derive(Debug, Default, Clone, Copy)]
pub struct ConsoleScraper;

impl ConsoleScraper {
    /// Finds the first downstream build referenced by a console page.
    ///
    /// The build anchor Jenkins renders next to "Starting building" wins;
    /// the plain-text line is the fallback for consoles without markup.
    pub fn find_downstream(&self, console: &str) -> Option<DownstreamLink> {
        static ANCHOR_RE: LazyLock<Regex> = LazyLock::new(|| {
            Regex::new(r#"<a href=['"](/job/[^'"]+/\d+/)['"][ >]"#).expect("invalid anchor regex")
        });
        static STARTING_RE: LazyLock<Regex> = LazyLock::new(|| {
            Regex::new(r"Starting building: ([^#\n]+)#(\d+)").expect("invalid starting regex")
        });

        if let Some(captures) = ANCHOR_RE.captures(console) {
            return Some(DownstreamLink::Path(captures[1].to_string()));
        }

        let text = strip_markup(console);
        let captures = STARTING_RE.captures(&text)?;
        let segments = split_job_path(&captures[1]);
        if segments.is_empty() {
            return None;
        }
        Some(DownstreamLink::Named {
            segments,
            build_number: captures[2].to_string(),
        })
    }

    /// Content of the first `<pre>` block, entity-decoded.
    pub fn extract_pre(&self, html: &str) -> Option<String> {
        static PRE_RE: LazyLock<Regex> = LazyLock::new(|| {
            Regex::new(r"(?s)<pre[^>]*>(.*?)</pre>").expect("invalid pre regex")
        });

        let captures = PRE_RE.captures(html)?;
        Some(html_escape::decode_html_entities(&captures[1]).into_owned())
    }

    /// Whether a body served by `consoleText` is really an HTML page
    /// (login redirect, error page).
    pub fn looks_like_html(&self, body: &str) -> bool {
        let head: String = body.trim_start().chars().take(15).collect();
        let head = head.to_ascii_lowercase();
        head.starts_with("<!doctype html") || head.starts_with("<html")
    }
}

fn strip_markup(console: &str) -> Cow<'_, str> {
    static TAG_RE: LazyLock<Regex> =
        LazyLock::new(|| Regex::new(r"<[^>]+>").expect("invalid tag regex"));

    if !console.contains('<') && !console.contains('&') {
        return Cow::Borrowed(console);
    }
    let stripped = TAG_RE.replace_all(console, "");
    Cow::Owned(html_escape::decode_html_entities(&stripped).into_owned())
}

/// Splits `Team » Nightly » tests` into job names.
///
/// Consoles decoded with the wrong charset show the separator as `Â»`; the
/// stray `Â` is dropped.
// TODO: confirm how Jenkins renders the separator for job names that themselves contain non-ASCII text
fn split_job_path(path: &str) -> Vec<String> {
    path.split(BREADCRUMB_SEPARATOR)
        .map(|segment| segment.trim().trim_end_matches('\u{c2}').trim())
        .filter(|segment| !segment.is_empty())
        .map(ToString::to_string)
        .collect()
}
