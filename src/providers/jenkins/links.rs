use url::Url;

use crate::error::{CIDigestError, Result};

/// Joins URL parts with exactly one slash between them, skipping empty parts.
///
/// Mirrors how Jenkins paths are concatenated with the configured base URL
/// and job path (e.g., `"https://ci/"`, `"/job/a/"`, `"7/log"` →
/// `"https://ci/job/a/7/log"`).
pub fn join_url(parts: &[&str]) -> String {
    parts
        .iter()
        .map(|part| part.trim_matches('/'))
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join("/")
}

/// Resolves an href taken from a Jenkins document against the base URL.
///
/// Jenkins emits absolute paths (`/job/...`) that already include any
/// context path, so standard reference resolution is used rather than
/// string concatenation.
pub fn resolve_href(base: &Url, href: &str) -> Result<String> {
    base.join(href)
        .map(String::from)
        .map_err(|e| CIDigestError::InvalidUrl(format!("{href}: {e}")))
}

/// Jenkins search page for a node's display name.
pub fn search_url(base: &Url, query: &str) -> Result<String> {
    let mut url = base
        .join("search/")
        .map_err(|e| CIDigestError::InvalidUrl(format!("search: {e}")))?;
    url.query_pairs_mut().append_pair("q", query);
    Ok(url.into())
}

/// Builds `{base}/job/{a}/job/{b}/{build}` from folder/job name segments,
/// percent-encoding each segment.
pub fn downstream_job_url(base: &Url, segments: &[&str], build_number: &str) -> Result<String> {
    let mut url = base.clone();
    {
        let mut path = url
            .path_segments_mut()
            .map_err(|()| CIDigestError::InvalidUrl(format!("{base} cannot be a base")))?;
        path.pop_if_empty();
        for segment in segments {
            path.push("job").push(segment);
        }
        path.push(build_number);
    }
    Ok(url.into())
}
