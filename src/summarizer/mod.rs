mod cache;
mod client;
mod filter;
mod prompt;
mod response;

use std::time::Duration;

use log::{debug, info, warn};

pub use cache::SummaryKey;
pub use prompt::RunSearch;

use cache::SummaryCache;
use client::ChatClient;
use filter::filter_log;
use prompt::build_prompt;
use response::parse_response;

use crate::config::ChatConfig;
use crate::error::Result;
use crate::report::SummaryOutcome;

/// Turns console logs into failure summaries, remembering successful ones.
pub struct Summarizer {
    chat: ChatClient,
    cache: SummaryCache,
}

impl Summarizer {
    pub fn new(config: &ChatConfig, capacity: usize, ttl: Duration) -> Result<Self> {
        Ok(Self {
            chat: ChatClient::new(config)?,
            cache: SummaryCache::new(capacity, ttl),
        })
    }

    /// Summarises `log`, or returns the cached summary for `key`.
    ///
    /// Never fails: request errors come back as [`SummaryOutcome::Failed`]
    /// and are not cached, so the next request retries.
    pub async fn summarize(&self, key: SummaryKey, log: &str) -> SummaryOutcome {
        if let Some(summary) = self.cache.get(&key) {
            debug!("Summary cache hit for {key:?}");
            return SummaryOutcome::Summary(summary);
        }

        let excerpt = filter_log(log);
        debug!(
            "Filtered log for node {} of build {}: {} of {} lines",
            key.node_id,
            key.build_number,
            excerpt.lines().count(),
            log.lines().count()
        );

        match self.chat.send(build_prompt(&excerpt), key.run_search).await {
            Ok(body) => {
                let summary = parse_response(&body);
                info!(
                    "Summarised node {} of build {} (run_search={})",
                    key.node_id, key.build_number, key.run_search
                );
                self.cache.insert(key, summary.clone());
                SummaryOutcome::Summary(summary)
            }
            Err(err) => {
                warn!(
                    "Summarisation failed for node {} of build {}: {err}",
                    key.node_id, key.build_number
                );
                SummaryOutcome::Failed {
                    error: err.to_string(),
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::SummaryResult;
    use mockito::Matcher;

    fn summarizer(server: &mockito::Server) -> Summarizer {
        let config = ChatConfig {
            url: Some(format!("{}/api/chat/send-message", server.url())),
            ..ChatConfig::default()
        };
        Summarizer::new(&config, 10, Duration::from_secs(60)).unwrap()
    }

    #[tokio::test]
    async fn repeated_request_is_served_from_cache() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/api/chat/send-message")
            .with_status(200)
            .with_body(r#"{"summary":"assertion in test_login"}"#)
            .expect(1)
            .create_async()
            .await;

        let summarizer = summarizer(&server);
        let key = SummaryKey::new("12", "5", RunSearch::Auto);

        let first = summarizer.summarize(key.clone(), "AssertionError").await;
        let second = summarizer.summarize(key, "AssertionError").await;

        mock.assert_async().await;
        assert_eq!(
            first,
            SummaryOutcome::Summary(SummaryResult::text("assertion in test_login"))
        );
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn sends_filtered_excerpt_in_prompt() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/api/chat/send-message")
            .match_body(Matcher::Regex(
                r"Log:\\nline 2\\nline 3\\nTest FAILED".to_string(),
            ))
            .with_status(200)
            .with_body("plain answer")
            .create_async()
            .await;

        let log = "line 0\nline 1\nline 2\nline 3\nTest FAILED";
        let outcome = summarizer(&server)
            .summarize(SummaryKey::new("12", "5", RunSearch::Never), log)
            .await;

        mock.assert_async().await;
        assert_eq!(outcome.summary().map(|s| s.summary.as_str()), Some("plain answer"));
    }

    #[tokio::test]
    async fn failures_are_reported_and_not_cached() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/api/chat/send-message")
            .with_status(500)
            .with_body("overloaded")
            .expect(2)
            .create_async()
            .await;

        let summarizer = summarizer(&server);
        let key = SummaryKey::new("12", "5", RunSearch::Auto);

        let first = summarizer.summarize(key.clone(), "error").await;
        let second = summarizer.summarize(key, "error").await;

        mock.assert_async().await;
        match first {
            SummaryOutcome::Failed { error } => assert!(error.contains("500")),
            other => panic!("expected failure, got {other:?}"),
        }
        assert!(second.summary().is_none());
    }
}
