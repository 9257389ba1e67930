use std::time::Duration;

use log::debug;
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use url::Url;

use super::links::join_url;
use crate::config::JenkinsConfig;
use crate::error::{CIDigestError, Result};

/// A fetched body together with the status it came with.
#[derive(Debug)]
pub struct Fetched {
    pub status: StatusCode,
    pub body: String,
}

impl Fetched {
    pub fn is_ok(&self) -> bool {
        self.status == StatusCode::OK
    }
}

/// Jenkins REST client bound to one pipeline job.
///
/// Every request carries basic auth and the configured timeout. Nothing is
/// retried.
pub struct JenkinsClient {
    client: Client,
    base_url: Url,
    job_path: String,
    user: Option<String>,
    token: Option<String>,
}

impl JenkinsClient {
    pub fn new(config: &JenkinsConfig, timeout: Duration) -> Result<Self> {
        let raw = config
            .url
            .as_deref()
            .ok_or_else(|| CIDigestError::Config("Jenkins URL is not set".into()))?;

        // A trailing slash keeps any context path when hrefs are joined.
        let base_url = Url::parse(&format!("{}/", raw.trim_end_matches('/')))
            .map_err(|e| CIDigestError::Config(format!("Invalid Jenkins URL: {e}")))?;

        let client = Client::builder()
            .user_agent(concat!("cidigest/", env!("CARGO_PKG_VERSION")))
            .timeout(timeout)
            .build()
            .map_err(|e| CIDigestError::Config(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url,
            job_path: config.job_path.clone(),
            user: config.user.clone(),
            token: config.token.clone(),
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// URL below the configured job, e.g. `job_url("12/wfapi/describe")`.
    pub fn job_url(&self, path: &str) -> String {
        join_url(&[self.base_url.as_str(), &self.job_path, path])
    }

    pub fn runs_url(&self) -> String {
        self.job_url("wfapi/runs")
    }

    pub fn run_describe_url(&self, build_number: &str) -> String {
        self.job_url(&format!("{build_number}/wfapi/describe"))
    }

    pub fn node_describe_url(&self, build_number: &str, node_id: &str) -> String {
        self.job_url(&format!(
            "{build_number}/execution/node/{node_id}/wfapi/describe"
        ))
    }

    pub fn node_log_url(&self, build_number: &str, node_id: &str) -> String {
        self.job_url(&format!("{build_number}/execution/node/{node_id}/log"))
    }

    fn auth_request(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.user {
            Some(user) => request.basic_auth(user, self.token.as_deref()),
            None => request,
        }
    }

    /// GET a body regardless of status. Only transport failures are errors.
    pub async fn fetch(&self, url: &str) -> Result<Fetched> {
        let response = self.auth_request(self.client.get(url)).send().await?;
        let status = response.status();
        debug!("GET {url} -> {status}");
        let body = response.text().await?;
        Ok(Fetched { status, body })
    }

    /// GET and decode JSON, treating any non-success status as an error.
    pub async fn get_json<T>(&self, url: &str) -> Result<T>
    where
        T: DeserializeOwned,
    {
        let fetched = self.fetch(url).await?;
        if !fetched.status.is_success() {
            return Err(CIDigestError::UnexpectedStatus {
                status: fetched.status.as_u16(),
                url: url.to_string(),
            });
        }
        Ok(serde_json::from_str(&fetched.body)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Value;

    fn test_config(url: &str) -> JenkinsConfig {
        JenkinsConfig {
            url: Some(url.to_string()),
            job_path: "/job/promotion".to_string(),
            user: Some("bot".to_string()),
            token: Some("secret".to_string()),
            timeout_secs: 10,
        }
    }

    #[test]
    fn test_endpoint_urls() {
        let client =
            JenkinsClient::new(&test_config("https://ci.example.com"), Duration::from_secs(10))
                .unwrap();
        assert_eq!(
            client.runs_url(),
            "https://ci.example.com/job/promotion/wfapi/runs"
        );
        assert_eq!(
            client.run_describe_url("42"),
            "https://ci.example.com/job/promotion/42/wfapi/describe"
        );
        assert_eq!(
            client.node_describe_url("42", "17"),
            "https://ci.example.com/job/promotion/42/execution/node/17/wfapi/describe"
        );
        assert_eq!(
            client.node_log_url("42", "17"),
            "https://ci.example.com/job/promotion/42/execution/node/17/log"
        );
    }

    #[test]
    fn test_rejects_missing_url() {
        let mut config = test_config("https://ci.example.com");
        config.url = None;
        assert!(JenkinsClient::new(&config, Duration::from_secs(1)).is_err());
    }

    #[tokio::test]
    async fn test_requests_use_basic_auth() {
        let mut server = mockito::Server::new_async().await;
        // base64("bot:secret")
        let mock = server
            .mock("GET", "/job/promotion/wfapi/runs")
            .match_header("authorization", "Basic Ym90OnNlY3JldA==")
            .with_status(200)
            .with_body("[]")
            .create_async()
            .await;

        let client = JenkinsClient::new(&test_config(&server.url()), Duration::from_secs(10))
            .unwrap();
        let runs: Vec<Value> = client.get_json(&client.runs_url()).await.unwrap();

        assert!(runs.is_empty());
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_get_json_reports_status() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/job/promotion/wfapi/runs")
            .with_status(503)
            .create_async()
            .await;

        let client = JenkinsClient::new(&test_config(&server.url()), Duration::from_secs(10))
            .unwrap();
        let err = client
            .get_json::<Value>(&client.runs_url())
            .await
            .unwrap_err();

        assert!(matches!(err, CIDigestError::UnexpectedStatus { status: 503, .. }));
    }

    #[tokio::test]
    async fn test_fetch_returns_non_success_bodies() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/missing")
            .with_status(404)
            .with_body("nope")
            .create_async()
            .await;

        let client = JenkinsClient::new(&test_config(&server.url()), Duration::from_secs(10))
            .unwrap();
        let fetched = client
            .fetch(&format!("{}/missing", server.url()))
            .await
            .unwrap();

        assert!(!fetched.is_ok());
        assert_eq!(fetched.status, StatusCode::NOT_FOUND);
        assert_eq!(fetched.body, "nope");
    }
}
