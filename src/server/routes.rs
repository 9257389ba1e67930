use axum::body::Bytes;
use axum::extract::{Path, State};
use axum::response::{IntoResponse, Response};
use axum::Json;
use log::{debug, warn};
use serde::Deserialize;
use serde_json::json;

use super::error::{bad_request, map_log_error, map_status_error};
use super::AppState;
use crate::summarizer::RunSearch;

/// Optional body of the log route. An empty body means all defaults.
#[derive(Debug, Default, Deserialize)]
pub(crate) struct LogRequest {
    #[serde(default)]
    run_search: RunSearch,
}

impl LogRequest {
    fn from_body(body: &[u8]) -> Result<Self, serde_json::Error> {
        if body.iter().all(u8::is_ascii_whitespace) {
            return Ok(Self::default());
        }
        serde_json::from_slice(body)
    }
}

pub(crate) async fn health() -> Response {
    Json(json!({"status": "ok"})).into_response()
}

pub(crate) async fn pipeline_status(State(state): State<AppState>) -> Response {
    match state.digest.status().await {
        Ok(status) => Json(status).into_response(),
        Err(err) => {
            warn!("Pipeline status unavailable: {err}");
            map_status_error(&err).into_response()
        }
    }
}

pub(crate) async fn stage_log(
    State(state): State<AppState>,
    Path((build_number, node_id)): Path<(String, String)>,
    body: Bytes,
) -> Response {
    let request = match LogRequest::from_body(&body) {
        Ok(request) => request,
        Err(err) => return bad_request(format!("Invalid request body: {err}")).into_response(),
    };
    debug!(
        "Log requested for node {node_id} of build {build_number} (run_search={})",
        request.run_search
    );

    match state
        .digest
        .stage_log(&build_number, &node_id, request.run_search)
        .await
    {
        Ok(log) => Json(log).into_response(),
        Err(err) => {
            warn!("Log lookup failed for node {node_id} of build {build_number}: {err}");
            map_log_error(&err).into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ChatConfig, Config, JenkinsConfig};
    use crate::digest::PipelineDigest;
    use crate::server::router;
    use axum::body::{to_bytes, Body};
    use axum::http::{Request, StatusCode};
    use axum::Router;
    use mockito::Matcher;
    use serde_json::Value;
    use tower::ServiceExt;

    const DESCRIBE: &str = "/job/promotion/12/execution/node/5/wfapi/describe";
    const NODE_LOG: &str = "/job/promotion/12/execution/node/5/log";
    const CHAT: &str = "/api/chat/send-message";

    fn app(server: &mockito::Server) -> Router {
        let config = Config {
            jenkins: JenkinsConfig {
                url: Some(server.url()),
                job_path: "/job/promotion".to_string(),
                ..JenkinsConfig::default()
            },
            chat: ChatConfig {
                url: Some(format!("{}{CHAT}", server.url())),
                ..ChatConfig::default()
            },
            ..Config::default()
        };
        let digest = PipelineDigest::from_config(&config).expect("digest");
        router(AppState::new(digest))
    }

    async fn send(app: Router, request: Request<Body>) -> (StatusCode, Value) {
        let response = app.oneshot(request).await.expect("response");
        let status = response.status();
        let body = to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("read response body");
        (status, serde_json::from_slice(&body).expect("json body"))
    }

    fn get(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).expect("request")
    }

    fn post(uri: &str, body: &'static str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body))
            .expect("request")
    }

    #[tokio::test]
    async fn health_reports_ok() {
        let server = mockito::Server::new_async().await;
        let (status, body) = send(app(&server), get("/health")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({"status": "ok"}));
    }

    mod pipeline_status {
        use super::*;

        #[tokio::test]
        async fn returns_latest_completed_run() {
            let mut server = mockito::Server::new_async().await;
            server
                .mock("GET", "/job/promotion/wfapi/runs")
                .with_status(200)
                .with_body(r#"[{"status":"IN_PROGRESS","id":"13"},{"status":"SUCCESS","id":"12"}]"#)
                .create_async()
                .await;
            server
                .mock("GET", "/job/promotion/12/wfapi/describe")
                .with_status(200)
                .with_body(r#"{"name":"promotion","status":"SUCCESS","startTimeMillis":1,"endTimeMillis":2,"stages":[{"id":"5"}]}"#)
                .create_async()
                .await;

            let (status, body) = send(app(&server), get("/pipeline/status")).await;

            assert_eq!(status, StatusCode::OK);
            assert_eq!(body["build_number"], "12");
            assert_eq!(body["pipeline_name"], "promotion");
            assert_eq!(body["startTimeMillis"], 1);
            assert_eq!(body["stages"], json!([{"id": "5"}]));
        }

        #[tokio::test]
        async fn empty_run_list_is_not_found() {
            let mut server = mockito::Server::new_async().await;
            server
                .mock("GET", "/job/promotion/wfapi/runs")
                .with_status(200)
                .with_body("[]")
                .create_async()
                .await;

            let (status, body) = send(app(&server), get("/pipeline/status")).await;

            assert_eq!(status, StatusCode::NOT_FOUND);
            assert_eq!(body, json!({"error": "No runs found for this pipeline."}));
        }

        #[tokio::test]
        async fn upstream_failure_is_bad_gateway() {
            let mut server = mockito::Server::new_async().await;
            server
                .mock("GET", "/job/promotion/wfapi/runs")
                .with_status(500)
                .create_async()
                .await;

            let (status, body) = send(app(&server), get("/pipeline/status")).await;

            assert_eq!(status, StatusCode::BAD_GATEWAY);
            assert!(body["error"].as_str().unwrap().contains("500"));
        }
    }

    mod stage_log {
        use super::*;

        async fn describe(server: &mut mockito::Server, body: &str) {
            server
                .mock("GET", DESCRIBE)
                .with_status(200)
                .with_body(body)
                .create_async()
                .await;
        }

        #[tokio::test]
        async fn returns_log_with_summary() {
            let mut server = mockito::Server::new_async().await;
            describe(&mut server, r#"{"stageFlowNodes":[]}"#).await;
            server
                .mock("GET", NODE_LOG)
                .with_status(200)
                .with_body("test_login FAILED")
                .create_async()
                .await;
            let chat = server
                .mock("POST", CHAT)
                .match_body(Matcher::PartialJson(json!({
                    "retrieval_options": {"run_search": "always"}
                })))
                .with_status(200)
                .with_body(r#"{"summary":"login broke"}"#)
                .create_async()
                .await;

            let (status, body) = send(
                app(&server),
                post("/pipeline/log/12/5", r#"{"run_search":"always"}"#),
            )
            .await;

            chat.assert_async().await;
            assert_eq!(status, StatusCode::OK);
            assert_eq!(
                body,
                json!({"log": "test_login FAILED", "summary": {"summary": "login broke"}})
            );
        }

        #[tokio::test]
        async fn empty_body_defaults_to_auto() {
            let mut server = mockito::Server::new_async().await;
            describe(&mut server, r#"{"stageFlowNodes":[]}"#).await;
            server
                .mock("GET", NODE_LOG)
                .with_status(200)
                .with_body("ERROR x")
                .create_async()
                .await;
            let chat = server
                .mock("POST", CHAT)
                .match_body(Matcher::PartialJson(json!({
                    "retrieval_options": {"run_search": "auto"}
                })))
                .with_status(200)
                .with_body("done")
                .create_async()
                .await;

            let (status, _) = send(app(&server), post("/pipeline/log/12/5", "")).await;

            chat.assert_async().await;
            assert_eq!(status, StatusCode::OK);
        }

        #[tokio::test]
        async fn rejects_unknown_run_search() {
            let server = mockito::Server::new_async().await;

            let (status, body) = send(
                app(&server),
                post("/pipeline/log/12/5", r#"{"run_search":"sometimes"}"#),
            )
            .await;

            assert_eq!(status, StatusCode::BAD_REQUEST);
            assert!(body["error"]
                .as_str()
                .unwrap()
                .starts_with("Invalid request body"));
        }

        #[tokio::test]
        async fn returns_console_link_when_log_is_missing() {
            let mut server = mockito::Server::new_async().await;
            describe(
                &mut server,
                r#"{"_links":{"console":{"href":"/job/promotion/12/console"}}}"#,
            )
            .await;
            server
                .mock("GET", NODE_LOG)
                .with_status(404)
                .create_async()
                .await;

            let (status, body) = send(app(&server), post("/pipeline/log/12/5", "")).await;

            assert_eq!(status, StatusCode::OK);
            assert_eq!(
                body,
                json!({"downstream_console_url": format!("{}/job/promotion/12/console", server.url())})
            );
        }

        #[tokio::test]
        async fn missing_log_with_search_hint_is_not_found() {
            let mut server = mockito::Server::new_async().await;
            describe(&mut server, r#"{"displayName":"Deploy"}"#).await;
            server
                .mock("GET", NODE_LOG)
                .with_status(404)
                .create_async()
                .await;

            let (status, body) = send(app(&server), post("/pipeline/log/12/5", "")).await;

            assert_eq!(status, StatusCode::NOT_FOUND);
            assert_eq!(
                body["error"],
                "Log not found for this node, but you can search Jenkins for: Deploy"
            );
            assert_eq!(
                body["jenkins_search_url"],
                format!("{}/search/?q=Deploy", server.url())
            );
        }
    }
}
