//! JobPlanner HTTP API
//!
//! Exposes the planning workflows over REST.
//!
//! # Endpoints
//!
//! - GET / - Demo page with forms for the POST endpoints
//! - GET /health - Liveness check
//! - POST /plan - Plan and answer a request
//! - POST /save-job - Parse and store a job posting
//! - POST /plan-with-job - Store a job posting, then plan around it
//!
//! Every response carries `X-Request-Id` (echoed from the request or freshly
//! generated) and `X-Elapsed-ms`.

use axum::{
    extract::{Request, State},
    http::{HeaderName, HeaderValue, StatusCode},
    middleware::{self, Next},
    response::{Html, IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use jobplanner_engine::conductor::RunFailure;
use jobplanner_engine::config::Config;
use jobplanner_engine::service::JobPlanner;
use sdk::{
    EngineError, EngineErrorExt, ErrorResponse, HealthResponse, PlanRequest, PlanResponse,
    PlanWithJobRequest, PlanWithJobResponse, SaveJobRequest, SaveJobResponse,
};
use std::sync::Arc;
use std::time::Instant;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{info, info_span, warn, Instrument};
use uuid::Uuid;

const REQUEST_ID: &str = "x-request-id";
const ELAPSED_MS: &str = "x-elapsed-ms";

/// Shared across handlers
#[derive(Clone)]
pub struct AppState {
    planner: Arc<JobPlanner>,
}

/// An engine error on its way out as an HTTP response
#[derive(Debug)]
pub struct ApiError(EngineError);

impl ApiError {
    fn status(&self) -> StatusCode {
        match &self.0 {
            EngineError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            EngineError::SchemaValidation(_)
            | EngineError::LLMProvider(_)
            | EngineError::WebSearch(_) => StatusCode::BAD_GATEWAY,
            EngineError::LLMTimeout => StatusCode::GATEWAY_TIMEOUT,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<EngineError> for ApiError {
    fn from(err: EngineError) -> Self {
        Self(err)
    }
}

impl From<RunFailure> for ApiError {
    fn from(failure: RunFailure) -> Self {
        warn!(
            phase = %failure.phase,
            steps_completed = failure.intermediate_results.len(),
            "Run failed"
        );
        Self(failure.source)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = ErrorResponse {
            error: self.0.to_string(),
            hint: self.0.user_hint().to_string(),
        };
        (status, Json(body)).into_response()
    }
}

/// Build the router over an already-wired planner
pub fn router(planner: Arc<JobPlanner>) -> Router {
    let state = AppState { planner };

    Router::new()
        .route("/", get(index_handler))
        .route("/health", get(health_handler))
        .route("/plan", post(plan_handler))
        .route("/save-job", post(save_job_handler))
        .route("/plan-with-job", post(plan_with_job_handler))
        .layer(middleware::from_fn(request_context))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Bind the configured host and port and serve until Ctrl-C
pub async fn serve(config: &Config) -> anyhow::Result<()> {
    let planner = Arc::new(JobPlanner::from_config(config)?);
    let app = router(planner);

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("API server listening on http://{}", listener.local_addr()?);

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            tokio::signal::ctrl_c().await.ok();
            info!("API server shutting down gracefully");
        })
        .await?;
    Ok(())
}

/// Tag each request with an id, time it and log the outcome
async fn request_context(req: Request, next: Next) -> Response {
    let request_id = req
        .headers()
        .get(REQUEST_ID)
        .and_then(|v| v.to_str().ok())
        .map(str::to_owned)
        .unwrap_or_else(|| Uuid::new_v4().to_string());

    let span = info_span!(
        "request",
        request_id = %request_id,
        method = %req.method(),
        path = %req.uri().path(),
    );

    let start = Instant::now();
    let mut response = next.run(req).instrument(span.clone()).await;
    let elapsed_ms = start.elapsed().as_millis() as u64;

    span.in_scope(|| {
        info!(
            status_code = response.status().as_u16(),
            elapsed_ms, "request complete"
        );
    });

    let headers = response.headers_mut();
    headers.insert(HeaderName::from_static(ELAPSED_MS), HeaderValue::from(elapsed_ms));
    if let Ok(value) = HeaderValue::from_str(&request_id) {
        headers.insert(HeaderName::from_static(REQUEST_ID), value);
    }
    response
}

async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse { ok: true })
}

async fn plan_handler(
    State(state): State<AppState>,
    Json(req): Json<PlanRequest>,
) -> Result<Json<PlanResponse>, ApiError> {
    if req.user_input.trim().is_empty() {
        return Err(EngineError::InvalidRequest("user_input must not be empty".to_string()).into());
    }

    let run = state.planner.plan(&req.user_input).await?;
    Ok(Json(PlanResponse {
        final_output: Some(run.final_output),
        intermediate_messages: run.intermediate_results,
    }))
}

async fn save_job_handler(
    State(state): State<AppState>,
    Json(req): Json<SaveJobRequest>,
) -> Result<Json<SaveJobResponse>, ApiError> {
    let (filename, job_data) = state.planner.save_job(&req.job_description).await?;
    Ok(Json(SaveJobResponse {
        success: true,
        filename,
        job_data,
    }))
}

async fn plan_with_job_handler(
    State(state): State<AppState>,
    Json(req): Json<PlanWithJobRequest>,
) -> Result<Json<PlanWithJobResponse>, ApiError> {
    let planned = state
        .planner
        .plan_with_job(&req.job_description, req.user_input.as_deref())
        .await?;

    Ok(Json(PlanWithJobResponse {
        success: true,
        filename: planned.filename,
        job_data: planned.job,
        final_output: Some(planned.run.final_output),
        intermediate_messages: planned.run.intermediate_results,
    }))
}

async fn index_handler() -> Html<&'static str> {
    Html(INDEX_HTML)
}

const INDEX_HTML: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>JobPlanner</title>
    <style>
        body {
            font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', Roboto, Oxygen, Ubuntu, Cantarell, sans-serif;
            max-width: 800px;
            margin: 50px auto;
            padding: 20px;
            background: #f5f5f5;
        }
        .container {
            background: white;
            padding: 30px;
            border-radius: 8px;
            box-shadow: 0 2px 4px rgba(0,0,0,0.1);
            margin-bottom: 20px;
        }
        h1, h2 {
            color: #333;
            margin-top: 0;
        }
        textarea {
            width: 100%;
            min-height: 80px;
            font-family: inherit;
            box-sizing: border-box;
        }
        button {
            margin-top: 10px;
            padding: 8px 16px;
            background: #007bff;
            color: white;
            border: none;
            border-radius: 4px;
            cursor: pointer;
        }
        pre {
            background: #f8f9fa;
            border-left: 4px solid #007bff;
            padding: 15px;
            white-space: pre-wrap;
        }
    </style>
</head>
<body>
    <div class="container">
        <h1>JobPlanner</h1>
        <p>Plans a request into web search and job lookup steps, runs them, and writes up the answer.</p>
    </div>

    <div class="container">
        <h2>Plan</h2>
        <textarea id="plan-input">Create a 7-day learning plan for a Data Scientist</textarea>
        <button onclick="send('/plan', {user_input: val('plan-input')})">Plan</button>
    </div>

    <div class="container">
        <h2>Save job</h2>
        <textarea id="job-text" placeholder="Paste a job posting"></textarea>
        <button onclick="send('/save-job', {job_description: val('job-text')})">Save</button>
    </div>

    <div class="container">
        <h2>Plan with job</h2>
        <textarea id="pwj-text" placeholder="Paste a job posting"></textarea>
        <textarea id="pwj-input" placeholder="What should the plan cover? (optional)"></textarea>
        <button onclick="send('/plan-with-job', {job_description: val('pwj-text'), user_input: val('pwj-input') || null})">Save and plan</button>
    </div>

    <div class="container">
        <h2>Result</h2>
        <pre id="result">Nothing yet.</pre>
    </div>

    <script>
        function val(id) { return document.getElementById(id).value; }
        async function send(path, body) {
            const out = document.getElementById('result');
            out.textContent = 'Working...';
            try {
                const res = await fetch(path, {
                    method: 'POST',
                    headers: {'Content-Type': 'application/json'},
                    body: JSON.stringify(body)
                });
                const data = await res.json();
                out.textContent = data.final_output
                    ? data.final_output + '\n\n' + JSON.stringify(data, null, 2)
                    : JSON.stringify(data, null, 2);
            } catch (e) {
                out.textContent = 'Request failed: ' + e;
            }
        }
    </script>
</body>
</html>"#;

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use axum::body::Body;
    use axum::http::Request;
    use jobplanner_engine::jobs::{JobExtractor, JobStore};
    use jobplanner_engine::llm::{self, LLMError, LLMProvider, Message, OutputSchema};
    use jobplanner_engine::tools::WebSearchProvider;
    use serde_json::{json, Value};
    use tempfile::TempDir;
    use tower::ServiceExt;

    /// Plans `steps`, answers every free-text prompt with `reply`
    struct ScriptedProvider {
        steps: Vec<&'static str>,
        reply: &'static str,
    }

    #[async_trait]
    impl LLMProvider for ScriptedProvider {
        fn name(&self) -> &str {
            "scripted"
        }

        fn is_local(&self) -> bool {
            true
        }

        async fn generate(&self, _messages: &[Message]) -> llm::Result<String> {
            Ok(self.reply.to_string())
        }

        async fn generate_structured(
            &self,
            _messages: &[Message],
            _schema: &OutputSchema,
        ) -> llm::Result<Value> {
            Ok(json!({ "steps": self.steps }))
        }
    }

    struct DownProvider;

    #[async_trait]
    impl LLMProvider for DownProvider {
        fn name(&self) -> &str {
            "down"
        }

        fn is_local(&self) -> bool {
            false
        }

        async fn generate(&self, _messages: &[Message]) -> llm::Result<String> {
            Err(LLMError::ProviderUnavailable("connection refused".to_string()))
        }

        async fn generate_structured(
            &self,
            _messages: &[Message],
            _schema: &OutputSchema,
        ) -> llm::Result<Value> {
            Err(LLMError::ProviderUnavailable("connection refused".to_string()))
        }
    }

    struct StaticSearch;

    #[async_trait]
    impl WebSearchProvider for StaticSearch {
        fn name(&self) -> &str {
            "static"
        }

        async fn search(&self, query: &str) -> Result<String, EngineError> {
            Ok(format!("Web results for '{}':\n1. Result", query))
        }
    }

    const POSTING: &str = "Data Scientist at Acme Analytics\n\
Location: Remote\n\
Requirements:\n\
- Python\n\
- SQL\n";

    fn app(llm: Arc<dyn LLMProvider>) -> (Router, TempDir) {
        let dir = TempDir::new().unwrap();
        let jobs = Arc::new(JobStore::new(dir.path()).unwrap());
        let planner = JobPlanner::new(llm, Arc::new(StaticSearch), jobs, JobExtractor::Heuristic);
        (router(Arc::new(planner)), dir)
    }

    fn scripted() -> Arc<dyn LLMProvider> {
        Arc::new(ScriptedProvider {
            steps: vec![r#"web_search_tool("data science courses")"#, "list_all_jobs()"],
            reply: "Day 1: statistics",
        })
    }

    fn post(path: &str, body: Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(path)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    async fn body_json(response: Response) -> Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_health() {
        let (app, _dir) = app(scripted());
        let response = app
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.headers().contains_key("x-request-id"));
        assert!(response.headers().contains_key("x-elapsed-ms"));
        assert_eq!(body_json(response).await, json!({ "ok": true }));
    }

    #[tokio::test]
    async fn test_request_id_is_echoed() {
        let (app, _dir) = app(scripted());
        let response = app
            .oneshot(
                Request::builder()
                    .uri("/health")
                    .header("x-request-id", "abc-123")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.headers()["x-request-id"], "abc-123");
    }

    #[tokio::test]
    async fn test_index_serves_html() {
        let (app, _dir) = app(scripted());
        let response = app
            .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        assert!(String::from_utf8_lossy(&bytes).contains("/plan-with-job"));
    }

    #[tokio::test]
    async fn test_plan_runs_every_step() {
        let (app, _dir) = app(scripted());
        let response = app
            .oneshot(post(
                "/plan",
                json!({ "user_input": "Create a 7-day learning plan for a Data Scientist" }),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["final_output"], "Day 1: statistics");

        let messages = body["intermediate_messages"].as_array().unwrap();
        assert_eq!(messages.len(), 2);
        assert!(messages[0]
            .as_str()
            .unwrap()
            .starts_with("Web results for 'data science courses'"));
        assert_eq!(messages[1], "No jobs found in directory");
    }

    #[tokio::test]
    async fn test_plan_rejects_empty_input() {
        let (app, _dir) = app(scripted());
        let response = app
            .oneshot(post("/plan", json!({ "user_input": "  " })))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = body_json(response).await;
        assert!(body["error"].as_str().unwrap().contains("user_input"));
    }

    #[tokio::test]
    async fn test_plan_provider_failure_is_bad_gateway() {
        let (app, _dir) = app(Arc::new(DownProvider));
        let response = app
            .oneshot(post("/plan", json!({ "user_input": "Find Rust roles" })))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
        let body = body_json(response).await;
        assert!(body["error"].as_str().unwrap().contains("connection refused"));
        assert!(!body["hint"].as_str().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_save_job_writes_file() {
        let (app, dir) = app(scripted());
        let response = app
            .oneshot(post("/save-job", json!({ "job_description": POSTING })))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["success"], true);
        assert_eq!(body["job_data"]["title"], "Data Scientist");

        let filename = body["filename"].as_str().unwrap();
        assert!(dir.path().join(format!("{}.json", filename)).exists());
    }

    #[tokio::test]
    async fn test_save_job_rejects_empty_posting() {
        let (app, _dir) = app(scripted());
        let response = app
            .oneshot(post("/save-job", json!({ "job_description": "" })))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_plan_with_job() {
        let (app, _dir) = app(Arc::new(ScriptedProvider {
            steps: vec!["list_all_jobs()"],
            reply: "Prepare SQL",
        }));
        let response = app
            .oneshot(post("/plan-with-job", json!({ "job_description": POSTING })))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["success"], true);
        assert_eq!(body["final_output"], "Prepare SQL");

        // The job was saved before planning, so the listing sees it
        let messages = body["intermediate_messages"].as_array().unwrap();
        assert_eq!(messages.len(), 1);
        assert!(messages[0].as_str().unwrap().contains("Data Scientist"));
    }

    #[test]
    fn test_error_status_mapping() {
        let cases = [
            (EngineError::InvalidRequest("x".into()), StatusCode::BAD_REQUEST),
            (EngineError::SchemaValidation("x".into()), StatusCode::BAD_GATEWAY),
            (EngineError::WebSearch("x".into()), StatusCode::BAD_GATEWAY),
            (EngineError::LLMTimeout, StatusCode::GATEWAY_TIMEOUT),
            (EngineError::JobStore("x".into()), StatusCode::INTERNAL_SERVER_ERROR),
        ];
        for (err, status) in cases {
            assert_eq!(ApiError::from(err).status(), status);
        }
    }
}
