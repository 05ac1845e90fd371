//! HTTP server.
//!
//! Provides endpoints for:
//! - Job polling (`/api/jobs`)
//! - Greeting demo jobs (`/api/hello`)
//! - ChromaDB jobs (`/api/chromadb`)
//! - Health check (`/health`)
//! - Prometheus metrics (`/metrics`)

use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::state::AppState;

mod handlers;
pub mod responses;

/// Create the HTTP router.
pub fn create_router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        // Job routes
        .route("/api/jobs", get(handlers::list_jobs))
        .route("/api/jobs/filter", get(handlers::filter_jobs))
        .route("/api/jobs/cleanup", post(handlers::cleanup_jobs))
        .route("/api/jobs/:id", get(handlers::get_job))
        // Greeting routes
        .route("/api/hello/start", get(handlers::start_hello))
        .route("/api/hello/compose/start", post(handlers::start_compose))
        .route("/api/hello/race/start", post(handlers::start_race))
        .route("/api/hello/all/start", post(handlers::start_all))
        .route("/api/hello/timeout/start", post(handlers::start_timeout))
        .route("/api/hello/fallback/start", post(handlers::start_fallback))
        // ChromaDB routes
        .route(
            "/api/chromadb/collections",
            get(handlers::list_collections).post(handlers::create_collection),
        )
        .route(
            "/api/chromadb/collections/with-documents",
            post(handlers::create_with_documents),
        )
        .route(
            "/api/chromadb/collections/:name",
            get(handlers::get_collection).delete(handlers::delete_collection),
        )
        .route(
            "/api/chromadb/collections/:name/documents",
            post(handlers::add_documents).delete(handlers::delete_documents),
        )
        .route(
            "/api/chromadb/collections/:name/documents/single",
            post(handlers::add_document),
        )
        .route("/api/chromadb/collections/:name/query", post(handlers::query))
        .route(
            "/api/chromadb/collections/:name/query/advanced",
            post(handlers::advanced_query),
        )
        // Observability routes
        .route("/health", get(handlers::health_check))
        .route("/metrics", get(handlers::metrics_handler))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::{Duration, Instant};

    use axum::body::{to_bytes, Body};
    use axum::http::{header, Method, Request, StatusCode};
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use crate::config::Config;
    use crate::testing::spawn_chroma_stub;

    fn config(chroma_url: &str) -> Config {
        Config {
            chroma_url: chroma_url.to_string(),
            chroma_timeout: Duration::from_secs(2),
            hello_delay: Duration::from_millis(60),
            cpu_workers: 2,
            ..Config::default()
        }
    }

    fn app(chroma_url: &str) -> Router {
        create_router(AppState::new(config(chroma_url)).unwrap())
    }

    async fn send(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let mut request = Request::builder().method(method).uri(uri);
        let body = match body {
            Some(json) => {
                request = request.header(header::CONTENT_TYPE, "application/json");
                Body::from(json.to_string())
            }
            None => Body::empty(),
        };

        let response = app.clone().oneshot(request.body(body).unwrap()).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, value)
    }

    async fn poll_job(app: &Router, id: &str) -> Value {
        let deadline = Instant::now() + Duration::from_secs(5);
        loop {
            let (status, job) = send(app, Method::GET, &format!("/api/jobs/{id}"), None).await;
            assert_eq!(status, StatusCode::OK);
            if job["status"] == "SUCCEEDED" || job["status"] == "FAILED" {
                return job;
            }
            assert!(Instant::now() < deadline, "job {id} did not finish");
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    }

    #[tokio::test]
    async fn test_health_check() {
        let app = app("http://127.0.0.1:1");
        let (status, body) = send(&app, Method::GET, "/health", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({"status": "ok"}));
    }

    #[tokio::test]
    async fn test_metrics_endpoint() {
        let app = app("http://127.0.0.1:1");
        let response = app
            .oneshot(Request::builder().uri("/metrics").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers()[header::CONTENT_TYPE],
            "text/plain; version=0.0.4"
        );
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let text = String::from_utf8(bytes.to_vec()).unwrap();
        assert!(text.contains("jobtrack_jobs_total 0"));
    }

    #[tokio::test]
    async fn test_hello_job_accepted_then_polled() {
        let app = app("http://127.0.0.1:1");

        let (status, accepted) = send(&app, Method::GET, "/api/hello/start?name=zac", None).await;
        assert_eq!(status, StatusCode::ACCEPTED);
        let id = accepted["jobId"].as_str().unwrap().to_string();
        assert_eq!(accepted["checkUrl"], format!("/api/jobs/{id}"));
        assert_eq!(accepted["status"], "RUNNING");

        let job = poll_job(&app, &id).await;
        assert_eq!(job["status"], "SUCCEEDED");
        assert_eq!(job["result"], "Hello, Zac!");
        assert_eq!(job["name"], "hello:zac");
        assert!(job["error"].is_null());
    }

    #[tokio::test]
    async fn test_combinator_jobs() {
        let app = app("http://127.0.0.1:1");

        let (_, compose) = send(&app, Method::POST, "/api/hello/compose/start?name=ana", None).await;
        let (_, race) = send(&app, Method::POST, "/api/hello/race/start", None).await;
        let (_, all) = send(&app, Method::POST, "/api/hello/all/start", None).await;
        let (_, fallback) = send(&app, Method::POST, "/api/hello/fallback/start", None).await;
        let (_, timeout) = send(
            &app,
            Method::POST,
            "/api/hello/timeout/start?name=ana&timeout_ms=5",
            None,
        )
        .await;

        let result = |job: Value| job["result"].clone();
        let id = |v: &Value| v["jobId"].as_str().unwrap().to_string();

        assert_eq!(result(poll_job(&app, &id(&compose)).await), "hello ana (composed)");
        assert_eq!(result(poll_job(&app, &id(&race)).await), "Fast hello");
        assert_eq!(
            result(poll_job(&app, &id(&all)).await),
            json!(["Hello, World!", "Hola, World!", "Bonjour, World!"])
        );
        assert_eq!(
            result(poll_job(&app, &id(&fallback)).await),
            "Hello, World! (fallback: greeting service unavailable)"
        );

        let timed_out = poll_job(&app, &id(&timeout)).await;
        assert_eq!(timed_out["status"], "FAILED");
        assert_eq!(timed_out["error"], "Timed out after 5ms");
    }

    #[tokio::test]
    async fn test_timeout_rejects_zero() {
        let app = app("http://127.0.0.1:1");
        let (status, body) =
            send(&app, Method::POST, "/api/hello/timeout/start?timeout_ms=0", None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].as_str().unwrap().contains("timeout_ms"));
    }

    #[tokio::test]
    async fn test_unknown_job_is_404() {
        let app = app("http://127.0.0.1:1");
        let (status, body) = send(&app, Method::GET, "/api/jobs/does-not-exist", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"], "Job not found: does-not-exist");
    }

    #[tokio::test]
    async fn test_list_filter_and_cleanup() {
        let app = app("http://127.0.0.1:1");
        let mut ids = Vec::new();
        for name in ["a", "b", "c"] {
            let (_, accepted) =
                send(&app, Method::GET, &format!("/api/hello/start?name={name}"), None).await;
            ids.push(accepted["jobId"].as_str().unwrap().to_string());
        }
        let (_, race) = send(&app, Method::POST, "/api/hello/race/start", None).await;
        ids.push(race["jobId"].as_str().unwrap().to_string());
        for id in &ids {
            poll_job(&app, id).await;
        }

        let (status, jobs) = send(&app, Method::GET, "/api/jobs", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(jobs.as_array().unwrap().len(), 4);
        assert_eq!(jobs[0]["name"], "race");

        let (_, jobs) = send(&app, Method::GET, "/api/jobs?limit=2", None).await;
        assert_eq!(jobs.as_array().unwrap().len(), 2);

        let (_, jobs) = send(&app, Method::GET, "/api/jobs/filter?prefix=hello:&limit=0", None).await;
        let names: Vec<&str> = jobs
            .as_array()
            .unwrap()
            .iter()
            .map(|j| j["name"].as_str().unwrap())
            .collect();
        assert_eq!(names, vec!["hello:c", "hello:b", "hello:a"]);

        let (_, body) = send(&app, Method::POST, "/api/jobs/cleanup", None).await;
        assert_eq!(body["removed"], 0);

        tokio::time::sleep(Duration::from_millis(20)).await;
        let (status, body) =
            send(&app, Method::POST, "/api/jobs/cleanup?max_age_secs=0", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["removed"], 4);

        let (_, jobs) = send(&app, Method::GET, "/api/jobs", None).await;
        assert!(jobs.as_array().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_chroma_routes() {
        let stub = spawn_chroma_stub().await;
        let app = app(&stub.url);

        let (status, accepted) = send(
            &app,
            Method::POST,
            "/api/chromadb/collections/with-documents",
            Some(json!({
                "name": "kb",
                "docIds": ["d1", "d2"],
                "documents": ["alpha", "beta"]
            })),
        )
        .await;
        assert_eq!(status, StatusCode::ACCEPTED);
        let job = poll_job(&app, accepted["jobId"].as_str().unwrap()).await;
        assert_eq!(job["status"], "SUCCEEDED");
        assert_eq!(job["result"]["documentsAdded"], 2);

        let (status, collections) = send(&app, Method::GET, "/api/chromadb/collections", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(collections[0]["name"], "kb");

        let (status, collection) =
            send(&app, Method::GET, "/api/chromadb/collections/kb", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(collection["id"], "id-kb");

        let (status, _) = send(&app, Method::GET, "/api/chromadb/collections/nope", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (_, accepted) = send(
            &app,
            Method::POST,
            "/api/chromadb/collections/kb/query",
            Some(json!({"queryText": "alpha"})),
        )
        .await;
        let job = poll_job(&app, accepted["jobId"].as_str().unwrap()).await;
        assert_eq!(job["name"], "chromadb:query:kb");
        assert_eq!(job["result"]["ids"], json!([["d1", "d2"]]));

        let (_, accepted) = send(
            &app,
            Method::DELETE,
            "/api/chromadb/collections/kb/documents",
            Some(json!({"ids": ["d1"]})),
        )
        .await;
        let job = poll_job(&app, accepted["jobId"].as_str().unwrap()).await;
        assert_eq!(job["result"], json!({"success": true, "count": 1}));
        assert_eq!(stub.documents("kb"), vec![json!("d2")]);
    }

    #[tokio::test]
    async fn test_invalid_chroma_request_fails_job() {
        let stub = spawn_chroma_stub().await;
        let app = app(&stub.url);

        let (status, accepted) = send(
            &app,
            Method::POST,
            "/api/chromadb/collections/kb/documents",
            Some(json!({"ids": ["a", "b"], "documents": ["one"]})),
        )
        .await;
        assert_eq!(status, StatusCode::ACCEPTED);
        assert_eq!(accepted["status"], "FAILED");

        let job = poll_job(&app, accepted["jobId"].as_str().unwrap()).await;
        assert_eq!(job["error"], "got 2 ids but 1 documents");
        assert!(job["startedAt"].is_null());
    }

    #[tokio::test]
    async fn test_chroma_unreachable_is_bad_gateway() {
        let app = app("http://127.0.0.1:1");
        let (status, body) = send(&app, Method::GET, "/api/chromadb/collections", None).await;
        assert_eq!(status, StatusCode::BAD_GATEWAY);
        assert!(body["error"].as_str().unwrap().contains("ChromaDB"));
    }
}
