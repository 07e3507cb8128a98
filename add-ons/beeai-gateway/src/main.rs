//! Axum-based Bee AI gateway: serves `POST /api/chat` and `GET /api/health`. Config-driven via CoreConfig.

mod handlers;

use axum::{
    extract::{rejection::JsonRejection, Json, State},
    http::{header, Method, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use beeai_core::{ChatReply, ChatRequest, CoreConfig, ExampleStore, KnowledgeTable, QueryMatcher};
use beeai_skills::ModelRouter;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Pre-flight check: config loads, knowledge table loads, port is available.
fn run_verify() -> Result<(), String> {
    let config = CoreConfig::load().map_err(|e| format!("Config load failed: {}", e))?;

    print!("Checking knowledge table... ");
    let table = match &config.knowledge_path {
        Some(path) => KnowledgeTable::try_load_json_path(path).map_err(|e| format!("{} unusable: {}", path, e))?,
        None => KnowledgeTable::builtin(),
    };
    println!("OK ({} advisories)", table.advisory_count());

    let port = config.port;
    print!("Checking port {}... ", port);
    let addr = std::net::SocketAddr::from(([127, 0, 0, 1], port));
    match std::net::TcpListener::bind(addr) {
        Ok(listener) => {
            drop(listener);
            println!("OK (available)");
        }
        Err(e) => {
            return Err(format!("Port {} BLOCKED: {}", port, e));
        }
    }

    println!("\nAll checks passed. Ready to start gateway.");
    Ok(())
}

#[tokio::main]
async fn main() {
    // Load .env file if present (before any env::var calls)
    if let Err(e) = dotenvy::dotenv() {
        eprintln!("[beeai-gateway] .env not loaded: {} (using system environment)", e);
    }

    let args: Vec<String> = std::env::args().collect();
    if args.iter().any(|a| a == "--verify") {
        match run_verify() {
            Ok(()) => std::process::exit(0),
            Err(e) => {
                eprintln!("PRE-FLIGHT FAILED: {}", e);
                std::process::exit(1);
            }
        }
    }

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Arc::new(CoreConfig::load().expect("load CoreConfig"));

    let table = match &config.knowledge_path {
        Some(path) => KnowledgeTable::load_json_path(path),
        None => KnowledgeTable::builtin(),
    };
    let matcher = Arc::new(QueryMatcher::new(Arc::new(table)));
    let examples = Arc::new(ExampleStore::load_first(&config.training_data_paths));
    let model_router = Arc::new(ModelRouter::from_config(&config));

    if model_router.is_available() {
        tracing::info!(mode = model_router.mode().as_str(), model = %model_router.model(), "Model router ready");
    } else {
        tracing::warn!(mode = model_router.mode().as_str(), "Model router unavailable, all answers come from the advisory table");
    }

    let app = build_app(AppState {
        config: Arc::clone(&config),
        model_router,
        matcher,
        examples,
    });

    let addr = std::net::SocketAddr::from(([0, 0, 0, 0], config.port));
    tracing::info!("{} listening on {}", config.app_name, addr);
    axum::serve(
        tokio::net::TcpListener::bind(addr).await.expect("bind gateway port"),
        app,
    )
    .await
    .expect("serve gateway");
}

fn build_app(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE]);

    Router::new()
        .route("/api/health", get(health))
        .route("/api/chat", post(chat))
        .with_state(state)
        .layer(cors)
}

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) config: Arc<CoreConfig>,
    pub(crate) model_router: Arc<ModelRouter>,
    pub(crate) matcher: Arc<QueryMatcher>,
    pub(crate) examples: Arc<ExampleStore>,
}

/// GET /api/health – liveness and warm-up target.
async fn health(State(state): State<AppState>) -> axum::Json<serde_json::Value> {
    axum::Json(serde_json::json!({
        "status": "healthy",
        "app_name": state.config.app_name,
        "llm_mode": state.model_router.mode().as_str(),
        "model_loaded": state.model_router.is_available(),
        "env_present": state.model_router.has_api_key(),
        "knowledge_base_loaded": !state.examples.is_empty(),
        "knowledge_entries": state.examples.len(),
        "advisories": state.matcher.table().advisory_count(),
    }))
}

/// POST /api/chat – answers a question; falls back to the advisory table when the model cannot.
async fn chat(State(state): State<AppState>, payload: Result<Json<ChatRequest>, JsonRejection>) -> Response {
    let Json(req) = match payload {
        Ok(req) => req,
        Err(rejection) => {
            tracing::debug!(target: "beeai::chat", error = %rejection.body_text(), "Chat request rejected");
            return (
                rejection.status(),
                axum::Json(serde_json::json!({ "error": rejection.body_text() })),
            )
                .into_response();
        }
    };
    let question = req.question.trim();
    if question.is_empty() {
        return (
            StatusCode::BAD_REQUEST,
            axum::Json(serde_json::json!({ "error": "No question provided" })),
        )
            .into_response();
    }

    tracing::info!(target: "beeai::chat", chars = question.len(), "Chat request received");
    let answer =
        handlers::chat::answer_question(&state.model_router, &state.examples, &state.matcher, question).await;
    tracing::info!(target: "beeai::chat", source = answer.source.as_str(), "Chat response ready");

    axum::Json(ChatReply::success(question, answer)).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::Request;
    use beeai_skills::LlmMode;
    use tower::ServiceExt;

    fn test_config() -> CoreConfig {
        CoreConfig {
            app_name: "Test Hive".to_string(),
            port: 8001,
            llm_mode: "mock".to_string(),
            model_name: "gemini-1.5-flash".to_string(),
            api_base_url: "http://127.0.0.1:8001".to_string(),
            request_timeout_secs: 12,
            health_interval_secs: 300,
            knowledge_path: None,
            training_data_paths: vec![],
        }
    }

    fn test_app(mode: LlmMode) -> Router {
        build_app(AppState {
            config: Arc::new(test_config()),
            model_router: Arc::new(ModelRouter::with_mode(mode).with_api_key(None)),
            matcher: Arc::new(QueryMatcher::builtin()),
            examples: Arc::new(ExampleStore::builtin()),
        })
    }

    fn chat_request(body: serde_json::Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/api/chat")
            .header("content-type", "application/json")
            .body(Body::from(serde_json::to_string(&body).unwrap()))
            .unwrap()
    }

    async fn body_json(res: Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(res.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_health_reports_counts() {
        let req = Request::builder().uri("/api/health").body(Body::empty()).unwrap();
        let res = test_app(LlmMode::Mock).oneshot(req).await.unwrap();
        assert_eq!(res.status(), StatusCode::OK);
        let json = body_json(res).await;
        assert_eq!(json["status"], "healthy");
        assert_eq!(json["app_name"], "Test Hive");
        assert_eq!(json["model_loaded"], true);
        assert_eq!(json["env_present"], false);
        assert_eq!(json["knowledge_base_loaded"], true);
        assert_eq!(json["knowledge_entries"], 3);
        assert_eq!(json["advisories"], KnowledgeTable::builtin().advisory_count());
    }

    #[tokio::test]
    async fn test_blank_question_is_rejected() {
        for body in [serde_json::json!({ "question": "   " }), serde_json::json!({})] {
            let res = test_app(LlmMode::Mock).oneshot(chat_request(body)).await.unwrap();
            assert_eq!(res.status(), StatusCode::BAD_REQUEST);
            let json = body_json(res).await;
            assert_eq!(json["error"], "No question provided");
        }
    }

    #[tokio::test]
    async fn test_bad_bodies_get_json_errors() {
        let malformed = Request::builder()
            .method("POST")
            .uri("/api/chat")
            .header("content-type", "application/json")
            .body(Body::from("{not json"))
            .unwrap();
        let wrong_type = chat_request(serde_json::json!({ "question": 5 }));
        let no_content_type = Request::builder()
            .method("POST")
            .uri("/api/chat")
            .body(Body::from(r#"{"question":"clover"}"#))
            .unwrap();

        for (req, status) in [
            (malformed, StatusCode::BAD_REQUEST),
            (wrong_type, StatusCode::UNPROCESSABLE_ENTITY),
            (no_content_type, StatusCode::UNSUPPORTED_MEDIA_TYPE),
        ] {
            let res = test_app(LlmMode::Mock).oneshot(req).await.unwrap();
            assert_eq!(res.status(), status);
            assert_eq!(res.headers().get("content-type").unwrap(), "application/json");
            let json = body_json(res).await;
            assert!(!json["error"].as_str().unwrap().is_empty());
        }
    }

    #[tokio::test]
    async fn test_mock_model_answers_remotely() {
        let res = test_app(LlmMode::Mock)
            .oneshot(chat_request(serde_json::json!({ "question": "  When does heather bloom?  " })))
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::OK);
        let json = body_json(res).await;
        assert_eq!(json["status"], "success");
        assert_eq!(json["source"], "remote");
        assert_eq!(json["question"], "When does heather bloom?");
        assert!(json["answer"].as_str().unwrap().contains("When does heather bloom?"));
    }

    #[tokio::test]
    async fn test_unavailable_model_falls_back_to_table() {
        let res = test_app(LlmMode::Live)
            .oneshot(chat_request(serde_json::json!({ "question": "wild garlic in Germany" })))
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::OK);
        let json = body_json(res).await;
        assert_eq!(json["source"], "fallback");
        assert_eq!(
            json["answer"],
            KnowledgeTable::builtin().advisory("germany", "wild garlic").unwrap()
        );
    }

    #[tokio::test]
    async fn test_cors_preflight_allows_any_origin() {
        let req = Request::builder()
            .method("OPTIONS")
            .uri("/api/chat")
            .header("origin", "https://bloom.example.org")
            .header("access-control-request-method", "POST")
            .header("access-control-request-headers", "content-type")
            .body(Body::empty())
            .unwrap();
        let res = test_app(LlmMode::Mock).oneshot(req).await.unwrap();
        assert_eq!(res.status(), StatusCode::OK);
        assert_eq!(res.headers().get("access-control-allow-origin").unwrap(), "*");
    }
}
