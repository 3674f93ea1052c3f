use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::{
    body::{to_bytes, Body},
    http::{Request, StatusCode},
    Router,
};
use innerspell_ai::{
    AIServiceError, AIServiceResult, GenerationOutput, GenerationRequest, ModelGateway,
};
use innerspell_recommender::{OutputMode, PolicyConfig, APOLOGY_MESSAGE, CONFIGURATION_MESSAGE};
use pretty_assertions::assert_eq;
use serde_json::{json, Value};
use tempfile::TempDir;
use tower::ServiceExt;

use crate::api::{create_router, AppState};
use crate::config::Config;
use crate::error::AppError;

/// Replies with queued structured outputs, or fails when the queue is empty
struct StubGateway {
    configured: bool,
    replies: Mutex<VecDeque<Value>>,
}

impl StubGateway {
    fn with_replies(replies: Vec<Value>) -> Arc<Self> {
        Arc::new(Self {
            configured: true,
            replies: Mutex::new(replies.into()),
        })
    }

    fn unconfigured() -> Arc<Self> {
        Arc::new(Self {
            configured: false,
            replies: Mutex::new(VecDeque::new()),
        })
    }
}

#[async_trait]
impl ModelGateway for StubGateway {
    fn ensure_configured(&self) -> AIServiceResult<()> {
        if self.configured {
            Ok(())
        } else {
            Err(AIServiceError::NoApiKey)
        }
    }

    async fn generate(&self, _request: GenerationRequest) -> AIServiceResult<GenerationOutput> {
        let reply = self.replies.lock().unwrap().pop_front();
        match reply {
            Some(value) => Ok(GenerationOutput {
                structured: Some(value),
                ..Default::default()
            }),
            None => Err(AIServiceError::ApiError("API returned 500: boom".to_string())),
        }
    }
}

fn test_config() -> Config {
    Config {
        port: 4001,
        cors_origin: "http://localhost:3000".to_string(),
        policy: PolicyConfig::full(),
        output_mode: OutputMode::Structured,
        prompts_dir: None,
        catalog_path: None,
    }
}

fn app(gateway: Arc<StubGateway>) -> Router {
    let state = AppState::new(&test_config(), gateway).unwrap();
    create_router(state)
}

async fn send(app: Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let value = if body.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&body)
            .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&body).into_owned()))
    };
    (status, value)
}

fn get(uri: &str) -> Request<Body> {
    Request::builder()
        .method("GET")
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

fn post_json(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

#[tokio::test]
async fn test_chat_first_turn_returns_concern_options() {
    let gateway = StubGateway::with_replies(vec![json!({"response": "안녕하세요! 어떤 고민이 있으신가요?"})]);

    let (status, body) = send(app(gateway), post_json("/api/chat", json!({"messages": []}))).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["response"], "안녕하세요! 어떤 고민이 있으신가요?");
    assert_eq!(body["options"].as_array().unwrap().len(), 6);
    assert!(body.get("recommendations").is_none());
}

#[tokio::test]
async fn test_chat_provider_failure_is_still_200() {
    let gateway = StubGateway::with_replies(vec![]);

    let (status, body) = send(
        app(gateway),
        post_json("/api/chat", json!({"messages": [{"role": "user", "content": "안녕하세요"}]})),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"response": APOLOGY_MESSAGE}));
}

#[tokio::test]
async fn test_chat_without_credentials_reports_configuration() {
    let (status, body) = send(
        app(StubGateway::unconfigured()),
        post_json("/api/chat", json!({"messages": []})),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["response"], CONFIGURATION_MESSAGE);
}

#[tokio::test]
async fn test_chat_rejects_unknown_role() {
    let gateway = StubGateway::with_replies(vec![]);

    let (status, _) = send(
        app(gateway),
        post_json("/api/chat", json!({"messages": [{"role": "system", "content": "hi"}]})),
    )
    .await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn test_chat_rejects_oversized_history() {
    let gateway = StubGateway::with_replies(vec![]);
    let messages: Vec<Value> = (0..101)
        .map(|i| json!({"role": if i % 2 == 0 { "user" } else { "assistant" }, "content": "안녕"}))
        .collect();

    let (status, body) = send(app(gateway), post_json("/api/chat", json!({"messages": messages}))).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
    assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
    assert!(body["request_id"].as_str().is_some());
}

#[tokio::test]
async fn test_list_consultants_first_page() {
    let (status, body) = send(app(StubGateway::with_replies(vec![])), get("/api/consultants")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["data"].as_array().unwrap().len(), 24);
    assert!(body["data"]["data"][0]["reviewCount"].is_number());
    assert_eq!(
        body["data"]["pagination"],
        json!({
            "page": 1,
            "pageSize": 24,
            "totalItems": 32,
            "totalPages": 2,
            "hasNextPage": true,
            "hasPreviousPage": false
        })
    );

    let (_, body) = send(app(StubGateway::with_replies(vec![])), get("/api/consultants?page=2")).await;
    assert_eq!(body["data"]["data"].as_array().unwrap().len(), 8);
    assert_eq!(body["data"]["pagination"]["hasNextPage"], false);
}

#[tokio::test]
async fn test_list_consultants_by_specialty() {
    let (status, body) = send(
        app(StubGateway::with_replies(vec![])),
        get("/api/consultants?specialty=%ED%83%80%EB%A1%9C"),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    let data = body["data"]["data"].as_array().unwrap();
    assert_eq!(data.len(), 7);
    assert!(data.iter().all(|c| c["specialty"] == "타로"));
    assert_eq!(body["data"]["pagination"]["totalPages"], 1);

    // "전체" is the browser's everything button
    let (_, body) = send(
        app(StubGateway::with_replies(vec![])),
        get("/api/consultants?specialty=%EC%A0%84%EC%B2%B4"),
    )
    .await;
    assert_eq!(body["data"]["pagination"]["totalItems"], 32);
}

#[tokio::test]
async fn test_list_consultants_by_status() {
    let (status, body) = send(
        app(StubGateway::with_replies(vec![])),
        get("/api/consultants?status=busy"),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    let data = body["data"]["data"].as_array().unwrap();
    assert!(!data.is_empty());
    assert!(data.iter().all(|c| c["status"] == "busy"));

    let (status, _) = send(
        app(StubGateway::with_replies(vec![])),
        get("/api/consultants?status=asleep"),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_list_specialties() {
    let (status, body) = send(app(StubGateway::with_replies(vec![])), get("/api/specialties")).await;

    assert_eq!(status, StatusCode::OK);
    let specialties = body["data"].as_array().unwrap();
    assert_eq!(specialties.len(), 14);
    assert!(specialties.contains(&json!("타로")));
    assert!(specialties.contains(&json!("사주")));
}

#[tokio::test]
async fn test_get_consultant_by_id() {
    let (status, body) = send(app(StubGateway::with_replies(vec![])), get("/api/consultants/1")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["name"], "세라피나");

    let (status, body) = send(app(StubGateway::with_replies(vec![])), get("/api/consultants/999")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"]["code"], "NOT_FOUND");
}

#[tokio::test]
async fn test_daily_spell_generated_and_fallback() {
    let gateway = StubGateway::with_replies(vec![json!({"title": "용기의 불꽃", "description": "작은 용기가 큰 변화를 만듭니다."})]);
    let (status, body) = send(app(gateway), get("/api/daily-spell")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["title"], "용기의 불꽃");

    let (status, body) = send(app(StubGateway::unconfigured()), get("/api/daily-spell")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["title"], "지혜의 샘물");
}

#[tokio::test]
async fn test_health_route() {
    let (status, body) = send(app(StubGateway::unconfigured()), get("/api/health")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["service"], "innerspell");
    assert_eq!(body["version"], env!("CARGO_PKG_VERSION"));
    assert!(body["timestamp"].as_u64().is_some_and(|t| t > 1_577_836_800));
}

#[tokio::test]
async fn test_status_reports_model_configuration() {
    let (_, body) = send(app(StubGateway::unconfigured()), get("/api/status")).await;
    assert_eq!(body["status"], "degraded");
    assert_eq!(body["model_configured"], false);
    assert_eq!(body["consultants"], 32);
    assert_eq!(body["slots"], json!(["concern", "style", "price_tier", "free_text"]));
    assert_eq!(body["output_mode"], "structured");
}

#[tokio::test]
async fn test_status_follows_policy_and_output_mode() {
    let config = Config {
        policy: PolicyConfig::minimal(),
        output_mode: OutputMode::Text,
        ..test_config()
    };
    let state = AppState::new(&config, StubGateway::with_replies(vec![])).unwrap();

    let (_, body) = send(create_router(state), get("/api/status")).await;
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["model_configured"], true);
    assert_eq!(body["slots"], json!(["concern", "style"]));
    assert_eq!(body["output_mode"], "text");
}

#[test]
fn test_catalog_override_is_loaded_and_validated() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("consultants.json");
    std::fs::write(&path, "[]").unwrap();

    let config = Config {
        catalog_path: Some(path),
        ..test_config()
    };
    let result = AppState::new(&config, StubGateway::with_replies(vec![]));
    assert!(matches!(result, Err(AppError::Configuration(_))));
}

#[test]
fn test_unreadable_catalog_is_an_internal_error() {
    let dir = TempDir::new().unwrap();
    let config = Config {
        catalog_path: Some(dir.path().join("missing.json")),
        ..test_config()
    };

    match AppState::new(&config, StubGateway::with_replies(vec![])) {
        Err(err @ AppError::Internal(_)) => {
            assert!(err.to_string().contains("Failed to read consultant catalog"));
        }
        _ => panic!("expected an internal error"),
    }
}

#[test]
fn test_missing_prompts_dir_is_a_configuration_error() {
    let config = Config {
        prompts_dir: Some("/definitely/not/here".into()),
        ..test_config()
    };
    assert!(AppState::new(&config, StubGateway::with_replies(vec![])).is_err());
}
