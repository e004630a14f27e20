//! Local chat-completions stub for exercising `LlmClient` over real HTTP.
//!
//! Each behaviour lives under its own path prefix, so a `Provider` pointing
//! at `http://<addr>/<prefix>` gets that behaviour:
//! `ok`, `hang`, `flaky` (two 429s, then ok), `down` (always 500),
//! `bad` (400 with an error body), `blank` (200 with blank content).

use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
    routing::post,
    Json, Router,
};
use serde_json::{json, Value};

use crate::llm_client::Provider;

pub const OK_REPLY: &str = r#"{"consequence": "The backup provider answered.", "reputation_change": 3, "stress_change": -2, "next_scenario": "Day two.", "next_options": ["A", "B"]}"#;

#[derive(Default)]
pub struct Hits {
    pub ok: AtomicUsize,
    pub hang: AtomicUsize,
    pub flaky: AtomicUsize,
    pub down: AtomicUsize,
    pub bad: AtomicUsize,
    pub blank: AtomicUsize,
    /// Authorization header and JSON body of the last `ok` request.
    pub last_ok_request: Mutex<Option<(String, Value)>>,
}

/// Current value of a hit counter.
pub fn hits(counter: &AtomicUsize) -> usize {
    counter.load(Ordering::SeqCst)
}

pub struct StubServer {
    pub addr: SocketAddr,
    pub hits: Arc<Hits>,
}

impl StubServer {
    pub async fn spawn() -> Self {
        let hits = Arc::new(Hits::default());
        let app = Router::new()
            .route("/ok/chat/completions", post(ok))
            .route("/hang/chat/completions", post(hang))
            .route("/flaky/chat/completions", post(flaky))
            .route("/down/chat/completions", post(down))
            .route("/bad/chat/completions", post(bad))
            .route("/blank/chat/completions", post(blank))
            .with_state(hits.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self { addr, hits }
    }

    pub fn provider(&self, prefix: &str) -> Provider {
        Provider {
            name: prefix.to_string(),
            base_url: format!("http://{}/{prefix}", self.addr),
            api_key: format!("key-{prefix}"),
            model: format!("model-{prefix}"),
        }
    }
}

fn completion(content: &str) -> Json<Value> {
    Json(json!({
        "choices": [{"message": {"role": "assistant", "content": content}}],
        "usage": {"prompt_tokens": 12, "completion_tokens": 7}
    }))
}

async fn ok(State(hits): State<Arc<Hits>>, headers: HeaderMap, Json(body): Json<Value>) -> Json<Value> {
    hits.ok.fetch_add(1, Ordering::SeqCst);
    let auth = headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string();
    *hits.last_ok_request.lock().unwrap() = Some((auth, body));
    completion(OK_REPLY)
}

async fn hang(State(hits): State<Arc<Hits>>) -> StatusCode {
    hits.hang.fetch_add(1, Ordering::SeqCst);
    std::future::pending::<()>().await;
    StatusCode::OK
}

async fn flaky(State(hits): State<Arc<Hits>>) -> axum::response::Response {
    let seen = hits.flaky.fetch_add(1, Ordering::SeqCst) + 1;
    if seen < 3 {
        (StatusCode::TOO_MANY_REQUESTS, "slow down").into_response()
    } else {
        completion(OK_REPLY).into_response()
    }
}

async fn down(State(hits): State<Arc<Hits>>) -> (StatusCode, &'static str) {
    hits.down.fetch_add(1, Ordering::SeqCst);
    (StatusCode::INTERNAL_SERVER_ERROR, "upstream exploded")
}

async fn bad(State(hits): State<Arc<Hits>>) -> (StatusCode, Json<Value>) {
    hits.bad.fetch_add(1, Ordering::SeqCst);
    (
        StatusCode::BAD_REQUEST,
        Json(json!({"error": {"message": "Unknown model", "type": "invalid_request_error"}})),
    )
}

async fn blank(State(hits): State<Arc<Hits>>) -> Json<Value> {
    hits.blank.fetch_add(1, Ordering::SeqCst);
    completion("  ")
}
