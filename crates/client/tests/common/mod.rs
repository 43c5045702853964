//! In-process fake backend for client integration tests.
//!
//! Serves an `axum` router on an ephemeral localhost port. Every request is
//! recorded; responses are scripted per `"METHOD /path"` with sensible
//! defaults (uploads echo a descriptor, everything else echoes the body).

#![allow(dead_code)]

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use axum::body::Bytes;
use axum::extract::State;
use axum::http::{header, HeaderMap, Method, StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use axum::Router;
use serde_json::json;

use pdfmate_client::{ApiClient, ClientConfig, LocalFile};
use pdfmate_core::token::StaticToken;

pub const TEST_TOKEN: &str = "test-token";

/// Install a test tracing subscriber once per test binary.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// One request as seen by the fake backend.
#[derive(Debug, Clone)]
pub struct Recorded {
    pub method: Method,
    pub path: String,
    pub query: Option<String>,
    pub authorization: Option<String>,
    pub body: serde_json::Value,
    /// Upload file name, for multipart requests.
    pub filename: Option<String>,
}

#[derive(Default)]
pub struct BackendState {
    requests: Mutex<Vec<Recorded>>,
    scripted: Mutex<HashMap<String, (u16, String)>>,
    /// Upload file names containing this marker are rejected with a 500.
    failing_upload_marker: Mutex<Option<String>>,
    upload_counter: Mutex<u32>,
}

pub struct FakeBackend {
    pub url: String,
    state: Arc<BackendState>,
}

impl FakeBackend {
    pub async fn start() -> Self {
        init_tracing();
        let state = Arc::new(BackendState::default());
        let app = Router::new().fallback(handle).with_state(Arc::clone(&state));

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind ephemeral port");
        let addr = listener.local_addr().expect("local addr");
        tokio::spawn(async move {
            axum::serve(listener, app).await.expect("fake backend crashed");
        });

        Self {
            url: format!("http://{addr}"),
            state,
        }
    }

    /// Client authenticated with [`TEST_TOKEN`].
    pub fn client(&self) -> ApiClient {
        ApiClient::new(
            ClientConfig::new(self.url.clone()),
            Arc::new(StaticToken::new(TEST_TOKEN)),
        )
    }

    /// Script the response for `method path`.
    pub fn respond(&self, method: &str, path: &str, status: u16, body: &str) {
        self.state
            .scripted
            .lock()
            .unwrap()
            .insert(format!("{method} {path}"), (status, body.to_string()));
    }

    pub fn fail_uploads_named(&self, marker: &str) {
        *self.state.failing_upload_marker.lock().unwrap() = Some(marker.to_string());
    }

    pub fn requests(&self) -> Vec<Recorded> {
        self.state.requests.lock().unwrap().clone()
    }

    pub fn requests_to(&self, path: &str) -> Vec<Recorded> {
        self.requests()
            .into_iter()
            .filter(|r| r.path == path)
            .collect()
    }

    /// File names received by `/files/upload`, in arrival order.
    pub fn uploaded_names(&self) -> Vec<String> {
        self.requests_to("/files/upload")
            .into_iter()
            .filter_map(|r| r.filename)
            .collect()
    }
}

async fn handle(
    State(state): State<Arc<BackendState>>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let path = uri.path().to_string();
    let filename = multipart_filename(&body);
    let recorded = Recorded {
        method: method.clone(),
        path: path.clone(),
        query: uri.query().map(str::to_string),
        authorization: headers
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string),
        body: serde_json::from_slice(&body).unwrap_or(serde_json::Value::Null),
        filename: filename.clone(),
    };
    state.requests.lock().unwrap().push(recorded.clone());

    let key = format!("{method} {path}");
    if let Some((status, body)) = state.scripted.lock().unwrap().get(&key).cloned() {
        return json_response(status, body);
    }

    if path == "/files/upload" {
        let name = filename.unwrap_or_default();
        let failing = state.failing_upload_marker.lock().unwrap().clone();
        if failing.is_some_and(|marker| name.contains(&marker)) {
            return json_response(500, json!({"error": format!("cannot store {name}")}).to_string());
        }
        let id = {
            let mut counter = state.upload_counter.lock().unwrap();
            *counter += 1;
            format!("up-{counter}")
        };
        return json_response(
            201,
            json!({"file": {"id": id, "name": name, "type": "application/pdf"}}).to_string(),
        );
    }

    if method == Method::DELETE {
        return StatusCode::NO_CONTENT.into_response();
    }

    json_response(200, json!({"ok": true, "echo": recorded.body}).to_string())
}

fn json_response(status: u16, body: String) -> Response {
    let status = StatusCode::from_u16(status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    (status, [(header::CONTENT_TYPE, "application/json")], body).into_response()
}

/// Pull `filename="..."` out of a raw multipart body.
fn multipart_filename(body: &[u8]) -> Option<String> {
    let text = String::from_utf8_lossy(body);
    let start = text.find("filename=\"")? + "filename=\"".len();
    let end = text[start..].find('"')? + start;
    Some(text[start..end].to_string())
}

/// Write small placeholder files into `dir` and return upload handles.
pub fn local_files(dir: &Path, names: &[&str]) -> Vec<LocalFile> {
    names
        .iter()
        .map(|name| {
            let path: PathBuf = dir.join(name);
            std::fs::write(&path, b"%PDF-1.7 test").expect("write test file");
            LocalFile::from_path(path)
        })
        .collect()
}
