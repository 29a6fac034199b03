//! In-process stand-in for the form API.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Form, Json, Router};
use formcart::{SourceId, StorefrontConfig};
use serde_json::{json, Value};

pub const API_KEY: &str = "test-key";

pub struct MockFormApi {
    reads: HashMap<(String, String), (StatusCode, Value)>,
    submit_response: (StatusCode, String),
    submit_delay: Option<Duration>,
    submissions: Mutex<Vec<Vec<(String, String)>>>,
    read_log: Mutex<Vec<String>>,
}

impl MockFormApi {
    pub fn new() -> Self {
        Self {
            reads: HashMap::new(),
            submit_response: (StatusCode::OK, json!({"responseCode": 200, "content": {"submissionID": "5912"}}).to_string()),
            submit_delay: None,
            submissions: Mutex::new(Vec::new()),
            read_log: Mutex::new(Vec::new()),
        }
    }

    pub fn read(mut self, form: &str, endpoint: &str, status: StatusCode, body: Value) -> Self {
        self.reads.insert((form.to_string(), endpoint.to_string()), (status, body));
        self
    }

    pub fn products(self, form: &str, products: Value) -> Self {
        self.read(form, "payment-info", StatusCode::OK, json!({"responseCode": 200, "content": {"products": products}}))
    }

    pub fn submit_with(mut self, status: StatusCode, body: impl Into<String>) -> Self {
        self.submit_response = (status, body.into());
        self
    }

    pub fn submit_delay(mut self, delay: Duration) -> Self {
        self.submit_delay = Some(delay);
        self
    }

    pub fn submissions(&self) -> Vec<Vec<(String, String)>> { self.submissions.lock().unwrap().clone() }
    pub fn reads_made(&self) -> Vec<String> { self.read_log.lock().unwrap().clone() }

    /// Serves on an ephemeral port and returns the base url.
    pub async fn spawn(self) -> (Arc<Self>, String) {
        let mock = Arc::new(self);
        let app = Router::new().route("/form/:id/:endpoint", get(read).post(submit)).with_state(Arc::clone(&mock));
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        (mock, format!("http://{addr}"))
    }
}

async fn read(
    State(mock): State<Arc<MockFormApi>>,
    Path((id, endpoint)): Path<(String, String)>,
    Query(query): Query<HashMap<String, String>>,
) -> (StatusCode, Json<Value>) {
    mock.read_log.lock().unwrap().push(format!("{id}/{endpoint}"));
    if query.get("apiKey").map(String::as_str) != Some(API_KEY) {
        return (StatusCode::UNAUTHORIZED, Json(json!({"responseCode": 401, "message": "bad key"})));
    }
    match mock.reads.get(&(id, endpoint)) {
        Some((status, body)) => (*status, Json(body.clone())),
        None => (StatusCode::NOT_FOUND, Json(json!({"responseCode": 404, "message": "not found"}))),
    }
}

async fn submit(
    State(mock): State<Arc<MockFormApi>>,
    Path((_id, endpoint)): Path<(String, String)>,
    Form(fields): Form<Vec<(String, String)>>,
) -> Response {
    if endpoint != "submissions" {
        return StatusCode::NOT_FOUND.into_response();
    }
    if let Some(delay) = mock.submit_delay {
        tokio::time::sleep(delay).await;
    }
    mock.submissions.lock().unwrap().push(fields);
    let (status, body) = &mock.submit_response;
    (*status, body.clone()).into_response()
}

pub fn config(base_url: &str, forms: &[&str]) -> StorefrontConfig {
    let mut config = StorefrontConfig::new(base_url, API_KEY);
    config.sources = forms.iter().map(|f| SourceId::new(*f).unwrap()).collect();
    config.http_timeout = Duration::from_secs(5);
    config
}

/// Base url of a port nothing listens on.
pub async fn dead_base_url() -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{addr}")
}

pub fn field<'a>(fields: &'a [(String, String)], key: &str) -> Option<&'a str> {
    fields.iter().find(|(k, _)| k == key).map(|(_, v)| v.as_str())
}
