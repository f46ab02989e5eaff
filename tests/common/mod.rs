//! Shared fixtures for integration tests

#![allow(dead_code)]

use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use tower::ServiceExt;

use survey_collector::http_server::{HttpServer, HttpServerConfig};
use survey_collector::schema::{SubmissionValidator, SurveySubmission};
use survey_collector::store::{Database, SurveyStore};

/// One response entry; question kinds rotate so every answer shape appears.
pub fn response(question_id: u32) -> Value {
    let (answer, response_type) = match question_id % 5 {
        1 => (json!(format!("answer {}", question_id)), "text"),
        2 => (json!(question_id * 2), "number"),
        3 => (json!(question_id % 2 == 0), "boolean"),
        4 => (json!(["a", "b"]), "checkbox"),
        _ => (json!(7), "scale"),
    };
    json!({
        "questionId": question_id,
        "question": format!("Question {}", question_id),
        "answer": answer,
        "responseType": response_type,
    })
}

/// A submission payload carrying the given question ids
pub fn payload_with(patient: &str, study: &str, ids: impl IntoIterator<Item = u32>) -> Value {
    json!({
        "patientId": patient,
        "studyId": study,
        "responses": ids.into_iter().map(response).collect::<Vec<_>>(),
    })
}

/// A complete, valid 20-question payload
pub fn payload(patient: &str, study: &str) -> Value {
    payload_with(patient, study, 1..=20)
}

/// Same as [`payload`] with `metadata.completedAt` set
pub fn payload_completed_at(patient: &str, study: &str, completed_at: &str) -> Value {
    let mut value = payload(patient, study);
    value["metadata"] = json!({ "completedAt": completed_at, "deviceInfo": "tablet" });
    value
}

pub fn validated(payload: &Value) -> SurveySubmission {
    SubmissionValidator::new(20)
        .validate(payload)
        .expect("fixture payload must validate")
}

pub fn memory_store() -> SurveyStore {
    SurveyStore::new(Database::open_in_memory().expect("in-memory database"))
}

pub fn router(store: SurveyStore) -> Router {
    HttpServer::with_config(HttpServerConfig::default(), store).router()
}

/// Sends one request through the router; returns status and raw body.
pub async fn send(router: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Vec<u8>) {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, bytes.to_vec())
}

/// Like [`send`] but parses the body as JSON
pub async fn send_json(router: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let (status, bytes) = send(router, method, uri, body).await;
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}
