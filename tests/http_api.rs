//! HTTP API tests
//!
//! Requests go through the full axum router in-process.

mod common;

use axum::http::StatusCode;
use serde_json::json;

use common::{memory_store, payload, payload_completed_at, payload_with, router, send, send_json};

// =============================================================================
// SUBMISSION AND LOOKUP
// =============================================================================

/// Test: the example submission round-trips through POST and GET.
#[tokio::test]
async fn test_submit_then_fetch() {
    let app = router(memory_store());

    let (status, created) = send_json(&app, "POST", "/api/surveys", Some(payload("P1", "S1"))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(created["success"], json!(true));
    let id = created["surveyId"].as_str().unwrap().to_string();
    assert_eq!(id.len(), 36);

    let (status, detail) = send_json(&app, "GET", &format!("/api/surveys/{}", id), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(detail["survey"]["id"], json!(id));
    assert_eq!(detail["survey"]["patient_id"], json!("P1"));
    let responses = detail["responses"].as_array().unwrap();
    assert_eq!(responses.len(), 20);
    assert_eq!(responses[0]["question_id"], json!(1));
    assert_eq!(responses[3]["answer"], json!(["a", "b"]));
}

/// Test: unknown survey id is 404.
#[tokio::test]
async fn test_unknown_survey_is_404() {
    let app = router(memory_store());
    let (status, body) = send_json(&app, "GET", "/api/surveys/does-not-exist", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], json!("Survey not found"));
}

/// Test: validation failures are 400 with a details list.
#[tokio::test]
async fn test_validation_error_shape() {
    let app = router(memory_store());
    let (status, body) =
        send_json(&app, "POST", "/api/surveys", Some(payload_with("P1", "S1", 1..=19))).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());
    let details = body["details"].as_array().unwrap();
    assert!(details.iter().any(|d| d.as_str().unwrap().contains("exactly 20 entries")));
}

/// Test: delete is 204, then the survey is gone.
#[tokio::test]
async fn test_delete_survey() {
    let app = router(memory_store());
    let (_, created) = send_json(&app, "POST", "/api/surveys", Some(payload("P1", "S1"))).await;
    let uri = format!("/api/surveys/{}", created["surveyId"].as_str().unwrap());

    let (status, _) = send(&app, "DELETE", &uri, None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _) = send(&app, "GET", &uri, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = send(&app, "DELETE", &uri, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

// =============================================================================
// LISTING
// =============================================================================

/// Test: pagination envelope and ordering.
#[tokio::test]
async fn test_list_pagination() {
    let app = router(memory_store());
    for day in 1..=5 {
        let at = format!("2024-01-0{}T09:00:00Z", day);
        let body = payload_completed_at(&format!("P{}", day), "S1", &at);
        let (status, _) = send_json(&app, "POST", "/api/surveys", Some(body)).await;
        assert_eq!(status, StatusCode::OK);
    }

    let mut seen = Vec::new();
    let mut flags = Vec::new();
    for page in 1..=3 {
        let uri = format!("/api/studies/S1/surveys?page={}&limit=2", page);
        let (status, body) = send_json(&app, "GET", &uri, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["pagination"]["page"], json!(page));
        assert_eq!(body["pagination"]["limit"], json!(2));
        flags.push(body["pagination"]["hasMore"].as_bool().unwrap());
        for survey in body["surveys"].as_array().unwrap() {
            seen.push(survey["patient_id"].as_str().unwrap().to_string());
            assert_eq!(survey["response_count"], json!(20));
        }
    }

    assert_eq!(flags, vec![true, true, false]);
    assert_eq!(seen, vec!["P5", "P4", "P3", "P2", "P1"]);
}

/// Test: defaults, cap and rejection of bad paging values.
#[tokio::test]
async fn test_list_query_validation() {
    let app = router(memory_store());

    let (status, body) = send_json(&app, "GET", "/api/studies/S1/surveys", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["pagination"], json!({ "page": 1, "limit": 50, "hasMore": false }));

    let (_, body) = send_json(&app, "GET", "/api/studies/S1/surveys?limit=100000", None).await;
    assert_eq!(body["pagination"]["limit"], json!(500));

    for uri in [
        "/api/studies/S1/surveys?page=0",
        "/api/studies/S1/surveys?limit=0",
        "/api/studies/S1/surveys?page=abc",
    ] {
        let (status, _) = send(&app, "GET", uri, None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{}", uri);
    }
}

// =============================================================================
// ANALYTICS
// =============================================================================

/// Test: analytics summarises the study.
#[tokio::test]
async fn test_analytics() {
    let app = router(memory_store());
    for (patient, status) in [("P1", "completed"), ("P1", "abandoned"), ("P2", "completed")] {
        let mut body = payload(patient, "S1");
        body["status"] = json!(status);
        send_json(&app, "POST", "/api/surveys", Some(body)).await;
    }

    let (status, stats) = send_json(&app, "GET", "/api/studies/S1/analytics", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(stats["totalSurveys"], json!(3));
    assert_eq!(stats["uniquePatients"], json!(2));
    assert_eq!(stats["avgResponsesPerSurvey"], json!(20.0));
    assert_eq!(stats["statusBreakdown"]["abandoned"], json!(1));
    assert_eq!(stats["completionRate"], json!(0.6667));

    let (status, empty) = send_json(&app, "GET", "/api/studies/none/analytics", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(empty["totalSurveys"], json!(0));
    assert_eq!(empty["firstSurveyAt"], json!(null));
}

// =============================================================================
// STUDY CONFIG
// =============================================================================

fn three_question_config() -> serde_json::Value {
    json!({
        "questions": [
            { "id": 1, "text": "Pain", "type": "scale", "constraints": { "min": 0, "max": 10 } },
            { "id": 2, "text": "Mood", "type": "multiple_choice",
              "constraints": { "options": ["good", "bad"] } },
            { "id": 3, "text": "Notes", "type": "text", "required": false }
        ],
        "settings": { "allowResubmission": true }
    })
}

/// Test: a registered config drives validation of later submissions.
#[tokio::test]
async fn test_study_config_drives_validation() {
    let app = router(memory_store());

    let (status, body) =
        send_json(&app, "PUT", "/api/studies/S9/config", Some(three_question_config())).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "success": true, "studyId": "S9" }));

    let (status, config) = send_json(&app, "GET", "/api/studies/S9/config", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(config["questions"].as_array().unwrap().len(), 3);

    let good = json!({
        "patientId": "P1",
        "studyId": "S9",
        "responses": [
            { "questionId": 1, "question": "Pain", "answer": 4, "responseType": "scale" },
            { "questionId": 2, "question": "Mood", "answer": "good", "responseType": "multiple_choice" },
            { "questionId": 3, "question": "Notes", "answer": "", "responseType": "text" }
        ]
    });
    let (status, _) = send_json(&app, "POST", "/api/surveys", Some(good)).await;
    assert_eq!(status, StatusCode::OK);

    let bad = json!({
        "patientId": "P1",
        "studyId": "S9",
        "responses": [
            { "questionId": 1, "question": "Pain", "answer": 11, "responseType": "scale" },
            { "questionId": 2, "question": "Mood", "answer": "meh", "responseType": "multiple_choice" },
            { "questionId": 3, "question": "Notes", "answer": "x", "responseType": "text" }
        ]
    });
    let (status, body) = send_json(&app, "POST", "/api/surveys", Some(bad)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["details"].as_array().unwrap().len(), 2);
}

/// Test: structurally invalid configs and mismatched ids are rejected.
#[tokio::test]
async fn test_invalid_study_config_rejected() {
    let app = router(memory_store());

    let mut config = three_question_config();
    config["questions"][1]["constraints"] = json!({});
    let (status, _) = send_json(&app, "PUT", "/api/studies/S9/config", Some(config)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let mut config = three_question_config();
    config["studyId"] = json!("other");
    let (status, _) = send_json(&app, "PUT", "/api/studies/S9/config", Some(config)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(&app, "GET", "/api/studies/S9/config", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

/// Test: resubmission conflict is 409.
#[tokio::test]
async fn test_resubmission_conflict() {
    let app = router(memory_store());
    let mut config = three_question_config();
    config["settings"]["allowResubmission"] = json!(false);
    send_json(&app, "PUT", "/api/studies/S9/config", Some(config)).await;

    let body = json!({
        "patientId": "P1",
        "studyId": "S9",
        "responses": [
            { "questionId": 1, "question": "Pain", "answer": 4, "responseType": "scale" },
            { "questionId": 2, "question": "Mood", "answer": "bad", "responseType": "multiple_choice" },
            { "questionId": 3, "question": "Notes", "answer": "", "responseType": "text" }
        ]
    });
    let (status, _) = send_json(&app, "POST", "/api/surveys", Some(body.clone())).await;
    assert_eq!(status, StatusCode::OK);

    let (status, err) = send_json(&app, "POST", "/api/surveys", Some(body)).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert!(err["error"].as_str().unwrap().contains("Resubmission"));
}

// =============================================================================
// HEALTH AND METRICS
// =============================================================================

/// Test: health reports healthy with a timestamp.
#[tokio::test]
async fn test_health() {
    let app = router(memory_store());
    let (status, body) = send_json(&app, "GET", "/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], json!("healthy"));
    assert!(body["timestamp"].as_str().unwrap().ends_with('Z'));
    assert!(body["version"].is_string());
}

/// Test: counters reflect accepted and rejected submissions.
#[tokio::test]
async fn test_metrics_counters() {
    let app = router(memory_store());
    send_json(&app, "POST", "/api/surveys", Some(payload("P1", "S1"))).await;
    send_json(&app, "POST", "/api/surveys", Some(payload_with("P1", "S1", 1..=3))).await;

    let (status, metrics) = send_json(&app, "GET", "/observability/metrics", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(metrics["surveys_submitted"], json!(1));
    assert_eq!(metrics["responses_stored"], json!(20));
    assert_eq!(metrics["submissions_rejected"], json!(1));
}
