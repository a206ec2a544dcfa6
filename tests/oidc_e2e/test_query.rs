//! E2E tests: result lookup and method handling.

use super::test_helpers::*;
use actix_web::test;
use homework_results_lib::models::StoredRecord;
use serde_json::json;

fn record(repository: &str) -> StoredRecord {
    StoredRecord {
        github_sub: format!("repo:{}:ref:refs/heads/main", repository),
        repository: repository.to_string(),
        commit: "abc123".to_string(),
        test_result: json!({"passed": 1, "failed": 2}),
    }
}

/// No stored result → 404.
#[actix_rt::test]
async fn test_unknown_pair_not_found() {
    let mock = start_mock().await;
    let (app, _store) = create_test_app(&mock.issuer_url).await;

    let (status, body) = query_results(&app, "userId=42&taskId=7").await;

    assert_eq!(status, 404);
    assert_eq!(body["error"], "NOT_FOUND");
}

/// Exactly one match → returned unchanged.
#[actix_rt::test]
async fn test_single_match_returned() {
    let mock = start_mock().await;
    let (app, store) = create_test_app(&mock.issuer_url).await;
    let stored = record("https://github.com/bob/7-3");
    store.seed("bob-7-3", &stored).await;

    let (status, body) = query_results(&app, "userId=7&taskId=3").await;

    assert_eq!(status, 200);
    assert_eq!(body["key"], "bob-7-3");
    assert_eq!(body["data"], serde_json::to_value(&stored).unwrap());
}

/// Username narrows a shared (userId, taskId) to one record.
#[actix_rt::test]
async fn test_username_disambiguates() {
    let mock = start_mock().await;
    let (app, store) = create_test_app(&mock.issuer_url).await;
    store.seed("bob-7-3", &record("https://github.com/bob/7-3")).await;
    store.seed("carol-7-3", &record("https://github.com/carol/7-3")).await;

    let (status, body) = query_results(&app, "userId=7&taskId=3&username=carol").await;

    assert_eq!(status, 200);
    assert_eq!(body["key"], "carol-7-3");
    assert_eq!(body["data"]["repository"], "https://github.com/carol/7-3");
}

/// Missing or pattern-like parameters → 400.
#[actix_rt::test]
async fn test_bad_params_rejected() {
    let mock = start_mock().await;
    let (app, _store) = create_test_app(&mock.issuer_url).await;

    let (status, body) = query_results(&app, "userId=42").await;
    assert_eq!(status, 400);
    assert_eq!(body["reason"], "missing_query_params");

    let (status, body) = query_results(&app, "userId=*&taskId=7").await;
    assert_eq!(status, 400);
    assert_eq!(body["reason"], "invalid_query_params");
}

/// Methods other than GET and POST → 405 with an Allow header.
#[actix_rt::test]
async fn test_other_methods_not_allowed() {
    let mock = start_mock().await;
    let (app, _store) = create_test_app(&mock.issuer_url).await;

    for req in [
        test::TestRequest::put().uri("/api/v1/results").to_request(),
        test::TestRequest::delete().uri("/api/v1/results").to_request(),
    ] {
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status().as_u16(), 405);
        assert_eq!(resp.headers().get("Allow").unwrap(), "GET, POST");
    }
}

/// Readiness reports the store as reachable.
#[actix_rt::test]
async fn test_ready_with_memory_store() {
    let mock = start_mock().await;
    let (app, _store) = create_test_app(&mock.issuer_url).await;

    let req = test::TestRequest::get().uri("/api/v1/ready").to_request();
    let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;

    assert_eq!(body["status"], "ready");
}
