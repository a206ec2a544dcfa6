//! E2E tests: valid submissions are stored and can be read back.

use super::mock_oidc_provider::TestOidcClaims;
use super::test_helpers::*;
use serde_json::json;

/// Valid token and matching repository → stored under username-userId-taskId.
#[actix_rt::test]
async fn test_valid_submission_stored() {
    let mock = start_mock().await;
    let (app, store) = create_test_app(&mock.issuer_url).await;

    let claims = TestOidcClaims::default_for(&mock.issuer_url);
    let token = mock.issue_token(&claims, &primary_key());
    let (status, body) =
        submit_with_token(&app, &token, submission_for(STUDENT_REPOSITORY)).await;

    assert_eq!(status, 200, "Valid submission should be accepted: {body}");
    assert_eq!(body["status"], "ok");
    assert_eq!(body["storedKey"], "alice-42-7");
    assert_eq!(body["data"]["repository"], STUDENT_REPOSITORY);
    assert_eq!(body["data"]["commit"], "abc123");
    assert_eq!(body["data"]["github_sub"], claims.sub);
    assert_eq!(store.writes(), 1);

    let record = store.stored("alice-42-7").await.expect("record should exist");
    assert_eq!(record.test_result, json!({"passed": 3, "failed": 0}));
}

/// Submit then query by userId/taskId → the same JSON comes back.
#[actix_rt::test]
async fn test_submitted_result_is_queryable() {
    let mock = start_mock().await;
    let (app, _store) = create_test_app(&mock.issuer_url).await;

    let repository = "org/repo/x/alice/42-7";
    let claims = TestOidcClaims::default_for(&mock.issuer_url).with_repository(repository);
    let token = mock.issue_token(&claims, &primary_key());
    let (status, submitted) = submit_with_token(&app, &token, submission_for(repository)).await;
    assert_eq!(status, 200, "Submission should be accepted: {submitted}");

    let (status, body) = query_results(&app, "userId=42&taskId=7").await;

    assert_eq!(status, 200);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["key"], "alice-42-7");
    assert_eq!(body["data"], submitted["data"]);
    assert_eq!(body["data"]["testResult"], json!({"passed": 3, "failed": 0}));
}

/// A second submission for the same repository replaces the first.
#[actix_rt::test]
async fn test_resubmission_overwrites() {
    let mock = start_mock().await;
    let (app, store) = create_test_app(&mock.issuer_url).await;

    let token = mock.issue_token(
        &TestOidcClaims::default_for(&mock.issuer_url),
        &primary_key(),
    );
    let (status, _) = submit_with_token(&app, &token, submission_for(STUDENT_REPOSITORY)).await;
    assert_eq!(status, 200);

    let mut second = submission_for(STUDENT_REPOSITORY);
    second["commitSha"] = json!("def456");
    second["testResult"] = json!({"passed": 4, "failed": 0});
    let (status, _) = submit_with_token(&app, &token, second).await;
    assert_eq!(status, 200);

    let record = store.stored("alice-42-7").await.expect("record should exist");
    assert_eq!(record.commit, "def456");
    assert_eq!(store.writes(), 2);
}
