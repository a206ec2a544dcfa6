//! E2E tests: Invalid OIDC token scenarios.

use super::mock_oidc_provider::TestOidcClaims;
use super::test_helpers::*;

/// Expired token → 401, nothing stored.
#[actix_rt::test]
async fn test_expired_token_rejected() {
    let mock = start_mock().await;
    let (app, store) = create_test_app(&mock.issuer_url).await;

    let claims = TestOidcClaims::default_for(&mock.issuer_url).expired();
    let token = mock.issue_token(&claims, &primary_key());
    let (status, body) = submit_with_token(&app, &token, submission_for(STUDENT_REPOSITORY)).await;

    assert_eq!(status, 401, "Expired token should be rejected");
    assert_eq!(body["message"], "Token validation failed");
    assert_eq!(store.writes(), 0);
}

/// Bad signature (key not in JWKS) → 401.
#[actix_rt::test]
async fn test_unknown_key_rejected() {
    let mock = start_mock().await;
    let (app, store) = create_test_app(&mock.issuer_url).await;

    let claims = TestOidcClaims::default_for(&mock.issuer_url);
    let token = mock.issue_token(&claims, &unknown_key());
    let (status, _) = submit_with_token(&app, &token, submission_for(STUDENT_REPOSITORY)).await;

    assert_eq!(
        status, 401,
        "Token signed with unknown key should be rejected"
    );
    assert_eq!(store.writes(), 0);
}

/// Known kid but signed by a different key → 401.
#[actix_rt::test]
async fn test_forged_signature_rejected() {
    let mock = start_mock().await;
    let (app, store) = create_test_app(&mock.issuer_url).await;

    // Claims the primary kid but is signed with another private key
    let forger = unknown_key().relabeled(&primary_key().kid);
    let claims = TestOidcClaims::default_for(&mock.issuer_url);
    let token = mock.issue_token(&claims, &forger);
    let (status, _) = submit_with_token(&app, &token, submission_for(STUDENT_REPOSITORY)).await;

    assert_eq!(status, 401, "Forged signature should be rejected");
    assert_eq!(store.writes(), 0);
}

/// Audience mismatch → 401.
#[actix_rt::test]
async fn test_audience_mismatch_rejected() {
    let mock = start_mock().await;
    let (app, _store) = create_test_app(&mock.issuer_url).await;

    let claims = TestOidcClaims::default_for(&mock.issuer_url).with_audience("some-other-service");
    let token = mock.issue_token(&claims, &primary_key());
    let (status, _) = submit_with_token(&app, &token, submission_for(STUDENT_REPOSITORY)).await;

    assert_eq!(status, 401, "Wrong audience should be rejected");
}

/// Missing audience → 401.
#[actix_rt::test]
async fn test_missing_audience_rejected() {
    let mock = start_mock().await;
    let (app, _store) = create_test_app(&mock.issuer_url).await;

    let claims = TestOidcClaims::default_for(&mock.issuer_url).without_audience();
    let token = mock.issue_token(&claims, &primary_key());
    let (status, _) = submit_with_token(&app, &token, submission_for(STUDENT_REPOSITORY)).await;

    assert_eq!(status, 401, "Token without audience should be rejected");
}

/// Valid signature but a different issuer → 401.
#[actix_rt::test]
async fn test_wrong_issuer_rejected() {
    let mock = start_mock().await;
    let (app, store) = create_test_app(&mock.issuer_url).await;

    let claims = TestOidcClaims::default_for(&mock.issuer_url)
        .with_issuer("https://token.actions.githubusercontent.com");
    let token = mock.issue_token(&claims, &primary_key());
    let (status, body) = submit_with_token(&app, &token, submission_for(STUDENT_REPOSITORY)).await;

    assert_eq!(status, 401, "Untrusted issuer should be rejected");
    assert!(body.get("reason").is_none());
    assert_eq!(store.writes(), 0);
}

/// Garbage token → 401.
#[actix_rt::test]
async fn test_malformed_token_rejected() {
    let mock = start_mock().await;
    let (app, _store) = create_test_app(&mock.issuer_url).await;

    let (status, _) =
        submit_with_token(&app, "not-a-jwt", submission_for(STUDENT_REPOSITORY)).await;

    assert_eq!(status, 401);
}

/// No Authorization header → 401 before anything else is looked at.
#[actix_rt::test]
async fn test_missing_header_rejected() {
    let mock = start_mock().await;
    let (app, store) = create_test_app(&mock.issuer_url).await;

    let req = actix_web::test::TestRequest::post()
        .uri("/api/v1/results")
        .set_json(submission_for(STUDENT_REPOSITORY))
        .to_request();
    let resp = actix_web::test::call_service(&app, req).await;

    assert_eq!(resp.status().as_u16(), 401);
    let body: serde_json::Value = actix_web::test::read_body_json(resp).await;
    assert_eq!(body["error"], "UNAUTHORIZED");
    assert_eq!(body["message"], "Missing Authorization header");
    assert_eq!(store.writes(), 0);
}
