//! Shared test helpers for OIDC E2E tests.

use actix_web::{App, dev::ServiceResponse, test, web};
use async_trait::async_trait;
use homework_results_lib::api;
use homework_results_lib::config::GitHubOidcSettings;
use homework_results_lib::models::StoredRecord;
use homework_results_lib::services::{
    GitHubOidcVerifier, IngestionService, MemoryResultStore, QueryService, ResultStore,
    StoreError, TokenVerifier,
};
use serde_json::{Value, json};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, OnceLock};
use std::time::Duration;

use super::mock_oidc_provider::{MockOidcProvider, TestKeyPair};

/// Audience the test app expects.
pub const TEST_AUDIENCE: &str = "homework-test-server";

/// Repository used by default in claims and payloads.
pub const STUDENT_REPOSITORY: &str = "https://github.com/alice/42-7";

/// RSA keys are slow to generate; build them once for the whole suite.
/// Each test starts its own provider since it runs on its own runtime.
struct SharedKeys {
    primary: TestKeyPair,
    rotated: TestKeyPair,
    unknown: TestKeyPair,
}

static SHARED_KEYS: OnceLock<SharedKeys> = OnceLock::new();

fn keys() -> &'static SharedKeys {
    SHARED_KEYS.get_or_init(|| SharedKeys {
        primary: TestKeyPair::generate("primary-key"),
        rotated: TestKeyPair::generate("rotated-key"),
        unknown: TestKeyPair::generate("unknown-key"),
    })
}

/// Key published by a freshly started provider.
pub fn primary_key() -> TestKeyPair {
    keys().primary.clone()
}

/// Key a provider can rotate to.
pub fn rotated_key() -> TestKeyPair {
    keys().rotated.clone()
}

/// Key no provider ever publishes.
pub fn unknown_key() -> TestKeyPair {
    keys().unknown.clone()
}

/// Start a provider publishing the primary key.
pub async fn start_mock() -> MockOidcProvider {
    MockOidcProvider::start(vec![primary_key()]).await
}

/// Result store that counts writes.
#[derive(Clone, Default)]
pub struct CountingStore {
    inner: MemoryResultStore,
    writes: Arc<AtomicUsize>,
}

impl CountingStore {
    pub fn writes(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    pub async fn stored(&self, key: &str) -> Option<StoredRecord> {
        self.inner.get(key).await.unwrap()
    }

    pub async fn seed(&self, key: &str, record: &StoredRecord) {
        self.inner.put(key, record).await.unwrap();
    }
}

#[async_trait]
impl ResultStore for CountingStore {
    async fn put(&self, key: &str, record: &StoredRecord) -> Result<(), StoreError> {
        self.writes.fetch_add(1, Ordering::SeqCst);
        self.inner.put(key, record).await
    }

    async fn get(&self, key: &str) -> Result<Option<StoredRecord>, StoreError> {
        self.inner.get(key).await
    }

    async fn scan_by_suffix(&self, suffix: &str) -> Result<Vec<String>, StoreError> {
        self.inner.scan_by_suffix(suffix).await
    }

    async fn ping(&self) -> Result<(), StoreError> {
        self.inner.ping().await
    }
}

/// Create a test app trusting the given issuer, backed by a counting in-memory store.
pub async fn create_test_app(
    issuer_url: &str,
) -> (
    impl actix_web::dev::Service<
        actix_http::Request,
        Response = ServiceResponse,
        Error = actix_web::Error,
    >,
    CountingStore,
) {
    let settings = GitHubOidcSettings {
        issuer: issuer_url.to_string(),
        audience: TEST_AUDIENCE.to_string(),
        jwks_timeout: Duration::from_secs(5),
    };
    let verifier: Arc<dyn TokenVerifier> =
        Arc::new(GitHubOidcVerifier::new(&settings).expect("failed to build verifier"));

    let store = CountingStore::default();
    let shared: Arc<dyn ResultStore> = Arc::new(store.clone());

    let app = test::init_service(
        App::new()
            .app_data(web::Data::from(shared.clone()))
            .app_data(web::Data::new(IngestionService::new(verifier, shared.clone())))
            .app_data(web::Data::new(QueryService::new(shared)))
            .app_data(api::json_config(64 * 1024))
            .service(web::scope("/api/v1").configure(api::configure_routes)),
    )
    .await;

    (app, store)
}

/// A complete submission for the given repository.
pub fn submission_for(repository: &str) -> Value {
    json!({
        "studentRepository": repository,
        "commitSha": "abc123",
        "testResult": {"passed": 3, "failed": 0},
    })
}

/// Submit a result with a Bearer token.
pub async fn submit_with_token<S>(app: &S, token: &str, body: Value) -> (u16, Value)
where
    S: actix_web::dev::Service<
            actix_http::Request,
            Response = ServiceResponse,
            Error = actix_web::Error,
        >,
{
    let req = test::TestRequest::post()
        .uri("/api/v1/results")
        .insert_header(("Authorization", format!("Bearer {}", token)))
        .set_json(body)
        .to_request();

    let resp = test::call_service(app, req).await;
    let status = resp.status().as_u16();
    let body: Value = test::read_body_json(resp).await;
    (status, body)
}

/// Look up a result by query string, e.g. `userId=42&taskId=7`.
pub async fn query_results<S>(app: &S, query: &str) -> (u16, Value)
where
    S: actix_web::dev::Service<
            actix_http::Request,
            Response = ServiceResponse,
            Error = actix_web::Error,
        >,
{
    let req = test::TestRequest::get()
        .uri(&format!("/api/v1/results?{}", query))
        .to_request();

    let resp = test::call_service(app, req).await;
    let status = resp.status().as_u16();
    let body: Value = test::read_body_json(resp).await;
    (status, body)
}
