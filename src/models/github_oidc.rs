//! GitHub OIDC models for JWT claims.

use serde::Deserialize;

/// Audience claim, which GitHub emits as a string but the JWT spec allows as an array.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum Audience {
    Single(String),
    Many(Vec<String>),
}

/// GitHub Actions OIDC JWT claims used by the server.
///
/// Only `sub`, `repository`, `iss` and `aud` take part in verification and
/// authorization. The remaining fields are optional and only logged.
/// Unknown claims (jti, exp, iat, nbf, job_workflow_ref, ...) are ignored
/// during deserialization.
///
/// See: <https://docs.github.com/en/actions/security-for-github-actions/security-hardening-your-deployments/about-security-hardening-with-openid-connect>
#[derive(Debug, Clone, Deserialize)]
pub struct GitHubOidcClaims {
    /// Subject (e.g., "repo:org/repo:ref:refs/heads/main").
    pub sub: String,
    /// Repository the workflow ran in; must match the submitted repository.
    pub repository: String,
    /// Issuer; compared against the configured issuer after signature checks.
    pub iss: String,
    /// Audience.
    pub aud: Audience,
    /// Repository owner (e.g., "octo-org").
    #[serde(default)]
    pub repository_owner: Option<String>,
    /// Actor (GitHub username who triggered the workflow).
    #[serde(default)]
    pub actor: Option<String>,
    /// Commit SHA.
    #[serde(default)]
    pub sha: Option<String>,
    /// Workflow name.
    #[serde(default)]
    pub workflow: Option<String>,
    /// Run ID.
    #[serde(default)]
    pub run_id: Option<String>,
}
