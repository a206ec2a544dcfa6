//! Actix-web extractor for bearer token authentication.
//!
//! # Security
//! - The token is wrapped in `SecretString` as soon as it leaves the header
//! - It is never logged or exposed in debug output
//! - Memory is zeroized when the request completes

use actix_web::dev::Payload;
use actix_web::{FromRequest, HttpRequest};
use secrecy::SecretString;
use std::future::{Ready, ready};

use crate::config::AUTHORIZATION_HEADER;
use crate::error::AppError;

const BEARER_PREFIX: &str = "Bearer ";

/// Extract the token from an `Authorization: Bearer <token>` header value.
/// Returns None if the scheme is not Bearer or the token is empty.
fn parse_bearer(value: &str) -> Option<SecretString> {
    value
        .strip_prefix(BEARER_PREFIX)
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .map(|token| SecretString::from(token.to_string()))
}

/// Extractor that requires an `Authorization: Bearer <token>` header.
///
/// Only checks that a token is present; verification happens in the
/// ingestion service so that the failure reason can be logged in one place.
pub struct BearerToken {
    pub token: SecretString,
}

impl std::fmt::Debug for BearerToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "BearerToken([REDACTED])")
    }
}

impl FromRequest for BearerToken {
    type Error = AppError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let header = match req.headers().get(AUTHORIZATION_HEADER) {
            Some(value) => value,
            None => {
                return ready(Err(AppError::Unauthorized(
                    "Missing Authorization header".to_string(),
                )));
            }
        };

        let token = header.to_str().ok().and_then(parse_bearer);
        ready(token.map(|token| BearerToken { token }).ok_or_else(|| {
            AppError::Unauthorized(
                "Invalid Authorization header. Expected 'Bearer <token>'.".to_string(),
            )
        }))
    }
}
