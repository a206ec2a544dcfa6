//! API endpoint modules.

pub mod health;
pub mod openapi;
pub mod results;

use actix_web::web;

use crate::error::{AppError, ValidationError};

pub use health::configure_health_routes;
pub use openapi::{ApiDoc, configure_openapi_routes};
pub use results::configure_routes as configure_result_routes;

/// Mount every API route. Callers wrap this in the `/api/v1` scope.
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.configure(configure_health_routes)
        .configure(configure_result_routes)
        .configure(configure_openapi_routes);
}

/// JSON body settings shared by every handler: size limit plus error bodies in
/// the same shape as every other failure.
pub fn json_config(limit: usize) -> web::JsonConfig {
    web::JsonConfig::default()
        .limit(limit)
        .error_handler(|err, _req| {
            AppError::from(ValidationError::MalformedBody(err.to_string())).into()
        })
}
