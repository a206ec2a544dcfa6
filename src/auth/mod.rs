//! Authentication module for bearer token extraction.

mod extractor;

pub use extractor::BearerToken;
