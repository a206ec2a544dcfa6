//! Homework results server library.
//!
//! This library provides the core functionality for the results server,
//! including GitHub OIDC verification, result storage, and API handlers.

pub mod api;
pub mod auth;
pub mod config;
pub mod error;
pub mod middleware;
pub mod models;
pub mod services;
