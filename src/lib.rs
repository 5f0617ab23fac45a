//! Quote API Library
//!
//! Quote submissions for a logistics client: an aggregate of contact, pickup
//! and delivery addresses and shipment items, edited through nested attribute
//! payloads and validated as a whole.
#![forbid(unsafe_code)]
#![deny(rust_2018_idioms)]
#![allow(elided_lifetimes_in_paths)]
#![warn(clippy::all, clippy::perf, clippy::dbg_macro)]

// Core modules
pub mod auth;
pub mod config;
pub mod db;
pub mod dto;
pub mod entities;
pub mod errors;
pub mod handlers;
pub mod middleware_helpers;
pub mod migrator;
pub mod models;
pub mod openapi;
pub mod services;
pub mod tracing;

use axum::{routing::get, Router};
use sea_orm::DatabaseConnection;
use std::sync::Arc;
use tower_http::{compression::CompressionLayer, limit::RequestBodyLimitLayer};

use crate::auth::{AuthRouterExt, CredentialVerifier};

// App state definition
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<DatabaseConnection>,
    pub config: config::AppConfig,
    pub services: handlers::AppServices,
}

impl AppState {
    pub fn new(db: Arc<DatabaseConnection>, config: config::AppConfig) -> Self {
        Self {
            services: handlers::AppServices::new(db.clone()),
            db,
            config,
        }
    }
}

/// Client API routes, all behind the bearer-token gate
pub fn api_client_routes(verifier: Arc<dyn CredentialVerifier>) -> Router<AppState> {
    handlers::quote_submissions::quote_submission_routes().with_auth(verifier)
}

/// Full application router without CORS, which the binary adds from config.
pub fn build_router(state: AppState, verifier: Arc<dyn CredentialVerifier>) -> Router {
    let max_body_size = state.config.max_body_size;

    Router::<AppState>::new()
        .route("/health", get(handlers::health::health_check))
        .nest("/api/client", api_client_routes(verifier))
        .merge(openapi::swagger_ui())
        .layer(RequestBodyLimitLayer::new(max_body_size))
        .layer(CompressionLayer::new())
        // HTTP tracing layer for consistent request/response telemetry
        .layer(crate::tracing::configure_http_tracing())
        // Ensure every request carries a request id for traceability
        .layer(axum::middleware::from_fn(
            middleware_helpers::request_id_middleware,
        ))
        .with_state(state)
}
