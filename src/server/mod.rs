//! HTTP server for registry administration and path queries.
//!
//! Exposes the model registry so operators can register models at runtime
//! and clients can list capabilities and classify paths.
//!
//! # Endpoints
//!
//! - `GET  /health`       - Liveness probe
//! - `GET  /capabilities` - Supported models
//! - `POST /models`       - Register a model plugin

pub mod routes;

pub use routes::{app_router, AppState};
