//! The HTTP control plane (spec §6): JSON over UTF-8, consumed by the game
//! server and admin tooling. Every response wraps its payload in the
//! `{success, message, data, timestamp, errors?}` envelope. Grounded on the
//! `IndexMaker-indexmaker-backend` manifest, the only axum service in the
//! retrieval pack.

mod admin;
mod envelope;
mod shop;

use crate::executor::TransactionExecutor;
use crate::ledger::Ledger;
use crate::pricing::PricingEngine;
use crate::catalog::Catalog;
use crate::session::SessionRegistry;
use axum::Router;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

pub use envelope::{ApiResponse, Page};

/// Shared application state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub catalog: Arc<Catalog>,
    pub pricing: Arc<PricingEngine>,
    pub ledger: Arc<Ledger>,
    pub executor: Arc<TransactionExecutor>,
    pub sessions: Arc<SessionRegistry>,
}

/// A no-op `X-API-Key` passthrough. Real authentication is an external
/// collaborator (spec §1 Out of scope); this layer only documents where it
/// would be wired in.
async fn api_key_passthrough(
    request: axum::extract::Request,
    next: axum::middleware::Next,
) -> axum::response::Response {
    next.run(request).await
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .merge(shop::routes())
        .merge(admin::routes())
        .layer(axum::middleware::from_fn(api_key_passthrough))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
