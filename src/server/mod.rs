//! Signals query API
//!
//! Read-only HTTP surface over the signal store. Handlers take a snapshot of
//! the store and never block on the scanner's cycle.

use crate::error::Result;
use crate::store::SignalStore;
use crate::types::StoredSignal;
use axum::{extract::State, response::Json, routing::get, Router};
use std::sync::Arc;

pub fn router(store: Arc<SignalStore>) -> Router {
    Router::new()
        .route("/api/signals", get(get_signals))
        .route("/health", get(health_check))
        .with_state(store)
}

/// Serve the signals API on `bind` until the process exits
pub async fn serve(store: Arc<SignalStore>, bind: &str) -> Result<()> {
    let listener = tokio::net::TcpListener::bind(bind).await?;
    tracing::info!("signals API listening on {bind}");
    axum::serve(listener, router(store)).await?;
    Ok(())
}

/// Most recent signals, newest first
async fn get_signals(State(store): State<Arc<SignalStore>>) -> Json<Vec<StoredSignal>> {
    Json(store.snapshot().await)
}

async fn health_check() -> &'static str {
    "OK"
}
