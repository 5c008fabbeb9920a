pub mod purchase;

use axum::{routing::get, Router};
use std::sync::Arc;

use crate::AppState;

/// Builds the HTTP surface: the offer purchase endpoints and a health
/// probe. Everything else about this system is admin CRUD that lives
/// elsewhere.
pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/health", get(health))
        .nest("/offers", purchase::purchase_routes())
}

async fn health() -> &'static str {
    "ok"
}
