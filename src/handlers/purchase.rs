use axum::{
    extract::{Json, Path, State},
    http::HeaderMap,
    response::IntoResponse,
    routing::get,
    Router,
};
use sea_orm::EntityTrait;
use std::sync::Arc;
use uuid::Uuid;

use crate::{
    entities::Offer,
    errors::CheckoutError,
    services::{CustomerContext, SubmitValues},
    AppState,
};

/// Purchase endpoints for offers that claim an individual page. The path
/// under `/offers` is the offer's configured page path.
pub fn purchase_routes() -> Router<Arc<AppState>> {
    Router::new().route("/*path", get(render_form).post(submit))
}

/// Render path: form context for the offer behind `path`.
async fn render_form(
    State(state): State<Arc<AppState>>,
    Path(path): Path<String>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, CheckoutError> {
    let offer = lookup_offer(&state, &path).await?;
    let customer = customer_from_headers(&headers)?;

    let form = state.orchestrator.prepare(&offer, &customer).await?;
    Ok(Json(form))
}

/// Submission path: complete the purchase for the offer behind `path`.
async fn submit(
    State(state): State<Arc<AppState>>,
    Path(path): Path<String>,
    headers: HeaderMap,
    Json(values): Json<SubmitValues>,
) -> Result<impl IntoResponse, CheckoutError> {
    let offer = lookup_offer(&state, &path).await?;
    let customer = customer_from_headers(&headers)?;

    let placed = state.orchestrator.submit(&offer, &customer, &values).await?;
    Ok(Json(placed))
}

/// Maps a request path to its offer through the route table. Absence means
/// the path is not handled by this flow.
async fn lookup_offer(
    state: &AppState,
    path: &str,
) -> Result<crate::entities::OfferModel, CheckoutError> {
    let full_path = format!("/{}", path.trim_start_matches('/'));
    let offer_id = state
        .offer_routes
        .path_to_offer(&full_path)
        .ok_or_else(|| CheckoutError::NotFound(format!("no offer at '{}'", full_path)))?;

    Offer::find_by_id(offer_id)
        .one(&*state.db)
        .await?
        .ok_or_else(|| CheckoutError::NotFound(format!("offer {} not found", offer_id)))
}

/// Customer identity comes from the caller's auth layer; these headers are
/// its hand-off.
fn customer_from_headers(headers: &HeaderMap) -> Result<CustomerContext, CheckoutError> {
    let id = headers
        .get("x-customer-id")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| Uuid::parse_str(v).ok())
        .ok_or_else(|| {
            CheckoutError::Validation("missing or invalid x-customer-id header".to_string())
        })?;
    let email = headers
        .get("x-customer-email")
        .and_then(|v| v.to_str().ok())
        .map(str::to_owned)
        .ok_or_else(|| CheckoutError::Validation("missing x-customer-email header".to_string()))?;

    Ok(CustomerContext { id, email })
}
