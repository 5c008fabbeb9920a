//! Single-step purchase flow for configured products.
//!
//! A store configures an "offer" pointing at one product; customers buy it
//! through a single form instead of a multi-step cart/checkout. The two
//! load-bearing pieces are the type resolution cascade (product through to
//! order type) and the checkout completion pipeline (cart, gateway
//! selection, payment method provisioning, payment execution, order
//! placement). Everything around them, such as offer CRUD, auth, and
//! product display, belongs to collaborating systems.

pub mod config;
pub mod db;
pub mod entities;
pub mod errors;
pub mod events;
pub mod handlers;
pub mod routing;
pub mod services;
pub mod workflow;

use std::sync::Arc;

use axum::Router;
use sea_orm::DatabaseConnection;
use tower_http::trace::TraceLayer;

use services::{
    CartAcquirer, CheckoutOrchestrator, GatewayConditions, PaymentCompleter, PaymentExecutor,
    PaymentGatewaySelector, PaymentMethodProvisioner, TypeResolver,
};

/// Shared application state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<DatabaseConnection>,
    pub config: Arc<config::AppConfig>,
    pub event_sender: events::EventSender,
    pub orchestrator: Arc<CheckoutOrchestrator>,
    pub offer_routes: Arc<routing::OfferRoutes>,
}

impl AppState {
    /// Wires the pipeline from its collaborator seams: the gateway
    /// eligibility filter and the payment execution contract are injected
    /// so callers (and tests) can swap them.
    pub fn new(
        db: Arc<DatabaseConnection>,
        config: Arc<config::AppConfig>,
        event_sender: events::EventSender,
        conditions: Arc<dyn GatewayConditions>,
        executor: Arc<dyn PaymentExecutor>,
    ) -> Self {
        let resolver = TypeResolver::new(db.clone());
        let cart = CartAcquirer::new(db.clone(), event_sender.clone());
        let selector = PaymentGatewaySelector::new(db.clone(), conditions);
        let provisioner = PaymentMethodProvisioner::new(db.clone());
        let completer = PaymentCompleter::new(db.clone(), executor, event_sender.clone());
        let orchestrator = Arc::new(CheckoutOrchestrator::new(
            db.clone(),
            resolver,
            cart,
            selector,
            provisioner,
            completer,
            event_sender.clone(),
        ));

        Self {
            db,
            config,
            event_sender,
            orchestrator,
            offer_routes: Arc::new(routing::OfferRoutes::new()),
        }
    }
}

/// Builds the application router over the given state.
pub fn app(state: Arc<AppState>) -> Router {
    handlers::router()
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
