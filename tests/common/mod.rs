#![allow(dead_code)]

use std::sync::Arc;

use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::{ActiveModelTrait, Set};
use tempfile::TempDir;
use tokio::sync::mpsc;
use uuid::Uuid;

use express_checkout::{
    config::AppConfig,
    db,
    entities::{
        offer, order_item_type, order_type, payment_gateway, product, product_type,
        product_variation, product_variation_type, store,
    },
    events::{self, EventSender},
    services::{EnabledGateways, ManualGateway, PaymentExecutor},
    AppState,
};

/// Harness spinning up application state backed by a throwaway SQLite
/// database.
pub struct TestApp {
    pub state: Arc<AppState>,
    pub db: Arc<sea_orm::DatabaseConnection>,
    pub event_sender: EventSender,
    _event_task: tokio::task::JoinHandle<()>,
    _tmp: TempDir,
}

impl TestApp {
    pub async fn new() -> Self {
        Self::with_executor(Arc::new(ManualGateway)).await
    }

    /// Builds the app with a custom payment executor, for forcing
    /// execution outcomes.
    pub async fn with_executor(executor: Arc<dyn PaymentExecutor>) -> Self {
        let tmp = TempDir::new().expect("failed to create temp dir");
        let db_path = tmp.path().join("express_checkout_test.db");
        let url = format!("sqlite://{}?mode=rwc", db_path.display());

        let conn = db::establish_connection(&url)
            .await
            .expect("failed to create test database");
        db::create_schema(&conn)
            .await
            .expect("failed to create test schema");
        let conn = Arc::new(conn);

        let (event_tx, event_rx) = mpsc::channel(64);
        let event_sender = EventSender::new(event_tx);
        let event_task = tokio::spawn(events::process_events(event_rx));

        let cfg = AppConfig {
            database_url: url,
            host: "127.0.0.1".to_string(),
            port: 0,
            environment: "test".to_string(),
            log_level: "debug".to_string(),
            auto_migrate: true,
            event_channel_capacity: 64,
        };

        let state = Arc::new(AppState::new(
            conn.clone(),
            Arc::new(cfg),
            event_sender.clone(),
            Arc::new(EnabledGateways),
            executor,
        ));

        Self {
            state,
            db: conn,
            event_sender,
            _event_task: event_task,
            _tmp: tmp,
        }
    }
}

/// Seeded catalog fixture: one store, a fully-linked type chain, one
/// product with one active variation.
pub struct CatalogFixture {
    pub store_id: Uuid,
    pub product_id: Uuid,
    pub variation_id: Uuid,
}

pub async fn seed_store(app: &TestApp, currency: &str) -> Uuid {
    let store_id = Uuid::new_v4();
    store::ActiveModel {
        id: Set(store_id),
        name: Set("Test Store".to_string()),
        default_currency: Set(currency.to_string()),
        created_at: Set(Utc::now()),
    }
    .insert(&*app.db)
    .await
    .expect("failed to seed store");
    store_id
}

/// Seeds the full chain: product type "default" -> variation type
/// "default" -> order item type "default" -> order type "default".
pub async fn seed_type_chain(app: &TestApp) {
    order_type::ActiveModel {
        id: Set("default".to_string()),
        label: Set("Default order type".to_string()),
        workflow: Set("order_default".to_string()),
    }
    .insert(&*app.db)
    .await
    .expect("failed to seed order type");

    order_item_type::ActiveModel {
        id: Set("default".to_string()),
        label: Set("Default order item type".to_string()),
        order_type_id: Set(Some("default".to_string())),
    }
    .insert(&*app.db)
    .await
    .expect("failed to seed order item type");

    product_variation_type::ActiveModel {
        id: Set("default".to_string()),
        label: Set("Default variation type".to_string()),
        order_item_type_id: Set(Some("default".to_string())),
    }
    .insert(&*app.db)
    .await
    .expect("failed to seed variation type");

    product_type::ActiveModel {
        id: Set("default".to_string()),
        label: Set("Default product type".to_string()),
        variation_type_id: Set(Some("default".to_string())),
    }
    .insert(&*app.db)
    .await
    .expect("failed to seed product type");
}

pub async fn seed_product(app: &TestApp, store_id: Uuid, product_type_id: &str) -> Uuid {
    let product_id = Uuid::new_v4();
    product::ActiveModel {
        id: Set(product_id),
        title: Set("Test Product".to_string()),
        product_type_id: Set(product_type_id.to_string()),
        store_id: Set(store_id),
        active: Set(true),
        created_at: Set(Utc::now()),
        updated_at: Set(Utc::now()),
    }
    .insert(&*app.db)
    .await
    .expect("failed to seed product");
    product_id
}

pub async fn seed_variation(app: &TestApp, product_id: Uuid, price: Decimal) -> Uuid {
    let variation_id = Uuid::new_v4();
    product_variation::ActiveModel {
        id: Set(variation_id),
        product_id: Set(product_id),
        sku: Set(format!("SKU-{}", variation_id)),
        title: Set("Test Variation".to_string()),
        price: Set(price),
        currency: Set("USD".to_string()),
        position: Set(1),
        active: Set(true),
        created_at: Set(Utc::now()),
        updated_at: Set(Utc::now()),
    }
    .insert(&*app.db)
    .await
    .expect("failed to seed variation");
    variation_id
}

/// Store, full chain, product, and one variation in one call.
pub async fn seed_catalog(app: &TestApp, price: Decimal) -> CatalogFixture {
    let store_id = seed_store(app, "USD").await;
    seed_type_chain(app).await;
    let product_id = seed_product(app, store_id, "default").await;
    let variation_id = seed_variation(app, product_id, price).await;
    CatalogFixture {
        store_id,
        product_id,
        variation_id,
    }
}

pub async fn seed_gateway(app: &TestApp, id: &str, weight: i32, stored: bool, types: &[&str]) {
    payment_gateway::ActiveModel {
        id: Set(id.to_string()),
        label: Set(format!("Gateway {}", id)),
        status: Set(true),
        weight: Set(weight),
        supports_stored_methods: Set(stored),
        method_types: Set(serde_json::json!(types)),
    }
    .insert(&*app.db)
    .await
    .expect("failed to seed gateway");
}

pub async fn seed_offer(app: &TestApp, product_id: Uuid, page_path: Option<&str>) -> offer::Model {
    offer::ActiveModel {
        id: Set(Uuid::new_v4()),
        label: Set("Test Offer".to_string()),
        description: Set(None),
        product_id: Set(product_id),
        individual_page: Set(page_path.is_some()),
        page_path: Set(page_path.map(str::to_owned)),
        created_at: Set(Utc::now()),
        updated_at: Set(Utc::now()),
    }
    .insert(&*app.db)
    .await
    .expect("failed to seed offer")
}
