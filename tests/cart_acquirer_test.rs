mod common;

use common::{seed_store, TestApp};
use rust_decimal::Decimal;
use sea_orm::{ColumnTrait, EntityTrait, QueryFilter};
use uuid::Uuid;

use express_checkout::{
    entities::{order, Order, OrderState},
    services::CartAcquirer,
};

#[tokio::test]
async fn first_acquire_creates_a_draft_cart() {
    let app = TestApp::new().await;
    let store_id = seed_store(&app, "EUR").await;
    let customer_id = Uuid::new_v4();
    let acquirer = CartAcquirer::new(app.db.clone(), app.event_sender.clone());

    let cart = acquirer
        .acquire("default", store_id, customer_id)
        .await
        .expect("first acquire should create a cart");

    assert_eq!(cart.state, OrderState::Draft);
    assert!(cart.is_cart);
    assert_eq!(cart.order_type_id, "default");
    assert_eq!(cart.customer_id, customer_id);
    assert_eq!(cart.total, Decimal::ZERO);
    // Currency comes from the store default.
    assert_eq!(cart.currency, "EUR");
}

#[tokio::test]
async fn sequential_acquires_return_the_same_cart() {
    let app = TestApp::new().await;
    let store_id = seed_store(&app, "USD").await;
    let customer_id = Uuid::new_v4();
    let acquirer = CartAcquirer::new(app.db.clone(), app.event_sender.clone());

    let first = acquirer.acquire("default", store_id, customer_id).await.unwrap();
    let second = acquirer.acquire("default", store_id, customer_id).await.unwrap();

    assert_eq!(first.id, second.id);

    let carts = Order::find()
        .filter(order::Column::CustomerId.eq(customer_id))
        .all(&*app.db)
        .await
        .unwrap();
    assert_eq!(carts.len(), 1);
}

#[tokio::test]
async fn distinct_keys_get_distinct_carts() {
    let app = TestApp::new().await;
    let store_id = seed_store(&app, "USD").await;
    let acquirer = CartAcquirer::new(app.db.clone(), app.event_sender.clone());

    let a = acquirer.acquire("default", store_id, Uuid::new_v4()).await.unwrap();
    let b = acquirer.acquire("default", store_id, Uuid::new_v4()).await.unwrap();
    assert_ne!(a.id, b.id);

    let customer_id = Uuid::new_v4();
    let c = acquirer.acquire("default", store_id, customer_id).await.unwrap();
    let d = acquirer.acquire("other", store_id, customer_id).await.unwrap();
    assert_ne!(c.id, d.id);
}

/// Documents the known race: acquisition is a separate lookup and create
/// with no atomic upsert, so two concurrent first-time calls for the same
/// key may each create a cart. This asserts the current behavior, not a
/// guarantee worth keeping.
#[tokio::test]
async fn concurrent_first_acquires_may_create_two_carts() {
    let app = TestApp::new().await;
    let store_id = seed_store(&app, "USD").await;
    let customer_id = Uuid::new_v4();

    let acquirer_a = CartAcquirer::new(app.db.clone(), app.event_sender.clone());
    let acquirer_b = acquirer_a.clone();

    let (a, b) = tokio::join!(
        acquirer_a.acquire("default", store_id, customer_id),
        acquirer_b.acquire("default", store_id, customer_id),
    );
    let a = a.expect("concurrent acquire a");
    let b = b.expect("concurrent acquire b");

    let carts = Order::find()
        .filter(order::Column::CustomerId.eq(customer_id))
        .filter(order::Column::IsCart.eq(true))
        .all(&*app.db)
        .await
        .unwrap();

    // One cart when the calls serialized, two when they raced.
    assert!(carts.len() == 1 || carts.len() == 2, "got {} carts", carts.len());
    assert!(carts.iter().all(|c| c.state == OrderState::Draft));
    assert!(carts.iter().any(|c| c.id == a.id));
    assert!(carts.iter().any(|c| c.id == b.id));
}
