mod common;

use common::{seed_product, seed_store, seed_type_chain, TestApp};
use rust_decimal_macros::dec;
use sea_orm::{ActiveModelTrait, Set};
use uuid::Uuid;

use express_checkout::{
    entities::{order_item_type, product_type, product_variation_type},
    errors::{CheckoutError, ResolutionStage},
    services::TypeResolver,
};

#[tokio::test]
async fn fully_linked_chain_resolves() {
    let app = TestApp::new().await;
    let fixture = common::seed_catalog(&app, dec!(10.00)).await;
    let resolver = TypeResolver::new(app.db.clone());

    let chain = resolver
        .resolve(fixture.product_id)
        .await
        .expect("fully linked chain should resolve");

    assert_eq!(chain.product_type.id, "default");
    assert_eq!(chain.variation_type.id, "default");
    assert_eq!(chain.order_item_type.id, "default");
    assert_eq!(chain.order_type.id, "default");
}

#[tokio::test]
async fn missing_product_fails_at_product_stage() {
    let app = TestApp::new().await;
    let resolver = TypeResolver::new(app.db.clone());

    let err = resolver.resolve(Uuid::new_v4()).await.unwrap_err();
    assert!(matches!(
        err,
        CheckoutError::Resolution(ResolutionStage::Product)
    ));
}

#[tokio::test]
async fn missing_product_type_fails_at_product_type_stage() {
    let app = TestApp::new().await;
    let store_id = seed_store(&app, "USD").await;
    // Product references a bundle that does not exist.
    let product_id = seed_product(&app, store_id, "ghost").await;
    let resolver = TypeResolver::new(app.db.clone());

    let err = resolver.resolve(product_id).await.unwrap_err();
    assert!(matches!(
        err,
        CheckoutError::Resolution(ResolutionStage::ProductType)
    ));
}

#[tokio::test]
async fn unconfigured_variation_type_fails_at_variation_type_stage() {
    let app = TestApp::new().await;
    let store_id = seed_store(&app, "USD").await;
    product_type::ActiveModel {
        id: Set("bare".to_string()),
        label: Set("No variation type".to_string()),
        variation_type_id: Set(None),
    }
    .insert(&*app.db)
    .await
    .unwrap();
    let product_id = seed_product(&app, store_id, "bare").await;
    let resolver = TypeResolver::new(app.db.clone());

    let err = resolver.resolve(product_id).await.unwrap_err();
    assert!(matches!(
        err,
        CheckoutError::Resolution(ResolutionStage::VariationType)
    ));
}

#[tokio::test]
async fn unconfigured_order_item_type_fails_at_order_item_type_stage() {
    let app = TestApp::new().await;
    let store_id = seed_store(&app, "USD").await;
    product_variation_type::ActiveModel {
        id: Set("bare".to_string()),
        label: Set("No order item type".to_string()),
        order_item_type_id: Set(None),
    }
    .insert(&*app.db)
    .await
    .unwrap();
    product_type::ActiveModel {
        id: Set("default".to_string()),
        label: Set("Default".to_string()),
        variation_type_id: Set(Some("bare".to_string())),
    }
    .insert(&*app.db)
    .await
    .unwrap();
    let product_id = seed_product(&app, store_id, "default").await;
    let resolver = TypeResolver::new(app.db.clone());

    let err = resolver.resolve(product_id).await.unwrap_err();
    assert!(matches!(
        err,
        CheckoutError::Resolution(ResolutionStage::OrderItemType)
    ));
}

#[tokio::test]
async fn missing_order_type_row_fails_at_order_type_stage() {
    let app = TestApp::new().await;
    let fixture = {
        let store_id = seed_store(&app, "USD").await;
        seed_type_chain(&app).await;
        seed_product(&app, store_id, "default").await
    };

    // Point the order item type at an order type that has been deleted.
    order_item_type::ActiveModel {
        id: Set("default".to_string()),
        label: Set("Default order item type".to_string()),
        order_type_id: Set(Some("deleted".to_string())),
    }
    .update(&*app.db)
    .await
    .unwrap();

    let resolver = TypeResolver::new(app.db.clone());
    let err = resolver.resolve(fixture).await.unwrap_err();
    assert!(matches!(
        err,
        CheckoutError::Resolution(ResolutionStage::OrderType)
    ));
}

#[tokio::test]
async fn resolution_reflects_current_configuration() {
    // No caching: fixing the broken link makes the next call succeed.
    let app = TestApp::new().await;
    let store_id = seed_store(&app, "USD").await;
    let product_id = seed_product(&app, store_id, "default").await;
    let resolver = TypeResolver::new(app.db.clone());

    let err = resolver.resolve(product_id).await.unwrap_err();
    assert!(matches!(
        err,
        CheckoutError::Resolution(ResolutionStage::ProductType)
    ));

    seed_type_chain(&app).await;
    let chain = resolver.resolve(product_id).await.expect("chain now links");
    assert_eq!(chain.order_type.id, "default");
}
