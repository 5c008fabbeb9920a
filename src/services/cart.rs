use chrono::Utc;
use rand::Rng;
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set,
};
use std::sync::Arc;
use tracing::{info, instrument};
use uuid::Uuid;

use crate::entities::{order, store, Order, OrderState, Store};
use crate::errors::CheckoutError;
use crate::events::{Event, EventSender};

/// Get-or-create for the single draft cart keyed by
/// `(order_type_id, store_id, customer_id)`.
///
/// Absence of a cart is normal (first visit), not an error. The lookup and
/// the create are separate statements: two concurrent first-time requests
/// for the same key can both observe "not found" and both create a cart.
/// No atomic upsert is provided; sequential calls are idempotent.
#[derive(Clone)]
pub struct CartAcquirer {
    db: Arc<DatabaseConnection>,
    event_sender: EventSender,
}

impl CartAcquirer {
    pub fn new(db: Arc<DatabaseConnection>, event_sender: EventSender) -> Self {
        Self { db, event_sender }
    }

    /// Returns the existing draft cart for the key, creating one when
    /// absent. The new cart's currency comes from the store default.
    #[instrument(skip(self))]
    pub async fn acquire(
        &self,
        order_type_id: &str,
        store_id: Uuid,
        customer_id: Uuid,
    ) -> Result<order::Model, CheckoutError> {
        if let Some(cart) = self.find_cart(order_type_id, store_id, customer_id).await? {
            return Ok(cart);
        }

        self.create_cart(order_type_id, store_id, customer_id).await
    }

    async fn find_cart(
        &self,
        order_type_id: &str,
        store_id: Uuid,
        customer_id: Uuid,
    ) -> Result<Option<order::Model>, CheckoutError> {
        let cart = Order::find()
            .filter(order::Column::OrderTypeId.eq(order_type_id))
            .filter(order::Column::StoreId.eq(store_id))
            .filter(order::Column::CustomerId.eq(customer_id))
            .filter(order::Column::IsCart.eq(true))
            .filter(order::Column::State.eq(OrderState::Draft))
            .one(&*self.db)
            .await?;
        Ok(cart)
    }

    async fn create_cart(
        &self,
        order_type_id: &str,
        store_id: Uuid,
        customer_id: Uuid,
    ) -> Result<order::Model, CheckoutError> {
        let store = Store::find_by_id(store_id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| CheckoutError::NotFound(format!("store {} not found", store_id)))?;

        let order_id = Uuid::new_v4();
        let cart = order::ActiveModel {
            id: Set(order_id),
            order_number: Set(generate_order_number()),
            order_type_id: Set(order_type_id.to_owned()),
            store_id: Set(store_id),
            customer_id: Set(customer_id),
            email: Set(None),
            state: Set(OrderState::Draft),
            is_cart: Set(true),
            billing_profile_id: Set(None),
            payment_gateway_id: Set(None),
            payment_method_id: Set(None),
            total: Set(Decimal::ZERO),
            currency: Set(store.default_currency),
            placed_at: Set(None),
            created_at: Set(Utc::now()),
            updated_at: Set(Utc::now()),
        };

        let cart = cart.insert(&*self.db).await?;

        self.event_sender
            .send_or_log(Event::CartCreated {
                order_id,
                order_type_id: order_type_id.to_owned(),
            })
            .await;

        info!(%order_id, order_type_id, "created cart");
        Ok(cart)
    }
}

/// Looks up the store a cart belongs to, for currency and diagnostics.
pub async fn load_store(
    db: &DatabaseConnection,
    store_id: Uuid,
) -> Result<store::Model, CheckoutError> {
    Store::find_by_id(store_id)
        .one(db)
        .await?
        .ok_or_else(|| CheckoutError::NotFound(format!("store {} not found", store_id)))
}

fn generate_order_number() -> String {
    let suffix: u32 = rand::thread_rng().gen_range(0..1_000_000);
    format!("EC-{}-{:06}", Utc::now().format("%Y%m%d"), suffix)
}
