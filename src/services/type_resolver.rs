use sea_orm::{DatabaseConnection, EntityTrait};
use std::sync::Arc;
use tracing::instrument;
use uuid::Uuid;

use crate::entities::{
    order_item_type, order_type, product_type, product_variation_type, OrderItemType, OrderType,
    Product, ProductType, ProductVariationType,
};
use crate::errors::{CheckoutError, ResolutionStage};

/// The four-type chain needed to create a valid order and line item for a
/// product. Derived, never persisted; all four fields resolve or the chain
/// is invalid.
#[derive(Debug, Clone)]
pub struct TypeChain {
    pub product_type: product_type::Model,
    pub variation_type: product_variation_type::Model,
    pub order_item_type: order_item_type::Model,
    pub order_type: order_type::Model,
}

/// Pure lookup/derivation of the type chain. Each call re-reads current
/// configuration, so upstream catalog edits take effect on the next
/// resolution; there is no caching and no retrying. A broken chain is a
/// configuration error, not transient.
#[derive(Clone)]
pub struct TypeResolver {
    db: Arc<DatabaseConnection>,
}

impl TypeResolver {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Resolves the full chain for `product_id`, failing with the first
    /// broken link tagged by its stage.
    #[instrument(skip(self))]
    pub async fn resolve(&self, product_id: Uuid) -> Result<TypeChain, CheckoutError> {
        let product = Product::find_by_id(product_id)
            .one(&*self.db)
            .await?
            .ok_or(CheckoutError::Resolution(ResolutionStage::Product))?;

        let product_type = ProductType::find_by_id(&product.product_type_id)
            .one(&*self.db)
            .await?
            .ok_or(CheckoutError::Resolution(ResolutionStage::ProductType))?;

        let variation_type_id = product_type
            .variation_type_id
            .as_deref()
            .ok_or(CheckoutError::Resolution(ResolutionStage::VariationType))?;
        let variation_type = ProductVariationType::find_by_id(variation_type_id)
            .one(&*self.db)
            .await?
            .ok_or(CheckoutError::Resolution(ResolutionStage::VariationType))?;

        let order_item_type_id = variation_type
            .order_item_type_id
            .as_deref()
            .ok_or(CheckoutError::Resolution(ResolutionStage::OrderItemType))?;
        let order_item_type = OrderItemType::find_by_id(order_item_type_id)
            .one(&*self.db)
            .await?
            .ok_or(CheckoutError::Resolution(ResolutionStage::OrderItemType))?;

        let order_type_id = order_item_type
            .order_type_id
            .as_deref()
            .ok_or(CheckoutError::Resolution(ResolutionStage::OrderType))?;
        let order_type = OrderType::find_by_id(order_type_id)
            .one(&*self.db)
            .await?
            .ok_or(CheckoutError::Resolution(ResolutionStage::OrderType))?;

        Ok(TypeChain {
            product_type,
            variation_type,
            order_item_type,
            order_type,
        })
    }
}
