use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{instrument, warn};
use uuid::Uuid;

use crate::entities::{
    offer, order, order_item, product_variation, ProductVariation,
};
use crate::errors::CheckoutError;
use crate::events::{Event, EventSender, FailureStage};
use crate::services::cart::CartAcquirer;
use crate::services::completer::PaymentCompleter;
use crate::services::gateway::{PaymentGatewaySelector, PaymentOptions};
use crate::services::provisioner::PaymentMethodProvisioner;
use crate::services::type_resolver::TypeResolver;

/// Sentinel value for the amount field: the customer chose to enter a
/// custom amount in the separate field.
pub const OTHER_AMOUNT_SENTINEL: &str = "other";

/// Identity of the purchasing customer, supplied by the caller's auth
/// layer.
#[derive(Debug, Clone)]
pub struct CustomerContext {
    pub id: Uuid,
    pub email: String,
}

/// Everything the presentation layer needs to render the purchase form.
#[derive(Debug, Clone, Serialize)]
pub struct CheckoutForm {
    pub order_id: Uuid,
    pub offer_label: String,
    pub variations: Vec<product_variation::Model>,
    pub payment_options: PaymentOptions,
    /// Set when the default option requires collecting new payment method
    /// details on the form.
    pub collects_new_method: bool,
}

/// Values posted from the purchase form.
#[derive(Debug, Clone, Deserialize)]
pub struct SubmitValues {
    pub variation_id: Uuid,
    pub payment_option_id: String,
    /// Either a decimal amount or the `"other"` sentinel.
    pub amount: String,
    /// The custom amount, read only when `amount` is the sentinel.
    pub amount_other: Option<Decimal>,
}

impl SubmitValues {
    /// The effective payment amount: the submitted value, or the custom
    /// amount when the sentinel was submitted. Zero and negative amounts
    /// are rejected.
    pub fn resolve_amount(&self) -> Result<Decimal, CheckoutError> {
        let amount = if self.amount == OTHER_AMOUNT_SENTINEL {
            self.amount_other.ok_or_else(|| {
                CheckoutError::Validation("a custom amount is required".to_string())
            })?
        } else {
            self.amount.parse::<Decimal>().map_err(|_| {
                CheckoutError::Validation(format!("invalid amount '{}'", self.amount))
            })?
        };
        if amount <= Decimal::ZERO {
            return Err(CheckoutError::Validation(format!(
                "amount must be positive, got {}",
                amount
            )));
        }
        Ok(amount)
    }
}

/// Sequences the pipeline for one offer: resolve types, acquire the cart,
/// select gateways and provision a method for rendering, and complete the
/// payment on submission. The only component the presentation layer calls,
/// and the only place deciding user-facing messaging versus operator
/// logging.
#[derive(Clone)]
pub struct CheckoutOrchestrator {
    db: Arc<DatabaseConnection>,
    resolver: TypeResolver,
    cart: CartAcquirer,
    selector: PaymentGatewaySelector,
    provisioner: PaymentMethodProvisioner,
    completer: PaymentCompleter,
    event_sender: EventSender,
}

impl CheckoutOrchestrator {
    pub fn new(
        db: Arc<DatabaseConnection>,
        resolver: TypeResolver,
        cart: CartAcquirer,
        selector: PaymentGatewaySelector,
        provisioner: PaymentMethodProvisioner,
        completer: PaymentCompleter,
        event_sender: EventSender,
    ) -> Self {
        Self {
            db,
            resolver,
            cart,
            selector,
            provisioner,
            completer,
            event_sender,
        }
    }

    /// Render path: everything needed to present the purchase form for an
    /// offer. Provisions an unsaved payment method when the default
    /// gateway stores methods.
    #[instrument(skip(self, offer, customer), fields(offer_id = %offer.id))]
    pub async fn prepare(
        &self,
        offer: &offer::Model,
        customer: &CustomerContext,
    ) -> Result<CheckoutForm, CheckoutError> {
        let (order, _, options) = self.acquire_with_options(offer, customer).await?;

        let default = options.default_option().clone();
        let gateway = crate::entities::PaymentGateway::find_by_id(&default.gateway_id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| CheckoutError::GatewayGone(default.gateway_id.clone()))?;
        let prepared = self.provisioner.provision(&order, &gateway).await?;

        let variations = ProductVariation::find()
            .filter(product_variation::Column::ProductId.eq(offer.product_id))
            .filter(product_variation::Column::Active.eq(true))
            .order_by_asc(product_variation::Column::Position)
            .all(&*self.db)
            .await?;

        Ok(CheckoutForm {
            order_id: order.id,
            offer_label: offer.label.clone(),
            variations,
            payment_options: options,
            collects_new_method: prepared.is_some(),
        })
    }

    /// Submission path: adds the purchased line item, sets the order email
    /// from the current customer, and completes the payment. Any stage
    /// error short-circuits the rest.
    #[instrument(skip(self, offer, customer, values), fields(offer_id = %offer.id))]
    pub async fn submit(
        &self,
        offer: &offer::Model,
        customer: &CustomerContext,
        values: &SubmitValues,
    ) -> Result<order::Model, CheckoutError> {
        let (mut order, chain, options) = self.acquire_with_options(offer, customer).await?;

        let selected = options.find(&values.payment_option_id).ok_or_else(|| {
            CheckoutError::Validation(format!(
                "unknown payment option '{}'",
                values.payment_option_id
            ))
        })?;

        let variation = ProductVariation::find_by_id(values.variation_id)
            .one(&*self.db)
            .await?
            .filter(|v| v.product_id == offer.product_id)
            .ok_or_else(|| {
                CheckoutError::Validation(format!(
                    "variation {} does not belong to this offer",
                    values.variation_id
                ))
            })?;

        // Provision only when the chosen option actually instantiates a
        // new method; reusing a stored method needs no fresh billing
        // profile.
        let prepared = if selected.method_type.is_some() {
            let gateway = crate::entities::PaymentGateway::find_by_id(&selected.gateway_id)
                .one(&*self.db)
                .await?
                .ok_or_else(|| CheckoutError::GatewayGone(selected.gateway_id.clone()))?;
            self.provisioner.provision(&order, &gateway).await?
        } else {
            None
        };

        // Title and unit price are copied from the chosen variation.
        let pending_item = order_item::ActiveModel {
            id: Set(Uuid::new_v4()),
            order_id: Set(order.id),
            order_item_type_id: Set(chain.order_item_type.id.clone()),
            variation_id: Set(variation.id),
            title: Set(variation.title.clone()),
            unit_price: Set(variation.price),
            quantity: Set(1),
            total: Set(variation.price),
            created_at: Set(Utc::now()),
        };

        order.email = Some(customer.email.clone());
        order.total = variation.price;

        self.completer
            .complete(order, &options, prepared, Some(pending_item), values)
            .await
    }

    /// Shared head of both paths: resolve the chain, acquire the cart, and
    /// select payment options.
    async fn acquire_with_options(
        &self,
        offer: &offer::Model,
        customer: &CustomerContext,
    ) -> Result<
        (
            order::Model,
            crate::services::type_resolver::TypeChain,
            PaymentOptions,
        ),
        CheckoutError,
    > {
        let chain = match self.resolver.resolve(offer.product_id).await {
            Ok(chain) => chain,
            Err(e) => {
                if let CheckoutError::Resolution(stage) = &e {
                    warn!(offer_id = %offer.id, product_id = %offer.product_id, %stage,
                        "offer unavailable, type chain broken");
                    self.event_sender
                        .send_or_log(Event::CheckoutFailed {
                            order_id: None,
                            stage: FailureStage::Resolution(*stage),
                        })
                        .await;
                }
                return Err(e);
            }
        };

        let store_id = self.store_for_product(offer.product_id).await?;
        let order = self
            .cart
            .acquire(&chain.order_type.id, store_id, customer.id)
            .await?;

        let options = match self.selector.select_options(&order).await {
            Ok(options) => options,
            Err(e) => {
                if matches!(e, CheckoutError::NoEligibleGateways(_)) {
                    self.event_sender
                        .send_or_log(Event::CheckoutFailed {
                            order_id: Some(order.id),
                            stage: FailureStage::GatewaySelection,
                        })
                        .await;
                }
                return Err(e);
            }
        };
        Ok((order, chain, options))
    }

    async fn store_for_product(&self, product_id: Uuid) -> Result<Uuid, CheckoutError> {
        let product = crate::entities::Product::find_by_id(product_id)
            .one(&*self.db)
            .await?
            .ok_or(CheckoutError::Resolution(
                crate::errors::ResolutionStage::Product,
            ))?;
        Ok(product.store_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn values(amount: &str, amount_other: Option<Decimal>) -> SubmitValues {
        SubmitValues {
            variation_id: Uuid::new_v4(),
            payment_option_id: "manual".to_string(),
            amount: amount.to_string(),
            amount_other,
        }
    }

    #[test]
    fn plain_amount_parses() {
        assert_eq!(values("25.00", None).resolve_amount().unwrap(), dec!(25.00));
    }

    #[test]
    fn sentinel_reads_the_custom_amount() {
        let v = values(OTHER_AMOUNT_SENTINEL, Some(dec!(42.50)));
        assert_eq!(v.resolve_amount().unwrap(), dec!(42.50));
    }

    #[test]
    fn sentinel_without_custom_amount_is_rejected() {
        let err = values(OTHER_AMOUNT_SENTINEL, None).resolve_amount().unwrap_err();
        assert!(matches!(err, CheckoutError::Validation(_)));
    }

    #[test]
    fn non_positive_amounts_are_rejected() {
        for bad in ["0", "0.00", "-25.00"] {
            let err = values(bad, None).resolve_amount().unwrap_err();
            assert!(matches!(err, CheckoutError::Validation(_)), "amount {}", bad);
        }
        let err = values(OTHER_AMOUNT_SENTINEL, Some(dec!(-1.00)))
            .resolve_amount()
            .unwrap_err();
        assert!(matches!(err, CheckoutError::Validation(_)));
    }

    #[test]
    fn garbage_amounts_are_rejected() {
        let err = values("not-a-number", None).resolve_amount().unwrap_err();
        assert!(matches!(err, CheckoutError::Validation(_)));
    }
}
