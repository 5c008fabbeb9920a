use async_trait::async_trait;
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{error, instrument};
use uuid::Uuid;

use crate::entities::{
    order, payment_gateway, payment_method, PaymentGateway, PaymentMethod,
};
use crate::errors::CheckoutError;

/// Option id prefix for "add a new stored method" options.
pub const NEW_METHOD_OPTION_PREFIX: &str = "new--";

/// Eligibility filter for payment gateways. Gateway condition plugins are
/// external collaborators; implementations only see the gateway and the
/// order and answer yes or no.
#[async_trait]
pub trait GatewayConditions: Send + Sync {
    async fn eligible(&self, gateway: &payment_gateway::Model, order: &order::Model) -> bool;
}

/// Default conditions: every enabled gateway is eligible for every order.
#[derive(Debug, Default, Clone)]
pub struct EnabledGateways;

#[async_trait]
impl GatewayConditions for EnabledGateways {
    async fn eligible(&self, _gateway: &payment_gateway::Model, _order: &order::Model) -> bool {
        true
    }
}

/// A per-request payment candidate. Never persisted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentOption {
    /// Stable id the submitted form refers back to.
    pub id: String,
    pub label: String,
    pub gateway_id: String,
    /// Present for options that reuse an existing stored method.
    pub payment_method_id: Option<Uuid>,
    /// Present for "new method" options: the method type to instantiate.
    pub method_type: Option<String>,
}

/// The options offered for an order plus the preselected default. The
/// default is always a member of `options`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentOptions {
    pub options: Vec<PaymentOption>,
    pub default_id: String,
}

impl PaymentOptions {
    pub fn find(&self, option_id: &str) -> Option<&PaymentOption> {
        self.options.iter().find(|o| o.id == option_id)
    }

    pub fn default_option(&self) -> &PaymentOption {
        // Construction guarantees membership.
        self.options
            .iter()
            .find(|o| o.id == self.default_id)
            .unwrap_or(&self.options[0])
    }
}

/// Loads the gateways eligible for an order and builds the payment options
/// offered on the purchase form.
#[derive(Clone)]
pub struct PaymentGatewaySelector {
    db: Arc<DatabaseConnection>,
    conditions: Arc<dyn GatewayConditions>,
}

impl PaymentGatewaySelector {
    pub fn new(db: Arc<DatabaseConnection>, conditions: Arc<dyn GatewayConditions>) -> Self {
        Self { db, conditions }
    }

    /// Builds one option per eligible gateway and, for stored-method
    /// gateways, one option per reusable stored method owned by the
    /// order's customer plus one "new method" option.
    ///
    /// An empty eligible set is a terminal, user-visible failure for the
    /// request; the specific reason is logged with the order id while the
    /// user sees a generic message.
    #[instrument(skip(self, order), fields(order_id = %order.id))]
    pub async fn select_options(
        &self,
        order: &order::Model,
    ) -> Result<PaymentOptions, CheckoutError> {
        let gateways = self.load_eligible(order).await?;
        if gateways.is_empty() {
            error!(order_id = %order.id, "no payment gateways available for order form");
            return Err(CheckoutError::NoEligibleGateways(order.id));
        }

        let mut options = Vec::new();
        for gateway in &gateways {
            if gateway.supports_stored_methods {
                let stored = PaymentMethod::find()
                    .filter(payment_method::Column::PaymentGatewayId.eq(&gateway.id))
                    .filter(payment_method::Column::CustomerId.eq(order.customer_id))
                    .filter(payment_method::Column::Reusable.eq(true))
                    .all(&*self.db)
                    .await?;

                for method in &stored {
                    options.push(PaymentOption {
                        id: method.id.to_string(),
                        label: format!("{} ({})", gateway.label, method.method_type),
                        gateway_id: gateway.id.clone(),
                        payment_method_id: Some(method.id),
                        method_type: None,
                    });
                }

                if let Some(first_type) = gateway.method_type_ids().first() {
                    options.push(PaymentOption {
                        id: format!("{}{}--{}", NEW_METHOD_OPTION_PREFIX, first_type, gateway.id),
                        label: format!("New {} via {}", first_type, gateway.label),
                        gateway_id: gateway.id.clone(),
                        payment_method_id: None,
                        method_type: Some(first_type.clone()),
                    });
                }
            } else {
                options.push(PaymentOption {
                    id: gateway.id.clone(),
                    label: gateway.label.clone(),
                    gateway_id: gateway.id.clone(),
                    payment_method_id: None,
                    method_type: None,
                });
            }
        }

        // A stored-method gateway that declares no method types and has no
        // stored methods contributes nothing; an all-empty result is the
        // same terminal failure as no eligible gateways.
        if options.is_empty() {
            error!(order_id = %order.id, "eligible gateways produced no payment options");
            return Err(CheckoutError::NoEligibleGateways(order.id));
        }

        let default_id = self.select_default(order, &options);
        Ok(PaymentOptions {
            options,
            default_id,
        })
    }

    /// Enabled gateways ordered by weight, filtered through the injected
    /// conditions collaborator.
    async fn load_eligible(
        &self,
        order: &order::Model,
    ) -> Result<Vec<payment_gateway::Model>, CheckoutError> {
        let enabled = PaymentGateway::find()
            .filter(payment_gateway::Column::Status.eq(true))
            .order_by_asc(payment_gateway::Column::Weight)
            .all(&*self.db)
            .await?;

        let mut eligible = Vec::with_capacity(enabled.len());
        for gateway in enabled {
            if self.conditions.eligible(&gateway, order).await {
                eligible.push(gateway);
            }
        }
        Ok(eligible)
    }

    /// Preselects the default option: the order's already-referenced
    /// stored method when it is among the options, otherwise the first
    /// option of the highest-priority gateway.
    fn select_default(&self, order: &order::Model, options: &[PaymentOption]) -> String {
        if let Some(method_id) = order.payment_method_id {
            if let Some(option) = options
                .iter()
                .find(|o| o.payment_method_id == Some(method_id))
            {
                return option.id.clone();
            }
        }
        options[0].id.clone()
    }
}
