use chrono::Utc;
use sea_orm::{ActiveModelTrait, DatabaseConnection, EntityTrait, Set};
use std::sync::Arc;
use tracing::{info, instrument};
use uuid::Uuid;

use crate::entities::{
    billing_profile, order, payment_gateway, payment_method, BillingProfile,
};
use crate::errors::CheckoutError;

/// A payment method built during form preparation but not yet persisted.
/// It is inserted only when the customer's submission confirms the "new
/// method" option.
#[derive(Debug, Clone)]
pub struct PreparedPaymentMethod {
    pub method: payment_method::Model,
    pub billing_profile: billing_profile::Model,
}

/// Ensures a billing profile and an unsaved payment method exist when the
/// selected gateway requires a stored payment method. No-op otherwise.
#[derive(Clone)]
pub struct PaymentMethodProvisioner {
    db: Arc<DatabaseConnection>,
}

impl PaymentMethodProvisioner {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Returns `None` when the gateway has no stored-method support;
    /// downstream completion then expects a previously-selected stored
    /// method reference instead.
    #[instrument(skip(self, order, gateway), fields(order_id = %order.id, gateway_id = %gateway.id))]
    pub async fn provision(
        &self,
        order: &order::Model,
        gateway: &payment_gateway::Model,
    ) -> Result<Option<PreparedPaymentMethod>, CheckoutError> {
        if !gateway.supports_stored_methods {
            return Ok(None);
        }

        let billing_profile = self.ensure_billing_profile(order).await?;

        // The first declared method type is the default to instantiate; no
        // further ranking.
        let method_type = gateway.method_type_ids().into_iter().next().ok_or_else(|| {
            CheckoutError::Validation(format!(
                "gateway {} supports stored methods but declares no method types",
                gateway.id
            ))
        })?;

        let method = payment_method::Model {
            id: Uuid::new_v4(),
            method_type,
            payment_gateway_id: gateway.id.clone(),
            customer_id: order.customer_id,
            billing_profile_id: billing_profile.id,
            reusable: true,
            created_at: Utc::now(),
        };

        Ok(Some(PreparedPaymentMethod {
            method,
            billing_profile,
        }))
    }

    /// Reuses the order's billing profile; creates and persists a minimal
    /// one owned by the order's customer when absent.
    async fn ensure_billing_profile(
        &self,
        order: &order::Model,
    ) -> Result<billing_profile::Model, CheckoutError> {
        if let Some(profile_id) = order.billing_profile_id {
            if let Some(profile) = BillingProfile::find_by_id(profile_id).one(&*self.db).await? {
                return Ok(profile);
            }
        }

        let profile = billing_profile::ActiveModel {
            id: Set(Uuid::new_v4()),
            customer_id: Set(order.customer_id),
            address: Set(None),
            created_at: Set(Utc::now()),
        };
        let profile = profile.insert(&*self.db).await?;
        info!(profile_id = %profile.id, customer_id = %order.customer_id, "created billing profile");
        Ok(profile)
    }
}
