use async_trait::async_trait;
use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::{ActiveModelTrait, DatabaseConnection, EntityTrait, Set, TransactionTrait};
use std::sync::Arc;
use tracing::{error, info, instrument};
use uuid::Uuid;

use crate::entities::{
    order, order_item, payment, payment_gateway, payment_method, PaymentGateway, PaymentMethod,
    PaymentState,
};
use crate::errors::CheckoutError;
use crate::events::{Event, EventSender};
use crate::services::cart::load_store;
use crate::services::gateway::PaymentOptions;
use crate::services::orchestrator::SubmitValues;
use crate::services::provisioner::PreparedPaymentMethod;
use crate::workflow::{self, Transition};

/// What the gateway is asked to charge.
#[derive(Debug, Clone)]
pub struct PaymentRequest {
    pub order_id: Uuid,
    pub amount: Decimal,
    pub currency: String,
    pub payment_method_id: Option<Uuid>,
}

/// Successful gateway execution result.
#[derive(Debug, Clone)]
pub struct PaymentReceipt {
    pub remote_id: String,
}

/// The gateway execution contract. Retry semantics belong to the
/// implementation, never to the pipeline; a returned error is terminal for
/// the request.
#[async_trait]
pub trait PaymentExecutor: Send + Sync {
    async fn execute(
        &self,
        gateway: &payment_gateway::Model,
        request: &PaymentRequest,
    ) -> Result<PaymentReceipt, CheckoutError>;
}

/// Executor for manually-captured gateways: approves every charge and
/// issues a local receipt id.
#[derive(Debug, Default, Clone)]
pub struct ManualGateway;

#[async_trait]
impl PaymentExecutor for ManualGateway {
    async fn execute(
        &self,
        gateway: &payment_gateway::Model,
        request: &PaymentRequest,
    ) -> Result<PaymentReceipt, CheckoutError> {
        info!(gateway_id = %gateway.id, order_id = %request.order_id, amount = %request.amount,
            "manual gateway approved payment");
        Ok(PaymentReceipt {
            remote_id: format!("manual-{}", Uuid::new_v4()),
        })
    }
}

/// Drives a draft order to `placed`: resolves the chosen payment option,
/// attaches gateway and method to the order, executes the payment, and
/// applies the `place` transition.
///
/// The order row, the payment row, and the pending line item are only ever
/// persisted after a successful gateway execution, in one transaction. A
/// failed execution leaves the order in draft with nothing committed.
#[derive(Clone)]
pub struct PaymentCompleter {
    db: Arc<DatabaseConnection>,
    executor: Arc<dyn PaymentExecutor>,
    event_sender: EventSender,
}

impl PaymentCompleter {
    pub fn new(
        db: Arc<DatabaseConnection>,
        executor: Arc<dyn PaymentExecutor>,
        event_sender: EventSender,
    ) -> Self {
        Self {
            db,
            executor,
            event_sender,
        }
    }

    #[instrument(skip_all, fields(order_id = %order.id))]
    pub async fn complete(
        &self,
        mut order: order::Model,
        options: &PaymentOptions,
        prepared: Option<PreparedPaymentMethod>,
        pending_item: Option<order_item::ActiveModel>,
        values: &SubmitValues,
    ) -> Result<order::Model, CheckoutError> {
        let option = options.find(&values.payment_option_id).ok_or_else(|| {
            CheckoutError::Validation(format!(
                "unknown payment option '{}'",
                values.payment_option_id
            ))
        })?;

        // The gateway may have been deleted between render and submit.
        let gateway = PaymentGateway::find_by_id(&option.gateway_id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| CheckoutError::GatewayGone(option.gateway_id.clone()))?;

        let method = if gateway.supports_stored_methods {
            let method = self.resolve_method(option, prepared).await?;
            order.payment_gateway_id = Some(gateway.id.clone());
            order.payment_method_id = Some(method.id);
            // The order's own billing profile field is not collected in
            // this flow; it mirrors the payment method's profile.
            order.billing_profile_id = Some(method.billing_profile_id);
            Some(method)
        } else {
            order.payment_gateway_id = Some(gateway.id.clone());
            None
        };

        let store = load_store(&self.db, order.store_id).await?;
        let amount = values.resolve_amount()?;
        let request = PaymentRequest {
            order_id: order.id,
            amount,
            currency: store.default_currency.clone(),
            payment_method_id: method.as_ref().map(|m| m.id),
        };

        let receipt = match self.executor.execute(&gateway, &request).await {
            Ok(receipt) => receipt,
            Err(e) => {
                error!(order_id = %order.id, gateway_id = %gateway.id, error = %e,
                    "payment execution failed, order left in draft");
                self.event_sender
                    .send_or_log(Event::CheckoutFailed {
                        order_id: Some(order.id),
                        stage: crate::events::FailureStage::PaymentExecution,
                    })
                    .await;
                return Err(e);
            }
        };

        // A workflow that does not permit placing from the current state
        // is a configuration invariant violation; abort loudly.
        let placed_state = workflow::apply(order.state, Transition::Place).map_err(|e| {
            error!(order_id = %order.id, error = %e, "order workflow violation");
            CheckoutError::from(e)
        })?;

        let payment_id = Uuid::new_v4();
        let txn = self.db.begin().await?;

        let payment_row = payment::ActiveModel {
            id: Set(payment_id),
            payment_gateway_id: Set(gateway.id.clone()),
            payment_method_id: Set(method.as_ref().map(|m| m.id)),
            order_id: Set(order.id),
            amount: Set(amount),
            currency: Set(store.default_currency.clone()),
            state: Set(PaymentState::Completed),
            remote_id: Set(Some(receipt.remote_id)),
            created_at: Set(Utc::now()),
        };
        payment_row.insert(&txn).await?;

        if let Some(item) = pending_item {
            item.insert(&txn).await?;
        }

        let mut update: order::ActiveModel = order.clone().into();
        update.email = Set(order.email.clone());
        update.state = Set(placed_state);
        update.is_cart = Set(false);
        update.billing_profile_id = Set(order.billing_profile_id);
        update.payment_gateway_id = Set(order.payment_gateway_id.clone());
        update.payment_method_id = Set(order.payment_method_id);
        update.total = Set(order.total);
        update.placed_at = Set(Some(Utc::now()));
        update.updated_at = Set(Utc::now());
        let placed = update.update(&txn).await?;

        txn.commit().await?;

        self.event_sender
            .send_or_log(Event::PaymentCaptured {
                payment_id,
                order_id: placed.id,
            })
            .await;
        self.event_sender
            .send_or_log(Event::OrderPlaced {
                order_id: placed.id,
            })
            .await;

        info!(order_id = %placed.id, %payment_id, amount = %amount, "order placed");
        Ok(placed)
    }

    /// For stored-method gateways: a "new method" option persists the
    /// method prepared during provisioning; otherwise the referenced
    /// stored method is loaded by id.
    async fn resolve_method(
        &self,
        option: &crate::services::gateway::PaymentOption,
        prepared: Option<PreparedPaymentMethod>,
    ) -> Result<payment_method::Model, CheckoutError> {
        if option.method_type.is_some() {
            let prepared = prepared.ok_or_else(|| {
                CheckoutError::Validation(
                    "payment option requires a new method but none was provisioned".to_string(),
                )
            })?;
            let model = prepared.method;
            let row = payment_method::ActiveModel {
                id: Set(model.id),
                method_type: Set(model.method_type.clone()),
                payment_gateway_id: Set(model.payment_gateway_id.clone()),
                customer_id: Set(model.customer_id),
                billing_profile_id: Set(model.billing_profile_id),
                reusable: Set(model.reusable),
                created_at: Set(model.created_at),
            };
            Ok(row.insert(&*self.db).await?)
        } else {
            let method_id = option.payment_method_id.ok_or_else(|| {
                CheckoutError::Validation(format!(
                    "payment option '{}' references no stored method",
                    option.id
                ))
            })?;
            PaymentMethod::find_by_id(method_id)
                .one(&*self.db)
                .await?
                .ok_or_else(|| {
                    CheckoutError::NotFound(format!("payment method {} not found", method_id))
                })
        }
    }
}
