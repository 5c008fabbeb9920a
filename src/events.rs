//! Domain events emitted by the checkout pipeline.
//!
//! Events are fire-and-forget notifications over a tokio mpsc channel; a
//! background task logs them. Event delivery failures never fail the
//! request that produced them.

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::errors::ResolutionStage;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Event {
    CartCreated {
        order_id: Uuid,
        order_type_id: String,
    },
    OrderPlaced {
        order_id: Uuid,
    },
    PaymentCaptured {
        payment_id: Uuid,
        order_id: Uuid,
    },
    CheckoutFailed {
        order_id: Option<Uuid>,
        stage: FailureStage,
    },
}

/// Pipeline stage a checkout failed in, for diagnostics.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum FailureStage {
    Resolution(ResolutionStage),
    GatewaySelection,
    PaymentExecution,
}

#[derive(Debug, Clone)]
pub struct EventSender {
    sender: mpsc::Sender<Event>,
}

impl EventSender {
    pub fn new(sender: mpsc::Sender<Event>) -> Self {
        Self { sender }
    }

    pub async fn send(&self, event: Event) -> Result<(), String> {
        self.sender
            .send(event)
            .await
            .map_err(|e| format!("failed to send event: {}", e))
    }

    /// Sends an event, logging instead of propagating a channel failure.
    pub async fn send_or_log(&self, event: Event) {
        if let Err(e) = self.send(event).await {
            warn!("event dropped: {}", e);
        }
    }
}

/// Background consumer for the event channel. Runs until every sender is
/// dropped.
pub async fn process_events(mut receiver: mpsc::Receiver<Event>) {
    while let Some(event) = receiver.recv().await {
        match &event {
            Event::CartCreated {
                order_id,
                order_type_id,
            } => info!(%order_id, %order_type_id, "cart created"),
            Event::OrderPlaced { order_id } => info!(%order_id, "order placed"),
            Event::PaymentCaptured {
                payment_id,
                order_id,
            } => info!(%payment_id, %order_id, "payment captured"),
            Event::CheckoutFailed { order_id, stage } => {
                error!(?order_id, ?stage, "checkout failed")
            }
        }
    }
    info!("event channel closed, processor exiting");
}
