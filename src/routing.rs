//! Offer path registration table.
//!
//! Offers with an individual page claim a path; the table maps normalized
//! paths to offer ids and is rebuilt from storage whenever configuration
//! changes, rather than scanning offers per request.

use dashmap::DashMap;
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter};
use tracing::{info, warn};
use uuid::Uuid;

use crate::entities::{offer, Offer};
use crate::errors::CheckoutError;

/// Normalizes a configured page path: trims trailing slashes. Returns
/// `None` when the path does not start with "/".
pub fn normalize_path(path: &str) -> Option<String> {
    let trimmed = path.trim_end_matches('/');
    if !trimmed.starts_with('/') || trimmed.len() < 2 {
        return None;
    }
    Some(trimmed.to_owned())
}

/// Static `path -> offer id` table.
#[derive(Debug, Default)]
pub struct OfferRoutes {
    table: DashMap<String, Uuid>,
}

impl OfferRoutes {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuilds the table from the offers that enable an individual page.
    /// Entries with a malformed path are skipped and logged.
    pub async fn rebuild(&self, db: &DatabaseConnection) -> Result<(), CheckoutError> {
        let offers = Offer::find()
            .filter(offer::Column::IndividualPage.eq(true))
            .all(db)
            .await?;

        self.table.clear();
        for offer in offers {
            let Some(raw) = offer.page_path.as_deref() else {
                warn!(offer_id = %offer.id, "offer enables an individual page but has no path");
                continue;
            };
            match normalize_path(raw) {
                Some(path) => {
                    self.table.insert(path, offer.id);
                }
                None => {
                    warn!(offer_id = %offer.id, path = raw, "skipping offer with malformed path");
                }
            }
        }

        info!(routes = self.table.len(), "offer route table rebuilt");
        Ok(())
    }

    /// Pure lookup. Absence means the path is not handled by this flow.
    pub fn path_to_offer(&self, path: &str) -> Option<Uuid> {
        let normalized = normalize_path(path)?;
        self.table.get(&normalized).map(|entry| *entry.value())
    }
}
