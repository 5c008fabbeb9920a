use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Stored payment method. Owned by the customer; referenced, not owned, by
/// orders and payments.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "payment_methods")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub method_type: String,
    pub payment_gateway_id: String,
    pub customer_id: Uuid,
    pub billing_profile_id: Uuid,
    pub reusable: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::payment_gateway::Entity",
        from = "Column::PaymentGatewayId",
        to = "super::payment_gateway::Column::Id"
    )]
    PaymentGateway,
    #[sea_orm(
        belongs_to = "super::billing_profile::Entity",
        from = "Column::BillingProfileId",
        to = "super::billing_profile::Column::Id"
    )]
    BillingProfile,
}

impl Related<super::payment_gateway::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::PaymentGateway.def()
    }
}

impl Related<super::billing_profile::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::BillingProfile.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
