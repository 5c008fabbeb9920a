use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Order aggregate. While `state` is `Draft` and `is_cart` is set, the row
/// is the customer's cart for its `(order_type_id, store_id, customer_id)`
/// triple; placement is terminal and clears `is_cart`.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "orders")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub order_number: String,
    pub order_type_id: String,
    pub store_id: Uuid,
    pub customer_id: Uuid,
    #[sea_orm(nullable)]
    pub email: Option<String>,
    pub state: OrderState,
    pub is_cart: bool,
    #[sea_orm(nullable)]
    pub billing_profile_id: Option<Uuid>,
    #[sea_orm(nullable)]
    pub payment_gateway_id: Option<String>,
    #[sea_orm(nullable)]
    pub payment_method_id: Option<Uuid>,
    #[sea_orm(column_type = "Decimal(Some((16, 4)))")]
    pub total: Decimal,
    pub currency: String,
    #[sea_orm(nullable)]
    pub placed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::order_item::Entity")]
    OrderItems,
    #[sea_orm(
        belongs_to = "super::store::Entity",
        from = "Column::StoreId",
        to = "super::store::Column::Id"
    )]
    Store,
}

impl Related<super::order_item::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::OrderItems.def()
    }
}

impl Related<super::store::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Store.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

/// Order lifecycle state. The single-step flow models exactly two states;
/// the transition rules live in [`crate::workflow`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, EnumIter, DeriveActiveEnum)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(20))")]
pub enum OrderState {
    #[sea_orm(string_value = "draft")]
    Draft,
    #[sea_orm(string_value = "placed")]
    Placed,
}
