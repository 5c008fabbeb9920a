use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Payment gateway configuration. `weight` orders gateways for default
/// selection (lower first); `method_types` lists the stored payment method
/// types the gateway can instantiate, in declared order.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "payment_gateways")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub label: String,
    pub status: bool,
    pub weight: i32,
    pub supports_stored_methods: bool,
    #[sea_orm(column_type = "Json")]
    pub method_types: Json,
}

impl Model {
    /// Declared stored-method types, first entry first.
    pub fn method_type_ids(&self) -> Vec<String> {
        self.method_types
            .as_array()
            .map(|types| {
                types
                    .iter()
                    .filter_map(|t| t.as_str().map(str::to_owned))
                    .collect()
            })
            .unwrap_or_default()
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::payment_method::Entity")]
    PaymentMethods,
}

impl Related<super::payment_method::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::PaymentMethods.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
