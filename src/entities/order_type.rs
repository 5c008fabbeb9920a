use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Order type record. `workflow` names the lifecycle applied to orders of
/// this type; the single-step flow only ever drives the `place` transition.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "order_types")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub label: String,
    pub workflow: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
