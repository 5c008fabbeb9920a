use sea_orm::{
    sea_query::TableCreateStatement, ConnectOptions, ConnectionTrait, Database,
    DatabaseConnection, DbErr, Schema,
};
use std::time::Duration;
use tracing::info;

use crate::entities;

/// Type alias for the shared connection pool.
pub type DbPool = DatabaseConnection;

/// Establishes a connection pool to the database.
pub async fn establish_connection(database_url: &str) -> Result<DbPool, DbErr> {
    let mut opts = ConnectOptions::new(database_url.to_owned());
    opts.max_connections(10)
        .min_connections(1)
        .connect_timeout(Duration::from_secs(30))
        .idle_timeout(Duration::from_secs(600))
        .sqlx_logging(false);

    let conn = Database::connect(opts).await?;
    info!("database connection established");
    Ok(conn)
}

/// Creates any missing tables from the entity definitions. Used for
/// development and test bootstrap; production schemas are managed
/// externally.
pub async fn create_schema(db: &DatabaseConnection) -> Result<(), DbErr> {
    let backend = db.get_database_backend();
    let schema = Schema::new(backend);

    let mut statements: Vec<TableCreateStatement> = vec![
        schema.create_table_from_entity(entities::Store),
        schema.create_table_from_entity(entities::Product),
        schema.create_table_from_entity(entities::ProductType),
        schema.create_table_from_entity(entities::ProductVariationType),
        schema.create_table_from_entity(entities::OrderItemType),
        schema.create_table_from_entity(entities::OrderType),
        schema.create_table_from_entity(entities::ProductVariation),
        schema.create_table_from_entity(entities::Offer),
        schema.create_table_from_entity(entities::Order),
        schema.create_table_from_entity(entities::OrderItem),
        schema.create_table_from_entity(entities::PaymentGateway),
        schema.create_table_from_entity(entities::BillingProfile),
        schema.create_table_from_entity(entities::PaymentMethod),
        schema.create_table_from_entity(entities::Payment),
    ];

    for statement in &mut statements {
        statement.if_not_exists();
        db.execute(backend.build(&*statement)).await?;
    }

    info!("schema ready");
    Ok(())
}
