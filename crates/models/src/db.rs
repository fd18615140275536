use std::time::Duration;

use bson::doc;
use configs::DatabaseConfig;
use mongodb::{
    options::{ClientOptions, IndexOptions},
    Client, Collection, IndexModel,
};
use tracing::info;

use crate::customer::Customer;
use crate::errors::ModelError;

const APP_NAME: &str = "customer-api";

/// Handle to the customer collection plus the client that owns its pool.
#[derive(Clone, Debug)]
pub struct Store {
    pub client: Client,
    pub customers: Collection<Customer>,
}

/// Connect to MongoDB and verify reachability with a `ping`.
///
/// The driver pools connections internally; clone the returned [`Store`]
/// instead of connecting again.
pub async fn connect(cfg: &DatabaseConfig) -> Result<Store, ModelError> {
    let mut opts = ClientOptions::parse(&cfg.url).await?;
    let timeout = Duration::from_secs(cfg.connect_timeout_secs);
    opts.connect_timeout = Some(timeout);
    opts.server_selection_timeout = Some(timeout);
    opts.app_name = Some(APP_NAME.to_string());

    let client = Client::with_options(opts)?;
    let db = client.database(&cfg.name);
    db.run_command(doc! { "ping": 1 }).await?;
    info!(database = %cfg.name, collection = %cfg.collection, "mongodb connected");

    let customers = db.collection::<Customer>(&cfg.collection);
    Ok(Store { client, customers })
}

/// Create the indexes the customer contract relies on. Idempotent.
///
/// - `email` is unique across all customers.
/// - `verification_token` is unique among documents that still carry one.
pub async fn ensure_indexes(customers: &Collection<Customer>) -> Result<(), ModelError> {
    let email = IndexModel::builder()
        .keys(doc! { "email": 1 })
        .options(
            IndexOptions::builder()
                .unique(true)
                .name("email_unique".to_string())
                .build(),
        )
        .build();
    let token = IndexModel::builder()
        .keys(doc! { "verification_token": 1 })
        .options(
            IndexOptions::builder()
                .unique(true)
                .partial_filter_expression(doc! { "verification_token": { "$type": "string" } })
                .name("verification_token_unique".to_string())
                .build(),
        )
        .build();
    customers.create_indexes([email, token]).await?;
    info!(collection = %customers.name(), "customer indexes ensured");
    Ok(())
}
