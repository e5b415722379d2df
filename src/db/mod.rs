pub mod mongo_referral_repository;
pub mod mongo_user_repository;
pub mod mongo_webhook_event_repository;
pub mod referral_repository;
pub mod repository;
pub mod user_repository;
pub mod webhook_event_repository;

#[cfg(test)]
pub mod mock_db;

use mongodb::bson::doc;
use mongodb::options::IndexOptions;
use mongodb::{Database, IndexModel};
use thiserror::Error;
use tracing::info;

use crate::models::referral::REFERRAL_PROGRAMS_COLLECTION;
use crate::models::user::USERS_COLLECTION;
use crate::models::webhook_event::WEBHOOK_EVENTS_COLLECTION;

#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("database error: {0}")]
    Database(#[from] mongodb::error::Error),
    #[error("serialization error: {0}")]
    Serialization(String),
    #[error("repository unavailable: {0}")]
    Unavailable(String),
}

impl From<mongodb::bson::ser::Error> for RepositoryError {
    fn from(err: mongodb::bson::ser::Error) -> Self {
        RepositoryError::Serialization(err.to_string())
    }
}

/// Creates the indexes the billing flow relies on. Safe to run on every start.
pub async fn ensure_indexes(db: &Database) -> Result<(), RepositoryError> {
    db.collection::<mongodb::bson::Document>(WEBHOOK_EVENTS_COLLECTION)
        .create_index(
            IndexModel::builder()
                .keys(doc! { "event_id": 1 })
                .options(IndexOptions::builder().unique(true).build())
                .build(),
        )
        .await?;

    db.collection::<mongodb::bson::Document>(USERS_COLLECTION)
        .create_index(
            IndexModel::builder()
                .keys(doc! { "stripe_customer_id": 1 })
                .options(IndexOptions::builder().sparse(true).build())
                .build(),
        )
        .await?;

    db.collection::<mongodb::bson::Document>(REFERRAL_PROGRAMS_COLLECTION)
        .create_index(
            IndexModel::builder()
                .keys(doc! { "code": 1 })
                .options(IndexOptions::builder().unique(true).build())
                .build(),
        )
        .await?;

    info!("database indexes ensured");
    Ok(())
}
