//! Shared CRUD surface for Mongo-backed entities.
//!
//! Concrete repositories wrap a [`MongoRepository`] and express their
//! domain operations in terms of these few primitives instead of each
//! re-implementing lookups and updates.

use mongodb::bson::{doc, Document};
use mongodb::{Collection, Database};
use serde::de::DeserializeOwned;
use serde::Serialize;

use super::RepositoryError;

pub trait Entity: Serialize + DeserializeOwned + Unpin + Send + Sync + 'static {
    const COLLECTION: &'static str;
}

pub struct MongoRepository<T: Entity> {
    collection: Collection<T>,
}

impl<T: Entity> MongoRepository<T> {
    pub fn new(db: &Database) -> Self {
        Self {
            collection: db.collection::<T>(T::COLLECTION),
        }
    }

    pub async fn find_by_id(&self, id: &str) -> Result<Option<T>, RepositoryError> {
        self.find_one(doc! { "_id": id }).await
    }

    pub async fn find_one(&self, filter: Document) -> Result<Option<T>, RepositoryError> {
        Ok(self.collection.find_one(filter).await?)
    }

    /// Applies `update` (an update document such as `{"$set": ...}`) to the
    /// entity with `id`. Returns whether a document matched.
    pub async fn update_by_id(&self, id: &str, update: Document) -> Result<bool, RepositoryError> {
        let result = self.collection.update_one(doc! { "_id": id }, update).await?;
        Ok(result.matched_count > 0)
    }

    /// Applies `update` to the first document matching `filter`. Returns
    /// whether a document was modified.
    pub async fn update_where(
        &self,
        filter: Document,
        update: Document,
    ) -> Result<bool, RepositoryError> {
        let result = self.collection.update_one(filter, update).await?;
        Ok(result.modified_count > 0)
    }
}
