use async_trait::async_trait;
use mongodb::bson::{self, doc, Bson, DateTime};
use mongodb::Database;

use super::repository::MongoRepository;
use super::user_repository::UserRepository;
use super::RepositoryError;
use crate::models::user::{OnboardingUpdate, SubscriptionState, User};

pub struct MongoUserRepository {
    users: MongoRepository<User>,
}

impl MongoUserRepository {
    pub fn new(db: &Database) -> Self {
        Self {
            users: MongoRepository::new(db),
        }
    }
}

#[async_trait]
impl UserRepository for MongoUserRepository {
    async fn find_user_by_id(&self, user_id: &str) -> Result<Option<User>, RepositoryError> {
        self.users.find_by_id(user_id).await
    }

    async fn find_user_id_by_stripe_customer_id(
        &self,
        customer_id: &str,
    ) -> Result<Option<String>, RepositoryError> {
        let user = self
            .users
            .find_one(doc! { "stripe_customer_id": customer_id })
            .await?;
        Ok(user.map(|u| u.id))
    }

    async fn set_stripe_customer_id(
        &self,
        user_id: &str,
        customer_id: &str,
    ) -> Result<(), RepositoryError> {
        self.users
            .update_by_id(
                user_id,
                doc! { "$set": {
                    "stripe_customer_id": customer_id,
                    "updated_at": DateTime::now(),
                }},
            )
            .await?;
        Ok(())
    }

    async fn complete_onboarding(
        &self,
        user_id: &str,
        update: &OnboardingUpdate,
    ) -> Result<bool, RepositoryError> {
        self.users
            .update_by_id(
                user_id,
                doc! { "$set": {
                    "onboarding_completed": true,
                    "has_workspace": true,
                    "workspace_id": update.workspace_id.as_str(),
                    "selected_bundles": update.selected_bundles.clone(),
                    "last_payment_intent_id": update.payment_intent_id.as_str(),
                    "updated_at": DateTime::now(),
                }},
            )
            .await
    }

    async fn update_subscription(
        &self,
        user_id: &str,
        subscription: &SubscriptionState,
    ) -> Result<(), RepositoryError> {
        let subscription = bson::to_bson(subscription)?;
        self.users
            .update_by_id(
                user_id,
                doc! { "$set": {
                    "subscription": subscription,
                    "updated_at": DateTime::now(),
                }},
            )
            .await?;
        Ok(())
    }

    async fn set_billing_error(
        &self,
        user_id: &str,
        message: Option<&str>,
    ) -> Result<(), RepositoryError> {
        let value = message.map(Bson::from).unwrap_or(Bson::Null);
        self.users
            .update_by_id(
                user_id,
                doc! { "$set": {
                    "billing_error": value,
                    "updated_at": DateTime::now(),
                }},
            )
            .await?;
        Ok(())
    }
}
