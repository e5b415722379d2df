use async_trait::async_trait;

use super::RepositoryError;
use crate::models::user::{OnboardingUpdate, SubscriptionState, User};

#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn find_user_by_id(&self, user_id: &str) -> Result<Option<User>, RepositoryError>;

    async fn find_user_id_by_stripe_customer_id(
        &self,
        customer_id: &str,
    ) -> Result<Option<String>, RepositoryError>;

    async fn set_stripe_customer_id(
        &self,
        user_id: &str,
        customer_id: &str,
    ) -> Result<(), RepositoryError>;

    /// Overwrites the onboarding fields in a single update. Returns `false`
    /// when no user matched.
    async fn complete_onboarding(
        &self,
        user_id: &str,
        update: &OnboardingUpdate,
    ) -> Result<bool, RepositoryError>;

    async fn update_subscription(
        &self,
        user_id: &str,
        subscription: &SubscriptionState,
    ) -> Result<(), RepositoryError>;

    /// `None` clears any previously recorded billing error.
    async fn set_billing_error(
        &self,
        user_id: &str,
        message: Option<&str>,
    ) -> Result<(), RepositoryError>;
}
