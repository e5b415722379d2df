use crate::config::Config;
use crate::db::{
    referral_repository::ReferralRepository, user_repository::UserRepository,
    webhook_event_repository::WebhookEventRepository,
};
use crate::services::stripe::StripeService;
use crate::utils::jwt::{JwtKeyProvider, JwtKeys};
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub users: Arc<dyn UserRepository>,
    pub webhook_events: Arc<dyn WebhookEventRepository>,
    pub referrals: Arc<dyn ReferralRepository>,
    pub stripe: Arc<dyn StripeService>,
    pub config: Arc<Config>,
    pub jwt_keys: Arc<JwtKeys>,
}

impl JwtKeyProvider for AppState {
    fn jwt_keys(&self) -> &JwtKeys {
        &self.jwt_keys
    }

    fn jwt_issuer(&self) -> &str {
        &self.config.jwt_issuer
    }

    fn jwt_audience(&self) -> &str {
        &self.config.jwt_audience
    }
}
