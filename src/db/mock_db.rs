use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use mongodb::bson::DateTime;

use super::referral_repository::ReferralRepository;
use super::user_repository::UserRepository;
use super::webhook_event_repository::WebhookEventRepository;
use super::RepositoryError;
use crate::models::referral::ReferralProgram;
use crate::models::user::{OnboardingUpdate, SubscriptionState, User};
use crate::models::webhook_event::WebhookEventLog;

fn mock_failure() -> RepositoryError {
    RepositoryError::Unavailable("Mock DB failure".into())
}

#[derive(Default)]
pub struct MockUserRepository {
    users: Mutex<HashMap<String, User>>,
    writes: AtomicUsize,
    should_fail: AtomicBool,
}

impl MockUserRepository {
    pub fn insert(&self, user: User) {
        self.users.lock().unwrap().insert(user.id.clone(), user);
    }

    pub fn get(&self, user_id: &str) -> Option<User> {
        self.users.lock().unwrap().get(user_id).cloned()
    }

    /// Number of mutating calls that reached the store.
    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    pub fn set_failing(&self, fail: bool) {
        self.should_fail.store(fail, Ordering::SeqCst);
    }

    fn check(&self) -> Result<(), RepositoryError> {
        if self.should_fail.load(Ordering::SeqCst) {
            return Err(mock_failure());
        }
        Ok(())
    }

    fn modify<F>(&self, user_id: &str, f: F) -> Result<bool, RepositoryError>
    where
        F: FnOnce(&mut User),
    {
        self.check()?;
        self.writes.fetch_add(1, Ordering::SeqCst);
        let mut users = self.users.lock().unwrap();
        match users.get_mut(user_id) {
            Some(user) => {
                f(user);
                user.updated_at = Some(DateTime::now());
                Ok(true)
            }
            None => Ok(false),
        }
    }
}

#[async_trait]
impl UserRepository for MockUserRepository {
    async fn find_user_by_id(&self, user_id: &str) -> Result<Option<User>, RepositoryError> {
        self.check()?;
        Ok(self.get(user_id))
    }

    async fn find_user_id_by_stripe_customer_id(
        &self,
        customer_id: &str,
    ) -> Result<Option<String>, RepositoryError> {
        self.check()?;
        Ok(self
            .users
            .lock()
            .unwrap()
            .values()
            .find(|u| u.stripe_customer_id.as_deref() == Some(customer_id))
            .map(|u| u.id.clone()))
    }

    async fn set_stripe_customer_id(
        &self,
        user_id: &str,
        customer_id: &str,
    ) -> Result<(), RepositoryError> {
        self.modify(user_id, |u| u.stripe_customer_id = Some(customer_id.to_string()))?;
        Ok(())
    }

    async fn complete_onboarding(
        &self,
        user_id: &str,
        update: &OnboardingUpdate,
    ) -> Result<bool, RepositoryError> {
        self.modify(user_id, |u| {
            u.onboarding_completed = true;
            u.has_workspace = true;
            u.workspace_id = Some(update.workspace_id.clone());
            u.selected_bundles = update.selected_bundles.clone();
            u.last_payment_intent_id = Some(update.payment_intent_id.clone());
        })
    }

    async fn update_subscription(
        &self,
        user_id: &str,
        subscription: &SubscriptionState,
    ) -> Result<(), RepositoryError> {
        self.modify(user_id, |u| u.subscription = Some(subscription.clone()))?;
        Ok(())
    }

    async fn set_billing_error(
        &self,
        user_id: &str,
        message: Option<&str>,
    ) -> Result<(), RepositoryError> {
        self.modify(user_id, |u| u.billing_error = message.map(str::to_string))?;
        Ok(())
    }
}

#[derive(Default)]
pub struct MockWebhookEventRepository {
    events: Mutex<HashMap<String, WebhookEventLog>>,
    writes: AtomicUsize,
    should_fail: AtomicBool,
}

impl MockWebhookEventRepository {
    pub fn get(&self, event_id: &str) -> Option<WebhookEventLog> {
        self.events.lock().unwrap().get(event_id).cloned()
    }

    pub fn event_count(&self) -> usize {
        self.events.lock().unwrap().len()
    }

    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    pub fn set_failing(&self, fail: bool) {
        self.should_fail.store(fail, Ordering::SeqCst);
    }

    fn check(&self) -> Result<(), RepositoryError> {
        if self.should_fail.load(Ordering::SeqCst) {
            return Err(mock_failure());
        }
        Ok(())
    }
}

#[async_trait]
impl WebhookEventRepository for MockWebhookEventRepository {
    async fn has_processed_event(&self, event_id: &str) -> Result<bool, RepositoryError> {
        self.check()?;
        Ok(self
            .get(event_id)
            .map(|e| e.processed_at.is_some())
            .unwrap_or(false))
    }

    async fn log_event(&self, entry: &WebhookEventLog) -> Result<(), RepositoryError> {
        self.check()?;
        self.writes.fetch_add(1, Ordering::SeqCst);
        let mut events = self.events.lock().unwrap();
        events
            .entry(entry.event_id.clone())
            .and_modify(|existing| existing.delivery_count += 1)
            .or_insert_with(|| entry.clone());
        Ok(())
    }

    async fn mark_processed(&self, event_id: &str, outcome: &str) -> Result<(), RepositoryError> {
        self.check()?;
        self.writes.fetch_add(1, Ordering::SeqCst);
        if let Some(existing) = self.events.lock().unwrap().get_mut(event_id) {
            existing.processed_at = Some(DateTime::now());
            existing.outcome = Some(outcome.to_string());
        }
        Ok(())
    }
}

#[derive(Default)]
pub struct MockReferralRepository {
    programs: Mutex<HashMap<String, ReferralProgram>>,
    should_fail: AtomicBool,
}

impl MockReferralRepository {
    pub fn insert(&self, program: ReferralProgram) {
        self.programs
            .lock()
            .unwrap()
            .insert(program.code.clone(), program);
    }

    pub fn get_by_code(&self, code: &str) -> Option<ReferralProgram> {
        self.programs.lock().unwrap().get(code).cloned()
    }

    pub fn set_failing(&self, fail: bool) {
        self.should_fail.store(fail, Ordering::SeqCst);
    }
}

#[async_trait]
impl ReferralRepository for MockReferralRepository {
    async fn find_program_by_code(
        &self,
        code: &str,
    ) -> Result<Option<ReferralProgram>, RepositoryError> {
        if self.should_fail.load(Ordering::SeqCst) {
            return Err(mock_failure());
        }
        Ok(self.get_by_code(code))
    }

    async fn record_conversion(
        &self,
        program_id: &str,
        payment_intent_id: &str,
        reward_amount: i64,
    ) -> Result<bool, RepositoryError> {
        if self.should_fail.load(Ordering::SeqCst) {
            return Err(mock_failure());
        }
        let mut programs = self.programs.lock().unwrap();
        let Some(program) = programs.values_mut().find(|p| p.id == program_id) else {
            return Ok(false);
        };
        if program
            .converted_payments
            .iter()
            .any(|pi| pi == payment_intent_id)
        {
            return Ok(false);
        }
        program.converted_payments.push(payment_intent_id.to_string());
        program.analytics.total_referrals += 1;
        program.analytics.paid_rewards += 1;
        program.analytics.total_reward_amount += reward_amount;
        program.updated_at = Some(DateTime::now());
        Ok(true)
    }
}
