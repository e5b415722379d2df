use async_trait::async_trait;

use super::RepositoryError;
use crate::models::referral::ReferralProgram;

#[async_trait]
pub trait ReferralRepository: Send + Sync {
    async fn find_program_by_code(
        &self,
        code: &str,
    ) -> Result<Option<ReferralProgram>, RepositoryError>;

    /// Counts one converted referral for `payment_intent_id` and adds
    /// `reward_amount` to the payout total. A payment intent is credited at
    /// most once; returns `false` when it already was.
    async fn record_conversion(
        &self,
        program_id: &str,
        payment_intent_id: &str,
        reward_amount: i64,
    ) -> Result<bool, RepositoryError>;
}
