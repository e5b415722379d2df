use async_trait::async_trait;
use mongodb::bson::{doc, DateTime};
use mongodb::Database;

use super::referral_repository::ReferralRepository;
use super::repository::MongoRepository;
use super::RepositoryError;
use crate::models::referral::ReferralProgram;

pub struct MongoReferralRepository {
    programs: MongoRepository<ReferralProgram>,
}

impl MongoReferralRepository {
    pub fn new(db: &Database) -> Self {
        Self {
            programs: MongoRepository::new(db),
        }
    }
}

#[async_trait]
impl ReferralRepository for MongoReferralRepository {
    async fn find_program_by_code(
        &self,
        code: &str,
    ) -> Result<Option<ReferralProgram>, RepositoryError> {
        self.programs.find_one(doc! { "code": code }).await
    }

    async fn record_conversion(
        &self,
        program_id: &str,
        payment_intent_id: &str,
        reward_amount: i64,
    ) -> Result<bool, RepositoryError> {
        // The $ne guard and the increments apply in one document update.
        self.programs
            .update_where(
                doc! {
                    "_id": program_id,
                    "converted_payments": { "$ne": payment_intent_id },
                },
                doc! {
                    "$inc": {
                        "analytics.total_referrals": 1_i64,
                        "analytics.paid_rewards": 1_i64,
                        "analytics.total_reward_amount": reward_amount,
                    },
                    "$addToSet": { "converted_payments": payment_intent_id },
                    "$set": { "updated_at": DateTime::now() },
                },
            )
            .await
    }
}
