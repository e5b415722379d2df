use mongodb::bson::DateTime;
use serde::{Deserialize, Serialize};

use crate::db::repository::Entity;

pub const REFERRAL_PROGRAMS_COLLECTION: &str = "referral_programs";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RewardType {
    /// `reward_value` is a whole percentage of the paid amount.
    Percentage,
    /// `reward_value` is a flat amount in minor currency units.
    Fixed,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReferralAnalytics {
    #[serde(default)]
    pub total_referrals: i64,
    #[serde(default)]
    pub paid_rewards: i64,
    #[serde(default)]
    pub total_reward_amount: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReferralProgram {
    #[serde(rename = "_id")]
    pub id: String,
    pub owner_user_id: String,
    pub code: String,
    pub reward_type: RewardType,
    pub reward_value: i64,
    #[serde(default)]
    pub analytics: ReferralAnalytics,
    /// Payment intents already credited to this program.
    #[serde(default)]
    pub converted_payments: Vec<String>,
    #[serde(default)]
    pub updated_at: Option<DateTime>,
}

impl ReferralProgram {
    /// Commission owed for a payment of `amount` minor units.
    pub fn commission_for(&self, amount: i64) -> i64 {
        let amount = amount.max(0);
        let value = self.reward_value.max(0);
        match self.reward_type {
            RewardType::Percentage => amount.saturating_mul(value.min(100)) / 100,
            RewardType::Fixed => value.min(amount),
        }
    }
}

impl Entity for ReferralProgram {
    const COLLECTION: &'static str = REFERRAL_PROGRAMS_COLLECTION;
}
