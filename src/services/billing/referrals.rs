use tracing::{info, warn};

use crate::db::RepositoryError;
use crate::state::AppState;

/// Credits the referral program behind `code` for a payment of `amount`.
///
/// Returns the commission recorded, or `None` when no conversion was counted:
/// an unknown code, a user referring themselves, or a payment intent that was
/// already credited.
pub async fn accrue_commission(
    state: &AppState,
    code: &str,
    user_id: &str,
    payment_intent_id: &str,
    amount: i64,
) -> Result<Option<i64>, RepositoryError> {
    let Some(program) = state.referrals.find_program_by_code(code).await? else {
        warn!(referral_code = code, %user_id, "unknown referral code on payment");
        return Ok(None);
    };

    if program.owner_user_id == user_id {
        info!(referral_code = code, %user_id, "ignoring self-referral");
        return Ok(None);
    }

    let commission = program.commission_for(amount);
    let recorded = state
        .referrals
        .record_conversion(&program.id, payment_intent_id, commission)
        .await?;
    if !recorded {
        info!(
            referral_code = code,
            payment_intent = payment_intent_id,
            "payment already credited to referral program"
        );
        return Ok(None);
    }
    info!(
        referral_code = code,
        program_id = %program.id,
        commission,
        "referral conversion recorded"
    );
    Ok(Some(commission))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::referral::{ReferralProgram, RewardType};
    use crate::state::test_support::TestContext;

    fn program(owner: &str, reward_type: RewardType, value: i64) -> ReferralProgram {
        ReferralProgram {
            id: "ref_1".into(),
            owner_user_id: owner.into(),
            code: "CODE".into(),
            reward_type,
            reward_value: value,
            analytics: Default::default(),
            converted_payments: Vec::new(),
            updated_at: None,
        }
    }

    #[tokio::test]
    async fn fixed_reward_is_capped_by_amount() {
        let ctx = TestContext::new();
        ctx.referrals.insert(program("owner", RewardType::Fixed, 1_000));

        let commission = accrue_commission(&ctx.state(), "CODE", "payer", "pi_1", 600)
            .await
            .unwrap();

        assert_eq!(commission, Some(600));
        let stored = ctx.referrals.get_by_code("CODE").unwrap();
        assert_eq!(stored.analytics.paid_rewards, 1);
        assert_eq!(stored.analytics.total_reward_amount, 600);
    }

    #[tokio::test]
    async fn self_referral_is_not_counted() {
        let ctx = TestContext::new();
        ctx.referrals.insert(program("payer", RewardType::Percentage, 20));

        let commission = accrue_commission(&ctx.state(), "CODE", "payer", "pi_1", 10_000)
            .await
            .unwrap();

        assert_eq!(commission, None);
        assert_eq!(
            ctx.referrals.get_by_code("CODE").unwrap().analytics.total_referrals,
            0
        );
    }

    #[tokio::test]
    async fn unknown_code_is_ignored() {
        let ctx = TestContext::new();
        let commission = accrue_commission(&ctx.state(), "NOPE", "payer", "pi_1", 10_000)
            .await
            .unwrap();
        assert_eq!(commission, None);
    }

    #[tokio::test]
    async fn same_payment_is_credited_once() {
        let ctx = TestContext::new();
        ctx.referrals.insert(program("owner", RewardType::Percentage, 10));

        let first = accrue_commission(&ctx.state(), "CODE", "payer", "pi_1", 1_000)
            .await
            .unwrap();
        let again = accrue_commission(&ctx.state(), "CODE", "payer", "pi_1", 1_000)
            .await
            .unwrap();
        let other = accrue_commission(&ctx.state(), "CODE", "payer", "pi_2", 1_000)
            .await
            .unwrap();

        assert_eq!(first, Some(100));
        assert_eq!(again, None);
        assert_eq!(other, Some(100));
        let stored = ctx.referrals.get_by_code("CODE").unwrap();
        assert_eq!(stored.analytics.total_referrals, 2);
        assert_eq!(stored.analytics.total_reward_amount, 200);
        assert_eq!(stored.converted_payments, vec!["pi_1", "pi_2"]);
    }
}
