pub mod payment;
pub mod referral;
pub mod user;
pub mod webhook_event;
