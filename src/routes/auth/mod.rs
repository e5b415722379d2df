pub mod claims;
pub mod session;

pub use session::AuthSession;
