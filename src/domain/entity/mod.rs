pub mod account;
pub mod claims;

pub use account::Account;
pub use claims::{Claims, TokenFingerprint};
