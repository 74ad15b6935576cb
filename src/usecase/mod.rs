pub mod authenticate;
pub mod get_account_by_token;
pub mod logout;
pub mod refresh_token;
pub mod resolve_identity;
pub mod validate_token;

pub use authenticate::{AuthenticateError, AuthenticateResult, AuthenticateUseCase};
pub use get_account_by_token::{AccountLookupError, GetAccountByTokenUseCase};
pub use logout::LogoutUseCase;
pub use refresh_token::{RefreshError, RefreshPolicy, RefreshResult, RefreshTokenUseCase};
pub use resolve_identity::{IdentityResolver, ResolveError};
pub use validate_token::{ValidateTokenUseCase, ValidationOutcome};
