use std::sync::Arc;

use crate::domain::entity::account::Account;
use crate::usecase::authenticate::{AuthenticateError, AuthenticateUseCase};
use crate::usecase::get_account_by_token::{AccountLookupError, GetAccountByTokenUseCase};
use crate::usecase::logout::LogoutUseCase;
use crate::usecase::refresh_token::{RefreshError, RefreshTokenUseCase};
use crate::usecase::validate_token::ValidateTokenUseCase;

/// GrpcError は gRPC レイヤのエラー種別を表す。tonic::Status へ変換される。
#[derive(Debug, Clone)]
pub enum GrpcError {
    InvalidArgument(String),
    NotFound(String),
    Unauthenticated(String),
    Internal(String),
}

// --- gRPC Request/Response Types ---

#[derive(Debug, Clone)]
pub struct PbAccount {
    pub id: String,
    pub provider: String,
    pub provider_user_id: String,
    pub role: String,
}

#[derive(Debug, Clone)]
pub struct AuthGrpcRequest {
    pub provider: String,
    pub provider_user_id: String,
}

#[derive(Debug, Clone)]
pub struct AuthGrpcResponse {
    pub access_token: String,
    pub refresh_token: String,
    pub account: Option<PbAccount>,
}

#[derive(Debug, Clone)]
pub struct AuthCheckGrpcRequest {
    pub access_token: String,
}

#[derive(Debug, Clone)]
pub struct AuthCheckGrpcResponse {
    pub valid: bool,
    pub reason: String,
}

#[derive(Debug, Clone)]
pub struct AuthRefreshGrpcRequest {
    pub refresh_token: String,
}

#[derive(Debug, Clone)]
pub struct AuthRefreshGrpcResponse {
    pub access_token: String,
    pub refresh_token: String,
}

#[derive(Debug, Clone)]
pub struct AuthLogoutGrpcRequest {
    pub access_token: String,
}

#[derive(Debug, Clone)]
pub struct AuthLogoutGrpcResponse {
    pub ok: bool,
}

#[derive(Debug, Clone)]
pub struct GetAccountByTokenGrpcRequest {
    pub access_token: String,
}

#[derive(Debug, Clone)]
pub struct GetAccountByTokenGrpcResponse {
    pub account: Option<PbAccount>,
}

// --- AuthGrpcService ---

/// AuthGrpcService はユースケースを gRPC の要求・応答へ橋渡しする。
pub struct AuthGrpcService {
    authenticate_uc: Arc<AuthenticateUseCase>,
    validate_uc: Arc<ValidateTokenUseCase>,
    refresh_uc: Arc<RefreshTokenUseCase>,
    logout_uc: Arc<LogoutUseCase>,
    account_uc: Arc<GetAccountByTokenUseCase>,
}

impl AuthGrpcService {
    pub fn new(
        authenticate_uc: Arc<AuthenticateUseCase>,
        validate_uc: Arc<ValidateTokenUseCase>,
        refresh_uc: Arc<RefreshTokenUseCase>,
        logout_uc: Arc<LogoutUseCase>,
        account_uc: Arc<GetAccountByTokenUseCase>,
    ) -> Self {
        Self {
            authenticate_uc,
            validate_uc,
            refresh_uc,
            logout_uc,
            account_uc,
        }
    }

    /// 外部プロバイダのアイデンティティを認証し、トークンペアを発行する。
    pub async fn auth(&self, req: AuthGrpcRequest) -> Result<AuthGrpcResponse, GrpcError> {
        if req.provider.is_empty() {
            return Err(GrpcError::InvalidArgument("provider is required".to_string()));
        }
        if req.provider_user_id.is_empty() {
            return Err(GrpcError::InvalidArgument(
                "provider_user_id is required".to_string(),
            ));
        }

        match self
            .authenticate_uc
            .execute(&req.provider, &req.provider_user_id)
            .await
        {
            Ok(result) => {
                tracing::info!(
                    provider = %req.provider,
                    account_id = %result.account.id,
                    "issued token pair"
                );
                Ok(AuthGrpcResponse {
                    access_token: result.access_token,
                    refresh_token: result.refresh_token,
                    account: Some(account_to_pb(&result.account)),
                })
            }
            Err(AuthenticateError::NotFound(msg)) => Err(GrpcError::NotFound(msg)),
            Err(AuthenticateError::Internal(msg)) => {
                tracing::error!(provider = %req.provider, error = %msg, "authentication failed");
                Err(GrpcError::Internal(msg))
            }
        }
    }

    /// トークンを検証する。無効なトークンはエラーではなく valid=false で返す。
    pub async fn auth_check(
        &self,
        req: AuthCheckGrpcRequest,
    ) -> Result<AuthCheckGrpcResponse, GrpcError> {
        if req.access_token.is_empty() {
            return Err(GrpcError::InvalidArgument(
                "access_token is required".to_string(),
            ));
        }

        let outcome = self.validate_uc.execute(&req.access_token);
        if !outcome.valid {
            tracing::debug!(reason = %outcome.reason, "token rejected");
        }
        Ok(AuthCheckGrpcResponse {
            valid: outcome.valid,
            reason: outcome.reason,
        })
    }

    /// リフレッシュトークンから新しいトークンペアを発行する。
    pub async fn auth_refresh(
        &self,
        req: AuthRefreshGrpcRequest,
    ) -> Result<AuthRefreshGrpcResponse, GrpcError> {
        if req.refresh_token.is_empty() {
            return Err(GrpcError::InvalidArgument(
                "refresh_token is required".to_string(),
            ));
        }

        match self.refresh_uc.execute(&req.refresh_token).await {
            Ok(result) => Ok(AuthRefreshGrpcResponse {
                access_token: result.access_token,
                refresh_token: result.refresh_token,
            }),
            Err(RefreshError::Invalid(msg)) => Err(GrpcError::Unauthenticated(msg)),
            Err(RefreshError::NotFound(msg)) => Err(GrpcError::NotFound(msg)),
            Err(RefreshError::Internal(msg)) => {
                tracing::error!(error = %msg, "token refresh failed");
                Err(GrpcError::Internal(msg))
            }
        }
    }

    /// ログアウト要求を受理する。
    pub async fn auth_logout(
        &self,
        req: AuthLogoutGrpcRequest,
    ) -> Result<AuthLogoutGrpcResponse, GrpcError> {
        if req.access_token.is_empty() {
            return Err(GrpcError::InvalidArgument(
                "access_token is required".to_string(),
            ));
        }

        Ok(AuthLogoutGrpcResponse {
            ok: self.logout_uc.execute(&req.access_token),
        })
    }

    /// アクセストークンから台帳の最新アカウント情報を取得する。
    pub async fn get_account_by_token(
        &self,
        req: GetAccountByTokenGrpcRequest,
    ) -> Result<GetAccountByTokenGrpcResponse, GrpcError> {
        if req.access_token.is_empty() {
            return Err(GrpcError::InvalidArgument(
                "access_token is required".to_string(),
            ));
        }

        match self.account_uc.execute(&req.access_token).await {
            Ok(account) => Ok(GetAccountByTokenGrpcResponse {
                // トークン有効・アカウント消滅は正常系。account を空で返す。
                account: account.as_ref().map(account_to_pb),
            }),
            Err(AccountLookupError::Invalid(msg)) => Err(GrpcError::Unauthenticated(msg)),
            Err(AccountLookupError::Internal(msg)) => {
                tracing::error!(error = %msg, "account lookup failed");
                Err(GrpcError::Internal(msg))
            }
        }
    }
}

fn account_to_pb(account: &Account) -> PbAccount {
    PbAccount {
        id: account.id.clone(),
        provider: account.provider.clone(),
        provider_user_id: account.provider_user_id.clone(),
        role: account.role.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entity::claims::TokenFingerprint;
    use crate::domain::repository::account_directory::{DirectoryError, MockAccountDirectory};
    use crate::infrastructure::token_codec::{SigningScheme, TokenCodec};
    use crate::usecase::refresh_token::RefreshPolicy;
    use crate::usecase::resolve_identity::IdentityResolver;
    use chrono::Duration;
    use secrecy::SecretString;

    fn make_service(mock: MockAccountDirectory) -> AuthGrpcService {
        let codec = Arc::new(
            TokenCodec::new(&SigningScheme::Hs256 {
                secret: SecretString::new("test-secret".to_string()),
            })
            .unwrap(),
        );
        let resolver = Arc::new(IdentityResolver::new(Arc::new(mock), true));
        let fingerprint = TokenFingerprint::default();
        let access_ttl = Duration::hours(24);
        let refresh_ttl = Duration::days(7);

        AuthGrpcService::new(
            Arc::new(AuthenticateUseCase::new(
                resolver.clone(),
                codec.clone(),
                fingerprint.clone(),
                access_ttl,
                refresh_ttl,
            )),
            Arc::new(ValidateTokenUseCase::new(codec.clone(), fingerprint.clone())),
            Arc::new(RefreshTokenUseCase::new(
                resolver.clone(),
                codec.clone(),
                fingerprint.clone(),
                access_ttl,
                refresh_ttl,
                RefreshPolicy::default(),
            )),
            Arc::new(LogoutUseCase::new(codec.clone())),
            Arc::new(GetAccountByTokenUseCase::new(resolver, codec, fingerprint)),
        )
    }

    fn make_account() -> Account {
        Account {
            id: "acc-1".to_string(),
            provider: "google".to_string(),
            provider_user_id: "u1".to_string(),
            role: "member".to_string(),
        }
    }

    #[tokio::test]
    async fn test_auth_empty_provider_is_invalid_argument() {
        let svc = make_service(MockAccountDirectory::new());
        let result = svc
            .auth(AuthGrpcRequest {
                provider: String::new(),
                provider_user_id: "u1".to_string(),
            })
            .await;
        assert!(matches!(result.unwrap_err(), GrpcError::InvalidArgument(_)));
    }

    #[tokio::test]
    async fn test_auth_then_check_roundtrip() {
        let mut mock = MockAccountDirectory::new();
        mock.expect_find_by_provider()
            .returning(|_, _| Ok(make_account()));

        let svc = make_service(mock);
        let resp = svc
            .auth(AuthGrpcRequest {
                provider: "google".to_string(),
                provider_user_id: "u1".to_string(),
            })
            .await
            .unwrap();
        assert_eq!(resp.account.unwrap().id, "acc-1");

        let check = svc
            .auth_check(AuthCheckGrpcRequest {
                access_token: resp.access_token,
            })
            .await
            .unwrap();
        assert!(check.valid);
        assert!(check.reason.is_empty());
    }

    #[tokio::test]
    async fn test_auth_check_invalid_token_is_not_an_error() {
        let svc = make_service(MockAccountDirectory::new());
        let check = svc
            .auth_check(AuthCheckGrpcRequest {
                access_token: "garbage".to_string(),
            })
            .await
            .unwrap();
        assert!(!check.valid);
        assert!(!check.reason.is_empty());
    }

    #[tokio::test]
    async fn test_auth_check_empty_token_is_invalid_argument() {
        let svc = make_service(MockAccountDirectory::new());
        let result = svc
            .auth_check(AuthCheckGrpcRequest {
                access_token: String::new(),
            })
            .await;
        assert!(matches!(result.unwrap_err(), GrpcError::InvalidArgument(_)));
    }

    #[tokio::test]
    async fn test_auth_refresh_with_garbage_is_unauthenticated() {
        let svc = make_service(MockAccountDirectory::new());
        let result = svc
            .auth_refresh(AuthRefreshGrpcRequest {
                refresh_token: "garbage".to_string(),
            })
            .await;
        assert!(matches!(result.unwrap_err(), GrpcError::Unauthenticated(_)));
    }

    #[tokio::test]
    async fn test_auth_refresh_roundtrip() {
        let mut mock = MockAccountDirectory::new();
        mock.expect_find_by_provider()
            .returning(|_, _| Ok(make_account()));
        mock.expect_find_by_id().returning(|_| Ok(make_account()));

        let svc = make_service(mock);
        let resp = svc
            .auth(AuthGrpcRequest {
                provider: "google".to_string(),
                provider_user_id: "u1".to_string(),
            })
            .await
            .unwrap();

        let refreshed = svc
            .auth_refresh(AuthRefreshGrpcRequest {
                refresh_token: resp.refresh_token,
            })
            .await
            .unwrap();

        let check = svc
            .auth_check(AuthCheckGrpcRequest {
                access_token: refreshed.access_token,
            })
            .await
            .unwrap();
        assert!(check.valid);
    }

    #[tokio::test]
    async fn test_logout_returns_ok_for_own_token() {
        let mut mock = MockAccountDirectory::new();
        mock.expect_find_by_provider()
            .returning(|_, _| Ok(make_account()));

        let svc = make_service(mock);
        let resp = svc
            .auth(AuthGrpcRequest {
                provider: "google".to_string(),
                provider_user_id: "u1".to_string(),
            })
            .await
            .unwrap();

        let logout = svc
            .auth_logout(AuthLogoutGrpcRequest {
                access_token: resp.access_token,
            })
            .await
            .unwrap();
        assert!(logout.ok);
    }

    #[tokio::test]
    async fn test_get_account_by_token_deleted_account_is_empty_response() {
        let mut mock = MockAccountDirectory::new();
        mock.expect_find_by_provider()
            .returning(|_, _| Ok(make_account()));
        mock.expect_find_by_id()
            .returning(|id| Err(DirectoryError::NotFound(id.to_string())));

        let svc = make_service(mock);
        let resp = svc
            .auth(AuthGrpcRequest {
                provider: "google".to_string(),
                provider_user_id: "u1".to_string(),
            })
            .await
            .unwrap();

        // トークンは有効だがアカウントは消滅している。エラーではなく空応答。
        let lookup = svc
            .get_account_by_token(GetAccountByTokenGrpcRequest {
                access_token: resp.access_token,
            })
            .await
            .unwrap();
        assert!(lookup.account.is_none());
    }
}
