use std::sync::Arc;

use chrono::{Duration, Utc};

use crate::domain::entity::account::Account;
use crate::domain::entity::claims::{Claims, TokenFingerprint};
use crate::infrastructure::token_codec::TokenCodec;
use crate::usecase::resolve_identity::{IdentityResolver, ResolveError};

/// AuthenticateError は認証・トークン発行に関するエラーを表す。
#[derive(Debug, thiserror::Error)]
pub enum AuthenticateError {
    #[error("account not found: {0}")]
    NotFound(String),

    #[error("internal error: {0}")]
    Internal(String),
}

/// AuthenticateResult は発行したトークンペアと解決済みアカウント。
#[derive(Debug, Clone)]
pub struct AuthenticateResult {
    pub access_token: String,
    pub refresh_token: String,
    pub account: Account,
}

/// AuthenticateUseCase は外部プロバイダのアサーションからアカウントを解決し、
/// アクセストークンとリフレッシュトークンのペアを発行するユースケース。
pub struct AuthenticateUseCase {
    resolver: Arc<IdentityResolver>,
    codec: Arc<TokenCodec>,
    fingerprint: TokenFingerprint,
    access_ttl: Duration,
    refresh_ttl: Duration,
}

impl AuthenticateUseCase {
    pub fn new(
        resolver: Arc<IdentityResolver>,
        codec: Arc<TokenCodec>,
        fingerprint: TokenFingerprint,
        access_ttl: Duration,
        refresh_ttl: Duration,
    ) -> Self {
        Self {
            resolver,
            codec,
            fingerprint,
            access_ttl,
            refresh_ttl,
        }
    }

    /// アカウントを解決（必要なら作成）し、トークンペアを発行する。
    pub async fn execute(
        &self,
        provider: &str,
        provider_user_id: &str,
    ) -> Result<AuthenticateResult, AuthenticateError> {
        let account = self
            .resolver
            .resolve_or_create(provider, provider_user_id)
            .await
            .map_err(|e| match e {
                ResolveError::NotFound(s) => AuthenticateError::NotFound(s),
                ResolveError::Internal(s) => AuthenticateError::Internal(s),
            })?;

        let now = Utc::now();
        let access_claims =
            Claims::access(&self.fingerprint, &account.id, &account.role, now, self.access_ttl);
        let refresh_claims = Claims::refresh(&self.fingerprint, &account.id, now, self.refresh_ttl);

        let access_token = self
            .codec
            .encode(&access_claims)
            .map_err(|e| AuthenticateError::Internal(e.to_string()))?;
        let refresh_token = self
            .codec
            .encode(&refresh_claims)
            .map_err(|e| AuthenticateError::Internal(e.to_string()))?;

        Ok(AuthenticateResult {
            access_token,
            refresh_token,
            account,
        })
    }
}
