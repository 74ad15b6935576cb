use std::sync::Arc;

use chrono::{Duration, Utc};

use crate::domain::entity::claims::{Claims, TokenFingerprint};
use crate::domain::service::rule_chain::run_rule_chain;
use crate::infrastructure::token_codec::TokenCodec;
use crate::usecase::resolve_identity::{IdentityResolver, ResolveError};

/// RefreshError はトークン再発行に関するエラーを表す。
#[derive(Debug, thiserror::Error)]
pub enum RefreshError {
    #[error("invalid refresh token: {0}")]
    Invalid(String),

    #[error("account not found: {0}")]
    NotFound(String),

    #[error("internal error: {0}")]
    Internal(String),
}

/// RefreshPolicy は再発行時の挙動を制御する。
#[derive(Debug, Clone, Copy)]
pub struct RefreshPolicy {
    /// リフレッシュトークン自体も新しい有効期限で再発行するか。
    pub rotate_refresh_token: bool,
    /// ロールを台帳から取り直すか。無効にするとトークン内のロールをそのまま使う。
    pub refetch_role: bool,
}

impl Default for RefreshPolicy {
    fn default() -> Self {
        Self {
            rotate_refresh_token: true,
            refetch_role: true,
        }
    }
}

/// RefreshResult は再発行されたトークンペア。
#[derive(Debug, Clone)]
pub struct RefreshResult {
    pub access_token: String,
    pub refresh_token: String,
}

/// RefreshTokenUseCase はリフレッシュトークンを検証し、新しいアクセストークン
/// （設定によりリフレッシュトークンも）を発行するユースケース。
pub struct RefreshTokenUseCase {
    resolver: Arc<IdentityResolver>,
    codec: Arc<TokenCodec>,
    fingerprint: TokenFingerprint,
    access_ttl: Duration,
    refresh_ttl: Duration,
    policy: RefreshPolicy,
}

impl RefreshTokenUseCase {
    pub fn new(
        resolver: Arc<IdentityResolver>,
        codec: Arc<TokenCodec>,
        fingerprint: TokenFingerprint,
        access_ttl: Duration,
        refresh_ttl: Duration,
        policy: RefreshPolicy,
    ) -> Self {
        Self {
            resolver,
            codec,
            fingerprint,
            access_ttl,
            refresh_ttl,
            policy,
        }
    }

    /// リフレッシュトークンを検証し、新しいトークンを発行する。
    /// 検証はアクセストークンと同一のルールチェーンを通す。
    pub async fn execute(&self, refresh_token: &str) -> Result<RefreshResult, RefreshError> {
        let claims = self
            .codec
            .decode(refresh_token)
            .map_err(|e| RefreshError::Invalid(e.to_string()))?;

        run_rule_chain(&claims, &self.fingerprint, Utc::now())
            .map_err(|v| RefreshError::Invalid(v.to_string()))?;

        // リフレッシュトークンはロールを運ばないため、refetch_role が無効でも
        // トークンにロールが無ければ台帳へ問い合わせる。
        let role = match (&claims.role, self.policy.refetch_role) {
            (Some(role), false) => role.clone(),
            _ => {
                let account = self
                    .resolver
                    .resolve_by_id(&claims.id)
                    .await
                    .map_err(|e| match e {
                        ResolveError::NotFound(s) => RefreshError::NotFound(s),
                        ResolveError::Internal(s) => RefreshError::Internal(s),
                    })?
                    .ok_or_else(|| RefreshError::NotFound(claims.id.clone()))?;
                account.role
            }
        };

        let now = Utc::now();
        let access_claims =
            Claims::access(&self.fingerprint, &claims.id, &role, now, self.access_ttl);
        let access_token = self
            .codec
            .encode(&access_claims)
            .map_err(|e| RefreshError::Internal(e.to_string()))?;

        let refresh_token = if self.policy.rotate_refresh_token {
            let refresh_claims =
                Claims::refresh(&self.fingerprint, &claims.id, now, self.refresh_ttl);
            self.codec
                .encode(&refresh_claims)
                .map_err(|e| RefreshError::Internal(e.to_string()))?
        } else {
            refresh_token.to_string()
        };

        Ok(RefreshResult {
            access_token,
            refresh_token,
        })
    }
}
