use std::sync::Arc;

use chrono::Utc;

use crate::domain::entity::account::Account;
use crate::domain::entity::claims::TokenFingerprint;
use crate::domain::service::rule_chain::run_rule_chain;
use crate::infrastructure::token_codec::TokenCodec;
use crate::usecase::resolve_identity::{IdentityResolver, ResolveError};

/// AccountLookupError はトークンからのアカウント取得に関するエラーを表す。
#[derive(Debug, thiserror::Error)]
pub enum AccountLookupError {
    #[error("invalid token: {0}")]
    Invalid(String),

    #[error("internal error: {0}")]
    Internal(String),
}

/// GetAccountByTokenUseCase は有効なアクセストークンから現在のアカウント情報を
/// 台帳サービス経由で取得するユースケース。トークン内のスナップショットではなく
/// 台帳の最新状態を返す。
pub struct GetAccountByTokenUseCase {
    resolver: Arc<IdentityResolver>,
    codec: Arc<TokenCodec>,
    fingerprint: TokenFingerprint,
}

impl GetAccountByTokenUseCase {
    pub fn new(
        resolver: Arc<IdentityResolver>,
        codec: Arc<TokenCodec>,
        fingerprint: TokenFingerprint,
    ) -> Self {
        Self {
            resolver,
            codec,
            fingerprint,
        }
    }

    /// トークンを検証し、対応するアカウントを返す。
    /// トークンは有効だがアカウントが既に削除されている場合は Ok(None)。
    pub async fn execute(&self, token: &str) -> Result<Option<Account>, AccountLookupError> {
        let claims = self
            .codec
            .decode(token)
            .map_err(|e| AccountLookupError::Invalid(e.to_string()))?;

        run_rule_chain(&claims, &self.fingerprint, Utc::now())
            .map_err(|v| AccountLookupError::Invalid(v.to_string()))?;

        self.resolver
            .resolve_by_id(&claims.id)
            .await
            .map_err(|e| match e {
                ResolveError::NotFound(s) | ResolveError::Internal(s) => {
                    AccountLookupError::Internal(s)
                }
            })
    }
}
