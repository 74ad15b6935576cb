use std::sync::Arc;

use chrono::Utc;

use crate::domain::entity::claims::{Claims, TokenFingerprint};
use crate::domain::service::rule_chain::run_rule_chain;
use crate::infrastructure::token_codec::TokenCodec;

/// ValidationOutcome はトークン検証の結果。
/// 無効なトークンはエラーではなく `valid: false` と理由文字列で表す。
#[derive(Debug, Clone)]
pub struct ValidationOutcome {
    pub valid: bool,
    pub reason: String,
    pub claims: Option<Claims>,
}

impl ValidationOutcome {
    fn ok(claims: Claims) -> Self {
        Self {
            valid: true,
            reason: String::new(),
            claims: Some(claims),
        }
    }

    fn rejected(reason: String) -> Self {
        Self {
            valid: false,
            reason,
            claims: None,
        }
    }
}

/// ValidateTokenUseCase はトークンの署名検証とルールチェーン評価を行う。
/// 外部 I/O を伴わない純粋な判定であり、同期メソッドとして提供する。
pub struct ValidateTokenUseCase {
    codec: Arc<TokenCodec>,
    fingerprint: TokenFingerprint,
}

impl ValidateTokenUseCase {
    pub fn new(codec: Arc<TokenCodec>, fingerprint: TokenFingerprint) -> Self {
        Self { codec, fingerprint }
    }

    /// トークンを検証する。署名不正・ルール違反は valid=false と理由で返す。
    pub fn execute(&self, token: &str) -> ValidationOutcome {
        let claims = match self.codec.decode(token) {
            Ok(claims) => claims,
            Err(e) => return ValidationOutcome::rejected(e.to_string()),
        };

        match run_rule_chain(&claims, &self.fingerprint, Utc::now()) {
            Ok(()) => ValidationOutcome::ok(claims),
            Err(violation) => ValidationOutcome::rejected(violation.to_string()),
        }
    }
}
