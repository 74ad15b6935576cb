use chrono::{DateTime, Utc};

use crate::domain::entity::claims::{Claims, TokenFingerprint};

/// RuleViolation は検証ルールの失敗理由を表す。
/// Display 文字列がそのまま呼び出し元へ返す reason になる。
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RuleViolation {
    #[error("token audience mismatch")]
    AudienceMismatch,

    #[error("token issuer mismatch")]
    IssuerMismatch,

    #[error("token subject mismatch")]
    SubjectMismatch,

    #[error("token not yet valid")]
    NotYetValid,

    #[error("token expired")]
    Expired,

    #[error("token identifier mismatch")]
    IdentifierMismatch,
}

/// ClaimRule はデコード済み Claims に対する単一の検証述語。
/// Claims と現在時刻のみを読む純粋な判定で、台帳サービスには決して触れない。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClaimRule {
    Audience,
    Issuer,
    Subject,
    NotBefore,
    NotExpired,
    Identifier,
}

/// 検証ルールの固定順序。先頭から順に評価し、最初の失敗で打ち切る。
pub const RULE_CHAIN: [ClaimRule; 6] = [
    ClaimRule::Audience,
    ClaimRule::Issuer,
    ClaimRule::Subject,
    ClaimRule::NotBefore,
    ClaimRule::NotExpired,
    ClaimRule::Identifier,
];

impl ClaimRule {
    /// 単一ルールを評価する。
    pub fn check(
        &self,
        claims: &Claims,
        fingerprint: &TokenFingerprint,
        now: DateTime<Utc>,
    ) -> Result<(), RuleViolation> {
        match self {
            ClaimRule::Audience => {
                if claims.aud != fingerprint.audience {
                    return Err(RuleViolation::AudienceMismatch);
                }
            }
            ClaimRule::Issuer => {
                if claims.iss != fingerprint.issuer {
                    return Err(RuleViolation::IssuerMismatch);
                }
            }
            ClaimRule::Subject => {
                if claims.sub != fingerprint.subject {
                    return Err(RuleViolation::SubjectMismatch);
                }
            }
            ClaimRule::NotBefore => {
                if claims.nbf > now.timestamp() {
                    return Err(RuleViolation::NotYetValid);
                }
            }
            // 有効期限は厳密な `now < exp`
            ClaimRule::NotExpired => {
                if now.timestamp() >= claims.exp {
                    return Err(RuleViolation::Expired);
                }
            }
            ClaimRule::Identifier => {
                if claims.jti != fingerprint.identifier {
                    return Err(RuleViolation::IdentifierMismatch);
                }
            }
        }
        Ok(())
    }
}

/// ルールチェーンを順に評価し、最初の違反を返す。
pub fn run_rule_chain(
    claims: &Claims,
    fingerprint: &TokenFingerprint,
    now: DateTime<Utc>,
) -> Result<(), RuleViolation> {
    for rule in &RULE_CHAIN {
        rule.check(claims, fingerprint, now)?;
    }
    Ok(())
}
