use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// TokenFingerprint はトークンをひとつのデプロイメントに束縛する固定クレーム定数。
/// 発行時に全トークンへ埋め込み、検証時に毎回照合する。
/// 異なるデプロイメント・オーディエンス間のトークン再利用に対する第一の防御となる。
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TokenFingerprint {
    pub issuer: String,
    pub audience: String,
    pub subject: String,
    pub identifier: String,
}

impl Default for TokenFingerprint {
    fn default() -> Self {
        Self {
            issuer: "issuer".to_string(),
            audience: "audience".to_string(),
            subject: "subject".to_string(),
            identifier: "identifier".to_string(),
        }
    }
}

/// Claims はトークンに埋め込むクレームを表す。
///
/// `sub` / `iss` / `aud` / `jti` はデプロイメント定数（フィンガープリント）、
/// `iat` / `nbf` / `exp` は unix 秒のタイムスタンプで `nbf <= iat < exp` を満たす。
/// `id` はアカウント ID。`role` はアクセストークンのみが持つ発行時点のロールの
/// スナップショットで、再発行までの陳腐化は許容される。
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Claims {
    pub sub: String,
    pub iss: String,
    pub aud: String,
    pub jti: String,
    pub iat: i64,
    pub nbf: i64,
    pub exp: i64,
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
}

impl Claims {
    /// アクセストークン用の Claims を構築する。
    pub fn access(
        fingerprint: &TokenFingerprint,
        account_id: &str,
        role: &str,
        now: DateTime<Utc>,
        ttl: Duration,
    ) -> Self {
        Self {
            role: Some(role.to_string()),
            ..Self::refresh(fingerprint, account_id, now, ttl)
        }
    }

    /// リフレッシュトークン用の Claims を構築する（role を持たない）。
    pub fn refresh(
        fingerprint: &TokenFingerprint,
        account_id: &str,
        now: DateTime<Utc>,
        ttl: Duration,
    ) -> Self {
        let now_ts = now.timestamp();
        Self {
            sub: fingerprint.subject.clone(),
            iss: fingerprint.issuer.clone(),
            aud: fingerprint.audience.clone(),
            jti: fingerprint.identifier.clone(),
            iat: now_ts,
            nbf: now_ts,
            exp: now_ts + ttl.num_seconds(),
            id: account_id.to_string(),
            role: None,
        }
    }
}
