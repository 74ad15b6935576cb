use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;

use crate::domain::entity::claims::Claims;

/// CodecError はトークンのエンコード・デコードに関するエラーを表す。
/// メッセージに鍵素材を含めてはならない。
#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    #[error("invalid signing key: {0}")]
    InvalidKey(String),

    #[error("token encoding failed: {0}")]
    Encode(String),

    #[error("invalid token: {0}")]
    Decode(String),
}

/// SigningScheme は署名方式の設定。デプロイメントごとにひとつ固定する。
/// 対称 MAC（共有シークレット）か非対称署名（Ed25519 鍵ペア）のいずれか。
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "scheme", rename_all = "kebab-case")]
pub enum SigningScheme {
    /// HMAC-SHA256 の共有シークレット。
    Hs256 { secret: SecretString },
    /// Ed25519 鍵ペア（PKCS#8 PEM）。秘密鍵は署名、公開鍵は検証にのみ使う。
    EdDsa {
        private_key_pem: SecretString,
        public_key_pem: String,
    },
}

/// TokenCodec は Claims を署名付きトークン文字列へ変換し、また復元する。
///
/// 鍵素材は起動時に一度だけ読み込まれ、以降は不変。プロセス内で共有しても
/// 同期は不要。decode は署名検証を先に行い、検証に通らない限りクレームを
/// 一切返さない。時刻・フィンガープリントの検証はルールチェーンの責務で、
/// ここでは行わない。
pub struct TokenCodec {
    algorithm: Algorithm,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
}

impl TokenCodec {
    /// 署名方式設定から TokenCodec を構築する。鍵の読み込み失敗は起動時エラー。
    pub fn new(scheme: &SigningScheme) -> Result<Self, CodecError> {
        let (algorithm, encoding_key, decoding_key) = match scheme {
            SigningScheme::Hs256 { secret } => {
                let bytes = secret.expose_secret().as_bytes();
                (
                    Algorithm::HS256,
                    EncodingKey::from_secret(bytes),
                    DecodingKey::from_secret(bytes),
                )
            }
            SigningScheme::EdDsa {
                private_key_pem,
                public_key_pem,
            } => {
                let encoding_key =
                    EncodingKey::from_ed_pem(private_key_pem.expose_secret().as_bytes())
                        .map_err(|e| CodecError::InvalidKey(e.to_string()))?;
                let decoding_key = DecodingKey::from_ed_pem(public_key_pem.as_bytes())
                    .map_err(|e| CodecError::InvalidKey(e.to_string()))?;
                (Algorithm::EdDSA, encoding_key, decoding_key)
            }
        };

        // exp / nbf / aud の検証は無効化する。失効やフィンガープリントの判定は
        // ルールチェーンが同じ reason 体系で行うため、ここでは署名と形状のみを見る。
        let mut validation = Validation::new(algorithm);
        validation.validate_exp = false;
        validation.validate_nbf = false;
        validation.validate_aud = false;
        validation.required_spec_claims.clear();

        Ok(Self {
            algorithm,
            encoding_key,
            decoding_key,
            validation,
        })
    }

    /// Claims を署名し、不透明なトークン文字列を返す。
    pub fn encode(&self, claims: &Claims) -> Result<String, CodecError> {
        encode(&Header::new(self.algorithm), claims, &self.encoding_key)
            .map_err(|e| CodecError::Encode(e.to_string()))
    }

    /// トークンの署名を検証し、Claims を復元する。
    /// 署名不正・構造不正・必須フィールド欠落はすべて Decode エラー。
    pub fn decode(&self, token: &str) -> Result<Claims, CodecError> {
        decode::<Claims>(token, &self.decoding_key, &self.validation)
            .map(|data| data.claims)
            .map_err(|e| CodecError::Decode(e.to_string()))
    }
}
