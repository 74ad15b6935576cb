use std::sync::Arc;

use chrono::{Duration, Utc};
use secrecy::SecretString;

use auth_server::adapter::grpc::auth_grpc::{
    AuthCheckGrpcRequest, AuthGrpcRequest, AuthGrpcService, AuthLogoutGrpcRequest,
    AuthRefreshGrpcRequest, GetAccountByTokenGrpcRequest, GrpcError,
};
use auth_server::domain::entity::account::Account;
use auth_server::domain::entity::claims::{Claims, TokenFingerprint};
use auth_server::domain::repository::account_directory::{AccountDirectory, DirectoryError};
use auth_server::infrastructure::{SigningScheme, TokenCodec};
use auth_server::usecase::{
    AuthenticateUseCase, GetAccountByTokenUseCase, IdentityResolver, LogoutUseCase, RefreshPolicy,
    RefreshTokenUseCase, ValidateTokenUseCase,
};

// --- Test doubles ---

/// InMemoryDirectory は `(provider, provider_user_id)` の一意性を強制する
/// インメモリのアカウント台帳。
struct InMemoryDirectory {
    accounts: tokio::sync::RwLock<Vec<Account>>,
}

impl InMemoryDirectory {
    fn new() -> Self {
        Self {
            accounts: tokio::sync::RwLock::new(Vec::new()),
        }
    }

    async fn delete(&self, id: &str) {
        self.accounts.write().await.retain(|a| a.id != id);
    }
}

#[async_trait::async_trait]
impl AccountDirectory for InMemoryDirectory {
    async fn find_by_provider(
        &self,
        provider: &str,
        provider_user_id: &str,
    ) -> Result<Account, DirectoryError> {
        let accounts = self.accounts.read().await;
        accounts
            .iter()
            .find(|a| a.provider == provider && a.provider_user_id == provider_user_id)
            .cloned()
            .ok_or_else(|| {
                DirectoryError::NotFound(format!("{}/{}", provider, provider_user_id))
            })
    }

    async fn create(
        &self,
        provider: &str,
        provider_user_id: &str,
    ) -> Result<Account, DirectoryError> {
        let mut accounts = self.accounts.write().await;
        if accounts
            .iter()
            .any(|a| a.provider == provider && a.provider_user_id == provider_user_id)
        {
            return Err(DirectoryError::AlreadyExists(format!(
                "{}/{}",
                provider, provider_user_id
            )));
        }
        let account = Account {
            id: uuid::Uuid::new_v4().to_string(),
            provider: provider.to_string(),
            provider_user_id: provider_user_id.to_string(),
            role: "member".to_string(),
        };
        accounts.push(account.clone());
        Ok(account)
    }

    async fn find_by_id(&self, id: &str) -> Result<Account, DirectoryError> {
        let accounts = self.accounts.read().await;
        accounts
            .iter()
            .find(|a| a.id == id)
            .cloned()
            .ok_or_else(|| DirectoryError::NotFound(id.to_string()))
    }
}

fn make_codec(secret: &str) -> Arc<TokenCodec> {
    Arc::new(
        TokenCodec::new(&SigningScheme::Hs256 {
            secret: SecretString::new(secret.to_string()),
        })
        .unwrap(),
    )
}

fn make_service(directory: Arc<InMemoryDirectory>) -> AuthGrpcService {
    let codec = make_codec("integration-secret");
    let resolver = Arc::new(IdentityResolver::new(directory, true));
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

// --- Scenarios ---

#[tokio::test]
async fn test_full_token_lifecycle() {
    let directory = Arc::new(InMemoryDirectory::new());
    let svc = make_service(directory.clone());

    // 初回ログインでアカウントが作成され、トークンペアが発行される
    let auth = svc
        .auth(AuthGrpcRequest {
            provider: "google".to_string(),
            provider_user_id: "user-42".to_string(),
        })
        .await
        .unwrap();
    let account = auth.account.unwrap();
    assert_eq!(account.provider, "google");
    assert_eq!(account.role, "member");

    // アクセストークンは有効
    let check = svc
        .auth_check(AuthCheckGrpcRequest {
            access_token: auth.access_token.clone(),
        })
        .await
        .unwrap();
    assert!(check.valid, "unexpected reason: {}", check.reason);

    // リフレッシュで新しいペアが発行される。発行が同一秒に収まると
    // ローテーション後のトークンはバイト単位では一致しうるため、
    // クレームの形で比較する。
    let refreshed = svc
        .auth_refresh(AuthRefreshGrpcRequest {
            refresh_token: auth.refresh_token.clone(),
        })
        .await
        .unwrap();
    let codec = make_codec("integration-secret");
    let old_claims = codec.decode(&auth.refresh_token).unwrap();
    let rotated_claims = codec.decode(&refreshed.refresh_token).unwrap();
    assert!(rotated_claims.role.is_none());
    assert!(rotated_claims.exp >= old_claims.exp);

    let check = svc
        .auth_check(AuthCheckGrpcRequest {
            access_token: refreshed.access_token.clone(),
        })
        .await
        .unwrap();
    assert!(check.valid);

    // トークンから台帳の最新アカウントを取得できる
    let lookup = svc
        .get_account_by_token(GetAccountByTokenGrpcRequest {
            access_token: refreshed.access_token.clone(),
        })
        .await
        .unwrap();
    assert_eq!(lookup.account.unwrap().id, account.id);

    // ログアウトは受理される
    let logout = svc
        .auth_logout(AuthLogoutGrpcRequest {
            access_token: refreshed.access_token,
        })
        .await
        .unwrap();
    assert!(logout.ok);
}

#[tokio::test]
async fn test_second_login_reuses_account() {
    let directory = Arc::new(InMemoryDirectory::new());
    let svc = make_service(directory);

    let first = svc
        .auth(AuthGrpcRequest {
            provider: "google".to_string(),
            provider_user_id: "user-42".to_string(),
        })
        .await
        .unwrap();
    let second = svc
        .auth(AuthGrpcRequest {
            provider: "google".to_string(),
            provider_user_id: "user-42".to_string(),
        })
        .await
        .unwrap();

    assert_eq!(
        first.account.unwrap().id,
        second.account.unwrap().id,
        "same identity must map to the same account"
    );
}

#[tokio::test]
async fn test_concurrent_first_logins_share_one_account() {
    let directory = Arc::new(InMemoryDirectory::new());
    let svc = Arc::new(make_service(directory.clone()));

    let mut handles = Vec::new();
    for _ in 0..8 {
        let svc = svc.clone();
        handles.push(tokio::spawn(async move {
            svc.auth(AuthGrpcRequest {
                provider: "github".to_string(),
                provider_user_id: "user-7".to_string(),
            })
            .await
            .unwrap()
        }));
    }

    let mut ids = Vec::new();
    for handle in handles {
        ids.push(handle.await.unwrap().account.unwrap().id);
    }
    ids.sort();
    ids.dedup();
    assert_eq!(ids.len(), 1, "concurrent logins created duplicate accounts");
    assert_eq!(directory.accounts.read().await.len(), 1);
}

#[tokio::test]
async fn test_expired_access_token_rejected_but_refresh_still_works() {
    let directory = Arc::new(InMemoryDirectory::new());
    let svc = make_service(directory.clone());

    let auth = svc
        .auth(AuthGrpcRequest {
            provider: "google".to_string(),
            provider_user_id: "user-42".to_string(),
        })
        .await
        .unwrap();
    let account_id = auth.account.unwrap().id;

    // 期限切れのアクセストークンを直接作る
    let codec = make_codec("integration-secret");
    let expired_claims = Claims::access(
        &TokenFingerprint::default(),
        &account_id,
        "member",
        Utc::now() - Duration::hours(2),
        Duration::hours(1),
    );
    let expired = codec.encode(&expired_claims).unwrap();

    let check = svc
        .auth_check(AuthCheckGrpcRequest {
            access_token: expired,
        })
        .await
        .unwrap();
    assert!(!check.valid);
    assert_eq!(check.reason, "token expired");

    // リフレッシュトークンはまだ有効で、新しいアクセストークンが得られる
    let refreshed = svc
        .auth_refresh(AuthRefreshGrpcRequest {
            refresh_token: auth.refresh_token,
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
async fn test_foreign_deployment_token_rejected() {
    let directory = Arc::new(InMemoryDirectory::new());
    let svc = make_service(directory);

    let codec = make_codec("integration-secret");
    let foreign_fp = TokenFingerprint {
        audience: "other-gateway".to_string(),
        ..TokenFingerprint::default()
    };
    let claims = Claims::access(&foreign_fp, "acc-1", "member", Utc::now(), Duration::hours(1));
    let token = codec.encode(&claims).unwrap();

    let check = svc
        .auth_check(AuthCheckGrpcRequest {
            access_token: token,
        })
        .await
        .unwrap();
    assert!(!check.valid);
    assert_eq!(check.reason, "token audience mismatch");
}

#[tokio::test]
async fn test_tampered_token_rejected() {
    let directory = Arc::new(InMemoryDirectory::new());
    let svc = make_service(directory);

    let auth = svc
        .auth(AuthGrpcRequest {
            provider: "google".to_string(),
            provider_user_id: "user-42".to_string(),
        })
        .await
        .unwrap();

    let (head, signature) = auth.access_token.rsplit_once('.').unwrap();
    let mut sig: Vec<u8> = signature.bytes().collect();
    sig[0] = if sig[0] == b'A' { b'B' } else { b'A' };
    let tampered = format!("{}.{}", head, String::from_utf8(sig).unwrap());

    let check = svc
        .auth_check(AuthCheckGrpcRequest {
            access_token: tampered,
        })
        .await
        .unwrap();
    assert!(!check.valid);
}

#[tokio::test]
async fn test_account_lookup_after_deletion_is_empty_not_error() {
    let directory = Arc::new(InMemoryDirectory::new());
    let svc = make_service(directory.clone());

    let auth = svc
        .auth(AuthGrpcRequest {
            provider: "google".to_string(),
            provider_user_id: "user-42".to_string(),
        })
        .await
        .unwrap();

    directory.delete(&auth.account.unwrap().id).await;

    // 有効なトークン + 消滅済みアカウントは正常系の空応答
    let lookup = svc
        .get_account_by_token(GetAccountByTokenGrpcRequest {
            access_token: auth.access_token,
        })
        .await
        .unwrap();
    assert!(lookup.account.is_none());
}

#[tokio::test]
async fn test_refresh_after_account_deletion_is_not_found() {
    let directory = Arc::new(InMemoryDirectory::new());
    let svc = make_service(directory.clone());

    let auth = svc
        .auth(AuthGrpcRequest {
            provider: "google".to_string(),
            provider_user_id: "user-42".to_string(),
        })
        .await
        .unwrap();

    directory.delete(&auth.account.unwrap().id).await;

    let result = svc
        .auth_refresh(AuthRefreshGrpcRequest {
            refresh_token: auth.refresh_token,
        })
        .await;
    assert!(matches!(result.unwrap_err(), GrpcError::NotFound(_)));
}

#[tokio::test]
async fn test_refresh_picks_up_role_change() {
    let directory = Arc::new(InMemoryDirectory::new());
    let svc = make_service(directory.clone());
    let codec = make_codec("integration-secret");

    let auth = svc
        .auth(AuthGrpcRequest {
            provider: "google".to_string(),
            provider_user_id: "user-42".to_string(),
        })
        .await
        .unwrap();
    let account_id = auth.account.unwrap().id;

    // 台帳側でロールが昇格する
    {
        let mut accounts = directory.accounts.write().await;
        if let Some(a) = accounts.iter_mut().find(|a| a.id == account_id) {
            a.role = "admin".to_string();
        }
    }

    let refreshed = svc
        .auth_refresh(AuthRefreshGrpcRequest {
            refresh_token: auth.refresh_token,
        })
        .await
        .unwrap();
    let claims = codec.decode(&refreshed.access_token).unwrap();
    assert_eq!(claims.role.as_deref(), Some("admin"));
}
