use async_trait::async_trait;

use crate::domain::entity::account::Account;

/// DirectoryError はアカウント台帳サービス呼び出しのエラーを表す。
/// NotFound / AlreadyExists はレース処理のために輸送エラーと区別して扱う。
#[derive(Debug, thiserror::Error)]
pub enum DirectoryError {
    #[error("account not found: {0}")]
    NotFound(String),

    #[error("account already exists: {0}")]
    AlreadyExists(String),

    #[error("directory connection error: {0}")]
    Connection(String),

    #[error("directory internal error: {0}")]
    Internal(String),
}

/// AccountDirectory はアカウント台帳サービス（外部コラボレーター）の契約。
/// `(provider, provider_user_id)` の一意性は台帳サービス側が唯一の権威として
/// 保証する。本サービスはこのトレイト越しに参照・作成するのみ。
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AccountDirectory: Send + Sync {
    /// プロバイダとプロバイダ側ユーザー ID でアカウントを検索する。
    async fn find_by_provider(
        &self,
        provider: &str,
        provider_user_id: &str,
    ) -> Result<Account, DirectoryError>;

    /// アカウントを新規作成する。既存の場合は AlreadyExists を返す。
    async fn create(
        &self,
        provider: &str,
        provider_user_id: &str,
    ) -> Result<Account, DirectoryError>;

    /// アカウント ID でアカウントを取得する。
    async fn find_by_id(&self, id: &str) -> Result<Account, DirectoryError>;
}
