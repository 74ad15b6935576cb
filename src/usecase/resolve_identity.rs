use std::sync::Arc;

use crate::domain::entity::account::Account;
use crate::domain::repository::account_directory::{AccountDirectory, DirectoryError};

/// ResolveError はアイデンティティ解決に関するエラーを表す。
#[derive(Debug, thiserror::Error)]
pub enum ResolveError {
    #[error("account not found: {0}")]
    NotFound(String),

    #[error("internal error: {0}")]
    Internal(String),
}

/// IdentityResolver は外部プロバイダのアイデンティティを内部 Account へ対応付ける。
///
/// `auto_provision` が有効な場合、未登録のアイデンティティは台帳サービスに
/// 新規作成を依頼する（find-or-create）。`(provider, provider_user_id)` の
/// 一意性は台帳サービスが唯一の権威であり、作成の競合は致命的エラーではなく
/// 「別の初回ログインに先を越された」ものとして再検索で解決する。
pub struct IdentityResolver {
    directory: Arc<dyn AccountDirectory>,
    auto_provision: bool,
}

impl IdentityResolver {
    pub fn new(directory: Arc<dyn AccountDirectory>, auto_provision: bool) -> Self {
        Self {
            directory,
            auto_provision,
        }
    }

    /// `(provider, provider_user_id)` に対応するアカウントを検索し、
    /// 存在しなければ（auto_provision 有効時のみ）作成して返す。
    /// プレースホルダーのアカウントを合成することはない。
    pub async fn resolve_or_create(
        &self,
        provider: &str,
        provider_user_id: &str,
    ) -> Result<Account, ResolveError> {
        let subject = format!("{}/{}", provider, provider_user_id);

        match self.directory.find_by_provider(provider, provider_user_id).await {
            Ok(account) => Ok(account),
            Err(DirectoryError::NotFound(_)) if self.auto_provision => {
                match self.directory.create(provider, provider_user_id).await {
                    Ok(account) => Ok(account),
                    // 同一アイデンティティの同時初回ログインに敗れたケース。
                    // 台帳の一意性制約が勝者を決めているので、一度だけ再検索する。
                    Err(DirectoryError::AlreadyExists(_)) => {
                        match self.directory.find_by_provider(provider, provider_user_id).await {
                            Ok(account) => Ok(account),
                            Err(e) => Err(ResolveError::Internal(format!(
                                "lookup after creation conflict failed: {}",
                                e
                            ))),
                        }
                    }
                    Err(e) => Err(ResolveError::Internal(e.to_string())),
                }
            }
            Err(DirectoryError::NotFound(_)) => Err(ResolveError::NotFound(subject)),
            Err(e) => Err(ResolveError::Internal(e.to_string())),
        }
    }

    /// アカウント ID で取得する。台帳の NotFound は通常の結果として None を返す。
    pub async fn resolve_by_id(&self, id: &str) -> Result<Option<Account>, ResolveError> {
        match self.directory.find_by_id(id).await {
            Ok(account) => Ok(Some(account)),
            Err(DirectoryError::NotFound(_)) => Ok(None),
            Err(e) => Err(ResolveError::Internal(e.to_string())),
        }
    }
}
