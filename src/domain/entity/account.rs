use serde::{Deserialize, Serialize};

/// Account はアカウント台帳サービスが所有するアカウントを表す。
/// 本サービスからは読み取り専用で、`id` は作成後不変。
/// `(provider, provider_user_id)` の組は高々ひとつの Account に対応する。
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Account {
    pub id: String,
    pub provider: String,
    pub provider_user_id: String,
    pub role: String,
}
