use async_trait::async_trait;
use tonic::transport::Channel;
use tonic::{Code, Status};

use crate::domain::entity::account::Account;
use crate::domain::repository::account_directory::{AccountDirectory, DirectoryError};
use crate::proto::account::v1::account_service_client::AccountServiceClient;
use crate::proto::account::v1::{
    Account as ProtoAccount, CreateAccountRequest, GetAccountByProviderRequest, GetAccountRequest,
};

/// GrpcAccountDirectory はアカウント台帳サービスへの gRPC クライアント実装。
/// Channel は内部で多重化されるため、呼び出しごとのクローンで十分。
pub struct GrpcAccountDirectory {
    client: AccountServiceClient<Channel>,
}

impl GrpcAccountDirectory {
    /// 指定エンドポイントへ接続する。接続失敗は起動時エラーとして扱う。
    pub async fn connect(endpoint: String) -> Result<Self, tonic::transport::Error> {
        let client = AccountServiceClient::connect(endpoint).await?;
        Ok(Self { client })
    }

    pub fn new(client: AccountServiceClient<Channel>) -> Self {
        Self { client }
    }
}

/// tonic::Status を DirectoryError へ変換する。
/// NotFound / AlreadyExists は台帳の意味的な応答であり、輸送エラーと区別する。
fn status_to_directory_error(status: &Status, subject: &str) -> DirectoryError {
    match status.code() {
        Code::NotFound => DirectoryError::NotFound(subject.to_string()),
        Code::AlreadyExists => DirectoryError::AlreadyExists(subject.to_string()),
        Code::Unavailable | Code::DeadlineExceeded | Code::Cancelled => {
            DirectoryError::Connection(status.message().to_string())
        }
        _ => DirectoryError::Internal(status.message().to_string()),
    }
}

fn proto_to_account(account: ProtoAccount) -> Account {
    Account {
        id: account.id,
        provider: account.provider,
        provider_user_id: account.provider_user_id,
        role: account.role,
    }
}

#[async_trait]
impl AccountDirectory for GrpcAccountDirectory {
    async fn find_by_provider(
        &self,
        provider: &str,
        provider_user_id: &str,
    ) -> Result<Account, DirectoryError> {
        let subject = format!("{}/{}", provider, provider_user_id);
        let mut client = self.client.clone();
        let resp = client
            .get_account_by_provider(GetAccountByProviderRequest {
                provider: provider.to_string(),
                provider_user_id: provider_user_id.to_string(),
            })
            .await
            .map_err(|status| status_to_directory_error(&status, &subject))?;

        resp.into_inner()
            .account
            .map(proto_to_account)
            .ok_or_else(|| DirectoryError::NotFound(subject))
    }

    async fn create(
        &self,
        provider: &str,
        provider_user_id: &str,
    ) -> Result<Account, DirectoryError> {
        let subject = format!("{}/{}", provider, provider_user_id);
        let mut client = self.client.clone();
        let resp = client
            .create_account(CreateAccountRequest {
                provider: provider.to_string(),
                provider_user_id: provider_user_id.to_string(),
            })
            .await
            .map_err(|status| status_to_directory_error(&status, &subject))?;

        resp.into_inner()
            .account
            .map(proto_to_account)
            .ok_or_else(|| {
                DirectoryError::Internal(format!("create returned no account: {}", subject))
            })
    }

    async fn find_by_id(&self, id: &str) -> Result<Account, DirectoryError> {
        let mut client = self.client.clone();
        let resp = client
            .get_account(GetAccountRequest { id: id.to_string() })
            .await
            .map_err(|status| status_to_directory_error(&status, id))?;

        resp.into_inner()
            .account
            .map(proto_to_account)
            .ok_or_else(|| DirectoryError::NotFound(id.to_string()))
    }
}
