//! tonic gRPC サービス実装。
//!
//! proto 生成コード (`src/proto/`) の AuthService トレイトを実装する。
//! 各メソッドで proto 型 ↔ 手動型の変換を行い、AuthGrpcService に委譲する。

use std::sync::Arc;

use tonic::{Request, Response, Status};

use crate::proto::auth::v1::{
    auth_service_server::AuthService, Account as ProtoAccount, AuthCheckRequest, AuthCheckResponse,
    AuthLogoutRequest, AuthLogoutResponse, AuthRefreshRequest, AuthRefreshResponse, AuthRequest,
    AuthResponse, GetAccountByTokenRequest, GetAccountByTokenResponse,
};

use super::auth_grpc::{
    AuthCheckGrpcRequest, AuthGrpcRequest, AuthGrpcService, AuthLogoutGrpcRequest,
    AuthRefreshGrpcRequest, GetAccountByTokenGrpcRequest, GrpcError, PbAccount,
};

// --- GrpcError -> tonic::Status 変換 ---

impl From<GrpcError> for Status {
    fn from(e: GrpcError) -> Self {
        match e {
            GrpcError::InvalidArgument(msg) => Status::invalid_argument(msg),
            GrpcError::NotFound(msg) => Status::not_found(msg),
            GrpcError::Unauthenticated(msg) => Status::unauthenticated(msg),
            GrpcError::Internal(msg) => Status::internal(msg),
        }
    }
}

fn pb_account_to_proto(account: PbAccount) -> ProtoAccount {
    ProtoAccount {
        id: account.id,
        provider: account.provider,
        provider_user_id: account.provider_user_id,
        role: account.role,
    }
}

// --- AuthService tonic ラッパー ---

/// AuthServiceTonic は tonic の AuthService として AuthGrpcService をラップする。
pub struct AuthServiceTonic {
    inner: Arc<AuthGrpcService>,
}

impl AuthServiceTonic {
    pub fn new(inner: Arc<AuthGrpcService>) -> Self {
        Self { inner }
    }
}

#[async_trait::async_trait]
impl AuthService for AuthServiceTonic {
    async fn auth(
        &self,
        request: Request<AuthRequest>,
    ) -> Result<Response<AuthResponse>, Status> {
        let inner = request.into_inner();
        let req = AuthGrpcRequest {
            provider: inner.provider,
            provider_user_id: inner.provider_user_id,
        };
        let resp = self.inner.auth(req).await.map_err(Into::<Status>::into)?;

        Ok(Response::new(AuthResponse {
            access_token: resp.access_token,
            refresh_token: resp.refresh_token,
            account: resp.account.map(pb_account_to_proto),
        }))
    }

    async fn auth_check(
        &self,
        request: Request<AuthCheckRequest>,
    ) -> Result<Response<AuthCheckResponse>, Status> {
        let req = AuthCheckGrpcRequest {
            access_token: request.into_inner().token,
        };
        let resp = self
            .inner
            .auth_check(req)
            .await
            .map_err(Into::<Status>::into)?;

        Ok(Response::new(AuthCheckResponse {
            valid: resp.valid,
            reason: resp.reason,
        }))
    }

    async fn auth_refresh(
        &self,
        request: Request<AuthRefreshRequest>,
    ) -> Result<Response<AuthRefreshResponse>, Status> {
        let req = AuthRefreshGrpcRequest {
            refresh_token: request.into_inner().token,
        };
        let resp = self
            .inner
            .auth_refresh(req)
            .await
            .map_err(Into::<Status>::into)?;

        Ok(Response::new(AuthRefreshResponse {
            access_token: resp.access_token,
            refresh_token: resp.refresh_token,
        }))
    }

    async fn auth_logout(
        &self,
        request: Request<AuthLogoutRequest>,
    ) -> Result<Response<AuthLogoutResponse>, Status> {
        let req = AuthLogoutGrpcRequest {
            access_token: request.into_inner().token,
        };
        let resp = self
            .inner
            .auth_logout(req)
            .await
            .map_err(Into::<Status>::into)?;

        Ok(Response::new(AuthLogoutResponse { ok: resp.ok }))
    }

    async fn get_account_by_token(
        &self,
        request: Request<GetAccountByTokenRequest>,
    ) -> Result<Response<GetAccountByTokenResponse>, Status> {
        let req = GetAccountByTokenGrpcRequest {
            access_token: request.into_inner().token,
        };
        let resp = self
            .inner
            .get_account_by_token(req)
            .await
            .map_err(Into::<Status>::into)?;

        Ok(Response::new(GetAccountByTokenResponse {
            account: resp.account.map(pb_account_to_proto),
        }))
    }
}
