use std::net::SocketAddr;
use std::sync::Arc;

use tracing::info;

use auth_server::adapter::grpc::{AuthGrpcService, AuthServiceTonic};
use auth_server::domain::entity::claims::TokenFingerprint;
use auth_server::infrastructure::{GrpcAccountDirectory, SigningScheme, TokenCodec};
use auth_server::proto::auth::v1::auth_service_server::AuthServiceServer;
use auth_server::usecase::{
    AuthenticateUseCase, GetAccountByTokenUseCase, IdentityResolver, LogoutUseCase, RefreshPolicy,
    RefreshTokenUseCase, ValidateTokenUseCase,
};

/// Application configuration.
#[derive(Debug, Clone, serde::Deserialize)]
struct Config {
    app: AppConfig,
    server: ServerConfig,
    directory: DirectoryConfig,
    token: TokenConfig,
    #[serde(default)]
    refresh: RefreshConfig,
}

#[derive(Debug, Clone, serde::Deserialize)]
struct AppConfig {
    name: String,
    #[serde(default = "default_version")]
    version: String,
    #[serde(default = "default_environment")]
    environment: String,
}

fn default_version() -> String {
    "0.1.0".to_string()
}

fn default_environment() -> String {
    "dev".to_string()
}

#[derive(Debug, Clone, serde::Deserialize)]
struct ServerConfig {
    #[serde(default = "default_host")]
    host: String,
    #[serde(default = "default_port")]
    port: u16,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    50051
}

/// アカウント台帳サービスへの接続設定。
#[derive(Debug, Clone, serde::Deserialize)]
struct DirectoryConfig {
    addr: String,
    #[serde(default = "default_auto_provision")]
    auto_provision: bool,
}

fn default_auto_provision() -> bool {
    true
}

/// トークン発行・検証の設定。
#[derive(Debug, Clone, serde::Deserialize)]
struct TokenConfig {
    signing: SigningScheme,
    #[serde(default)]
    fingerprint: TokenFingerprint,
    #[serde(default = "default_access_ttl_secs")]
    access_ttl_secs: i64,
    #[serde(default = "default_refresh_ttl_secs")]
    refresh_ttl_secs: i64,
}

fn default_access_ttl_secs() -> i64 {
    24 * 3600
}

fn default_refresh_ttl_secs() -> i64 {
    7 * 24 * 3600
}

/// トークン再発行の設定。
#[derive(Debug, Clone, serde::Deserialize)]
struct RefreshConfig {
    #[serde(default = "default_refetch_role")]
    refetch_role: bool,
    #[serde(default = "default_rotate_refresh_token")]
    rotate_refresh_token: bool,
}

impl Default for RefreshConfig {
    fn default() -> Self {
        Self {
            refetch_role: default_refetch_role(),
            rotate_refresh_token: default_rotate_refresh_token(),
        }
    }
}

fn default_refetch_role() -> bool {
    true
}

fn default_rotate_refresh_token() -> bool {
    true
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Logging
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .json()
        .init();

    // Config
    let config_path =
        std::env::var("CONFIG_PATH").unwrap_or_else(|_| "config/config.yaml".to_string());
    let config_content = std::fs::read_to_string(&config_path)?;
    let mut cfg: Config = serde_yaml::from_str(&config_content)?;

    if let Ok(port) = std::env::var("LISTEN_PORT") {
        cfg.server.port = port.parse()?;
    }
    if let Ok(addr) = std::env::var("DIRECTORY_ADDR") {
        cfg.directory.addr = addr;
    }

    info!(
        app_name = %cfg.app.name,
        version = %cfg.app.version,
        environment = %cfg.app.environment,
        "starting auth server"
    );

    // 鍵の読み込み失敗は起動時に落とす
    let codec = Arc::new(TokenCodec::new(&cfg.token.signing)?);

    info!(addr = %cfg.directory.addr, "connecting to account directory");
    let directory = GrpcAccountDirectory::connect(cfg.directory.addr.clone()).await?;
    let resolver = Arc::new(IdentityResolver::new(
        Arc::new(directory),
        cfg.directory.auto_provision,
    ));

    let fingerprint = cfg.token.fingerprint.clone();
    let access_ttl = chrono::Duration::seconds(cfg.token.access_ttl_secs);
    let refresh_ttl = chrono::Duration::seconds(cfg.token.refresh_ttl_secs);

    let authenticate_uc = Arc::new(AuthenticateUseCase::new(
        resolver.clone(),
        codec.clone(),
        fingerprint.clone(),
        access_ttl,
        refresh_ttl,
    ));
    let validate_uc = Arc::new(ValidateTokenUseCase::new(codec.clone(), fingerprint.clone()));
    let refresh_uc = Arc::new(RefreshTokenUseCase::new(
        resolver.clone(),
        codec.clone(),
        fingerprint.clone(),
        access_ttl,
        refresh_ttl,
        RefreshPolicy {
            rotate_refresh_token: cfg.refresh.rotate_refresh_token,
            refetch_role: cfg.refresh.refetch_role,
        },
    ));
    let logout_uc = Arc::new(LogoutUseCase::new(codec.clone()));
    let account_uc = Arc::new(GetAccountByTokenUseCase::new(resolver, codec, fingerprint));

    let auth_grpc_svc = Arc::new(AuthGrpcService::new(
        authenticate_uc,
        validate_uc,
        refresh_uc,
        logout_uc,
        account_uc,
    ));
    let auth_tonic = AuthServiceTonic::new(auth_grpc_svc);

    // ヘルスチェック (grpc.health.v1.Health)
    let (mut health_reporter, health_service) = tonic_health::server::health_reporter();
    health_reporter
        .set_serving::<AuthServiceServer<AuthServiceTonic>>()
        .await;

    let addr: SocketAddr = format!("{}:{}", cfg.server.host, cfg.server.port).parse()?;
    info!("gRPC server starting on {}", addr);

    tonic::transport::Server::builder()
        .add_service(health_service)
        .add_service(AuthServiceServer::new(auth_tonic))
        .serve(addr)
        .await?;

    Ok(())
}
