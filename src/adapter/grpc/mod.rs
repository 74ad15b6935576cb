pub mod auth_grpc;
pub mod tonic_service;

pub use auth_grpc::AuthGrpcService;
pub use tonic_service::AuthServiceTonic;
