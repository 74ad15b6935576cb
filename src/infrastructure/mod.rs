pub mod account_grpc;
pub mod token_codec;

pub use account_grpc::GrpcAccountDirectory;
pub use token_codec::{CodecError, SigningScheme, TokenCodec};
