pub mod auth;
pub mod grpc_web_fix;

pub use auth::AuthLayer;
pub use grpc_web_fix::GrpcWebTrailerFixLayer;
