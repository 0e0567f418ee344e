pub mod audit;
pub mod auth;
pub mod compliance;
pub mod config;
pub mod db;
pub mod dynamic_fields;
pub mod error;
pub mod lifecycle;
pub mod middleware;
pub mod models;
pub mod notifications;
pub mod proto;
pub mod reconciler;
pub mod repository;
pub mod reports;
pub mod services;
pub mod tenant_context;

pub use config::Config;
pub use error::{AppError, AppResult};
pub use tenant_context::{ActiveTenant, AuthenticatedUser};
