pub mod auth_service;
pub mod common;
pub mod compliance_service;
pub mod customer_service;
pub mod dynamic_field_service;
pub mod health_service;
pub mod notification_service;
pub mod permit_service;
pub mod policy_service;
pub mod report_service;
pub mod tenant_service;
pub mod vehicle_service;

pub use auth_service::AuthServiceImpl;
pub use compliance_service::ComplianceServiceImpl;
pub use customer_service::CustomerServiceImpl;
pub use dynamic_field_service::DynamicFieldServiceImpl;
pub use health_service::HealthServiceImpl;
pub use notification_service::NotificationServiceImpl;
pub use permit_service::PermitServiceImpl;
pub use policy_service::PolicyServiceImpl;
pub use report_service::ReportServiceImpl;
pub use tenant_service::TenantServiceImpl;
pub use vehicle_service::VehicleServiceImpl;
