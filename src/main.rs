use std::net::SocketAddr;
use std::sync::Arc;

use vehicle_compliance_platform::db::{create_pool, run_migrations};
use vehicle_compliance_platform::middleware::{AuthLayer, GrpcWebTrailerFixLayer};
use vehicle_compliance_platform::proto::auth::auth_service_server::AuthServiceServer;
use vehicle_compliance_platform::proto::compliance::compliance_service_server::ComplianceServiceServer;
use vehicle_compliance_platform::proto::customer::customer_service_server::CustomerServiceServer;
use vehicle_compliance_platform::proto::dynamicfield::dynamic_field_service_server::DynamicFieldServiceServer;
use vehicle_compliance_platform::proto::health::health_server::HealthServer;
use vehicle_compliance_platform::proto::notification::notification_service_server::NotificationServiceServer;
use vehicle_compliance_platform::proto::permit::permit_service_server::PermitServiceServer;
use vehicle_compliance_platform::proto::policy::policy_service_server::PolicyServiceServer;
use vehicle_compliance_platform::proto::report::report_service_server::ReportServiceServer;
use vehicle_compliance_platform::proto::tenant::tenant_service_server::TenantServiceServer;
use vehicle_compliance_platform::proto::vehicle::vehicle_service_server::VehicleServiceServer;
use vehicle_compliance_platform::reconciler::Reconciler;
use vehicle_compliance_platform::services::{
    AuthServiceImpl, ComplianceServiceImpl, CustomerServiceImpl, DynamicFieldServiceImpl, HealthServiceImpl,
    NotificationServiceImpl, PermitServiceImpl, PolicyServiceImpl, ReportServiceImpl, TenantServiceImpl,
    VehicleServiceImpl,
};
use vehicle_compliance_platform::Config;

use tonic::transport::Server;
use tower_http::cors::{Any, CorsLayer};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

const FILE_DESCRIPTOR_SET: &[u8] = include_bytes!(concat!(env!("OUT_DIR"), "/logi_descriptor.bin"));

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "vehicle_compliance_platform=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env().expect("Failed to load configuration");

    tracing::info!("Starting vehicle-compliance-platform gRPC server...");
    tracing::info!("Connecting to database...");

    let pool = create_pool(&config.database_url).await?;
    tracing::info!("Database connection established");

    run_migrations(&pool).await?;
    tracing::info!("Migrations applied");

    let reconciler = Arc::new(Reconciler::new(pool.clone(), config.reconciler_interval_secs));
    let _reconciler_handle = reconciler.clone().spawn();

    let auth_service = AuthServiceImpl::new(pool.clone(), &config);
    let tenant_service = TenantServiceImpl::new(pool.clone(), reconciler.clone());
    let customer_service = CustomerServiceImpl::new(pool.clone());
    let vehicle_service = VehicleServiceImpl::new(pool.clone());
    let policy_service = PolicyServiceImpl::new(pool.clone());
    let permit_service = PermitServiceImpl::new(pool.clone());
    let compliance_service = ComplianceServiceImpl::new(pool.clone());
    let dynamic_field_service = DynamicFieldServiceImpl::new(pool.clone());
    let report_service = ReportServiceImpl::new(pool.clone());
    let notification_service = NotificationServiceImpl::new(pool.clone());
    let health_service = HealthServiceImpl::new();

    let reflection_service = tonic_reflection::server::Builder::configure()
        .register_encoded_file_descriptor_set(FILE_DESCRIPTOR_SET)
        .build_v1()?;

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_headers(Any)
        .allow_methods(Any)
        .expose_headers(Any);

    let addr: SocketAddr = config.server_addr().parse()?;
    tracing::info!("Listening on {}", addr);

    Server::builder()
        .accept_http1(true)
        .layer(cors)
        .layer(GrpcWebTrailerFixLayer::new())
        .layer(tonic_web::GrpcWebLayer::new())
        .layer(AuthLayer::new(config.jwt_secret.clone()))
        .add_service(AuthServiceServer::new(auth_service))
        .add_service(TenantServiceServer::new(tenant_service))
        .add_service(CustomerServiceServer::new(customer_service))
        .add_service(VehicleServiceServer::new(vehicle_service))
        .add_service(PolicyServiceServer::new(policy_service))
        .add_service(PermitServiceServer::new(permit_service))
        .add_service(ComplianceServiceServer::new(compliance_service))
        .add_service(DynamicFieldServiceServer::new(dynamic_field_service))
        .add_service(ReportServiceServer::new(report_service))
        .add_service(NotificationServiceServer::new(notification_service))
        .add_service(HealthServer::new(health_service))
        .add_service(reflection_service)
        .serve(addr)
        .await?;

    Ok(())
}
