use std::sync::Arc;

use sqlx::PgPool;
use tonic::{Request, Response, Status};

use crate::auth::Operation;
use crate::models::TenantSettings;
use crate::proto::tenant::tenant_service_server::TenantService;
use crate::proto::tenant::{
    CreateTenantRequest, GetTenantRequest, ReconcileNowRequest, ReconcileNowResponse, SuspendTenantRequest, Tenant,
    UpdateTenantSettingsRequest,
};
use crate::reconciler::Reconciler;
use crate::repository::tenant_repo;
use crate::services::common::{authenticated_user, parse_uuid, require};

pub struct TenantServiceImpl {
    pool: PgPool,
    reconciler: Arc<Reconciler>,
}

impl TenantServiceImpl {
    pub fn new(pool: PgPool, reconciler: Arc<Reconciler>) -> Self {
        Self { pool, reconciler }
    }
}

fn to_proto(tenant: crate::models::Tenant) -> Tenant {
    Tenant {
        id: tenant.id.to_string(),
        name: tenant.name,
        slug: tenant.slug,
        status: tenant.status.as_str().to_string(),
        expiry_reminder_days: tenant.settings.expiry_reminder_days,
        fleet_policies_enabled: tenant.settings.fleet_policies_enabled,
        required_permit_types: tenant.settings.required_permit_types,
    }
}

#[tonic::async_trait]
impl TenantService for TenantServiceImpl {
    async fn create_tenant(&self, request: Request<CreateTenantRequest>) -> Result<Response<Tenant>, Status> {
        let user = authenticated_user(&request)?;
        require(&user, Operation::ManageTenants)?;
        let req = request.into_inner();

        let tenant = tenant_repo::create(&self.pool, &req.name, &req.slug).await?;
        Ok(Response::new(to_proto(tenant)))
    }

    async fn get_tenant(&self, request: Request<GetTenantRequest>) -> Result<Response<Tenant>, Status> {
        let user = authenticated_user(&request)?;
        let req = request.into_inner();
        let tenant_id = parse_uuid(&req.tenant_id, "tenant_id")?;

        if !user.tenant.is_platform() && user.tenant.require_tenant()? != tenant_id {
            return Err(Status::permission_denied("cannot view another tenant"));
        }

        let tenant = tenant_repo::find_by_id(&self.pool, tenant_id).await?;
        Ok(Response::new(to_proto(tenant)))
    }

    async fn update_tenant_settings(
        &self,
        request: Request<UpdateTenantSettingsRequest>,
    ) -> Result<Response<Tenant>, Status> {
        let user = authenticated_user(&request)?;
        require(&user, Operation::ManageTenants)?;
        let req = request.into_inner();
        let tenant_id = parse_uuid(&req.tenant_id, "tenant_id")?;

        let existing = tenant_repo::find_by_id(&self.pool, tenant_id).await?;
        let settings = TenantSettings {
            expiry_reminder_days: req.expiry_reminder_days,
            fleet_policies_enabled: req.fleet_policies_enabled,
            required_permit_types: req.required_permit_types,
            extra: existing.settings.extra,
        };

        let tenant = tenant_repo::update_settings(&self.pool, tenant_id, &settings).await?;
        Ok(Response::new(to_proto(tenant)))
    }

    async fn suspend_tenant(&self, request: Request<SuspendTenantRequest>) -> Result<Response<Tenant>, Status> {
        let user = authenticated_user(&request)?;
        require(&user, Operation::ManageTenants)?;
        let req = request.into_inner();
        let tenant_id = parse_uuid(&req.tenant_id, "tenant_id")?;

        let tenant = tenant_repo::suspend(&self.pool, tenant_id).await?;
        Ok(Response::new(to_proto(tenant)))
    }

    async fn reconcile_now(
        &self,
        request: Request<ReconcileNowRequest>,
    ) -> Result<Response<ReconcileNowResponse>, Status> {
        let user = authenticated_user(&request)?;
        require(&user, Operation::TriggerReconciliation)?;

        let reconciler = self.reconciler.clone();
        tokio::spawn(async move {
            if let Err(err) = reconciler.run_once().await {
                tracing::error!(error = %err, "on-demand reconciliation failed");
            }
        });

        Ok(Response::new(ReconcileNowResponse { accepted: true }))
    }
}
