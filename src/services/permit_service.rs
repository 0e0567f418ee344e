use sqlx::PgPool;
use tonic::{Request, Response, Status};

use crate::auth::Operation;
use crate::models::{Permit, PermitCancellationReason};
use crate::proto::permit::permit_service_server::PermitService;
use crate::proto::permit::{
    ActivatePermitRequest, CancelPermitRequest, CreatePermitDraftRequest, GetPermitRequest,
    ListPermitsForVehicleRequest, ListPermitsForVehicleResponse,
};
use crate::repository::permit_repo;
use crate::services::common::{authenticated_user, parse_date, parse_uuid, require, scoped_tenant};

pub struct PermitServiceImpl {
    pool: PgPool,
}

impl PermitServiceImpl {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn to_proto(permit: Permit) -> crate::proto::permit::Permit {
    crate::proto::permit::Permit {
        id: permit.id.to_string(),
        tenant_id: permit.tenant_id.to_string(),
        vehicle_id: permit.vehicle_id.to_string(),
        permit_type: permit.permit_type,
        reference_number: permit.reference_number,
        issuing_authority: permit.issuing_authority,
        start_date: permit.start_date.to_string(),
        end_date: permit.end_date.to_string(),
        status: permit.status,
        activated_at: permit.activated_at.map(|t| t.to_rfc3339()),
        cancelled_at: permit.cancelled_at.map(|t| t.to_rfc3339()),
        cancellation_reason: permit.cancellation_reason,
        cancellation_note: permit.cancellation_note,
    }
}

#[tonic::async_trait]
impl PermitService for PermitServiceImpl {
    async fn create_permit_draft(
        &self,
        request: Request<CreatePermitDraftRequest>,
    ) -> Result<Response<crate::proto::permit::Permit>, Status> {
        let user = authenticated_user(&request)?;
        require(&user, Operation::ManagePermits)?;
        let tenant_id = scoped_tenant(&user)?;
        let req = request.into_inner();

        let vehicle_id = parse_uuid(&req.vehicle_id, "vehicle_id")?;
        let start_date = parse_date(&req.start_date, "start_date")?;
        let end_date = parse_date(&req.end_date, "end_date")?;
        if end_date <= start_date {
            return Err(Status::invalid_argument("end_date must be after start_date"));
        }

        let permit = permit_repo::create_draft(
            &self.pool,
            tenant_id,
            vehicle_id,
            &req.permit_type,
            &req.reference_number,
            &req.issuing_authority,
            start_date,
            end_date,
        )
        .await?;

        Ok(Response::new(to_proto(permit)))
    }

    async fn get_permit(
        &self,
        request: Request<GetPermitRequest>,
    ) -> Result<Response<crate::proto::permit::Permit>, Status> {
        let user = authenticated_user(&request)?;
        let tenant_id = scoped_tenant(&user)?;
        let req = request.into_inner();
        let permit_id = parse_uuid(&req.permit_id, "permit_id")?;

        let permit = permit_repo::find_by_id(&self.pool, tenant_id, permit_id).await?;
        Ok(Response::new(to_proto(permit)))
    }

    async fn list_permits_for_vehicle(
        &self,
        request: Request<ListPermitsForVehicleRequest>,
    ) -> Result<Response<ListPermitsForVehicleResponse>, Status> {
        let user = authenticated_user(&request)?;
        let tenant_id = scoped_tenant(&user)?;
        let req = request.into_inner();
        let vehicle_id = parse_uuid(&req.vehicle_id, "vehicle_id")?;

        let permits = permit_repo::list_for_vehicle(&self.pool, tenant_id, vehicle_id).await?;
        Ok(Response::new(ListPermitsForVehicleResponse {
            permits: permits.into_iter().map(to_proto).collect(),
        }))
    }

    async fn activate_permit(
        &self,
        request: Request<ActivatePermitRequest>,
    ) -> Result<Response<crate::proto::permit::Permit>, Status> {
        let user = authenticated_user(&request)?;
        require(&user, Operation::ActivatePermit)?;
        let tenant_id = scoped_tenant(&user)?;
        let req = request.into_inner();
        let permit_id = parse_uuid(&req.permit_id, "permit_id")?;

        let permit = permit_repo::activate(&self.pool, tenant_id, permit_id, user.user_id).await?;
        Ok(Response::new(to_proto(permit)))
    }

    async fn cancel_permit(
        &self,
        request: Request<CancelPermitRequest>,
    ) -> Result<Response<crate::proto::permit::Permit>, Status> {
        let user = authenticated_user(&request)?;
        require(&user, Operation::CancelPermit)?;
        let tenant_id = scoped_tenant(&user)?;
        let req = request.into_inner();
        let permit_id = parse_uuid(&req.permit_id, "permit_id")?;
        let reason = PermitCancellationReason::parse(&req.reason)
            .ok_or_else(|| Status::invalid_argument("reason: unrecognized cancellation reason"))?;

        let permit = permit_repo::cancel(&self.pool, tenant_id, permit_id, user.user_id, reason, req.note).await?;
        Ok(Response::new(to_proto(permit)))
    }
}
