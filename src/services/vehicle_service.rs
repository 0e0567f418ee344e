use sqlx::PgPool;
use tonic::{Request, Response, Status};

use crate::auth::Operation;
use crate::models::Vehicle;
use crate::proto::common::PageInfo;
use crate::proto::vehicle::vehicle_service_server::VehicleService;
use crate::proto::vehicle::{
    CreateVehicleRequest, GetVehicleRequest, ListVehiclesRequest, ListVehiclesResponse, Ownership,
    TransferOwnershipRequest,
};
use crate::repository::{customer_repo, vehicle_repo};
use crate::reports::PageRequest;
use crate::services::common::{authenticated_user, parse_uuid, require, scoped_tenant};

pub struct VehicleServiceImpl {
    pool: PgPool,
}

impl VehicleServiceImpl {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn to_proto(vehicle: Vehicle) -> crate::proto::vehicle::Vehicle {
    crate::proto::vehicle::Vehicle {
        id: vehicle.id.to_string(),
        tenant_id: vehicle.tenant_id.to_string(),
        registration_plate: vehicle.registration_plate,
        chassis_number: vehicle.chassis_number,
        engine_number: vehicle.engine_number,
        vehicle_type: vehicle.vehicle_type,
        usage_category: vehicle.usage_category,
        status: vehicle.status,
    }
}

#[tonic::async_trait]
impl VehicleService for VehicleServiceImpl {
    async fn create_vehicle(
        &self,
        request: Request<CreateVehicleRequest>,
    ) -> Result<Response<crate::proto::vehicle::Vehicle>, Status> {
        let user = authenticated_user(&request)?;
        require(&user, Operation::ManageVehicles)?;
        let tenant_id = scoped_tenant(&user)?;
        let req = request.into_inner();

        let vehicle = vehicle_repo::create(
            &self.pool,
            tenant_id,
            &req.registration_plate,
            &req.chassis_number,
            &req.engine_number,
            &req.vehicle_type,
            req.usage_category.as_deref(),
        )
        .await?;

        Ok(Response::new(to_proto(vehicle)))
    }

    async fn get_vehicle(
        &self,
        request: Request<GetVehicleRequest>,
    ) -> Result<Response<crate::proto::vehicle::Vehicle>, Status> {
        let user = authenticated_user(&request)?;
        let tenant_id = scoped_tenant(&user)?;
        let req = request.into_inner();
        let vehicle_id = parse_uuid(&req.vehicle_id, "vehicle_id")?;

        let vehicle = vehicle_repo::find_by_id(&self.pool, tenant_id, vehicle_id).await?;
        Ok(Response::new(to_proto(vehicle)))
    }

    async fn list_vehicles(
        &self,
        request: Request<ListVehiclesRequest>,
    ) -> Result<Response<ListVehiclesResponse>, Status> {
        let user = authenticated_user(&request)?;
        let tenant_id = scoped_tenant(&user)?;
        let req = request.into_inner();
        let page = req.page.unwrap_or(crate::proto::common::PageRequest { page: 1, page_size: 50 });
        let page_request = PageRequest { page: page.page, page_size: page.page_size };
        let (offset, limit) = (page_request.offset(), page_request.limit());

        let vehicles = vehicle_repo::list(&self.pool, tenant_id, offset, limit).await?;
        let total = vehicle_repo::count(&self.pool, tenant_id).await?;
        Ok(Response::new(ListVehiclesResponse {
            vehicles: vehicles.into_iter().map(to_proto).collect(),
            page: Some(PageInfo {
                page: page_request.page.max(1),
                page_size: limit,
                total,
            }),
        }))
    }

    async fn transfer_ownership(
        &self,
        request: Request<TransferOwnershipRequest>,
    ) -> Result<Response<Ownership>, Status> {
        let user = authenticated_user(&request)?;
        require(&user, Operation::ManageVehicles)?;
        let tenant_id = scoped_tenant(&user)?;
        let req = request.into_inner();
        let vehicle_id = parse_uuid(&req.vehicle_id, "vehicle_id")?;
        let new_customer_id = parse_uuid(&req.new_customer_id, "new_customer_id")?;

        // Confirms the vehicle and the incoming customer both belong to
        // this tenant before the transfer touches any rows.
        vehicle_repo::find_by_id(&self.pool, tenant_id, vehicle_id).await?;
        customer_repo::find_by_id(&self.pool, tenant_id, new_customer_id).await?;

        let ownership = vehicle_repo::transfer_ownership(&self.pool, tenant_id, vehicle_id, new_customer_id).await?;

        Ok(Response::new(Ownership {
            id: ownership.id.to_string(),
            vehicle_id: ownership.vehicle_id.to_string(),
            customer_id: ownership.customer_id.to_string(),
            from_ts: ownership.from_ts.to_rfc3339(),
            to_ts: ownership.to_ts.map(|t| t.to_rfc3339()),
        }))
    }
}
