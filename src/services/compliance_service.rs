use chrono::Utc;
use sqlx::PgPool;
use tonic::{Request, Response, Status};

use crate::compliance::{self, ComplianceStatus};
use crate::proto::compliance::compliance_service_server::ComplianceService;
use crate::proto::compliance::{ExpiringRecord, GetVehicleComplianceRequest, VehicleComplianceStatus};
use crate::repository::{permit_repo, policy_repo, tenant_repo};
use crate::services::common::{authenticated_user, parse_as_of, parse_uuid, scoped_tenant};

pub struct ComplianceServiceImpl {
    pool: PgPool,
}

impl ComplianceServiceImpl {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn status_str(status: ComplianceStatus) -> &'static str {
    match status {
        ComplianceStatus::Compliant => "compliant",
        ComplianceStatus::AtRisk => "at_risk",
        ComplianceStatus::NonCompliant => "non_compliant",
    }
}

#[tonic::async_trait]
impl ComplianceService for ComplianceServiceImpl {
    async fn get_vehicle_compliance(
        &self,
        request: Request<GetVehicleComplianceRequest>,
    ) -> Result<Response<VehicleComplianceStatus>, Status> {
        let user = authenticated_user(&request)?;
        let tenant_id = scoped_tenant(&user)?;
        let req = request.into_inner();
        let vehicle_id = parse_uuid(&req.vehicle_id, "vehicle_id")?;
        let as_of = req
            .as_of
            .as_deref()
            .map(|raw| parse_as_of(raw, "as_of"))
            .transpose()?
            .unwrap_or_else(Utc::now);

        let tenant = tenant_repo::find_by_id(&self.pool, tenant_id).await?;
        let policies = policy_repo::list_for_vehicle(&self.pool, tenant_id, vehicle_id).await?;
        let permits = permit_repo::list_for_vehicle(&self.pool, tenant_id, vehicle_id).await?;

        let result = compliance::compliance_status(
            &tenant,
            &policies,
            &permits,
            as_of,
            tenant.settings.expiry_reminder_days as i64,
        );

        Ok(Response::new(VehicleComplianceStatus {
            vehicle_id: vehicle_id.to_string(),
            status: status_str(result.status).to_string(),
            insurance_in_force: result.insurance_in_force,
            missing_permit_types: result.missing_permit_types,
            issues: result.issues,
            expiring: result
                .expiring
                .into_iter()
                .map(|e| ExpiringRecord {
                    entity_kind: e.entity_kind.to_string(),
                    entity_id: e.entity_id.to_string(),
                    end_date: e.end_date.to_string(),
                })
                .collect(),
        }))
    }
}
