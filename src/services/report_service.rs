use chrono::Utc;
use sqlx::PgPool;
use tonic::{Request, Response, Status};

use crate::auth::Operation;
use crate::compliance::ComplianceStatus;
use crate::proto::common::PageInfo;
use crate::proto::report::report_service_server::ReportService;
use crate::proto::report::{
    ExpiringEntitiesRequest, ExpiringEntitiesResponse, ExpiringEntityRow, TenantComplianceSummaryRequest,
    TenantComplianceSummaryResponse, VehicleComplianceRow,
};
use crate::reports::{self, PageRequest};
use crate::services::common::{authenticated_user, require, scoped_tenant};

pub struct ReportServiceImpl {
    pool: PgPool,
}

impl ReportServiceImpl {
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
impl ReportService for ReportServiceImpl {
    async fn tenant_compliance_summary(
        &self,
        request: Request<TenantComplianceSummaryRequest>,
    ) -> Result<Response<TenantComplianceSummaryResponse>, Status> {
        let user = authenticated_user(&request)?;
        require(&user, Operation::ViewReports)?;
        let tenant_id = scoped_tenant(&user)?;
        let req = request.into_inner();
        let page = req.page.unwrap_or(crate::proto::common::PageRequest { page: 1, page_size: 50 });

        let result = reports::tenant_compliance_summary(
            &self.pool,
            tenant_id,
            PageRequest { page: page.page, page_size: page.page_size },
        )
        .await?;

        Ok(Response::new(TenantComplianceSummaryResponse {
            rows: result
                .items
                .into_iter()
                .map(|row| VehicleComplianceRow {
                    vehicle_id: row.vehicle_id.to_string(),
                    registration_plate: row.registration_plate,
                    status: status_str(row.status).to_string(),
                })
                .collect(),
            page: Some(PageInfo {
                page: result.page,
                page_size: result.page_size,
                total: result.total,
            }),
        }))
    }

    async fn expiring_entities(
        &self,
        request: Request<ExpiringEntitiesRequest>,
    ) -> Result<Response<ExpiringEntitiesResponse>, Status> {
        let user = authenticated_user(&request)?;
        require(&user, Operation::ViewReports)?;
        let tenant_id = scoped_tenant(&user)?;
        let req = request.into_inner();

        let rows = reports::entities_expiring_within(&self.pool, tenant_id, Utc::now(), req.within_days).await?;

        Ok(Response::new(ExpiringEntitiesResponse {
            rows: rows
                .into_iter()
                .map(|row| ExpiringEntityRow {
                    entity_kind: row.entity_kind,
                    entity_id: row.entity_id.to_string(),
                    end_date: row.end_date.to_string(),
                })
                .collect(),
        }))
    }
}
