use chrono::Utc;
use sqlx::PgPool;
use tonic::{Request, Response, Status};

use crate::auth::Operation;
use crate::lifecycle::renewal;
use crate::models::{Policy, PolicyCancellationReason};
use crate::proto::policy::policy_service_server::PolicyService;
use crate::proto::policy::{
    ActivatePolicyRequest, CancelPolicyRequest, CreatePolicyDraftRequest, GetPolicyRequest,
    ListPoliciesForVehicleRequest, ListPoliciesForVehicleResponse, Payment, RecordPaymentRequest, RenewPolicyRequest,
    VerifyPaymentRequest,
};
use crate::repository::{payment_repo, policy_repo};
use crate::services::common::{authenticated_user, parse_date, parse_decimal, parse_uuid, require, scoped_tenant};

pub struct PolicyServiceImpl {
    pool: PgPool,
}

impl PolicyServiceImpl {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn to_proto(policy: Policy) -> crate::proto::policy::Policy {
    crate::proto::policy::Policy {
        id: policy.id.to_string(),
        tenant_id: policy.tenant_id.to_string(),
        policy_number: policy.policy_number,
        vehicle_id: policy.vehicle_id.to_string(),
        start_date: policy.start_date.to_string(),
        end_date: policy.end_date.to_string(),
        premium_amount: policy.premium_amount.to_string(),
        status: policy.status,
        activated_at: policy.activated_at.map(|t| t.to_rfc3339()),
        cancelled_at: policy.cancelled_at.map(|t| t.to_rfc3339()),
        cancellation_reason: policy.cancellation_reason,
        cancellation_note: policy.cancellation_note,
    }
}

fn payment_to_proto(payment: crate::models::Payment) -> Payment {
    Payment {
        id: payment.id.to_string(),
        policy_id: payment.policy_id.to_string(),
        amount: payment.amount.to_string(),
        received_at: payment.received_at.to_rfc3339(),
        verified_at: payment.verified_at.map(|t| t.to_rfc3339()),
    }
}

#[tonic::async_trait]
impl PolicyService for PolicyServiceImpl {
    async fn create_policy_draft(
        &self,
        request: Request<CreatePolicyDraftRequest>,
    ) -> Result<Response<crate::proto::policy::Policy>, Status> {
        let user = authenticated_user(&request)?;
        require(&user, Operation::ManagePolicies)?;
        let tenant_id = scoped_tenant(&user)?;
        let req = request.into_inner();

        let vehicle_id = parse_uuid(&req.vehicle_id, "vehicle_id")?;
        let start_date = parse_date(&req.start_date, "start_date")?;
        let end_date = parse_date(&req.end_date, "end_date")?;
        let premium_amount = parse_decimal(&req.premium_amount, "premium_amount")?;
        if end_date <= start_date {
            return Err(Status::invalid_argument("end_date must be after start_date"));
        }

        let policy = policy_repo::create_draft(
            &self.pool,
            tenant_id,
            &req.policy_number,
            vehicle_id,
            start_date,
            end_date,
            premium_amount,
        )
        .await?;

        Ok(Response::new(to_proto(policy)))
    }

    async fn get_policy(
        &self,
        request: Request<GetPolicyRequest>,
    ) -> Result<Response<crate::proto::policy::Policy>, Status> {
        let user = authenticated_user(&request)?;
        let tenant_id = scoped_tenant(&user)?;
        let req = request.into_inner();
        let policy_id = parse_uuid(&req.policy_id, "policy_id")?;

        let policy = policy_repo::find_by_id(&self.pool, tenant_id, policy_id).await?;
        Ok(Response::new(to_proto(policy)))
    }

    async fn list_policies_for_vehicle(
        &self,
        request: Request<ListPoliciesForVehicleRequest>,
    ) -> Result<Response<ListPoliciesForVehicleResponse>, Status> {
        let user = authenticated_user(&request)?;
        let tenant_id = scoped_tenant(&user)?;
        let req = request.into_inner();
        let vehicle_id = parse_uuid(&req.vehicle_id, "vehicle_id")?;

        let policies = policy_repo::list_for_vehicle(&self.pool, tenant_id, vehicle_id).await?;
        Ok(Response::new(ListPoliciesForVehicleResponse {
            policies: policies.into_iter().map(to_proto).collect(),
        }))
    }

    async fn record_payment(&self, request: Request<RecordPaymentRequest>) -> Result<Response<Payment>, Status> {
        let user = authenticated_user(&request)?;
        require(&user, Operation::ManagePolicies)?;
        let tenant_id = scoped_tenant(&user)?;
        let req = request.into_inner();
        let policy_id = parse_uuid(&req.policy_id, "policy_id")?;
        let amount = parse_decimal(&req.amount, "amount")?;

        policy_repo::find_by_id(&self.pool, tenant_id, policy_id).await?;
        let payment = payment_repo::record(&self.pool, tenant_id, policy_id, amount, Utc::now()).await?;
        Ok(Response::new(payment_to_proto(payment)))
    }

    async fn verify_payment(&self, request: Request<VerifyPaymentRequest>) -> Result<Response<Payment>, Status> {
        let user = authenticated_user(&request)?;
        require(&user, Operation::VerifyPayment)?;
        let tenant_id = scoped_tenant(&user)?;
        let req = request.into_inner();
        let payment_id = parse_uuid(&req.payment_id, "payment_id")?;

        let payment = payment_repo::verify(&self.pool, tenant_id, payment_id, user.user_id).await?;
        Ok(Response::new(payment_to_proto(payment)))
    }

    async fn activate_policy(
        &self,
        request: Request<ActivatePolicyRequest>,
    ) -> Result<Response<crate::proto::policy::Policy>, Status> {
        let user = authenticated_user(&request)?;
        require(&user, Operation::ActivatePolicy)?;
        let tenant_id = scoped_tenant(&user)?;
        let req = request.into_inner();
        let policy_id = parse_uuid(&req.policy_id, "policy_id")?;

        let policy = policy_repo::activate(&self.pool, tenant_id, policy_id, user.user_id).await?;
        Ok(Response::new(to_proto(policy)))
    }

    async fn cancel_policy(
        &self,
        request: Request<CancelPolicyRequest>,
    ) -> Result<Response<crate::proto::policy::Policy>, Status> {
        let user = authenticated_user(&request)?;
        require(&user, Operation::CancelPolicy)?;
        let tenant_id = scoped_tenant(&user)?;
        let req = request.into_inner();
        let policy_id = parse_uuid(&req.policy_id, "policy_id")?;
        let reason = PolicyCancellationReason::parse(&req.reason)
            .ok_or_else(|| Status::invalid_argument("reason: unrecognized cancellation reason"))?;

        let policy = policy_repo::cancel(&self.pool, tenant_id, policy_id, user.user_id, reason, req.note).await?;
        Ok(Response::new(to_proto(policy)))
    }

    async fn renew_policy(
        &self,
        request: Request<RenewPolicyRequest>,
    ) -> Result<Response<crate::proto::policy::Policy>, Status> {
        let user = authenticated_user(&request)?;
        require(&user, Operation::ManagePolicies)?;
        let tenant_id = scoped_tenant(&user)?;
        let req = request.into_inner();
        let policy_id = parse_uuid(&req.policy_id, "policy_id")?;
        let premium_amount = parse_decimal(&req.premium_amount, "premium_amount")?;

        let predecessor = policy_repo::find_by_id(&self.pool, tenant_id, policy_id).await?;
        let (start_date, end_date) = renewal::successor_window(predecessor.start_date, predecessor.end_date);
        let policy_number = renewal::successor_policy_number(&predecessor.policy_number);

        let successor = policy_repo::create_draft(
            &self.pool,
            tenant_id,
            &policy_number,
            predecessor.vehicle_id,
            start_date,
            end_date,
            premium_amount,
        )
        .await?;

        Ok(Response::new(to_proto(successor)))
    }
}
