use sqlx::PgPool;
use tonic::{Request, Response, Status};

use crate::auth::Operation;
use crate::models::{Customer, CustomerKind};
use crate::proto::common::PageInfo;
use crate::proto::customer::customer_service_server::CustomerService;
use crate::proto::customer::{
    CreateCustomerRequest, DeleteCustomerRequest, DeleteCustomerResponse, GetCustomerRequest, ListCustomersRequest,
    ListCustomersResponse,
};
use crate::repository::customer_repo;
use crate::reports::PageRequest;
use crate::services::common::{authenticated_user, parse_uuid, require, scoped_tenant};

pub struct CustomerServiceImpl {
    pool: PgPool,
}

impl CustomerServiceImpl {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn to_proto(customer: Customer) -> crate::proto::customer::Customer {
    crate::proto::customer::Customer {
        id: customer.id.to_string(),
        tenant_id: customer.tenant_id.to_string(),
        kind: customer.kind,
        display_name: customer.display_name,
        contact_email: customer.contact_email,
        contact_phone: customer.contact_phone,
    }
}

#[tonic::async_trait]
impl CustomerService for CustomerServiceImpl {
    async fn create_customer(
        &self,
        request: Request<CreateCustomerRequest>,
    ) -> Result<Response<crate::proto::customer::Customer>, Status> {
        let user = authenticated_user(&request)?;
        require(&user, Operation::ManageCustomers)?;
        let tenant_id = scoped_tenant(&user)?;
        let req = request.into_inner();

        let kind = CustomerKind::parse(&req.kind)
            .ok_or_else(|| Status::invalid_argument("kind: must be \"individual\" or \"company\""))?;

        let customer = customer_repo::create(
            &self.pool,
            tenant_id,
            kind,
            &req.display_name,
            req.contact_email.as_deref(),
            req.contact_phone.as_deref(),
        )
        .await?;

        Ok(Response::new(to_proto(customer)))
    }

    async fn get_customer(
        &self,
        request: Request<GetCustomerRequest>,
    ) -> Result<Response<crate::proto::customer::Customer>, Status> {
        let user = authenticated_user(&request)?;
        let tenant_id = scoped_tenant(&user)?;
        let req = request.into_inner();
        let customer_id = parse_uuid(&req.customer_id, "customer_id")?;

        let customer = customer_repo::find_by_id(&self.pool, tenant_id, customer_id).await?;
        Ok(Response::new(to_proto(customer)))
    }

    async fn list_customers(
        &self,
        request: Request<ListCustomersRequest>,
    ) -> Result<Response<ListCustomersResponse>, Status> {
        let user = authenticated_user(&request)?;
        let tenant_id = scoped_tenant(&user)?;
        let req = request.into_inner();
        let page = req.page.unwrap_or(crate::proto::common::PageRequest { page: 1, page_size: 50 });
        let page_request = PageRequest { page: page.page, page_size: page.page_size };
        let (offset, limit) = (page_request.offset(), page_request.limit());

        let customers = customer_repo::list(&self.pool, tenant_id, offset, limit).await?;
        let total = customer_repo::count(&self.pool, tenant_id).await?;
        Ok(Response::new(ListCustomersResponse {
            customers: customers.into_iter().map(to_proto).collect(),
            page: Some(PageInfo {
                page: page_request.page.max(1),
                page_size: limit,
                total,
            }),
        }))
    }

    async fn delete_customer(
        &self,
        request: Request<DeleteCustomerRequest>,
    ) -> Result<Response<DeleteCustomerResponse>, Status> {
        let user = authenticated_user(&request)?;
        require(&user, Operation::ManageCustomers)?;
        let tenant_id = scoped_tenant(&user)?;
        let req = request.into_inner();
        let customer_id = parse_uuid(&req.customer_id, "customer_id")?;

        customer_repo::soft_delete(&self.pool, tenant_id, customer_id).await?;
        Ok(Response::new(DeleteCustomerResponse {}))
    }
}
