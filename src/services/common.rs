//! Shared request-handling glue for the service layer: pulling the
//! authenticated user out of request extensions (populated by
//! `middleware::AuthLayer`), enforcing the role matrix, and converting
//! wire-format scalars (uuid/date/decimal strings) with a consistent
//! `invalid_argument` shape.

use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use tonic::{Request, Status};
use uuid::Uuid;

use crate::auth::{authorize, Operation};
use crate::tenant_context::AuthenticatedUser;

pub fn authenticated_user<T>(request: &Request<T>) -> Result<AuthenticatedUser, Status> {
    request
        .extensions()
        .get::<AuthenticatedUser>()
        .cloned()
        .ok_or_else(|| Status::unauthenticated("authentication required"))
}

pub fn require(user: &AuthenticatedUser, operation: Operation) -> Result<(), Status> {
    if authorize(user.role, operation) {
        Ok(())
    } else {
        Err(Status::permission_denied(format!(
            "role {:?} is not permitted to perform this operation",
            user.role
        )))
    }
}

/// Resolves the tenant a request should be scoped to, failing for a
/// platform-wide (super_admin, unbound) caller.
pub fn scoped_tenant(user: &AuthenticatedUser) -> Result<Uuid, Status> {
    Ok(user.tenant.require_tenant()?)
}

pub fn parse_uuid(raw: &str, field: &str) -> Result<Uuid, Status> {
    Uuid::parse_str(raw).map_err(|_| Status::invalid_argument(format!("{field}: not a valid uuid")))
}

pub fn parse_date(raw: &str, field: &str) -> Result<NaiveDate, Status> {
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .map_err(|_| Status::invalid_argument(format!("{field}: expected YYYY-MM-DD")))
}

/// Parses an `as_of` wire date as the last instant of that calendar day,
/// so a record still in force on that date is counted as of it.
pub fn parse_as_of(raw: &str, field: &str) -> Result<DateTime<Utc>, Status> {
    let date = parse_date(raw, field)?;
    Ok(date.and_hms_opt(23, 59, 59).expect("valid time").and_utc())
}

pub fn parse_decimal(raw: &str, field: &str) -> Result<Decimal, Status> {
    Decimal::from_str(raw).map_err(|_| Status::invalid_argument(format!("{field}: not a valid decimal amount")))
}

pub fn rfc3339(dt: DateTime<Utc>) -> String {
    dt.to_rfc3339()
}

pub fn opt_rfc3339(dt: Option<DateTime<Utc>>) -> Option<String> {
    dt.map(|d| d.to_rfc3339())
}
