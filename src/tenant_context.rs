//! C1 — Tenant Context. `ActiveTenant` is resolved once per request
//! from the authenticated JWT and threaded through as an ordinary
//! value; it is never read from a process-global or task-local, so
//! there is no way for one request's tenant to leak into another's
//! connection-pooled query (spec section 4.1).

use uuid::Uuid;

use crate::auth::Claims;
use crate::error::{AppError, AppResult};
use crate::models::Role;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActiveTenant {
    /// A tenant-scoped actor — every query this request issues is
    /// implicitly filtered to this tenant.
    Tenant(Uuid),
    /// super_admin acting outside any single tenant's scope.
    Platform,
}

impl ActiveTenant {
    /// The tenant id to scope queries to, or an error if the caller
    /// needed one and the active context is platform-wide.
    pub fn require_tenant(&self) -> AppResult<Uuid> {
        match self {
            ActiveTenant::Tenant(id) => Ok(*id),
            ActiveTenant::Platform => Err(AppError::TenantUnbound),
        }
    }

    pub fn is_platform(&self) -> bool {
        matches!(self, ActiveTenant::Platform)
    }
}

#[derive(Debug, Clone)]
pub struct AuthenticatedUser {
    pub user_id: Uuid,
    pub tenant: ActiveTenant,
    pub role: Role,
}

impl AuthenticatedUser {
    pub fn from_claims(claims: &Claims) -> AppResult<Self> {
        let role = Role::parse(&claims.role)
            .ok_or_else(|| AppError::Internal(format!("unknown role in token: {}", claims.role)))?;
        let tenant = match claims.tenant {
            Some(id) => ActiveTenant::Tenant(id),
            None => ActiveTenant::Platform,
        };
        Ok(AuthenticatedUser {
            user_id: claims.sub,
            tenant,
            role,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn claims(tenant: Option<Uuid>, role: &str) -> Claims {
        Claims {
            sub: Uuid::new_v4(),
            tenant,
            role: role.to_string(),
            exp: 0,
            iat: 0,
        }
    }

    #[test]
    fn tenant_user_requires_tenant_succeeds() {
        let tenant_id = Uuid::new_v4();
        let user = AuthenticatedUser::from_claims(&claims(Some(tenant_id), "admin")).unwrap();
        assert_eq!(user.tenant.require_tenant().unwrap(), tenant_id);
    }

    #[test]
    fn super_admin_has_no_bound_tenant() {
        let user = AuthenticatedUser::from_claims(&claims(None, "super_admin")).unwrap();
        assert!(user.tenant.is_platform());
        assert!(user.tenant.require_tenant().is_err());
    }
}
