//! Role-based authorization matrix (spec section 4.2). `authorize` is
//! a pure function over (role, operation) so it can be unit-tested
//! without a database or a live request.

use crate::models::Role;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    ManageTenants,
    ManageUsers,
    ManageCustomers,
    ManageVehicles,
    ManagePolicies,
    ActivatePolicy,
    CancelPolicy,
    ManagePermits,
    ActivatePermit,
    CancelPermit,
    VerifyPayment,
    ManageDynamicFields,
    ViewReports,
    TriggerReconciliation,
}

/// True if `role` may perform `operation` in its own tenant.
/// `super_admin` additionally crosses tenant boundaries entirely, which
/// is enforced at C1/C3, not here.
pub fn authorize(role: Role, operation: Operation) -> bool {
    use Operation::*;
    use Role::*;

    match role {
        SuperAdmin => true,
        Admin => !matches!(operation, ManageTenants),
        Manager => matches!(
            operation,
            ManageCustomers
                | ManageVehicles
                | ManagePolicies
                | ActivatePolicy
                | CancelPolicy
                | ManagePermits
                | ActivatePermit
                | CancelPermit
                | VerifyPayment
                | ManageDynamicFields
                | ViewReports
        ),
        Agent => matches!(
            operation,
            ManageCustomers | ManageVehicles | ManagePolicies | ManagePermits | ViewReports
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn super_admin_can_do_everything() {
        for op in [
            Operation::ManageTenants,
            Operation::TriggerReconciliation,
            Operation::ActivatePolicy,
        ] {
            assert!(authorize(Role::SuperAdmin, op));
        }
    }

    #[test]
    fn agent_cannot_activate_or_cancel() {
        assert!(!authorize(Role::Agent, Operation::ActivatePolicy));
        assert!(!authorize(Role::Agent, Operation::CancelPolicy));
        assert!(authorize(Role::Agent, Operation::ManageCustomers));
    }

    #[test]
    fn manager_cannot_manage_tenants_or_users() {
        assert!(!authorize(Role::Manager, Operation::ManageTenants));
        assert!(!authorize(Role::Manager, Operation::ManageUsers));
        assert!(authorize(Role::Manager, Operation::ActivatePolicy));
    }

    #[test]
    fn admin_cannot_manage_other_tenants() {
        assert!(!authorize(Role::Admin, Operation::ManageTenants));
        assert!(authorize(Role::Admin, Operation::ManageUsers));
    }
}
