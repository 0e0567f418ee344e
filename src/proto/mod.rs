// Generated proto modules are written here by build.rs at compile time.

pub mod common {
    include!("logi.common.rs");
}

pub mod health {
    include!("grpc.health.v1.rs");
}

pub mod auth {
    include!("logi.auth.rs");
}

pub mod tenant {
    include!("logi.tenant.rs");
}

pub mod customer {
    include!("logi.customer.rs");
}

pub mod vehicle {
    include!("logi.vehicle.rs");
}

pub mod policy {
    include!("logi.policy.rs");
}

pub mod permit {
    include!("logi.permit.rs");
}

pub mod compliance {
    include!("logi.compliance.rs");
}

pub mod dynamicfield {
    include!("logi.dynamicfield.rs");
}

pub mod report {
    include!("logi.report.rs");
}

pub mod notification {
    include!("logi.notification.rs");
}
