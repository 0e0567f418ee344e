use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VehicleStatus {
    Active,
    Suspended,
    Retired,
}

impl VehicleStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            VehicleStatus::Active => "active",
            VehicleStatus::Suspended => "suspended",
            VehicleStatus::Retired => "retired",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "active" => Some(VehicleStatus::Active),
            "suspended" => Some(VehicleStatus::Suspended),
            "retired" => Some(VehicleStatus::Retired),
            _ => None,
        }
    }
}

/// Vehicle type is data-driven (spec section 3: "extensible"); these are
/// the well-known values the platform ships with, stored as plain text
/// so a tenant can add more without a migration.
pub mod vehicle_type {
    pub const MOTORCYCLE: &str = "motorcycle";
    pub const THREE_WHEELER: &str = "three_wheeler";
    pub const CAR: &str = "car";
}

#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Vehicle {
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub registration_plate: String,
    pub chassis_number: String,
    pub engine_number: String,
    pub vehicle_type: String,
    pub usage_category: Option<String>,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

impl Vehicle {
    pub fn status(&self) -> Option<VehicleStatus> {
        VehicleStatus::parse(&self.status)
    }
}
