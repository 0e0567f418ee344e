use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TenantStatus {
    Active,
    Suspended,
}

impl TenantStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TenantStatus::Active => "active",
            TenantStatus::Suspended => "suspended",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "active" => Some(TenantStatus::Active),
            "suspended" => Some(TenantStatus::Suspended),
            _ => None,
        }
    }
}

/// Typed tenant settings (spec section 3). Known keys get first-class
/// fields so callers don't re-parse JSON at every call site; `extra`
/// retains anything else a tenant has set without forcing a migration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TenantSettings {
    #[serde(default = "default_expiry_reminder_days")]
    pub expiry_reminder_days: i32,
    #[serde(default)]
    pub fleet_policies_enabled: bool,
    /// permit_type values every vehicle in this tenant must carry an
    /// active record for, beyond insurance (spec section 4.6).
    #[serde(default)]
    pub required_permit_types: Vec<String>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

fn default_expiry_reminder_days() -> i32 {
    30
}

impl Default for TenantSettings {
    fn default() -> Self {
        TenantSettings {
            expiry_reminder_days: default_expiry_reminder_days(),
            fleet_policies_enabled: false,
            required_permit_types: Vec::new(),
            extra: serde_json::Map::new(),
        }
    }
}

#[derive(Debug, Clone, FromRow)]
pub struct TenantRow {
    pub id: Uuid,
    pub name: String,
    pub slug: String,
    pub status: String,
    pub settings: serde_json::Value,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone)]
pub struct Tenant {
    pub id: Uuid,
    pub name: String,
    pub slug: String,
    pub status: TenantStatus,
    pub settings: TenantSettings,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

impl From<TenantRow> for Tenant {
    fn from(row: TenantRow) -> Self {
        let settings = serde_json::from_value(row.settings).unwrap_or_default();
        Tenant {
            id: row.id,
            name: row.name,
            slug: row.slug,
            status: TenantStatus::parse(&row.status).unwrap_or(TenantStatus::Active),
            settings,
            created_at: row.created_at,
            updated_at: row.updated_at,
            deleted_at: row.deleted_at,
        }
    }
}

impl Tenant {
    pub fn is_active(&self) -> bool {
        self.status == TenantStatus::Active && self.deleted_at.is_none()
    }
}
