use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    SuperAdmin,
    Admin,
    Manager,
    Agent,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::SuperAdmin => "super_admin",
            Role::Admin => "admin",
            Role::Manager => "manager",
            Role::Agent => "agent",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "super_admin" => Some(Role::SuperAdmin),
            "admin" => Some(Role::Admin),
            "manager" => Some(Role::Manager),
            "agent" => Some(Role::Agent),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UserStatus {
    Active,
    Disabled,
}

impl UserStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserStatus::Active => "active",
            UserStatus::Disabled => "disabled",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "active" => Some(UserStatus::Active),
            "disabled" => Some(UserStatus::Disabled),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, FromRow)]
pub struct UserRow {
    pub id: Uuid,
    pub email: String,
    pub password_hash: String,
    pub role: String,
    pub tenant_id: Option<Uuid>,
    pub status: String,
    pub failed_login_count: i32,
    pub locked_until: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub password_hash: String,
    pub role: Role,
    pub tenant_id: Option<Uuid>,
    pub status: UserStatus,
    pub failed_login_count: i32,
    pub locked_until: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

impl From<UserRow> for User {
    fn from(row: UserRow) -> Self {
        User {
            id: row.id,
            email: row.email,
            password_hash: row.password_hash,
            role: Role::parse(&row.role).unwrap_or(Role::Agent),
            tenant_id: row.tenant_id,
            status: UserStatus::parse(&row.status).unwrap_or(UserStatus::Disabled),
            failed_login_count: row.failed_login_count,
            locked_until: row.locked_until,
            created_at: row.created_at,
            updated_at: row.updated_at,
            deleted_at: row.deleted_at,
        }
    }
}

impl User {
    /// Invariant: `is_super_admin ⇔ tenant_id IS NULL` (spec section 3).
    pub fn is_super_admin(&self) -> bool {
        self.role == Role::SuperAdmin
    }

    pub fn is_locked(&self, now: DateTime<Utc>) -> bool {
        self.locked_until.is_some_and(|until| now < until)
    }

    pub fn invariant_holds(&self) -> bool {
        self.is_super_admin() == self.tenant_id.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_user(role: Role, tenant_id: Option<Uuid>) -> User {
        User {
            id: Uuid::new_v4(),
            email: "a@example.com".into(),
            password_hash: "hash".into(),
            role,
            tenant_id,
            status: UserStatus::Active,
            failed_login_count: 0,
            locked_until: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
            deleted_at: None,
        }
    }

    #[test]
    fn super_admin_has_no_tenant() {
        let u = base_user(Role::SuperAdmin, None);
        assert!(u.invariant_holds());
        let bad = base_user(Role::SuperAdmin, Some(Uuid::new_v4()));
        assert!(!bad.invariant_holds());
    }

    #[test]
    fn tenant_user_requires_tenant() {
        let u = base_user(Role::Admin, Some(Uuid::new_v4()));
        assert!(u.invariant_holds());
        let bad = base_user(Role::Admin, None);
        assert!(!bad.invariant_holds());
    }

    #[test]
    fn lock_expiry_is_exclusive_of_deadline() {
        let now = Utc::now();
        let mut u = base_user(Role::Agent, Some(Uuid::new_v4()));
        u.locked_until = Some(now);
        assert!(!u.is_locked(now));
        u.locked_until = Some(now + chrono::Duration::seconds(1));
        assert!(u.is_locked(now));
    }
}
