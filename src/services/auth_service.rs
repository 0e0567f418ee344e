use sqlx::PgPool;
use tonic::{Request, Response, Status};

use crate::auth::issue;
use crate::auth::password::{hash_password, verify_password, LockoutPolicy, LoginAttempts, LoginOutcome};
use crate::config::Config;
use crate::proto::auth::auth_service_server::AuthService;
use crate::proto::auth::{LoginRequest, LoginResponse};
use crate::repository::user_repo;

pub struct AuthServiceImpl {
    pool: PgPool,
    jwt_secret: String,
    lockout_policy: LockoutPolicy,
}

impl AuthServiceImpl {
    pub fn new(pool: PgPool, config: &Config) -> Self {
        Self {
            pool,
            jwt_secret: config.jwt_secret.clone(),
            lockout_policy: LockoutPolicy {
                failed_login_limit: config.failed_login_limit as i32,
                failed_login_window_secs: config.failed_login_window_secs,
                lockout_duration_secs: config.lockout_duration_secs,
            },
        }
    }
}

#[tonic::async_trait]
impl AuthService for AuthServiceImpl {
    async fn login(&self, request: Request<LoginRequest>) -> Result<Response<LoginResponse>, Status> {
        let req = request.into_inner();

        let user = user_repo::find_by_email(&self.pool, &req.email)
            .await?
            .ok_or_else(|| Status::unauthenticated("invalid email or password"))?;

        let now = chrono::Utc::now();
        let attempts = LoginAttempts {
            failed_count: user.failed_login_count,
            window_started_at: None,
            locked_until: user.locked_until,
        };
        if let LoginOutcome::Locked { until } = self.lockout_policy.check(&attempts, now) {
            return Err(Status::unauthenticated(format!("account locked until {until}")));
        }

        if !verify_password(&req.password, &user.password_hash) {
            let next = self.lockout_policy.record_failure(&attempts, now);
            user_repo::record_login_attempt(&self.pool, user.id, next.failed_count, next.locked_until).await?;
            return Err(Status::unauthenticated("invalid email or password"));
        }

        user_repo::clear_login_attempts(&self.pool, user.id).await?;

        let (token, expires_at) = issue(&self.jwt_secret, user.id, user.tenant_id, user.role.as_str())?;

        Ok(Response::new(LoginResponse {
            token,
            expires_at: expires_at.to_rfc3339(),
            user_id: user.id.to_string(),
            role: user.role.as_str().to_string(),
            tenant_id: user.tenant_id.map(|id| id.to_string()),
        }))
    }
}

/// Exposed for provisioning tooling (e.g. an initial super_admin seed
/// script); not reachable over the wire.
pub async fn create_user_with_password(
    pool: &PgPool,
    tenant_id: Option<uuid::Uuid>,
    email: &str,
    plain_password: &str,
    role: crate::models::Role,
) -> crate::error::AppResult<crate::models::User> {
    let hash = hash_password(plain_password)?;
    user_repo::create(pool, tenant_id, email, &hash, role).await
}
