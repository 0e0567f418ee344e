use std::env;

#[derive(Clone, Debug)]
pub struct Config {
    pub database_url: String,
    pub server_host: String,
    pub server_port: u16,
    pub jwt_secret: String,
    /// Fallback `tenant.settings.expiry_reminder_days` for tenants that have
    /// not overridden it (spec section 6).
    pub expiry_reminder_days_default: i32,
    /// Reconciler sweep cadence; spec section 4.9 requires at least once per
    /// 24h, this is the in-process interval rather than an external cron.
    pub reconciler_interval_secs: u64,
    pub failed_login_limit: u32,
    pub failed_login_window_secs: i64,
    pub lockout_duration_secs: i64,
}

impl Config {
    pub fn from_env() -> Result<Self, env::VarError> {
        dotenvy::dotenv().ok();

        Ok(Config {
            database_url: env::var("DATABASE_URL")?,
            server_host: env::var("SERVER_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            server_port: env::var("PORT") // platform-managed deployments set PORT
                .or_else(|_| env::var("SERVER_PORT"))
                .unwrap_or_else(|_| "50061".to_string())
                .parse()
                .unwrap_or(50061),
            jwt_secret: env::var("JWT_SECRET")?,
            expiry_reminder_days_default: env::var("EXPIRY_REMINDER_DAYS_DEFAULT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(30),
            reconciler_interval_secs: env::var("RECONCILER_INTERVAL_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(86_400),
            failed_login_limit: env::var("FAILED_LOGIN_LIMIT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(5),
            failed_login_window_secs: env::var("FAILED_LOGIN_WINDOW_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(900),
            lockout_duration_secs: env::var("LOCKOUT_DURATION_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(900),
        })
    }

    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.server_host, self.server_port)
    }
}
