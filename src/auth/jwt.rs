use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{AppError, AppResult};

/// JWT claims for an authenticated user. `tenant` is absent for
/// super_admin, matching the `is_super_admin ⇔ tenant_id IS NULL`
/// invariant carried by the user model itself.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,
    pub tenant: Option<Uuid>,
    pub role: String,
    pub exp: i64,
    pub iat: i64,
}

pub fn issue(secret: &str, user_id: Uuid, tenant_id: Option<Uuid>, role: &str) -> AppResult<(String, chrono::DateTime<Utc>)> {
    let now = Utc::now();
    let exp = now + Duration::hours(24);
    let claims = Claims {
        sub: user_id,
        tenant: tenant_id,
        role: role.to_string(),
        exp: exp.timestamp(),
        iat: now.timestamp(),
    };
    let token = encode(&Header::default(), &claims, &EncodingKey::from_secret(secret.as_bytes()))
        .map_err(|e| AppError::Internal(format!("jwt encode error: {e}")))?;
    Ok((token, exp))
}

pub fn verify(secret: &str, token: &str) -> AppResult<Claims> {
    decode::<Claims>(token, &DecodingKey::from_secret(secret.as_bytes()), &Validation::default())
        .map(|data| data.claims)
        .map_err(|_| AppError::Forbidden("invalid or expired token".into()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_claims() {
        let secret = "test-secret";
        let user_id = Uuid::new_v4();
        let tenant_id = Some(Uuid::new_v4());
        let (token, _) = issue(secret, user_id, tenant_id, "admin").unwrap();
        let claims = verify(secret, &token).unwrap();
        assert_eq!(claims.sub, user_id);
        assert_eq!(claims.tenant, tenant_id);
        assert_eq!(claims.role, "admin");
    }

    #[test]
    fn rejects_tampered_token() {
        let (token, _) = issue("secret-a", Uuid::new_v4(), None, "super_admin").unwrap();
        assert!(verify("secret-b", &token).is_err());
    }
}
