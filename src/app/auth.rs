use anyhow::{anyhow, Result};
use pasetors::claims::{Claims, ClaimsValidationRules};
use pasetors::keys::SymmetricKey;
use pasetors::token::UntrustedToken;
use pasetors::{local, version4::V4, Local};
use time::{Duration, OffsetDateTime};
use uuid::Uuid;

use crate::infra::db::Db;

const TOKEN_ISSUER: &str = "flagdesk";

#[derive(Debug, Clone)]
pub struct AuthSession {
    pub user_id: Uuid,
}

#[derive(Debug, Clone)]
pub struct AccessToken {
    pub token: String,
    pub expires_at: OffsetDateTime,
}

#[derive(Clone)]
pub struct AuthService {
    db: Db,
    access_key: [u8; 32],
    access_ttl_minutes: u64,
}

impl AuthService {
    pub fn new(db: Db, access_key: [u8; 32], access_ttl_minutes: u64) -> Self {
        Self {
            db,
            access_key,
            access_ttl_minutes,
        }
    }

    /// Mints an access token accepted by `authenticate_access_token`.
    ///
    /// Sign-in lives with the question bank's account service; this issuer
    /// serves trusted clients and the integration tests sharing the key.
    pub fn issue_access_token(&self, user_id: Uuid) -> Result<AccessToken> {
        let duration = std::time::Duration::from_secs(self.access_ttl_minutes * 60);
        let mut claims = Claims::new_expires_in(&duration)?;
        claims.issuer(TOKEN_ISSUER)?;
        claims.audience(TOKEN_ISSUER)?;
        claims.subject(&user_id.to_string())?;
        claims.add_additional("typ", "access")?;

        let key = SymmetricKey::<V4>::from(&self.access_key)?;
        let token = local::encrypt(&key, &claims, None, None)?;
        let expires_at =
            OffsetDateTime::now_utc() + Duration::minutes(self.access_ttl_minutes as i64);

        Ok(AccessToken { token, expires_at })
    }

    pub fn authenticate_access_token(&self, token: &str) -> Result<Option<AuthSession>> {
        let claims = match self.decrypt_claims(token)? {
            Some(claims) => claims,
            None => return Ok(None),
        };
        if !has_token_type(&claims, "access") {
            return Ok(None);
        }
        let user_id = claim_uuid(&claims, "sub")?;
        Ok(Some(AuthSession { user_id }))
    }

    /// Role check backing every admin-only operation.
    pub async fn is_admin(&self, user_id: Uuid) -> Result<bool> {
        let is_admin: Option<bool> =
            sqlx::query_scalar("SELECT is_admin FROM profiles WHERE id = $1")
                .bind(user_id)
                .fetch_optional(self.db.pool())
                .await?;
        Ok(is_admin.unwrap_or(false))
    }

    fn decrypt_claims(&self, token: &str) -> Result<Option<Claims>> {
        let key = SymmetricKey::<V4>::from(&self.access_key)?;
        let mut rules = ClaimsValidationRules::new();
        rules.validate_issuer_with(TOKEN_ISSUER);
        rules.validate_audience_with(TOKEN_ISSUER);

        let untrusted = match UntrustedToken::<Local, V4>::try_from(token) {
            Ok(token) => token,
            Err(_) => return Ok(None),
        };
        let trusted = match local::decrypt(&key, &untrusted, &rules, None, None) {
            Ok(token) => token,
            Err(_) => return Ok(None),
        };
        Ok(trusted.payload_claims().cloned())
    }
}

fn claim_uuid(claims: &Claims, name: &str) -> Result<Uuid> {
    let value = claims
        .get_claim(name)
        .and_then(|value| value.as_str())
        .ok_or_else(|| anyhow!("missing {} claim", name))?;
    Ok(Uuid::parse_str(value)?)
}

fn has_token_type(claims: &Claims, expected: &str) -> bool {
    claims
        .get_claim("typ")
        .and_then(|value| value.as_str())
        .map(|value| value == expected)
        .unwrap_or(false)
}
