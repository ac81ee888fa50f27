use chrono::{DateTime, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};

use super::Claims;
use crate::error::AppError;

pub const EXPIRED_MESSAGE: &str = "jwt expired";

#[derive(Clone)]
pub struct JwtKeys {
    pub enc: EncodingKey,
    pub dec: DecodingKey,
}

impl JwtKeys {
    pub fn from_secret(secret: &[u8]) -> Self {
        Self {
            enc: EncodingKey::from_secret(secret),
            dec: DecodingKey::from_secret(secret),
        }
    }
}

pub fn encode_token(keys: &JwtKeys, claims: &Claims) -> Result<String, AppError> {
    let mut header = Header::new(Algorithm::HS256);
    header.typ = Some("JWT".into());

    encode(&header, claims, &keys.enc)
        .map_err(|err| AppError::internal(format!("Token encoding failed: {err}")))
}

pub fn make_access_claims(user_id: &uuid::Uuid, ttl_secs: usize, now: DateTime<Utc>) -> Claims {
    let iat = now.timestamp();
    Claims {
        sub: user_id.to_string(),
        iat,
        exp: iat + ttl_secs as i64,
    }
}

pub fn decode_access(keys: &JwtKeys, token: &str) -> Result<Claims, AppError> {
    decode_access_at(keys, token, Utc::now())
}

/// Signature and shape are checked by jsonwebtoken; expiry is checked against `now`
/// so an expired token can be told apart from a forged one.
pub fn decode_access_at(
    keys: &JwtKeys,
    token: &str,
    now: DateTime<Utc>,
) -> Result<Claims, AppError> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.validate_exp = false;
    validation.set_required_spec_claims(&["exp", "sub"]);

    let claims = decode::<Claims>(token, &keys.dec, &validation)
        .map_err(|err| {
            tracing::debug!(error = %err, "rejected access token");
            AppError::unauthorized("Unauthorized")
        })?
        .claims;

    if claims.exp <= now.timestamp() {
        return Err(AppError::unauthorized(EXPIRED_MESSAGE));
    }
    Ok(claims)
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, TimeZone, Utc};
    use uuid::Uuid;

    use super::{JwtKeys, decode_access_at, encode_token, make_access_claims};

    fn now() -> chrono::DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0)
            .single()
            .expect("timestamp should be valid")
    }

    #[test]
    fn makes_claims_with_expected_subject_and_ttl() {
        let user_id = Uuid::new_v4();
        let claims = make_access_claims(&user_id, 60, now());

        assert_eq!(claims.sub, user_id.to_string());
        assert_eq!(claims.iat, now().timestamp());
        assert_eq!(claims.exp - claims.iat, 60);
    }

    #[test]
    fn token_decodes_to_subject_until_it_expires() {
        let keys = JwtKeys::from_secret(b"unit-test-secret");
        let user_id = Uuid::new_v4();
        let token = encode_token(&keys, &make_access_claims(&user_id, 900, now()))
            .expect("token should encode");

        let claims = decode_access_at(&keys, &token, now() + Duration::seconds(899))
            .expect("token should still be valid");
        assert_eq!(claims.sub, user_id.to_string());

        let err = decode_access_at(&keys, &token, now() + Duration::seconds(901))
            .expect_err("token should be expired");
        assert_eq!(err.message(), "jwt expired");
    }

    #[test]
    fn foreign_signature_is_unauthorized() {
        let token = encode_token(
            &JwtKeys::from_secret(b"other-secret"),
            &make_access_claims(&Uuid::new_v4(), 900, now()),
        )
        .expect("token should encode");

        let err = decode_access_at(&JwtKeys::from_secret(b"unit-test-secret"), &token, now())
            .expect_err("signature should not verify");
        assert_eq!(err.message(), "Unauthorized");
    }

    #[test]
    fn garbage_is_unauthorized() {
        let err = decode_access_at(&JwtKeys::from_secret(b"secret"), "not-a-token", now())
            .expect_err("decode should fail");
        assert_eq!(err.message(), "Unauthorized");
    }
}
