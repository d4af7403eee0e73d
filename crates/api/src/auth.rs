//! Minimal bearer-JWT authentication: the core only ever sees an
//! already-validated `Option<UserId>` (spec.md §6's `Auth` collaborator),
//! so this module's job stops at producing that value from the
//! `Authorization` header.

use axum::http::HeaderMap;
use jsonwebtoken::{Algorithm, DecodingKey, Validation, decode};
use nebula_core::UserId;
use nebula_error::NebulaError;
use serde::Deserialize;

use crate::config::EngineConfig;

#[derive(Deserialize)]
struct Claims {
    sub: String,
}

/// Resolve the calling user from the `Authorization: Bearer <jwt>` header.
///
/// Returns `Ok(None)` for an anonymous request (no header, or no secret
/// configured to verify one against — every request is anonymous until an
/// operator opts in). Returns `Err(Unauthorized)` for a header that fails
/// to verify, so a caller presenting a bad token is rejected rather than
/// silently downgraded to anonymous.
pub fn authenticate(headers: &HeaderMap, config: &EngineConfig) -> Result<Option<UserId>, NebulaError> {
    let Some(secret) = &config.jwt_secret else {
        return Ok(None);
    };
    let Some(header) = headers.get(axum::http::header::AUTHORIZATION) else {
        return Ok(None);
    };
    let header = header.to_str().map_err(|_| NebulaError::new(
        nebula_error::ErrorKind::Unauthorized,
        "authorization header is not valid UTF-8",
    ))?;
    let token = header
        .strip_prefix("Bearer ")
        .ok_or_else(|| NebulaError::new(nebula_error::ErrorKind::Unauthorized, "expected a Bearer token"))?;

    let mut validation = Validation::new(Algorithm::HS256);
    validation.validate_exp = true;
    let data = decode::<Claims>(token, &DecodingKey::from_secret(secret.as_bytes()), &validation)
        .map_err(|e| NebulaError::new(nebula_error::ErrorKind::Unauthorized, format!("invalid token: {e}")))?;

    let user_id = UserId::parse(&data.claims.sub)
        .map_err(|_| NebulaError::new(nebula_error::ErrorKind::Unauthorized, "token subject is not a valid user id"))?;
    Ok(Some(user_id))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;
    use jsonwebtoken::{EncodingKey, Header, encode};

    fn config_with_secret(secret: &str) -> EngineConfig {
        let mut config = EngineConfig {
            bind_addr: "127.0.0.1:0".into(),
            max_concurrent_nodes: 1,
            default_node_timeout: std::time::Duration::from_secs(1),
            housekeeping_interval: std::time::Duration::from_secs(1),
            schedule_poll_interval: std::time::Duration::from_secs(1),
            execution_retention_days: 1,
            housekeeping_batch_size: 1,
            max_payload_bytes: 1,
            jwt_secret: None,
            rate_limit_per_minute: 1,
        };
        config.jwt_secret = Some(secret.to_string());
        config
    }

    fn token_for(user_id: UserId, secret: &str) -> String {
        let claims = serde_json::json!({"sub": user_id.to_string(), "exp": 9_999_999_999u64});
        encode(&Header::new(Algorithm::HS256), &claims, &EncodingKey::from_secret(secret.as_bytes())).unwrap()
    }

    #[test]
    fn no_secret_configured_is_always_anonymous() {
        let headers = HeaderMap::new();
        let config = config_with_secret("unused");
        let mut anonymous_config = config.clone();
        anonymous_config.jwt_secret = None;
        assert_eq!(authenticate(&headers, &anonymous_config).unwrap(), None);
    }

    #[test]
    fn missing_header_is_anonymous() {
        let headers = HeaderMap::new();
        let config = config_with_secret("s3cret");
        assert_eq!(authenticate(&headers, &config).unwrap(), None);
    }

    #[test]
    fn valid_token_resolves_user_id() {
        let secret = "s3cret";
        let user_id = UserId::v4();
        let mut headers = HeaderMap::new();
        headers.insert(
            axum::http::header::AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {}", token_for(user_id, secret))).unwrap(),
        );
        let config = config_with_secret(secret);
        assert_eq!(authenticate(&headers, &config).unwrap(), Some(user_id));
    }

    #[test]
    fn wrong_secret_is_rejected() {
        let user_id = UserId::v4();
        let mut headers = HeaderMap::new();
        headers.insert(
            axum::http::header::AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {}", token_for(user_id, "right-secret"))).unwrap(),
        );
        let config = config_with_secret("wrong-secret");
        let err = authenticate(&headers, &config).unwrap_err();
        assert_eq!(err.kind, nebula_error::ErrorKind::Unauthorized);
    }

    #[test]
    fn non_bearer_scheme_is_rejected() {
        let mut headers = HeaderMap::new();
        headers.insert(axum::http::header::AUTHORIZATION, HeaderValue::from_static("Basic abc123"));
        let config = config_with_secret("s3cret");
        let err = authenticate(&headers, &config).unwrap_err();
        assert_eq!(err.kind, nebula_error::ErrorKind::Unauthorized);
    }
}
