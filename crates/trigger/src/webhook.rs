//! Webhook ingress: path/method routing and request authentication.
//!
//! A [`Webhook`] owns no network code — it is the pure decision of "does this
//! request authenticate, and is it small enough to accept" that the HTTP
//! layer in `nebula-api` calls before invoking `startExecution`.

use std::sync::LazyLock;

use hmac::{Hmac, Mac};
use nebula_core::{FlowId, WebhookId};
use nebula_error::NebulaError;
use regex::Regex;
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use subtle::ConstantTimeEq;

/// Payload cap enforced before authentication, so an oversized body never
/// reaches the HMAC computation.
pub const MAX_PAYLOAD_BYTES: usize = 1024 * 1024;

static PATH_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9_\-]+$").expect("path pattern is a valid regex"));

/// How a webhook's inbound requests are authenticated.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum WebhookAuth {
    /// No authentication; any request on the matching path/method is accepted.
    None,
    /// HMAC-SHA256 of the raw body, compared against `X-Webhook-Signature`.
    Hmac { secret: String },
    /// Static bearer token, compared against the `Authorization` header.
    Bearer { token: String },
}

/// A registered webhook endpoint: `(path, method)` routes to a flow.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Webhook {
    pub id: WebhookId,
    pub flow_id: FlowId,
    pub path: String,
    pub method: String,
    pub auth: WebhookAuth,
    pub is_active: bool,
}

impl Webhook {
    /// Register a webhook. Fails if `path` doesn't match `^[A-Za-z0-9_-]+$`.
    pub fn new(
        flow_id: FlowId,
        path: impl Into<String>,
        method: impl Into<String>,
        auth: WebhookAuth,
    ) -> Result<Self, NebulaError> {
        let path = path.into();
        if !PATH_PATTERN.is_match(&path) {
            return Err(NebulaError::invalid_config(format!(
                "webhook path '{path}' must match ^[A-Za-z0-9_-]+$"
            )));
        }
        Ok(Self {
            id: WebhookId::v4(),
            flow_id,
            path,
            method: method.into().to_ascii_uppercase(),
            auth,
            is_active: true,
        })
    }

    /// Returns `true` if this webhook is the routing target for the request.
    #[must_use]
    pub fn matches(&self, path: &str, method: &str) -> bool {
        self.is_active && self.path == path && self.method.eq_ignore_ascii_case(method)
    }

    /// Authenticate one request. `signature_header` is `X-Webhook-Signature`;
    /// `authorization_header` is the raw `Authorization` header value.
    pub fn authenticate(
        &self,
        body: &[u8],
        signature_header: Option<&str>,
        authorization_header: Option<&str>,
    ) -> Result<(), NebulaError> {
        if body.len() > MAX_PAYLOAD_BYTES {
            return Err(NebulaError::payload_too_large(MAX_PAYLOAD_BYTES));
        }
        match &self.auth {
            WebhookAuth::None => Ok(()),
            WebhookAuth::Hmac { secret } => {
                let provided = signature_header.ok_or_else(NebulaError::signature_invalid)?;
                let provided = provided.strip_prefix("sha256=").unwrap_or(provided);

                let mut mac = Hmac::<Sha256>::new_from_slice(secret.as_bytes())
                    .map_err(|_| NebulaError::signature_invalid())?;
                mac.update(body);
                let expected = hex::encode(mac.finalize().into_bytes());

                if constant_time_eq(expected.as_bytes(), provided.as_bytes()) {
                    Ok(())
                } else {
                    Err(NebulaError::signature_invalid())
                }
            }
            WebhookAuth::Bearer { token } => {
                let header = authorization_header.ok_or_else(NebulaError::signature_invalid)?;
                let provided = header.strip_prefix("Bearer ").unwrap_or(header);
                if constant_time_eq(token.as_bytes(), provided.as_bytes()) {
                    Ok(())
                } else {
                    Err(NebulaError::signature_invalid())
                }
            }
        }
    }
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    a.len() == b.len() && bool::from(a.ct_eq(b))
}

/// Validate a webhook path independently of constructing a [`Webhook`] —
/// used by the API layer to reject malformed paths before a DB lookup.
pub fn validate_path(path: &str) -> Result<(), NebulaError> {
    if PATH_PATTERN.is_match(path) {
        Ok(())
    } else {
        Err(NebulaError::invalid_config(format!(
            "webhook path '{path}' must match ^[A-Za-z0-9_-]+$"
        )))
    }
}
