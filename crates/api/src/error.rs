//! Maps `NebulaError` onto the wire shape and HTTP status spec.md §7 calls for:
//! `{error, code}` bodies, plus field-level detail for validation failures.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use nebula_error::{ErrorKind, NebulaError};
use serde::Serialize;

/// Newtype so this crate can implement [`IntoResponse`] for `NebulaError`
/// without orphan-rule trouble (`NebulaError` lives in `nebula-error`).
pub struct ApiError(pub NebulaError);

impl From<NebulaError> for ApiError {
    fn from(err: NebulaError) -> Self {
        Self(err)
    }
}

#[derive(Serialize)]
struct ErrorBody<'a> {
    error: &'a str,
    code: &'a str,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    fields: &'a [nebula_error::FieldError],
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = status_for(self.0.kind);
        let body = ErrorBody {
            error: &self.0.message,
            code: self.0.kind.code(),
            fields: &self.0.fields,
        };
        (status, Json(body)).into_response()
    }
}

/// Status mapping for the error taxonomy in spec.md §7. Kinds not reachable
/// from the HTTP surface (e.g. `HandlerCrash`) still get a sensible status
/// so a coordinator error bubbling up through an unexpected path doesn't
/// panic the response layer.
fn status_for(kind: ErrorKind) -> StatusCode {
    match kind {
        ErrorKind::InvalidConfig | ErrorKind::InvalidDefinition => StatusCode::BAD_REQUEST,
        ErrorKind::UnknownNodeType => StatusCode::BAD_REQUEST,
        ErrorKind::FlowNotFound | ErrorKind::ExecutionNotFound | ErrorKind::NoPublishedVersion => {
            StatusCode::NOT_FOUND
        }
        ErrorKind::NotPaused
        | ErrorKind::AlreadyTerminal
        | ErrorKind::AlreadyActed
        | ErrorKind::WaitMismatch
        | ErrorKind::AlreadyResolved
        | ErrorKind::InvalidTransition => StatusCode::CONFLICT,
        ErrorKind::FormClosed => StatusCode::GONE,
        ErrorKind::Unauthorized => StatusCode::UNAUTHORIZED,
        ErrorKind::Forbidden | ErrorKind::SignatureInvalid => StatusCode::UNAUTHORIZED,
        ErrorKind::PayloadTooLarge => StatusCode::PAYLOAD_TOO_LARGE,
        ErrorKind::RateLimited => StatusCode::TOO_MANY_REQUESTS,
        ErrorKind::Timeout => StatusCode::GATEWAY_TIMEOUT,
        ErrorKind::HandlerCrash | ErrorKind::DependencyFailure => StatusCode::INTERNAL_SERVER_ERROR,
        ErrorKind::Cancelled => StatusCode::CONFLICT,
        ErrorKind::CredentialNotFound | ErrorKind::KeyMismatch => StatusCode::UNPROCESSABLE_ENTITY,
    }
}
