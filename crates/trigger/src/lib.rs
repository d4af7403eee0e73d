//! Trigger ingress: the three ways an external event starts or resumes an
//! execution without the caller ever touching the [`nebula_engine::Coordinator`]
//! directly.
//!
//! Each module is a pure decision layer — `nebula-api` owns the actual HTTP
//! routing and calls into these types before invoking `start_execution`/
//! `resume_execution`. None of them hold a reference to the coordinator or a
//! store; that wiring lives one layer up.

mod form;
mod schedule;
mod webhook;

pub use form::{FormSubmission, FormTrigger};
pub use schedule::{MIN_INTERVAL_MS, Schedule, ScheduleKind};
pub use webhook::{MAX_PAYLOAD_BYTES, Webhook, WebhookAuth, validate_path};

/// Common prelude for crates that accept external triggers.
pub mod prelude {
    pub use crate::{
        FormSubmission, FormTrigger, MAX_PAYLOAD_BYTES, MIN_INTERVAL_MS, Schedule, ScheduleKind,
        Webhook, WebhookAuth, validate_path,
    };
}
