//! Strongly-typed identifiers for engine entities.
//!
//! Each identifier wraps a [`domain-key`](https://crates.io/crates/domain-key)
//! `Uuid<D>` so that, for example, an [`ExecutionId`] cannot be passed where a
//! [`NodeId`] is expected — the mistake is caught at compile time rather than
//! surfacing as a runtime lookup miss.
//!
//! All ID types are `Copy` (16 bytes), support `v4()`/`nil()`/`parse(&str)`,
//! and round-trip through serde as a UUID string.

use domain_key::define_uuid;

pub use domain_key::UuidParseError;

define_uuid!(FlowIdDomain => FlowId);
define_uuid!(ExecutionIdDomain => ExecutionId);
define_uuid!(NodeIdDomain => NodeId);
define_uuid!(UserIdDomain => UserId);
define_uuid!(ApprovalIdDomain => ApprovalId);
define_uuid!(WebhookIdDomain => WebhookId);
define_uuid!(ScheduleIdDomain => ScheduleId);
define_uuid!(FormSubmissionIdDomain => FormSubmissionId);
define_uuid!(FormTriggerIdDomain => FormTriggerId);
define_uuid!(HousekeepingJobIdDomain => HousekeepingJobId);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn execution_id_v4_is_not_nil() {
        assert!(!ExecutionId::v4().is_nil());
    }

    #[test]
    fn id_nil_round_trips() {
        let id = NodeId::nil();
        assert!(id.is_nil());
        assert_eq!(id.to_string(), "00000000-0000-0000-0000-000000000000");
    }

    #[test]
    fn id_parse_roundtrip() {
        let id = FlowId::parse("550e8400-e29b-41d4-a716-446655440000").unwrap();
        assert_eq!(id.to_string(), "550e8400-e29b-41d4-a716-446655440000");
    }

    #[test]
    fn id_parse_invalid_errors() {
        assert!(FlowId::parse("not-a-uuid").is_err());
    }

    #[test]
    fn distinct_domains_are_distinct_types() {
        fn accepts_flow(_: FlowId) {}
        fn accepts_node(_: NodeId) {}
        accepts_flow(FlowId::v4());
        accepts_node(NodeId::v4());
    }

    #[test]
    fn serde_roundtrip() {
        let id = ExecutionId::v4();
        let json = serde_json::to_string(&id).unwrap();
        let back: ExecutionId = serde_json::from_str(&json).unwrap();
        assert_eq!(id, back);
    }

    #[test]
    fn ordering_is_consistent() {
        let a = NodeId::nil();
        let b = NodeId::parse("550e8400-e29b-41d4-a716-446655440000").unwrap();
        assert!(a < b);
    }
}
