//! Event classification over the closed [`EventKind`] set.

use serde_json::Value;
use tracing::trace;

use crate::envelope::{
    self, Attributes, Message, EVENT_INSTANCE_TERMINATE, EVENT_TEST_NOTIFICATION, KEY_EVENT,
    KEY_GROUP_ARN, REGISTER_ATTRIBUTE, REGISTER_VALUE,
};

/// The kinds of notification the engine understands.
///
/// Closed set: the dispatcher matches exhaustively, so adding a kind here
/// forces a predicate and a handler at compile time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    /// A resource registration request.
    Register,
    /// An instance terminated; its tracked resources must be swept.
    Cleanup,
    /// The transport's test notification, acknowledged and ignored.
    TestNotification,
    /// Anything else, including envelopes that failed to decode.
    Unrecognized,
}

/// Classify a raw envelope, returning the kind and the decoded message.
///
/// Total and pure: malformed envelopes of any shape classify as
/// [`EventKind::Unrecognized`] with an empty message, never an error or a
/// panic, and no state is read or written. Predicates are evaluated in a
/// fixed order with first match winning.
pub fn classify(envelope: &Value) -> (EventKind, Message) {
    let Some((message, attributes)) = envelope::decode(envelope) else {
        trace!("envelope did not decode; classifying as unrecognized");
        return (EventKind::Unrecognized, Message::new());
    };

    let kind = if is_register(&attributes) {
        EventKind::Register
    } else if is_instance_terminate(&message) {
        EventKind::Cleanup
    } else if is_test_notification(&message) {
        EventKind::TestNotification
    } else {
        EventKind::Unrecognized
    };

    (kind, message)
}

/// The registration sentinel attribute carries the expected value.
fn is_register(attributes: &Attributes) -> bool {
    attributes
        .get(REGISTER_ATTRIBUTE)
        .and_then(|attr| attr.get("Value"))
        .and_then(Value::as_str)
        == Some(REGISTER_VALUE)
}

/// The message declares an autoscaling group and the given event type.
fn lifecycle_event(message: &Message, event: &str) -> bool {
    message.contains_key(KEY_GROUP_ARN)
        && message.get(KEY_EVENT).and_then(Value::as_str) == Some(event)
}

fn is_instance_terminate(message: &Message) -> bool {
    lifecycle_event(message, EVENT_INSTANCE_TERMINATE)
}

fn is_test_notification(message: &Message) -> bool {
    lifecycle_event(message, EVENT_TEST_NOTIFICATION)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    /// Wrap a message body and attributes the way the transport does.
    fn envelope_with(message: &Value, attributes: Value) -> Value {
        json!({
            "Records": [{
                "Sns": {
                    "Message": message.to_string(),
                    "MessageAttributes": attributes,
                }
            }]
        })
    }

    fn register_attributes() -> Value {
        json!({ "reaper": { "Type": "String", "Value": "register" } })
    }

    fn terminate_message() -> Value {
        json!({
            "AutoScalingGroupARN": "arn:aws:autoscaling:eu-west-1:123:autoScalingGroup:g1",
            "Event": "autoscaling:EC2_INSTANCE_TERMINATE",
            "EC2InstanceId": "i-0abc",
        })
    }

    // ── Happy paths ────────────────────────────────────────────────

    #[test]
    fn register_attribute_classifies_register() {
        let message = json!({"instance": "i-1", "name": "eni-1", "properties": {}});
        let envelope = envelope_with(&message, register_attributes());

        let (kind, decoded) = classify(&envelope);
        assert_eq!(kind, EventKind::Register);
        assert_eq!(decoded["instance"], "i-1");
    }

    #[test]
    fn terminate_event_classifies_cleanup() {
        let envelope = envelope_with(&terminate_message(), json!({}));

        let (kind, decoded) = classify(&envelope);
        assert_eq!(kind, EventKind::Cleanup);
        assert_eq!(decoded["EC2InstanceId"], "i-0abc");
    }

    #[test]
    fn test_notification_classifies_test() {
        let message = json!({
            "AutoScalingGroupARN": "arn:aws:autoscaling:eu-west-1:123:autoScalingGroup:g1",
            "Event": "autoscaling:TEST_NOTIFICATION",
        });
        let envelope = envelope_with(&message, json!({}));

        assert_eq!(classify(&envelope).0, EventKind::TestNotification);
    }

    #[test]
    fn cleanup_ignores_extra_fields_and_attribute_content() {
        let mut message = terminate_message();
        message["Unrelated"] = json!({"deeply": ["nested", 1]});
        // Attribute values of any shape must not interfere.
        let attributes = json!({
            "trace-id": "bare string, not an object",
            "other": { "Value": 42 },
        });
        let envelope = envelope_with(&message, attributes);

        assert_eq!(classify(&envelope).0, EventKind::Cleanup);
    }

    #[test]
    fn register_wins_over_lifecycle_fields() {
        // First-match ordering: the sentinel attribute beats a message that
        // also looks like a termination.
        let envelope = envelope_with(&terminate_message(), register_attributes());
        assert_eq!(classify(&envelope).0, EventKind::Register);
    }

    #[test]
    fn register_sentinel_with_wrong_value_does_not_match() {
        let message = json!({"instance": "i-1"});
        let attributes = json!({ "reaper": { "Type": "String", "Value": "deregister" } });
        let envelope = envelope_with(&message, attributes);

        assert_eq!(classify(&envelope).0, EventKind::Unrecognized);
    }

    // ── Partial lifecycle shapes ───────────────────────────────────

    #[test]
    fn group_arn_without_event_is_unrecognized() {
        let message = json!({"AutoScalingGroupARN": "arn:..."});
        let envelope = envelope_with(&message, json!({}));

        let (kind, decoded) = classify(&envelope);
        assert_eq!(kind, EventKind::Unrecognized);
        // The decoded message is still returned for logging.
        assert_eq!(decoded["AutoScalingGroupARN"], "arn:...");
    }

    #[test]
    fn event_without_group_arn_is_unrecognized() {
        let message = json!({"Event": "autoscaling:EC2_INSTANCE_TERMINATE"});
        let envelope = envelope_with(&message, json!({}));

        assert_eq!(classify(&envelope).0, EventKind::Unrecognized);
    }

    #[test]
    fn unrelated_event_value_is_unrecognized() {
        let message = json!({
            "AutoScalingGroupARN": "arn:...",
            "Event": "autoscaling:EC2_INSTANCE_LAUNCH",
        });
        let envelope = envelope_with(&message, json!({}));

        assert_eq!(classify(&envelope).0, EventKind::Unrecognized);
    }

    // ── Malformed envelopes never panic ────────────────────────────

    fn assert_unrecognized_and_empty(envelope: Value) {
        let (kind, message) = classify(&envelope);
        assert_eq!(kind, EventKind::Unrecognized);
        assert!(message.is_empty());
    }

    #[test]
    fn missing_records_is_unrecognized() {
        assert_unrecognized_and_empty(json!({"something": "else"}));
    }

    #[test]
    fn empty_records_is_unrecognized() {
        assert_unrecognized_and_empty(json!({"Records": []}));
    }

    #[test]
    fn missing_sns_is_unrecognized() {
        assert_unrecognized_and_empty(json!({"Records": [{"S3": {}}]}));
    }

    #[test]
    fn non_json_message_is_unrecognized() {
        assert_unrecognized_and_empty(json!({
            "Records": [{"Sns": {"Message": "not json", "MessageAttributes": {}}}]
        }));
    }

    #[test]
    fn non_object_message_is_unrecognized() {
        assert_unrecognized_and_empty(json!({
            "Records": [{"Sns": {"Message": "[1, 2, 3]", "MessageAttributes": {}}}]
        }));
    }

    #[test]
    fn missing_attributes_is_unrecognized() {
        // Metadata is required on the wire; without it, nothing classifies.
        assert_unrecognized_and_empty(json!({
            "Records": [{"Sns": {"Message": terminate_message().to_string()}}]
        }));
    }

    #[test]
    fn non_object_envelope_is_unrecognized() {
        assert_unrecognized_and_empty(json!("just a string"));
        assert_unrecognized_and_empty(json!(42));
        assert_unrecognized_and_empty(json!([{"Records": []}]));
        assert_unrecognized_and_empty(Value::Null);
    }

    #[test]
    fn only_first_record_is_inspected() {
        let second = envelope_with(&terminate_message(), json!({}));
        let envelope = json!({
            "Records": [
                {"Sns": {"Message": "{}", "MessageAttributes": {}}},
                second["Records"][0],
            ]
        });

        assert_eq!(classify(&envelope).0, EventKind::Unrecognized);
    }
}
