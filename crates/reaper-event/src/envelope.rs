//! Inbound notification envelope: wire shape and constants.
//!
//! The transport wraps each notification as
//! `{"Records": [{"Sns": {"Message": <JSON string>, "MessageAttributes":
//! {...}}}]}`. The message body is free-form JSON; attributes carry
//! transport metadata and are consulted only during classification.

use std::collections::HashMap;

use serde::Deserialize;
use serde_json::{Map, Value};

/// Decoded free-form message body carried by a notification.
pub type Message = Map<String, Value>;

/// Metadata attributes attached to a notification, kept raw so one
/// malformed attribute cannot poison classification of the rest.
pub type Attributes = HashMap<String, Value>;

/// Attribute name whose value marks a registration request.
pub const REGISTER_ATTRIBUTE: &str = "reaper";

/// Sentinel value of [`REGISTER_ATTRIBUTE`] on registration requests.
pub const REGISTER_VALUE: &str = "register";

/// Message key naming the autoscaling group, present on lifecycle events.
pub const KEY_GROUP_ARN: &str = "AutoScalingGroupARN";

/// Message key carrying the lifecycle event type.
pub const KEY_EVENT: &str = "Event";

/// Message key carrying the terminated instance id.
pub const KEY_INSTANCE_ID: &str = "EC2InstanceId";

/// Lifecycle event value announcing an instance termination.
pub const EVENT_INSTANCE_TERMINATE: &str = "autoscaling:EC2_INSTANCE_TERMINATE";

/// Lifecycle event value of the transport's test notification.
pub const EVENT_TEST_NOTIFICATION: &str = "autoscaling:TEST_NOTIFICATION";

#[derive(Debug, Deserialize)]
struct Envelope {
    #[serde(rename = "Records")]
    records: Vec<RecordEntry>,
}

#[derive(Debug, Deserialize)]
struct RecordEntry {
    #[serde(rename = "Sns")]
    sns: Notification,
}

#[derive(Debug, Deserialize)]
struct Notification {
    /// JSON-encoded message body.
    #[serde(rename = "Message")]
    message: String,
    /// Required on the wire; a notification without attributes does not
    /// classify.
    #[serde(rename = "MessageAttributes")]
    attributes: Attributes,
}

/// Extract the first record's decoded message and attributes.
///
/// Returns `None` for any malformed envelope: missing or empty `Records`,
/// missing `Sns`, a message that is not a string of JSON, a message that
/// decodes to something other than an object, or missing
/// `MessageAttributes`. Entries past the first are ignored.
pub(crate) fn decode(envelope: &Value) -> Option<(Message, Attributes)> {
    let envelope: Envelope = serde_json::from_value(envelope.clone()).ok()?;
    let entry = envelope.records.into_iter().next()?;
    let message: Message = serde_json::from_str(&entry.sns.message).ok()?;
    Some((message, entry.sns.attributes))
}
