//! Domain types for the resource registry.
//!
//! A [`ResourceRecord`] describes one auxiliary resource (network
//! interface, volume, DNS record, ...) acquired by a compute instance and
//! tracked for cleanup when that instance terminates. Records are
//! serializable to/from JSON for storage in the redb table and arrive on
//! the wire in the same shape.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Opaque compute instance identifier (the registry partition key).
pub type InstanceId = String;

/// One tracked resource belonging to an instance.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ResourceRecord {
    /// Owning instance. Opaque token; must not contain `:` (the registry
    /// key separator).
    pub instance: InstanceId,
    /// Resource identifier, unique within an instance.
    pub name: String,
    /// How to delete the underlying resource.
    pub properties: ResourceProperties,
}

/// Deletion coordinates for a tracked resource.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ResourceProperties {
    /// Provider-service namespace selecting the deletion client family
    /// (e.g. `ec2`, `route53`). Records of one instance are grouped by
    /// this value before deletion.
    pub service: String,
    /// Resource-type discriminator selecting the deletion operation within
    /// the service (e.g. `network_interface`).
    pub resource: String,
    /// Named arguments passed verbatim to the deletion operation.
    #[serde(default)]
    pub kwargs: Map<String, Value>,
}

impl ResourceRecord {
    /// Build the composite key for the registry table.
    pub fn table_key(&self) -> String {
        format!("{}:{}", self.instance, self.name)
    }

    /// Check the record against the registry's key encoding.
    ///
    /// Instance and name must be non-empty, and the instance must not
    /// contain `:`. A `:` in the instance would make the composite key
    /// ambiguous and let prefix scans bleed across instances. Names may
    /// contain `:` safely since the instance part is unambiguous.
    pub fn validate(&self) -> Result<(), String> {
        if self.instance.is_empty() {
            return Err("instance must be non-empty".to_string());
        }
        if self.instance.contains(':') {
            return Err(format!("instance {:?} must not contain ':'", self.instance));
        }
        if self.name.is_empty() {
            return Err("name must be non-empty".to_string());
        }
        Ok(())
    }
}
