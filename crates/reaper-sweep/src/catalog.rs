//! Deletion catalog — maps (service, resource) pairs to delete operations.
//!
//! The catalog is populated once at startup from configuration and stays
//! immutable afterwards, so a sweep can only ever invoke an operation that
//! was deliberately wired in. Lookups that miss are reported by the sweeper
//! per record, never invented on the fly.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Keyword arguments for a delete operation, forwarded verbatim from the
/// values captured at registration time.
pub type DeleteArgs = serde_json::Map<String, serde_json::Value>;

/// Callback type for performing a single resource deletion.
///
/// The sweeper calls this with the record's captured kwargs.
pub type DeleteFn = Arc<dyn Fn(DeleteArgs) -> BoxFuture + Send + Sync>;

type BoxFuture = std::pin::Pin<
    Box<dyn std::future::Future<Output = anyhow::Result<()>> + Send>,
>;

/// Identity of a delete operation.
///
/// Renders as `{service}.delete_{resource}` in logs and reports.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct OperationId {
    pub service: String,
    pub resource: String,
}

impl OperationId {
    pub fn new(service: &str, resource: &str) -> Self {
        Self {
            service: service.to_string(),
            resource: resource.to_string(),
        }
    }
}

impl fmt::Display for OperationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.delete_{}", self.service, self.resource)
    }
}

/// Registry of delete operations keyed by (service, resource).
#[derive(Clone, Default)]
pub struct DeletionCatalog {
    ops: HashMap<OperationId, DeleteFn>,
}

impl DeletionCatalog {
    pub fn new() -> Self {
        Self {
            ops: HashMap::new(),
        }
    }

    /// Register the delete operation for a (service, resource) pair.
    ///
    /// Registering the same pair again replaces the previous operation.
    pub fn register(&mut self, service: &str, resource: &str, op: DeleteFn) {
        self.ops.insert(OperationId::new(service, resource), op);
    }

    /// Look up the operation for an id, if one was registered.
    pub fn resolve(&self, id: &OperationId) -> Option<DeleteFn> {
        self.ops.get(id).cloned()
    }

    /// All registered operation ids, sorted for stable startup logging.
    pub fn operations(&self) -> Vec<OperationId> {
        let mut ids: Vec<_> = self.ops.keys().cloned().collect();
        ids.sort();
        ids
    }

    pub fn len(&self) -> usize {
        self.ops.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }
}
