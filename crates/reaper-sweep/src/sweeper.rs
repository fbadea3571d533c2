//! Sweeper — reconciles a terminated instance's tracked resources.
//!
//! Loads every registry record owned by the instance, groups them by
//! service, resolves each group's delete operation from the catalog, and
//! invokes it per record. Records are pruned from the registry whether or
//! not their delete succeeded, so the registry never outlives the
//! instance it tracks. A sweep only aborts on registry failure.

use serde::Serialize;
use serde_json::Value;
use tracing::{debug, error, info};

use reaper_event::envelope::KEY_INSTANCE_ID;
use reaper_event::Message;
use reaper_state::{RegistryStore, ResourceRecord};

use crate::catalog::{DeletionCatalog, OperationId};
use crate::error::{SweepError, SweepResult};

/// Outcome summary for one sweep.
///
/// `tracked` always equals `deleted + failed + unmatched`; every record
/// found is accounted for exactly once and pruned.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SweepReport {
    /// Instance whose resources were swept.
    pub instance: String,
    /// Registry records found for the instance.
    pub tracked: usize,
    /// Delete operations that completed successfully.
    pub deleted: usize,
    /// Delete operations that returned an error.
    pub failed: usize,
    /// Records whose (service, resource) pair had no catalog entry.
    pub unmatched: usize,
}

impl SweepReport {
    fn empty(instance: &str) -> Self {
        Self {
            instance: instance.to_string(),
            tracked: 0,
            deleted: 0,
            failed: 0,
            unmatched: 0,
        }
    }
}

/// The sweeper drives grouped deletion against the registry.
#[derive(Clone)]
pub struct Sweeper {
    state: RegistryStore,
    catalog: DeletionCatalog,
}

impl Sweeper {
    pub fn new(state: RegistryStore, catalog: DeletionCatalog) -> Self {
        Self { state, catalog }
    }

    /// Sweep the instance named by a cleanup message.
    ///
    /// The effective instance id is the non-empty override if given, else
    /// the message's instance id field. With neither, the sweep fails
    /// before touching the registry.
    pub async fn sweep_message(
        &self,
        message: &Message,
        instance_override: Option<&str>,
    ) -> SweepResult<SweepReport> {
        let instance = instance_override
            .filter(|id| !id.is_empty())
            .or_else(|| message.get(KEY_INSTANCE_ID).and_then(Value::as_str))
            .ok_or(SweepError::MissingInstanceId)?;

        self.sweep_instance(instance).await
    }

    /// Sweep every tracked resource owned by one instance.
    pub async fn sweep_instance(&self, instance: &str) -> SweepResult<SweepReport> {
        let mut records = self.state.records_for_instance(instance)?;
        if records.is_empty() {
            debug!(%instance, "no tracked resources; nothing to sweep");
            return Ok(SweepReport::empty(instance));
        }

        let mut report = SweepReport::empty(instance);
        report.tracked = records.len();

        // Stable sort: records come back from the registry in name order
        // and keep that order within each service group.
        records.sort_by(|a, b| a.properties.service.cmp(&b.properties.service));

        for group in records.chunk_by(|a, b| a.properties.service == b.properties.service) {
            self.sweep_group(instance, group, &mut report).await?;
        }

        info!(
            %instance,
            tracked = report.tracked,
            deleted = report.deleted,
            failed = report.failed,
            unmatched = report.unmatched,
            "sweep complete"
        );
        Ok(report)
    }

    /// Delete one contiguous service group.
    ///
    /// The operation is resolved once from the group's first record and
    /// reused for the rest; groups that mix resource types under one
    /// service all go through the first record's operation. Every record
    /// is pruned after its delete attempt, successful or not.
    async fn sweep_group(
        &self,
        instance: &str,
        group: &[ResourceRecord],
        report: &mut SweepReport,
    ) -> SweepResult<()> {
        let head = &group[0].properties;
        let op_id = OperationId::new(&head.service, &head.resource);
        let op = self.catalog.resolve(&op_id);

        for record in group {
            match &op {
                Some(op) => {
                    debug!(
                        %instance,
                        name = %record.name,
                        operation = %op_id,
                        "deleting resource"
                    );
                    match op(record.properties.kwargs.clone()).await {
                        Ok(()) => report.deleted += 1,
                        Err(e) => {
                            report.failed += 1;
                            error!(
                                %instance,
                                name = %record.name,
                                operation = %op_id,
                                error = %e,
                                "delete failed; pruning record anyway"
                            );
                        }
                    }
                }
                None => {
                    report.unmatched += 1;
                    error!(
                        %instance,
                        name = %record.name,
                        operation = %op_id,
                        "no delete operation registered; pruning record"
                    );
                }
            }

            self.state.delete_record(instance, &record.name)?;
        }

        Ok(())
    }
}
