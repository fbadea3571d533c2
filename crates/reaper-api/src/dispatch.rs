//! Dispatcher — routes each classified notification to one engine operation.
//!
//! The match over [`EventKind`] is exhaustive, so every notification takes
//! exactly one path. Unrecognized envelopes are an expected input on a
//! shared topic: they are logged and acknowledged, never retried.

use serde::Serialize;
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, error, info};

use reaper_event::{classify, EventKind, Message};
use reaper_state::{RegistryError, RegistryStore, ResourceRecord};
use reaper_sweep::{SweepError, SweepReport, Sweeper};

/// Errors that can fail the handling of one envelope.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("register message does not decode into a resource record: {0}")]
    MalformedRecord(String),

    #[error("sweep error: {0}")]
    Sweep(#[from] SweepError),

    #[error("registry error: {0}")]
    Registry(#[from] RegistryError),
}

/// What the dispatcher did with an envelope.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Disposition {
    /// The resource record was stored.
    Registered { instance: String, name: String },
    /// The instance's tracked resources were swept.
    Swept(SweepReport),
    /// A test notification, acknowledged and dropped.
    Ignored,
    /// Nothing matched; logged and dropped.
    Unrecognized,
}

/// Classifies envelopes and drives the registry and the sweeper.
#[derive(Clone)]
pub struct Dispatcher {
    state: RegistryStore,
    sweeper: Sweeper,
}

impl Dispatcher {
    pub fn new(state: RegistryStore, sweeper: Sweeper) -> Self {
        Self { state, sweeper }
    }

    /// Classify and handle one raw envelope.
    pub async fn handle(&self, envelope: &Value) -> Result<Disposition, ApiError> {
        debug!(envelope = %envelope, "handling notification");

        let (kind, message) = classify(envelope);
        match kind {
            EventKind::Register => self.register(&message),
            EventKind::Cleanup => {
                let report = self.sweeper.sweep_message(&message, None).await?;
                Ok(Disposition::Swept(report))
            }
            EventKind::TestNotification => {
                info!("test notification acknowledged");
                Ok(Disposition::Ignored)
            }
            EventKind::Unrecognized => {
                error!(envelope = %envelope, "unrecognized notification; dropping");
                Ok(Disposition::Unrecognized)
            }
        }
    }

    /// Decode the message as a resource record and upsert it.
    fn register(&self, message: &Message) -> Result<Disposition, ApiError> {
        let record: ResourceRecord = serde_json::from_value(Value::Object(message.clone()))
            .map_err(|e| ApiError::MalformedRecord(e.to_string()))?;
        record.validate().map_err(ApiError::MalformedRecord)?;

        self.state.put_record(&record)?;
        info!(
            instance = %record.instance,
            name = %record.name,
            service = %record.properties.service,
            resource = %record.properties.resource,
            "resource registered"
        );

        Ok(Disposition::Registered {
            instance: record.instance,
            name: record.name,
        })
    }
}
