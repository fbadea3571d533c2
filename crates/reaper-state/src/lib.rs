//! reaper-state — resource registry for reaper.
//!
//! Backed by [redb](https://docs.rs/redb), tracks the auxiliary resources
//! acquired by compute instances so they can be cleaned up when the
//! instance terminates.
//!
//! # Architecture
//!
//! Each tracked resource is a [`ResourceRecord`] JSON-serialized into a
//! single redb table with the composite key `{instance}:{name}`. The key
//! shape gives two things: `(instance, name)` uniqueness (re-registration
//! overwrites) and an `{instance}:` prefix scan that returns every record
//! of one instance in a single pass.
//!
//! A record existing here means the underlying resource *may* still exist
//! and must eventually be cleaned up; absence says nothing about the
//! provider side. Callers delete records once a cleanup attempt has been
//! made, whatever its outcome.
//!
//! The [`RegistryStore`] is `Clone` + `Send` + `Sync` (backed by
//! `Arc<Database>`) and supports an in-memory backend for testing.

pub mod error;
pub mod store;
pub mod types;

pub use error::{RegistryError, RegistryResult};
pub use store::{RegistryStore, DEFAULT_TABLE};
pub use types::*;
