//! reaper-event — notification classification for reaper.
//!
//! Decides what an inbound notification envelope means before any state is
//! touched. The transport delivers at-least-once, JSON-encoded envelopes
//! wrapping a free-form message plus metadata attributes; this crate
//! extracts the message and maps the envelope onto the closed
//! [`EventKind`] set the dispatcher routes on.
//!
//! # Architecture
//!
//! ```text
//! raw JSON envelope
//!   │
//!   ├── decode Records[0].Sns.{Message, MessageAttributes}
//!   ├── first-match predicates: Register → Cleanup → TestNotification
//!   │
//!   ▼
//! (EventKind, Message)
//! ```
//!
//! Classification is a pure function and is total: malformed input of any
//! shape classifies as `Unrecognized` with an empty message instead of
//! failing. Every predicate uses defensive field access and cannot panic.

pub mod classify;
pub mod envelope;

pub use classify::{classify, EventKind};
pub use envelope::Message;
