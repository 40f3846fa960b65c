//! Domain events.
//!
//! Aggregates record facts as [`Event`] payloads wrapped in an
//! [`EventEnvelope`]; persisting or publishing them is the caller's job.

pub mod envelope;
pub mod event;

pub use envelope::EventEnvelope;
pub use event::Event;
