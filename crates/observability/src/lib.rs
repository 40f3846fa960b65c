//! Log subscriber setup for processes and tests embedding the sale engine.

pub mod tracing;

pub use self::tracing::{init_for_tests, init_with_default_filter};

/// Install the JSON subscriber at `info`. Later calls leave the first
/// subscriber in place.
pub fn init() {
    tracing::init();
}
