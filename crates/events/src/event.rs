use chrono::{DateTime, Utc};

/// A fact recorded by an aggregate once a transition has taken effect.
///
/// Payloads are never edited after recording. A schema change bumps
/// [`Event::version`] instead of reusing the old number.
pub trait Event: Clone + core::fmt::Debug + Send + Sync + 'static {
    /// Dotted name, `<context>.<aggregate>.<fact>`, e.g. `sales.sale.confirmed`.
    fn event_type(&self) -> &'static str;

    fn version(&self) -> u32;

    /// Business time of the transition, taken from the operation's clock.
    fn occurred_at(&self) -> DateTime<Utc>;
}
