//! Extension points consulted by the sale guards.

use crate::sale::Sale;

/// Strategy injected by plugins or the embedding application.
///
/// Both methods default to "no opinion".
pub trait SaleHooks {
    /// The sale is managed by an external system (e.g. an e-commerce
    /// front); it can always be cancelled and is never editable here.
    fn is_external(&self, _sale: &Sale) -> bool {
        false
    }

    /// `Some(false)` vetoes a cancel, `Some(true)`/`None` defer to the
    /// regular rules.
    fn can_cancel(&self, _sale: &Sale) -> Option<bool> {
        None
    }
}

/// Hooks that never interfere.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultSaleHooks;

impl SaleHooks for DefaultSaleHooks {}
