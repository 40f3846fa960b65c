use serde::{Deserialize, Serialize};

/// Sale status lifecycle.
///
/// `Quote` → (`Ordered`) → `Confirmed` → {`Returned`, `Renegotiated`, `Cancelled`}.
/// `Initial` is the bootstrap state of a non-quoted sale and behaves like a
/// quote that has not been priced yet. Being paid is a flag on a confirmed
/// sale, not a status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SaleStatus {
    Initial,
    Quote,
    Ordered,
    Confirmed,
    Cancelled,
    Returned,
    Renegotiated,
}

impl SaleStatus {
    /// Items may be added, removed, repriced, reserved or split into batches.
    pub fn allows_item_edits(self) -> bool {
        matches!(
            self,
            SaleStatus::Initial | SaleStatus::Quote | SaleStatus::Ordered
        )
    }

    /// No further transition except undoing a return.
    pub fn is_final(self) -> bool {
        matches!(
            self,
            SaleStatus::Cancelled | SaleStatus::Returned | SaleStatus::Renegotiated
        )
    }
}

impl core::fmt::Display for SaleStatus {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let name = match self {
            SaleStatus::Initial => "Opened",
            SaleStatus::Quote => "Quoting",
            SaleStatus::Ordered => "Ordered",
            SaleStatus::Confirmed => "Confirmed",
            SaleStatus::Cancelled => "Cancelled",
            SaleStatus::Returned => "Returned",
            SaleStatus::Renegotiated => "Renegotiated",
        };
        f.write_str(name)
    }
}
