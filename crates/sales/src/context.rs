use chrono::{DateTime, Utc};

use saleflow_accounting::{CommissionBook, FiscalBook};
use saleflow_auth::LoginUser;
use saleflow_core::{BranchId, StationId};
use saleflow_inventory::StockLedger;

use crate::fulfillment::WorkOrders;
use crate::hooks::SaleHooks;
use crate::settings::SalesSettings;

/// Everything an operation needs besides the sale itself.
///
/// The current user, branch, station and time are explicit; the collaborators
/// are borrowed for the duration of a single operation.
pub struct SaleContext<'a> {
    pub user: &'a LoginUser,
    pub branch: BranchId,
    pub station: StationId,
    pub now: DateTime<Utc>,
    pub settings: &'a SalesSettings,
    pub hooks: &'a dyn SaleHooks,
    pub stock: &'a mut dyn StockLedger,
    pub fiscal: &'a mut dyn FiscalBook,
    pub commissions: &'a mut dyn CommissionBook,
    pub work_orders: &'a mut dyn WorkOrders,
}
