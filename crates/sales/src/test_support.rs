use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

use saleflow_accounting::{InMemoryCommissionBook, InMemoryFiscalBook};
use saleflow_auth::LoginUser;
use saleflow_catalog::{ProductFacet, Sellable, SellableId};
use saleflow_core::{AggregateId, BranchId, StationId, UserId};
use saleflow_inventory::{InMemoryStockLedger, StockLedger, StockMovement, StockReason};

use crate::context::SaleContext;
use crate::fulfillment::InMemoryWorkOrders;
use crate::hooks::{DefaultSaleHooks, SaleHooks};
use crate::sale::Sale;
use crate::settings::SalesSettings;

/// In-memory collaborators for one test.
pub(crate) struct Fixture {
    pub user: LoginUser,
    pub branch: BranchId,
    pub station: StationId,
    pub now: DateTime<Utc>,
    pub settings: SalesSettings,
    pub hooks: Box<dyn SaleHooks>,
    pub stock: InMemoryStockLedger,
    pub fiscal: InMemoryFiscalBook,
    pub commissions: InMemoryCommissionBook,
    pub work_orders: InMemoryWorkOrders,
    next_identifier: u64,
}

impl Fixture {
    pub fn new() -> Self {
        saleflow_observability::init_for_tests();
        Self {
            user: LoginUser::new(UserId::new(), "clerk"),
            branch: BranchId::new(),
            station: StationId::new(),
            now: Utc::now(),
            settings: SalesSettings::default(),
            hooks: Box::new(DefaultSaleHooks),
            stock: InMemoryStockLedger::new(),
            fiscal: InMemoryFiscalBook::new(),
            commissions: InMemoryCommissionBook::new(),
            work_orders: InMemoryWorkOrders::new(),
            next_identifier: 1,
        }
    }

    pub fn as_admin(mut self) -> Self {
        self.user = LoginUser::admin(UserId::new(), "admin");
        self
    }

    pub fn ctx(&mut self) -> SaleContext<'_> {
        SaleContext {
            user: &self.user,
            branch: self.branch,
            station: self.station,
            now: self.now,
            settings: &self.settings,
            hooks: self.hooks.as_ref(),
            stock: &mut self.stock,
            fiscal: &mut self.fiscal,
            commissions: &mut self.commissions,
            work_orders: &mut self.work_orders,
        }
    }

    pub fn quote(&mut self) -> Sale {
        let identifier = self.next_identifier;
        self.next_identifier += 1;
        Sale::new_quote(identifier, self.branch, self.station, self.user.id(), self.now)
    }

    /// Storable product with `stock` units on the fixture's branch.
    pub fn product(&mut self, code: &str, price: Decimal, stock: Decimal) -> Sellable {
        self.product_with(code, price, stock, ProductFacet::storable())
    }

    pub fn product_with(
        &mut self,
        code: &str,
        price: Decimal,
        stock: Decimal,
        facet: ProductFacet,
    ) -> Sellable {
        let sellable = Sellable::product(
            SellableId::new(AggregateId::new()),
            code,
            format!("Product {code}"),
            price,
            facet,
        );
        self.add_stock(&sellable, stock);
        sellable
    }

    pub fn service(&mut self, code: &str, price: Decimal, iss_rate: Decimal) -> Sellable {
        Sellable::service(
            SellableId::new(AggregateId::new()),
            code,
            format!("Service {code}"),
            price,
            iss_rate,
        )
    }

    pub fn add_stock(&mut self, sellable: &Sellable, quantity: Decimal) {
        if quantity > Decimal::ZERO {
            self.stock
                .increase_stock(&StockMovement::new(
                    sellable.id_typed(),
                    self.branch,
                    quantity,
                    StockReason::Initial,
                    self.user.id(),
                ))
                .unwrap();
        }
    }

    pub fn balance(&self, sellable: &Sellable) -> Decimal {
        self.stock.balance_for_branch(sellable.id_typed(), self.branch)
    }
}
