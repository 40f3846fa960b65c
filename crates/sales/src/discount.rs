//! Sale-level discount and surcharge allocation.
//!
//! A percentage is applied to every line's base price, each unit price is
//! rounded to cents and then one line absorbs the rounding difference so the
//! subtotal lands on `base_subtotal ∓ requested` whenever the prices allow it.

use rust_decimal::Decimal;

use saleflow_core::{MIN_UNIT, percent_of, quantize};

/// Line that can be repriced by an allocation.
pub trait PricedLine {
    fn base_price(&self) -> Decimal;
    fn quantity(&self) -> Decimal;
    fn price(&self) -> Decimal;
    fn set_price(&mut self, price: Decimal);

    fn line_total(&self) -> Decimal {
        quantize(self.price() * self.quantity())
    }

    fn base_line_total(&self) -> Decimal {
        quantize(self.base_price() * self.quantity())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdjustmentKind {
    Discount,
    Surcharge,
}

/// Outcome of [`allocate`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscountAllocation {
    /// `percentage` of the base subtotal, in cents.
    pub requested: Decimal,
    /// Amount actually reflected in the new subtotal.
    pub applied: Decimal,
    /// `requested - applied`; non-zero only when the minimum price got in the way.
    pub shortfall: Decimal,
    /// Index of the line that absorbed the rounding difference.
    pub corrected: Option<usize>,
}

/// Reprice `lines` so their subtotal is `percentage` below (or above) the
/// base subtotal.
///
/// Lines with a zero base price (package parents, free items) keep a zero
/// price. Every other line ends with a price of at least one cent.
pub fn allocate<L: PricedLine>(
    lines: &mut [L],
    percentage: Decimal,
    kind: AdjustmentKind,
) -> DiscountAllocation {
    let base_subtotal: Decimal = lines.iter().map(PricedLine::base_line_total).sum();
    let requested = percent_of(base_subtotal, percentage);
    let (factor, target) = match kind {
        AdjustmentKind::Discount => (
            (Decimal::ONE_HUNDRED - percentage) / Decimal::ONE_HUNDRED,
            base_subtotal - requested,
        ),
        AdjustmentKind::Surcharge => (
            (Decimal::ONE_HUNDRED + percentage) / Decimal::ONE_HUNDRED,
            base_subtotal + requested,
        ),
    };

    for line in lines.iter_mut() {
        let base = line.base_price();
        if base > Decimal::ZERO {
            line.set_price(quantize(base * factor).max(MIN_UNIT));
        } else {
            line.set_price(base.max(Decimal::ZERO));
        }
    }

    let subtotal: Decimal = lines.iter().map(PricedLine::line_total).sum();
    let diff = subtotal - target;
    let mut corrected = None;

    if !diff.is_zero() {
        corrected = correction_line(lines);
        if let Some(index) = corrected {
            let line = &mut lines[index];
            let per_unit = quantize(diff / line.quantity());
            line.set_price((line.price() - per_unit).max(MIN_UNIT));
        }
    }

    let subtotal: Decimal = lines.iter().map(PricedLine::line_total).sum();
    let applied = match kind {
        AdjustmentKind::Discount => base_subtotal - subtotal,
        AdjustmentKind::Surcharge => subtotal - base_subtotal,
    };

    DiscountAllocation {
        requested,
        applied,
        shortfall: requested - applied,
        corrected,
    }
}

/// Prefer a single-unit line so the correction is exact to the cent.
fn correction_line<L: PricedLine>(lines: &[L]) -> Option<usize> {
    let priced = |l: &L| l.base_price() > Decimal::ZERO && l.quantity() > Decimal::ZERO;
    lines
        .iter()
        .rposition(|l| priced(l) && l.quantity() == Decimal::ONE)
        .or_else(|| lines.iter().rposition(priced))
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rust_decimal_macros::dec;

    #[derive(Debug, Clone)]
    struct Line {
        base: Decimal,
        quantity: Decimal,
        price: Decimal,
    }

    fn line(base: Decimal, quantity: Decimal) -> Line {
        Line {
            base,
            quantity,
            price: base,
        }
    }

    impl PricedLine for Line {
        fn base_price(&self) -> Decimal {
            self.base
        }

        fn quantity(&self) -> Decimal {
            self.quantity
        }

        fn price(&self) -> Decimal {
            self.price
        }

        fn set_price(&mut self, price: Decimal) {
            self.price = price;
        }
    }

    fn subtotal(lines: &[Line]) -> Decimal {
        lines.iter().map(PricedLine::line_total).sum()
    }

    fn prices(lines: &[Line]) -> Vec<Decimal> {
        lines.iter().map(|l| l.price).collect()
    }

    #[test]
    fn round_percentage_needs_no_correction() {
        let mut lines = vec![line(dec!(149), dec!(1)), line(dec!(198), dec!(1))];
        let result = allocate(&mut lines, dec!(10), AdjustmentKind::Discount);

        assert_eq!(prices(&lines), vec![dec!(134.10), dec!(178.20)]);
        assert_eq!(subtotal(&lines), dec!(312.30));
        assert_eq!(result.requested, dec!(34.70));
        assert_eq!(result.shortfall, Decimal::ZERO);
        assert_eq!(result.corrected, None);
    }

    #[test]
    fn odd_percentage_hits_a_round_total() {
        let mut lines = vec![line(dec!(149), dec!(1)), line(dec!(198), dec!(1))];
        allocate(
            &mut lines,
            dec!(2.881844380403458213256484150),
            AdjustmentKind::Discount,
        );

        assert_eq!(prices(&lines), vec![dec!(144.71), dec!(192.29)]);
        assert_eq!(subtotal(&lines), dec!(337));
    }

    #[test]
    fn rounding_difference_goes_to_single_unit_line() {
        let mut lines = vec![line(dec!(10), dec!(10)), line(dec!(0.99), dec!(1))];
        let result = allocate(&mut lines, dec!(0.980295079), AdjustmentKind::Discount);

        assert_eq!(prices(&lines), vec![dec!(9.90), dec!(1.00)]);
        assert_eq!(subtotal(&lines), dec!(100));
        assert_eq!(result.corrected, Some(1));
        assert_eq!(result.shortfall, Decimal::ZERO);
    }

    #[test]
    fn minimum_price_leaves_a_shortfall() {
        let mut lines = vec![line(dec!(10), dec!(10)), line(dec!(0.02), dec!(1))];
        let result = allocate(&mut lines, dec!(0.019996001), AdjustmentKind::Discount);

        assert_eq!(prices(&lines), vec![dec!(10.00), dec!(0.01)]);
        assert_eq!(subtotal(&lines), dec!(100.01));
        assert_eq!(result.requested, dec!(0.02));
        assert_eq!(result.shortfall, dec!(0.01));
    }

    #[test]
    fn zero_priced_package_parent_is_left_alone() {
        let mut lines = vec![line(dec!(0), dec!(1)), line(dec!(2), dec!(5))];
        allocate(&mut lines, dec!(20), AdjustmentKind::Discount);

        assert_eq!(prices(&lines), vec![dec!(0), dec!(1.60)]);
        assert_eq!(subtotal(&lines), dec!(8));
    }

    #[test]
    fn multi_unit_line_is_priced_per_unit() {
        let mut lines = vec![line(dec!(10), dec!(5))];
        allocate(&mut lines, dec!(10), AdjustmentKind::Discount);

        assert_eq!(prices(&lines), vec![dec!(9.00)]);
        assert_eq!(subtotal(&lines), dec!(45));
    }

    #[test]
    fn surcharge_raises_prices() {
        let mut lines = vec![line(dec!(100), dec!(1)), line(dec!(50), dec!(2))];
        let result = allocate(&mut lines, dec!(10), AdjustmentKind::Surcharge);

        assert_eq!(prices(&lines), vec![dec!(110.00), dec!(55.00)]);
        assert_eq!(result.applied, dec!(20));
    }

    #[test]
    fn zero_percentage_restores_base_prices() {
        let mut lines = vec![line(dec!(149), dec!(1)), line(dec!(198), dec!(1))];
        allocate(&mut lines, dec!(10), AdjustmentKind::Discount);
        allocate(&mut lines, Decimal::ZERO, AdjustmentKind::Discount);

        assert_eq!(prices(&lines), vec![dec!(149), dec!(198)]);
    }

    proptest! {
        #![proptest_config(ProptestConfig { cases: 256, ..ProptestConfig::default() })]

        #[test]
        fn single_unit_tail_absorbs_rounding(
            head in proptest::collection::vec((1i64..100_000, 1i64..6), 0..5),
            tail_cents in 100i64..100_000,
            percentage_bp in 0i64..5_000,
        ) {
            let mut lines: Vec<Line> = head
                .into_iter()
                .map(|(cents, qty)| line(Decimal::new(cents, 2), Decimal::from(qty)))
                .collect();
            lines.push(line(Decimal::new(tail_cents, 2), Decimal::ONE));
            let base_subtotal = subtotal(&lines);
            let percentage = Decimal::new(percentage_bp, 2);

            let result = allocate(&mut lines, percentage, AdjustmentKind::Discount);

            prop_assert!(lines.iter().all(|l| l.price >= MIN_UNIT));
            prop_assert_eq!(result.shortfall, Decimal::ZERO);
            prop_assert_eq!(subtotal(&lines), base_subtotal - result.requested);
        }
    }
}
