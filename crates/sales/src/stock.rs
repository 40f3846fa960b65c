//! Stock reconciliation between a sale item and its linked work-order item.
//!
//! Either side may already have moved stock for the line (a work order can
//! consume material before the sale is confirmed, a sale item can reserve
//! stock before a work order exists). The larger of the two counters is what
//! the ledger has actually seen, so:
//!
//! ```text
//! sell:    decrease Q - max(sale_decreased, work_decreased)   (never below 0)
//! cancel:  restore  max(sale_decreased, work_decreased)
//! ```
//!
//! Afterwards both counters are equal (Q after sell, 0 after cancel).
// NOTE: taking the max assumes both counters describe the same units; two
// independent partial decrements of different units would be under-counted.

use rust_decimal::Decimal;

/// Quantity already reflected in the ledger for the line.
pub fn already_decreased(sale_decreased: Decimal, work_decreased: Option<Decimal>) -> Decimal {
    work_decreased.map_or(sale_decreased, |w| sale_decreased.max(w))
}

/// Units the ledger still has to give up for `quantity` to be sold.
pub fn quantity_to_decrease(
    quantity: Decimal,
    sale_decreased: Decimal,
    work_decreased: Option<Decimal>,
) -> Decimal {
    (quantity - already_decreased(sale_decreased, work_decreased)).max(Decimal::ZERO)
}

/// Units to give back to the ledger when the line is cancelled.
pub fn quantity_to_restore(sale_decreased: Decimal, work_decreased: Option<Decimal>) -> Decimal {
    already_decreased(sale_decreased, work_decreased)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rust_decimal_macros::dec;

    #[test]
    fn sell_table_with_linked_item() {
        // (sale decreased, work decreased, expected decrease) for Q = 10
        let cases = [
            (dec!(0), dec!(0), dec!(10)),
            (dec!(5), dec!(0), dec!(5)),
            (dec!(0), dec!(5), dec!(5)),
            (dec!(5), dec!(5), dec!(5)),
            (dec!(8), dec!(5), dec!(2)),
            (dec!(5), dec!(7), dec!(3)),
            (dec!(10), dec!(10), dec!(0)),
        ];
        for (sd, wd, expected) in cases {
            assert_eq!(
                quantity_to_decrease(dec!(10), sd, Some(wd)),
                expected,
                "sd={sd} wd={wd}"
            );
        }
    }

    #[test]
    fn cancel_table_with_linked_item() {
        let cases = [
            (dec!(0), dec!(0), dec!(0)),
            (dec!(5), dec!(0), dec!(5)),
            (dec!(0), dec!(5), dec!(5)),
            (dec!(5), dec!(5), dec!(5)),
            (dec!(2), dec!(5), dec!(5)),
            (dec!(5), dec!(2), dec!(5)),
            (dec!(10), dec!(10), dec!(10)),
        ];
        for (sd, wd, expected) in cases {
            assert_eq!(quantity_to_restore(sd, Some(wd)), expected, "sd={sd} wd={wd}");
        }
    }

    #[test]
    fn without_linked_item_only_sale_counter_counts() {
        assert_eq!(quantity_to_decrease(dec!(4), dec!(1), None), dec!(3));
        assert_eq!(quantity_to_restore(dec!(3), None), dec!(3));
    }

    #[test]
    fn over_decreased_line_never_decreases_negative() {
        assert_eq!(quantity_to_decrease(dec!(2), dec!(5), Some(dec!(1))), Decimal::ZERO);
    }

    proptest! {
        #![proptest_config(ProptestConfig { cases: 256, ..ProptestConfig::default() })]

        #[test]
        fn sell_then_cancel_restores_exactly_what_was_taken(
            quantity in 0u32..50,
            sd in 0u32..50,
            wd in proptest::option::of(0u32..50),
        ) {
            let q = Decimal::from(quantity.max(sd).max(wd.unwrap_or(0)));
            let sd = Decimal::from(sd);
            let wd = wd.map(Decimal::from);

            let before = already_decreased(sd, wd);
            let taken = quantity_to_decrease(q, sd, wd);
            prop_assert!(taken >= Decimal::ZERO);
            // After sell both counters equal q, so the ledger saw `before + taken == q`.
            prop_assert_eq!(before + taken, q);
            prop_assert_eq!(quantity_to_restore(q, wd.map(|_| q)), q);
        }
    }
}
