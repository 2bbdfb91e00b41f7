//! Ledger core tests
//!
//! Exercises the counter bookkeeping end to end: production, shipment,
//! reception, reservation, sale, cancellation, and discard, plus the
//! balance-sum property under arbitrary operation sequences.

use proptest::prelude::*;

use shared::models::{
    reverse_deltas, BatchCounters, CounterField, LedgerOp, MovementType,
};

// ============================================================================
// Unit Tests
// ============================================================================

#[cfg(test)]
mod unit_tests {
    use super::*;

    /// A fresh batch holds everything in deposit
    #[test]
    fn test_production_puts_all_stock_in_deposit() {
        let counters = BatchCounters::new_stored(100);
        assert_eq!(counters.deposit, 100);
        assert_eq!(counters.sent, 0);
        assert_eq!(counters.market, 0);
        assert_eq!(counters.reserved, 0);
        assert_eq!(counters.sold, 0);
        assert_eq!(counters.discarded, 0);
        assert_eq!(counters.discrepancy, 0);
        assert_eq!(counters.balance_sum(), 100);
    }

    /// Full lifecycle: store 100, ship 40, receive 40, reserve 25, sell 25
    #[test]
    fn test_end_to_end_scenario() {
        let mut counters = BatchCounters::new_stored(100);

        counters.apply_all(&LedgerOp::Send { quantity: 40 }.deltas());
        assert_eq!(counters.deposit, 60);
        assert_eq!(counters.sent, 40);

        counters.apply_all(
            &LedgerOp::ReceiveAtMarket {
                quantity: 40,
                discrepancy: 0,
            }
            .deltas(),
        );
        assert_eq!(counters.sent, 0);
        assert_eq!(counters.market, 40);
        assert_eq!(counters.deposit, 60);

        counters.apply_all(&LedgerOp::Reserve { quantity: 25 }.deltas());
        assert_eq!(counters.market, 15);
        assert_eq!(counters.reserved, 25);

        counters.apply_all(&LedgerOp::ConfirmSale { quantity: 25 }.deltas());
        assert_eq!(counters.reserved, 0);
        assert_eq!(counters.sold, 25);

        assert_eq!(counters.deposit, 60);
        assert_eq!(counters.sent, 0);
        assert_eq!(counters.market, 15);
        assert_eq!(counters.discarded, 0);
        assert_eq!(counters.balance_sum(), 100);
    }

    /// Shipping moves deposit to sent and leaves the sum unchanged
    #[test]
    fn test_shipment_preserves_sum() {
        let mut counters = BatchCounters::new_stored(80);
        let before = counters.balance_sum();

        counters.apply_all(&LedgerOp::Send { quantity: 30 }.deltas());
        assert_eq!(counters.deposit, 50);
        assert_eq!(counters.sent, 30);
        assert_eq!(counters.balance_sum(), before);
    }

    /// Reception with a shortfall books the missing units as discrepancy
    #[test]
    fn test_reception_with_discrepancy() {
        let mut counters = BatchCounters::new_stored(50);
        counters.apply_all(&LedgerOp::Send { quantity: 20 }.deltas());
        counters.apply_all(
            &LedgerOp::ReceiveAtMarket {
                quantity: 18,
                discrepancy: 2,
            }
            .deltas(),
        );

        assert_eq!(counters.sent, 0);
        assert_eq!(counters.market, 18);
        assert_eq!(counters.discrepancy, 2);
        assert_eq!(counters.balance_sum(), 50);
    }

    /// A return empties the market back into deposit plus discrepancy
    #[test]
    fn test_return_to_deposit() {
        let mut counters = BatchCounters::new_stored(50);
        counters.apply_all(&LedgerOp::Send { quantity: 20 }.deltas());
        counters.apply_all(
            &LedgerOp::ReceiveAtMarket {
                quantity: 20,
                discrepancy: 0,
            }
            .deltas(),
        );
        counters.apply_all(
            &LedgerOp::ReturnToDeposit {
                quantity: 19,
                discrepancy: 1,
            }
            .deltas(),
        );

        assert_eq!(counters.market, 0);
        assert_eq!(counters.deposit, 49);
        assert_eq!(counters.discrepancy, 1);
        assert_eq!(counters.balance_sum(), 50);
    }

    /// Discarding moves deposit stock to the discarded counter
    #[test]
    fn test_discard() {
        let mut counters = BatchCounters::new_stored(30);
        counters.apply_all(&LedgerOp::Discard { quantity: 5 }.deltas());

        assert_eq!(counters.deposit, 25);
        assert_eq!(counters.discarded, 5);
        assert_eq!(counters.balance_sum(), 30);
    }

    /// Cancelling an unpaid order releases the reservation to market
    #[test]
    fn test_cancel_unpaid_restores_from_reserved() {
        let mut counters = BatchCounters::new_stored(50);
        counters.apply_all(&LedgerOp::Send { quantity: 50 }.deltas());
        counters.apply_all(
            &LedgerOp::ReceiveAtMarket {
                quantity: 50,
                discrepancy: 0,
            }
            .deltas(),
        );
        counters.apply_all(&LedgerOp::Reserve { quantity: 10 }.deltas());

        counters.apply_all(&LedgerOp::CancelReserved { quantity: 10 }.deltas());
        assert_eq!(counters.reserved, 0);
        assert_eq!(counters.market, 50);
        assert_eq!(counters.balance_sum(), 50);
    }

    /// Cancelling a paid order restores from the sold counter
    #[test]
    fn test_cancel_paid_restores_from_sold() {
        let mut counters = BatchCounters::new_stored(50);
        counters.apply_all(&LedgerOp::Send { quantity: 50 }.deltas());
        counters.apply_all(
            &LedgerOp::ReceiveAtMarket {
                quantity: 50,
                discrepancy: 0,
            }
            .deltas(),
        );
        counters.apply_all(&LedgerOp::Reserve { quantity: 10 }.deltas());
        counters.apply_all(&LedgerOp::ConfirmSale { quantity: 10 }.deltas());

        counters.apply_all(&LedgerOp::CancelSold { quantity: 10 }.deltas());
        assert_eq!(counters.sold, 0);
        assert_eq!(counters.market, 50);
        assert_eq!(counters.balance_sum(), 50);
    }

    /// The movement wire values are fixed; stored data depends on them
    #[test]
    fn test_movement_wire_values() {
        let expected = [
            (MovementType::Stored, "STORED"),
            (MovementType::Sent, "SENT"),
            (MovementType::ReceivedMarket, "RECEIVED_MARKET"),
            (MovementType::Returned, "RETURNED"),
            (MovementType::Discarded, "DISCARDED"),
            (MovementType::Ordered, "ORDERED"),
            (MovementType::ReadyToDeliver, "READY_TO_DELIVER"),
            (MovementType::Sold, "SOLD"),
            (MovementType::Delivered, "DELIVERED"),
            (MovementType::Canceled, "CANCELED"),
            (MovementType::Edited, "EDITED"),
        ];
        for (ty, wire) in expected {
            assert_eq!(ty.as_str(), wire);
            assert_eq!(MovementType::from_str(wire), Some(ty));
        }
    }

    /// Counter column names drive the persisted UPDATE statements
    #[test]
    fn test_counter_columns_are_distinct() {
        let mut columns: Vec<&str> = CounterField::ALL.iter().map(|f| f.column()).collect();
        columns.sort();
        columns.dedup();
        assert_eq!(columns.len(), CounterField::ALL.len());
    }
}

// ============================================================================
// Property Tests
// ============================================================================

fn arb_transfer_op() -> impl Strategy<Value = LedgerOp> {
    let q = 1..50i32;
    let d = 0..10i32;
    prop_oneof![
        q.clone().prop_map(|quantity| LedgerOp::Send { quantity }),
        (q.clone(), d.clone()).prop_map(|(quantity, discrepancy)| LedgerOp::ReceiveAtMarket {
            quantity,
            discrepancy
        }),
        (q.clone(), d).prop_map(|(quantity, discrepancy)| LedgerOp::ReturnToDeposit {
            quantity,
            discrepancy
        }),
        q.clone().prop_map(|quantity| LedgerOp::Reserve { quantity }),
        q.clone().prop_map(|quantity| LedgerOp::ConfirmSale { quantity }),
        q.clone().prop_map(|quantity| LedgerOp::CancelReserved { quantity }),
        q.clone().prop_map(|quantity| LedgerOp::CancelSold { quantity }),
        q.prop_map(|quantity| LedgerOp::Discard { quantity }),
    ]
}

proptest! {
    /// Property: no transfer op changes the balance sum, regardless of
    /// order or count
    #[test]
    fn prop_transfer_sequences_preserve_balance(
        initial in 1..10_000i32,
        ops in prop::collection::vec(arb_transfer_op(), 0..40),
    ) {
        let mut counters = BatchCounters::new_stored(initial);
        for op in &ops {
            counters.apply_all(&op.deltas());
        }
        prop_assert_eq!(counters.balance_sum(), initial);
    }

    /// Property: applying deltas then their reverse is a no-op
    #[test]
    fn prop_reverse_restores_counters(
        initial in 1..10_000i32,
        op in arb_transfer_op(),
    ) {
        let mut counters = BatchCounters::new_stored(initial);
        let before = counters;
        let deltas = op.deltas();
        counters.apply_all(&deltas);
        counters.apply_all(&reverse_deltas(&deltas));
        prop_assert_eq!(counters, before);
    }

    /// Property: every transfer op's deltas sum to zero
    #[test]
    fn prop_transfer_deltas_sum_to_zero(op in arb_transfer_op()) {
        prop_assert_eq!(op.balance_change(), 0);
    }

    /// Property: store's balance change is exactly the stored quantity
    #[test]
    fn prop_store_balance_change(quantity in 1..10_000i32) {
        prop_assert_eq!(LedgerOp::Store { quantity }.balance_change(), quantity);
    }
}
