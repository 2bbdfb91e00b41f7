//! Shipment lifecycle tests: dispatch, edit reversal, reception, return

use proptest::prelude::*;

use shared::models::{reverse_deltas, BatchCounters, LedgerOp, ShipmentStatus};

// ============================================================================
// Unit Tests
// ============================================================================

#[cfg(test)]
mod unit_tests {
    use super::*;

    /// Dispatch moves deposit stock into transit
    #[test]
    fn test_dispatch_moves_stock_to_sent() {
        let mut counters = BatchCounters::new_stored(100);
        counters.apply_all(&LedgerOp::Send { quantity: 40 }.deltas());

        assert_eq!(counters.deposit, 60);
        assert_eq!(counters.sent, 40);
        assert_eq!(counters.balance_sum(), 100);
    }

    /// Editing a pending shipment reverses the old dispatch before
    /// applying the new one
    #[test]
    fn test_edit_reverses_then_reapplies() {
        let mut counters = BatchCounters::new_stored(100);
        let old = LedgerOp::Send { quantity: 40 }.deltas();
        counters.apply_all(&old);

        // Replace the 40-unit dispatch with a 25-unit one
        counters.apply_all(&reverse_deltas(&old));
        assert_eq!(counters.deposit, 100);
        assert_eq!(counters.sent, 0);

        counters.apply_all(&LedgerOp::Send { quantity: 25 }.deltas());
        assert_eq!(counters.deposit, 75);
        assert_eq!(counters.sent, 25);
        assert_eq!(counters.balance_sum(), 100);
    }

    /// Clean reception: everything sent reaches the market
    #[test]
    fn test_reception_without_discrepancy() {
        let mut counters = BatchCounters::new_stored(100);
        counters.apply_all(&LedgerOp::Send { quantity: 40 }.deltas());
        counters.apply_all(
            &LedgerOp::ReceiveAtMarket {
                quantity: 40,
                discrepancy: 0,
            }
            .deltas(),
        );

        assert_eq!(counters.sent, 0);
        assert_eq!(counters.market, 40);
        assert_eq!(counters.discrepancy, 0);
        assert_eq!(counters.balance_sum(), 100);
    }

    /// Short reception: missing units become discrepancy, transit empties
    #[test]
    fn test_reception_with_shortfall() {
        let mut counters = BatchCounters::new_stored(100);
        counters.apply_all(&LedgerOp::Send { quantity: 40 }.deltas());
        counters.apply_all(
            &LedgerOp::ReceiveAtMarket {
                quantity: 37,
                discrepancy: 3,
            }
            .deltas(),
        );

        assert_eq!(counters.sent, 0);
        assert_eq!(counters.market, 37);
        assert_eq!(counters.discrepancy, 3);
        assert_eq!(counters.balance_sum(), 100);
    }

    /// A return accounts for the batch's whole market stock
    #[test]
    fn test_return_empties_market() {
        let mut counters = BatchCounters::new_stored(100);
        counters.apply_all(&LedgerOp::Send { quantity: 40 }.deltas());
        counters.apply_all(
            &LedgerOp::ReceiveAtMarket {
                quantity: 40,
                discrepancy: 0,
            }
            .deltas(),
        );
        counters.apply_all(
            &LedgerOp::ReturnToDeposit {
                quantity: 38,
                discrepancy: 2,
            }
            .deltas(),
        );

        assert_eq!(counters.market, 0);
        assert_eq!(counters.deposit, 98);
        assert_eq!(counters.discrepancy, 2);
        assert_eq!(counters.balance_sum(), 100);
    }

    /// Shipment status wire values and openness
    #[test]
    fn test_shipment_status_values() {
        assert_eq!(ShipmentStatus::Pending.as_str(), "PENDING");
        assert_eq!(ShipmentStatus::ReceivedOk.as_str(), "RECEIVED_OK");
        assert_eq!(ShipmentStatus::ReceivedNoOk.as_str(), "RECEIVED_NO_OK");
        assert_eq!(ShipmentStatus::Returned.as_str(), "RETURNED");

        assert!(ShipmentStatus::Pending.is_open());
        assert!(!ShipmentStatus::ReceivedOk.is_open());
        assert!(!ShipmentStatus::ReceivedNoOk.is_open());
        assert!(!ShipmentStatus::Returned.is_open());
    }
}

// ============================================================================
// Property Tests
// ============================================================================

proptest! {
    /// Property: a dispatch followed by a full-accounting reception
    /// empties transit and keeps the balance sum
    #[test]
    fn prop_dispatch_then_receive_accounts_for_everything(
        initial in 1..10_000i32,
        sent in 1..1_000i32,
        received_fraction in 0..=100i32,
    ) {
        prop_assume!(sent <= initial);
        let received = sent * received_fraction / 100;
        let discrepancy = sent - received;

        let mut counters = BatchCounters::new_stored(initial);
        counters.apply_all(&LedgerOp::Send { quantity: sent }.deltas());
        counters.apply_all(
            &LedgerOp::ReceiveAtMarket { quantity: received, discrepancy }.deltas(),
        );

        prop_assert_eq!(counters.sent, 0);
        prop_assert_eq!(counters.market, received);
        prop_assert_eq!(counters.discrepancy, discrepancy);
        prop_assert_eq!(counters.balance_sum(), initial);
    }

    /// Property: edit replacement lands on the same counters as if the
    /// final dispatch had been created directly
    #[test]
    fn prop_edit_equals_direct_dispatch(
        initial in 1..10_000i32,
        first in 1..1_000i32,
        second in 1..1_000i32,
    ) {
        prop_assume!(first <= initial && second <= initial);

        let mut edited = BatchCounters::new_stored(initial);
        let old = LedgerOp::Send { quantity: first }.deltas();
        edited.apply_all(&old);
        edited.apply_all(&reverse_deltas(&old));
        edited.apply_all(&LedgerOp::Send { quantity: second }.deltas());

        let mut direct = BatchCounters::new_stored(initial);
        direct.apply_all(&LedgerOp::Send { quantity: second }.deltas());

        prop_assert_eq!(edited, direct);
    }
}
