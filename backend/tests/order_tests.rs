//! Order allocation and state machine tests

use proptest::prelude::*;
use rust_decimal::Decimal;
use uuid::Uuid;

use shared::models::{
    cancellation_allowed, doing_transition_allowed, payment_transition_allowed,
    plan_fifo_allocation, plan_payment, reverse_deltas, AllocationError, AllocationLine,
    BatchCounters, BatchStock, LedgerOp, OrderStatusDoing, OrderStatusPayment, PaymentError,
};

// ============================================================================
// Unit Tests
// ============================================================================

#[cfg(test)]
mod unit_tests {
    use super::*;

    fn stock(available: i32) -> BatchStock {
        BatchStock {
            batch_id: Uuid::new_v4(),
            available,
        }
    }

    /// Two batches, oldest first: 8 requested takes 5 from the first
    /// and 3 from the second
    #[test]
    fn test_fifo_allocates_oldest_first() {
        let b1 = stock(5);
        let b2 = stock(10);
        let plan = plan_fifo_allocation(&[b1, b2], 8).unwrap();

        assert_eq!(
            plan,
            vec![
                AllocationLine {
                    batch_id: b1.batch_id,
                    quantity: 5
                },
                AllocationLine {
                    batch_id: b2.batch_id,
                    quantity: 3
                },
            ]
        );
    }

    /// Requesting more than the total available fails without a plan
    #[test]
    fn test_insufficient_stock_produces_no_plan() {
        let err = plan_fifo_allocation(&[stock(2), stock(3)], 6).unwrap_err();
        assert_eq!(
            err,
            AllocationError::InsufficientStock {
                requested: 6,
                available: 5
            }
        );
    }

    /// A request covered by the first batch leaves later batches alone
    #[test]
    fn test_single_batch_covers_request() {
        let b1 = stock(10);
        let b2 = stock(10);
        let plan = plan_fifo_allocation(&[b1, b2], 10).unwrap();
        assert_eq!(
            plan,
            vec![AllocationLine {
                batch_id: b1.batch_id,
                quantity: 10
            }]
        );
    }

    /// Reserving then cancelling unpaid restores the market counter
    #[test]
    fn test_unpaid_cancellation_round_trip() {
        let mut counters = BatchCounters {
            market: 40,
            ..BatchCounters::new_stored(0)
        };
        counters.apply_all(&LedgerOp::Reserve { quantity: 15 }.deltas());
        assert_eq!(counters.market, 25);
        assert_eq!(counters.reserved, 15);

        counters.apply_all(&LedgerOp::CancelReserved { quantity: 15 }.deltas());
        assert_eq!(counters.market, 40);
        assert_eq!(counters.reserved, 0);
    }

    /// Paying then cancelling restores market from the sold counter
    #[test]
    fn test_paid_cancellation_round_trip() {
        let mut counters = BatchCounters {
            market: 40,
            ..BatchCounters::new_stored(0)
        };
        counters.apply_all(&LedgerOp::Reserve { quantity: 15 }.deltas());
        counters.apply_all(&LedgerOp::ConfirmSale { quantity: 15 }.deltas());
        assert_eq!(counters.sold, 15);

        counters.apply_all(&LedgerOp::CancelSold { quantity: 15 }.deltas());
        assert_eq!(counters.market, 40);
        assert_eq!(counters.sold, 0);
    }

    /// Edits reverse the old allocation before reapplying, so running
    /// the same edit twice converges to the single-run state
    #[test]
    fn test_edit_is_idempotent_on_counters() {
        let mut counters = BatchCounters {
            market: 30,
            ..BatchCounters::new_stored(0)
        };
        // Initial allocation of 10
        let initial = LedgerOp::Reserve { quantity: 10 }.deltas();
        counters.apply_all(&initial);

        let edit = |counters: &mut BatchCounters, previous: &[shared::models::CounterDelta]| {
            counters.apply_all(&reverse_deltas(previous));
            let new = LedgerOp::Reserve { quantity: 7 }.deltas();
            counters.apply_all(&new);
            new
        };

        let first = edit(&mut counters, &initial);
        let after_once = counters;
        edit(&mut counters, &first);

        assert_eq!(counters, after_once);
        assert_eq!(counters.market, 23);
        assert_eq!(counters.reserved, 7);
    }

    /// Payment state machine: PAID and CANCELED are one-way, partial
    /// payments can repeat
    #[test]
    fn test_payment_state_machine() {
        use OrderStatusPayment::*;
        assert!(payment_transition_allowed(Unpaid, Paid));
        assert!(payment_transition_allowed(Unpaid, PartialPaid));
        assert!(payment_transition_allowed(PartialPaid, PartialPaid));
        assert!(payment_transition_allowed(PartialPaid, Paid));
        assert!(payment_transition_allowed(Paid, Canceled));
        assert!(!payment_transition_allowed(Paid, Unpaid));
        assert!(!payment_transition_allowed(Canceled, Unpaid));
        assert!(!payment_transition_allowed(Canceled, Paid));
    }

    /// A partial payment followed by completion settles exactly the
    /// order total, never the total plus the earlier payment
    #[test]
    fn test_partial_then_completion_sums_to_total() {
        let total = Decimal::from(100);

        let (first, status) =
            plan_payment(total, Decimal::ZERO, Some(Decimal::from(60))).unwrap();
        assert_eq!(first, Decimal::from(60));
        assert_eq!(status, OrderStatusPayment::PartialPaid);

        // Completing the order records only the 40 still owed
        let (second, status) = plan_payment(total, first, None).unwrap();
        assert_eq!(second, Decimal::from(40));
        assert_eq!(status, OrderStatusPayment::Paid);
        assert_eq!(first + second, total);
    }

    /// Payments beyond the outstanding balance are rejected
    #[test]
    fn test_payment_cannot_exceed_outstanding_balance() {
        let total = Decimal::from(100);
        assert_eq!(
            plan_payment(total, Decimal::from(60), Some(Decimal::from(50))),
            Err(PaymentError::ExceedsOutstanding {
                amount: Decimal::from(50),
                outstanding: Decimal::from(40),
            })
        );
        assert_eq!(
            plan_payment(total, total, None),
            Err(PaymentError::NonPositiveAmount)
        );
    }

    /// Fulfilment only moves forward, and delivery blocks cancellation
    #[test]
    fn test_fulfilment_state_machine() {
        use OrderStatusDoing::*;
        assert!(doing_transition_allowed(Pending, ReadyToDeliver));
        assert!(doing_transition_allowed(ReadyToDeliver, Delivered));
        assert!(!doing_transition_allowed(Pending, Delivered));
        assert!(!doing_transition_allowed(Delivered, Pending));

        assert!(cancellation_allowed(Pending, OrderStatusPayment::Unpaid));
        assert!(cancellation_allowed(ReadyToDeliver, OrderStatusPayment::Paid));
        assert!(!cancellation_allowed(Delivered, OrderStatusPayment::Paid));
        assert!(!cancellation_allowed(Pending, OrderStatusPayment::Canceled));
    }
}

// ============================================================================
// Property Tests
// ============================================================================

fn arb_stocks() -> impl Strategy<Value = Vec<BatchStock>> {
    prop::collection::vec(0..50i32, 1..10).prop_map(|quantities| {
        quantities
            .into_iter()
            .map(|available| BatchStock {
                batch_id: Uuid::new_v4(),
                available,
            })
            .collect()
    })
}

proptest! {
    /// Property: a successful plan covers exactly the requested amount
    /// and never takes more than a batch has
    #[test]
    fn prop_plan_is_exact_and_bounded(stocks in arb_stocks(), requested in 1..200i32) {
        match plan_fifo_allocation(&stocks, requested) {
            Ok(plan) => {
                let taken: i32 = plan.iter().map(|l| l.quantity).sum();
                prop_assert_eq!(taken, requested);
                for line in &plan {
                    let available = stocks
                        .iter()
                        .find(|s| s.batch_id == line.batch_id)
                        .unwrap()
                        .available;
                    prop_assert!(line.quantity > 0);
                    prop_assert!(line.quantity <= available);
                }
            }
            Err(AllocationError::InsufficientStock { requested: r, available }) => {
                prop_assert_eq!(r, requested);
                let total: i32 = stocks.iter().map(|s| s.available.max(0)).sum();
                prop_assert_eq!(available, total);
                prop_assert!(total < requested);
            }
            Err(AllocationError::InvalidQuantity) => {
                prop_assert!(requested <= 0);
            }
        }
    }

    /// Property: however payments are sliced, the recorded amounts
    /// never sum past the order total, and PAID means exactly the total
    #[test]
    fn prop_payments_never_sum_past_total(
        total in 1..10_000i64,
        payments in prop::collection::vec(1..500i64, 1..10),
    ) {
        let total = Decimal::from(total);
        let mut paid = Decimal::ZERO;

        for payment in payments {
            match plan_payment(total, paid, Some(Decimal::from(payment))) {
                Ok((amount, status)) => {
                    paid += amount;
                    prop_assert!(paid <= total);
                    if status == OrderStatusPayment::Paid {
                        prop_assert_eq!(paid, total);
                    }
                }
                Err(PaymentError::ExceedsOutstanding { amount, outstanding }) => {
                    prop_assert_eq!(amount, Decimal::from(payment));
                    prop_assert_eq!(outstanding, total - paid);
                    prop_assert!(amount > outstanding);
                }
                Err(PaymentError::NonPositiveAmount) => {
                    // Payments are positive, so only a settled order ends here
                    prop_assert_eq!(paid, total);
                }
            }
        }
    }

    /// Property: the plan respects FIFO order — every batch before the
    /// last allocated one is fully drained
    #[test]
    fn prop_plan_drains_in_order(stocks in arb_stocks(), requested in 1..200i32) {
        if let Ok(plan) = plan_fifo_allocation(&stocks, requested) {
            let positions: Vec<usize> = plan
                .iter()
                .map(|l| stocks.iter().position(|s| s.batch_id == l.batch_id).unwrap())
                .collect();
            // Allocation visits batches in list order
            for pair in positions.windows(2) {
                prop_assert!(pair[0] < pair[1]);
            }
            // Every allocated batch except the last is taken in full
            for line in plan.iter().take(plan.len().saturating_sub(1)) {
                let available = stocks
                    .iter()
                    .find(|s| s.batch_id == line.batch_id)
                    .unwrap()
                    .available;
                prop_assert_eq!(line.quantity, available);
            }
        }
    }
}
