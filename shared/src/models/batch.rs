//! Batch models and counter bookkeeping

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::ledger::{CounterDelta, CounterField};

/// A produced lot of one product
///
/// The seven balance counters (`deposit` through `discrepancy`) should
/// always sum to `initial_quantity`. `received_quantity` is a
/// cumulative audit total of market receptions and is not part of the
/// balance sum.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Batch {
    pub id: Uuid,
    pub product_id: Uuid,
    pub initial_quantity: i32,
    pub deposit_quantity: i32,
    pub sent_quantity: i32,
    pub market_quantity: i32,
    pub reserved_quantity: i32,
    pub sold_quantity: i32,
    pub discarded_quantity: i32,
    pub discrepancy_quantity: i32,
    pub received_quantity: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Batch {
    pub fn counters(&self) -> BatchCounters {
        BatchCounters {
            deposit: self.deposit_quantity,
            sent: self.sent_quantity,
            market: self.market_quantity,
            reserved: self.reserved_quantity,
            sold: self.sold_quantity,
            discarded: self.discarded_quantity,
            discrepancy: self.discrepancy_quantity,
        }
    }

    /// A batch becomes immutable for edits once any counter other than
    /// deposit has moved.
    pub fn has_movement(&self) -> bool {
        self.counters().has_movement(self.initial_quantity)
    }
}

/// The seven balance counters of a batch
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchCounters {
    pub deposit: i32,
    pub sent: i32,
    pub market: i32,
    pub reserved: i32,
    pub sold: i32,
    pub discarded: i32,
    pub discrepancy: i32,
}

impl BatchCounters {
    /// Counters of a freshly registered batch: everything in deposit
    pub fn new_stored(initial_quantity: i32) -> Self {
        Self {
            deposit: initial_quantity,
            ..Default::default()
        }
    }

    pub fn get(&self, field: CounterField) -> i32 {
        match field {
            CounterField::Deposit => self.deposit,
            CounterField::Sent => self.sent,
            CounterField::Market => self.market,
            CounterField::Reserved => self.reserved,
            CounterField::Sold => self.sold,
            CounterField::Discarded => self.discarded,
            CounterField::Discrepancy => self.discrepancy,
        }
    }

    pub fn apply(&mut self, delta: &CounterDelta) {
        let slot = match delta.field {
            CounterField::Deposit => &mut self.deposit,
            CounterField::Sent => &mut self.sent,
            CounterField::Market => &mut self.market,
            CounterField::Reserved => &mut self.reserved,
            CounterField::Sold => &mut self.sold,
            CounterField::Discarded => &mut self.discarded,
            CounterField::Discrepancy => &mut self.discrepancy,
        };
        *slot += delta.amount;
    }

    pub fn apply_all(&mut self, deltas: &[CounterDelta]) {
        for delta in deltas {
            self.apply(delta);
        }
    }

    /// Sum of the seven balance counters; should equal the batch's
    /// initial quantity at all times.
    pub fn balance_sum(&self) -> i32 {
        self.deposit
            + self.sent
            + self.market
            + self.reserved
            + self.sold
            + self.discarded
            + self.discrepancy
    }

    /// True once any counter other than deposit has moved
    pub fn has_movement(&self, initial_quantity: i32) -> bool {
        self.sent != 0
            || self.market != 0
            || self.reserved != 0
            || self.sold != 0
            || self.discarded != 0
            || self.discrepancy != 0
            || self.deposit != initial_quantity
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_stored_counters() {
        let c = BatchCounters::new_stored(100);
        assert_eq!(c.deposit, 100);
        assert_eq!(c.balance_sum(), 100);
        assert!(!c.has_movement(100));
    }

    #[test]
    fn test_has_movement_after_send() {
        let mut c = BatchCounters::new_stored(100);
        c.deposit -= 40;
        c.sent += 40;
        assert!(c.has_movement(100));
        assert_eq!(c.balance_sum(), 100);
    }

    #[test]
    fn test_get_matches_fields() {
        let c = BatchCounters {
            deposit: 1,
            sent: 2,
            market: 3,
            reserved: 4,
            sold: 5,
            discarded: 6,
            discrepancy: 7,
        };
        assert_eq!(c.get(CounterField::Deposit), 1);
        assert_eq!(c.get(CounterField::Sent), 2);
        assert_eq!(c.get(CounterField::Market), 3);
        assert_eq!(c.get(CounterField::Reserved), 4);
        assert_eq!(c.get(CounterField::Sold), 5);
        assert_eq!(c.get(CounterField::Discarded), 6);
        assert_eq!(c.get(CounterField::Discrepancy), 7);
    }
}
