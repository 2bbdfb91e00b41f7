//! Inventory ledger core
//!
//! Every counter-mutating operation is expressed as a [`LedgerOp`]
//! producing a set of [`CounterDelta`]s, so the per-movement-type
//! bookkeeping rules live in one dispatch function instead of being
//! duplicated inline per action. All ops except [`LedgerOp::Store`]
//! are pure transfers between counters, which keeps the balance-sum
//! invariant intact by construction.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use super::movement::MovementType;

/// The balance counters a delta can target
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum CounterField {
    Deposit,
    Sent,
    Market,
    Reserved,
    Sold,
    Discarded,
    Discrepancy,
}

impl CounterField {
    pub const ALL: [CounterField; 7] = [
        CounterField::Deposit,
        CounterField::Sent,
        CounterField::Market,
        CounterField::Reserved,
        CounterField::Sold,
        CounterField::Discarded,
        CounterField::Discrepancy,
    ];

    /// Column name of this counter on the `batches` table
    pub fn column(&self) -> &'static str {
        match self {
            CounterField::Deposit => "deposit_quantity",
            CounterField::Sent => "sent_quantity",
            CounterField::Market => "market_quantity",
            CounterField::Reserved => "reserved_quantity",
            CounterField::Sold => "sold_quantity",
            CounterField::Discarded => "discarded_quantity",
            CounterField::Discrepancy => "discrepancy_quantity",
        }
    }
}

/// A signed adjustment to one counter of one batch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CounterDelta {
    pub field: CounterField,
    pub amount: i32,
}

impl CounterDelta {
    pub fn new(field: CounterField, amount: i32) -> Self {
        Self { field, amount }
    }
}

/// A balanced transfer of `quantity` units from one counter to another
pub fn transfer(from: CounterField, to: CounterField, quantity: i32) -> [CounterDelta; 2] {
    [
        CounterDelta::new(from, -quantity),
        CounterDelta::new(to, quantity),
    ]
}

/// The exact inverse of a delta set, used by edit actions to undo a
/// prior movement before reapplying a new one.
pub fn reverse_deltas(deltas: &[CounterDelta]) -> Vec<CounterDelta> {
    deltas
        .iter()
        .map(|d| CounterDelta::new(d.field, -d.amount))
        .collect()
}

/// One counter-mutating ledger operation
///
/// Operations that only mirror movement details for the audit trail
/// (ready-to-deliver, delivered) have no ledger op; they produce no
/// counter changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LedgerOp {
    /// Production registration: a new batch enters the deposit
    Store { quantity: i32 },
    /// Deposit → market shipment dispatch
    Send { quantity: i32 },
    /// Market confirms reception of a shipment; any missing units are
    /// booked as discrepancy
    ReceiveAtMarket { quantity: i32, discrepancy: i32 },
    /// Market stock returned to the deposit; the market counter is
    /// emptied into deposit plus discrepancy
    ReturnToDeposit { quantity: i32, discrepancy: i32 },
    /// Order placement reserves market stock
    Reserve { quantity: i32 },
    /// Payment confirmation turns a reservation into a sale
    ConfirmSale { quantity: i32 },
    /// Cancellation of an unpaid order releases the reservation
    CancelReserved { quantity: i32 },
    /// Cancellation of a paid order returns sold stock to market
    CancelSold { quantity: i32 },
    /// Deposit stock discarded
    Discard { quantity: i32 },
}

impl LedgerOp {
    /// The movement type logged for this operation
    pub fn movement_type(&self) -> MovementType {
        match self {
            LedgerOp::Store { .. } => MovementType::Stored,
            LedgerOp::Send { .. } => MovementType::Sent,
            LedgerOp::ReceiveAtMarket { .. } => MovementType::ReceivedMarket,
            LedgerOp::ReturnToDeposit { .. } => MovementType::Returned,
            LedgerOp::Reserve { .. } => MovementType::Ordered,
            LedgerOp::ConfirmSale { .. } => MovementType::Sold,
            LedgerOp::CancelReserved { .. } | LedgerOp::CancelSold { .. } => MovementType::Canceled,
            LedgerOp::Discard { .. } => MovementType::Discarded,
        }
    }

    /// The counter deltas this operation applies to its batch
    pub fn deltas(&self) -> Vec<CounterDelta> {
        use CounterField::*;
        match *self {
            // The only op that changes the balance sum: it brings the
            // initial quantity into existence.
            LedgerOp::Store { quantity } => vec![CounterDelta::new(Deposit, quantity)],
            LedgerOp::Send { quantity } => transfer(Deposit, Sent, quantity).to_vec(),
            LedgerOp::ReceiveAtMarket {
                quantity,
                discrepancy,
            } => {
                let mut deltas = transfer(Sent, Market, quantity).to_vec();
                if discrepancy != 0 {
                    deltas.extend(transfer(Sent, Discrepancy, discrepancy));
                }
                deltas
            }
            LedgerOp::ReturnToDeposit {
                quantity,
                discrepancy,
            } => {
                let mut deltas = transfer(Market, Deposit, quantity).to_vec();
                if discrepancy != 0 {
                    deltas.extend(transfer(Market, Discrepancy, discrepancy));
                }
                deltas
            }
            LedgerOp::Reserve { quantity } => transfer(Market, Reserved, quantity).to_vec(),
            LedgerOp::ConfirmSale { quantity } => transfer(Reserved, Sold, quantity).to_vec(),
            LedgerOp::CancelReserved { quantity } => transfer(Reserved, Market, quantity).to_vec(),
            LedgerOp::CancelSold { quantity } => transfer(Sold, Market, quantity).to_vec(),
            LedgerOp::Discard { quantity } => transfer(Deposit, Discarded, quantity).to_vec(),
        }
    }

    /// Net change to the balance sum: zero for every transfer,
    /// `quantity` for `Store`.
    pub fn balance_change(&self) -> i32 {
        self.deltas().iter().map(|d| d.amount).sum()
    }
}

/// Available market stock of one candidate batch, ordered oldest first
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchStock {
    pub batch_id: Uuid,
    pub available: i32,
}

/// One line of a FIFO allocation plan
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AllocationLine {
    pub batch_id: Uuid,
    pub quantity: i32,
}

/// Errors from FIFO allocation planning
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum AllocationError {
    #[error("requested quantity must be positive")]
    InvalidQuantity,

    #[error("insufficient stock: requested {requested}, available {available}")]
    InsufficientStock { requested: i32, available: i32 },
}

/// Plan a FIFO allocation of `requested` units across candidate
/// batches.
///
/// `stocks` must already be ordered oldest first. The plan takes
/// `min(available, remaining)` from each batch in order. Fails without
/// a partial result if the candidates cannot cover the request.
pub fn plan_fifo_allocation(
    stocks: &[BatchStock],
    requested: i32,
) -> Result<Vec<AllocationLine>, AllocationError> {
    if requested <= 0 {
        return Err(AllocationError::InvalidQuantity);
    }

    let available: i32 = stocks.iter().map(|s| s.available.max(0)).sum();
    if available < requested {
        return Err(AllocationError::InsufficientStock {
            requested,
            available,
        });
    }

    let mut lines = Vec::new();
    let mut remaining = requested;
    for stock in stocks {
        if remaining == 0 {
            break;
        }
        if stock.available <= 0 {
            continue;
        }
        let take = stock.available.min(remaining);
        lines.push(AllocationLine {
            batch_id: stock.batch_id,
            quantity: take,
        });
        remaining -= take;
    }

    Ok(lines)
}
