//! Order, sale, and order state machine models

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// A customer order
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
    pub id: Uuid,
    pub customer_id: Uuid,
    pub status_doing: OrderStatusDoing,
    pub status_payment: OrderStatusPayment,
    pub cancel_reason: Option<CancelReason>,
    /// Σ(quantity × unit price) over the line items
    pub total: Decimal,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A line item of an order
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderDetail {
    pub id: Uuid,
    pub order_id: Uuid,
    pub product_id: Uuid,
    pub quantity: i32,
    pub unit_price: Decimal,
    pub subtotal: Decimal,
}

/// Payment record of a confirmed order
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Sale {
    pub id: Uuid,
    pub order_id: Uuid,
    pub payment_method: PaymentMethod,
    pub amount: Decimal,
    pub receipt_image_url: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Fulfilment status of an order
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatusDoing {
    Pending,
    ReadyToDeliver,
    Delivered,
}

impl OrderStatusDoing {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatusDoing::Pending => "PENDING",
            OrderStatusDoing::ReadyToDeliver => "READY_TO_DELIVER",
            OrderStatusDoing::Delivered => "DELIVERED",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "PENDING" => Some(OrderStatusDoing::Pending),
            "READY_TO_DELIVER" => Some(OrderStatusDoing::ReadyToDeliver),
            "DELIVERED" => Some(OrderStatusDoing::Delivered),
            _ => None,
        }
    }
}

/// Payment status of an order
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatusPayment {
    Unpaid,
    PartialPaid,
    Paid,
    Canceled,
}

impl OrderStatusPayment {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatusPayment::Unpaid => "UNPAID",
            OrderStatusPayment::PartialPaid => "PARTIAL_PAID",
            OrderStatusPayment::Paid => "PAID",
            OrderStatusPayment::Canceled => "CANCELED",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "UNPAID" => Some(OrderStatusPayment::Unpaid),
            "PARTIAL_PAID" => Some(OrderStatusPayment::PartialPaid),
            "PAID" => Some(OrderStatusPayment::Paid),
            "CANCELED" => Some(OrderStatusPayment::Canceled),
            _ => None,
        }
    }

    /// Whether cancellation must restore stock from the sold counter
    /// (payment already happened) or the reserved counter.
    pub fn cancellation_restores_sold(&self) -> bool {
        matches!(
            self,
            OrderStatusPayment::Paid | OrderStatusPayment::PartialPaid
        )
    }
}

/// Reason an order was canceled
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CancelReason {
    CustomerRequest,
    OutOfStock,
    Other,
}

impl CancelReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            CancelReason::CustomerRequest => "CUSTOMER_REQUEST",
            CancelReason::OutOfStock => "OUT_OF_STOCK",
            CancelReason::Other => "OTHER",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "CUSTOMER_REQUEST" => Some(CancelReason::CustomerRequest),
            "OUT_OF_STOCK" => Some(CancelReason::OutOfStock),
            "OTHER" => Some(CancelReason::Other),
            _ => None,
        }
    }
}

/// How a sale was paid
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentMethod {
    Cash,
    Transfer,
    Card,
    Other,
}

impl PaymentMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentMethod::Cash => "CASH",
            PaymentMethod::Transfer => "TRANSFER",
            PaymentMethod::Card => "CARD",
            PaymentMethod::Other => "OTHER",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "CASH" => Some(PaymentMethod::Cash),
            "TRANSFER" => Some(PaymentMethod::Transfer),
            "CARD" => Some(PaymentMethod::Card),
            "OTHER" => Some(PaymentMethod::Other),
            _ => None,
        }
    }
}

/// Valid payment status transitions
///
/// UNPAID → PARTIAL_PAID | PAID | CANCELED,
/// PARTIAL_PAID → PARTIAL_PAID | PAID | CANCELED (further payments),
/// PAID → CANCELED. CANCELED is terminal.
pub fn payment_transition_allowed(from: OrderStatusPayment, to: OrderStatusPayment) -> bool {
    use OrderStatusPayment::*;
    matches!(
        (from, to),
        (Unpaid, PartialPaid)
            | (Unpaid, Paid)
            | (Unpaid, Canceled)
            | (PartialPaid, PartialPaid)
            | (PartialPaid, Paid)
            | (PartialPaid, Canceled)
            | (Paid, Canceled)
    )
}

/// Why a payment cannot be applied to an order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum PaymentError {
    #[error("payment amount must be positive")]
    NonPositiveAmount,
    #[error("payment of {amount} exceeds the outstanding balance of {outstanding}")]
    ExceedsOutstanding {
        amount: Decimal,
        outstanding: Decimal,
    },
}

/// Settle a payment against an order's outstanding balance
///
/// `amount` of `None` pays off the whole balance. Returns the amount to
/// record for this payment and the resulting status: PAID once the
/// balance reaches zero, PARTIAL_PAID while something remains owed.
/// Recorded payments can therefore never sum past the order total.
pub fn plan_payment(
    total: Decimal,
    paid_before: Decimal,
    amount: Option<Decimal>,
) -> Result<(Decimal, OrderStatusPayment), PaymentError> {
    let outstanding = total - paid_before;
    let amount = amount.unwrap_or(outstanding);

    if amount <= Decimal::ZERO {
        return Err(PaymentError::NonPositiveAmount);
    }
    if amount > outstanding {
        return Err(PaymentError::ExceedsOutstanding {
            amount,
            outstanding,
        });
    }

    let status = if amount == outstanding {
        OrderStatusPayment::Paid
    } else {
        OrderStatusPayment::PartialPaid
    };
    Ok((amount, status))
}

/// Valid fulfilment status transitions: PENDING → READY_TO_DELIVER → DELIVERED
pub fn doing_transition_allowed(from: OrderStatusDoing, to: OrderStatusDoing) -> bool {
    use OrderStatusDoing::*;
    matches!(
        (from, to),
        (Pending, ReadyToDeliver) | (ReadyToDeliver, Delivered)
    )
}

/// Cancellation is blocked once the order has been delivered or is
/// already canceled.
pub fn cancellation_allowed(doing: OrderStatusDoing, payment: OrderStatusPayment) -> bool {
    doing != OrderStatusDoing::Delivered && payment != OrderStatusPayment::Canceled
}

#[cfg(test)]
mod tests {
    use super::*;
    use OrderStatusDoing::*;
    use OrderStatusPayment::*;

    #[test]
    fn test_payment_transitions() {
        assert!(payment_transition_allowed(Unpaid, Paid));
        assert!(payment_transition_allowed(Unpaid, PartialPaid));
        assert!(payment_transition_allowed(Unpaid, Canceled));
        assert!(payment_transition_allowed(PartialPaid, PartialPaid));
        assert!(payment_transition_allowed(PartialPaid, Paid));
        assert!(payment_transition_allowed(Paid, Canceled));
    }

    #[test]
    fn test_no_transition_out_of_canceled() {
        for to in [Unpaid, PartialPaid, Paid, Canceled] {
            assert!(!payment_transition_allowed(Canceled, to));
        }
    }

    #[test]
    fn test_no_transition_back_from_paid() {
        assert!(!payment_transition_allowed(Paid, Unpaid));
        assert!(!payment_transition_allowed(Paid, PartialPaid));
        assert!(!payment_transition_allowed(Paid, Paid));
    }

    #[test]
    fn test_doing_transitions() {
        assert!(doing_transition_allowed(Pending, ReadyToDeliver));
        assert!(doing_transition_allowed(ReadyToDeliver, Delivered));
        assert!(!doing_transition_allowed(Pending, Delivered));
        assert!(!doing_transition_allowed(Delivered, ReadyToDeliver));
    }

    #[test]
    fn test_cancellation_rules() {
        assert!(cancellation_allowed(Pending, Unpaid));
        assert!(cancellation_allowed(ReadyToDeliver, Paid));
        assert!(!cancellation_allowed(Delivered, Paid));
        assert!(!cancellation_allowed(Pending, Canceled));
    }

    #[test]
    fn test_cancellation_restore_path() {
        assert!(Paid.cancellation_restores_sold());
        assert!(PartialPaid.cancellation_restores_sold());
        assert!(!Unpaid.cancellation_restores_sold());
    }

    #[test]
    fn test_plan_payment_full_amount_pays_off() {
        let total = Decimal::from(100);
        assert_eq!(
            plan_payment(total, Decimal::ZERO, Some(total)),
            Ok((total, Paid))
        );
        assert_eq!(plan_payment(total, Decimal::ZERO, None), Ok((total, Paid)));
    }

    #[test]
    fn test_plan_payment_partial_leaves_balance() {
        let total = Decimal::from(100);
        assert_eq!(
            plan_payment(total, Decimal::ZERO, Some(Decimal::from(60))),
            Ok((Decimal::from(60), PartialPaid))
        );
        // Settling the remainder completes the payment
        assert_eq!(
            plan_payment(total, Decimal::from(60), None),
            Ok((Decimal::from(40), Paid))
        );
    }

    #[test]
    fn test_plan_payment_rejects_overpayment() {
        let total = Decimal::from(100);
        assert_eq!(
            plan_payment(total, Decimal::from(60), Some(Decimal::from(50))),
            Err(PaymentError::ExceedsOutstanding {
                amount: Decimal::from(50),
                outstanding: Decimal::from(40),
            })
        );
        assert_eq!(
            plan_payment(total, Decimal::ZERO, Some(Decimal::ZERO)),
            Err(PaymentError::NonPositiveAmount)
        );
        // A fully paid order has nothing outstanding
        assert_eq!(
            plan_payment(total, total, None),
            Err(PaymentError::NonPositiveAmount)
        );
    }
}
