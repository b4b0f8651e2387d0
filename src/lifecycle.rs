//! Order status values and the transition table between them.
//!
//! `pending -> booked -> paid -> shipped -> delivered`, with `cancelled`
//! reachable from every state except `delivered`, and `restore` taking a
//! cancelled order back to `pending`.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    Pending,
    Booked,
    Paid,
    Shipped,
    Delivered,
    Cancelled,
}

impl OrderStatus {
    pub const ALL: [OrderStatus; 6] = [
        OrderStatus::Pending,
        OrderStatus::Booked,
        OrderStatus::Paid,
        OrderStatus::Shipped,
        OrderStatus::Delivered,
        OrderStatus::Cancelled,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Booked => "booked",
            OrderStatus::Paid => "paid",
            OrderStatus::Shipped => "shipped",
            OrderStatus::Delivered => "delivered",
            OrderStatus::Cancelled => "cancelled",
        }
    }

    /// Resolves the status an order moves to under `transition`, or the
    /// reason the move is not allowed from the current status.
    pub fn apply(self, transition: Transition) -> Result<OrderStatus, &'static str> {
        use OrderStatus::*;

        if self == Cancelled && transition != Transition::Restore {
            return Err("order has already been cancelled");
        }

        match (transition, self) {
            (Transition::Confirm, Pending) => Ok(Booked),
            (Transition::Confirm, _) => Err("order confirmed already"),
            (Transition::MarkPaid, Booked) => Ok(Paid),
            (Transition::MarkPaid, _) => Err("order must be confirmed before payment"),
            (Transition::MarkShipped, Paid) => Ok(Shipped),
            (Transition::MarkShipped, _) => Err("order has not been paid yet"),
            (Transition::MarkDelivered, Shipped) => Ok(Delivered),
            (Transition::MarkDelivered, _) => Err("order has not been shipped yet"),
            (Transition::Cancel, Delivered) => Err("delivered orders cannot be cancelled"),
            (Transition::Cancel, _) => Ok(Cancelled),
            (Transition::Restore, Cancelled) => Ok(Pending),
            (Transition::Restore, _) => Err("order is not cancelled"),
        }
    }

    /// Line items may only change while the order is still a cart.
    pub fn is_editable(&self) -> bool {
        *self == OrderStatus::Pending
    }

    /// Goods have left the warehouse once an order reaches these states.
    pub fn has_dispatched(&self) -> bool {
        matches!(self, OrderStatus::Shipped | OrderStatus::Delivered)
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, thiserror::Error)]
#[error("unknown order status `{0}`")]
pub struct UnknownStatus(pub String);

impl FromStr for OrderStatus {
    type Err = UnknownStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        OrderStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| UnknownStatus(s.to_string()))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Transition {
    Confirm,
    MarkPaid,
    MarkShipped,
    MarkDelivered,
    Cancel,
    Restore,
}

impl Transition {
    pub const ALL: [Transition; 6] = [
        Transition::Confirm,
        Transition::MarkPaid,
        Transition::MarkShipped,
        Transition::MarkDelivered,
        Transition::Cancel,
        Transition::Restore,
    ];

    /// Audit action name recorded for a successful transition.
    pub fn action(&self) -> &'static str {
        match self {
            Transition::Confirm => "order_confirm",
            Transition::MarkPaid => "order_paid",
            Transition::MarkShipped => "order_shipped",
            Transition::MarkDelivered => "order_delivered",
            Transition::Cancel => "order_cancel",
            Transition::Restore => "order_restore",
        }
    }
}
