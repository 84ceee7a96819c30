//! Status enums for orders, payments, coupons, users, and testimonials.
//!
//! All enums round-trip through lowercase strings: that is the wire format
//! in JSON bodies and the storage format in TEXT columns.

use serde::{Deserialize, Serialize};

/// Order fulfillment lifecycle.
///
/// Transitions follow the monotonic sequence
/// `pending → confirmed → processing → shipped → delivered`, with a jump to
/// `cancelled` allowed from any earlier state. Backward transitions are
/// invalid; see [`OrderStatus::can_transition_to`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    #[default]
    Pending,
    Confirmed,
    Processing,
    Shipped,
    Delivered,
    Cancelled,
}

impl OrderStatus {
    /// All defined status values, in lifecycle order.
    pub const ALL: [Self; 6] = [
        Self::Pending,
        Self::Confirmed,
        Self::Processing,
        Self::Shipped,
        Self::Delivered,
        Self::Cancelled,
    ];

    /// Position in the forward lifecycle, or `None` for `Cancelled`.
    #[must_use]
    pub const fn sequence_index(self) -> Option<usize> {
        match self {
            Self::Pending => Some(0),
            Self::Confirmed => Some(1),
            Self::Processing => Some(2),
            Self::Shipped => Some(3),
            Self::Delivered => Some(4),
            Self::Cancelled => None,
        }
    }

    /// Whether the order can move from `self` to `next`.
    ///
    /// Forward moves along the lifecycle are allowed (including skips, e.g.
    /// a same-day order going straight to `shipped`). `Cancelled` is
    /// reachable from any non-terminal state. `Delivered` and `Cancelled`
    /// are terminal.
    #[must_use]
    pub fn can_transition_to(self, next: Self) -> bool {
        if self == next {
            // Re-asserting the current status is harmless.
            return true;
        }
        match (self.sequence_index(), next.sequence_index()) {
            // Forward along the lifecycle only.
            (Some(from), Some(to)) => from < to,
            // Cancelling: allowed unless already delivered.
            (Some(from), None) => from < 4,
            // Nothing leaves cancelled.
            (None, _) => false,
        }
    }

    /// Whether this status is terminal (no further transitions).
    #[must_use]
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Delivered | Self::Cancelled)
    }
}

/// Payment status, tracked independently from the order status.
///
/// Moves from `pending` to `completed` or `failed` exactly once per gateway
/// round trip; `refunded` is an admin-driven follow-up to `completed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    #[default]
    Pending,
    Completed,
    Failed,
    Refunded,
}

impl PaymentStatus {
    /// Whether a gateway result may still be applied.
    #[must_use]
    pub fn is_settled(self) -> bool {
        !matches!(self, Self::Pending)
    }
}

/// Coupon discount type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum DiscountType {
    #[default]
    Percentage,
    Fixed,
}

/// User role with different permission levels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    /// Regular customer.
    #[default]
    User,
    /// Can moderate testimonials and ratings.
    Moderator,
    /// Full access to the admin surface.
    Admin,
}

impl UserRole {
    /// Whether this role grants the admin surface.
    #[must_use]
    pub fn is_admin(self) -> bool {
        matches!(self, Self::Admin)
    }

    /// Whether this role grants moderation rights.
    #[must_use]
    pub fn is_moderator(self) -> bool {
        matches!(self, Self::Admin | Self::Moderator)
    }
}

/// Moderation state of a testimonial.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum TestimonialStatus {
    #[default]
    Pending,
    Approved,
    Rejected,
}

macro_rules! impl_status_strings {
    ($ty:ident { $($variant:ident => $text:literal),+ $(,)? }) => {
        impl std::fmt::Display for $ty {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                match self {
                    $(Self::$variant => write!(f, $text),)+
                }
            }
        }

        impl std::str::FromStr for $ty {
            type Err = String;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($text => Ok(Self::$variant),)+
                    _ => Err(format!(concat!("invalid ", stringify!($ty), ": {}"), s)),
                }
            }
        }
    };
}

impl_status_strings!(OrderStatus {
    Pending => "pending",
    Confirmed => "confirmed",
    Processing => "processing",
    Shipped => "shipped",
    Delivered => "delivered",
    Cancelled => "cancelled",
});

impl_status_strings!(PaymentStatus {
    Pending => "pending",
    Completed => "completed",
    Failed => "failed",
    Refunded => "refunded",
});

impl_status_strings!(DiscountType {
    Percentage => "percentage",
    Fixed => "fixed",
});

impl_status_strings!(UserRole {
    User => "user",
    Moderator => "moderator",
    Admin => "admin",
});

impl_status_strings!(TestimonialStatus {
    Pending => "pending",
    Approved => "approved",
    Rejected => "rejected",
});

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_order_status_roundtrip() {
        for status in OrderStatus::ALL {
            let text = status.to_string();
            assert_eq!(OrderStatus::from_str(&text), Ok(status));
        }
    }

    #[test]
    fn test_order_status_rejects_unknown() {
        assert!(OrderStatus::from_str("bogus").is_err());
        assert!(OrderStatus::from_str("Pending").is_err());
    }

    #[test]
    fn test_forward_transitions_allowed() {
        assert!(OrderStatus::Pending.can_transition_to(OrderStatus::Confirmed));
        assert!(OrderStatus::Confirmed.can_transition_to(OrderStatus::Shipped));
        assert!(OrderStatus::Pending.can_transition_to(OrderStatus::Delivered));
    }

    #[test]
    fn test_backward_transitions_rejected() {
        assert!(!OrderStatus::Shipped.can_transition_to(OrderStatus::Confirmed));
        assert!(!OrderStatus::Delivered.can_transition_to(OrderStatus::Pending));
    }

    #[test]
    fn test_cancel_from_earlier_states_only() {
        assert!(OrderStatus::Pending.can_transition_to(OrderStatus::Cancelled));
        assert!(OrderStatus::Shipped.can_transition_to(OrderStatus::Cancelled));
        assert!(!OrderStatus::Delivered.can_transition_to(OrderStatus::Cancelled));
        assert!(!OrderStatus::Cancelled.can_transition_to(OrderStatus::Pending));
    }

    #[test]
    fn test_terminal_states() {
        assert!(OrderStatus::Delivered.is_terminal());
        assert!(OrderStatus::Cancelled.is_terminal());
        assert!(!OrderStatus::Processing.is_terminal());
    }

    #[test]
    fn test_payment_status_settled() {
        assert!(!PaymentStatus::Pending.is_settled());
        assert!(PaymentStatus::Completed.is_settled());
        assert!(PaymentStatus::Failed.is_settled());
        assert!(PaymentStatus::Refunded.is_settled());
    }

    #[test]
    fn test_role_permissions() {
        assert!(UserRole::Admin.is_admin());
        assert!(UserRole::Admin.is_moderator());
        assert!(UserRole::Moderator.is_moderator());
        assert!(!UserRole::Moderator.is_admin());
        assert!(!UserRole::User.is_moderator());
    }
}
