//! Monetary totals for an order.
//!
//! Totals are always recomputed server-side from the line items. Amounts
//! submitted by a client are only accepted when they agree with the
//! recomputation within a one-cent rounding tolerance.

use serde::{Deserialize, Serialize};

use super::{Money, OrderError, OrderItem};

/// Divergence allowed between a claimed and a recomputed amount, in cents.
const TOLERANCE_CENTS: i64 = 1;

/// Monetary amounts submitted by the client alongside the line items.
///
/// `discount_amount` and `shipping_amount` default to zero when omitted;
/// the other three are required and checked against the server-side
/// recomputation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClaimedTotals {
    pub total_amount: Money,
    pub discount_amount: Money,
    pub gross_amount: Money,
    pub shipping_amount: Money,
    pub net_amount: Money,
}

/// The five monetary amounts carried by every order.
///
/// Invariants: all amounts are non-negative,
/// `gross_amount = total_amount - discount_amount` and
/// `net_amount = gross_amount + shipping_amount`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderTotals {
    /// Sum of quantity times unit price across all items.
    pub total_amount: Money,

    /// Discount subtracted from the total.
    pub discount_amount: Money,

    /// Total after discount, before shipping.
    pub gross_amount: Money,

    /// Shipping cost added on top of the gross amount.
    pub shipping_amount: Money,

    /// Final amount the customer pays.
    pub net_amount: Money,
}

impl OrderTotals {
    /// Computes order totals from line items, a discount, and a shipping
    /// amount.
    ///
    /// Fails when the item list is empty, any item has a zero quantity or
    /// non-positive unit price, either adjustment is negative, or the
    /// discount exceeds the item total (which would drive the gross amount
    /// negative).
    pub fn compute(
        items: &[OrderItem],
        discount: Money,
        shipping: Money,
    ) -> Result<Self, OrderError> {
        if items.is_empty() {
            return Err(OrderError::NoItems);
        }

        for item in items {
            if item.quantity == 0 {
                return Err(OrderError::InvalidQuantity {
                    quantity: item.quantity,
                });
            }
            if !item.unit_price.is_positive() {
                return Err(OrderError::InvalidPrice {
                    price: item.unit_price.cents(),
                });
            }
        }

        if discount.is_negative() {
            return Err(OrderError::NegativeAmount {
                field: "discount_amount",
                amount: discount,
            });
        }
        if shipping.is_negative() {
            return Err(OrderError::NegativeAmount {
                field: "shipping_amount",
                amount: shipping,
            });
        }

        let total = items
            .iter()
            .fold(Money::zero(), |acc, item| acc + item.total_price());

        if discount > total {
            return Err(OrderError::DiscountExceedsTotal { discount, total });
        }

        let gross = total - discount;
        let net = gross + shipping;

        Ok(Self {
            total_amount: total,
            discount_amount: discount,
            gross_amount: gross,
            shipping_amount: shipping,
            net_amount: net,
        })
    }

    /// Recomputes totals from the items and verifies the client-submitted
    /// amounts against them.
    ///
    /// The claimed discount and shipping are taken as inputs to the
    /// computation; the claimed total, gross, and net amounts must then
    /// match the recomputed values within one cent each. Returns the
    /// recomputed (authoritative) totals.
    pub fn from_claimed(items: &[OrderItem], claimed: &ClaimedTotals) -> Result<Self, OrderError> {
        let computed = Self::compute(items, claimed.discount_amount, claimed.shipping_amount)?;

        let checks = [
            ("total_amount", claimed.total_amount, computed.total_amount),
            ("gross_amount", claimed.gross_amount, computed.gross_amount),
            ("net_amount", claimed.net_amount, computed.net_amount),
        ];
        for (field, claimed_amount, computed_amount) in checks {
            if claimed_amount.abs_diff(computed_amount).cents() > TOLERANCE_CENTS {
                return Err(OrderError::TotalsMismatch {
                    field,
                    claimed: claimed_amount,
                    computed: computed_amount,
                });
            }
        }

        Ok(computed)
    }
}
