//! # Delivery-Charge Split
//!
//! Equal split of the delivery charge across joined members, rounding up.
//!
//! Ceiling division means no member ever owes less than an equal share; the
//! aggregate collected may exceed the delivery charge by at most
//! `members - 1` currency units.

/// Per-member share of the delivery charge, in whole currency units.
///
/// A cart always has at least its creator joined, so `joined_count` is
/// clamped to 1 before dividing.
pub fn split_amount(delivery_charge: u32, joined_count: usize) -> u32 {
    let n = joined_count.max(1) as u32;
    delivery_charge.div_ceil(n)
}
