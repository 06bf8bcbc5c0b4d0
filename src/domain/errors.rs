//! # Domain Errors
//!
//! Error types for the shared-cart engine.

use super::value_objects::{CartId, CartStatus, UserId};
use thiserror::Error;

/// Error classification surfaced to interactive callers.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorKind {
    /// Malformed input; recoverable by the caller correcting the request.
    Validation,
    /// Cart or user absent.
    NotFound,
    /// Capacity, duplicate membership, or a lost optimistic-write race.
    Conflict,
    /// Unauthorized action or transition.
    Forbidden,
    /// Operation against a lapsed cart.
    Expired,
    /// Storage collaborator failure.
    Store,
}

/// Shared-cart engine error.
#[derive(Debug, Error)]
pub enum CartError {
    /// Cart already holds `maxMembers` joined members.
    #[error("Cart is at capacity ({capacity} members)")]
    CapacityExceeded {
        /// The cart's member capacity.
        capacity: u32,
    },

    /// User is already a joined member.
    #[error("User {0} is already a member of this cart")]
    AlreadyMember(UserId),

    /// User is outside the cart's joining radius.
    #[error("User is {distance_km:.2} km away, cart radius is {max_distance_km} km")]
    OutOfRange {
        /// Haversine distance between user and cart.
        distance_km: f64,
        /// The cart's joining radius.
        max_distance_km: f64,
    },

    /// Cart is past the open phase and cannot accept members.
    #[error("Cart in status '{0}' cannot be joined")]
    CartNotJoinable(CartStatus),

    /// User has no joined membership in the cart.
    #[error("User {0} is not a member of this cart")]
    NotAMember(UserId),

    /// The creator must cancel the cart rather than leave it.
    #[error("Creator cannot leave the cart; cancel it instead")]
    CreatorCannotLeave,

    /// Only the creator may perform the action.
    #[error("Only the cart creator may {action}")]
    CreatorOnly {
        /// The attempted action.
        action: &'static str,
    },

    /// Status edge not present in the lifecycle graph.
    #[error("Invalid status transition: {from} -> {to}")]
    InvalidTransition {
        /// Current status.
        from: CartStatus,
        /// Requested status.
        to: CartStatus,
    },

    /// Ordering requires a minimum group size.
    #[error("Ordering requires at least {required} members, cart has {have}")]
    NotEnoughMembers {
        /// Minimum joined members for ordering.
        required: u32,
        /// Joined members present.
        have: u32,
    },

    /// Cart expired while still open.
    #[error("Cart {0} has expired")]
    CartExpired(CartId),

    /// Cart not found in the store.
    #[error("Cart not found: {0}")]
    CartNotFound(CartId),

    /// User not found in the directory.
    #[error("User not found: {0}")]
    UserNotFound(UserId),

    /// `maxMembers` outside the allowed `[2, 10]` range.
    #[error("maxMembers {0} outside allowed range 2..=10")]
    MaxMembersOutOfRange(u32),

    /// `maxDistance` outside the allowed `[0.5, 5]` km range.
    #[error("maxDistance {0} km outside allowed range 0.5..=5")]
    MaxDistanceOutOfRange(f64),

    /// A cart item failed validation.
    #[error("Invalid item at index {index}: {reason}")]
    InvalidItem {
        /// Position in the submitted items.
        index: usize,
        /// What was wrong.
        reason: &'static str,
    },

    /// Optimistic write lost to a concurrent update.
    #[error("Cart was modified concurrently; update rejected")]
    VersionConflict,

    /// Persisted record too malformed to decode.
    #[error("Malformed cart record: {reason}")]
    MalformedRecord {
        /// Why decoding failed.
        reason: String,
    },

    /// Storage collaborator failure.
    #[error("Store error: {0}")]
    Store(String),
}

impl CartError {
    /// Classifies the error into the caller-facing taxonomy.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::CapacityExceeded { .. }
            | Self::AlreadyMember(_)
            | Self::VersionConflict => ErrorKind::Conflict,
            Self::OutOfRange { .. }
            | Self::CartNotJoinable(_)
            | Self::InvalidTransition { .. }
            | Self::NotEnoughMembers { .. }
            | Self::MaxMembersOutOfRange(_)
            | Self::MaxDistanceOutOfRange(_)
            | Self::InvalidItem { .. } => ErrorKind::Validation,
            Self::NotAMember(_) | Self::CreatorCannotLeave | Self::CreatorOnly { .. } => {
                ErrorKind::Forbidden
            }
            Self::CartExpired(_) => ErrorKind::Expired,
            Self::CartNotFound(_) | Self::UserNotFound(_) => ErrorKind::NotFound,
            Self::MalformedRecord { .. } | Self::Store(_) => ErrorKind::Store,
        }
    }
}
