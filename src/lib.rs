//! # Splitcart
//!
//! Shared-cart lifecycle and integrity engine for group delivery orders.
//!
//! A user opens a shared cart against a delivery platform, nearby users join
//! it, the delivery charge is split between members, and the cart moves
//! through an order lifecycle until it is completed or cancelled.
//!
//! ## Responsibilities
//!
//! - **Cart aggregate**: members, items, financial split, expiry.
//! - **Membership**: join/leave rules, capacity, split recomputation.
//! - **Lifecycle**: the status state machine and expiration handling.
//! - **Proximity matching**: open carts within a user's joining radius.
//! - **Consistency audit**: an idempotent batch pass that normalizes or
//!   deletes malformed persisted carts using the same validation rules as
//!   the live path.
//!
//! ## Module Structure
//!
//! ```text
//! splitcart/
//! ├── domain/      # Cart, CartStatus, GeoPoint, split math, record decoding
//! ├── ports/       # CartApi + UserDirectory, CartStore, dispatcher, clock
//! ├── service/     # CartService (live path), ConsistencyAuditor (batch)
//! └── adapters/    # In-memory store/directory and tracing notifier
//! ```
//!
//! Outbound collaborators (user directory, persistent store, notification
//! dispatch, clock) are consumed through `ports::outbound` traits; their
//! internals live outside this crate.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod adapters;
pub mod domain;
pub mod ports;
pub mod service;

pub use domain::{
    haversine_km, normalize_location, split_amount, Cart, CartError, CartId, CartItem, CartMember,
    CartParams, CartStatus, EngineConfig, ErrorKind, GeoPoint, MemberStatus, Platform, RawCart,
    Timestamp, UserId,
};
pub use ports::{
    CartApi, CartEvent, CartStore, CreateCartRequest, NearbyCart, NotificationDispatcher,
    SystemTimeSource, TimeSource, UserDirectory, Versioned,
};
pub use service::{AuditReport, CartService, ConsistencyAuditor};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
