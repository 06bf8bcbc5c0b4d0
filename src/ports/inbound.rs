//! # Inbound Port - CartApi
//!
//! Primary driving port exposing the shared-cart engine to controllers.

use crate::domain::{
    Cart, CartError, CartId, CartItem, CartStatus, Platform, RawLocation, UserId,
};
use crate::service::AuditReport;
use async_trait::async_trait;

/// Request to open a new shared cart.
#[derive(Clone, Debug)]
pub struct CreateCartRequest {
    /// Creating user; becomes the first member.
    pub creator: UserId,
    /// Delivery platform the group will order against.
    pub platform: Platform,
    /// Initial items.
    pub items: Vec<CartItem>,
    /// Delivery charge to split, in whole currency units.
    pub delivery_charge: u32,
    /// Member capacity, within `[2, 10]`.
    pub max_members: u32,
    /// Joining radius in kilometres, within `[0.5, 5]`.
    pub max_distance: f64,
    /// Whether nearby users can discover the cart.
    pub is_public: bool,
    /// Whether the group chat is enabled.
    pub chat_enabled: bool,
    /// Cart location; when absent it is derived from the creator's profile.
    pub location: Option<RawLocation>,
}

/// An open cart returned by proximity matching.
#[derive(Clone, Debug)]
pub struct NearbyCart {
    /// The matched cart.
    pub cart: Cart,
    /// Haversine distance from the requesting user, in kilometres.
    pub distance_km: f64,
}

/// Primary API for the shared-cart engine.
///
/// Every operation re-evaluates expiry against the injected clock before
/// acting; operating on a lapsed open cart persists the cancellation and
/// fails with [`CartError::CartExpired`].
#[async_trait]
pub trait CartApi: Send + Sync {
    /// Opens a new cart with the creator as its only member.
    ///
    /// # Errors
    /// - `UserNotFound`: creator absent from the directory
    /// - `MaxMembersOutOfRange` / `MaxDistanceOutOfRange` / `InvalidItem`
    async fn create_cart(&self, request: CreateCartRequest) -> Result<Cart, CartError>;

    /// Adds the user to the cart and recomputes every split amount.
    ///
    /// # Errors
    /// - `CapacityExceeded`: cart already at `maxMembers`, including the
    ///   case where a concurrent join filled the last slot
    /// - `AlreadyMember`: user is already joined
    /// - `OutOfRange`: user is outside the cart's joining radius
    /// - `CartNotJoinable`: cart is past the open phase
    async fn join_cart(&self, cart: CartId, user: UserId) -> Result<Cart, CartError>;

    /// Marks the member as left and recomputes remaining splits.
    ///
    /// Member history is retained for settlement; the creator cannot
    /// leave and must cancel instead.
    async fn leave_cart(&self, cart: CartId, user: UserId) -> Result<Cart, CartError>;

    /// Advances the cart along the order flow.
    ///
    /// Creator-only. `Ordering` requires at least two joined members;
    /// `Ordered` records the platform order reference; `Delivered`
    /// increments the order counters of the cart and every joined member.
    async fn advance_status(
        &self,
        cart: CartId,
        user: UserId,
        target: CartStatus,
        order_reference: Option<String>,
    ) -> Result<Cart, CartError>;

    /// Cancels the cart. Creator-only, from any non-terminal state.
    async fn cancel_cart(&self, cart: CartId, user: UserId) -> Result<Cart, CartError>;

    /// Open public carts on the platform within each cart's joining radius
    /// of the user, nearest first, ties broken by earliest creation.
    ///
    /// Recomputed per call; a returned cart may fill up before a join
    /// lands, in which case the join fails with `CapacityExceeded`.
    async fn find_nearby(
        &self,
        user: UserId,
        platform: Platform,
    ) -> Result<Vec<NearbyCart>, CartError>;

    /// Runs the consistency audit over every persisted cart.
    async fn run_consistency_audit(&self) -> Result<AuditReport, CartError>;
}
