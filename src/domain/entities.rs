//! # Domain Entities
//!
//! The `Cart` aggregate and its owned parts.

use super::errors::CartError;
use super::split::split_amount;
use super::value_objects::{
    CartId, CartStatus, GeoPoint, MemberStatus, Platform, Timestamp, UserId,
};
use serde::{Deserialize, Serialize};

/// Minimum cart capacity.
pub const MIN_MEMBERS: u32 = 2;
/// Maximum cart capacity.
pub const MAX_MEMBERS: u32 = 10;
/// Minimum joining radius in kilometres.
pub const MIN_DISTANCE_KM: f64 = 0.5;
/// Maximum joining radius in kilometres.
pub const MAX_DISTANCE_KM: f64 = 5.0;

/// An item inside a shared cart.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartItem {
    /// Item name, `"Unknown Item"` when repaired from a malformed record.
    pub name: String,
    /// Quantity ordered, at least 1.
    pub quantity: u32,
    /// Unit price in whole currency units.
    pub price: u32,
    /// Item image URL, may be empty.
    pub image: String,
    /// Item category, may be empty.
    pub category: String,
}

/// A member of a shared cart.
///
/// Owned exclusively by its parent [`Cart`]; left members are retained for
/// settlement history.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartMember {
    /// The user this membership belongs to.
    pub user_ref: UserId,
    /// When the user joined.
    pub joined_at: Timestamp,
    /// Joined or left.
    pub status: MemberStatus,
    /// This member's share of the delivery charge.
    pub split_amount: u32,
}

/// Parameters for creating a cart.
#[derive(Clone, Debug)]
pub struct CartParams {
    /// Cart identifier.
    pub id: CartId,
    /// Creating user; always the first member.
    pub creator_ref: UserId,
    /// Delivery platform the group orders against.
    pub platform: Platform,
    /// Normalized cart location.
    pub location: GeoPoint,
    /// Initial items.
    pub items: Vec<CartItem>,
    /// Delivery charge in whole currency units.
    pub delivery_charge: u32,
    /// Member capacity, within `[2, 10]`.
    pub max_members: u32,
    /// Joining radius in kilometres, within `[0.5, 5]`.
    pub max_distance: f64,
    /// Whether the cart is discoverable by nearby users.
    pub is_public: bool,
    /// Whether the group chat is enabled.
    pub chat_enabled: bool,
}

/// The shared-cart aggregate root.
///
/// Serializes to the persisted record layout (camelCase field names).
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Cart {
    /// Cart identifier.
    pub id: CartId,
    /// Creating user; must resolve in the user directory.
    pub creator_ref: UserId,
    /// Delivery platform.
    pub platform: Platform,
    /// Cart location used for proximity matching.
    pub location: GeoPoint,
    /// Ordered item list.
    pub items: Vec<CartItem>,
    /// Members, creator always present, unique by `user_ref`.
    pub members: Vec<CartMember>,
    /// Delivery charge in whole currency units.
    pub delivery_charge: u32,
    /// Member capacity.
    pub max_members: u32,
    /// Joining radius in kilometres.
    pub max_distance: f64,
    /// Lifecycle status.
    pub status: CartStatus,
    /// Whether the cart is discoverable by nearby users.
    pub is_public: bool,
    /// Whether the group chat is enabled.
    pub chat_enabled: bool,
    /// Completed orders through this cart; monotonic.
    pub total_orders: u32,
    /// Platform order reference, recorded when the order is placed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub order_reference: Option<String>,
    /// Creation time.
    pub created_at: Timestamp,
    /// Expiry deadline; always in the future for a non-terminal cart.
    pub expires_at: Timestamp,
}

impl Cart {
    /// Creates a new active cart with the creator as its only member.
    ///
    /// The creator initially owes the full delivery charge.
    pub fn new(params: CartParams, now: Timestamp, ttl_ms: u64) -> Self {
        let creator_member = CartMember {
            user_ref: params.creator_ref,
            joined_at: now,
            status: MemberStatus::Joined,
            split_amount: params.delivery_charge,
        };
        Self {
            id: params.id,
            creator_ref: params.creator_ref,
            platform: params.platform,
            location: params.location,
            items: params.items,
            members: vec![creator_member],
            delivery_charge: params.delivery_charge,
            max_members: params.max_members,
            max_distance: params.max_distance,
            status: CartStatus::Active,
            is_public: params.is_public,
            chat_enabled: params.chat_enabled,
            total_orders: 0,
            order_reference: None,
            created_at: now,
            expires_at: now + ttl_ms,
        }
    }

    /// Number of currently joined members.
    pub fn joined_count(&self) -> usize {
        self.members
            .iter()
            .filter(|m| m.status == MemberStatus::Joined)
            .count()
    }

    /// Looks up a member by user, joined or left.
    pub fn member(&self, user: UserId) -> Option<&CartMember> {
        self.members.iter().find(|m| m.user_ref == user)
    }

    /// Mutable member lookup.
    pub fn member_mut(&mut self, user: UserId) -> Option<&mut CartMember> {
        self.members.iter_mut().find(|m| m.user_ref == user)
    }

    /// Whether the user is a currently joined member.
    pub fn is_joined(&self, user: UserId) -> bool {
        self.member(user)
            .is_some_and(|m| m.status == MemberStatus::Joined)
    }

    /// User ids of all currently joined members.
    pub fn joined_user_refs(&self) -> Vec<UserId> {
        self.members
            .iter()
            .filter(|m| m.status == MemberStatus::Joined)
            .map(|m| m.user_ref)
            .collect()
    }

    /// Whether the joined membership has reached capacity.
    pub fn at_capacity(&self) -> bool {
        self.joined_count() >= self.max_members as usize
    }

    /// Whether the cart's expiry deadline has elapsed.
    pub fn is_expired(&self, now: Timestamp) -> bool {
        self.expires_at <= now
    }

    /// Recomputes every joined member's split amount.
    ///
    /// Idempotent: recomputing with no membership or charge change yields
    /// the same per-member amounts. Returns true if any amount changed.
    pub fn recompute_splits(&mut self) -> bool {
        let share = split_amount(self.delivery_charge, self.joined_count());
        let mut changed = false;
        for member in &mut self.members {
            if member.status == MemberStatus::Joined && member.split_amount != share {
                member.split_amount = share;
                changed = true;
            }
        }
        changed
    }

    /// Re-derives the `active`/`full` pair from the joined member count.
    ///
    /// Only touches carts currently in the membership-driven states;
    /// returns true if the status flipped.
    pub fn sync_capacity_status(&mut self) -> bool {
        let next = match (self.status, self.at_capacity()) {
            (CartStatus::Active, true) => CartStatus::Full,
            (CartStatus::Full, false) => CartStatus::Active,
            _ => return false,
        };
        self.status = next;
        true
    }

    /// Applies a lifecycle transition, rejecting edges not in the graph.
    pub fn transition_to(&mut self, next: CartStatus) -> Result<(), CartError> {
        if !self.status.can_transition_to(next) {
            return Err(CartError::InvalidTransition {
                from: self.status,
                to: next,
            });
        }
        self.status = next;
        Ok(())
    }
}

/// Engine configuration.
///
/// Defaults mirror the platform-wide repair defaults; injected rather than
/// kept as ambient globals so the live path and the auditor always agree.
#[derive(Clone, Debug)]
pub struct EngineConfig {
    /// Fallback location when none can be derived.
    pub default_location: GeoPoint,
    /// Platform assumed for records with a missing or invalid platform.
    pub default_platform: Platform,
    /// Delivery charge assumed for out-of-range records.
    pub default_delivery_charge: u32,
    /// Capacity assumed for out-of-range records.
    pub default_max_members: u32,
    /// Joining radius assumed for out-of-range records, in km.
    pub default_max_distance: f64,
    /// How long a new cart stays open, in milliseconds.
    pub cart_ttl_ms: u64,
    /// Age past which a non-exempt cart is considered abandoned.
    pub retention_window_ms: u64,
    /// Statuses exempt from retention deletion.
    pub retention_exempt: Vec<CartStatus>,
    /// Optimistic-write attempts before giving up on a conflicted cart.
    pub max_write_attempts: u32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            default_location: GeoPoint::fallback(),
            default_platform: Platform::Blinkit,
            default_delivery_charge: 50,
            default_max_members: 4,
            default_max_distance: 2.0,
            cart_ttl_ms: 2 * 60 * 60 * 1000,
            retention_window_ms: 7 * 24 * 60 * 60 * 1000,
            retention_exempt: vec![CartStatus::Completed, CartStatus::Delivered],
            max_write_attempts: 3,
        }
    }
}

impl EngineConfig {
    /// Whether a cart of this age and status should be deleted as abandoned.
    pub fn is_abandoned(&self, created_at: Timestamp, status: CartStatus, now: Timestamp) -> bool {
        if self.retention_exempt.contains(&status) {
            return false;
        }
        now.saturating_sub(created_at) > self.retention_window_ms
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_cart(delivery_charge: u32, max_members: u32) -> Cart {
        Cart::new(
            CartParams {
                id: CartId::new_v4(),
                creator_ref: UserId::new_v4(),
                platform: Platform::Blinkit,
                location: GeoPoint::fallback(),
                items: vec![],
                delivery_charge,
                max_members,
                max_distance: 2.0,
                is_public: true,
                chat_enabled: true,
            },
            1_000,
            7_200_000,
        )
    }

    fn join(cart: &mut Cart, user: UserId, now: Timestamp) {
        cart.members.push(CartMember {
            user_ref: user,
            joined_at: now,
            status: MemberStatus::Joined,
            split_amount: 0,
        });
        cart.recompute_splits();
        cart.sync_capacity_status();
    }

    #[test]
    fn test_new_cart_shape() {
        let cart = test_cart(50, 4);
        assert_eq!(cart.status, CartStatus::Active);
        assert_eq!(cart.members.len(), 1);
        assert_eq!(cart.members[0].split_amount, 50);
        assert_eq!(cart.expires_at, 1_000 + 7_200_000);
        assert!(cart.is_joined(cart.creator_ref));
    }

    #[test]
    fn test_recompute_splits_three_members() {
        let mut cart = test_cart(50, 4);
        join(&mut cart, UserId::new_v4(), 2_000);
        join(&mut cart, UserId::new_v4(), 3_000);
        assert!(cart
            .members
            .iter()
            .all(|m| m.split_amount == 17));
    }

    #[test]
    fn test_recompute_splits_idempotent() {
        let mut cart = test_cart(50, 4);
        join(&mut cart, UserId::new_v4(), 2_000);
        assert!(!cart.recompute_splits());
    }

    #[test]
    fn test_left_member_split_untouched() {
        let mut cart = test_cart(50, 4);
        let user = UserId::new_v4();
        join(&mut cart, user, 2_000);
        if let Some(member) = cart.member_mut(user) {
            member.status = MemberStatus::Left;
        }
        cart.recompute_splits();
        assert_eq!(cart.member(cart.creator_ref).map(|m| m.split_amount), Some(50));
        // Left member keeps its last computed share for history.
        assert_eq!(cart.member(user).map(|m| m.split_amount), Some(25));
    }

    #[test]
    fn test_capacity_status_flips_both_ways() {
        let mut cart = test_cart(50, 2);
        let user = UserId::new_v4();
        join(&mut cart, user, 2_000);
        assert_eq!(cart.status, CartStatus::Full);

        if let Some(member) = cart.member_mut(user) {
            member.status = MemberStatus::Left;
        }
        cart.recompute_splits();
        cart.sync_capacity_status();
        assert_eq!(cart.status, CartStatus::Active);
    }

    #[test]
    fn test_capacity_status_leaves_ordering_alone() {
        let mut cart = test_cart(50, 2);
        cart.status = CartStatus::Ordering;
        assert!(!cart.sync_capacity_status());
        assert_eq!(cart.status, CartStatus::Ordering);
    }

    #[test]
    fn test_transition_rejects_bad_edge() {
        let mut cart = test_cart(50, 4);
        assert!(cart.transition_to(CartStatus::Ordered).is_err());
        assert!(cart.transition_to(CartStatus::Ordering).is_ok());
        assert_eq!(cart.status, CartStatus::Ordering);
    }

    #[test]
    fn test_persisted_field_names() {
        let cart = test_cart(50, 4);
        let doc = serde_json::to_value(&cart).unwrap();
        for field in [
            "creatorRef",
            "deliveryCharge",
            "maxMembers",
            "maxDistance",
            "isPublic",
            "chatEnabled",
            "totalOrders",
            "createdAt",
            "expiresAt",
        ] {
            assert!(doc.get(field).is_some(), "missing field {field}");
        }
        assert_eq!(doc["status"], "active");
        assert_eq!(doc["platform"], "blinkit");
        assert!(doc["members"][0].get("userRef").is_some());
        assert!(doc["members"][0].get("splitAmount").is_some());
    }

    #[test]
    fn test_abandoned_rule() {
        let cfg = EngineConfig::default();
        let week = cfg.retention_window_ms;
        assert!(cfg.is_abandoned(0, CartStatus::Active, week + 1));
        assert!(!cfg.is_abandoned(0, CartStatus::Active, week));
        assert!(!cfg.is_abandoned(0, CartStatus::Completed, week + 1));
        assert!(!cfg.is_abandoned(0, CartStatus::Delivered, week + 1));
        // Cancelled carts get the retention window as a grace period only.
        assert!(cfg.is_abandoned(0, CartStatus::Cancelled, week + 1));
    }
}
