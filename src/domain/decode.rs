//! # Persisted Record Decoding
//!
//! Loosely-shaped persisted cart records and the decode-with-defaults step
//! that turns them into strongly typed [`Cart`] values.
//!
//! The store boundary is the only place partially-shaped data exists; the
//! rest of the engine works on the typed aggregate. The same normalization
//! runs on the live read path and in the consistency auditor, so the two
//! paths never disagree on what "valid" means. Every applied default is
//! recorded as a [`Fix`] so the auditor can tell a healed record from an
//! already-clean one.

use super::entities::{
    Cart, CartItem, CartMember, EngineConfig, MAX_DISTANCE_KM, MAX_MEMBERS, MIN_DISTANCE_KM,
    MIN_MEMBERS,
};
use super::errors::CartError;
use super::geo::{location_shape_valid, normalize_location};
use super::split::split_amount;
use super::value_objects::{CartId, CartStatus, MemberStatus, Platform, Timestamp, UserId};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};

/// Deserializes a field into `None` instead of failing on a type mismatch.
fn lenient<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(serde_json::from_value(value).ok())
}

/// Deserializes an array field element by element, coercing malformed
/// elements to their default shape. Non-array values become `None`.
fn lenient_seq<'de, D, T>(deserializer: D) -> Result<Option<Vec<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned + Default,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    match value {
        serde_json::Value::Array(elements) => Ok(Some(
            elements
                .into_iter()
                .map(|e| serde_json::from_value(e).unwrap_or_default())
                .collect(),
        )),
        _ => Ok(None),
    }
}

/// Loose location record as persisted.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawLocation {
    /// Coordinate pair, any arity as stored.
    #[serde(default, deserialize_with = "lenient")]
    pub coordinates: Option<Vec<f64>>,
    /// Street address.
    #[serde(default, deserialize_with = "lenient")]
    pub address: Option<String>,
    /// City.
    #[serde(default, deserialize_with = "lenient")]
    pub city: Option<String>,
    /// Postal code.
    #[serde(default, deserialize_with = "lenient")]
    pub pincode: Option<String>,
}

impl RawLocation {
    /// Builds a raw location from a coordinate pair.
    pub fn from_coordinates(longitude: f64, latitude: f64) -> Self {
        Self {
            coordinates: Some(vec![longitude, latitude]),
            ..Self::default()
        }
    }

    /// Whether every address sub-field is present and non-blank.
    fn sub_fields_complete(&self) -> bool {
        [&self.address, &self.city, &self.pincode]
            .iter()
            .all(|f| f.as_deref().is_some_and(|s| !s.trim().is_empty()))
    }
}

/// Loose item record as persisted.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawItem {
    /// Item name.
    #[serde(default, deserialize_with = "lenient")]
    pub name: Option<String>,
    /// Quantity.
    #[serde(default, deserialize_with = "lenient")]
    pub quantity: Option<i64>,
    /// Unit price.
    #[serde(default, deserialize_with = "lenient")]
    pub price: Option<f64>,
    /// Image URL.
    #[serde(default, deserialize_with = "lenient")]
    pub image: Option<String>,
    /// Category.
    #[serde(default, deserialize_with = "lenient")]
    pub category: Option<String>,
}

/// Loose member record as persisted.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawMember {
    /// Member user id.
    #[serde(default, deserialize_with = "lenient")]
    pub user_ref: Option<UserId>,
    /// Join time.
    #[serde(default, deserialize_with = "lenient")]
    pub joined_at: Option<Timestamp>,
    /// `"joined"` or `"left"`.
    #[serde(default, deserialize_with = "lenient")]
    pub status: Option<String>,
    /// Stored split amount.
    #[serde(default, deserialize_with = "lenient")]
    pub split_amount: Option<f64>,
}

/// Loose cart record as persisted.
///
/// Every field is optional and survives a stored type mismatch; shape
/// enforcement happens in [`normalize_cart`], not in serde.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawCart {
    /// Cart id.
    #[serde(default, deserialize_with = "lenient")]
    pub id: Option<CartId>,
    /// Creator user id.
    #[serde(default, deserialize_with = "lenient")]
    pub creator_ref: Option<UserId>,
    /// Platform name.
    #[serde(default, deserialize_with = "lenient")]
    pub platform: Option<String>,
    /// Location record.
    #[serde(default, deserialize_with = "lenient")]
    pub location: Option<RawLocation>,
    /// Item records.
    #[serde(default, deserialize_with = "lenient_seq")]
    pub items: Option<Vec<RawItem>>,
    /// Member records.
    #[serde(default, deserialize_with = "lenient_seq")]
    pub members: Option<Vec<RawMember>>,
    /// Delivery charge.
    #[serde(default, deserialize_with = "lenient")]
    pub delivery_charge: Option<f64>,
    /// Member capacity.
    #[serde(default, deserialize_with = "lenient")]
    pub max_members: Option<i64>,
    /// Joining radius in km.
    #[serde(default, deserialize_with = "lenient")]
    pub max_distance: Option<f64>,
    /// Status string.
    #[serde(default, deserialize_with = "lenient")]
    pub status: Option<String>,
    /// Public visibility flag.
    #[serde(default, deserialize_with = "lenient")]
    pub is_public: Option<bool>,
    /// Chat flag.
    #[serde(default, deserialize_with = "lenient")]
    pub chat_enabled: Option<bool>,
    /// Completed-order counter.
    #[serde(default, deserialize_with = "lenient")]
    pub total_orders: Option<i64>,
    /// Platform order reference.
    #[serde(default, deserialize_with = "lenient")]
    pub order_reference: Option<String>,
    /// Creation time.
    #[serde(default, deserialize_with = "lenient")]
    pub created_at: Option<Timestamp>,
    /// Expiry deadline.
    #[serde(default, deserialize_with = "lenient")]
    pub expires_at: Option<Timestamp>,
}

/// A default applied while normalizing a record.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Fix {
    /// Missing creation time backfilled.
    CreatedAt,
    /// Platform defaulted.
    Platform,
    /// Location replaced or sub-fields filled.
    Location,
    /// Items array reshaped.
    Items,
    /// Delivery charge defaulted.
    DeliveryCharge,
    /// Capacity defaulted.
    MaxMembers,
    /// Members array synthesized or cleaned.
    Members,
    /// Creator inserted into the members array.
    CreatorMembership,
    /// Split amounts recomputed.
    SplitAmounts,
    /// Status defaulted.
    Status,
    /// Visibility flag defaulted.
    IsPublic,
    /// Chat flag defaulted.
    ChatEnabled,
    /// Joining radius defaulted.
    MaxDistance,
    /// Order counter defaulted.
    TotalOrders,
    /// Expiry missing/invalid, reset to now + TTL.
    ExpiryReset,
    /// Elapsed expiry on an open cart, cancelled.
    ExpiredCancelled,
}

/// Outcome of normalizing one record.
#[derive(Clone, Debug)]
pub struct Normalized {
    /// The strongly typed cart.
    pub cart: Cart,
    /// Defaults applied; empty means the record was already clean.
    pub fixes: Vec<Fix>,
}

struct FixList(Vec<Fix>);

impl FixList {
    fn note(&mut self, fix: Fix) {
        if !self.0.contains(&fix) {
            self.0.push(fix);
        }
    }
}

fn whole_number_in(value: Option<f64>, max: u32) -> Option<u32> {
    match value {
        Some(v) if v.is_finite() && v >= 0.0 && v.fract() == 0.0 && v <= f64::from(max) => {
            Some(v as u32)
        }
        _ => None,
    }
}

fn normalize_items(raw: Option<&[RawItem]>, fixes: &mut FixList) -> Vec<CartItem> {
    let Some(raw_items) = raw else {
        fixes.note(Fix::Items);
        return Vec::new();
    };
    let mut items = Vec::with_capacity(raw_items.len());
    for raw_item in raw_items {
        let name_ok = raw_item.name.as_deref().is_some_and(|n| !n.is_empty());
        let quantity_ok = raw_item.quantity.is_some_and(|q| q >= 1);
        let price_ok = whole_number_in(raw_item.price, u32::MAX).is_some();
        if !(name_ok && quantity_ok && price_ok && raw_item.image.is_some() && raw_item.category.is_some())
        {
            fixes.note(Fix::Items);
        }
        items.push(CartItem {
            name: raw_item
                .name
                .clone()
                .filter(|n| !n.is_empty())
                .unwrap_or_else(|| "Unknown Item".to_string()),
            quantity: raw_item
                .quantity
                .filter(|q| *q >= 1)
                .map(|q| q.min(i64::from(u32::MAX)) as u32)
                .unwrap_or(1),
            price: whole_number_in(raw_item.price, u32::MAX).unwrap_or(0),
            image: raw_item.image.clone().unwrap_or_default(),
            category: raw_item.category.clone().unwrap_or_default(),
        });
    }
    items
}

fn normalize_members(
    raw: Option<&[RawMember]>,
    creator: UserId,
    created_at: Timestamp,
    delivery_charge: u32,
    fixes: &mut FixList,
) -> Vec<CartMember> {
    let mut members: Vec<CartMember> = Vec::new();

    match raw {
        None => {
            fixes.note(Fix::Members);
        }
        Some(raw_members) => {
            for raw_member in raw_members {
                let Some(user_ref) = raw_member.user_ref else {
                    // Member record without a user is unusable history.
                    fixes.note(Fix::Members);
                    continue;
                };
                if members.iter().any(|m| m.user_ref == user_ref) {
                    // Unique-by-user invariant; keep the first occurrence.
                    fixes.note(Fix::Members);
                    continue;
                }
                let status = match raw_member.status.as_deref() {
                    Some("joined") => MemberStatus::Joined,
                    Some("left") => MemberStatus::Left,
                    _ => {
                        fixes.note(Fix::Members);
                        MemberStatus::Joined
                    }
                };
                let joined_at = match raw_member.joined_at {
                    Some(t) => t,
                    None => {
                        fixes.note(Fix::Members);
                        created_at
                    }
                };
                let split_amount = match whole_number_in(raw_member.split_amount, u32::MAX) {
                    Some(s) => s,
                    None => {
                        // Unparseable stored amount; joined members get the
                        // recomputed share later, left members settle at 0.
                        fixes.note(Fix::Members);
                        0
                    }
                };
                members.push(CartMember {
                    user_ref,
                    joined_at,
                    status,
                    split_amount,
                });
            }
        }
    }

    if !members.iter().any(|m| m.user_ref == creator) {
        let fix = if members.is_empty() {
            Fix::Members
        } else {
            Fix::CreatorMembership
        };
        fixes.note(fix);
        members.push(CartMember {
            user_ref: creator,
            joined_at: created_at,
            status: MemberStatus::Joined,
            split_amount: delivery_charge,
        });
    }

    members
}

/// Decodes a loose record into a [`Cart`], applying the engine defaults.
///
/// `creator_location` is the creator's profile location, used to backfill a
/// cart whose own location is unusable; when it is also unusable the
/// configured fallback applies. Fails only when the record lacks an `id` or
/// a `creatorRef`; everything else is repairable.
///
/// Each repair is independently idempotent: normalizing an already-clean
/// record reports zero fixes.
pub fn normalize_cart(
    raw: &RawCart,
    creator_location: Option<&RawLocation>,
    now: Timestamp,
    config: &EngineConfig,
) -> Result<Normalized, CartError> {
    let id = raw.id.ok_or_else(|| CartError::MalformedRecord {
        reason: "missing id".to_string(),
    })?;
    let creator_ref = raw.creator_ref.ok_or_else(|| CartError::MalformedRecord {
        reason: "missing creatorRef".to_string(),
    })?;

    let mut fixes = FixList(Vec::new());

    let created_at = match raw.created_at {
        Some(t) => t,
        None => {
            fixes.note(Fix::CreatedAt);
            now
        }
    };

    let platform = match raw.platform.as_deref().and_then(Platform::parse) {
        Some(p) => p,
        None => {
            fixes.note(Fix::Platform);
            config.default_platform
        }
    };

    let location = if location_shape_valid(raw.location.as_ref()) {
        // Coordinates are usable; sub-field defaults may still apply.
        let complete = raw
            .location
            .as_ref()
            .is_some_and(RawLocation::sub_fields_complete);
        if !complete {
            fixes.note(Fix::Location);
        }
        normalize_location(raw.location.as_ref(), &config.default_location)
    } else {
        fixes.note(Fix::Location);
        normalize_location(creator_location, &config.default_location)
    };

    let items = normalize_items(raw.items.as_deref(), &mut fixes);

    let delivery_charge = match whole_number_in(raw.delivery_charge, u32::MAX) {
        Some(c) => c,
        None => {
            fixes.note(Fix::DeliveryCharge);
            config.default_delivery_charge
        }
    };

    let max_members = match raw.max_members {
        Some(m) if (i64::from(MIN_MEMBERS)..=i64::from(MAX_MEMBERS)).contains(&m) => m as u32,
        _ => {
            fixes.note(Fix::MaxMembers);
            config.default_max_members
        }
    };

    let mut members = normalize_members(
        raw.members.as_deref(),
        creator_ref,
        created_at,
        delivery_charge,
        &mut fixes,
    );

    let mut status = match raw.status.as_deref().and_then(CartStatus::parse) {
        Some(s) => s,
        None => {
            fixes.note(Fix::Status);
            CartStatus::Active
        }
    };

    // Split recomputation over joined members.
    let joined = members
        .iter()
        .filter(|m| m.status == MemberStatus::Joined)
        .count();
    let share = split_amount(delivery_charge, joined);
    for member in &mut members {
        if member.status == MemberStatus::Joined && member.split_amount != share {
            member.split_amount = share;
            fixes.note(Fix::SplitAmounts);
        }
    }

    let is_public = raw.is_public.unwrap_or_else(|| {
        fixes.note(Fix::IsPublic);
        true
    });
    let chat_enabled = raw.chat_enabled.unwrap_or_else(|| {
        fixes.note(Fix::ChatEnabled);
        true
    });

    let max_distance = match raw.max_distance {
        Some(d) if d.is_finite() && (MIN_DISTANCE_KM..=MAX_DISTANCE_KM).contains(&d) => d,
        _ => {
            fixes.note(Fix::MaxDistance);
            config.default_max_distance
        }
    };

    let total_orders = match raw.total_orders {
        Some(t) if t >= 0 => t.min(i64::from(u32::MAX)) as u32,
        _ => {
            fixes.note(Fix::TotalOrders);
            0
        }
    };

    // Expiry last: an elapsed deadline on an open cart is a lifecycle
    // violation resolved by cancelling; an in-flight order never silently
    // cancels, its deadline is pushed forward instead.
    let expires_at = match raw.expires_at {
        None => {
            fixes.note(Fix::ExpiryReset);
            now + config.cart_ttl_ms
        }
        Some(e) if e <= now => {
            if status.cancels_on_expiry() {
                fixes.note(Fix::ExpiredCancelled);
                status = CartStatus::Cancelled;
                e
            } else if status.is_terminal() {
                e
            } else {
                fixes.note(Fix::ExpiryReset);
                now + config.cart_ttl_ms
            }
        }
        Some(e) => e,
    };

    Ok(Normalized {
        cart: Cart {
            id,
            creator_ref,
            platform,
            location,
            items,
            members,
            delivery_charge,
            max_members,
            max_distance,
            status,
            is_public,
            chat_enabled,
            total_orders,
            order_reference: raw.order_reference.clone(),
            created_at,
            expires_at,
        },
        fixes: fixes.0,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Platform;
    use serde_json::json;

    const NOW: Timestamp = 1_700_000_000_000;

    fn raw_from(value: serde_json::Value) -> RawCart {
        serde_json::from_value(value).unwrap()
    }

    fn clean_raw() -> RawCart {
        let cart = Cart::new(
            crate::domain::CartParams {
                id: CartId::new_v4(),
                creator_ref: UserId::new_v4(),
                platform: Platform::Zepto,
                location: crate::domain::GeoPoint::fallback(),
                items: vec![],
                delivery_charge: 50,
                max_members: 4,
                max_distance: 2.0,
                is_public: true,
                chat_enabled: true,
            },
            NOW,
            7_200_000,
        );
        serde_json::from_value(serde_json::to_value(&cart).unwrap()).unwrap()
    }

    #[test]
    fn test_clean_record_reports_no_fixes() {
        let raw = clean_raw();
        let normalized = normalize_cart(&raw, None, NOW, &EngineConfig::default()).unwrap();
        assert!(normalized.fixes.is_empty(), "fixes: {:?}", normalized.fixes);
        assert_eq!(normalized.cart.platform, Platform::Zepto);
    }

    #[test]
    fn test_normalize_is_idempotent() {
        let raw = raw_from(json!({
            "id": CartId::new_v4(),
            "creatorRef": UserId::new_v4(),
            "deliveryCharge": -5,
            "maxMembers": 15,
            "status": "bogus",
            "createdAt": NOW,
        }));
        let cfg = EngineConfig::default();
        let first = normalize_cart(&raw, None, NOW, &cfg).unwrap();
        assert!(!first.fixes.is_empty());

        let reencoded: RawCart =
            serde_json::from_value(serde_json::to_value(&first.cart).unwrap()).unwrap();
        let second = normalize_cart(&reencoded, None, NOW, &cfg).unwrap();
        assert!(second.fixes.is_empty(), "fixes: {:?}", second.fixes);
    }

    #[test]
    fn test_bogus_cart_is_fully_repaired() {
        let creator = UserId::new_v4();
        let raw = raw_from(json!({
            "id": CartId::new_v4(),
            "creatorRef": creator,
            "deliveryCharge": -5,
            "maxMembers": 15,
            "status": "bogus",
            "createdAt": NOW,
        }));
        let normalized = normalize_cart(&raw, None, NOW, &EngineConfig::default()).unwrap();
        let cart = normalized.cart;
        assert_eq!(cart.delivery_charge, 50);
        assert_eq!(cart.max_members, 4);
        assert_eq!(cart.status, CartStatus::Active);
        assert_eq!(cart.members.len(), 1);
        assert_eq!(cart.members[0].user_ref, creator);
        assert_eq!(cart.members[0].split_amount, 50);
    }

    #[test]
    fn test_missing_id_is_unrepairable() {
        let raw = raw_from(json!({ "creatorRef": UserId::new_v4() }));
        let err = normalize_cart(&raw, None, NOW, &EngineConfig::default()).unwrap_err();
        assert!(matches!(err, CartError::MalformedRecord { .. }));
    }

    #[test]
    fn test_type_mismatch_fields_decode_as_missing() {
        let raw = raw_from(json!({
            "id": CartId::new_v4(),
            "creatorRef": UserId::new_v4(),
            "deliveryCharge": "fifty",
            "isPublic": "yes",
            "items": "not-an-array",
            "createdAt": NOW,
        }));
        assert!(raw.delivery_charge.is_none());
        assert!(raw.is_public.is_none());
        assert!(raw.items.is_none());

        let normalized = normalize_cart(&raw, None, NOW, &EngineConfig::default()).unwrap();
        assert_eq!(normalized.cart.delivery_charge, 50);
        assert!(normalized.cart.is_public);
        assert!(normalized.cart.items.is_empty());
    }

    #[test]
    fn test_item_defaults() {
        let raw = raw_from(json!({
            "id": CartId::new_v4(),
            "creatorRef": UserId::new_v4(),
            "createdAt": NOW,
            "items": [
                { "name": "", "quantity": 0, "price": -3 },
                "garbage",
            ],
        }));
        let normalized = normalize_cart(&raw, None, NOW, &EngineConfig::default()).unwrap();
        let items = &normalized.cart.items;
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].name, "Unknown Item");
        assert_eq!(items[0].quantity, 1);
        assert_eq!(items[0].price, 0);
        assert_eq!(items[1].name, "Unknown Item");
        assert!(normalized.fixes.contains(&Fix::Items));
    }

    #[test]
    fn test_location_backfills_from_creator_profile() {
        let raw = raw_from(json!({
            "id": CartId::new_v4(),
            "creatorRef": UserId::new_v4(),
            "createdAt": NOW,
        }));
        let profile = RawLocation {
            coordinates: Some(vec![72.8777, 19.076]),
            address: Some("Bandra West".to_string()),
            city: Some("Mumbai".to_string()),
            pincode: Some("400050".to_string()),
        };
        let normalized =
            normalize_cart(&raw, Some(&profile), NOW, &EngineConfig::default()).unwrap();
        assert_eq!(normalized.cart.location.coordinates, [72.8777, 19.076]);
        assert_eq!(normalized.cart.location.city, "Mumbai");
        assert!(normalized.fixes.contains(&Fix::Location));
    }

    #[test]
    fn test_member_without_user_is_dropped() {
        let creator = UserId::new_v4();
        let other = UserId::new_v4();
        let raw = raw_from(json!({
            "id": CartId::new_v4(),
            "creatorRef": creator,
            "createdAt": NOW,
            "deliveryCharge": 50,
            "members": [
                { "userRef": creator, "joinedAt": NOW, "status": "joined", "splitAmount": 25 },
                { "joinedAt": NOW, "status": "joined" },
                { "userRef": other, "joinedAt": NOW, "status": "joined", "splitAmount": 25 },
                { "userRef": other, "joinedAt": NOW, "status": "joined", "splitAmount": 25 },
            ],
        }));
        let normalized = normalize_cart(&raw, None, NOW, &EngineConfig::default()).unwrap();
        assert_eq!(normalized.cart.members.len(), 2);
        assert!(normalized.fixes.contains(&Fix::Members));
    }

    #[test]
    fn test_left_member_bad_split_is_repaired() {
        let creator = UserId::new_v4();
        let gone = UserId::new_v4();
        let raw = raw_from(json!({
            "id": CartId::new_v4(),
            "creatorRef": creator,
            "createdAt": NOW,
            "deliveryCharge": 50,
            "members": [
                { "userRef": creator, "joinedAt": NOW, "status": "joined", "splitAmount": 50 },
                { "userRef": gone, "joinedAt": NOW, "status": "left", "splitAmount": "garbage" },
            ],
        }));
        let cfg = EngineConfig::default();
        let first = normalize_cart(&raw, None, NOW, &cfg).unwrap();
        assert!(first.fixes.contains(&Fix::Members));
        assert_eq!(first.cart.member(gone).map(|m| m.split_amount), Some(0));

        // Once written back the amount parses and no further fix applies.
        let reencoded: RawCart =
            serde_json::from_value(serde_json::to_value(&first.cart).unwrap()).unwrap();
        let second = normalize_cart(&reencoded, None, NOW, &cfg).unwrap();
        assert!(!second.fixes.contains(&Fix::Members));
    }

    #[test]
    fn test_creator_synthesized_into_members() {
        let creator = UserId::new_v4();
        let other = UserId::new_v4();
        let raw = raw_from(json!({
            "id": CartId::new_v4(),
            "creatorRef": creator,
            "createdAt": NOW,
            "deliveryCharge": 60,
            "members": [
                { "userRef": other, "joinedAt": NOW, "status": "joined", "splitAmount": 60 },
            ],
        }));
        let normalized = normalize_cart(&raw, None, NOW, &EngineConfig::default()).unwrap();
        assert!(normalized.cart.is_joined(creator));
        assert!(normalized.fixes.contains(&Fix::CreatorMembership));
        // Two joined members, ceil(60/2) each.
        assert!(normalized
            .cart
            .members
            .iter()
            .all(|m| m.split_amount == 30));
    }

    #[test]
    fn test_expired_open_cart_is_cancelled() {
        let raw = raw_from(json!({
            "id": CartId::new_v4(),
            "creatorRef": UserId::new_v4(),
            "createdAt": NOW - 10_000,
            "status": "full",
            "expiresAt": NOW - 1,
        }));
        let normalized = normalize_cart(&raw, None, NOW, &EngineConfig::default()).unwrap();
        assert_eq!(normalized.cart.status, CartStatus::Cancelled);
        assert!(normalized.fixes.contains(&Fix::ExpiredCancelled));
    }

    #[test]
    fn test_expired_in_flight_cart_is_extended() {
        let cfg = EngineConfig::default();
        let raw = raw_from(json!({
            "id": CartId::new_v4(),
            "creatorRef": UserId::new_v4(),
            "createdAt": NOW - 10_000,
            "status": "ordering",
            "expiresAt": NOW - 1,
        }));
        let normalized = normalize_cart(&raw, None, NOW, &cfg).unwrap();
        assert_eq!(normalized.cart.status, CartStatus::Ordering);
        assert_eq!(normalized.cart.expires_at, NOW + cfg.cart_ttl_ms);
        assert!(normalized.fixes.contains(&Fix::ExpiryReset));
    }

    #[test]
    fn test_expired_terminal_cart_untouched() {
        let raw = raw_from(json!({
            "id": CartId::new_v4(),
            "creatorRef": UserId::new_v4(),
            "createdAt": NOW - 10_000,
            "status": "completed",
            "expiresAt": NOW - 1,
        }));
        let normalized = normalize_cart(&raw, None, NOW, &EngineConfig::default()).unwrap();
        assert_eq!(normalized.cart.status, CartStatus::Completed);
        assert_eq!(normalized.cart.expires_at, NOW - 1);
        assert!(!normalized.fixes.contains(&Fix::ExpiryReset));
    }
}
