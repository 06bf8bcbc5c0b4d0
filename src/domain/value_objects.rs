//! # Domain Value Objects
//!
//! Immutable value types shared across the cart engine.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Timestamp in milliseconds since UNIX epoch.
pub type Timestamp = u64;

/// User identifier (references the external user directory).
pub type UserId = uuid::Uuid;

/// Cart identifier.
pub type CartId = uuid::Uuid;

/// Delivery platform a shared cart orders against.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    /// Blinkit quick-commerce.
    #[default]
    Blinkit,
    /// Zepto quick-commerce.
    Zepto,
    /// Swiggy Instamart.
    Swiggy,
    /// BigBasket groceries.
    Bigbasket,
}

impl Platform {
    /// Parses a stored platform string, case-insensitively.
    ///
    /// Returns `None` for anything outside the supported set.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "blinkit" => Some(Self::Blinkit),
            "zepto" => Some(Self::Zepto),
            "swiggy" => Some(Self::Swiggy),
            "bigbasket" => Some(Self::Bigbasket),
            _ => None,
        }
    }

    /// Stored string form of the platform.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Blinkit => "blinkit",
            Self::Zepto => "zepto",
            Self::Swiggy => "swiggy",
            Self::Bigbasket => "bigbasket",
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Cart lifecycle state machine.
///
/// ```text
/// active ⇄ full ──→ ordering ──→ ordered ──→ delivered ──→ completed
///    │       │          │            │
///    └───────┴──────────┴────────────┴──→ cancelled
/// ```
///
/// `active ⇄ full` is membership-driven; every other edge is an explicit
/// action. `cancelled` is reachable from any non-terminal state.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CartStatus {
    /// Open for members, below capacity.
    #[default]
    Active,
    /// Open, membership at capacity.
    Full,
    /// Creator has started placing the platform order.
    Ordering,
    /// Platform order placed; order reference recorded.
    Ordered,
    /// Order delivered; settlement pending.
    Delivered,
    /// Settled and closed.
    Completed,
    /// Cancelled by the creator or by expiry.
    Cancelled,
}

impl CartStatus {
    /// Parses a stored status string.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "active" => Some(Self::Active),
            "full" => Some(Self::Full),
            "ordering" => Some(Self::Ordering),
            "ordered" => Some(Self::Ordered),
            "delivered" => Some(Self::Delivered),
            "completed" => Some(Self::Completed),
            "cancelled" => Some(Self::Cancelled),
            _ => None,
        }
    }

    /// Stored string form of the status.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Full => "full",
            Self::Ordering => "ordering",
            Self::Ordered => "ordered",
            Self::Delivered => "delivered",
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
        }
    }

    /// Check if a transition is valid.
    pub fn can_transition_to(&self, next: CartStatus) -> bool {
        match (self, next) {
            // Membership-driven, reversible.
            (Self::Active, Self::Full) => true,
            (Self::Full, Self::Active) => true,
            // Explicit order flow.
            (Self::Active | Self::Full, Self::Ordering) => true,
            (Self::Ordering, Self::Ordered) => true,
            (Self::Ordered, Self::Delivered) => true,
            (Self::Delivered, Self::Completed) => true,
            // Cancellation from any non-terminal state.
            (Self::Active | Self::Full | Self::Ordering | Self::Ordered, Self::Cancelled) => true,
            _ => false,
        }
    }

    /// Check if terminal state.
    ///
    /// `Delivered` counts as terminal for expiry and retention even though
    /// it may still close to `Completed`.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Delivered | Self::Completed | Self::Cancelled)
    }

    /// Check if the cart can still accept members.
    pub fn is_joinable(&self) -> bool {
        matches!(self, Self::Active | Self::Full)
    }

    /// Check if expiry may auto-cancel this state.
    ///
    /// An in-flight order (`Ordering` or later) never silently cancels.
    pub fn cancels_on_expiry(&self) -> bool {
        matches!(self, Self::Active | Self::Full)
    }
}

impl fmt::Display for CartStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Membership state inside a cart.
///
/// Left members are retained for settlement history, not deleted.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MemberStatus {
    /// Currently participating; counts toward capacity and split.
    #[default]
    Joined,
    /// Left the cart; kept for audit history.
    Left,
}

/// Geographic point with address metadata.
///
/// `coordinates` is always `[longitude, latitude]`; records that fail this
/// shape are replaced with the configured fallback by
/// [`normalize_location`](crate::domain::normalize_location).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    /// `[longitude, latitude]` pair.
    pub coordinates: [f64; 2],
    /// Street address, `"Not specified"` when absent.
    pub address: String,
    /// City, `"Not specified"` when absent.
    pub city: String,
    /// Postal code, `"000000"` when absent.
    pub pincode: String,
}

impl GeoPoint {
    /// Placeholder for a missing address or city.
    pub const NOT_SPECIFIED: &'static str = "Not specified";
    /// Placeholder for a missing pincode.
    pub const DEFAULT_PINCODE: &'static str = "000000";

    /// Platform-wide fallback location (Delhi city centre).
    pub fn fallback() -> Self {
        Self {
            coordinates: [77.1025, 28.7041],
            address: Self::NOT_SPECIFIED.to_string(),
            city: Self::NOT_SPECIFIED.to_string(),
            pincode: Self::DEFAULT_PINCODE.to_string(),
        }
    }
}
