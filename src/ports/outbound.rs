//! # Outbound (Driven) Ports
//!
//! Traits for the external collaborators the cart engine depends on.
//! Timeouts and retries for these calls belong to the implementations,
//! not to the engine.

use crate::domain::{CartError, CartId, CartStatus, Platform, RawCart, RawLocation, Timestamp, UserId};
use async_trait::async_trait;

/// A stored record together with its optimistic-concurrency version.
///
/// The store's atomic single-document update is the engine's unit of
/// consistency; a write presenting a stale version is rejected with
/// [`CartError::VersionConflict`].
#[derive(Clone, Debug)]
pub struct Versioned<T> {
    /// The stored value.
    pub value: T,
    /// Version the value was read at.
    pub version: u64,
}

/// User directory outbound port.
///
/// Backed by the user profile collection; only the three calls the engine
/// needs are exposed.
#[async_trait]
pub trait UserDirectory: Send + Sync {
    /// Whether the user exists.
    async fn exists(&self, user: UserId) -> Result<bool, CartError>;

    /// The user's stored profile location, if any.
    ///
    /// Returned raw; callers normalize through the location validator.
    async fn get_location(&self, user: UserId) -> Result<Option<RawLocation>, CartError>;

    /// Increments the user's completed-order counter.
    async fn increment_total_orders(&self, user: UserId) -> Result<(), CartError>;
}

/// Persistent cart store outbound port.
///
/// Reads return loose records; decoding with defaults happens in the
/// engine. Writes are per-document atomic.
#[async_trait]
pub trait CartStore: Send + Sync {
    /// Every persisted cart record.
    async fn find_all(&self) -> Result<Vec<Versioned<RawCart>>, CartError>;

    /// Candidate open carts for proximity matching: public records on the
    /// given platform whose stored status is still open.
    ///
    /// This is the matching contract only; implementations may pre-filter
    /// however their storage allows, and the engine re-validates every
    /// candidate after decoding.
    async fn find_open(&self, platform: Platform) -> Result<Vec<Versioned<RawCart>>, CartError>;

    /// Looks up a single cart record.
    async fn find_by_id(&self, id: CartId) -> Result<Option<Versioned<RawCart>>, CartError>;

    /// Inserts a new cart at version 1.
    async fn insert(&self, cart: &crate::domain::Cart) -> Result<(), CartError>;

    /// Replaces a cart document if its version still matches.
    ///
    /// # Errors
    /// - [`CartError::VersionConflict`]: a concurrent writer got there first
    /// - [`CartError::CartNotFound`]: the document was deleted meanwhile
    async fn update(
        &self,
        cart: &crate::domain::Cart,
        expected_version: u64,
    ) -> Result<(), CartError>;

    /// Deletes a cart document. Deleting an absent document is not an error.
    async fn delete(&self, id: CartId) -> Result<(), CartError>;
}

/// Event payload for the notification dispatcher.
#[derive(Clone, Debug, PartialEq)]
pub enum CartEvent {
    /// A user joined the cart.
    MemberJoined {
        /// The cart.
        cart: CartId,
        /// Who joined.
        user: UserId,
    },
    /// A member left the cart.
    MemberLeft {
        /// The cart.
        cart: CartId,
        /// Who left.
        user: UserId,
    },
    /// The cart moved to a new lifecycle status.
    StatusChanged {
        /// The cart.
        cart: CartId,
        /// Previous status.
        from: CartStatus,
        /// New status.
        to: CartStatus,
    },
    /// The cart was cancelled.
    CartCancelled {
        /// The cart.
        cart: CartId,
    },
}

/// Notification dispatcher outbound port.
///
/// Fire-and-forget: a dispatch failure must never fail the operation that
/// triggered it. The engine logs failures at `warn` and moves on.
#[async_trait]
pub trait NotificationDispatcher: Send + Sync {
    /// Delivers one event to one user.
    async fn notify(&self, user: UserId, event: CartEvent) -> Result<(), CartError>;
}

/// Time source for consistent timestamp handling.
///
/// Abstracted so tests can drive expiry deterministically.
pub trait TimeSource: Send + Sync {
    /// Current time in milliseconds since UNIX epoch.
    fn now(&self) -> Timestamp;
}

/// Default system time source.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemTimeSource;

impl TimeSource for SystemTimeSource {
    fn now(&self) -> Timestamp {
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap_or_default()
            .as_millis() as Timestamp
    }
}

/// Mock time source for tests.
#[derive(Debug, Default)]
pub struct MockTimeSource {
    time: std::sync::atomic::AtomicU64,
}

impl MockTimeSource {
    /// Starts the clock at the given instant.
    pub fn new(initial: Timestamp) -> Self {
        Self {
            time: std::sync::atomic::AtomicU64::new(initial),
        }
    }

    /// Moves the clock forward.
    pub fn advance(&self, ms: u64) {
        self.time.fetch_add(ms, std::sync::atomic::Ordering::SeqCst);
    }

    /// Sets the clock to an absolute instant.
    pub fn set(&self, time: Timestamp) {
        self.time.store(time, std::sync::atomic::Ordering::SeqCst);
    }
}

impl TimeSource for MockTimeSource {
    fn now(&self) -> Timestamp {
        self.time.load(std::sync::atomic::Ordering::SeqCst)
    }
}
