//! In-memory user directory.

use crate::domain::{CartError, RawLocation, UserId};
use crate::ports::UserDirectory;
use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::HashMap;

#[derive(Clone, Debug, Default)]
struct Profile {
    location: Option<RawLocation>,
    total_orders: u64,
}

/// In-memory [`UserDirectory`].
#[derive(Default)]
pub struct MemoryUserDirectory {
    profiles: RwLock<HashMap<UserId, Profile>>,
}

impl MemoryUserDirectory {
    /// Creates an empty directory.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a user without a profile location.
    pub fn add_user(&self, user: UserId) {
        self.profiles.write().entry(user).or_default();
    }

    /// Registers a user at the given `[longitude, latitude]`.
    pub fn add_user_at(&self, user: UserId, longitude: f64, latitude: f64) {
        self.profiles.write().insert(
            user,
            Profile {
                location: Some(RawLocation::from_coordinates(longitude, latitude)),
                total_orders: 0,
            },
        );
    }

    /// Registers a user with a full raw location.
    pub fn add_user_with_location(&self, user: UserId, location: RawLocation) {
        self.profiles.write().insert(
            user,
            Profile {
                location: Some(location),
                total_orders: 0,
            },
        );
    }

    /// The user's completed-order counter, for assertions.
    pub fn total_orders(&self, user: UserId) -> u64 {
        self.profiles
            .read()
            .get(&user)
            .map(|p| p.total_orders)
            .unwrap_or(0)
    }
}

#[async_trait]
impl UserDirectory for MemoryUserDirectory {
    async fn exists(&self, user: UserId) -> Result<bool, CartError> {
        Ok(self.profiles.read().contains_key(&user))
    }

    async fn get_location(&self, user: UserId) -> Result<Option<RawLocation>, CartError> {
        Ok(self
            .profiles
            .read()
            .get(&user)
            .and_then(|p| p.location.clone()))
    }

    async fn increment_total_orders(&self, user: UserId) -> Result<(), CartError> {
        let mut profiles = self.profiles.write();
        let profile = profiles
            .get_mut(&user)
            .ok_or(CartError::UserNotFound(user))?;
        profile.total_orders += 1;
        Ok(())
    }
}
