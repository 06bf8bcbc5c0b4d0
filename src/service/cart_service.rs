//! # Cart Service
//!
//! The live request path of the shared-cart engine.
//!
//! Every operation is request-scoped and optimistic: it works on a single
//! fetched snapshot of one cart document, submits the mutation as one
//! versioned write, and re-validates against a fresh snapshot if a
//! concurrent writer won the race. Nothing blocks; a join that loses the
//! last slot surfaces `CapacityExceeded` after re-validation.

use crate::domain::{
    decode, haversine_km, normalize_location, Cart, CartError, CartId, CartParams, CartStatus,
    EngineConfig, Fix, Platform, UserId, MAX_DISTANCE_KM, MAX_MEMBERS, MIN_DISTANCE_KM,
    MIN_MEMBERS,
};
use crate::ports::{
    CartApi, CartEvent, CartStore, CreateCartRequest, NearbyCart, NotificationDispatcher,
    TimeSource, UserDirectory,
};
use crate::service::auditor::{AuditReport, ConsistencyAuditor};
use async_trait::async_trait;
use std::cmp::Ordering;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Minimum joined members required to start ordering.
const MIN_ORDERING_MEMBERS: u32 = 2;

/// Live-path implementation of [`CartApi`].
pub struct CartService<S, U, N, T> {
    store: Arc<S>,
    users: Arc<U>,
    notifier: Arc<N>,
    clock: Arc<T>,
    config: EngineConfig,
}

impl<S, U, N, T> CartService<S, U, N, T>
where
    S: CartStore,
    U: UserDirectory,
    N: NotificationDispatcher,
    T: TimeSource,
{
    /// Creates a service with the default engine configuration.
    pub fn new(store: Arc<S>, users: Arc<U>, notifier: Arc<N>, clock: Arc<T>) -> Self {
        Self::with_config(store, users, notifier, clock, EngineConfig::default())
    }

    /// Creates a service with a custom engine configuration.
    pub fn with_config(
        store: Arc<S>,
        users: Arc<U>,
        notifier: Arc<N>,
        clock: Arc<T>,
        config: EngineConfig,
    ) -> Self {
        Self {
            store,
            users,
            notifier,
            clock,
            config,
        }
    }

    /// The engine configuration in use.
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Fetches and decodes one cart, resolving expiry lazily.
    ///
    /// An open cart found past its deadline is persisted as cancelled and
    /// the triggering operation fails with `CartExpired`.
    async fn load_live(&self, id: CartId) -> Result<(Cart, u64), CartError> {
        let record = self
            .store
            .find_by_id(id)
            .await?
            .ok_or(CartError::CartNotFound(id))?;
        let now = self.clock.now();
        let normalized = decode::normalize_cart(&record.value, None, now, &self.config)?;

        if normalized.fixes.contains(&Fix::ExpiredCancelled) {
            match self.store.update(&normalized.cart, record.version).await {
                Ok(()) => {
                    self.notify_users(
                        &normalized.cart.joined_user_refs(),
                        CartEvent::CartCancelled { cart: id },
                    )
                    .await;
                }
                // A concurrent writer already resolved the expiry; its
                // outcome carries the notification.
                Err(err) => debug!("Deferred expiry of cart {} not persisted: {}", id, err),
            }
            info!("Cart {} expired while open - cancelled", id);
            return Err(CartError::CartExpired(id));
        }

        Ok((normalized.cart, record.version))
    }

    /// Fans an event out to the given users, logging dispatch failures.
    async fn notify_users(&self, users: &[UserId], event: CartEvent) {
        for user in users {
            if let Err(err) = self.notifier.notify(*user, event.clone()).await {
                warn!("Notification to user {} dropped: {}", user, err);
            }
        }
    }

    fn validate_create(request: &CreateCartRequest) -> Result<(), CartError> {
        if !(MIN_MEMBERS..=MAX_MEMBERS).contains(&request.max_members) {
            return Err(CartError::MaxMembersOutOfRange(request.max_members));
        }
        if !request.max_distance.is_finite()
            || !(MIN_DISTANCE_KM..=MAX_DISTANCE_KM).contains(&request.max_distance)
        {
            return Err(CartError::MaxDistanceOutOfRange(request.max_distance));
        }
        for (index, item) in request.items.iter().enumerate() {
            if item.name.is_empty() {
                return Err(CartError::InvalidItem {
                    index,
                    reason: "name must not be empty",
                });
            }
            if item.quantity < 1 {
                return Err(CartError::InvalidItem {
                    index,
                    reason: "quantity must be at least 1",
                });
            }
        }
        Ok(())
    }
}

#[async_trait]
impl<S, U, N, T> CartApi for CartService<S, U, N, T>
where
    S: CartStore + 'static,
    U: UserDirectory + 'static,
    N: NotificationDispatcher + 'static,
    T: TimeSource + 'static,
{
    async fn create_cart(&self, request: CreateCartRequest) -> Result<Cart, CartError> {
        if !self.users.exists(request.creator).await? {
            return Err(CartError::UserNotFound(request.creator));
        }
        Self::validate_create(&request)?;

        // A cart without its own location takes the creator's.
        let raw_location = match request.location {
            Some(location) => Some(location),
            None => self.users.get_location(request.creator).await?,
        };
        let location = normalize_location(raw_location.as_ref(), &self.config.default_location);

        let now = self.clock.now();
        let cart = Cart::new(
            CartParams {
                id: CartId::new_v4(),
                creator_ref: request.creator,
                platform: request.platform,
                location,
                items: request.items,
                delivery_charge: request.delivery_charge,
                max_members: request.max_members,
                max_distance: request.max_distance,
                is_public: request.is_public,
                chat_enabled: request.chat_enabled,
            },
            now,
            self.config.cart_ttl_ms,
        );
        self.store.insert(&cart).await?;
        info!(
            "User {} opened cart {} on {} (capacity {})",
            request.creator, cart.id, cart.platform, cart.max_members
        );
        Ok(cart)
    }

    async fn join_cart(&self, cart_id: CartId, user: UserId) -> Result<Cart, CartError> {
        let mut attempt = 0;
        loop {
            let (mut cart, version) = self.load_live(cart_id).await?;

            if cart.at_capacity() {
                return Err(CartError::CapacityExceeded {
                    capacity: cart.max_members,
                });
            }
            if cart.is_joined(user) {
                return Err(CartError::AlreadyMember(user));
            }
            if !self.users.exists(user).await? {
                return Err(CartError::UserNotFound(user));
            }
            let profile = self.users.get_location(user).await?;
            let user_location =
                normalize_location(profile.as_ref(), &self.config.default_location);
            let distance_km =
                haversine_km(user_location.coordinates, cart.location.coordinates);
            if distance_km > cart.max_distance {
                return Err(CartError::OutOfRange {
                    distance_km,
                    max_distance_km: cart.max_distance,
                });
            }
            if !cart.status.is_joinable() {
                return Err(CartError::CartNotJoinable(cart.status));
            }

            let now = self.clock.now();
            match cart.member_mut(user) {
                // A member who left earlier rejoins in place.
                Some(member) => {
                    member.status = crate::domain::MemberStatus::Joined;
                    member.joined_at = now;
                }
                None => cart.members.push(crate::domain::CartMember {
                    user_ref: user,
                    joined_at: now,
                    status: crate::domain::MemberStatus::Joined,
                    split_amount: 0,
                }),
            }
            cart.recompute_splits();
            cart.sync_capacity_status();

            match self.store.update(&cart, version).await {
                Ok(()) => {
                    info!(
                        "User {} joined cart {} ({}/{} members)",
                        user,
                        cart.id,
                        cart.joined_count(),
                        cart.max_members
                    );
                    let others: Vec<UserId> = cart
                        .joined_user_refs()
                        .into_iter()
                        .filter(|u| *u != user)
                        .collect();
                    self.notify_users(
                        &others,
                        CartEvent::MemberJoined {
                            cart: cart.id,
                            user,
                        },
                    )
                    .await;
                    return Ok(cart);
                }
                Err(CartError::VersionConflict) => {
                    attempt += 1;
                    if attempt >= self.config.max_write_attempts {
                        return Err(CartError::VersionConflict);
                    }
                    debug!("Join of cart {} raced, re-validating", cart_id);
                }
                Err(err) => return Err(err),
            }
        }
    }

    async fn leave_cart(&self, cart_id: CartId, user: UserId) -> Result<Cart, CartError> {
        let mut attempt = 0;
        loop {
            let (mut cart, version) = self.load_live(cart_id).await?;

            if !cart.is_joined(user) {
                return Err(CartError::NotAMember(user));
            }
            if user == cart.creator_ref {
                return Err(CartError::CreatorCannotLeave);
            }

            if let Some(member) = cart.member_mut(user) {
                member.status = crate::domain::MemberStatus::Left;
            }
            cart.recompute_splits();
            cart.sync_capacity_status();

            match self.store.update(&cart, version).await {
                Ok(()) => {
                    info!(
                        "User {} left cart {} ({} members remain)",
                        user,
                        cart.id,
                        cart.joined_count()
                    );
                    let remaining = cart.joined_user_refs();
                    self.notify_users(
                        &remaining,
                        CartEvent::MemberLeft {
                            cart: cart.id,
                            user,
                        },
                    )
                    .await;
                    return Ok(cart);
                }
                Err(CartError::VersionConflict) => {
                    attempt += 1;
                    if attempt >= self.config.max_write_attempts {
                        return Err(CartError::VersionConflict);
                    }
                    debug!("Leave of cart {} raced, re-validating", cart_id);
                }
                Err(err) => return Err(err),
            }
        }
    }

    async fn advance_status(
        &self,
        cart_id: CartId,
        user: UserId,
        target: CartStatus,
        order_reference: Option<String>,
    ) -> Result<Cart, CartError> {
        let mut attempt = 0;
        loop {
            let (mut cart, version) = self.load_live(cart_id).await?;

            if user != cart.creator_ref {
                return Err(CartError::CreatorOnly {
                    action: "advance the cart status",
                });
            }
            // Membership-driven and cancellation states are not reachable
            // through this operation.
            if matches!(
                target,
                CartStatus::Active | CartStatus::Full | CartStatus::Cancelled
            ) {
                return Err(CartError::InvalidTransition {
                    from: cart.status,
                    to: target,
                });
            }
            if target == CartStatus::Ordering {
                let have = cart.joined_count() as u32;
                if have < MIN_ORDERING_MEMBERS {
                    return Err(CartError::NotEnoughMembers {
                        required: MIN_ORDERING_MEMBERS,
                        have,
                    });
                }
            }

            let from = cart.status;
            cart.transition_to(target)?;
            if target == CartStatus::Ordered {
                cart.order_reference = order_reference.clone();
            }
            if target == CartStatus::Delivered {
                cart.total_orders += 1;
            }

            match self.store.update(&cart, version).await {
                Ok(()) => {
                    info!("Cart {} moved {} -> {}", cart.id, from, target);
                    let members = cart.joined_user_refs();
                    if target == CartStatus::Delivered {
                        // Cross-aggregate side effect; a profile failure
                        // never rolls back the committed transition.
                        for member in &members {
                            if let Err(err) =
                                self.users.increment_total_orders(*member).await
                            {
                                warn!(
                                    "Order counter for user {} not incremented: {}",
                                    member, err
                                );
                            }
                        }
                    }
                    self.notify_users(
                        &members,
                        CartEvent::StatusChanged {
                            cart: cart.id,
                            from,
                            to: target,
                        },
                    )
                    .await;
                    return Ok(cart);
                }
                Err(CartError::VersionConflict) => {
                    attempt += 1;
                    if attempt >= self.config.max_write_attempts {
                        return Err(CartError::VersionConflict);
                    }
                    debug!("Status advance of cart {} raced, re-validating", cart_id);
                }
                Err(err) => return Err(err),
            }
        }
    }

    async fn cancel_cart(&self, cart_id: CartId, user: UserId) -> Result<Cart, CartError> {
        let mut attempt = 0;
        loop {
            let (mut cart, version) = self.load_live(cart_id).await?;

            if user != cart.creator_ref {
                return Err(CartError::CreatorOnly {
                    action: "cancel the cart",
                });
            }
            cart.transition_to(CartStatus::Cancelled)?;

            match self.store.update(&cart, version).await {
                Ok(()) => {
                    info!("Cart {} cancelled by creator", cart.id);
                    let members = cart.joined_user_refs();
                    self.notify_users(&members, CartEvent::CartCancelled { cart: cart.id })
                        .await;
                    return Ok(cart);
                }
                Err(CartError::VersionConflict) => {
                    attempt += 1;
                    if attempt >= self.config.max_write_attempts {
                        return Err(CartError::VersionConflict);
                    }
                    debug!("Cancel of cart {} raced, re-validating", cart_id);
                }
                Err(err) => return Err(err),
            }
        }
    }

    async fn find_nearby(
        &self,
        user: UserId,
        platform: Platform,
    ) -> Result<Vec<NearbyCart>, CartError> {
        if !self.users.exists(user).await? {
            return Err(CartError::UserNotFound(user));
        }
        let profile = self.users.get_location(user).await?;
        let user_location = normalize_location(profile.as_ref(), &self.config.default_location);

        let now = self.clock.now();
        let candidates = self.store.find_open(platform).await?;
        let mut matches = Vec::new();
        for record in candidates {
            let normalized =
                match decode::normalize_cart(&record.value, None, now, &self.config) {
                    Ok(normalized) => normalized,
                    Err(err) => {
                        debug!("Skipping undecodable cart record: {}", err);
                        continue;
                    }
                };
            let cart = normalized.cart;
            if !cart.status.is_joinable()
                || !cart.is_public
                || cart.platform != platform
                || cart.expires_at <= now
            {
                continue;
            }
            let distance_km = haversine_km(user_location.coordinates, cart.location.coordinates);
            if distance_km <= cart.max_distance {
                matches.push(NearbyCart { cart, distance_km });
            }
        }

        // Nearest first; first-come visibility on ties.
        matches.sort_by(|a, b| {
            a.distance_km
                .partial_cmp(&b.distance_km)
                .unwrap_or(Ordering::Equal)
                .then_with(|| a.cart.created_at.cmp(&b.cart.created_at))
        });
        Ok(matches)
    }

    async fn run_consistency_audit(&self) -> Result<AuditReport, CartError> {
        ConsistencyAuditor::with_config(
            Arc::clone(&self.store),
            Arc::clone(&self.users),
            Arc::clone(&self.clock),
            self.config.clone(),
        )
        .run()
        .await
    }
}
