//! Shared harness for the integration suites.

#![allow(dead_code)]

use splitcart::adapters::{MemoryCartStore, MemoryUserDirectory, RecordingNotifier};
use splitcart::domain::RawLocation;
use splitcart::ports::outbound::MockTimeSource;
use splitcart::{CartService, CreateCartRequest, Platform, Timestamp, UserId};
use std::sync::Arc;

/// A fixed "now" for deterministic expiry math (mid-November 2023).
pub const NOW: Timestamp = 1_700_000_000_000;

/// Delhi city centre, the default cart neighbourhood in these tests.
pub const CENTRE: [f64; 2] = [77.1025, 28.7041];

/// Roughly one kilometre of latitude, in degrees.
pub const LAT_DEGREE_PER_KM: f64 = 1.0 / 111.0;

pub type Service =
    CartService<MemoryCartStore, MemoryUserDirectory, RecordingNotifier, MockTimeSource>;

pub struct Harness {
    pub store: Arc<MemoryCartStore>,
    pub users: Arc<MemoryUserDirectory>,
    pub notifier: Arc<RecordingNotifier>,
    pub clock: Arc<MockTimeSource>,
    pub service: Service,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_notifier(RecordingNotifier::new())
    }

    pub fn with_notifier(notifier: RecordingNotifier) -> Self {
        let store = Arc::new(MemoryCartStore::new());
        let users = Arc::new(MemoryUserDirectory::new());
        let notifier = Arc::new(notifier);
        let clock = Arc::new(MockTimeSource::new(NOW));
        let service = CartService::new(
            Arc::clone(&store),
            Arc::clone(&users),
            Arc::clone(&notifier),
            Arc::clone(&clock),
        );
        Self {
            store,
            users,
            notifier,
            clock,
            service,
        }
    }

    /// Registers a user at the test centre.
    pub fn user_at_centre(&self) -> UserId {
        let user = UserId::new_v4();
        self.users.add_user_at(user, CENTRE[0], CENTRE[1]);
        user
    }

    /// Registers a user offset north of the centre by `km` kilometres.
    pub fn user_km_north(&self, km: f64) -> UserId {
        let user = UserId::new_v4();
        self.users
            .add_user_at(user, CENTRE[0], CENTRE[1] + km * LAT_DEGREE_PER_KM);
        user
    }
}

/// A creation request for a 50-rupee, 4-member public Blinkit cart at the
/// test centre.
pub fn centre_request(creator: UserId) -> CreateCartRequest {
    CreateCartRequest {
        creator,
        platform: Platform::Blinkit,
        items: vec![],
        delivery_charge: 50,
        max_members: 4,
        max_distance: 2.0,
        is_public: true,
        chat_enabled: true,
        location: Some(RawLocation::from_coordinates(CENTRE[0], CENTRE[1])),
    }
}
