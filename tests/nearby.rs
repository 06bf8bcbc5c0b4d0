//! Proximity-matching tests: ordering, per-cart radius, visibility filters
//! and the advisory nature of a match.

mod common;

use common::{centre_request, Harness, CENTRE, LAT_DEGREE_PER_KM};
use splitcart::domain::RawLocation;
use splitcart::{CartApi, CartError, CartStatus, CreateCartRequest, Platform, UserId};

/// A creation request whose cart sits `km` kilometres north of the centre.
fn request_km_north(h: &Harness, km: f64) -> CreateCartRequest {
    let mut request = centre_request(h.user_at_centre());
    request.location = Some(RawLocation::from_coordinates(
        CENTRE[0],
        CENTRE[1] + km * LAT_DEGREE_PER_KM,
    ));
    request
}

#[tokio::test]
async fn test_nearby_sorted_by_distance() {
    let h = Harness::new();
    let far = h.service.create_cart(request_km_north(&h, 1.5)).await.unwrap();
    h.clock.advance(1);
    let near = h.service.create_cart(request_km_north(&h, 0.5)).await.unwrap();

    let seeker = h.user_at_centre();
    let matches = h
        .service
        .find_nearby(seeker, Platform::Blinkit)
        .await
        .unwrap();

    assert_eq!(matches.len(), 2);
    assert_eq!(matches[0].cart.id, near.id);
    assert_eq!(matches[1].cart.id, far.id);
    assert!((0.4..0.6).contains(&matches[0].distance_km));
    assert!((1.4..1.6).contains(&matches[1].distance_km));
}

#[tokio::test]
async fn test_nearby_ties_break_on_creation_time() {
    let h = Harness::new();
    let first = h.service.create_cart(request_km_north(&h, 0.5)).await.unwrap();
    h.clock.advance(1);
    let second = h.service.create_cart(request_km_north(&h, 0.5)).await.unwrap();

    let matches = h
        .service
        .find_nearby(h.user_at_centre(), Platform::Blinkit)
        .await
        .unwrap();

    assert_eq!(matches.len(), 2);
    assert_eq!(matches[0].cart.id, first.id);
    assert_eq!(matches[1].cart.id, second.id);
}

#[tokio::test]
async fn test_nearby_filters_out_invisible_carts() {
    let h = Harness::new();

    let visible = h.service.create_cart(request_km_north(&h, 0.5)).await.unwrap();

    let mut private = request_km_north(&h, 0.5);
    private.is_public = false;
    h.service.create_cart(private).await.unwrap();

    let mut zepto = request_km_north(&h, 0.5);
    zepto.platform = Platform::Zepto;
    h.service.create_cart(zepto).await.unwrap();

    // 3 km away against that cart's own 2 km radius.
    h.service.create_cart(request_km_north(&h, 3.0)).await.unwrap();

    let cancelled = h.service.create_cart(request_km_north(&h, 0.5)).await.unwrap();
    h.service
        .cancel_cart(cancelled.id, cancelled.creator_ref)
        .await
        .unwrap();

    let ordering = h.service.create_cart(request_km_north(&h, 0.5)).await.unwrap();
    h.service
        .join_cart(ordering.id, h.user_at_centre())
        .await
        .unwrap();
    h.service
        .advance_status(
            ordering.id,
            ordering.creator_ref,
            CartStatus::Ordering,
            None,
        )
        .await
        .unwrap();

    let matches = h
        .service
        .find_nearby(h.user_at_centre(), Platform::Blinkit)
        .await
        .unwrap();

    assert_eq!(matches.len(), 1);
    assert_eq!(matches[0].cart.id, visible.id);
}

#[tokio::test]
async fn test_nearby_excludes_expired_carts() {
    let h = Harness::new();
    h.service.create_cart(request_km_north(&h, 0.5)).await.unwrap();

    h.clock.advance(3 * 60 * 60 * 1000);
    let fresh = h.service.create_cart(request_km_north(&h, 0.5)).await.unwrap();

    let matches = h
        .service
        .find_nearby(h.user_at_centre(), Platform::Blinkit)
        .await
        .unwrap();

    assert_eq!(matches.len(), 1);
    assert_eq!(matches[0].cart.id, fresh.id);
}

#[tokio::test]
async fn test_nearby_includes_full_carts_and_join_still_races() {
    let h = Harness::new();
    let mut request = request_km_north(&h, 0.5);
    request.max_members = 2;
    let cart = h.service.create_cart(request).await.unwrap();
    h.service.join_cart(cart.id, h.user_at_centre()).await.unwrap();

    // Still discoverable while full; the join is what fails.
    let matches = h
        .service
        .find_nearby(h.user_at_centre(), Platform::Blinkit)
        .await
        .unwrap();
    assert_eq!(matches.len(), 1);
    assert_eq!(matches[0].cart.status, CartStatus::Full);

    let err = h
        .service
        .join_cart(cart.id, h.user_at_centre())
        .await
        .unwrap_err();
    assert!(matches!(err, CartError::CapacityExceeded { capacity: 2 }));
}

#[tokio::test]
async fn test_nearby_user_without_location_searches_from_fallback() {
    let h = Harness::new();
    let cart = h.service.create_cart(request_km_north(&h, 0.5)).await.unwrap();

    // The platform fallback location is the test centre.
    let seeker = UserId::new_v4();
    h.users.add_user(seeker);

    let matches = h
        .service
        .find_nearby(seeker, Platform::Blinkit)
        .await
        .unwrap();
    assert_eq!(matches.len(), 1);
    assert_eq!(matches[0].cart.id, cart.id);
    assert!((0.4..0.6).contains(&matches[0].distance_km));
}

#[tokio::test]
async fn test_nearby_rejects_unknown_user() {
    let h = Harness::new();
    let err = h
        .service
        .find_nearby(UserId::new_v4(), Platform::Blinkit)
        .await
        .unwrap_err();
    assert!(matches!(err, CartError::UserNotFound(_)));
}
