//! End-to-end planner flows over the bundled dataset

use chrono::NaiveDate;
use std::sync::Arc;
use tempfile::TempDir;
use trip_planner::calendar::{TripCalendar, NOT_DURING_TRIP, TOTAL_DAYS};
use trip_planner::config::AppConfig;
use trip_planner::database::{ItemStatus, ItineraryPatch, NewItineraryItem, PlaceFilter, TimeSlot};
use trip_planner::geo::{self, GeoPoint};
use trip_planner::planner::{MapAction, MapActionDispatcher, MapOutcome, TripPlanner};
use trip_planner::state::AppState;

async fn seeded_state(dir: &TempDir) -> AppState {
    let config = AppConfig {
        data_dir: dir.path().to_path_buf(),
        ..Default::default()
    };
    let state = AppState::new(config);
    state.initialize().await.unwrap();
    state
}

#[tokio::test]
async fn test_custom_activity_lifecycle() {
    let dir = TempDir::new().unwrap();
    let state = seeded_state(&dir).await;
    let planner = state.planner().await.unwrap();

    let before = planner.day_plan(2).unwrap().total;
    let slot_before = planner.db().get_items_for_slot(2, TimeSlot::Afternoon).unwrap();
    let item = planner
        .add_itinerary_item(&NewItineraryItem::custom("Museum visit", 2, TimeSlot::Afternoon))
        .unwrap();
    assert!(slot_before.iter().all(|i| i.sort_order < item.sort_order));
    assert_eq!(item.status, ItemStatus::Planned);

    let plan = planner.day_plan(2).unwrap();
    let afternoon = plan.slot(TimeSlot::Afternoon).unwrap();
    assert_eq!(afternoon.entries.last().unwrap().display_name, "Museum visit");

    let patch = ItineraryPatch {
        start_time: Some(Some("14:30".to_string())),
        notes: Some("Buy tickets online".to_string()),
        ..Default::default()
    };
    let edited = planner.edit_itinerary_item(&item.id, &patch).unwrap();
    assert_eq!(edited.start_time.as_deref(), Some("14:30"));

    planner.toggle_itinerary_status(&item.id).unwrap();
    assert_eq!(planner.trip_stats().unwrap().total_done, 1);

    planner.delete_itinerary_item(&item.id).unwrap();
    assert_eq!(planner.day_plan(2).unwrap().total, before);
}

#[tokio::test]
async fn test_user_data_survives_restart() {
    let dir = TempDir::new().unwrap();
    let item_id = {
        let state = seeded_state(&dir).await;
        let planner = state.planner().await.unwrap();
        planner
            .add_itinerary_item(&NewItineraryItem::custom("Sumo practice", 5, TimeSlot::Morning))
            .unwrap()
            .id
    };

    let state = seeded_state(&dir).await;
    let db = state.db().await.unwrap();
    assert!(db.get_itinerary_item(&item_id).unwrap().is_some());
}

#[tokio::test]
async fn test_wishlist_from_dont_miss_to_itinerary() {
    let dir = TempDir::new().unwrap();
    let state = seeded_state(&dir).await;
    let planner = state.planner().await.unwrap();

    let dont_miss = planner.dont_miss().unwrap();
    let target = dont_miss
        .unscheduled
        .first()
        .cloned()
        .or_else(|| dont_miss.scheduled.first().map(|s| s.place.clone()))
        .expect("bundled data has priority places");

    let wish = planner.add_to_wishlist(&target.id).unwrap();
    assert_eq!(planner.add_to_wishlist(&target.id).unwrap().id, wish.id);
    assert_eq!(wish.display_name(Some(&target)), target.name);

    let draft = planner.promote_wishlist_item(&wish.id, 4, TimeSlot::Evening).unwrap();
    planner.add_itinerary_item(&draft).unwrap();
    planner.mark_wishlist_done(&wish.id).unwrap();

    let dont_miss = planner.dont_miss().unwrap();
    assert!(dont_miss.scheduled.iter().any(|s| s.place.id == target.id));
    assert!(dont_miss.unscheduled.iter().all(|p| p.id != target.id));

    let search = PlaceFilter {
        search: Some(target.name.to_uppercase()),
        ..Default::default()
    };
    let found = planner.filtered_wishlist(&search).unwrap();
    assert_eq!(found.len(), 1);
    assert!(found[0].item.done);
}

#[tokio::test]
async fn test_reorder_is_scoped_to_its_slot() {
    let dir = TempDir::new().unwrap();
    let state = seeded_state(&dir).await;
    let planner = state.planner().await.unwrap();

    let ids: Vec<String> = ["First", "Second", "Third"]
        .iter()
        .map(|name| {
            planner
                .add_itinerary_item(&NewItineraryItem::custom(name, 6, TimeSlot::Afternoon))
                .unwrap()
                .id
        })
        .collect();
    let evening_before = planner.db().get_items_for_slot(6, TimeSlot::Evening).unwrap();

    let reversed: Vec<String> = ids.iter().rev().cloned().collect();
    planner.reorder_slot(6, TimeSlot::Afternoon, &reversed).unwrap();

    let afternoon: Vec<String> = planner
        .db()
        .get_items_for_slot(6, TimeSlot::Afternoon)
        .unwrap()
        .into_iter()
        .filter(|i| ids.contains(&i.id))
        .map(|i| i.custom_name)
        .collect();
    assert_eq!(afternoon, vec!["Third", "Second", "First"]);
    assert_eq!(planner.db().get_items_for_slot(6, TimeSlot::Evening).unwrap(), evening_before);
}

#[tokio::test]
async fn test_map_add_to_today_before_trip_targets_day_zero() {
    let dir = TempDir::new().unwrap();
    let state = seeded_state(&dir).await;
    let planner = Arc::new(state.planner().await.unwrap());

    fn new_year() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 1, 1).unwrap()
    }
    let dispatcher = MapActionDispatcher::new(planner).with_clock(new_year);

    match dispatcher.dispatch(MapAction::AddToToday("a1".to_string())) {
        MapOutcome::PickDay { draft } => assert_eq!(draft.day_index, 0),
        other => panic!("unexpected outcome {:?}", other),
    }
}

#[tokio::test]
async fn test_nearby_is_sorted_and_physical() {
    let dir = TempDir::new().unwrap();
    let state = seeded_state(&dir).await;
    let planner = state.planner().await.unwrap();

    let shibuya = GeoPoint { lat: 35.6595, lng: 139.7005 };
    let nearby = planner.nearby(shibuya, None).unwrap();
    assert!(!nearby.is_empty() && nearby.len() <= 20);
    assert!(nearby.windows(2).all(|w| w[0].distance_km <= w[1].distance_km));
    assert!(nearby.iter().all(|n| !n.place.is_transit()));
    assert_eq!(
        nearby[0].distance_km,
        geo::distance(shibuya.lat, shibuya.lng, nearby[0].place.lat, nearby[0].place.lng)
    );
}

#[test]
fn test_calendar_covers_exactly_the_trip() {
    let calendar = TripCalendar::default();
    for day in 0..TOTAL_DAYS {
        let date = calendar.date_for(day).unwrap();
        assert_eq!(calendar.current_day_index(date), day);
    }
    let after = calendar.end().succ_opt().unwrap();
    assert_eq!(calendar.current_day_index(after), NOT_DURING_TRIP);
    let before = calendar.start().pred_opt().unwrap();
    assert_eq!(calendar.current_day_index(before), NOT_DURING_TRIP);
}

#[test]
fn test_planner_is_shareable_across_threads() {
    fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<TripPlanner>();
}
