// Map popup actions for Trip Planner
// Markers post actions over a channel; the dispatcher turns them into planner calls

use chrono::{Local, NaiveDate};
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::mpsc;

use super::TripPlanner;
use crate::calendar::NOT_DURING_TRIP;
use crate::database::{NewItineraryItem, TimeSlot, WishlistItem};
use crate::error::{Result, TripError};

/// Action requested from a map marker popup
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MapAction {
    /// Open the day picker prefilled with today and the place
    AddToToday(String),
    /// Save the place straight to the wishlist
    AddToWishlist(String),
}

/// Result of a dispatched action
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum MapOutcome {
    /// Draft for the pick-day dialog; nothing is written until it is confirmed
    PickDay { draft: NewItineraryItem },
    Wishlisted { item: WishlistItem },
    Failed { place_id: String, message: String },
}

/// Cloneable handle marker popups post through
#[derive(Clone)]
pub struct MapActionSender {
    tx: mpsc::Sender<MapAction>,
}

impl MapActionSender {
    pub async fn send(&self, action: MapAction) -> Result<()> {
        self.tx
            .send(action)
            .await
            .map_err(|_| TripError::InvalidInput("map action dispatcher has stopped".to_string()))
    }

    pub async fn add_to_today(&self, place_id: &str) -> Result<()> {
        self.send(MapAction::AddToToday(place_id.to_string())).await
    }

    pub async fn add_to_wishlist(&self, place_id: &str) -> Result<()> {
        self.send(MapAction::AddToWishlist(place_id.to_string())).await
    }
}

pub struct MapActionDispatcher {
    planner: Arc<TripPlanner>,
    clock: fn() -> NaiveDate,
}

fn local_today() -> NaiveDate {
    Local::now().date_naive()
}

impl MapActionDispatcher {
    pub fn new(planner: Arc<TripPlanner>) -> Self {
        Self {
            planner,
            clock: local_today,
        }
    }

    pub fn with_clock(mut self, clock: fn() -> NaiveDate) -> Self {
        self.clock = clock;
        self
    }

    /// Sender/receiver pair for marker popups
    pub fn channel(buffer: usize) -> (MapActionSender, mpsc::Receiver<MapAction>) {
        let (tx, rx) = mpsc::channel(buffer);
        (MapActionSender { tx }, rx)
    }

    /// Day the "add to today" action targets; day 0 outside the trip
    pub fn target_day(&self) -> i32 {
        match self.planner.calendar().current_day_index((self.clock)()) {
            NOT_DURING_TRIP => 0,
            day => day,
        }
    }

    pub fn dispatch(&self, action: MapAction) -> MapOutcome {
        let (place_id, result) = match action {
            MapAction::AddToToday(place_id) => {
                let result = self.pick_day_draft(&place_id);
                (place_id, result)
            }
            MapAction::AddToWishlist(place_id) => {
                let result = self
                    .planner
                    .add_to_wishlist(&place_id)
                    .map(|item| MapOutcome::Wishlisted { item });
                (place_id, result)
            }
        };

        result.unwrap_or_else(|e| {
            log::warn!("Map action for place {} failed: {}", place_id, e);
            MapOutcome::Failed {
                place_id,
                message: e.to_string(),
            }
        })
    }

    fn pick_day_draft(&self, place_id: &str) -> Result<MapOutcome> {
        if self.planner.db().get_place(place_id)?.is_none() {
            return Err(TripError::not_found("places", place_id));
        }
        Ok(MapOutcome::PickDay {
            draft: NewItineraryItem::for_place(place_id, self.target_day(), TimeSlot::Morning),
        })
    }

    /// Dispatch until every sender is dropped or the outcome receiver goes away
    pub async fn run(self, mut actions: mpsc::Receiver<MapAction>, outcomes: mpsc::Sender<MapOutcome>) {
        while let Some(action) = actions.recv().await {
            log::debug!("Map action: {:?}", action);
            if outcomes.send(self.dispatch(action)).await.is_err() {
                log::debug!("Map outcome receiver closed, stopping dispatcher");
                break;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calendar::TripCalendar;
    use crate::database::{Category, DatabaseManager, Place, Provenance};

    fn planner() -> Arc<TripPlanner> {
        let db = DatabaseManager::open_in_memory().unwrap();
        let mut place = Place::user("a2", "Meiji Shrine", Category::Culture, "Harajuku", 35.6764, 139.6993);
        place.source = Provenance::Preset;
        db.upsert_place(&place).unwrap();
        Arc::new(TripPlanner::new(Arc::new(db), TripCalendar::default()))
    }

    fn trip_day_three() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 3, 17).unwrap()
    }

    fn before_trip() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 1, 5).unwrap()
    }

    #[test]
    fn test_add_to_today_targets_current_day() {
        let dispatcher = MapActionDispatcher::new(planner()).with_clock(trip_day_three);
        match dispatcher.dispatch(MapAction::AddToToday("a2".to_string())) {
            MapOutcome::PickDay { draft } => {
                assert_eq!(draft.day_index, 3);
                assert_eq!(draft.place_id.as_deref(), Some("a2"));
            }
            other => panic!("unexpected outcome {:?}", other),
        }
        assert!(dispatcher.planner.db().get_all_itinerary().unwrap().is_empty());
    }

    #[test]
    fn test_add_to_today_outside_trip_uses_first_day() {
        let dispatcher = MapActionDispatcher::new(planner()).with_clock(before_trip);
        assert_eq!(dispatcher.target_day(), 0);
    }

    #[test]
    fn test_unknown_place_fails() {
        let dispatcher = MapActionDispatcher::new(planner());
        assert!(matches!(
            dispatcher.dispatch(MapAction::AddToToday("zz".to_string())),
            MapOutcome::Failed { .. }
        ));
    }

    #[tokio::test]
    async fn test_run_over_channel() {
        let planner = planner();
        let dispatcher = MapActionDispatcher::new(planner.clone()).with_clock(trip_day_three);
        let (sender, actions) = MapActionDispatcher::channel(4);
        let (outcome_tx, mut outcomes) = mpsc::channel(4);
        let task = tokio::spawn(dispatcher.run(actions, outcome_tx));

        sender.add_to_wishlist("a2").await.unwrap();
        sender.add_to_wishlist("a2").await.unwrap();
        drop(sender);

        let first = outcomes.recv().await.unwrap();
        let second = outcomes.recv().await.unwrap();
        match (first, second) {
            (MapOutcome::Wishlisted { item: a }, MapOutcome::Wishlisted { item: b }) => assert_eq!(a.id, b.id),
            other => panic!("unexpected outcomes {:?}", other),
        }
        task.await.unwrap();
        assert_eq!(planner.db().get_all_wishlist().unwrap().len(), 1);
    }
}
