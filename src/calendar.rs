// Trip calendar for Trip Planner
// Maps day indexes (0..TOTAL_DAYS) to dates and labels for the fixed trip window

use chrono::{Datelike, Duration, Local, NaiveDate, Weekday};
use serde::Serialize;

/// Number of days in the trip; valid day indexes are `0..TOTAL_DAYS`
pub const TOTAL_DAYS: i32 = 9;

/// Returned by `current_day_index` outside the trip window
pub const NOT_DURING_TRIP: i32 = -1;

const DAY_TITLES: [&str; TOTAL_DAYS as usize] = [
    "Departure from Singapore",
    "Arrive Tokyo — Day 1",
    "Day 2 — teamLab & Shibuya",
    "Day 3 — Akihabara & Karting",
    "Day 4 — Shuzenji Onsen",
    "Day 5 — Shuzenji → Tokyo",
    "Day 6 — Tokyo",
    "Day 7 — Last Day & Flight Home",
    "Arrive Singapore",
];

/// The trip's date window. Day 0 is the departure day.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TripCalendar {
    start: NaiveDate,
}

/// Where "today" falls relative to the trip
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "camelCase")]
pub enum TripStatus {
    Countdown { days: i64 },
    During { day_index: i32 },
    Complete,
}

impl Default for TripCalendar {
    fn default() -> Self {
        Self::tokyo_2026()
    }
}

impl TripCalendar {
    pub fn new(start: NaiveDate) -> Self {
        Self { start }
    }

    /// 14-22 March 2026
    pub fn tokyo_2026() -> Self {
        Self {
            start: NaiveDate::from_ymd_opt(2026, 3, 14).unwrap_or_default(),
        }
    }

    pub fn start(&self) -> NaiveDate {
        self.start
    }

    /// Last day of the trip
    pub fn end(&self) -> NaiveDate {
        self.start + Duration::days(i64::from(TOTAL_DAYS - 1))
    }

    pub fn date_for(&self, day_index: i32) -> Option<NaiveDate> {
        if (0..TOTAL_DAYS).contains(&day_index) {
            Some(self.start + Duration::days(i64::from(day_index)))
        } else {
            None
        }
    }

    /// Short label, e.g. "Sat 14"
    pub fn label(&self, day_index: i32) -> Option<String> {
        self.date_for(day_index)
            .map(|d| format!("{} {}", weekday_abbrev(d.weekday()), d.day()))
    }

    /// Full label, e.g. "Sat, Mar 14"
    pub fn full_label(&self, day_index: i32) -> Option<String> {
        self.date_for(day_index)
            .map(|d| format!("{}, {}", weekday_abbrev(d.weekday()), d.format("%b %-d")))
    }

    /// Headline for a day of the itinerary
    pub fn day_title(&self, day_index: i32) -> Option<&'static str> {
        usize::try_from(day_index).ok().and_then(|i| DAY_TITLES.get(i).copied())
    }

    /// Departure and return days are spent in transit
    pub fn is_transit_day(&self, day_index: i32) -> bool {
        day_index == 0 || day_index == TOTAL_DAYS - 1
    }

    /// Day index for `today`, or `NOT_DURING_TRIP` outside the window
    pub fn current_day_index(&self, today: NaiveDate) -> i32 {
        let diff = (today - self.start).num_days();
        if (0..i64::from(TOTAL_DAYS)).contains(&diff) {
            diff as i32
        } else {
            NOT_DURING_TRIP
        }
    }

    /// Day index for the local wall clock
    pub fn today_index(&self) -> i32 {
        self.current_day_index(Local::now().date_naive())
    }

    pub fn is_during_trip(&self, today: NaiveDate) -> bool {
        self.current_day_index(today) != NOT_DURING_TRIP
    }

    /// Whole days from `today` to the start; zero or negative once the trip began
    pub fn days_until_trip(&self, today: NaiveDate) -> i64 {
        (self.start - today).num_days()
    }

    pub fn trip_status(&self, today: NaiveDate) -> TripStatus {
        let day_index = self.current_day_index(today);
        if day_index != NOT_DURING_TRIP {
            return TripStatus::During { day_index };
        }
        let days = self.days_until_trip(today);
        if days <= 0 {
            TripStatus::Complete
        } else {
            TripStatus::Countdown { days }
        }
    }

    /// One-line status for the profile screen
    pub fn status_text(&self, today: NaiveDate) -> String {
        match self.trip_status(today) {
            TripStatus::During { day_index } => format!(
                "Day {} of {} — {}",
                day_index + 1,
                TOTAL_DAYS,
                self.full_label(day_index).unwrap_or_default()
            ),
            TripStatus::Complete => "Trip complete!".to_string(),
            TripStatus::Countdown { days } => format!("{} days until Tokyo", days),
        }
    }
}

impl TripStatus {
    pub fn emoji(&self) -> &'static str {
        match self {
            TripStatus::During { .. } => "✈️",
            TripStatus::Complete => "🏠",
            TripStatus::Countdown { days } if *days <= 7 => "🎒",
            TripStatus::Countdown { .. } => "🗓️",
        }
    }
}

fn weekday_abbrev(day: Weekday) -> &'static str {
    match day {
        Weekday::Mon => "Mon",
        Weekday::Tue => "Tue",
        Weekday::Wed => "Wed",
        Weekday::Thu => "Thu",
        Weekday::Fri => "Fri",
        Weekday::Sat => "Sat",
        Weekday::Sun => "Sun",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_labels() {
        let cal = TripCalendar::default();
        assert_eq!(cal.label(0).as_deref(), Some("Sat 14"));
        assert_eq!(cal.label(8).as_deref(), Some("Sun 22"));
        assert_eq!(cal.full_label(0).as_deref(), Some("Sat, Mar 14"));
        assert_eq!(cal.full_label(3).as_deref(), Some("Tue, Mar 17"));
        assert_eq!(cal.label(9), None);
        assert_eq!(cal.full_label(-1), None);
    }

    #[test]
    fn test_day_titles() {
        let cal = TripCalendar::default();
        assert_eq!(cal.day_title(0), Some("Departure from Singapore"));
        assert_eq!(cal.day_title(4), Some("Day 4 — Shuzenji Onsen"));
        assert_eq!(cal.day_title(9), None);
        assert!(cal.is_transit_day(0));
        assert!(cal.is_transit_day(8));
        assert!(!cal.is_transit_day(4));
    }

    #[test]
    fn test_current_day_index_boundaries() {
        let cal = TripCalendar::default();
        assert_eq!(cal.current_day_index(date(2026, 3, 14)), 0);
        assert_eq!(cal.current_day_index(date(2026, 3, 13)), NOT_DURING_TRIP);
        assert_eq!(cal.current_day_index(date(2026, 3, 22)), 8);
        assert_eq!(cal.current_day_index(date(2026, 3, 23)), NOT_DURING_TRIP);
    }

    #[test]
    fn test_trip_status() {
        let cal = TripCalendar::default();
        assert_eq!(cal.trip_status(date(2026, 3, 10)), TripStatus::Countdown { days: 4 });
        assert_eq!(cal.trip_status(date(2026, 3, 15)), TripStatus::During { day_index: 1 });
        assert_eq!(cal.trip_status(date(2026, 4, 1)), TripStatus::Complete);

        assert_eq!(cal.status_text(date(2026, 3, 10)), "4 days until Tokyo");
        assert_eq!(cal.status_text(date(2026, 3, 15)), "Day 2 of 9 — Sun, Mar 15");
        assert_eq!(TripStatus::Countdown { days: 30 }.emoji(), "🗓️");
        assert_eq!(TripStatus::Countdown { days: 3 }.emoji(), "🎒");
    }
}
