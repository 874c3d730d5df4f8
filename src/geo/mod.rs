// Geo utilities for Trip Planner
// Great-circle distance, distance labels and nearest-first ordering of places

pub mod locator;

use serde::{Deserialize, Serialize};

use crate::database::Place;

pub use locator::{
    position_or_fallback, FixedGeolocator, Geolocator, PositionFix, PositionWatch,
    UnavailableGeolocator,
};

/// Mean Earth radius in kilometers
const EARTH_RADIUS_KM: f64 = 6371.0;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub lat: f64,
    pub lng: f64,
}

/// Default map center: Tokyo Station
pub const TOKYO_CENTER: GeoPoint = GeoPoint {
    lat: 35.6812,
    lng: 139.7671,
};

/// A device position as reported by a geolocation capability
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub lat: f64,
    pub lng: f64,
    /// Accuracy radius in meters, when known
    pub accuracy: Option<f64>,
}

impl Position {
    pub fn point(&self) -> GeoPoint {
        GeoPoint {
            lat: self.lat,
            lng: self.lng,
        }
    }
}

impl From<GeoPoint> for Position {
    fn from(p: GeoPoint) -> Self {
        Position {
            lat: p.lat,
            lng: p.lng,
            accuracy: None,
        }
    }
}

/// A place annotated with its distance from some origin
#[derive(Debug, Clone, Serialize)]
pub struct NearbyPlace {
    pub place: Place,
    pub distance_km: f64,
}

impl NearbyPlace {
    pub fn distance_label(&self) -> String {
        format_distance(self.distance_km)
    }
}

/// Haversine distance between two points in kilometers
pub fn distance(lat1: f64, lng1: f64, lat2: f64, lng2: f64) -> f64 {
    let d_lat = (lat2 - lat1).to_radians();
    let d_lng = (lng2 - lng1).to_radians();

    let a = (d_lat / 2.0).sin().powi(2)
        + lat1.to_radians().cos() * lat2.to_radians().cos() * (d_lng / 2.0).sin().powi(2);

    EARTH_RADIUS_KM * 2.0 * a.sqrt().atan2((1.0 - a).sqrt())
}

/// Distance label: whole meters below 1 km, otherwise kilometers to one decimal
pub fn format_distance(km: f64) -> String {
    if km < 1.0 {
        format!("{}m", (km * 1000.0).round() as i64)
    } else {
        format!("{:.1}km", km)
    }
}

/// Places ordered nearest first from `origin`
pub fn sort_by_distance(places: impl IntoIterator<Item = Place>, origin: GeoPoint) -> Vec<NearbyPlace> {
    let mut nearby: Vec<NearbyPlace> = places
        .into_iter()
        .map(|place| {
            let distance_km = distance(origin.lat, origin.lng, place.lat, place.lng);
            NearbyPlace { place, distance_km }
        })
        .collect();

    nearby.sort_by(|a, b| a.distance_km.total_cmp(&b.distance_km));
    nearby
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::Category;

    #[test]
    fn test_identical_points_are_zero() {
        assert_eq!(distance(35.6812, 139.7671, 35.6812, 139.7671), 0.0);
    }

    #[test]
    fn test_known_distance() {
        // Tokyo Station to Shibuya crossing is roughly 6.5 km
        let d = distance(35.6812, 139.7671, 35.6595, 139.7005);
        assert!((d - 6.5).abs() < 0.3, "got {}", d);
    }

    #[test]
    fn test_format_distance() {
        assert_eq!(format_distance(0.342), "342m");
        assert_eq!(format_distance(0.0), "0m");
        assert_eq!(format_distance(2.345), "2.3km");
        assert_eq!(format_distance(1.0), "1.0km");
    }

    #[test]
    fn test_sort_by_distance() {
        let far = Place::user("far", "Mt Fuji", Category::Nature, "Fuji", 35.3606, 138.7274);
        let near = Place::user("near", "Marunouchi", Category::Shopping, "Tokyo", 35.6815, 139.7660);

        let sorted = sort_by_distance(vec![far, near], TOKYO_CENTER);
        assert_eq!(sorted[0].place.id, "near");
        assert_eq!(sorted[1].place.id, "far");
        assert!(sorted[0].distance_label().ends_with('m'));
        assert!(sorted[1].distance_label().ends_with("km"));
    }
}
