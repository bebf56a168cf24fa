use serde::{Deserialize, Serialize};

/// Earth's radius in kilometers
const EARTH_RADIUS_KM: f64 = 6371.0;
const KM_PER_MILE: f64 = 1.609_344;

/// A latitude/longitude pair in degrees
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub lat: f64,
    pub lon: f64,
}

impl GeoPoint {
    pub const fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }
}

/// Lat/lon window used to cheaply discard far-away venues
#[derive(Debug, Clone, Copy)]
pub struct BoundingBox {
    pub min_lat: f64,
    pub max_lat: f64,
    pub min_lon: f64,
    pub max_lon: f64,
}

impl BoundingBox {
    /// 1° latitude ≈ 111km, 1° longitude ≈ 111km * cos(latitude)
    pub fn around(center: GeoPoint, radius_km: f64) -> Self {
        let lat_delta = radius_km / 111.0;
        let lon_delta = radius_km / (111.0 * center.lat.to_radians().cos().abs());

        Self {
            min_lat: center.lat - lat_delta,
            max_lat: center.lat + lat_delta,
            min_lon: center.lon - lon_delta,
            max_lon: center.lon + lon_delta,
        }
    }

    #[inline]
    pub fn contains(&self, point: GeoPoint) -> bool {
        point.lat >= self.min_lat
            && point.lat <= self.max_lat
            && point.lon >= self.min_lon
            && point.lon <= self.max_lon
    }
}

/// Great-circle distance between two points in kilometers
#[inline]
pub fn haversine_km(a: GeoPoint, b: GeoPoint) -> f64 {
    let lat1 = a.lat.to_radians();
    let lat2 = b.lat.to_radians();
    let delta_lat = (b.lat - a.lat).to_radians();
    let delta_lon = (b.lon - a.lon).to_radians();

    let h = (delta_lat / 2.0).sin().powi(2)
        + lat1.cos() * lat2.cos() * (delta_lon / 2.0).sin().powi(2);
    let c = 2.0 * h.sqrt().atan2((1.0 - h).sqrt());

    EARTH_RADIUS_KM * c
}

/// Distance if `point` lies within `radius_km` of `center`
///
/// Runs the bounding box check first and only computes Haversine for
/// points inside it.
pub fn distance_within(center: GeoPoint, point: GeoPoint, radius_km: f64) -> Option<f64> {
    if !BoundingBox::around(center, radius_km).contains(point) {
        return None;
    }
    let km = haversine_km(center, point);
    (km <= radius_km).then_some(km)
}

/// Walking-distance label such as "0.4 mi"
pub fn format_miles(km: f64) -> String {
    format!("{:.1} mi", km / KM_PER_MILE)
}

#[cfg(test)]
mod tests {
    use super::*;

    const FERRY_BUILDING: GeoPoint = GeoPoint::new(37.7955, -122.3937);
    const UNION_SQUARE: GeoPoint = GeoPoint::new(37.7880, -122.4075);

    #[test]
    fn test_haversine_short_hop() {
        // Ferry Building to Union Square is roughly 1.5 km
        let km = haversine_km(FERRY_BUILDING, UNION_SQUARE);
        assert!((km - 1.47).abs() < 0.2, "expected ~1.5km, got {}", km);
    }

    #[test]
    fn test_haversine_zero() {
        assert!(haversine_km(UNION_SQUARE, UNION_SQUARE) < 0.001);
    }

    #[test]
    fn test_bounding_box_contains_center() {
        let bbox = BoundingBox::around(UNION_SQUARE, 1.0);
        assert!(bbox.contains(UNION_SQUARE));
        assert!(!bbox.contains(GeoPoint::new(37.90, -122.40)));
    }

    #[test]
    fn test_distance_within_radius() {
        assert!(distance_within(FERRY_BUILDING, UNION_SQUARE, 2.0).is_some());
        assert!(distance_within(FERRY_BUILDING, UNION_SQUARE, 1.0).is_none());
    }

    #[test]
    fn test_format_miles() {
        assert_eq!(format_miles(1.609_344), "1.0 mi");
        assert_eq!(format_miles(0.5), "0.3 mi");
    }
}
