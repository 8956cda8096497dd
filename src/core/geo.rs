use crate::models::BoundingBox;

/// Earth's radius in kilometers
const EARTH_RADIUS_KM: f64 = 6371.0;

/// Great-circle distance between two coordinates in kilometers
#[inline]
pub fn haversine_km(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let lat1_rad = lat1.to_radians();
    let lat2_rad = lat2.to_radians();
    let delta_lat = (lat2 - lat1).to_radians();
    let delta_lon = (lon2 - lon1).to_radians();

    let a = (delta_lat / 2.0).sin().powi(2)
        + lat1_rad.cos() * lat2_rad.cos() * (delta_lon / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());

    EARTH_RADIUS_KM * c
}

/// Bounding box around a center point, for cheap candidate pre-filtering
/// before the exact haversine pass
///
/// 1° latitude ≈ 111km; 1° longitude shrinks with cos(latitude).
pub fn bounding_box(lat: f64, lon: f64, radius_km: f64) -> BoundingBox {
    let lat_delta = radius_km / 111.0;
    let lon_delta = radius_km / (111.0 * lat.to_radians().cos().abs());

    BoundingBox {
        min_lat: lat - lat_delta,
        max_lat: lat + lat_delta,
        min_lon: lon - lon_delta,
        max_lon: lon + lon_delta,
    }
}

/// Point-in-box test for the pre-filter stage
#[inline]
pub fn within_bounding_box(lat: f64, lon: f64, bbox: &BoundingBox) -> bool {
    lat >= bbox.min_lat && lat <= bbox.max_lat && lon >= bbox.min_lon && lon <= bbox.max_lon
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_haversine_zero_for_same_point() {
        let d = haversine_km(6.5244, 3.3792, 6.5244, 3.3792);
        assert!(d < 0.01);
    }

    #[test]
    fn test_haversine_lagos_to_abuja() {
        // Lagos to Abuja is roughly 520 km
        let d = haversine_km(6.5244, 3.3792, 9.0765, 7.3986);
        assert!((d - 520.0).abs() < 30.0, "expected ~520km, got {}", d);
    }

    #[test]
    fn test_bounding_box_spans_center() {
        let bbox = bounding_box(6.5244, 3.3792, 10.0);

        assert!(bbox.min_lat < 6.5244 && bbox.max_lat > 6.5244);
        assert!(bbox.min_lon < 3.3792 && bbox.max_lon > 3.3792);

        // 20km total span / 111km per degree ≈ 0.18 degrees
        let lat_span = bbox.max_lat - bbox.min_lat;
        assert!((lat_span - 0.18).abs() < 0.02);
    }

    #[test]
    fn test_within_bounding_box() {
        let bbox = bounding_box(6.5244, 3.3792, 10.0);

        assert!(within_bounding_box(6.5244, 3.3792, &bbox));
        assert!(within_bounding_box(6.53, 3.38, &bbox));
        assert!(!within_bounding_box(9.0765, 7.3986, &bbox));
        assert!(!within_bounding_box(bbox.max_lat + 0.01, 3.3792, &bbox));
    }
}
