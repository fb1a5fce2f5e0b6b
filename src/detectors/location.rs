//! Geolocation consistency check between image EXIF and project site

use crate::collab::GpsReader;
use crate::types::GeoPoint;
use serde::Serialize;
use std::path::Path;
use std::sync::Arc;
use tracing::debug;

/// Mean Earth radius in meters
const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// Distance sentinel when no distance could be computed
pub const NO_DISTANCE: f64 = -1.0;

/// Outcome of a location validation
#[derive(Debug, Clone, Serialize)]
pub struct LocationCheck {
    pub valid: bool,
    /// Meters between capture point and project site; -1 when unavailable
    pub distance_meters: f64,
    pub reason: Option<String>,
}

pub struct LocationValidator {
    gps: Arc<dyn GpsReader>,
    /// Maximum acceptable distance in meters
    radius_m: f64,
}

impl LocationValidator {
    pub fn new(gps: Arc<dyn GpsReader>, radius_m: f64) -> Self {
        Self { gps, radius_m }
    }

    /// Validate that the image was captured near the project site.
    pub fn validate(&self, image_path: &Path, project: GeoPoint) -> LocationCheck {
        if !image_path.exists() {
            return LocationCheck {
                valid: false,
                distance_meters: NO_DISTANCE,
                reason: Some("File not found".to_string()),
            };
        }

        let Some(capture) = self.gps.extract(image_path) else {
            return LocationCheck {
                valid: false,
                distance_meters: NO_DISTANCE,
                reason: Some("No GPS metadata found".to_string()),
            };
        };

        let distance = haversine_m(capture, project);
        debug!(
            image = %image_path.display(),
            distance_m = distance,
            radius_m = self.radius_m,
            "location check"
        );

        if distance <= self.radius_m {
            LocationCheck {
                valid: true,
                distance_meters: distance,
                reason: None,
            }
        } else {
            LocationCheck {
                valid: false,
                distance_meters: distance,
                reason: Some(format!("Location mismatch ({distance:.0}m away)")),
            }
        }
    }
}

/// Great-circle distance in meters
pub fn haversine_m(a: GeoPoint, b: GeoPoint) -> f64 {
    let d_lat = (b.lat - a.lat).to_radians();
    let d_lon = (b.lon - a.lon).to_radians();
    let h = (d_lat / 2.0).sin().powi(2)
        + a.lat.to_radians().cos() * b.lat.to_radians().cos() * (d_lon / 2.0).sin().powi(2);
    2.0 * EARTH_RADIUS_M * h.sqrt().asin()
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FixedGps(Option<GeoPoint>);

    impl GpsReader for FixedGps {
        fn extract(&self, _path: &Path) -> Option<GeoPoint> {
            self.0
        }
    }

    fn existing_file() -> tempfile::NamedTempFile {
        tempfile::NamedTempFile::new().unwrap()
    }

    const SITE: GeoPoint = GeoPoint { lat: 19.0760, lon: 72.8777 };

    #[test]
    fn haversine_known_distance() {
        // Mumbai to Pune is roughly 120 km
        let pune = GeoPoint { lat: 18.5204, lon: 73.8567 };
        let d = haversine_m(SITE, pune);
        assert!((100_000.0..150_000.0).contains(&d), "distance was {d}");
    }

    #[test]
    fn capture_at_site_is_valid() {
        let file = existing_file();
        let validator = LocationValidator::new(Arc::new(FixedGps(Some(SITE))), 200.0);
        let check = validator.validate(file.path(), SITE);
        assert!(check.valid);
        assert!(check.distance_meters < 1.0);
        assert!(check.reason.is_none());
    }

    #[test]
    fn capture_beyond_radius_is_mismatch() {
        let file = existing_file();
        // ~1.1 km north of the site
        let away = GeoPoint { lat: SITE.lat + 0.01, lon: SITE.lon };
        let validator = LocationValidator::new(Arc::new(FixedGps(Some(away))), 200.0);
        let check = validator.validate(file.path(), SITE);
        assert!(!check.valid);
        assert!(check.distance_meters > 200.0);
        assert!(check.reason.unwrap().contains("Location mismatch"));
    }

    #[test]
    fn no_gps_metadata_is_invalid_with_sentinel() {
        let file = existing_file();
        let validator = LocationValidator::new(Arc::new(FixedGps(None)), 200.0);
        let check = validator.validate(file.path(), SITE);
        assert!(!check.valid);
        assert_eq!(check.distance_meters, NO_DISTANCE);
        assert_eq!(check.reason.as_deref(), Some("No GPS metadata found"));
    }

    #[test]
    fn missing_file_is_invalid_with_sentinel() {
        let validator = LocationValidator::new(Arc::new(FixedGps(Some(SITE))), 200.0);
        let check = validator.validate(Path::new("/nonexistent/site.jpg"), SITE);
        assert!(!check.valid);
        assert_eq!(check.distance_meters, NO_DISTANCE);
        assert_eq!(check.reason.as_deref(), Some("File not found"));
    }
}
