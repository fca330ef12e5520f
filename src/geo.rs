//! Geographic primitives for map selections
//!
//! A map selection is a rectangle given by its north-west and south-east
//! corners. Adapters that query radius-based services receive a derived
//! bounding circle as well.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Mean Earth radius in kilometers.
pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// A point on the map.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub lat: f64,
    pub lng: f64,
}

impl Location {
    pub fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    /// Check that the point is finite and within lat [-90, 90], lng [-180, 180].
    pub fn validate(&self) -> Result<()> {
        if !self.lat.is_finite() || !(-90.0..=90.0).contains(&self.lat) {
            return Err(Error::InvalidLocation(format!(
                "latitude {} is outside [-90, 90]",
                self.lat
            )));
        }
        if !self.lng.is_finite() || !(-180.0..=180.0).contains(&self.lng) {
            return Err(Error::InvalidLocation(format!(
                "longitude {} is outside [-180, 180]",
                self.lng
            )));
        }
        Ok(())
    }
}

/// A user-drawn rectangle.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BoundingBox {
    /// North-west corner
    pub top_left: Location,
    /// South-east corner
    pub bottom_right: Location,
}

impl BoundingBox {
    pub fn new(top_left: Location, bottom_right: Location) -> Self {
        Self { top_left, bottom_right }
    }

    /// Build a box from any two opposite corners.
    ///
    /// The north edge takes the larger latitude and the west edge the
    /// smaller longitude, whichever corner they came from.
    pub fn from_corners(a: Location, b: Location) -> Self {
        Self {
            top_left: Location::new(a.lat.max(b.lat), a.lng.min(b.lng)),
            bottom_right: Location::new(a.lat.min(b.lat), a.lng.max(b.lng)),
        }
    }

    /// Square selection extending `half_extent` degrees from `center` in each direction.
    pub fn around(center: Location, half_extent: f64) -> Self {
        Self::from_corners(
            Location::new(center.lat - half_extent, center.lng - half_extent),
            Location::new(center.lat + half_extent, center.lng + half_extent),
        )
    }

    pub fn validate(&self) -> Result<()> {
        self.top_left.validate()?;
        self.bottom_right.validate()
    }

    /// Derived bounding circle, see [`bounding_circle_of`].
    pub fn bounding_circle(&self) -> BoundingCircle {
        bounding_circle_of(self)
    }
}

impl FromStr for BoundingBox {
    type Err = Error;

    /// Parse `"lat1,lng1,lat2,lng2"` (two opposite corners, any order).
    fn from_str(s: &str) -> Result<Self> {
        let parts: Vec<f64> = s
            .split(',')
            .map(|p| {
                p.trim().parse::<f64>().map_err(|_| {
                    Error::InvalidLocation(format!("'{}' is not a number in bounding box '{}'", p.trim(), s))
                })
            })
            .collect::<Result<_>>()?;

        let [lat1, lng1, lat2, lng2] = parts[..] else {
            return Err(Error::InvalidLocation(format!(
                "expected 'lat1,lng1,lat2,lng2', got '{}'",
                s
            )));
        };

        let bbox = Self::from_corners(Location::new(lat1, lng1), Location::new(lat2, lng2));
        bbox.validate()?;
        Ok(bbox)
    }
}

/// A circle approximating a bounding box.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingCircle {
    pub center: Location,
    /// Radius in kilometers
    pub radius: f64,
}

/// Convert a bounding box into a bounding circle.
///
/// Planar approximation: the center is the component-wise mean of the
/// corners and one degree always counts as 1/360 of Earth's mean
/// circumference, regardless of latitude. Adapters rely on these exact
/// numbers, so keep it planar.
pub fn bounding_circle_of(bbox: &BoundingBox) -> BoundingCircle {
    let BoundingBox { top_left, bottom_right } = bbox;

    let center_lat = (top_left.lat + bottom_right.lat) / 2.0;
    let center_lng = (top_left.lng + bottom_right.lng) / 2.0;

    let lat_delta = bottom_right.lat - center_lat;
    let lng_delta = bottom_right.lng - center_lng;
    let radius_degrees = (lat_delta.powi(2) + lng_delta.powi(2)).sqrt();

    let radius_km = (2.0 * std::f64::consts::PI * EARTH_RADIUS_KM * radius_degrees) / 360.0;

    BoundingCircle {
        center: Location::new(center_lat, center_lng),
        radius: radius_km,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: f64, b: f64, tol: f64) -> bool {
        (a - b).abs() <= tol
    }

    #[test]
    fn test_degenerate_box_has_zero_radius() {
        let corner = Location::new(48.8584, 2.2945);
        let circle = bounding_circle_of(&BoundingBox::new(corner, corner));
        assert_eq!(circle.radius, 0.0);
        assert_eq!(circle.center, corner);
    }

    #[test]
    fn test_center_is_arithmetic_mean() {
        let bbox = BoundingBox::new(Location::new(10.0, -20.0), Location::new(-30.0, 40.0));
        let circle = bounding_circle_of(&bbox);
        assert_eq!(circle.center.lat, (10.0 + -30.0) / 2.0);
        assert_eq!(circle.center.lng, (-20.0 + 40.0) / 2.0);
    }

    #[test]
    fn test_london_reference_box() {
        let bbox = BoundingBox::new(Location::new(51.505, -0.129), Location::new(51.495, -0.119));
        let circle = bbox.bounding_circle();
        assert!(approx(circle.center.lat, 51.5, 1e-9));
        assert!(approx(circle.center.lng, -0.124, 1e-9));
        assert!(approx(circle.radius, 0.787, 0.01), "radius was {}", circle.radius);
    }

    #[test]
    fn test_from_corners_normalizes() {
        let bbox = BoundingBox::from_corners(Location::new(51.495, -0.119), Location::new(51.505, -0.129));
        assert_eq!(bbox.top_left, Location::new(51.505, -0.129));
        assert_eq!(bbox.bottom_right, Location::new(51.495, -0.119));
    }

    #[test]
    fn test_around() {
        let bbox = BoundingBox::around(Location::new(51.5, -0.12), 0.005);
        assert!(approx(bbox.top_left.lat, 51.505, 1e-12));
        assert!(approx(bbox.top_left.lng, -0.125, 1e-12));
        assert!(approx(bbox.bottom_right.lat, 51.495, 1e-12));
        assert!(approx(bbox.bottom_right.lng, -0.115, 1e-12));
    }

    #[test]
    fn test_parse_bbox() {
        let bbox: BoundingBox = "51.495, -0.119, 51.505, -0.129".parse().unwrap();
        assert_eq!(bbox.top_left, Location::new(51.505, -0.129));
        assert_eq!(bbox.bottom_right, Location::new(51.495, -0.119));

        assert!("51.5,-0.1,51.6".parse::<BoundingBox>().is_err());
        assert!("a,b,c,d".parse::<BoundingBox>().is_err());
        assert!("95,0,10,10".parse::<BoundingBox>().is_err());
    }

    #[test]
    fn test_validate_location() {
        assert!(Location::new(90.0, 180.0).validate().is_ok());
        assert!(Location::new(-90.5, 0.0).validate().is_err());
        assert!(Location::new(0.0, 181.0).validate().is_err());
        assert!(Location::new(f64::NAN, 0.0).validate().is_err());
    }

    #[test]
    fn test_wire_names() {
        let bbox = BoundingBox::new(Location::new(1.0, 2.0), Location::new(0.0, 3.0));
        let json = serde_json::to_value(bbox).unwrap();
        assert_eq!(json["topLeft"]["lat"], 1.0);
        assert_eq!(json["bottomRight"]["lng"], 3.0);
    }
}
