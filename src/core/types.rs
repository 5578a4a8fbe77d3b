//! Core type definitions used throughout the codebase

use serde::{Deserialize, Serialize};
use std::fmt;

/// Opaque identifier for a tracked animal (the store's `_id`)
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntityId(pub String);

impl EntityId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for EntityId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

/// Geographic position in floating point degrees
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub latitude: f64,
    pub longitude: f64,
}

impl Position {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self { latitude, longitude }
    }

    /// Shift by the given deltas (degrees)
    pub fn offset(&self, d_lat: f64, d_lon: f64) -> Self {
        Self {
            latitude: self.latitude + d_lat,
            longitude: self.longitude + d_lon,
        }
    }

    pub fn is_finite(&self) -> bool {
        self.latitude.is_finite() && self.longitude.is_finite()
    }

    /// Convert to a geo point (x = longitude, y = latitude)
    pub fn to_point(&self) -> geo::Point<f64> {
        geo::Point::new(self.longitude, self.latitude)
    }
}

/// Hemisphere-suffixed coordinates, e.g. `1.4060° S, 35.0140° E`
impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let lat_dir = if self.latitude >= 0.0 { 'N' } else { 'S' };
        let lon_dir = if self.longitude >= 0.0 { 'E' } else { 'W' };
        write!(
            f,
            "{:.4}° {}, {:.4}° {}",
            self.latitude.abs(),
            lat_dir,
            self.longitude.abs(),
            lon_dir
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entity_id_equality() {
        let a = EntityId::new("a1");
        let b = EntityId::from("a1");
        let c = EntityId::new("a2");
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn test_entity_id_serializes_as_plain_string() {
        let json = serde_json::to_string(&EntityId::new("66a1")).unwrap();
        assert_eq!(json, "\"66a1\"");
    }

    #[test]
    fn test_position_display_southern_hemisphere() {
        let pos = Position::new(-1.406, 35.014);
        assert_eq!(pos.to_string(), "1.4060° S, 35.0140° E");
    }

    #[test]
    fn test_position_display_western_hemisphere() {
        let pos = Position::new(0.5, -12.25);
        assert_eq!(pos.to_string(), "0.5000° N, 12.2500° W");
    }

    #[test]
    fn test_position_offset() {
        let pos = Position::new(1.0, 2.0).offset(0.5, -0.5);
        assert_eq!(pos, Position::new(1.5, 1.5));
    }

    #[test]
    fn test_position_finiteness() {
        assert!(Position::new(1.0, 2.0).is_finite());
        assert!(!Position::new(f64::NAN, 2.0).is_finite());
    }
}
