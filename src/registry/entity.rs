//! Tracked animal records and partial updates

use serde::{Deserialize, Serialize};

use crate::core::error::{Result, TrackerError};
use crate::core::types::{EntityId, Position};

/// Latest known state of one tracked animal
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Entity {
    pub id: EntityId,
    pub species: String,
    pub age: f64,
    pub position: Position,
    pub speed: f64,
    pub distance_traveled: f64,
}

impl Entity {
    /// A blank entity; every field not carried by an update stays zero/empty
    pub fn new(id: EntityId) -> Self {
        Self {
            id,
            species: String::new(),
            age: 0.0,
            position: Position::default(),
            speed: 0.0,
            distance_traveled: 0.0,
        }
    }

    /// Overwrite the fields present in `update`. Identity is never touched.
    pub fn apply(&mut self, update: &EntityUpdate) {
        if let Some(species) = &update.species {
            self.species = species.clone();
        }
        if let Some(age) = update.age {
            self.age = age;
        }
        if let Some(lat) = update.latitude {
            self.position.latitude = lat;
        }
        if let Some(lon) = update.longitude {
            self.position.longitude = lon;
        }
        if let Some(speed) = update.speed {
            self.speed = speed;
        }
        if let Some(distance) = update.distance_traveled {
            self.distance_traveled = distance;
        }
    }
}

/// A full or partial record as pushed by the store or the stream
///
/// Only the identity is mandatory. The store names it `_id`; `id` is accepted
/// as well.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EntityUpdate {
    #[serde(alias = "_id")]
    pub id: EntityId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub species: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub age: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub latitude: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub longitude: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub speed: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub distance_traveled: Option<f64>,
}

impl EntityUpdate {
    pub fn new(id: EntityId) -> Self {
        Self {
            id,
            ..Self::default()
        }
    }

    /// Position-only update, as produced by the motion simulator
    pub fn position(id: EntityId, position: Position) -> Self {
        Self {
            id,
            latitude: Some(position.latitude),
            longitude: Some(position.longitude),
            ..Self::default()
        }
    }

    pub fn with_species(mut self, species: impl Into<String>) -> Self {
        self.species = Some(species.into());
        self
    }

    pub fn with_age(mut self, age: f64) -> Self {
        self.age = Some(age);
        self
    }

    pub fn with_position(mut self, position: Position) -> Self {
        self.latitude = Some(position.latitude);
        self.longitude = Some(position.longitude);
        self
    }

    pub fn with_speed(mut self, speed: f64) -> Self {
        self.speed = Some(speed);
        self
    }

    pub fn with_distance(mut self, distance: f64) -> Self {
        self.distance_traveled = Some(distance);
        self
    }

    /// Reject records that would poison the registry: an empty identity or a
    /// non-finite number in any present field.
    pub fn validate(&self) -> Result<()> {
        if self.id.as_str().trim().is_empty() {
            return Err(TrackerError::MalformedUpdate("empty identity".into()));
        }

        let numeric = [
            ("age", self.age),
            ("latitude", self.latitude),
            ("longitude", self.longitude),
            ("speed", self.speed),
            ("distance_traveled", self.distance_traveled),
        ];
        for (field, value) in numeric {
            if let Some(v) = value {
                if !v.is_finite() {
                    return Err(TrackerError::MalformedUpdate(format!(
                        "{}: non-finite {} ({})",
                        self.id, field, v
                    )));
                }
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_apply_overwrites_only_present_fields() {
        let mut entity = Entity::new(EntityId::new("a"));
        entity.apply(
            &EntityUpdate::new(EntityId::new("a"))
                .with_species("lion")
                .with_speed(12.0)
                .with_distance(3.0),
        );
        entity.apply(&EntityUpdate::new(EntityId::new("a")).with_speed(7.5));

        assert_eq!(entity.species, "lion");
        assert_eq!(entity.speed, 7.5);
        assert_eq!(entity.distance_traveled, 3.0);
        assert_eq!(entity.position, Position::default());
    }

    #[test]
    fn test_apply_single_axis() {
        let mut entity = Entity::new(EntityId::new("a"));
        entity.apply(&EntityUpdate::position(
            EntityId::new("a"),
            Position::new(-1.4, 35.0),
        ));
        let update = EntityUpdate {
            latitude: Some(-1.5),
            ..EntityUpdate::new(EntityId::new("a"))
        };
        entity.apply(&update);
        assert_eq!(entity.position, Position::new(-1.5, 35.0));
    }

    #[test]
    fn test_deserialize_store_record() {
        let json = r#"{
            "_id": "66a1f0",
            "species": "zebra",
            "age": 4,
            "latitude": -1.41,
            "longitude": 35.02,
            "speed": 8.5,
            "distance_traveled": 12.25,
            "__v": 0
        }"#;
        let update: EntityUpdate = serde_json::from_str(json).unwrap();
        assert_eq!(update.id, EntityId::new("66a1f0"));
        assert_eq!(update.species.as_deref(), Some("zebra"));
        assert_eq!(update.age, Some(4.0));
        assert_eq!(update.distance_traveled, Some(12.25));
    }

    #[test]
    fn test_deserialize_partial_record() {
        let update: EntityUpdate = serde_json::from_str(r#"{"id": "b", "speed": null}"#).unwrap();
        assert_eq!(update.id, EntityId::new("b"));
        assert_eq!(update.speed, None);
        assert_eq!(update.latitude, None);
    }

    #[test]
    fn test_deserialize_rejects_string_number() {
        let result: std::result::Result<EntityUpdate, _> =
            serde_json::from_str(r#"{"_id": "b", "speed": "fast"}"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_validate_rejects_nan() {
        let update = EntityUpdate::new(EntityId::new("a")).with_speed(f64::NAN);
        assert!(matches!(
            update.validate(),
            Err(TrackerError::MalformedUpdate(_))
        ));
    }

    #[test]
    fn test_validate_rejects_blank_identity() {
        let update = EntityUpdate::new(EntityId::new("  "));
        assert!(update.validate().is_err());
    }
}
