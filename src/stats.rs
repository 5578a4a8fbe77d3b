//! Rolling statistics over a set of entities
//!
//! Stateless: callers recompute after every change to the filtered set or its
//! members. Entity counts are expected in the tens, so no caching is done.

use serde::{Deserialize, Serialize};

use crate::registry::Entity;

/// Derived totals for the currently filtered entities
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatisticsSnapshot {
    pub total_distance: f64,
    pub average_speed: f64,
    pub total_animals: usize,
}

/// Sum distance, average speed and count over `entities`.
///
/// An empty set yields zeros rather than a NaN average so the statistic is
/// always renderable.
pub fn aggregate<'a, I>(entities: I) -> StatisticsSnapshot
where
    I: IntoIterator<Item = &'a Entity>,
{
    let mut total_distance = 0.0;
    let mut speed_sum = 0.0;
    let mut total_animals = 0usize;

    for entity in entities {
        total_distance += entity.distance_traveled;
        speed_sum += entity.speed;
        total_animals += 1;
    }

    let average_speed = if total_animals == 0 {
        0.0
    } else {
        speed_sum / total_animals as f64
    };

    StatisticsSnapshot {
        total_distance,
        average_speed,
        total_animals,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::EntityId;

    fn entity(id: &str, distance: f64, speed: f64) -> Entity {
        let mut e = Entity::new(EntityId::new(id));
        e.distance_traveled = distance;
        e.speed = speed;
        e
    }

    #[test]
    fn test_empty_set_is_all_zero() {
        let stats = aggregate(std::iter::empty());
        assert_eq!(
            stats,
            StatisticsSnapshot {
                total_distance: 0.0,
                average_speed: 0.0,
                total_animals: 0
            }
        );
        assert!(!stats.average_speed.is_nan());
    }

    #[test]
    fn test_single_entity() {
        let e = entity("e", 12.5, 4.0);
        let stats = aggregate([&e]);
        assert_eq!(stats.total_distance, 12.5);
        assert_eq!(stats.average_speed, 4.0);
        assert_eq!(stats.total_animals, 1);
    }

    #[test]
    fn test_three_entities() {
        let all = vec![
            entity("A", 10.0, 5.0),
            entity("B", 20.0, 10.0),
            entity("C", 30.0, 15.0),
        ];
        let stats = aggregate(&all);
        assert_eq!(stats.total_distance, 60.0);
        assert_eq!(stats.average_speed, 10.0);
        assert_eq!(stats.total_animals, 3);
    }

    #[test]
    fn test_serializes_camel_case() {
        let json = serde_json::to_value(StatisticsSnapshot::default()).unwrap();
        assert!(json.get("totalDistance").is_some());
        assert!(json.get("averageSpeed").is_some());
        assert!(json.get("totalAnimals").is_some());
    }
}
