//! Property tests for registry replay and selection paths

use std::collections::HashMap;

use proptest::prelude::*;

use mara_tracker::core::types::{EntityId, Position};
use mara_tracker::registry::{EntityUpdate, Registry};
use mara_tracker::selection::SelectionTracker;
use mara_tracker::stats::aggregate;

fn update_strategy() -> impl Strategy<Value = EntityUpdate> {
    (
        0u8..5,
        proptest::option::of(prop_oneof![Just("lion"), Just("zebra"), Just("hippo")]),
        proptest::option::of(0.0..30.0f64),
        proptest::option::of(-2.0..0.0f64),
        proptest::option::of(34.0..36.0f64),
        proptest::option::of(0.0..80.0f64),
        proptest::option::of(0.0..500.0f64),
    )
        .prop_map(|(id, species, age, lat, lon, speed, distance)| EntityUpdate {
            id: EntityId::new(format!("animal-{}", id)),
            species: species.map(str::to_string),
            age,
            latitude: lat,
            longitude: lon,
            speed,
            distance_traveled: distance,
        })
}

/// Expected field values per identity, kept by plain last-write replay
#[derive(Debug, Default, Clone)]
struct Model {
    species: String,
    age: f64,
    latitude: f64,
    longitude: f64,
    speed: f64,
    distance: f64,
}

proptest! {
    #[test]
    fn prop_replay_keeps_last_written_fields(updates in prop::collection::vec(update_strategy(), 0..60)) {
        let mut registry = Registry::new();
        let mut model: HashMap<EntityId, Model> = HashMap::new();

        for update in &updates {
            registry.upsert(update).unwrap();

            let entry = model.entry(update.id.clone()).or_default();
            if let Some(s) = &update.species { entry.species = s.clone(); }
            if let Some(v) = update.age { entry.age = v; }
            if let Some(v) = update.latitude { entry.latitude = v; }
            if let Some(v) = update.longitude { entry.longitude = v; }
            if let Some(v) = update.speed { entry.speed = v; }
            if let Some(v) = update.distance_traveled { entry.distance = v; }
        }

        prop_assert_eq!(registry.len(), model.len());
        for (id, expected) in &model {
            let entity = registry.get(id).unwrap();
            prop_assert_eq!(&entity.id, id);
            prop_assert_eq!(&entity.species, &expected.species);
            prop_assert_eq!(entity.age, expected.age);
            prop_assert_eq!(entity.position, Position::new(expected.latitude, expected.longitude));
            prop_assert_eq!(entity.speed, expected.speed);
            prop_assert_eq!(entity.distance_traveled, expected.distance);
        }

        let stats = aggregate(registry.snapshot().iter());
        prop_assert_eq!(stats.total_animals, model.len());
        prop_assert!(stats.average_speed.is_finite());
    }

    #[test]
    fn prop_selected_path_grows_by_one_per_change(updates in prop::collection::vec(update_strategy(), 1..40)) {
        let mut registry = Registry::new();
        let mut changes = registry.subscribe();
        let mut tracker = SelectionTracker::new();
        let watched = EntityId::new("animal-0");

        registry.upsert(&EntityUpdate::new(watched.clone())).unwrap();
        while changes.try_recv().is_ok() {}
        tracker.toggle(&watched, &registry);

        let mut expected = 1usize;
        for update in &updates {
            registry.upsert(update).unwrap();
            while let Ok(change) = changes.try_recv() {
                tracker.on_registry_change(&change, &registry);
            }
            if update.id == watched {
                expected += 1;
            }
            prop_assert_eq!(tracker.path(&watched).unwrap().len(), expected);
        }
    }
}
