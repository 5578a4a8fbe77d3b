//! Demo publisher feeding a synthetic herd into a local publisher
//!
//! Used when no real publisher is configured. Each round advances every
//! animal by a short random walk and pushes the whole herd as one bulk
//! refresh; every few rounds a single animal is also pushed incrementally.

use std::time::Duration;

use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use crate::core::error::Result;
use crate::core::types::{EntityId, Position};
use crate::registry::EntityUpdate;
use crate::telemetry::task::TaskGuard;
use crate::telemetry::transport::LocalPublisher;

pub const SPECIES: [&str; 10] = [
    "lion",
    "elephant",
    "zebra",
    "giraffe",
    "gazelle",
    "cheetah",
    "buffalo",
    "hippo",
    "wildebeest",
    "leopard",
];

/// Centre of the Maasai Mara reserve
pub const MARA_CENTER: Position = Position {
    latitude: -1.406,
    longitude: 35.014,
};

/// Degrees of latitude per kilometre (approximately)
const DEG_PER_KM: f64 = 1.0 / 111.0;

pub struct DemoFeed {
    publisher: LocalPublisher,
    topic: String,
    herd: Vec<EntityUpdate>,
    rng: ChaCha8Rng,
    round: u64,
}

impl DemoFeed {
    pub fn new(publisher: LocalPublisher, topic: impl Into<String>, size: usize, seed: u64) -> Self {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let herd = (0..size)
            .map(|i| {
                let species = SPECIES.choose(&mut rng).copied().unwrap_or("zebra");
                let position = MARA_CENTER.offset(rng.gen_range(-0.1..0.1), rng.gen_range(-0.1..0.1));
                EntityUpdate::new(EntityId::new(format!("demo-{:03}", i)))
                    .with_species(species)
                    .with_age(rng.gen_range(1..20) as f64)
                    .with_position(position)
                    .with_speed(0.0)
                    .with_distance(0.0)
            })
            .collect();

        Self {
            publisher,
            topic: topic.into(),
            herd,
            rng,
            round: 0,
        }
    }

    pub fn herd(&self) -> &[EntityUpdate] {
        &self.herd
    }

    /// Advance every animal by `elapsed` worth of random walk
    pub fn step(&mut self, elapsed: Duration) {
        let hours = elapsed.as_secs_f64() / 3600.0;
        for animal in &mut self.herd {
            let speed_kmh: f64 = self.rng.gen_range(0.5..12.0);
            let km = speed_kmh * hours;
            let heading: f64 = self.rng.gen_range(0.0..std::f64::consts::TAU);

            if let (Some(lat), Some(lon)) = (animal.latitude, animal.longitude) {
                animal.latitude = Some(lat + km * heading.sin() * DEG_PER_KM);
                animal.longitude = Some(lon + km * heading.cos() * DEG_PER_KM);
            }
            animal.speed = Some(speed_kmh);
            animal.distance_traveled = Some(animal.distance_traveled.unwrap_or(0.0) + km);
        }
        self.round += 1;
    }

    /// Push the current herd; returns the number of sessions reached
    pub fn publish(&mut self) -> Result<usize> {
        let reached = self.publisher.publish(&self.topic, &self.herd)?;
        if self.round % 3 == 0 {
            if let Some(animal) = self.herd.choose(&mut self.rng) {
                self.publisher.publish(&self.topic, animal)?;
            }
        }
        Ok(reached)
    }

    /// Run rounds every `period` until the guard is dropped
    pub fn spawn(mut self, period: Duration) -> TaskGuard {
        TaskGuard::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            loop {
                ticker.tick().await;
                self.step(period);
                if let Err(e) = self.publish() {
                    tracing::warn!("Demo feed failed to publish: {}", e);
                }
            }
        })
    }
}
