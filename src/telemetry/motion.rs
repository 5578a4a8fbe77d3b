//! Simulated motion - periodic positional jitter
//!
//! A purely visual effect: while the blinking option is on and playback is
//! running, every entity is nudged by a small uniform offset on each axis once
//! per period. Speed and distance are never touched; those only come from the
//! stream.

use std::time::Duration;

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use tokio::time::{interval_at, Instant, MissedTickBehavior};

use crate::core::config::TrackerConfig;
use crate::registry::{EntityUpdate, RegistrySnapshot};
use crate::telemetry::playback::Producer;
use crate::telemetry::task::TaskGuard;
use crate::telemetry::{Inbound, InboundSender};

pub struct MotionSimulator {
    period: Duration,
    jitter_deg: f64,
    rng: ChaCha8Rng,
    inbox: InboundSender,
    /// Permitted by playback
    armed: bool,
    /// Blinking visual option
    active: bool,
    epoch: u64,
    timer: Option<TaskGuard>,
}

impl MotionSimulator {
    /// Starts armed (playback begins in `Playing`) but inactive
    pub fn new(config: &TrackerConfig, inbox: InboundSender) -> Self {
        let seed = config.seed.unwrap_or_else(rand::random);
        Self {
            period: config.motion_period(),
            jitter_deg: config.motion_jitter_deg,
            rng: ChaCha8Rng::seed_from_u64(seed),
            inbox,
            armed: true,
            active: false,
            epoch: 0,
            timer: None,
        }
    }

    pub fn arm(&mut self) -> bool {
        if self.armed {
            return false;
        }
        self.armed = true;
        self.sync_timer();
        true
    }

    pub fn disarm(&mut self) -> bool {
        if !self.armed {
            return false;
        }
        self.armed = false;
        self.sync_timer();
        true
    }

    /// Follow the blinking option
    pub fn set_active(&mut self, active: bool) {
        if self.active != active {
            self.active = active;
            self.sync_timer();
        }
    }

    pub fn is_armed(&self) -> bool {
        self.armed
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    /// True while a timer task is held
    pub fn is_running(&self) -> bool {
        self.timer.is_some()
    }

    /// Whether a tick from `epoch` may still be applied
    pub fn accepts(&self, epoch: u64) -> bool {
        self.timer.is_some() && epoch == self.epoch
    }

    // The timer exists exactly while armed and active
    fn sync_timer(&mut self) {
        let wanted = self.armed && self.active;
        if wanted && self.timer.is_none() {
            self.epoch += 1;
            self.timer = Some(TaskGuard::spawn(run_timer(
                self.period,
                self.epoch,
                self.inbox.clone(),
            )));
            tracing::debug!("Motion timer started (epoch {})", self.epoch);
        } else if !wanted && self.timer.is_some() {
            self.timer = None;
            self.epoch += 1;
            tracing::debug!("Motion timer released");
        }
    }

    /// One position-only update per entity in `snapshot`, each axis offset
    /// uniformly within `±jitter_deg`
    pub fn perturb(&mut self, snapshot: &RegistrySnapshot) -> Vec<EntityUpdate> {
        let range = -self.jitter_deg..=self.jitter_deg;
        snapshot
            .iter()
            .map(|entity| {
                let d_lat = self.rng.gen_range(range.clone());
                let d_lon = self.rng.gen_range(range.clone());
                EntityUpdate::position(entity.id.clone(), entity.position.offset(d_lat, d_lon))
            })
            .collect()
    }
}

impl Producer for MotionSimulator {
    fn enable(&mut self) -> bool {
        self.arm()
    }

    fn disable(&mut self) -> bool {
        self.disarm()
    }
}

async fn run_timer(period: Duration, epoch: u64, inbox: InboundSender) {
    let mut ticker = interval_at(Instant::now() + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    loop {
        ticker.tick().await;
        if inbox.send(Inbound::MotionTick { epoch }).is_err() {
            break;
        }
    }
}
