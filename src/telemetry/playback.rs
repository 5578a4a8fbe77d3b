//! Play/pause gate over the registry's producers

use serde::Serialize;

use crate::telemetry::channel::StreamChannel;

/// A producer that playback can switch on and off.
///
/// Both calls are idempotent and return whether anything changed.
pub trait Producer {
    fn enable(&mut self) -> bool;
    fn disable(&mut self) -> bool;
}

impl Producer for StreamChannel {
    fn enable(&mut self) -> bool {
        self.reconnect()
    }

    fn disable(&mut self) -> bool {
        self.disconnect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum PlaybackState {
    #[default]
    Playing,
    Paused,
}

/// Two-state machine. Transitions dispatch synchronously to the producers;
/// the registry is never snapshotted or rolled back.
#[derive(Debug, Default)]
pub struct PlaybackController {
    state: PlaybackState,
}

impl PlaybackController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> PlaybackState {
        self.state
    }

    pub fn is_playing(&self) -> bool {
        self.state == PlaybackState::Playing
    }

    /// Disconnect the stream and disarm the simulator. No-op when paused.
    pub fn pause(&mut self, stream: &mut impl Producer, motion: &mut impl Producer) -> bool {
        if self.state == PlaybackState::Paused {
            return false;
        }
        stream.disable();
        motion.disable();
        self.state = PlaybackState::Paused;
        tracing::info!("Playback paused");
        true
    }

    /// Reconnect the stream and rearm the simulator. No-op when playing.
    pub fn resume(&mut self, stream: &mut impl Producer, motion: &mut impl Producer) -> bool {
        if self.state == PlaybackState::Playing {
            return false;
        }
        stream.enable();
        motion.enable();
        self.state = PlaybackState::Playing;
        tracing::info!("Playback resumed");
        true
    }

    /// Single-button behaviour: pause when playing, resume when paused
    pub fn toggle(
        &mut self,
        stream: &mut impl Producer,
        motion: &mut impl Producer,
    ) -> PlaybackState {
        match self.state {
            PlaybackState::Playing => self.pause(stream, motion),
            PlaybackState::Paused => self.resume(stream, motion),
        };
        self.state
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Recorder {
        on: bool,
        calls: Vec<&'static str>,
    }

    impl Producer for Recorder {
        fn enable(&mut self) -> bool {
            self.calls.push("enable");
            !std::mem::replace(&mut self.on, true)
        }

        fn disable(&mut self) -> bool {
            self.calls.push("disable");
            std::mem::replace(&mut self.on, false)
        }
    }

    #[test]
    fn test_starts_playing() {
        assert_eq!(PlaybackController::new().state(), PlaybackState::Playing);
    }

    #[test]
    fn test_pause_and_resume_dispatch_to_both_producers() {
        let mut playback = PlaybackController::new();
        let mut stream = Recorder { on: true, ..Default::default() };
        let mut motion = Recorder { on: true, ..Default::default() };

        assert!(playback.pause(&mut stream, &mut motion));
        assert!(!stream.on && !motion.on);
        assert_eq!(playback.state(), PlaybackState::Paused);

        assert!(playback.resume(&mut stream, &mut motion));
        assert!(stream.on && motion.on);
        assert_eq!(stream.calls, vec!["disable", "enable"]);
        assert_eq!(motion.calls, vec!["disable", "enable"]);
    }

    #[test]
    fn test_reentrant_calls_are_noops() {
        let mut playback = PlaybackController::new();
        let mut stream = Recorder::default();
        let mut motion = Recorder::default();

        assert!(!playback.resume(&mut stream, &mut motion));
        assert!(stream.calls.is_empty());

        playback.pause(&mut stream, &mut motion);
        assert!(!playback.pause(&mut stream, &mut motion));
        assert_eq!(stream.calls.len(), 1);
    }

    #[test]
    fn test_toggle_alternates() {
        let mut playback = PlaybackController::new();
        let mut stream = Recorder::default();
        let mut motion = Recorder::default();

        assert_eq!(playback.toggle(&mut stream, &mut motion), PlaybackState::Paused);
        assert_eq!(playback.toggle(&mut stream, &mut motion), PlaybackState::Playing);
    }
}
