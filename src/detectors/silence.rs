use super::{Detector, Levels, Trigger, TriggerKind};
use crate::config::DetectorConfig;
use crate::debug;
use crate::output::fmt_db;
use crate::states::CounterState;

/// Counts seconds with the peak below the silence threshold
/// (or at/above it in reverse mode).
pub struct SilenceDetector {
    threshold: f32,
    period: u32,
    reverse: bool,
    state: CounterState,
}

impl SilenceDetector {
    pub fn new(config: &DetectorConfig) -> Self {
        Self {
            threshold: config.silence_threshold,
            period: config.silence_period,
            reverse: config.reverse,
            state: CounterState::default(),
        }
    }
}

impl Detector for SilenceDetector {
    fn observe(&mut self, levels: &Levels) -> Option<Trigger> {
        let quiet = levels.current < self.threshold;
        let count = self.state.update(quiet != self.reverse);

        match (self.reverse, count) {
            (false, 0) => debug!("peak: {} (not silent)", fmt_db(levels.current)),
            (false, n) => debug!("peak: {} ({} seconds of silence)", fmt_db(levels.current), n),
            (true, 0) => debug!("peak: {} (not noisy)", fmt_db(levels.current)),
            (true, n) => debug!("peak: {} ({} seconds of noise)", fmt_db(levels.current), n),
        }

        if count < self.period {
            return None;
        }
        self.state.reset();
        Some(Trigger {
            kind: if self.reverse {
                TriggerKind::Noisy
            } else {
                TriggerKind::Silence
            },
            levels: *levels,
            seconds: count,
        })
    }

    fn count(&self) -> u32 {
        self.state.count
    }
}
