use super::{Detector, Levels, Trigger, TriggerKind};
use crate::config::DetectorConfig;
use crate::debug;
use crate::output::fmt_db;
use crate::states::CounterState;

/// Counts seconds where the peak moved less than the threshold since the
/// previous tick, i.e. a stuck or flat signal. Reverse mode counts movement
/// instead but still reports it as no dynamic.
pub struct NoDynamicDetector {
    threshold: f32,
    period: u32,
    reverse: bool,
    state: CounterState,
}

impl NoDynamicDetector {
    pub fn new(config: &DetectorConfig) -> Self {
        Self {
            threshold: config.nodynamic_threshold,
            period: config.nodynamic_period,
            reverse: config.reverse,
            state: CounterState::default(),
        }
    }
}

impl Detector for NoDynamicDetector {
    fn observe(&mut self, levels: &Levels) -> Option<Trigger> {
        let delta = levels.delta();
        let flat = delta < self.threshold;
        let count = self.state.update(flat != self.reverse);

        match count {
            0 => debug!("delta: {} (dynamic)", fmt_db(delta)),
            n => debug!("delta: {} ({} seconds of no dynamic)", fmt_db(delta), n),
        }

        if count < self.period {
            return None;
        }
        self.state.reset();
        Some(Trigger {
            kind: TriggerKind::NoDynamic,
            levels: *levels,
            seconds: count,
        })
    }

    fn count(&self) -> u32 {
        self.state.count
    }
}
