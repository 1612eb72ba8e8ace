use crate::detectors::Levels;

/// Consecutive seconds a detector's condition has held.
#[derive(Debug, Clone, Default)]
pub struct CounterState {
    pub count: u32,
}

impl CounterState {
    /// Count a qualifying tick, or start over on a non-qualifying one.
    pub fn update(&mut self, condition: bool) -> u32 {
        if condition {
            self.count = self.count.saturating_add(1);
        } else {
            self.count = 0;
        }
        self.count
    }

    pub fn reset(&mut self) {
        self.count = 0;
    }
}

/// Loop-wide state shared by both detectors.
#[derive(Debug, Clone)]
pub struct MonitorState {
    pub grace_remaining: u32,
    pub levels: Levels,
    pub tick: u64,
}

impl MonitorState {
    pub fn new() -> Self {
        Self {
            grace_remaining: 0,
            levels: Levels {
                last: 0.0,
                current: 0.0,
            },
            tick: 0,
        }
    }
}
