use serde::Serialize;

use crate::config::DetectorConfig;

pub mod nodynamic;
pub mod silence;

/// Which condition tripped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum TriggerKind {
    Silence,
    /// Reverse-mode silence detector: the signal stayed above the threshold.
    Noisy,
    /// Also raised by the reverse-mode no-dynamic detector, which counts
    /// movement instead of flatness.
    NoDynamic,
}

impl TriggerKind {
    pub fn label(&self) -> &'static str {
        match self {
            TriggerKind::Silence => "SILENCE",
            TriggerKind::Noisy => "NOISY",
            TriggerKind::NoDynamic => "NO DYNAMIC",
        }
    }
}

/// Peak levels of the previous and the current tick, in dB.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Levels {
    pub last: f32,
    pub current: f32,
}

impl Levels {
    pub fn delta(&self) -> f32 {
        (self.last - self.current).abs()
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Trigger {
    pub kind: TriggerKind,
    pub levels: Levels,
    /// Length of the run that tripped the detector.
    pub seconds: u32,
}

pub trait Detector {
    /// Feed one measured tick; returns a trigger when the required period is reached.
    fn observe(&mut self, levels: &Levels) -> Option<Trigger>;
    fn count(&self) -> u32;
}

/// Build the enabled detectors, silence first. A zero threshold leaves a detector out.
pub fn from_config(config: &DetectorConfig) -> Vec<Box<dyn Detector>> {
    let mut detectors: Vec<Box<dyn Detector>> = Vec::new();
    if config.silence_enabled() {
        detectors.push(Box::new(silence::SilenceDetector::new(config)));
    }
    if config.nodynamic_enabled() {
        detectors.push(Box::new(nodynamic::NoDynamicDetector::new(config)));
    }
    detectors
}
