use serde::Serialize;
use serde_json::to_string;

use crate::detectors::{Trigger, TriggerKind};

#[derive(Debug, Serialize)]
pub struct DetectionEvent<'a> {
    pub kind: TriggerKind,
    pub client: &'a str,
    pub tick: u64,
    #[serde(rename = "levelDb")]
    pub level_db: f32,
    #[serde(rename = "deltaDb")]
    pub delta_db: f32,
    pub seconds: u32,
}

impl<'a> DetectionEvent<'a> {
    pub fn new(client: &'a str, tick: u64, trigger: &Trigger) -> Self {
        Self {
            kind: trigger.kind,
            client,
            tick,
            level_db: trigger.levels.current,
            delta_db: trigger.levels.delta(),
            seconds: trigger.seconds,
        }
    }
}

/// One event as a single JSON line.
pub fn event_line(event: &DetectionEvent) -> Result<String, serde_json::Error> {
    to_string(event)
}
