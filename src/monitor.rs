//! The once-a-second detection loop.
//!
//! Each tick drains the peak sampler, converts it to decibels and feeds both
//! detectors. A trip runs the configured action and starts the grace period,
//! during which nothing is measured at all.

use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::Duration;

use crate::action::{ActionOutcome, ActionRunner};
use crate::config::DetectorConfig;
use crate::detectors::{self, Detector, Levels, Trigger};
use crate::json::{DetectionEvent, event_line};
use crate::output::Output;
use crate::peak::{PeakSampler, lin_to_db};
use crate::states::MonitorState;
use crate::{cli::DEFAULT_CLIENT_NAME, debug, error, output};

pub const TICK: Duration = Duration::from_secs(1);

/// Connection status reported by the audio layer.
pub trait AudioInput {
    /// Whether anything is feeding the input right now. Asked at most once per tick.
    fn is_connected(&self) -> bool;
}

#[derive(Debug, Clone, PartialEq)]
pub enum TickOutcome {
    Grace { remaining: u32 },
    Disconnected,
    Measured { levels: Levels, triggers: Vec<Trigger> },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    /// The audio layer asked us to stop.
    Shutdown,
    /// The action was the exit sentinel.
    ActionExit,
}

pub struct Monitor {
    config: DetectorConfig,
    detectors: Vec<Box<dyn Detector>>,
    state: MonitorState,
    client_name: String,
    json: bool,
}

impl Monitor {
    pub fn new(config: DetectorConfig) -> Self {
        Self {
            detectors: detectors::from_config(&config),
            config,
            state: MonitorState::new(),
            client_name: DEFAULT_CLIENT_NAME.to_string(),
            json: false,
        }
    }

    pub fn with_client_name(mut self, name: impl Into<String>) -> Self {
        self.client_name = name.into();
        self
    }

    pub fn with_json(mut self, json: bool) -> Self {
        self.json = json;
        self
    }

    pub fn grace_remaining(&self) -> u32 {
        self.state.grace_remaining
    }

    /// Current run lengths of the enabled detectors, silence first.
    pub fn counts(&self) -> Vec<u32> {
        self.detectors.iter().map(|d| d.count()).collect()
    }

    /// One pass of the detection state machine, without sleeping or firing.
    pub fn tick<I>(&mut self, input: &I, sampler: &PeakSampler) -> TickOutcome
    where
        I: AudioInput + ?Sized,
    {
        self.state.tick += 1;

        if self.state.grace_remaining > 0 {
            self.state.grace_remaining -= 1;
            debug!(
                "{} seconds left in grace period.",
                self.state.grace_remaining
            );
            return TickOutcome::Grace {
                remaining: self.state.grace_remaining,
            };
        }

        if !input.is_connected() {
            debug!("Input port isn't connected to anything.");
            return TickOutcome::Disconnected;
        }

        let levels = &mut self.state.levels;
        levels.last = levels.current;
        levels.current = lin_to_db(sampler.read_and_reset());
        let levels = *levels;

        let triggers: Vec<Trigger> = self
            .detectors
            .iter_mut()
            .filter_map(|detector| detector.observe(&levels))
            .collect();
        if !triggers.is_empty() {
            self.state.grace_remaining = self.config.grace_period;
        }

        TickOutcome::Measured { levels, triggers }
    }

    /// Tick every `period` until `running` is cleared or an action asks to exit.
    ///
    /// Actions run on this thread, so a slow command delays the next tick.
    pub fn run<I, A>(
        &mut self,
        input: &I,
        sampler: &PeakSampler,
        running: &AtomicBool,
        actions: &mut A,
        output: &Output,
        period: Duration,
    ) -> RunOutcome
    where
        I: AudioInput + ?Sized,
        A: ActionRunner + ?Sized,
    {
        while running.load(Ordering::Acquire) {
            thread::sleep(period);
            if !running.load(Ordering::Acquire) {
                break;
            }

            let TickOutcome::Measured { levels, triggers } = self.tick(input, sampler) else {
                continue;
            };
            output.level(levels.current);

            // Both detectors may trip together; the action then runs twice.
            for trigger in &triggers {
                self.announce(trigger);
                match actions.fire(trigger.kind) {
                    Ok(ActionOutcome::Continue) => {}
                    Ok(ActionOutcome::Exit) => return RunOutcome::ActionExit,
                    Err(err) => error!("Action failed: {}", err),
                }
            }
        }

        RunOutcome::Shutdown
    }

    fn announce(&self, trigger: &Trigger) {
        if !self.json {
            output!("**{}**", trigger.kind.label());
            return;
        }
        let event = DetectionEvent::new(&self.client_name, self.state.tick, trigger);
        match event_line(&event) {
            Ok(line) => output!("{}", line),
            Err(err) => error!("Could not encode event: {}", err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::detectors::TriggerKind;
    use crate::error::ActionError;
    use std::cell::Cell;

    const SILENT: [f32; 4] = [0.001, -0.002, 0.0, 0.001];
    const LOUD: [f32; 4] = [0.2, -0.5, 0.4, 0.1];

    struct FakeInput {
        connected: Cell<bool>,
    }

    impl FakeInput {
        fn connected() -> Self {
            Self {
                connected: Cell::new(true),
            }
        }
    }

    impl AudioInput for FakeInput {
        fn is_connected(&self) -> bool {
            self.connected.get()
        }
    }

    #[derive(Default)]
    struct RecordingRunner {
        fired: Vec<TriggerKind>,
        outcome: Option<ActionOutcome>,
        stop_after: Option<(usize, &'static AtomicBool)>,
    }

    impl ActionRunner for RecordingRunner {
        fn fire(&mut self, kind: TriggerKind) -> Result<ActionOutcome, ActionError> {
            self.fired.push(kind);
            if let Some((limit, running)) = self.stop_after {
                if self.fired.len() >= limit {
                    running.store(false, Ordering::Release);
                }
            }
            Ok(self.outcome.unwrap_or(ActionOutcome::Continue))
        }
    }

    fn silence_config(period: u32, grace: u32) -> DetectorConfig {
        DetectorConfig {
            silence_threshold: -40.0,
            silence_period: period,
            grace_period: grace,
            ..DetectorConfig::default()
        }
    }

    fn feed(monitor: &mut Monitor, input: &FakeInput, buffer: &[f32]) -> TickOutcome {
        let sampler = PeakSampler::new();
        sampler.on_audio_buffer(buffer);
        monitor.tick(input, &sampler)
    }

    fn fired(outcome: &TickOutcome) -> Vec<TriggerKind> {
        match outcome {
            TickOutcome::Measured { triggers, .. } => triggers.iter().map(|t| t.kind).collect(),
            _ => Vec::new(),
        }
    }

    fn quiet_output() -> Output {
        let args = crate::cli::Cli {
            quiet: true,
            ..<crate::cli::Cli as clap::Parser>::parse_from(["silentjack"])
        };
        Output::new(&Config::try_from(&args).unwrap())
    }

    #[test]
    fn silence_fires_on_third_consecutive_tick() {
        let input = FakeInput::connected();
        let mut monitor = Monitor::new(silence_config(3, 0));
        assert!(fired(&feed(&mut monitor, &input, &SILENT)).is_empty());
        assert!(fired(&feed(&mut monitor, &input, &SILENT)).is_empty());
        assert_eq!(
            fired(&feed(&mut monitor, &input, &SILENT)),
            vec![TriggerKind::Silence]
        );
        assert_eq!(monitor.counts(), vec![0]);
    }

    #[test]
    fn loud_tick_restarts_the_count() {
        let input = FakeInput::connected();
        let mut monitor = Monitor::new(silence_config(3, 0));
        let pattern = [SILENT, SILENT, LOUD, SILENT, SILENT, SILENT];
        let fired_on: Vec<usize> = pattern
            .iter()
            .enumerate()
            .filter(|(_, buffer)| !fired(&feed(&mut monitor, &input, &buffer[..])).is_empty())
            .map(|(i, _)| i + 1)
            .collect();
        assert_eq!(fired_on, vec![6]);
    }

    #[test]
    fn disconnect_freezes_counters() {
        let input = FakeInput::connected();
        let mut monitor = Monitor::new(silence_config(3, 0));
        feed(&mut monitor, &input, &SILENT);
        feed(&mut monitor, &input, &SILENT);
        assert_eq!(monitor.counts(), vec![2]);

        input.connected.set(false);
        for _ in 0..5 {
            assert_eq!(
                feed(&mut monitor, &input, &LOUD),
                TickOutcome::Disconnected
            );
        }
        assert_eq!(monitor.counts(), vec![2]);

        input.connected.set(true);
        assert_eq!(
            fired(&feed(&mut monitor, &input, &SILENT)),
            vec![TriggerKind::Silence]
        );
    }

    #[test]
    fn grace_suppresses_exactly_grace_ticks() {
        let input = FakeInput::connected();
        let mut monitor = Monitor::new(silence_config(1, 2));
        assert_eq!(
            fired(&feed(&mut monitor, &input, &SILENT)),
            vec![TriggerKind::Silence]
        );
        assert_eq!(monitor.grace_remaining(), 2);
        assert_eq!(
            feed(&mut monitor, &input, &SILENT),
            TickOutcome::Grace { remaining: 1 }
        );
        assert_eq!(
            feed(&mut monitor, &input, &SILENT),
            TickOutcome::Grace { remaining: 0 }
        );
        assert_eq!(
            fired(&feed(&mut monitor, &input, &SILENT)),
            vec![TriggerKind::Silence]
        );
    }

    #[test]
    fn grace_applies_to_both_detectors() {
        let input = FakeInput::connected();
        let mut monitor = Monitor::new(DetectorConfig {
            silence_threshold: -40.0,
            silence_period: 1,
            nodynamic_threshold: 3.0,
            nodynamic_period: 2,
            grace_period: 1,
            reverse: false,
        });
        // first tick: silence trips, no-dynamic sees a 60 dB jump from 0 dB
        assert_eq!(
            fired(&feed(&mut monitor, &input, &SILENT)),
            vec![TriggerKind::Silence]
        );
        assert_eq!(monitor.counts(), vec![0, 0]);
        assert!(matches!(
            feed(&mut monitor, &input, &SILENT),
            TickOutcome::Grace { remaining: 0 }
        ));
        assert_eq!(monitor.counts(), vec![0, 0]);
    }

    #[test]
    fn zero_threshold_disables_detector() {
        let input = FakeInput::connected();
        let mut monitor = Monitor::new(DetectorConfig {
            silence_threshold: 0.0,
            silence_period: 1,
            nodynamic_threshold: 0.0,
            ..DetectorConfig::default()
        });
        for buffer in [SILENT, SILENT, LOUD, [0.0; 4]] {
            assert!(fired(&feed(&mut monitor, &input, &buffer)).is_empty());
        }
        assert!(monitor.counts().is_empty());
    }

    #[test]
    fn both_detectors_can_trip_in_one_tick() {
        let input = FakeInput::connected();
        let mut monitor = Monitor::new(DetectorConfig {
            silence_threshold: -40.0,
            silence_period: 2,
            nodynamic_threshold: 1.0,
            nodynamic_period: 1,
            grace_period: 0,
            reverse: false,
        });
        // 0 dB -> -54 dB is a big move, so only silence counts
        assert!(fired(&feed(&mut monitor, &input, &SILENT)).is_empty());
        assert_eq!(
            fired(&feed(&mut monitor, &input, &SILENT)),
            vec![TriggerKind::Silence, TriggerKind::NoDynamic]
        );
    }

    #[test]
    fn run_fires_action_for_each_trigger() {
        static RUNNING: AtomicBool = AtomicBool::new(true);
        let input = FakeInput::connected();
        let sampler = PeakSampler::new();
        let mut monitor = Monitor::new(DetectorConfig {
            silence_threshold: -40.0,
            silence_period: 1,
            nodynamic_threshold: 1.0,
            nodynamic_period: 1,
            grace_period: 0,
            reverse: false,
        });
        let mut runner = RecordingRunner {
            stop_after: Some((3, &RUNNING)),
            ..RecordingRunner::default()
        };

        let outcome = monitor.run(
            &input,
            &sampler,
            &RUNNING,
            &mut runner,
            &quiet_output(),
            Duration::ZERO,
        );

        assert_eq!(outcome, RunOutcome::Shutdown);
        // tick 1: only silence (0 dB -> floor); tick 2: both
        assert_eq!(
            runner.fired,
            vec![
                TriggerKind::Silence,
                TriggerKind::Silence,
                TriggerKind::NoDynamic
            ]
        );
    }

    #[test]
    fn exit_action_stops_the_loop() {
        let running = AtomicBool::new(true);
        let input = FakeInput::connected();
        let sampler = PeakSampler::new();
        let mut monitor = Monitor::new(silence_config(2, 0));
        let mut runner = RecordingRunner {
            outcome: Some(ActionOutcome::Exit),
            ..RecordingRunner::default()
        };

        let outcome = monitor.run(
            &input,
            &sampler,
            &running,
            &mut runner,
            &quiet_output(),
            Duration::ZERO,
        );

        assert_eq!(outcome, RunOutcome::ActionExit);
        assert_eq!(runner.fired, vec![TriggerKind::Silence]);
        assert!(running.load(Ordering::Acquire));
    }

    #[test]
    fn cleared_flag_stops_without_ticking() {
        let running = AtomicBool::new(false);
        let input = FakeInput::connected();
        let sampler = PeakSampler::new();
        let mut monitor = Monitor::new(silence_config(1, 0));
        let mut runner = RecordingRunner::default();

        let outcome = monitor.run(
            &input,
            &sampler,
            &running,
            &mut runner,
            &quiet_output(),
            Duration::ZERO,
        );

        assert_eq!(outcome, RunOutcome::Shutdown);
        assert!(runner.fired.is_empty());
    }
}
