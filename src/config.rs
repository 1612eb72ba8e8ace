use std::path::PathBuf;

use crate::action::Action;
use crate::cli::Cli;
use crate::error::ConfigError;

/// Eight inputs should be enough, even for a 7.1 card.
pub const MAX_CONNECTIONS: usize = 8;

/// Thresholds and periods for both detectors. Fixed for the process lifetime.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DetectorConfig {
    pub silence_threshold: f32,
    pub silence_period: u32,
    pub nodynamic_threshold: f32,
    pub nodynamic_period: u32,
    pub grace_period: u32,
    pub reverse: bool,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            silence_threshold: -40.0,
            silence_period: 1,
            nodynamic_threshold: 0.0,
            nodynamic_period: 10,
            grace_period: 0,
            reverse: false,
        }
    }
}

impl DetectorConfig {
    pub fn silence_enabled(&self) -> bool {
        self.silence_threshold != 0.0
    }

    pub fn nodynamic_enabled(&self) -> bool {
        self.nodynamic_threshold != 0.0
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum InputSource {
    /// Live capture; an empty list means the system default input.
    Live { connect: Vec<String> },
    Replay { path: PathBuf },
}

/// Everything the entry point needs, validated from the command line.
#[derive(Debug, Clone)]
pub struct Config {
    pub client_name: String,
    pub detector: DetectorConfig,
    pub input: InputSource,
    pub action: Action,
    pub quiet: bool,
    pub verbose: bool,
    pub json: bool,
    pub meter: bool,
}

impl TryFrom<&Cli> for Config {
    type Error = ConfigError;

    fn try_from(args: &Cli) -> Result<Self, Self::Error> {
        if args.quiet && args.verbose {
            return Err(ConfigError::QuietAndVerbose);
        }

        let detector = DetectorConfig {
            silence_threshold: args.level,
            silence_period: args.period,
            nodynamic_threshold: args.dynamic,
            nodynamic_period: args.dynamic_period,
            grace_period: args.grace,
            reverse: args.reverse,
        };
        validate_detector("silence", detector.silence_threshold, detector.silence_period)?;
        validate_detector(
            "no-dynamic",
            detector.nodynamic_threshold,
            detector.nodynamic_period,
        )?;

        if args.connect.len() > MAX_CONNECTIONS {
            return Err(ConfigError::TooManyConnections {
                count: args.connect.len(),
                max: MAX_CONNECTIONS,
            });
        }

        let input = match &args.replay {
            Some(path) => InputSource::Replay {
                path: PathBuf::from(path),
            },
            None => InputSource::Live {
                connect: args.connect.clone(),
            },
        };

        Ok(Self {
            client_name: args.name.clone(),
            detector,
            input,
            action: Action::from_args(&args.command),
            quiet: args.quiet,
            verbose: args.verbose,
            json: args.json,
            meter: args.meter && !args.quiet,
        })
    }
}

fn validate_detector(name: &'static str, threshold: f32, period: u32) -> Result<(), ConfigError> {
    if !threshold.is_finite() {
        return Err(ConfigError::NonFiniteThreshold {
            name,
            value: threshold,
        });
    }
    // A disabled detector never compares against its period.
    if threshold != 0.0 && period == 0 {
        return Err(ConfigError::ZeroPeriod { name });
    }
    Ok(())
}
