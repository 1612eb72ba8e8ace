use std::sync::OnceLock;
use std::sync::atomic::{AtomicBool, Ordering};

use indicatif::{ProgressBar, ProgressStyle};

use crate::config::Config;
use crate::peak::DB_FLOOR;

static QUIET: AtomicBool = AtomicBool::new(false);
static VERBOSE: AtomicBool = AtomicBool::new(false);
static METER: OnceLock<ProgressBar> = OnceLock::new();

/// Normal operator messages; silenced by `--quiet`.
#[macro_export]
macro_rules! output {
    ($($arg:tt)*) => {{
        if !$crate::output::is_quiet() {
            $crate::output::emit(format!($($arg)*));
        }
    }};
}

/// Per-tick diagnostics; only printed with `--verbose`.
#[macro_export]
macro_rules! debug {
    ($($arg:tt)*) => {{
        if $crate::output::is_verbose() {
            $crate::output::emit(format!($($arg)*));
        }
    }};
}

/// Errors always reach stderr, quiet or not.
#[macro_export]
macro_rules! error {
    ($($arg:tt)*) => {{
        $crate::output::emit_err(format!($($arg)*));
    }};
}

pub fn is_quiet() -> bool {
    QUIET.load(Ordering::Relaxed)
}

pub fn is_verbose() -> bool {
    VERBOSE.load(Ordering::Relaxed)
}

pub fn emit(line: String) {
    match METER.get() {
        Some(pb) => pb.suspend(|| println!("{line}")),
        None => println!("{line}"),
    }
}

pub fn emit_err(line: String) {
    match METER.get() {
        Some(pb) => pb.suspend(|| eprintln!("{line}")),
        None => eprintln!("{line}"),
    }
}

pub fn fmt_db(db: f32) -> String {
    format!("{:2.2}dB", db)
}

/// Console state for one run: verbosity switches and the optional level meter.
#[derive(Debug)]
pub struct Output {
    pub meter: Option<ProgressBar>,
}

impl Output {
    pub fn new(config: &Config) -> Self {
        QUIET.store(config.quiet, Ordering::Relaxed);
        VERBOSE.store(config.verbose, Ordering::Relaxed);

        let meter = if config.meter {
            Some(ProgressBar::new(meter_len()))
        } else {
            None
        };

        if let Some(pb) = &meter {
            let style = ProgressStyle::with_template("[{elapsed_precise}] [{wide_bar:.yellow/green}] {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("#>-");
            pb.set_style(style);
            pb.set_message(fmt_db(DB_FLOOR));
            // Only the first run's meter is routed around; there is only ever one.
            let _ = METER.set(pb.clone());
        }

        Self { meter }
    }

    /// Show the most recent peak level on the meter, if there is one.
    pub fn level(&self, db: f32) {
        if let Some(pb) = &self.meter {
            pb.set_position(meter_position(db));
            pb.set_message(fmt_db(db));
        }
    }

    pub fn finish(&self) {
        if let Some(pb) = &self.meter {
            pb.finish();
        }
    }
}

fn meter_len() -> u64 {
    (-DB_FLOOR).round() as u64
}

fn meter_position(db: f32) -> u64 {
    (db - DB_FLOOR).clamp(0.0, -DB_FLOOR).round() as u64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn meter_spans_floor_to_full_scale() {
        assert_eq!(meter_len(), 90);
        assert_eq!(meter_position(DB_FLOOR), 0);
        assert_eq!(meter_position(-200.0), 0);
        assert_eq!(meter_position(0.0), 90);
        assert_eq!(meter_position(6.0), 90);
        assert_eq!(meter_position(-40.0), 50);
    }

    #[test]
    fn decibel_formatting() {
        assert_eq!(fmt_db(-40.0), "-40.00dB");
        assert_eq!(fmt_db(-3.256), "-3.26dB");
    }
}
