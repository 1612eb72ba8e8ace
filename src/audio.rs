//! Audio input: where the peak sampler's buffers come from.
//!
//! The sampler is created before any client, stream or feeder thread exists
//! and is handed to them as an `Arc`, so every callback sees a fully built
//! sampler.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::config::{Config, InputSource};
use crate::error::AudioError;
use crate::monitor::AudioInput;
use crate::output;
use crate::peak::PeakSampler;

#[cfg(not(feature = "jack"))]
pub mod device;
pub mod replay;
#[cfg(feature = "jack")]
pub mod server;

#[cfg(not(feature = "jack"))]
pub use device::{LiveInput, list_inputs};
#[cfg(feature = "jack")]
pub use server::{LiveInput, list_inputs};

/// Set from the audio thread whenever a buffer arrives, cleared by the loop.
#[derive(Debug, Default)]
pub struct Activity {
    delivered: AtomicBool,
}

impl Activity {
    pub fn mark(&self) {
        self.delivered.store(true, Ordering::Release);
    }

    pub fn take(&self) -> bool {
        self.delivered.swap(false, Ordering::AcqRel)
    }
}

/// Clears the detection loop's running flag when the audio side goes away.
#[derive(Debug, Clone)]
pub struct ShutdownSignal {
    running: Arc<AtomicBool>,
}

impl ShutdownSignal {
    pub fn new(running: Arc<AtomicBool>) -> Self {
        Self { running }
    }

    pub fn notify(&self, reason: &str) {
        self.running.store(false, Ordering::Release);
        output!("Audio input has shut down: {}", reason);
    }

    /// Store only, for callbacks that must stay async-signal-safe.
    pub fn notify_quietly(&self) {
        self.running.store(false, Ordering::Release);
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }
}

/// An open input. Dropping it closes the client or stops the replay.
pub enum Input {
    Live(LiveInput),
    Replay(replay::ReplayInput),
}

impl AudioInput for Input {
    fn is_connected(&self) -> bool {
        match self {
            Input::Live(input) => input.is_connected(),
            Input::Replay(input) => input.is_connected(),
        }
    }
}

/// Wire the configured source to `sampler`. `running` is cleared when the
/// source shuts down.
pub fn open(
    config: &Config,
    sampler: Arc<PeakSampler>,
    running: Arc<AtomicBool>,
) -> Result<Input, AudioError> {
    let shutdown = ShutdownSignal::new(running);
    match &config.input {
        InputSource::Live { connect } => Ok(Input::Live(LiveInput::open(
            &config.client_name,
            connect,
            sampler,
            shutdown,
        )?)),
        InputSource::Replay { path } => Ok(Input::Replay(replay::ReplayInput::open(
            path, sampler, shutdown,
        )?)),
    }
}
