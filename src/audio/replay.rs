//! Replays a WAV file into the sampler at the file's own pace.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use wavers::Wav;

use super::{Activity, ShutdownSignal};
use crate::error::AudioError;
use crate::peak::PeakSampler;
use crate::{error, output};

/// Frames handed to the sampler per simulated callback.
pub const BLOCK_FRAMES: usize = 1024;

pub struct ReplayInput {
    activity: Arc<Activity>,
    stop: Arc<AtomicBool>,
    feeder: Option<JoinHandle<()>>,
}

impl ReplayInput {
    /// Check `path` and start streaming it. Signals shutdown at end of file.
    pub fn open(
        path: &Path,
        sampler: Arc<PeakSampler>,
        shutdown: ShutdownSignal,
    ) -> Result<Self, AudioError> {
        let replay_err = |reason: String| AudioError::Replay {
            path: path.display().to_string(),
            reason,
        };

        let wav: Wav<f32> = Wav::from_path(path).map_err(|e| replay_err(e.to_string()))?;
        let sample_rate = wav.sample_rate();
        let channels = wav.n_channels();
        if sample_rate <= 0 || channels == 0 {
            return Err(replay_err(format!(
                "invalid format: {} Hz, {} channels",
                sample_rate, channels
            )));
        }
        drop(wav);

        output!(
            "Replaying {} ({} Hz, {} channels).",
            path.display(),
            sample_rate,
            channels
        );

        let block_time = Duration::from_secs_f64(BLOCK_FRAMES as f64 / sample_rate as f64);
        let activity = Arc::new(Activity::default());
        let stop = Arc::new(AtomicBool::new(false));

        let feeder = {
            let feed = Feed {
                path: path.to_path_buf(),
                block_len: BLOCK_FRAMES * channels as usize,
                block_time,
                sampler,
                activity: Arc::clone(&activity),
                stop: Arc::clone(&stop),
                shutdown,
            };
            thread::Builder::new()
                .name("replay".to_string())
                .spawn(move || feed.run())
                .map_err(AudioError::ReplayThread)?
        };

        Ok(Self {
            activity,
            stop,
            feeder: Some(feeder),
        })
    }

    pub fn is_connected(&self) -> bool {
        self.activity.take()
    }
}

/// Feeder thread state. The reader is opened on the thread itself.
struct Feed {
    path: PathBuf,
    block_len: usize,
    block_time: Duration,
    sampler: Arc<PeakSampler>,
    activity: Arc<Activity>,
    stop: Arc<AtomicBool>,
    shutdown: ShutdownSignal,
}

impl Feed {
    fn run(self) {
        let mut wav: Wav<f32> = match Wav::from_path(&self.path) {
            Ok(wav) => wav,
            Err(err) => {
                error!("Replay of {} failed: {}", self.path.display(), err);
                self.shutdown.notify("replay failed");
                return;
            }
        };

        let mut block = Vec::with_capacity(self.block_len);
        for frame in wav.frames() {
            block.extend_from_slice(&frame);
            if block.len() >= self.block_len && !self.push(&mut block) {
                return;
            }
        }
        if !block.is_empty() && !self.push(&mut block) {
            return;
        }
        self.shutdown.notify("end of replay");
    }

    /// Hand one block to the sampler and wait out its duration. False once
    /// the replay has been told to stop.
    fn push(&self, block: &mut Vec<f32>) -> bool {
        if self.stop.load(Ordering::Acquire) || !self.shutdown.is_running() {
            return false;
        }
        self.sampler.on_audio_buffer(block);
        self.activity.mark();
        block.clear();
        thread::sleep(self.block_time);
        true
    }
}

impl Drop for ReplayInput {
    fn drop(&mut self) {
        self.stop.store(true, Ordering::Release);
        if let Some(feeder) = self.feeder.take() {
            let _ = feeder.join();
        }
    }
}
