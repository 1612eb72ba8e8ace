use std::sync::atomic::{AtomicU32, Ordering};

/// Level reported for a linear peak of zero, and the lowest level ever reported.
pub const DB_FLOOR: f32 = -90.0;

/// Maximum absolute sample value seen since the last read.
///
/// Written from the real-time audio callback and drained once per tick by the
/// detection loop. The value is kept as the bit pattern of a non-negative
/// `f32`; for those, ordering the raw bits as `u32` orders the floats, so an
/// atomic `fetch_max` is enough to merge a new peak without locking.
#[derive(Debug, Default)]
pub struct PeakSampler {
    peak_bits: AtomicU32,
}

impl PeakSampler {
    pub fn new() -> Self {
        Self {
            peak_bits: AtomicU32::new(0.0_f32.to_bits()),
        }
    }

    /// Fold a block of samples into the peak. Safe to call from a real-time
    /// thread: no allocation, no locking.
    pub fn on_audio_buffer(&self, samples: &[f32]) {
        self.on_samples(samples.iter().copied());
    }

    /// Same as [`PeakSampler::on_audio_buffer`] for callers converting from
    /// integer formats on the fly.
    pub fn on_samples<I>(&self, samples: I)
    where
        I: IntoIterator<Item = f32>,
    {
        // f32::max drops NaN, so a corrupt sample can't poison the peak.
        let peak = samples.into_iter().map(f32::abs).fold(0.0_f32, f32::max);
        if peak > 0.0 {
            self.peak_bits.fetch_max(peak.to_bits(), Ordering::AcqRel);
        }
    }

    pub fn read_and_reset(&self) -> f32 {
        f32::from_bits(self.peak_bits.swap(0.0_f32.to_bits(), Ordering::AcqRel))
    }

    #[cfg(test)]
    pub fn peek(&self) -> f32 {
        f32::from_bits(self.peak_bits.load(Ordering::Acquire))
    }
}

/// Convert a linear magnitude to decibels, clamped to [`DB_FLOOR`].
pub fn lin_to_db(lin: f32) -> f32 {
    if lin <= 0.0 {
        return DB_FLOOR;
    }
    // max() also maps a NaN result to the floor
    (20.0 * lin.log10()).max(DB_FLOOR)
}
