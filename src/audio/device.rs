//! Live capture through CPAL, for builds without the `jack` feature.
//!
//! Each `--connect` target names an input device. A device counts as
//! connected while its stream keeps delivering buffers.

use std::sync::Arc;

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{Device, Host, SampleFormat, StreamConfig, StreamError};

use super::{Activity, ShutdownSignal};
use crate::error::AudioError;
use crate::peak::PeakSampler;
use crate::{debug, error, output};

/// Input streams feeding one sampler. Streams close on drop.
pub struct LiveInput {
    streams: Vec<cpal::Stream>,
    activity: Arc<Activity>,
}

pub fn host() -> Host {
    cpal::default_host()
}

/// Names accepted by `--connect`.
pub fn list_inputs() -> Result<Vec<String>, AudioError> {
    let host = host();
    let mut names = Vec::new();
    for device in host.input_devices()? {
        if let Ok(name) = device.name() {
            names.push(name);
        }
    }
    Ok(names)
}

fn find_device(host: &Host, name: &str) -> Result<Device, AudioError> {
    let mut devices = host.input_devices()?;
    devices
        .find(|d| d.name().map(|n| n == name).unwrap_or(false))
        .ok_or_else(|| AudioError::DeviceNotFound(name.to_string()))
}

impl LiveInput {
    pub fn open(
        client_name: &str,
        connect: &[String],
        sampler: Arc<PeakSampler>,
        shutdown: ShutdownSignal,
    ) -> Result<Self, AudioError> {
        let host = host();
        output!(
            "Audio client registered as '{}' on {}.",
            client_name,
            host.id().name()
        );

        let devices = if connect.is_empty() {
            vec![
                host.default_input_device()
                    .ok_or(AudioError::NoDefaultDevice)?,
            ]
        } else {
            connect
                .iter()
                .map(|name| find_device(&host, name))
                .collect::<Result<Vec<_>, _>>()?
        };

        let activity = Arc::new(Activity::default());
        let mut streams = Vec::with_capacity(devices.len());
        for device in &devices {
            let name = device
                .name()
                .unwrap_or_else(|_| "unknown input device".to_string());
            output!("Connecting {} to {}", name, client_name);
            streams.push(build_stream(
                device,
                Arc::clone(&sampler),
                Arc::clone(&activity),
                shutdown.clone(),
            )?);
        }

        for stream in &streams {
            stream.play()?;
        }

        Ok(Self { streams, activity })
    }

    pub fn is_connected(&self) -> bool {
        !self.streams.is_empty() && self.activity.take()
    }
}

fn build_stream(
    device: &Device,
    sampler: Arc<PeakSampler>,
    activity: Arc<Activity>,
    shutdown: ShutdownSignal,
) -> Result<cpal::Stream, AudioError> {
    let supported = device.default_input_config()?;
    let format = supported.sample_format();
    let config: StreamConfig = supported.into();
    debug!(
        "Input config: format={:?} sample_rate={}Hz channels={}",
        format, config.sample_rate.0, config.channels
    );

    let err_fn = move |err: StreamError| on_stream_error(&shutdown, err);

    let stream = match format {
        SampleFormat::F32 => device.build_input_stream(
            &config,
            move |data: &[f32], _: &cpal::InputCallbackInfo| {
                sampler.on_audio_buffer(data);
                activity.mark();
            },
            err_fn,
            None,
        )?,
        SampleFormat::I16 => device.build_input_stream(
            &config,
            move |data: &[i16], _: &cpal::InputCallbackInfo| {
                sampler.on_samples(data.iter().map(|&s| s as f32 / 32_768.0));
                activity.mark();
            },
            err_fn,
            None,
        )?,
        SampleFormat::U16 => device.build_input_stream(
            &config,
            move |data: &[u16], _: &cpal::InputCallbackInfo| {
                sampler.on_samples(data.iter().map(|&s| (s as f32 - 32_768.0) / 32_768.0));
                activity.mark();
            },
            err_fn,
            None,
        )?,
        SampleFormat::I32 => device.build_input_stream(
            &config,
            move |data: &[i32], _: &cpal::InputCallbackInfo| {
                sampler.on_samples(data.iter().map(|&s| s as f32 / 2_147_483_648.0));
                activity.mark();
            },
            err_fn,
            None,
        )?,
        other => return Err(AudioError::UnsupportedFormat(other)),
    };

    Ok(stream)
}

/// CPAL can't tell a dead stream from a hiccup, and a stopped stream never
/// restarts, so every stream error ends the input.
fn on_stream_error(shutdown: &ShutdownSignal, err: StreamError) {
    if !shutdown.is_running() {
        return;
    }
    match err {
        StreamError::DeviceNotAvailable => shutdown.notify("device is no longer available"),
        other => {
            error!("Audio stream error: {}", other);
            shutdown.notify("stream stopped");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, Ordering};

    fn signal() -> (Arc<AtomicBool>, ShutdownSignal) {
        let running = Arc::new(AtomicBool::new(true));
        let shutdown = ShutdownSignal::new(Arc::clone(&running));
        (running, shutdown)
    }

    #[test]
    fn lost_device_stops_the_loop() {
        let (running, shutdown) = signal();
        on_stream_error(&shutdown, StreamError::DeviceNotAvailable);
        assert!(!running.load(Ordering::Acquire));
    }

    #[test]
    fn backend_error_stops_the_loop() {
        let (running, shutdown) = signal();
        let err = StreamError::BackendSpecific {
            err: cpal::BackendSpecificError {
                description: "server was shut down".to_string(),
            },
        };
        on_stream_error(&shutdown, err);
        assert!(!running.load(Ordering::Acquire));
    }
}
