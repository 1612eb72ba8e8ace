use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("can't be quiet and verbose at the same time")]
    QuietAndVerbose,
    #[error("{name} threshold must be a finite number of decibels, got {value}")]
    NonFiniteThreshold { name: &'static str, value: f32 },
    #[error("{name} period must be at least 1 second")]
    ZeroPeriod { name: &'static str },
    #[error("at most {max} inputs can be connected, got {count}")]
    TooManyConnections { count: usize, max: usize },
}

#[derive(Debug, Error)]
pub enum AudioError {
    #[cfg(feature = "jack")]
    #[error("failed to start JACK client: {0}")]
    Client(#[source] jack::Error),
    #[cfg(feature = "jack")]
    #[error("cannot register input port: {0}")]
    Port(#[source] jack::Error),
    #[cfg(feature = "jack")]
    #[error("input port '{0}' disappeared after activation")]
    PortNotFound(String),
    #[cfg(feature = "jack")]
    #[error("cannot activate client: {0}")]
    Activate(#[source] jack::Error),
    #[cfg(feature = "jack")]
    #[error("failed to connect '{target}': {source}")]
    Connect {
        target: String,
        #[source]
        source: jack::Error,
    },
    #[cfg(not(feature = "jack"))]
    #[error("failed to list input devices: {0}")]
    Devices(#[from] cpal::DevicesError),
    #[cfg(not(feature = "jack"))]
    #[error("no default input device available")]
    NoDefaultDevice,
    #[cfg(not(feature = "jack"))]
    #[error("failed to connect to '{0}': no such input")]
    DeviceNotFound(String),
    #[cfg(not(feature = "jack"))]
    #[error("failed to query input configuration: {0}")]
    Config(#[from] cpal::DefaultStreamConfigError),
    #[cfg(not(feature = "jack"))]
    #[error("failed to register input stream: {0}")]
    Build(#[from] cpal::BuildStreamError),
    #[cfg(not(feature = "jack"))]
    #[error("failed to activate input stream: {0}")]
    Play(#[from] cpal::PlayStreamError),
    #[cfg(not(feature = "jack"))]
    #[error("unsupported sample format: {0:?}")]
    UnsupportedFormat(cpal::SampleFormat),
    #[error("could not open replay file '{path}': {reason}")]
    Replay { path: String, reason: String },
    #[error("failed to start replay thread: {0}")]
    ReplayThread(#[source] std::io::Error),
}

#[derive(Debug, Error)]
pub enum ActionError {
    #[error("failed to run '{program}': {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },
    #[error("'{program}' exited with {status}")]
    Status {
        program: String,
        status: std::process::ExitStatus,
    },
}

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Audio(#[from] AudioError),
}
