//! Live input from a JACK server.
//!
//! Registers one client with a single `in` port, samples it from the process
//! callback, and wires it to the requested source ports. Connection status is
//! the port's connection count, so unplugging the source freezes detection.

use std::sync::Arc;

use jack::{
    AsyncClient, AudioIn, Client, ClientOptions, ClientStatus, Control, NotificationHandler,
    Port, PortFlags, ProcessHandler, ProcessScope, Unowned,
};

use super::ShutdownSignal;
use crate::error::AudioError;
use crate::output;
use crate::peak::PeakSampler;

pub const INPUT_PORT: &str = "in";

/// Real-time side: feeds every period's buffer into the sampler.
pub struct PeakProcess {
    port: Port<AudioIn>,
    sampler: Arc<PeakSampler>,
}

impl ProcessHandler for PeakProcess {
    fn process(&mut self, _: &Client, ps: &ProcessScope) -> Control {
        self.sampler.on_audio_buffer(self.port.as_slice(ps));
        Control::Continue
    }
}

/// Non real-time side: turns the server's shutdown into a stop request.
pub struct Notifications {
    shutdown: ShutdownSignal,
}

impl Notifications {
    pub fn new(shutdown: ShutdownSignal) -> Self {
        Self { shutdown }
    }
}

impl NotificationHandler for Notifications {
    unsafe fn shutdown(&mut self, _status: ClientStatus, _reason: &str) {
        // Runs like a signal handler: flag only, no printing.
        self.shutdown.notify_quietly();
    }
}

/// An active client. Dropping it deactivates and closes the client.
pub struct LiveInput {
    _client: AsyncClient<Notifications, PeakProcess>,
    port: Port<Unowned>,
}

/// Source ports that `--connect` accepts.
pub fn list_inputs() -> Result<Vec<String>, AudioError> {
    let (client, _) = Client::new("silentjack_list", ClientOptions::NO_START_SERVER)
        .map_err(AudioError::Client)?;
    Ok(client.ports(None, None, PortFlags::IS_OUTPUT))
}

impl LiveInput {
    pub fn open(
        client_name: &str,
        connect: &[String],
        sampler: Arc<PeakSampler>,
        shutdown: ShutdownSignal,
    ) -> Result<Self, AudioError> {
        let (client, _) =
            Client::new(client_name, ClientOptions::NO_START_SERVER).map_err(AudioError::Client)?;
        output!("JACK client registered as '{}'.", client.name());

        let port = client
            .register_port(INPUT_PORT, AudioIn::default())
            .map_err(AudioError::Port)?;
        let port_name = port.name().map_err(AudioError::Port)?;

        let client = client
            .activate_async(Notifications::new(shutdown), PeakProcess { port, sampler })
            .map_err(AudioError::Activate)?;

        for target in connect {
            output!("Connecting {} to {}", target, port_name);
            client
                .as_client()
                .connect_ports_by_name(target, &port_name)
                .map_err(|source| AudioError::Connect {
                    target: target.clone(),
                    source,
                })?;
        }

        let port = client
            .as_client()
            .port_by_name(&port_name)
            .ok_or(AudioError::PortNotFound(port_name))?;

        Ok(Self {
            _client: client,
            port,
        })
    }

    pub fn is_connected(&self) -> bool {
        has_connections(self.port.connected_count())
    }
}

/// A port whose connections cannot be queried counts as unplugged.
fn has_connections(count: Result<usize, jack::Error>) -> bool {
    count.map(|n| n > 0).unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, Ordering};

    #[test]
    fn server_shutdown_clears_running() {
        let running = Arc::new(AtomicBool::new(true));
        let mut notifications = Notifications::new(ShutdownSignal::new(Arc::clone(&running)));

        unsafe { notifications.shutdown(ClientStatus::empty(), "JACK server stopped") };

        assert!(!running.load(Ordering::Acquire));
    }

    #[test]
    fn connection_count_decides_connected() {
        assert!(!has_connections(Ok(0)));
        assert!(has_connections(Ok(1)));
        assert!(has_connections(Ok(3)));
        assert!(!has_connections(Err(jack::Error::ClientIsNoLongerAlive)));
    }
}
