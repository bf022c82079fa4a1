//! A single sensor behind a provider, from connect to disconnect.

use futures::StreamExt;
use futures::stream::BoxStream;
use std::sync::Arc;
use tokio::sync::watch;
use tokio_stream::wrappers::{ReceiverStream, WatchStream};
use tracing::{debug, info, warn};

use super::ConnectionState;
use crate::config::DriverConfig;
use crate::drivers::{DriverKind, PrintRequest, SensorDriver, SensorRecord};
use crate::instance::DriverInstance;
use crate::poller::{Poller, PollerChannels, PollerHandle};
use crate::provider::Provider;
use crate::types::ParamBundle;
use crate::{DriverError, Result};

/// Who currently owns the provider.
pub(super) enum Link<P> {
    Idle { provider: P, instance: DriverInstance },
    Polling(PollerHandle<P>),
    /// The poller task died and took the provider with it.
    Gone,
}

/// Connection to one sensor
///
/// While connected the session owns the provider directly. Starting hands the
/// provider to a [`Poller`] task, and stopping takes it back, so commands and
/// decoding never race for the transport.
pub struct SensorSession<P: Provider> {
    driver: Arc<dyn SensorDriver>,
    config: DriverConfig,
    state: watch::Sender<ConnectionState>,
    pub(super) link: Link<P>,
}

impl<P: Provider> std::fmt::Debug for SensorSession<P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SensorSession")
            .field("driver", &self.driver)
            .field("config", &self.config)
            .field("state", &*self.state.borrow())
            .finish_non_exhaustive()
    }
}

impl<P: Provider> SensorSession<P> {
    pub fn new(provider: P, driver: impl Into<Arc<dyn SensorDriver>>, config: DriverConfig) -> Self {
        let driver = driver.into();
        let instance = DriverInstance::new(Arc::clone(&driver));
        let (state, _) = watch::channel(ConnectionState::Disconnected);
        Self { driver, config, state, link: Link::Idle { provider, instance } }
    }

    pub fn kind(&self) -> DriverKind {
        self.driver.kind()
    }

    pub fn driver(&self) -> Arc<dyn SensorDriver> {
        Arc::clone(&self.driver)
    }

    pub fn config(&self) -> &DriverConfig {
        &self.config
    }

    /// The provider, unless a poller currently owns it.
    pub fn provider(&self) -> Option<&P> {
        match &self.link {
            Link::Idle { provider, .. } => Some(provider),
            _ => None,
        }
    }

    /// Current lifecycle state
    pub fn state(&self) -> ConnectionState {
        *self.state.borrow()
    }

    /// Stream of state changes, starting with the current state
    pub fn state_updates(&self) -> BoxStream<'static, ConnectionState> {
        WatchStream::new(self.state.subscribe()).boxed()
    }

    /// True while a poller is running. Turns false once the provider ends,
    /// even though the state stays `Started` until [`stop`](Self::stop).
    pub fn is_streaming(&self) -> bool {
        matches!(&self.link, Link::Polling(handle) if !handle.is_finished())
    }

    /// Connect to the device, retrying transient failures with backoff.
    pub async fn connect(&mut self) -> Result<()> {
        self.require(&[ConnectionState::Disconnected], "connect")?;
        self.transition(ConnectionState::Connecting);

        let max_attempts = self.config.connection.max_attempts;
        let mut last_error = None;

        for attempt in 0..max_attempts {
            debug!("{} connect attempt {}/{}", self.kind(), attempt + 1, max_attempts);
            let result = match self.provider_mut() {
                Ok(provider) => provider.connect().await,
                Err(e) => {
                    self.transition(ConnectionState::Disconnected);
                    return Err(e);
                }
            };
            match result {
                Ok(()) => {
                    self.transition(ConnectionState::Connected);
                    return Ok(());
                }
                Err(e) if !e.is_retryable() => {
                    self.transition(ConnectionState::Disconnected);
                    return Err(e);
                }
                Err(e) => {
                    warn!("{} connect attempt {} failed: {}", self.kind(), attempt + 1, e);
                    last_error = Some(e);
                    if attempt + 1 < max_attempts {
                        tokio::time::sleep(self.config.connection.backoff(attempt)).await;
                    }
                }
            }
        }

        self.transition(ConnectionState::Disconnected);
        let reason = format!("{} gave up after {} attempts", self.kind(), max_attempts);
        Err(match last_error {
            Some(e) => DriverError::connection_failed_with_source(reason, Box::new(e)),
            None => DriverError::connection_failed(reason),
        })
    }

    /// Encode and send a configure message.
    pub async fn configure(&mut self, setting: &str, params: &ParamBundle) -> Result<()> {
        self.require(&[ConnectionState::Connected, ConnectionState::Started], "configure")?;
        let bytes = self.driver.configure(setting, params)?;
        debug!("{} configure {}: {} bytes", self.kind(), setting, bytes.len());
        self.send(bytes).await
    }

    /// Encode and send a label.
    pub async fn print(&mut self, request: &PrintRequest) -> Result<()> {
        self.require(&[ConnectionState::Connected, ConnectionState::Started], "print")?;
        let bytes = self.driver.encode(request)?;
        self.send(bytes).await
    }

    /// Start streaming and return the decoded records.
    ///
    /// The stream ends when the session stops or the provider runs dry.
    pub async fn start(&mut self) -> Result<ReceiverStream<SensorRecord>> {
        self.require(&[ConnectionState::Connected], "start")?;
        if let Some(cmd) = self.driver.start_cmd() {
            self.send(cmd).await?;
        }

        match std::mem::replace(&mut self.link, Link::Gone) {
            Link::Idle { provider, instance } => {
                let PollerChannels { records, handle } =
                    Poller::spawn(provider, instance, &self.config.polling);
                self.link = Link::Polling(handle);
                self.transition(ConnectionState::Started);
                Ok(ReceiverStream::new(records))
            }
            other => {
                self.link = other;
                Err(DriverError::channel_closed("provider is not available"))
            }
        }
    }

    /// Stop streaming and take the provider back from the poller.
    pub async fn stop(&mut self) -> Result<()> {
        self.require(&[ConnectionState::Started], "stop")?;
        if let Err(e) = self.reclaim().await {
            self.transition(ConnectionState::Disconnected);
            return Err(e);
        }
        self.transition(ConnectionState::Connected);
        match self.driver.stop_cmd() {
            Some(cmd) => self.send(cmd).await,
            None => Ok(()),
        }
    }

    /// Stop if streaming, then release the transport.
    pub async fn disconnect(&mut self) -> Result<()> {
        match self.state() {
            ConnectionState::Disconnected => return Ok(()),
            ConnectionState::Started => {
                if let Err(e) = self.stop().await {
                    warn!("{} stop during disconnect failed: {}", self.kind(), e);
                }
            }
            _ => {}
        }

        let result = match &mut self.link {
            Link::Idle { provider, .. } => provider.disconnect().await,
            _ => Ok(()),
        };
        self.transition(ConnectionState::Disconnected);
        result
    }

    async fn send(&mut self, bytes: Vec<u8>) -> Result<()> {
        match &mut self.link {
            Link::Idle { provider, .. } => provider.send(&bytes).await,
            Link::Polling(handle) => handle.send(bytes).await,
            Link::Gone => Err(DriverError::channel_closed("provider is not available")),
        }
    }

    async fn reclaim(&mut self) -> Result<()> {
        match std::mem::replace(&mut self.link, Link::Gone) {
            Link::Polling(handle) => {
                let (provider, mut instance) = handle.shutdown().await?;
                instance.reset();
                self.link = Link::Idle { provider, instance };
            }
            other => self.link = other,
        }
        Ok(())
    }

    fn provider_mut(&mut self) -> Result<&mut P> {
        match &mut self.link {
            Link::Idle { provider, .. } => Ok(provider),
            _ => Err(DriverError::channel_closed("provider is not available")),
        }
    }

    fn require(&self, allowed: &[ConnectionState], operation: &'static str) -> Result<()> {
        let state = self.state();
        if allowed.contains(&state) {
            Ok(())
        } else {
            Err(DriverError::InvalidState { operation, state })
        }
    }

    fn transition(&self, next: ConnectionState) {
        let previous = self.state.send_replace(next);
        if !previous.can_transition_to(next) {
            warn!("{} unexpected transition {} -> {}", self.kind(), previous, next);
        }
        info!("{} {} -> {}", self.kind(), previous, next);
    }
}

impl<P: Provider> Drop for SensorSession<P> {
    fn drop(&mut self) {
        if let Link::Polling(handle) = &self.link {
            debug!("Dropping {} session, cancelling poller", self.driver.kind());
            handle.cancel();
        }
    }
}
