//! Poller spawns and manages the background decode task

use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio::time::{Duration, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, trace, warn};

use crate::config::PollingConfig;
use crate::drivers::SensorRecord;
use crate::instance::DriverInstance;
use crate::provider::Provider;
use crate::types::RawPacket;
use crate::{DriverError, Result};

/// Base delay after a provider error; doubles per consecutive error.
const ERROR_BACKOFF_BASE: Duration = Duration::from_millis(50);

/// Command bytes queued for the provider, with a reply slot.
struct Outbound {
    bytes: Vec<u8>,
    ack: oneshot::Sender<Result<()>>,
}

/// Result of spawning a poller
pub struct PollerChannels<P> {
    /// Decoded records, in decode order
    pub records: mpsc::Receiver<SensorRecord>,
    /// Control handle for the running task
    pub handle: PollerHandle<P>,
}

/// Control handle for a running poller task
pub struct PollerHandle<P> {
    commands: mpsc::Sender<Outbound>,
    cancel: CancellationToken,
    task: JoinHandle<(P, DriverInstance)>,
}

impl<P> PollerHandle<P> {
    /// Send command bytes through the provider the task owns.
    pub async fn send(&self, bytes: Vec<u8>) -> Result<()> {
        let (ack, reply) = oneshot::channel();
        self.commands
            .send(Outbound { bytes, ack })
            .await
            .map_err(|_| DriverError::channel_closed("poller task"))?;
        reply.await.map_err(|_| DriverError::channel_closed("poller task"))?
    }

    /// Request shutdown without waiting for it.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// True once the task has exited on its own or after cancellation.
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Cancel the task and take back the provider and decode state.
    pub async fn shutdown(self) -> Result<(P, DriverInstance)> {
        self.cancel.cancel();
        self.task
            .await
            .map_err(|e| DriverError::channel_closed(format!("poller task failed: {}", e)))
    }
}

/// Delay after the `error_count`-th consecutive provider error:
/// 50ms, 100ms, 200ms, ... capped at 1.6s.
fn error_backoff(error_count: u32) -> Duration {
    ERROR_BACKOFF_BASE * (1 << error_count.saturating_sub(1).min(5))
}

enum Step {
    Continue,
    Stop,
}

/// Poller spawns the task that owns a provider and a driver instance
///
/// Every polling interval the task drains the provider, decodes the batch and
/// forwards records to the host. Outbound commands are serviced between polls.
pub struct Poller;

impl Poller {
    /// Spawn the poller task for the given provider
    pub fn spawn<P>(provider: P, instance: DriverInstance, config: &PollingConfig) -> PollerChannels<P>
    where
        P: Provider,
    {
        let (record_tx, record_rx) = mpsc::channel(config.record_buffer);
        let (command_tx, command_rx) = mpsc::channel(8);
        let cancel = CancellationToken::new();

        let task = tokio::spawn(Self::poll_task(
            provider,
            instance,
            config.clone(),
            record_tx,
            command_rx,
            cancel.clone(),
        ));

        PollerChannels {
            records: record_rx,
            handle: PollerHandle { commands: command_tx, cancel, task },
        }
    }

    async fn poll_task<P>(
        mut provider: P,
        mut instance: DriverInstance,
        config: PollingConfig,
        record_tx: mpsc::Sender<SensorRecord>,
        mut command_rx: mpsc::Receiver<Outbound>,
        cancel: CancellationToken,
    ) -> (P, DriverInstance)
    where
        P: Provider,
    {
        info!(
            "Poller started for {} ({} every {:?})",
            instance.driver().kind(),
            provider.describe(),
            config.interval()
        );
        let mut ticker = tokio::time::interval(config.interval());
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut poll_count = 0u64;
        let mut error_count = 0u32;

        loop {
            if cancel.is_cancelled() {
                info!("Poller cancelled");
                break;
            }

            tokio::select! {
                _ = cancel.cancelled() => {
                    info!("Poller cancelled while idle");
                    break;
                }
                Some(outbound) = command_rx.recv() => {
                    Self::service(&mut provider, outbound).await;
                }
                _ = ticker.tick() => {
                    let result = tokio::select! {
                        _ = cancel.cancelled() => {
                            info!("Poller cancelled during poll");
                            break;
                        }
                        result = provider.poll_packets() => result,
                    };

                    match result {
                        Ok(Some(packets)) => {
                            poll_count += 1;
                            error_count = 0;
                            let step = Self::deliver(
                                &mut provider,
                                &mut instance,
                                &packets,
                                &record_tx,
                                &mut command_rx,
                                &cancel,
                            )
                            .await;
                            if let Step::Stop = step {
                                break;
                            }
                        }
                        Ok(None) => {
                            info!("Provider ended after {} polls", poll_count);
                            break;
                        }
                        Err(e) => {
                            error_count += 1;
                            error!("Provider error ({}/{}): {}", error_count, config.max_errors, e);

                            if error_count >= config.max_errors {
                                error!("Too many provider errors, stopping poller");
                                break;
                            }

                            let backoff = error_backoff(error_count);
                            tokio::select! {
                                _ = cancel.cancelled() => break,
                                _ = tokio::time::sleep(backoff) => {}
                            }
                        }
                    }
                }
            }
        }

        info!("Poller ended ({} polls)", poll_count);
        (provider, instance)
    }

    async fn service<P: Provider>(provider: &mut P, outbound: Outbound) {
        trace!("Sending {} command bytes", outbound.bytes.len());
        let result = provider.send(&outbound.bytes).await;
        let _ = outbound.ack.send(result);
    }

    /// Decode one batch and hand the records to the host.
    ///
    /// Commands keep flowing while the host is slow to drain records.
    async fn deliver<P: Provider>(
        provider: &mut P,
        instance: &mut DriverInstance,
        packets: &[RawPacket],
        record_tx: &mpsc::Sender<SensorRecord>,
        command_rx: &mut mpsc::Receiver<Outbound>,
        cancel: &CancellationToken,
    ) -> Step {
        if packets.is_empty() {
            return Step::Continue;
        }

        let records = match instance.process(packets) {
            Ok(records) => records,
            Err(e) => {
                warn!("Skipping batch of {} packets: {}", packets.len(), e);
                return Step::Continue;
            }
        };

        for record in records {
            loop {
                if cancel.is_cancelled() {
                    debug!("Cancelled before delivering record");
                    return Step::Stop;
                }
                tokio::select! {
                    _ = cancel.cancelled() => return Step::Stop,
                    Some(outbound) = command_rx.recv() => {
                        Self::service(provider, outbound).await;
                    }
                    permit = record_tx.reserve() => match permit {
                        Ok(permit) => {
                            permit.send(record);
                            break;
                        }
                        Err(_) => {
                            debug!("Record receiver dropped, shutting down");
                            return Step::Stop;
                        }
                    },
                }
            }
        }

        Step::Continue
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DriverConfig;
    use crate::drivers::DriverKind;
    use crate::providers::ReplayProvider;
    use crate::test_utils::{ScriptedProvider, force_packet};

    fn polling(interval_ms: u64) -> PollingConfig {
        PollingConfig { interval_ms, max_errors: 3, record_buffer: 16 }
    }

    fn force_instance() -> DriverInstance {
        DriverInstance::new(DriverKind::Force.build(&DriverConfig::default()))
    }

    #[tokio::test(start_paused = true)]
    async fn delivers_records_until_provider_ends() {
        let provider = ReplayProvider::new(vec![
            force_packet(&[1, 2], 10),
            force_packet(&[3], 20),
        ]);
        let PollerChannels { mut records, handle } =
            Poller::spawn(provider, force_instance(), &polling(10));

        let mut forces = Vec::new();
        while let Some(record) = records.recv().await {
            match record {
                SensorRecord::Force(s) => forces.push((s.force, s.series_timestamp)),
                other => panic!("unexpected record {other:?}"),
            }
        }
        assert_eq!(forces, vec![(1, 10), (2, 10), (3, 20)]);
        assert!(handle.shutdown().await.is_ok());
    }

    #[tokio::test(start_paused = true)]
    async fn commands_go_through_the_owned_provider() {
        let provider = ReplayProvider::new(vec![force_packet(&[1], 0)]);
        let log = provider.command_log();
        let channels = Poller::spawn(provider, force_instance(), &polling(1000));

        channels.handle.send(vec![0x02]).await.unwrap();
        assert_eq!(log.snapshot(), vec![vec![0x02]]);
        let (provider, _) = channels.handle.shutdown().await.unwrap();
        assert_eq!(provider.total(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn no_records_after_cancellation() {
        let packets: Vec<RawPacket> = (0..100).map(|i| force_packet(&[i], i64::from(i))).collect();
        let provider = ReplayProvider::new(packets);
        let PollerChannels { mut records, handle } =
            Poller::spawn(provider, force_instance(), &polling(10));

        assert!(records.recv().await.is_some());
        handle.cancel();
        let (provider, _) = handle.shutdown().await.unwrap();

        // Anything still buffered was sent before cancellation; nothing follows it.
        let mut late = 0;
        while records.recv().await.is_some() {
            late += 1;
        }
        assert!(late <= 16);
        assert!(provider.remaining() > 0);
    }

    #[tokio::test(start_paused = true)]
    async fn gives_up_after_max_errors() {
        let provider = ScriptedProvider::failing_polls(usize::MAX);
        let PollerChannels { mut records, handle } =
            Poller::spawn(provider, force_instance(), &polling(10));

        assert!(records.recv().await.is_none());
        let (provider, _) = handle.shutdown().await.unwrap();
        assert_eq!(provider.polls(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn recovers_from_transient_errors() {
        let provider = ScriptedProvider::failing_polls(2).then_packets(vec![force_packet(&[7], 1)]);
        let PollerChannels { mut records, handle } =
            Poller::spawn(provider, force_instance(), &polling(10));

        assert!(matches!(records.recv().await, Some(SensorRecord::Force(s)) if s.force == 7));
        assert!(records.recv().await.is_none());
        handle.shutdown().await.unwrap();
    }

    #[test]
    fn error_backoff_starts_at_base_and_caps() {
        assert_eq!(error_backoff(1), Duration::from_millis(50));
        assert_eq!(error_backoff(2), Duration::from_millis(100));
        assert_eq!(error_backoff(6), Duration::from_millis(1600));
        assert_eq!(error_backoff(40), Duration::from_millis(1600));
    }

    #[tokio::test(start_paused = true)]
    async fn first_error_waits_one_base_backoff() {
        let provider = ScriptedProvider::failing_polls(1).then_packets(vec![force_packet(&[9], 1)]);
        let start = tokio::time::Instant::now();
        let PollerChannels { mut records, handle } =
            Poller::spawn(provider, force_instance(), &polling(10));

        assert!(records.recv().await.is_some());
        let elapsed = start.elapsed();
        assert!(elapsed >= Duration::from_millis(50), "{elapsed:?}");
        assert!(elapsed < Duration::from_millis(100), "{elapsed:?}");
        handle.shutdown().await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn commands_are_serviced_while_records_back_up() {
        let packets: Vec<RawPacket> = (0..5).map(|i| force_packet(&[i], 0)).collect();
        let provider = ReplayProvider::new(packets).with_batch_size(5);
        let log = provider.command_log();
        let config = PollingConfig { interval_ms: 10, max_errors: 3, record_buffer: 1 };
        let PollerChannels { records, handle } = Poller::spawn(provider, force_instance(), &config);

        tokio::time::sleep(Duration::from_millis(50)).await;
        tokio::time::timeout(Duration::from_secs(1), handle.send(vec![0x02]))
            .await
            .expect("command stalled behind undelivered records")
            .unwrap();
        assert_eq!(log.snapshot(), vec![vec![0x02]]);
        assert_eq!(records.len(), 1);
        handle.shutdown().await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn decode_errors_skip_the_batch() {
        let provider = ReplayProvider::new(vec![
            RawPacket::new(vec![0u8; 3], 2, 0),
            RawPacket::new(vec![0x00, 0x05, 1, 0, 0, 0], 1, 0),
        ]);
        let instance = DriverInstance::new(DriverKind::Temperature.build(&DriverConfig::default()));
        let PollerChannels { mut records, handle } =
            Poller::spawn(provider, instance, &polling(10));

        assert!(matches!(records.recv().await, Some(SensorRecord::Temperature(_))));
        assert!(records.recv().await.is_none());
        handle.shutdown().await.unwrap();
    }
}
