//! Bluetooth Low Energy transport.
//!
//! The radio exposes one GATT service with four characteristics:
//! - `FROMRADIO` (read): one `FromRadio` message per read, empty when drained
//! - `TORADIO` (write): one `ToRadio` message per write
//! - `FROMNUM` (notify): a little-endian `u32` counter bumped when new
//!   messages are queued
//! - `LOGRADIO` (notify): debug log output
//!
//! The transport itself requires the `ble` feature; identifiers, the
//! configuration and the counter tracking are always available.

use std::future::Future;
use std::time::Duration;

use tokio::sync::oneshot;
use tokio::time::Instant;
use tracing::debug;
use uuid::Uuid;

use crate::error::{Error, Result};

/// Meshtastic GATT service.
pub const SERVICE_UUID: Uuid = Uuid::from_u128(0x6ba1_b218_15a8_461f_9fa8_5dca_e273_eafd);

/// Characteristic read for inbound messages.
pub const FROM_RADIO_UUID: Uuid = Uuid::from_u128(0x2c55_e69e_4993_11ed_b878_0242_ac12_0002);

/// Characteristic written with outbound messages.
pub const TO_RADIO_UUID: Uuid = Uuid::from_u128(0xf75c_76d2_129e_4dad_a1dd_7866_1244_01e7);

/// Notifying counter of queued inbound messages.
pub const FROM_NUM_UUID: Uuid = Uuid::from_u128(0xed9d_a18c_a800_4f66_a670_aa75_47e3_4453);

/// Notifying debug log output.
pub const LOG_UUID: Uuid = Uuid::from_u128(0x5a3d_6e49_06e6_4423_9944_e9de_8cdf_9547);

/// Default time allowed for discovery and connection.
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Configuration for Bluetooth transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BluetoothConfig {
    /// Device address (e.g. `AA:BB:CC:DD:EE:FF`) or advertised name.
    pub address: String,
    /// Time allowed for scanning, connecting and service discovery.
    pub connect_timeout: Duration,
}

impl BluetoothConfig {
    /// Creates a new Bluetooth configuration with default settings.
    #[must_use]
    pub fn new(address: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
        }
    }

    /// Sets the connect timeout.
    #[must_use]
    pub const fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Whether a discovered peripheral matches the configured address or name.
    #[must_use]
    pub fn matches(&self, address: &str, name: Option<&str>) -> bool {
        address.eq_ignore_ascii_case(&self.address) || name == Some(self.address.as_str())
    }
}

/// Filters `FROMNUM` notifications down to new counter values.
#[derive(Debug, Default)]
pub struct FromNumTracker {
    last: Option<u32>,
}

impl FromNumTracker {
    /// Records a notification value; returns true if it signals new data.
    ///
    /// Repeated values are duplicates and return false. Values that are not
    /// 4 bytes long are treated as new data.
    pub fn observe(&mut self, value: &[u8]) -> bool {
        let Ok(raw) = <[u8; 4]>::try_from(value) else {
            return true;
        };
        let num = u32::from_le_bytes(raw);
        if self.last == Some(num) {
            debug!(num, "duplicate packet notification");
            return false;
        }
        debug!(num, "new packet available");
        self.last = Some(num);
        true
    }
}

/// Runs one connection step until `deadline`.
///
/// When the step fails or the deadline passes, `undo` runs before the error
/// is returned, so a half-opened link never outlives a failed connect.
#[cfg_attr(not(feature = "ble"), allow(dead_code))]
async fn connect_step<T, S, U>(deadline: Instant, name: &str, step: S, undo: U) -> Result<T>
where
    S: Future<Output = Result<T>>,
    U: Future<Output = ()>,
{
    match tokio::time::timeout_at(deadline, step).await {
        Ok(Ok(value)) => Ok(value),
        Ok(Err(e)) => {
            undo.await;
            Err(e)
        }
        Err(_) => {
            undo.await;
            Err(Error::TransportConnect {
                reason: format!("{name} timed out"),
            })
        }
    }
}

/// Runs `work` until it finishes or `stop` fires, whichever is first.
///
/// A dropped stop sender counts as a stop request.
#[cfg_attr(not(feature = "ble"), allow(dead_code))]
async fn until_stopped<F>(stop: oneshot::Receiver<()>, work: F) -> Result<()>
where
    F: Future<Output = Result<()>>,
{
    tokio::select! {
        outcome = work => outcome,
        _ = stop => {
            debug!("bluetooth pump stopped");
            Ok(())
        }
    }
}

#[cfg(feature = "ble")]
pub use platform::BluetoothTransport;

#[cfg(feature = "ble")]
mod platform {
    use std::future::Future;
    use std::pin::Pin;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicBool, Ordering};

    use btleplug::api::{
        Central, Characteristic, Manager as _, Peripheral as _, ScanFilter, WriteType,
    };
    use btleplug::platform::{Adapter, Manager, Peripheral};
    use bytes::Bytes;
    use futures::StreamExt;
    use tokio::sync::{Mutex, oneshot};
    use tokio::task::JoinHandle;
    use tokio::time::Instant;
    use tracing::{debug, info, warn};

    use super::{
        BluetoothConfig, FROM_NUM_UUID, FROM_RADIO_UUID, FromNumTracker, LOG_UUID, SERVICE_UUID,
        TO_RADIO_UUID, connect_step, until_stopped,
    };
    use crate::error::{Error, Result};
    use crate::protocol::Framing;
    use crate::transport::{FrameSink, FrameStream, Transport};

    /// Interval between peripheral list polls while scanning.
    const SCAN_POLL: std::time::Duration = std::time::Duration::from_millis(250);

    /// Time the pump gets to unsubscribe after a stop request.
    const PUMP_STOP_TIMEOUT: std::time::Duration = std::time::Duration::from_secs(2);

    struct Pump {
        stop: oneshot::Sender<()>,
        handle: JoinHandle<()>,
    }

    impl Pump {
        /// Asks the pump to unsubscribe and exit, aborting it if it hangs.
        async fn shutdown(self) {
            let Self { stop, mut handle } = self;
            let _ = stop.send(());
            if tokio::time::timeout(PUMP_STOP_TIMEOUT, &mut handle)
                .await
                .is_err()
            {
                warn!("bluetooth pump did not stop in time");
                handle.abort();
            }
        }
    }

    #[derive(Clone)]
    struct Link {
        peripheral: Peripheral,
        from_radio: Characteristic,
        to_radio: Characteristic,
        from_num: Characteristic,
        log: Option<Characteristic>,
    }

    /// Bluetooth Low Energy transport.
    pub struct BluetoothTransport {
        config: BluetoothConfig,
        link: std::sync::Mutex<Option<Link>>,
        connect_lock: Mutex<()>,
        write_lock: Mutex<()>,
        pump: std::sync::Mutex<Option<Pump>>,
        connected: Arc<AtomicBool>,
        frames_taken: AtomicBool,
    }

    impl BluetoothTransport {
        /// Creates a new Bluetooth transport with the given configuration.
        #[must_use]
        pub fn new(config: BluetoothConfig) -> Self {
            Self {
                config,
                link: std::sync::Mutex::new(None),
                connect_lock: Mutex::new(()),
                write_lock: Mutex::new(()),
                pump: std::sync::Mutex::new(None),
                connected: Arc::new(AtomicBool::new(false)),
                frames_taken: AtomicBool::new(false),
            }
        }

        fn current(&self) -> Option<Link> {
            self.link.lock().ok().and_then(|slot| slot.clone())
        }

        async fn adapter() -> Result<Adapter> {
            let manager = Manager::new().await?;
            manager
                .adapters()
                .await?
                .into_iter()
                .next()
                .ok_or_else(|| Error::TransportConnect {
                    reason: "no bluetooth adapter".into(),
                })
        }

        async fn scan(&self, central: &Adapter) -> Result<Peripheral> {
            central
                .start_scan(ScanFilter {
                    services: vec![SERVICE_UUID],
                })
                .await?;

            loop {
                for peripheral in central.peripherals().await? {
                    let name = peripheral
                        .properties()
                        .await?
                        .and_then(|props| props.local_name);
                    if self
                        .config
                        .matches(&peripheral.address().to_string(), name.as_deref())
                    {
                        return Ok(peripheral);
                    }
                }
                tokio::time::sleep(SCAN_POLL).await;
            }
        }

        /// Scans, connects and discovers within the connect timeout.
        ///
        /// Every step that times out or fails stops the scan or disconnects
        /// the peripheral before returning.
        async fn open(&self) -> Result<Link> {
            let deadline = Instant::now() + self.config.connect_timeout;
            let central =
                connect_step(deadline, "adapter lookup", Self::adapter(), async {}).await?;

            let stop_scan = async {
                if let Err(e) = central.stop_scan().await {
                    debug!(error = %e, "failed to stop scan");
                }
            };
            let peripheral = connect_step(deadline, "scan", self.scan(&central), stop_scan).await?;
            if let Err(e) = central.stop_scan().await {
                debug!(error = %e, "failed to stop scan");
            }

            let link = async {
                peripheral.connect().await?;
                discover(peripheral.clone()).await
            };
            let undo = async {
                if let Err(e) = peripheral.disconnect().await {
                    debug!(error = %e, "disconnect after failed connect");
                }
            };
            connect_step(deadline, "connect", link, undo).await
        }
    }

    async fn discover(peripheral: Peripheral) -> Result<Link> {
        peripheral.discover_services().await?;

        let characteristics = peripheral.characteristics();
        let lookup = |uuid| {
            characteristics
                .iter()
                .find(|c| c.uuid == uuid && c.service_uuid == SERVICE_UUID)
                .cloned()
        };
        let missing = |name: &str| Error::TransportConnect {
            reason: format!("characteristic {name} not found"),
        };

        Ok(Link {
            from_radio: lookup(FROM_RADIO_UUID).ok_or_else(|| missing("FROMRADIO"))?,
            to_radio: lookup(TO_RADIO_UUID).ok_or_else(|| missing("TORADIO"))?,
            from_num: lookup(FROM_NUM_UUID).ok_or_else(|| missing("FROMNUM"))?,
            log: lookup(LOG_UUID),
            peripheral,
        })
    }

    impl Transport for BluetoothTransport {
        fn connect(&self) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>> {
            Box::pin(async move {
                let _guard = self.connect_lock.lock().await;
                if self.connected.load(Ordering::SeqCst) {
                    return Ok(());
                }

                info!(address = %self.config.address, "connecting over bluetooth");
                let link = match self.open().await {
                    Ok(link) => link,
                    Err(e @ Error::TransportConnect { .. }) => return Err(e),
                    Err(e) => {
                        return Err(Error::TransportConnect {
                            reason: e.to_string(),
                        });
                    }
                };

                if let Ok(mut slot) = self.link.lock() {
                    *slot = Some(link);
                }
                self.frames_taken.store(false, Ordering::SeqCst);
                self.connected.store(true, Ordering::SeqCst);
                info!(address = %self.config.address, "connected over bluetooth");
                Ok(())
            })
        }

        fn disconnect(&self) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>> {
            Box::pin(async move {
                self.connected.store(false, Ordering::SeqCst);
                let pump = self.pump.lock().ok().and_then(|mut slot| slot.take());
                if let Some(pump) = pump {
                    pump.shutdown().await;
                }
                let link = self.link.lock().ok().and_then(|mut slot| slot.take());
                if let Some(link) = link {
                    info!(address = %self.config.address, "disconnecting bluetooth");
                    if let Err(e) = link.peripheral.disconnect().await {
                        debug!(error = %e, "disconnect failed");
                    }
                }
                Ok(())
            })
        }

        fn is_connected(&self) -> bool {
            self.connected.load(Ordering::SeqCst)
        }

        fn frames(&self) -> Result<FrameStream> {
            let link = self.current().ok_or(Error::NotConnected)?;
            if self.frames_taken.swap(true, Ordering::SeqCst) {
                return Err(Error::Transport {
                    reason: "frame stream already taken".into(),
                });
            }

            let (tx, stream) = FrameStream::channel();
            let (stop, stopped) = oneshot::channel();
            let handle = tokio::spawn(pump(link, tx, Arc::clone(&self.connected), stopped));
            let previous = self
                .pump
                .lock()
                .ok()
                .and_then(|mut slot| slot.replace(Pump { stop, handle }));
            if let Some(old) = previous {
                // The old pump unsubscribes on its own once told to stop.
                let _ = old.stop.send(());
            }
            Ok(stream)
        }

        fn send(&self, data: Bytes) -> Pin<Box<dyn Future<Output = Result<bool>> + Send + '_>> {
            Box::pin(async move {
                let link = self.current().ok_or(Error::NotConnected)?;
                let _guard = self.write_lock.lock().await;
                match link
                    .peripheral
                    .write(&link.to_radio, &data, WriteType::WithResponse)
                    .await
                {
                    Ok(()) => Ok(true),
                    Err(e) => {
                        debug!(error = %e, "write failed");
                        Ok(false)
                    }
                }
            })
        }

        fn framing(&self) -> Framing {
            Framing::Datagram
        }
    }

    /// Reads queued messages whenever the radio signals new data.
    ///
    /// Notifications are unsubscribed however the loop ends: link failure,
    /// consumer gone or a stop request.
    async fn pump(
        link: Link,
        tx: FrameSink,
        connected: Arc<AtomicBool>,
        stop: oneshot::Receiver<()>,
    ) {
        let outcome = until_stopped(stop, run(&link, &tx)).await;

        if let Err(e) = link.peripheral.unsubscribe(&link.from_num).await {
            debug!(error = %e, "failed to unsubscribe FROMNUM");
        }
        if let Some(log) = &link.log {
            if let Err(e) = link.peripheral.unsubscribe(log).await {
                debug!(error = %e, "failed to unsubscribe LOGRADIO");
            }
        }

        connected.store(false, Ordering::SeqCst);
        if let Err(e) = outcome {
            warn!(error = %e, "bluetooth link failed");
            let _ = tx
                .send(Err(Error::Transport {
                    reason: e.to_string(),
                }))
                .await;
        }
    }

    async fn run(link: &Link, tx: &FrameSink) -> Result<()> {
        let mut notifications = link.peripheral.notifications().await?;
        link.peripheral.subscribe(&link.from_num).await?;
        if let Some(log) = &link.log {
            link.peripheral.subscribe(log).await?;
        }

        let mut tracker = FromNumTracker::default();
        if !drain(link, tx).await? {
            return Ok(());
        }

        loop {
            tokio::select! {
                () = tx.closed() => return Ok(()),
                notification = notifications.next() => {
                    let Some(notification) = notification else {
                        return Err(Error::Transport {
                            reason: "notification stream ended".into(),
                        });
                    };
                    if notification.uuid == FROM_NUM_UUID {
                        if tracker.observe(&notification.value) && !drain(link, tx).await? {
                            return Ok(());
                        }
                    } else if notification.uuid == LOG_UUID {
                        debug!(
                            log = %String::from_utf8_lossy(&notification.value).trim_end(),
                            "radio log"
                        );
                    }
                }
            }
        }
    }

    /// Reads `FROMRADIO` until it returns empty. Returns false once the
    /// consumer has gone away.
    async fn drain(link: &Link, tx: &FrameSink) -> Result<bool> {
        loop {
            let value = link.peripheral.read(&link.from_radio).await?;
            if value.is_empty() {
                return Ok(true);
            }
            if tx.send(Ok(Bytes::from(value))).await.is_err() {
                return Ok(false);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_uuids() {
        assert_eq!(
            SERVICE_UUID.to_string(),
            "6ba1b218-15a8-461f-9fa8-5dcae273eafd"
        );
        assert_eq!(
            FROM_RADIO_UUID.to_string(),
            "2c55e69e-4993-11ed-b878-0242ac120002"
        );
        assert_eq!(
            TO_RADIO_UUID.to_string(),
            "f75c76d2-129e-4dad-a1dd-7866124401e7"
        );
        assert_eq!(
            FROM_NUM_UUID.to_string(),
            "ed9da18c-a800-4f66-a670-aa7547e34453"
        );
        assert_eq!(LOG_UUID.to_string(), "5a3d6e49-06e6-4423-9944-e9de8cdf9547");
    }

    #[test]
    fn test_from_num_dedup() {
        let mut tracker = FromNumTracker::default();
        assert!(tracker.observe(&5u32.to_le_bytes()));
        assert!(!tracker.observe(&5u32.to_le_bytes()));
        assert!(tracker.observe(&6u32.to_le_bytes()));
        assert!(tracker.observe(&5u32.to_le_bytes()));
        assert!(tracker.observe(&[1, 2]));
    }

    #[tokio::test(start_paused = true)]
    async fn test_connect_step_timeout_runs_undo() {
        let undone = std::sync::atomic::AtomicBool::new(false);
        let deadline = Instant::now() + Duration::from_secs(1);

        let result: Result<()> = connect_step(
            deadline,
            "connect",
            std::future::pending(),
            async { undone.store(true, std::sync::atomic::Ordering::SeqCst) },
        )
        .await;

        assert!(matches!(
            result,
            Err(Error::TransportConnect { ref reason }) if reason == "connect timed out"
        ));
        assert!(undone.load(std::sync::atomic::Ordering::SeqCst));
    }

    #[tokio::test]
    async fn test_connect_step_failure_runs_undo() {
        let undone = std::sync::atomic::AtomicBool::new(false);
        let deadline = Instant::now() + Duration::from_secs(1);

        let result: Result<()> = connect_step(
            deadline,
            "discover",
            async { Err(Error::NotConnected) },
            async { undone.store(true, std::sync::atomic::Ordering::SeqCst) },
        )
        .await;

        assert!(matches!(result, Err(Error::NotConnected)));
        assert!(undone.load(std::sync::atomic::Ordering::SeqCst));
    }

    #[tokio::test]
    async fn test_connect_step_success_skips_undo() {
        let undone = std::sync::atomic::AtomicBool::new(false);
        let deadline = Instant::now() + Duration::from_secs(1);

        let result = connect_step(deadline, "scan", async { Ok(7) }, async {
            undone.store(true, std::sync::atomic::Ordering::SeqCst);
        })
        .await;

        assert_eq!(result.unwrap(), 7);
        assert!(!undone.load(std::sync::atomic::Ordering::SeqCst));
    }

    #[tokio::test]
    async fn test_stop_request_ends_work() {
        let (stop, stopped) = oneshot::channel();
        stop.send(()).unwrap();
        assert!(until_stopped(stopped, std::future::pending()).await.is_ok());

        let (stop, stopped) = oneshot::channel::<()>();
        drop(stop);
        assert!(until_stopped(stopped, std::future::pending()).await.is_ok());

        let (_stop, stopped) = oneshot::channel::<()>();
        let outcome = until_stopped(stopped, async { Err(Error::ConnectionLost) }).await;
        assert!(matches!(outcome, Err(Error::ConnectionLost)));
    }

    #[test]
    fn test_config_matches() {
        let config = BluetoothConfig::new("AA:BB:CC:DD:EE:FF");
        assert!(config.matches("aa:bb:cc:dd:ee:ff", None));
        assert!(!config.matches("11:22:33:44:55:66", Some("Meshtastic_eeff")));

        let by_name = BluetoothConfig::new("Meshtastic_eeff");
        assert!(by_name.matches("11:22:33:44:55:66", Some("Meshtastic_eeff")));
        assert_eq!(by_name.connect_timeout, DEFAULT_CONNECT_TIMEOUT);
    }
}
