//! MQTT session management.
//!
//! One [`Session`] owns one long-lived broker connection for the process
//! lifetime and mediates all traffic for exactly two topics: the device
//! heartbeat topic (subscribe) and the command topic (publish). Inbound
//! delivery runs on the session's own event-loop task; request handlers
//! only touch the shared [`StatusStore`] and the publish path.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use parking_lot::Mutex;
use rumqttc::{AsyncClient, Event, EventLoop, MqttOptions, Packet, QoS, TlsConfiguration, Transport};
use tokio::sync::{broadcast, watch};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::command::Command;
use crate::config::SessionConfig;
use crate::error::{Error, Result};
use crate::status::StatusRecord;
use crate::store::StatusStore;

const RECONNECT_MIN: Duration = Duration::from_secs(1);
const RECONNECT_MAX: Duration = Duration::from_secs(60);
const STOP_TIMEOUT: Duration = Duration::from_secs(5);

/// Connection lifecycle states.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConnectionState {
    /// No broker connection; also the initial and terminal state.
    #[default]
    Disconnected,
    /// A connect attempt is in flight.
    Connecting,
    /// Connected, heartbeat subscription not yet acknowledged.
    Connected,
    /// Connected and subscribed to the heartbeat topic.
    Subscribed,
}

impl ConnectionState {
    /// Whether an outbound publish can be handed to the transport.
    pub fn can_publish(self) -> bool {
        matches!(self, ConnectionState::Connected | ConnectionState::Subscribed)
    }
}

/// Pieces that move into the event-loop task on `start()`.
struct Launch {
    event_loop: EventLoop,
    state_tx: watch::Sender<ConnectionState>,
}

impl std::fmt::Debug for Launch {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Launch").finish_non_exhaustive()
    }
}

/// Owns the broker connection and all subscribe/publish behavior.
#[derive(Debug)]
pub struct Session {
    config: SessionConfig,
    client: AsyncClient,
    store: Arc<StatusStore>,
    state: watch::Receiver<ConnectionState>,
    shutdown: broadcast::Sender<()>,
    launch: Mutex<Option<Launch>>,
    worker: Mutex<Option<JoinHandle<()>>>,
}

impl Session {
    /// Build a session from the given configuration.
    ///
    /// TLS material is read here, so a missing or unreadable certificate
    /// fails construction; the process should not serve traffic with a
    /// half-configured session. No network I/O happens until [`start`].
    ///
    /// [`start`]: Session::start
    pub fn new(config: SessionConfig) -> Result<Self> {
        let mut options = MqttOptions::new(&config.client_id, &config.endpoint, config.port);
        options.set_keep_alive(config.keep_alive);

        if let Some(tls) = &config.tls {
            let ca = read_pem(&tls.ca_path, "CA certificate")?;
            let cert = read_pem(&tls.cert_path, "client certificate")?;
            let key = read_pem(&tls.key_path, "private key")?;
            options.set_transport(Transport::tls_with_config(TlsConfiguration::Simple {
                ca,
                alpn: None,
                client_auth: Some((cert, key)),
            }));
        }

        let (client, event_loop) = AsyncClient::new(options, 64);
        let (state_tx, state) = watch::channel(ConnectionState::Disconnected);
        let (shutdown, _) = broadcast::channel(1);

        Ok(Self {
            config,
            client,
            store: Arc::new(StatusStore::new()),
            state,
            shutdown,
            launch: Mutex::new(Some(Launch { event_loop, state_tx })),
            worker: Mutex::new(None),
        })
    }

    /// Spawn the event-loop task and wait for the initial connect attempt
    /// to resolve.
    ///
    /// A failed initial attempt is logged, not returned: the session stays
    /// up and keeps reconnecting with bounded exponential backoff, so
    /// status queries can still serve the last-known value. Must not be
    /// called more than once.
    pub async fn start(&self) -> Result<()> {
        let Launch { event_loop, state_tx } =
            self.launch.lock().take().ok_or(Error::AlreadyStarted)?;

        info!(
            endpoint = %self.config.endpoint,
            port = self.config.port,
            client_id = %self.config.client_id,
            "starting mqtt session"
        );
        let _ = state_tx.send(ConnectionState::Connecting);

        let handle = tokio::spawn(run_loop(
            event_loop,
            state_tx,
            self.client.clone(),
            self.store.clone(),
            self.config.clone(),
            self.shutdown.subscribe(),
        ));
        *self.worker.lock() = Some(handle);

        let mut state = self.state.clone();
        let resolved = tokio::time::timeout(
            self.config.connect_timeout,
            state.wait_for(|s| *s != ConnectionState::Connecting),
        )
        .await;

        match resolved {
            Ok(Ok(s)) if s.can_publish() => info!("initial connect succeeded"),
            Ok(_) => warn!("initial connect failed, retrying in background"),
            Err(_) => warn!(
                timeout = ?self.config.connect_timeout,
                "initial connect still pending, continuing in background"
            ),
        }

        Ok(())
    }

    /// Tear the session down gracefully.
    ///
    /// Signals the event-loop task, requests a broker disconnect and
    /// waits a bounded time for the task to finish. Safe to call even if
    /// [`start`] never completed or never connected.
    ///
    /// [`start`]: Session::start
    pub async fn stop(&self) -> Result<()> {
        let _ = self.shutdown.send(());

        if self.state().can_publish() {
            if let Err(e) = self.client.disconnect().await {
                debug!("disconnect request failed: {e}");
            }
        }

        let handle = self.worker.lock().take();
        if let Some(mut handle) = handle {
            if tokio::time::timeout(STOP_TIMEOUT, &mut handle).await.is_err() {
                warn!(timeout = ?STOP_TIMEOUT, "session task did not stop in time, aborting");
                handle.abort();
            }
        }

        info!("mqtt session stopped");
        Ok(())
    }

    /// Publish an already-validated command on the command topic.
    ///
    /// Fire-and-forget at QoS 0: the call only hands the payload to the
    /// transport, it never awaits a delivery acknowledgment. While the
    /// connection is down this fails immediately with
    /// [`Error::PublishUnavailable`]; nothing is queued.
    pub async fn publish(&self, command: Command) -> Result<()> {
        if !self.state().can_publish() {
            return Err(Error::PublishUnavailable);
        }

        self.client
            .publish(
                &self.config.command_topic,
                QoS::AtMostOnce,
                false,
                command.as_str().as_bytes(),
            )
            .await
            .map_err(|e| Error::Publish(e.to_string()))?;

        debug!(command = %command, topic = %self.config.command_topic, "command published");
        Ok(())
    }

    /// Latest accepted heartbeat, if any.
    pub fn latest(&self) -> Option<StatusRecord> {
        self.store.read()
    }

    /// Current connection state.
    pub fn state(&self) -> ConnectionState {
        *self.state.borrow()
    }

    /// The store shared with the inbound delivery path.
    pub fn store(&self) -> Arc<StatusStore> {
        self.store.clone()
    }
}

/// Drives the rumqttc event loop until shutdown.
///
/// Every connection error flips the state to disconnected and is paced by
/// a backoff sleep before the next poll retries the connect. Nothing in
/// here may panic or return early on a bad message; the loop has to
/// survive every malformed payload indefinitely.
async fn run_loop(
    mut event_loop: EventLoop,
    state_tx: watch::Sender<ConnectionState>,
    client: AsyncClient,
    store: Arc<StatusStore>,
    config: SessionConfig,
    mut shutdown: broadcast::Receiver<()>,
) {
    let mut backoff = RECONNECT_MIN;

    loop {
        tokio::select! {
            _ = shutdown.recv() => {
                info!("session shutdown requested");
                break;
            }
            event = event_loop.poll() => match event {
                Ok(Event::Incoming(Packet::ConnAck(_))) => {
                    info!(endpoint = %config.endpoint, "connected to broker");
                    backoff = RECONNECT_MIN;
                    let _ = state_tx.send(ConnectionState::Connected);

                    if let Err(e) = client.subscribe(&config.heartbeat_topic, QoS::AtMostOnce).await {
                        error!("subscribe request failed: {e}");
                    }
                }
                Ok(Event::Incoming(Packet::SubAck(_))) => {
                    info!(topic = %config.heartbeat_topic, "subscribed to heartbeat topic");
                    let _ = state_tx.send(ConnectionState::Subscribed);
                }
                Ok(Event::Incoming(Packet::Publish(publish))) => {
                    ingest(&config.heartbeat_topic, &store, &publish.topic, &publish.payload);
                }
                Ok(Event::Incoming(Packet::Disconnect)) => {
                    warn!("broker closed the connection");
                    let _ = state_tx.send(ConnectionState::Disconnected);
                }
                Ok(_) => {}
                Err(e) => {
                    let _ = state_tx.send(ConnectionState::Disconnected);
                    warn!(retry_in = ?backoff, "connection error: {e}");

                    tokio::select! {
                        _ = shutdown.recv() => {
                            info!("session shutdown requested");
                            break;
                        }
                        _ = tokio::time::sleep(backoff) => {}
                    }
                    backoff = (backoff * 2).min(RECONNECT_MAX);
                    let _ = state_tx.send(ConnectionState::Connecting);
                }
            }
        }
    }

    let _ = state_tx.send(ConnectionState::Disconnected);
}

/// Inbound delivery path, invoked from the event-loop task.
///
/// Never lets a failure escape: off-topic or malformed messages are
/// logged and dropped, leaving the store untouched. Accepted payloads are
/// stamped with the local receipt time and replace the stored record
/// wholesale.
pub(crate) fn ingest(heartbeat_topic: &str, store: &StatusStore, topic: &str, payload: &[u8]) {
    if topic != heartbeat_topic {
        debug!(topic, "ignoring message on unexpected topic");
        return;
    }

    match StatusRecord::decode(payload, Utc::now()) {
        Some(record) => {
            debug!(?record, "heartbeat updated");
            store.write(record);
        }
        None => warn!(topic, "dropping malformed heartbeat payload"),
    }
}

fn read_pem(path: &std::path::Path, what: &str) -> Result<Vec<u8>> {
    std::fs::read(path)
        .map_err(|e| Error::Config(format!("cannot read {what} {}: {e}", path.display())))
}
