//! Low-level transport to the device provisioning socket.

use std::{
    io,
    net::SocketAddr,
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc,
    },
    time::Duration,
};

use log::{debug, trace, warn};
use swann_core::{Message, Response};
use tokio::{
    io::{AsyncReadExt, AsyncWriteExt},
    net::{
        tcp::{OwnedReadHalf, OwnedWriteHalf},
        TcpStream,
    },
    sync::{mpsc, oneshot, Mutex},
};

use crate::{SwannError, SwannResult, TransportConfig};

/// Event produced by the socket reader.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SocketEvent {
    /// Bytes received by a single socket read.
    Message(Response),
    /// The connection has been closed, no more events will follow.
    Closed,
}

/// Sink for the events of a single connection.
pub type SocketListener = mpsc::UnboundedSender<SocketEvent>;

type SharedConnection = Arc<Mutex<Option<ActiveConnection>>>;

#[derive(Debug)]
struct ActiveConnection {
    id: u64,
    writer: OwnedWriteHalf,
    // Dropping it stops the reader of this connection.
    _stop: oneshot::Sender<()>,
}

struct ReadTask {
    id: u64,
    reader: OwnedReadHalf,
    stop: oneshot::Receiver<()>,
    listener: SocketListener,
}

/// TCP transport that owns at most one connection with the device.
///
/// Incoming bytes are handled by a single reader worker which lives as long as
/// the client itself, so the client must be created inside a Tokio runtime.
#[derive(Debug)]
pub struct SocketClient {
    config: TransportConfig,
    connection: SharedConnection,
    next_id: AtomicU64,
    reader: mpsc::UnboundedSender<ReadTask>,
}

impl SocketClient {
    /// Creates a new transport and spawns its reader worker.
    ///
    /// Zero settings in the given config are replaced by their defaults, see
    /// [`TransportConfig::normalized`].
    pub fn new(config: TransportConfig) -> Self {
        let normalized = config.normalized();
        if normalized != config {
            warn!("Replaced zero transport settings with defaults: {normalized:?}");
        }
        let config = normalized;

        let connection = SharedConnection::default();
        let (reader, tasks) = mpsc::unbounded_channel();
        tokio::spawn(run_reader(tasks, connection.clone(), config));

        Self {
            config,
            connection,
            next_id: AtomicU64::new(0),
            reader,
        }
    }

    /// Returns the transport configuration.
    pub const fn config(&self) -> &TransportConfig {
        &self.config
    }

    /// Checks whether the device answers on its provisioning address.
    ///
    /// An explicitly refused connection still proves the host is up. The
    /// managed connection is not affected.
    pub async fn is_server_reachable(&self, timeout: Duration) -> bool {
        let address = self.config.address;
        let outcome = tokio::time::timeout(timeout, TcpStream::connect(address))
            .await
            .ok()
            .map(|connected| connected.map(drop));
        if outcome.is_none() {
            debug!("The {address} did not answer within {timeout:?}");
        }
        is_reachable(address, outcome)
    }

    /// Connects to the device and starts delivering its messages to the given listener.
    ///
    /// Fails if a connection is already open. The connection state stays
    /// unlocked during the TCP handshake, so [`Self::is_connected`] and
    /// [`Self::close_connection`] do not wait for it. If two handshakes race,
    /// the one finishing last fails with [`SwannError::AlreadyConnected`].
    pub async fn open_connection(&self, listener: SocketListener) -> SwannResult<()> {
        if let Some(active) = self.connection.lock().await.as_ref() {
            warn!("Connection #{} is still open", active.id);
            return Err(SwannError::AlreadyConnected);
        }

        let address = self.config.address;
        debug!("Connecting to the {address}");
        let stream = tokio::time::timeout(self.config.connect_timeout, TcpStream::connect(address))
            .await
            .map_err(|_| {
                warn!("Connection to the {address} timed out");
                SwannError::Connect(io::ErrorKind::TimedOut)
            })?
            .map_err(|err| {
                warn!("Unable to connect to the {address}: {err}");
                SwannError::connect(&err)
            })?;
        stream.set_nodelay(true).ok();

        let mut connection = self.connection.lock().await;
        if let Some(active) = connection.as_ref() {
            warn!(
                "Connection #{} was opened during the handshake, dropping the new one",
                active.id
            );
            return Err(SwannError::AlreadyConnected);
        }

        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let (reader, writer) = stream.into_split();
        let (stop_tx, stop) = oneshot::channel();
        self.reader
            .send(ReadTask {
                id,
                reader,
                stop,
                listener,
            })
            .map_err(|_| SwannError::WorkerStopped)?;

        *connection = Some(ActiveConnection {
            id,
            writer,
            _stop: stop_tx,
        });
        debug!("Opened connection #{id} with the {address}");
        Ok(())
    }

    /// Writes raw message bytes to the open connection.
    pub async fn send_message(&self, message: &Message) -> SwannResult<()> {
        let mut connection = self.connection.lock().await;
        let active = connection.as_mut().ok_or(SwannError::NotConnected)?;

        trace!("Sending {message} over connection #{}", active.id);
        active
            .writer
            .write_all(message.as_bytes())
            .await
            .map_err(|err| {
                warn!("Unable to send a message over connection #{}: {err}", active.id);
                SwannError::send(&err)
            })
    }

    /// Closes the open connection, if any.
    ///
    /// Returns `false` if there was nothing to close.
    pub async fn close_connection(&self) -> bool {
        let Some(mut active) = self.connection.lock().await.take() else {
            trace!("Connection is already closed");
            return false;
        };

        if let Err(err) = active.writer.shutdown().await {
            trace!("Unable to shutdown connection #{}: {err}", active.id);
        }
        debug!("Closed connection #{}", active.id);
        true
    }

    /// Returns true if a connection with the device is open.
    pub async fn is_connected(&self) -> bool {
        self.connection.lock().await.is_some()
    }
}

/// Classifies the outcome of a reachability connect, `None` means it timed out.
///
/// An explicitly refused connection still proves the host is up.
fn is_reachable(address: SocketAddr, outcome: Option<io::Result<()>>) -> bool {
    match outcome {
        Some(Ok(())) => {
            trace!("The {address} accepted a connection");
            true
        }
        Some(Err(err)) if err.kind() == io::ErrorKind::ConnectionRefused => {
            debug!("The {address} refused a connection");
            true
        }
        Some(Err(err)) => {
            debug!("The {address} is unreachable: {err}");
            false
        }
        None => false,
    }
}

async fn run_reader(
    mut tasks: mpsc::UnboundedReceiver<ReadTask>,
    connection: SharedConnection,
    config: TransportConfig,
) {
    while let Some(task) = tasks.recv().await {
        let ReadTask {
            id,
            reader,
            stop,
            listener,
        } = task;

        receive_messages(id, reader, stop, &listener, config).await;

        // The connection may have been closed or even replaced in the meantime.
        {
            let mut current = connection.lock().await;
            if current.as_ref().is_some_and(|active| active.id == id) {
                *current = None;
                debug!("Connection #{id} has been closed by the reader");
            }
        }

        if listener.send(SocketEvent::Closed).is_err() {
            trace!("Nobody is waiting for connection #{id} anymore");
        }
    }
    trace!("Socket reader stopped");
}

async fn receive_messages(
    id: u64,
    mut reader: OwnedReadHalf,
    mut stop: oneshot::Receiver<()>,
    listener: &SocketListener,
    config: TransportConfig,
) {
    let mut buf = vec![0_u8; config.read_len];
    loop {
        let read = tokio::select! {
            _ = &mut stop => {
                trace!("Connection #{id} closed locally");
                return;
            }
            read = tokio::time::timeout(config.read_timeout, reader.read(&mut buf)) => read,
        };

        match read {
            Ok(Ok(0)) => {
                debug!("Device closed connection #{id}");
                return;
            }
            Ok(Ok(bytes_read)) => {
                let response = Response::parse(&buf[..bytes_read]);
                trace!("Received {response} over connection #{id}");
                if listener.send(SocketEvent::Message(response)).is_err() {
                    trace!("Dropped a message of connection #{id}");
                }
            }
            Ok(Err(err)) => {
                warn!("Unable to read from connection #{id}: {err}");
                return;
            }
            Err(_) => {
                warn!(
                    "No data over connection #{id} within {:?}",
                    config.read_timeout
                );
                return;
            }
        }
    }
}
