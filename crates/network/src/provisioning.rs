//! Request queue on top of the socket transport.

use std::{future::Future, sync::Arc, time::Duration};

use log::{debug, info, trace, warn};
use swann_core::{Request, RequestType, Response};
use tokio::sync::{mpsc, oneshot};

use crate::{SocketClient, SocketEvent, SwannError, SwannResult, TransportConfig};

/// Life cycle of a single request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RequestState {
    Opening,
    AwaitingResponse,
    Succeeded,
    Failed,
}

struct Job {
    request: Request,
    reply: oneshot::Sender<SwannResult<Response>>,
}

/// Provisioning client of the Swann smart plug.
///
/// Every operation is queued and executed strictly in submission order: the
/// worker opens a connection, sends exactly one request and waits for the
/// first response that either completes or rejects it. Other responses are
/// ignored. The connection is closed before the result is delivered.
///
/// Dropping the future returned by an operation cancels it. No retries are
/// made.
#[derive(Debug)]
pub struct ProvisioningClient {
    transport: Arc<SocketClient>,
    jobs: mpsc::UnboundedSender<Job>,
}

impl ProvisioningClient {
    /// Creates a new client without a response deadline.
    ///
    /// Must be called inside a Tokio runtime.
    pub fn new(config: TransportConfig) -> Self {
        Self::with_response_timeout(config, None)
    }

    /// Creates a new client which fails requests not answered within the given time.
    pub fn with_response_timeout(
        config: TransportConfig,
        response_timeout: Option<Duration>,
    ) -> Self {
        let transport = Arc::new(SocketClient::new(config));
        let (jobs, queue) = mpsc::unbounded_channel();
        tokio::spawn(run_requests(transport.clone(), queue, response_timeout));

        Self { transport, jobs }
    }

    /// Returns the transport configuration.
    pub fn config(&self) -> &TransportConfig {
        self.transport.config()
    }

    /// Checks whether the device answers on its provisioning address.
    ///
    /// Runs independently of the request queue.
    pub async fn is_server_reachable(&self, timeout: Duration) -> bool {
        self.transport.is_server_reachable(timeout).await
    }

    /// Returns true if a request currently holds a connection with the device.
    pub async fn is_connected(&self) -> bool {
        self.transport.is_connected().await
    }

    /// Requests the device MAC address.
    ///
    /// The address bytes are available as the [`Response::payload`].
    pub fn request_mac(&self) -> impl Future<Output = SwannResult<Response>> {
        self.submit(Ok(Request::mac()))
    }

    /// Sets the SSID of the network the device should join.
    pub fn set_home_network_ssid(
        &self,
        ssid: impl AsRef<[u8]>,
    ) -> impl Future<Output = SwannResult<()>> {
        let response = self.submit(Request::ssid(ssid));
        async move { response.await.map(|_| ()) }
    }

    /// Sets the password of the network the device should join.
    pub fn set_home_network_password(
        &self,
        password: impl AsRef<[u8]>,
    ) -> impl Future<Output = SwannResult<()>> {
        let response = self.submit(Request::password(password));
        async move { response.await.map(|_| ()) }
    }

    /// Asks the device to reboot and join the configured network.
    pub fn request_reboot(&self) -> impl Future<Output = SwannResult<()>> {
        let response = self.submit(Ok(Request::reboot()));
        async move { response.await.map(|_| ()) }
    }

    /// Enqueues the request right away, so the queue order matches the call order
    /// regardless of when the returned futures are polled.
    fn submit(
        &self,
        request: SwannResult<Request>,
    ) -> impl Future<Output = SwannResult<Response>> {
        let receiver = request.and_then(|request| {
            let (reply, receiver) = oneshot::channel();
            trace!("Enqueued {} request", request.kind());
            self.jobs
                .send(Job { request, reply })
                .map_err(|_| SwannError::WorkerStopped)?;
            Ok(receiver)
        });

        async move { receiver?.await.map_err(|_| SwannError::WorkerStopped)? }
    }
}

async fn run_requests(
    transport: Arc<SocketClient>,
    mut queue: mpsc::UnboundedReceiver<Job>,
    response_timeout: Option<Duration>,
) {
    while let Some(Job { request, mut reply }) = queue.recv().await {
        let kind = request.kind();
        if reply.is_closed() {
            debug!("Skipping cancelled {kind} request");
            continue;
        }

        let outcome = tokio::select! {
            outcome = execute(&transport, &request, response_timeout) => outcome,
            () = reply.closed() => Err(SwannError::Cancelled),
        };
        transport.close_connection().await;

        match &outcome {
            Ok(response) => {
                trace!("The {kind} request is {:?}", RequestState::Succeeded);
                info!("The {kind} request succeeded with {response}");
            }
            Err(err) => {
                trace!("The {kind} request is {:?}", RequestState::Failed);
                warn!("The {kind} request failed: {err}");
            }
        }

        if reply.send(outcome).is_err() {
            trace!("Nobody is waiting for the {kind} request result");
        }
    }
    trace!("Provisioning worker stopped");
}

async fn execute(
    transport: &SocketClient,
    request: &Request,
    response_timeout: Option<Duration>,
) -> SwannResult<Response> {
    let kind = request.kind();

    trace!("The {kind} request is {:?}", RequestState::Opening);
    let (listener, mut events) = mpsc::unbounded_channel();
    transport.open_connection(listener).await?;
    transport.send_message(request.message()).await?;

    trace!("The {kind} request is {:?}", RequestState::AwaitingResponse);
    let response = wait_for_terminal_response(kind, &mut events);
    match response_timeout {
        Some(timeout) => tokio::time::timeout(timeout, response)
            .await
            .map_err(|_| SwannError::Timeout)?,
        None => response.await,
    }
}

async fn wait_for_terminal_response(
    kind: RequestType,
    events: &mut mpsc::UnboundedReceiver<SocketEvent>,
) -> SwannResult<Response> {
    while let Some(event) = events.recv().await {
        let SocketEvent::Message(response) = event else {
            break;
        };

        if response.kind() == kind.success_response() {
            return Ok(response);
        }
        if response.kind() == kind.error_response() {
            return Err(SwannError::Rejected(kind));
        }
        debug!("Ignoring {response} while waiting for the {kind} response");
    }
    Err(SwannError::ClosedPrematurely)
}
