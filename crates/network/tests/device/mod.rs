//! Simulated smart plug listening on the loopback interface.

#![allow(dead_code)]

use std::{
    future::Future,
    net::SocketAddr,
    sync::{Arc, Mutex},
    time::Duration,
};

use swann_network::TransportConfig;
use tokio::{
    io::{AsyncReadExt, AsyncWriteExt},
    net::{TcpListener, TcpStream},
};

pub const ACK: &[u8] = b"#/SAMOK#";
pub const NACK: &[u8] = b"#/SAMNG#";
pub const MAC: &[u8] = b"#/SAMM4#\x06\xac\xcf\x23\x10\x20\x30";
pub const CHATTER: &[u8] = b"#/SAMXX#";

/// Pause between two frames, so the client reads them separately.
pub const FRAME_GAP: Duration = Duration::from_millis(50);

/// Shared journal of what the device has seen and done.
pub type Journal = Arc<Mutex<Vec<String>>>;

/// Starts a device that runs the handler for every accepted connection.
pub async fn spawn_device<F, Fut>(handler: F) -> SocketAddr
where
    F: Fn(TcpStream) -> Fut + Send + 'static,
    Fut: Future<Output = ()> + Send + 'static,
{
    let _ = env_logger::try_init();

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let address = listener.local_addr().unwrap();
    tokio::spawn(async move {
        loop {
            let (stream, _) = listener.accept().await.unwrap();
            tokio::spawn(handler(stream));
        }
    });
    address
}

/// Returns a transport config pointed at the simulated device.
pub fn config(address: SocketAddr) -> TransportConfig {
    TransportConfig {
        read_timeout: Duration::from_secs(5),
        connect_timeout: Duration::from_secs(5),
        ..TransportConfig::with_address(address)
    }
}

/// Returns an address nobody listens on.
pub async fn vacant_address() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    listener.local_addr().unwrap()
}

/// Reads a single request frame, returns `None` if the client hung up first.
pub async fn read_frame(stream: &mut TcpStream) -> Option<Vec<u8>> {
    let mut header = [0_u8; 9];
    stream.read_exact(&mut header).await.ok()?;

    let mut payload = vec![0_u8; usize::from(header[8])];
    stream.read_exact(&mut payload).await.ok()?;

    let mut frame = header.to_vec();
    frame.extend_from_slice(&payload);
    Some(frame)
}

/// Waits until the client closes the connection.
pub async fn wait_for_hangup(stream: &mut TcpStream) {
    let mut buf = [0_u8; 64];
    while matches!(stream.read(&mut buf).await, Ok(n) if n > 0) {}
}

/// Writes the given frames with a small gap between them.
pub async fn reply(stream: &mut TcpStream, frames: &[&[u8]]) {
    for frame in frames {
        tokio::time::sleep(FRAME_GAP).await;
        stream.write_all(frame).await.unwrap();
    }
}

/// Returns the ASCII prefix of a frame.
pub fn prefix(frame: &[u8]) -> String {
    String::from_utf8_lossy(&frame[..8]).into_owned()
}
