//! Swann smart plug network layer
//!
//! This crate talks to the plug over its private access point. The
//! [`SocketClient`] owns the single TCP connection with the device and the
//! [`ProvisioningClient`] turns it into a queue of simple request/response
//! operations.

// Linter configuration
#![warn(unsafe_code, clippy::pedantic, clippy::use_self)]
// Too many false positives.
#![allow(
    clippy::missing_errors_doc,
    clippy::missing_panics_doc,
    clippy::module_name_repetitions,
    clippy::must_use_candidate
)]

use std::{
    net::{IpAddr, Ipv4Addr, SocketAddr},
    time::Duration,
};

pub use swann_core as core;
pub use swann_core::{Error as SwannError, Result as SwannResult};

pub use crate::{
    provisioning::ProvisioningClient,
    socket::{SocketClient, SocketEvent, SocketListener},
};

mod provisioning;
mod socket;

/// Default IP address of the device access point.
pub const DEFAULT_DEVICE_IP_ADDRESS: IpAddr = IpAddr::V4(Ipv4Addr::new(192, 168, 1, 1));
/// Default provisioning port of the device.
pub const DEFAULT_DEVICE_PORT: u16 = 2501;
/// How long the reader waits for the next bytes before giving up on the connection.
pub const READ_TIMEOUT: Duration = Duration::from_secs(15);
/// How long to wait for the TCP handshake.
pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(15);
/// Maximum number of bytes requested by a single socket read.
///
/// The device sends every response in one segment, so a single read is
/// treated as a single message.
pub const READ_LEN: usize = 25;

/// Connection settings of the [`SocketClient`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransportConfig {
    /// Device socket address.
    pub address: SocketAddr,
    /// Socket read timeout.
    pub read_timeout: Duration,
    /// TCP connect timeout.
    pub connect_timeout: Duration,
    /// Maximum bytes per socket read.
    pub read_len: usize,
}

impl TransportConfig {
    /// Returns the default configuration pointed at the given address.
    pub fn with_address(address: SocketAddr) -> Self {
        Self {
            address,
            ..Self::default()
        }
    }

    /// Returns a copy where every zero setting is replaced by its default.
    ///
    /// A zero read length would make every read look like the end of the
    /// stream, and a zero timeout would expire before any byte arrives.
    #[must_use]
    pub fn normalized(self) -> Self {
        fn non_zero<T: PartialEq + Default>(value: T, fallback: T) -> T {
            if value == T::default() {
                fallback
            } else {
                value
            }
        }

        Self {
            address: self.address,
            read_timeout: non_zero(self.read_timeout, READ_TIMEOUT),
            connect_timeout: non_zero(self.connect_timeout, CONNECT_TIMEOUT),
            read_len: non_zero(self.read_len, READ_LEN),
        }
    }
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            address: SocketAddr::new(DEFAULT_DEVICE_IP_ADDRESS, DEFAULT_DEVICE_PORT),
            read_timeout: READ_TIMEOUT,
            connect_timeout: CONNECT_TIMEOUT,
            read_len: READ_LEN,
        }
    }
}
