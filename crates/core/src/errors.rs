use std::io;

use displaydoc::Display;

use crate::request::RequestType;

/// A specialized result type for the provisioning protocol.
pub type Result<T> = core::result::Result<T, Error>;

/// Errors that can occur while talking to the smart plug.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Display)]
pub enum Error {
    /// Payload of {0} bytes does not fit into a single frame.
    PayloadTooLong(usize),
    /// A connection with the device is already open.
    AlreadyConnected,
    /// There is no open connection with the device.
    NotConnected,
    /// Unable to connect to the device: {0}.
    Connect(io::ErrorKind),
    /// Unable to send a message to the device: {0}.
    Send(io::ErrorKind),
    /// The device rejected the {0} request.
    Rejected(RequestType),
    /// Socket closed before successful response.
    ClosedPrematurely,
    /// The device did not answer in time.
    Timeout,
    /// The request was cancelled.
    Cancelled,
    /// The provisioning worker has stopped.
    WorkerStopped,
}

impl Error {
    /// Creates a new connection error.
    pub fn connect(err: &io::Error) -> Self {
        Self::Connect(err.kind())
    }

    /// Creates a new send error.
    pub fn send(err: &io::Error) -> Self {
        Self::Send(err.kind())
    }

    /// Returns true if the device answered with an explicit rejection.
    pub const fn is_rejected(&self) -> bool {
        matches!(self, Self::Rejected(_))
    }
}

impl std::error::Error for Error {}

impl From<Error> for io::Error {
    fn from(err: Error) -> Self {
        io::Error::new(io::ErrorKind::Other, err)
    }
}
