//! Outgoing commands.

use core::fmt;

use crate::{Error, Message, ResponseType, Result};

/// Length of the command prefix in bytes.
pub const PREFIX_LEN: usize = 8;
/// Maximum payload that can be described by the single length byte.
pub const MAX_PAYLOAD_LEN: usize = u8::MAX as usize;
/// Value added to every password byte before it is sent to the device.
pub const PASSWORD_OBFUSCATION_OFFSET: u8 = 10;

/// Kinds of commands understood by the device.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum RequestType {
    /// Restart the device so it joins the configured network.
    Reboot,
    /// Set the home network password.
    Password,
    /// Set the home network SSID.
    Ssid,
    /// Query the device MAC address.
    Mac,
}

impl RequestType {
    /// Returns the fixed ASCII prefix of this command.
    pub const fn prefix(self) -> &'static [u8; PREFIX_LEN] {
        match self {
            Self::Reboot => b"#/SAMRS#",
            Self::Password => b"#/SAMPW#",
            Self::Ssid => b"#/SAMSS#",
            Self::Mac => b"#/SAMMR#",
        }
    }

    /// Returns a short human readable name of the command.
    pub const fn name(self) -> &'static str {
        match self {
            Self::Reboot => "reboot",
            Self::Password => "password",
            Self::Ssid => "ssid",
            Self::Mac => "mac",
        }
    }

    /// Response type that completes this command successfully.
    pub const fn success_response(self) -> ResponseType {
        match self {
            Self::Mac => ResponseType::Mac,
            Self::Reboot | Self::Password | Self::Ssid => ResponseType::Ack,
        }
    }

    /// Response type that completes this command with an error.
    pub const fn error_response(self) -> ResponseType {
        ResponseType::Nack
    }
}

impl fmt::Display for RequestType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Encoded command ready to be written to the socket.
///
/// Frame layout: `prefix[8] ++ len[1] ++ payload[len]`.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct Request {
    kind: RequestType,
    message: Message,
}

impl Request {
    /// Creates a MAC address query.
    pub fn mac() -> Self {
        Self::empty(RequestType::Mac)
    }

    /// Creates a reboot command.
    pub fn reboot() -> Self {
        Self::empty(RequestType::Reboot)
    }

    /// Creates a command which sets the home network SSID.
    pub fn ssid(ssid: impl AsRef<[u8]>) -> Result<Self> {
        Self::with_payload(RequestType::Ssid, ssid.as_ref())
    }

    /// Creates a command which sets the home network password.
    ///
    /// The device expects every password byte shifted by
    /// [`PASSWORD_OBFUSCATION_OFFSET`], the length byte stays untouched.
    pub fn password(password: impl AsRef<[u8]>) -> Result<Self> {
        let payload = password
            .as_ref()
            .iter()
            .map(|byte| byte.wrapping_add(PASSWORD_OBFUSCATION_OFFSET))
            .collect::<Vec<_>>();
        Self::with_payload(RequestType::Password, &payload)
    }

    /// Returns the command kind.
    pub const fn kind(&self) -> RequestType {
        self.kind
    }

    /// Returns the encoded frame.
    pub const fn message(&self) -> &Message {
        &self.message
    }

    fn empty(kind: RequestType) -> Self {
        let mut bytes = Vec::with_capacity(PREFIX_LEN + 1);
        bytes.extend_from_slice(kind.prefix());
        bytes.push(0);
        Self {
            kind,
            message: Message::new(bytes),
        }
    }

    fn with_payload(kind: RequestType, payload: &[u8]) -> Result<Self> {
        let len = u8::try_from(payload.len()).map_err(|_| Error::PayloadTooLong(payload.len()))?;

        let mut bytes = Vec::with_capacity(PREFIX_LEN + 1 + payload.len());
        bytes.extend_from_slice(kind.prefix());
        bytes.push(len);
        bytes.extend_from_slice(payload);
        Ok(Self {
            kind,
            message: Message::new(bytes),
        })
    }
}
