//! Incoming device responses.

use core::fmt;

use crate::{request::PREFIX_LEN, Message, RequestType};

/// Kinds of responses sent by the device.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum ResponseType {
    /// Command accepted.
    Ack,
    /// Command rejected.
    Nack,
    /// MAC address report.
    Mac,
    /// Anything that does not match a known prefix.
    Unknown,
}

impl ResponseType {
    /// Types with a well-known prefix, in matching order.
    pub const KNOWN: [Self; 3] = [Self::Ack, Self::Nack, Self::Mac];

    /// Returns the fixed ASCII prefix of this response, if any.
    pub const fn prefix(self) -> Option<&'static [u8; PREFIX_LEN]> {
        match self {
            Self::Ack => Some(b"#/SAMOK#"),
            Self::Nack => Some(b"#/SAMNG#"),
            Self::Mac => Some(b"#/SAMM4#"),
            Self::Unknown => None,
        }
    }
}

impl fmt::Display for ResponseType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Ack => "ack",
            Self::Nack => "nack",
            Self::Mac => "mac",
            Self::Unknown => "unknown",
        };
        f.write_str(name)
    }
}

/// Parsed response of the device.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct Response {
    kind: ResponseType,
    message: Message,
}

impl Response {
    /// Classifies the received bytes by their prefix.
    ///
    /// Never fails: bytes that match no known prefix produce
    /// [`ResponseType::Unknown`].
    pub fn parse(bytes: &[u8]) -> Self {
        let message = Message::new(bytes);
        let kind = ResponseType::KNOWN
            .into_iter()
            .find(|kind| kind.prefix().is_some_and(|prefix| message.starts_with(prefix)))
            .unwrap_or(ResponseType::Unknown);

        Self { kind, message }
    }

    /// Returns the response type.
    pub const fn kind(&self) -> ResponseType {
        self.kind
    }

    /// Returns the raw received bytes.
    pub const fn message(&self) -> &Message {
        &self.message
    }

    /// Returns the payload which follows the prefix and the length byte.
    ///
    /// The declared length is clamped to the bytes actually received.
    pub fn payload(&self) -> &[u8] {
        let bytes = self.message.as_bytes();
        let Some(&len) = bytes.get(PREFIX_LEN) else {
            return &[];
        };

        let start = PREFIX_LEN + 1;
        let end = (start + usize::from(len)).min(bytes.len());
        &bytes[start..end]
    }

    /// Returns true if this response ends the given request either way.
    pub fn is_terminal_for(&self, request: RequestType) -> bool {
        self.kind == request.success_response() || self.kind == request.error_response()
    }
}

impl fmt::Display for Response {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}[{}]", self.kind, self.message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_known_prefixes() {
        assert_eq!(Response::parse(b"#/SAMOK#").kind(), ResponseType::Ack);
        assert_eq!(Response::parse(b"#/SAMNG#").kind(), ResponseType::Nack);
        assert_eq!(Response::parse(b"#/SAMM4#").kind(), ResponseType::Mac);
        assert_eq!(Response::parse(b"#/SAMOK#\x00trailer").kind(), ResponseType::Ack);
    }

    #[test]
    fn test_parse_unknown() {
        assert_eq!(Response::parse(b"").kind(), ResponseType::Unknown);
        assert_eq!(Response::parse(b"#/SAMOK").kind(), ResponseType::Unknown);
        assert_eq!(Response::parse(b"#/SAMXX#").kind(), ResponseType::Unknown);
        // Request prefixes are not responses.
        assert_eq!(Response::parse(b"#/SAMMR#").kind(), ResponseType::Unknown);
        assert_eq!(Response::parse(b"x#/SAMOK#").kind(), ResponseType::Unknown);
    }

    #[test]
    fn test_mac_payload() {
        let response = Response::parse(b"#/SAMM4#\x06\xac\xcf\x23\x01\x02\x03");
        assert_eq!(response.kind(), ResponseType::Mac);
        assert_eq!(response.payload(), &[0xac, 0xcf, 0x23, 0x01, 0x02, 0x03]);
    }

    #[test]
    fn test_truncated_payload() {
        let response = Response::parse(b"#/SAMM4#\x0c\xac\xcf");
        assert_eq!(response.payload(), &[0xac, 0xcf]);

        assert!(Response::parse(b"#/SAMM4#").payload().is_empty());
        assert!(Response::parse(b"#/SAMM4#\x00").payload().is_empty());
    }

    #[test]
    fn test_terminal_for_request() {
        let ack = Response::parse(b"#/SAMOK#");
        let nack = Response::parse(b"#/SAMNG#");
        let mac = Response::parse(b"#/SAMM4#\x00");
        let unknown = Response::parse(b"garbage!");

        assert!(ack.is_terminal_for(RequestType::Ssid));
        assert!(nack.is_terminal_for(RequestType::Ssid));
        assert!(!mac.is_terminal_for(RequestType::Ssid));
        assert!(!unknown.is_terminal_for(RequestType::Ssid));

        assert!(mac.is_terminal_for(RequestType::Mac));
        assert!(nack.is_terminal_for(RequestType::Mac));
        assert!(!ack.is_terminal_for(RequestType::Mac));
    }
}
