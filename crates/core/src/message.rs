//! Raw protocol message.

use core::fmt;

/// Immutable sequence of bytes exchanged with the device.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct Message {
    bytes: Vec<u8>,
}

impl Message {
    /// Creates a new message from the given bytes.
    pub fn new(bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            bytes: bytes.into(),
        }
    }

    /// Returns the message bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Returns the message length in bytes.
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// Returns true if the message has no bytes.
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Returns true if the message begins with the given prefix.
    ///
    /// A message shorter than the prefix never matches.
    pub fn starts_with(&self, prefix: &[u8]) -> bool {
        self.bytes.len() >= prefix.len() && self.bytes[..prefix.len()] == *prefix
    }

    /// Renders the message as a lowercase hex string.
    pub fn to_hex(&self) -> String {
        hex::encode(&self.bytes)
    }

    /// Renders the message as text, replacing invalid UTF-8 sequences.
    pub fn to_string_lossy(&self) -> String {
        String::from_utf8_lossy(&self.bytes).into_owned()
    }
}

impl AsRef<[u8]> for Message {
    fn as_ref(&self) -> &[u8] {
        &self.bytes
    }
}

impl From<Vec<u8>> for Message {
    fn from(bytes: Vec<u8>) -> Self {
        Self { bytes }
    }
}

impl From<&[u8]> for Message {
    fn from(bytes: &[u8]) -> Self {
        Self::new(bytes)
    }
}

impl fmt::Display for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl fmt::Debug for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Message")
            .field(&self.to_string_lossy())
            .finish()
    }
}
