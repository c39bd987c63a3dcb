//! Transport traits: a byte-level view of the MIDI bus.
//!
//! `MidiBus` finds and opens endpoints; `MidiLink` carries bytes to and from
//! one opened endpoint. The device channel and locator are written against
//! these traits so they can be exercised against [`TestBus`](super::TestBus)
//! without a pedal attached.

use std::fmt;
use std::time::Duration;

/// Result type for transport operations.
pub type TransportResult<T = ()> = Result<T, TransportError>;

/// Error from a transport operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportError(pub String);

impl fmt::Display for TransportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::error::Error for TransportError {}

impl From<std::io::Error> for TransportError {
    fn from(e: std::io::Error) -> Self {
        TransportError(e.to_string())
    }
}

impl From<String> for TransportError {
    fn from(s: String) -> Self {
        TransportError(s)
    }
}

/// An endpoint advertised on the bus.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    /// Transport-defined address, e.g. `hw:1,0,0`. Opaque to the core.
    pub id: String,
    /// Human-readable name the pedal is matched on.
    pub name: String,
}

impl Endpoint {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
        }
    }

    pub fn matches(&self, identity: &str) -> bool {
        self.name.contains(identity)
    }
}

/// Discovery and opening of endpoints.
pub trait MidiBus {
    type Link: MidiLink;

    /// Enumerate the endpoints currently present.
    fn endpoints(&mut self) -> TransportResult<Vec<Endpoint>>;

    /// Open a link to `endpoint`.
    fn open(&mut self, endpoint: &Endpoint) -> TransportResult<Self::Link>;
}

/// An open connection to one endpoint.
pub trait MidiLink {
    /// Send a frame without waiting for anything back.
    fn send(&mut self, frame: &[u8]) -> TransportResult;

    /// Send a frame and collect whatever arrives within `timeout`.
    /// An empty vector means nothing came back.
    fn request(&mut self, frame: &[u8], timeout: Duration) -> TransportResult<Vec<u8>>;
}
