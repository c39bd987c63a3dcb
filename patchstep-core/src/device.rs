//! Command/response exchange with the pedal over one open link.

use std::fmt;
use std::time::Duration;

use log::{debug, warn};

use patchstep_types::PatchNumber;

use crate::midi::{
    find_program_change, program_change, to_hex, Endpoint, MidiLink, TransportError,
    ENABLE_EDITING, QUERY_PATCH,
};

/// Why a round trip with the pedal failed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommFailure {
    /// The transport itself reported an error.
    Transport(TransportError),
    /// Nothing came back before the reply deadline.
    NoReply,
    /// Something came back, but no program change in it.
    MalformedReply(Vec<u8>),
}

impl fmt::Display for CommFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Transport(e) => write!(f, "transport error: {}", e),
            Self::NoReply => write!(f, "no reply from pedal"),
            Self::MalformedReply(bytes) => write!(f, "unusable reply [{}]", to_hex(bytes)),
        }
    }
}

impl std::error::Error for CommFailure {}

impl From<TransportError> for CommFailure {
    fn from(e: TransportError) -> Self {
        Self::Transport(e)
    }
}

/// The channel is no good any more; a fresh one has to come from recovery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecoveryNeeded {
    pub cause: CommFailure,
}

impl fmt::Display for RecoveryNeeded {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "recovery needed: {}", self.cause)
    }
}

impl std::error::Error for RecoveryNeeded {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.cause)
    }
}

impl From<CommFailure> for RecoveryNeeded {
    fn from(cause: CommFailure) -> Self {
        Self { cause }
    }
}

/// An open channel to the pedal. This is the device handle: it is replaced
/// as a whole when recovery succeeds, never repaired in place.
pub struct DeviceChannel<L> {
    endpoint: Endpoint,
    link: L,
    reply_timeout: Duration,
}

impl<L: MidiLink> DeviceChannel<L> {
    pub fn new(endpoint: Endpoint, link: L, reply_timeout: Duration) -> Self {
        Self {
            endpoint,
            link,
            reply_timeout,
        }
    }

    pub fn endpoint(&self) -> &Endpoint {
        &self.endpoint
    }

    /// Put the pedal into remote parameter editing mode. Required once per
    /// freshly opened channel before queries get answered.
    pub fn enable_editing(&mut self) {
        match self.link.send(&ENABLE_EDITING) {
            Ok(()) => debug!("editing enabled on {}", self.endpoint.id),
            Err(e) => warn!("could not enable editing on {}: {}", self.endpoint.id, e),
        }
    }

    /// Ask the pedal which patch is active.
    pub fn read_patch(&mut self) -> Result<PatchNumber, RecoveryNeeded> {
        let reply = self
            .link
            .request(&QUERY_PATCH, self.reply_timeout)
            .map_err(CommFailure::from)?;

        if reply.is_empty() {
            return Err(CommFailure::NoReply.into());
        }

        let raw = find_program_change(&reply).ok_or(CommFailure::MalformedReply(reply))?;
        let patch = PatchNumber::new(raw).unwrap_or_else(|| {
            let wrapped = PatchNumber::wrapping(raw as i32);
            warn!("pedal reported patch {} outside 0-49, using {}", raw, wrapped);
            wrapped
        });
        debug!("pedal is on patch {}", patch);
        Ok(patch)
    }

    /// Select `patch`. Fire-and-forget: a lost write only shows up through
    /// the next `read_patch`.
    pub fn write_patch(&mut self, patch: PatchNumber) {
        if let Err(e) = self.link.send(&program_change(patch)) {
            debug!("program change {} not delivered: {}", patch, e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::midi::test_bus::SIM_PORT;
    use crate::midi::{MidiBus, SimOp, TestBus};

    const NAME: &str = "ZOOM MS Series MIDI";

    fn open_channel(bus: &mut TestBus) -> DeviceChannel<crate::midi::test_bus::TestLink> {
        let endpoint = Endpoint::new(SIM_PORT, NAME);
        let link = bus.open(&endpoint).unwrap();
        DeviceChannel::new(endpoint, link, Duration::from_millis(60))
    }

    #[test]
    fn test_read_then_write() {
        let mut bus = TestBus::new(NAME, 17);
        let mut channel = open_channel(&mut bus);
        channel.enable_editing();

        let patch = channel.read_patch().unwrap();
        assert_eq!(patch.get(), 17);
        channel.write_patch(patch.step(1));
        assert_eq!(bus.patch(), 18);
        assert_eq!(bus.program_changes(), vec![18]);
    }

    #[test]
    fn test_no_reply_needs_recovery() {
        let mut bus = TestBus::new(NAME, 5);
        let mut channel = open_channel(&mut bus);
        channel.enable_editing();
        bus.drop_replies(1);

        let err = channel.read_patch().unwrap_err();
        assert_eq!(err.cause, CommFailure::NoReply);
    }

    #[test]
    fn test_unarmed_channel_gets_no_reply() {
        let mut bus = TestBus::new(NAME, 5);
        let mut channel = open_channel(&mut bus);
        assert!(channel.read_patch().is_err());
    }

    #[test]
    fn test_malformed_reply_needs_recovery() {
        let mut bus = TestBus::new(NAME, 5);
        let mut channel = open_channel(&mut bus);
        channel.enable_editing();
        bus.garble_replies(1);

        let err = channel.read_patch().unwrap_err();
        assert!(matches!(err.cause, CommFailure::MalformedReply(_)));
        assert!(err.to_string().contains("unusable reply"));
    }

    #[test]
    fn test_unplugged_link_is_transport_error() {
        let mut bus = TestBus::new(NAME, 5);
        let mut channel = open_channel(&mut bus);
        channel.enable_editing();
        bus.set_present(false);

        let err = channel.read_patch().unwrap_err();
        assert!(matches!(err.cause, CommFailure::Transport(_)));

        channel.write_patch(PatchNumber::new(1).unwrap());
        assert!(bus.program_changes().is_empty());
        assert_eq!(bus.count(|op| matches!(op, SimOp::Rejected { .. })), 2);
    }

    #[test]
    fn test_out_of_range_patch_wraps() {
        let mut bus = TestBus::new(NAME, 53);
        let mut channel = open_channel(&mut bus);
        channel.enable_editing();
        assert_eq!(channel.read_patch().unwrap().get(), 3);
    }
}
