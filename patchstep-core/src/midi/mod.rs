//! MIDI protocol spoken with the pedal, and the transports that carry it.
//!
//! The pedal understands three frames:
//!
//! | Frame            | Bytes                 | Reply            |
//! |------------------|-----------------------|------------------|
//! | Enable editing   | `F0 52 00 58 50 F7`   | none             |
//! | Query patch      | `F0 52 00 58 33 F7`   | `C0 <patch>` ... |
//! | Program change   | `C0 <patch>`          | none             |

pub mod amidi;
pub mod native;
pub mod test_bus;
pub mod transport;

use std::sync::LazyLock;

use regex::Regex;

use patchstep_types::PatchNumber;

pub use amidi::AmidiBus;
pub use native::MidirBus;
pub use test_bus::{SimOp, TestBus};
pub use transport::{Endpoint, MidiBus, MidiLink, TransportError, TransportResult};

/// SysEx frame that puts the pedal into remote parameter editing mode.
pub const ENABLE_EDITING: [u8; 6] = [0xF0, 0x52, 0x00, 0x58, 0x50, 0xF7];

/// SysEx frame asking the pedal for its current patch.
pub const QUERY_PATCH: [u8; 6] = [0xF0, 0x52, 0x00, 0x58, 0x33, 0xF7];

/// Program change status byte, channel 0.
pub const PROGRAM_CHANGE: u8 = 0xC0;

/// Program change frame selecting `patch`.
pub fn program_change(patch: PatchNumber) -> [u8; 2] {
    [PROGRAM_CHANGE, patch.get()]
}

/// Whether `status` opens a program change the pedal sends, i.e. channel 0.
pub fn is_program_change(status: u8) -> bool {
    status == PROGRAM_CHANGE
}

/// Find the program number in a reply: the data byte following the first
/// `C0` status. Returns `None` if there is no `C0`, it is the last byte, or
/// what follows it is not a data byte.
pub fn find_program_change(data: &[u8]) -> Option<u8> {
    let pos = data.iter().position(|&b| is_program_change(b))?;
    match data.get(pos + 1) {
        Some(&value) if value < 0x80 => Some(value),
        _ => None,
    }
}

/// Lowercase space-separated hex, the form `amidi -S` accepts.
pub fn to_hex(bytes: &[u8]) -> String {
    bytes
        .iter()
        .map(|b| format!("{:02x}", b))
        .collect::<Vec<_>>()
        .join(" ")
}

static HEX_BYTE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b([0-9a-fA-F]{2})\b").expect("valid hex byte regex"));

/// Parse a textual dump such as `F0 52 00 58 28 ... F7\nC0 05\n` back into
/// bytes. Tokens that are not 2-digit hex are skipped.
pub fn parse_hex_dump(text: &str) -> Vec<u8> {
    HEX_BYTE
        .captures_iter(text)
        .filter_map(|c| u8::from_str_radix(&c[1], 16).ok())
        .collect()
}
