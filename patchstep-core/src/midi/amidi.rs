//! Transport that shells out to `amidi` from alsa-utils.
//!
//! Each command is a separate process, so a link holds nothing but the port
//! address and there is no connection to go stale. A vanished pedal shows
//! up as a failing `amidi` invocation or an empty dump.

use std::process::{Command, Stdio};
use std::time::Duration;

use super::transport::{Endpoint, MidiBus, MidiLink, TransportError, TransportResult};
use super::{parse_hex_dump, to_hex};

/// Endpoint discovery through `amidi -l`.
#[derive(Debug, Clone)]
pub struct AmidiBus {
    program: String,
}

impl AmidiBus {
    pub fn new() -> Self {
        Self::with_program("amidi")
    }

    /// Use a different executable, e.g. an absolute path.
    pub fn with_program(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }
}

impl Default for AmidiBus {
    fn default() -> Self {
        Self::new()
    }
}

impl MidiBus for AmidiBus {
    type Link = AmidiLink;

    fn endpoints(&mut self) -> TransportResult<Vec<Endpoint>> {
        let output = Command::new(&self.program)
            .arg("-l")
            .stderr(Stdio::null())
            .output()?;

        if !output.status.success() {
            return Err(TransportError(format!(
                "{} -l exited with {}",
                self.program, output.status
            )));
        }

        Ok(parse_port_list(&String::from_utf8_lossy(&output.stdout)))
    }

    fn open(&mut self, endpoint: &Endpoint) -> TransportResult<AmidiLink> {
        Ok(AmidiLink {
            program: self.program.clone(),
            port: endpoint.id.clone(),
        })
    }
}

/// A port address plus the executable to reach it with.
#[derive(Debug, Clone)]
pub struct AmidiLink {
    program: String,
    port: String,
}

impl AmidiLink {
    pub fn port(&self) -> &str {
        &self.port
    }
}

impl MidiLink for AmidiLink {
    fn send(&mut self, frame: &[u8]) -> TransportResult {
        let output = Command::new(&self.program)
            .args(["-p", &self.port, "-S", &to_hex(frame)])
            .stdout(Stdio::null())
            .output()?;

        if !output.status.success() {
            return Err(TransportError(format!(
                "amidi send to {} failed: {}",
                self.port,
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }
        Ok(())
    }

    fn request(&mut self, frame: &[u8], timeout: Duration) -> TransportResult<Vec<u8>> {
        let output = Command::new(&self.program)
            .args([
                "-p",
                &self.port,
                "-S",
                &to_hex(frame),
                "-d",
                "-t",
                &timeout.as_secs_f64().to_string(),
            ])
            .stderr(Stdio::null())
            .output()?;

        if !output.status.success() {
            return Err(TransportError(format!(
                "amidi query on {} exited with {}",
                self.port, output.status
            )));
        }

        Ok(parse_hex_dump(&String::from_utf8_lossy(&output.stdout)))
    }
}

/// Parse `amidi -l` output:
///
/// ```text
/// Dir Device    Name
/// IO  hw:1,0,0  ZOOM MS Series MIDI
/// ```
pub fn parse_port_list(text: &str) -> Vec<Endpoint> {
    text.lines()
        .filter_map(|line| {
            let mut parts = line.split_whitespace();
            let _dir = parts.next()?;
            let device = parts.next()?;
            if !device.contains(':') {
                return None;
            }
            let name = parts.collect::<Vec<_>>().join(" ");
            Some(Endpoint::new(device, name))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_port_list() {
        let listing = "Dir Device    Name\n\
                       IO  hw:0,0,0  Midi Through Port-0\n\
                       IO  hw:1,0,0  ZOOM MS Series MIDI\n";
        let ports = parse_port_list(listing);
        assert_eq!(ports.len(), 2);
        assert_eq!(ports[1], Endpoint::new("hw:1,0,0", "ZOOM MS Series MIDI"));
        assert!(ports[1].matches("ZOOM MS Series MIDI"));
        assert!(!ports[0].matches("ZOOM MS Series MIDI"));
    }

    #[test]
    fn test_parse_port_list_empty_and_header_only() {
        assert!(parse_port_list("").is_empty());
        assert!(parse_port_list("Dir Device    Name\n").is_empty());
    }

    #[test]
    fn test_missing_program_is_transport_error() {
        let mut bus = AmidiBus::with_program("/nonexistent/amidi-for-tests");
        assert!(bus.endpoints().is_err());

        let endpoint = Endpoint::new("hw:9,0,0", "ZOOM MS Series MIDI");
        let mut link = bus.open(&endpoint).unwrap();
        assert_eq!(link.port(), "hw:9,0,0");
        assert!(link.send(&[0xC0, 0x01]).is_err());
        assert!(link
            .request(&super::super::QUERY_PATCH, Duration::from_millis(60))
            .is_err());
    }
}
