//! Pin boundary: reading the foot switches and driving the status LED.
//!
//! On the Raspberry Pi both go through the `pinctrl` utility. Test doubles
//! live here too so tests can script switch levels and inspect LED writes.

use std::collections::HashMap;
use std::process::Command;
use std::sync::{Arc, LazyLock, Mutex};

use regex::Regex;

use patchstep_types::PinSignal;

/// Point-in-time digital reads.
pub trait PinReader {
    fn read_pin(&mut self, pin: u8) -> PinSignal;
}

/// The single status indicator output.
pub trait IndicatorOutput {
    fn write_indicator(&mut self, on: bool);
}

// ─── pinctrl ────────────────────────────────────────────────────────

/// Reads GPIO levels through `pinctrl get <pin>`.
#[derive(Debug, Default)]
pub struct Pinctrl;

impl Pinctrl {
    pub fn new() -> Self {
        Self
    }
}

impl PinReader for Pinctrl {
    fn read_pin(&mut self, pin: u8) -> PinSignal {
        let output = match Command::new("pinctrl")
            .args(["get", &pin.to_string()])
            .output()
        {
            Ok(o) => o,
            Err(e) => {
                log::debug!(target: "gpio", "pinctrl get {} failed: {}", pin, e);
                return PinSignal::Indeterminate;
            }
        };

        if !output.status.success() {
            return PinSignal::Indeterminate;
        }

        parse_pinctrl_level(&String::from_utf8_lossy(&output.stdout))
    }
}

/// Drives the LED through `pinctrl set <pin> op dh|dl`.
#[derive(Debug)]
pub struct PinctrlIndicator {
    pin: u8,
}

impl PinctrlIndicator {
    pub fn new(pin: u8) -> Self {
        Self { pin }
    }
}

impl IndicatorOutput for PinctrlIndicator {
    fn write_indicator(&mut self, on: bool) {
        let level = if on { "dh" } else { "dl" };
        let result = Command::new("pinctrl")
            .args(["set", &self.pin.to_string(), "op", level])
            .status();
        if let Err(e) = result {
            log::debug!(target: "gpio", "pinctrl set {} failed: {}", self.pin, e);
        }
    }
}

static PINCTRL_LEVEL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\|\s*(hi|lo)").expect("valid pinctrl regex"));

/// Extract the level from a `pinctrl get` line such as
/// `24: ip    pu | hi // GPIO24 = input`.
pub fn parse_pinctrl_level(output: &str) -> PinSignal {
    let level = PINCTRL_LEVEL
        .captures(output)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str());
    match level {
        Some("hi") => PinSignal::High,
        Some("lo") => PinSignal::Low,
        _ => PinSignal::Indeterminate,
    }
}

// ─── Test doubles ───────────────────────────────────────────────────

/// Scriptable pin levels. Unknown pins read as `High` (switch released).
/// Clones share the same levels.
#[derive(Debug, Clone, Default)]
pub struct TestPins {
    levels: Arc<Mutex<HashMap<u8, PinSignal>>>,
    reads: Arc<Mutex<usize>>,
}

impl TestPins {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&self, pin: u8, signal: PinSignal) {
        self.levels.lock().unwrap().insert(pin, signal);
    }

    pub fn press(&self, pin: u8) {
        self.set(pin, PinSignal::Low);
    }

    pub fn release(&self, pin: u8) {
        self.set(pin, PinSignal::High);
    }

    /// Total number of reads served.
    pub fn read_count(&self) -> usize {
        *self.reads.lock().unwrap()
    }
}

impl PinReader for TestPins {
    fn read_pin(&mut self, pin: u8) -> PinSignal {
        *self.reads.lock().unwrap() += 1;
        self.levels
            .lock()
            .unwrap()
            .get(&pin)
            .copied()
            .unwrap_or(PinSignal::High)
    }
}

/// Records every indicator write. Clones share the record.
#[derive(Debug, Clone, Default)]
pub struct TestIndicator {
    writes: Arc<Mutex<Vec<bool>>>,
}

impl TestIndicator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn writes(&self) -> Vec<bool> {
        self.writes.lock().unwrap().clone()
    }

    pub fn last(&self) -> Option<bool> {
        self.writes.lock().unwrap().last().copied()
    }
}

impl IndicatorOutput for TestIndicator {
    fn write_indicator(&mut self, on: bool) {
        self.writes.lock().unwrap().push(on);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_pinctrl_levels() {
        assert_eq!(
            parse_pinctrl_level("24: ip    pu | hi // GPIO24 = input"),
            PinSignal::High
        );
        assert_eq!(
            parse_pinctrl_level("23: ip    pu | lo // GPIO23 = input"),
            PinSignal::Low
        );
        assert_eq!(parse_pinctrl_level("16: op dh pd |hi // GPIO16 = output"), PinSignal::High);
    }

    #[test]
    fn test_parse_pinctrl_garbage_is_indeterminate() {
        assert_eq!(parse_pinctrl_level(""), PinSignal::Indeterminate);
        assert_eq!(parse_pinctrl_level("Invalid GPIO"), PinSignal::Indeterminate);
        assert_eq!(parse_pinctrl_level("24: ip pu | -- //"), PinSignal::Indeterminate);
    }

    #[test]
    fn test_test_pins_default_released() {
        let mut pins = TestPins::new();
        assert_eq!(pins.read_pin(24), PinSignal::High);
        let handle = pins.clone();
        handle.press(24);
        assert_eq!(pins.read_pin(24), PinSignal::Low);
        assert_eq!(handle.read_count(), 2);
    }
}
