use std::fmt;
use std::time::Duration;

use serde::Deserialize;

const DEFAULT_CONFIG: &str = include_str!("../config.toml");

/// Environment variable that overrides the configured transport.
pub const TRANSPORT_ENV: &str = "PATCHSTEP_TRANSPORT";

#[derive(Deserialize, Default)]
struct ConfigFile {
    #[serde(default)]
    device: DeviceConfig,
    #[serde(default)]
    pins: PinsConfig,
    #[serde(default)]
    timing: TimingConfig,
}

#[derive(Deserialize, Default)]
struct DeviceConfig {
    name: Option<String>,
    transport: Option<String>,
}

#[derive(Deserialize, Default)]
struct PinsConfig {
    increment: Option<u8>,
    decrement: Option<u8>,
    indicator: Option<u8>,
}

#[derive(Deserialize, Default)]
struct TimingConfig {
    poll_interval_ms: Option<u64>,
    hold_threshold_ms: Option<u64>,
    repeat_interval_ms: Option<u64>,
    reply_timeout_ms: Option<u64>,
    editing_settle_ms: Option<u64>,
    recovery_backoff_ms: Option<u64>,
    status_interval_ms: Option<u64>,
}

/// Which MIDI transport the controller talks through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TransportKind {
    /// `amidi` from alsa-utils, one process per command.
    #[default]
    Amidi,
    /// Native ALSA sequencer connections through `midir`.
    Midir,
}

impl fmt::Display for TransportKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransportKind::Amidi => write!(f, "amidi"),
            TransportKind::Midir => write!(f, "midir"),
        }
    }
}

/// GPIO numbers for the two switches and the status LED.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PinAssignments {
    pub increment: u8,
    pub decrement: u8,
    pub indicator: u8,
}

/// Every interval the controller waits on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timings {
    /// Sleep between main-loop cycles.
    pub poll_interval: Duration,
    /// How long a switch must stay down before auto-repeat starts.
    pub hold_threshold: Duration,
    /// Gap between auto-repeat steps.
    pub repeat_interval: Duration,
    /// Deadline for the pedal's answer to a patch query.
    pub reply_timeout: Duration,
    /// Pause after enabling parameter editing.
    pub editing_settle: Duration,
    /// Sleep between recovery attempts.
    pub recovery_backoff: Duration,
    /// Cadence of the presence probe driving the LED.
    pub status_interval: Duration,
}

pub struct Config {
    device: DeviceConfig,
    pins: PinsConfig,
    timing: TimingConfig,
}

impl Config {
    /// Built-in defaults, with the transport optionally overridden by
    /// `PATCHSTEP_TRANSPORT`.
    pub fn load() -> Self {
        let base: ConfigFile =
            toml::from_str(DEFAULT_CONFIG).expect("Failed to parse embedded config.toml");

        let mut config = Config {
            device: base.device,
            pins: base.pins,
            timing: base.timing,
        };

        if let Ok(value) = std::env::var(TRANSPORT_ENV) {
            match parse_transport(&value) {
                Some(_) => config.device.transport = Some(value),
                None => {
                    log::warn!(target: "config", "ignoring unknown {} value {:?}", TRANSPORT_ENV, value)
                }
            }
        }

        config
    }

    pub fn device_name(&self) -> &str {
        self.device.name.as_deref().unwrap_or("ZOOM MS Series MIDI")
    }

    pub fn set_device_name(&mut self, name: impl Into<String>) {
        self.device.name = Some(name.into());
    }

    pub fn transport(&self) -> TransportKind {
        self.device
            .transport
            .as_deref()
            .and_then(parse_transport)
            .unwrap_or_default()
    }

    pub fn set_transport(&mut self, kind: TransportKind) {
        self.device.transport = Some(kind.to_string());
    }

    pub fn pins(&self) -> PinAssignments {
        PinAssignments {
            increment: self.pins.increment.unwrap_or(24),
            decrement: self.pins.decrement.unwrap_or(23),
            indicator: self.pins.indicator.unwrap_or(16),
        }
    }

    pub fn timings(&self) -> Timings {
        let t = &self.timing;
        Timings {
            poll_interval: millis(t.poll_interval_ms, 25),
            hold_threshold: millis(t.hold_threshold_ms, 500),
            repeat_interval: millis(t.repeat_interval_ms, 300),
            reply_timeout: millis(t.reply_timeout_ms, 60),
            editing_settle: millis(t.editing_settle_ms, 100),
            recovery_backoff: millis(t.recovery_backoff_ms, 300),
            status_interval: millis(t.status_interval_ms, 3000),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::load()
    }
}

impl Default for Timings {
    fn default() -> Self {
        Config::load().timings()
    }
}

/// Zero intervals would spin the loop, so they are clamped to 1 ms.
fn millis(value: Option<u64>, fallback: u64) -> Duration {
    Duration::from_millis(value.unwrap_or(fallback).max(1))
}

pub fn parse_transport(s: &str) -> Option<TransportKind> {
    match s.trim().to_lowercase().as_str() {
        "amidi" => Some(TransportKind::Amidi),
        "midir" | "alsa" | "native" => Some(TransportKind::Midir),
        _ => None,
    }
}
