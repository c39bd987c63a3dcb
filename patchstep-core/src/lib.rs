//! # patchstep-core
//!
//! Library behind the patchstep foot controller: two switches step a ZOOM
//! MS-series pedal's patch up and down over MIDI, with a status LED showing
//! whether the pedal is reachable.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use patchstep_core::clock::SystemClock;
//! use patchstep_core::config::Config;
//! use patchstep_core::controller::Controller;
//! use patchstep_core::gpio::{Pinctrl, PinctrlIndicator};
//! use patchstep_core::midi::AmidiBus;
//!
//! let config = Config::load();
//! let indicator = PinctrlIndicator::new(config.pins().indicator);
//! let mut controller =
//!     Controller::start(&config, AmidiBus::new(), Pinctrl::new(), indicator, SystemClock);
//! controller.run();
//! ```
//!
//! ## Module Overview
//!
//! - [`config`]: compiled-in TOML defaults: identity string, transport, pins, timings
//! - [`clock`]: `Clock` trait, the wall clock, and `ManualClock` for tests
//! - [`gpio`]: `PinReader` / `IndicatorOutput` boundaries and their `pinctrl` implementations
//! - [`midi`]: pedal protocol frames, the `MidiBus` / `MidiLink` transport traits,
//!   the `amidi` and `midir` transports, and the simulated `TestBus`
//! - [`device`]: `DeviceChannel`: enable editing, read patch, write patch
//! - [`locator`]: finding the pedal and the unconditional recovery loop
//! - [`gesture`]: per-switch press / hold / auto-repeat state machine
//! - [`status`]: presence probe driving the indicator
//! - [`controller`]: the poll loop tying it all together

pub mod clock;
pub mod config;
pub mod controller;
pub mod device;
pub mod gesture;
pub mod gpio;
pub mod locator;
pub mod midi;
pub mod status;

pub use patchstep_types::{Button, PatchNumber, PinSignal, PATCH_COUNT};
