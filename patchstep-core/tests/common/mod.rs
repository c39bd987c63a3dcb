#![allow(dead_code)]
//! Test harness: a controller wired to the simulated pedal, scripted pins,
//! a recording indicator and a manual clock.

use std::time::Duration;

use patchstep_core::clock::ManualClock;
use patchstep_core::config::Config;
use patchstep_core::controller::Controller;
use patchstep_core::gpio::{TestIndicator, TestPins};
use patchstep_core::midi::TestBus;

pub const PEDAL: &str = "ZOOM MS Series MIDI";
pub const INC: u8 = 24;
pub const DEC: u8 = 23;
pub const POLL: Duration = Duration::from_millis(25);

pub struct Rig {
    pub controller: Controller<TestBus, TestPins, TestIndicator, ManualClock>,
    pub bus: TestBus,
    pub pins: TestPins,
    pub indicator: TestIndicator,
    pub clock: ManualClock,
}

impl Rig {
    /// Start against a pedal that is plugged in and showing `patch`.
    pub fn start(patch: u8) -> Self {
        Self::start_with(TestBus::new(PEDAL, patch), TestPins::new())
    }

    pub fn start_with(bus: TestBus, pins: TestPins) -> Self {
        let indicator = TestIndicator::new();
        let clock = ManualClock::new();
        let controller = Controller::start(
            &Config::load(),
            bus.clone(),
            pins.clone(),
            indicator.clone(),
            clock.clone(),
        );
        Self {
            controller,
            bus,
            pins,
            indicator,
            clock,
        }
    }

    /// Run whole poll cycles until at least `duration` has passed.
    pub fn run_for(&mut self, duration: Duration) {
        let until = self.clock.elapsed() + duration;
        while self.clock.elapsed() < until {
            self.controller.tick();
        }
    }

    pub fn run_ms(&mut self, ms: u64) {
        self.run_for(Duration::from_millis(ms));
    }

    /// Press `pin`, keep it down for `ms`, let go and run one more cycle.
    pub fn hold(&mut self, pin: u8, ms: u64) {
        self.pins.press(pin);
        self.run_ms(ms);
        self.pins.release(pin);
        self.controller.tick();
    }

    /// A short tap: down for one cycle, up for the next.
    pub fn tap(&mut self, pin: u8) {
        self.hold(pin, POLL.as_millis() as u64);
    }
}
