//! The main loop: sample both switches, turn gestures into patch steps, keep
//! the indicator current, sleep, repeat.

use std::time::{Duration, Instant};

use log::{debug, info, warn};

use patchstep_types::{Button, PatchNumber, PinSignal};

use crate::clock::Clock;
use crate::config::{Config, PinAssignments};
use crate::device::DeviceChannel;
use crate::gesture::{ButtonTracker, Gesture, GestureState};
use crate::gpio::{IndicatorOutput, PinReader};
use crate::locator::Locator;
use crate::midi::MidiBus;
use crate::status::StatusReporter;

/// One switch as the loop sees it.
struct SwitchSlot {
    pin: u8,
    last: PinSignal,
    tracker: ButtonTracker,
}

/// Owns the device handle, the hardware boundaries and all loop state.
pub struct Controller<B: MidiBus, P, I, C> {
    locator: Locator<B>,
    channel: DeviceChannel<B::Link>,
    pins: P,
    indicator: I,
    clock: C,
    status: StatusReporter,
    switches: [SwitchSlot; 2],
    poll_interval: Duration,
    status_interval: Duration,
    status_due: Instant,
    steps: u64,
}

impl<B, P, I, C> Controller<B, P, I, C>
where
    B: MidiBus,
    P: PinReader,
    I: IndicatorOutput,
    C: Clock,
{
    /// Bring the controller up: indicator off, find the pedal (waiting for
    /// it if need be), arm it, indicator on, take the first pin samples.
    pub fn start(config: &Config, bus: B, mut pins: P, mut indicator: I, clock: C) -> Self {
        let timings = config.timings();
        let assignments = config.pins();
        let mut status = StatusReporter::new();
        status.set(&mut indicator, false);

        let mut locator = Locator::new(bus, config.device_name(), &timings);
        let channel = match locator.locate() {
            Some(channel) => locator.arm(channel, &clock),
            None => {
                warn!("No pedal matching {:?} found on the MIDI bus.", locator.identity());
                locator.recover(&clock)
            }
        };
        info!(
            "talking to {} on {}",
            channel.endpoint().name,
            channel.endpoint().id
        );
        status.set(&mut indicator, true);

        let switches = Button::ALL.map(|button| {
            let pin = pin_for(&assignments, button);
            SwitchSlot {
                pin,
                last: pins.read_pin(pin),
                tracker: ButtonTracker::new(button, &timings),
            }
        });

        info!("watching for switch presses...");

        let status_due = clock.now();
        Self {
            locator,
            channel,
            pins,
            indicator,
            clock,
            status,
            switches,
            poll_interval: timings.poll_interval,
            status_interval: timings.status_interval,
            status_due,
            steps: 0,
        }
    }

    /// Poll forever.
    pub fn run(&mut self) -> ! {
        loop {
            self.tick();
        }
    }

    /// One cycle followed by the poll sleep.
    pub fn tick(&mut self) {
        self.cycle();
        self.clock.sleep(self.poll_interval);
    }

    /// Sample, dispatch gestures, report status if due, remember samples.
    pub fn cycle(&mut self) {
        let samples = [
            self.pins.read_pin(self.switches[0].pin),
            self.pins.read_pin(self.switches[1].pin),
        ];

        for (i, &sample) in samples.iter().enumerate() {
            let now = self.clock.now();
            let slot = &mut self.switches[i];
            let button = slot.tracker.button();
            match slot.tracker.poll(slot.last, sample, now) {
                Some(Gesture::Press) => {
                    info!("{} switch pressed", button.name());
                    self.step(button);
                }
                Some(Gesture::Repeat) => {
                    debug!("{} switch held, scrolling", button.name());
                    self.step(button);
                }
                None => {}
            }
        }

        let now = self.clock.now();
        if now >= self.status_due {
            self.status.report(&mut self.locator, &mut self.indicator);
            self.status_due = now + self.status_interval;
        }

        for (slot, sample) in self.switches.iter_mut().zip(samples) {
            slot.last = sample;
        }
    }

    /// Read the pedal's patch, move it by the button's delta, write it back.
    ///
    /// A failed read replaces the channel through recovery and the step
    /// starts over on the fresh channel. Nothing is written until a read on
    /// the current channel has succeeded.
    fn step(&mut self, button: Button) -> PatchNumber {
        loop {
            debug!("getting patch number");
            match self.channel.read_patch() {
                Ok(patch) => {
                    let next = patch.step(button.delta());
                    self.channel.write_patch(next);
                    self.steps += 1;
                    info!("{} patch to {}", button.verb(), next);
                    return next;
                }
                Err(e) => {
                    warn!("{} step failed: {}", button.name(), e);
                    self.channel = self.locator.recover(&self.clock);
                }
            }
        }
    }

    /// Completed patch steps since start-up.
    pub fn steps(&self) -> u64 {
        self.steps
    }

    /// Completed recoveries since start-up.
    pub fn recoveries(&self) -> u64 {
        self.locator.recoveries()
    }

    /// Where `button`'s tracker currently is.
    pub fn gesture_state(&self, button: Button) -> GestureState {
        self.switches
            .iter()
            .find(|s| s.tracker.button() == button)
            .map(|s| s.tracker.state())
            .unwrap_or_default()
    }

    pub fn channel(&self) -> &DeviceChannel<B::Link> {
        &self.channel
    }
}

fn pin_for(assignments: &PinAssignments, button: Button) -> u8 {
    match button {
        Button::Increment => assignments.increment,
        Button::Decrement => assignments.decrement,
    }
}
