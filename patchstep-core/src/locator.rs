//! Finding the pedal on the bus and getting it back after it goes away.

use std::time::Duration;

use log::{debug, info, warn};

use crate::clock::Clock;
use crate::config::Timings;
use crate::device::DeviceChannel;
use crate::midi::{Endpoint, MidiBus};

/// Owns the bus and knows what the pedal is called on it.
pub struct Locator<B> {
    bus: B,
    identity: String,
    reply_timeout: Duration,
    editing_settle: Duration,
    backoff: Duration,
    recoveries: u64,
}

impl<B: MidiBus> Locator<B> {
    pub fn new(bus: B, identity: impl Into<String>, timings: &Timings) -> Self {
        Self {
            bus,
            identity: identity.into(),
            reply_timeout: timings.reply_timeout,
            editing_settle: timings.editing_settle,
            backoff: timings.recovery_backoff,
            recoveries: 0,
        }
    }

    pub fn identity(&self) -> &str {
        &self.identity
    }

    /// Completed recoveries since start-up.
    pub fn recoveries(&self) -> u64 {
        self.recoveries
    }

    /// First endpoint whose name contains the identity string. A failed scan
    /// reads as "not there".
    pub fn find(&mut self) -> Option<Endpoint> {
        match self.bus.endpoints() {
            Ok(endpoints) => endpoints.into_iter().find(|e| e.matches(&self.identity)),
            Err(e) => {
                debug!("endpoint scan failed: {}", e);
                None
            }
        }
    }

    /// Presence probe: scans the bus without opening anything.
    pub fn is_present(&mut self) -> bool {
        self.find().is_some()
    }

    /// Find and open the pedal. `None` when it is not on the bus or the open
    /// fails.
    pub fn locate(&mut self) -> Option<DeviceChannel<B::Link>> {
        let endpoint = self.find()?;
        match self.bus.open(&endpoint) {
            Ok(link) => Some(DeviceChannel::new(endpoint, link, self.reply_timeout)),
            Err(e) => {
                warn!("found {} but could not open it: {}", endpoint.id, e);
                None
            }
        }
    }

    /// Block until the pedal is back, then return a freshly armed channel.
    ///
    /// Retries forever with a fixed backoff; this is the only place the
    /// controller waits without bound.
    pub fn recover<C: Clock>(&mut self, clock: &C) -> DeviceChannel<B::Link> {
        let mut attempts: u64 = 0;
        loop {
            attempts += 1;
            if attempts == 1 {
                warn!("Lost the MIDI device. Trying to reacquire...");
            } else {
                debug!("reacquire attempt {}", attempts);
            }

            if let Some(channel) = self.locate() {
                let channel = self.arm(channel, clock);
                self.recoveries += 1;
                info!(
                    "reacquired {} on {} after {} attempt(s)",
                    channel.endpoint().name,
                    channel.endpoint().id,
                    attempts
                );
                return channel;
            }
            clock.sleep(self.backoff);
        }
    }

    /// Enable editing on a newly opened channel and let the pedal settle.
    pub fn arm<C: Clock>(
        &self,
        mut channel: DeviceChannel<B::Link>,
        clock: &C,
    ) -> DeviceChannel<B::Link> {
        channel.enable_editing();
        clock.sleep(self.editing_settle);
        channel
    }
}
