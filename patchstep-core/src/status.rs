//! Presence indicator.
//!
//! Runs on its own slow cadence and only ever probes the bus; it never opens
//! the pedal or starts a recovery, so an unlit LED is purely informational.

use log::{info, warn};

use crate::gpio::IndicatorOutput;
use crate::locator::Locator;
use crate::midi::MidiBus;

#[derive(Debug, Default)]
pub struct StatusReporter {
    lit: Option<bool>,
}

impl StatusReporter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Last value written to the indicator.
    pub fn lit(&self) -> Option<bool> {
        self.lit
    }

    /// Drive the indicator directly.
    pub fn set<I: IndicatorOutput>(&mut self, indicator: &mut I, on: bool) {
        indicator.write_indicator(on);
        self.lit = Some(on);
    }

    /// Probe for the pedal and light the indicator accordingly. Returns
    /// whether it was found.
    pub fn report<B: MidiBus, I: IndicatorOutput>(
        &mut self,
        locator: &mut Locator<B>,
        indicator: &mut I,
    ) -> bool {
        let present = locator.is_present();
        if self.lit != Some(present) {
            if present {
                info!("pedal present on the bus");
            } else {
                warn!("pedal not visible on the bus");
            }
        }
        self.set(indicator, present);
        present
    }
}
