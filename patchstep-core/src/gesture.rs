//! Press / hold / auto-repeat classification for one foot switch.
//!
//! | State                     | Leaves when                    | Goes to                   |
//! |---------------------------|--------------------------------|---------------------------|
//! | `Idle`                    | high → low edge (step)         | `JustPressed`             |
//! | `JustPressed`             | the edge step has run          | `WaitingForHoldThreshold` |
//! | `WaitingForHoldThreshold` | released                       | `Idle`                    |
//! | `WaitingForHoldThreshold` | held for `hold_threshold` (step) | `AutoRepeating`         |
//! | `AutoRepeating`           | `now >= next_due` (step)       | `AutoRepeating`           |
//! | `AutoRepeating`           | released                       | `Idle`                    |
//!
//! The tracker never reads pins or clocks itself: the caller passes the
//! previous and current samples and the current time, so the whole machine
//! is a function of its inputs.

use std::time::{Duration, Instant};

use patchstep_types::{Button, PinSignal};

use crate::config::Timings;

/// What the caller should do this poll.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Gesture {
    /// The press edge itself.
    Press,
    /// An auto-repeat step while held.
    Repeat,
}

/// Per-switch state. The timestamps of the non-idle variants make up the
/// scroll session; it disappears when the switch is let go.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GestureState {
    #[default]
    Idle,
    /// The edge step was requested on the previous poll, which has finished
    /// it by the time the next poll arrives.
    JustPressed { pressed_at: Instant },
    WaitingForHoldThreshold { pressed_at: Instant },
    AutoRepeating { pressed_at: Instant, next_due: Instant },
}

impl GestureState {
    /// When the current press started, if the switch is in a session.
    pub fn pressed_at(&self) -> Option<Instant> {
        match *self {
            GestureState::Idle => None,
            GestureState::JustPressed { pressed_at }
            | GestureState::WaitingForHoldThreshold { pressed_at }
            | GestureState::AutoRepeating { pressed_at, .. } => Some(pressed_at),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ButtonTracker {
    button: Button,
    state: GestureState,
    hold_threshold: Duration,
    repeat_interval: Duration,
}

impl ButtonTracker {
    pub fn new(button: Button, timings: &Timings) -> Self {
        Self {
            button,
            state: GestureState::Idle,
            hold_threshold: timings.hold_threshold,
            repeat_interval: timings.repeat_interval,
        }
    }

    pub fn button(&self) -> Button {
        self.button
    }

    pub fn state(&self) -> GestureState {
        self.state
    }

    pub fn is_scrolling(&self) -> bool {
        matches!(self.state, GestureState::AutoRepeating { .. })
    }

    /// Advance the machine by one sample. Deadlines are met when
    /// `now >= deadline`.
    pub fn poll(&mut self, previous: PinSignal, current: PinSignal, now: Instant) -> Option<Gesture> {
        let held = current.is_low();

        match self.state {
            GestureState::Idle => {
                if PinSignal::is_press_edge(previous, current) {
                    self.state = GestureState::JustPressed { pressed_at: now };
                    return Some(Gesture::Press);
                }
                None
            }

            GestureState::JustPressed { pressed_at }
            | GestureState::WaitingForHoldThreshold { pressed_at } => {
                if !held {
                    self.state = GestureState::Idle;
                    return None;
                }
                if now.saturating_duration_since(pressed_at) >= self.hold_threshold {
                    self.state = GestureState::AutoRepeating {
                        pressed_at,
                        next_due: now + self.repeat_interval,
                    };
                    return Some(Gesture::Repeat);
                }
                self.state = GestureState::WaitingForHoldThreshold { pressed_at };
                None
            }

            GestureState::AutoRepeating {
                pressed_at,
                next_due,
            } => {
                if !held {
                    self.state = GestureState::Idle;
                    return None;
                }
                if now >= next_due {
                    self.state = GestureState::AutoRepeating {
                        pressed_at,
                        next_due: now + self.repeat_interval,
                    };
                    return Some(Gesture::Repeat);
                }
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const POLL_MS: u64 = 25;

    /// Poll every 25 ms from t=0 until `end_ms`, holding the switch low from
    /// `press_ms` (inclusive) to `release_ms` (exclusive). Returns the times
    /// at which gestures fired.
    fn simulate(press_ms: u64, release_ms: u64, end_ms: u64) -> Vec<(u64, Gesture)> {
        let origin = Instant::now();
        let mut tracker = ButtonTracker::new(Button::Increment, &Timings::default());
        let mut previous = PinSignal::High;
        let mut fired = Vec::new();

        let mut t = 0;
        while t <= end_ms {
            let current = if t >= press_ms && t < release_ms {
                PinSignal::Low
            } else {
                PinSignal::High
            };
            if let Some(g) = tracker.poll(previous, current, origin + Duration::from_millis(t)) {
                fired.push((t, g));
            }
            previous = current;
            t += POLL_MS;
        }
        fired
    }

    #[test]
    fn test_tap_steps_once() {
        let fired = simulate(0, 200, 1000);
        assert_eq!(fired, vec![(0, Gesture::Press)]);
    }

    #[test]
    fn test_hold_repeats_on_schedule() {
        let fired = simulate(0, 1400, 2000);
        assert_eq!(
            fired,
            vec![
                (0, Gesture::Press),
                (500, Gesture::Repeat),
                (800, Gesture::Repeat),
                (1100, Gesture::Repeat),
            ]
        );
    }

    #[test]
    fn test_release_exactly_at_threshold_is_a_tap() {
        assert_eq!(simulate(0, 500, 1000).len(), 1);
        assert_eq!(simulate(0, 525, 1000).len(), 2);
    }

    #[test]
    fn test_repeat_boundary_is_inclusive() {
        // Held through the 800 ms sample, released before 825.
        assert_eq!(simulate(0, 825, 1000).len(), 3);
        assert_eq!(simulate(0, 800, 1000).len(), 2);
    }

    #[test]
    fn test_press_starting_later() {
        let fired = simulate(100, 700, 1000);
        assert_eq!(fired, vec![(100, Gesture::Press), (600, Gesture::Repeat)]);
    }

    #[test]
    fn test_no_edge_without_prior_high() {
        let origin = Instant::now();
        let mut tracker = ButtonTracker::new(Button::Decrement, &Timings::default());
        assert_eq!(tracker.poll(PinSignal::Low, PinSignal::Low, origin), None);
        assert_eq!(
            tracker.poll(PinSignal::Indeterminate, PinSignal::Low, origin),
            None
        );
        assert_eq!(tracker.state(), GestureState::Idle);
    }

    #[test]
    fn test_indeterminate_ends_session() {
        let origin = Instant::now();
        let mut tracker = ButtonTracker::new(Button::Increment, &Timings::default());
        tracker.poll(PinSignal::High, PinSignal::Low, origin);
        assert!(tracker.state().pressed_at().is_some());
        tracker.poll(
            PinSignal::Low,
            PinSignal::Indeterminate,
            origin + Duration::from_millis(25),
        );
        assert_eq!(tracker.state(), GestureState::Idle);
    }

    #[test]
    fn test_late_poll_after_stall_starts_repeating_at_once() {
        // A recovery can block the loop well past the threshold; the next
        // poll re-evaluates from the press time instead of resuming.
        let origin = Instant::now();
        let mut tracker = ButtonTracker::new(Button::Increment, &Timings::default());
        assert_eq!(
            tracker.poll(PinSignal::High, PinSignal::Low, origin),
            Some(Gesture::Press)
        );
        let later = origin + Duration::from_secs(4);
        assert_eq!(
            tracker.poll(PinSignal::Low, PinSignal::Low, later),
            Some(Gesture::Repeat)
        );
        assert!(tracker.is_scrolling());
        assert_eq!(
            tracker.poll(PinSignal::Low, PinSignal::Low, later + Duration::from_millis(25)),
            None
        );
    }
}
