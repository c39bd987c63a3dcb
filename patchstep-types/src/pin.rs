use serde::{Deserialize, Serialize};

/// Point-in-time level of a digital input.
///
/// The foot switches pull their pins low when pressed, so `Low` means
/// "held" and `High` means "released". Anything the pin reader could not
/// make sense of is `Indeterminate`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum PinSignal {
    Low,
    High,
    #[default]
    Indeterminate,
}

impl PinSignal {
    pub fn is_low(self) -> bool {
        self == PinSignal::Low
    }

    /// A press edge is a clean high-to-low transition. Transitions out of
    /// `Indeterminate` never count.
    pub fn is_press_edge(previous: PinSignal, current: PinSignal) -> bool {
        previous == PinSignal::High && current == PinSignal::Low
    }
}
