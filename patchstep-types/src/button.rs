use serde::{Deserialize, Serialize};

/// One of the two foot switches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Button {
    Increment,
    Decrement,
}

impl Button {
    /// Decrement is polled first, matching the hardware's wiring order.
    pub const ALL: [Button; 2] = [Button::Decrement, Button::Increment];

    /// Patch offset applied by one step of this button.
    pub fn delta(self) -> i8 {
        match self {
            Button::Increment => 1,
            Button::Decrement => -1,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Button::Increment => "increment",
            Button::Decrement => "decrement",
        }
    }

    /// Past-tense verb used in progress lines.
    pub fn verb(self) -> &'static str {
        match self {
            Button::Increment => "incremented",
            Button::Decrement => "decremented",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deltas() {
        assert_eq!(Button::Increment.delta(), 1);
        assert_eq!(Button::Decrement.delta(), -1);
    }
}
