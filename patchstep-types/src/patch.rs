use std::fmt;

/// Number of program slots on the pedal.
pub const PATCH_COUNT: u8 = 50;

/// A program slot on the pedal, always in `0..PATCH_COUNT`.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize,
)]
#[serde(transparent)]
pub struct PatchNumber(u8);

impl PatchNumber {
    /// Returns `None` when `n` is outside the pedal's slot range.
    pub fn new(n: u8) -> Option<Self> {
        (n < PATCH_COUNT).then_some(Self(n))
    }

    /// Reduce any integer onto the slot ring.
    pub fn wrapping(n: i32) -> Self {
        Self(n.rem_euclid(PATCH_COUNT as i32) as u8)
    }

    pub fn get(self) -> u8 {
        self.0
    }

    /// Move `delta` slots around the ring.
    pub fn step(self, delta: i8) -> Self {
        Self::wrapping(self.0 as i32 + delta as i32)
    }
}

impl fmt::Display for PatchNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// `(patch + delta) mod PATCH_COUNT`, wrapping in both directions.
pub fn step(patch: PatchNumber, delta: i8) -> PatchNumber {
    patch.step(delta)
}
