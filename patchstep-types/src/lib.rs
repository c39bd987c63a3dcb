//! # patchstep-types
//!
//! Shared type definitions for the patchstep foot controller.
//! Plain values only: no I/O, no clocks, no transport.

mod button;
mod patch;
mod pin;

pub use button::Button;
pub use patch::{step, PatchNumber, PATCH_COUNT};
pub use pin::PinSignal;
