//! Call-stack animation
//!
//! A recursive function draws its own stack frame on the way in and on the way out.
//! Going deeper moves the rectangle up by [`STEP`]; returning moves it back down.

mod animator;
mod frame;

#[cfg(test)]
pub(crate) mod testing;

pub use animator::{Animator, Descent, Outcome};
pub use frame::{ColorTag, FrameRect, BASE_Y, DEPTH, START_FRAME, STEP};
