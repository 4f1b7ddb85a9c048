//! Stack frame rectangle and color tags

use crate::render::{palette, Color};

/// On-screen box standing for the innermost active call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameRect {
    /// Left edge in window coordinates
    pub x: i32,
    /// Top edge in window coordinates
    pub y: i32,
    /// Width in window coordinates
    pub width: u32,
    /// Height in window coordinates
    pub height: u32,
}

/// Where the outermost call is drawn
pub const START_FRAME: FrameRect = FrameRect {
    x: 125,
    y: 590,
    width: 50,
    height: 50,
};

/// Vertical distance between two nested calls
pub const STEP: i32 = 50;

/// Top edge of the deepest call
pub const BASE_Y: i32 = 90;

// Descent compares y against BASE_Y for equality, so it must land on it exactly.
const _: () = assert!(START_FRAME.y >= BASE_Y && (START_FRAME.y - BASE_Y) % STEP == 0);

/// Number of recursive calls made below the outermost one
pub const DEPTH: usize = ((START_FRAME.y - BASE_Y) / STEP) as usize;

/// Whether a frame is being pushed or popped
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ColorTag {
    /// Frame pushed onto the stack
    Entering,
    /// Frame about to be popped off the stack
    Exiting,
}

impl ColorTag {
    /// Fill color for this tag
    pub const fn color(self) -> Color {
        match self {
            Self::Entering => palette::LIME,
            Self::Exiting => palette::PINK,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_depth_matches_constants() {
        assert_eq!(DEPTH, 10);
        assert_eq!(START_FRAME.y - STEP * DEPTH as i32, BASE_Y);
    }

    #[test]
    fn test_tag_colors_differ() {
        assert_eq!(ColorTag::Entering.color(), palette::LIME);
        assert_eq!(ColorTag::Exiting.color(), palette::PINK);
        assert_ne!(ColorTag::Entering.color(), palette::BACKGROUND);
    }
}
