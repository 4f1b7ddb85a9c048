//! Rendering and windowing
//!
//! The animation talks to the screen through two small traits:
//!
//! - [`RenderTarget`]: draw one frame (background plus optional rectangle) and hold it
//! - [`EventPump`]: drain host events and report whether the window was asked to close
//!
//! [`VulkanDisplay`] implements both on top of a GLFW window and a Vulkan swapchain.
//! Tests implement them with scripted fakes.

pub mod display;
pub mod vulkan;
pub mod window;

use std::time::Duration;

use crate::animation::{ColorTag, FrameRect};
use thiserror::Error;

pub use display::VulkanDisplay;
pub use window::{Window, WindowError};

/// Window title
pub const WINDOW_TITLE: &str = "Recursion Visualized";

/// Window width in screen coordinates
pub const WINDOW_WIDTH: u32 = 300;

/// Window height in screen coordinates
pub const WINDOW_HEIGHT: u32 = 640;

/// How long each presented frame stays on screen
pub const FRAME_DELAY: Duration = Duration::from_millis(1000);

/// 8-bit RGBA color
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Color {
    /// Red channel
    pub r: u8,
    /// Green channel
    pub g: u8,
    /// Blue channel
    pub b: u8,
    /// Alpha channel
    pub a: u8,
}

impl Color {
    /// Create an opaque color
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    /// Normalized channels for UNORM clear values
    pub fn to_unorm(self) -> [f32; 4] {
        [self.r, self.g, self.b, self.a].map(|channel| f32::from(channel) / 255.0)
    }
}

/// Fixed colors used by the visualizer
pub mod palette {
    use super::Color;

    /// Window background
    pub const BACKGROUND: Color = Color::rgb(0, 0, 255);
    /// Frame being pushed onto the stack
    pub const LIME: Color = Color::rgb(0, 255, 100);
    /// Frame being popped off the stack
    pub const PINK: Color = Color::rgb(255, 0, 100);
}

/// Rendering errors
#[derive(Error, Debug)]
pub enum RenderError {
    /// Vulkan backend failure
    #[error("Vulkan error: {0}")]
    Vulkan(#[from] vulkan::VulkanError),

    /// Frame could not be presented
    #[error("Presentation failed: {0}")]
    Presentation(String),
}

/// Something the animation can draw frames on
///
/// Both operations clear to [`palette::BACKGROUND`], present, then block for
/// [`FRAME_DELAY`] before returning.
pub trait RenderTarget {
    /// Draw the background with `frame` filled in the color for `tag`
    fn present(&mut self, frame: &FrameRect, tag: ColorTag) -> Result<(), RenderError>;

    /// Draw the background only
    fn present_background(&mut self) -> Result<(), RenderError>;
}

/// Source of host window events
pub trait EventPump {
    /// Drain all pending events; returns true if the window was asked to close
    fn poll_close(&mut self) -> bool;
}

/// Map a rectangle in window coordinates onto a framebuffer of `surface` pixels
///
/// The window and its framebuffer differ in size on HiDPI displays, so the rectangle
/// is scaled by the framebuffer/window ratio and then clipped to the surface.
/// Returns `None` when nothing of the rectangle is visible.
pub fn surface_rect(frame: &FrameRect, window: (u32, u32), surface: (u32, u32)) -> Option<FrameRect> {
    if window.0 == 0 || window.1 == 0 {
        return None;
    }

    let scale = |value: i64, from: u32, to: u32| value * i64::from(to) / i64::from(from);

    let left = scale(i64::from(frame.x), window.0, surface.0).max(0);
    let top = scale(i64::from(frame.y), window.1, surface.1).max(0);
    let right = scale(i64::from(frame.x) + i64::from(frame.width), window.0, surface.0)
        .min(i64::from(surface.0));
    let bottom = scale(i64::from(frame.y) + i64::from(frame.height), window.1, surface.1)
        .min(i64::from(surface.1));

    if right <= left || bottom <= top {
        return None;
    }

    Some(FrameRect {
        x: i32::try_from(left).ok()?,
        y: i32::try_from(top).ok()?,
        width: u32::try_from(right - left).ok()?,
        height: u32::try_from(bottom - top).ok()?,
    })
}
