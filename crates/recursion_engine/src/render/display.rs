//! Window plus Vulkan renderer, as seen by the animation

use std::thread;

use super::vulkan::FrameRenderer;
use super::{
    palette, EventPump, RenderError, RenderTarget, Window, FRAME_DELAY, WINDOW_HEIGHT,
    WINDOW_TITLE, WINDOW_WIDTH,
};
use crate::animation::{ColorTag, FrameRect};
use crate::config::VisualizerConfig;
use crate::render::Color;
use crate::session::SetupError;

/// The real on-screen display
///
/// Dropping it releases the GPU resources first, then destroys the window and
/// shuts GLFW down.
pub struct VulkanDisplay {
    renderer: FrameRenderer,
    window: Window,
}

impl VulkanDisplay {
    /// Create the window and the renderer behind it
    pub fn open(config: &VisualizerConfig) -> Result<Self, SetupError> {
        let mut window = Window::new(WINDOW_TITLE, WINDOW_WIDTH, WINDOW_HEIGHT)?;
        let renderer = FrameRenderer::new(&mut window, &config.renderer)
            .map_err(|e| SetupError::SurfaceCreation(e.to_string()))?;

        Ok(Self { renderer, window })
    }

    fn show(&mut self, fill: Option<(&FrameRect, Color)>) -> Result<(), RenderError> {
        self.renderer.draw(&self.window, palette::BACKGROUND, fill)?;
        thread::sleep(FRAME_DELAY);
        Ok(())
    }
}

impl RenderTarget for VulkanDisplay {
    fn present(&mut self, frame: &FrameRect, tag: ColorTag) -> Result<(), RenderError> {
        self.show(Some((frame, tag.color())))
    }

    fn present_background(&mut self) -> Result<(), RenderError> {
        self.show(None)
    }
}

impl EventPump for VulkanDisplay {
    fn poll_close(&mut self) -> bool {
        self.window.poll_close()
    }
}

impl Drop for VulkanDisplay {
    fn drop(&mut self) {
        log::info!("Tearing down display");
    }
}
