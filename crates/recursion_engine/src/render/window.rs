//! GLFW window for the visualizer
//!
//! Fixed-size, centered, non-resizable window without an OpenGL context,
//! ready for a Vulkan surface.

use ash::vk;
use thiserror::Error;

/// Windowing failures
#[derive(Error, Debug)]
pub enum WindowError {
    /// GLFW could not be initialized
    #[error("GLFW initialization failed: {0}")]
    InitializationFailed(String),

    /// GLFW returned no window
    #[error("GLFW could not create the window")]
    CreationFailed,

    /// Vulkan surface or extension query failed
    #[error("GLFW error: {0}")]
    GlfwError(String),
}

/// Result type for window operations
pub type WindowResult<T> = Result<T, WindowError>;

/// The visualizer window
///
/// Dropping it destroys the window and terminates GLFW.
pub struct Window {
    glfw: glfw::Glfw,
    handle: glfw::PWindow,
    events: glfw::GlfwReceiver<(f64, glfw::WindowEvent)>,
}

impl Window {
    /// Open a `width` x `height` window centered on the primary monitor
    pub fn new(title: &str, width: u32, height: u32) -> WindowResult<Self> {
        let mut glfw = glfw::init(glfw::log_errors)
            .map_err(|e| WindowError::InitializationFailed(format!("{:?}", e)))?;

        glfw.window_hint(glfw::WindowHint::ClientApi(glfw::ClientApiHint::NoApi));
        glfw.window_hint(glfw::WindowHint::Resizable(false));
        // Hidden until positioned, so it does not jump on screen.
        glfw.window_hint(glfw::WindowHint::Visible(false));

        let (mut handle, events) = glfw
            .create_window(width, height, title, glfw::WindowMode::Windowed)
            .ok_or(WindowError::CreationFailed)?;

        let monitor_size = glfw.with_primary_monitor(|_, monitor| {
            monitor
                .and_then(|monitor| monitor.get_video_mode())
                .map(|mode| (mode.width, mode.height))
        });
        match monitor_size {
            Some(monitor) => {
                let (x, y) = centered_origin(monitor, (width, height));
                handle.set_pos(x, y);
            }
            None => log::warn!("No primary monitor video mode, leaving window position to the system"),
        }

        handle.set_close_polling(true);
        handle.show();

        log::info!("Opened {}x{} window \"{}\"", width, height, title);

        Ok(Self { glfw, handle, events })
    }

    /// Drain pending events and report whether a close was requested
    ///
    /// Every queued event is consumed even after a close request is seen.
    pub fn poll_close(&mut self) -> bool {
        self.glfw.poll_events();

        let close_events = glfw::flush_messages(&self.events)
            .filter(|(_, event)| matches!(event, glfw::WindowEvent::Close))
            .count();
        if close_events > 0 {
            log::debug!("Close requested");
        }

        close_events > 0 || self.handle.should_close()
    }

    /// Window size in screen coordinates
    pub fn size(&self) -> (u32, u32) {
        non_negative(self.handle.get_size())
    }

    /// Framebuffer size in pixels; zero while minimized on some platforms
    pub fn framebuffer_size(&self) -> (u32, u32) {
        non_negative(self.handle.get_framebuffer_size())
    }

    /// Instance extensions GLFW needs to create a surface
    pub fn vulkan_extensions(&self) -> WindowResult<Vec<String>> {
        self.glfw
            .get_required_instance_extensions()
            .ok_or_else(|| WindowError::GlfwError("Vulkan is not available to GLFW".to_string()))
    }

    /// Create a presentation surface for this window on `instance`
    pub fn create_surface(&mut self, instance: vk::Instance) -> WindowResult<vk::SurfaceKHR> {
        let mut surface = vk::SurfaceKHR::null();
        match self.handle.create_window_surface(instance, std::ptr::null(), &mut surface) {
            vk::Result::SUCCESS => Ok(surface),
            failure => Err(WindowError::GlfwError(format!("Surface creation returned {:?}", failure))),
        }
    }
}

impl Drop for Window {
    fn drop(&mut self) {
        log::debug!("Destroying window");
    }
}

fn non_negative((width, height): (i32, i32)) -> (u32, u32) {
    (u32::try_from(width).unwrap_or(0), u32::try_from(height).unwrap_or(0))
}

/// Top-left position that centers `window` on `monitor`
///
/// A window larger than the monitor gets a negative origin, so it stays centered.
fn centered_origin(monitor: (u32, u32), window: (u32, u32)) -> (i32, i32) {
    let axis = |screen: u32, extent: u32| {
        let offset = (i64::from(screen) - i64::from(extent)) / 2;
        i32::try_from(offset).unwrap_or(0)
    };
    (axis(monitor.0, window.0), axis(monitor.1, window.1))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_centered_on_monitor() {
        assert_eq!(centered_origin((1920, 1080), (300, 640)), (810, 220));
    }

    #[test]
    fn test_larger_than_monitor() {
        assert_eq!(centered_origin((800, 600), (300, 640)), (250, -20));
    }

    #[test]
    fn test_negative_sizes_clamp_to_zero() {
        assert_eq!(non_negative((-1, 640)), (0, 640));
    }
}
