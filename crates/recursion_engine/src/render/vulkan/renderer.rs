//! Clear-based frame renderer
//!
//! A frame is a render pass whose load-op clears the whole image to the background
//! color, plus an optional `vkCmdClearAttachments` over the stack frame rectangle.
//! No pipeline or shaders are involved.

use ash::vk;

use super::commands::{Fill, FrameCommands};
use super::context::{VulkanContext, VulkanError, VulkanResult};
use super::sync::FrameSync;
use super::targets::PresentTargets;
use crate::animation::FrameRect;
use crate::config::RendererSettings;
use crate::render::{surface_rect, Color, Window, WINDOW_TITLE};

/// How many times a frame is retried after the swapchain went out of date
const MAX_FRAME_ATTEMPTS: usize = 2;

enum FrameStatus {
    Presented,
    OutOfDate,
}

/// Swapchain extent for a framebuffer of `size` pixels, or `None` if it has no area
///
/// A minimized window reports a zero-sized framebuffer, and a swapchain cannot be that small.
pub fn drawable_extent(size: (u32, u32)) -> Option<vk::Extent2D> {
    match size {
        (0, _) | (_, 0) => None,
        (width, height) => Some(vk::Extent2D { width, height }),
    }
}

/// Draws and presents solid-color frames on a window
///
/// Field order is drop order: everything created from the device goes before the context.
pub struct FrameRenderer {
    sync: FrameSync,
    commands: FrameCommands,
    targets: Option<PresentTargets>,
    needs_recreate: bool,
    context: VulkanContext,
}

impl FrameRenderer {
    /// Set up Vulkan for `window`
    pub fn new(window: &mut Window, settings: &RendererSettings) -> VulkanResult<Self> {
        let extent = drawable_extent(window.framebuffer_size()).ok_or_else(|| {
            VulkanError::InitializationFailed("Window framebuffer has no area".to_string())
        })?;
        let context = VulkanContext::new(window, WINDOW_TITLE, settings, extent)?;

        let targets = PresentTargets::new(context.device(), context.swapchain()?)?;
        let commands = FrameCommands::new(context.device(), context.graphics_family())?;
        let sync = FrameSync::new(context.device())?;

        log::info!("Vulkan renderer ready");

        Ok(Self {
            sync,
            commands,
            targets: Some(targets),
            needs_recreate: false,
            context,
        })
    }

    /// Clear to `background`, fill `fill` if given, and present
    ///
    /// `fill` is in window coordinates; it is scaled to the swapchain and clipped.
    /// While the window is minimized nothing is drawn and the swapchain is rebuilt on the
    /// first frame after it is restored.
    pub fn draw(&mut self, window: &Window, background: Color, fill: Option<(&FrameRect, Color)>) -> VulkanResult<()> {
        for _ in 0..MAX_FRAME_ATTEMPTS {
            let Some(extent) = drawable_extent(window.framebuffer_size()) else {
                log::trace!("Window minimized, skipping frame");
                self.needs_recreate = true;
                return Ok(());
            };

            if self.needs_recreate {
                self.recreate(extent)?;
            }

            match self.try_draw(window, background, fill)? {
                FrameStatus::Presented => return Ok(()),
                FrameStatus::OutOfDate => self.needs_recreate = true,
            }
        }

        Err(VulkanError::InvalidOperation {
            reason: "Swapchain stayed out of date".to_string(),
        })
    }

    fn try_draw(&mut self, window: &Window, background: Color, fill: Option<(&FrameRect, Color)>) -> VulkanResult<FrameStatus> {
        self.sync.wait_for_previous_frame()?;

        let swapchain = self.context.swapchain()?;
        let acquired = unsafe {
            swapchain.loader().acquire_next_image(
                swapchain.handle(),
                u64::MAX,
                self.sync.image_available,
                vk::Fence::null(),
            )
        };
        let image_index = match acquired {
            Ok((index, _suboptimal)) => index,
            Err(vk::Result::ERROR_OUT_OF_DATE_KHR) => return Ok(FrameStatus::OutOfDate),
            Err(e) => return Err(VulkanError::Api(e)),
        };

        let targets = self.targets.as_ref().ok_or_else(|| VulkanError::InvalidOperation {
            reason: "Render targets missing".to_string(),
        })?;
        let extent = swapchain.extent();
        let fill = fill.and_then(|(frame, color)| {
            surface_rect(frame, window.size(), (extent.width, extent.height)).map(|rect| Fill {
                rect: to_vk_rect(&rect),
                color: color.to_unorm(),
            })
        });
        let command_buffer =
            self.commands
                .record(targets, targets.framebuffer(image_index)?, background.to_unorm(), fill)?;

        // Only reset once work is certain to be submitted, or the next wait deadlocks.
        self.sync.arm()?;

        let wait_semaphores = [self.sync.image_available];
        let wait_stages = [vk::PipelineStageFlags::COLOR_ATTACHMENT_OUTPUT];
        let command_buffers = [command_buffer];
        let signal_semaphores = [self.sync.render_finished];
        let submit_info = vk::SubmitInfo::builder()
            .wait_semaphores(&wait_semaphores)
            .wait_dst_stage_mask(&wait_stages)
            .command_buffers(&command_buffers)
            .signal_semaphores(&signal_semaphores)
            .build();

        unsafe {
            self.context
                .device()
                .queue_submit(self.context.graphics_queue(), &[submit_info], self.sync.in_flight)
                .map_err(VulkanError::Api)?;
        }

        let swapchains = [swapchain.handle()];
        let image_indices = [image_index];
        let present_info = vk::PresentInfoKHR::builder()
            .wait_semaphores(&signal_semaphores)
            .swapchains(&swapchains)
            .image_indices(&image_indices);

        let presented = unsafe { swapchain.loader().queue_present(self.context.present_queue(), &present_info) };
        match presented {
            Ok(false) => Ok(FrameStatus::Presented),
            Ok(true) => {
                log::debug!("Swapchain suboptimal, recreating before next frame");
                self.needs_recreate = true;
                Ok(FrameStatus::Presented)
            }
            Err(vk::Result::ERROR_OUT_OF_DATE_KHR) => Ok(FrameStatus::OutOfDate),
            Err(e) => Err(VulkanError::Api(e)),
        }
    }

    fn recreate(&mut self, extent: vk::Extent2D) -> VulkanResult<()> {
        log::debug!("Recreating swapchain at {}x{}", extent.width, extent.height);

        // Framebuffers reference the old image views.
        self.targets = None;
        self.context.recreate_swapchain(extent)?;

        let device = self.context.device();
        self.targets = Some(PresentTargets::new(device, self.context.swapchain()?)?);
        self.sync = FrameSync::new(device)?;
        self.needs_recreate = false;

        Ok(())
    }
}

impl Drop for FrameRenderer {
    fn drop(&mut self) {
        log::debug!("Releasing Vulkan renderer");
        unsafe {
            let _ = self.context.device().device_wait_idle();
        }
    }
}

fn to_vk_rect(rect: &FrameRect) -> vk::Rect2D {
    vk::Rect2D {
        offset: vk::Offset2D { x: rect.x, y: rect.y },
        extent: vk::Extent2D {
            width: rect.width,
            height: rect.height,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_minimized_framebuffer_is_not_drawable() {
        assert!(drawable_extent((0, 0)).is_none());
        assert!(drawable_extent((0, 640)).is_none());
        assert!(drawable_extent((300, 0)).is_none());
    }

    #[test]
    fn test_visible_framebuffer_is_drawable() {
        let extent = drawable_extent((600, 1280)).unwrap();
        assert_eq!((extent.width, extent.height), (600, 1280));
    }

    #[test]
    fn test_frame_rect_to_vulkan() {
        let rect = to_vk_rect(&FrameRect { x: 250, y: 180, width: 100, height: 100 });
        assert_eq!((rect.offset.x, rect.offset.y), (250, 180));
        assert_eq!((rect.extent.width, rect.extent.height), (100, 100));
    }
}
