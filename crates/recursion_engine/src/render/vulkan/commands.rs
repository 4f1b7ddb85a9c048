//! Command recording for a clear-only frame
//!
//! A frame is one render pass: its load-op clears to the background, and an optional
//! `vkCmdClearAttachments` fills the stack frame rectangle.

use ash::{vk, Device};

use super::context::{VulkanError, VulkanResult};
use super::targets::PresentTargets;

/// Rectangle to fill inside the render pass, already in framebuffer pixels
#[derive(Debug, Clone, Copy)]
pub struct Fill {
    /// Region to clear
    pub rect: vk::Rect2D,
    /// UNORM color to clear it to
    pub color: [f32; 4],
}

/// Command pool with the one command buffer that is re-recorded every frame
pub struct FrameCommands {
    device: Device,
    pool: vk::CommandPool,
    buffer: vk::CommandBuffer,
}

impl FrameCommands {
    /// Create the pool on `queue_family` and allocate its buffer
    pub fn new(device: &Device, queue_family: u32) -> VulkanResult<Self> {
        let pool_info = vk::CommandPoolCreateInfo::builder()
            .flags(vk::CommandPoolCreateFlags::RESET_COMMAND_BUFFER)
            .queue_family_index(queue_family);
        let pool = unsafe { device.create_command_pool(&pool_info, None) }.map_err(VulkanError::Api)?;

        let mut commands = Self {
            device: device.clone(),
            pool,
            buffer: vk::CommandBuffer::null(),
        };

        let alloc_info = vk::CommandBufferAllocateInfo::builder()
            .command_pool(pool)
            .level(vk::CommandBufferLevel::PRIMARY)
            .command_buffer_count(1);
        commands.buffer = unsafe { device.allocate_command_buffers(&alloc_info) }
            .map_err(VulkanError::Api)?
            .first()
            .copied()
            .ok_or_else(|| VulkanError::InvalidOperation {
                reason: "Driver returned no command buffer".to_string(),
            })?;

        Ok(commands)
    }

    /// Record a frame that clears `framebuffer` to `background` and applies `fill`
    ///
    /// The previous submission must have completed; beginning the buffer resets it.
    pub fn record(
        &self,
        targets: &PresentTargets,
        framebuffer: vk::Framebuffer,
        background: [f32; 4],
        fill: Option<Fill>,
    ) -> VulkanResult<vk::CommandBuffer> {
        let clear_values = [vk::ClearValue {
            color: vk::ClearColorValue { float32: background },
        }];
        let begin_info = vk::CommandBufferBeginInfo::builder().flags(vk::CommandBufferUsageFlags::ONE_TIME_SUBMIT);
        let pass_info = vk::RenderPassBeginInfo::builder()
            .render_pass(targets.render_pass())
            .framebuffer(framebuffer)
            .render_area(targets.render_area())
            .clear_values(&clear_values);

        unsafe {
            self.device
                .begin_command_buffer(self.buffer, &begin_info)
                .map_err(VulkanError::Api)?;
            self.device
                .cmd_begin_render_pass(self.buffer, &pass_info, vk::SubpassContents::INLINE);

            if let Some(fill) = fill {
                let (attachment, region) = fill_clear(fill);
                self.device.cmd_clear_attachments(self.buffer, &[attachment], &[region]);
            }

            self.device.cmd_end_render_pass(self.buffer);
            self.device.end_command_buffer(self.buffer).map_err(VulkanError::Api)?;
        }

        Ok(self.buffer)
    }
}

impl Drop for FrameCommands {
    fn drop(&mut self) {
        // Also frees the command buffer.
        unsafe { self.device.destroy_command_pool(self.pool, None) };
    }
}

fn fill_clear(fill: Fill) -> (vk::ClearAttachment, vk::ClearRect) {
    let attachment = vk::ClearAttachment {
        aspect_mask: vk::ImageAspectFlags::COLOR,
        color_attachment: 0,
        clear_value: vk::ClearValue {
            color: vk::ClearColorValue { float32: fill.color },
        },
    };
    let region = vk::ClearRect {
        rect: fill.rect,
        base_array_layer: 0,
        layer_count: 1,
    };
    (attachment, region)
}
