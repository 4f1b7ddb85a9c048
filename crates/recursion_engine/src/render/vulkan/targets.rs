//! Render targets for the current swapchain
//!
//! One render pass and one framebuffer per swapchain image. They are rebuilt together
//! whenever the swapchain is.

use ash::{vk, Device};

use super::context::{VulkanError, VulkanResult};
use super::swapchain::Swapchain;

/// Clear pass and the framebuffers it renders into
pub struct PresentTargets {
    device: Device,
    render_pass: vk::RenderPass,
    framebuffers: Vec<vk::Framebuffer>,
    extent: vk::Extent2D,
}

impl PresentTargets {
    /// Build targets for every image of `swapchain`
    pub fn new(device: &Device, swapchain: &Swapchain) -> VulkanResult<Self> {
        let render_pass = create_clear_pass(device, swapchain.format().format)?;

        // Owning the pass from here means a failed framebuffer is cleaned up by Drop.
        let mut targets = Self {
            device: device.clone(),
            render_pass,
            framebuffers: Vec::with_capacity(swapchain.image_views().len()),
            extent: swapchain.extent(),
        };

        for &view in swapchain.image_views() {
            let attachments = [view];
            let create_info = vk::FramebufferCreateInfo::builder()
                .render_pass(render_pass)
                .attachments(&attachments)
                .width(targets.extent.width)
                .height(targets.extent.height)
                .layers(1);
            let framebuffer = unsafe { device.create_framebuffer(&create_info, None) }.map_err(VulkanError::Api)?;
            targets.framebuffers.push(framebuffer);
        }

        Ok(targets)
    }

    /// Render pass whose load-op clears to the background
    pub fn render_pass(&self) -> vk::RenderPass {
        self.render_pass
    }

    /// Whole-image render area
    pub fn render_area(&self) -> vk::Rect2D {
        vk::Rect2D {
            offset: vk::Offset2D::default(),
            extent: self.extent,
        }
    }

    /// Framebuffer wrapping swapchain image `image_index`
    pub fn framebuffer(&self, image_index: u32) -> VulkanResult<vk::Framebuffer> {
        usize::try_from(image_index)
            .ok()
            .and_then(|index| self.framebuffers.get(index))
            .copied()
            .ok_or_else(|| VulkanError::InvalidOperation {
                reason: format!("No framebuffer for swapchain image {}", image_index),
            })
    }
}

impl Drop for PresentTargets {
    fn drop(&mut self) {
        unsafe {
            for framebuffer in self.framebuffers.drain(..) {
                self.device.destroy_framebuffer(framebuffer, None);
            }
            self.device.destroy_render_pass(self.render_pass, None);
        }
    }
}

/// Single color attachment, cleared on load and handed to the presentation engine at the end
fn create_clear_pass(device: &Device, format: vk::Format) -> VulkanResult<vk::RenderPass> {
    let attachments = [vk::AttachmentDescription {
        format,
        samples: vk::SampleCountFlags::TYPE_1,
        load_op: vk::AttachmentLoadOp::CLEAR,
        store_op: vk::AttachmentStoreOp::STORE,
        stencil_load_op: vk::AttachmentLoadOp::DONT_CARE,
        stencil_store_op: vk::AttachmentStoreOp::DONT_CARE,
        initial_layout: vk::ImageLayout::UNDEFINED,
        final_layout: vk::ImageLayout::PRESENT_SRC_KHR,
        ..Default::default()
    }];
    let color_refs = [vk::AttachmentReference {
        attachment: 0,
        layout: vk::ImageLayout::COLOR_ATTACHMENT_OPTIMAL,
    }];
    let subpasses = [vk::SubpassDescription::builder()
        .pipeline_bind_point(vk::PipelineBindPoint::GRAPHICS)
        .color_attachments(&color_refs)
        .build()];

    // The load-op clear must wait for the acquire semaphore.
    let dependencies = [vk::SubpassDependency {
        src_subpass: vk::SUBPASS_EXTERNAL,
        dst_subpass: 0,
        src_stage_mask: vk::PipelineStageFlags::COLOR_ATTACHMENT_OUTPUT,
        dst_stage_mask: vk::PipelineStageFlags::COLOR_ATTACHMENT_OUTPUT,
        dst_access_mask: vk::AccessFlags::COLOR_ATTACHMENT_WRITE,
        ..Default::default()
    }];

    let create_info = vk::RenderPassCreateInfo::builder()
        .attachments(&attachments)
        .subpasses(&subpasses)
        .dependencies(&dependencies);

    unsafe { device.create_render_pass(&create_info, None) }.map_err(VulkanError::Api)
}
