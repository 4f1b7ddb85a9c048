//! Synchronization for the single frame in flight
//!
//! The CPU sleeps for a full second after every present, so one frame in flight is plenty.

use ash::{vk, Device};

use super::context::{VulkanError, VulkanResult};

/// Semaphores and fence for one frame
///
/// Recreated with the swapchain: a present that fails leaves `render_finished` in an
/// unknown state.
pub struct FrameSync {
    device: Device,
    /// Signaled when the acquired swapchain image can be written
    pub image_available: vk::Semaphore,
    /// Signaled when the frame's commands finished, waited on by present
    pub render_finished: vk::Semaphore,
    /// Signaled when the GPU is done with the command buffer
    pub in_flight: vk::Fence,
}

impl FrameSync {
    /// Create the objects, with the fence already signaled so the first wait returns
    pub fn new(device: &Device) -> VulkanResult<Self> {
        let mut sync = Self {
            device: device.clone(),
            image_available: vk::Semaphore::null(),
            render_finished: vk::Semaphore::null(),
            in_flight: vk::Fence::null(),
        };

        // Null handles are ignored by Drop, so a partial set is released correctly.
        let semaphore_info = vk::SemaphoreCreateInfo::default();
        unsafe {
            sync.image_available = device.create_semaphore(&semaphore_info, None).map_err(VulkanError::Api)?;
            sync.render_finished = device.create_semaphore(&semaphore_info, None).map_err(VulkanError::Api)?;
            sync.in_flight = device
                .create_fence(
                    &vk::FenceCreateInfo::builder().flags(vk::FenceCreateFlags::SIGNALED),
                    None,
                )
                .map_err(VulkanError::Api)?;
        }

        Ok(sync)
    }

    /// Block until the previous frame's commands have finished
    pub fn wait_for_previous_frame(&self) -> VulkanResult<()> {
        unsafe { self.device.wait_for_fences(&[self.in_flight], true, u64::MAX) }.map_err(VulkanError::Api)
    }

    /// Unsignal the fence ahead of a submit that will signal it again
    pub fn arm(&self) -> VulkanResult<()> {
        unsafe { self.device.reset_fences(&[self.in_flight]) }.map_err(VulkanError::Api)
    }
}

impl Drop for FrameSync {
    fn drop(&mut self) {
        unsafe {
            self.device.destroy_fence(self.in_flight, None);
            self.device.destroy_semaphore(self.render_finished, None);
            self.device.destroy_semaphore(self.image_available, None);
        }
    }
}
