//! Presentation swapchain
//!
//! A recreated swapchain is a new value; the context drops the retired one.

use ash::extensions::khr::{Surface, Swapchain as SwapchainLoader};
use ash::{vk, Device, Instance};

use super::context::{Gpu, VulkanError, VulkanResult};
use crate::config::PresentModePreference;

/// Swapchain and one color view per image
pub struct Swapchain {
    device: Device,
    loader: SwapchainLoader,
    handle: vk::SwapchainKHR,
    views: Vec<vk::ImageView>,
    format: vk::SurfaceFormatKHR,
    extent: vk::Extent2D,
}

impl Swapchain {
    /// Create a swapchain on `surface`, retiring `old_swapchain` if it is not null
    pub fn new(
        instance: &Instance,
        device: &Device,
        (surface_loader, surface): (&Surface, vk::SurfaceKHR),
        gpu: &Gpu,
        requested: vk::Extent2D,
        present_mode: PresentModePreference,
        old_swapchain: vk::SwapchainKHR,
    ) -> VulkanResult<Self> {
        let (caps, formats, modes) = unsafe {
            (
                surface_loader.get_physical_device_surface_capabilities(gpu.handle, surface),
                surface_loader.get_physical_device_surface_formats(gpu.handle, surface),
                surface_loader.get_physical_device_surface_present_modes(gpu.handle, surface),
            )
        };
        let caps = caps.map_err(VulkanError::Api)?;
        let format = choose_surface_format(&formats.map_err(VulkanError::Api)?)?;
        let mode = choose_present_mode(&modes.map_err(VulkanError::Api)?, present_mode);
        let extent = choose_extent(&caps, requested);

        // One spare image so acquire never waits on the presentation engine.
        let wanted_images = caps.min_image_count + 1;
        let image_count = match caps.max_image_count {
            0 => wanted_images,
            max => wanted_images.min(max),
        };

        let families = [gpu.queues.graphics, gpu.queues.present];
        let (sharing, shared_families) = if gpu.queues.is_split() {
            (vk::SharingMode::CONCURRENT, &families[..])
        } else {
            (vk::SharingMode::EXCLUSIVE, &families[..0])
        };

        let create_info = vk::SwapchainCreateInfoKHR::builder()
            .surface(surface)
            .min_image_count(image_count)
            .image_format(format.format)
            .image_color_space(format.color_space)
            .image_extent(extent)
            .image_array_layers(1)
            .image_usage(vk::ImageUsageFlags::COLOR_ATTACHMENT)
            .image_sharing_mode(sharing)
            .queue_family_indices(shared_families)
            .pre_transform(caps.current_transform)
            .composite_alpha(vk::CompositeAlphaFlagsKHR::OPAQUE)
            .present_mode(mode)
            .clipped(true)
            .old_swapchain(old_swapchain);

        let loader = SwapchainLoader::new(instance, device);
        let handle = unsafe { loader.create_swapchain(&create_info, None) }.map_err(VulkanError::Api)?;

        // From here the value owns the swapchain, so Drop releases a partial set of views.
        let mut swapchain = Self {
            device: device.clone(),
            loader,
            handle,
            views: Vec::new(),
            format,
            extent,
        };

        let images = unsafe { swapchain.loader.get_swapchain_images(handle) }.map_err(VulkanError::Api)?;
        for image in images {
            let view = create_color_view(device, image, format.format)?;
            swapchain.views.push(view);
        }

        log::debug!(
            "Swapchain {}x{}, {} images, {:?}, {:?}",
            extent.width,
            extent.height,
            swapchain.views.len(),
            format.format,
            mode
        );

        Ok(swapchain)
    }

    /// Image size in pixels
    pub fn extent(&self) -> vk::Extent2D {
        self.extent
    }

    /// Image format and color space
    pub fn format(&self) -> vk::SurfaceFormatKHR {
        self.format
    }

    /// Views in swapchain image order
    pub fn image_views(&self) -> &[vk::ImageView] {
        &self.views
    }

    /// Raw handle, for acquire and present
    pub fn handle(&self) -> vk::SwapchainKHR {
        self.handle
    }

    /// Extension functions for acquire and present
    pub fn loader(&self) -> &SwapchainLoader {
        &self.loader
    }
}

impl Drop for Swapchain {
    fn drop(&mut self) {
        unsafe {
            for view in self.views.drain(..) {
                self.device.destroy_image_view(view, None);
            }
            self.loader.destroy_swapchain(self.handle, None);
        }
    }
}

fn create_color_view(device: &Device, image: vk::Image, format: vk::Format) -> VulkanResult<vk::ImageView> {
    let create_info = vk::ImageViewCreateInfo::builder()
        .image(image)
        .view_type(vk::ImageViewType::TYPE_2D)
        .format(format)
        .subresource_range(vk::ImageSubresourceRange {
            aspect_mask: vk::ImageAspectFlags::COLOR,
            base_mip_level: 0,
            level_count: 1,
            base_array_layer: 0,
            layer_count: 1,
        });

    unsafe { device.create_image_view(&create_info, None) }.map_err(VulkanError::Api)
}

/// Pick an 8-bit UNORM format so clear colors reach the screen unchanged
fn choose_surface_format(formats: &[vk::SurfaceFormatKHR]) -> VulkanResult<vk::SurfaceFormatKHR> {
    let preferred = [vk::Format::B8G8R8A8_UNORM, vk::Format::R8G8B8A8_UNORM];

    preferred
        .iter()
        .find_map(|wanted| {
            formats.iter().find(|sf| {
                sf.format == *wanted && sf.color_space == vk::ColorSpaceKHR::SRGB_NONLINEAR
            })
        })
        .or_else(|| formats.first())
        .copied()
        .ok_or_else(|| VulkanError::InitializationFailed("Surface reports no formats".to_string()))
}

fn choose_present_mode(available: &[vk::PresentModeKHR], preference: PresentModePreference) -> vk::PresentModeKHR {
    let wanted = match preference {
        PresentModePreference::Fifo => vk::PresentModeKHR::FIFO,
        PresentModePreference::Mailbox => vk::PresentModeKHR::MAILBOX,
    };

    if available.contains(&wanted) {
        wanted
    } else {
        vk::PresentModeKHR::FIFO
    }
}

/// The surface dictates the extent unless it reports the "any size" sentinel
fn choose_extent(caps: &vk::SurfaceCapabilitiesKHR, requested: vk::Extent2D) -> vk::Extent2D {
    if caps.current_extent.width != u32::MAX {
        return caps.current_extent;
    }

    let (min, max) = (caps.min_image_extent, caps.max_image_extent);
    vk::Extent2D {
        width: requested.width.clamp(min.width, max.width),
        height: requested.height.clamp(min.height, max.height),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn surface_format(format: vk::Format) -> vk::SurfaceFormatKHR {
        vk::SurfaceFormatKHR {
            format,
            color_space: vk::ColorSpaceKHR::SRGB_NONLINEAR,
        }
    }

    #[test]
    fn test_prefers_unorm_format() {
        let formats = [
            surface_format(vk::Format::B8G8R8A8_SRGB),
            surface_format(vk::Format::B8G8R8A8_UNORM),
        ];
        let chosen = choose_surface_format(&formats).unwrap();
        assert_eq!(chosen.format, vk::Format::B8G8R8A8_UNORM);
    }

    #[test]
    fn test_falls_back_to_first_format() {
        let formats = [surface_format(vk::Format::A2B10G10R10_UNORM_PACK32)];
        let chosen = choose_surface_format(&formats).unwrap();
        assert_eq!(chosen.format, vk::Format::A2B10G10R10_UNORM_PACK32);
        assert!(choose_surface_format(&[]).is_err());
    }

    #[test]
    fn test_present_mode_fallback() {
        let fifo_only = [vk::PresentModeKHR::FIFO];
        assert_eq!(
            choose_present_mode(&fifo_only, PresentModePreference::Mailbox),
            vk::PresentModeKHR::FIFO
        );

        let both = [vk::PresentModeKHR::FIFO, vk::PresentModeKHR::MAILBOX];
        assert_eq!(
            choose_present_mode(&both, PresentModePreference::Mailbox),
            vk::PresentModeKHR::MAILBOX
        );
    }

    #[test]
    fn test_extent_follows_surface_when_fixed() {
        let caps = vk::SurfaceCapabilitiesKHR {
            current_extent: vk::Extent2D { width: 600, height: 1280 },
            ..Default::default()
        };
        let extent = choose_extent(&caps, vk::Extent2D { width: 300, height: 640 });
        assert_eq!((extent.width, extent.height), (600, 1280));
    }

    #[test]
    fn test_extent_clamped_when_free() {
        let caps = vk::SurfaceCapabilitiesKHR {
            current_extent: vk::Extent2D { width: u32::MAX, height: u32::MAX },
            min_image_extent: vk::Extent2D { width: 1, height: 1 },
            max_image_extent: vk::Extent2D { width: 256, height: 4096 },
            ..Default::default()
        };
        let extent = choose_extent(&caps, vk::Extent2D { width: 300, height: 640 });
        assert_eq!((extent.width, extent.height), (256, 640));
    }
}
