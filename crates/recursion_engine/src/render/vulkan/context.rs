//! Vulkan context management
//!
//! Instance, surface, GPU, logical device and swapchain for the visualizer window.
//! Creation is staged so that a failure part way through releases what was already made.

#[cfg(debug_assertions)]
use ash::extensions::ext::DebugUtils;
use ash::extensions::khr::{Surface, Swapchain as SwapchainLoader};
use ash::{vk, Device, Entry, Instance};
use std::ffi::{c_char, CStr, CString};
use thiserror::Error;

use super::swapchain::Swapchain;
use crate::config::{PresentModePreference, RendererSettings};
use crate::render::Window;

/// Vulkan-specific error types
#[derive(Error, Debug)]
pub enum VulkanError {
    /// General Vulkan API error with result code
    #[error("Vulkan API error: {0:?}")]
    Api(vk::Result),

    /// Invalid operation attempted
    #[error("Invalid operation: {reason}")]
    InvalidOperation {
        /// Description of why the operation is invalid
        reason: String,
    },

    /// Vulkan context initialization failed
    #[error("Initialization failed: {0}")]
    InitializationFailed(String),
}

/// Result type for Vulkan operations
pub type VulkanResult<T> = Result<T, VulkanError>;

/// Queue family indices used for drawing and presenting
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueueFamilies {
    /// Family that accepts graphics (and therefore clear) commands
    pub graphics: u32,
    /// Family that can present to the window surface
    pub present: u32,
}

impl QueueFamilies {
    /// Pick queue families from `(flags, can_present)` pairs in family index order
    ///
    /// A family that does both is preferred, so most GPUs end up with one exclusive queue.
    pub fn pick(families: &[(vk::QueueFlags, bool)]) -> Option<Self> {
        let indexed = || (0u32..).zip(families.iter().copied());
        let draws = |flags: vk::QueueFlags| flags.contains(vk::QueueFlags::GRAPHICS);

        if let Some((index, _)) = indexed().find(|&(_, (flags, presents))| draws(flags) && presents) {
            return Some(Self { graphics: index, present: index });
        }

        let graphics = indexed().find(|&(_, (flags, _))| draws(flags))?.0;
        let present = indexed().find(|&(_, (_, presents))| presents)?.0;
        Some(Self { graphics, present })
    }

    /// Whether drawing and presenting happen on different families
    pub fn is_split(self) -> bool {
        self.graphics != self.present
    }
}

/// The GPU chosen to drive the window
#[derive(Debug, Clone, Copy)]
pub struct Gpu {
    /// Physical device handle
    pub handle: vk::PhysicalDevice,
    /// Queue families used on it
    pub queues: QueueFamilies,
}

/// Loaded Vulkan instance, plus the validation messenger in debug builds
struct InstanceHandle {
    entry: Entry,
    instance: Instance,
    #[cfg(debug_assertions)]
    messenger: Option<(DebugUtils, vk::DebugUtilsMessengerEXT)>,
}

impl InstanceHandle {
    fn new(window: &Window, app_name: &str, validation: bool) -> VulkanResult<Self> {
        let entry = unsafe { Entry::load() }
            .map_err(|e| VulkanError::InitializationFailed(format!("Vulkan loader unavailable: {}", e)))?;

        let app_name = to_cstring(app_name)?;
        let app_info = vk::ApplicationInfo::builder()
            .application_name(&app_name)
            .application_version(vk::make_api_version(0, 1, 0, 0))
            .api_version(vk::API_VERSION_1_0);

        let glfw_extensions = window
            .vulkan_extensions()
            .map_err(|e| VulkanError::InitializationFailed(e.to_string()))?
            .iter()
            .map(|name| to_cstring(name))
            .collect::<VulkanResult<Vec<_>>>()?;
        #[cfg_attr(not(debug_assertions), allow(unused_mut))]
        let mut extensions: Vec<*const c_char> = glfw_extensions.iter().map(|name| name.as_ptr()).collect();

        let layer = to_cstring("VK_LAYER_KHRONOS_validation")?;
        let mut layers: Vec<*const c_char> = Vec::new();
        if validation {
            layers.push(layer.as_ptr());
            #[cfg(debug_assertions)]
            extensions.push(DebugUtils::name().as_ptr());
        }

        let create_info = vk::InstanceCreateInfo::builder()
            .application_info(&app_info)
            .enabled_extension_names(&extensions)
            .enabled_layer_names(&layers);
        let instance = unsafe { entry.create_instance(&create_info, None) }.map_err(VulkanError::Api)?;

        #[cfg(debug_assertions)]
        let messenger = if validation {
            let utils = DebugUtils::new(&entry, &instance);
            match create_messenger(&utils) {
                Ok(messenger) => Some((utils, messenger)),
                Err(e) => {
                    unsafe { instance.destroy_instance(None) };
                    return Err(e);
                }
            }
        } else {
            None
        };

        log::debug!("Vulkan instance created (validation: {})", validation);

        Ok(Self {
            entry,
            instance,
            #[cfg(debug_assertions)]
            messenger,
        })
    }
}

impl Drop for InstanceHandle {
    fn drop(&mut self) {
        unsafe {
            #[cfg(debug_assertions)]
            if let Some((utils, messenger)) = self.messenger.take() {
                utils.destroy_debug_utils_messenger(messenger, None);
            }
            self.instance.destroy_instance(None);
        }
    }
}

#[cfg(debug_assertions)]
fn create_messenger(utils: &DebugUtils) -> VulkanResult<vk::DebugUtilsMessengerEXT> {
    let create_info = vk::DebugUtilsMessengerCreateInfoEXT::builder()
        .message_severity(
            vk::DebugUtilsMessageSeverityFlagsEXT::WARNING | vk::DebugUtilsMessageSeverityFlagsEXT::ERROR,
        )
        .message_type(
            vk::DebugUtilsMessageTypeFlagsEXT::GENERAL
                | vk::DebugUtilsMessageTypeFlagsEXT::VALIDATION
                | vk::DebugUtilsMessageTypeFlagsEXT::PERFORMANCE,
        )
        .pfn_user_callback(Some(forward_validation_message));

    unsafe { utils.create_debug_utils_messenger(&create_info, None) }.map_err(VulkanError::Api)
}

/// Routes validation layer output into `log`
#[cfg(debug_assertions)]
unsafe extern "system" fn forward_validation_message(
    severity: vk::DebugUtilsMessageSeverityFlagsEXT,
    kind: vk::DebugUtilsMessageTypeFlagsEXT,
    data: *const vk::DebugUtilsMessengerCallbackDataEXT,
    _user_data: *mut std::ffi::c_void,
) -> vk::Bool32 {
    let message = CStr::from_ptr((*data).p_message).to_string_lossy();
    let level = if severity.contains(vk::DebugUtilsMessageSeverityFlagsEXT::ERROR) {
        log::Level::Error
    } else {
        log::Level::Warn
    };
    log::log!(level, "[Vulkan {:?}] {}", kind, message);

    vk::FALSE
}

fn to_cstring(value: &str) -> VulkanResult<CString> {
    CString::new(value)
        .map_err(|e| VulkanError::InitializationFailed(format!("Invalid name {:?}: {}", value, e)))
}

/// First GPU that has the swapchain extension and queues to draw and present with
fn pick_gpu(instance: &Instance, surface_loader: &Surface, surface: vk::SurfaceKHR) -> VulkanResult<Gpu> {
    let candidates = unsafe { instance.enumerate_physical_devices() }.map_err(VulkanError::Api)?;

    for handle in candidates {
        let properties = unsafe { instance.get_physical_device_properties(handle) };
        let name = unsafe { CStr::from_ptr(properties.device_name.as_ptr()) }.to_string_lossy();

        let extensions =
            unsafe { instance.enumerate_device_extension_properties(handle) }.map_err(VulkanError::Api)?;
        let has_swapchain = extensions
            .iter()
            .any(|ext| unsafe { CStr::from_ptr(ext.extension_name.as_ptr()) == SwapchainLoader::name() });
        if !has_swapchain {
            log::debug!("Skipping GPU {}: no swapchain support", name);
            continue;
        }

        let families = unsafe { instance.get_physical_device_queue_family_properties(handle) };
        let mut capabilities = Vec::with_capacity(families.len());
        for (index, family) in (0u32..).zip(&families) {
            let presents = unsafe { surface_loader.get_physical_device_surface_support(handle, index, surface) }
                .map_err(VulkanError::Api)?;
            capabilities.push((family.queue_flags, presents));
        }

        match QueueFamilies::pick(&capabilities) {
            Some(queues) => {
                log::info!("Selected GPU: {}", name);
                return Ok(Gpu { handle, queues });
            }
            None => log::debug!("Skipping GPU {}: cannot both draw and present", name),
        }
    }

    Err(VulkanError::InitializationFailed("No suitable GPU found".to_string()))
}

fn create_device(instance: &Instance, gpu: &Gpu) -> VulkanResult<Device> {
    let priorities = [1.0];
    let mut families = vec![gpu.queues.graphics];
    if gpu.queues.is_split() {
        families.push(gpu.queues.present);
    }
    let queue_infos: Vec<vk::DeviceQueueCreateInfo> = families
        .into_iter()
        .map(|family| {
            vk::DeviceQueueCreateInfo::builder()
                .queue_family_index(family)
                .queue_priorities(&priorities)
                .build()
        })
        .collect();

    let extensions = [SwapchainLoader::name().as_ptr()];
    let create_info = vk::DeviceCreateInfo::builder()
        .queue_create_infos(&queue_infos)
        .enabled_extension_names(&extensions);

    unsafe { instance.create_device(gpu.handle, &create_info, None) }.map_err(VulkanError::Api)
}

/// Core Vulkan objects for one window
///
/// Drop releases the swapchain, then the device and the surface, and finally the instance.
pub struct VulkanContext {
    swapchain: Option<Swapchain>,
    present_mode: PresentModePreference,
    graphics_queue: vk::Queue,
    present_queue: vk::Queue,
    device: Device,
    gpu: Gpu,
    surface: vk::SurfaceKHR,
    surface_loader: Surface,
    instance: InstanceHandle,
}

impl VulkanContext {
    /// Bring Vulkan up on `window` with a swapchain of `extent`
    pub fn new(
        window: &mut Window,
        app_name: &str,
        settings: &RendererSettings,
        extent: vk::Extent2D,
    ) -> VulkanResult<Self> {
        let validation = cfg!(debug_assertions) && settings.validation;
        let instance = InstanceHandle::new(window, app_name, validation)?;

        let surface_loader = Surface::new(&instance.entry, &instance.instance);
        let surface = window
            .create_surface(instance.instance.handle())
            .map_err(|e| VulkanError::InitializationFailed(format!("Surface creation: {}", e)))?;

        let opened = pick_gpu(&instance.instance, &surface_loader, surface)
            .and_then(|gpu| create_device(&instance.instance, &gpu).map(|device| (gpu, device)));
        let (gpu, device) = match opened {
            Ok(opened) => opened,
            Err(e) => {
                unsafe { surface_loader.destroy_surface(surface, None) };
                return Err(e);
            }
        };

        let graphics_queue = unsafe { device.get_device_queue(gpu.queues.graphics, 0) };
        let present_queue = unsafe { device.get_device_queue(gpu.queues.present, 0) };

        let mut context = Self {
            swapchain: None,
            present_mode: settings.present_mode,
            graphics_queue,
            present_queue,
            device,
            gpu,
            surface,
            surface_loader,
            instance,
        };
        context.recreate_swapchain(extent)?;

        Ok(context)
    }

    /// Logical device handle
    pub fn device(&self) -> &Device {
        &self.device
    }

    /// Queue that receives the frame's commands
    pub fn graphics_queue(&self) -> vk::Queue {
        self.graphics_queue
    }

    /// Queue that presents finished frames
    pub fn present_queue(&self) -> vk::Queue {
        self.present_queue
    }

    /// Family index of [`Self::graphics_queue`]
    pub fn graphics_family(&self) -> u32 {
        self.gpu.queues.graphics
    }

    /// Current swapchain
    pub fn swapchain(&self) -> VulkanResult<&Swapchain> {
        self.swapchain.as_ref().ok_or_else(|| VulkanError::InvalidOperation {
            reason: "Swapchain not created".to_string(),
        })
    }

    /// Replace the swapchain with one of `extent`
    ///
    /// Waits for the device to go idle first. `extent` must have area.
    pub fn recreate_swapchain(&mut self, extent: vk::Extent2D) -> VulkanResult<()> {
        unsafe { self.device.device_wait_idle() }.map_err(VulkanError::Api)?;

        let retired = self.swapchain.as_ref().map_or(vk::SwapchainKHR::null(), Swapchain::handle);
        let swapchain = Swapchain::new(
            &self.instance.instance,
            &self.device,
            (&self.surface_loader, self.surface),
            &self.gpu,
            extent,
            self.present_mode,
            retired,
        )?;

        // Dropping the previous value destroys the retired swapchain.
        self.swapchain = Some(swapchain);
        Ok(())
    }
}

impl Drop for VulkanContext {
    fn drop(&mut self) {
        unsafe {
            let _ = self.device.device_wait_idle();
            drop(self.swapchain.take());
            self.device.destroy_device(None);
            self.surface_loader.destroy_surface(self.surface, None);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const GRAPHICS: vk::QueueFlags = vk::QueueFlags::GRAPHICS;
    const TRANSFER: vk::QueueFlags = vk::QueueFlags::TRANSFER;

    #[test]
    fn test_prefers_family_that_draws_and_presents() {
        let families = [(GRAPHICS, false), (TRANSFER, true), (GRAPHICS, true)];
        let picked = QueueFamilies::pick(&families).unwrap();
        assert_eq!(picked, QueueFamilies { graphics: 2, present: 2 });
        assert!(!picked.is_split());
    }

    #[test]
    fn test_split_families() {
        let families = [(TRANSFER, true), (GRAPHICS | TRANSFER, false)];
        let picked = QueueFamilies::pick(&families).unwrap();
        assert_eq!(picked, QueueFamilies { graphics: 1, present: 0 });
        assert!(picked.is_split());
    }

    #[test]
    fn test_no_usable_families() {
        assert_eq!(QueueFamilies::pick(&[]), None);
        assert_eq!(QueueFamilies::pick(&[(GRAPHICS, false)]), None);
        assert_eq!(QueueFamilies::pick(&[(TRANSFER, true)]), None);
    }
}
