//! Vulkan rendering backend
//!
//! Thin owners of Vulkan objects, and the [`FrameRenderer`] that clears and presents with them.

pub mod commands;
pub mod context;
pub mod renderer;
pub mod swapchain;
pub mod sync;
pub mod targets;

pub use context::{VulkanContext, VulkanError, VulkanResult};
pub use renderer::FrameRenderer;
