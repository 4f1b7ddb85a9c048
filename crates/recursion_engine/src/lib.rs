//! # Recursion Engine
//!
//! Draws the runtime stack of a recursive function as it grows and shrinks.
//!
//! A single rectangle stands for the innermost stack frame. Every call moves it one
//! step up the window and draws it in the "entering" color; every return moves it back
//! down and draws it in the "exiting" color. Frames are shown for one second each so the
//! push/pop order can be followed by eye.
//!
//! ## Features
//!
//! - **Vulkan Presentation**: Clear-based rendering, no shaders required
//! - **GLFW Windowing**: Fixed-size centered window with close handling
//! - **Testable Core**: Animation runs against traits, so it can be driven by fakes
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use recursion_engine::prelude::*;
//!
//! fn main() -> std::process::ExitCode {
//!     let config = VisualizerConfig::default();
//!     let result = session::run(|| VulkanDisplay::open(&config));
//!     session::report(&result).into()
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions, clippy::similar_names)]

pub mod animation;
pub mod config;
pub mod foundation;
pub mod render;
pub mod session;

/// Common imports for engine users
pub mod prelude {
    pub use crate::{
        animation::{Animator, ColorTag, Descent, FrameRect, Outcome},
        config::{Config, ConfigError, VisualizerConfig},
        render::{EventPump, RenderError, RenderTarget, VulkanDisplay},
        session::{self, ExitStatus, SetupError, VisualizerError},
    };
}
