//! Process-level session: set up a display, play the animation, tear down
//!
//! Teardown is ownership-based. Whatever [`run`] opened is dropped before it returns,
//! whether the animation completed, the window was closed, or rendering failed.

use crate::animation::{Animator, Outcome};
use crate::config::ConfigError;
use crate::render::{EventPump, RenderError, RenderTarget, WindowError};
use thiserror::Error;

/// Fatal errors raised while bringing the display up
#[derive(Error, Debug)]
pub enum SetupError {
    /// Windowing subsystem could not be initialized
    #[error("Initialization of windowing subsystem failed: {0}")]
    SubsystemInit(String),

    /// Window could not be created
    #[error("Creating window failed: {0}")]
    WindowCreation(String),

    /// Render surface (instance, device or swapchain) could not be created
    #[error("Creating renderer failed: {0}")]
    SurfaceCreation(String),

    /// Configuration file could not be read
    #[error("Loading configuration failed: {0}")]
    Config(#[from] ConfigError),
}

impl From<WindowError> for SetupError {
    fn from(error: WindowError) -> Self {
        match error {
            WindowError::InitializationFailed(_) => Self::SubsystemInit(error.to_string()),
            WindowError::CreationFailed => Self::WindowCreation(error.to_string()),
            WindowError::GlfwError(_) => Self::SurfaceCreation(error.to_string()),
        }
    }
}

/// Anything that ends a session with a failure status
#[derive(Error, Debug)]
pub enum VisualizerError {
    /// Setup failed before the first frame
    #[error(transparent)]
    Setup(#[from] SetupError),

    /// Rendering failed mid-animation
    #[error(transparent)]
    Render(#[from] RenderError),
}

/// Process exit status
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitStatus {
    /// Animation completed or the window was closed
    Success,
    /// Setup or rendering failed
    Failure,
}

impl From<ExitStatus> for std::process::ExitCode {
    fn from(status: ExitStatus) -> Self {
        match status {
            ExitStatus::Success => Self::SUCCESS,
            ExitStatus::Failure => Self::FAILURE,
        }
    }
}

/// Open a display with `open` and play the animation on it
///
/// The display is dropped (window and GPU resources released) before this returns.
pub fn run<D, F>(open: F) -> Result<Outcome, VisualizerError>
where
    D: RenderTarget + EventPump,
    F: FnOnce() -> Result<D, SetupError>,
{
    let mut display = open()?;
    log::info!("Display ready");

    let outcome = Animator::new(&mut display).play()?;

    drop(display);
    log::info!("Display released");
    Ok(outcome)
}

/// Diagnostic line printed for a failed session
pub fn diagnostic(error: &VisualizerError) -> String {
    format!("error - {error}")
}

/// Report a session result and pick the exit status
///
/// Failures are written to stderr (and logged) with the underlying error text.
pub fn report(result: &Result<Outcome, VisualizerError>) -> ExitStatus {
    match result {
        Ok(Outcome::Completed) => {
            log::info!("Recursion visualized, exiting");
            ExitStatus::Success
        }
        Ok(Outcome::Closed) => {
            log::info!("Window closed by user, exiting");
            ExitStatus::Success
        }
        Err(error) => {
            log::error!("Session failed: {:?}", error);
            eprintln!("{}", diagnostic(error));
            ExitStatus::Failure
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::animation::testing::ScriptedDisplay;

    #[test]
    fn test_completed_session_succeeds() {
        let result = run(|| Ok(ScriptedDisplay::new()));
        assert!(matches!(result, Ok(Outcome::Completed)));
        assert_eq!(report(&result), ExitStatus::Success);
    }

    #[test]
    fn test_closed_session_succeeds() {
        let result = run(|| Ok(ScriptedDisplay::closing_on_poll(7)));
        assert!(matches!(result, Ok(Outcome::Closed)));
        assert_eq!(report(&result), ExitStatus::Success);
    }

    #[test]
    fn test_window_creation_failure() {
        let mut opened = false;
        let result = run(|| -> Result<ScriptedDisplay, SetupError> {
            opened = true;
            Err(WindowError::CreationFailed.into())
        });

        assert!(opened);
        let error = result.as_ref().unwrap_err();
        assert!(matches!(error, VisualizerError::Setup(SetupError::WindowCreation(_))));
        assert!(diagnostic(error).starts_with("error - Creating window failed"));
        assert_eq!(report(&result), ExitStatus::Failure);
    }

    #[test]
    fn test_window_error_taxonomy() {
        let init: SetupError = WindowError::InitializationFailed("no display".to_string()).into();
        assert!(matches!(init, SetupError::SubsystemInit(ref text) if text.contains("no display")));

        let surface: SetupError = WindowError::GlfwError("surface".to_string()).into();
        assert!(matches!(surface, SetupError::SurfaceCreation(_)));
    }

    #[test]
    fn test_render_failure_fails_session() {
        let result = run(|| Ok(ScriptedDisplay::failing_on_render(1)));
        assert!(matches!(result, Err(VisualizerError::Render(_))));
        assert_eq!(report(&result), ExitStatus::Failure);
    }
}
