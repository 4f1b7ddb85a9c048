//! Scripted display for exercising the animation without a GPU

use super::{ColorTag, FrameRect};
use crate::render::{EventPump, RenderError, RenderTarget};

/// One interaction with the display, in order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Call {
    Poll,
    Background,
    Frame { y: i32, tag: ColorTag },
}

/// Records every call and can close the window or fail a render on cue
#[derive(Debug, Default)]
pub(crate) struct ScriptedDisplay {
    calls: Vec<Call>,
    close_on_poll: Option<usize>,
    fail_on_render: Option<usize>,
}

impl ScriptedDisplay {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Report a close request on the `n`th poll (1-based)
    pub(crate) fn closing_on_poll(n: usize) -> Self {
        Self {
            close_on_poll: Some(n),
            ..Self::default()
        }
    }

    /// Fail the `n`th render (1-based, background frames included)
    pub(crate) fn failing_on_render(n: usize) -> Self {
        Self {
            fail_on_render: Some(n),
            ..Self::default()
        }
    }

    pub(crate) fn calls(&self) -> &[Call] {
        &self.calls
    }

    pub(crate) fn polls(&self) -> usize {
        self.calls.iter().filter(|call| **call == Call::Poll).count()
    }

    pub(crate) fn renders(&self) -> usize {
        self.calls.iter().filter(|call| **call != Call::Poll).count()
    }

    fn record_render(&mut self, call: Call) -> Result<(), RenderError> {
        self.calls.push(call);
        if self.fail_on_render == Some(self.renders()) {
            return Err(RenderError::Presentation("scripted failure".to_string()));
        }
        Ok(())
    }
}

impl RenderTarget for ScriptedDisplay {
    fn present(&mut self, frame: &FrameRect, tag: ColorTag) -> Result<(), RenderError> {
        self.record_render(Call::Frame { y: frame.y, tag })
    }

    fn present_background(&mut self) -> Result<(), RenderError> {
        self.record_render(Call::Background)
    }
}

impl EventPump for ScriptedDisplay {
    fn poll_close(&mut self) -> bool {
        self.calls.push(Call::Poll);
        self.close_on_poll == Some(self.polls())
    }
}
