//! Recursive draw/unwind routine

use super::frame::{ColorTag, FrameRect, BASE_Y, START_FRAME, STEP};
use crate::render::{EventPump, RenderError, RenderTarget};

/// Result of one level of [`Animator::descend`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Descent {
    /// The call unwound normally
    Returned,
    /// The window was closed; callers must stop without drawing
    Closed,
}

/// Result of a whole animation run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Every frame was pushed and popped
    Completed,
    /// The window was closed part way through
    Closed,
}

/// Drives the call-stack animation on a display
pub struct Animator<'a, D> {
    display: &'a mut D,
    depth: usize,
}

impl<'a, D> Animator<'a, D>
where
    D: RenderTarget + EventPump,
{
    /// Create an animator borrowing the display for the duration of the run
    pub fn new(display: &'a mut D) -> Self {
        Self { display, depth: 0 }
    }

    /// Run the full animation
    ///
    /// Shows an empty background, descends from [`START_FRAME`], and shows the empty
    /// background again once the stack has fully unwound.
    pub fn play(&mut self) -> Result<Outcome, RenderError> {
        log::info!("Starting call stack animation");
        self.display.present_background()?;

        let mut frame = START_FRAME;
        if self.descend(&mut frame)? == Descent::Closed {
            log::info!("Window closed during animation");
            return Ok(Outcome::Closed);
        }

        self.display.present_background()?;
        log::info!("Call stack animation finished");
        Ok(Outcome::Completed)
    }

    /// Draw one stack frame, recurse until [`BASE_Y`], then draw it again on the way out
    ///
    /// The close signal is polled before the entering render and after the exiting one.
    /// Once it is seen no further frames are drawn at any level.
    pub fn descend(&mut self, frame: &mut FrameRect) -> Result<Descent, RenderError> {
        if self.display.poll_close() {
            return Ok(Descent::Closed);
        }

        log::debug!("push frame {} at y={}", self.depth, frame.y);
        self.display.present(frame, ColorTag::Entering)?;

        if frame.y == BASE_Y {
            return Ok(Descent::Returned);
        }

        frame.y -= STEP;
        self.depth += 1;
        let inner = self.descend(frame)?;
        self.depth -= 1;
        if inner == Descent::Closed {
            return Ok(Descent::Closed);
        }
        frame.y += STEP;

        log::debug!("pop frame {} at y={}", self.depth, frame.y);
        self.display.present(frame, ColorTag::Exiting)?;

        if self.display.poll_close() {
            return Ok(Descent::Closed);
        }

        Ok(Descent::Returned)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::animation::testing::{Call, ScriptedDisplay};
    use crate::animation::DEPTH;

    fn frames(display: &ScriptedDisplay) -> Vec<(i32, ColorTag)> {
        display
            .calls()
            .iter()
            .filter_map(|call| match call {
                Call::Frame { y, tag } => Some((*y, *tag)),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn test_descend_renders_palindrome() {
        let mut display = ScriptedDisplay::new();
        let mut frame = START_FRAME;

        let descent = Animator::new(&mut display).descend(&mut frame).unwrap();
        assert_eq!(descent, Descent::Returned);
        assert_eq!(frame, START_FRAME);

        let rendered = frames(&display);
        assert_eq!(rendered.len(), 2 * DEPTH + 1);

        let ys: Vec<i32> = rendered.iter().map(|(y, _)| *y).collect();
        let expected: Vec<i32> = (0..=10)
            .map(|level| 590 - 50 * level)
            .chain((0..10).rev().map(|level| 590 - 50 * level))
            .collect();
        assert_eq!(ys, expected);

        let reversed: Vec<i32> = ys.iter().rev().copied().collect();
        assert_eq!(ys, reversed);
        assert_eq!(ys[DEPTH], BASE_Y);
    }

    #[test]
    fn test_descend_color_tags() {
        let mut display = ScriptedDisplay::new();
        let mut frame = START_FRAME;
        Animator::new(&mut display).descend(&mut frame).unwrap();

        let rendered = frames(&display);
        let (down, up) = rendered.split_at(DEPTH + 1);
        assert!(down.iter().all(|(_, tag)| *tag == ColorTag::Entering));
        assert!(up.iter().all(|(_, tag)| *tag == ColorTag::Exiting));
        assert_eq!(up.len(), DEPTH);
    }

    #[test]
    fn test_polls_around_every_render() {
        let mut display = ScriptedDisplay::new();
        let mut frame = START_FRAME;
        Animator::new(&mut display).descend(&mut frame).unwrap();

        // Every level polls on entry; all but the base case poll again on exit.
        assert_eq!(display.polls(), 2 * DEPTH + 1);
        assert_eq!(display.calls().first(), Some(&Call::Poll));
        assert_eq!(display.calls().last(), Some(&Call::Poll));
    }

    #[test]
    fn test_base_case_renders_once() {
        let mut display = ScriptedDisplay::new();
        let mut frame = FrameRect { y: BASE_Y, ..START_FRAME };

        let descent = Animator::new(&mut display).descend(&mut frame).unwrap();
        assert_eq!(descent, Descent::Returned);
        assert_eq!(frames(&display), vec![(BASE_Y, ColorTag::Entering)]);
        assert_eq!(frame.y, BASE_Y);
    }

    #[test]
    fn test_play_completes_with_background_frames() {
        let mut display = ScriptedDisplay::new();
        let outcome = Animator::new(&mut display).play().unwrap();

        assert_eq!(outcome, Outcome::Completed);
        let calls = display.calls();
        assert_eq!(calls.first(), Some(&Call::Background));
        assert_eq!(calls.last(), Some(&Call::Background));
        assert_eq!(display.renders(), 2 * DEPTH + 1 + 2);
    }

    #[test]
    fn test_close_stops_rendering_at_every_poll() {
        let total_polls = 2 * DEPTH + 1;

        for close_at in 1..=total_polls {
            let mut display = ScriptedDisplay::closing_on_poll(close_at);
            let outcome = Animator::new(&mut display).play().unwrap();

            assert_eq!(outcome, Outcome::Closed, "close on poll {close_at}");
            assert_eq!(display.calls().last(), Some(&Call::Poll), "close on poll {close_at}");
            assert_eq!(display.polls(), close_at);
        }
    }

    #[test]
    fn test_close_on_first_poll_draws_no_frames() {
        let mut display = ScriptedDisplay::closing_on_poll(1);
        let outcome = Animator::new(&mut display).play().unwrap();

        assert_eq!(outcome, Outcome::Closed);
        assert_eq!(display.calls(), &[Call::Background, Call::Poll]);
    }

    #[test]
    fn test_render_error_propagates() {
        let mut display = ScriptedDisplay::failing_on_render(3);
        let result = Animator::new(&mut display).play();

        assert!(matches!(result, Err(RenderError::Presentation(_))));
        assert_eq!(display.renders(), 3);
    }
}
