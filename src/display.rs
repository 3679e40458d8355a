use std::collections::HashMap;
use std::io::Write;

use crossterm::{cursor, queue, terminal::{self, ClearType}};
use tracing::trace;

use crate::error::DisplayError;
use crate::frame::{Frame, CLEAR_LINE, CURSOR_HOME};
use crate::term::TerminalSize;

/// Rendering context: one current frame, plus enough history to choose
/// between a full clear and a cursor-home repaint.
pub struct Display<W: Write, S: TerminalSize> {
    sink: W,
    size: S,
    current: Option<Frame>,
    render_history: Vec<String>,
    frames: HashMap<String, Frame>,
    frames_rendered: usize,
}

impl<W: Write, S: TerminalSize> Display<W, S> {
    pub fn new(sink: W, size: S) -> Self {
        Display {
            sink,
            size,
            current: None,
            render_history: Vec::new(),
            frames: HashMap::new(),
            frames_rendered: 0,
        }
    }

    /// Adopts a fresh, empty frame under `key` and hands it out for drawing.
    pub fn new_frame(&mut self, key: &str) -> &mut Frame {
        self.current.insert(Frame::new(key))
    }

    /// Adopts a copy of the current frame under `new_key`. The old key goes
    /// into the render history, so the next render of the copy clears.
    pub fn duplicate_frame(&mut self, new_key: &str) -> Result<&mut Frame, DisplayError> {
        let current = self.current.as_ref().ok_or(DisplayError::NoFrame)?;
        let copy = current.copy(new_key);
        self.render_history.push(current.key().to_owned());
        Ok(self.current.insert(copy))
    }

    pub fn render(&mut self) -> Result<(), DisplayError> {
        let frame = self.current.as_ref().ok_or(DisplayError::NoFrame)?;
        self.frames.insert(frame.key().to_owned(), frame.clone());

        let switching = self.switching_frames();
        if switching {
            trace!(key = frame.key(), "full redraw");
            queue!(self.sink, terminal::Clear(ClearType::All), cursor::MoveTo(0, 0))?;
        } else {
            self.sink.write_all(CURSOR_HOME.as_bytes())?;
        }

        self.sink.write_all(frame.value().as_bytes())?;

        // Wipe whatever a taller previous frame left below this one.
        let (_, rows) = self.size.size()?;
        let unrendered = i64::from(rows) - 1 - frame.rows() as i64;
        for _ in 0..(unrendered - 1).max(0) {
            self.sink.write_all(CLEAR_LINE.as_bytes())?;
            self.sink.write_all(b"\r\n")?;
        }
        self.sink.flush()?;

        if switching {
            self.render_history.push(frame.key().to_owned());
        }
        self.frames_rendered += 1;
        Ok(())
    }

    pub fn frame(&self) -> Option<&Frame> {
        self.current.as_ref()
    }

    /// Last rendered content for `key`.
    pub fn rendered(&self, key: &str) -> Option<&Frame> {
        self.frames.get(key)
    }

    pub fn frames_rendered(&self) -> usize {
        self.frames_rendered
    }

    pub fn terminal_size(&self) -> std::io::Result<(u16, u16)> {
        self.size.size()
    }

    pub fn sink(&self) -> &W {
        &self.sink
    }

    fn switching_frames(&self) -> bool {
        match (self.render_history.last(), &self.current) {
            (Some(last), Some(frame)) => last != frame.key(),
            _ => true,
        }
    }
}
