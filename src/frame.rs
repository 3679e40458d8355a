use std::fmt::{self, Write};

pub const CURSOR_HOME: &str = "\x1b[H";
pub const CLEAR_LINE: &str = "\x1b[2K";

/// Raw mode turns off output post-processing, so every line carries its own `\r`.
const LINE_END: &str = "\r\n";

/// One buffered screen. Nothing is written to the terminal until a
/// `Display` flushes it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    key: String,
    buffer: String,
}

impl Frame {
    pub fn new(key: impl Into<String>) -> Self {
        Frame { key: key.into(), buffer: String::new() }
    }

    /// Same content, new identity.
    pub fn copy(&self, new_key: impl Into<String>) -> Self {
        Frame { key: new_key.into(), buffer: self.buffer.clone() }
    }

    pub fn home(&mut self) {
        self.buffer.push_str(CURSOR_HOME);
    }

    /// Moves the cursor to a 1-based terminal position.
    pub fn goto(&mut self, row: usize, column: usize) {
        // Writing into a String cannot fail.
        let _ = write!(self.buffer, "\x1b[{};{}H", row, column);
    }

    /// Appends `content` followed by a line break.
    pub fn draw(&mut self, content: impl fmt::Display) {
        let _ = write!(self.buffer, "{}{}", content, LINE_END);
    }

    /// Appends `content` as is.
    pub fn draw_inline(&mut self, content: impl fmt::Display) {
        let _ = write!(self.buffer, "{}", content);
    }

    pub fn clear(&mut self) {
        self.buffer.clear();
    }

    pub fn value(&self) -> &str {
        &self.buffer
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn rows(&self) -> usize {
        self.buffer.matches('\n').count()
    }
}
