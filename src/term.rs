use std::io::{self, stdout, Stdout};

use crossterm::{cursor, execute, terminal};
use crossterm::terminal::{EnterAlternateScreen, LeaveAlternateScreen};

/// Source of the current terminal dimensions as `(columns, rows)`.
pub trait TerminalSize {
    fn size(&self) -> io::Result<(u16, u16)>;
}

/// Fixed size, for rendering off-terminal.
impl TerminalSize for (u16, u16) {
    fn size(&self) -> io::Result<(u16, u16)> {
        Ok(*self)
    }
}

/// Owns the terminal modes the game needs and puts them back on `restore`.
pub struct TermManager {
    stdout: Stdout,
    active: bool,
}

impl TermManager {
    pub fn new() -> Self {
        TermManager { stdout: stdout(), active: false }
    }

    pub fn setup(&mut self) -> io::Result<()> {
        execute!(self.stdout, EnterAlternateScreen)?;
        self.set_raw_mode(true)?;
        self.set_cursor_visibility(false)?;
        self.set_cursor_blink(false)?;
        self.active = true;
        Ok(())
    }

    pub fn restore(&mut self) -> io::Result<()> {
        if !self.active {
            return Ok(());
        }

        self.active = false;
        self.set_raw_mode(false)?;
        self.set_cursor_visibility(true)?;
        self.set_cursor_blink(true)?;
        execute!(self.stdout, LeaveAlternateScreen)
    }

    ///////////////////////////////////////////////////////////////////////////

    fn set_raw_mode(&self, option: bool) -> io::Result<()> {
        if option {
            terminal::enable_raw_mode()
        } else {
            terminal::disable_raw_mode()
        }
    }

    fn set_cursor_blink(&mut self, option: bool) -> io::Result<()> {
        if option {
            execute!(self.stdout, cursor::EnableBlinking)
        } else {
            execute!(self.stdout, cursor::DisableBlinking)
        }
    }

    fn set_cursor_visibility(&mut self, option: bool) -> io::Result<()> {
        if option {
            execute!(self.stdout, cursor::Show)
        } else {
            execute!(self.stdout, cursor::Hide)
        }
    }
}

/// Asks the real terminal every time.
#[derive(Debug, Clone, Copy, Default)]
pub struct LiveSize;

impl TerminalSize for LiveSize {
    fn size(&self) -> io::Result<(u16, u16)> {
        terminal::size()
    }
}

impl Drop for TermManager {
    fn drop(&mut self) {
        let _ = self.restore();
    }
}
