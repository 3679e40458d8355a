//! Terminal snake: a fixed-rate game state machine plus a text renderer that
//! repaints in place and only clears the screen when the screen changes.

pub mod config;
pub mod controls;
pub mod display;
pub mod error;
pub mod frame;
pub mod game;
pub mod input;
pub mod snake;
pub mod term;

/// `(row, column)` on the board, zero based.
pub type Coords = (usize, usize);
