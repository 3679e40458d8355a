use std::io;

use thiserror::Error;

/// Terminal outcome of a movement step.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Collision {
    #[error("Your snake hit itself")]
    SelfHit,
    #[error("Your snake hit the wall")]
    WallHit,
}

#[derive(Error, Debug, PartialEq, Eq)]
pub enum StartupError {
    #[error(
        "Minimum size required ({min_columns} columns x {min_rows} rows), \
         current size ({columns} columns x {rows} rows)"
    )]
    TooSmall {
        columns: u16,
        rows: u16,
        min_columns: u16,
        min_rows: u16,
    },
}

#[derive(Error, Debug)]
pub enum DisplayError {
    #[error("Display::new_frame must be called before Display::render")]
    NoFrame,
    #[error("terminal write failed: {0}")]
    Io(#[from] io::Error),
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("{var} must be {expected}, got {value:?}")]
    Invalid {
        var: &'static str,
        value: String,
        expected: &'static str,
    },
}
