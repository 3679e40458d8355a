use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};

use crate::input::Key;
use crate::snake::Direction;

/// State written by the input thread and read by the tick thread.
///
/// Only the latest queued direction matters: a new request overwrites the
/// previous one.
#[derive(Debug)]
pub struct Controls {
    active: AtomicU8,
    queued: AtomicU8,
    running: AtomicBool,
}

impl Controls {
    pub fn new(direction: Direction) -> Self {
        Controls {
            active: AtomicU8::new(direction as u8),
            queued: AtomicU8::new(direction as u8),
            running: AtomicBool::new(true),
        }
    }

    /// Queues `direction` for the next update unless it would reverse the
    /// snake into its own neck.
    pub fn request(&self, direction: Direction) -> bool {
        if direction == self.active().opposite() {
            return false;
        }
        self.queued.store(direction as u8, Ordering::Release);
        true
    }

    /// Makes the queued direction the active one and returns it.
    ///
    /// `request` checks against the active direction it saw, which may be a
    /// latch behind. A queued reversal of the current heading is dropped here
    /// and the snake keeps going.
    pub fn latch(&self) -> Direction {
        let active = self.active();
        let queued = self.queued();
        if queued == active.opposite() {
            let _ = self.queued.compare_exchange(
                queued as u8,
                active as u8,
                Ordering::AcqRel,
                Ordering::Acquire,
            );
            return active;
        }
        self.active.store(queued as u8, Ordering::Release);
        queued
    }

    pub fn active(&self) -> Direction {
        Direction::from_u8(self.active.load(Ordering::Acquire))
    }

    pub fn queued(&self) -> Direction {
        Direction::from_u8(self.queued.load(Ordering::Acquire))
    }

    pub fn stop(&self) {
        self.running.store(false, Ordering::Release);
    }

    pub fn running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    /// Key handler for the play screen. Returns `false` once the listener
    /// should stop.
    pub fn on_press(&self, key: Key) -> bool {
        match key {
            Key::Quit => {
                self.stop();
                false
            }
            Key::Move(direction) => {
                self.request(direction);
                true
            }
            Key::Start => true,
        }
    }
}
