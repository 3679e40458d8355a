use std::io;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use tracing::{debug, warn};

use crate::snake::Direction;

/// How long one poll waits before the stop flag is checked again.
const POLL_TIMEOUT: Duration = Duration::from_millis(50);

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Key {
    Move(Direction),
    Start,
    Quit,
}

pub fn map_key(ev: KeyEvent) -> Option<Key> {
    if ev.kind != KeyEventKind::Press {
        return None;
    }
    if is_ctrl_c(&ev) {
        return Some(Key::Quit);
    }

    match ev.code {
        KeyCode::Char('w') | KeyCode::Up => Some(Key::Move(Direction::Up)),
        KeyCode::Char('a') | KeyCode::Left => Some(Key::Move(Direction::Left)),
        KeyCode::Char('s') | KeyCode::Down => Some(Key::Move(Direction::Down)),
        KeyCode::Char('d') | KeyCode::Right => Some(Key::Move(Direction::Right)),
        KeyCode::Enter => Some(Key::Start),
        KeyCode::Esc => Some(Key::Quit),
        _ => None,
    }
}

fn is_ctrl_c(ev: &KeyEvent) -> bool {
    ev.code == KeyCode::Char('c') && ev.modifiers.contains(KeyModifiers::CONTROL)
}

/// Reads terminal events on a background thread and feeds recognised keys to
/// a handler. The handler returns `false` to end the listener.
pub struct InputListener {
    handle: Option<JoinHandle<()>>,
    stop: Arc<AtomicBool>,
}

impl InputListener {
    /// Reads events from `source`, usually `crossterm_events`. `source` gets
    /// the poll timeout and returns `Ok(None)` when nothing arrived in time.
    pub fn spawn_with<E, H>(source: E, handler: H) -> io::Result<Self>
    where
        E: FnMut(Duration) -> io::Result<Option<Event>> + Send + 'static,
        H: FnMut(Key) -> bool + Send + 'static,
    {
        let stop = Arc::new(AtomicBool::new(false));
        let stop_flag = Arc::clone(&stop);

        let handle = thread::Builder::new()
            .name("input-listener".into())
            .spawn(move || listen(source, handler, &stop_flag))?;

        Ok(InputListener { handle: Some(handle), stop })
    }

    /// Asks the thread to exit and waits for it. Idempotent.
    pub fn stop(&mut self) {
        self.stop.store(true, Ordering::Release);
        self.join();
    }

    /// Whether the thread has exited, either stopped or on its own.
    pub fn finished(&self) -> bool {
        self.handle.as_ref().map_or(true, JoinHandle::is_finished)
    }

    /// Waits for the thread to exit on its own.
    pub fn join(&mut self) {
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                warn!("input listener panicked");
            }
        }
    }
}

impl Drop for InputListener {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Polls the real terminal.
pub fn crossterm_events(timeout: Duration) -> io::Result<Option<Event>> {
    if event::poll(timeout)? {
        event::read().map(Some)
    } else {
        Ok(None)
    }
}

fn listen<E, H>(mut source: E, mut handler: H, stop: &AtomicBool)
where
    E: FnMut(Duration) -> io::Result<Option<Event>>,
    H: FnMut(Key) -> bool,
{
    while !stop.load(Ordering::Acquire) {
        match source(POLL_TIMEOUT) {
            Ok(Some(Event::Key(ev))) => {
                if let Some(key) = map_key(ev) {
                    debug!(?key, "key pressed");
                    if !handler(key) {
                        break;
                    }
                }
            }
            Ok(_) => {}
            Err(err) => {
                warn!(%err, "reading terminal events failed");
                break;
            }
        }
    }
}
