use std::fs::File;
use std::io::{self, Write};
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::sleep;
use std::time::Duration;

use crossterm::event::Event;

use anyhow::{anyhow, Context, Result};
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

use snake::config::Config;
use snake::display::Display;
use snake::game::{check_terminal_size, Game};
use snake::input::{crossterm_events, InputListener, Key};
use snake::term::{LiveSize, TermManager, TerminalSize};

const SPLASH_FRAME: &str = "splash";
const MIN_SIZE_FRAME: &str = "min_size";
const GAME_OVER_FRAME: &str = "game_over";

const PROMPT: &str = "(press enter to start / esc to quit)";

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[repr(u8)]
enum SplashState {
    Display = 0,
    Play = 1,
    Quit = 2,
}

impl SplashState {
    fn from_u8(value: u8) -> Self {
        match value {
            0 => SplashState::Display,
            1 => SplashState::Play,
            _ => SplashState::Quit,
        }
    }
}

fn main() -> Result<()> {
    let config = Config::from_env().context("invalid configuration")?;
    init_logging(&config)?;

    let mut term = TermManager::new();
    term.setup().context("failed to prepare the terminal")?;

    let result = run(&config);

    // Always try to restore terminal state.
    let _ = term.restore();
    result
}

/// Stdout is the game screen, so logs only go to `SNAKE_LOG` when it is set.
fn init_logging(config: &Config) -> Result<()> {
    let path = match &config.log_file {
        Some(path) => path,
        None => return Ok(()),
    };

    let file = File::create(path)
        .with_context(|| format!("cannot open log file {}", path.display()))?;
    let filter = EnvFilter::try_from_env("SNAKE_LOG_LEVEL")
        .unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .try_init()
        .map_err(|err| anyhow!(err))
}

fn run(config: &Config) -> Result<()> {
    let mut display = Display::new(io::stdout(), LiveSize);
    let mut choice =
        ask_to_play_or_quit(config, crossterm_events, || main_menu(&mut display, config))?;

    while choice == SplashState::Play {
        let size = display.terminal_size()?;
        if let Err(err) = check_terminal_size(size, config) {
            warn!(%err, "terminal shrank before the game started");
            choice =
                ask_to_play_or_quit(config, crossterm_events, || main_menu(&mut display, config))?;
            continue;
        }

        let (columns, rows) = size;
        let mut game = Game::new(usize::from(columns) - 2, usize::from(rows) - 3, config);
        play(&mut game, &mut display, config, crossterm_events)?;

        // `display` would name tracing's field helper inside the macro.
        let frames = display.frames_rendered();
        info!(score = game.score(), status = ?game.status(), frames, "game finished");

        game_over(&game, &mut display)?;
        choice = ask_to_play_or_quit(config, crossterm_events, || Ok(display.render()?))?;
    }

    Ok(())
}

/// Runs the fixed-rate tick loop until the snake crashes or the player quits.
/// Keys come from `events` on a listener thread that is joined before return.
fn play<W, S, E>(
    game: &mut Game,
    display: &mut Display<W, S>,
    config: &Config,
    events: E,
) -> Result<()>
where
    W: Write,
    S: TerminalSize,
    E: FnMut(Duration) -> io::Result<Option<Event>> + Send + 'static,
{
    let controls = game.controls();
    let mut listener = InputListener::spawn_with(events, move |key| controls.on_press(key))
        .context("failed to start the input listener")?;

    while game.running() {
        let step = game.update_game_state();
        game.render(display)?;

        if let Err(collision) = step {
            debug!(%collision, "tick loop stopped");
            break;
        }
        sleep(config.tick_interval);
    }

    listener.stop();
    Ok(())
}

/// Repaints with `render` until the player presses enter or escape.
fn ask_to_play_or_quit<E>(
    config: &Config,
    events: E,
    mut render: impl FnMut() -> Result<()>,
) -> Result<SplashState>
where
    E: FnMut(Duration) -> io::Result<Option<Event>> + Send + 'static,
{
    let state = Arc::new(AtomicU8::new(SplashState::Display as u8));
    let mut listener = InputListener::spawn_with(events, splash_handler(Arc::clone(&state)))
        .context("failed to start the input listener")?;

    let result = loop {
        let seen = SplashState::from_u8(state.load(Ordering::Acquire));
        if let Some(choice) = settle(seen, &state, &mut listener) {
            break Ok(choice);
        }

        if let Err(err) = render() {
            break Err(err);
        }
        sleep(config.tick_interval);
    };

    listener.stop();
    result
}

/// Records Enter or Escape in `state` and ends the listener.
fn splash_handler(state: Arc<AtomicU8>) -> impl FnMut(Key) -> bool + Send + 'static {
    move |key| {
        let next = match key {
            Key::Start => SplashState::Play,
            Key::Quit => SplashState::Quit,
            Key::Move(_) => return true,
        };
        state.store(next as u8, Ordering::Release);
        false
    }
}

/// The player's choice, if there is one yet. `seen` may be stale: a listener
/// that finished after it was read can still have stored a choice, so the
/// state is read again once the thread is joined.
fn settle(
    seen: SplashState,
    state: &AtomicU8,
    listener: &mut InputListener,
) -> Option<SplashState> {
    match seen {
        SplashState::Display if listener.finished() => {
            listener.join();
            match SplashState::from_u8(state.load(Ordering::Acquire)) {
                SplashState::Display => Some(SplashState::Quit),
                chosen => Some(chosen),
            }
        }
        SplashState::Display => None,
        chosen => Some(chosen),
    }
}

fn main_menu<W: Write, S: TerminalSize>(display: &mut Display<W, S>, config: &Config) -> Result<()> {
    let size @ (columns, rows) = display.terminal_size()?;

    match check_terminal_size(size, config) {
        Ok(()) => {
            let width = usize::from(columns);
            let info = format!("Terminal Size: {} columns by {} rows", columns, rows);

            let frame = display.new_frame(SPLASH_FRAME);
            frame.draw("");
            frame.draw(format_args!("{:^width$}", "S N A K E", width = width));
            frame.draw("");
            frame.draw(format_args!("{:^width$}", info, width = width));
            frame.draw(format_args!("{:^width$}", PROMPT, width = width));
        }
        Err(err) => {
            display.new_frame(MIN_SIZE_FRAME).draw(err);
        }
    }

    display.render()?;
    Ok(())
}

/// Overlays the result on a copy of the last game frame.
fn game_over<W: Write, S: TerminalSize>(game: &Game, display: &mut Display<W, S>) -> Result<()> {
    let center = game.columns() / 2;
    let mut row = game.rows() / 2;

    let frame = display.duplicate_frame(GAME_OVER_FRAME)?;
    frame.goto(row, center.saturating_sub(3).max(1));
    frame.draw_inline("Game Over");

    if let Some(reason) = game.reason() {
        row += 1;
        let text = format!("({})", reason);
        frame.goto(row, centered(center, &text));
        frame.draw_inline(text);
    }

    frame.goto(row + 1, centered(center, PROMPT));
    frame.draw_inline(PROMPT);

    display.render()?;
    Ok(())
}

fn centered(center: usize, text: &str) -> usize {
    (center + 1).saturating_sub(text.chars().count() / 2).max(1)
}
