use std::collections::BTreeSet;
use std::fmt;
use std::io::Write;
use std::sync::Arc;

use crossterm::style::{Color, SetForegroundColor};
use rand::{rngs::StdRng, seq::SliceRandom, SeedableRng};
use tracing::{debug, info};

use crate::config::Config;
use crate::controls::Controls;
use crate::display::Display;
use crate::error::{Collision, DisplayError, StartupError};
use crate::snake::{Direction, Snake, SnakeSection};
use crate::term::TerminalSize;
use crate::Coords;

pub const GAME_FRAME: &str = "cycle";

const SNAKE_CHAR: char = '█';
const APPLE_CHAR: char = '⬤';

const PALETTE: [Color; 7] = [
    Color::Green,
    Color::Blue,
    Color::Red,
    Color::Yellow,
    Color::Cyan,
    Color::Magenta,
    Color::White,
];

fn section_color(index: usize) -> Color {
    PALETTE[index % PALETTE.len()]
}

/// What a board cell shows. Derived from the snake and apple every update.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum Cell {
    Empty,
    Snake(Color),
    Apple,
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cell::Empty => f.write_str(" "),
            Cell::Snake(color) => write!(
                f,
                "{}{}{}",
                SetForegroundColor(*color),
                SNAKE_CHAR,
                SetForegroundColor(Color::Reset)
            ),
            Cell::Apple => write!(
                f,
                "{}{}{}",
                SetForegroundColor(Color::Red),
                APPLE_CHAR,
                SetForegroundColor(Color::Reset)
            ),
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Status {
    Running,
    /// The player asked to leave.
    Quit,
    Terminated(Collision),
}

/// Result of one accepted tick.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Step {
    /// Not an update tick at the current cadence.
    Waiting,
    Moved,
    Ate,
}

pub fn check_terminal_size((columns, rows): (u16, u16), config: &Config) -> Result<(), StartupError> {
    if columns < config.min_columns || rows < config.min_rows {
        return Err(StartupError::TooSmall {
            columns,
            rows,
            min_columns: config.min_columns,
            min_rows: config.min_rows,
        });
    }
    Ok(())
}

pub struct Game {
    rows: usize,
    columns: usize,
    board: Vec<Vec<Cell>>,
    snake: Snake,
    apple: Option<Coords>,
    free_cells: BTreeSet<Coords>,
    update_cycle: u64,
    apples_eaten: u32,
    initial_cadence: f64,
    cadence_step: f64,
    controls: Arc<Controls>,
    collision: Option<Collision>,
    rng: StdRng,
}

impl Game {
    /// A fresh game on a `columns` x `rows` board. Apple placement is
    /// reproducible when `config.seed` is set.
    pub fn new(columns: usize, rows: usize, config: &Config) -> Self {
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        assert!(columns > 0 && rows > 0, "board must have at least one cell");

        let start = SnakeSection::new(rows / 2, columns / 2, SNAKE_CHAR);
        let mut free_cells: BTreeSet<Coords> =
            (0..rows).flat_map(|r| (0..columns).map(move |c| (r, c))).collect();
        free_cells.remove(&start.cell());

        let mut game = Game {
            rows,
            columns,
            board: vec![vec![Cell::Empty; columns]; rows],
            snake: Snake::new(start),
            apple: None,
            free_cells,
            update_cycle: 0,
            apples_eaten: 0,
            initial_cadence: config.initial_cadence,
            cadence_step: config.cadence_step,
            controls: Arc::new(Controls::new(Direction::Up)),
            collision: None,
            rng,
        };

        game.paint_snake();
        game.spawn_apple();
        info!(rows, columns, "new game");
        game
    }

    /// Advances the tick counter and, on update ticks, moves the snake.
    /// A collision ends the game for good; later calls keep returning it.
    pub fn update_game_state(&mut self) -> Result<Step, Collision> {
        if let Some(collision) = self.collision {
            return Err(collision);
        }

        self.update_cycle += 1;
        if self.update_cycle % self.ticks_per_update() != 0 {
            return Ok(Step::Waiting);
        }

        self.update_snake().map_err(|collision| {
            self.terminate(collision);
            collision
        })
    }

    fn update_snake(&mut self) -> Result<Step, Collision> {
        let direction = self.controls.latch();
        let target = match direction.step(self.snake.head().cell(), self.rows, self.columns) {
            Some(cell) if self.snake.occupies(cell) => return Err(Collision::SelfHit),
            Some(cell) => cell,
            None => return Err(Collision::WallHit),
        };

        self.erase_snake();

        let (row, column) = target;
        let head = SnakeSection::new(row, column, SNAKE_CHAR);
        let step = if self.apple == Some(target) {
            self.board[row][column] = Cell::Empty;
            self.apple = None;
            self.apples_eaten += 1;
            self.snake.advance(head, true);
            self.spawn_apple();
            debug!(length = self.snake.len(), cadence = self.cadence(), "apple eaten");
            Step::Ate
        } else {
            self.free_cells.remove(&target);
            if let Some(tail) = self.snake.advance(head, false) {
                self.free_cells.insert(tail);
            }
            Step::Moved
        };

        self.paint_snake();
        Ok(step)
    }

    fn terminate(&mut self, collision: Collision) {
        if self.collision.is_none() {
            info!(reason = %collision, score = self.score(), "game over");
            self.collision = Some(collision);
            self.controls.stop();
        }
    }

    fn spawn_apple(&mut self) {
        let choices: Vec<Coords> = self.free_cells.iter().copied().collect();
        self.apple = choices.choose(&mut self.rng).copied();

        if let Some(cell @ (row, column)) = self.apple {
            self.free_cells.remove(&cell);
            self.board[row][column] = Cell::Apple;
        }
    }

    fn erase_snake(&mut self) {
        for (row, column) in self.snake.cells() {
            self.board[row][column] = Cell::Empty;
        }
    }

    fn paint_snake(&mut self) {
        for (i, (row, column)) in self.snake.cells().enumerate() {
            self.board[row][column] = Cell::Snake(section_color(i));
        }
    }

    pub fn render<W: Write, S: TerminalSize>(
        &self,
        display: &mut Display<W, S>,
    ) -> Result<(), DisplayError> {
        let frame = display.new_frame(GAME_FRAME);
        frame.home();

        let stats = format!(" Score: {} Level: {} ", self.score(), self.level());
        frame.draw(format_args!("┏{:━<width$}┓", stats, width = self.columns));
        for row in &self.board {
            frame.draw_inline('┃');
            for cell in row {
                frame.draw_inline(cell);
            }
            frame.draw('┃');
        }
        frame.draw(format_args!("┗{}┛", "━".repeat(self.columns)));

        display.render()
    }

    /// Cadence shrinks by one step per apple and bottoms out at 1.
    pub fn cadence(&self) -> f64 {
        (self.initial_cadence - self.cadence_step * f64::from(self.apples_eaten)).max(1.0)
    }

    fn ticks_per_update(&self) -> u64 {
        (self.cadence().floor() as u64).max(1)
    }

    pub fn score(&self) -> usize {
        self.snake.len() - 1
    }

    pub fn level(&self) -> usize {
        self.score() / 10
    }

    pub fn status(&self) -> Status {
        match self.collision {
            Some(collision) => Status::Terminated(collision),
            None if self.controls.running() => Status::Running,
            None => Status::Quit,
        }
    }

    pub fn running(&self) -> bool {
        self.status() == Status::Running
    }

    pub fn reason(&self) -> Option<String> {
        self.collision.map(|collision| collision.to_string())
    }

    /// Handle for the input thread.
    pub fn controls(&self) -> Arc<Controls> {
        Arc::clone(&self.controls)
    }

    pub fn snake(&self) -> &Snake {
        &self.snake
    }

    pub fn apple(&self) -> Option<Coords> {
        self.apple
    }

    pub fn free_cells(&self) -> &BTreeSet<Coords> {
        &self.free_cells
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn columns(&self) -> usize {
        self.columns
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::snake::Direction::*;
    use proptest::prelude::*;

    fn seeded(seed: u64) -> Config {
        Config { seed: Some(seed), ..Config::default() }
    }

    fn game(columns: usize, rows: usize) -> Game {
        Game::new(columns, rows, &seeded(7))
    }

    impl Game {
        fn place_apple(&mut self, cell: Coords) {
            assert!(!self.snake.occupies(cell));
            if let Some(old @ (row, column)) = self.apple.take() {
                self.board[row][column] = Cell::Empty;
                self.free_cells.insert(old);
            }
            self.free_cells.remove(&cell);
            self.board[cell.0][cell.1] = Cell::Apple;
            self.apple = Some(cell);
        }

        fn set_snake(&mut self, cells: &[Coords]) {
            self.erase_snake();
            for cell in self.snake.cells() {
                self.free_cells.insert(cell);
            }
            self.snake = Snake::from_cells(cells, SNAKE_CHAR);
            for &cell in cells {
                self.free_cells.remove(&cell);
            }
            if self.apple.map_or(false, |apple| self.snake.occupies(apple)) {
                self.apple = None;
                self.spawn_apple();
            }
            self.paint_snake();
        }

        fn steer(&self, direction: Direction) {
            assert!(self.controls.request(direction));
        }

        fn face(&mut self, direction: Direction) {
            self.controls = Arc::new(Controls::new(direction));
        }

        fn assert_consistent(&self) {
            for cell in self.snake.cells() {
                assert!(!self.free_cells.contains(&cell), "{:?} is snake and free", cell);
            }
            if let Some(apple) = self.apple {
                assert!(!self.free_cells.contains(&apple));
                assert!(!self.snake.occupies(apple));
            }
            let occupied = self.snake.len() + usize::from(self.apple.is_some());
            assert_eq!(self.free_cells.len() + occupied, self.rows * self.columns);
        }
    }

    fn is_snake(cell: Cell) -> bool {
        matches!(cell, Cell::Snake(_))
    }

    #[test]
    fn starts_centered_with_one_apple() {
        let game = game(10, 10);
        assert_eq!(game.snake().len(), 1);
        assert_eq!(game.snake().head().cell(), (5, 5));
        assert!(game.apple().is_some());
        assert_eq!(game.status(), Status::Running);
        assert_eq!(game.cadence(), 4.0);
        game.assert_consistent();
    }

    #[test]
    fn moves_up_one_cell() {
        let mut game = game(10, 10);
        game.place_apple((2, 2));

        assert_eq!(game.update_snake(), Ok(Step::Moved));

        assert_eq!(game.snake().head().cell(), (4, 5));
        assert_eq!(game.snake().len(), 1);
        assert_eq!(game.board[5][5], Cell::Empty);
        assert!(is_snake(game.board[4][5]));
        assert!(game.free_cells().contains(&(5, 5)));
        assert_eq!(game.apple(), Some((2, 2)));
        game.assert_consistent();
    }

    #[test]
    fn only_every_cadence_tick_moves() {
        let mut game = game(10, 10);
        game.place_apple((2, 2));

        for _ in 0..3 {
            assert_eq!(game.update_game_state(), Ok(Step::Waiting));
        }
        assert_eq!(game.snake().head().cell(), (5, 5));
        assert_eq!(game.update_game_state(), Ok(Step::Moved));
        assert_eq!(game.snake().head().cell(), (4, 5));
    }

    #[test]
    fn wall_hit_terminates() {
        let mut game = game(10, 10);
        game.set_snake(&[(0, 3)]);

        let mut result = Ok(Step::Waiting);
        for _ in 0..4 {
            result = game.update_game_state();
        }

        assert_eq!(result, Err(Collision::WallHit));
        assert_eq!(game.reason().as_deref(), Some("Your snake hit the wall"));
        assert_eq!(game.status(), Status::Terminated(Collision::WallHit));
        assert!(!game.controls().running());
        assert_eq!(game.snake().head().cell(), (0, 3));
        assert!(is_snake(game.board[0][3]));

        // Absorbing: nothing moves any more.
        for _ in 0..8 {
            assert_eq!(game.update_game_state(), Err(Collision::WallHit));
        }
        assert_eq!(game.snake().head().cell(), (0, 3));
    }

    #[test]
    fn every_wall() {
        for (cell, direction) in [((0, 4), Up), ((9, 4), Down), ((4, 0), Left), ((4, 9), Right)] {
            let mut game = game(10, 10);
            game.set_snake(&[cell]);
            game.face(direction);
            assert_eq!(game.update_snake(), Err(Collision::WallHit), "{:?}", direction);
        }
    }

    #[test]
    fn turns_away_from_the_body() {
        let mut game = game(10, 10);
        game.set_snake(&[(5, 5), (5, 6), (5, 7)]);
        game.place_apple((0, 0));
        game.steer(Left);

        assert_eq!(game.update_snake(), Ok(Step::Moved));
        assert_eq!(game.snake().cells().collect::<Vec<_>>(), vec![(5, 4), (5, 5), (5, 6)]);
        game.assert_consistent();
    }

    #[test]
    fn self_hit_leaves_snake_untouched() {
        let mut game = game(10, 10);
        game.set_snake(&[(5, 5), (5, 6), (5, 7)]);
        game.steer(Right);

        assert_eq!(game.update_game_state(), Ok(Step::Waiting));
        game.update_game_state().unwrap();
        game.update_game_state().unwrap();
        assert_eq!(game.update_game_state(), Err(Collision::SelfHit));

        assert_eq!(game.reason().as_deref(), Some("Your snake hit itself"));
        assert_eq!(game.snake().cells().collect::<Vec<_>>(), vec![(5, 5), (5, 6), (5, 7)]);
        assert!(is_snake(game.board[5][7]));
    }

    #[test]
    fn moving_into_the_tail_is_a_self_hit() {
        let mut game = game(10, 10);
        game.set_snake(&[(5, 5), (5, 6), (4, 6), (4, 5)]);
        // Heading up from (5, 5) lands on the tail at (4, 5).
        assert_eq!(game.update_snake(), Err(Collision::SelfHit));
    }

    #[test]
    fn eating_grows_by_one() {
        let mut game = game(10, 10);
        game.place_apple((4, 5));

        assert_eq!(game.update_snake(), Ok(Step::Ate));

        assert_eq!(game.snake().cells().collect::<Vec<_>>(), vec![(4, 5), (5, 5)]);
        assert!(is_snake(game.board[5][5]));
        let apple = game.apple().unwrap();
        assert_ne!(apple, (4, 5));
        assert_eq!(game.board[apple.0][apple.1], Cell::Apple);
        let apples = game.board.iter().flatten().filter(|c| **c == Cell::Apple).count();
        assert_eq!(apples, 1);
        assert_eq!(game.score(), 1);
        game.assert_consistent();
    }

    #[test]
    fn full_board_leaves_no_apple() {
        let mut game = game(2, 1);
        assert_eq!(game.snake().head().cell(), (0, 1));
        assert_eq!(game.apple(), Some((0, 0)));

        game.steer(Left);
        assert_eq!(game.update_snake(), Ok(Step::Ate));
        assert_eq!(game.apple(), None);
        assert!(game.free_cells().is_empty());
        game.assert_consistent();

        assert_eq!(game.update_snake(), Err(Collision::WallHit));
    }

    #[test]
    fn cadence_ramps_down_to_one() {
        let mut game = game(100, 10);
        game.steer(Right);

        for eaten in 1..=45 {
            let next = (5, 50 + eaten);
            game.place_apple(next);
            assert_eq!(game.update_snake(), Ok(Step::Ate));
            if eaten == 10 {
                assert!((game.cadence() - 3.0).abs() < 1e-9);
                assert_eq!(game.ticks_per_update(), 3);
            }
        }

        assert_eq!(game.cadence(), 1.0);
        assert_eq!(game.ticks_per_update(), 1);
        assert_eq!(game.level(), 4);
        game.assert_consistent();
    }

    #[test]
    fn quit_is_not_a_collision() {
        let game = game(10, 10);
        game.controls().stop();
        assert_eq!(game.status(), Status::Quit);
        assert_eq!(game.reason(), None);
    }

    #[test]
    fn palette_cycles_by_index() {
        assert_eq!(section_color(0), Color::Green);
        assert_eq!(section_color(7), Color::Green);
        assert_eq!(section_color(9), Color::Red);
    }

    #[test]
    fn render_draws_bordered_board() {
        let mut game = game(30, 6);
        game.place_apple((0, 0));
        let mut display = Display::new(Vec::new(), (80u16, 24u16));

        game.render(&mut display).unwrap();

        let frame = display.frame().unwrap();
        assert_eq!(frame.key(), GAME_FRAME);
        assert_eq!(frame.rows(), 6 + 2);
        let top = format!("\x1b[H┏ Score: 0 Level: 0 {}┓\r\n", "━".repeat(11));
        assert!(frame.value().starts_with(&top));
        assert!(frame.value().ends_with(&format!("┗{}┛\r\n", "━".repeat(30))));
        assert!(frame.value().contains(APPLE_CHAR));
        assert!(frame.value().contains(SNAKE_CHAR));
    }

    #[test]
    fn terminal_size_check() {
        let config = Config::default();
        assert!(check_terminal_size((62, 10), &config).is_ok());
        assert!(check_terminal_size((120, 40), &config).is_ok());

        let err = check_terminal_size((61, 30), &config).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Minimum size required (62 columns x 10 rows), current size (61 columns x 30 rows)"
        );
        assert!(check_terminal_size((80, 9), &config).is_err());
    }

    fn direction() -> impl Strategy<Value = Direction> {
        prop_oneof![Just(Up), Just(Right), Just(Down), Just(Left)]
    }

    proptest! {
        #[test]
        fn head_moves_to_a_neighbour(seed in any::<u64>(), turns in prop::collection::vec(direction(), 1..200)) {
            let mut game = Game::new(12, 9, &seeded(seed));

            for turn in turns {
                game.controls.request(turn);
                let (row, column) = game.snake().head().cell();
                let before = game.snake().len();

                match game.update_snake() {
                    Ok(step) => {
                        let (r, c) = game.snake().head().cell();
                        prop_assert_eq!(row.abs_diff(r) + column.abs_diff(c), 1);
                        let grown = usize::from(step == Step::Ate);
                        prop_assert_eq!(game.snake().len(), before + grown);
                        game.assert_consistent();
                    }
                    Err(_) => break,
                }
            }
        }

        #[test]
        fn cadence_never_rises(seed in any::<u64>(), turns in prop::collection::vec(direction(), 1..300)) {
            let mut game = Game::new(8, 8, &seeded(seed));
            let mut last = game.cadence();

            for turn in turns {
                game.controls.request(turn);
                if game.update_game_state().is_err() {
                    break;
                }
                let cadence = game.cadence();
                prop_assert!(cadence <= last);
                prop_assert!(cadence >= 1.0);
                last = cadence;
            }
        }
    }
}
