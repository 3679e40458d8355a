use std::collections::VecDeque;
use std::hash::{Hash, Hasher};

use crate::Coords;
use Direction::*;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Direction {
    Up = 0,
    Right = 1,
    Down = 2,
    Left = 3,
}

impl Direction {
    pub fn opposite(self) -> Direction {
        match self {
            Up => Down,
            Down => Up,
            Left => Right,
            Right => Left,
        }
    }

    pub(crate) fn from_u8(value: u8) -> Direction {
        match value & 3 {
            0 => Up,
            1 => Right,
            2 => Down,
            _ => Left,
        }
    }

    /// The neighbouring cell one step away, or `None` when it falls outside
    /// a `rows` x `columns` board.
    pub fn step(self, (row, column): Coords, rows: usize, columns: usize) -> Option<Coords> {
        let next = match self {
            Up => (row.checked_sub(1)?, column),
            Down => (row + 1, column),
            Left => (row, column.checked_sub(1)?),
            Right => (row, column + 1),
        };

        if next.0 < rows && next.1 < columns {
            Some(next)
        } else {
            None
        }
    }
}

/// One body segment. Two sections are the same section when they sit on the
/// same cell, whatever their symbol.
#[derive(Clone, Debug)]
pub struct SnakeSection {
    pub row: usize,
    pub column: usize,
    symbol: char,
}

impl SnakeSection {
    pub fn new(row: usize, column: usize, symbol: char) -> Self {
        SnakeSection { row, column, symbol }
    }

    pub fn cell(&self) -> Coords {
        (self.row, self.column)
    }

    pub fn symbol(&self) -> char {
        self.symbol
    }
}

impl PartialEq for SnakeSection {
    fn eq(&self, other: &Self) -> bool {
        self.cell() == other.cell()
    }
}

impl Eq for SnakeSection {}

impl Hash for SnakeSection {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.cell().hash(state);
    }
}

/// Head at index 0, tail at the back. Never empty.
#[derive(Clone, Debug)]
pub struct Snake {
    body: VecDeque<SnakeSection>,
}

impl Snake {
    pub fn new(head: SnakeSection) -> Self {
        Snake { body: VecDeque::from(vec![head]) }
    }

    #[cfg(test)]
    pub fn from_cells(cells: &[Coords], symbol: char) -> Self {
        assert!(!cells.is_empty(), "a snake needs at least one section");
        let body = cells.iter().map(|&(r, c)| SnakeSection::new(r, c, symbol)).collect();
        Snake { body }
    }

    pub fn head(&self) -> &SnakeSection {
        &self.body[0]
    }

    pub fn len(&self) -> usize {
        self.body.len()
    }

    pub fn cells(&self) -> impl Iterator<Item = Coords> + '_ {
        self.body.iter().map(SnakeSection::cell)
    }

    pub fn occupies(&self, cell: Coords) -> bool {
        self.cells().any(|c| c == cell)
    }

    /// Puts a new head in front. Unless `grow` is set the tail is dropped and
    /// its cell returned.
    pub fn advance(&mut self, head: SnakeSection, grow: bool) -> Option<Coords> {
        let old_tail = if grow {
            None
        } else {
            self.body.pop_back().map(|section| section.cell())
        };
        self.body.push_front(head);
        old_tail
    }
}
