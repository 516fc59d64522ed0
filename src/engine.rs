use std::fmt;

use log::{debug, info, trace};
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Width and height of the grid.
pub const SIZE: usize = 4;
/// Number of cells on the grid.
pub const CELLS: usize = SIZE * SIZE;
/// Single-step sweeps per move; enough to carry a tile edge to edge.
const SWEEPS: usize = SIZE - 1;

/// A direction to move/merge tiles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

impl Direction {
    pub const ALL: [Direction; 4] = [Direction::Up, Direction::Down, Direction::Left, Direction::Right];

    /// Unit displacement `(dx, dy)`. Row 0 is the top row, so `Up` is `dy = -1`.
    #[inline]
    pub fn delta(self) -> (i8, i8) {
        match self {
            Direction::Up => (0, -1),
            Direction::Down => (0, 1),
            Direction::Left => (-1, 0),
            Direction::Right => (1, 0),
        }
    }
}

#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum EngineError {
    #[error("board is full; no empty cell to spawn into")]
    BoardFull,
    #[error("cell ({col}, {row}) is outside the 4x4 grid")]
    CellOutOfRange { col: u8, row: u8 },
    #[error("cell ({col}, {row}) already holds a tile")]
    CellOccupied { col: u8, row: u8 },
    #[error("tile value {0} is not a power of two >= 2")]
    InvalidTileValue(u64),
    #[error("probability {0} is outside [0, 1]")]
    InvalidProbability(f64),
}

/// A board slot, `(col, row)` with both in `0..SIZE`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "CellRepr")]
pub struct Cell {
    col: u8,
    row: u8,
}

/// Unchecked wire form of [`Cell`]; deserialization goes through [`Cell::new`].
#[derive(Deserialize)]
struct CellRepr {
    col: u8,
    row: u8,
}

impl TryFrom<CellRepr> for Cell {
    type Error = EngineError;

    fn try_from(repr: CellRepr) -> Result<Self, Self::Error> { Cell::new(repr.col, repr.row) }
}

impl Cell {
    pub fn new(col: u8, row: u8) -> Result<Self, EngineError> {
        if (col as usize) < SIZE && (row as usize) < SIZE {
            Ok(Cell { col, row })
        } else {
            Err(EngineError::CellOutOfRange { col, row })
        }
    }

    #[inline]
    pub fn col(self) -> u8 { self.col }

    #[inline]
    pub fn row(self) -> u8 { self.row }

    /// Row-major index, `row * SIZE + col`.
    #[inline]
    pub fn index(self) -> usize { self.row as usize * SIZE + self.col as usize }

    #[inline]
    fn from_index(idx: usize) -> Self {
        debug_assert!(idx < CELLS);
        Cell { col: (idx % SIZE) as u8, row: (idx / SIZE) as u8 }
    }

    /// The neighbouring cell in `direction`, or `None` past the edge.
    #[inline]
    pub fn step(self, direction: Direction) -> Option<Cell> {
        let (dx, dy) = direction.delta();
        let col = self.col as i8 + dx;
        let row = self.row as i8 + dy;
        let bounds = 0..SIZE as i8;
        if bounds.contains(&col) && bounds.contains(&row) {
            Some(Cell { col: col as u8, row: row as u8 })
        } else {
            None
        }
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.col, self.row)
    }
}

/// Set of occupied cells, one bit per row-major index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Occupancy(u16);

impl Occupancy {
    #[inline]
    pub fn contains(self, cell: Cell) -> bool { self.0 & (1 << cell.index()) != 0 }

    #[inline]
    pub fn len(self) -> usize { self.0.count_ones() as usize }

    #[inline]
    pub fn is_empty(self) -> bool { self.0 == 0 }

    #[inline]
    pub fn is_full(self) -> bool { self.0 == u16::MAX }

    /// Occupied cells in row-major order.
    pub fn iter(self) -> impl Iterator<Item = Cell> {
        let mut bits = self.0;
        std::iter::from_fn(move || {
            if bits == 0 {
                return None;
            }
            let idx = bits.trailing_zeros() as usize;
            bits &= bits - 1;
            Some(Cell::from_index(idx))
        })
    }

    #[inline]
    fn insert(&mut self, cell: Cell) { self.0 |= 1 << cell.index(); }

    #[inline]
    fn remove(&mut self, cell: Cell) { self.0 &= !(1 << cell.index()); }
}

/// Probability that a spawned tile is a 4 rather than a 2.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TileOdds {
    four: f64,
}

impl TileOdds {
    /// Even split between 2 and 4.
    pub const UNIFORM: TileOdds = TileOdds { four: 0.5 };

    pub fn new(four: f64) -> Result<Self, EngineError> {
        if (0.0..=1.0).contains(&four) {
            Ok(TileOdds { four })
        } else {
            Err(EngineError::InvalidProbability(four))
        }
    }

    #[inline]
    pub fn four(self) -> f64 { self.four }

    fn sample<R: Rng + ?Sized>(self, rng: &mut R) -> u64 {
        if rng.gen_bool(self.four) { 4 } else { 2 }
    }
}

impl Default for TileOdds {
    fn default() -> Self { TileOdds::UNIFORM }
}

/// A tile as handed to the presentation layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TileView {
    pub cell: Cell,
    pub value: u64,
}

/// A single tile displacement performed during a move.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TileMotion {
    /// The tile moved one step into an empty cell.
    Slide { from: Cell, to: Cell, value: u64 },
    /// The tile merged into an equal neighbour; `value` is the new, doubled value.
    Merge { from: Cell, to: Cell, value: u64 },
}

impl TileMotion {
    #[inline]
    pub fn from(&self) -> Cell {
        match *self { TileMotion::Slide { from, .. } | TileMotion::Merge { from, .. } => from }
    }

    #[inline]
    pub fn to(&self) -> Cell {
        match *self { TileMotion::Slide { to, .. } | TileMotion::Merge { to, .. } => to }
    }
}

/// Everything that happened during one call to [`Board::move_tiles`], in execution order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoveReport {
    pub direction: Direction,
    pub motions: Vec<TileMotion>,
}

impl MoveReport {
    /// True if any tile slid or merged.
    #[inline]
    pub fn changed(&self) -> bool { !self.motions.is_empty() }

    pub fn merges(&self) -> usize {
        self.motions.iter().filter(|m| matches!(m, TileMotion::Merge { .. })).count()
    }

    /// Sum of the values produced by merges during this move.
    pub fn merged_value(&self) -> u64 {
        self.motions
            .iter()
            .map(|m| match m {
                TileMotion::Merge { value, .. } => *value,
                TileMotion::Slide { .. } => 0,
            })
            .sum()
    }
}

/// Result of [`Board::game_tick`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TickOutcome {
    /// A new tile was placed.
    Spawned(TileView),
    /// No tile was placed and the game continues (session rules only).
    Skipped,
    /// The game has ended.
    GameOver,
}

/// The 4x4 grid plus its occupied set.
///
/// Every mutation keeps `occupied` equal to the set of cells holding a tile;
/// [`Board::is_consistent`] checks this and debug builds assert it after each step.
#[derive(Clone, PartialEq, Eq, Hash, Default)]
pub struct Board {
    cells: [Option<u64>; CELLS],
    occupied: Occupancy,
}

impl Board {
    /// A constant empty board.
    pub const EMPTY: Board = Board { cells: [None; CELLS], occupied: Occupancy(0) };

    /// Empty board seeded with one random tile (2 or 4, even odds).
    ///
    /// ```
    /// use tile_slide::engine::Board;
    /// use rand::{rngs::StdRng, SeedableRng};
    /// let mut rng = StdRng::seed_from_u64(42);
    /// let b = Board::initialize(&mut rng);
    /// assert_eq!(b.occupied_count(), 1);
    /// ```
    pub fn initialize<R: Rng + ?Sized>(rng: &mut R) -> Self {
        Self::initialize_with(rng, TileOdds::UNIFORM)
    }

    pub fn initialize_with<R: Rng + ?Sized>(rng: &mut R, odds: TileOdds) -> Self {
        let mut board = Board::EMPTY;
        // An empty board always has room.
        if let Some(tile) = board.spawn_into_empty(rng, odds) {
            debug!("initialized board with {} at {}", tile.value, tile.cell);
        }
        board
    }

    /// Build a board from rows (`rows[row][col]`), with 0 meaning empty.
    ///
    /// ```
    /// use tile_slide::engine::{Board, Direction};
    /// let mut b = Board::from_rows([[2, 2, 0, 0], [0; 4], [0; 4], [0; 4]]).unwrap();
    /// b.move_tiles(Direction::Left);
    /// assert_eq!(b.to_rows()[0], [4, 0, 0, 0]);
    /// ```
    pub fn from_rows(rows: [[u64; SIZE]; SIZE]) -> Result<Self, EngineError> {
        let mut board = Board::EMPTY;
        for (row, values) in rows.iter().enumerate() {
            for (col, &value) in values.iter().enumerate() {
                if value != 0 {
                    board.place_tile(Cell::from_index(row * SIZE + col), value)?;
                }
            }
        }
        Ok(board)
    }

    /// Rows of tile values, 0 for empty cells.
    pub fn to_rows(&self) -> [[u64; SIZE]; SIZE] {
        let mut rows = [[0; SIZE]; SIZE];
        for (idx, cell) in self.cells.iter().enumerate() {
            rows[idx / SIZE][idx % SIZE] = cell.unwrap_or(0);
        }
        rows
    }

    /// Put a tile of `value` on an empty cell.
    pub fn place_tile(&mut self, cell: Cell, value: u64) -> Result<(), EngineError> {
        if value < 2 || !value.is_power_of_two() {
            return Err(EngineError::InvalidTileValue(value));
        }
        if self.occupied.contains(cell) {
            return Err(EngineError::CellOccupied { col: cell.col, row: cell.row });
        }
        self.cells[cell.index()] = Some(value);
        self.occupied.insert(cell);
        debug_assert!(self.is_consistent());
        Ok(())
    }

    /// Tile value at `cell`, if any.
    #[inline]
    pub fn get(&self, cell: Cell) -> Option<u64> { self.cells[cell.index()] }

    #[inline]
    pub fn occupied(&self) -> Occupancy { self.occupied }

    #[inline]
    pub fn occupied_count(&self) -> usize { self.occupied.len() }

    #[inline]
    pub fn empty_count(&self) -> usize { CELLS - self.occupied.len() }

    /// All tiles in row-major order, by value.
    pub fn tiles(&self) -> impl Iterator<Item = TileView> + '_ {
        self.occupied.iter().filter_map(move |cell| self.get(cell).map(|value| TileView { cell, value }))
    }

    /// Highest tile value on the board, or 0 when empty.
    pub fn highest_tile(&self) -> u64 { self.cells.iter().flatten().copied().max().unwrap_or(0) }

    /// Sum of all tile values.
    pub fn sum(&self) -> u64 { self.cells.iter().flatten().sum() }

    /// Insert a random tile (even odds of 2 or 4) into a uniformly chosen empty cell.
    pub fn spawn_random_tile<R: Rng + ?Sized>(&mut self, rng: &mut R) -> Result<TileView, EngineError> {
        self.spawn_random_tile_with(rng, TileOdds::UNIFORM)
    }

    /// Like [`Self::spawn_random_tile`] with explicit odds. Fails on a full board.
    pub fn spawn_random_tile_with<R: Rng + ?Sized>(
        &mut self,
        rng: &mut R,
        odds: TileOdds,
    ) -> Result<TileView, EngineError> {
        self.spawn_into_empty(rng, odds).ok_or(EngineError::BoardFull)
    }

    fn spawn_into_empty<R: Rng + ?Sized>(&mut self, rng: &mut R, odds: TileOdds) -> Option<TileView> {
        let empty = self.empty_count();
        if empty == 0 {
            return None;
        }
        let nth = rng.gen_range(0..empty);
        let idx = (0..CELLS).filter(|&i| self.cells[i].is_none()).nth(nth)?;
        let cell = Cell::from_index(idx);
        let value = odds.sample(rng);
        self.cells[idx] = Some(value);
        self.occupied.insert(cell);
        debug_assert!(self.is_consistent());
        debug!("spawned {} at {}; {} occupied", value, cell, self.occupied.len());
        Some(TileView { cell, value })
    }

    /// Slide and merge every tile in `direction`.
    ///
    /// Runs three single-step sweeps. Each sweep scans the live grid in
    /// row-major order, so a tile moved earlier in the sweep is what later
    /// tiles test against (and may be stepped again). Merged tiles are not
    /// locked, so equal values can chain within one move.
    pub fn move_tiles(&mut self, direction: Direction) -> MoveReport {
        let report = self.sweep_all(direction);
        debug!(
            "move {:?}: {} motions, {} merges, {} occupied",
            direction,
            report.motions.len(),
            report.merges(),
            self.occupied.len()
        );
        report
    }

    fn sweep_all(&mut self, direction: Direction) -> MoveReport {
        let mut motions = Vec::new();
        for sweep in 0..SWEEPS {
            let before = motions.len();
            for idx in 0..CELLS {
                if let Some(motion) = self.step_tile(Cell::from_index(idx), direction) {
                    motions.push(motion);
                }
            }
            trace!("sweep {} {:?}: {} motions", sweep + 1, direction, motions.len() - before);
        }
        MoveReport { direction, motions }
    }

    fn step_tile(&mut self, from: Cell, direction: Direction) -> Option<TileMotion> {
        let value = self.cells[from.index()]?;
        // Off-grid target: the tile stays put.
        let to = from.step(direction)?;
        let motion = match self.cells[to.index()] {
            None => {
                self.cells[to.index()] = Some(value);
                self.cells[from.index()] = None;
                self.occupied.remove(from);
                self.occupied.insert(to);
                TileMotion::Slide { from, to, value }
            }
            Some(target) if target == value => {
                // A doubled value that no longer fits in u64 blocks like a mismatch.
                let merged = value.checked_mul(2)?;
                self.cells[to.index()] = Some(merged);
                self.cells[from.index()] = None;
                self.occupied.remove(from);
                TileMotion::Merge { from, to, value: merged }
            }
            Some(_) => return None,
        };
        debug_assert!(self.is_consistent());
        Some(motion)
    }

    /// Would [`Self::move_tiles`] in `direction` change the board?
    pub fn can_move(&self, direction: Direction) -> bool {
        let mut probe = self.clone();
        probe.sweep_all(direction).changed()
    }

    /// True while at least one cell is empty.
    #[inline]
    pub fn has_moves_left(&self) -> bool { !self.occupied.is_full() }

    /// Full board on which no direction changes anything.
    pub fn is_stuck(&self) -> bool {
        !self.has_moves_left() && Direction::ALL.iter().all(|&d| !self.can_move(d))
    }

    /// End-of-turn step: report game over on a full board, otherwise spawn a tile.
    pub fn game_tick<R: Rng + ?Sized>(&mut self, rng: &mut R) -> TickOutcome {
        self.game_tick_with(rng, TileOdds::UNIFORM)
    }

    pub fn game_tick_with<R: Rng + ?Sized>(&mut self, rng: &mut R, odds: TileOdds) -> TickOutcome {
        if !self.has_moves_left() {
            info!("game over: board full, highest tile {}", self.highest_tile());
            return TickOutcome::GameOver;
        }
        self.spawn_into_empty(rng, odds).map_or(TickOutcome::GameOver, TickOutcome::Spawned)
    }

    /// Check that the occupied set matches the grid and every tile is a power of two >= 2.
    pub fn is_consistent(&self) -> bool {
        self.cells.iter().enumerate().all(|(idx, cell)| {
            let listed = self.occupied.contains(Cell::from_index(idx));
            match cell {
                Some(v) => listed && *v >= 2 && v.is_power_of_two(),
                None => !listed,
            }
        })
    }
}

impl fmt::Debug for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Board").field(&self.to_rows()).finish()
    }
}

impl fmt::Display for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rule = "-".repeat(SIZE * 7 + SIZE - 1);
        for (row, values) in self.to_rows().iter().enumerate() {
            if row > 0 {
                writeln!(f, "{}", rule)?;
            }
            let line: Vec<String> = values.iter().map(|&v| format_val(v)).collect();
            writeln!(f, "{}", line.join("|"))?;
        }
        Ok(())
    }
}

fn format_val(val: u64) -> String {
    match val {
        0 => " ".repeat(7),
        x => format!("{:^7}", x),
    }
}
