//! tile-slide: board engine for a 4x4 sliding-tile (2048-style) puzzle
//!
//! This crate provides:
//! - A `Board` that tracks tiles and their occupied set, with `move_tiles`,
//!   `spawn_random_tile`, `has_moves_left` and `game_tick`
//! - A `Session` that owns a board, an RNG and the rule set (`config` module)
//! - Pixel geometry and a pure tween function for presentation layers (`layout` module)
//!
//! Quick start:
//! ```
//! use tile_slide::engine::{Board, Direction, TickOutcome};
//! use rand::{rngs::StdRng, SeedableRng};
//!
//! // Deterministic board initialization with a seeded RNG
//! let mut rng = StdRng::seed_from_u64(42);
//! let mut board = Board::initialize(&mut rng);
//! let report = board.move_tiles(Direction::Left);
//! assert!(report.merges() == 0);
//! assert!(matches!(board.game_tick(&mut rng), TickOutcome::Spawned(_)));
//! assert_eq!(board.occupied_count(), 2);
//! ```
//!
//! Session loop:
//! ```
//! use tile_slide::config::GameConfig;
//! use tile_slide::engine::Direction;
//! use tile_slide::session::Session;
//!
//! let config = GameConfig { seed: Some(7), ..GameConfig::default() };
//! let mut session = Session::new(config).unwrap();
//! for dir in Direction::ALL.iter().cycle().take(8) {
//!     if session.input(*dir).is_game_over() {
//!         break;
//!     }
//! }
//! for tile in session.snapshot() {
//!     assert!(tile.value.is_power_of_two());
//! }
//! ```
//!
pub mod config;
pub mod engine;
pub mod layout;
pub mod session;

pub use config::{EndRule, GameConfig};
pub use engine::{Board, Cell, Direction, EngineError, TickOutcome, TileView};
pub use session::{Session, Turn};
