//! A single game: one board, one RNG, one rule set.
//!
//! The session is what an input/presentation layer talks to. It turns a
//! directional input into a move plus an end-of-turn tick and hands back
//! everything needed to redraw, by value.

use log::{debug, info};
use rand::{rngs::StdRng, Rng, SeedableRng};
use serde::Serialize;

use crate::config::{ConfigError, EndRule, GameConfig};
use crate::engine::{Board, Direction, MoveReport, TickOutcome, TileOdds, TileView};

/// What one directional input did.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Turn {
    pub report: MoveReport,
    pub outcome: TickOutcome,
}

impl Turn {
    #[inline]
    pub fn is_game_over(&self) -> bool { self.outcome == TickOutcome::GameOver }
}

pub struct Session<R: Rng = StdRng> {
    board: Board,
    rng: R,
    config: GameConfig,
    odds: TileOdds,
    over: bool,
    turns: u64,
}

impl Session<StdRng> {
    /// Seed from `config.seed`, or from OS entropy when unset.
    pub fn new(config: GameConfig) -> Result<Self, ConfigError> {
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self::with_rng(config, rng)
    }
}

impl<R: Rng> Session<R> {
    pub fn with_rng(config: GameConfig, mut rng: R) -> Result<Self, ConfigError> {
        let odds = config.tile_odds()?;
        let board = Board::initialize_with(&mut rng, odds);
        info!("session started: {:?}, four_probability {}", config.end_rule, odds.four());
        Ok(Self { board, rng, config, odds, over: false, turns: 0 })
    }

    /// Resume from an existing board instead of a freshly seeded one.
    pub fn with_board(config: GameConfig, board: Board, rng: R) -> Result<Self, ConfigError> {
        let odds = config.tile_odds()?;
        Ok(Self { board, rng, config, odds, over: false, turns: 0 })
    }

    /// Move in `direction`, then run the end-of-turn tick.
    ///
    /// Once the game is over the board is frozen: input moves nothing and
    /// reports `GameOver` until [`Self::restart`].
    pub fn input(&mut self, direction: Direction) -> Turn {
        if self.over {
            debug!("ignoring {:?}: game is over", direction);
            return Turn { report: MoveReport { direction, motions: Vec::new() }, outcome: TickOutcome::GameOver };
        }
        let report = self.board.move_tiles(direction);
        let outcome = self.tick(report.changed());
        self.turns += 1;
        if outcome == TickOutcome::GameOver {
            self.over = true;
        }
        Turn { report, outcome }
    }

    fn tick(&mut self, changed: bool) -> TickOutcome {
        let full = !self.board.has_moves_left();
        if full && self.config.end_rule == EndRule::NoMoves && !self.board.is_stuck() {
            return TickOutcome::Skipped;
        }
        if !full && !changed && !self.config.spawn_on_unchanged_move {
            return TickOutcome::Skipped;
        }
        self.board.game_tick_with(&mut self.rng, self.odds)
    }

    /// Replace the board with a freshly initialized one.
    pub fn restart(&mut self) {
        self.board = Board::initialize_with(&mut self.rng, self.odds);
        self.over = false;
        self.turns = 0;
        info!("session restarted");
    }

    #[inline]
    pub fn board(&self) -> &Board { &self.board }

    #[inline]
    pub fn config(&self) -> &GameConfig { &self.config }

    #[inline]
    pub fn is_over(&self) -> bool { self.over }

    #[inline]
    pub fn turns(&self) -> u64 { self.turns }

    /// Every tile, row-major, for drawing.
    pub fn snapshot(&self) -> Vec<TileView> { self.board.tiles().collect() }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::CELLS;

    fn seeded(config: GameConfig, seed: u64) -> Session<StdRng> {
        Session::with_rng(config, StdRng::seed_from_u64(seed)).unwrap()
    }

    #[test]
    fn test_starts_with_one_tile() {
        let s = seeded(GameConfig::default(), 1);
        assert_eq!(s.snapshot().len(), 1);
        assert!(!s.is_over());
        assert_eq!(s.turns(), 0);
    }

    #[test]
    fn test_same_seed_same_game() {
        let mut a = seeded(GameConfig::default(), 99);
        let mut b = seeded(GameConfig::default(), 99);
        for dir in Direction::ALL.iter().cycle().take(40) {
            assert_eq!(a.input(*dir), b.input(*dir));
        }
        assert_eq!(a.board(), b.board());
    }

    #[test]
    fn test_play_until_game_over() {
        let mut s = seeded(GameConfig::default(), 3);
        let mut last = None;
        for dir in Direction::ALL.iter().cycle().take(10_000) {
            let turn = s.input(*dir);
            assert!(s.board().is_consistent());
            if turn.is_game_over() {
                last = Some(turn);
                break;
            }
        }
        let turn = last.expect("game should end");
        assert!(s.is_over());
        assert_eq!(turn.outcome, TickOutcome::GameOver);
        assert_eq!(s.board().occupied_count(), CELLS);

        let frozen = s.board().clone();
        let turns = s.turns();
        for dir in Direction::ALL {
            let again = s.input(dir);
            assert!(again.is_game_over());
            assert!(!again.report.changed());
        }
        assert_eq!(s.board(), &frozen);
        assert_eq!(s.turns(), turns);
    }

    #[test]
    fn test_input_after_game_over_is_frozen_until_restart() {
        let board = Board::from_rows([[2; 4], [4, 8, 4, 8], [8, 4, 8, 4], [4, 8, 4, 8]]).unwrap();
        let mut s = Session::with_board(GameConfig::default(), board.clone(), StdRng::seed_from_u64(4)).unwrap();
        assert!(s.input(Direction::Up).is_game_over());
        assert!(s.is_over());

        // Left could merge the top row, but the game has already ended.
        let turn = s.input(Direction::Left);
        assert_eq!(turn.outcome, TickOutcome::GameOver);
        assert!(turn.report.motions.is_empty());
        assert_eq!(s.board(), &board);
        assert_eq!(s.board().occupied_count(), CELLS);
        assert!(s.is_over());

        s.restart();
        assert!(!s.is_over());
        assert!(!s.input(Direction::Left).is_game_over());
    }

    #[test]
    fn test_restart_replaces_board() {
        let mut s = seeded(GameConfig::default(), 5);
        for dir in Direction::ALL.iter().cycle().take(12) {
            s.input(*dir);
        }
        s.restart();
        assert_eq!(s.snapshot().len(), 1);
        assert_eq!(s.turns(), 0);
        assert!(!s.is_over());
    }

    #[test]
    fn test_unchanged_move_spawns_by_default() {
        let board = Board::from_rows([[2, 0, 0, 0], [0; 4], [0; 4], [0; 4]]).unwrap();
        let mut s = Session::with_board(GameConfig::default(), board, StdRng::seed_from_u64(8)).unwrap();
        let turn = s.input(Direction::Left);
        assert!(!turn.report.changed());
        assert!(matches!(turn.outcome, TickOutcome::Spawned(_)));
        assert_eq!(s.board().occupied_count(), 2);
    }

    #[test]
    fn test_full_board_input_reports_game_over() {
        let rows = [[2, 4, 2, 4], [4, 2, 4, 2], [2, 4, 2, 4], [4, 2, 4, 2]];
        let board = Board::from_rows(rows).unwrap();
        let mut s = Session::with_board(GameConfig::default(), board, StdRng::seed_from_u64(2)).unwrap();
        let turn = s.input(Direction::Down);
        assert!(turn.is_game_over());
        assert!(s.is_over());
        assert_eq!(s.board().to_rows(), rows);
    }

    #[test]
    fn test_unchanged_move_skips_when_configured() {
        let config = GameConfig { spawn_on_unchanged_move: false, ..GameConfig::default() };
        let board = Board::from_rows([[2, 0, 0, 0], [0; 4], [0; 4], [0; 4]]).unwrap();
        let mut s = Session::with_board(config, board, StdRng::seed_from_u64(8)).unwrap();
        let turn = s.input(Direction::Left);
        assert_eq!(turn.outcome, TickOutcome::Skipped);
        assert_eq!(s.board().occupied_count(), 1);

        let turn = s.input(Direction::Right);
        assert!(turn.report.changed());
        assert!(matches!(turn.outcome, TickOutcome::Spawned(_)));
        assert_eq!(s.board().occupied_count(), 2);
    }

    #[test]
    fn test_no_moves_rule_waits_for_stuck_board() {
        let config = GameConfig { end_rule: EndRule::NoMoves, ..GameConfig::default() };
        let board = Board::from_rows([[2; 4], [4, 8, 4, 8], [8, 4, 8, 4], [4, 8, 4, 8]]).unwrap();
        let mut s = Session::with_board(config, board, StdRng::seed_from_u64(4)).unwrap();
        // Up/Down change nothing on this board, but Left can still merge the top row.
        let turn = s.input(Direction::Up);
        assert!(!turn.report.changed());
        assert_eq!(turn.outcome, TickOutcome::Skipped);
        assert!(!s.is_over());
    }

    #[test]
    fn test_no_moves_rule_ends_on_stuck_board() {
        let config = GameConfig { end_rule: EndRule::NoMoves, ..GameConfig::default() };
        let mut s = seeded(config, 21);
        for dir in Direction::ALL.iter().cycle().take(20_000) {
            let turn = s.input(*dir);
            if s.board().occupied_count() == CELLS && !s.board().is_stuck() {
                assert_ne!(turn.outcome, TickOutcome::GameOver);
            }
            if turn.is_game_over() {
                assert!(s.board().is_stuck());
                break;
            }
        }
        assert!(s.is_over());
    }

    #[test]
    fn test_rejects_invalid_config() {
        let config = GameConfig { four_probability: -0.1, ..GameConfig::default() };
        assert!(matches!(
            Session::with_rng(config, StdRng::seed_from_u64(0)),
            Err(ConfigError::Invalid(_))
        ));
    }
}
