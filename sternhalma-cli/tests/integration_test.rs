//! Integration tests for the Sternhalma engine
//!
//! Tests the full stack: bitboard, move generation, evaluation, the three
//! search strategies and whole games driven through `GameState`.

use std::time::Instant;

use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use sternhalma_core::{
    all_moves, apply_move, best_move_hybrid, best_move_parallel, best_move_serial, evaluate,
    find_best_move, generate_moves, jump_moves, minimax, step_moves, Bitboard, Cell, EngineError,
    Evaluator, GameResult, GameState, Heuristics, Move, Position, SearchConfig, SearchOutcome,
    SearchStats, Searcher, Side, Strategy, CELL_COUNT, DEFAULT_CACHE_CAPACITY,
};

// ============================================================================
// TEST FIXTURES
// ============================================================================

fn cell(q: i8, r: i8) -> usize {
    Cell::new(q, r).index()
}

fn random_occupancy(rng: &mut ChaCha8Rng) -> Bitboard {
    Bitboard::try_from(rng.gen::<u128>() & Bitboard::FULL.to_u128()).unwrap()
}

/// Position reached by random play from the opening
fn random_game_position(seed: u64, plies: usize) -> Position {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let mut game = GameState::new();
    for _ in 0..plies {
        let mv = *game.legal_moves().choose(&mut rng).unwrap();
        game = game.apply_move(mv).unwrap();
    }
    game.position()
}

/// Plain minimax without pruning, leaves scored from the root mover's view
fn exhaustive(
    mover: Bitboard,
    opponent: Bitboard,
    depth: u32,
    maximizing: bool,
    side: Side,
) -> i32 {
    let heuristics = Heuristics::default();
    if depth == 0 {
        return evaluate(mover, opponent, side, &heuristics);
    }
    let occupied = mover | opponent;
    let pieces = if maximizing { mover } else { opponent };
    let moves = all_moves(pieces, occupied);
    if moves.is_empty() {
        return evaluate(mover, opponent, side, &heuristics);
    }
    let scores = moves.iter().map(|mv| {
        let mask = mv.mask();
        if maximizing {
            exhaustive(mover ^ mask, opponent, depth - 1, false, side)
        } else {
            exhaustive(mover, opponent ^ mask, depth - 1, true, side)
        }
    });
    if maximizing {
        scores.max().unwrap()
    } else {
        scores.min().unwrap()
    }
}

// ============================================================================
// BITBOARD AND MOVE GENERATION
// ============================================================================

#[test]
fn test_extract_deposit_inverse_on_mask() {
    let mut rng = ChaCha8Rng::seed_from_u64(17);
    for _ in 0..500 {
        let value = random_occupancy(&mut rng);
        let mask = random_occupancy(&mut rng);
        let packed = value.extract(mask);
        assert!(packed.count() <= mask.count());
        assert_eq!(packed.deposit(mask), value & mask);
    }
}

#[test]
fn test_apply_move_twice_restores_state() {
    let mut rng = ChaCha8Rng::seed_from_u64(21);
    for _ in 0..100 {
        let occupied = random_occupancy(&mut rng);
        let side = occupied & random_occupancy(&mut rng);
        for from in side.indices().take(3) {
            let dests = step_moves(from, occupied) | jump_moves(from, occupied);
            if let Some(to) = dests.lowest_index() {
                let source = Bitboard::from_index(from);
                let dest = Bitboard::from_index(to);
                let (occ1, side1) = apply_move(source, dest, occupied, side).unwrap();
                assert_eq!(apply_move(source, dest, occ1, side1).unwrap(), (occupied, side));
            }
        }
    }
}

#[test]
fn test_generated_moves_land_on_empty_cells() {
    let mut rng = ChaCha8Rng::seed_from_u64(23);
    for _ in 0..200 {
        let occupied = random_occupancy(&mut rng);
        for piece in occupied.indices() {
            let moves = generate_moves(Bitboard::from_index(piece), occupied).unwrap();
            assert!((moves & occupied).is_empty(), "piece {} lands on a piece", piece);
        }
    }
}

#[test]
fn test_jump_closure_along_a_row() {
    let piece = cell(-8, 8);
    let occupied = Bitboard::from_indices(&[piece, cell(-6, 8), cell(-2, 8), cell(2, 8), cell(6, 8)]);
    let expected = Bitboard::from_indices(&[cell(-4, 8), cell(0, 8), cell(4, 8), cell(8, 8)]);
    assert_eq!(jump_moves(piece, occupied), expected);
}

#[test]
fn test_opening_piece_moves() {
    let occupied = GameState::new().occupied();

    // front-row corner: two steps, nothing to jump over
    let corner = Bitboard::from_index(cell(-3, 3));
    assert_eq!(generate_moves(corner, occupied).unwrap().count(), 2);
    assert_eq!(jump_moves(cell(-3, 3), occupied), Bitboard::EMPTY);

    // the tip is boxed in
    assert_eq!(generate_moves(Bitboard::from_index(0), occupied).unwrap(), Bitboard::EMPTY);

    assert!(matches!(
        generate_moves(Bitboard::from_indices(&[0, 1]), occupied),
        Err(EngineError::NotSinglePiece(2))
    ));
}

#[test]
fn test_opening_moves_are_symmetric() {
    let north = GameState::new().legal_moves();
    let south = GameState::new().pass().legal_moves();
    assert_eq!(north.len(), south.len());

    // South's moves are North's mirrored through the centre
    let mirror = |i: usize| CELL_COUNT - 1 - i;
    let mut mirrored: Vec<Move> = north
        .iter()
        .map(|mv| Move::new(mirror(mv.source()), mirror(mv.dest())))
        .collect();
    mirrored.sort_by_key(|m| (m.from, m.to));
    assert_eq!(mirrored, south);
}

// ============================================================================
// EVALUATION
// ============================================================================

#[test]
fn test_evaluator_cache_never_changes_scores() {
    let mut rng = ChaCha8Rng::seed_from_u64(31);
    let heuristics = Heuristics::default();
    let mut evaluator = Evaluator::new(Side::South, heuristics, 8);

    let boards: Vec<(Bitboard, Bitboard)> = (0..20)
        .map(|_| {
            let a = random_occupancy(&mut rng);
            let b = random_occupancy(&mut rng) & !a;
            (a, b)
        })
        .collect();

    for _ in 0..3 {
        for &(a, b) in &boards {
            assert_eq!(evaluator.evaluate(a, b), evaluate(a, b, Side::South, &heuristics));
        }
    }
    assert!(evaluator.len() <= 8);
}

// ============================================================================
// SEARCH
// ============================================================================

#[test]
fn test_alpha_beta_equals_exhaustive_minimax() {
    let mut rng = ChaCha8Rng::seed_from_u64(41);
    for depth in 1..=3 {
        let mut cells: Vec<usize> = (25..56).collect();
        cells.shuffle(&mut rng);
        let mover = Bitboard::from_indices(&cells[..2]);
        let opponent = Bitboard::from_indices(&cells[2..4]);

        let mut evaluator = Evaluator::new(Side::North, Heuristics::default(), DEFAULT_CACHE_CAPACITY);
        let mut stats = SearchStats::default();
        let pruned = minimax(
            mover,
            opponent,
            mover | opponent,
            depth,
            i32::MIN,
            i32::MAX,
            true,
            &mut evaluator,
            &mut stats,
        );
        assert_eq!(pruned, exhaustive(mover, opponent, depth, true, Side::North));
    }
}

#[test]
fn test_all_strategies_agree_on_random_positions() {
    for seed in 0..3 {
        let pos = random_game_position(seed, 10);
        let config = SearchConfig::with_depth(2);

        let serial = best_move_serial(&pos, &config).unwrap();
        let parallel = best_move_parallel(&pos, &config).unwrap();
        assert_eq!(serial.outcome, parallel.outcome, "seed {}", seed);

        // depth 2 is not deeper than the quick pass, so hybrid searches everything
        let hybrid = best_move_hybrid(&pos, &config).unwrap();
        assert_eq!(hybrid.outcome, parallel.outcome, "seed {}", seed);
    }
}

#[test]
fn test_hybrid_agrees_when_best_survives_ranking() {
    // a lone runner with six open neighbours; the forward steps rank first
    let north = Bitboard::from_index(cell(0, 6));
    let pos = Position::from_pieces(north, Side::South.home(), Side::North).unwrap();
    let config = SearchConfig::with_depth(3);

    let parallel = best_move_parallel(&pos, &config).unwrap();
    let hybrid = best_move_hybrid(&pos, &config).unwrap();
    assert_eq!(hybrid.outcome, parallel.outcome);
    assert!(hybrid.best_move().unwrap().dest() > cell(0, 6));
}

#[test]
fn test_no_legal_move_is_not_an_error() {
    let pos = Position::from_pieces(
        Bitboard::from_index(0),
        Bitboard::from_indices(&[1, 2, 3, 5]),
        Side::North,
    )
    .unwrap();
    let result = best_move_parallel(&pos, &SearchConfig::with_depth(3)).unwrap();
    assert_eq!(result.outcome, SearchOutcome::NoMove);
    assert_eq!(result.best_move(), None);
}

#[test]
fn test_boundary_rejects_bad_inputs() {
    let north = Side::North.home();
    let south = Side::South.home();

    assert!(matches!(
        find_best_move(north, north, north, Side::North, 2),
        Err(EngineError::OverlappingSides(10))
    ));
    assert!(matches!(
        find_best_move(north, south, Bitboard::FULL, Side::North, 2),
        Err(EngineError::OccupancyMismatch)
    ));
    assert!(matches!(
        find_best_move(north, south, north | south, Side::North, 0),
        Err(EngineError::ZeroDepth)
    ));
    assert!(matches!(
        Bitboard::try_from(1u128 << 100),
        Err(EngineError::OutsideBoard(_))
    ));
    assert!(matches!(
        Bitboard::try_from(Bitboard::FULL.to_u128() | 1 << 81),
        Err(EngineError::OutsideBoard(_))
    ));
}

#[test]
fn test_search_config_from_json_file() {
    let path = std::env::temp_dir().join(format!("sternhalma-config-{}.json", std::process::id()));
    std::fs::write(&path, r#"{"depth": 2, "strategy": "serial", "heuristics": {"goal_weight": 80}}"#).unwrap();

    let config = SearchConfig::load(&path).unwrap();
    std::fs::remove_file(&path).ok();

    assert_eq!(config.depth, 2);
    assert_eq!(config.strategy, Strategy::Serial);
    assert_eq!(config.heuristics.goal_weight, 80);
    assert_eq!(config.heuristics.goal_rows, 3);

    let searcher = Searcher::new(config).unwrap();
    assert!(searcher.best_move(&Position::initial(Side::North)).unwrap().is_some());
}

// ============================================================================
// FULL GAMES
// ============================================================================

#[test]
fn test_engine_beats_random_mover() {
    let engine = Searcher::new(SearchConfig::with_depth(2)).unwrap();
    let mut rng = ChaCha8Rng::seed_from_u64(51);
    let mut game = GameState::new();

    while !game.is_over() && game.ply < 400 {
        game = match game.current_player() {
            Side::North => match engine.best_move(&game.position()).unwrap() {
                Some(mv) => game.apply_move(mv).unwrap(),
                None => game.pass(),
            },
            Side::South => match game.legal_moves().choose(&mut rng) {
                Some(&mv) => game.apply_move(mv).unwrap(),
                None => game.pass(),
            },
        };
    }

    println!("Game ended: {:?} after {} plies", game.result(), game.ply);
    let heuristics = Heuristics::default();
    let north = game.pieces(Side::North);
    let south = game.pieces(Side::South);
    assert!(evaluate(north, south, Side::North, &heuristics) > 0);
    assert!(game.pieces_home(Side::North) >= game.pieces_home(Side::South));
    assert_ne!(game.result(), GameResult::SouthWins);
}

#[test]
fn test_search_performance() {
    let pos = Position::initial(Side::North);
    let searcher = Searcher::new(SearchConfig::with_depth(3)).unwrap();

    let start = Instant::now();
    let result = searcher.search(&pos).unwrap();
    let elapsed = start.elapsed();

    println!("Hybrid depth 3: {:?}, {} nodes", elapsed, result.stats.nodes);
    assert!(result.best_move().is_some());
    assert!(elapsed.as_millis() < 30000, "Depth 3 took too long");
}
