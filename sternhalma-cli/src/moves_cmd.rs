//! Moves command - list the legal destinations of one cell
//!
//! Works on the opening position, or on any setup given as two lists of
//! cell indices.

use anyhow::{bail, Result};
use clap::Args;

use sternhalma_core::{
    generate_moves, jump_moves, step_moves, Bitboard, Cell, GameState, Side,
};

#[derive(Args)]
pub struct MovesArgs {
    /// Cell index (0 = northern tip, 80 = southern tip)
    #[arg(long)]
    pub cell: usize,

    /// North piece cells, comma separated (default: North home)
    #[arg(long, value_delimiter = ',')]
    pub north: Option<Vec<usize>>,

    /// South piece cells, comma separated (default: South home)
    #[arg(long, value_delimiter = ',')]
    pub south: Option<Vec<usize>>,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

/// Destinations of one piece, split by kind
#[derive(Debug, serde::Serialize)]
struct CellMoves {
    cell: usize,
    q: i8,
    r: i8,
    steps: Vec<usize>,
    jumps: Vec<usize>,
}

/// Run moves command
pub fn run(args: MovesArgs) -> Result<()> {
    let occupied = load_occupancy(&args)?;
    let moves = cell_moves(args.cell, occupied)?;

    tracing::info!(
        "Cell {}: {} step(s), {} jump destination(s)",
        moves.cell,
        moves.steps.len(),
        moves.jumps.len()
    );

    if args.json {
        println!("{}", serde_json::to_string_pretty(&moves)?);
    } else {
        println!("Cell {} (q={}, r={})", moves.cell, moves.q, moves.r);
        println!("  steps: {:?}", moves.steps);
        println!("  jumps: {:?}", moves.jumps);
    }

    Ok(())
}

fn load_occupancy(args: &MovesArgs) -> Result<Bitboard> {
    let board = |cells: &Option<Vec<usize>>, side: Side| -> Result<Bitboard> {
        match cells {
            Some(cells) => cells.iter().try_fold(Bitboard::EMPTY, |acc, &c| -> Result<Bitboard> {
                Ok(acc | Bitboard::try_from_index(c)?)
            }),
            None => Ok(side.home()),
        }
    };

    let north = board(&args.north, Side::North)?;
    let south = board(&args.south, Side::South)?;
    let game = GameState::from_sides(north, south, Side::North)?;
    Ok(game.occupied())
}

fn cell_moves(cell: usize, occupied: Bitboard) -> Result<CellMoves> {
    let piece = Bitboard::try_from_index(cell)?;
    if (piece & occupied).is_empty() {
        bail!("cell {} is empty", cell);
    }

    let all = generate_moves(piece, occupied)?;
    let steps = step_moves(cell, occupied);
    let jumps = jump_moves(cell, occupied);
    debug_assert_eq!(all, steps | jumps);

    let coords = Cell::from_index(cell);
    Ok(CellMoves {
        cell,
        q: coords.q,
        r: coords.r,
        steps: steps.indices().collect(),
        // a cell reachable by a step is listed once, as a step
        jumps: (jumps & !steps).indices().collect(),
    })
}
