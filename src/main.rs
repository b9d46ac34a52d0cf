use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use katyusha_core::{Board, STARTING_FEN};
use katyusha_eval::evaluator::{DEFAULT_NETWORK_SCALE, DEFAULT_PAWN_VALUE};
use katyusha_eval::{EvalConfig, Evaluator, EvaluatorKind};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

/// Score chess positions with the katyusha evaluator.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Network weights (.npz). Material is counted when omitted.
    #[arg(short, long)]
    weights: Option<PathBuf>,

    /// Pawns per unit of network output
    #[arg(long, default_value_t = DEFAULT_NETWORK_SCALE)]
    scale: f32,

    /// Score units per pawn
    #[arg(long, default_value_t = DEFAULT_PAWN_VALUE)]
    pawn_value: i32,

    /// Print every named feature of each position
    #[arg(long)]
    features: bool,

    /// Also print the network output before rescaling
    #[arg(long)]
    raw: bool,

    /// Positions in FEN, one per argument. Defaults to the starting position.
    fens: Vec<String>,
}

impl Args {
    fn config(&self) -> EvalConfig {
        let kind = match &self.weights {
            Some(path) => EvaluatorKind::Network { weights: path.clone() },
            None => EvaluatorKind::Material,
        };
        EvalConfig { kind, network_scale: self.scale, pawn_value: self.pawn_value }
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    debug!(?args, "parsed arguments");

    let mut evaluator =
        Evaluator::new(&args.config()).context("failed to set up the evaluator")?;
    info!(network = evaluator.is_network(), "katyusha ready");

    let fens = if args.fens.is_empty() {
        vec![STARTING_FEN.to_string()]
    } else {
        args.fens.clone()
    };

    for fen in &fens {
        let board: Board = fen.parse().with_context(|| format!("invalid FEN `{fen}`"))?;
        let score = evaluator.evaluate(&board);
        let raw = if args.raw { evaluator.raw(&board) } else { None };
        match raw {
            Some(raw) => println!("{score}\t{raw:.6}\t{board}"),
            None => println!("{score}\t{board}"),
        }
        if args.features {
            for (name, value) in evaluator.features(&board).named() {
                println!("  {name:<20} {value}");
            }
        }
    }
    Ok(())
}
