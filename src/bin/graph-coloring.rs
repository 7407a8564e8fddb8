// Copyright (c) 2024, The Tari Project
// SPDX-License-Identifier: BSD-3-Clause

//! Check a graph coloring from a file, either with the interactive zero-knowledge protocol or structurally.

use std::{fs, path::PathBuf, process::ExitCode};

use clap::{Parser, ValueEnum};
use graph_coloring_zkp::{
    bfs::validate_coloring,
    graph::Graph,
    parameters::{ChallengeMode, EdgeSelection, Parameters, ProtocolConfig, SecurityLevel},
    parse::parse_graph,
    protocol::prove_with_rng,
};
use rand_chacha::ChaCha12Rng;
use rand_core::{CryptoRngCore, OsRng, SeedableRng};
use tracing::{error, info};
use tracing_subscriber::{filter::LevelFilter, EnvFilter};

type CliResult<T> = Result<T, Box<dyn std::error::Error>>;

#[derive(Parser, Debug)]
#[command(name = "graph-coloring", version, about = "Graph 3-coloring zero-knowledge proof demo", long_about = None)]
struct Cli {
    /// Graph file: a `n,m` header, `m` edge lines `from,to`, then `n` vertex lines `vertex,color`
    #[arg(short = 'f', long = "file", value_name = "FILE")]
    file: PathBuf,
    /// How to check the coloring
    #[arg(long, value_enum, default_value_t = Mode::Zkp)]
    mode: Mode,
    /// Soundness multiplier: the protocol runs `a * |E|` rounds
    #[arg(short = 'a', long = "soundness", default_value_t = 1)]
    soundness: u32,
    /// Key sizes for the protocol
    #[arg(long, value_enum, default_value_t = Security::Standard)]
    security: Security,
    /// How the verifier picks the challenged edge
    #[arg(long, value_enum, default_value_t = Selection::SourceThenEdge)]
    selection: Selection,
    /// Whether each round challenges one edge or all of them
    #[arg(long, value_enum, default_value_t = Challenge::Single)]
    challenge: Challenge,
    /// Seed for a reproducible run; uses the operating system generator if absent
    #[arg(long)]
    seed: Option<u64>,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum Mode {
    /// Interactive zero-knowledge protocol
    Zkp,
    /// Structural breadth-first check
    Bfs,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum Security {
    Toy,
    Standard,
    High,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum Selection {
    /// Uniform source vertex, then uniform outgoing edge
    SourceThenEdge,
    /// Uniform over all edges
    Uniform,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum Challenge {
    Single,
    Exhaustive,
}

impl From<Security> for SecurityLevel {
    fn from(security: Security) -> Self {
        match security {
            Security::Toy => SecurityLevel::Toy,
            Security::Standard => SecurityLevel::Standard,
            Security::High => SecurityLevel::High,
        }
    }
}

impl From<Selection> for EdgeSelection {
    fn from(selection: Selection) -> Self {
        match selection {
            Selection::SourceThenEdge => EdgeSelection::SourceThenEdge,
            Selection::Uniform => EdgeSelection::Uniform,
        }
    }
}

impl From<Challenge> for ChallengeMode {
    fn from(challenge: Challenge) -> Self {
        match challenge {
            Challenge::Single => ChallengeMode::SingleEdge,
            Challenge::Exhaustive => ChallengeMode::Exhaustive,
        }
    }
}

// Process exit statuses
const EXIT_ACCEPTED: u8 = 0;
const EXIT_REJECTED: u8 = 1;

fn main() -> ExitCode {
    let env_filter = EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy();
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    let cli = Cli::parse();
    let result = match cli.seed {
        Some(seed) => run(&cli, &mut ChaCha12Rng::seed_from_u64(seed)),
        None => run(&cli, &mut OsRng),
    };

    ExitCode::from(exit_status(&result))
}

// Any failure, including a rejected proof, is reported and exits with a failure status
fn exit_status(result: &CliResult<()>) -> u8 {
    match result {
        Ok(()) => EXIT_ACCEPTED,
        Err(err) => {
            error!("{err}");
            EXIT_REJECTED
        },
    }
}

fn run<R: CryptoRngCore>(cli: &Cli, rng: &mut R) -> CliResult<()> {
    let text = fs::read_to_string(&cli.file)?;
    let graph = parse_graph(&text)?;
    info!(
        file = %cli.file.display(),
        vertices = graph.vertex_count(),
        edges = graph.edge_count(),
        "loaded graph"
    );

    check(cli, &graph, rng)
}

fn check<R: CryptoRngCore>(cli: &Cli, graph: &Graph, rng: &mut R) -> CliResult<()> {
    match cli.mode {
        Mode::Zkp => {
            let config = ProtocolConfig::new(
                &Parameters::from_level(cli.security.into()),
                cli.soundness,
                cli.challenge.into(),
                cli.selection.into(),
            )?;
            let report = prove_with_rng(graph, &config, rng)?;
            info!(
                rounds = report.get_rounds(),
                edges_checked = report.get_edges_checked(),
                "the prover knows a proper coloring"
            );
        },
        Mode::Bfs => {
            validate_coloring(graph, rng)?;
            info!("the coloring is proper");
        },
    }

    Ok(())
}
