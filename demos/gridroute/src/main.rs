//! gridroute: delivery agents crossing a grid under random traffic.
//!
//! Every subcommand builds one simulation on either a JSON road graph
//! (`--graph`) or a synthetic open grid, runs it to completion and prints a
//! per-agent metrics table.  With `--out DIR` the run is also written to CSV
//! (SQLite with the `sqlite` feature).
//!
//! ```text
//! gridroute run     --rows 12 --cols 12 -S dijkstra -S astar(euclidean)
//! gridroute compare --graph city.json --start 0,0 --goal 14,3 --block 5,5
//! gridroute oracle  --agents 3 --reliability 0.6 --timeout-ms 50 --latency-ms 10
//! ```
//!
//! Log level defaults to `info` (`debug` with `--verbose`); `RUST_LOG`
//! overrides both.

mod oracle;
mod report;

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use gr_agent::{parse_move, DeliveryAgent, DeliveryAgentBuilder, OraclePilot};
use gr_core::{Cell, SimConfig, SimRng};
use gr_output::{OutputWriter, SimOutputObserver};
use gr_sim::{NoopObserver, Sim, SimBuilder, SimSummary};
use gr_spatial::{load_graph_json, GridGraph, Strategy};
use gr_traffic::TrafficConfig;

use oracle::NoisyOracle;

// ── Command line ──────────────────────────────────────────────────────────────

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Debug-level logging.
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// One planner agent per strategy, all sharing the same traffic.
    Run {
        #[command(flatten)]
        scenario: Scenario,

        /// Routing strategy, e.g. `dijkstra`, `astar(obstacle-count)`.  Repeat
        /// for several agents.
        #[arg(short = 'S', long = "strategy", default_value = "astar(manhattan)")]
        strategies: Vec<Strategy>,
    },

    /// All four strategy variants from the same start and goal.
    Compare {
        #[command(flatten)]
        scenario: Scenario,
    },

    /// Agents steered by a seeded, unreliable demo oracle.
    Oracle {
        #[command(flatten)]
        scenario: Scenario,

        #[arg(long, default_value_t = 2)]
        agents: usize,

        /// Probability that the oracle gives a sensible answer.
        #[arg(long, default_value_t = 0.7)]
        reliability: f64,

        /// Simulated answer latency.
        #[arg(long, default_value_t = 0)]
        latency_ms: u64,

        /// Abandon an answer after this long and follow the reference route.
        #[arg(long, default_value_t = 2000)]
        timeout_ms: u64,

        /// Strategy of the fallback reference route.
        #[arg(long, default_value = "astar(manhattan)")]
        reference: Strategy,
    },
}

/// Graph, endpoints, traffic and run limits shared by every subcommand.
#[derive(Args)]
struct Scenario {
    /// Road graph JSON.  Without it a `rows × cols` open grid is used.
    #[arg(short, long)]
    graph: Option<PathBuf>,

    #[arg(long, default_value_t = 10)]
    rows: u32,

    #[arg(long, default_value_t = 10)]
    cols: u32,

    /// Start cell as `row,col`.
    #[arg(long, value_parser = cell_arg, default_value = "0,0")]
    start: Cell,

    /// Goal cell as `row,col`.  Defaults to the bottom-right corner.
    #[arg(long, value_parser = cell_arg)]
    goal: Option<Cell>,

    /// Permanently blocked cell as `row,col`.  Repeatable.
    #[arg(long = "block", value_parser = cell_arg)]
    blocks: Vec<Cell>,

    #[arg(long, default_value_t = 42)]
    seed: u64,

    #[arg(long, default_value_t = 100)]
    max_ticks: u64,

    #[arg(long, default_value_t = 10)]
    stuck_limit: u32,

    #[arg(long, default_value_t = 4)]
    ping_limit: u32,

    /// Simultaneous traffic obstructions to maintain.
    #[arg(long, default_value_t = 2)]
    alerts: usize,

    #[arg(long, default_value_t = 4)]
    ttl: u32,

    #[arg(long, default_value_t = 3)]
    penalty: u64,

    #[arg(long, default_value_t = 1.0)]
    spawn_probability: f64,

    /// Write positions, tick summaries and agent metrics to this directory.
    #[arg(short, long)]
    out: Option<PathBuf>,
}

fn cell_arg(s: &str) -> Result<Cell, String> {
    parse_move(s).ok_or_else(|| format!("expected `row,col`, got {s:?}"))
}

impl Scenario {
    fn load_graph(&self) -> Result<GridGraph> {
        match &self.graph {
            Some(path) => load_graph_json(path).with_context(|| format!("loading graph {}", path.display())),
            None => {
                info!(rows = self.rows, cols = self.cols, "using synthetic open grid");
                Ok(GridGraph::open_grid(self.rows, self.cols))
            }
        }
    }

    fn sim_config(&self) -> SimConfig {
        SimConfig {
            max_ticks:   self.max_ticks,
            seed:        self.seed,
            stuck_limit: self.stuck_limit,
            ping_limit:  self.ping_limit,
        }
    }

    fn traffic(&self, graph: &GridGraph) -> TrafficConfig {
        TrafficConfig {
            ttl:               self.ttl,
            max_alerts:        self.alerts,
            penalty:           self.penalty,
            spawn_probability: self.spawn_probability,
            ..TrafficConfig::for_grid(graph.rows(), graph.cols())
        }
    }

    /// Start and goal, each moved to the nearest road cell if it is not one.
    fn endpoints(&self, graph: &GridGraph) -> Result<(Cell, Cell)> {
        let goal = self
            .goal
            .unwrap_or_else(|| Cell::new(graph.rows() as i32 - 1, graph.cols() as i32 - 1));
        Ok((snap(graph, "start", self.start)?, snap(graph, "goal", goal)?))
    }
}

fn snap(graph: &GridGraph, what: &str, cell: Cell) -> Result<Cell> {
    if graph.node_at(cell).is_some() {
        return Ok(cell);
    }
    let Some(node) = graph.snap_to_node(cell) else {
        bail!("graph has no road cells to place the {what} on");
    };
    let snapped = graph.cell(node);
    warn!(%cell, %snapped, "{what} is not a road cell, using the nearest one");
    Ok(snapped)
}

// ── Entry point ───────────────────────────────────────────────────────────────

fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt().with_env_filter(filter).with_target(false).init();

    match cli.command {
        Commands::Run { scenario, strategies } => {
            let graph = scenario.load_graph()?;
            let (start, goal) = scenario.endpoints(&graph)?;
            let agents = strategies
                .iter()
                .enumerate()
                .map(|(i, &strategy)| {
                    DeliveryAgent::builder(format!("{i}:{strategy}"), start, goal).strategy(strategy)
                })
                .collect();
            let (sim, summary) = simulate(&scenario, graph, agents)?;
            report::print_run(&sim, &summary, true);
        }

        Commands::Compare { scenario } => {
            let graph = scenario.load_graph()?;
            let (start, goal) = scenario.endpoints(&graph)?;
            let agents = Strategy::all()
                .into_iter()
                .map(|strategy| DeliveryAgent::builder(strategy.to_string(), start, goal).strategy(strategy))
                .collect();
            let (sim, summary) = simulate(&scenario, graph, agents)?;
            report::print_run(&sim, &summary, false);
        }

        Commands::Oracle { scenario, agents, reliability, latency_ms, timeout_ms, reference } => {
            if !(0.0..=1.0).contains(&reliability) {
                bail!("--reliability must be within [0, 1], got {reliability}");
            }
            let graph = scenario.load_graph()?;
            let (start, goal) = scenario.endpoints(&graph)?;
            let latency = Duration::from_millis(latency_ms);

            // Oracle streams are derived from their own root so they never
            // shift the traffic draws of the same seed.
            let mut root = SimRng::new(scenario.seed ^ oracle::SEED_SALT);
            let builders = (0..agents)
                .map(|i| {
                    // Alternate direction so agents cross paths.
                    let (from, to) = if i % 2 == 0 { (start, goal) } else { (goal, start) };
                    let oracle = NoisyOracle::new(root.child(i as u64), reliability, latency);
                    let pilot = OraclePilot::new(oracle, reference).deadline(Duration::from_millis(timeout_ms));
                    DeliveryAgent::builder(format!("oracle-{i}"), from, to).pilot(pilot)
                })
                .collect();
            let (sim, summary) = simulate(&scenario, graph, builders)?;
            report::print_run(&sim, &summary, true);
        }
    }
    Ok(())
}

// ── Running ───────────────────────────────────────────────────────────────────

fn simulate(
    scenario: &Scenario,
    graph: GridGraph,
    agents: Vec<DeliveryAgentBuilder>,
) -> Result<(Sim, SimSummary)> {
    let traffic = scenario.traffic(&graph);
    let mut sim = SimBuilder::new(scenario.sim_config(), graph)
        .traffic(traffic)
        .permanent_blocks(scenario.blocks.iter().copied())
        .agents(agents)
        .build()
        .context("building simulation")?;

    let summary = match &scenario.out {
        None => sim.run(&mut NoopObserver),
        Some(dir) => {
            #[cfg(feature = "sqlite")]
            let writer = gr_output::SqliteWriter::new(dir)?;
            #[cfg(not(feature = "sqlite"))]
            let writer = gr_output::CsvWriter::new(dir)?;
            let summary = run_with_output(&mut sim, writer)?;
            info!(dir = %dir.display(), "output written");
            summary
        }
    };
    Ok((sim, summary))
}

fn run_with_output<W: OutputWriter>(sim: &mut Sim, writer: W) -> Result<SimSummary> {
    let mut observer = SimOutputObserver::new(writer);
    let summary = sim.run(&mut observer);
    if let Some(e) = observer.take_error() {
        return Err(e).context("writing run output");
    }
    Ok(summary)
}
