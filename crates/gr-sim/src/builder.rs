//! Fluent builder for constructing a [`Sim`].

use std::sync::Arc;

use gr_agent::DeliveryAgentBuilder;
use gr_core::{AgentId, Cell, SimConfig, SimRng, Tick};
use gr_spatial::GridGraph;
use gr_traffic::{PermanentBlocks, TrafficConfig, TrafficController};

use crate::{Sim, SimResult};

/// Fluent builder for [`Sim`].
///
/// # Required inputs
///
/// - [`SimConfig`]: tick limit, seed, stuck and ping limits
/// - the road graph
///
/// # Optional inputs (have defaults)
///
/// | Method                    | Default                                       |
/// |---------------------------|-----------------------------------------------|
/// | `.traffic(c)`             | `TrafficConfig::for_grid(graph bounds)`       |
/// | `.permanent_blocks(cells)`| none                                          |
/// | `.agent(b)` / `.agents()` | none; a run without agents halts at tick 1    |
///
/// Every agent gets the run's `ping_limit`; agents are registered, and
/// therefore advance, in the order they were added.
///
/// # Example
///
/// ```
/// use gr_agent::DeliveryAgent;
/// use gr_core::{Cell, SimConfig};
/// use gr_sim::{NoopObserver, SimBuilder, SimOutcome};
/// use gr_spatial::GridGraph;
///
/// let mut sim = SimBuilder::new(SimConfig::default(), GridGraph::open_grid(4, 4))
///     .agent(DeliveryAgent::builder("van-01", Cell::new(0, 0), Cell::new(3, 3)))
///     .build()
///     .unwrap();
/// let summary = sim.run(&mut NoopObserver);
/// assert_eq!(summary.outcome, SimOutcome::AllFinished);
/// ```
pub struct SimBuilder {
    config:  SimConfig,
    graph:   Arc<GridGraph>,
    traffic: Option<TrafficConfig>,
    blocks:  PermanentBlocks,
    agents:  Vec<DeliveryAgentBuilder>,
}

impl SimBuilder {
    pub fn new(config: SimConfig, graph: impl Into<Arc<GridGraph>>) -> Self {
        Self {
            config,
            graph: graph.into(),
            traffic: None,
            blocks: PermanentBlocks::new(),
            agents: Vec::new(),
        }
    }

    pub fn traffic(mut self, traffic: TrafficConfig) -> Self {
        self.traffic = Some(traffic);
        self
    }

    /// Cells every agent treats as impassable.
    pub fn permanent_blocks(mut self, cells: impl IntoIterator<Item = Cell>) -> Self {
        for cell in cells {
            self.blocks.insert(cell);
        }
        self
    }

    pub fn agent(mut self, agent: DeliveryAgentBuilder) -> Self {
        self.agents.push(agent);
        self
    }

    pub fn agents(mut self, agents: impl IntoIterator<Item = DeliveryAgentBuilder>) -> Self {
        self.agents.extend(agents);
        self
    }

    /// Validate inputs, build every agent (making its first plan), register
    /// them with a fresh controller, and return a ready-to-run [`Sim`].
    pub fn build(self) -> SimResult<Sim> {
        self.config.validate()?;

        let traffic = self
            .traffic
            .unwrap_or_else(|| TrafficConfig::for_grid(self.graph.rows(), self.graph.cols()));
        let mut controller = TrafficController::new(traffic, SimRng::new(self.config.seed))?;

        let blocks = Arc::new(self.blocks);
        for (i, builder) in self.agents.into_iter().enumerate() {
            let agent = builder
                .ping_limit(self.config.ping_limit)
                .build(AgentId(i as u32), Arc::clone(&self.graph), Arc::clone(&blocks))?;
            let id = controller.register(agent);
            debug_assert_eq!(id, AgentId(i as u32));
        }

        let last_positions = controller.subscribers().iter().map(|a| a.position()).collect();
        Ok(Sim {
            config: self.config,
            graph: self.graph,
            tick: Tick::ZERO,
            controller,
            stuck_counter: 0,
            last_positions,
            outcome: None,
        })
    }
}
