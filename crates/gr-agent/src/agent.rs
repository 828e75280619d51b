//! The delivery agent.

use std::sync::Arc;

use tracing::{debug, info};

use gr_core::{AgentId, Cell, NodeId, SimConfig, Tick};
use gr_spatial::{GridGraph, Strategy};
use gr_traffic::{PermanentBlocks, TrafficSnapshot, TrafficSubscriber};

use crate::pilot::{Navigation, Pilot, RoutePlanner, StepDecision};
use crate::{
    AgentError, AgentEvent, AgentMetrics, AgentResult, AgentStatus, IncapableReason, LoopDetector,
};

// ── DeliveryAgent ─────────────────────────────────────────────────────────────

/// An agent travelling from a start cell to a fixed goal cell.
///
/// Where it goes is decided by its [`Pilot`]; the agent owns everything
/// else: position, the append-only position history, the loop detector, the
/// lifecycle status and the metrics.  Once [`Finished`](AgentStatus::Finished)
/// or [`Incapable`](AgentStatus::Incapable) it ignores traffic and never
/// moves again.
pub struct DeliveryAgent {
    id:       AgentId,
    name:     String,
    graph:    Arc<GridGraph>,
    blocks:   Arc<PermanentBlocks>,
    traffic:  Arc<TrafficSnapshot>,
    position: NodeId,
    goal:     NodeId,
    pilot:    Box<dyn Pilot>,
    history:  Vec<NodeId>,
    detector: LoopDetector,
    status:   AgentStatus,
    metrics:  AgentMetrics,
}

impl DeliveryAgent {
    pub fn builder(name: impl Into<String>, start: Cell, goal: Cell) -> DeliveryAgentBuilder {
        DeliveryAgentBuilder::new(name, start, goal)
    }

    // ── Accessors ─────────────────────────────────────────────────────────

    pub fn id(&self) -> AgentId { self.id }
    pub fn name(&self) -> &str { &self.name }
    pub fn status(&self) -> AgentStatus { self.status }
    pub fn metrics(&self) -> &AgentMetrics { &self.metrics }
    pub fn position(&self) -> NodeId { self.position }
    pub fn goal(&self) -> NodeId { self.goal }

    pub fn position_cell(&self) -> Cell {
        self.graph.cell(self.position)
    }

    pub fn goal_cell(&self) -> Cell {
        self.graph.cell(self.goal)
    }

    /// Every position held, starting with the start node.  One entry is
    /// appended per move; holds append nothing.
    pub fn history(&self) -> &[NodeId] {
        &self.history
    }

    /// Pilot label, e.g. `"astar(manhattan)"`.
    pub fn pilot_label(&self) -> String {
        self.pilot.label()
    }

    /// The snapshot most recently received.
    pub fn traffic(&self) -> &Arc<TrafficSnapshot> {
        &self.traffic
    }

    // ── Transitions ───────────────────────────────────────────────────────

    /// Force the agent into `Incapable`.  No-op (returns `None`) if it is
    /// already terminal.
    pub fn mark_incapable(&mut self, reason: IncapableReason, tick: Tick) -> Option<AgentEvent> {
        if self.status.is_terminal() {
            return None;
        }
        self.status = AgentStatus::Incapable { reason, tick };
        let at = self.position_cell();
        info!(agent = %self.name, %tick, %at, %reason, "agent incapable");
        Some(AgentEvent::Incapacitated { agent: self.id, tick, at, reason })
    }

    fn finish(&mut self, tick: Tick, events: &mut Vec<AgentEvent>) {
        self.status = AgentStatus::Finished { tick };
        let at = self.position_cell();
        info!(agent = %self.name, %tick, steps = self.metrics.steps, "arrived");
        events.push(AgentEvent::Arrived { agent: self.id, tick, at });
    }

    /// One tick of movement.
    pub fn step(&mut self, tick: Tick, events: &mut Vec<AgentEvent>) {
        if self.status.is_terminal() {
            return;
        }
        if self.position == self.goal {
            self.finish(tick, events);
            return;
        }

        let nav = Navigation {
            agent:    self.id,
            graph:    &self.graph,
            traffic:  &self.traffic,
            blocks:   &self.blocks,
            position: self.position,
            goal:     self.goal,
        };
        let decision = self.pilot.next_step(&nav, &mut self.metrics);

        let from = self.graph.cell(self.position);
        match decision {
            StepDecision::Move(next) => {
                let to = self.graph.cell(next);
                self.position = next;
                self.history.push(next);
                self.metrics.steps += 1;
                debug!(agent = %self.name, %tick, %from, %to, "moved");
                events.push(AgentEvent::Moved { agent: self.id, tick, from, to });
            }
            StepDecision::Hold(reason) => {
                debug!(agent = %self.name, %tick, at = %from, ?reason, "held");
                events.push(AgentEvent::Held { agent: self.id, tick, at: from, reason });
            }
        }

        let tripped = self.detector.observe(self.position);
        if self.position == self.goal {
            self.finish(tick, events);
        } else if tripped {
            events.extend(self.mark_incapable(IncapableReason::Oscillation, tick));
        }
    }
}

impl TrafficSubscriber for DeliveryAgent {
    type Event = AgentEvent;

    fn on_traffic_update(&mut self, snapshot: &Arc<TrafficSnapshot>) {
        self.traffic = Arc::clone(snapshot);
        if self.status.is_terminal() {
            return;
        }
        let nav = Navigation {
            agent:    self.id,
            graph:    &self.graph,
            traffic:  &self.traffic,
            blocks:   &self.blocks,
            position: self.position,
            goal:     self.goal,
        };
        self.pilot.on_traffic(&nav, &mut self.metrics);
    }

    fn advance(&mut self, tick: Tick, events: &mut Vec<AgentEvent>) {
        self.step(tick, events);
    }
}

// ── DeliveryAgentBuilder ──────────────────────────────────────────────────────

/// Configure a [`DeliveryAgent`], then call [`build`](Self::build).
///
/// The pilot defaults to a [`RoutePlanner`] with A* and the Manhattan
/// heuristic; the ping limit defaults to `SimConfig::default().ping_limit`.
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use gr_core::{AgentId, Cell};
/// use gr_agent::DeliveryAgent;
/// use gr_spatial::{GridGraph, Strategy};
/// use gr_traffic::PermanentBlocks;
///
/// let graph = Arc::new(GridGraph::open_grid(4, 4));
/// let agent = DeliveryAgent::builder("van-01", Cell::new(0, 0), Cell::new(3, 3))
///     .strategy(Strategy::Dijkstra)
///     .build(AgentId(0), graph, Arc::new(PermanentBlocks::new()))
///     .unwrap();
/// assert_eq!(agent.metrics().planned_path_length, 6);
/// ```
pub struct DeliveryAgentBuilder {
    name:       String,
    start:      Cell,
    goal:       Cell,
    pilot:      Option<Box<dyn Pilot>>,
    ping_limit: u32,
}

impl DeliveryAgentBuilder {
    pub fn new(name: impl Into<String>, start: Cell, goal: Cell) -> Self {
        Self {
            name: name.into(),
            start,
            goal,
            pilot: None,
            ping_limit: SimConfig::default().ping_limit,
        }
    }

    /// Use a [`RoutePlanner`] with `strategy`.
    pub fn strategy(mut self, strategy: Strategy) -> Self {
        self.pilot = Some(Box::new(RoutePlanner::new(strategy)));
        self
    }

    pub fn pilot(mut self, pilot: impl Pilot + 'static) -> Self {
        self.pilot = Some(Box::new(pilot));
        self
    }

    pub fn boxed_pilot(mut self, pilot: Box<dyn Pilot>) -> Self {
        self.pilot = Some(pilot);
        self
    }

    pub fn ping_limit(mut self, limit: u32) -> Self {
        self.ping_limit = limit;
        self
    }

    /// Resolve start and goal on `graph` and make the first plan against
    /// an empty traffic snapshot.
    ///
    /// # Errors
    ///
    /// [`AgentError::NotRoutable`] if the start or goal cell is not a road
    /// node of `graph`.
    pub fn build(
        self,
        id: AgentId,
        graph: Arc<GridGraph>,
        blocks: Arc<PermanentBlocks>,
    ) -> AgentResult<DeliveryAgent> {
        let resolve = |cell: Cell| {
            graph
                .node_at(cell)
                .ok_or_else(|| AgentError::NotRoutable { agent: self.name.clone(), cell })
        };
        let position = resolve(self.start)?;
        let goal = resolve(self.goal)?;
        let pilot = self
            .pilot
            .unwrap_or_else(|| Box::new(RoutePlanner::new(Strategy::default())) as Box<dyn Pilot>);

        let mut agent = DeliveryAgent {
            id,
            name: self.name,
            graph,
            blocks,
            traffic: Arc::new(TrafficSnapshot::default()),
            position,
            goal,
            pilot,
            history: vec![position],
            detector: LoopDetector::new(self.ping_limit),
            status: AgentStatus::Running,
            metrics: AgentMetrics::default(),
        };
        let snapshot = Arc::clone(&agent.traffic);
        agent.on_traffic_update(&snapshot);
        debug!(
            agent = %agent.name,
            pilot = %agent.pilot.label(),
            planned = agent.metrics.planned_path_length,
            "agent ready"
        );
        Ok(agent)
    }
}
