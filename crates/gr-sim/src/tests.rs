//! Integration tests for gr-sim.

use gr_agent::{AgentEvent, AgentStatus, DeliveryAgent, DeliveryAgentBuilder, IncapableReason};
use gr_core::{AgentId, Cell, CoreError, SimConfig, Tick};
use gr_spatial::GridGraph;
use gr_traffic::{TickReport, TrafficConfig};

use crate::{NoopObserver, Sim, SimBuilder, SimError, SimObserver, SimOutcome, SimSummary};

// ── Helpers ───────────────────────────────────────────────────────────────────

fn config(max_ticks: u64) -> SimConfig {
    SimConfig { max_ticks, ..SimConfig::default() }
}

/// Traffic that never spawns anything on its own.
fn quiet(graph: &GridGraph) -> TrafficConfig {
    TrafficConfig { spawn_probability: 0.0, ..TrafficConfig::for_grid(graph.rows(), graph.cols()) }
}

fn agent(name: &str, start: (i32, i32), goal: (i32, i32)) -> DeliveryAgentBuilder {
    DeliveryAgent::builder(name, Cell::from(start), Cell::from(goal))
}

fn quiet_sim(graph: GridGraph, max_ticks: u64, agents: Vec<DeliveryAgentBuilder>) -> Sim {
    let traffic = quiet(&graph);
    SimBuilder::new(config(max_ticks), graph)
        .traffic(traffic)
        .agents(agents)
        .build()
        .unwrap()
}

fn cells(sim: &Sim, id: AgentId) -> Vec<Cell> {
    let agent = sim.agent(id).unwrap();
    agent.history().iter().map(|&n| sim.graph().cell(n)).collect()
}

#[derive(Default)]
struct Recorder {
    starts: Vec<Tick>,
    ends:   Vec<Tick>,
    events: Vec<AgentEvent>,
    done:   Option<SimSummary>,
}

impl SimObserver for Recorder {
    fn on_tick_start(&mut self, tick: Tick) {
        self.starts.push(tick);
    }
    fn on_agent_event(&mut self, event: &AgentEvent) {
        self.events.push(event.clone());
    }
    fn on_tick_end(&mut self, report: &TickReport<AgentEvent>) {
        self.ends.push(report.tick);
    }
    fn on_sim_end(&mut self, summary: &SimSummary, agents: &[DeliveryAgent]) {
        assert_eq!(agents.len(), summary.finished + summary.incapable + summary.running);
        assert!(self.done.is_none(), "on_sim_end called twice");
        self.done = Some(summary.clone());
    }
}

// ── SimBuilder validation ─────────────────────────────────────────────────────

#[cfg(test)]
mod builder_tests {
    use super::*;

    #[test]
    fn registers_agents_in_order() {
        let sim = quiet_sim(
            GridGraph::open_grid(4, 4),
            10,
            vec![agent("a", (0, 0), (3, 3)), agent("b", (3, 3), (0, 0))],
        );
        assert_eq!(sim.agents().len(), 2);
        assert_eq!(sim.agent(AgentId(1)).unwrap().name(), "b");
        assert_eq!(sim.tick(), Tick::ZERO);
        assert!(sim.outcome().is_none());
    }

    #[test]
    fn non_road_start_is_an_agent_error() {
        let graph = GridGraph::from_ascii(&["#.."]);
        let result = SimBuilder::new(config(10), graph)
            .agent(agent("a", (0, 0), (0, 2)))
            .build();
        assert!(matches!(result, Err(SimError::Agent(_))));
    }

    #[test]
    fn zero_stuck_limit_is_rejected() {
        let cfg = SimConfig { stuck_limit: 0, ..SimConfig::default() };
        let result = SimBuilder::new(cfg, GridGraph::open_grid(2, 2)).build();
        assert!(matches!(result, Err(SimError::Config(CoreError::Config(_)))));
    }

    #[test]
    fn zero_ping_limit_is_rejected() {
        let cfg = SimConfig { ping_limit: 0, ..SimConfig::default() };
        let result = SimBuilder::new(cfg, GridGraph::open_grid(2, 2)).build();
        assert!(matches!(result, Err(SimError::Config(CoreError::Config(_)))));
    }

    #[test]
    fn bad_traffic_config_is_a_traffic_error() {
        let traffic = TrafficConfig { spawn_probability: 2.0, ..TrafficConfig::for_grid(2, 2) };
        let result = SimBuilder::new(config(10), GridGraph::open_grid(2, 2))
            .traffic(traffic)
            .build();
        assert!(matches!(result, Err(SimError::Traffic(_))));
    }
}

// ── Halting conditions ────────────────────────────────────────────────────────

#[cfg(test)]
mod halting {
    use super::*;

    #[test]
    fn single_agent_finishes_on_open_grid() {
        let mut sim = quiet_sim(GridGraph::open_grid(4, 4), 100, vec![agent("a", (0, 0), (3, 3))]);
        let summary = sim.run(&mut NoopObserver);
        assert_eq!(summary.outcome, SimOutcome::AllFinished);
        assert_eq!(summary.ticks_run, 6);
        assert_eq!((summary.finished, summary.incapable, summary.running), (1, 0, 0));
        assert_eq!(sim.agents()[0].status(), AgentStatus::Finished { tick: Tick(6) });
    }

    #[test]
    fn tick_limit_leaves_agents_running() {
        let mut sim = quiet_sim(GridGraph::open_grid(4, 4), 3, vec![agent("a", (0, 0), (3, 3))]);
        let summary = sim.run(&mut NoopObserver);
        assert_eq!(summary.outcome, SimOutcome::TickLimit);
        assert_eq!(summary.ticks_run, 3);
        assert_eq!(summary.running, 1);
        assert_eq!(sim.agents()[0].metrics().steps, 3);
    }

    #[test]
    fn global_stall_marks_everyone_incapable() {
        // Three isolated road cells: nobody can ever move.
        let graph = GridGraph::from_ascii(&[".#.#."]);
        let mut sim = quiet_sim(
            graph,
            100,
            vec![
                agent("a", (0, 0), (0, 2)),
                agent("b", (0, 2), (0, 4)),
                agent("c", (0, 4), (0, 0)),
            ],
        );
        let summary = sim.run(&mut NoopObserver);
        assert_eq!(summary.outcome, SimOutcome::Stalled);
        assert_eq!(summary.ticks_run, 10);
        assert_eq!(summary.incapable, 3);
        for a in sim.agents() {
            assert_eq!(
                a.status(),
                AgentStatus::Incapable { reason: IncapableReason::Stalled, tick: Tick(10) }
            );
        }
    }

    #[test]
    fn stall_limit_is_configurable() {
        let graph = GridGraph::from_ascii(&[".#."]);
        let traffic = quiet(&graph);
        let mut sim = SimBuilder::new(SimConfig { stuck_limit: 3, ..SimConfig::default() }, graph)
            .traffic(traffic)
            .agent(agent("a", (0, 0), (0, 2)))
            .build()
            .unwrap();
        assert_eq!(sim.run(&mut NoopObserver).ticks_run, 3);
    }

    #[test]
    fn finished_agent_does_not_count_as_stalled() {
        // "a" arrives after 1 tick; "b" is boxed in and keeps holding.
        let graph = GridGraph::from_ascii(&["..#."]);
        let mut sim = quiet_sim(
            graph,
            100,
            vec![agent("a", (0, 0), (0, 1)), agent("b", (0, 3), (0, 0))],
        );
        let summary = sim.run(&mut NoopObserver);
        assert_eq!(summary.outcome, SimOutcome::Stalled);
        // Tick 1 moves "a"; ticks 2..=11 change nothing.
        assert_eq!(summary.ticks_run, 11);
        assert_eq!((summary.finished, summary.incapable), (1, 1));
        assert!(sim.agents()[0].status().is_finished());
    }

    #[test]
    fn empty_run_halts_immediately() {
        let mut sim = quiet_sim(GridGraph::open_grid(2, 2), 100, Vec::new());
        let summary = sim.run(&mut NoopObserver);
        assert_eq!(summary.outcome, SimOutcome::AllFinished);
        assert_eq!(summary.ticks_run, 1);
    }

    #[test]
    fn halted_run_does_not_tick_again() {
        let mut sim = quiet_sim(GridGraph::open_grid(4, 4), 100, vec![agent("a", (0, 0), (3, 3))]);
        sim.run(&mut NoopObserver);
        let again = sim.run(&mut NoopObserver);
        assert_eq!(again.ticks_run, 6);
        assert_eq!(sim.run_ticks(5, &mut NoopObserver), Some(SimOutcome::AllFinished));
        assert_eq!(sim.tick(), Tick(6));
    }

    #[test]
    fn run_ticks_steps_incrementally() {
        let mut sim = quiet_sim(GridGraph::open_grid(4, 4), 100, vec![agent("a", (0, 0), (3, 3))]);
        assert_eq!(sim.run_ticks(2, &mut NoopObserver), None);
        assert_eq!(sim.tick(), Tick(2));
        assert_eq!(sim.agents()[0].metrics().steps, 2);
        let summary = sim.run(&mut NoopObserver);
        assert_eq!(summary.ticks_run, 6);
    }
}

// ── Traffic interaction ───────────────────────────────────────────────────────

#[cfg(test)]
mod traffic {
    use super::*;

    #[test]
    fn scripted_obstruction_forces_a_detour() {
        let mut sim = quiet_sim(GridGraph::open_grid(3, 3), 100, vec![agent("a", (0, 0), (0, 2))]);
        sim.controller_mut().insert_obstruction(Cell::new(0, 1), 4);
        let summary = sim.run(&mut NoopObserver);

        assert_eq!(summary.outcome, SimOutcome::AllFinished);
        assert_eq!(summary.ticks_run, 4);
        assert_eq!(
            cells(&sim, AgentId(0)),
            vec![
                Cell::new(0, 0),
                Cell::new(1, 0),
                Cell::new(1, 1),
                Cell::new(1, 2),
                Cell::new(0, 2),
            ]
        );
        assert!(sim.agents()[0].metrics().replan_count() >= 1);
    }

    #[test]
    fn permanent_blocks_are_routed_around() {
        let graph = GridGraph::open_grid(3, 3);
        let traffic = quiet(&graph);
        let mut sim = SimBuilder::new(config(100), graph)
            .traffic(traffic)
            .permanent_blocks([Cell::new(0, 1), Cell::new(1, 1)])
            .agent(agent("a", (0, 0), (0, 2)))
            .build()
            .unwrap();
        let summary = sim.run(&mut NoopObserver);
        assert_eq!(summary.outcome, SimOutcome::AllFinished);
        let path = cells(&sim, AgentId(0));
        assert_eq!(path.len(), 7);
        assert!(!path.contains(&Cell::new(0, 1)));
        assert!(!path.contains(&Cell::new(1, 1)));
    }

    #[test]
    fn same_seed_same_run() {
        let run = || {
            let cfg = SimConfig { seed: 7, ..SimConfig::default() };
            let mut sim = SimBuilder::new(cfg, GridGraph::open_grid(6, 6))
                .agent(agent("a", (0, 0), (5, 5)))
                .agent(agent("b", (5, 0), (0, 5)))
                .build()
                .unwrap();
            let summary = sim.run(&mut NoopObserver);
            (summary, cells(&sim, AgentId(0)), cells(&sim, AgentId(1)))
        };
        assert_eq!(run(), run());
    }
}

// ── Observer hooks ────────────────────────────────────────────────────────────

#[cfg(test)]
mod observer {
    use super::*;

    #[test]
    fn hooks_fire_once_per_tick() {
        let mut sim = quiet_sim(GridGraph::open_grid(4, 4), 100, vec![agent("a", (0, 0), (3, 3))]);
        let mut rec = Recorder::default();
        let summary = sim.run(&mut rec);

        let expected: Vec<Tick> = (1..=6).map(Tick).collect();
        assert_eq!(rec.starts, expected);
        assert_eq!(rec.ends, expected);
        assert_eq!(rec.done, Some(summary));

        let moves = rec.events.iter().filter(|e| matches!(e, AgentEvent::Moved { .. })).count();
        assert_eq!(moves, 6);
        assert!(matches!(rec.events.last(), Some(AgentEvent::Arrived { tick: Tick(6), .. })));
    }

    #[test]
    fn stall_events_reach_the_observer() {
        let graph = GridGraph::from_ascii(&[".#."]);
        let mut sim = quiet_sim(graph, 100, vec![agent("a", (0, 0), (0, 2))]);
        let mut rec = Recorder::default();
        sim.run(&mut rec);

        let last = rec.events.last().unwrap();
        assert!(matches!(
            last,
            AgentEvent::Incapacitated { reason: IncapableReason::Stalled, tick: Tick(10), .. }
        ));
    }
}
