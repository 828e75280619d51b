//! Unit tests for gr-agent.

#[cfg(test)]
mod helpers {
    use std::sync::Arc;

    use gr_core::{AgentId, Cell, CellMap, Tick};
    use gr_spatial::GridGraph;
    use gr_traffic::{PermanentBlocks, TrafficSnapshot};

    use crate::{AgentEvent, DeliveryAgent, DeliveryAgentBuilder};

    pub fn blocks(cells: &[(i32, i32)]) -> Arc<PermanentBlocks> {
        Arc::new(cells.iter().map(|&c| Cell::from(c)).collect())
    }

    pub fn build(b: DeliveryAgentBuilder, graph: GridGraph, blocked: &[(i32, i32)]) -> DeliveryAgent {
        b.build(AgentId(0), Arc::new(graph), blocks(blocked)).unwrap()
    }

    pub fn snapshot(tick: u64, obstructed: &[(i32, i32)]) -> Arc<TrafficSnapshot> {
        let mut map = CellMap::default();
        for &c in obstructed {
            map.insert(Cell::from(c), 4);
        }
        Arc::new(TrafficSnapshot::new(Tick(tick), 3, map))
    }

    /// Step `agent` for ticks `1..=n`, collecting every event.
    pub fn run(agent: &mut DeliveryAgent, n: u64) -> Vec<AgentEvent> {
        let mut events = Vec::new();
        for t in 1..=n {
            agent.step(Tick(t), &mut events);
        }
        events
    }
}

// ── Loop detection ────────────────────────────────────────────────────────────

#[cfg(test)]
mod detector {
    use gr_core::NodeId;
    use crate::LoopDetector;

    const A: NodeId = NodeId(0);
    const B: NodeId = NodeId(1);
    const C: NodeId = NodeId(2);

    #[test]
    fn trips_exactly_at_limit() {
        let mut d = LoopDetector::new(2);
        assert!(!d.observe(A));
        assert!(!d.observe(B));
        assert!(!d.observe(A));
        assert_eq!(d.pings(), 1);
        assert!(d.observe(B));
    }

    #[test]
    fn default_limit_needs_six_positions() {
        let mut d = LoopDetector::new(4);
        let trips: Vec<bool> = [A, B, A, B, A, B].into_iter().map(|p| d.observe(p)).collect();
        assert_eq!(trips, vec![false, false, false, false, false, true]);
    }

    #[test]
    fn broken_pattern_resets() {
        let mut d = LoopDetector::new(3);
        for p in [A, B, A, B] {
            d.observe(p);
        }
        assert_eq!(d.pings(), 2);
        assert!(!d.observe(C));
        assert_eq!(d.pings(), 0);
    }

    #[test]
    fn holding_still_is_not_oscillation() {
        let mut d = LoopDetector::new(1);
        for _ in 0..10 {
            assert!(!d.observe(A));
        }
    }
}

// ── Metrics ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod metrics {
    use std::time::Duration;
    use crate::AgentMetrics;

    #[test]
    fn first_plan_recorded_once() {
        let mut m = AgentMetrics::default();
        assert_eq!(m.replan_count(), 0);
        m.record_plan(Duration::from_millis(3), 6);
        m.record_plan(Duration::from_millis(2), 4);
        m.record_plan(Duration::from_millis(1), 2);
        assert_eq!(m.plans, 3);
        assert_eq!(m.replan_count(), 2);
        assert_eq!(m.initial_plan_time, Some(Duration::from_millis(3)));
        assert_eq!(m.total_plan_time, Duration::from_millis(6));
        assert_eq!(m.planned_path_length, 6);
    }
}

// ── Route planner agents ──────────────────────────────────────────────────────

#[cfg(test)]
mod planner {
    use std::sync::Arc;

    use gr_core::{AgentId, Cell, Tick};
    use gr_spatial::{GridGraph, Heuristic, Strategy};
    use gr_traffic::TrafficSubscriber;

    use crate::{AgentError, AgentEvent, AgentStatus, DeliveryAgent, HoldReason};
    use super::helpers::{blocks, build, run, snapshot};

    fn van(start: (i32, i32), goal: (i32, i32)) -> crate::DeliveryAgentBuilder {
        DeliveryAgent::builder("van", Cell::from(start), Cell::from(goal))
    }

    #[test]
    fn reaches_goal_on_open_grid() {
        let mut agent = build(van((0, 0), (3, 3)), GridGraph::open_grid(4, 4), &[]);
        assert_eq!(agent.metrics().plans, 1);
        assert_eq!(agent.metrics().planned_path_length, 6);
        assert_eq!(agent.pilot_label(), "astar(manhattan)");

        let events = run(&mut agent, 10);
        assert_eq!(agent.status(), AgentStatus::Finished { tick: Tick(6) });
        assert_eq!(agent.history().len(), 7);
        assert_eq!(agent.metrics().steps, 6);
        assert_eq!(agent.position_cell(), Cell::new(3, 3));
        let moves = events.iter().filter(|e| matches!(e, AgentEvent::Moved { .. })).count();
        assert_eq!(moves, 6);
        assert!(matches!(events.last(), Some(AgentEvent::Arrived { tick: Tick(6), .. })));
    }

    #[test]
    fn history_is_contiguous() {
        let g = GridGraph::open_grid(4, 4);
        let mut agent = build(van((3, 0), (0, 3)), GridGraph::open_grid(4, 4), &[]);
        run(&mut agent, 10);
        let h = agent.history();
        assert_eq!(g.cell(h[0]), Cell::new(3, 0));
        for w in h.windows(2) {
            assert!(g.cell(w[0]).is_adjacent(g.cell(w[1])));
        }
    }

    #[test]
    fn start_equals_goal_arrives_immediately() {
        let mut agent = build(van((1, 1), (1, 1)), GridGraph::open_grid(3, 3), &[]);
        let events = run(&mut agent, 3);
        assert_eq!(events.len(), 1);
        assert!(matches!(events[0], AgentEvent::Arrived { tick: Tick(1), .. }));
        assert_eq!(agent.history().len(), 1);
    }

    #[test]
    fn unroutable_start_is_rejected() {
        let g = GridGraph::from_ascii(&["#.."]);
        let r = van((0, 0), (0, 2)).build(AgentId(0), Arc::new(g), blocks(&[]));
        assert!(matches!(r, Err(AgentError::NotRoutable { cell, .. }) if cell == Cell::new(0, 0)));
    }

    #[test]
    fn avoids_permanent_blocks() {
        let g = GridGraph::open_grid(4, 4);
        let strategies = [Strategy::Dijkstra, Strategy::AStar(Heuristic::Euclidean)];
        for s in strategies {
            let mut agent = build(van((0, 0), (3, 3)).strategy(s), GridGraph::open_grid(4, 4), &[(1, 1), (2, 2)]);
            run(&mut agent, 10);
            assert!(agent.status().is_finished(), "{s}");
            assert_eq!(agent.metrics().steps, 6, "{s}");
            for &n in agent.history() {
                let c = g.cell(n);
                assert!(c != Cell::new(1, 1) && c != Cell::new(2, 2), "{s} crossed {c}");
            }
        }
    }

    #[test]
    fn holds_rather_than_entering_a_block() {
        let mut agent = build(van((0, 0), (0, 2)), GridGraph::open_grid(1, 3), &[(0, 1)]);
        let events = run(&mut agent, 3);
        assert!(events.iter().all(|e| matches!(
            e,
            AgentEvent::Held { reason: HoldReason::Blocked(c), .. } if *c == Cell::new(0, 1)
        )));
        assert_eq!(agent.position_cell(), Cell::new(0, 0));
        assert_eq!(agent.status(), AgentStatus::Running);
    }

    #[test]
    fn no_route_holds_and_keeps_trying() {
        let mut agent = build(van((0, 0), (0, 2)), GridGraph::from_ascii(&[".#."]), &[]);
        assert_eq!(agent.metrics().planned_path_length, 0);
        let events = run(&mut agent, 3);
        assert_eq!(events.len(), 3);
        assert!(events.iter().all(|e| matches!(e, AgentEvent::Held { reason: HoldReason::NoRoute, .. })));
        assert_eq!(agent.metrics().plans, 4);
    }

    #[test]
    fn traffic_update_replans_around_obstruction() {
        let mut agent = build(van((0, 0), (0, 2)), GridGraph::open_grid(3, 3), &[]);
        agent.on_traffic_update(&snapshot(1, &[(0, 1)]));
        assert_eq!(agent.metrics().plans, 2);
        assert_eq!(agent.metrics().replan_count(), 1);

        let mut events = Vec::new();
        agent.advance(Tick(1), &mut events);
        assert_eq!(agent.position_cell(), Cell::new(1, 0));
        // Planned length is from the first plan only.
        assert_eq!(agent.metrics().planned_path_length, 2);
    }

    #[test]
    fn terminal_agents_ignore_traffic() {
        let mut agent = build(van((0, 0), (0, 1)), GridGraph::open_grid(1, 2), &[]);
        run(&mut agent, 1);
        assert!(agent.status().is_finished());
        let plans = agent.metrics().plans;
        agent.on_traffic_update(&snapshot(2, &[]));
        assert_eq!(agent.metrics().plans, plans);
        assert_eq!(agent.traffic().tick, Tick(2));
        assert!(run(&mut agent, 3).is_empty());
    }

    #[test]
    fn mark_incapable_only_once() {
        let mut agent = build(van((0, 0), (0, 2)), GridGraph::open_grid(1, 3), &[]);
        let ev = agent.mark_incapable(crate::IncapableReason::Stalled, Tick(4));
        assert!(matches!(ev, Some(AgentEvent::Incapacitated { tick: Tick(4), .. })));
        assert!(agent.mark_incapable(crate::IncapableReason::Stalled, Tick(5)).is_none());
        assert_eq!(agent.status().finish_tick(), Some(Tick(4)));
        assert!(run(&mut agent, 2).is_empty());
    }
}

// ── Oracle pilots ─────────────────────────────────────────────────────────────

#[cfg(test)]
mod oracle {
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    use gr_core::{AgentId, Cell, NodeId, Tick};
    use gr_spatial::{GridGraph, Strategy};

    use crate::{
        parse_move, AgentEvent, AgentStatus, DeliveryAgent, HoldReason, IncapableReason, Oracle,
        OracleError, OraclePilot, OracleState, PromptOracle, TimeoutOracle,
    };
    use super::helpers::{build, run};

    fn answer(text: &'static str) -> impl Fn(&OracleState) -> Result<String, OracleError> + Send + Sync {
        move |_: &OracleState| Ok(text.to_owned())
    }

    fn line_reference(g: &GridGraph, cols: i32) -> Vec<NodeId> {
        (0..cols).map(|c| g.node_at(Cell::new(0, c)).unwrap()).collect()
    }

    fn oracle_van(
        oracle: impl Oracle + 'static,
        reference: Vec<NodeId>,
        goal: (i32, i32),
    ) -> crate::DeliveryAgentBuilder {
        DeliveryAgent::builder("oracle-van", Cell::new(0, 0), Cell::from(goal))
            .pilot(OraclePilot::with_reference(oracle, reference))
    }

    #[test]
    fn parse_first_two_integers() {
        assert_eq!(parse_move("(14,3)"), Some(Cell::new(14, 3)));
        assert_eq!(parse_move("14_3"), Some(Cell::new(14, 3)));
        assert_eq!(parse_move("row 14 col 3"), Some(Cell::new(14, 3)));
        assert_eq!(parse_move(r#"{"row":14,"col":3}"#), Some(Cell::new(14, 3)));
        assert_eq!(parse_move("go to (2, 5) then (9, 9)"), Some(Cell::new(2, 5)));
        assert_eq!(parse_move("-2, 5"), Some(Cell::new(2, 5)));
        assert_eq!(parse_move("move to 7"), None);
        assert_eq!(parse_move(""), None);
        assert_eq!(parse_move("99999999999, 1"), None);
    }

    #[test]
    fn valid_proposal_is_followed() {
        let g = GridGraph::open_grid(2, 3);
        let reference = line_reference(&g, 3);
        let mut agent = build(oracle_van(answer("(1, 0)"), reference, (0, 2)), g, &[]);
        run(&mut agent, 1);
        assert_eq!(agent.position_cell(), Cell::new(1, 0));
    }

    #[test]
    fn blocked_proposal_holds_and_is_reported_next_time() {
        let seen: Arc<Mutex<Vec<OracleState>>> = Arc::default();
        let log = Arc::clone(&seen);
        let oracle = move |s: &OracleState| -> Result<String, OracleError> {
            log.lock().unwrap().push(s.clone());
            Ok("0,1".to_owned())
        };
        let g = GridGraph::open_grid(2, 3);
        let reference = line_reference(&g, 3);
        let mut agent = build(oracle_van(oracle, reference, (0, 2)), g, &[(0, 1)]);

        let events = run(&mut agent, 2);
        assert!(matches!(events[0], AgentEvent::Held { reason: HoldReason::Blocked(c), .. } if c == Cell::new(0, 1)));
        assert_eq!(agent.position_cell(), Cell::new(0, 0));

        let states = seen.lock().unwrap();
        assert_eq!(states[0].last_block, None);
        assert_eq!(states[1].last_block, Some(Cell::new(0, 1)));
        assert_eq!(states[0].free_neighbors, vec![Cell::new(1, 0)]);
        assert_eq!(states[0].permanent_blocks, vec![Cell::new(0, 1)]);
    }

    /// Position after one tick on a 2x3 grid, reference route along row 0.
    fn position_after_one_tick(oracle: impl Oracle + 'static) -> Cell {
        let g = GridGraph::open_grid(2, 3);
        let reference = line_reference(&g, 3);
        let mut agent = build(oracle_van(oracle, reference, (0, 2)), g, &[]);
        run(&mut agent, 1);
        agent.position_cell()
    }

    #[test]
    fn unusable_answers_fall_back_to_reference() {
        let fallback = Cell::new(0, 1);
        assert_eq!(position_after_one_tick(answer("no idea")), fallback);
        // Not a neighbor of (0, 0).
        assert_eq!(position_after_one_tick(answer("(1, 2)")), fallback);
        // Off the grid entirely.
        assert_eq!(position_after_one_tick(answer("(40, 40)")), fallback);
        let failing = |_: &OracleState| -> Result<String, OracleError> { Err(OracleError::Unavailable) };
        assert_eq!(position_after_one_tick(failing), fallback);
    }

    #[test]
    fn obstructed_proposal_falls_back() {
        use gr_traffic::TrafficSubscriber;

        let g = GridGraph::open_grid(2, 3);
        let reference = line_reference(&g, 3);
        let mut agent = build(oracle_van(answer("1 0"), reference, (0, 2)), g, &[]);
        agent.on_traffic_update(&super::helpers::snapshot(1, &[(1, 0)]));
        run(&mut agent, 1);
        assert_eq!(agent.position_cell(), Cell::new(0, 1));
    }

    #[test]
    fn fallback_skips_blocked_reference_nodes() {
        let g = GridGraph::open_grid(1, 4);
        let reference = line_reference(&g, 4);
        let pilot = OraclePilot::with_reference(answer("?"), reference);
        let b = DeliveryAgent::builder("v", Cell::new(0, 0), Cell::new(0, 3)).pilot(pilot);
        let mut agent = build(b, g, &[(0, 1)]);
        run(&mut agent, 1);
        // Rejoins the reference route past the blocked cell.
        assert_eq!(agent.position_cell(), Cell::new(0, 2));
        run(&mut agent, 1);
        assert_eq!(agent.position_cell(), Cell::new(0, 3));
        assert!(agent.status().is_finished());
    }

    #[test]
    fn exhausted_reference_holds() {
        let g = GridGraph::open_grid(1, 3);
        let start = g.node_at(Cell::new(0, 0)).unwrap();
        let mut agent = build(oracle_van(answer("?"), vec![start], (0, 2)), g, &[]);
        let events = run(&mut agent, 2);
        assert!(events.iter().all(|e| matches!(e, AgentEvent::Held { reason: HoldReason::RouteExhausted, .. })));
    }

    #[test]
    fn planned_reference_route() {
        let pilot = OraclePilot::new(answer("?"), Strategy::Dijkstra);
        let b = DeliveryAgent::builder("v", Cell::new(0, 0), Cell::new(3, 3)).pilot(pilot);
        let mut agent = build(b, GridGraph::open_grid(4, 4), &[]);
        assert_eq!(agent.metrics().planned_path_length, 6);
        assert_eq!(agent.pilot_label(), "oracle[dijkstra]");
        run(&mut agent, 6);
        assert_eq!(agent.status(), AgentStatus::Finished { tick: Tick(6) });
        assert_eq!(agent.metrics().plans, 1);
    }

    #[test]
    fn ping_pong_oracle_is_declared_incapable() {
        let oracle = |s: &OracleState| -> Result<String, OracleError> {
            Ok(if s.position == Cell::new(0, 0) { "0,1" } else { "0,0" }.to_owned())
        };
        let g = GridGraph::open_grid(1, 4);
        let reference = line_reference(&g, 4);
        let mut agent = build(oracle_van(oracle, reference, (0, 3)).ping_limit(4), g, &[]);

        run(&mut agent, 5);
        assert_eq!(agent.status(), AgentStatus::Running);
        let mut events = Vec::new();
        agent.step(Tick(6), &mut events);
        assert_eq!(
            agent.status(),
            AgentStatus::Incapable { reason: IncapableReason::Oscillation, tick: Tick(6) }
        );
        assert!(matches!(events.last(), Some(AgentEvent::Incapacitated { .. })));
    }

    /// Oracle that walks a fixed list of answers, repeating the last one.
    fn scripted(answers: &'static [&'static str]) -> impl Oracle + 'static {
        let calls = std::sync::atomic::AtomicUsize::new(0);
        move |_: &OracleState| -> Result<String, OracleError> {
            let i = calls.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
            Ok(answers[i.min(answers.len() - 1)].to_owned())
        }
    }

    #[test]
    fn arrival_after_a_bounce_finishes_instead_of_tripping() {
        // (0,1) (0,0) (0,1) is one ping; the goal step breaks the pattern.
        const ROUTE: &[&str] = &["0,1", "0,0", "0,1", "0,2"];
        let bouncer = |limit: u32| {
            let g = GridGraph::open_grid(1, 3);
            let reference = line_reference(&g, 3);
            build(oracle_van(scripted(ROUTE), reference, (0, 2)).ping_limit(limit), g, &[])
        };

        let mut agent = bouncer(2);
        run(&mut agent, 4);
        assert_eq!(agent.status(), AgentStatus::Finished { tick: Tick(4) });

        let mut agent = bouncer(1);
        run(&mut agent, 4);
        assert_eq!(
            agent.status(),
            AgentStatus::Incapable { reason: IncapableReason::Oscillation, tick: Tick(3) }
        );
    }

    #[test]
    fn timeout_oracle_enforces_deadline() {
        let slow = |_: &OracleState| -> Result<String, OracleError> {
            std::thread::sleep(Duration::from_secs(1));
            Ok("0,1".to_owned())
        };
        let state = OracleState {
            agent: AgentId(0),
            rows: 1,
            cols: 2,
            position: Cell::new(0, 0),
            goal: Cell::new(0, 1),
            free_neighbors: vec![Cell::new(0, 1)],
            permanent_blocks: vec![],
            obstructions: vec![],
            last_block: None,
        };
        let deadline = Duration::from_millis(50);
        assert_eq!(TimeoutOracle::new(slow, deadline).propose(&state), Err(OracleError::Timeout(deadline)));
        assert_eq!(TimeoutOracle::new(answer("0,1"), Duration::from_secs(5)).propose(&state), Ok("0,1".to_owned()));
    }

    #[test]
    fn hung_oracle_falls_back_after_deadline() {
        let hung = |_: &OracleState| -> Result<String, OracleError> {
            loop {
                std::thread::park();
            }
        };
        let g = GridGraph::open_grid(1, 3);
        let reference = line_reference(&g, 3);
        let pilot = OraclePilot::with_reference(hung, reference).deadline(Duration::from_millis(50));
        let b = DeliveryAgent::builder("v", Cell::new(0, 0), Cell::new(0, 2)).pilot(pilot);
        let mut agent = build(b, g, &[]);

        run(&mut agent, 2);
        assert_eq!(agent.position_cell(), Cell::new(0, 2));
        assert_eq!(agent.status(), AgentStatus::Finished { tick: Tick(2) });
    }

    #[test]
    fn pilot_deadline_defaults_and_overrides() {
        let pilot = OraclePilot::new(answer("?"), Strategy::Dijkstra);
        assert_eq!(pilot.oracle_deadline(), crate::DEFAULT_ORACLE_DEADLINE);
        let pilot = pilot.deadline(Duration::from_millis(5));
        assert_eq!(pilot.oracle_deadline(), Duration::from_millis(5));
    }

    #[test]
    fn prompt_mentions_neighbors_and_last_block() {
        let state = OracleState {
            agent: AgentId(2),
            rows: 16,
            cols: 16,
            position: Cell::new(14, 3),
            goal: Cell::new(2, 14),
            free_neighbors: vec![Cell::new(13, 3), Cell::new(14, 4)],
            permanent_blocks: vec![Cell::new(7, 3)],
            obstructions: vec![],
            last_block: Some(Cell::new(15, 3)),
        };
        let prompt = PromptOracle::<fn(&str) -> Result<String, OracleError>>::render(&state);
        assert!(prompt.contains("16x16"));
        assert!(prompt.contains("Current position: (14, 3)"));
        assert!(prompt.contains("Free adjacent cells: [(13, 3), (14, 4)]"));
        assert!(prompt.contains("cell (15, 3) is blocked"));
        assert!(!prompt.contains("traffic"));

        let echo = PromptOracle::new(|p: &str| -> Result<String, OracleError> { Ok(p.to_owned()) });
        assert_eq!(echo.propose(&state).unwrap(), prompt);
    }
}
