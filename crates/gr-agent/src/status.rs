//! Agent lifecycle states and per-tick events.

use std::fmt;

use gr_core::{AgentId, Cell, Tick};

/// Why an agent gave up.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum IncapableReason {
    /// A-B-A oscillation repeated up to the ping limit.
    Oscillation,
    /// No agent moved for the driver's stuck limit.
    Stalled,
}

impl fmt::Display for IncapableReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            IncapableReason::Oscillation => "oscillation",
            IncapableReason::Stalled     => "stalled",
        })
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Default)]
pub enum AgentStatus {
    #[default]
    Running,
    Finished { tick: Tick },
    Incapable { reason: IncapableReason, tick: Tick },
}

impl AgentStatus {
    /// `true` once the agent will never act again.
    pub fn is_terminal(self) -> bool {
        !matches!(self, AgentStatus::Running)
    }

    pub fn is_finished(self) -> bool {
        matches!(self, AgentStatus::Finished { .. })
    }

    pub fn is_incapable(self) -> bool {
        matches!(self, AgentStatus::Incapable { .. })
    }

    /// Tick at which the agent became terminal.
    pub fn finish_tick(self) -> Option<Tick> {
        match self {
            AgentStatus::Running                          => None,
            AgentStatus::Finished { tick }
            | AgentStatus::Incapable { tick, .. }         => Some(tick),
        }
    }
}

impl fmt::Display for AgentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AgentStatus::Running                    => f.write_str("running"),
            AgentStatus::Finished { .. }            => f.write_str("finished"),
            AgentStatus::Incapable { reason, .. }   => write!(f, "incapable({reason})"),
        }
    }
}

/// Why an agent stayed in place this tick.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum HoldReason {
    /// The planner found no path to the goal.
    NoRoute,
    /// The next step would enter a permanently blocked cell.
    Blocked(Cell),
    /// The fallback reference route has no usable node left.
    RouteExhausted,
}

/// What an agent did during one advance.
#[derive(Clone, Debug, PartialEq)]
pub enum AgentEvent {
    Moved { agent: AgentId, tick: Tick, from: Cell, to: Cell },
    Held { agent: AgentId, tick: Tick, at: Cell, reason: HoldReason },
    Arrived { agent: AgentId, tick: Tick, at: Cell },
    Incapacitated { agent: AgentId, tick: Tick, at: Cell, reason: IncapableReason },
}

impl AgentEvent {
    pub fn agent(&self) -> AgentId {
        match *self {
            AgentEvent::Moved { agent, .. }
            | AgentEvent::Held { agent, .. }
            | AgentEvent::Arrived { agent, .. }
            | AgentEvent::Incapacitated { agent, .. } => agent,
        }
    }

    pub fn tick(&self) -> Tick {
        match *self {
            AgentEvent::Moved { tick, .. }
            | AgentEvent::Held { tick, .. }
            | AgentEvent::Arrived { tick, .. }
            | AgentEvent::Incapacitated { tick, .. } => tick,
        }
    }

    /// The agent's cell after the event.
    pub fn position(&self) -> Cell {
        match *self {
            AgentEvent::Moved { to, .. } => to,
            AgentEvent::Held { at, .. }
            | AgentEvent::Arrived { at, .. }
            | AgentEvent::Incapacitated { at, .. } => at,
        }
    }
}
