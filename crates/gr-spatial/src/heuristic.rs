//! A* heuristics.

use std::fmt;
use std::str::FromStr;

use gr_core::NodeId;

use crate::{GridGraph, SpatialError};

/// Distance estimate from a node to the goal.
///
/// `Manhattan` and `Euclidean` never overestimate on a 4-connected grid with
/// step cost ≥ 1.  `ObstacleCount` counts non-road cells in the bounding
/// rectangle of node and goal; it is a rough "how cluttered is the way there"
/// signal and can overestimate, so A* with it is not guaranteed optimal.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Heuristic {
    #[default]
    Manhattan,
    Euclidean,
    ObstacleCount,
}

impl Heuristic {
    pub const ALL: [Heuristic; 3] = [Heuristic::Manhattan, Heuristic::Euclidean, Heuristic::ObstacleCount];

    #[inline]
    pub fn estimate(self, graph: &GridGraph, from: NodeId, goal: NodeId) -> f64 {
        let (a, b) = (graph.cell(from), graph.cell(goal));
        match self {
            Heuristic::Manhattan     => f64::from(a.manhattan(b)),
            Heuristic::Euclidean     => a.euclidean(b),
            Heuristic::ObstacleCount => f64::from(graph.obstacles_between(a, b)),
        }
    }

    /// `true` if A* with this heuristic returns minimum-cost routes.
    pub fn is_admissible(self) -> bool {
        !matches!(self, Heuristic::ObstacleCount)
    }

    pub fn name(self) -> &'static str {
        match self {
            Heuristic::Manhattan     => "manhattan",
            Heuristic::Euclidean     => "euclidean",
            Heuristic::ObstacleCount => "obstacle-count",
        }
    }
}

impl fmt::Display for Heuristic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Heuristic {
    type Err = SpatialError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "manhattan"                                    => Ok(Heuristic::Manhattan),
            "euclidean"                                    => Ok(Heuristic::Euclidean),
            "obstacle-count" | "obstacle_count" | "obstacle" => Ok(Heuristic::ObstacleCount),
            other => Err(SpatialError::UnknownName(other.to_owned())),
        }
    }
}
