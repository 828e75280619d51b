//! Traffic controller configuration.

/// Parameters of the obstruction process.
///
/// `rows × cols` is the sampling area for new obstructions; it normally
/// matches the loaded graph's bounds.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TrafficConfig {
    pub rows: u32,
    pub cols: u32,

    /// Number of broadcasts a newly spawned obstruction is visible for.
    pub ttl: u32,

    /// Target number of simultaneous obstructions.
    pub max_alerts: usize,

    /// Surcharge added to the cost of entering an obstructed cell.
    pub penalty: u64,

    /// Chance per tick that the generation phase runs at all.
    pub spawn_probability: f64,
}

impl TrafficConfig {
    /// Default parameters over a `rows × cols` area.
    pub fn for_grid(rows: u32, cols: u32) -> Self {
        Self { rows, cols, ..Self::default() }
    }

    /// `max_alerts` capped at the number of cells, so sampling terminates.
    pub fn effective_target(&self) -> usize {
        let cells = self.rows as usize * self.cols as usize;
        self.max_alerts.min(cells)
    }
}

impl Default for TrafficConfig {
    fn default() -> Self {
        Self {
            rows:              0,
            cols:              0,
            ttl:               4,
            max_alerts:        2,
            penalty:           3,
            spawn_probability: 1.0,
        }
    }
}
