//! The traffic controller and its four-phase step.

use std::sync::Arc;

use tracing::{debug, trace};

use gr_core::{AgentId, Cell, CellMap, SimRng, Tick};

use crate::{TrafficConfig, TrafficError, TrafficResult, TrafficSnapshot};

// ── Subscriber trait ──────────────────────────────────────────────────────────

/// Something that reacts to traffic broadcasts and then acts once per tick.
///
/// `Send` so the broadcast phase can fan out over rayon's pool with the
/// `parallel` feature.
pub trait TrafficSubscriber: Send {
    /// Per-tick outcome reported from [`advance`](Self::advance).
    type Event;

    /// Receive the complete obstruction set.  Called on registration and
    /// once per step, before any subscriber advances.
    fn on_traffic_update(&mut self, snapshot: &Arc<TrafficSnapshot>);

    /// Act once for this tick.  Push whatever happened onto `events`.
    fn advance(&mut self, tick: Tick, events: &mut Vec<Self::Event>);
}

// ── TickReport ────────────────────────────────────────────────────────────────

/// What one call to [`TrafficController::step`] did.
#[derive(Debug, Clone)]
pub struct TickReport<E> {
    pub tick: Tick,
    /// Obstructions in the broadcast snapshot.
    pub obstructions: usize,
    /// Cells that became obstructed this tick, in spawn order.
    pub spawned: Vec<Cell>,
    /// Cells whose obstruction expired this tick, sorted.
    pub expired: Vec<Cell>,
    /// Subscriber events from the advance phase, in registration order.
    pub events: Vec<E>,
}

// ── TrafficController ─────────────────────────────────────────────────────────

/// Owns the obstruction set and drives the subscribers.
///
/// Each [`step`](Self::step) runs four phases strictly in order:
///
/// 1. **Decay**: every TTL drops by one; entries reaching zero are removed.
/// 2. **Generate**: scripted obstructions are added up to `max_alerts`, then (gated by
///    `spawn_probability`) uniformly random unobstructed cells are drawn
///    until the effective target is reached.  Duplicate draws are retried.
/// 3. **Broadcast**: the complete set, as an `Arc<TrafficSnapshot>`, goes
///    to every subscriber in registration order.
/// 4. **Advance**: each subscriber acts, in registration order, only after
///    phase 3 has reached all of them.
pub struct TrafficController<S: TrafficSubscriber> {
    config:       TrafficConfig,
    rng:          SimRng,
    obstructions: CellMap<u32>,
    /// Scripted obstructions waiting for the next generation phase.
    pending:      Vec<(Cell, u32)>,
    snapshot:     Arc<TrafficSnapshot>,
    subscribers:  Vec<S>,
}

impl<S: TrafficSubscriber> TrafficController<S> {
    /// # Errors
    ///
    /// [`TrafficError::Config`] if `spawn_probability` is outside `[0, 1]`, or
    /// if obstructions are requested over an empty area.
    pub fn new(config: TrafficConfig, rng: SimRng) -> TrafficResult<Self> {
        if !(0.0..=1.0).contains(&config.spawn_probability) {
            return Err(TrafficError::Config(format!(
                "spawn_probability {} is outside [0, 1]",
                config.spawn_probability
            )));
        }
        if config.max_alerts > 0 && (config.rows == 0 || config.cols == 0) {
            return Err(TrafficError::Config(format!(
                "{} obstructions requested over an empty {}x{} area",
                config.max_alerts, config.rows, config.cols
            )));
        }
        let snapshot = Arc::new(TrafficSnapshot::empty(config.penalty));
        Ok(Self {
            config,
            rng,
            obstructions: CellMap::default(),
            pending: Vec::new(),
            snapshot,
            subscribers: Vec::new(),
        })
    }

    // ── Subscribers ───────────────────────────────────────────────────────

    /// Add a subscriber and immediately deliver the current snapshot.
    ///
    /// Returns the registration index, which is also the advance order.
    pub fn register(&mut self, mut subscriber: S) -> AgentId {
        let id = AgentId(self.subscribers.len() as u32);
        subscriber.on_traffic_update(&self.snapshot);
        self.subscribers.push(subscriber);
        id
    }

    pub fn subscribers(&self) -> &[S] {
        &self.subscribers
    }

    pub fn subscribers_mut(&mut self) -> &mut [S] {
        &mut self.subscribers
    }

    pub fn subscriber(&self, id: AgentId) -> Option<&S> {
        self.subscribers.get(id.index())
    }

    pub fn into_subscribers(self) -> Vec<S> {
        self.subscribers
    }

    // ── Queries ───────────────────────────────────────────────────────────

    /// Surcharge for entering `cell` right now.
    pub fn get_penalty(&self, cell: Cell) -> u64 {
        if self.obstructions.contains_key(&cell) { self.config.penalty } else { 0 }
    }

    /// The most recently broadcast snapshot.
    pub fn snapshot(&self) -> &Arc<TrafficSnapshot> {
        &self.snapshot
    }

    pub fn config(&self) -> &TrafficConfig {
        &self.config
    }

    /// Queue an obstruction for the next step's generation phase.  It is
    /// then visible for `ttl` broadcasts, like a spawned one.
    ///
    /// Scripted cells count towards `max_alerts`.  When the set is full the
    /// entry stays queued and is retried on later steps; re-scripting a cell
    /// that is already obstructed only refreshes its TTL.
    pub fn insert_obstruction(&mut self, cell: Cell, ttl: u32) {
        self.pending.push((cell, ttl));
    }

    // ── Step ──────────────────────────────────────────────────────────────

    /// Run one controller step for `tick`.
    pub fn step(&mut self, tick: Tick) -> TickReport<S::Event> {
        let expired = self.decay();
        let spawned = self.generate();

        let snapshot = Arc::new(TrafficSnapshot::new(tick, self.config.penalty, self.obstructions.clone()));
        self.snapshot = Arc::clone(&snapshot);
        trace!(%tick, obstructions = snapshot.len(), "broadcast");
        self.broadcast(&snapshot);

        let mut events = Vec::new();
        for subscriber in &mut self.subscribers {
            subscriber.advance(tick, &mut events);
        }

        TickReport { tick, obstructions: snapshot.len(), spawned, expired, events }
    }

    fn decay(&mut self) -> Vec<Cell> {
        let mut expired = Vec::new();
        self.obstructions.retain(|&cell, ttl| {
            *ttl = ttl.saturating_sub(1);
            if *ttl == 0 {
                expired.push(cell);
                false
            } else {
                true
            }
        });
        expired.sort_unstable();
        if !expired.is_empty() {
            debug!(count = expired.len(), "obstructions expired");
        }
        expired
    }

    fn generate(&mut self) -> Vec<Cell> {
        let mut spawned = Vec::new();
        let cap = self.config.max_alerts;
        let mut deferred = Vec::new();
        for (cell, ttl) in std::mem::take(&mut self.pending) {
            if ttl == 0 {
                continue;
            }
            if self.obstructions.len() >= cap && !self.obstructions.contains_key(&cell) {
                deferred.push((cell, ttl));
                continue;
            }
            self.obstructions.insert(cell, ttl);
            spawned.push(cell);
        }
        if !deferred.is_empty() {
            debug!(count = deferred.len(), cap, "scripted obstructions deferred");
            self.pending = deferred;
        }

        let p = self.config.spawn_probability;
        if p < 1.0 && !self.rng.gen_bool(p) {
            return spawned;
        }

        let target = self.config.effective_target();
        while self.obstructions.len() < target {
            let cell = Cell::new(
                self.rng.gen_range(0..self.config.rows as i32),
                self.rng.gen_range(0..self.config.cols as i32),
            );
            if !self.obstructions.contains_key(&cell) {
                self.obstructions.insert(cell, self.config.ttl);
                spawned.push(cell);
            }
        }
        if !spawned.is_empty() {
            debug!(cells = ?spawned, "obstructions spawned");
        }
        spawned
    }

    #[cfg(not(feature = "parallel"))]
    fn broadcast(&mut self, snapshot: &Arc<TrafficSnapshot>) {
        for subscriber in &mut self.subscribers {
            subscriber.on_traffic_update(snapshot);
        }
    }

    /// The implicit join at the end of `for_each` is the tick barrier: no
    /// subscriber advances until all have the snapshot.
    #[cfg(feature = "parallel")]
    fn broadcast(&mut self, snapshot: &Arc<TrafficSnapshot>) {
        use rayon::prelude::*;

        self.subscribers
            .par_iter_mut()
            .for_each(|subscriber| subscriber.on_traffic_update(snapshot));
    }
}
