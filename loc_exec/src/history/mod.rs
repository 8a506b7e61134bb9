//! # Pose history
//!
//! A bounded, time-ordered buffer of estimator states. Any timestamp inside
//! the retention horizon can be queried, and entries can be overwritten and
//! re-derived when a late correction arrives.

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

mod interp;

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use log::trace;
use ordered_float::OrderedFloat;
use std::collections::VecDeque;

use util::raise_error;

use crate::{kinematics::SwerveKinematics, state::SwerveState, uncertainty::NoisyPose};

pub use interp::SwerveStateInterpolator;

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// Extra capacity reserved over the nominal number of entries in the
/// horizon, for vision entries between ticks and period jitter.
const CAPACITY_SLACK: usize = 16;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// One sample in the history.
#[derive(Debug, Clone, PartialEq)]
pub struct HistoryEntry {
    pub state: SwerveState,

    /// Vision measurements applied at this timestamp, in arrival order.
    /// Re-applied whenever the entry is re-derived.
    ///
    /// Not capped. The list grows by one per measurement at this timestamp
    /// and lives until the entry is evicted.
    pub corrections: Vec<NoisyPose>,
}

/// Time-indexed buffer of states.
///
/// Invariants:
/// - keys are unique and strictly increasing,
/// - the buffer is never empty,
/// - no entry is older than `latest - horizon_s`, except that the latest
///   entry is always kept.
#[derive(Debug, Clone)]
pub struct History {
    entries: VecDeque<(OrderedFloat<f64>, HistoryEntry)>,

    /// Units: seconds
    horizon_s: f64,

    interpolator: SwerveStateInterpolator,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl History {
    /// Create a history seeded with one state.
    ///
    /// `nominal_period_s` sizes the buffer so that steady-state ticks don't
    /// allocate.
    pub fn new(
        kinematics: SwerveKinematics,
        horizon_s: f64,
        nominal_period_s: f64,
        timestamp_s: f64,
        seed: SwerveState,
    ) -> Self {
        let capacity = if nominal_period_s > 0.0 {
            (horizon_s / nominal_period_s).ceil() as usize + CAPACITY_SLACK
        }
        else {
            CAPACITY_SLACK
        };

        let mut entries = VecDeque::with_capacity(capacity);
        entries.push_back((OrderedFloat(timestamp_s), HistoryEntry::new(seed)));

        Self {
            entries,
            horizon_s,
            interpolator: SwerveStateInterpolator::new(kinematics),
        }
    }

    /// Drop every entry and start again from `seed`.
    pub fn reset(&mut self, timestamp_s: f64, seed: SwerveState) {
        self.entries.clear();
        self.entries
            .push_back((OrderedFloat(timestamp_s), HistoryEntry::new(seed)));
    }

    pub fn horizon_s(&self) -> f64 {
        self.horizon_s
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Always false, kept for symmetry with `len`.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Insert a state, or replace the state at an existing timestamp keeping
    /// its recorded corrections. Entries older than the horizon are evicted.
    pub fn put(&mut self, timestamp_s: f64, state: SwerveState) {
        let key = OrderedFloat(timestamp_s);
        match self.search(timestamp_s) {
            Ok(i) => self.entries[i].1.state = state,
            Err(i) => self.entries.insert(i, (key, HistoryEntry::new(state))),
        }

        self.evict();
    }

    /// Record a correction applied at an existing timestamp.
    pub fn add_correction(&mut self, timestamp_s: f64, correction: NoisyPose) {
        match self.search(timestamp_s) {
            Ok(i) => self.entries[i].1.corrections.push(correction),
            Err(_) => raise_error!(
                "No history entry at {} s to record a correction against",
                timestamp_s
            ),
        }
    }

    /// Corrections recorded at exactly `timestamp_s`.
    pub fn corrections_at(&self, timestamp_s: f64) -> &[NoisyPose] {
        match self.search(timestamp_s) {
            Ok(i) => &self.entries[i].1.corrections,
            Err(_) => &[],
        }
    }

    /// The state at `timestamp_s`.
    ///
    /// Between entries the state is interpolated; before the first or after
    /// the last entry the nearest end is returned.
    pub fn get_record(&self, timestamp_s: f64) -> SwerveState {
        if self.entries.is_empty() {
            raise_error!("Pose history is empty");
        }

        match self.search(timestamp_s) {
            Ok(i) => self.entries[i].1.state,
            Err(0) => self.entries[0].1.state,
            Err(i) if i == self.entries.len() => self.entries[i - 1].1.state,
            Err(i) => {
                let (t0, ref floor) = self.entries[i - 1];
                let (t1, ref ceil) = self.entries[i];
                let t = (timestamp_s - t0.0) / (t1.0 - t0.0);
                self.interpolator.interpolate(&floor.state, &ceil.state, t)
            }
        }
    }

    /// True if `timestamp_s` is further in the past than the buffer keeps.
    pub fn too_old(&self, timestamp_s: f64) -> bool {
        timestamp_s < self.latest_timestamp_s() - self.horizon_s
    }

    /// The most recent timestamp and state.
    pub fn latest(&self) -> (f64, &SwerveState) {
        match self.entries.back() {
            Some((t, e)) => (t.0, &e.state),
            None => raise_error!("Pose history is empty"),
        }
    }

    pub fn latest_timestamp_s(&self) -> f64 {
        self.latest().0
    }

    pub fn earliest_timestamp_s(&self) -> f64 {
        match self.entries.front() {
            Some((t, _)) => t.0,
            None => raise_error!("Pose history is empty"),
        }
    }

    /// The latest entry strictly before `timestamp_s`, if any.
    pub fn floor_before(&self, timestamp_s: f64) -> Option<(f64, &SwerveState)> {
        let i = match self.search(timestamp_s) {
            Ok(i) | Err(i) => i,
        };
        if i == 0 {
            None
        }
        else {
            let (t, ref e) = self.entries[i - 1];
            Some((t.0, &e.state))
        }
    }

    /// Iterate over `(timestamp_s, entry)` in time order.
    pub fn iter(&self) -> impl Iterator<Item = (f64, &HistoryEntry)> {
        self.entries.iter().map(|(t, e)| (t.0, e))
    }

    /// Re-derive every entry after `timestamp_s`, in time order, from the
    /// entry before it.
    ///
    /// `derive` receives the preceding (already re-derived) timestamp and
    /// state and the entry to replace, and returns its new state. The first
    /// entry in the buffer has nothing before it and is left alone. Returns
    /// the number of entries re-derived.
    ///
    /// Cost is one `derive` per entry after `timestamp_s`, at most
    /// horizon / period of them. A derive that re-applies corrections adds
    /// one nudge per correction recorded in that range, so a burst of
    /// same-timestamp measurements makes every later replay through that
    /// entry proportionally slower.
    pub fn rederive_after<F>(&mut self, timestamp_s: f64, mut derive: F) -> usize
    where
        F: FnMut(f64, &SwerveState, f64, &HistoryEntry) -> SwerveState,
    {
        let first = match self.search(timestamp_s) {
            Ok(i) => i + 1,
            Err(i) => i,
        }
        .max(1);

        for i in first..self.entries.len() {
            let (prev_t, prev_state) = (self.entries[i - 1].0 .0, self.entries[i - 1].1.state);
            let (t, ref entry) = self.entries[i];
            let state = derive(prev_t, &prev_state, t.0, entry);
            self.entries[i].1.state = state;
        }

        let count = self.entries.len().saturating_sub(first);
        trace!("Re-derived {} entries after {:.3} s", count, timestamp_s);
        count
    }

    fn search(&self, timestamp_s: f64) -> Result<usize, usize> {
        let key = OrderedFloat(timestamp_s);
        self.entries.binary_search_by(|(k, _)| k.cmp(&key))
    }

    fn evict(&mut self) {
        let oldest_kept = self.latest_timestamp_s() - self.horizon_s;
        while self.entries.len() > 1 {
            match self.entries.front() {
                Some((t, _)) if t.0 < oldest_kept => {
                    self.entries.pop_front();
                }
                _ => break,
            }
        }
    }
}

impl HistoryEntry {
    fn new(state: SwerveState) -> Self {
        Self {
            state,
            corrections: Vec::new(),
        }
    }
}
