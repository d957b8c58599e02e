//! Anytime repairing A* (ARA*).
//!
//! Runs weighted A* with an inflated heuristic to produce a first
//! solution quickly, then repeatedly lowers the inflation and repairs
//! the search, reusing g-values from earlier tiers. Each tier's
//! solution cost is bounded by its epsilon times the optimal cost, and
//! costs never increase from one tier to the next.
//!
//! States already closed in the current tier whose g-value improves are
//! set aside on an inconsistency list instead of being re-expanded; they
//! re-enter the open list when the next tier starts.

use std::cmp::Ordering;
use std::collections::{BinaryHeap, HashMap, HashSet};
use std::time::{Duration, Instant};

use log::{debug, trace};
use serde::{Deserialize, Serialize};

use crate::lattice::StateId;

use super::SearchSpace;

/// Search schedule settings
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct SearchConfig {
    /// Initial heuristic inflation (>= 1)
    #[serde(default = "defaults::epsilon_start")]
    pub epsilon_start: f64,
    /// Inflation decrease between tiers
    #[serde(default = "defaults::epsilon_decrease")]
    pub epsilon_decrease: f64,
    /// Final inflation; 1.0 yields a provably optimal last tier
    #[serde(default = "defaults::epsilon_final")]
    pub epsilon_final: f64,
    /// Hard cap on total expansions, a guard against runaway searches
    #[serde(default = "defaults::max_expansions")]
    pub max_expansions: usize,
}

mod defaults {
    pub fn epsilon_start() -> f64 {
        3.0
    }

    pub fn epsilon_decrease() -> f64 {
        0.5
    }

    pub fn epsilon_final() -> f64 {
        1.0
    }

    pub fn max_expansions() -> usize {
        500_000
    }
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            epsilon_start: 3.0,
            epsilon_decrease: 0.5,
            epsilon_final: 1.0,
            max_expansions: 500_000,
        }
    }
}

/// Why a search episode produced no solution.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SearchFailure {
    /// The open list emptied before any goal was reached: the goal is
    /// unreachable in the discretized space.
    Exhausted {
        /// Expansions performed before giving up
        expansions: usize,
    },
    /// The time budget (or expansion cap) ran out before the first
    /// solution.
    TimedOut {
        /// Expansions performed before the deadline
        expansions: usize,
    },
}

/// Statistics for one epsilon tier.
#[derive(Clone, Debug)]
pub struct IterationStats {
    /// Inflation of this tier
    pub epsilon: f64,
    /// Expansions performed in this tier
    pub expansions: usize,
    /// Wall-clock time spent in this tier
    pub elapsed: Duration,
    /// Solution cost found in this tier, if any
    pub solution_cost: Option<u64>,
}

/// Statistics for a whole search episode.
#[derive(Clone, Debug, Default)]
pub struct SearchStats {
    /// Inflation of the first tier
    pub initial_epsilon: f64,
    /// Inflation of the tier that produced the returned solution
    pub final_epsilon: f64,
    /// Expansions in the first tier that found a solution
    pub initial_expansions: usize,
    /// Time spent up to the first solution
    pub initial_time: Duration,
    /// Total expansions over all tiers
    pub total_expansions: usize,
    /// Total time over all tiers
    pub total_time: Duration,
    /// Per-tier breakdown
    pub iterations: Vec<IterationStats>,
}

/// A found path with its cost and statistics.
#[derive(Clone, Debug)]
pub struct SearchResult {
    /// State ids from start to goal inclusive
    pub path: Vec<StateId>,
    /// Path cost in the space's fixed-point units
    pub cost: u64,
    /// Episode statistics
    pub stats: SearchStats,
}

/// Outcome of advancing the search by one epsilon tier.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum TierOutcome {
    /// This tier found (or kept) a solution with the given cost.
    Solved {
        /// Solution cost after this tier
        cost: u64,
        /// Inflation the solution is bounded by
        epsilon: f64,
    },
    /// The open list emptied without reaching a goal.
    Exhausted,
    /// The deadline or expansion cap was hit mid-tier.
    TimedOut,
    /// The schedule is complete; no further improvement is possible.
    Finished,
}

/// Per-state search bookkeeping.
struct SearchNode {
    g: u64,
    h: u64,
    parent: Option<StateId>,
    /// Closed in the current tier
    closed: bool,
    /// Waiting on the inconsistency list
    in_incons: bool,
}

/// Open list entry; stale entries are skipped on pop by comparing `g`
/// against the node's current value.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct HeapEntry {
    f: u64,
    g: u64,
    id: StateId,
}

impl Ord for HeapEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        // Min-heap on f; among equal f prefer larger g (deeper nodes),
        // then smaller id for reproducibility.
        other
            .f
            .cmp(&self.f)
            .then(self.g.cmp(&other.g))
            .then(other.id.cmp(&self.id))
    }
}

impl PartialOrd for HeapEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Anytime repairing A* over a [`SearchSpace`].
///
/// The search object is explicit and incremental: [`advance`] runs one
/// epsilon tier and [`run`] drives tiers until the schedule or the time
/// budget is done.
///
/// [`advance`]: AraStar::advance
/// [`run`]: AraStar::run
pub struct AraStar {
    config: SearchConfig,
    start: StateId,
    epsilon: f64,
    nodes: HashMap<StateId, SearchNode>,
    open: BinaryHeap<HeapEntry>,
    incons: Vec<StateId>,
    best_goal: Option<(StateId, u64)>,
    best_epsilon: f64,
    total_expansions: usize,
    seeded: bool,
}

impl AraStar {
    /// Create a search episode from a start state.
    pub fn new(start: StateId, config: SearchConfig) -> Self {
        let epsilon = config.epsilon_start.max(1.0);
        Self {
            config,
            start,
            epsilon,
            nodes: HashMap::new(),
            open: BinaryHeap::new(),
            incons: Vec::new(),
            best_goal: None,
            best_epsilon: f64::INFINITY,
            total_expansions: 0,
            seeded: false,
        }
    }

    /// Inflation of the current tier.
    pub fn epsilon(&self) -> f64 {
        self.epsilon
    }

    /// Total expansions so far.
    pub fn expansions(&self) -> usize {
        self.total_expansions
    }

    /// Run the full schedule within a time budget.
    ///
    /// Returns the best solution found; a deadline or exhaustion after
    /// the first solution terminates the schedule early but still
    /// succeeds with the best-so-far path.
    pub fn run<S: SearchSpace>(
        &mut self,
        space: &mut S,
        budget: Duration,
    ) -> Result<SearchResult, SearchFailure> {
        let started = Instant::now();
        let deadline = started + budget;
        let mut stats = SearchStats {
            initial_epsilon: self.epsilon,
            ..Default::default()
        };

        loop {
            let tier_started = Instant::now();
            let expansions_before = self.total_expansions;
            let outcome = self.advance(space, deadline);
            let tier_expansions = self.total_expansions - expansions_before;

            let solution_cost = match &outcome {
                TierOutcome::Solved { cost, .. } => Some(*cost),
                _ => None,
            };
            if !matches!(outcome, TierOutcome::Finished) {
                stats.iterations.push(IterationStats {
                    epsilon: self.epsilon,
                    expansions: tier_expansions,
                    elapsed: tier_started.elapsed(),
                    solution_cost,
                });
            }

            match outcome {
                TierOutcome::Solved { cost, epsilon } => {
                    debug!(
                        "[AraStar] solved at epsilon {:.2}: cost {} after {} expansions",
                        epsilon, cost, self.total_expansions
                    );
                    if stats.iterations.len() == 1 {
                        stats.initial_expansions = tier_expansions;
                        stats.initial_time = started.elapsed();
                    }
                }
                TierOutcome::Finished => break,
                TierOutcome::Exhausted => {
                    if self.best_goal.is_none() {
                        debug!(
                            "[AraStar] FAILED: open list exhausted after {} expansions",
                            self.total_expansions
                        );
                        return Err(SearchFailure::Exhausted {
                            expansions: self.total_expansions,
                        });
                    }
                    break;
                }
                TierOutcome::TimedOut => {
                    if self.best_goal.is_none() {
                        debug!(
                            "[AraStar] FAILED: deadline hit after {} expansions",
                            self.total_expansions
                        );
                        return Err(SearchFailure::TimedOut {
                            expansions: self.total_expansions,
                        });
                    }
                    break;
                }
            }
        }

        // Every break path above has a recorded solution.
        let Some((goal, cost)) = self.best_goal else {
            return Err(SearchFailure::Exhausted {
                expansions: self.total_expansions,
            });
        };
        // A tier interrupted mid-repair may have relaxed the goal further
        // than the recorded cost; the parent chain reflects the lower value.
        let cost = match self.nodes.get(&goal) {
            Some(node) => cost.min(node.g),
            None => cost,
        };
        stats.final_epsilon = self.best_epsilon;
        stats.total_expansions = self.total_expansions;
        stats.total_time = started.elapsed();

        Ok(SearchResult {
            path: self.reconstruct_path(goal),
            cost,
            stats,
        })
    }

    /// Advance the search by one epsilon tier.
    ///
    /// The first call searches at the starting inflation; later calls
    /// lower the inflation, merge the inconsistency list back into the
    /// open list, and resume. Returns [`TierOutcome::Finished`] once the
    /// schedule cannot improve further.
    pub fn advance<S: SearchSpace>(&mut self, space: &mut S, deadline: Instant) -> TierOutcome {
        if !self.seeded {
            self.seeded = true;
            let h = space.heuristic(self.start);
            self.nodes.insert(
                self.start,
                SearchNode {
                    g: 0,
                    h,
                    parent: None,
                    closed: false,
                    in_incons: false,
                },
            );
            self.open.push(HeapEntry {
                f: inflate(0, h, self.epsilon),
                g: 0,
                id: self.start,
            });
        } else {
            if self.epsilon <= self.config.epsilon_final {
                return TierOutcome::Finished;
            }
            if self.open.is_empty() && self.incons.is_empty() {
                // Nothing left to repair: the current solution is optimal.
                return TierOutcome::Finished;
            }
            self.epsilon = if self.config.epsilon_decrease > 0.0 {
                (self.epsilon - self.config.epsilon_decrease).max(self.config.epsilon_final)
            } else {
                self.config.epsilon_final
            };
            self.rebuild_open();
            trace!("[AraStar] tier start: epsilon {:.2}", self.epsilon);
        }

        self.improve(space, deadline)
    }

    /// Expand until a goal is popped or the open list empties.
    fn improve<S: SearchSpace>(&mut self, space: &mut S, deadline: Instant) -> TierOutcome {
        while let Some(entry) = self.open.pop() {
            let (stale, closed) = match self.nodes.get(&entry.id) {
                Some(node) => (node.g != entry.g, node.closed),
                None => (true, false),
            };
            if stale || closed {
                continue;
            }

            if space.is_goal(entry.id) {
                // Leave the goal open so later tiers can re-derive it.
                self.open.push(entry);
                self.record_solution(entry.id, entry.g);
                // A different goal state may pop worse than an earlier
                // tier's solution; the episode's answer never regresses.
                let (_, best) = self.best_goal.unwrap_or((entry.id, entry.g));
                return TierOutcome::Solved {
                    cost: best,
                    epsilon: self.epsilon,
                };
            }

            if Instant::now() >= deadline || self.total_expansions >= self.config.max_expansions {
                // Put the node back so a later tier can resume cleanly.
                self.open.push(entry);
                return TierOutcome::TimedOut;
            }

            if let Some(node) = self.nodes.get_mut(&entry.id) {
                node.closed = true;
            }
            self.total_expansions += 1;

            for (succ, cost) in space.successors(entry.id) {
                let new_g = entry.g.saturating_add(cost);
                let h = match self.nodes.get(&succ) {
                    Some(node) => {
                        if new_g >= node.g {
                            continue;
                        }
                        node.h
                    }
                    None => space.heuristic(succ),
                };

                let node = self.nodes.entry(succ).or_insert(SearchNode {
                    g: u64::MAX,
                    h,
                    parent: None,
                    closed: false,
                    in_incons: false,
                });
                node.g = new_g;
                node.parent = Some(entry.id);

                if node.closed {
                    // Improved after closing in this tier: repair later.
                    if !node.in_incons {
                        node.in_incons = true;
                        self.incons.push(succ);
                    }
                } else {
                    self.open.push(HeapEntry {
                        f: inflate(new_g, h, self.epsilon),
                        g: new_g,
                        id: succ,
                    });
                }
            }
        }

        TierOutcome::Exhausted
    }

    /// Merge the inconsistency list into the open list and recompute
    /// every priority at the current epsilon.
    fn rebuild_open(&mut self) {
        let mut members = HashSet::new();
        for entry in self.open.drain() {
            if let Some(node) = self.nodes.get(&entry.id) {
                if node.g == entry.g {
                    members.insert(entry.id);
                }
            }
        }
        for id in self.incons.drain(..) {
            members.insert(id);
        }
        for node in self.nodes.values_mut() {
            node.closed = false;
            node.in_incons = false;
        }

        let mut rebuilt = BinaryHeap::with_capacity(members.len());
        for id in members {
            let node = &self.nodes[&id];
            rebuilt.push(HeapEntry {
                f: inflate(node.g, node.h, self.epsilon),
                g: node.g,
                id,
            });
        }
        self.open = rebuilt;
    }

    fn record_solution(&mut self, goal: StateId, cost: u64) {
        let improved = match self.best_goal {
            Some((_, best)) => cost < best,
            None => true,
        };
        if improved {
            self.best_goal = Some((goal, cost));
        }
        self.best_epsilon = self.epsilon;
    }

    /// Follow parent links from the goal back to the start.
    fn reconstruct_path(&self, goal: StateId) -> Vec<StateId> {
        let mut path = vec![goal];
        let mut current = goal;
        while let Some(node) = self.nodes.get(&current) {
            match node.parent {
                Some(parent) => {
                    path.push(parent);
                    current = parent;
                }
                None => break,
            }
        }
        path.reverse();
        path
    }
}

/// Priority with inflated heuristic: `g + round(epsilon * h)`.
#[inline]
fn inflate(g: u64, h: u64, epsilon: f64) -> u64 {
    g.saturating_add((epsilon * h as f64).round() as u64)
}
