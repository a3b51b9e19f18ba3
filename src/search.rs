// Alpha-beta search engine
//
// Two mutually recursive layers (max for the searching player, min for the
// opponent) over any game that implements `SearchState`. A `SearchPolicy`
// supplies the move orderer, the static evaluator and an optional per-node depth
// cap, so the same walker drives both the Divercite agent and synthetic trees in
// tests.

use serde::Serialize;
use std::cmp::Ordering;
use std::fmt;

use crate::config::PruningConfig;
use crate::profile;
use crate::simple_profiler::{self, Category};

/// Minimum surface the search needs from a game engine
pub trait SearchState: Sized {
    type Action: Copy + fmt::Debug;

    /// Legal actions for the player to move, in a deterministic order
    fn legal_actions(&self) -> Vec<Self::Action>;

    /// New state after `action`; must not mutate `self`
    fn successor(&self, action: &Self::Action) -> Self;

    fn is_terminal(&self) -> bool;
}

/// Move ordering, leaf evaluation and depth control for one search
pub trait SearchPolicy<S: SearchState> {
    /// Desirability of `action` in `state`. Non-positive means "prune".
    fn rank(&self, state: &S, action: &S::Action) -> f64;

    /// Static value of `state` for the searching player. `carried` is the rank
    /// of the move that produced `state`.
    fn evaluate(&self, state: &S, carried: f64) -> f64;

    /// Upper bound on the remaining depth at a node with `candidates` moves
    fn depth_cap(&self, _candidates: usize) -> Option<u32> {
        None
    }
}

/// A ranked candidate move
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Candidate<A> {
    pub action: A,
    pub rank: f64,
}

/// Node counters for one search call
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SearchStats {
    pub nodes: u64,
    pub leaves: u64,
    pub cutoffs: u64,
}

/// Best root action with its backed-up value
#[derive(Debug, Clone)]
pub struct SearchOutcome<A> {
    /// `None` only when the root has no legal action
    pub action: Option<A>,
    pub value: f64,
    pub depth: u32,
    pub stats: SearchStats,
}

struct Scored<A> {
    action: Option<A>,
    value: f64,
}

pub struct AlphaBeta<'p, P> {
    policy: &'p P,
    pruning: &'p PruningConfig,
    stats: SearchStats,
}

impl<'p, P> AlphaBeta<'p, P> {
    pub fn new(policy: &'p P, pruning: &'p PruningConfig) -> Self {
        AlphaBeta {
            policy,
            pruning,
            stats: SearchStats::default(),
        }
    }

    pub fn stats(&self) -> SearchStats {
        self.stats
    }

    /// Ranks, filters and orders the legal actions of `state`
    ///
    /// Actions ranked <= 0 are dropped; if that leaves nothing, every legal
    /// action comes back with the neutral rank. Above the size threshold only
    /// the top `len / len_divide` (capped at `max_actions`) survive. The sort is
    /// stable, so equal ranks keep the engine's generation order.
    pub fn candidates<S>(&self, state: &S) -> Vec<Candidate<S::Action>>
    where
        S: SearchState,
        P: SearchPolicy<S>,
    {
        let actions = state.legal_actions();
        let mut ranked: Vec<Candidate<S::Action>> = actions
            .iter()
            .map(|action| Candidate {
                action: *action,
                rank: profile!(Category::Rank, { self.policy.rank(state, action) }),
            })
            .filter(|c| c.rank > 0.0)
            .collect();

        if ranked.is_empty() {
            return actions
                .into_iter()
                .map(|action| Candidate {
                    action,
                    rank: self.pruning.neutral_rank,
                })
                .collect();
        }

        ranked.sort_by(|a, b| b.rank.partial_cmp(&a.rank).unwrap_or(Ordering::Equal));

        if ranked.len() > self.pruning.threshold {
            let keep = (ranked.len() / self.pruning.len_divide.max(1))
                .min(self.pruning.max_actions)
                .max(1);
            ranked.truncate(keep);
        }

        ranked
    }

    /// Full-window search from `root` to `depth` plies
    pub fn search<S>(&mut self, root: &S, depth: u32) -> SearchOutcome<S::Action>
    where
        S: SearchState,
        P: SearchPolicy<S>,
    {
        self.search_window(root, depth, f64::NEG_INFINITY, f64::INFINITY)
    }

    /// Search with an explicit initial `[alpha, beta]` window
    pub fn search_window<S>(
        &mut self,
        root: &S,
        depth: u32,
        alpha: f64,
        beta: f64,
    ) -> SearchOutcome<S::Action>
    where
        S: SearchState,
        P: SearchPolicy<S>,
    {
        let candidates = self.candidates(root);
        self.search_candidates(root, candidates, depth, alpha, beta)
    }

    /// Search from `root` over an already ranked candidate list. The root depth
    /// is taken as given; inner nodes may be capped by the policy.
    pub fn search_candidates<S>(
        &mut self,
        root: &S,
        candidates: Vec<Candidate<S::Action>>,
        depth: u32,
        alpha: f64,
        beta: f64,
    ) -> SearchOutcome<S::Action>
    where
        S: SearchState,
        P: SearchPolicy<S>,
    {
        self.stats = SearchStats::default();
        self.stats.nodes += 1;

        let scored = if depth == 0 || root.is_terminal() {
            self.leaf(root, 0.0)
        } else {
            self.max_over(root, candidates, alpha, beta, depth, 0.0)
        };

        SearchOutcome {
            action: scored.action,
            value: scored.value,
            depth,
            stats: self.stats,
        }
    }

    fn leaf<S>(&mut self, state: &S, carried: f64) -> Scored<S::Action>
    where
        S: SearchState,
        P: SearchPolicy<S>,
    {
        self.stats.leaves += 1;
        Scored {
            action: None,
            value: profile!(Category::Evaluate, { self.policy.evaluate(state, carried) }),
        }
    }

    fn capped_depth<S>(&self, depth: u32, candidates: usize) -> u32
    where
        S: SearchState,
        P: SearchPolicy<S>,
    {
        match self.policy.depth_cap(candidates) {
            Some(cap) => depth.min(cap.max(1)),
            None => depth,
        }
    }

    fn max_layer<S>(&mut self, state: &S, alpha: f64, beta: f64, depth: u32, carried: f64) -> Scored<S::Action>
    where
        S: SearchState,
        P: SearchPolicy<S>,
    {
        self.stats.nodes += 1;
        if depth == 0 || state.is_terminal() {
            return self.leaf(state, carried);
        }
        let candidates = self.candidates(state);
        let depth = self.capped_depth::<S>(depth, candidates.len());
        self.max_over(state, candidates, alpha, beta, depth, carried)
    }

    fn min_layer<S>(&mut self, state: &S, alpha: f64, beta: f64, depth: u32, carried: f64) -> Scored<S::Action>
    where
        S: SearchState,
        P: SearchPolicy<S>,
    {
        self.stats.nodes += 1;
        if depth == 0 || state.is_terminal() {
            return self.leaf(state, carried);
        }
        let candidates = self.candidates(state);
        let depth = self.capped_depth::<S>(depth, candidates.len());
        self.min_over(state, candidates, alpha, beta, depth, carried)
    }

    fn max_over<S>(
        &mut self,
        state: &S,
        candidates: Vec<Candidate<S::Action>>,
        mut alpha: f64,
        beta: f64,
        depth: u32,
        carried: f64,
    ) -> Scored<S::Action>
    where
        S: SearchState,
        P: SearchPolicy<S>,
    {
        if candidates.is_empty() {
            return self.leaf(state, carried);
        }

        let mut best = Scored {
            action: None,
            value: f64::NEG_INFINITY,
        };

        for candidate in candidates {
            let next = profile!(Category::Successor, { state.successor(&candidate.action) });
            let reply = self.min_layer(&next, alpha, beta, depth - 1, candidate.rank);

            // Strict comparison: the first of equal values stays
            if best.action.is_none() || reply.value > best.value {
                best = Scored {
                    action: Some(candidate.action),
                    value: reply.value,
                };
            }

            alpha = alpha.max(best.value);
            if beta <= alpha {
                self.stats.cutoffs += 1;
                simple_profiler::record_cutoff();
                break;
            }
        }

        best
    }

    fn min_over<S>(
        &mut self,
        state: &S,
        candidates: Vec<Candidate<S::Action>>,
        alpha: f64,
        mut beta: f64,
        depth: u32,
        carried: f64,
    ) -> Scored<S::Action>
    where
        S: SearchState,
        P: SearchPolicy<S>,
    {
        if candidates.is_empty() {
            return self.leaf(state, carried);
        }

        let mut best = Scored {
            action: None,
            value: f64::INFINITY,
        };

        for candidate in candidates {
            let next = profile!(Category::Successor, { state.successor(&candidate.action) });
            let reply = self.max_layer(&next, alpha, beta, depth - 1, candidate.rank);

            if best.action.is_none() || reply.value < best.value {
                best = Scored {
                    action: Some(candidate.action),
                    value: reply.value,
                };
            }

            beta = beta.min(best.value);
            if beta <= alpha {
                self.stats.cutoffs += 1;
                simple_profiler::record_cutoff();
                break;
            }
        }

        best
    }
}
