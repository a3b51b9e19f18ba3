//! Alpha-Beta Search Property Tests
//!
//! Checks the search engine against plain minimax on seeded random trees, and
//! the effect of the initial window on the backed-up value and node count.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::rc::Rc;

use divercite_agent::config::PruningConfig;
use divercite_agent::search::{AlphaBeta, SearchPolicy, SearchState};

/// Explicit game tree: node 0 is the root, leaves have no children
struct Tree {
    children: Vec<Vec<usize>>,
    values: Vec<f64>,
}

#[derive(Clone)]
struct Node {
    tree: Rc<Tree>,
    id: usize,
}

impl SearchState for Node {
    type Action = usize;

    fn legal_actions(&self) -> Vec<usize> {
        self.tree.children[self.id].clone()
    }

    fn successor(&self, action: &usize) -> Node {
        Node {
            tree: self.tree.clone(),
            id: *action,
        }
    }

    fn is_terminal(&self) -> bool {
        self.tree.children[self.id].is_empty()
    }
}

/// Every move ranks the same, so nothing is filtered or reordered
struct ConstantRank;

impl SearchPolicy<Node> for ConstantRank {
    fn rank(&self, _state: &Node, _action: &usize) -> f64 {
        1.0
    }

    fn evaluate(&self, state: &Node, _carried: f64) -> f64 {
        state.tree.values[state.id]
    }
}

fn no_slicing() -> PruningConfig {
    PruningConfig {
        threshold: usize::MAX,
        len_divide: 2,
        max_actions: 30,
        neutral_rank: 1.0,
    }
}

fn random_tree(seed: u64, max_depth: u32) -> Rc<Tree> {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut tree = Tree {
        children: vec![Vec::new()],
        values: vec![0.0],
    };
    let mut frontier = vec![(0usize, 0u32)];

    while let Some((id, depth)) = frontier.pop() {
        tree.values[id] = rng.random_range(-20i32..=20) as f64;
        if depth == max_depth {
            continue;
        }
        let branching = rng.random_range(0usize..=4);
        for _ in 0..branching {
            let child = tree.children.len();
            tree.children.push(Vec::new());
            tree.values.push(0.0);
            tree.children[id].push(child);
            frontier.push((child, depth + 1));
        }
    }

    Rc::new(tree)
}

fn minimax(node: &Node, depth: u32, maximizing: bool) -> f64 {
    if depth == 0 || node.is_terminal() {
        return node.tree.values[node.id];
    }
    let values = node
        .legal_actions()
        .into_iter()
        .map(|a| minimax(&node.successor(&a), depth - 1, !maximizing));
    if maximizing {
        values.fold(f64::NEG_INFINITY, f64::max)
    } else {
        values.fold(f64::INFINITY, f64::min)
    }
}

#[test]
fn test_alpha_beta_matches_minimax() {
    let pruning = no_slicing();
    for seed in 0..60 {
        let tree = random_tree(seed, 5);
        let root = Node { tree, id: 0 };
        for depth in 1..=5 {
            let mut engine = AlphaBeta::new(&ConstantRank, &pruning);
            let outcome = engine.search(&root, depth);
            assert_eq!(
                outcome.value,
                minimax(&root, depth, true),
                "seed {} depth {}",
                seed,
                depth
            );
        }
    }
}

#[test]
fn test_narrow_window_keeps_value_and_visits_fewer_nodes() {
    let pruning = no_slicing();
    for seed in 0..60 {
        let root = Node {
            tree: random_tree(seed, 4),
            id: 0,
        };
        let mut engine = AlphaBeta::new(&ConstantRank, &pruning);
        let full = engine.search(&root, 4);
        let narrow = engine.search_window(&root, 4, full.value - 0.5, full.value + 0.5);

        assert_eq!(narrow.value, full.value, "seed {}", seed);
        assert!(
            narrow.stats.nodes <= full.stats.nodes,
            "seed {}: {} > {}",
            seed,
            narrow.stats.nodes,
            full.stats.nodes
        );
    }
}

#[test]
fn test_first_of_equal_values_is_chosen() {
    let tree = Rc::new(Tree {
        children: vec![vec![1, 2, 3], vec![], vec![], vec![]],
        values: vec![0.0, 5.0, 7.0, 7.0],
    });
    let root = Node { tree, id: 0 };
    let pruning = no_slicing();
    let mut engine = AlphaBeta::new(&ConstantRank, &pruning);

    let outcome = engine.search(&root, 1);
    assert_eq!(outcome.action, Some(2));
    assert_eq!(outcome.value, 7.0);
}

#[test]
fn test_root_without_moves_returns_none() {
    let tree = Rc::new(Tree {
        children: vec![vec![]],
        values: vec![3.0],
    });
    let root = Node { tree, id: 0 };
    let pruning = no_slicing();
    let mut engine = AlphaBeta::new(&ConstantRank, &pruning);

    let outcome = engine.search(&root, 4);
    assert_eq!(outcome.action, None);
    assert_eq!(outcome.value, 3.0);
    assert_eq!(outcome.stats.leaves, 1);
}

#[test]
fn test_cutoffs_happen_on_bushy_trees() {
    let pruning = no_slicing();
    let total: u64 = (0..20)
        .map(|seed| {
            let root = Node {
                tree: random_tree(seed, 4),
                id: 0,
            };
            let mut engine = AlphaBeta::new(&ConstantRank, &pruning);
            engine.search(&root, 4).stats.cutoffs
        })
        .sum();
    assert!(total > 0);
}
