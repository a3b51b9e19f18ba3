//! Simple profiling macros using thread-local storage
//!
//! Lightweight timing of the search hot paths without changing any function
//! signature. Enable with environment variable: DIVERCITE_PROFILE=1

use std::cell::RefCell;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::OnceLock;
use std::time::Instant;

/// Timed sections of a search
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Category {
    /// Move orderer calls
    Rank,
    /// Static evaluator calls
    Evaluate,
    /// Successor state construction
    Successor,
    /// One whole root search
    Search,
}

impl Category {
    const COUNT: usize = 4;

    pub const ALL: [Category; Category::COUNT] = [
        Category::Rank,
        Category::Evaluate,
        Category::Successor,
        Category::Search,
    ];

    fn index(self) -> usize {
        self as usize
    }

    fn label(self) -> &'static str {
        match self {
            Category::Rank => "Move Ordering",
            Category::Evaluate => "Evaluation",
            Category::Successor => "Apply Action",
            Category::Search => "Root Search",
        }
    }
}

thread_local! {
    static TIMES: RefCell<[u64; Category::COUNT]> = RefCell::new([0; Category::COUNT]);
    static COUNTS: RefCell<[usize; Category::COUNT]> = RefCell::new([0; Category::COUNT]);
    static CUTOFFS: RefCell<usize> = RefCell::new(0);
}

// Global aggregators
static GLOBAL_TIMES: [AtomicU64; Category::COUNT] = [
    AtomicU64::new(0),
    AtomicU64::new(0),
    AtomicU64::new(0),
    AtomicU64::new(0),
];
static GLOBAL_COUNTS: [AtomicUsize; Category::COUNT] = [
    AtomicUsize::new(0),
    AtomicUsize::new(0),
    AtomicUsize::new(0),
    AtomicUsize::new(0),
];
static GLOBAL_CUTOFFS: AtomicUsize = AtomicUsize::new(0);

static ENABLED: OnceLock<bool> = OnceLock::new();

/// Read once per process; the search calls this on every node
#[inline]
pub fn is_profiling_enabled() -> bool {
    *ENABLED.get_or_init(|| std::env::var("DIVERCITE_PROFILE").is_ok())
}

pub struct ProfileGuard {
    start: Instant,
    category: Category,
}

impl ProfileGuard {
    pub fn new(category: Category) -> Option<Self> {
        if is_profiling_enabled() {
            Some(ProfileGuard {
                start: Instant::now(),
                category,
            })
        } else {
            None
        }
    }
}

impl Drop for ProfileGuard {
    fn drop(&mut self) {
        let elapsed_ns = self.start.elapsed().as_nanos() as u64;
        let i = self.category.index();
        TIMES.with(|t| t.borrow_mut()[i] += elapsed_ns);
        COUNTS.with(|c| c.borrow_mut()[i] += 1);
    }
}

#[inline]
pub fn record_cutoff() {
    if is_profiling_enabled() {
        CUTOFFS.with(|c| *c.borrow_mut() += 1);
    }
}

/// Folds this thread's counters into the process totals
pub fn merge_thread_local() {
    if !is_profiling_enabled() {
        return;
    }

    TIMES.with(|t| {
        let mut t = t.borrow_mut();
        for (i, slot) in t.iter_mut().enumerate() {
            GLOBAL_TIMES[i].fetch_add(*slot, Ordering::Relaxed);
            *slot = 0;
        }
    });
    COUNTS.with(|c| {
        let mut c = c.borrow_mut();
        for (i, slot) in c.iter_mut().enumerate() {
            GLOBAL_COUNTS[i].fetch_add(*slot, Ordering::Relaxed);
            *slot = 0;
        }
    });
    CUTOFFS.with(|c| {
        GLOBAL_CUTOFFS.fetch_add(*c.borrow(), Ordering::Relaxed);
        *c.borrow_mut() = 0;
    });
}

pub fn print_report(total_time_ms: u64) {
    if !is_profiling_enabled() {
        return;
    }

    let total_ns = total_time_ms * 1_000_000;

    eprintln!("\n═══════════════════════════════════════════════════════════");
    eprintln!("                 PERFORMANCE PROFILE");
    eprintln!("═══════════════════════════════════════════════════════════");
    eprintln!("Total Time: {}ms\n", total_time_ms);

    for category in Category::ALL.iter() {
        let time = GLOBAL_TIMES[category.index()].load(Ordering::Relaxed);
        let count = GLOBAL_COUNTS[category.index()].load(Ordering::Relaxed);
        let ms = time as f64 / 1_000_000.0;
        let pct = if total_ns > 0 { 100.0 * time as f64 / total_ns as f64 } else { 0.0 };
        let avg_us = if count > 0 { time as f64 / (count * 1000) as f64 } else { 0.0 };

        eprintln!("{}:", category.label());
        eprintln!("  Time:     {:.2}ms ({:.1}%)", ms, pct);
        eprintln!("  Calls:    {}", count);
        eprintln!("  Avg:      {:.2}µs/call\n", avg_us);
    }

    let evaluations = GLOBAL_COUNTS[Category::Evaluate.index()].load(Ordering::Relaxed);
    let cutoffs = GLOBAL_CUTOFFS.load(Ordering::Relaxed);
    let cutoff_rate = if evaluations > 0 {
        100.0 * cutoffs as f64 / evaluations as f64
    } else {
        0.0
    };
    eprintln!("Alpha-Beta:");
    eprintln!("  Cutoffs:  {} ({:.1}% of leaves)\n", cutoffs, cutoff_rate);

    eprintln!("═══════════════════════════════════════════════════════════\n");
}

pub fn reset() {
    for i in 0..Category::COUNT {
        GLOBAL_TIMES[i].store(0, Ordering::Relaxed);
        GLOBAL_COUNTS[i].store(0, Ordering::Relaxed);
    }
    GLOBAL_CUTOFFS.store(0, Ordering::Relaxed);
}

#[macro_export]
macro_rules! profile {
    ($category:expr, $code:block) => {{
        let _guard = $crate::simple_profiler::ProfileGuard::new($category);
        $code
    }};
}
