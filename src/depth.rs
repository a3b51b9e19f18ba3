// Depth controller
// Maps the number of surviving candidate moves (and the remaining match time)
// to a search depth.

use std::time::Duration;

use crate::config::DepthConfig;

#[derive(Debug, Clone)]
pub struct DepthController {
    config: DepthConfig,
}

impl DepthController {
    pub fn new(config: DepthConfig) -> Self {
        DepthController { config }
    }

    /// Depth to search for `candidates` moves
    ///
    /// Below the emergency time margin the emergency depth wins regardless of
    /// the branching factor. The result is never below 1.
    pub fn depth(&self, candidates: usize, remaining: Option<Duration>) -> u32 {
        if let Some(remaining) = remaining {
            if remaining < Duration::from_millis(self.config.emergency_time_ms) {
                return self.config.emergency_depth.max(1);
            }
        }

        self.config
            .steps
            .iter()
            .find(|step| candidates < step.below)
            .map(|step| step.depth)
            .unwrap_or(self.config.default_depth)
            .max(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;

    fn controller() -> DepthController {
        DepthController::new(Config::default_hardcoded().depth)
    }

    #[test]
    fn test_step_table() {
        let dc = controller();
        assert_eq!(dc.depth(0, None), 10);
        assert_eq!(dc.depth(5, None), 10);
        assert_eq!(dc.depth(6, None), 8);
        assert_eq!(dc.depth(14, None), 7);
        assert_eq!(dc.depth(31, None), 5);
        assert_eq!(dc.depth(69, None), 4);
        assert_eq!(dc.depth(70, None), 3);
        assert_eq!(dc.depth(164, None), 3);
    }

    #[test]
    fn test_emergency_floor() {
        let dc = controller();
        let short = Some(Duration::from_millis(1_000));
        assert_eq!(dc.depth(2, short), 3);
        assert_eq!(dc.depth(200, short), 3);
        assert_eq!(dc.depth(2, Some(Duration::from_secs(600))), 10);
    }

    #[test]
    fn test_monotone_in_candidate_count() {
        let dc = controller();
        for remaining in [None, Some(Duration::from_millis(10)), Some(Duration::from_secs(900))] {
            for a in 0..200 {
                for b in (a + 1)..200 {
                    assert!(dc.depth(a, remaining) >= dc.depth(b, remaining));
                }
            }
        }
    }
}
