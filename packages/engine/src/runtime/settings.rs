// packages/engine/src/runtime/settings.rs
//! Runtime settings shared by the coordinator and the actors

use rand::rngs::StdRng;
use rand::SeedableRng;
use std::time::Duration;

/// Settings derived from `RuntimeConfig`
#[derive(Debug, Clone)]
pub struct RuntimeSettings {
    /// Duration of one unit of synthetic work
    pub base_unit: Duration,

    /// Inclusive range the per-task load multiplier is drawn from
    pub task_load_min: u32,
    pub task_load_max: u32,

    /// Capacity of every mailbox
    pub channel_capacity: usize,

    /// Seed for reproducible runs
    pub seed: Option<u64>,

    /// Grace period for actor tasks to exit after shutdown
    pub shutdown_grace: Duration,
}

impl Default for RuntimeSettings {
    fn default() -> Self {
        Self {
            base_unit: Duration::from_millis(100),
            task_load_min: 1,
            task_load_max: 5,
            channel_capacity: 32,
            seed: None,
            shutdown_grace: Duration::from_secs(1),
        }
    }
}

impl RuntimeSettings {
    /// Pin the per-task load multiplier to a single value
    pub fn with_fixed_task_load(mut self, load: u32) -> Self {
        self.task_load_min = load;
        self.task_load_max = load;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn with_base_unit(mut self, base_unit: Duration) -> Self {
        self.base_unit = base_unit;
        self
    }

    pub fn with_channel_capacity(mut self, capacity: usize) -> Self {
        self.channel_capacity = capacity;
        self
    }

    /// RNG for one stream of the run; `stream` keeps actor and coordinator draws independent
    pub(crate) fn rng(&self, stream: u64) -> StdRng {
        match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed.wrapping_add(stream)),
            None => StdRng::from_entropy(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::Rng;

    #[test]
    fn test_seeded_streams_are_reproducible() {
        let settings = RuntimeSettings::default().with_seed(1234);

        let mut first = settings.rng(3);
        let mut second = settings.rng(3);
        let a: Vec<u32> = (0..8).map(|_| first.gen_range(0..1000)).collect();
        let b: Vec<u32> = (0..8).map(|_| second.gen_range(0..1000)).collect();
        assert_eq!(a, b);
    }

    #[test]
    fn test_fixed_task_load() {
        let settings = RuntimeSettings::default().with_fixed_task_load(1);
        assert_eq!(settings.task_load_min, 1);
        assert_eq!(settings.task_load_max, 1);
    }
}
