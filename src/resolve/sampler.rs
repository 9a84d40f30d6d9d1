//! Random source for staged-rollout sampling

use rand::Rng;

/// Draws a uniformly distributed integer in `0..100`
pub trait RolloutSampler: Send + Sync {
    fn draw(&self) -> u8;
}

/// Per-call draws from the thread-local generator
#[derive(Debug, Default, Clone, Copy)]
pub struct ThreadRngSampler;

impl RolloutSampler for ThreadRngSampler {
    fn draw(&self) -> u8 {
        rand::rng().random_range(0..100)
    }
}
