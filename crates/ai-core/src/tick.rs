#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::{rng, SplitMix64};

/// Everything a node may know about "now".
///
/// Time is injected, never read from the wall clock: `now` is accumulated simulation time, so
/// timers (Wait, Timeout, Cooldown, pattern cooldowns) behave identically in tests and in play.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct TickContext {
    pub tick: u64,
    pub now: Duration,
    pub dt: Duration,
    pub seed: u64,
}

impl TickContext {
    pub fn new(tick: u64, now: Duration, dt: Duration, seed: u64) -> Self {
        Self {
            tick,
            now,
            dt,
            seed,
        }
    }

    /// Context at an absolute time in milliseconds. Handy for driving timers in tests.
    pub fn at(now_ms: u64) -> Self {
        Self {
            now: Duration::from_millis(now_ms),
            ..Self::default()
        }
    }

    pub fn with_tick(mut self, tick: u64) -> Self {
        self.tick = tick;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn dt_seconds(&self) -> f32 {
        self.dt.as_secs_f32()
    }

    /// Time elapsed since `earlier`, saturating at zero if `earlier` lies in the future.
    pub fn elapsed_since(&self, earlier: Duration) -> Duration {
        self.now.saturating_sub(earlier)
    }

    /// RNG for one draw site. `stream` separates independent consumers within the same tick.
    pub fn rng(&self, stream: u64) -> SplitMix64 {
        SplitMix64::new(rng::derive_seed(self.seed, self.tick, stream))
    }

    /// RNG for the `draw`-th fresh choice at a draw site. Nodes that choose more than once per
    /// tick count their draws so each choice is independent of the last.
    pub fn rng_draw(&self, stream: u64, draw: u64) -> SplitMix64 {
        self.rng(rng::draw_stream(stream, draw))
    }

    /// Same time, with the seed salted. Gives a separately built tree its own random streams.
    pub fn salted(&self, salt: u64) -> Self {
        Self {
            seed: rng::derive_seed(self.seed, salt, 0),
            ..*self
        }
    }
}

/// Accumulates frame deltas into tick contexts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SimClock {
    tick: u64,
    now: Duration,
    seed: u64,
}

impl SimClock {
    pub fn new(seed: u64) -> Self {
        Self {
            tick: 0,
            now: Duration::ZERO,
            seed,
        }
    }

    /// Advances simulation time by `dt` and returns the context for the frame.
    ///
    /// The first frame is tick 0.
    pub fn advance(&mut self, dt: Duration) -> TickContext {
        self.now = self.now.saturating_add(dt);
        let ctx = TickContext::new(self.tick, self.now, dt, self.seed);
        self.tick = self.tick.wrapping_add(1);
        ctx
    }

    pub fn now(&self) -> Duration {
        self.now
    }

    /// Number of frames advanced so far.
    pub fn ticks(&self) -> u64 {
        self.tick
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::DeterministicRng;

    #[test]
    fn clock_accumulates_deltas() {
        let mut clock = SimClock::new(5);
        let a = clock.advance(Duration::from_millis(16));
        let b = clock.advance(Duration::from_millis(17));
        assert_eq!(a.tick, 0);
        assert_eq!(b.tick, 1);
        assert_eq!(b.now, Duration::from_millis(33));
        assert_eq!(b.dt, Duration::from_millis(17));
        assert_eq!(b.seed, 5);
        assert_eq!(clock.ticks(), 2);
    }

    #[test]
    fn elapsed_since_saturates() {
        let ctx = TickContext::at(100);
        assert_eq!(ctx.elapsed_since(Duration::from_millis(40)), Duration::from_millis(60));
        assert_eq!(ctx.elapsed_since(Duration::from_millis(400)), Duration::ZERO);
    }

    #[test]
    fn draws_and_salts_separate_rngs() {
        let ctx = TickContext::at(0).with_tick(3).with_seed(1);
        let first = ctx.rng_draw(2, 0).next_u64();
        assert_ne!(first, ctx.rng_draw(2, 1).next_u64());
        assert_eq!(first, ctx.rng_draw(2, 0).next_u64());

        let salted = ctx.salted(9);
        assert_eq!(salted.now, ctx.now);
        assert_eq!(salted.tick, ctx.tick);
        assert_ne!(salted.seed, ctx.seed);
    }
}
