use std::time::Duration;

use ai_core::{keys, SharedAgent, SharedEffects, SharedTarget, SimClock, TickContext};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::{BehaviorTree, BtStatus};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct BrainConfig {
    /// Tick the tree every N frames. Blackboard fields are refreshed every frame regardless.
    pub think_every_ticks: u32,
    pub think_offset_ticks: u32,
    /// Seed for the brain's clock, and so for every random choice its tree makes.
    pub seed: u64,
    pub warn_on_failure: bool,
}

impl Default for BrainConfig {
    fn default() -> Self {
        Self {
            think_every_ticks: 1,
            think_offset_ticks: 0,
            seed: 0,
            warn_on_failure: true,
        }
    }
}

impl BrainConfig {
    /// Spreads agents that think every N frames across those frames by a stable id.
    pub fn staggered(stable_id: u64, think_every_ticks: u32) -> Self {
        let every = think_every_ticks.max(1);
        Self {
            think_every_ticks: every,
            think_offset_ticks: (stable_id % u64::from(every)) as u32,
            seed: stable_id,
            ..Self::default()
        }
    }

    pub fn should_think(&self, tick: u64) -> bool {
        let every = u64::from(self.think_every_ticks.max(1));
        (tick + u64::from(self.think_offset_ticks)) % every == 0
    }
}

/// Per-agent decision cycle: one [`Brain::update`] per frame.
///
/// Owns the tree, a simulation clock and the collaborator handles. Every frame it refreshes the
/// well-known blackboard fields in [`ai_core::keys`] before the tree sees them.
pub struct Brain {
    tree: BehaviorTree,
    clock: SimClock,
    config: BrainConfig,
    agent: Option<SharedAgent>,
    target: Option<SharedTarget>,
    last: Option<BtStatus>,
}

impl Brain {
    pub fn new(mut tree: BehaviorTree, config: BrainConfig) -> Self {
        tree.set_warn_on_failure(config.warn_on_failure);
        Self {
            tree,
            clock: SimClock::new(config.seed),
            config,
            agent: None,
            target: None,
            last: None,
        }
    }

    pub fn with_agent(mut self, agent: SharedAgent) -> Self {
        self.tree
            .blackboard_mut()
            .set(keys::ENEMY, SharedAgent::clone(&agent));
        self.agent = Some(agent);
        self
    }

    pub fn with_target(mut self, target: SharedTarget) -> Self {
        self.set_target(Some(target));
        self
    }

    pub fn with_effects(mut self, effects: SharedEffects) -> Self {
        self.tree.blackboard_mut().set(keys::SCENE, effects);
        self
    }

    /// Replaces (or clears) the current target.
    pub fn set_target(&mut self, target: Option<SharedTarget>) {
        let blackboard = self.tree.blackboard_mut();
        match &target {
            Some(target) => blackboard.set(keys::TARGET, SharedTarget::clone(target)),
            None => {
                blackboard.remove(keys::TARGET);
                blackboard.remove(keys::TARGET_POSITION);
                blackboard.remove(keys::TARGET_DISTANCE);
            }
        }
        self.target = target;
    }

    pub fn config(&self) -> &BrainConfig {
        &self.config
    }

    pub fn tree(&self) -> &BehaviorTree {
        &self.tree
    }

    pub fn tree_mut(&mut self) -> &mut BehaviorTree {
        &mut self.tree
    }

    pub fn now(&self) -> Duration {
        self.clock.now()
    }

    /// Status returned by the last [`Brain::update`].
    pub fn last_status(&self) -> Option<BtStatus> {
        self.last
    }

    /// Advances the brain's clock by `dt`, refreshes the blackboard and ticks the tree on
    /// thinking frames.
    ///
    /// A dead agent is not ticked and reports `Failure`. On frames where the brain does not
    /// think, the previous status is reported again (`Running` before the first tick). Failure
    /// is diagnostic only; the caller keeps calling `update`.
    pub fn update(&mut self, dt: Duration) -> BtStatus {
        let ctx = self.clock.advance(dt);
        self.refresh(&ctx);

        if self.tree.blackboard().flag(keys::IS_DEAD) {
            tracing::trace!(tick = ctx.tick, "agent is dead; skipping tree");
            self.last = Some(BtStatus::Failure);
            return BtStatus::Failure;
        }

        if !self.config.should_think(ctx.tick) {
            return self.last.unwrap_or(BtStatus::Running);
        }

        let status = self.tree.tick(&ctx);
        self.last = Some(status);
        status
    }

    fn refresh(&mut self, ctx: &TickContext) {
        let blackboard = self.tree.blackboard_mut();
        blackboard.set(keys::DELTA_TIME, ctx.dt);

        let Some(agent) = &self.agent else {
            return;
        };
        let (stats, position, dead) = {
            let agent = agent.borrow();
            (agent.stats(), agent.position(), agent.is_dead())
        };
        blackboard.set(keys::HEALTH_RATIO, stats.health_ratio());
        blackboard.set(keys::IS_DEAD, dead);
        blackboard.set(keys::POSITION, position);

        if let Some(target) = &self.target {
            let target_position = target.position();
            blackboard.set(keys::TARGET_POSITION, target_position);
            blackboard.set(keys::TARGET_DISTANCE, position.distance(target_position));
        }
    }
}

/// Updates a batch of brains with the same frame delta, in slice order.
pub fn update_brains(brains: &mut [Brain], dt: Duration) {
    for brain in brains.iter_mut() {
        brain.update(dt);
    }
}
