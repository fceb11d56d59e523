use std::time::Duration;

use ai_bt::{BehaviorTree, BtStatus};
use ai_core::{keys, rng, Blackboard, SharedAgent, SharedEffects, SharedTarget, TickContext};

/// What a pattern sees when it is checked or executed.
#[derive(Clone, Default)]
pub struct PatternContext {
    pub tick: TickContext,
    pub enemy: Option<SharedAgent>,
    pub target: Option<SharedTarget>,
    pub scene: Option<SharedEffects>,
}

impl PatternContext {
    pub fn new(tick: TickContext) -> Self {
        Self {
            tick,
            ..Self::default()
        }
    }

    /// Picks up the collaborators a brain stores under [`ai_core::keys`].
    pub fn from_blackboard(tick: TickContext, blackboard: &Blackboard) -> Self {
        Self {
            tick,
            enemy: blackboard.get(keys::ENEMY).cloned(),
            target: blackboard.get(keys::TARGET).cloned(),
            scene: blackboard.get(keys::SCENE).cloned(),
        }
    }

    pub fn with_enemy(mut self, enemy: SharedAgent) -> Self {
        self.enemy = Some(enemy);
        self
    }

    pub fn with_target(mut self, target: SharedTarget) -> Self {
        self.target = Some(target);
        self
    }

    pub fn with_scene(mut self, scene: SharedEffects) -> Self {
        self.scene = Some(scene);
        self
    }

    pub fn now(&self) -> Duration {
        self.tick.now
    }
}

impl std::fmt::Debug for PatternContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PatternContext")
            .field("tick", &self.tick)
            .field("enemy", &self.enemy.is_some())
            .field("target", &self.target.is_some())
            .field("scene", &self.scene.is_some())
            .finish()
    }
}

type ReadyFn = Box<dyn Fn(&PatternContext) -> bool>;

/// A named, prioritized behavior tree with a cooldown.
pub struct AttackPattern {
    name: String,
    tree: BehaviorTree,
    priority: i32,
    cooldown: Duration,
    last_used: Option<Duration>,
    condition: Option<ReadyFn>,
}

impl AttackPattern {
    pub fn new(name: impl Into<String>, tree: BehaviorTree) -> Self {
        Self {
            name: name.into(),
            tree,
            priority: 0,
            cooldown: Duration::ZERO,
            last_used: None,
            condition: None,
        }
    }

    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    pub fn with_cooldown(mut self, cooldown: Duration) -> Self {
        self.cooldown = cooldown;
        self
    }

    /// Extra readiness check, e.g. range or health gates. Without one the pattern can always
    /// execute.
    pub fn with_condition(mut self, condition: impl Fn(&PatternContext) -> bool + 'static) -> Self {
        self.condition = Some(Box::new(condition));
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn priority(&self) -> i32 {
        self.priority
    }

    pub fn set_priority(&mut self, priority: i32) {
        self.priority = priority;
    }

    pub fn cooldown(&self) -> Duration {
        self.cooldown
    }

    pub fn set_cooldown(&mut self, cooldown: Duration) {
        self.cooldown = cooldown;
    }

    /// Simulation time of the last execution start.
    pub fn last_used(&self) -> Option<Duration> {
        self.last_used
    }

    pub fn tree(&self) -> &BehaviorTree {
        &self.tree
    }

    pub fn tree_mut(&mut self) -> &mut BehaviorTree {
        &mut self.tree
    }

    pub fn can_execute(&self, ctx: &PatternContext) -> bool {
        self.condition.as_ref().is_none_or(|condition| condition(ctx))
    }

    pub fn is_ready(&self, now: Duration) -> bool {
        self.cooldown_remaining(now).is_zero()
    }

    pub fn cooldown_remaining(&self, now: Duration) -> Duration {
        match self.last_used {
            Some(at) => self.cooldown.saturating_sub(now.saturating_sub(at)),
            None => Duration::ZERO,
        }
    }

    /// `true` if the pattern passes both its condition and its cooldown.
    pub fn is_eligible(&self, ctx: &PatternContext) -> bool {
        self.is_ready(ctx.now()) && self.can_execute(ctx)
    }

    pub(crate) fn mark_used(&mut self, now: Duration) {
        self.last_used = Some(now);
    }

    /// Forgets the cooldown stamp.
    pub fn clear_cooldown(&mut self) {
        self.last_used = None;
    }

    /// Writes the context's collaborators onto the pattern's blackboard and ticks its tree once.
    ///
    /// The tree sees the tick seed salted with the pattern name, so random composites in
    /// different patterns do not mirror each other or the host tree.
    ///
    /// This does not stamp the cooldown; [`crate::AttackPatternManager::execute_pattern`] does.
    pub fn execute(&mut self, ctx: &PatternContext) -> BtStatus {
        let blackboard = self.tree.blackboard_mut();
        match &ctx.enemy {
            Some(enemy) => blackboard.set(keys::ENEMY, SharedAgent::clone(enemy)),
            None => {
                blackboard.remove(keys::ENEMY);
            }
        }
        match &ctx.target {
            Some(target) => blackboard.set(keys::TARGET, SharedTarget::clone(target)),
            None => {
                blackboard.remove(keys::TARGET);
            }
        }
        match &ctx.scene {
            Some(scene) => blackboard.set(keys::SCENE, SharedEffects::clone(scene)),
            None => {
                blackboard.remove(keys::SCENE);
            }
        }

        let tick = ctx.tick.salted(rng::name_salt(&self.name));
        self.tree.tick(&tick)
    }
}

impl std::fmt::Debug for AttackPattern {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AttackPattern")
            .field("name", &self.name)
            .field("priority", &self.priority)
            .field("cooldown", &self.cooldown)
            .field("last_used", &self.last_used)
            .finish_non_exhaustive()
    }
}
