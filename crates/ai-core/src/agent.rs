//! Collaborator boundary for leaf actions.
//!
//! The tree core never interprets these objects. Leaf conditions and actions fetch them from the
//! blackboard under the well-known keys in [`keys`] and call into them; rendering, physics and
//! effect playback all live on the other side of these traits.

use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::Vec2;

/// Combat-relevant numbers an agent exposes to its conditions.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct AgentStats {
    pub health: f32,
    pub max_health: f32,
    pub speed: f32,
    pub damage: f32,
}

impl AgentStats {
    /// Current health as a fraction of maximum; `0.0` when the maximum is not positive.
    pub fn health_ratio(&self) -> f32 {
        if self.max_health <= 0.0 {
            0.0
        } else {
            (self.health / self.max_health).clamp(0.0, 1.0)
        }
    }
}

/// The agent a tree drives (an enemy, in practice).
pub trait AgentFacade {
    fn stats(&self) -> AgentStats;

    fn position(&self) -> Vec2;

    fn is_dead(&self) -> bool;

    fn heal(&mut self, amount: f32);

    fn emit_event(&mut self, kind: &str, payload: serde_json::Value);

    fn set_state(&mut self, state: &str);

    /// Identifiers of the behaviors this agent can execute directly.
    fn behaviors(&self) -> Vec<String> {
        Vec::new()
    }

    /// Runs a named behavior against an optional target position. Returns `false` if the agent
    /// does not know the behavior.
    fn execute_behavior(&mut self, _id: &str, _target: Option<Vec2>) -> bool {
        false
    }
}

/// Anything with a position an agent can aim at.
pub trait TargetFacade {
    fn position(&self) -> Vec2;
}

/// A transient visual or audio effect requested by a leaf action.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct EffectRequest {
    pub kind: String,
    pub position: Vec2,
    pub duration: Duration,
}

impl EffectRequest {
    pub fn new(kind: impl Into<String>, position: Vec2) -> Self {
        Self {
            kind: kind.into(),
            position,
            duration: Duration::ZERO,
        }
    }

    pub fn with_duration(mut self, duration: Duration) -> Self {
        self.duration = duration;
        self
    }
}

/// The "scene": a passive sink for effects and delayed callbacks.
///
/// Return values are deliberately absent; the tree never branches on effect playback.
pub trait EffectSink {
    fn spawn_effect(&mut self, effect: EffectRequest);

    fn schedule(&mut self, delay: Duration, label: &str);
}

pub type SharedAgent = Rc<RefCell<dyn AgentFacade>>;
pub type SharedTarget = Rc<dyn TargetFacade>;
pub type SharedEffects = Rc<RefCell<dyn EffectSink>>;

/// Well-known blackboard keys written by the decision-cycle wrapper.
pub mod keys {
    use std::time::Duration;

    use super::{SharedAgent, SharedEffects, SharedTarget};
    use crate::{BbKey, Vec2};

    pub const ENEMY: BbKey<SharedAgent> = BbKey::new("enemy");
    pub const TARGET: BbKey<SharedTarget> = BbKey::new("target");
    pub const SCENE: BbKey<SharedEffects> = BbKey::new("scene");

    pub const HEALTH_RATIO: BbKey<f32> = BbKey::new("health_ratio");
    pub const IS_DEAD: BbKey<bool> = BbKey::new("is_dead");
    pub const POSITION: BbKey<Vec2> = BbKey::new("position");
    pub const TARGET_POSITION: BbKey<Vec2> = BbKey::new("target_position");
    pub const TARGET_DISTANCE: BbKey<f32> = BbKey::new("target_distance");
    pub const DELTA_TIME: BbKey<Duration> = BbKey::new("delta_time");
}
