//! Deterministic, engine-agnostic primitives for behavior tree agents.
//!
//! Everything a node needs to evaluate lives here: the per-tree [`Blackboard`], the injected
//! simulation time carried by [`TickContext`], a small deterministic RNG, and the facades through
//! which leaf actions reach the agent, its target, and the effects layer.

#![cfg_attr(docsrs, feature(doc_cfg))]
#![forbid(unsafe_code)]

pub mod agent;
pub mod blackboard;
pub mod math;
pub mod rng;
pub mod tick;

pub use agent::{
    keys, AgentFacade, AgentStats, EffectRequest, EffectSink, SharedAgent, SharedEffects,
    SharedTarget, TargetFacade,
};
pub use blackboard::{BbKey, Blackboard};
pub use math::Vec2;
pub use rng::{DeterministicRng, SplitMix64};
pub use tick::{SimClock, TickContext};
