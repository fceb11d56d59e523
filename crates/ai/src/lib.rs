//! Umbrella crate that re-exports the `ai-*` building blocks.
//!
//! - [`core`]: blackboard, injected time, deterministic RNG, collaborator facades.
//! - [`bt`]: behavior tree nodes, the tree builder and the per-frame [`bt::Brain`].
//! - [`patterns`]: priority and cooldown gated attack patterns.
//! - [`tools`]: trace events recorded onto a blackboard.

#![cfg_attr(docsrs, feature(doc_cfg))]
#![forbid(unsafe_code)]

#[cfg(feature = "core")]
#[cfg_attr(docsrs, doc(cfg(feature = "core")))]
pub use ai_core as core;

#[cfg(feature = "tools")]
#[cfg_attr(docsrs, doc(cfg(feature = "tools")))]
pub use ai_tools as tools;

#[cfg(feature = "bt")]
#[cfg_attr(docsrs, doc(cfg(feature = "bt")))]
pub use ai_bt as bt;

#[cfg(feature = "patterns")]
#[cfg_attr(docsrs, doc(cfg(feature = "patterns")))]
pub use ai_patterns as patterns;

/// The handful of names most trees need.
#[cfg(feature = "patterns")]
#[cfg_attr(docsrs, doc(cfg(feature = "patterns")))]
pub mod prelude {
    pub use ai_bt::{
        BehaviorTree, Brain, BrainConfig, BtNode, BtStatus, BuildError, LogLevel, ParallelPolicy,
        TreeBuilder,
    };
    pub use ai_core::{keys, BbKey, Blackboard, SimClock, TickContext};
    pub use ai_patterns::{AttackPattern, AttackPatternManager, AttackPatternNode, PatternContext};
}
