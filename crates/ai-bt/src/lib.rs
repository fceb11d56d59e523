//! Behavior tree runtime built on `ai-core`.
//!
//! Trees are assembled with [`TreeBuilder`], ticked through [`BehaviorTree::tick`], and driven
//! once per frame by a [`Brain`]. Time comes from the injected [`ai_core::TickContext`]; no node
//! reads the wall clock.

#![cfg_attr(docsrs, feature(doc_cfg))]
#![forbid(unsafe_code)]

pub mod brain;
pub mod bt;
pub mod builder;
pub mod error;
pub mod nodes;
pub mod tree;

pub use brain::{update_brains, Brain, BrainConfig};
pub use bt::{can_attach, BtNode, BtStatus, ChildSlots, NodeCategory, NodeKind};
pub use builder::TreeBuilder;
pub use error::BuildError;
pub use nodes::{
    Action, ClearValue, Condition, Conditional, Cooldown, Failer, Fixed, Inverter, Log, LogLevel,
    Parallel, ParallelPolicy, RandomSelector, RepeatCount, Repeater, Retry, Selector, Sequence,
    SetValue, Succeeder, Timeout, Wait, WeightedSelector,
};
pub use tree::BehaviorTree;
