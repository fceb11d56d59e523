//! Attack patterns: behavior trees gated by priority, cooldown and a readiness predicate.
//!
//! Each decision cycle the manager scans an archetype's patterns, keeps the ones that can execute
//! now, and runs the highest-priority survivor. Ties go to the earliest registered pattern.

#![cfg_attr(docsrs, feature(doc_cfg))]
#![forbid(unsafe_code)]

pub mod config;
pub mod error;
pub mod manager;
pub mod node;
pub mod pattern;

pub use config::{PatternOverride, PatternTuning};
pub use error::{PatternError, Result};
pub use manager::AttackPatternManager;
pub use node::AttackPatternNode;
pub use pattern::{AttackPattern, PatternContext};
