//! Tooling primitives for behavior tree agents.
//!
//! This crate is intentionally lightweight and engine-agnostic. Trees and pattern managers record
//! [`TraceEvent`]s onto the blackboard; debug overlays and replay tools read them back.

#![cfg_attr(docsrs, feature(doc_cfg))]
#![forbid(unsafe_code)]

pub mod trace;

pub use trace::{
    emit, is_enabled, NullTraceSink, TraceEvent, TraceLog, TraceSink, VecTraceSink, TRACE_LOG,
    TRACE_SINK,
};
