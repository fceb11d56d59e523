//! Childless nodes: user callbacks, timers, constants and blackboard edits.

use std::time::Duration;

use ai_core::{Blackboard, TickContext};

use crate::bt::{BtNode, BtStatus, NodeKind};

/// Runs a user callback and returns its status verbatim.
///
/// The callback owns all side effects. Collaborators (agent, target, scene) are fetched from the
/// blackboard under [`ai_core::keys`].
pub struct Action<F> {
    name: String,
    f: F,
}

impl<F> Action<F>
where
    F: FnMut(&TickContext, &mut Blackboard) -> BtStatus + 'static,
{
    pub fn new(name: impl Into<String>, f: F) -> Self {
        Self {
            name: name.into(),
            f,
        }
    }
}

impl<F> BtNode for Action<F>
where
    F: FnMut(&TickContext, &mut Blackboard) -> BtStatus + 'static,
{
    fn tick(&mut self, ctx: &TickContext, blackboard: &mut Blackboard) -> BtStatus {
        (self.f)(ctx, blackboard)
    }

    fn reset(&mut self) {}

    fn kind(&self) -> NodeKind {
        NodeKind::Action
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn set_name(&mut self, name: String) {
        self.name = name;
    }
}

/// Maps a read-only predicate to `Success`/`Failure`. Never returns `Running`.
pub struct Condition<F> {
    name: String,
    f: F,
}

impl<F> Condition<F>
where
    F: FnMut(&TickContext, &Blackboard) -> bool + 'static,
{
    pub fn new(name: impl Into<String>, f: F) -> Self {
        Self {
            name: name.into(),
            f,
        }
    }
}

impl<F> BtNode for Condition<F>
where
    F: FnMut(&TickContext, &Blackboard) -> bool + 'static,
{
    fn tick(&mut self, ctx: &TickContext, blackboard: &mut Blackboard) -> BtStatus {
        if (self.f)(ctx, &*blackboard) {
            BtStatus::Success
        } else {
            BtStatus::Failure
        }
    }

    fn reset(&mut self) {}

    fn kind(&self) -> NodeKind {
        NodeKind::Condition
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn set_name(&mut self, name: String) {
        self.name = name;
    }
}

/// Runs for `duration` of simulation time, then succeeds.
pub struct Wait {
    name: Option<String>,
    duration: Duration,
    started: Option<Duration>,
}

impl Wait {
    pub fn new(duration: Duration) -> Self {
        Self {
            name: None,
            duration,
            started: None,
        }
    }

    pub fn duration(&self) -> Duration {
        self.duration
    }
}

impl BtNode for Wait {
    fn tick(&mut self, ctx: &TickContext, _blackboard: &mut Blackboard) -> BtStatus {
        let Some(started) = self.started else {
            self.started = Some(ctx.now);
            return BtStatus::Running;
        };

        if ctx.elapsed_since(started) >= self.duration {
            self.started = None;
            BtStatus::Success
        } else {
            BtStatus::Running
        }
    }

    fn reset(&mut self) {
        self.started = None;
    }

    fn kind(&self) -> NodeKind {
        NodeKind::Wait
    }

    fn name(&self) -> &str {
        self.name.as_deref().unwrap_or(NodeKind::Wait.as_str())
    }

    fn set_name(&mut self, name: String) {
        self.name = Some(name);
    }
}

/// A leaf that always reports the same status.
pub struct Fixed {
    name: Option<String>,
    status: BtStatus,
}

impl Fixed {
    pub fn new(status: BtStatus) -> Self {
        Self { name: None, status }
    }

    pub fn success() -> Self {
        Self::new(BtStatus::Success)
    }

    pub fn failure() -> Self {
        Self::new(BtStatus::Failure)
    }

    pub fn running() -> Self {
        Self::new(BtStatus::Running)
    }
}

impl BtNode for Fixed {
    fn tick(&mut self, _ctx: &TickContext, _blackboard: &mut Blackboard) -> BtStatus {
        self.status
    }

    fn reset(&mut self) {}

    fn kind(&self) -> NodeKind {
        match self.status {
            BtStatus::Success => NodeKind::Success,
            BtStatus::Failure => NodeKind::Failure,
            BtStatus::Running => NodeKind::Running,
        }
    }

    fn name(&self) -> &str {
        self.name.as_deref().unwrap_or(self.kind().as_str())
    }

    fn set_name(&mut self, name: String) {
        self.name = Some(name);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum LogLevel {
    Trace,
    Debug,
    #[default]
    Info,
    Warn,
    Error,
}

/// Emits `message` through `tracing` and succeeds.
pub struct Log {
    name: Option<String>,
    message: String,
    level: LogLevel,
}

impl Log {
    pub fn new(message: impl Into<String>, level: LogLevel) -> Self {
        Self {
            name: None,
            message: message.into(),
            level,
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn level(&self) -> LogLevel {
        self.level
    }
}

impl BtNode for Log {
    fn tick(&mut self, ctx: &TickContext, _blackboard: &mut Blackboard) -> BtStatus {
        let message = self.message.as_str();
        let tick = ctx.tick;
        match self.level {
            LogLevel::Trace => tracing::trace!(tick, "{message}"),
            LogLevel::Debug => tracing::debug!(tick, "{message}"),
            LogLevel::Info => tracing::info!(tick, "{message}"),
            LogLevel::Warn => tracing::warn!(tick, "{message}"),
            LogLevel::Error => tracing::error!(tick, "{message}"),
        }
        BtStatus::Success
    }

    fn reset(&mut self) {}

    fn kind(&self) -> NodeKind {
        NodeKind::Log
    }

    fn name(&self) -> &str {
        self.name.as_deref().unwrap_or(NodeKind::Log.as_str())
    }

    fn set_name(&mut self, name: String) {
        self.name = Some(name);
    }
}

type ComputeFn<T> = Box<dyn FnMut(&TickContext, &Blackboard) -> T>;

enum ValueSource<T> {
    Value(T),
    Compute(ComputeFn<T>),
}

/// Writes a constant or computed value under `key`, then succeeds.
pub struct SetValue<T> {
    name: Option<String>,
    key: String,
    source: ValueSource<T>,
}

impl<T: Clone + 'static> SetValue<T> {
    pub fn new(key: impl Into<String>, value: T) -> Self {
        Self {
            name: None,
            key: key.into(),
            source: ValueSource::Value(value),
        }
    }

    /// Recomputes the value from the blackboard on every tick.
    pub fn computed(
        key: impl Into<String>,
        f: impl FnMut(&TickContext, &Blackboard) -> T + 'static,
    ) -> Self {
        Self {
            name: None,
            key: key.into(),
            source: ValueSource::Compute(Box::new(f)),
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }
}

impl<T: Clone + 'static> BtNode for SetValue<T> {
    fn tick(&mut self, ctx: &TickContext, blackboard: &mut Blackboard) -> BtStatus {
        let value = match &mut self.source {
            ValueSource::Value(value) => value.clone(),
            ValueSource::Compute(f) => f(ctx, &*blackboard),
        };
        blackboard.set_named(self.key.clone(), value);
        BtStatus::Success
    }

    fn reset(&mut self) {}

    fn kind(&self) -> NodeKind {
        NodeKind::SetValue
    }

    fn name(&self) -> &str {
        self.name.as_deref().unwrap_or(NodeKind::SetValue.as_str())
    }

    fn set_name(&mut self, name: String) {
        self.name = Some(name);
    }
}

/// Removes `key` from the blackboard and succeeds, whether or not the key was present.
pub struct ClearValue {
    name: Option<String>,
    key: String,
}

impl ClearValue {
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            name: None,
            key: key.into(),
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }
}

impl BtNode for ClearValue {
    fn tick(&mut self, _ctx: &TickContext, blackboard: &mut Blackboard) -> BtStatus {
        blackboard.remove_name(&self.key);
        BtStatus::Success
    }

    fn reset(&mut self) {}

    fn kind(&self) -> NodeKind {
        NodeKind::ClearValue
    }

    fn name(&self) -> &str {
        self.name.as_deref().unwrap_or(NodeKind::ClearValue.as_str())
    }

    fn set_name(&mut self, name: String) {
        self.name = Some(name);
    }
}
