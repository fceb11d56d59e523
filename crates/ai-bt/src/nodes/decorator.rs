//! Single-child wrappers that reshape their child's result or gate when it runs.

use std::time::Duration;

use ai_core::{Blackboard, TickContext};

use crate::bt::{BtNode, BtStatus, ChildSlots, NodeKind};
use crate::BuildError;

/// Name, child storage and attachment are identical for every decorator.
macro_rules! decorator_plumbing {
    ($kind:expr) => {
        fn kind(&self) -> NodeKind {
            $kind
        }

        fn name(&self) -> &str {
            self.name.as_deref().unwrap_or($kind.as_str())
        }

        fn set_name(&mut self, name: String) {
            self.name = Some(name);
        }

        fn children(&self) -> &[Box<dyn BtNode>] {
            self.child.as_slice()
        }

        fn child_slots(&self) -> ChildSlots {
            ChildSlots::One
        }

        fn attach(&mut self, child: Box<dyn BtNode>) -> Result<(), BuildError> {
            if self.child.is_some() {
                return Err(BuildError::DecoratorOccupied {
                    decorator: self.name().to_owned(),
                });
            }
            self.child = Some(child);
            Ok(())
        }
    };
}

fn reset_child(child: &mut Option<Box<dyn BtNode>>) {
    if let Some(child) = child.as_mut() {
        child.reset();
    }
}

/// Swaps the child's `Success` and `Failure`.
#[derive(Default)]
pub struct Inverter {
    name: Option<String>,
    child: Option<Box<dyn BtNode>>,
}

impl Inverter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn wrap(child: Box<dyn BtNode>) -> Self {
        Self {
            name: None,
            child: Some(child),
        }
    }
}

impl BtNode for Inverter {
    fn tick(&mut self, ctx: &TickContext, blackboard: &mut Blackboard) -> BtStatus {
        match self.child.as_mut() {
            Some(child) => child.tick(ctx, blackboard).invert(),
            None => BtStatus::Failure,
        }
    }

    fn reset(&mut self) {
        reset_child(&mut self.child);
    }

    decorator_plumbing!(NodeKind::Inverter);
}

/// Ticks the child and reports `Success` regardless of what it returned.
///
/// A running child is left running, so it resumes on the next tick instead of restarting.
#[derive(Default)]
pub struct Succeeder {
    name: Option<String>,
    child: Option<Box<dyn BtNode>>,
}

impl Succeeder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn wrap(child: Box<dyn BtNode>) -> Self {
        Self {
            name: None,
            child: Some(child),
        }
    }
}

impl BtNode for Succeeder {
    fn tick(&mut self, ctx: &TickContext, blackboard: &mut Blackboard) -> BtStatus {
        if let Some(child) = self.child.as_mut() {
            child.tick(ctx, blackboard);
        }
        BtStatus::Success
    }

    fn reset(&mut self) {
        reset_child(&mut self.child);
    }

    decorator_plumbing!(NodeKind::Succeeder);
}

/// Ticks the child and reports `Failure` regardless of what it returned.
#[derive(Default)]
pub struct Failer {
    name: Option<String>,
    child: Option<Box<dyn BtNode>>,
}

impl Failer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn wrap(child: Box<dyn BtNode>) -> Self {
        Self {
            name: None,
            child: Some(child),
        }
    }
}

impl BtNode for Failer {
    fn tick(&mut self, ctx: &TickContext, blackboard: &mut Blackboard) -> BtStatus {
        if let Some(child) = self.child.as_mut() {
            child.tick(ctx, blackboard);
        }
        BtStatus::Failure
    }

    fn reset(&mut self) {
        reset_child(&mut self.child);
    }

    decorator_plumbing!(NodeKind::Failer);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RepeatCount {
    Times(u32),
    Forever,
}

/// Re-runs its child a fixed number of completions, or forever.
///
/// A finite repeater keeps ticking completed iterations within one tick and reports `Success`
/// after the last one. An infinite repeater yields `Running` after every completed iteration so a
/// child that finishes instantly cannot spin the caller.
pub struct Repeater {
    name: Option<String>,
    child: Option<Box<dyn BtNode>>,
    repeat: RepeatCount,
    completed: u32,
}

impl Repeater {
    /// A negative `count` repeats forever.
    pub fn new(count: i32) -> Self {
        let repeat = u32::try_from(count).map_or(RepeatCount::Forever, RepeatCount::Times);
        Self {
            name: None,
            child: None,
            repeat,
            completed: 0,
        }
    }

    pub fn forever() -> Self {
        Self::new(-1)
    }

    pub fn with_child(mut self, child: Box<dyn BtNode>) -> Self {
        self.child = Some(child);
        self
    }

    pub fn repeat(&self) -> RepeatCount {
        self.repeat
    }

    /// Completed iterations in the current run.
    pub fn count(&self) -> u32 {
        self.completed
    }
}

impl BtNode for Repeater {
    fn tick(&mut self, ctx: &TickContext, blackboard: &mut Blackboard) -> BtStatus {
        let Some(child) = self.child.as_mut() else {
            return BtStatus::Failure;
        };

        match self.repeat {
            RepeatCount::Forever => {
                if child.tick(ctx, blackboard).is_done() {
                    self.completed = self.completed.saturating_add(1);
                    child.reset();
                }
                BtStatus::Running
            }
            RepeatCount::Times(times) => {
                while self.completed < times {
                    if child.tick(ctx, blackboard).is_running() {
                        return BtStatus::Running;
                    }
                    self.completed += 1;
                    child.reset();
                }
                self.completed = 0;
                BtStatus::Success
            }
        }
    }

    fn reset(&mut self) {
        self.completed = 0;
        reset_child(&mut self.child);
    }

    decorator_plumbing!(NodeKind::Repeater);
}

/// Re-runs a failing child up to `max_attempts` times in total.
pub struct Retry {
    name: Option<String>,
    child: Option<Box<dyn BtNode>>,
    max_attempts: u32,
    attempts: u32,
}

impl Retry {
    /// `max_attempts` of zero is treated as one.
    pub fn new(max_attempts: u32) -> Self {
        Self {
            name: None,
            child: None,
            max_attempts: max_attempts.max(1),
            attempts: 0,
        }
    }

    pub fn with_child(mut self, child: Box<dyn BtNode>) -> Self {
        self.child = Some(child);
        self
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Failed attempts in the current run.
    pub fn attempts(&self) -> u32 {
        self.attempts
    }
}

impl BtNode for Retry {
    fn tick(&mut self, ctx: &TickContext, blackboard: &mut Blackboard) -> BtStatus {
        let Some(child) = self.child.as_mut() else {
            return BtStatus::Failure;
        };

        loop {
            match child.tick(ctx, blackboard) {
                BtStatus::Running => return BtStatus::Running,
                BtStatus::Success => {
                    self.attempts = 0;
                    child.reset();
                    return BtStatus::Success;
                }
                BtStatus::Failure => {
                    self.attempts += 1;
                    child.reset();
                    if self.attempts >= self.max_attempts {
                        self.attempts = 0;
                        return BtStatus::Failure;
                    }
                }
            }
        }
    }

    fn reset(&mut self) {
        self.attempts = 0;
        reset_child(&mut self.child);
    }

    decorator_plumbing!(NodeKind::Retry);
}

/// Fails a child that keeps running longer than `limit` of simulation time.
///
/// The clock starts on the first tick of a run. Expiry is checked before the child is ticked, so
/// a child gets no further tick once the limit has passed.
pub struct Timeout {
    name: Option<String>,
    child: Option<Box<dyn BtNode>>,
    limit: Duration,
    started: Option<Duration>,
}

impl Timeout {
    pub fn new(limit: Duration) -> Self {
        Self {
            name: None,
            child: None,
            limit,
            started: None,
        }
    }

    pub fn with_child(mut self, child: Box<dyn BtNode>) -> Self {
        self.child = Some(child);
        self
    }

    pub fn limit(&self) -> Duration {
        self.limit
    }
}

impl BtNode for Timeout {
    fn tick(&mut self, ctx: &TickContext, blackboard: &mut Blackboard) -> BtStatus {
        if self.child.is_none() {
            return BtStatus::Failure;
        }

        let started = *self.started.get_or_insert(ctx.now);
        if ctx.elapsed_since(started) > self.limit {
            tracing::debug!(
                node = self.name(),
                limit_ms = self.limit.as_millis() as u64,
                "child timed out"
            );
            self.reset();
            return BtStatus::Failure;
        }

        let status = match self.child.as_mut() {
            Some(child) => child.tick(ctx, blackboard),
            None => BtStatus::Failure,
        };
        if status.is_done() {
            self.started = None;
        }
        status
    }

    fn reset(&mut self) {
        self.started = None;
        reset_child(&mut self.child);
    }

    decorator_plumbing!(NodeKind::Timeout);
}

/// Blocks its child for `duration` after the child last finished.
///
/// While cooling down the node fails without ticking the child. The completion stamp survives
/// [`BtNode::reset`]; only [`Cooldown::clear`] forgets it.
pub struct Cooldown {
    name: Option<String>,
    child: Option<Box<dyn BtNode>>,
    duration: Duration,
    last_completed: Option<Duration>,
}

impl Cooldown {
    pub fn new(duration: Duration) -> Self {
        Self {
            name: None,
            child: None,
            duration,
            last_completed: None,
        }
    }

    pub fn with_child(mut self, child: Box<dyn BtNode>) -> Self {
        self.child = Some(child);
        self
    }

    pub fn duration(&self) -> Duration {
        self.duration
    }

    pub fn is_cooling_down(&self, now: Duration) -> bool {
        self.last_completed
            .is_some_and(|at| now.saturating_sub(at) < self.duration)
    }

    pub fn clear(&mut self) {
        self.last_completed = None;
    }
}

impl BtNode for Cooldown {
    fn tick(&mut self, ctx: &TickContext, blackboard: &mut Blackboard) -> BtStatus {
        let Some(child) = self.child.as_mut() else {
            return BtStatus::Failure;
        };

        if let Some(at) = self.last_completed {
            if ctx.elapsed_since(at) < self.duration {
                return BtStatus::Failure;
            }
        }

        let status = child.tick(ctx, blackboard);
        if status.is_done() {
            self.last_completed = Some(ctx.now);
        }
        status
    }

    fn reset(&mut self) {
        reset_child(&mut self.child);
    }

    decorator_plumbing!(NodeKind::Cooldown);
}

type GuardFn = Box<dyn FnMut(&TickContext, &Blackboard) -> bool>;

/// Runs the child only while `guard` holds; a false guard aborts a running child.
pub struct Conditional {
    name: Option<String>,
    child: Option<Box<dyn BtNode>>,
    guard: GuardFn,
}

impl Conditional {
    pub fn new(
        name: impl Into<String>,
        guard: impl FnMut(&TickContext, &Blackboard) -> bool + 'static,
    ) -> Self {
        Self {
            name: Some(name.into()),
            child: None,
            guard: Box::new(guard),
        }
    }

    pub fn with_child(mut self, child: Box<dyn BtNode>) -> Self {
        self.child = Some(child);
        self
    }
}

impl BtNode for Conditional {
    fn tick(&mut self, ctx: &TickContext, blackboard: &mut Blackboard) -> BtStatus {
        let Some(child) = self.child.as_mut() else {
            return BtStatus::Failure;
        };

        if !(self.guard)(ctx, &*blackboard) {
            child.reset();
            return BtStatus::Failure;
        }

        child.tick(ctx, blackboard)
    }

    fn reset(&mut self) {
        reset_child(&mut self.child);
    }

    decorator_plumbing!(NodeKind::Conditional);
}
