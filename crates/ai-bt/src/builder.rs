use std::time::Duration;

use ai_core::{rng, Blackboard, TickContext};

use crate::bt::{can_attach, BtNode, BtStatus, ChildSlots};
use crate::nodes::{
    Action, ClearValue, Condition, Conditional, Cooldown, Failer, Fixed, Inverter, Log, LogLevel,
    Parallel, ParallelPolicy, RandomSelector, Repeater, Retry, Selector, Sequence, SetValue,
    Succeeder, Timeout, Wait, WeightedSelector,
};
use crate::{BehaviorTree, BuildError};

/// Stack-based assembler for behavior trees.
///
/// Composite and decorator calls open a node; leaf calls attach to the innermost open node;
/// [`TreeBuilder::end`] closes the innermost open node and attaches it to its parent (or makes it
/// the root). The first construction error is remembered and returned by
/// [`TreeBuilder::build`]; later calls are ignored once an error is recorded.
///
/// An opened node joins its parent when it is closed rather than when it is opened. The parent's
/// capacity is still checked at open time, and [`TreeBuilder::build`] closes anything left open,
/// so the finished tree and the reported errors are the same as attaching on open.
///
/// Random composites get consecutive streams from the builder. Trees built by separate builders
/// draw the same values for the same seed unless they are given distinct salts with
/// [`TreeBuilder::with_salt`].
///
/// ```
/// use ai_bt::{BtStatus, TreeBuilder};
///
/// let tree = TreeBuilder::new()
///     .sequence()
///         .condition("has_target", |_, _| true)
///         .action("attack", |_, _| BtStatus::Success)
///     .end()
///     .build()
///     .unwrap();
/// assert_eq!(tree.root().children().len(), 2);
/// ```
#[derive(Default)]
pub struct TreeBuilder {
    open: Vec<Box<dyn BtNode>>,
    // Most recent leaf, held back so `name()` can still reach it.
    staged: Option<Box<dyn BtNode>>,
    root: Option<Box<dyn BtNode>>,
    error: Option<BuildError>,
    salt: u64,
    next_stream: u64,
}

impl TreeBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder whose random composites draw from streams derived from `salt`.
    pub fn with_salt(salt: u64) -> Self {
        Self {
            salt,
            ..Self::default()
        }
    }

    /// Number of composites and decorators currently open.
    pub fn depth(&self) -> usize {
        self.open.len()
    }

    /// Adds any node. Nodes that can own children are opened; leaves are attached immediately.
    pub fn node(&mut self, node: Box<dyn BtNode>) -> &mut Self {
        if self.error.is_some() {
            return self;
        }

        self.flush();
        if self.error.is_some() {
            return self;
        }
        if node.child_slots() == ChildSlots::None {
            self.staged = Some(node);
            return self;
        }

        if let Some(top) = self.open.last() {
            if !can_attach(top.as_ref()) {
                let err = occupied(top.as_ref());
                self.fail(err);
                return self;
            }
        } else if let Some(root) = &self.root {
            let err = BuildError::MultipleRoots {
                existing: root.name().to_owned(),
            };
            self.fail(err);
            return self;
        }

        self.open.push(node);
        self
    }

    /// Closes the innermost open composite or decorator.
    pub fn end(&mut self) -> &mut Self {
        if self.error.is_some() {
            return self;
        }

        self.flush();
        match self.open.pop() {
            Some(mut node) => match node.finish() {
                Ok(()) => self.place(node),
                Err(err) => self.fail(err),
            },
            None => self.fail(BuildError::UnbalancedEnd),
        }
        self
    }

    /// Renames the most recently declared leaf, or else the innermost open node.
    pub fn name(&mut self, name: impl Into<String>) -> &mut Self {
        let name = name.into();
        if let Some(leaf) = self.staged.as_mut() {
            leaf.set_name(name);
        } else if let Some(top) = self.open.last_mut() {
            top.set_name(name);
        } else if let Some(root) = self.root.as_mut() {
            root.set_name(name);
        }
        self
    }

    /// Closes anything still open and returns the tree. The builder is empty afterwards and can
    /// be reused.
    ///
    /// # Errors
    ///
    /// Returns the first construction error recorded, or [`BuildError::NoRoot`] when nothing
    /// was declared.
    pub fn build(&mut self) -> Result<BehaviorTree, BuildError> {
        self.flush();
        while self.error.is_none() && !self.open.is_empty() {
            self.end();
        }

        let error = self.error.take();
        let root = self.root.take();
        self.open.clear();
        self.staged = None;

        if let Some(err) = error {
            return Err(err);
        }
        root.map(BehaviorTree::new).ok_or(BuildError::NoRoot)
    }

    pub fn sequence(&mut self) -> &mut Self {
        self.node(Box::new(Sequence::new(Vec::new())))
    }

    pub fn selector(&mut self) -> &mut Self {
        self.node(Box::new(Selector::new(Vec::new())))
    }

    pub fn parallel(&mut self, policy: ParallelPolicy) -> &mut Self {
        self.node(Box::new(Parallel::new(policy, Vec::new())))
    }

    pub fn random_selector(&mut self) -> &mut Self {
        let stream = self.stream();
        self.node(Box::new(RandomSelector::new(Vec::new()).with_stream(stream)))
    }

    /// Weights are checked against the children when the selector is closed.
    pub fn weighted_selector(&mut self, weights: impl Into<Vec<f32>>) -> &mut Self {
        let stream = self.stream();
        self.node(Box::new(
            WeightedSelector::with_pending_weights(weights.into()).with_stream(stream),
        ))
    }

    pub fn inverter(&mut self) -> &mut Self {
        self.node(Box::new(Inverter::new()))
    }

    pub fn succeeder(&mut self) -> &mut Self {
        self.node(Box::new(Succeeder::new()))
    }

    pub fn failer(&mut self) -> &mut Self {
        self.node(Box::new(Failer::new()))
    }

    /// A negative `count` repeats forever.
    pub fn repeater(&mut self, count: i32) -> &mut Self {
        self.node(Box::new(Repeater::new(count)))
    }

    pub fn retry(&mut self, max_attempts: u32) -> &mut Self {
        self.node(Box::new(Retry::new(max_attempts)))
    }

    pub fn timeout(&mut self, limit: Duration) -> &mut Self {
        self.node(Box::new(Timeout::new(limit)))
    }

    pub fn cooldown(&mut self, duration: Duration) -> &mut Self {
        self.node(Box::new(Cooldown::new(duration)))
    }

    pub fn conditional(
        &mut self,
        name: impl Into<String>,
        guard: impl FnMut(&TickContext, &Blackboard) -> bool + 'static,
    ) -> &mut Self {
        self.node(Box::new(Conditional::new(name, guard)))
    }

    pub fn action(
        &mut self,
        name: impl Into<String>,
        f: impl FnMut(&TickContext, &mut Blackboard) -> BtStatus + 'static,
    ) -> &mut Self {
        self.node(Box::new(Action::new(name, f)))
    }

    pub fn condition(
        &mut self,
        name: impl Into<String>,
        f: impl FnMut(&TickContext, &Blackboard) -> bool + 'static,
    ) -> &mut Self {
        self.node(Box::new(Condition::new(name, f)))
    }

    pub fn wait(&mut self, duration: Duration) -> &mut Self {
        self.node(Box::new(Wait::new(duration)))
    }

    pub fn success(&mut self) -> &mut Self {
        self.node(Box::new(Fixed::success()))
    }

    pub fn failure(&mut self) -> &mut Self {
        self.node(Box::new(Fixed::failure()))
    }

    pub fn running(&mut self) -> &mut Self {
        self.node(Box::new(Fixed::running()))
    }

    pub fn log(&mut self, message: impl Into<String>, level: LogLevel) -> &mut Self {
        self.node(Box::new(Log::new(message, level)))
    }

    pub fn set_value<T: Clone + 'static>(&mut self, key: impl Into<String>, value: T) -> &mut Self {
        self.node(Box::new(SetValue::new(key, value)))
    }

    pub fn set_value_with<T: Clone + 'static>(
        &mut self,
        key: impl Into<String>,
        f: impl FnMut(&TickContext, &Blackboard) -> T + 'static,
    ) -> &mut Self {
        self.node(Box::new(SetValue::computed(key, f)))
    }

    pub fn clear_value(&mut self, key: impl Into<String>) -> &mut Self {
        self.node(Box::new(ClearValue::new(key)))
    }

    fn flush(&mut self) {
        if let Some(leaf) = self.staged.take() {
            if self.error.is_none() {
                self.place(leaf);
            }
        }
    }

    /// Attaches a finished node to the innermost open node, or makes it the root.
    fn place(&mut self, node: Box<dyn BtNode>) {
        if let Some(top) = self.open.last_mut() {
            if !can_attach(top.as_ref()) {
                let err = occupied(top.as_ref());
                self.fail(err);
                return;
            }
            if let Err(err) = top.attach(node) {
                self.fail(err);
            }
            return;
        }

        match &self.root {
            Some(root) => {
                let err = BuildError::MultipleRoots {
                    existing: root.name().to_owned(),
                };
                self.fail(err);
            }
            None => self.root = Some(node),
        }
    }

    fn fail(&mut self, err: BuildError) {
        tracing::debug!(error = %err, "tree construction failed");
        self.error.get_or_insert(err);
    }

    // Not rewound by `build`, so a reused builder never repeats a stream.
    fn stream(&mut self) -> u64 {
        self.next_stream += 1;
        rng::derive_seed(self.salt, 0, self.next_stream)
    }
}

fn occupied(node: &dyn BtNode) -> BuildError {
    match node.child_slots() {
        ChildSlots::None => BuildError::NotAParent {
            node: node.name().to_owned(),
        },
        ChildSlots::One | ChildSlots::Many => BuildError::DecoratorOccupied {
            decorator: node.name().to_owned(),
        },
    }
}
