//! Nodes that combine several children under a policy.

use ai_core::{Blackboard, DeterministicRng, TickContext};

use crate::bt::{BtNode, BtStatus, ChildSlots, NodeKind};
use crate::BuildError;

fn reset_all(children: &mut [Box<dyn BtNode>]) {
    for c in children.iter_mut() {
        c.reset();
    }
}

/// Runs children in order; fails on the first failure. Resumes a running child on the next tick.
pub struct Sequence {
    name: Option<String>,
    children: Vec<Box<dyn BtNode>>,
    index: usize,
}

impl Sequence {
    pub fn new(children: Vec<Box<dyn BtNode>>) -> Self {
        Self {
            name: None,
            children,
            index: 0,
        }
    }

    /// Index of the child that will be ticked next.
    pub fn cursor(&self) -> usize {
        self.index
    }
}

impl BtNode for Sequence {
    fn tick(&mut self, ctx: &TickContext, blackboard: &mut Blackboard) -> BtStatus {
        while self.index < self.children.len() {
            match self.children[self.index].tick(ctx, blackboard) {
                BtStatus::Running => return BtStatus::Running,
                BtStatus::Failure => {
                    self.reset();
                    return BtStatus::Failure;
                }
                BtStatus::Success => self.index += 1,
            }
        }

        self.reset();
        BtStatus::Success
    }

    fn reset(&mut self) {
        self.index = 0;
        reset_all(&mut self.children);
    }

    fn kind(&self) -> NodeKind {
        NodeKind::Sequence
    }

    fn name(&self) -> &str {
        self.name.as_deref().unwrap_or(NodeKind::Sequence.as_str())
    }

    fn set_name(&mut self, name: String) {
        self.name = Some(name);
    }

    fn children(&self) -> &[Box<dyn BtNode>] {
        &self.children
    }

    fn child_slots(&self) -> ChildSlots {
        ChildSlots::Many
    }

    fn attach(&mut self, child: Box<dyn BtNode>) -> Result<(), BuildError> {
        self.children.push(child);
        Ok(())
    }
}

/// Tries children in order; succeeds on the first success. Resumes a running child on the next
/// tick.
pub struct Selector {
    name: Option<String>,
    children: Vec<Box<dyn BtNode>>,
    index: usize,
}

impl Selector {
    pub fn new(children: Vec<Box<dyn BtNode>>) -> Self {
        Self {
            name: None,
            children,
            index: 0,
        }
    }

    pub fn cursor(&self) -> usize {
        self.index
    }
}

impl BtNode for Selector {
    fn tick(&mut self, ctx: &TickContext, blackboard: &mut Blackboard) -> BtStatus {
        while self.index < self.children.len() {
            match self.children[self.index].tick(ctx, blackboard) {
                BtStatus::Running => return BtStatus::Running,
                BtStatus::Success => {
                    self.reset();
                    return BtStatus::Success;
                }
                BtStatus::Failure => self.index += 1,
            }
        }

        self.reset();
        BtStatus::Failure
    }

    fn reset(&mut self) {
        self.index = 0;
        reset_all(&mut self.children);
    }

    fn kind(&self) -> NodeKind {
        NodeKind::Selector
    }

    fn name(&self) -> &str {
        self.name.as_deref().unwrap_or(NodeKind::Selector.as_str())
    }

    fn set_name(&mut self, name: String) {
        self.name = Some(name);
    }

    fn children(&self) -> &[Box<dyn BtNode>] {
        &self.children
    }

    fn child_slots(&self) -> ChildSlots {
        ChildSlots::Many
    }

    fn attach(&mut self, child: Box<dyn BtNode>) -> Result<(), BuildError> {
        self.children.push(child);
        Ok(())
    }
}

/// How many children of a [`Parallel`] must succeed in the same tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ParallelPolicy {
    RequireOne,
    #[default]
    RequireAll,
    RequireMajority,
}

impl ParallelPolicy {
    pub fn required(self, children: usize) -> usize {
        match self {
            ParallelPolicy::RequireOne => 1,
            ParallelPolicy::RequireAll => children,
            ParallelPolicy::RequireMajority => children.div_ceil(2),
        }
    }
}

/// Ticks every child every tick and counts outcomes.
///
/// Succeeds once `required` children succeed; fails once success is no longer reachable, i.e.
/// failures exceed `children - required`. Children are reset whenever the parallel concludes.
pub struct Parallel {
    name: Option<String>,
    children: Vec<Box<dyn BtNode>>,
    policy: ParallelPolicy,
}

impl Parallel {
    pub fn new(policy: ParallelPolicy, children: Vec<Box<dyn BtNode>>) -> Self {
        Self {
            name: None,
            children,
            policy,
        }
    }

    pub fn policy(&self) -> ParallelPolicy {
        self.policy
    }
}

impl BtNode for Parallel {
    fn tick(&mut self, ctx: &TickContext, blackboard: &mut Blackboard) -> BtStatus {
        let total = self.children.len();
        let required = self.policy.required(total);

        let mut successes = 0usize;
        let mut failures = 0usize;
        for child in self.children.iter_mut() {
            match child.tick(ctx, blackboard) {
                BtStatus::Success => successes += 1,
                BtStatus::Failure => failures += 1,
                BtStatus::Running => {}
            }
        }

        // Signed: RequireOne over zero children can never succeed.
        let allowed_failures = total as i64 - required as i64;

        if successes >= required {
            self.reset();
            BtStatus::Success
        } else if failures as i64 > allowed_failures {
            self.reset();
            BtStatus::Failure
        } else {
            BtStatus::Running
        }
    }

    fn reset(&mut self) {
        reset_all(&mut self.children);
    }

    fn kind(&self) -> NodeKind {
        NodeKind::Parallel
    }

    fn name(&self) -> &str {
        self.name.as_deref().unwrap_or(NodeKind::Parallel.as_str())
    }

    fn set_name(&mut self, name: String) {
        self.name = Some(name);
    }

    fn children(&self) -> &[Box<dyn BtNode>] {
        &self.children
    }

    fn child_slots(&self) -> ChildSlots {
        ChildSlots::Many
    }

    fn attach(&mut self, child: Box<dyn BtNode>) -> Result<(), BuildError> {
        self.children.push(child);
        Ok(())
    }
}

/// Commits to one uniformly chosen child until that child finishes.
///
/// Draws come from [`TickContext::rng_draw`] on `stream`, keyed by how many fresh choices the node
/// has made. The same seed and tick sequence replay the same choices, while repeated choices
/// within one tick stay independent. Give sibling random nodes distinct streams.
pub struct RandomSelector {
    name: Option<String>,
    children: Vec<Box<dyn BtNode>>,
    stream: u64,
    // Fresh choices made so far. Survives `reset`.
    draws: u64,
    chosen: Option<usize>,
}

impl RandomSelector {
    pub fn new(children: Vec<Box<dyn BtNode>>) -> Self {
        Self {
            name: None,
            children,
            stream: 0,
            draws: 0,
            chosen: None,
        }
    }

    pub fn with_stream(mut self, stream: u64) -> Self {
        self.stream = stream;
        self
    }

    pub fn chosen(&self) -> Option<usize> {
        self.chosen
    }
}

impl BtNode for RandomSelector {
    fn tick(&mut self, ctx: &TickContext, blackboard: &mut Blackboard) -> BtStatus {
        if self.children.is_empty() {
            return BtStatus::Failure;
        }

        let index = match self.chosen {
            Some(index) => index,
            None => {
                let index = ctx
                    .rng_draw(self.stream, self.draws)
                    .next_index(self.children.len());
                self.draws = self.draws.wrapping_add(1);
                self.chosen = Some(index);
                index
            }
        };

        let status = self.children[index].tick(ctx, blackboard);
        if status.is_done() {
            self.chosen = None;
        }
        status
    }

    fn reset(&mut self) {
        self.chosen = None;
        reset_all(&mut self.children);
    }

    fn kind(&self) -> NodeKind {
        NodeKind::RandomSelector
    }

    fn name(&self) -> &str {
        self.name
            .as_deref()
            .unwrap_or(NodeKind::RandomSelector.as_str())
    }

    fn set_name(&mut self, name: String) {
        self.name = Some(name);
    }

    fn children(&self) -> &[Box<dyn BtNode>] {
        &self.children
    }

    fn child_slots(&self) -> ChildSlots {
        ChildSlots::Many
    }

    fn attach(&mut self, child: Box<dyn BtNode>) -> Result<(), BuildError> {
        self.children.push(child);
        Ok(())
    }
}

/// Like [`RandomSelector`], but the one-time choice is proportional to per-child weights.
///
/// Without weights (or with an all-zero weight vector) the choice is uniform.
pub struct WeightedSelector {
    name: Option<String>,
    children: Vec<Box<dyn BtNode>>,
    weights: Option<Vec<f32>>,
    stream: u64,
    draws: u64,
    chosen: Option<usize>,
}

impl WeightedSelector {
    pub fn new(children: Vec<Box<dyn BtNode>>) -> Self {
        Self {
            name: None,
            children,
            weights: None,
            stream: 0,
            draws: 0,
            chosen: None,
        }
    }

    /// Sets one weight per child.
    ///
    /// # Errors
    ///
    /// Fails if the weight count differs from the child count, or a weight is negative or not
    /// finite.
    pub fn with_weights(mut self, weights: Vec<f32>) -> Result<Self, BuildError> {
        self.weights = Some(weights);
        self.finish()?;
        Ok(self)
    }

    /// Weights validated later by [`BtNode::finish`], once the builder has attached children.
    pub(crate) fn with_pending_weights(weights: Vec<f32>) -> Self {
        let mut node = Self::new(Vec::new());
        node.weights = Some(weights);
        node
    }

    pub fn with_stream(mut self, stream: u64) -> Self {
        self.stream = stream;
        self
    }

    pub fn weights(&self) -> Option<&[f32]> {
        self.weights.as_deref()
    }

    pub fn chosen(&self) -> Option<usize> {
        self.chosen
    }

    fn choose(&self, ctx: &TickContext) -> usize {
        let len = self.children.len();
        let mut rng = ctx.rng_draw(self.stream, self.draws);

        if let Some(weights) = self.weights.as_deref().filter(|w| w.len() == len) {
            let total: f32 = weights.iter().sum();
            if total > 0.0 {
                let mut draw = rng.next_f32_unit() * total;
                for (i, weight) in weights.iter().enumerate() {
                    if draw < *weight {
                        return i;
                    }
                    draw -= weight;
                }
                // Rounding left the draw past the end: take the last weighted child.
                return weights.iter().rposition(|w| *w > 0.0).unwrap_or(len - 1);
            }
        }

        rng.next_index(len)
    }
}

impl BtNode for WeightedSelector {
    fn tick(&mut self, ctx: &TickContext, blackboard: &mut Blackboard) -> BtStatus {
        if self.children.is_empty() {
            return BtStatus::Failure;
        }

        let index = match self.chosen {
            Some(index) => index,
            None => {
                let index = self.choose(ctx);
                self.draws = self.draws.wrapping_add(1);
                self.chosen = Some(index);
                index
            }
        };

        let status = self.children[index].tick(ctx, blackboard);
        if status.is_done() {
            self.chosen = None;
        }
        status
    }

    fn reset(&mut self) {
        self.chosen = None;
        reset_all(&mut self.children);
    }

    fn kind(&self) -> NodeKind {
        NodeKind::WeightedSelector
    }

    fn name(&self) -> &str {
        self.name
            .as_deref()
            .unwrap_or(NodeKind::WeightedSelector.as_str())
    }

    fn set_name(&mut self, name: String) {
        self.name = Some(name);
    }

    fn children(&self) -> &[Box<dyn BtNode>] {
        &self.children
    }

    fn child_slots(&self) -> ChildSlots {
        ChildSlots::Many
    }

    fn attach(&mut self, child: Box<dyn BtNode>) -> Result<(), BuildError> {
        self.children.push(child);
        Ok(())
    }

    fn finish(&mut self) -> Result<(), BuildError> {
        let Some(weights) = self.weights.as_deref() else {
            return Ok(());
        };

        if weights.len() != self.children.len() {
            return Err(BuildError::WeightCountMismatch {
                node: self.name().to_owned(),
                weights: weights.len(),
                children: self.children.len(),
            });
        }

        if let Some((index, weight)) = weights
            .iter()
            .enumerate()
            .find(|(_, w)| !w.is_finite() || **w < 0.0)
        {
            return Err(BuildError::InvalidWeight {
                node: self.name().to_owned(),
                index,
                weight: *weight,
            });
        }

        Ok(())
    }
}
