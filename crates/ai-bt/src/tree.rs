use std::fmt::Write as _;

use ai_core::{Blackboard, TickContext};
use ai_tools::{emit as trace_emit, TraceEvent};

use crate::bt::{BtNode, BtStatus};

/// A root node plus the blackboard it reads and writes. The externally ticked unit.
pub struct BehaviorTree {
    root: Box<dyn BtNode>,
    blackboard: Blackboard,
    last: Option<BtStatus>,
    ticks: u64,
    warn_on_failure: bool,
}

impl BehaviorTree {
    pub fn new(root: Box<dyn BtNode>) -> Self {
        Self::with_blackboard(root, Blackboard::new())
    }

    pub fn with_blackboard(root: Box<dyn BtNode>, blackboard: Blackboard) -> Self {
        Self {
            root,
            blackboard,
            last: None,
            ticks: 0,
            warn_on_failure: true,
        }
    }

    /// Controls the diagnostic `warn!` emitted when the root starts failing.
    pub fn set_warn_on_failure(&mut self, enabled: bool) {
        self.warn_on_failure = enabled;
    }

    /// Evaluates the whole tree once.
    pub fn tick(&mut self, ctx: &TickContext) -> BtStatus {
        let status = self.root.tick(ctx, &mut self.blackboard);
        self.ticks += 1;

        trace_emit(
            &mut self.blackboard,
            TraceEvent::new(ctx.tick, "bt.tree.tick").with_a(status.code()),
        );
        tracing::debug!(tick = ctx.tick, root = self.root.name(), ?status, "tree ticked");

        if status == BtStatus::Failure
            && self.last != Some(BtStatus::Failure)
            && self.warn_on_failure
        {
            tracing::warn!(tick = ctx.tick, root = self.root.name(), "tree root failed");
        }

        self.last = Some(status);
        status
    }

    /// Status of the most recent tick; `None` before the first one.
    pub fn last_status(&self) -> Option<BtStatus> {
        self.last
    }

    pub fn tick_count(&self) -> u64 {
        self.ticks
    }

    pub fn blackboard(&self) -> &Blackboard {
        &self.blackboard
    }

    pub fn blackboard_mut(&mut self) -> &mut Blackboard {
        &mut self.blackboard
    }

    /// Resets every node's evaluation state. Blackboard contents are kept.
    pub fn reset(&mut self) {
        self.root.reset();
        self.last = None;
    }

    pub fn root(&self) -> &dyn BtNode {
        self.root.as_ref()
    }

    /// Indented outline of the tree, one node per line.
    ///
    /// ```text
    /// Sequence
    ///   Condition(has_target)
    ///   Action(attack)
    /// ```
    pub fn describe(&self) -> String {
        let mut out = String::new();
        describe_node(self.root.as_ref(), 0, &mut out);
        out
    }
}

fn describe_node(node: &dyn BtNode, depth: usize, out: &mut String) {
    let kind = node.kind().as_str();
    let name = node.name();
    let _ = if name == kind {
        writeln!(out, "{:indent$}{kind}", "", indent = depth * 2)
    } else {
        writeln!(out, "{:indent$}{kind}({name})", "", indent = depth * 2)
    };
    for child in node.children() {
        describe_node(child.as_ref(), depth + 1, out);
    }
}

impl std::fmt::Debug for BehaviorTree {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BehaviorTree")
            .field("root", &self.root.name())
            .field("last", &self.last)
            .field("ticks", &self.ticks)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::nodes::{Fixed, Sequence};
    use crate::BtNode;

    #[test]
    fn describe_indents_children() {
        let mut root = Sequence::new(vec![Box::new(Fixed::success()), Box::new(Fixed::failure())]);
        root.set_name("combo".to_owned());
        let tree = BehaviorTree::new(Box::new(root));

        assert_eq!(tree.describe(), "Sequence(combo)\n  Success\n  Failure\n");
    }

    #[test]
    fn last_status_tracks_ticks() {
        let mut tree = BehaviorTree::new(Box::new(Fixed::running()));
        assert_eq!(tree.last_status(), None);

        tree.tick(&TickContext::at(0));
        tree.tick(&TickContext::at(16));

        assert_eq!(tree.last_status(), Some(BtStatus::Running));
        assert_eq!(tree.tick_count(), 2);

        tree.reset();
        assert_eq!(tree.last_status(), None);
    }
}
