use ai_core::{Blackboard, TickContext};

use crate::BuildError;

/// Outcome of one tick. There is deliberately no fourth state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BtStatus {
    Running,
    Success,
    Failure,
}

impl BtStatus {
    pub fn is_running(self) -> bool {
        matches!(self, BtStatus::Running)
    }

    /// `true` for `Success` and `Failure`.
    pub fn is_done(self) -> bool {
        !self.is_running()
    }

    /// Swaps `Success` and `Failure`; `Running` passes through.
    pub fn invert(self) -> Self {
        match self {
            BtStatus::Running => BtStatus::Running,
            BtStatus::Success => BtStatus::Failure,
            BtStatus::Failure => BtStatus::Success,
        }
    }

    /// Stable numeric code used in trace events.
    pub fn code(self) -> u64 {
        match self {
            BtStatus::Running => 0,
            BtStatus::Success => 1,
            BtStatus::Failure => 2,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeCategory {
    Composite,
    Decorator,
    Leaf,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    Sequence,
    Selector,
    Parallel,
    RandomSelector,
    WeightedSelector,
    Inverter,
    Succeeder,
    Failer,
    Repeater,
    Retry,
    Timeout,
    Cooldown,
    Conditional,
    Action,
    Condition,
    Wait,
    Success,
    Failure,
    Running,
    Log,
    SetValue,
    ClearValue,
    Custom,
}

impl NodeKind {
    pub fn as_str(self) -> &'static str {
        match self {
            NodeKind::Sequence => "Sequence",
            NodeKind::Selector => "Selector",
            NodeKind::Parallel => "Parallel",
            NodeKind::RandomSelector => "RandomSelector",
            NodeKind::WeightedSelector => "WeightedSelector",
            NodeKind::Inverter => "Inverter",
            NodeKind::Succeeder => "Succeeder",
            NodeKind::Failer => "Failer",
            NodeKind::Repeater => "Repeater",
            NodeKind::Retry => "Retry",
            NodeKind::Timeout => "Timeout",
            NodeKind::Cooldown => "Cooldown",
            NodeKind::Conditional => "Conditional",
            NodeKind::Action => "Action",
            NodeKind::Condition => "Condition",
            NodeKind::Wait => "Wait",
            NodeKind::Success => "Success",
            NodeKind::Failure => "Failure",
            NodeKind::Running => "Running",
            NodeKind::Log => "Log",
            NodeKind::SetValue => "SetValue",
            NodeKind::ClearValue => "ClearValue",
            NodeKind::Custom => "Custom",
        }
    }

    pub fn category(self) -> NodeCategory {
        match self {
            NodeKind::Sequence
            | NodeKind::Selector
            | NodeKind::Parallel
            | NodeKind::RandomSelector
            | NodeKind::WeightedSelector => NodeCategory::Composite,
            NodeKind::Inverter
            | NodeKind::Succeeder
            | NodeKind::Failer
            | NodeKind::Repeater
            | NodeKind::Retry
            | NodeKind::Timeout
            | NodeKind::Cooldown
            | NodeKind::Conditional => NodeCategory::Decorator,
            _ => NodeCategory::Leaf,
        }
    }
}

/// How many children a node can own. The builder pushes a node onto its open stack only when
/// this is not `None`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChildSlots {
    None,
    One,
    Many,
}

pub trait BtNode: 'static {
    /// Evaluates the node once.
    ///
    /// Returning `Running` means the node expects another tick before it is done. Returning
    /// `Success` or `Failure` should leave the node's own evaluation state reset.
    fn tick(&mut self, ctx: &TickContext, blackboard: &mut Blackboard) -> BtStatus;

    /// Drops evaluation state (cursors, timers, chosen children) for this node and its subtree.
    fn reset(&mut self);

    fn kind(&self) -> NodeKind;

    fn name(&self) -> &str {
        self.kind().as_str()
    }

    fn set_name(&mut self, _name: String) {}

    fn children(&self) -> &[Box<dyn BtNode>] {
        &[]
    }

    fn child_slots(&self) -> ChildSlots {
        ChildSlots::None
    }

    fn attach(&mut self, _child: Box<dyn BtNode>) -> Result<(), BuildError> {
        Err(BuildError::NotAParent {
            node: self.name().to_owned(),
        })
    }

    /// Validates the node once all of its children are attached.
    fn finish(&mut self) -> Result<(), BuildError> {
        Ok(())
    }
}

/// `true` if `node` has room for another child.
pub fn can_attach(node: &dyn BtNode) -> bool {
    match node.child_slots() {
        ChildSlots::None => false,
        ChildSlots::One => node.children().is_empty(),
        ChildSlots::Many => true,
    }
}
