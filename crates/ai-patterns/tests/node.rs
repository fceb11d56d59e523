use std::cell::Cell;
use std::rc::Rc;
use std::time::Duration;

use ai_bt::{BehaviorTree, BtNode, BtStatus, TreeBuilder};
use ai_core::TickContext;
use ai_patterns::{AttackPattern, AttackPatternManager, AttackPatternNode};
use ai_tools::{TraceLog, TRACE_LOG};

/// Wind-up, strike, recovery: three ticks of `Running`/`Success` choreography.
fn combo(strikes: &Rc<Cell<u32>>) -> BehaviorTree {
    let strikes = Rc::clone(strikes);
    TreeBuilder::new()
        .sequence()
        .wait(Duration::from_millis(100))
        .action("strike", move |_, _| {
            strikes.set(strikes.get() + 1);
            BtStatus::Success
        })
        .wait(Duration::from_millis(100))
        .end()
        .build()
        .expect("tree")
}

#[test]
fn running_pattern_is_resumed_without_reselection() {
    let strikes = Rc::new(Cell::new(0));
    let mut manager = AttackPatternManager::new();
    manager
        .register(
            "brute",
            AttackPattern::new("combo", combo(&strikes))
                .with_priority(9)
                .with_cooldown(Duration::from_millis(50)),
        )
        .expect("unique pattern name")
        .register(
            "brute",
            AttackPattern::new("jab", TreeBuilder::new().success().build().expect("tree"))
                .with_priority(1),
        )
        .expect("unique pattern name");
    let mut node = AttackPatternNode::new("brute", manager);
    let mut bb = ai_core::Blackboard::new();

    assert_eq!(node.tick(&TickContext::at(0), &mut bb), BtStatus::Running);
    assert_eq!(node.running_pattern(), Some("combo"));

    // Combo's cooldown has expired, but it is resumed rather than restarted.
    assert_eq!(node.tick(&TickContext::at(100), &mut bb), BtStatus::Running);
    assert_eq!(strikes.get(), 1);
    assert_eq!(node.tick(&TickContext::at(150), &mut bb), BtStatus::Running);
    assert_eq!(node.tick(&TickContext::at(200), &mut bb), BtStatus::Success);
    assert_eq!(node.running_pattern(), None);

    let combo = node.manager().get_pattern("brute", "combo").expect("registered");
    assert_eq!(combo.last_used(), Some(Duration::ZERO));
}

#[test]
fn no_eligible_pattern_fails() {
    let mut manager = AttackPatternManager::new();
    manager
        .register(
            "brute",
            AttackPattern::new("slam", TreeBuilder::new().success().build().expect("tree"))
                .with_cooldown(Duration::from_secs(5)),
        )
        .expect("unique pattern name");
    let mut node = AttackPatternNode::new("brute", manager);
    let mut bb = ai_core::Blackboard::new();

    assert_eq!(node.tick(&TickContext::at(0), &mut bb), BtStatus::Success);
    assert_eq!(node.tick(&TickContext::at(16), &mut bb), BtStatus::Failure);
    assert_eq!(node.last_choice(), Some("slam"));

    let mut empty = AttackPatternNode::new("ghost", AttackPatternManager::new());
    assert_eq!(empty.tick(&TickContext::at(0), &mut bb), BtStatus::Failure);
}

#[test]
fn selector_falls_back_when_patterns_are_cooling_down() {
    let mut manager = AttackPatternManager::new();
    manager
        .register(
            "archer",
            AttackPattern::new("volley", TreeBuilder::new().success().build().expect("tree"))
                .with_cooldown(Duration::from_secs(2)),
        )
        .expect("unique pattern name");

    let reposition = Rc::new(Cell::new(0));
    let count = Rc::clone(&reposition);
    let mut tree = TreeBuilder::new()
        .selector()
        .node(Box::new(AttackPatternNode::new("archer", manager)))
        .action("reposition", move |_, _| {
            count.set(count.get() + 1);
            BtStatus::Success
        })
        .end()
        .build()
        .expect("tree");

    for ms in [0, 500, 1000, 2000] {
        assert_eq!(tree.tick(&TickContext::at(ms)), BtStatus::Success);
    }
    assert_eq!(reposition.get(), 2);
}

#[test]
fn selection_and_execution_are_traced() {
    let mut manager = AttackPatternManager::new();
    manager
        .register(
            "brute",
            AttackPattern::new("slam", TreeBuilder::new().success().build().expect("tree")),
        )
        .expect("unique pattern name");
    let mut node = AttackPatternNode::new("brute", manager);
    let mut bb = ai_core::Blackboard::new();
    bb.set(TRACE_LOG, TraceLog::default());

    node.tick(&TickContext::at(0).with_tick(4), &mut bb);

    let log = bb.get(TRACE_LOG).expect("trace log");
    let select: Vec<_> = log.with_tag("patterns.select").collect();
    assert_eq!(select.len(), 1);
    assert_eq!(select[0].label.as_deref(), Some("slam"));
    let execute: Vec<_> = log.with_tag("patterns.execute").collect();
    assert_eq!(execute.len(), 1);
    assert_eq!(execute[0].a, BtStatus::Success.code());
    assert_eq!(execute[0].tick, 4);
}
