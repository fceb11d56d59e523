use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;

use ai_bt::{BtStatus, BuildError, LogLevel, NodeKind, ParallelPolicy, TreeBuilder};
use ai_core::{BbKey, TickContext};

const HAS_TARGET: BbKey<bool> = BbKey::new("has_target");

#[test]
fn sequence_with_two_leaves_round_trips() {
    let tree = TreeBuilder::new()
        .sequence()
        .condition("has_target", |_, bb| bb.flag(HAS_TARGET))
        .action("attack", |_, _| BtStatus::Success)
        .end()
        .build()
        .expect("tree");

    let root = tree.root();
    assert_eq!(root.kind(), NodeKind::Sequence);
    let names: Vec<_> = root.children().iter().map(|c| c.name()).collect();
    assert_eq!(names, ["has_target", "attack"]);
}

#[test]
fn empty_builder_fails_every_time() {
    let mut builder = TreeBuilder::new();
    assert_eq!(builder.build().err(), Some(BuildError::NoRoot));
    assert_eq!(builder.build().err(), Some(BuildError::NoRoot));
}

#[test]
fn build_resets_the_builder_for_reuse() {
    let mut builder = TreeBuilder::new();
    builder.selector().failure().success().end();
    let first = builder.build().expect("first tree");
    assert_eq!(first.root().children().len(), 2);

    builder.sequence().success().end();
    let second = builder.build().expect("second tree");
    assert_eq!(second.root().kind(), NodeKind::Sequence);
    assert_eq!(second.root().children().len(), 1);
}

#[test]
fn build_closes_open_nodes() {
    let tree = TreeBuilder::new()
        .selector()
        .inverter()
        .failure()
        .build()
        .expect("tree");

    assert_eq!(tree.describe(), "Selector\n  Inverter\n    Failure\n");
}

#[test]
fn second_child_on_a_decorator_is_an_error() {
    let err = TreeBuilder::new()
        .inverter()
        .success()
        .failure()
        .end()
        .build()
        .err();

    assert_eq!(
        err,
        Some(BuildError::DecoratorOccupied {
            decorator: "Inverter".into()
        })
    );
}

#[test]
fn composite_under_an_occupied_decorator_is_an_error() {
    let err = TreeBuilder::new()
        .succeeder()
        .sequence()
        .end()
        .selector()
        .build()
        .err();

    assert!(matches!(err, Some(BuildError::DecoratorOccupied { .. })));
}

#[test]
fn leaf_as_root_then_another_root_is_an_error() {
    let err = TreeBuilder::new().success().failure().build().err();
    assert_eq!(
        err,
        Some(BuildError::MultipleRoots {
            existing: "Success".into()
        })
    );
}

#[test]
fn single_leaf_can_be_the_root() {
    let mut tree = TreeBuilder::new().running().build().expect("tree");
    assert_eq!(tree.tick(&TickContext::at(0)), BtStatus::Running);
}

#[test]
fn unbalanced_end_is_an_error() {
    let err = TreeBuilder::new().sequence().end().end().build().err();
    assert_eq!(err, Some(BuildError::UnbalancedEnd));
}

#[test]
fn weight_mismatch_is_reported_when_the_selector_closes() {
    let err = TreeBuilder::new()
        .weighted_selector([1.0, 2.0, 3.0])
        .success()
        .success()
        .end()
        .build()
        .err();

    assert!(matches!(
        err,
        Some(BuildError::WeightCountMismatch {
            weights: 3,
            children: 2,
            ..
        })
    ));
}

#[test]
fn first_error_wins() {
    let err = TreeBuilder::new()
        .inverter()
        .success()
        .success()
        .end()
        .end()
        .build()
        .err();

    assert!(matches!(err, Some(BuildError::DecoratorOccupied { .. })));
}

#[test]
fn name_renames_the_latest_leaf_or_open_node() {
    let tree = TreeBuilder::new()
        .selector()
        .name("root_choice")
        .action("a", |_, _| BtStatus::Failure)
        .name("lunge")
        .cooldown(Duration::from_secs(2))
        .success()
        .end()
        .build()
        .expect("tree");

    assert_eq!(
        tree.describe(),
        "Selector(root_choice)\n  Action(lunge)\n  Cooldown\n    Success\n"
    );
}

#[test]
fn built_tree_evaluates_in_declared_order() {
    let order = Rc::new(RefCell::new(Vec::new()));
    let push = |name: &'static str, status: BtStatus| {
        let order = Rc::clone(&order);
        move |_: &TickContext, _: &mut ai_core::Blackboard| {
            order.borrow_mut().push(name);
            status
        }
    };

    let mut tree = TreeBuilder::new()
        .selector()
        .sequence()
        .action("approach", push("approach", BtStatus::Success))
        .action("strike", push("strike", BtStatus::Failure))
        .end()
        .parallel(ParallelPolicy::RequireOne)
        .action("taunt", push("taunt", BtStatus::Success))
        .log("fallback", LogLevel::Debug)
        .end()
        .end()
        .build()
        .expect("tree");

    assert_eq!(tree.tick(&TickContext::at(0)), BtStatus::Success);
    assert_eq!(*order.borrow(), ["approach", "strike", "taunt"]);
}

#[test]
fn blackboard_leaves_from_the_builder() {
    let mut tree = TreeBuilder::new()
        .sequence()
        .set_value("phase", 2u8)
        .set_value_with("phase_doubled", |_, bb| {
            bb.get_as::<u8>("phase").copied().unwrap_or(0) * 2
        })
        .clear_value("phase")
        .end()
        .build()
        .expect("tree");

    assert_eq!(tree.tick(&TickContext::at(0)), BtStatus::Success);
    assert!(!tree.blackboard().contains_name("phase"));
    assert_eq!(tree.blackboard().get_as::<u8>("phase_doubled"), Some(&4));
}
