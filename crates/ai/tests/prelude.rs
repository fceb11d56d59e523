#![cfg(feature = "patterns")]

use std::time::Duration;

use ai::prelude::*;

#[test]
fn prelude_builds_and_runs_a_patterned_tree() {
    let mut manager = AttackPatternManager::new();
    manager
        .register(
            "grunt",
            AttackPattern::new("poke", TreeBuilder::new().success().build().expect("tree"))
                .with_cooldown(Duration::from_millis(500)),
        )
        .expect("unique pattern name");

    let tree = TreeBuilder::new()
        .selector()
        .node(Box::new(AttackPatternNode::new("grunt", manager)))
        .log("waiting for cooldown", LogLevel::Debug)
        .end()
        .build()
        .expect("tree");
    let mut brain = Brain::new(tree, BrainConfig::default());

    assert_eq!(brain.update(Duration::from_millis(100)), BtStatus::Success);
    assert_eq!(brain.update(Duration::from_millis(100)), BtStatus::Success);
    assert_eq!(brain.now(), Duration::from_millis(200));
    assert_eq!(brain.tree().tick_count(), 2);
}
