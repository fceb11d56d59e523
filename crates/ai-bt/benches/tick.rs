use std::time::Duration;

use ai_bt::{BtStatus, ParallelPolicy, TreeBuilder};
use ai_core::{BbKey, SimClock};
use criterion::{black_box, criterion_group, criterion_main, Criterion};

const ENGAGED: BbKey<bool> = BbKey::new("engaged");

fn bench_bt_tick(c: &mut Criterion) {
    let mut builder = TreeBuilder::new();
    builder.sequence();
    for i in 0..32 {
        builder.condition(format!("check_{i}"), |_, _| true);
    }
    let mut tree = builder.end().build().expect("bench tree");
    let mut clock = SimClock::new(0);

    c.bench_function("ai-bt/tick(conditions=32)", |b| {
        b.iter(|| {
            let ctx = clock.advance(Duration::from_millis(16));
            black_box(tree.tick(&ctx));
        })
    });
}

fn bench_combat_tree(c: &mut Criterion) {
    let mut tree = TreeBuilder::new()
        .selector()
        .sequence()
        .condition("engaged", |_, bb| bb.flag(ENGAGED))
        .parallel(ParallelPolicy::RequireAll)
        .action("strafe", |_, _| BtStatus::Success)
        .action("aim", |_, _| BtStatus::Success)
        .end()
        .cooldown(Duration::from_millis(500))
        .action("fire", |_, _| BtStatus::Success)
        .end()
        .end()
        .weighted_selector([3.0, 1.0])
        .action("patrol", |_, _| BtStatus::Success)
        .action("idle", |_, _| BtStatus::Success)
        .end()
        .end()
        .build()
        .expect("bench tree");
    tree.blackboard_mut().set(ENGAGED, true);
    let mut clock = SimClock::new(7);

    c.bench_function("ai-bt/tick(combat)", |b| {
        b.iter(|| {
            let ctx = clock.advance(Duration::from_millis(16));
            black_box(tree.tick(&ctx));
        })
    });
}

criterion_group!(benches, bench_bt_tick, bench_combat_tree);
criterion_main!(benches);
