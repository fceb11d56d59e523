use std::cell::{Cell, RefCell};
use std::rc::Rc;
use std::time::Duration;

use ai_bt::{
    Action, BtNode, BtStatus, Parallel, ParallelPolicy, RandomSelector, Repeater, Selector,
    Sequence, TreeBuilder, Wait, WeightedSelector,
};
use ai_core::{Blackboard, TickContext};

/// A leaf that replays `script` (repeating the last entry) and records its ticks.
fn scripted(
    name: &'static str,
    script: Vec<BtStatus>,
    log: &Rc<RefCell<Vec<&'static str>>>,
) -> Box<dyn BtNode> {
    let log = Rc::clone(log);
    let mut step = 0usize;
    Box::new(Action::new(name, move |_, _| {
        log.borrow_mut().push(name);
        let status = script[step.min(script.len() - 1)];
        step += 1;
        status
    }))
}

fn counted(status: BtStatus, hits: &Rc<Cell<u32>>) -> Box<dyn BtNode> {
    let hits = Rc::clone(hits);
    Box::new(Action::new("counted", move |_, _| {
        hits.set(hits.get() + 1);
        status
    }))
}

#[test]
fn sequence_stops_at_first_failure_and_restarts() {
    let log = Rc::new(RefCell::new(Vec::new()));
    let mut seq = Sequence::new(vec![
        scripted("a", vec![BtStatus::Success], &log),
        scripted("b", vec![BtStatus::Failure], &log),
        scripted("c", vec![BtStatus::Success], &log),
    ]);
    let mut bb = Blackboard::new();
    let ctx = TickContext::at(0);

    assert_eq!(seq.tick(&ctx, &mut bb), BtStatus::Failure);
    assert_eq!(*log.borrow(), vec!["a", "b"]);
    assert_eq!(seq.cursor(), 0);

    log.borrow_mut().clear();
    seq.tick(&ctx, &mut bb);
    assert_eq!(*log.borrow(), vec!["a", "b"]);
}

#[test]
fn sequence_resumes_running_child_without_rechecking_earlier_ones() {
    let log = Rc::new(RefCell::new(Vec::new()));
    let mut seq = Sequence::new(vec![
        scripted("check", vec![BtStatus::Success], &log),
        scripted("windup", vec![BtStatus::Running, BtStatus::Success], &log),
        scripted("strike", vec![BtStatus::Success], &log),
    ]);
    let mut bb = Blackboard::new();

    assert_eq!(seq.tick(&TickContext::at(0), &mut bb), BtStatus::Running);
    assert_eq!(seq.cursor(), 1);
    assert_eq!(seq.tick(&TickContext::at(16), &mut bb), BtStatus::Success);

    assert_eq!(*log.borrow(), vec!["check", "windup", "windup", "strike"]);
    assert_eq!(seq.cursor(), 0);
}

#[test]
fn empty_sequence_succeeds_and_empty_selector_fails() {
    let mut bb = Blackboard::new();
    let ctx = TickContext::at(0);

    assert_eq!(Sequence::new(Vec::new()).tick(&ctx, &mut bb), BtStatus::Success);
    assert_eq!(Selector::new(Vec::new()).tick(&ctx, &mut bb), BtStatus::Failure);
}

#[test]
fn selector_returns_first_success_skipping_none() {
    let log = Rc::new(RefCell::new(Vec::new()));
    let mut sel = Selector::new(vec![
        scripted("melee", vec![BtStatus::Failure], &log),
        scripted("ranged", vec![BtStatus::Success], &log),
        scripted("flee", vec![BtStatus::Success], &log),
    ]);
    let mut bb = Blackboard::new();

    assert_eq!(sel.tick(&TickContext::at(0), &mut bb), BtStatus::Success);
    assert_eq!(*log.borrow(), vec!["melee", "ranged"]);
    assert_eq!(sel.cursor(), 0);
}

#[test]
fn selector_fails_when_all_children_fail_and_resets() {
    let log = Rc::new(RefCell::new(Vec::new()));
    let mut sel = Selector::new(vec![
        scripted("a", vec![BtStatus::Failure], &log),
        scripted("b", vec![BtStatus::Failure], &log),
    ]);
    let mut bb = Blackboard::new();

    assert_eq!(sel.tick(&TickContext::at(0), &mut bb), BtStatus::Failure);
    assert_eq!(sel.cursor(), 0);
    assert_eq!(*log.borrow(), vec!["a", "b"]);
}

#[test]
fn parallel_require_all_needs_every_child_in_the_same_tick() {
    let hits = Rc::new(Cell::new(0));
    let mut bb = Blackboard::new();
    let ctx = TickContext::at(0);

    let mut all_ok = Parallel::new(
        ParallelPolicy::RequireAll,
        vec![counted(BtStatus::Success, &hits), counted(BtStatus::Success, &hits)],
    );
    assert_eq!(all_ok.tick(&ctx, &mut bb), BtStatus::Success);

    let mut one_running = Parallel::new(
        ParallelPolicy::RequireAll,
        vec![counted(BtStatus::Success, &hits), counted(BtStatus::Running, &hits)],
    );
    assert_eq!(one_running.tick(&ctx, &mut bb), BtStatus::Running);

    let mut one_failing = Parallel::new(
        ParallelPolicy::RequireAll,
        vec![
            counted(BtStatus::Running, &hits),
            counted(BtStatus::Failure, &hits),
            counted(BtStatus::Success, &hits),
        ],
    );
    assert_eq!(one_failing.tick(&ctx, &mut bb), BtStatus::Failure);

    // Every child is ticked every time.
    assert_eq!(hits.get(), 7);
}

#[test]
fn parallel_require_one_and_majority() {
    let hits = Rc::new(Cell::new(0));
    let mut bb = Blackboard::new();
    let ctx = TickContext::at(0);

    let mut one = Parallel::new(
        ParallelPolicy::RequireOne,
        vec![counted(BtStatus::Failure, &hits), counted(BtStatus::Success, &hits)],
    );
    assert_eq!(one.tick(&ctx, &mut bb), BtStatus::Success);

    let mut none = Parallel::new(
        ParallelPolicy::RequireOne,
        vec![counted(BtStatus::Failure, &hits), counted(BtStatus::Failure, &hits)],
    );
    assert_eq!(none.tick(&ctx, &mut bb), BtStatus::Failure);

    let mut majority = Parallel::new(
        ParallelPolicy::RequireMajority,
        vec![
            counted(BtStatus::Success, &hits),
            counted(BtStatus::Failure, &hits),
            counted(BtStatus::Success, &hits),
        ],
    );
    assert_eq!(majority.tick(&ctx, &mut bb), BtStatus::Success);

    let mut lost_majority = Parallel::new(
        ParallelPolicy::RequireMajority,
        vec![
            counted(BtStatus::Failure, &hits),
            counted(BtStatus::Failure, &hits),
            counted(BtStatus::Running, &hits),
        ],
    );
    assert_eq!(lost_majority.tick(&ctx, &mut bb), BtStatus::Failure);
}

#[test]
fn parallel_require_one_without_children_fails() {
    let mut bb = Blackboard::new();
    let mut p = Parallel::new(ParallelPolicy::RequireOne, Vec::new());
    assert_eq!(p.tick(&TickContext::at(0), &mut bb), BtStatus::Failure);

    let mut all = Parallel::new(ParallelPolicy::RequireAll, Vec::new());
    assert_eq!(all.tick(&TickContext::at(0), &mut bb), BtStatus::Success);
}

#[test]
fn random_selector_commits_to_running_child() {
    let log = Rc::new(RefCell::new(Vec::new()));
    let mut node = RandomSelector::new(vec![
        scripted("a", vec![BtStatus::Running, BtStatus::Success], &log),
        scripted("b", vec![BtStatus::Running, BtStatus::Success], &log),
        scripted("c", vec![BtStatus::Running, BtStatus::Success], &log),
    ]);
    let mut bb = Blackboard::new();

    assert_eq!(node.tick(&TickContext::at(0), &mut bb), BtStatus::Running);
    let chosen = node.chosen().expect("a child is committed while running");

    // A later tick would draw differently, but the committed child keeps running.
    let later = TickContext::at(16).with_tick(99);
    assert_eq!(node.tick(&later, &mut bb), BtStatus::Success);
    assert_eq!(node.chosen(), None);

    let log = log.borrow();
    assert_eq!(log.len(), 2);
    assert_eq!(log[0], log[1]);
    assert_eq!(log[0], ["a", "b", "c"][chosen]);
}

#[test]
fn random_selector_is_reproducible_for_a_seed() {
    let pick = |seed: u64, tick: u64| {
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut node = RandomSelector::new(vec![
            scripted("a", vec![BtStatus::Success], &log),
            scripted("b", vec![BtStatus::Success], &log),
            scripted("c", vec![BtStatus::Success], &log),
            scripted("d", vec![BtStatus::Success], &log),
        ])
        .with_stream(3);
        let ctx = TickContext::at(0).with_seed(seed).with_tick(tick);
        node.tick(&ctx, &mut Blackboard::new());
        let name = log.borrow()[0];
        name
    };

    for tick in 0..16 {
        assert_eq!(pick(42, tick), pick(42, tick));
    }
}

#[test]
fn random_selector_spreads_fresh_choices_within_one_tick() {
    let a = Rc::new(Cell::new(0));
    let b = Rc::new(Cell::new(0));
    let mut node = Repeater::new(100).with_child(Box::new(
        RandomSelector::new(vec![
            counted(BtStatus::Success, &a),
            counted(BtStatus::Success, &b),
        ])
        .with_stream(1),
    ));

    let status = node.tick(&TickContext::at(0), &mut Blackboard::new());

    assert_eq!(status, BtStatus::Success);
    assert_eq!(a.get() + b.get(), 100);
    assert!(a.get() >= 25, "a picked {} times", a.get());
    assert!(b.get() >= 25, "b picked {} times", b.get());
}

#[test]
fn random_selector_covers_every_child_across_ticks() {
    let log = Rc::new(RefCell::new(Vec::new()));
    let mut node = RandomSelector::new(vec![
        scripted("a", vec![BtStatus::Success], &log),
        scripted("b", vec![BtStatus::Success], &log),
        scripted("c", vec![BtStatus::Success], &log),
        scripted("d", vec![BtStatus::Success], &log),
    ])
    .with_stream(2);
    let mut bb = Blackboard::new();

    for tick in 0..200 {
        let ctx = TickContext::at(tick * 16).with_tick(tick).with_seed(7);
        assert_eq!(node.tick(&ctx, &mut bb), BtStatus::Success);
    }

    let log = log.borrow();
    for name in ["a", "b", "c", "d"] {
        let hits = log.iter().filter(|picked| **picked == name).count();
        assert!(hits >= 20, "{name} picked {hits} times");
    }
}

#[test]
fn weighted_selector_spreads_fresh_choices_within_one_tick() {
    let heavy = Rc::new(Cell::new(0));
    let light = Rc::new(Cell::new(0));
    let selector = WeightedSelector::new(vec![
        counted(BtStatus::Success, &heavy),
        counted(BtStatus::Success, &light),
    ])
    .with_weights(vec![3.0, 1.0])
    .expect("valid weights")
    .with_stream(5);
    let mut node = Repeater::new(200).with_child(Box::new(selector));

    node.tick(&TickContext::at(0), &mut Blackboard::new());

    assert_eq!(heavy.get() + light.get(), 200);
    assert!(light.get() >= 20, "light picked {} times", light.get());
    assert!(heavy.get() > light.get());
}

#[test]
fn salted_builders_draw_independently() {
    let picks = |salt: u64| {
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut builder = TreeBuilder::with_salt(salt);
        builder.random_selector();
        for name in ["a", "b", "c", "d"] {
            let log = Rc::clone(&log);
            builder.action(name, move |_, _| {
                log.borrow_mut().push(name);
                BtStatus::Success
            });
        }
        let mut tree = builder.end().build().expect("tree");
        for tick in 0..200 {
            tree.tick(&TickContext::at(tick * 16).with_tick(tick));
        }
        let picks = log.borrow().clone();
        picks
    };

    assert_eq!(picks(1), picks(1));
    let (one, two) = (picks(1), picks(2));
    let agreed = one.iter().zip(&two).filter(|(x, y)| x == y).count();
    assert!(agreed < 120, "salted trees agreed on {agreed}/200 ticks");
}

#[test]
fn random_selector_without_children_fails() {
    let mut node = RandomSelector::new(Vec::new());
    assert_eq!(node.tick(&TickContext::at(0), &mut Blackboard::new()), BtStatus::Failure);
}

#[test]
fn weighted_selector_with_single_positive_weight_always_picks_it() {
    let log = Rc::new(RefCell::new(Vec::new()));
    let mut node = WeightedSelector::new(vec![
        scripted("first", vec![BtStatus::Success], &log),
        scripted("second", vec![BtStatus::Success], &log),
        scripted("third", vec![BtStatus::Success], &log),
    ])
    .with_weights(vec![1.0, 0.0, 0.0])
    .expect("valid weights");
    let mut bb = Blackboard::new();

    for tick in 0..200 {
        let ctx = TickContext::at(tick * 16).with_tick(tick).with_seed(9);
        assert_eq!(node.tick(&ctx, &mut bb), BtStatus::Success);
        assert_eq!(node.chosen(), None);
    }

    assert!(log.borrow().iter().all(|name| *name == "first"));
}

#[test]
fn weighted_selector_zero_total_falls_back_to_uniform() {
    let log = Rc::new(RefCell::new(Vec::new()));
    let mut node = WeightedSelector::new(vec![
        scripted("a", vec![BtStatus::Success], &log),
        scripted("b", vec![BtStatus::Success], &log),
    ])
    .with_weights(vec![0.0, 0.0])
    .expect("zero weights are valid");
    let mut bb = Blackboard::new();

    for tick in 0..64 {
        node.tick(&TickContext::at(0).with_tick(tick), &mut bb);
    }

    let log = log.borrow();
    assert!(log.contains(&"a"));
    assert!(log.contains(&"b"));
}

#[test]
fn weighted_selector_rejects_bad_weights() {
    let make = || {
        WeightedSelector::new(vec![
            Box::new(ai_bt::Fixed::success()) as Box<dyn BtNode>,
            Box::new(ai_bt::Fixed::success()),
        ])
    };

    assert!(matches!(
        make().with_weights(vec![1.0]),
        Err(ai_bt::BuildError::WeightCountMismatch {
            weights: 1,
            children: 2,
            ..
        })
    ));
    assert!(matches!(
        make().with_weights(vec![1.0, -2.0]),
        Err(ai_bt::BuildError::InvalidWeight { index: 1, .. })
    ));
    assert!(matches!(
        make().with_weights(vec![f32::NAN, 1.0]),
        Err(ai_bt::BuildError::InvalidWeight { index: 0, .. })
    ));
}

#[test]
fn parallel_resets_running_children_when_it_concludes() {
    let log = Rc::new(RefCell::new(Vec::new()));
    let mut p = Parallel::new(
        ParallelPolicy::RequireAll,
        vec![
            scripted(
                "guard",
                vec![BtStatus::Running, BtStatus::Failure, BtStatus::Success],
                &log,
            ),
            Box::new(Wait::new(Duration::from_millis(100))),
        ],
    );
    let mut bb = Blackboard::new();

    assert_eq!(p.tick(&TickContext::at(0), &mut bb), BtStatus::Running);
    assert_eq!(p.tick(&TickContext::at(50), &mut bb), BtStatus::Failure);

    // Had the wait kept its start time it would be done by now.
    assert_eq!(p.tick(&TickContext::at(100), &mut bb), BtStatus::Running);
    assert_eq!(p.tick(&TickContext::at(200), &mut bb), BtStatus::Success);
}
