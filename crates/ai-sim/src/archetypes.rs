//! Demo enemies: each archetype is a brain tree plus a set of attack patterns.

use std::time::Duration;

use ai_bt::{BehaviorTree, BtStatus, LogLevel, ParallelPolicy, TreeBuilder};
use ai_core::{keys, AgentStats, Blackboard, EffectRequest, TickContext, Vec2};
use ai_patterns::{
    AttackPattern, AttackPatternManager, AttackPatternNode, PatternContext, PatternTuning,
};
use anyhow::{bail, Context, Result};
use serde_json::json;

pub const ARCHETYPES: &[&str] = &["brute", "archer"];

pub struct Archetype {
    pub stats: AgentStats,
    pub tree: BehaviorTree,
}

pub fn build(name: &str, tuning: &PatternTuning) -> Result<Archetype> {
    let mut patterns = match name {
        "brute" => brute_patterns()?,
        "archer" => archer_patterns()?,
        other => bail!("unknown archetype `{other}`; expected one of {ARCHETYPES:?}"),
    };
    // Tuning may name other archetypes; only apply the slice for this one.
    if let Some(overrides) = tuning.archetypes.get(name) {
        let mut own = PatternTuning::default();
        own.archetypes.insert(name.to_owned(), overrides.clone());
        patterns
            .apply_tuning(&own)
            .with_context(|| format!("applying tuning to `{name}`"))?;
    }

    let archetype = match name {
        "brute" => Archetype {
            stats: AgentStats {
                health: 220.0,
                max_health: 220.0,
                speed: 2.5,
                damage: 18.0,
            },
            tree: brute_tree(patterns)?,
        },
        _ => Archetype {
            stats: AgentStats {
                health: 90.0,
                max_health: 90.0,
                speed: 3.5,
                damage: 9.0,
            },
            tree: archer_tree(patterns)?,
        },
    };
    Ok(archetype)
}

fn brute_tree(patterns: AttackPatternManager) -> Result<BehaviorTree> {
    TreeBuilder::new()
        .selector()
        .name("brute")
        .sequence()
        .name("engage")
        .condition("target_in_reach", |_, bb| {
            bb.get(keys::TARGET_DISTANCE).is_some_and(|d| *d <= 6.0)
        })
        .node(Box::new(AttackPatternNode::new("brute", patterns)))
        .end()
        .sequence()
        .name("close_in")
        .condition("has_target", |_, bb| bb.contains(keys::TARGET_POSITION))
        .action("approach", move_toward("approach", "chasing"))
        .end()
        .log("brute has nothing to do", LogLevel::Debug)
        .end()
        .build()
        .context("building brute tree")
}

fn archer_tree(patterns: AttackPatternManager) -> Result<BehaviorTree> {
    TreeBuilder::new()
        .selector()
        .name("archer")
        .conditional("wounded", |_, bb| bb.get_or(keys::HEALTH_RATIO, 1.0) < 0.3)
        .sequence()
        .name("flee")
        .action("retreat", move_toward("retreat", "fleeing"))
        .succeeder()
        .cooldown(Duration::from_secs(4))
        .action("drink_potion", drink_potion)
        .end()
        .end()
        .end()
        .end()
        .sequence()
        .name("engage")
        .condition("in_range", |_, bb| {
            bb.get(keys::TARGET_DISTANCE).is_some_and(|d| *d <= 12.0)
        })
        .node(Box::new(AttackPatternNode::new("archer", patterns)))
        .end()
        .action("approach", move_toward("approach", "advancing"))
        .end()
        .build()
        .context("building archer tree")
}

fn brute_patterns() -> Result<AttackPatternManager> {
    let mut manager = AttackPatternManager::new();
    manager
        .register(
            "brute",
            AttackPattern::new("roar", roar()?)
                .with_priority(9)
                .with_cooldown(Duration::from_secs(10))
                .with_condition(|ctx| health_ratio(ctx).is_some_and(|r| r < 0.5)),
        )?
        .register(
            "brute",
            AttackPattern::new("slam", melee("slam", 1.6, 600, 500)?)
                .with_priority(8)
                .with_cooldown(Duration::from_secs(3))
                .with_condition(|ctx| distance(ctx).is_some_and(|d| d <= 2.5)),
        )?
        .register(
            "brute",
            AttackPattern::new("swipe", melee("swipe", 1.0, 250, 250)?)
                .with_priority(6)
                .with_cooldown(Duration::from_secs(1))
                .with_condition(|ctx| distance(ctx).is_some_and(|d| d <= 2.5)),
        )?
        .register(
            "brute",
            AttackPattern::new("charge", charge()?)
                .with_priority(4)
                .with_cooldown(Duration::from_millis(2500))
                .with_condition(|ctx| distance(ctx).is_some_and(|d| d > 2.5)),
        )?;
    Ok(manager)
}

fn archer_patterns() -> Result<AttackPatternManager> {
    let mut manager = AttackPatternManager::new();
    manager
        .register(
            "archer",
            AttackPattern::new("volley", volley()?)
                .with_priority(7)
                .with_cooldown(Duration::from_secs(4)),
        )?
        .register(
            "archer",
            AttackPattern::new("aimed_shot", aimed_shot()?)
                .with_priority(5)
                .with_cooldown(Duration::from_millis(1500))
                .with_condition(|ctx| distance(ctx).is_some_and(|d| d >= 4.0)),
        )?
        .register(
            "archer",
            AttackPattern::new("quick_shot", quick_shot()?)
                .with_priority(3)
                .with_cooldown(Duration::from_millis(600)),
        )?;
    Ok(manager)
}

/// Wind-up, hit, recovery.
fn melee(
    name: &'static str,
    scale: f32,
    windup_ms: u64,
    recovery_ms: u64,
) -> Result<BehaviorTree> {
    TreeBuilder::new()
        .sequence()
        .action("windup", set_state("winding_up"))
        .wait(Duration::from_millis(windup_ms))
        .action(name, strike(name, "impact", scale))
        .action("recover", set_state("recovering"))
        .wait(Duration::from_millis(recovery_ms))
        .end()
        .build()
        .with_context(|| format!("building `{name}` pattern"))
}

fn charge() -> Result<BehaviorTree> {
    TreeBuilder::new()
        .sequence()
        .action("brace", set_state("charging"))
        .timeout(Duration::from_millis(1500))
        .repeater(3)
        .action("lunge", move_toward("approach", "charging"))
        .end()
        .end()
        .action("ram", strike("charge", "dust", 1.2))
        .end()
        .build()
        .context("building `charge` pattern")
}

fn roar() -> Result<BehaviorTree> {
    TreeBuilder::new()
        .sequence()
        .action("roar", set_state("roaring"))
        .random_selector()
        .action("roar_low", spawn("roar_low"))
        .action("roar_high", spawn("roar_high"))
        .end()
        .set_value("enraged", true)
        .wait(Duration::from_millis(800))
        .end()
        .build()
        .context("building `roar` pattern")
}

fn volley() -> Result<BehaviorTree> {
    TreeBuilder::new()
        .sequence()
        .action("nock", set_state("nocking"))
        .wait(Duration::from_millis(400))
        .parallel(ParallelPolicy::RequireMajority)
        .action("arrow_left", strike("volley", "arrow", 0.6))
        .action("arrow_center", strike("volley", "arrow", 0.6))
        .action("arrow_right", strike("volley", "arrow", 0.6))
        .end()
        .end()
        .build()
        .context("building `volley` pattern")
}

fn aimed_shot() -> Result<BehaviorTree> {
    TreeBuilder::new()
        .sequence()
        .action("aim", set_state("aiming"))
        .timeout(Duration::from_millis(1200))
        .wait(Duration::from_millis(900))
        .end()
        .retry(2)
        .action("release", strike("aimed_shot", "arrow_trail", 2.0))
        .end()
        .end()
        .build()
        .context("building `aimed_shot` pattern")
}

fn quick_shot() -> Result<BehaviorTree> {
    TreeBuilder::new()
        .weighted_selector([3.0, 1.0])
        .action("snap_shot", strike("quick_shot", "arrow", 0.8))
        .sequence()
        .action("step_back", move_toward("retreat", "kiting"))
        .action("snap_shot", strike("quick_shot", "arrow", 0.8))
        .end()
        .end()
        .build()
        .context("building `quick_shot` pattern")
}

fn health_ratio(ctx: &PatternContext) -> Option<f32> {
    let enemy = ctx.enemy.as_ref()?;
    let ratio = enemy.borrow().stats().health_ratio();
    Some(ratio)
}

fn distance(ctx: &PatternContext) -> Option<f32> {
    let enemy = ctx.enemy.as_ref()?;
    let target = ctx.target.as_ref()?;
    let position = enemy.borrow().position();
    Some(position.distance(target.position()))
}

fn set_state(state: &'static str) -> impl FnMut(&TickContext, &mut Blackboard) -> BtStatus {
    move |_, bb| match bb.get(keys::ENEMY) {
        Some(enemy) => {
            enemy.borrow_mut().set_state(state);
            BtStatus::Success
        }
        None => BtStatus::Failure,
    }
}

fn move_toward(
    behavior: &'static str,
    state: &'static str,
) -> impl FnMut(&TickContext, &mut Blackboard) -> BtStatus {
    move |_, bb| {
        // Pattern trees only see the target handle, brain trees also get its refreshed position.
        let target = bb
            .get(keys::TARGET_POSITION)
            .copied()
            .or_else(|| bb.get(keys::TARGET).map(|t| t.position()));
        let (Some(enemy), Some(target)) = (bb.get(keys::ENEMY), target) else {
            return BtStatus::Failure;
        };
        let mut enemy = enemy.borrow_mut();
        enemy.set_state(state);
        if enemy.execute_behavior(behavior, Some(target)) {
            BtStatus::Success
        } else {
            BtStatus::Failure
        }
    }
}

fn strike(
    pattern: &'static str,
    effect: &'static str,
    scale: f32,
) -> impl FnMut(&TickContext, &mut Blackboard) -> BtStatus {
    move |ctx, bb| {
        let (Some(enemy), Some(target)) = (bb.get(keys::ENEMY), bb.get(keys::TARGET)) else {
            return BtStatus::Failure;
        };
        let at = target.position();
        {
            let mut enemy = enemy.borrow_mut();
            let damage = enemy.stats().damage * scale;
            enemy.emit_event(
                "attack",
                json!({ "pattern": pattern, "damage": damage, "tick": ctx.tick }),
            );
        }
        if let Some(scene) = bb.get(keys::SCENE) {
            let request = EffectRequest::new(effect, at).with_duration(Duration::from_millis(300));
            scene.borrow_mut().spawn_effect(request);
        }
        BtStatus::Success
    }
}

fn spawn(effect: &'static str) -> impl FnMut(&TickContext, &mut Blackboard) -> BtStatus {
    move |_, bb| {
        let Some(enemy) = bb.get(keys::ENEMY) else {
            return BtStatus::Failure;
        };
        let at: Vec2 = enemy.borrow().position();
        match bb.get(keys::SCENE) {
            Some(scene) => {
                scene.borrow_mut().spawn_effect(EffectRequest::new(effect, at));
                BtStatus::Success
            }
            None => BtStatus::Failure,
        }
    }
}

fn drink_potion(_ctx: &TickContext, bb: &mut Blackboard) -> BtStatus {
    let Some(enemy) = bb.get(keys::ENEMY) else {
        return BtStatus::Failure;
    };
    enemy.borrow_mut().heal(25.0);
    enemy
        .borrow_mut()
        .emit_event("potion", json!({ "amount": 25.0 }));
    if let Some(scene) = bb.get(keys::SCENE) {
        scene
            .borrow_mut()
            .schedule(Duration::from_millis(500), "potion_glow_fade");
    }
    BtStatus::Success
}
