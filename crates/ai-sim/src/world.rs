//! Stand-ins for the game side: an enemy, a target dummy and an effect sink.

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::Rc;
use std::time::Duration;

use ai_core::{AgentFacade, AgentStats, EffectRequest, EffectSink, TargetFacade, Vec2};
use serde::Serialize;

#[derive(Debug)]
pub struct SimAgent {
    pub name: String,
    pub stats: AgentStats,
    pub position: Vec2,
    pub state: String,
    pub events: BTreeMap<String, u32>,
    /// Where `execute_behavior` moves, refreshed by the harness each frame.
    pub step: f32,
}

impl SimAgent {
    pub fn new(name: impl Into<String>, stats: AgentStats, position: Vec2) -> Self {
        Self {
            name: name.into(),
            stats,
            position,
            state: "idle".to_owned(),
            events: BTreeMap::new(),
            step: 0.0,
        }
    }

    pub fn take_damage(&mut self, amount: f32) {
        self.stats.health = (self.stats.health - amount).max(0.0);
    }
}

impl AgentFacade for SimAgent {
    fn stats(&self) -> AgentStats {
        self.stats
    }

    fn position(&self) -> Vec2 {
        self.position
    }

    fn is_dead(&self) -> bool {
        self.stats.health <= 0.0
    }

    fn heal(&mut self, amount: f32) {
        self.stats.health = (self.stats.health + amount).min(self.stats.max_health);
    }

    fn emit_event(&mut self, kind: &str, payload: serde_json::Value) {
        tracing::debug!(agent = %self.name, kind, %payload, "agent event");
        *self.events.entry(kind.to_owned()).or_default() += 1;
    }

    fn set_state(&mut self, state: &str) {
        if self.state != state {
            tracing::debug!(agent = %self.name, from = %self.state, to = state, "state change");
            self.state = state.to_owned();
        }
    }

    fn behaviors(&self) -> Vec<String> {
        vec!["approach".to_owned(), "retreat".to_owned()]
    }

    fn execute_behavior(&mut self, id: &str, target: Option<Vec2>) -> bool {
        let Some(target) = target else {
            return false;
        };
        let toward = (target - self.position).normalize_or_zero();
        let step = toward * self.step;
        match id {
            "approach" => self.position = self.position + step,
            "retreat" => self.position = self.position - step,
            _ => return false,
        }
        true
    }
}

#[derive(Debug, Clone, Copy)]
pub struct SimTarget {
    pub position: Vec2,
}

impl TargetFacade for SimTarget {
    fn position(&self) -> Vec2 {
        self.position
    }
}

#[derive(Debug, Default, Serialize)]
pub struct SimScene {
    pub effects: BTreeMap<String, u32>,
    pub scheduled: u32,
}

impl EffectSink for SimScene {
    fn spawn_effect(&mut self, effect: EffectRequest) {
        tracing::trace!(
            kind = %effect.kind,
            x = effect.position.x,
            y = effect.position.y,
            "effect spawned"
        );
        *self.effects.entry(effect.kind).or_default() += 1;
    }

    fn schedule(&mut self, delay: Duration, label: &str) {
        tracing::trace!(label, delay_ms = delay.as_millis() as u64, "scheduled callback");
        self.scheduled += 1;
    }
}

pub type Shared<T> = Rc<RefCell<T>>;

pub fn shared<T>(value: T) -> Shared<T> {
    Rc::new(RefCell::new(value))
}
