use ai_bt::{BtNode, BtStatus, NodeKind};
use ai_core::{Blackboard, TickContext};
use ai_tools::{emit as trace_emit, TraceEvent};

use crate::{AttackPatternManager, PatternContext};

/// Attack pattern selection as a BT leaf node.
///
/// Each tick:
/// - Keeps ticking the pattern that returned `Running` last time (no reselection).
/// - Otherwise selects the best eligible pattern for the archetype and executes it, which starts
///   its cooldown.
/// - Returns `Failure` when nothing is eligible, allowing BT fallbacks.
///
/// Enemy, target and scene are taken from the host tree's blackboard.
pub struct AttackPatternNode {
    name: Option<String>,
    manager: AttackPatternManager,
    archetype: String,
    running: Option<String>,
    last_choice: Option<String>,
}

impl AttackPatternNode {
    pub fn new(archetype: impl Into<String>, manager: AttackPatternManager) -> Self {
        Self {
            name: None,
            manager,
            archetype: archetype.into(),
            running: None,
            last_choice: None,
        }
    }

    pub fn archetype(&self) -> &str {
        &self.archetype
    }

    pub fn manager(&self) -> &AttackPatternManager {
        &self.manager
    }

    pub fn manager_mut(&mut self) -> &mut AttackPatternManager {
        &mut self.manager
    }

    /// Pattern currently mid-execution.
    pub fn running_pattern(&self) -> Option<&str> {
        self.running.as_deref()
    }

    /// Pattern most recently started.
    pub fn last_choice(&self) -> Option<&str> {
        self.last_choice.as_deref()
    }
}

impl BtNode for AttackPatternNode {
    fn tick(&mut self, ctx: &TickContext, blackboard: &mut Blackboard) -> BtStatus {
        let pattern_ctx = PatternContext::from_blackboard(*ctx, blackboard);

        let (name, result) = match self.running.take() {
            Some(name) => {
                let result = self.manager.resume_pattern(&self.archetype, &name, &pattern_ctx);
                (name, result)
            }
            None => {
                let Some(best) = self.manager.select_best_pattern(&self.archetype, &pattern_ctx)
                else {
                    trace_emit(blackboard, TraceEvent::new(ctx.tick, "patterns.select"));
                    return BtStatus::Failure;
                };
                let name = best.name().to_owned();
                trace_emit(
                    blackboard,
                    TraceEvent::new(ctx.tick, "patterns.select").with_label(name.clone()),
                );
                self.last_choice = Some(name.clone());
                let result = self.manager.execute_pattern(&self.archetype, &name, &pattern_ctx);
                (name, result)
            }
        };

        let status = match result {
            Ok(status) => status,
            Err(err) => {
                tracing::warn!(error = %err, "attack pattern vanished mid-execution");
                return BtStatus::Failure;
            }
        };

        trace_emit(
            blackboard,
            TraceEvent::new(ctx.tick, "patterns.execute")
                .with_label(name.clone())
                .with_a(status.code()),
        );
        if status.is_running() {
            self.running = Some(name);
        }
        status
    }

    fn reset(&mut self) {
        if let Some(name) = self.running.take() {
            if let Some(pattern) = self.manager.get_pattern_mut(&self.archetype, &name) {
                pattern.tree_mut().reset();
            }
        }
    }

    fn kind(&self) -> NodeKind {
        NodeKind::Custom
    }

    fn name(&self) -> &str {
        self.name.as_deref().unwrap_or("AttackPatterns")
    }

    fn set_name(&mut self, name: String) {
        self.name = Some(name);
    }
}
