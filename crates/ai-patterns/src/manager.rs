use std::collections::BTreeMap;

use ai_bt::BtStatus;

use crate::{AttackPattern, PatternContext, PatternError, PatternTuning, Result};

/// Attack patterns grouped by enemy archetype.
///
/// Owned per agent: cooldown stamps live on the patterns, so two agents sharing a manager would
/// share cooldowns.
#[derive(Debug, Default)]
pub struct AttackPatternManager {
    patterns: BTreeMap<String, Vec<AttackPattern>>,
}

impl AttackPatternManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a pattern. Registration order is the tie-break among equal priorities.
    ///
    /// # Errors
    ///
    /// Fails if the archetype already has a pattern with the same name. Patterns are executed
    /// and tuned by name, so a name must pick out one pattern.
    pub fn register(
        &mut self,
        archetype: impl Into<String>,
        pattern: AttackPattern,
    ) -> Result<&mut Self> {
        let archetype = archetype.into();
        if self.get_pattern(&archetype, pattern.name()).is_some() {
            return Err(PatternError::DuplicatePattern {
                archetype,
                pattern: pattern.name().to_owned(),
            });
        }
        self.patterns.entry(archetype).or_default().push(pattern);
        Ok(self)
    }

    pub fn archetypes(&self) -> impl Iterator<Item = &str> {
        self.patterns.keys().map(String::as_str)
    }

    /// Registered patterns in registration order; empty for an unknown archetype.
    pub fn get_available_patterns(&self, archetype: &str) -> &[AttackPattern] {
        self.patterns
            .get(archetype)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn get_pattern(&self, archetype: &str, name: &str) -> Option<&AttackPattern> {
        self.get_available_patterns(archetype)
            .iter()
            .find(|p| p.name() == name)
    }

    pub fn get_pattern_mut(&mut self, archetype: &str, name: &str) -> Option<&mut AttackPattern> {
        self.pattern_mut(archetype, name).ok()
    }

    /// Highest-priority pattern that passes its condition and is off cooldown.
    pub fn select_best_pattern(
        &self,
        archetype: &str,
        ctx: &PatternContext,
    ) -> Option<&AttackPattern> {
        let index = self.best_index(archetype, ctx)?;
        self.patterns.get(archetype).map(|patterns| &patterns[index])
    }

    pub fn select_best_pattern_mut(
        &mut self,
        archetype: &str,
        ctx: &PatternContext,
    ) -> Option<&mut AttackPattern> {
        let index = self.best_index(archetype, ctx)?;
        self.patterns
            .get_mut(archetype)
            .map(|patterns| &mut patterns[index])
    }

    /// Stamps the pattern's cooldown at `ctx.now()`, then ticks its tree once.
    ///
    /// Stamping first means an instantly finishing pattern is still excluded from the next
    /// selection.
    ///
    /// # Errors
    ///
    /// Fails if the archetype or the pattern is not registered.
    pub fn execute_pattern(
        &mut self,
        archetype: &str,
        name: &str,
        ctx: &PatternContext,
    ) -> Result<BtStatus> {
        let pattern = self.pattern_mut(archetype, name)?;
        pattern.mark_used(ctx.now());
        let status = pattern.execute(ctx);
        tracing::debug!(archetype, pattern = name, ?status, "executed attack pattern");
        Ok(status)
    }

    /// Ticks a pattern that is already running without touching its cooldown.
    ///
    /// # Errors
    ///
    /// Fails if the archetype or the pattern is not registered.
    pub fn resume_pattern(
        &mut self,
        archetype: &str,
        name: &str,
        ctx: &PatternContext,
    ) -> Result<BtStatus> {
        let pattern = self.pattern_mut(archetype, name)?;
        Ok(pattern.execute(ctx))
    }

    /// Applies priority and cooldown overrides.
    ///
    /// # Errors
    ///
    /// Fails on the first archetype or pattern named in `tuning` that is not registered. Earlier
    /// overrides stay applied.
    pub fn apply_tuning(&mut self, tuning: &PatternTuning) -> Result<()> {
        for (archetype, overrides) in &tuning.archetypes {
            for (name, tune) in overrides {
                let pattern = self.pattern_mut(archetype, name)?;
                if let Some(priority) = tune.priority {
                    pattern.set_priority(priority);
                }
                if let Some(cooldown) = tune.cooldown() {
                    pattern.set_cooldown(cooldown);
                }
            }
        }
        Ok(())
    }

    fn pattern_mut(&mut self, archetype: &str, name: &str) -> Result<&mut AttackPattern> {
        let patterns = self
            .patterns
            .get_mut(archetype)
            .ok_or_else(|| PatternError::UnknownArchetype(archetype.to_owned()))?;
        patterns
            .iter_mut()
            .find(|p| p.name() == name)
            .ok_or_else(|| PatternError::UnknownPattern {
                archetype: archetype.to_owned(),
                pattern: name.to_owned(),
            })
    }

    fn best_index(&self, archetype: &str, ctx: &PatternContext) -> Option<usize> {
        let patterns = self.patterns.get(archetype)?;

        let mut best: Option<(usize, i32)> = None;
        for (i, pattern) in patterns.iter().enumerate() {
            if !pattern.is_eligible(ctx) {
                continue;
            }
            // Strict comparison keeps the earliest registered pattern on ties.
            if best.is_none_or(|(_, priority)| pattern.priority() > priority) {
                best = Some((i, pattern.priority()));
            }
        }

        match best {
            Some((i, _)) => tracing::debug!(
                archetype,
                pattern = patterns[i].name(),
                tick = ctx.tick.tick,
                "selected attack pattern"
            ),
            None => tracing::trace!(archetype, tick = ctx.tick.tick, "no attack pattern eligible"),
        }

        best.map(|(i, _)| i)
    }
}
