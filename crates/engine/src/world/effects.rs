use std::collections::HashMap;

/// Duration that never runs out on its own.
pub const EFFECT_PERMANENT: f64 = f64::INFINITY;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EffectId(pub &'static str);

impl EffectId {
    pub fn name(self) -> &'static str {
        self.0
    }
}

pub const EFFECT_UNCONSCIOUS: EffectId = EffectId("unconscious");
pub const EFFECT_BOUND: EffectId = EffectId("bound");

/// Absolute expiry times keyed by effect. An entry at or before `now` is
/// inactive; entries are never pruned so a cleared effect simply reads false.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EffectSet {
    expires_at: HashMap<EffectId, f64>,
}

impl EffectSet {
    /// Duration 0 clears the effect from the next query on.
    pub fn add(&mut self, effect: EffectId, duration_seconds: f64, now: f64) {
        self.expires_at.insert(effect, now + duration_seconds);
    }

    pub fn has(&self, effect: EffectId, now: f64) -> bool {
        self.expires_at
            .get(&effect)
            .is_some_and(|expires_at| *expires_at > now)
    }

    pub fn expires_at(&self, effect: EffectId) -> Option<f64> {
        self.expires_at.get(&effect).copied()
    }

    pub fn active(&self, now: f64) -> Vec<EffectId> {
        let mut active = self
            .expires_at
            .iter()
            .filter(|(_, expires_at)| **expires_at > now)
            .map(|(effect, _)| *effect)
            .collect::<Vec<_>>();
        active.sort();
        active
    }
}
