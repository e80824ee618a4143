use engine::{SimError, UseContext, EFFECT_BOUND, EFFECT_PERMANENT, EFFECT_UNCONSCIOUS};

use super::definitions::{
    KIND_BODY_BAG, KIND_ENEMY, KIND_SLIDE, KIND_SLIDE_BLOOD, KIND_SYRINGE, KIND_SYRINGE_BLOOD,
};

pub(crate) const KNIFE_DAMAGE: f32 = 0.25;
pub(crate) const KNIFE_DAMAGE_HELPLESS: f32 = 1.0;
pub(crate) const SYRINGE_DAMAGE: f32 = 0.005;
pub(crate) const SEDATIVE_SECONDS: f64 = 5.0 * 60.0;

fn living_enemy_in_reach(context: &UseContext<'_>) -> bool {
    context.target_is(KIND_ENEMY) && context.target_health().is_some_and(|health| health > 0.0)
}

fn unconscious_enemy_in_reach(context: &UseContext<'_>) -> bool {
    context.target_is(KIND_ENEMY) && context.target_has_effect(EFFECT_UNCONSCIOUS)
}

/// Full damage against a bound or unconscious enemy.
pub(crate) fn use_knife(context: &mut UseContext<'_>) -> Result<(), SimError> {
    if !living_enemy_in_reach(context) {
        return Ok(());
    }
    let helpless =
        context.target_has_effect(EFFECT_BOUND) || context.target_has_effect(EFFECT_UNCONSCIOUS);
    context.damage_target(if helpless {
        KNIFE_DAMAGE_HELPLESS
    } else {
        KNIFE_DAMAGE
    });
    Ok(())
}

pub(crate) fn use_sedative_syringe(context: &mut UseContext<'_>) -> Result<(), SimError> {
    if !living_enemy_in_reach(context) {
        return Ok(());
    }
    context.add_target_effect(EFFECT_UNCONSCIOUS, SEDATIVE_SECONDS);
    context.redefine_item(KIND_SYRINGE)
}

pub(crate) fn use_empty_syringe(context: &mut UseContext<'_>) -> Result<(), SimError> {
    if !living_enemy_in_reach(context) {
        return Ok(());
    }
    context.damage_target(SYRINGE_DAMAGE);
    context.redefine_item(KIND_SYRINGE_BLOOD)
}

/// Empties into the first blank slide the holder carries. Needs no target.
pub(crate) fn use_blood_syringe(context: &mut UseContext<'_>) -> Result<(), SimError> {
    let Some(slide) = context.holder_item_of_kind(KIND_SLIDE) else {
        return Ok(());
    };
    context.redefine(slide, KIND_SLIDE_BLOOD)?;
    context.redefine_item(KIND_SYRINGE)
}

pub(crate) fn use_smelling_salt(context: &mut UseContext<'_>) -> Result<(), SimError> {
    if unconscious_enemy_in_reach(context) {
        context.add_target_effect(EFFECT_UNCONSCIOUS, 0.0);
    }
    Ok(())
}

/// Consumed on success.
pub(crate) fn use_plastic_wrap(context: &mut UseContext<'_>) -> Result<(), SimError> {
    if unconscious_enemy_in_reach(context) {
        context.add_target_effect(EFFECT_BOUND, EFFECT_PERMANENT);
        context.destroy_item();
    }
    Ok(())
}

pub(crate) fn use_plastic_bag(context: &mut UseContext<'_>) -> Result<(), SimError> {
    let dead_enemy =
        context.target_is(KIND_ENEMY) && context.target_health().is_some_and(|health| health == 0.0);
    if !dead_enemy {
        return Ok(());
    }
    context.destroy_target();
    context.redefine_item(KIND_BODY_BAG)
}
