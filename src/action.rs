use rand::Rng;
use rocket::serde::{Deserialize, Serialize};
use rocket_okapi::JsonSchema;

/// One resolved outcome of an action.
///
/// All magnitudes are non-negative; a field left at zero means the action had
/// no such component. `self_*` fields apply to the side that acted, `enemy_*`
/// fields to its opponent. An effect is immutable once resolved and is stored
/// verbatim in the session's action log.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(crate = "rocket::serde")]
pub struct Effect {
    pub self_heal: u32,
    pub self_damage: u32,
    pub enemy_damage: u32,
    pub enemy_heal: u32,

    pub gain_armor: u32,
    pub gain_damage_boost: u32,
    pub loose_armor: u32,
    pub loose_damage_boost: u32,
}

fn rocket_damage(rng: &mut impl Rng) -> u32 {
    rng.random_range(0..=50)
}

fn rocket_hits(rng: &mut impl Rng) -> bool {
    rng.random::<f64>() < 0.6
}

fn charge_hits(rng: &mut impl Rng) -> bool {
    rng.random::<f64>() < 0.75
}

fn granade_hits(rng: &mut impl Rng) -> bool {
    rng.random::<f64>() < 0.7
}

fn flamethrower_fires(rng: &mut impl Rng) -> bool {
    rng.random::<f64>() < 0.9
}

// Half the time a botched action also costs one point of damage boost.
fn fail_rage_loss(rng: &mut impl Rng) -> u32 {
    u32::from(rng.random::<f64>() < 0.5)
}

/// The closed set of combat moves a side may perform in a turn.
///
/// The serialized names are a wire contract shared with the external tool
/// process and must not change: `shoot_rocket`, `rage_up`, `heal`, `charge`,
/// `throw_granade`, `fire_flamethrower`. Note that the patch-up action goes
/// by `heal` on the wire and that `throw_granade` keeps its historical
/// spelling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(crate = "rocket::serde", rename_all = "snake_case")]
pub enum ActionKind {
    ShootRocket,
    RageUp,
    #[serde(rename = "heal")]
    PatchUp,
    Charge,
    ThrowGranade,
    FireFlamethrower,
}

impl ActionKind {
    /// All known actions.
    pub fn all() -> Vec<ActionKind> {
        vec![
            ActionKind::ShootRocket,
            ActionKind::RageUp,
            ActionKind::PatchUp,
            ActionKind::Charge,
            ActionKind::ThrowGranade,
            ActionKind::FireFlamethrower,
        ]
    }

    /// Roll this action's outcome against the given random source.
    ///
    /// The canonical table:
    /// - `shoot_rocket`: 60% hit for 0..=50 enemy damage; a miss deals
    ///   0..=50 self damage and may cost a point of damage boost.
    /// - `rage_up`: +1 damage boost, always.
    /// - `heal`: restores 5..=50 to the actor and half of an independent
    ///   5..=50 roll to the opponent, so pure healing never dominates.
    /// - `charge`: 75% hit for 40 enemy damage with 10 recoil; a miss deals
    ///   30 self damage and may cost a point of damage boost.
    /// - `throw_granade`: 70% hit for 25 enemy damage; a miss costs one
    ///   armor and may cost a point of damage boost.
    /// - `fire_flamethrower`: 90% for 100 enemy damage; the backfire deals
    ///   100 self damage and may cost a point of damage boost.
    pub fn resolve(self, rng: &mut impl Rng) -> Effect {
        let mut effect = Effect::default();
        match self {
            ActionKind::ShootRocket => {
                if rocket_hits(rng) {
                    effect.enemy_damage = rocket_damage(rng);
                } else {
                    effect.self_damage = rocket_damage(rng);
                    effect.loose_damage_boost = fail_rage_loss(rng);
                }
            }
            ActionKind::RageUp => {
                effect.gain_damage_boost = 1;
            }
            ActionKind::PatchUp => {
                effect.self_heal = rng.random_range(5..=50);
                effect.enemy_heal = rng.random_range(5..=50) / 2;
            }
            ActionKind::Charge => {
                if charge_hits(rng) {
                    effect.enemy_damage = 40;
                    effect.self_damage = 10;
                } else {
                    effect.self_damage = 30;
                    effect.loose_damage_boost = fail_rage_loss(rng);
                }
            }
            ActionKind::ThrowGranade => {
                if granade_hits(rng) {
                    effect.enemy_damage = 25;
                } else {
                    effect.loose_armor = 1;
                    effect.loose_damage_boost = fail_rage_loss(rng);
                }
            }
            ActionKind::FireFlamethrower => {
                if flamethrower_fires(rng) {
                    effect.enemy_damage = 100;
                } else {
                    effect.self_damage = 100;
                    effect.loose_damage_boost = fail_rage_loss(rng);
                }
            }
        }
        effect
    }
}
