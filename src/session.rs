use rand::Rng;
use rocket::serde::{Deserialize, Serialize};
use rocket_okapi::JsonSchema;

use crate::action::{ActionKind, Effect};

/// Opponent descriptor handed to the external agent when it chooses and
/// narrates the enemy's turns. Combat numbers live on the session itself.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(crate = "rocket::serde")]
pub struct Enemy {
    pub role: String,
}

// Roster cycled as the player racks up kills.
const ENEMY_ROSTER: [&str; 4] = ["Human", "Eldar", "Squat", "Chaos Marine"];

impl Enemy {
    /// The opponent fielded after `kills` defeats; a fresh session faces
    /// wave zero.
    pub fn for_wave(kills: i64) -> Enemy {
        Enemy {
            role: ENEMY_ROSTER[kills as usize % ENEMY_ROSTER.len()].to_string(),
        }
    }
}

/// Which side performed an action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(crate = "rocket::serde", rename_all = "snake_case")]
pub enum Side {
    Player,
    Enemy,
}

/// One entry of a session's append-only action log: the action taken, the
/// side that took it and the effect it resolved to. Entries are never edited
/// or removed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(crate = "rocket::serde")]
pub struct ActionRecord {
    pub action: ActionKind,
    pub side: Side,
    pub effect: Effect,
}

/// Damage after mitigation and amplification: the defender's armor divides,
/// the attacker's rage multiplies. The floored quotient is what rounds the
/// surviving health upward. Armor never drops below 1, which bounds the
/// division.
fn mitigated(damage: u32, rage: i64, armor: i64) -> i64 {
    i64::from(damage) * rage.max(1) / armor.max(1)
}

/// One battle between a player and an escalating series of enemies.
///
/// Sessions are created lazily on first reference and mutated exclusively
/// through [`GameSession::act`] / [`GameSession::apply_effect`]. After every
/// mutation: armor and rage stay at 1 or above on both sides, health stays
/// within `0..=max` on both sides, and the action log has only grown.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(crate = "rocket::serde")]
pub struct GameSession {
    pub name: String,

    pub current_health: i64,
    pub max_health: i64,
    pub armor: i64,
    pub rage: i64,

    pub enemy_current_health: i64,
    pub enemy_max_health: i64,
    pub enemy_rage: i64,
    pub enemy_armor: i64,

    pub kills: i64,
    pub gameover: bool,
    pub actions: Vec<ActionRecord>,
    pub current_enemy: Enemy,
}

impl GameSession {
    pub fn new_session(name: &str) -> GameSession {
        GameSession {
            name: name.to_string(),
            current_health: 100,
            max_health: 100,
            armor: 1,
            rage: 1,
            enemy_current_health: 100,
            enemy_max_health: 100,
            enemy_rage: 1,
            enemy_armor: 1,
            kills: 0,
            gameover: false,
            actions: Vec::new(),
            current_enemy: Enemy::for_wave(0),
        }
    }

    /// Resolve `action` against `rng` and apply the outcome as one turn.
    ///
    /// Returns the appended log record, or `None` when the session is
    /// already over, in which case nothing is mutated.
    pub fn act(
        &mut self,
        action: ActionKind,
        player_turn: bool,
        rng: &mut impl Rng,
    ) -> Option<&ActionRecord> {
        if self.gameover {
            return None;
        }
        let effect = action.resolve(rng);
        self.apply_effect(action, player_turn, effect)
    }

    /// Apply an already-resolved effect as one turn. Deterministic; kept
    /// separate from [`GameSession::act`] so the arithmetic can be driven
    /// with fixed effects.
    ///
    /// The acting side takes `self_damage` (mitigated by its own armor,
    /// amplified by its opponent's rage) and `self_heal`, then its armor and
    /// rage adjust, floored at 1. The opponent then takes `enemy_damage`
    /// (mitigated by its armor, amplified by the actor's updated rage) and
    /// `enemy_heal`. Whichever way it happens, the player side reaching zero
    /// ends the game, and the enemy side reaching zero counts a kill and
    /// spawns a stronger enemy.
    pub fn apply_effect(
        &mut self,
        action: ActionKind,
        player_turn: bool,
        effect: Effect,
    ) -> Option<&ActionRecord> {
        if self.gameover {
            return None;
        }

        if player_turn {
            let recoil = mitigated(effect.self_damage, self.enemy_rage, self.armor);
            let next = self.current_health + i64::from(effect.self_heal) - recoil;
            if next <= 0 {
                self.current_health = 0;
                self.gameover = true;
            } else {
                self.current_health = next.min(self.max_health);
            }

            self.armor =
                (self.armor + i64::from(effect.gain_armor) - i64::from(effect.loose_armor)).max(1);
            self.rage = (self.rage + i64::from(effect.gain_damage_boost)
                - i64::from(effect.loose_damage_boost))
            .max(1);

            let hit = mitigated(effect.enemy_damage, self.rage, self.enemy_armor);
            let next = self.enemy_current_health + i64::from(effect.enemy_heal) - hit;
            if next <= 0 {
                self.spawn_stronger_enemy();
            } else {
                self.enemy_current_health = next.min(self.enemy_max_health);
            }
        } else {
            let recoil = mitigated(effect.self_damage, self.rage, self.enemy_armor);
            let next = self.enemy_current_health + i64::from(effect.self_heal) - recoil;
            if next <= 0 {
                // A replacement enemy does not inherit the dead one's stat
                // changes.
                self.spawn_stronger_enemy();
            } else {
                self.enemy_current_health = next.min(self.enemy_max_health);
                self.enemy_armor = (self.enemy_armor + i64::from(effect.gain_armor)
                    - i64::from(effect.loose_armor))
                .max(1);
                self.enemy_rage = (self.enemy_rage + i64::from(effect.gain_damage_boost)
                    - i64::from(effect.loose_damage_boost))
                .max(1);
            }

            let hit = mitigated(effect.enemy_damage, self.enemy_rage, self.armor);
            let next = self.current_health + i64::from(effect.enemy_heal) - hit;
            if next <= 0 {
                self.current_health = 0;
                self.gameover = true;
            } else {
                self.current_health = next.min(self.max_health);
            }
        }

        self.actions.push(ActionRecord {
            action,
            side: if player_turn { Side::Player } else { Side::Enemy },
            effect,
        });
        self.actions.last()
    }

    /// Count the kill and field the next, stronger wave. The player's health
    /// ceiling grows but their current health is untouched.
    fn spawn_stronger_enemy(&mut self) {
        self.kills += 1;
        self.enemy_max_health = 100 + 50 * self.kills;
        self.enemy_current_health = self.enemy_max_health;
        self.enemy_rage = 1 + self.kills / 2;
        self.enemy_armor = 1 + self.kills / 2;
        self.max_health += 20;
        self.current_enemy = Enemy::for_wave(self.kills);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_pcg::Lcg64Xsh32;

    fn seeded_rng() -> Lcg64Xsh32 {
        Lcg64Xsh32::from_seed([42u8; 16])
    }

    fn damage_effect(self_damage: u32) -> Effect {
        Effect {
            self_damage,
            ..Effect::default()
        }
    }

    #[test]
    fn new_session_starts_with_documented_defaults() {
        let session = GameSession::new_session("waaagh");
        assert_eq!("waaagh", session.name);
        assert_eq!(100, session.current_health);
        assert_eq!(100, session.max_health);
        assert_eq!(1, session.armor);
        assert_eq!(1, session.rage);
        assert_eq!(100, session.enemy_current_health);
        assert_eq!(100, session.enemy_max_health);
        assert_eq!(1, session.enemy_armor);
        assert_eq!(1, session.enemy_rage);
        assert_eq!(0, session.kills);
        assert!(!session.gameover);
        assert!(session.actions.is_empty());
        assert_eq!("Human", session.current_enemy.role);
    }

    #[test]
    fn patch_up_heals_both_sides() {
        let mut session = GameSession::new_session("s");
        session.current_health = 50;
        session.enemy_current_health = 80;

        let effect = Effect {
            self_heal: 30,
            enemy_heal: 10,
            ..Effect::default()
        };
        session.apply_effect(ActionKind::PatchUp, true, effect);

        assert_eq!(80, session.current_health);
        assert_eq!(90, session.enemy_current_health);
    }

    #[test]
    fn healing_clamps_at_max_health() {
        let mut session = GameSession::new_session("s");
        session.current_health = 90;
        session.enemy_current_health = 95;

        let effect = Effect {
            self_heal: 30,
            enemy_heal: 20,
            ..Effect::default()
        };
        session.apply_effect(ActionKind::PatchUp, true, effect);

        assert_eq!(100, session.current_health);
        assert_eq!(100, session.enemy_current_health);
    }

    #[test]
    fn armor_divides_and_enemy_rage_amplifies_incoming_damage() {
        let mut session = GameSession::new_session("s");
        session.armor = 2;
        session.enemy_rage = 3;

        session.apply_effect(ActionKind::ShootRocket, true, damage_effect(40));

        // 40 * 3 / 2 = 60 mitigated damage.
        assert_eq!(40, session.current_health);
    }

    #[test]
    fn fractional_mitigation_rounds_surviving_health_up() {
        let mut session = GameSession::new_session("s");
        session.armor = 2;

        session.apply_effect(ActionKind::ShootRocket, true, damage_effect(25));

        // 25 / 2 floors to 12, so the player keeps the half point.
        assert_eq!(88, session.current_health);
    }

    #[test]
    fn outgoing_damage_uses_the_rage_updated_this_turn() {
        let mut session = GameSession::new_session("s");
        let effect = Effect {
            gain_damage_boost: 2,
            enemy_damage: 10,
            ..Effect::default()
        };
        session.apply_effect(ActionKind::RageUp, true, effect);

        assert_eq!(3, session.rage);
        assert_eq!(70, session.enemy_current_health);
    }

    #[test]
    fn armor_and_rage_never_drop_below_one() {
        let mut session = GameSession::new_session("s");
        assert_eq!(1, session.armor);
        assert_eq!(1, session.rage);

        let effect = Effect {
            loose_armor: 5,
            loose_damage_boost: 7,
            ..Effect::default()
        };
        session.apply_effect(ActionKind::ThrowGranade, true, effect);

        assert_eq!(1, session.armor);
        assert_eq!(1, session.rage);
    }

    #[test]
    fn lethal_self_damage_ends_the_game_and_freezes_the_session() {
        let mut session = GameSession::new_session("s");
        session.current_health = 10;

        session.apply_effect(ActionKind::FireFlamethrower, true, damage_effect(100));
        assert!(session.gameover);
        assert_eq!(0, session.current_health);
        assert_eq!(1, session.actions.len());

        // The session is terminal: nothing may raise health again.
        let mut rng = seeded_rng();
        assert!(session.act(ActionKind::PatchUp, true, &mut rng).is_none());
        assert_eq!(0, session.current_health);
        assert_eq!(1, session.actions.len());
    }

    #[test]
    fn defeating_an_enemy_escalates_the_next_wave() {
        let mut session = GameSession::new_session("s");
        session.enemy_current_health = 10;

        let effect = Effect {
            enemy_damage: 50,
            ..Effect::default()
        };
        session.apply_effect(ActionKind::Charge, true, effect);

        assert_eq!(1, session.kills);
        assert_eq!(150, session.enemy_max_health);
        assert_eq!(150, session.enemy_current_health);
        assert_eq!(1, session.enemy_rage);
        assert_eq!(1, session.enemy_armor);
        assert_eq!(120, session.max_health);
        // Escalation grows the ceiling without touching current health.
        assert_eq!(100, session.current_health);
        assert_eq!("Eldar", session.current_enemy.role);

        session.enemy_current_health = 10;
        session.apply_effect(ActionKind::Charge, true, effect);

        assert_eq!(2, session.kills);
        assert_eq!(200, session.enemy_max_health);
        assert_eq!(200, session.enemy_current_health);
        assert_eq!(2, session.enemy_rage);
        assert_eq!(2, session.enemy_armor);
        assert_eq!(140, session.max_health);
    }

    #[test]
    fn enemy_turns_mirror_the_sides() {
        let mut session = GameSession::new_session("s");

        let record = session
            .apply_effect(ActionKind::Charge, false, damage_effect(10))
            .cloned()
            .unwrap();

        assert_eq!(Side::Enemy, record.side);
        assert_eq!(90, session.enemy_current_health);
        assert_eq!(100, session.current_health);
    }

    #[test]
    fn enemy_killing_itself_still_counts_as_a_kill() {
        let mut session = GameSession::new_session("s");
        session.enemy_current_health = 60;

        session.apply_effect(ActionKind::FireFlamethrower, false, damage_effect(100));

        assert_eq!(1, session.kills);
        assert_eq!(150, session.enemy_current_health);
        assert!(!session.gameover);
    }

    #[test]
    fn enemy_turn_can_end_the_game() {
        let mut session = GameSession::new_session("s");
        session.current_health = 20;

        let effect = Effect {
            enemy_damage: 50,
            ..Effect::default()
        };
        session.apply_effect(ActionKind::Charge, false, effect);

        assert!(session.gameover);
        assert_eq!(0, session.current_health);
    }

    #[test]
    fn action_log_is_append_only() {
        let mut session = GameSession::new_session("s");
        let mut rng = seeded_rng();

        session.act(ActionKind::RageUp, true, &mut rng);
        session.act(ActionKind::PatchUp, false, &mut rng);
        let prefix = session.actions.clone();
        assert_eq!(2, prefix.len());

        session.act(ActionKind::Charge, true, &mut rng);
        assert_eq!(3, session.actions.len());
        assert_eq!(prefix[..], session.actions[..2]);

        let record = &session.actions[0];
        assert_eq!(ActionKind::RageUp, record.action);
        assert_eq!(Side::Player, record.side);
    }
}
