use std::collections::BTreeMap;

use log::warn;
use serde::Deserialize;

use crate::model::game_state::{Attributes, EntityId, HealthPool, Weapon};

/// Consecutive wins that finish the game.
pub const WINS_TO_COMPLETE: u32 = 5;

/// Character as any endpoint may send it. Every field is optional: battle
/// responses often carry only the fields that changed.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct CharacterRecord {
    pub id: Option<EntityId>,
    pub name: Option<String>,
    #[serde(alias = "char_class")]
    pub class: Option<String>,
    pub class_levels: Option<BTreeMap<String, u32>>,
    pub attributes: Option<AttributesRecord>,
    pub strength: Option<i64>,
    pub agility: Option<i64>,
    pub endurance: Option<i64>,
    #[serde(alias = "current_health")]
    pub health: Option<i64>,
    pub max_health: Option<i64>,
    pub total_level: Option<u32>,
    #[serde(alias = "current_weapon")]
    pub weapon: Option<Weapon>,
    #[serde(alias = "consecutive_wins")]
    pub wins: Option<u32>,
    #[serde(alias = "alive")]
    pub is_alive: Option<bool>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct AttributesRecord {
    pub strength: Option<i64>,
    pub agility: Option<i64>,
    pub endurance: Option<i64>,
}

/// Client-side cache of the server's character.
///
/// Invariants after every construction or merge:
/// - a known health pool satisfies `0 <= current <= max`;
/// - with a known pool, `alive == (current > 0)`;
/// - a dead character has no win streak.
#[derive(Debug, Clone, PartialEq)]
pub struct Character {
    pub id: Option<EntityId>,
    pub name: String,
    pub class: Option<String>,
    pub class_levels: BTreeMap<String, u32>,
    pub attributes: Attributes,
    pub health: Option<HealthPool>,
    pub total_level: u32,
    pub weapon: Option<Weapon>,
    pub wins: u32,
    pub alive: bool,
}

impl Character {
    pub fn from_record(record: CharacterRecord) -> Self {
        let blank = Character {
            id: None,
            name: String::new(),
            class: None,
            class_levels: BTreeMap::new(),
            attributes: Attributes::default(),
            health: None,
            total_level: 1,
            weapon: None,
            wins: 0,
            alive: true,
        };
        blank.merged(record)
    }

    /// Overlay a (possibly partial) record on this character. A record for a
    /// different character id replaces the cache entirely.
    pub fn merged(&self, record: CharacterRecord) -> Self {
        if let (Some(current), Some(incoming)) = (&self.id, &record.id) {
            if current != incoming {
                return Character::from_record(record);
            }
        }

        let mut next = self.clone();

        if record.id.is_some() {
            next.id = record.id;
        }
        if let Some(name) = record.name {
            next.name = name;
        }
        if let Some(levels) = record.class_levels {
            next.class_levels = levels;
        }
        match record.class {
            Some(class) => next.class = Some(class),
            None if next.class.is_none() => next.class = main_class(&next.class_levels),
            None => {}
        }
        if let Some(level) = record.total_level {
            next.total_level = level;
        }
        if record.weapon.is_some() {
            next.weapon = record.weapon;
        }

        let nested = record.attributes.unwrap_or_default();
        let a = &mut next.attributes;
        if let Some(v) = nested.strength.or(record.strength) {
            a.strength = v;
        }
        if let Some(v) = nested.agility.or(record.agility) {
            a.agility = v;
        }
        if let Some(v) = nested.endurance.or(record.endurance) {
            a.endurance = v;
        }

        let max = record.max_health.or(next.health.map(|p| p.max));
        match (record.health, max) {
            (Some(current), Some(max)) => next.health = Some(HealthPool::new(current, max)),
            (Some(current), None) => next.health = Some(HealthPool::new(current, current)),
            (None, Some(max)) => next.health = next.health.map(|p| HealthPool::new(p.current, max)),
            (None, None) => {}
        }

        next.alive = match (record.health, record.is_alive, next.health) {
            (Some(_), flag, Some(pool)) => {
                let alive = !pool.is_empty();
                if flag.is_some_and(|f| f != alive) {
                    warn!(
                        "server is_alive={:?} contradicts health {}/{}; trusting health",
                        flag, pool.current, pool.max
                    );
                }
                alive
            }
            (_, Some(flag), pool) => {
                next.health = match pool {
                    Some(p) if !flag => Some(p.with_current(0)),
                    // Alive with an empty pool means the pool is stale.
                    Some(p) if p.is_empty() => None,
                    other => other,
                };
                flag
            }
            (_, None, Some(pool)) => !pool.is_empty(),
            (_, None, None) => next.alive,
        };

        if let Some(wins) = record.wins {
            next.wins = wins;
        }
        if !next.alive {
            next.wins = 0;
        }

        next
    }

    pub fn has_won_game(&self) -> bool {
        self.wins >= WINS_TO_COMPLETE
    }

    pub fn display_name(&self) -> &str {
        if self.name.is_empty() {
            "Unnamed"
        } else {
            &self.name
        }
    }

    #[cfg(test)]
    pub fn holds_invariants(&self) -> bool {
        let pool_ok = match self.health {
            Some(p) => p.current >= 0 && p.current <= p.max && self.alive == (p.current > 0),
            None => true,
        };
        pool_ok && (self.alive || self.wins == 0)
    }
}

fn main_class(levels: &BTreeMap<String, u32>) -> Option<String> {
    levels
        .iter()
        .max_by_key(|(_, level)| **level)
        .map(|(name, _)| name.clone())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(value: serde_json::Value) -> CharacterRecord {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn reads_the_flat_shape() {
        let c = Character::from_record(record(json!({
            "id": 1, "name": "Rogan", "char_class": "warrior",
            "strength": 3, "agility": 2, "endurance": 1,
            "health": 8, "max_health": 10, "wins": 2, "is_alive": true
        })));
        assert_eq!(c.id, Some(EntityId::Number(1)));
        assert_eq!(c.class.as_deref(), Some("warrior"));
        assert_eq!(c.attributes, Attributes { strength: 3, agility: 2, endurance: 1 });
        assert_eq!(c.health, Some(HealthPool { current: 8, max: 10 }));
        assert_eq!(c.wins, 2);
        assert!(c.alive);
        assert!(c.holds_invariants());
    }

    #[test]
    fn reads_the_nested_session_shape() {
        let c = Character::from_record(record(json!({
            "class_levels": {"barbarian": 1},
            "attributes": {"strength": 2, "agility": 3, "endurance": 1},
            "weapon": {"id": 4, "name": "Club", "damage": 3, "damage_type": "crushing"},
            "health": 7, "max_health": 7, "total_level": 1, "consecutive_wins": 1
        })));
        assert_eq!(c.class.as_deref(), Some("barbarian"));
        assert_eq!(c.attributes.agility, 3);
        assert_eq!(c.weapon.as_ref().map(|w| w.name.as_str()), Some("Club"));
        assert_eq!(c.weapon.as_ref().and_then(|w| w.weapon_type.as_deref()), Some("crushing"));
        assert_eq!(c.wins, 1);
    }

    #[test]
    fn partial_update_keeps_cached_fields() {
        let base = Character::from_record(record(json!({
            "id": 1, "name": "Rogan", "health": 10, "max_health": 10, "wins": 0
        })));
        let next = base.merged(record(json!({"id": 1, "wins": 1, "is_alive": true})));
        assert_eq!(next.name, "Rogan");
        assert_eq!(next.wins, 1);
        assert_eq!(next.health, Some(HealthPool { current: 10, max: 10 }));
        assert!(next.holds_invariants());
    }

    #[test]
    fn death_flag_empties_health_and_resets_streak() {
        let base = Character::from_record(record(json!({
            "id": 1, "name": "Rogan", "health": 10, "max_health": 10, "wins": 3
        })));
        let next = base.merged(record(json!({"id": 1, "wins": 2, "is_alive": false})));
        assert!(!next.alive);
        assert_eq!(next.health, Some(HealthPool { current: 0, max: 10 }));
        assert_eq!(next.wins, 0);
        assert!(next.holds_invariants());
    }

    #[test]
    fn health_wins_over_contradicting_flag() {
        let c = Character::from_record(record(json!({
            "id": 1, "health": 0, "max_health": 10, "is_alive": true, "wins": 4
        })));
        assert!(!c.alive);
        assert_eq!(c.wins, 0);
        assert!(c.holds_invariants());
    }

    #[test]
    fn revived_flag_drops_stale_empty_pool() {
        let dead = Character::from_record(record(json!({"id": 1, "health": 0, "max_health": 10})));
        let revived = dead.merged(record(json!({"id": 1, "is_alive": true})));
        assert!(revived.alive);
        assert_eq!(revived.health, None);
        assert!(revived.holds_invariants());
    }

    #[test]
    fn different_id_replaces_everything() {
        let a = Character::from_record(record(json!({"id": 1, "name": "A", "wins": 3})));
        let b = a.merged(record(json!({"id": 2, "name": "B"})));
        assert_eq!(b.name, "B");
        assert_eq!(b.wins, 0);
    }

    #[test]
    fn overfull_health_is_clamped() {
        let c = Character::from_record(record(json!({"id": 1, "health": 15, "max_health": 10})));
        assert_eq!(c.health, Some(HealthPool { current: 10, max: 10 }));
        assert!(c.holds_invariants());
    }

    #[test]
    fn five_wins_completes_the_game() {
        let c = Character::from_record(record(json!({"id": 1, "wins": 5, "is_alive": true})));
        assert!(c.has_won_game());
    }
}
