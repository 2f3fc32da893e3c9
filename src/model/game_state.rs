use std::fmt;

use rand::Rng;
use serde::{Deserialize, Serialize};

/// Server identifiers arrive as numbers from some endpoints and strings
/// from others. Both compare by their textual form once parsed.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum EntityId {
    Number(i64),
    Text(String),
}

impl EntityId {
    /// Parse user input (e.g. the "load by id" box). Blank input is no id.
    pub fn parse(input: &str) -> Option<Self> {
        let input = input.trim();
        if input.is_empty() {
            return None;
        }
        Some(match input.parse::<i64>() {
            Ok(n) => EntityId::Number(n),
            Err(_) => EntityId::Text(input.to_string()),
        })
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntityId::Number(n) => write!(f, "{n}"),
            EntityId::Text(s) => f.write_str(s),
        }
    }
}

/* =========================
   Health
   ========================= */

/// Current/max health, always normalised so that `0 <= current <= max`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HealthPool {
    pub current: i64,
    pub max: i64,
}

impl HealthPool {
    pub fn new(current: i64, max: i64) -> Self {
        let max = max.max(0);
        Self {
            current: current.clamp(0, max),
            max,
        }
    }

    pub fn with_current(self, current: i64) -> Self {
        Self::new(current, self.max)
    }

    pub fn is_empty(&self) -> bool {
        self.current == 0
    }
}

/* =========================
   Weapons & monsters
   ========================= */

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Weapon {
    #[serde(default)]
    pub id: Option<EntityId>,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub damage: i64,
    #[serde(default, alias = "damage_type")]
    pub weapon_type: Option<String>,
}

impl Weapon {
    pub fn label(&self) -> String {
        format!("{} (DMG {})", self.name, self.damage)
    }
}

/// Monster as the server sends it.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct MonsterRecord {
    #[serde(default)]
    pub id: Option<EntityId>,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub health: i64,
    #[serde(default)]
    pub max_health: Option<i64>,
    #[serde(default)]
    pub special_ability: Option<String>,
}

/// Opponent of the current encounter. Lives only until the battle resolves.
#[derive(Debug, Clone, PartialEq)]
pub struct Monster {
    pub id: Option<EntityId>,
    pub name: String,
    pub health: HealthPool,
    pub special_ability: Option<String>,
}

impl Monster {
    /// Without a server-side max, the health seen at encounter time is the max.
    pub fn from_record(record: MonsterRecord) -> Self {
        let max = record.max_health.unwrap_or(record.health).max(record.health);
        Self {
            id: record.id,
            name: record.name,
            health: HealthPool::new(record.health, max),
            special_ability: record.special_ability.filter(|s| !s.trim().is_empty()),
        }
    }
}

/* =========================
   Classes & attributes
   ========================= */

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Attributes {
    pub strength: i64,
    pub agility: i64,
    pub endurance: i64,
}

impl Attributes {
    /// Fresh characters start with each attribute in 1..=3.
    pub fn roll<R: Rng + ?Sized>(rng: &mut R) -> Self {
        Self {
            strength: rng.gen_range(1..=3),
            agility: rng.gen_range(1..=3),
            endurance: rng.gen_range(1..=3),
        }
    }
}

/// Entry of the class catalogue.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CharacterClass {
    #[serde(default)]
    pub id: Option<EntityId>,
    pub name: String,
    #[serde(default)]
    pub health_per_level: Option<i64>,
    #[serde(default)]
    pub initial_weapon: Option<Weapon>,
    #[serde(default)]
    pub level1_bonus: Option<String>,
    #[serde(default)]
    pub level2_bonus: Option<String>,
    #[serde(default)]
    pub level3_bonus: Option<String>,
}

impl CharacterClass {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            id: None,
            name: name.into(),
            health_per_level: None,
            initial_weapon: None,
            level1_bonus: None,
            level2_bonus: None,
            level3_bonus: None,
        }
    }

    pub fn bonuses(&self) -> impl Iterator<Item = (u32, &str)> {
        [&self.level1_bonus, &self.level2_bonus, &self.level3_bonus]
            .into_iter()
            .zip(1..)
            .filter_map(|(bonus, level)| bonus.as_deref().map(|b| (level, b)))
    }
}

/* =========================
   Battle outcome
   ========================= */

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BattleOutcome {
    Win,
    Loss,
    Other(String),
}

impl BattleOutcome {
    pub fn from_wire(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "win" | "won" | "victory" => BattleOutcome::Win,
            "loss" | "lose" | "lost" | "defeat" => BattleOutcome::Loss,
            _ => BattleOutcome::Other(raw.to_string()),
        }
    }
}

impl fmt::Display for BattleOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BattleOutcome::Win => f.write_str("win"),
            BattleOutcome::Loss => f.write_str("loss"),
            BattleOutcome::Other(raw) => f.write_str(raw),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn ids_parse_numbers_and_text() {
        assert_eq!(EntityId::parse(" 12 "), Some(EntityId::Number(12)));
        assert_eq!(EntityId::parse("abc"), Some(EntityId::Text("abc".into())));
        assert_eq!(EntityId::parse("   "), None);
    }

    #[test]
    fn numeric_and_string_ids_deserialize() {
        let n: EntityId = serde_json::from_str("7").unwrap();
        let s: EntityId = serde_json::from_str("\"x-7\"").unwrap();
        assert_eq!(n, EntityId::Number(7));
        assert_eq!(s.to_string(), "x-7");
    }

    #[test]
    fn health_pool_clamps_into_range() {
        assert_eq!(HealthPool::new(-4, 10), HealthPool { current: 0, max: 10 });
        assert_eq!(HealthPool::new(14, 10), HealthPool { current: 10, max: 10 });
        assert_eq!(HealthPool::new(3, -1), HealthPool { current: 0, max: 0 });
    }

    #[test]
    fn monster_without_max_uses_encounter_health() {
        let m = Monster::from_record(MonsterRecord {
            id: Some(EntityId::Number(2)),
            name: "Goblin".into(),
            health: 5,
            max_health: None,
            special_ability: Some(" ".into()),
        });
        assert_eq!(m.health, HealthPool { current: 5, max: 5 });
        assert_eq!(m.special_ability, None);

        let damaged = Monster::from_record(MonsterRecord {
            id: None,
            name: "Dragon".into(),
            health: 10,
            max_health: Some(20),
            special_ability: None,
        });
        assert_eq!(damaged.health, HealthPool { current: 10, max: 20 });
    }

    #[test]
    fn rolled_attributes_stay_in_range() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..50 {
            let a = Attributes::roll(&mut rng);
            for v in [a.strength, a.agility, a.endurance] {
                assert!((1..=3).contains(&v));
            }
        }
    }

    #[test]
    fn outcome_reads_common_spellings() {
        assert_eq!(BattleOutcome::from_wire("WIN"), BattleOutcome::Win);
        assert_eq!(BattleOutcome::from_wire("defeat"), BattleOutcome::Loss);
        assert_eq!(BattleOutcome::from_wire("draw").to_string(), "draw");
    }

    #[test]
    fn class_bonuses_skip_missing_levels() {
        let mut class = CharacterClass::named("Rogue");
        class.level1_bonus = Some("Sneak attack".into());
        class.level3_bonus = Some("Poison".into());
        let bonuses: Vec<_> = class.bonuses().collect();
        assert_eq!(bonuses, vec![(1, "Sneak attack"), (3, "Poison")]);
    }
}
