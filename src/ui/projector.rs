use crate::engine::session::{SessionState, View};
use crate::model::character::WINS_TO_COMPLETE;
use crate::model::game_state::{CharacterClass, HealthPool};

/// Share of `max` that `current` represents, as a percentage in `[0, 100]`.
/// A non-positive `max` renders as an empty bar.
pub fn health_fill_percent(current: i64, max: i64) -> f32 {
    if max <= 0 {
        return 0.0;
    }
    (current as f64 / max as f64 * 100.0).clamp(0.0, 100.0) as f32
}

#[derive(Debug, Clone, PartialEq)]
pub struct HealthBar {
    pub label: String,
    pub current: i64,
    pub max: i64,
    pub percent: f32,
}

impl HealthBar {
    fn new(label: impl Into<String>, pool: HealthPool) -> Self {
        Self {
            label: label.into(),
            current: pool.current,
            max: pool.max,
            percent: health_fill_percent(pool.current, pool.max),
        }
    }

    pub fn text(&self) -> String {
        format!("{} / {}", self.current, self.max)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusKind {
    NoCharacter,
    Streak,
    Dead,
    Victory,
}

/// Which controls accept a click right now.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Controls {
    pub create: bool,
    pub load: bool,
    pub encounter: bool,
    pub battle: bool,
    pub equip: bool,
    pub discard: bool,
    pub choose_weapon: bool,
    pub level_up: bool,
    pub delete: bool,
    pub settings: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ProjectedView {
    pub view: View,
    pub status: String,
    pub status_kind: StatusKind,
    pub character_bar: Option<HealthBar>,
    pub monster_bar: Option<HealthBar>,
    pub weapon_info: String,
    pub drop_info: String,
    pub controls: Controls,
}

pub fn project(state: &SessionState, in_flight: bool) -> ProjectedView {
    let character = state.character();
    let present = character.is_some();
    let alive = character.is_some_and(|c| c.alive);
    let complete = state.game_complete();
    let has_drop = state.pending_drop().is_some();
    let idle = !in_flight;

    let controls = Controls {
        create: idle,
        load: idle,
        encounter: idle && alive && !complete,
        battle: idle && alive && !complete,
        equip: idle && alive && has_drop,
        discard: idle && has_drop,
        choose_weapon: idle && alive && has_drop,
        level_up: idle && present,
        delete: idle && present,
        settings: idle,
    };

    let (status_kind, status) = match character {
        None => (StatusKind::NoCharacter, "No character loaded".to_string()),
        Some(c) if !c.alive => (
            StatusKind::Dead,
            "Character is dead. Create or load another.".to_string(),
        ),
        Some(_) if complete => (
            StatusKind::Victory,
            format!("You beat {WINS_TO_COMPLETE} monsters in a row! Game complete."),
        ),
        Some(c) => (StatusKind::Streak, format!("Wins in a row: {}", c.wins)),
    };

    let character_bar = character
        .and_then(|c| c.health.map(|pool| HealthBar::new(c.display_name(), pool)));

    let monster_bar = match (state.monster(), state.last_battle()) {
        (Some(m), _) => Some(HealthBar::new(m.name.clone(), m.health)),
        (None, Some(report)) => report.monster_health.map(|pool| {
            HealthBar::new(report.monster_name.clone().unwrap_or_else(|| "Monster".into()), pool)
        }),
        (None, None) => None,
    };

    let weapon_info = match character.and_then(|c| c.weapon.as_ref()) {
        Some(w) => format!("Weapon: {}", w.label()),
        None => "Weapon: none".to_string(),
    };

    let drop_info = match state.pending_drop() {
        Some(w) => format!("Drop: {}", w.label()),
        None => "No drop".to_string(),
    };

    ProjectedView {
        view: state.view(),
        status,
        status_kind,
        character_bar,
        monster_bar,
        weapon_info,
        drop_info,
        controls,
    }
}

/// Classes to offer in pickers: the server catalogue, else the configured fallback.
pub fn class_choices(state: &SessionState, fallback: &[String]) -> Vec<CharacterClass> {
    if state.classes().is_empty() {
        fallback.iter().map(CharacterClass::named).collect()
    } else {
        state.classes().to_vec()
    }
}
