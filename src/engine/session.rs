use crate::model::character::Character;
use crate::model::game_state::{BattleOutcome, CharacterClass, HealthPool, Monster, Weapon};

/// Screen the player is on. Only moves as a consequence of a transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum View {
    #[default]
    Creation,
    Battle,
    LevelUp,
    WeaponSelection,
    GameOver,
}

impl View {
    pub fn title(&self) -> &'static str {
        match self {
            View::Creation => "Character creation",
            View::Battle => "Battle",
            View::LevelUp => "Level up",
            View::WeaponSelection => "Weapon selection",
            View::GameOver => "Game over",
        }
    }
}

/// How the most recent battle ended, kept after the monster itself is gone.
#[derive(Debug, Clone, PartialEq)]
pub struct BattleReport {
    pub outcome: BattleOutcome,
    pub game_won: bool,
    pub monster_name: Option<String>,
    pub monster_health: Option<HealthPool>,
}

/// Everything the client knows for one running session. Read access is
/// public; only the transition driver in this module tree writes.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SessionState {
    character: Option<Character>,
    monster: Option<Monster>,
    pending_drop: Option<Weapon>,
    last_battle_log: Vec<String>,
    last_battle: Option<BattleReport>,
    classes: Vec<CharacterClass>,
    view: View,
    game_complete: bool,
}

impl SessionState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn character(&self) -> Option<&Character> {
        self.character.as_ref()
    }

    pub fn monster(&self) -> Option<&Monster> {
        self.monster.as_ref()
    }

    pub fn pending_drop(&self) -> Option<&Weapon> {
        self.pending_drop.as_ref()
    }

    pub fn last_battle_log(&self) -> &[String] {
        &self.last_battle_log
    }

    pub fn last_battle(&self) -> Option<&BattleReport> {
        self.last_battle.as_ref()
    }

    pub fn classes(&self) -> &[CharacterClass] {
        &self.classes
    }

    pub fn view(&self) -> View {
        self.view
    }

    /// Five straight wins, by our own count or the server's say-so.
    pub fn game_complete(&self) -> bool {
        self.game_complete
    }

    /* =========================
       Mutation (driver only)
       ========================= */

    pub(super) fn set_character(&mut self, character: Option<Character>) {
        let same = match (&self.character, &character) {
            (Some(old), Some(new)) => old.id.is_some() && old.id == new.id,
            _ => false,
        };
        let won = character.as_ref().is_some_and(Character::has_won_game);
        self.game_complete = won || (same && self.game_complete);
        self.character = character;
    }

    pub(super) fn mark_game_complete(&mut self) {
        self.game_complete = true;
    }

    pub(super) fn set_monster(&mut self, monster: Option<Monster>) {
        self.monster = monster;
    }

    pub(super) fn set_pending_drop(&mut self, drop: Option<Weapon>) {
        self.pending_drop = drop;
    }

    pub(super) fn set_battle_log(&mut self, lines: Vec<String>) {
        self.last_battle_log = lines;
    }

    pub(super) fn set_last_battle(&mut self, report: Option<BattleReport>) {
        self.last_battle = report;
    }

    pub(super) fn set_classes(&mut self, classes: Vec<CharacterClass>) {
        self.classes = classes;
    }

    pub(super) fn set_view(&mut self, view: View) {
        self.view = view;
    }

    /// Forget the encounter and everything it produced.
    pub(super) fn clear_encounter(&mut self) {
        self.monster = None;
        self.pending_drop = None;
        self.last_battle_log.clear();
        self.last_battle = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::character::CharacterRecord;
    use crate::model::game_state::EntityId;

    fn character(id: i64, wins: u32) -> Character {
        Character::from_record(CharacterRecord {
            id: Some(EntityId::Number(id)),
            name: Some("Rogan".into()),
            wins: Some(wins),
            ..CharacterRecord::default()
        })
    }

    #[test]
    fn starts_empty_on_the_creation_view() {
        let s = SessionState::new();
        assert!(s.character().is_none());
        assert!(s.monster().is_none());
        assert!(s.pending_drop().is_none());
        assert!(s.last_battle_log().is_empty());
        assert_eq!(s.view(), View::Creation);
        assert!(!s.game_complete());
    }

    #[test]
    fn completion_follows_the_win_count() {
        let mut s = SessionState::new();
        s.set_character(Some(character(1, 5)));
        assert!(s.game_complete());
        s.set_character(Some(character(2, 0)));
        assert!(!s.game_complete());
    }

    #[test]
    fn server_completion_sticks_for_the_same_character() {
        let mut s = SessionState::new();
        s.set_character(Some(character(1, 4)));
        s.mark_game_complete();
        s.set_character(Some(character(1, 4)));
        assert!(s.game_complete());
        s.set_character(None);
        assert!(!s.game_complete());
    }
}
