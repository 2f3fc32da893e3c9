use log::{debug, info, warn};
use serde_json::{json, Value};

use crate::engine::normalizer::{self, NormalizedResponse};
use crate::engine::routes::Routes;
use crate::engine::session::{BattleReport, SessionState, View};
use crate::engine::transport::{ApiRequest, Transport};
use crate::error::ClientError;
use crate::model::character::{Character, CharacterRecord, WINS_TO_COMPLETE};
use crate::model::event_result::{TransitionOutcome, TransitionReport};
use crate::model::game_state::{
    Attributes, BattleOutcome, CharacterClass, EntityId, HealthPool, Monster, MonsterRecord, Weapon,
};

/// A user-triggered operation. Remote transitions issue exactly one request.
#[derive(Debug, Clone, PartialEq)]
pub enum Transition {
    FetchClasses,
    CreateCharacter {
        name: String,
        class: String,
        attributes: Option<Attributes>,
    },
    LoadCharacter {
        id: String,
    },
    EncounterMonster,
    StartBattle,
    EquipDrop,
    /// Keep the current weapon and let the reward go.
    DiscardDrop,
    LevelUp {
        class_name: String,
    },
    ChooseWeapon {
        weapon_id: EntityId,
    },
    DeleteCharacter {
        confirmed: bool,
    },
    Navigate(View),
}

impl Transition {
    pub fn name(&self) -> &'static str {
        match self {
            Transition::FetchClasses => "Classes",
            Transition::CreateCharacter { .. } => "Create",
            Transition::LoadCharacter { .. } => "Load",
            Transition::EncounterMonster => "Encounter",
            Transition::StartBattle => "Battle",
            Transition::EquipDrop => "Equip",
            Transition::DiscardDrop => "Keep weapon",
            Transition::LevelUp { .. } => "Level up",
            Transition::ChooseWeapon { .. } => "Weapon choice",
            Transition::DeleteCharacter { .. } => "Delete",
            Transition::Navigate(_) => "Navigate",
        }
    }
}

enum Decode {
    Normalized,
    Monster,
    Classes,
}

enum Decoded {
    Normalized(NormalizedResponse),
    Monster(MonsterRecord),
    Classes(Vec<CharacterClass>),
}

enum Plan {
    Local,
    Remote(ApiRequest, Decode),
}

/// Owns the session and is the only thing that changes it. Each transition
/// checks its precondition, sends one request, decodes the whole reply, and
/// only then writes the new state.
pub struct TransitionDriver<T> {
    transport: T,
    routes: Routes,
    state: SessionState,
}

impl<T: Transport> TransitionDriver<T> {
    pub fn new(transport: T, routes: Routes) -> Self {
        Self {
            transport,
            routes,
            state: SessionState::new(),
        }
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    /// Swap the connection; the session survives.
    pub fn reconfigure(&mut self, transport: T, routes: Routes) {
        self.transport = transport;
        self.routes = routes;
    }

    pub fn apply(&mut self, transition: Transition) -> TransitionReport {
        let action = transition.name();
        debug!("transition {action}: {transition:?}");

        let outcome = match self.run(&transition) {
            Ok(notes) => {
                let summary = if notes.is_empty() {
                    String::new()
                } else {
                    format!(": {}", notes.join(" | "))
                };
                info!("{action} applied{summary}");
                TransitionOutcome::Applied { notes }
            }
            Err(error) => {
                warn!("{action} failed: {error}");
                TransitionOutcome::Rejected { error }
            }
        };

        TransitionReport { action, outcome }
    }

    fn run(&mut self, transition: &Transition) -> Result<Vec<String>, ClientError> {
        let decoded = match self.plan(transition)? {
            Plan::Local => None,
            Plan::Remote(request, decode) => {
                let reply = self.transport.send(&request)?;
                Some(match decode {
                    Decode::Normalized => Decoded::Normalized(normalizer::normalize(&reply)?),
                    Decode::Monster => Decoded::Monster(normalizer::decode_monster(&reply)?),
                    Decode::Classes => Decoded::Classes(normalizer::decode_classes(&reply)?),
                })
            }
        };
        self.commit(transition, decoded)
    }

    /* =========================
       Preconditions & requests
       ========================= */

    fn plan(&self, transition: &Transition) -> Result<Plan, ClientError> {
        let r = &self.routes;
        let plan = match transition {
            Transition::FetchClasses => {
                Plan::Remote(ApiRequest::get(r.classes.clone()), Decode::Classes)
            }

            Transition::CreateCharacter { name, class, attributes } => {
                let name = name.trim();
                let class = class.trim();
                if name.is_empty() {
                    return Err(ClientError::precondition("Enter a name first"));
                }
                if class.is_empty() {
                    return Err(ClientError::precondition("Choose a class first"));
                }
                let mut body = json!({ "name": name, "char_class": class });
                if let (Some(a), Value::Object(fields)) = (attributes, &mut body) {
                    fields.insert("strength".into(), a.strength.into());
                    fields.insert("agility".into(), a.agility.into());
                    fields.insert("endurance".into(), a.endurance.into());
                }
                Plan::Remote(ApiRequest::post(r.create.clone(), Some(body)), Decode::Normalized)
            }

            Transition::LoadCharacter { id } => {
                let id = EntityId::parse(id)
                    .ok_or_else(|| ClientError::precondition("Enter ID to load"))?;
                Plan::Remote(ApiRequest::get(Routes::expand(&r.character, &id)), Decode::Normalized)
            }

            Transition::EncounterMonster => {
                let (character, id) = self.loaded()?;
                require_alive(character)?;
                self.require_unfinished()?;
                Plan::Remote(ApiRequest::get(Routes::expand(&r.encounter, id)), Decode::Monster)
            }

            Transition::StartBattle => {
                let (character, id) = self.loaded()?;
                require_alive(character)?;
                self.require_unfinished()?;
                let body = self
                    .state
                    .monster()
                    .and_then(|m| m.id.as_ref())
                    .map(|monster_id| json!({ "monster_id": monster_id }));
                let path = Routes::expand(&r.battle, id);
                Plan::Remote(ApiRequest::post(path, body), Decode::Normalized)
            }

            Transition::EquipDrop => {
                let (character, id) = self.loaded()?;
                require_alive(character)?;
                let drop = self
                    .state
                    .pending_drop()
                    .ok_or_else(|| ClientError::precondition("No drop to equip"))?;
                let weapon_id = drop
                    .id
                    .as_ref()
                    .ok_or_else(|| {
                        ClientError::precondition(format!("{} has no id to equip", drop.name))
                    })?;
                Plan::Remote(
                    ApiRequest::put(
                        Routes::expand(&r.weapon, id),
                        json!({ "weapon_id": weapon_id }),
                    ),
                    Decode::Normalized,
                )
            }

            Transition::ChooseWeapon { weapon_id } => {
                let (_, id) = self.loaded()?;
                self.state
                    .pending_drop()
                    .filter(|drop| drop.id.as_ref() == Some(weapon_id))
                    .ok_or_else(|| {
                        let reason = format!("Weapon {weapon_id} is not the pending reward");
                        ClientError::precondition(reason)
                    })?;
                Plan::Remote(
                    ApiRequest::put(
                        Routes::expand(&r.weapon, id),
                        json!({ "weapon_id": weapon_id }),
                    ),
                    Decode::Normalized,
                )
            }

            Transition::DiscardDrop => {
                if self.state.pending_drop().is_none() {
                    return Err(ClientError::precondition("No drop to discard"));
                }
                Plan::Local
            }

            Transition::LevelUp { class_name } => {
                let (_, id) = self.loaded()?;
                let class_name = class_name.trim();
                if class_name.is_empty() {
                    return Err(ClientError::precondition("Choose a class first"));
                }
                Plan::Remote(
                    ApiRequest::post(
                        Routes::expand(&r.level_up, id),
                        Some(json!({ "class_name": class_name })),
                    ),
                    Decode::Normalized,
                )
            }

            Transition::DeleteCharacter { confirmed } => {
                let (_, id) = self.loaded()?;
                if !confirmed {
                    return Err(ClientError::precondition("Deletion not confirmed"));
                }
                Plan::Remote(ApiRequest::delete(Routes::expand(&r.delete, id)), Decode::Normalized)
            }

            Transition::Navigate(view) => {
                match view {
                    View::Creation | View::GameOver => {}
                    View::Battle | View::LevelUp => {
                        self.loaded()?;
                    }
                    View::WeaponSelection => {
                        self.loaded()?;
                        if self.state.pending_drop().is_none() {
                            return Err(ClientError::precondition("No new weapon to choose"));
                        }
                    }
                }
                Plan::Local
            }
        };
        Ok(plan)
    }

    fn loaded(&self) -> Result<(&Character, &EntityId), ClientError> {
        let character = self
            .state
            .character()
            .ok_or_else(|| ClientError::precondition("No character loaded"))?;
        let id = character
            .id
            .as_ref()
            .ok_or_else(|| ClientError::precondition("Loaded character has no id"))?;
        Ok((character, id))
    }

    fn require_unfinished(&self) -> Result<(), ClientError> {
        if self.state.game_complete() {
            return Err(ClientError::precondition(format!(
                "Game complete: {WINS_TO_COMPLETE} monsters already beaten"
            )));
        }
        Ok(())
    }

    /* =========================
       State writes
       ========================= */

    fn commit(
        &mut self,
        transition: &Transition,
        decoded: Option<Decoded>,
    ) -> Result<Vec<String>, ClientError> {
        match (transition, decoded) {
            (Transition::FetchClasses, Some(Decoded::Classes(classes))) => {
                let note = if classes.is_empty() {
                    "No character classes available".to_string()
                } else {
                    format!("Loaded {} classes", classes.len())
                };
                self.state.set_classes(classes);
                Ok(vec![note])
            }

            (Transition::CreateCharacter { .. }, Some(Decoded::Normalized(n))) => {
                let record = n
                    .character
                    .ok_or_else(|| ClientError::malformed("create response carried no character"))?;
                let character = Character::from_record(record);
                let note = format!(
                    "Created {} ({})",
                    character.display_name(),
                    id_text(&character)
                );
                self.replace_character(character);
                Ok(vec![note])
            }

            (Transition::LoadCharacter { .. }, Some(Decoded::Normalized(n))) => {
                let record = n
                    .character
                    .ok_or_else(|| ClientError::malformed("load response carried no character"))?;
                let character = Character::from_record(record);
                let note = format!("Loaded {}", character.display_name());
                self.replace_character(character);
                Ok(vec![note])
            }

            (Transition::EncounterMonster, Some(Decoded::Monster(record))) => {
                let monster = Monster::from_record(record);
                let note = format!(
                    "A wild {} appears ({} HP)",
                    monster.name, monster.health.current
                );
                self.state.set_monster(Some(monster));
                self.state.set_last_battle(None);
                self.state.set_view(View::Battle);
                Ok(vec![note])
            }

            (Transition::StartBattle, Some(Decoded::Normalized(n))) => self.commit_battle(n),

            (Transition::EquipDrop, Some(Decoded::Normalized(n))) => {
                let name = self.state.pending_drop().map(|d| d.name.clone()).unwrap_or_default();
                let updated = self.updated_character(n.character, "equip")?;
                self.state.set_character(Some(updated));
                self.state.set_pending_drop(None);
                if self.state.view() == View::WeaponSelection {
                    self.state.set_view(View::Battle);
                }
                Ok(vec![format!("Equipped {name}")])
            }

            (Transition::ChooseWeapon { .. }, Some(Decoded::Normalized(n))) => {
                let updated = self.updated_character(n.character, "weapon selection")?;
                let note = match &updated.weapon {
                    Some(w) => format!("Now wielding {}", w.label()),
                    None => "Weapon changed".to_string(),
                };
                self.state.set_character(Some(updated));
                self.state.set_pending_drop(None);
                self.state.set_view(View::Battle);
                Ok(vec![note])
            }

            (Transition::DiscardDrop, None) => {
                self.state.set_pending_drop(None);
                if self.state.view() == View::WeaponSelection {
                    self.state.set_view(View::Battle);
                }
                Ok(vec!["Kept current weapon".to_string()])
            }

            (Transition::LevelUp { class_name }, Some(Decoded::Normalized(n))) => {
                let updated = self.updated_character(n.character, "level-up")?;
                let note = format!(
                    "Levelled up as {} (level {})",
                    class_name.trim(),
                    updated.total_level
                );
                self.state.set_character(Some(updated));
                self.state.set_view(View::Battle);
                Ok(vec![note])
            }

            (Transition::DeleteCharacter { .. }, Some(Decoded::Normalized(_))) => {
                let name = self
                    .state
                    .character()
                    .map(|c| c.display_name().to_string())
                    .unwrap_or_default();
                self.state.set_character(None);
                self.state.clear_encounter();
                self.state.set_view(View::Creation);
                Ok(vec![format!("Deleted {name}")])
            }

            (Transition::Navigate(view), None) => {
                if *view != View::Battle {
                    self.state.set_monster(None);
                }
                if !matches!(view, View::Battle | View::WeaponSelection) {
                    self.state.set_pending_drop(None);
                }
                self.state.set_view(*view);
                Ok(Vec::new())
            }

            _ => Err(ClientError::malformed(format!(
                "{} received a response it cannot use",
                transition.name()
            ))),
        }
    }

    fn commit_battle(&mut self, n: NormalizedResponse) -> Result<Vec<String>, ClientError> {
        let record = match (n.character, n.character_health) {
            (Some(mut record), hp) => {
                if record.health.is_none() {
                    record.health = hp;
                }
                Some(record)
            }
            (None, Some(hp)) => Some(CharacterRecord {
                health: Some(hp),
                ..CharacterRecord::default()
            }),
            (None, None) => None,
        };
        let current = self
            .state
            .character()
            .cloned()
            .ok_or_else(|| ClientError::precondition("No character loaded"))?;
        let updated = match record {
            Some(record) => current.merged(record),
            None => current,
        };

        let summary = battle_summary(n.outcome.as_ref(), n.drop.as_ref());
        let mut notes = vec![summary.clone()];
        let mut log = n.battle_log;
        log.push(summary);

        let game_won = n.game_won.unwrap_or(false) || updated.has_won_game();
        if game_won {
            notes.push(format!(
                "You have defeated {WINS_TO_COMPLETE} monsters in a row. Game complete!"
            ));
        }

        let engaged = self.state.monster().cloned().or(n.monster.map(Monster::from_record));

        self.state.set_character(Some(updated));
        if n.game_won == Some(true) {
            self.state.mark_game_complete();
        }
        if let Some(drop) = n.drop {
            self.state.set_pending_drop(Some(drop));
        }

        match n.outcome {
            Some(outcome) => {
                let monster_health = match (&engaged, n.monster_health) {
                    (Some(m), Some(hp)) => Some(m.health.with_current(hp)),
                    (Some(m), None) if outcome == BattleOutcome::Win => {
                        Some(m.health.with_current(0))
                    }
                    (Some(m), None) => Some(m.health),
                    (None, Some(hp)) => Some(HealthPool::new(hp, hp)),
                    (None, None) => None,
                };
                self.state.set_last_battle(Some(BattleReport {
                    outcome,
                    game_won,
                    monster_name: engaged.map(|m| m.name),
                    monster_health,
                }));
                self.state.set_monster(None);
            }
            None => {
                let engaged = engaged.map(|mut m| {
                    if let Some(hp) = n.monster_health {
                        m.health = m.health.with_current(hp);
                    }
                    m
                });
                self.state.set_monster(engaged);
            }
        }

        self.state.set_battle_log(log);
        let view = self.resting_view();
        self.state.set_view(view);
        Ok(notes)
    }

    fn replace_character(&mut self, character: Character) {
        self.state.clear_encounter();
        self.state.set_character(Some(character));
        let view = self.resting_view();
        self.state.set_view(view);
    }

    fn updated_character(
        &self,
        record: Option<CharacterRecord>,
        what: &str,
    ) -> Result<Character, ClientError> {
        let record = record.ok_or_else(|| {
            ClientError::malformed(format!("{what} response carried no character"))
        })?;
        Ok(match self.state.character() {
            Some(current) => current.merged(record),
            None => Character::from_record(record),
        })
    }

    fn resting_view(&self) -> View {
        match self.state.character() {
            None => View::Creation,
            Some(c) if !c.alive || self.state.game_complete() => View::GameOver,
            Some(_) => View::Battle,
        }
    }
}

fn require_alive(character: &Character) -> Result<(), ClientError> {
    if !character.alive {
        return Err(ClientError::precondition(format!("{} is dead", character.display_name())));
    }
    Ok(())
}

fn id_text(character: &Character) -> String {
    match &character.id {
        Some(id) => format!("id={id}"),
        None => "no id".to_string(),
    }
}

fn battle_summary(outcome: Option<&BattleOutcome>, drop: Option<&Weapon>) -> String {
    let result = outcome.map(ToString::to_string).unwrap_or_else(|| "unknown".to_string());
    match drop {
        Some(weapon) => format!("Battle result: {result}. Drop: {}", weapon.label()),
        None => format!("Battle result: {result}. No drop."),
    }
}
