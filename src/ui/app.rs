use eframe::egui;
use std::sync::mpsc;
use std::time::Duration;

use log::{info, warn};
use rand::Rng;

use crate::engine::driver::Transition;
use crate::engine::engine::Engine;
use crate::engine::protocol::{EngineCommand, EngineResponse};
use crate::engine::session::SessionState;
use crate::engine::transport::HttpTransport;
use crate::model::event_result::TransitionOutcome;
use crate::model::game_state::Attributes;
use crate::model::message::{LogKind, Message};
use crate::ui::center_panel::draw_center_panel;
use crate::ui::left_panel::draw_left_panel;
use crate::ui::projector::{project, ProjectedView};
use crate::ui::right_panel::draw_right_panel;
use crate::ui::settings::ClientSettings;
use crate::ui::settings_io::save_settings;

/* =========================
   Tabs
   ========================= */

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LeftTab {
    #[default]
    Create,
    Load,
    Settings,
}

/* =========================
   Forms
   ========================= */

#[derive(Debug, Clone)]
pub struct CreationForm {
    pub name: String,
    pub class: String,
    pub attributes: Attributes,
    pub send_attributes: bool,
}

impl Default for CreationForm {
    fn default() -> Self {
        Self {
            name: String::new(),
            class: String::new(),
            attributes: Attributes::roll(&mut rand::thread_rng()),
            send_attributes: true,
        }
    }
}

impl CreationForm {
    pub fn reroll<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        self.attributes = Attributes::roll(rng);
    }

    pub fn transition(&self) -> Transition {
        Transition::CreateCharacter {
            name: self.name.clone(),
            class: self.class.clone(),
            attributes: self.send_attributes.then_some(self.attributes),
        }
    }
}

/* =========================
   UI State
   ========================= */

#[derive(Default)]
pub struct UiState {
    pub session: SessionState,
    /// Name of the transition waiting on the engine.
    pub in_flight: Option<&'static str>,
    pub log: Vec<Message>,
    pub should_auto_scroll: bool,

    pub left_tab: LeftTab,
    pub form: CreationForm,
    pub load_id: String,
    pub level_class: String,
    pub confirm_delete: bool,

    /// Edited copy; only takes effect on Apply.
    pub draft: ClientSettings,
}

impl UiState {
    pub fn note(&mut self, kind: LogKind, text: impl Into<String>) {
        self.log.push(Message::now(kind, text));
        self.should_auto_scroll = true;
    }

    pub fn projected(&self) -> ProjectedView {
        project(&self.session, self.in_flight.is_some())
    }
}

/* =========================
   App
   ========================= */

pub struct BattleApp {
    pub ui: UiState,
    pub settings: ClientSettings,

    cmd_tx: mpsc::Sender<EngineCommand>,
    resp_rx: mpsc::Receiver<EngineResponse>,
}

impl BattleApp {
    pub fn new(settings: ClientSettings) -> Self {
        let (cmd_tx, cmd_rx) = mpsc::channel();
        let (resp_tx, resp_rx) = mpsc::channel();

        let api = settings.api.clone();
        std::thread::spawn(move || {
            let mut engine = Engine::new(cmd_rx, resp_tx, &api, HttpTransport::new);
            engine.run();
        });

        let mut app = Self::with_channels(settings, cmd_tx, resp_rx);
        app.ui.note(LogKind::Info, format!("Server: {}", app.settings.api.api_base));
        app.send(Transition::FetchClasses);
        app
    }

    fn with_channels(
        settings: ClientSettings,
        cmd_tx: mpsc::Sender<EngineCommand>,
        resp_rx: mpsc::Receiver<EngineResponse>,
    ) -> Self {
        Self {
            ui: UiState {
                draft: settings.clone(),
                ..Default::default()
            },
            settings,
            cmd_tx,
            resp_rx,
        }
    }

    /// Queue a transition unless one is already running.
    pub fn send(&mut self, transition: Transition) {
        if let Some(busy) = self.ui.in_flight {
            warn!("ignoring {} while {busy} is pending", transition.name());
            return;
        }
        let name = transition.name();
        match self.cmd_tx.send(EngineCommand::Apply(transition)) {
            Ok(()) => self.ui.in_flight = Some(name),
            Err(_) => self.ui.note(LogKind::Error, format!("{name} error: engine stopped")),
        }
    }

    pub fn apply_settings(&mut self) {
        let settings = self.ui.draft.clone();
        match save_settings(&settings) {
            Ok(path) => info!("settings saved to {}", path.display()),
            Err(e) => {
                warn!("could not save settings: {e:#}");
                self.ui.note(LogKind::Error, format!("Settings not saved: {e:#}"));
            }
        }
        self.reconfigure(settings);
    }

    fn reconfigure(&mut self, settings: ClientSettings) {
        if settings.api != self.settings.api {
            let command = EngineCommand::Reconfigure(settings.api.clone());
            if self.cmd_tx.send(command).is_err() {
                warn!("engine gone, {} not applied", settings.api.api_base);
                self.ui.note(LogKind::Error, "Settings error: engine stopped");
            }
        }
        self.settings = settings;
    }

    fn drain_responses(&mut self) {
        while let Ok(resp) = self.resp_rx.try_recv() {
            self.handle(resp);
        }
    }

    fn handle(&mut self, resp: EngineResponse) {
        match resp {
            EngineResponse::StateChanged { state, report } => {
                self.ui.session = state;
                self.ui.in_flight = None;

                match report.outcome {
                    TransitionOutcome::Applied { notes } => {
                        let kind = match report.action {
                            "Battle" | "Encounter" => LogKind::Battle,
                            _ => LogKind::Info,
                        };
                        for n in notes {
                            self.ui.note(kind, n);
                        }
                    }
                    TransitionOutcome::Rejected { error } => {
                        let text = format!("{} error: {}", report.action, error.user_message());
                        self.ui.note(LogKind::Error, text);
                    }
                }

                if report.action == "Delete" {
                    self.ui.confirm_delete = false;
                }
            }

            EngineResponse::Reconfigured(result) => match result {
                Ok(()) => {
                    let base = self.settings.api.api_base.clone();
                    self.ui.note(LogKind::Info, format!("Server: {base}"));
                    self.send(Transition::FetchClasses);
                }
                Err(e) => {
                    let text = format!("Settings error: {}", e.user_message());
                    self.ui.note(LogKind::Error, text);
                }
            },

            EngineResponse::Unavailable { action, reason } => {
                self.ui.in_flight = None;
                self.ui.note(LogKind::Error, format!("{action} error: no connection ({reason})"));
            }
        }
    }
}

/* =========================
   egui App
   ========================= */

impl eframe::App for BattleApp {
    fn update(&mut self, ctx: &egui::Context, _: &mut eframe::Frame) {
        ctx.set_pixels_per_point(self.settings.scale());

        self.drain_responses();

        let view = self.ui.projected();

        draw_left_panel(ctx, self, &view);
        draw_right_panel(ctx, self, &view);
        draw_center_panel(ctx, self, &view);

        if self.ui.confirm_delete {
            draw_delete_confirm(ctx, self);
        }

        self.ui.should_auto_scroll = false;

        if self.ui.in_flight.is_some() {
            ctx.request_repaint_after(Duration::from_millis(100));
        }
    }
}

fn draw_delete_confirm(ctx: &egui::Context, app: &mut BattleApp) {
    let name = app
        .ui
        .session
        .character()
        .map(|c| c.display_name().to_string())
        .unwrap_or_default();

    let mut open = true;
    let mut answer: Option<bool> = None;

    egui::Window::new("Delete character?")
        .collapsible(false)
        .resizable(false)
        .open(&mut open)
        .show(ctx, |ui| {
            ui.label(format!("Delete {name}? This cannot be undone."));
            ui.horizontal(|ui| {
                let enabled = app.ui.in_flight.is_none();
                if ui.add_enabled(enabled, egui::Button::new("Delete")).clicked() {
                    answer = Some(true);
                }
                if ui.button("Cancel").clicked() {
                    answer = Some(false);
                }
            });
        });

    match answer {
        Some(true) => app.send(Transition::DeleteCharacter { confirmed: true }),
        Some(false) => app.ui.confirm_delete = false,
        None if !open => app.ui.confirm_delete = false,
        None => {}
    }
}

/* =========================
   UI Helpers
   ========================= */

pub fn editable_list(
    ui: &mut egui::Ui,
    items: &mut Vec<String>,
    hint: &str,
    new_item: &mut String,
) {
    let mut to_remove: Option<usize> = None;

    for (i, item) in items.iter_mut().enumerate() {
        ui.horizontal(|ui| {
            ui.text_edit_singleline(item);
            if ui.small_button("❌").clicked() {
                to_remove = Some(i);
            }
        });
    }

    if let Some(i) = to_remove {
        items.remove(i);
    }

    ui.horizontal(|ui| {
        ui.add_sized([140.0, 20.0], egui::TextEdit::singleline(new_item).hint_text(hint));

        if ui.button("Add").clicked() && !new_item.trim().is_empty() {
            items.push(new_item.trim().to_string());
            new_item.clear();
        }
    });
}

pub fn bubble(ui: &mut egui::Ui, color: egui::Color32, text: &str) {
    egui::Frame::new()
        .fill(color)
        .corner_radius(8.0)
        .inner_margin(egui::Margin::symmetric(10, 6))
        .show(ui, |ui| {
            ui.label(egui::RichText::new(text).color(egui::Color32::WHITE));
        });
}

pub fn health_bar(ui: &mut egui::Ui, bar: &crate::ui::projector::HealthBar, color: egui::Color32) {
    ui.label(&bar.label);
    ui.add(
        egui::ProgressBar::new(bar.percent / 100.0)
            .fill(color)
            .text(bar.text()),
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::driver::TransitionDriver;
    use crate::engine::routes::Routes;
    use crate::engine::transport::{ApiRequest, RawReply, Transport};
    use crate::error::ClientError;
    use crate::ui::projector::Controls;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use serde_json::{json, Value};
    use std::cell::RefCell;
    use std::collections::VecDeque;

    #[derive(Default)]
    struct Replies(RefCell<VecDeque<RawReply>>);

    impl Transport for Replies {
        fn send(&self, _request: &ApiRequest) -> Result<RawReply, ClientError> {
            self.0
                .borrow_mut()
                .pop_front()
                .ok_or_else(|| ClientError::transport("no scripted reply"))
        }
    }

    fn reply(body: Value) -> RawReply {
        RawReply {
            status: 200,
            content_type: Some("application/json".into()),
            body: body.to_string(),
        }
    }

    struct Harness {
        app: BattleApp,
        commands: mpsc::Receiver<EngineCommand>,
    }

    fn harness() -> Harness {
        let (cmd_tx, commands) = mpsc::channel();
        let (_, resp_rx) = mpsc::channel();
        Harness {
            app: BattleApp::with_channels(ClientSettings::default(), cmd_tx, resp_rx),
            commands,
        }
    }

    /// A driver holding a live character, Rogan (id 1), with `later` queued behind it.
    fn driver_with_character(later: Vec<RawReply>) -> TransitionDriver<Replies> {
        let replies = Replies::default();
        replies
            .0
            .borrow_mut()
            .push_back(reply(json!({"id": 1, "name": "Rogan", "wins": 0, "is_alive": true})));
        replies.0.borrow_mut().extend(later);
        let mut driver = TransitionDriver::new(replies, Routes::default());
        driver.apply(Transition::CreateCharacter {
            name: "Rogan".into(),
            class: "warrior".into(),
            attributes: None,
        });
        driver
    }

    #[test]
    fn send_marks_the_transition_in_flight() {
        let mut h = harness();
        h.app.send(Transition::EncounterMonster);

        assert_eq!(h.app.ui.in_flight, Some("Encounter"));
        assert!(matches!(
            h.commands.try_recv(),
            Ok(EngineCommand::Apply(Transition::EncounterMonster))
        ));
        assert_eq!(h.app.ui.projected().controls, Controls::default());
    }

    #[test]
    fn second_send_while_busy_is_dropped() {
        let mut h = harness();
        h.app.send(Transition::StartBattle);
        h.app.send(Transition::StartBattle);

        assert!(h.commands.try_recv().is_ok());
        assert!(h.commands.try_recv().is_err());
        assert_eq!(h.app.ui.in_flight, Some("Battle"));
    }

    #[test]
    fn rejected_battle_clears_in_flight_and_re_enables_fight() {
        let mut h = harness();
        let mut driver = driver_with_character(vec![reply(json!([1, 2]))]);
        h.app.ui.session = driver.state().clone();
        assert!(h.app.ui.projected().controls.battle);
        h.app.send(Transition::StartBattle);
        assert!(!h.app.ui.projected().controls.battle);

        let report = driver.apply(Transition::StartBattle);
        assert!(matches!(report.error(), Some(ClientError::MalformedResponse(_))));
        let state = driver.state().clone();
        h.app.handle(EngineResponse::StateChanged { state, report });

        assert_eq!(h.app.ui.in_flight, None);
        assert!(h.app.ui.projected().controls.battle);
        let last = h.app.ui.log.last().unwrap();
        assert_eq!(last.kind, LogKind::Error);
        assert!(last.text.starts_with("Battle error: "));
    }

    #[test]
    fn unavailable_engine_clears_in_flight() {
        let mut h = harness();
        h.app.send(Transition::FetchClasses);
        h.app.handle(EngineResponse::Unavailable {
            action: "Classes",
            reason: "connection refused".into(),
        });

        assert_eq!(h.app.ui.in_flight, None);
        assert!(h.app.ui.projected().controls.create);
        assert_eq!(
            h.app.ui.log.last().map(|m| m.text.as_str()),
            Some("Classes error: no connection (connection refused)")
        );
    }

    #[test]
    fn reconfigure_reports_a_stopped_engine() {
        let Harness { mut app, commands, .. } = harness();
        drop(commands);

        let mut settings = ClientSettings::default();
        settings.api.api_base = "http://10.0.0.2:8000".into();
        app.reconfigure(settings);

        assert_eq!(app.settings.api.api_base, "http://10.0.0.2:8000");
        let last = app.ui.log.last().unwrap();
        assert_eq!(last.kind, LogKind::Error);
        assert_eq!(last.text, "Settings error: engine stopped");
    }

    #[test]
    fn unchanged_api_settings_do_not_reconfigure() {
        let mut h = harness();
        let mut settings = ClientSettings::default();
        settings.ui_scale = 1.5;
        h.app.reconfigure(settings);

        assert!(h.commands.try_recv().is_err());
        assert_eq!(h.app.settings.ui_scale, 1.5);
        assert!(h.app.ui.log.is_empty());
    }

    #[test]
    fn reroll_stays_in_the_allowed_range() {
        let mut form = CreationForm::default();
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..50 {
            form.reroll(&mut rng);
            let a = form.attributes;
            for v in [a.strength, a.agility, a.endurance] {
                assert!((1..=3).contains(&v));
            }
        }
    }

    #[test]
    fn attributes_are_optional_in_the_create_request() {
        let mut form = CreationForm {
            name: "Rogan".into(),
            class: "warrior".into(),
            ..CreationForm::default()
        };
        form.send_attributes = false;
        assert_eq!(
            form.transition(),
            Transition::CreateCharacter {
                name: "Rogan".into(),
                class: "warrior".into(),
                attributes: None,
            }
        );
    }
}
