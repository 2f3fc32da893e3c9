use eframe::egui;

use crate::engine::driver::Transition;
use crate::engine::session::View;
use crate::ui::app::{bubble, health_bar, BattleApp};
use crate::ui::projector::{class_choices, ProjectedView, StatusKind};

pub fn draw_center_panel(ctx: &egui::Context, app: &mut BattleApp, view: &ProjectedView) {
    // ---------- Activity log ----------
    egui::TopBottomPanel::bottom("activity_log")
        .resizable(true)
        .default_height(160.0)
        .show(ctx, |ui| {
            ui.label("Activity");
            egui::ScrollArea::vertical()
                .stick_to_bottom(app.ui.should_auto_scroll)
                .auto_shrink([false, false])
                .show(ui, |ui| {
                    for msg in &app.ui.log {
                        ui.add_space(4.0);
                        bubble(ui, app.settings.color(msg.kind.key()), &msg.line());
                    }
                });
        });

    // ---------- Current view ----------
    egui::CentralPanel::default().show(ctx, |ui| {
        ui.horizontal(|ui| {
            ui.heading(view.view.title());
            if let Some(busy) = app.ui.in_flight {
                ui.spinner();
                ui.label(format!("{busy}…"));
            }
        });

        let status = egui::RichText::new(&view.status);
        ui.label(match view.status_kind {
            StatusKind::Dead => status.color(egui::Color32::LIGHT_RED),
            StatusKind::Victory => status.color(egui::Color32::GOLD),
            StatusKind::NoCharacter | StatusKind::Streak => status,
        });
        ui.separator();

        match view.view {
            View::Creation => {
                ui.label("Create a character or load one by id from the panel on the left.");
            }
            View::Battle => draw_battle(ui, app, view),
            View::LevelUp => draw_level_up(ui, app, view),
            View::WeaponSelection => draw_weapon_selection(ui, app, view),
            View::GameOver => draw_game_over(ui, app, view),
        }
    });
}

/* =========================
   Battle
   ========================= */

fn draw_battle(ui: &mut egui::Ui, app: &mut BattleApp, view: &ProjectedView) {
    match &view.monster_bar {
        Some(bar) => health_bar(ui, bar, egui::Color32::from_rgb(150, 50, 50)),
        None => {
            ui.label("No monster in sight.");
        }
    }

    if let Some(m) = app.ui.session.monster() {
        if let Some(ability) = &m.special_ability {
            ui.small(format!("Special ability: {ability}"));
        }
    }

    ui.add_space(6.0);
    ui.horizontal(|ui| {
        if ui.add_enabled(view.controls.encounter, egui::Button::new("Find monster")).clicked() {
            app.send(Transition::EncounterMonster);
        }
        if ui.add_enabled(view.controls.battle, egui::Button::new("⚔ Fight")).clicked() {
            app.send(Transition::StartBattle);
        }
        if ui.add_enabled(view.controls.level_up, egui::Button::new("Level up…")).clicked() {
            app.send(Transition::Navigate(View::LevelUp));
        }
    });

    ui.separator();
    ui.label(&view.drop_info);
    ui.horizontal(|ui| {
        if ui.add_enabled(view.controls.equip, egui::Button::new("Equip")).clicked() {
            app.send(Transition::EquipDrop);
        }
        if ui.add_enabled(view.controls.choose_weapon, egui::Button::new("Compare…")).clicked() {
            app.send(Transition::Navigate(View::WeaponSelection));
        }
        if ui.add_enabled(view.controls.discard, egui::Button::new("Leave it")).clicked() {
            app.send(Transition::DiscardDrop);
        }
    });

    draw_battle_log(ui, app);
}

fn draw_battle_log(ui: &mut egui::Ui, app: &BattleApp) {
    let lines = app.ui.session.last_battle_log();
    if lines.is_empty() {
        return;
    }
    ui.separator();
    ui.label("Last battle");
    egui::ScrollArea::vertical()
        .id_salt("battle_log")
        .max_height(200.0)
        .show(ui, |ui| {
            for line in lines {
                ui.monospace(line);
            }
        });
}

/* =========================
   Level up
   ========================= */

fn draw_level_up(ui: &mut egui::Ui, app: &mut BattleApp, view: &ProjectedView) {
    ui.label("Pick the class to gain a level in.");

    let classes = class_choices(&app.ui.session, &app.settings.default_classes);
    for class in &classes {
        ui.group(|ui| {
            ui.radio_value(&mut app.ui.level_class, class.name.clone(), &class.name);
            if let Some(hp) = class.health_per_level {
                ui.small(format!("+{hp} health per level"));
            }
            for (level, bonus) in class.bonuses() {
                ui.small(format!("Level {level}: {bonus}"));
            }
        });
    }

    ui.add_space(6.0);
    ui.horizontal(|ui| {
        let ready = view.controls.level_up && !app.ui.level_class.is_empty();
        if ui.add_enabled(ready, egui::Button::new("Level up")).clicked() {
            let class_name = app.ui.level_class.clone();
            app.send(Transition::LevelUp { class_name });
        }
        if ui.add_enabled(view.controls.level_up, egui::Button::new("Back")).clicked() {
            app.send(Transition::Navigate(View::Battle));
        }
    });
}

/* =========================
   Weapon selection
   ========================= */

fn draw_weapon_selection(ui: &mut egui::Ui, app: &mut BattleApp, view: &ProjectedView) {
    let Some(drop) = app.ui.session.pending_drop().cloned() else {
        ui.label("No new weapon.");
        return;
    };

    ui.columns(2, |cols| {
        cols[0].label("Current");
        cols[0].strong(&view.weapon_info);
        cols[1].label("Reward");
        cols[1].strong(drop.label());
        if let Some(kind) = &drop.weapon_type {
            cols[1].small(kind);
        }
    });

    ui.add_space(6.0);
    ui.horizontal(|ui| {
        let choose = view.controls.choose_weapon && drop.id.is_some();
        if ui.add_enabled(choose, egui::Button::new("Take it")).clicked() {
            if let Some(weapon_id) = drop.id.clone() {
                app.send(Transition::ChooseWeapon { weapon_id });
            }
        }
        if ui.add_enabled(view.controls.discard, egui::Button::new("Keep current")).clicked() {
            app.send(Transition::DiscardDrop);
        }
    });
}

/* =========================
   Game over
   ========================= */

fn draw_game_over(ui: &mut egui::Ui, app: &mut BattleApp, view: &ProjectedView) {
    if let Some(report) = app.ui.session.last_battle() {
        let name = report.monster_name.as_deref().unwrap_or("the monster");
        ui.label(format!("Last battle against {name}: {}", report.outcome));
    }

    draw_battle_log(ui, app);

    ui.add_space(6.0);
    if ui.add_enabled(view.controls.create, egui::Button::new("New character")).clicked() {
        app.send(Transition::Navigate(View::Creation));
    }
}
