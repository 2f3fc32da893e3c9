use eframe::egui;

use crate::model::character::{Character, WINS_TO_COMPLETE};
use crate::ui::app::{health_bar, BattleApp};
use crate::ui::projector::ProjectedView;

pub fn draw_right_panel(ctx: &egui::Context, app: &mut BattleApp, view: &ProjectedView) {
    egui::SidePanel::right("right")
        .resizable(true)
        .default_width(280.0)
        .min_width(220.0)
        .show(ctx, |ui| {
            egui::ScrollArea::vertical().show(ui, |ui| {
                match app.ui.session.character() {
                    Some(c) => draw_character(ui, c, view),
                    None => {
                        ui.heading("Character");
                        ui.label("None loaded");
                    }
                }

                ui.separator();
                let delete = egui::Button::new("🗑 Delete character");
                if ui.add_enabled(view.controls.delete, delete).clicked() {
                    app.ui.confirm_delete = true;
                }
            });
        });
}

/* =========================
   Character sheet
   ========================= */

fn draw_character(ui: &mut egui::Ui, c: &Character, view: &ProjectedView) {
    ui.heading(c.display_name());

    if let Some(id) = &c.id {
        ui.small(format!("id {id}"));
    }

    egui::Grid::new("sheet").num_columns(2).show(ui, |ui| {
        ui.label("Class");
        ui.label(c.class.as_deref().unwrap_or("-"));
        ui.end_row();

        ui.label("Level");
        ui.label(c.total_level.to_string());
        ui.end_row();

        ui.label("Wins");
        ui.label(format!("{} / {WINS_TO_COMPLETE}", c.wins));
        ui.end_row();

        ui.label("State");
        ui.label(if c.alive { "Alive" } else { "Dead" });
        ui.end_row();
    });

    match &view.character_bar {
        Some(bar) => health_bar(ui, bar, egui::Color32::from_rgb(50, 130, 60)),
        None => {
            ui.label("Health unknown");
        }
    }

    ui.label(&view.weapon_info);

    ui.collapsing("Attributes", |ui| {
        let a = &c.attributes;
        ui.label(format!("Strength: {}", a.strength));
        ui.label(format!("Agility: {}", a.agility));
        ui.label(format!("Endurance: {}", a.endurance));
    });

    if !c.class_levels.is_empty() {
        ui.collapsing("Class levels", |ui| {
            for (class, level) in &c.class_levels {
                ui.label(format!("• {class}: {level}"));
            }
        });
    }
}
