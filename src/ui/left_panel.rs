use eframe::egui;

use crate::engine::driver::Transition;
use crate::engine::routes::Routes;
use crate::model::message::LogKind;
use crate::ui::app::{editable_list, BattleApp, LeftTab};
use crate::ui::projector::{class_choices, ProjectedView};
use crate::ui::settings::{ClientSettings, UI_SCALE};

pub fn draw_left_panel(ctx: &egui::Context, app: &mut BattleApp, view: &ProjectedView) {
    egui::SidePanel::left("left")
        .resizable(false)
        .default_width(220.0)
        .show(ctx, |ui| {
            ui.horizontal(|ui| {
                ui.selectable_value(&mut app.ui.left_tab, LeftTab::Create, "Create");
                ui.selectable_value(&mut app.ui.left_tab, LeftTab::Load, "Load");
                ui.selectable_value(&mut app.ui.left_tab, LeftTab::Settings, "Settings");
            });

            ui.separator();

            egui::ScrollArea::vertical().show(ui, |ui| match app.ui.left_tab {
                LeftTab::Create => draw_create(ui, app, view),
                LeftTab::Load => draw_load(ui, app, view),
                LeftTab::Settings => draw_settings(ui, app, view),
            });
        });
}

/* =========================
   Create
   ========================= */

fn draw_create(ui: &mut egui::Ui, app: &mut BattleApp, view: &ProjectedView) {
    ui.heading("New character");

    ui.label("Name");
    ui.text_edit_singleline(&mut app.ui.form.name);

    let classes = class_choices(&app.ui.session, &app.settings.default_classes);
    let form = &mut app.ui.form;
    egui::ComboBox::from_label("Class")
        .selected_text(if form.class.is_empty() { "Choose…" } else { form.class.as_str() })
        .show_ui(ui, |ui| {
            for class in &classes {
                ui.selectable_value(&mut form.class, class.name.clone(), &class.name);
            }
        });

    if let Some(class) = classes.iter().find(|c| c.name == form.class) {
        for (level, bonus) in class.bonuses() {
            ui.small(format!("Level {level}: {bonus}"));
        }
    }

    ui.separator();
    ui.checkbox(&mut form.send_attributes, "Send attributes");
    ui.add_enabled_ui(form.send_attributes, |ui| {
        let a = &mut form.attributes;
        ui.horizontal(|ui| {
            ui.label("Strength");
            ui.add(egui::DragValue::new(&mut a.strength).range(1..=3));
        });
        ui.horizontal(|ui| {
            ui.label("Agility");
            ui.add(egui::DragValue::new(&mut a.agility).range(1..=3));
        });
        ui.horizontal(|ui| {
            ui.label("Endurance");
            ui.add(egui::DragValue::new(&mut a.endurance).range(1..=3));
        });
        if ui.button("🎲 Reroll").clicked() {
            form.reroll(&mut rand::thread_rng());
        }
    });

    ui.separator();
    if ui.add_enabled(view.controls.create, egui::Button::new("Create")).clicked() {
        let transition = app.ui.form.transition();
        app.send(transition);
    }
}

/* =========================
   Load
   ========================= */

fn draw_load(ui: &mut egui::Ui, app: &mut BattleApp, view: &ProjectedView) {
    ui.heading("Load character");

    ui.label("Character ID");
    ui.text_edit_singleline(&mut app.ui.load_id);

    if ui.add_enabled(view.controls.load, egui::Button::new("Load")).clicked() {
        let id = app.ui.load_id.clone();
        app.send(Transition::LoadCharacter { id });
    }

    ui.separator();
    if ui.add_enabled(view.controls.load, egui::Button::new("Refresh classes")).clicked() {
        app.send(Transition::FetchClasses);
    }
}

/* =========================
   Settings
   ========================= */

fn draw_settings(ui: &mut egui::Ui, app: &mut BattleApp, view: &ProjectedView) {
    let draft = &mut app.ui.draft;

    ui.heading("Server");
    ui.label("API base URL");
    ui.text_edit_singleline(&mut draft.api.api_base);

    ui.horizontal(|ui| {
        ui.label("Timeout (s)");
        ui.add(egui::DragValue::new(&mut draft.api.request_timeout_secs).range(1..=120));
    });

    ui.collapsing("CSRF", |ui| {
        ui.label("Cookie");
        ui.text_edit_singleline(&mut draft.api.csrf_cookie);
        ui.label("Header");
        ui.text_edit_singleline(&mut draft.api.csrf_header);
    });

    ui.collapsing("Routes", |ui| {
        route_fields(ui, &mut draft.api.routes);
    });

    ui.collapsing("Fallback classes", |ui| {
        let mut new_class = ui
            .data_mut(|d| d.get_temp::<String>(egui::Id::new("new_class")))
            .unwrap_or_default();
        editable_list(ui, &mut draft.default_classes, "Add class", &mut new_class);
        ui.data_mut(|d| d.insert_temp(egui::Id::new("new_class"), new_class));
    });

    ui.separator();
    ui.heading("Display");
    ui.label("UI Scale");
    ui.add(egui::Slider::new(&mut draft.ui_scale, UI_SCALE));

    ui.collapsing("Log colours", |ui| {
        for kind in [LogKind::Info, LogKind::Battle, LogKind::Error] {
            let mut color = draft.color(kind.key());
            ui.horizontal(|ui| {
                if ui.color_edit_button_srgba(&mut color).changed() {
                    draft.set_color(kind.key(), color);
                }
                ui.label(kind.key());
            });
        }
    });

    ui.separator();
    ui.horizontal(|ui| {
        if ui.add_enabled(view.controls.settings, egui::Button::new("Apply")).clicked() {
            app.apply_settings();
        }
        if ui.button("Defaults").clicked() {
            app.ui.draft = ClientSettings::default();
        }
    });
}

fn route_fields(ui: &mut egui::Ui, routes: &mut Routes) {
    egui::Grid::new("routes").num_columns(2).show(ui, |ui| {
        for (label, value) in [
            ("Classes", &mut routes.classes),
            ("Create", &mut routes.create),
            ("Character", &mut routes.character),
            ("Encounter", &mut routes.encounter),
            ("Battle", &mut routes.battle),
            ("Weapon", &mut routes.weapon),
            ("Level up", &mut routes.level_up),
            ("Delete", &mut routes.delete),
        ] {
            ui.label(label);
            ui.text_edit_singleline(value);
            ui.end_row();
        }
    });
}
