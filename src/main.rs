mod engine;
mod error;
mod logutil;
mod model;
mod ui;

use log::info;

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let settings = ui::settings_io::load_settings();
    info!("starting battle client against {}", settings.api.api_base);

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1100.0, 720.0])
            .with_title("Battle Client"),
        ..Default::default()
    };

    eframe::run_native(
        "Battle Client",
        options,
        Box::new(|_cc| Ok(Box::new(ui::app::BattleApp::new(settings)))),
    )
    .map_err(|e| anyhow::anyhow!("window failed: {e}"))
}
