pub mod app;
pub mod center_panel;
pub mod left_panel;
pub mod projector;
pub mod right_panel;
pub mod settings;
pub mod settings_io;
