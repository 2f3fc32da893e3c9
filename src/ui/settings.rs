use egui::Color32;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::ops::RangeInclusive;

use crate::engine::routes::ApiSettings;
use crate::model::message::LogKind;

pub const UI_SCALE: RangeInclusive<f32> = 0.75..=2.0;

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct ClientSettings {
    #[serde(flatten)]
    pub api: ApiSettings,

    /// Offered when the class catalogue cannot be fetched.
    pub default_classes: Vec<String>,

    pub ui_scale: f32,

    // Log kind → color mapping
    pub log_colors: HashMap<String, [u8; 4]>,
}

impl Default for ClientSettings {
    fn default() -> Self {
        let mut log_colors = HashMap::new();

        log_colors.insert(LogKind::Info.key().into(), [80, 80, 80, 255]);
        log_colors.insert(LogKind::Battle.key().into(), [40, 90, 60, 255]);
        log_colors.insert(LogKind::Error.key().into(), [130, 40, 40, 255]);

        Self {
            api: ApiSettings::default(),
            default_classes: vec!["rogue".into(), "warrior".into(), "barbarian".into()],
            ui_scale: 1.0,
            log_colors,
        }
    }
}

impl ClientSettings {
    /// `ui_scale` pulled into [`UI_SCALE`]; anything non-finite reads as 1.0.
    pub fn scale(&self) -> f32 {
        if self.ui_scale.is_finite() {
            self.ui_scale.clamp(*UI_SCALE.start(), *UI_SCALE.end())
        } else {
            1.0
        }
    }

    pub fn color(&self, key: &str) -> Color32 {
        self.log_colors
            .get(key)
            .map(|c| Color32::from_rgba_unmultiplied(c[0], c[1], c[2], c[3]))
            .unwrap_or(Color32::DARK_GRAY)
    }

    pub fn set_color(&mut self, key: &str, color: Color32) {
        self.log_colors.insert(
            key.to_string(),
            [color.r(), color.g(), color.b(), color.a()],
        );
    }
}
