#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LogKind {
    Info,
    Battle,
    Error,
}

impl LogKind {
    /// Key into the colour map of the UI settings.
    pub fn key(&self) -> &'static str {
        match self {
            LogKind::Info => "Info",
            LogKind::Battle => "Battle",
            LogKind::Error => "Error",
        }
    }
}

/// One row of the activity log.
#[derive(Debug, Clone, PartialEq)]
pub struct Message {
    pub at: String,
    pub kind: LogKind,
    pub text: String,
}

impl Message {
    pub fn now(kind: LogKind, text: impl Into<String>) -> Self {
        Self {
            at: chrono::Local::now().format("%H:%M:%S").to_string(),
            kind,
            text: text.into(),
        }
    }

    pub fn line(&self) -> String {
        format!("[{}] {}", self.at, self.text)
    }
}
