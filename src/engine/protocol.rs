use crate::engine::driver::Transition;
use crate::engine::routes::ApiSettings;
use crate::engine::session::SessionState;
use crate::error::ClientError;
use crate::model::event_result::TransitionReport;

pub enum EngineCommand {
    Apply(Transition),
    /// New server settings. The session is kept.
    Reconfigure(ApiSettings),
}

pub enum EngineResponse {
    StateChanged {
        state: SessionState,
        report: TransitionReport,
    },

    Reconfigured(Result<(), ClientError>),

    /// No connection could be built, so the command was not attempted.
    Unavailable {
        action: &'static str,
        reason: String,
    },
}
