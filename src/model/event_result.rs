use crate::error::ClientError;

#[derive(Debug, Clone, PartialEq)]
pub enum TransitionOutcome {
    Applied { notes: Vec<String> },
    Rejected { error: ClientError },
}

/// What one transition did, sent back to the UI together with the new state.
#[derive(Debug, Clone, PartialEq)]
pub struct TransitionReport {
    pub action: &'static str,
    pub outcome: TransitionOutcome,
}

impl TransitionReport {
    pub fn is_applied(&self) -> bool {
        matches!(self.outcome, TransitionOutcome::Applied { .. })
    }

    pub fn error(&self) -> Option<&ClientError> {
        match &self.outcome {
            TransitionOutcome::Rejected { error } => Some(error),
            TransitionOutcome::Applied { .. } => None,
        }
    }
}
