use std::fmt::Display;

use thiserror::Error;

/// Every way a transition can fail. All three are recovered at the
/// transition boundary and shown to the player; none of them leaves the
/// session half-updated.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ClientError {
    /// The server understood the request and refused it.
    #[error("{0}")]
    Application(String),

    /// Anything other than a usable JSON reply, including no reply at all.
    #[error("unexpected response: {0}")]
    MalformedResponse(String),

    #[error("{0}")]
    PreconditionNotMet(String),
}

impl ClientError {
    pub fn transport(err: impl Display) -> Self {
        ClientError::MalformedResponse(format!("transport: {err}"))
    }

    pub fn malformed(detail: impl Into<String>) -> Self {
        ClientError::MalformedResponse(detail.into())
    }

    pub fn precondition(reason: impl Into<String>) -> Self {
        ClientError::PreconditionNotMet(reason.into())
    }

    /// Text for the UI. Server rejections are passed through verbatim,
    /// everything unexpected gets its own phrasing.
    pub fn user_message(&self) -> String {
        match self {
            ClientError::Application(msg) => format!("Request rejected: {msg}"),
            ClientError::MalformedResponse(detail) => {
                format!("Unexpected response from server: {detail}")
            }
            ClientError::PreconditionNotMet(reason) => reason.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejection_and_malformed_read_differently() {
        let rejected = ClientError::Application("Monster not found".into());
        let malformed = ClientError::malformed("Server error: Page not found");

        assert_eq!(rejected.user_message(), "Request rejected: Monster not found");
        assert_eq!(
            malformed.user_message(),
            "Unexpected response from server: Server error: Page not found"
        );
    }

    #[test]
    fn transport_failures_count_as_malformed() {
        let err = ClientError::transport("connection refused");
        assert!(matches!(
            err,
            ClientError::MalformedResponse(ref d) if d == "transport: connection refused"
        ));
    }
}
