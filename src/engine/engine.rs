use std::sync::mpsc::{Receiver, Sender};

use log::{debug, error, info};

use crate::engine::driver::TransitionDriver;
use crate::engine::protocol::{EngineCommand, EngineResponse};
use crate::engine::routes::ApiSettings;
use crate::engine::transport::Transport;
use crate::error::ClientError;

pub type Connect<T> = fn(&ApiSettings) -> Result<T, ClientError>;

/// Runs on its own thread and handles one command at a time, so at most one
/// request is ever in flight.
pub struct Engine<T> {
    rx: Receiver<EngineCommand>,
    tx: Sender<EngineResponse>,
    connect: Connect<T>,
    driver: Result<TransitionDriver<T>, String>,
}

impl<T: Transport> Engine<T> {
    pub fn new(
        rx: Receiver<EngineCommand>,
        tx: Sender<EngineResponse>,
        settings: &ApiSettings,
        connect: Connect<T>,
    ) -> Self {
        let driver = match connect(settings) {
            Ok(transport) => {
                info!("engine ready for {}", settings.api_base);
                Ok(TransitionDriver::new(transport, settings.routes.clone()))
            }
            Err(e) => {
                error!("cannot reach {}: {e}", settings.api_base);
                Err(e.to_string())
            }
        };

        Self { rx, tx, connect, driver }
    }

    pub fn run(&mut self) {
        while let Ok(cmd) = self.rx.recv() {
            match cmd {
                EngineCommand::Apply(transition) => match &mut self.driver {
                    Ok(driver) => {
                        let report = driver.apply(transition);
                        let _ = self.tx.send(EngineResponse::StateChanged {
                            state: driver.state().clone(),
                            report,
                        });
                    }
                    Err(reason) => {
                        let _ = self.tx.send(EngineResponse::Unavailable {
                            action: transition.name(),
                            reason: reason.clone(),
                        });
                    }
                },

                EngineCommand::Reconfigure(settings) => {
                    debug!("reconfiguring for {}", settings.api_base);
                    let result = (self.connect)(&settings).map(|transport| {
                        let routes = settings.routes.clone();
                        match &mut self.driver {
                            Ok(driver) => driver.reconfigure(transport, routes),
                            Err(_) => self.driver = Ok(TransitionDriver::new(transport, routes)),
                        }
                    });
                    match &result {
                        Ok(()) => info!("now talking to {}", settings.api_base),
                        Err(e) => error!("settings rejected: {e}"),
                    }
                    let _ = self.tx.send(EngineResponse::Reconfigured(result));
                }
            }
        }
        debug!("engine channel closed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::driver::Transition;
    use crate::engine::transport::{ApiRequest, RawReply};
    use std::sync::mpsc;

    /// Answers every request with the same character.
    struct FixedTransport;

    impl Transport for FixedTransport {
        fn send(&self, _request: &ApiRequest) -> Result<RawReply, ClientError> {
            Ok(RawReply {
                status: 200,
                content_type: Some("application/json".into()),
                body: r#"{"id": 4, "name": "Kell", "wins": 2}"#.into(),
            })
        }
    }

    fn connect_ok(_: &ApiSettings) -> Result<FixedTransport, ClientError> {
        Ok(FixedTransport)
    }

    fn connect_only_local(settings: &ApiSettings) -> Result<FixedTransport, ClientError> {
        if settings.api_base.contains("127.0.0.1") {
            Ok(FixedTransport)
        } else {
            Err(ClientError::transport("unreachable"))
        }
    }

    fn run_engine(
        settings: ApiSettings,
        connect: Connect<FixedTransport>,
        commands: Vec<EngineCommand>,
    ) -> Vec<EngineResponse> {
        let (cmd_tx, cmd_rx) = mpsc::channel();
        let (resp_tx, resp_rx) = mpsc::channel();
        for cmd in commands {
            cmd_tx.send(cmd).unwrap();
        }
        drop(cmd_tx);
        Engine::new(cmd_rx, resp_tx, &settings, connect).run();
        resp_rx.try_iter().collect()
    }

    #[test]
    fn each_command_gets_one_state_snapshot() {
        let responses = run_engine(
            ApiSettings::default(),
            connect_ok,
            vec![EngineCommand::Apply(Transition::LoadCharacter { id: "4".into() })],
        );
        assert_eq!(responses.len(), 1);
        match &responses[0] {
            EngineResponse::StateChanged { state, report } => {
                assert!(report.is_applied());
                assert_eq!(state.character().map(|c| c.wins), Some(2));
            }
            _ => panic!("expected a state change"),
        }
    }

    #[test]
    fn reconfigure_keeps_the_session() {
        let responses = run_engine(
            ApiSettings::default(),
            connect_ok,
            vec![
                EngineCommand::Apply(Transition::LoadCharacter { id: "4".into() }),
                EngineCommand::Reconfigure(ApiSettings::default()),
                EngineCommand::Apply(Transition::Navigate(crate::engine::session::View::LevelUp)),
            ],
        );
        assert!(matches!(responses[1], EngineResponse::Reconfigured(Ok(()))));
        match &responses[2] {
            EngineResponse::StateChanged { state, .. } => assert!(state.character().is_some()),
            _ => panic!("expected a state change"),
        }
    }

    #[test]
    fn bad_settings_leave_the_engine_unavailable_until_fixed() {
        let remote = ApiSettings {
            api_base: "http://game.invalid".into(),
            ..ApiSettings::default()
        };
        let responses = run_engine(
            remote,
            connect_only_local,
            vec![
                EngineCommand::Apply(Transition::FetchClasses),
                EngineCommand::Reconfigure(ApiSettings::default()),
                EngineCommand::Apply(Transition::LoadCharacter { id: "4".into() }),
            ],
        );
        assert!(matches!(responses[0], EngineResponse::Unavailable { action: "Classes", .. }));
        assert!(matches!(responses[1], EngineResponse::Reconfigured(Ok(()))));
        assert!(matches!(responses[2], EngineResponse::StateChanged { .. }));
    }
}
