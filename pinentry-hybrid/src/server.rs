//! Command dispatcher.

use log::debug;
use secrecy::SecretString;
use std::io::{BufRead, Write};

use crate::{
    backend::{Backend, Outcome},
    connection::Connection,
    error::Error,
    format::{Command, ProtocolOption, COMMANDS},
    session::{Mode, Session},
};

const CANCELLED: &str = "Operation cancelled";
const NOT_CONFIRMED: &str = "not confirmed";

/// What a successful command sends before its `OK`.
#[derive(Debug)]
pub enum Reply {
    /// Nothing.
    Done,
    /// A `D` line carrying the secret.
    Data(SecretString),
    /// One comment line per known command.
    Help,
}

/// Executes protocol commands against a [`Session`] and a [`Backend`].
pub struct Server<B> {
    session: Session,
    backend: B,
}

impl<B: Backend> Server<B> {
    pub fn new(backend: B) -> Self {
        Server::with_session(backend, Session::default())
    }

    /// Starts from `session` instead of the defaults.
    pub fn with_session(backend: B, session: Session) -> Self {
        Server { session, backend }
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Runs the backend in `mode` (or the session's current mode), then drops
    /// back to the default mode.
    fn interact(&mut self, mode: Option<Mode>) -> Outcome {
        if let Some(mode) = mode {
            self.session.mode = mode;
        }
        let outcome = self.backend.run_interaction(&self.session);
        self.session.mode = Mode::Default;
        outcome
    }

    /// Executes a single command.
    ///
    /// `Err` holds the message for the `ERR` line.
    pub fn execute(&mut self, command: Command) -> Result<Reply, String> {
        match command {
            Command::Nop | Command::Bye => (),
            Command::Reset => self.session.reset(),
            Command::Help => return Ok(Reply::Help),
            Command::Option(ProtocolOption::TtyName(path)) => self.session.set_tty_name(path),
            Command::Option(ProtocolOption::Unknown(arg)) => {
                return Err(format!("Unknown option {}", arg))
            }
            Command::SetDescription(text) => self.session.description = text,
            Command::SetPrompt(text) => self.session.prompt = text,
            Command::SetRepeat(text) => self.session.set_repeat_prompt(text),
            Command::SetError(text) => self.session.error = text,
            Command::SetOk(text) => self.session.ok_label = text,
            Command::SetCancel(text) => self.session.cancel_label = text,
            Command::GetPin => {
                return match self.interact(None) {
                    Outcome::Secret(secret) => Ok(Reply::Data(secret)),
                    Outcome::Confirmed => Ok(Reply::Done),
                    Outcome::Cancelled => Err(CANCELLED.to_owned()),
                    Outcome::Failed(detail) => Err(detail),
                }
            }
            Command::Confirm => {
                return match self.interact(Some(Mode::Confirm)) {
                    Outcome::Confirmed => Ok(Reply::Done),
                    Outcome::Failed(detail) => Err(detail),
                    Outcome::Secret(_) | Outcome::Cancelled => Err(NOT_CONFIRMED.to_owned()),
                }
            }
            Command::Message => {
                return match self.interact(Some(Mode::Message)) {
                    Outcome::Failed(detail) => Err(detail),
                    _ => Ok(Reply::Done),
                }
            }
            Command::Unknown(name) => return Err(format!("Unknown command {}, use HELP", name)),
        }
        Ok(Reply::Done)
    }

    /// Greets the caller and answers commands until `BYE`.
    ///
    /// Returns an error if the connection fails or closes before `BYE`.
    pub fn serve<R: BufRead, W: Write>(
        &mut self,
        conn: &mut Connection<R, W>,
    ) -> Result<(), Error> {
        conn.greeting()?;

        loop {
            let command = conn.read_command()?;
            debug!("Received {}", command.name());
            let bye = command == Command::Bye;

            match self.execute(command) {
                Ok(Reply::Done) => (),
                Ok(Reply::Data(secret)) => conn.data(&secret)?,
                Ok(Reply::Help) => {
                    for name in COMMANDS.iter() {
                        conn.comment(name)?;
                    }
                }
                Err(message) => {
                    debug!("Replying with error: {}", message);
                    conn.error(&message)?;
                    continue;
                }
            }
            conn.ok()?;

            if bye {
                break Ok(());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use secrecy::{ExposeSecret, SecretString};
    use std::collections::VecDeque;

    use super::{Reply, Server};
    use crate::backend::{Backend, Outcome};
    use crate::format::{Command, ProtocolOption};
    use crate::session::{Mode, Session};

    /// Replays canned outcomes and records the mode of each call.
    #[derive(Default)]
    struct Canned {
        outcomes: VecDeque<Outcome>,
        modes: Vec<Mode>,
    }

    impl Canned {
        fn new(outcomes: Vec<Outcome>) -> Self {
            Canned {
                outcomes: outcomes.into(),
                modes: vec![],
            }
        }
    }

    impl Backend for Canned {
        fn run_interaction(&mut self, session: &Session) -> Outcome {
            self.modes.push(session.mode);
            self.outcomes
                .pop_front()
                .unwrap_or_else(|| Outcome::Failed("no more outcomes".to_owned()))
        }
    }

    fn secret(reply: Result<Reply, String>) -> String {
        match reply {
            Ok(Reply::Data(s)) => s.expose_secret().clone(),
            other => panic!("expected data, got {:?}", other),
        }
    }

    #[test]
    fn setters() {
        let mut server = Server::new(Canned::default());
        for command in vec![
            Command::SetDescription("desc".to_owned()),
            Command::SetPrompt("PIN:".to_owned()),
            Command::SetError("wrong".to_owned()),
            Command::SetOk("Yes".to_owned()),
            Command::SetCancel("No".to_owned()),
            Command::Option(ProtocolOption::TtyName("/dev/pts/2".to_owned())),
        ] {
            assert!(matches!(server.execute(command), Ok(Reply::Done)));
        }

        let session = server.session();
        assert_eq!(session.description, "desc");
        assert_eq!(session.prompt, "PIN:");
        assert_eq!(session.error, "wrong");
        assert_eq!(session.ok_label, "Yes");
        assert_eq!(session.cancel_label, "No");
        assert_eq!(session.tty_name.as_deref(), Some("/dev/pts/2"));
        assert_eq!(session.mode, Mode::Default);

        server.execute(Command::Reset).unwrap();
        assert_eq!(*server.session(), Session::default());
    }

    #[test]
    fn errors() {
        let mut server = Server::new(Canned::default());
        assert_eq!(
            server.execute(Command::Unknown("FOO".to_owned())).unwrap_err(),
            "Unknown command FOO, use HELP"
        );
        assert_eq!(
            server
                .execute(Command::Option(ProtocolOption::Unknown("badkey=x".to_owned())))
                .unwrap_err(),
            "Unknown option badkey=x"
        );
    }

    #[test]
    fn getpin_in_repeat_mode_resets_mode() {
        let mut server = Server::new(Canned::new(vec![Outcome::Secret(SecretString::new(
            "pw".to_owned(),
        ))]));
        server.execute(Command::SetRepeat("Again:".to_owned())).unwrap();
        assert_eq!(server.session().mode, Mode::RepeatEntry);

        assert_eq!(secret(server.execute(Command::GetPin)), "pw");
        assert_eq!(server.backend.modes, vec![Mode::RepeatEntry]);
        assert_eq!(server.session().mode, Mode::Default);
        assert_eq!(server.session().repeat_prompt, "Again:");
    }

    #[test]
    fn getpin_outcomes() {
        let mut server = Server::new(Canned::new(vec![
            Outcome::Cancelled,
            Outcome::Failed("Could not open /dev/pts/9".to_owned()),
        ]));
        assert_eq!(server.execute(Command::GetPin).unwrap_err(), "Operation cancelled");
        assert_eq!(
            server.execute(Command::GetPin).unwrap_err(),
            "Could not open /dev/pts/9"
        );
    }

    #[test]
    fn confirm_and_message_modes() {
        let mut server = Server::new(Canned::new(vec![
            Outcome::Confirmed,
            Outcome::Cancelled,
            Outcome::Cancelled,
            Outcome::Failed("gone".to_owned()),
        ]));

        assert!(matches!(server.execute(Command::Confirm), Ok(Reply::Done)));
        assert_eq!(server.execute(Command::Confirm).unwrap_err(), "not confirmed");
        assert_eq!(server.session().mode, Mode::Default);

        assert!(matches!(server.execute(Command::Message), Ok(Reply::Done)));
        assert_eq!(server.execute(Command::Message).unwrap_err(), "gone");
        assert_eq!(server.session().mode, Mode::Default);

        assert_eq!(
            server.backend.modes,
            vec![Mode::Confirm, Mode::Confirm, Mode::Message, Mode::Message]
        );
    }

    #[test]
    fn interactions_see_current_session() {
        let mut server = Server::new(Canned::new(vec![Outcome::Confirmed]));
        server.execute(Command::SetRepeat("x".to_owned())).unwrap();
        server.execute(Command::Confirm).unwrap();
        // Confirm overrides the pending repeat mode, and clears it afterwards.
        assert_eq!(server.backend.modes, vec![Mode::Confirm]);
        assert_eq!(server.session().mode, Mode::Default);
    }
}
