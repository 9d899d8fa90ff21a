use log::debug;
use secrecy::{ExposeSecret, SecretString};
use std::io;

use super::{Backend, Outcome, MISMATCH_NOTICE};
use crate::session::{Mode, Session};

/// A terminal the textual backend can talk to.
pub trait Device {
    /// Writes `text` without a line break.
    fn write(&mut self, text: &str) -> io::Result<()>;

    fn write_line(&mut self, text: &str) -> io::Result<()> {
        self.write(text)?;
        self.write("\n")
    }

    /// Reads a line without echoing it.
    fn read_masked_line(&mut self) -> io::Result<SecretString>;

    /// Reads a line with echo.
    fn read_line(&mut self) -> io::Result<String>;
}

/// Opens [`Device`]s by path.
pub trait DeviceOpener {
    type Device: Device;

    fn open(&self, path: &str) -> io::Result<Self::Device>;
}

/// Prompts on the terminal named by the session's tty.
pub struct Textual<O> {
    opener: O,
}

impl<O: DeviceOpener> Textual<O> {
    pub fn new(opener: O) -> Self {
        Textual { opener }
    }

    fn prompt_secret(device: &mut O::Device, prompt: &str) -> io::Result<SecretString> {
        device.write(prompt)?;
        device.write(" ")?;
        let secret = device.read_masked_line()?;
        device.write("\n")?;
        Ok(secret)
    }

    fn interact(device: &mut O::Device, session: &Session) -> io::Result<Outcome> {
        if !session.description.is_empty() {
            device.write_line(&session.description)?;
        }
        if !session.error.is_empty() {
            device.write_line(&session.error)?;
        }

        Ok(match session.mode {
            Mode::Default => Outcome::Secret(Self::prompt_secret(device, &session.prompt)?),
            Mode::RepeatEntry => loop {
                let first = Self::prompt_secret(device, &session.prompt)?;
                let second = Self::prompt_secret(device, &session.repeat_prompt)?;

                if first.expose_secret() == second.expose_secret() {
                    break Outcome::Secret(first);
                }
                device.write_line(&format!("{}!", MISMATCH_NOTICE))?;
            },
            Mode::Confirm => {
                device.write_line(&format!("[y]es: {}", session.ok_label))?;
                device.write_line(&format!("[n]o: {}", session.cancel_label))?;

                if device.read_line()?.trim() == "y" {
                    Outcome::Confirmed
                } else {
                    Outcome::Cancelled
                }
            }
            Mode::Message => Outcome::Confirmed,
        })
    }
}

impl<O: DeviceOpener> Backend for Textual<O> {
    fn run_interaction(&mut self, session: &Session) -> Outcome {
        let path = match &session.tty_name {
            Some(path) => path,
            None => return Outcome::Failed("No tty configured, use OPTION ttyname".to_owned()),
        };

        let mut device = match self.opener.open(path) {
            Ok(device) => device,
            Err(e) => {
                debug!("Could not open {}: {}", path, e);
                return Outcome::Failed(format!("Could not open {}: {}", path, e));
            }
        };

        Self::interact(&mut device, session).unwrap_or_else(|e| Outcome::Failed(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use secrecy::{ExposeSecret, SecretString};
    use std::cell::RefCell;
    use std::collections::VecDeque;
    use std::io;
    use std::rc::Rc;

    use super::{Device, DeviceOpener, Textual};
    use crate::backend::{Backend, Outcome};
    use crate::session::{Mode, Session};

    #[derive(Default)]
    struct Script {
        input: VecDeque<&'static str>,
        output: String,
    }

    struct ScriptedDevice(Rc<RefCell<Script>>);

    impl ScriptedDevice {
        fn next(&mut self) -> io::Result<String> {
            self.0
                .borrow_mut()
                .input
                .pop_front()
                .map(str::to_owned)
                .ok_or_else(|| io::Error::new(io::ErrorKind::UnexpectedEof, "tty closed"))
        }
    }

    impl Device for ScriptedDevice {
        fn write(&mut self, text: &str) -> io::Result<()> {
            self.0.borrow_mut().output.push_str(text);
            Ok(())
        }

        fn read_masked_line(&mut self) -> io::Result<SecretString> {
            self.next().map(SecretString::new)
        }

        fn read_line(&mut self) -> io::Result<String> {
            self.next()
        }
    }

    #[derive(Clone, Default)]
    struct Opener {
        script: Rc<RefCell<Script>>,
        opened: Rc<RefCell<Vec<String>>>,
    }

    impl Opener {
        fn with_input(input: &[&'static str]) -> Self {
            let opener = Opener::default();
            opener.script.borrow_mut().input.extend(input.iter().copied());
            opener
        }

        fn output(&self) -> String {
            self.script.borrow().output.clone()
        }
    }

    impl DeviceOpener for Opener {
        type Device = ScriptedDevice;

        fn open(&self, path: &str) -> io::Result<ScriptedDevice> {
            if path == "/dev/missing" {
                return Err(io::Error::new(io::ErrorKind::NotFound, "no such device"));
            }
            self.opened.borrow_mut().push(path.to_owned());
            Ok(ScriptedDevice(self.script.clone()))
        }
    }

    fn session(mode: Mode) -> Session {
        let mut session = Session::default();
        session.tty_name = Some("/dev/pts/7".to_owned());
        session.mode = mode;
        session
    }

    fn secret(outcome: Outcome) -> String {
        match outcome {
            Outcome::Secret(s) => s.expose_secret().clone(),
            other => panic!("expected a secret, got {:?}", other),
        }
    }

    #[test]
    fn default_reads_one_secret() {
        let opener = Opener::with_input(&["secret"]);
        let mut backend = Textual::new(opener.clone());

        assert_eq!(secret(backend.run_interaction(&session(Mode::Default))), "secret");
        assert_eq!(*opener.opened.borrow(), vec!["/dev/pts/7".to_owned()]);
        assert_eq!(opener.output(), "Enter your password\nPassword: \n");
    }

    #[test]
    fn repeat_retries_until_entries_match() {
        let opener = Opener::with_input(&["one", "two", "same", "same"]);
        let mut backend = Textual::new(opener.clone());

        let mut s = session(Mode::RepeatEntry);
        s.repeat_prompt = "Again:".to_owned();
        assert_eq!(secret(backend.run_interaction(&s)), "same");

        let output = opener.output();
        let notice = output.find("Passwords don't match!").unwrap();
        assert!(notice < output.rfind("Again:").unwrap());
        assert_eq!(output.matches("Passwords don't match!").count(), 1);
    }

    #[test]
    fn confirm_accepts_only_y() {
        let opener = Opener::with_input(&[" y \n"]);
        let mut backend = Textual::new(opener.clone());
        let mut s = session(Mode::Confirm);
        s.ok_label = "Sure".to_owned();
        s.cancel_label = "Nope".to_owned();
        assert!(matches!(backend.run_interaction(&s), Outcome::Confirmed));
        assert!(opener.output().contains("[y]es: Sure\n[n]o: Nope\n"));

        let mut backend = Textual::new(Opener::with_input(&["yes"]));
        assert!(matches!(backend.run_interaction(&s), Outcome::Cancelled));
    }

    #[test]
    fn message_does_not_read() {
        let opener = Opener::with_input(&[]);
        let mut backend = Textual::new(opener.clone());
        let mut s = session(Mode::Message);
        s.description = "Card removed".to_owned();
        assert!(matches!(backend.run_interaction(&s), Outcome::Confirmed));
        assert_eq!(opener.output(), "Card removed\n");
    }

    #[test]
    fn empty_description_is_suppressed_and_error_shown() {
        let opener = Opener::with_input(&["pw"]);
        let mut backend = Textual::new(opener.clone());
        let mut s = session(Mode::Default);
        s.description = String::new();
        s.error = "Bad PIN".to_owned();
        secret(backend.run_interaction(&s));
        assert_eq!(opener.output(), "Bad PIN\nPassword: \n");
    }

    #[test]
    fn failures() {
        let mut backend = Textual::new(Opener::with_input(&[]));

        let mut s = session(Mode::Default);
        s.tty_name = None;
        assert!(matches!(backend.run_interaction(&s), Outcome::Failed(_)));

        s.tty_name = Some("/dev/missing".to_owned());
        match backend.run_interaction(&s) {
            Outcome::Failed(detail) => assert!(detail.contains("/dev/missing")),
            other => panic!("unexpected {:?}", other),
        }

        // The device closes before the user answers.
        assert!(matches!(
            backend.run_interaction(&session(Mode::Default)),
            Outcome::Failed(_)
        ));
    }
}
