//! Session configuration that persists between commands.

pub(crate) const DEFAULT_DESCRIPTION: &str = "Enter your password";
pub(crate) const DEFAULT_PROMPT: &str = "Password:";
pub(crate) const DEFAULT_REPEAT_PROMPT: &str = "Repeat:";
pub(crate) const DEFAULT_OK_LABEL: &str = "Ok";
pub(crate) const DEFAULT_CANCEL_LABEL: &str = "Cancel";

/// The kind of interaction a backend conducts.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Mode {
    /// Ask for a single secret.
    Default,
    /// Ask for a secret twice and only accept matching entries.
    RepeatEntry,
    /// Ask a yes/no question.
    Confirm,
    /// Show a message that only needs acknowledging.
    Message,
}

impl Mode {
    /// Whether this mode collects a secret from the user.
    pub fn wants_secret(self) -> bool {
        matches!(self, Mode::Default | Mode::RepeatEntry)
    }
}

impl Default for Mode {
    fn default() -> Self {
        Mode::Default
    }
}

/// Texts and settings configured by the caller through `SET*` and `OPTION`.
///
/// A single `Session` is owned by the [`Server`](crate::Server). Backends only
/// ever see it by shared reference.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Session {
    pub description: String,
    pub prompt: String,
    pub repeat_prompt: String,
    pub error: String,
    pub ok_label: String,
    pub cancel_label: String,
    pub mode: Mode,
    /// Terminal device the textual backend talks to.
    pub tty_name: Option<String>,
}

impl Default for Session {
    fn default() -> Self {
        Session {
            description: DEFAULT_DESCRIPTION.to_owned(),
            prompt: DEFAULT_PROMPT.to_owned(),
            repeat_prompt: DEFAULT_REPEAT_PROMPT.to_owned(),
            error: String::new(),
            ok_label: DEFAULT_OK_LABEL.to_owned(),
            cancel_label: DEFAULT_CANCEL_LABEL.to_owned(),
            mode: Mode::Default,
            tty_name: None,
        }
    }
}

impl Session {
    /// Restores every field, including the mode and the tty, to its default.
    pub fn reset(&mut self) {
        *self = Session::default();
    }

    /// Sets the second prompt. This also switches to repeat-entry mode.
    pub fn set_repeat_prompt(&mut self, prompt: String) {
        self.repeat_prompt = prompt;
        self.mode = Mode::RepeatEntry;
    }

    /// Sets the tty path; an empty path clears it.
    pub fn set_tty_name(&mut self, path: String) {
        self.tty_name = if path.is_empty() { None } else { Some(path) };
    }
}

#[cfg(test)]
mod tests {
    use quickcheck::{Arbitrary, Gen};
    use quickcheck_macros::quickcheck;

    use super::{Mode, Session};

    #[derive(Clone, Debug)]
    enum Mutation {
        Description(String),
        Prompt(String),
        Repeat(String),
        Error(String),
        Ok(String),
        Cancel(String),
        Tty(String),
        Mode(Mode),
    }

    impl Arbitrary for Mutation {
        fn arbitrary(g: &mut Gen) -> Self {
            let text = String::arbitrary(g);
            let mode = *g
                .choose(&[Mode::Default, Mode::RepeatEntry, Mode::Confirm, Mode::Message])
                .unwrap();
            match u8::arbitrary(g) % 8 {
                0 => Mutation::Description(text),
                1 => Mutation::Prompt(text),
                2 => Mutation::Repeat(text),
                3 => Mutation::Error(text),
                4 => Mutation::Ok(text),
                5 => Mutation::Cancel(text),
                6 => Mutation::Tty(text),
                _ => Mutation::Mode(mode),
            }
        }
    }

    fn apply(session: &mut Session, mutation: Mutation) {
        match mutation {
            Mutation::Description(s) => session.description = s,
            Mutation::Prompt(s) => session.prompt = s,
            Mutation::Repeat(s) => session.set_repeat_prompt(s),
            Mutation::Error(s) => session.error = s,
            Mutation::Ok(s) => session.ok_label = s,
            Mutation::Cancel(s) => session.cancel_label = s,
            Mutation::Tty(s) => session.set_tty_name(s),
            Mutation::Mode(m) => session.mode = m,
        }
    }

    #[quickcheck]
    fn reset_restores_defaults(mutations: Vec<Mutation>) -> bool {
        let mut session = Session::default();
        for m in mutations {
            apply(&mut session, m);
        }
        session.reset();
        session == Session::default()
    }

    #[test]
    fn defaults() {
        let session = Session::default();
        assert_eq!(session.description, "Enter your password");
        assert_eq!(session.prompt, "Password:");
        assert_eq!(session.repeat_prompt, "Repeat:");
        assert_eq!(session.error, "");
        assert_eq!(session.ok_label, "Ok");
        assert_eq!(session.cancel_label, "Cancel");
        assert_eq!(session.mode, Mode::Default);
        assert_eq!(session.tty_name, None);
    }

    #[test]
    fn repeat_prompt_switches_mode() {
        let mut session = Session::default();
        session.set_repeat_prompt("Again:".to_owned());
        assert_eq!(session.repeat_prompt, "Again:");
        assert_eq!(session.mode, Mode::RepeatEntry);
    }

    #[test]
    fn empty_tty_name_unsets() {
        let mut session = Session::default();
        session.set_tty_name("/dev/pts/3".to_owned());
        assert_eq!(session.tty_name.as_deref(), Some("/dev/pts/3"));
        session.set_tty_name(String::new());
        assert_eq!(session.tty_name, None);
    }
}
