//! Interactive front ends.
//!
//! A backend conducts exactly one exchange with the user per call to
//! [`Backend::run_interaction`], driven by the [`Session`] as it stands at the
//! time of the call. Two backends exist:
//!
//! - [`Graphical`]: a dialog window with entry fields, buttons and a live
//!   password-strength meter. The window toolkit sits behind the [`Toolkit`]
//!   and [`Surface`] traits; [`window`] provides the terminal-drawn one used in
//!   production.
//! - [`Textual`]: line prompts written to the terminal device named by
//!   `OPTION ttyname`.
//!
//! [`Frontend::select`] picks one of them once, at start-up.

use log::{info, warn};
use secrecy::SecretString;
use std::io;

use crate::session::Session;

mod graphical;
mod textual;
pub mod tty;
pub mod window;

pub use graphical::{Graphical, Surface, Toolkit, UiEvent, Widget};
pub use textual::{Device, DeviceOpener, Textual};

/// Shown while the two entries of a repeat-entry prompt differ.
pub const MISMATCH_NOTICE: &str = "Passwords don't match";

/// The result of a single interaction.
#[derive(Debug)]
pub enum Outcome {
    /// The user entered a value (only in `Default` and `RepeatEntry` modes).
    Secret(SecretString),
    /// The user agreed, or acknowledged a message.
    Confirmed,
    /// The user declined or dismissed the prompt.
    Cancelled,
    /// The interaction could not take place.
    Failed(String),
}

/// A front end that can ask the user something.
pub trait Backend {
    /// Runs one interaction for `session.mode`, blocking until it ends.
    ///
    /// Errors are reported as [`Outcome::Failed`]; this never panics on I/O.
    fn run_interaction(&mut self, session: &Session) -> Outcome;
}

/// Estimates password strength.
pub trait StrengthEstimator {
    /// Entropy of `password`, in bits.
    fn estimate(&self, password: &str) -> f64;
}

/// [`StrengthEstimator`] backed by `zxcvbn`.
#[derive(Clone, Copy, Debug, Default)]
pub struct Zxcvbn;

impl StrengthEstimator for Zxcvbn {
    fn estimate(&self, password: &str) -> f64 {
        // zxcvbn refuses blank passwords.
        match zxcvbn::zxcvbn(password, &[]) {
            Ok(entropy) => entropy.guesses_log10() * std::f64::consts::LOG2_10,
            Err(_) => 0.0,
        }
    }
}

/// The backend chosen for this process.
pub enum Frontend {
    Graphical(Graphical<window::TerminalToolkit, Zxcvbn>),
    Textual(Textual<tty::TtyOpener>),
}

impl Frontend {
    /// Probes for a usable dialog and falls back to the textual backend.
    ///
    /// With `allow_dialog` unset the probe is skipped entirely.
    pub fn select(allow_dialog: bool) -> Self {
        if allow_dialog {
            Frontend::from_probe(window::TerminalToolkit::init())
        } else {
            Frontend::textual()
        }
    }

    /// Uses the dialog if `probe` found a toolkit, and tty prompts otherwise.
    fn from_probe(probe: io::Result<window::TerminalToolkit>) -> Self {
        match probe {
            Ok(toolkit) => {
                info!("Using the dialog backend");
                Frontend::Graphical(Graphical::new(toolkit, Zxcvbn))
            }
            Err(e) => {
                warn!("Dialog unavailable, falling back to tty prompts: {}", e);
                Frontend::textual()
            }
        }
    }

    fn textual() -> Self {
        info!("Using the tty backend");
        Frontend::Textual(Textual::new(tty::TtyOpener))
    }
}

impl Backend for Frontend {
    fn run_interaction(&mut self, session: &Session) -> Outcome {
        match self {
            Frontend::Graphical(backend) => backend.run_interaction(session),
            Frontend::Textual(backend) => backend.run_interaction(session),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::io;

    use super::{window::TerminalToolkit, Frontend, StrengthEstimator, Zxcvbn};

    #[test]
    fn zxcvbn_estimates() {
        assert_eq!(Zxcvbn.estimate(""), 0.0);
        let weak = Zxcvbn.estimate("password");
        let strong = Zxcvbn.estimate("correct horse battery staple 93!");
        assert!(weak >= 0.0);
        assert!(strong > weak);
    }

    #[test]
    fn failed_probe_falls_back_to_tty() {
        let probe = Err(io::Error::new(io::ErrorKind::NotFound, "no controlling terminal"));
        assert!(matches!(Frontend::from_probe(probe), Frontend::Textual(_)));
    }

    #[test]
    fn working_probe_uses_dialog() {
        assert!(matches!(
            Frontend::from_probe(Ok(TerminalToolkit)),
            Frontend::Graphical(_)
        ));
    }

    #[test]
    fn dialog_can_be_turned_off() {
        assert!(matches!(Frontend::select(false), Frontend::Textual(_)));
    }
}
