use log::warn;
use secrecy::{ExposeSecret, SecretString};
use std::io;

use super::{Backend, Outcome, StrengthEstimator, MISMATCH_NOTICE};
use crate::session::{Mode, Session};

/// Entropy at which the strength meter is full.
const STRENGTH_BAR_MAX: f64 = 100.0;

/// The named widgets of the dialog.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Widget {
    Description,
    Prompt,
    RepeatPrompt,
    Error,
    Password,
    RepeatPassword,
    Entropy,
    Strength,
    Ok,
    Cancel,
}

impl Widget {
    pub const ALL: [Widget; 10] = [
        Widget::Description,
        Widget::Prompt,
        Widget::RepeatPrompt,
        Widget::Error,
        Widget::Password,
        Widget::RepeatPassword,
        Widget::Entropy,
        Widget::Strength,
        Widget::Ok,
        Widget::Cancel,
    ];
}

/// Something the user did in the dialog.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UiEvent {
    /// The contents of an entry changed.
    Changed(Widget),
    /// Enter was pressed in an entry.
    Activated(Widget),
    /// A button was pressed.
    Clicked(Widget),
    /// The window was closed.
    Closed,
}

/// An open dialog window.
pub trait Surface {
    fn set_text(&mut self, widget: Widget, text: &str);

    fn set_visible(&mut self, widget: Widget, visible: bool);

    /// Sets how full a meter is, from 0 to 1.
    fn set_fraction(&mut self, widget: Widget, fraction: f64);

    fn grab_focus(&mut self, widget: Widget);

    /// Current contents of an entry.
    fn entry_text(&self, widget: Widget) -> SecretString;

    /// Runs the window's event loop until the user does something.
    fn next_event(&mut self) -> io::Result<UiEvent>;

    /// Closes the window and releases whatever it holds.
    fn destroy(self) -> io::Result<()>;
}

/// A window system that can open dialogs.
pub trait Toolkit {
    type Surface: Surface;

    fn create_window(&mut self) -> io::Result<Self::Surface>;
}

/// Conducts interactions in a dialog window.
pub struct Graphical<T, E> {
    toolkit: T,
    estimator: E,
}

impl<T: Toolkit, E: StrengthEstimator> Graphical<T, E> {
    pub fn new(toolkit: T, estimator: E) -> Self {
        Graphical { toolkit, estimator }
    }
}

impl<T: Toolkit, E: StrengthEstimator> Backend for Graphical<T, E> {
    fn run_interaction(&mut self, session: &Session) -> Outcome {
        let mut surface = match self.toolkit.create_window() {
            Ok(surface) => surface,
            Err(e) => return Outcome::Failed(format!("Could not open dialog: {}", e)),
        };

        let outcome = Dialog {
            surface: &mut surface,
            estimator: &self.estimator,
            session,
            entries_match: true,
        }
        .run()
        .unwrap_or_else(|e| Outcome::Failed(e.to_string()));

        if let Err(e) = surface.destroy() {
            warn!("Could not close dialog: {}", e);
        }
        outcome
    }
}

struct Dialog<'a, S, E> {
    surface: &'a mut S,
    estimator: &'a E,
    session: &'a Session,
    entries_match: bool,
}

impl<'a, S: Surface, E: StrengthEstimator> Dialog<'a, S, E> {
    fn show(&mut self) {
        let session = self.session;
        let surface = &mut *self.surface;

        surface.set_text(Widget::Description, &session.description);
        surface.set_text(Widget::Prompt, &session.prompt);
        surface.set_text(Widget::RepeatPrompt, &session.repeat_prompt);
        surface.set_text(Widget::Error, &session.error);
        surface.set_text(Widget::Ok, &session.ok_label);
        surface.set_text(Widget::Cancel, &session.cancel_label);

        let secret = session.mode.wants_secret();
        let repeat = session.mode == Mode::RepeatEntry;
        for widget in Widget::ALL.iter().copied() {
            let visible = match widget {
                Widget::Description | Widget::Ok => true,
                Widget::Error => !session.error.is_empty(),
                Widget::Prompt | Widget::Password | Widget::Entropy | Widget::Strength => secret,
                Widget::RepeatPrompt | Widget::RepeatPassword => repeat,
                Widget::Cancel => session.mode != Mode::Message,
            };
            surface.set_visible(widget, visible);
        }

        surface.grab_focus(match session.mode {
            Mode::Default | Mode::RepeatEntry => Widget::Password,
            Mode::Confirm => Widget::Cancel,
            Mode::Message => Widget::Ok,
        });

        if secret {
            self.entry_changed();
        }
    }

    fn entry_changed(&mut self) {
        let password = self.surface.entry_text(Widget::Password);
        let bits = self.estimator.estimate(password.expose_secret());
        self.surface
            .set_text(Widget::Entropy, &format!("Entropy: {} bits", bits.round() as u64));
        self.surface.set_fraction(
            Widget::Strength,
            (bits / STRENGTH_BAR_MAX).max(0.0).min(1.0),
        );

        if self.session.mode != Mode::RepeatEntry {
            return;
        }

        let repeated = self.surface.entry_text(Widget::RepeatPassword);
        self.entries_match = password.expose_secret() == repeated.expose_secret();
        if self.entries_match {
            self.surface.set_text(Widget::Error, &self.session.error);
            self.surface
                .set_visible(Widget::Error, !self.session.error.is_empty());
        } else {
            self.surface.set_text(Widget::Error, MISMATCH_NOTICE);
            self.surface.set_visible(Widget::Error, true);
        }
    }

    /// The affirmative action; `None` while it is disabled.
    fn accept(&mut self) -> Option<Outcome> {
        if !self.entries_match {
            return None;
        }

        Some(if self.session.mode.wants_secret() {
            Outcome::Secret(self.surface.entry_text(Widget::Password))
        } else {
            Outcome::Confirmed
        })
    }

    fn dismiss(&self) -> Outcome {
        match self.session.mode {
            Mode::Message => Outcome::Confirmed,
            _ => Outcome::Cancelled,
        }
    }

    fn run(mut self) -> io::Result<Outcome> {
        self.show();

        loop {
            let outcome = match self.surface.next_event()? {
                UiEvent::Changed(_) => {
                    self.entry_changed();
                    None
                }
                UiEvent::Activated(Widget::Password) if self.session.mode == Mode::RepeatEntry => {
                    self.surface.grab_focus(Widget::RepeatPassword);
                    None
                }
                UiEvent::Activated(_) | UiEvent::Clicked(Widget::Ok) => self.accept(),
                UiEvent::Clicked(_) | UiEvent::Closed => Some(self.dismiss()),
            };

            if let Some(outcome) = outcome {
                break Ok(outcome);
            }
        }
    }
}
