//! A dialog drawn on the controlling terminal.
//!
//! The dialog takes over the whole terminal while it is open (alternate screen,
//! raw mode) and reads keys through `crossterm`, which talks to the controlling
//! terminal directly when stdin is the protocol pipe.
//!
//! Keys: Tab / arrow keys move between fields and buttons, Enter activates,
//! Space presses the focused button, Esc or Ctrl-C close the dialog.

use crossterm::{
    cursor,
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    execute,
    terminal::{self, disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Gauge, Paragraph, Wrap},
    Frame, Terminal,
};
use secrecy::SecretString;
use std::collections::{HashMap, HashSet};
use std::convert::TryFrom;
use std::fs::{File, OpenOptions};
use std::io;
use zeroize::Zeroize;

use super::graphical::{Surface, Toolkit, UiEvent, Widget};

#[cfg(unix)]
const CONTROLLING_TERMINAL: &str = "/dev/tty";
#[cfg(windows)]
const CONTROLLING_TERMINAL: &str = "CONOUT$";

const DIALOG_WIDTH: u16 = 64;
const TITLE: &str = " pinentry-hybrid ";

/// Focus order of the interactive widgets.
const FOCUS_ORDER: [Widget; 4] = [
    Widget::Password,
    Widget::RepeatPassword,
    Widget::Ok,
    Widget::Cancel,
];

fn is_entry(widget: Widget) -> bool {
    matches!(widget, Widget::Password | Widget::RepeatPassword)
}

/// Opens [`TerminalWindow`]s on the controlling terminal.
#[derive(Debug)]
pub struct TerminalToolkit;

impl TerminalToolkit {
    /// Checks that there is a controlling terminal to draw on.
    pub fn init() -> io::Result<Self> {
        OpenOptions::new()
            .read(true)
            .write(true)
            .open(CONTROLLING_TERMINAL)?;

        match terminal::size()? {
            (0, _) | (_, 0) => Err(io::Error::new(
                io::ErrorKind::Other,
                "terminal has no size",
            )),
            _ => Ok(TerminalToolkit),
        }
    }
}

impl Toolkit for TerminalToolkit {
    type Surface = TerminalWindow;

    fn create_window(&mut self) -> io::Result<TerminalWindow> {
        let mut tty = OpenOptions::new()
            .read(true)
            .write(true)
            .open(CONTROLLING_TERMINAL)?;

        enable_raw_mode()?;
        let terminal = execute!(tty, EnterAlternateScreen, cursor::Hide)
            .and_then(|()| Terminal::new(CrosstermBackend::new(tty)));
        match terminal {
            Ok(terminal) => Ok(TerminalWindow {
                terminal,
                widgets: Widgets::default(),
                open: true,
            }),
            Err(e) => {
                let _ = disable_raw_mode();
                Err(e)
            }
        }
    }
}

#[derive(Default)]
struct Widgets {
    texts: HashMap<Widget, String>,
    hidden: HashSet<Widget>,
    entries: HashMap<Widget, String>,
    strength: f64,
    focus: Option<Widget>,
}

/// A [`Surface`] drawn with `ratatui`.
pub struct TerminalWindow {
    terminal: Terminal<CrosstermBackend<File>>,
    widgets: Widgets,
    open: bool,
}

impl TerminalWindow {
    fn draw(&mut self) -> io::Result<()> {
        let widgets = &self.widgets;
        self.terminal.draw(|frame| widgets.render(frame))?;
        Ok(())
    }

    fn restore(&mut self) -> io::Result<()> {
        if !self.open {
            return Ok(());
        }
        self.open = false;

        for entry in self.widgets.entries.values_mut() {
            entry.zeroize();
        }
        let raw = disable_raw_mode();
        execute!(self.terminal.backend_mut(), LeaveAlternateScreen, cursor::Show)?;
        raw
    }
}

impl Drop for TerminalWindow {
    fn drop(&mut self) {
        let _ = self.restore();
    }
}

impl Surface for TerminalWindow {
    fn set_text(&mut self, widget: Widget, text: &str) {
        self.widgets.texts.insert(widget, text.to_owned());
    }

    fn set_visible(&mut self, widget: Widget, visible: bool) {
        if visible {
            self.widgets.hidden.remove(&widget);
        } else {
            self.widgets.hidden.insert(widget);
        }
    }

    fn set_fraction(&mut self, _: Widget, fraction: f64) {
        self.widgets.strength = fraction.max(0.0).min(1.0);
    }

    fn grab_focus(&mut self, widget: Widget) {
        self.widgets.focus = Some(widget);
    }

    fn entry_text(&self, widget: Widget) -> SecretString {
        SecretString::new(self.widgets.entries.get(&widget).cloned().unwrap_or_default())
    }

    fn next_event(&mut self) -> io::Result<UiEvent> {
        loop {
            self.draw()?;
            if let Event::Key(key) = event::read()? {
                if key.kind != KeyEventKind::Press {
                    continue;
                }
                if let Some(event) = self.widgets.handle_key(key) {
                    break Ok(event);
                }
            }
        }
    }

    fn destroy(mut self) -> io::Result<()> {
        self.restore()
    }
}

impl Widgets {
    fn visible(&self, widget: Widget) -> bool {
        !self.hidden.contains(&widget)
    }

    fn text(&self, widget: Widget) -> &str {
        self.texts.get(&widget).map(String::as_str).unwrap_or("")
    }

    /// Moves focus to the next (or previous) visible focusable widget.
    fn move_focus(&mut self, forward: bool) {
        let order: Vec<Widget> = FOCUS_ORDER
            .iter()
            .copied()
            .filter(|w| self.visible(*w))
            .collect();
        if order.is_empty() {
            return;
        }

        let current = self
            .focus
            .and_then(|f| order.iter().position(|w| *w == f));
        let next = match (current, forward) {
            (Some(i), true) => (i + 1) % order.len(),
            (Some(i), false) => (i + order.len() - 1) % order.len(),
            (None, _) => 0,
        };
        self.focus = Some(order[next]);
    }

    fn handle_key(&mut self, key: KeyEvent) -> Option<UiEvent> {
        let focus = self.focus;
        let on_entry = focus.map(is_entry).unwrap_or(false);

        match key.code {
            KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                Some(UiEvent::Closed)
            }
            KeyCode::Esc => Some(UiEvent::Closed),
            KeyCode::Tab | KeyCode::Down => {
                self.move_focus(true);
                None
            }
            KeyCode::BackTab | KeyCode::Up => {
                self.move_focus(false);
                None
            }
            KeyCode::Left | KeyCode::Right if !on_entry => {
                self.move_focus(key.code == KeyCode::Right);
                None
            }
            KeyCode::Enter => focus.map(|w| {
                if is_entry(w) {
                    UiEvent::Activated(w)
                } else {
                    UiEvent::Clicked(w)
                }
            }),
            KeyCode::Char(' ') if !on_entry => focus.map(UiEvent::Clicked),
            KeyCode::Char(c) if on_entry => {
                let widget = focus?;
                self.entries.entry(widget).or_default().push(c);
                Some(UiEvent::Changed(widget))
            }
            KeyCode::Backspace if on_entry => {
                let widget = focus?;
                self.entries.get_mut(&widget)?.pop()?;
                Some(UiEvent::Changed(widget))
            }
            _ => None,
        }
    }

    fn focused_style(&self, widget: Widget) -> Style {
        if self.focus == Some(widget) {
            Style::default().add_modifier(Modifier::REVERSED)
        } else {
            Style::default()
        }
    }

    fn entry_line(&self, prompt: Widget, entry: Widget) -> Line<'_> {
        let typed = self.entries.get(&entry).map(|e| e.chars().count()).unwrap_or(0);
        let masked = if typed == 0 {
            "_".to_owned()
        } else {
            "*".repeat(typed)
        };
        Line::from(vec![
            Span::raw(self.text(prompt)),
            Span::raw(" "),
            Span::styled(masked, self.focused_style(entry)),
        ])
    }

    fn button_line(&self) -> Line<'_> {
        let mut spans = Vec::new();
        for button in [Widget::Ok, Widget::Cancel].iter().copied() {
            if self.visible(button) {
                spans.push(Span::styled(
                    format!("[ {} ]", self.text(button)),
                    self.focused_style(button),
                ));
                spans.push(Span::raw("  "));
            }
        }
        Line::from(spans)
    }

    fn render(&self, frame: &mut Frame<'_>) {
        let screen = frame.area();
        let width = screen.width.min(DIALOG_WIDTH);
        let inner_width = usize::from(width.saturating_sub(2).max(1));

        let mut rows = Vec::new();
        for widget in [
            Widget::Error,
            Widget::Password,
            Widget::RepeatPassword,
            Widget::Entropy,
            Widget::Strength,
        ]
        .iter()
        .copied()
        {
            if self.visible(widget) {
                rows.push((Constraint::Length(1), widget));
            }
        }
        rows.push((Constraint::Length(1), Widget::Ok));

        // Borders plus the fixed rows; the description gets what is left.
        let fixed = rows.len().saturating_add(2);
        let room = usize::from(screen.height).saturating_sub(fixed).max(1);

        let description = self.text(Widget::Description);
        let wrapped = description
            .lines()
            .map(|l| (l.chars().count().max(1) - 1) / inner_width + 1)
            .fold(0usize, usize::saturating_add)
            .max(1);
        let description_rows = u16::try_from(wrapped.min(room)).unwrap_or(u16::MAX);
        rows.insert(0, (Constraint::Length(description_rows), Widget::Description));

        let height = u16::try_from(fixed)
            .unwrap_or(u16::MAX)
            .saturating_add(description_rows);
        let area = Rect::new(
            screen.x + screen.width.saturating_sub(width) / 2,
            screen.y + screen.height.saturating_sub(height) / 2,
            width,
            height.min(screen.height),
        );

        let block = Block::default().borders(Borders::ALL).title(TITLE);
        let inner = block.inner(area);
        frame.render_widget(Clear, area);
        frame.render_widget(block, area);

        let chunks = Layout::vertical(rows.iter().map(|(c, _)| *c)).split(inner);
        for ((_, widget), chunk) in rows.iter().zip(chunks.iter()) {
            match widget {
                Widget::Description => frame.render_widget(
                    Paragraph::new(description).wrap(Wrap { trim: false }),
                    *chunk,
                ),
                Widget::Error => frame.render_widget(
                    Paragraph::new(self.text(Widget::Error))
                        .style(Style::default().fg(Color::Red)),
                    *chunk,
                ),
                Widget::Password => frame.render_widget(
                    Paragraph::new(self.entry_line(Widget::Prompt, Widget::Password)),
                    *chunk,
                ),
                Widget::RepeatPassword => frame.render_widget(
                    Paragraph::new(self.entry_line(Widget::RepeatPrompt, Widget::RepeatPassword)),
                    *chunk,
                ),
                Widget::Entropy => {
                    frame.render_widget(Paragraph::new(self.text(Widget::Entropy)), *chunk)
                }
                Widget::Strength => frame.render_widget(
                    Gauge::default()
                        .ratio(self.strength)
                        .label("")
                        .gauge_style(Style::default().fg(Color::Green)),
                    *chunk,
                ),
                _ => frame.render_widget(Paragraph::new(self.button_line()), *chunk),
            }
        }
    }
}
