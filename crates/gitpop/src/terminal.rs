//! Crossterm surface for the popup: alternate screen, styled frames, key
//! and mouse input, and the echo-area prompt used by option readers.

use anyhow::{Context, Result};
use crossterm::cursor::{Hide, MoveTo, Show};
use crossterm::event::{
    self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers,
    MouseButton, MouseEventKind,
};
use crossterm::style::{Attribute, Color, Print, ResetColor, SetAttribute, SetForegroundColor};
use crossterm::terminal::{self, disable_raw_mode, enable_raw_mode, Clear, ClearType, EnterAlternateScreen, LeaveAlternateScreen};
use crossterm::{execute, queue};
use gitpop_core::layout::{Frame, Region, Style};
use gitpop_core::chord::MAX_FUNCTION_KEY;
use gitpop_core::Chord;
use std::io::{self, Stdout, Write};
use tracing::debug;
use unicode_width::UnicodeWidthStr;

/// One unit of user input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Input {
    Chord(Chord),
    /// A key press no chord can name. Reported, never run.
    Unbound(KeyEvent),
    Click { row: usize, col: usize },
    Resize,
    Ignored,
}

/// How a prompt ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Prompted {
    Value(String),
    /// `C-g`: abandon the read.
    Cancelled,
    /// A quit chord that should reach the popup.
    Interrupted(Chord),
}

pub struct Terminal {
    out: Stdout,
    /// Row of the echo area, just below the last drawn frame.
    echo_row: u16,
    restored: bool,
}

impl Terminal {
    pub fn enter() -> Result<Self> {
        enable_raw_mode().context("enabling raw mode")?;
        let mut out = io::stdout();
        execute!(out, EnterAlternateScreen, EnableMouseCapture, Hide).context("entering alternate screen")?;
        debug!("terminal acquired");
        Ok(Self {
            out,
            echo_row: 0,
            restored: false,
        })
    }

    /// Give the screen back exactly as it was before [`Terminal::enter`].
    pub fn restore(&mut self) -> Result<()> {
        if self.restored {
            return Ok(());
        }
        self.restored = true;
        disable_raw_mode().context("disabling raw mode")?;
        execute!(self.out, LeaveAlternateScreen, DisableMouseCapture, Show).context("leaving alternate screen")?;
        debug!("terminal restored");
        Ok(())
    }

    pub fn width(&self) -> Result<usize> {
        let (cols, _) = terminal::size().context("querying terminal size")?;
        Ok(cols as usize)
    }

    pub fn draw(&mut self, frame: &Frame, message: Option<&str>) -> Result<()> {
        let (_, rows) = terminal::size().context("querying terminal size")?;
        let focus = frame.focus.and_then(|idx| frame.regions.get(idx));
        queue!(self.out, Clear(ClearType::All))?;

        for (row, line) in frame.lines.iter().enumerate().take(rows.saturating_sub(1) as usize) {
            queue!(self.out, MoveTo(0, row as u16))?;
            let mut col = 0;
            for span in line {
                let focused = focus.is_some_and(|r| covers(r, row, col));
                paint(&mut self.out, &span.text, span.style, focused)?;
                col += span.text.width();
            }
        }

        self.echo_row = (frame.lines.len() as u16 + 1).min(rows.saturating_sub(1));
        if let Some(message) = message {
            queue!(self.out, MoveTo(0, self.echo_row), Print(message))?;
        }
        self.out.flush().context("flushing terminal")
    }

    pub fn next_input(&mut self) -> Result<Input> {
        let input = match event::read().context("reading terminal event")? {
            Event::Key(key) if key.kind == KeyEventKind::Press => key_input(key),
            Event::Mouse(mouse) if mouse.kind == MouseEventKind::Down(MouseButton::Left) => Input::Click {
                row: mouse.row as usize,
                col: mouse.column as usize,
            },
            Event::Resize(_, _) => Input::Resize,
            _ => Input::Ignored,
        };
        Ok(input)
    }

    /// Read a line in the echo area, starting from `initial`.
    pub fn read_line(&mut self, prompt: &str, initial: Option<&str>) -> Result<Prompted> {
        let mut buffer = initial.unwrap_or_default().to_string();
        execute!(self.out, Show)?;
        let result = loop {
            queue!(
                self.out,
                MoveTo(0, self.echo_row),
                Clear(ClearType::CurrentLine),
                Print(prompt),
                Print(&buffer)
            )?;
            self.out.flush()?;

            let Event::Key(key) = event::read().context("reading terminal event")? else {
                continue;
            };
            if key.kind != KeyEventKind::Press {
                continue;
            }
            match (key.code, key.modifiers.contains(KeyModifiers::CONTROL)) {
                (KeyCode::Enter, _) => break Prompted::Value(buffer),
                (KeyCode::Esc, _) => break Prompted::Interrupted(Chord::Esc),
                (KeyCode::Char('g'), true) => break Prompted::Cancelled,
                (KeyCode::Char('u'), true) => buffer.clear(),
                (KeyCode::Backspace, _) => {
                    buffer.pop();
                }
                (KeyCode::Char(c), false) => buffer.push(c),
                _ => {}
            }
        };
        execute!(self.out, Hide)?;
        Ok(result)
    }

    /// Show `text` full-screen until a key is pressed.
    pub fn show_text(&mut self, text: &str) -> Result<()> {
        let (_, rows) = terminal::size().context("querying terminal size")?;
        queue!(self.out, Clear(ClearType::All))?;
        for (row, line) in text.lines().enumerate().take(rows.saturating_sub(2) as usize) {
            queue!(self.out, MoveTo(0, row as u16), Print(line))?;
        }
        queue!(
            self.out,
            MoveTo(0, rows.saturating_sub(1)),
            SetAttribute(Attribute::Dim),
            Print("Press any key to return"),
            SetAttribute(Attribute::Reset)
        )?;
        self.out.flush()?;
        loop {
            if let Event::Key(key) = event::read().context("reading terminal event")? {
                if key.kind == KeyEventKind::Press {
                    return Ok(());
                }
            }
        }
    }

    pub fn bell(&mut self) -> Result<()> {
        execute!(self.out, Print('\u{7}')).context("ringing bell")
    }
}

impl Drop for Terminal {
    fn drop(&mut self) {
        self.restore().ok();
    }
}

fn covers(region: &Region, row: usize, col: usize) -> bool {
    region.row == row && col >= region.col && col < region.col + region.width
}

fn paint(out: &mut Stdout, text: &str, style: Style, focused: bool) -> Result<()> {
    match style {
        Style::Heading => queue!(out, SetForegroundColor(Color::Blue), SetAttribute(Attribute::Bold))?,
        Style::Key => queue!(out, SetForegroundColor(Color::Magenta), SetAttribute(Attribute::Bold))?,
        Style::Flag => queue!(out, SetForegroundColor(Color::DarkGrey))?,
        Style::ActiveFlag => queue!(out, SetForegroundColor(Color::Cyan), SetAttribute(Attribute::Bold))?,
        Style::Value => queue!(out, SetForegroundColor(Color::Cyan))?,
        Style::Description | Style::Plain => {}
    }
    if focused {
        queue!(out, SetAttribute(Attribute::Reverse))?;
    }
    queue!(out, Print(text), SetAttribute(Attribute::Reset), ResetColor)?;
    Ok(())
}

/// Modifiers folded into [`Chord::Meta`].
const META_MODIFIERS: KeyModifiers = KeyModifiers::ALT
    .union(KeyModifiers::META)
    .union(KeyModifiers::SUPER)
    .union(KeyModifiers::HYPER);

/// Classify a key press. Presses without a chord still surface so the
/// popup can report them.
pub fn key_input(key: KeyEvent) -> Input {
    key_to_chord(key).map_or(Input::Unbound(key), Input::Chord)
}

/// Translate a key press into a popup chord.
pub fn key_to_chord(key: KeyEvent) -> Option<Chord> {
    let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
    let meta = key.modifiers.intersects(META_MODIFIERS);
    let chord = match key.code {
        KeyCode::Char(_) if ctrl && meta => return None,
        KeyCode::Char(c) if meta => Chord::Meta(c),
        KeyCode::Char(c) if ctrl => Chord::Ctrl(c.to_ascii_lowercase()),
        KeyCode::Char(c) => Chord::Char(c),
        _ if ctrl || meta => return None,
        KeyCode::Esc => Chord::Esc,
        KeyCode::Enter => Chord::Enter,
        KeyCode::Tab => Chord::Tab,
        KeyCode::BackTab => Chord::BackTab,
        KeyCode::Up => Chord::Up,
        KeyCode::Down => Chord::Down,
        KeyCode::Left => Chord::Left,
        KeyCode::Right => Chord::Right,
        KeyCode::Backspace => Chord::Backspace,
        KeyCode::Delete => Chord::Delete,
        KeyCode::Insert => Chord::Insert,
        KeyCode::Home => Chord::Home,
        KeyCode::End => Chord::End,
        KeyCode::PageUp => Chord::PageUp,
        KeyCode::PageDown => Chord::PageDown,
        KeyCode::F(n) if (1..=MAX_FUNCTION_KEY).contains(&n) => Chord::F(n),
        _ => return None,
    };
    Some(chord)
}

/// Human-readable name for a key press, modifiers first.
pub fn key_name(key: &KeyEvent) -> String {
    let mut name = String::new();
    if key.modifiers.contains(KeyModifiers::CONTROL) {
        name.push_str("C-");
    }
    if key.modifiers.intersects(KeyModifiers::ALT | KeyModifiers::META) {
        name.push_str("M-");
    }
    if key.modifiers.contains(KeyModifiers::SUPER) {
        name.push_str("s-");
    }
    if key.modifiers.contains(KeyModifiers::HYPER) {
        name.push_str("H-");
    }
    match key.code {
        KeyCode::Char(c) => name.push(c),
        KeyCode::F(n) => name.push_str(&format!("<f{n}>")),
        code => name.push_str(&format!("<{code:?}>").to_lowercase()),
    }
    name
}
