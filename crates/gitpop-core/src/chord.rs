use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A single key press as seen by a popup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Chord {
    Char(char),
    Ctrl(char),
    /// Alt, Super, Hyper or Meta held with a character. Never bound by builtins.
    Meta(char),
    Esc,
    Enter,
    Tab,
    BackTab,
    Up,
    Down,
    Left,
    Right,
    Backspace,
    Delete,
    Insert,
    Home,
    End,
    PageUp,
    PageDown,
    F(u8),
}

/// The character that quits a popup unless one of its actions claims it.
pub const QUIT_CHAR: char = 'q';

/// Highest function key a chord can name.
pub const MAX_FUNCTION_KEY: u8 = 24;

/// Commands every popup understands, independent of its definition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Command {
    Quit,
    Help,
    SetDefaults,
    SaveDefaults,
    ToggleHelpSection,
    PrefixArgument,
    FocusNext,
    FocusPrev,
    Activate,
}

impl Command {
    pub fn name(self) -> &'static str {
        match self {
            Command::Quit => "quit",
            Command::Help => "help",
            Command::SetDefaults => "set-defaults",
            Command::SaveDefaults => "save-defaults",
            Command::ToggleHelpSection => "toggle-help-section",
            Command::PrefixArgument => "prefix-argument",
            Command::FocusNext => "focus-next",
            Command::FocusPrev => "focus-previous",
            Command::Activate => "activate",
        }
    }

    pub fn summary(self) -> &'static str {
        match self {
            Command::Quit => "Close the popup without running an action",
            Command::Help => "Describe the next key",
            Command::SetDefaults => "Set current arguments as defaults for this session",
            Command::SaveDefaults => "Save current arguments as defaults",
            Command::ToggleHelpSection => "Show or hide this section",
            Command::PrefixArgument => "Prefix argument; keeps the popup open after set/save",
            Command::FocusNext => "Move to the next button",
            Command::FocusPrev => "Move to the previous button",
            Command::Activate => "Press the focused button",
        }
    }
}

/// Chords bound in every popup. Definitions may not use any of them.
pub const BUILTIN_BINDINGS: &[(Chord, Command)] = &[
    (Chord::Esc, Command::Quit),
    (Chord::Ctrl('g'), Command::Quit),
    (Chord::Char('?'), Command::Help),
    (Chord::Ctrl('c'), Command::SetDefaults),
    (Chord::Ctrl('s'), Command::SaveDefaults),
    (Chord::Ctrl('t'), Command::ToggleHelpSection),
    (Chord::Ctrl('u'), Command::PrefixArgument),
    (Chord::Tab, Command::FocusNext),
    (Chord::Down, Command::FocusNext),
    (Chord::Right, Command::FocusNext),
    (Chord::BackTab, Command::FocusPrev),
    (Chord::Up, Command::FocusPrev),
    (Chord::Left, Command::FocusPrev),
    (Chord::Enter, Command::Activate),
];

pub fn is_reserved(chord: &Chord) -> bool {
    BUILTIN_BINDINGS.iter().any(|(c, _)| c == chord)
}

impl fmt::Display for Chord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Chord::Char(c) => write!(f, "{c}"),
            Chord::Ctrl(c) => write!(f, "C-{c}"),
            Chord::Meta(c) => write!(f, "M-{c}"),
            Chord::Esc => f.write_str("<esc>"),
            Chord::Enter => f.write_str("<ret>"),
            Chord::Tab => f.write_str("<tab>"),
            Chord::BackTab => f.write_str("<backtab>"),
            Chord::Up => f.write_str("<up>"),
            Chord::Down => f.write_str("<down>"),
            Chord::Left => f.write_str("<left>"),
            Chord::Right => f.write_str("<right>"),
            Chord::Backspace => f.write_str("<backspace>"),
            Chord::Delete => f.write_str("<delete>"),
            Chord::Insert => f.write_str("<insert>"),
            Chord::Home => f.write_str("<home>"),
            Chord::End => f.write_str("<end>"),
            Chord::PageUp => f.write_str("<pgup>"),
            Chord::PageDown => f.write_str("<pgdown>"),
            Chord::F(n) => write!(f, "<f{n}>"),
        }
    }
}

impl FromStr for Chord {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let named = match s {
            "<esc>" => Some(Chord::Esc),
            "<ret>" => Some(Chord::Enter),
            "<tab>" => Some(Chord::Tab),
            "<backtab>" => Some(Chord::BackTab),
            "<up>" => Some(Chord::Up),
            "<down>" => Some(Chord::Down),
            "<left>" => Some(Chord::Left),
            "<right>" => Some(Chord::Right),
            "<backspace>" => Some(Chord::Backspace),
            "<delete>" => Some(Chord::Delete),
            "<insert>" => Some(Chord::Insert),
            "<home>" => Some(Chord::Home),
            "<end>" => Some(Chord::End),
            "<pgup>" => Some(Chord::PageUp),
            "<pgdown>" => Some(Chord::PageDown),
            _ => s
                .strip_prefix("<f")
                .and_then(|rest| rest.strip_suffix('>'))
                .and_then(|n| n.parse::<u8>().ok())
                .filter(|n| (1..=MAX_FUNCTION_KEY).contains(n))
                .map(Chord::F),
        };
        if let Some(chord) = named {
            return Ok(chord);
        }

        let single = |rest: &str| {
            let mut chars = rest.chars();
            match (chars.next(), chars.next()) {
                (Some(c), None) if !c.is_control() => Some(c),
                _ => None,
            }
        };
        if let Some(rest) = s.strip_prefix("C-") {
            return single(rest)
                .map(|c| Chord::Ctrl(c.to_ascii_lowercase()))
                .ok_or_else(|| format!("invalid chord '{s}'"));
        }
        if let Some(rest) = s.strip_prefix("M-") {
            return single(rest)
                .map(Chord::Meta)
                .ok_or_else(|| format!("invalid chord '{s}'"));
        }
        single(s)
            .filter(|c| *c != ' ')
            .map(Chord::Char)
            .ok_or_else(|| format!("invalid chord '{s}'"))
    }
}

impl TryFrom<String> for Chord {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Chord> for String {
    fn from(chord: Chord) -> Self {
        chord.to_string()
    }
}
