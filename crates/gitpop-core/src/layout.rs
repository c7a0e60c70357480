//! Projecting a session onto a monospace text grid.
//!
//! Each non-empty section (switches, options, actions, then the optional
//! common-commands section) gets a heading line followed by rows of
//! uniformly sized columns. Every button is recorded as a [`Region`] so a
//! host can map mouse positions and focus back to keys.

use crate::chord::{Chord, Command, BUILTIN_BINDINGS};
use crate::definition::EventClass;
use crate::session::{Event, EventState, Session};
use unicode_width::UnicodeWidthStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Style {
    Heading,
    Key,
    Description,
    /// Flag of a disabled switch or option.
    Flag,
    ActiveFlag,
    Value,
    Plain,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Span {
    pub text: String,
    pub style: Style,
}

impl Span {
    fn new(text: impl Into<String>, style: Style) -> Self {
        Self {
            text: text.into(),
            style,
        }
    }
}

/// A keyable, clickable button on the grid. `class` is `None` for
/// common-command buttons.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Region {
    pub class: Option<EventClass>,
    pub key: Chord,
    pub row: usize,
    pub col: usize,
    pub width: usize,
}

/// The button that has the cursor, tracked by class and key so it survives
/// re-rendering.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Focus {
    pub class: EventClass,
    pub key: Chord,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Frame {
    pub lines: Vec<Vec<Span>>,
    pub regions: Vec<Region>,
    /// Index into `regions`.
    pub focus: Option<usize>,
}

impl Frame {
    pub fn hit(&self, row: usize, col: usize) -> Option<&Region> {
        self.regions
            .iter()
            .find(|r| r.row == row && col >= r.col && col < r.col + r.width)
    }

    pub fn focused(&self) -> Option<Focus> {
        let region = self.regions.get(self.focus?)?;
        Some(Focus {
            class: region.class?,
            key: region.key,
        })
    }

    pub fn plain_text(&self) -> String {
        let mut out = String::new();
        for line in &self.lines {
            let text: String = line.iter().map(|s| s.text.as_str()).collect();
            out.push_str(text.trim_end());
            out.push('\n');
        }
        out
    }
}

/// An extra command shown in the common-commands section.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuxCommand {
    pub key: Chord,
    pub description: String,
}

/// The built-in commands worth listing, one chord each.
pub fn common_commands() -> Vec<AuxCommand> {
    let shown = [
        Command::SetDefaults,
        Command::SaveDefaults,
        Command::Help,
        Command::ToggleHelpSection,
        Command::PrefixArgument,
        Command::Quit,
    ];
    shown
        .iter()
        .filter_map(|cmd| {
            BUILTIN_BINDINGS
                .iter()
                .find(|(_, c)| c == cmd)
                .map(|(chord, _)| AuxCommand {
                    key: *chord,
                    description: cmd.summary().to_string(),
                })
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LayoutOptions {
    /// Width budget in cells.
    pub width: usize,
    pub min_padding: usize,
    pub switch_columns: Option<usize>,
    pub option_columns: Option<usize>,
    pub action_columns: Option<usize>,
}

impl Default for LayoutOptions {
    fn default() -> Self {
        Self {
            width: 80,
            min_padding: 2,
            switch_columns: None,
            option_columns: None,
            action_columns: None,
        }
    }
}

struct Button {
    class: Option<EventClass>,
    key: Chord,
    spans: Vec<Span>,
    width: usize,
}

impl Button {
    fn new(class: Option<EventClass>, key: Chord, spans: Vec<Span>) -> Self {
        let width = spans.iter().map(|s| s.text.width()).sum();
        Self {
            class,
            key,
            spans,
            width,
        }
    }

    fn for_event(event: &Event) -> Self {
        let mut spans = vec![
            Span::new(event.key.to_string(), Style::Key),
            Span::new(" ", Style::Plain),
            Span::new(event.description.clone(), Style::Description),
        ];
        match &event.state {
            EventState::Switch { flag, enabled } => {
                spans.push(Span::new(" (", Style::Plain));
                spans.push(Span::new(flag.clone(), flag_style(*enabled)));
                spans.push(Span::new(")", Style::Plain));
            }
            EventState::Option {
                flag,
                enabled,
                value,
                ..
            } => {
                spans.push(Span::new(" (", Style::Plain));
                spans.push(Span::new(flag.clone(), flag_style(*enabled)));
                if *enabled {
                    spans.push(Span::new(value.clone(), Style::Value));
                }
                spans.push(Span::new(")", Style::Plain));
            }
            EventState::Action { .. } => {}
        }
        Self::new(Some(event.class()), event.key, spans)
    }

    fn for_command(aux: &AuxCommand) -> Self {
        Self::new(
            None,
            aux.key,
            vec![
                Span::new(aux.key.to_string(), Style::Key),
                Span::new(" ", Style::Plain),
                Span::new(aux.description.clone(), Style::Description),
            ],
        )
    }
}

fn flag_style(enabled: bool) -> Style {
    if enabled {
        Style::ActiveFlag
    } else {
        Style::Flag
    }
}

/// Width of one column in a section: widest label plus padding.
pub fn column_width(label_widths: &[usize], min_padding: usize) -> usize {
    label_widths.iter().copied().max().unwrap_or(0) + min_padding
}

/// Buttons per row for a section.
///
/// The last button in a row carries no padding, so `k` columns need
/// `k * column_width - min_padding` cells.
pub fn columns_per_row(width: usize, column_width: usize, min_padding: usize, max_columns: Option<usize>) -> usize {
    let fit = ((width + min_padding) / column_width.max(1)).max(1);
    max_columns.map_or(fit, |max| fit.min(max.max(1)))
}

/// Lay out `session` (plus `aux`) and resolve the focused button.
pub fn render(session: &Session, aux: &[AuxCommand], focus: Option<&Focus>, opts: &LayoutOptions) -> Frame {
    let mut frame = Frame::default();

    for class in EventClass::ALL {
        let buttons: Vec<Button> = session.events(class).iter().map(Button::for_event).collect();
        let max_columns = match class {
            EventClass::Switches => opts.switch_columns,
            EventClass::Options => opts.option_columns,
            EventClass::Actions => session.max_action_columns.or(opts.action_columns),
        };
        section(&mut frame, class.heading(), buttons, max_columns, opts);
    }
    let commands: Vec<Button> = aux.iter().map(Button::for_command).collect();
    section(&mut frame, "Common Commands", commands, None, opts);

    frame.focus = focus
        .and_then(|f| {
            frame
                .regions
                .iter()
                .position(|r| r.class == Some(f.class) && r.key == f.key)
        })
        .or_else(|| {
            frame
                .regions
                .iter()
                .position(|r| r.class == Some(EventClass::Actions))
        });
    frame
}

fn section(frame: &mut Frame, heading: &str, buttons: Vec<Button>, max_columns: Option<usize>, opts: &LayoutOptions) {
    if buttons.is_empty() {
        return;
    }
    if !frame.lines.is_empty() {
        frame.lines.push(Vec::new());
    }
    frame.lines.push(vec![Span::new(heading, Style::Heading)]);

    let widths: Vec<usize> = buttons.iter().map(|b| b.width).collect();
    let col_width = column_width(&widths, opts.min_padding);
    let per_row = columns_per_row(opts.width, col_width, opts.min_padding, max_columns);

    let mut buttons = buttons.into_iter().peekable();
    while buttons.peek().is_some() {
        let row = frame.lines.len();
        let mut line = Vec::new();
        for i in 0..per_row {
            let Some(button) = buttons.next() else {
                break;
            };
            frame.regions.push(Region {
                class: button.class,
                key: button.key,
                row,
                col: i * col_width,
                width: button.width,
            });
            line.extend(button.spans);
            if i + 1 < per_row && buttons.peek().is_some() {
                line.push(Span::new(" ".repeat(col_width - button.width), Style::Plain));
            }
        }
        frame.lines.push(line);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::definition::{PopupDefinition, PopupSpec, ReaderKind};

    fn session() -> Session {
        let spec = PopupSpec::new()
            .switch('a', "All", "--all")
            .switch('f', "Force", "--force")
            .option('m', "Message", "--message=", ReaderKind::Text)
            .action('c', "Commit", &["git", "commit"])
            .action('e', "Extend", &["git", "commit", "--amend"])
            .action('w', "Reword", &["git", "commit", "--amend", "--only"]);
        Session::materialize(&PopupDefinition::from_spec("commit", spec).unwrap(), None)
    }

    #[test]
    fn sections_render_in_fixed_order_with_headings() {
        let frame = render(&session(), &[], None, &LayoutOptions::default());
        let text = frame.plain_text();
        let switches = text.find("Switches").unwrap();
        let options = text.find("Options").unwrap();
        let actions = text.find("Actions").unwrap();
        assert!(switches < options && options < actions);
        assert!(!text.contains("Common Commands"));
    }

    #[test]
    fn labels_follow_class_format() {
        let mut s = session();
        s.toggle_switch(0);
        s.enable_option(0, "wip".into());
        let frame = render(&s, &[], None, &LayoutOptions::default());
        let text = frame.plain_text();
        assert!(text.contains("a All (--all)"));
        assert!(text.contains("m Message (--message=wip)"));
        assert!(text.contains("c Commit"));
        assert!(!text.contains("c Commit ("));
    }

    #[test]
    fn disabled_flags_are_dimmed_and_enabled_highlighted() {
        let mut s = session();
        s.toggle_switch(0);
        let frame = render(&s, &[], None, &LayoutOptions::default());
        let styles: Vec<(String, Style)> = frame
            .lines
            .iter()
            .flatten()
            .filter(|span| span.text.starts_with("--"))
            .map(|span| (span.text.clone(), span.style))
            .collect();
        assert!(styles.contains(&("--all".into(), Style::ActiveFlag)));
        assert!(styles.contains(&("--force".into(), Style::Flag)));
        assert!(styles.contains(&("--message=".into(), Style::Flag)));
    }

    #[test]
    fn narrow_width_wraps_one_button_per_row() {
        let opts = LayoutOptions {
            width: 10,
            ..LayoutOptions::default()
        };
        let frame = render(&session(), &[], None, &opts);
        let action_rows: Vec<usize> = frame
            .regions
            .iter()
            .filter(|r| r.class == Some(EventClass::Actions))
            .map(|r| r.row)
            .collect();
        assert_eq!(action_rows.len(), 3);
        assert!(action_rows.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn max_action_columns_forces_wrap() {
        let mut s = session();
        s.max_action_columns = Some(2);
        let frame = render(&s, &[], None, &LayoutOptions::default());
        let rows: Vec<usize> = frame
            .regions
            .iter()
            .filter(|r| r.class == Some(EventClass::Actions))
            .map(|r| r.row)
            .collect();
        assert_eq!(rows[0], rows[1]);
        assert_ne!(rows[1], rows[2]);
    }

    #[test]
    fn focus_survives_by_class_and_key() {
        let focus = Focus {
            class: EventClass::Switches,
            key: Chord::Char('f'),
        };
        let frame = render(&session(), &[], Some(&focus), &LayoutOptions::default());
        assert_eq!(frame.focused(), Some(focus));
    }

    #[test]
    fn missing_focus_falls_back_to_first_action() {
        let gone = Focus {
            class: EventClass::Switches,
            key: Chord::Char('z'),
        };
        let frame = render(&session(), &[], Some(&gone), &LayoutOptions::default());
        assert_eq!(
            frame.focused(),
            Some(Focus {
                class: EventClass::Actions,
                key: Chord::Char('c')
            })
        );
    }

    #[test]
    fn hit_maps_positions_to_buttons() {
        let frame = render(&session(), &[], None, &LayoutOptions::default());
        let region = frame
            .regions
            .iter()
            .find(|r| r.key == Chord::Char('e'))
            .unwrap()
            .clone();
        assert_eq!(frame.hit(region.row, region.col).map(|r| r.key), Some(Chord::Char('e')));
        assert_eq!(frame.hit(region.row, region.col + region.width - 1).map(|r| r.key), Some(Chord::Char('e')));
        assert!(frame.hit(999, 0).is_none());
    }

    #[test]
    fn common_commands_section_is_injected() {
        let frame = render(&session(), &common_commands(), None, &LayoutOptions::default());
        let text = frame.plain_text();
        assert!(text.contains("Common Commands"));
        assert!(text.contains("C-c Set current arguments"));
        assert!(frame.regions.iter().any(|r| r.class.is_none() && r.key == Chord::Esc));
    }

    #[test]
    fn column_math() {
        assert_eq!(column_width(&[3, 9, 4], 2), 11);
        assert_eq!(columns_per_row(40, 11, 2, None), 3);
        assert_eq!(columns_per_row(40, 11, 2, Some(2)), 2);
        assert_eq!(columns_per_row(5, 11, 2, None), 1);
        assert_eq!(columns_per_row(40, 11, 2, Some(0)), 1);
        // Exact fit: the second 9-cell button ends on the last cell.
        assert_eq!(columns_per_row(20, 11, 2, None), 2);
        assert_eq!(columns_per_row(19, 11, 2, None), 1);
        assert_eq!(columns_per_row(31, 11, 2, None), 3);
    }

    #[test]
    fn button_ending_on_last_cell_shares_the_row() {
        let spec = PopupSpec::new().action('a', "Abcdefg", &["true"]).action('b', "Hijklmn", &["true"]);
        let s = Session::materialize(&PopupDefinition::from_spec("fit", spec).unwrap(), None);
        let opts = LayoutOptions {
            width: 20,
            min_padding: 2,
            ..LayoutOptions::default()
        };
        let frame = render(&s, &[], None, &opts);
        let regions: Vec<(usize, usize, usize)> = frame.regions.iter().map(|r| (r.row, r.col, r.width)).collect();
        assert_eq!(regions, vec![(1, 0, 9), (1, 11, 9)]);
        let width: usize = frame.lines[1].iter().map(|s| s.text.width()).sum();
        assert_eq!(width, 20);
    }
}
