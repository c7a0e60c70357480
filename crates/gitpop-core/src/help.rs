use crate::chord::{Chord, Command};
use crate::definition::ActionHandler;
use crate::session::{Event, EventState, Session};

/// What a help request resolved to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HelpTarget {
    /// A switch or option; `topic` is the popup's manual page, if any.
    Argument {
        key: Chord,
        topic: Option<String>,
        flag: String,
        description: String,
    },
    Action {
        key: Chord,
        description: String,
        handler: ActionHandler,
    },
    Command(Chord, Command),
}

impl HelpTarget {
    pub fn for_event(session: &Session, event: &Event) -> Self {
        match &event.state {
            EventState::Switch { flag, .. } | EventState::Option { flag, .. } => HelpTarget::Argument {
                key: event.key,
                topic: session.man_page.clone(),
                flag: flag.clone(),
                description: event.description.clone(),
            },
            EventState::Action { handler } => HelpTarget::Action {
                key: event.key,
                description: event.description.clone(),
                handler: handler.clone(),
            },
        }
    }

    /// Description used when no manual excerpt is available.
    pub fn generic_text(&self) -> String {
        match self {
            HelpTarget::Argument {
                key,
                flag,
                description,
                topic,
            } => {
                let mut text = format!("{key} {description} ({flag})\n");
                if let Some(topic) = topic {
                    text.push_str(&format!("\n{flag} was not found in {topic}(1).\n"));
                }
                text
            }
            HelpTarget::Action {
                key,
                description,
                handler,
            } => format!("{key} {description}\n\nThis action {handler}, passing the active arguments.\n"),
            HelpTarget::Command(key, command) => {
                format!("{key} runs {}\n\n{}\n", command.name(), command.summary())
            }
        }
    }
}

/// Find the paragraph describing `flag` in plain-text manual output.
///
/// A trailing `=` on the flag is ignored. The excerpt runs from the option's
/// header line to the next line indented no deeper than that header, capped
/// at `max_lines`.
pub fn man_excerpt(page: &str, flag: &str, max_lines: usize) -> Option<String> {
    let needle = flag.trim_end_matches('=');
    if needle.is_empty() {
        return None;
    }
    let lines: Vec<&str> = page.lines().collect();
    let start = lines.iter().position(|line| is_header_for(line, needle))?;
    let indent = indentation(lines[start]);

    let mut excerpt = vec![lines[start].trim_end()];
    for line in lines[start + 1..].iter() {
        if excerpt.len() >= max_lines {
            break;
        }
        if !line.trim().is_empty() && indentation(line) <= indent {
            break;
        }
        excerpt.push(line.trim_end());
    }
    while excerpt.last().is_some_and(|l| l.trim().is_empty()) {
        excerpt.pop();
    }
    Some(excerpt.join("\n"))
}

fn indentation(line: &str) -> usize {
    line.len() - line.trim_start().len()
}

fn is_header_for(line: &str, needle: &str) -> bool {
    let trimmed = line.trim_start();
    if !trimmed.starts_with('-') {
        return false;
    }
    trimmed.split(", ").any(|item| match item.strip_prefix(needle) {
        Some(rest) => rest.is_empty() || rest.starts_with(['=', '[', ' ', '<']),
        None => false,
    })
}
