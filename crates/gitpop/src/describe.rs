use anyhow::{bail, Context, Result};
use gitpop_core::help::{man_excerpt, HelpTarget};
use std::process::Command;
use tracing::{debug, warn};

const EXCERPT_LINES: usize = 40;

/// Text shown for `target`: a manual excerpt when the flag can be found in
/// the popup's man page, the generic description otherwise.
pub fn describe(target: &HelpTarget) -> String {
    if let HelpTarget::Argument {
        topic: Some(topic),
        flag,
        ..
    } = target
    {
        match man_page(topic) {
            Ok(page) => match man_excerpt(&page, flag, EXCERPT_LINES) {
                Some(excerpt) => return format!("{topic}(1)\n\n{excerpt}\n"),
                None => debug!(%topic, %flag, "flag not found in man page"),
            },
            Err(e) => warn!(%topic, error = %e, "man page unavailable"),
        }
    }
    target.generic_text()
}

fn man_page(topic: &str) -> Result<String> {
    let output = Command::new("man")
        .arg(topic)
        .env("MANPAGER", "cat")
        .env("MANWIDTH", "100")
        .env("GROFF_NO_SGR", "1")
        .output()
        .with_context(|| format!("running man {topic}"))?;
    if !output.status.success() {
        bail!("man {topic} exited with {}", output.status);
    }
    Ok(strip_overstrike(&String::from_utf8_lossy(&output.stdout)))
}

/// Drop backspace overstrikes (`x\bx` bold, `_\bx` underline).
pub fn strip_overstrike(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        if c == '\u{8}' {
            out.pop();
        } else {
            out.push(c);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use gitpop_core::chord::Command as PopupCommand;
    use gitpop_core::Chord;

    #[test]
    fn overstrike_is_removed() {
        assert_eq!(strip_overstrike("-\u{8}-a\u{8}al\u{8}ll\u{8}l"), "-all");
        assert_eq!(strip_overstrike("_\u{8}f_\u{8}i_\u{8}l_\u{8}e"), "file");
        assert_eq!(strip_overstrike("plain"), "plain");
    }

    #[test]
    fn argument_without_topic_gets_generic_text() {
        let target = HelpTarget::Argument {
            key: Chord::Char('a'),
            topic: None,
            flag: "--all".into(),
            description: "Stage all".into(),
        };
        assert_eq!(describe(&target), "a Stage all (--all)\n");
    }

    #[test]
    fn builtin_command_gets_summary() {
        let text = describe(&HelpTarget::Command(Chord::Ctrl('s'), PopupCommand::SaveDefaults));
        assert!(text.starts_with("C-s runs save-defaults"));
    }
}
