use crate::definition::{PopupSpec, ReaderKind};
use crate::error::PopupError;
use crate::policy::UsePrefix;
use crate::registry::Registry;

pub const BUILTIN_NAMES: &[&str] = &[
    "dispatch", "commit", "log", "diff", "fetch", "pull", "push", "stash", "merge", "rebase", "reset", "tag",
];

/// Return the built-in popup called `name`.
pub fn builtin_popup(name: &str) -> Option<PopupSpec> {
    match name {
        "dispatch" => Some(dispatch()),
        "commit" => Some(commit()),
        "log" => Some(log()),
        "diff" => Some(diff()),
        "fetch" => Some(fetch()),
        "pull" => Some(pull()),
        "push" => Some(push()),
        "stash" => Some(stash()),
        "merge" => Some(merge()),
        "rebase" => Some(rebase()),
        "reset" => Some(reset()),
        "tag" => Some(tag()),
        _ => None,
    }
}

/// Registry holding every built-in popup.
pub fn builtin_registry() -> Result<Registry, PopupError> {
    let mut registry = Registry::new();
    for name in BUILTIN_NAMES {
        if let Some(spec) = builtin_popup(name) {
            registry.define(name, spec)?;
        }
    }
    Ok(registry)
}

fn dispatch() -> PopupSpec {
    let mut spec = PopupSpec::new()
        .popup_action('c', "Commit", "commit")
        .popup_action('l', "Log", "log")
        .popup_action('d', "Diff", "diff")
        .popup_action('f', "Fetch", "fetch")
        .popup_action('F', "Pull", "pull")
        .popup_action('P', "Push", "push")
        .popup_action('z', "Stash", "stash")
        .popup_action('m', "Merge", "merge")
        .popup_action('r', "Rebase", "rebase")
        .popup_action('X', "Reset", "reset")
        .popup_action('t', "Tag", "tag")
        .max_action_columns(3);
    spec.use_prefix = Some(UsePrefix::None);
    spec
}

fn commit() -> PopupSpec {
    PopupSpec::new()
        .man_page("git-commit")
        .switch('a', "Stage all modified and deleted files", "--all")
        .switch('e', "Allow empty commit", "--allow-empty")
        .switch('v', "Show diff of changes to be committed", "--verbose")
        .switch('n', "Disable hooks", "--no-verify")
        .switch('R', "Claim authorship and reset author date", "--reset-author")
        .switch('s', "Add Signed-off-by line", "--signoff")
        .option('A', "Override the author", "--author=", ReaderKind::Text)
        .option('S', "Sign using gpg", "--gpg-sign=", ReaderKind::Text)
        .option('C', "Reuse commit message", "--reuse-message=", ReaderKind::Text)
        .action('c', "Commit", &["git", "commit"])
        .action('x', "Extend", &["git", "commit", "--amend", "--no-edit"])
        .action('w', "Reword", &["git", "commit", "--amend", "--only"])
        .action('m', "Amend", &["git", "commit", "--amend"])
        .default_action(&["git", "commit"])
}

fn log() -> PopupSpec {
    PopupSpec::new()
        .man_page("git-log")
        .switch_on('g', "Show graph", "--graph")
        .switch('c', "Show graph in color", "--color")
        .switch_on('d', "Show refnames", "--decorate")
        .switch('M', "Omit merges", "--no-merges")
        .switch('f', "Follow only first parent", "--first-parent")
        .switch('o', "One line per commit", "--oneline")
        .option('n', "Limit number of commits", "-n", ReaderKind::Number)
        .option('a', "Limit to author", "--author=", ReaderKind::Text)
        .option('s', "Limit to commits since", "--since=", ReaderKind::Text)
        .option('u', "Limit to commits until", "--until=", ReaderKind::Text)
        .option('G', "Search changes", "-G", ReaderKind::Text)
        .option('S', "Search occurrences", "-S", ReaderKind::Text)
        .option('F', "Search messages", "--grep=", ReaderKind::Text)
        .action('l', "Log current", &["git", "log"])
        .action('h', "Log HEAD", &["git", "log", "HEAD"])
        .action('b', "Log all branches", &["git", "log", "--branches"])
        .action('A', "Log all references", &["git", "log", "--all"])
        .default_action(&["git", "log"])
}

fn diff() -> PopupSpec {
    PopupSpec::new()
        .man_page("git-diff")
        .switch('w', "Ignore whitespace", "--ignore-all-space")
        .switch('b', "Ignore changes in amount of whitespace", "--ignore-space-change")
        .switch('s', "Show stats", "--stat")
        .switch('m', "Detect renames", "--find-renames")
        .option('U', "Context lines", "-U", ReaderKind::Number)
        .option(
            'A',
            "Diff algorithm",
            "--diff-algorithm=",
            ReaderKind::Choice(vec![
                "default".into(),
                "minimal".into(),
                "patience".into(),
                "histogram".into(),
            ]),
        )
        .action('d', "Diff unstaged", &["git", "diff"])
        .action('i', "Diff index", &["git", "diff", "--cached"])
        .action('h', "Diff HEAD", &["git", "diff", "HEAD"])
        .default_action(&["git", "diff"])
}

fn fetch() -> PopupSpec {
    PopupSpec::new()
        .man_page("git-fetch")
        .switch('p', "Prune deleted branches", "--prune")
        .switch('t', "Fetch all tags", "--tags")
        .switch('v', "Verbose", "--verbose")
        .action('f', "Fetch from upstream", &["git", "fetch"])
        .action('a', "Fetch all remotes", &["git", "fetch", "--all"])
        .default_action(&["git", "fetch"])
}

fn pull() -> PopupSpec {
    PopupSpec::new()
        .man_page("git-pull")
        .switch('r', "Rebase local commits", "--rebase")
        .switch('f', "Fast-forward only", "--ff-only")
        .switch('a', "Autostash", "--autostash")
        .action('p', "Pull from upstream", &["git", "pull"])
        .action('o', "Pull from origin", &["git", "pull", "origin"])
        .default_action(&["git", "pull"])
}

fn push() -> PopupSpec {
    PopupSpec::new()
        .man_page("git-push")
        .switch('f', "Force with lease", "--force-with-lease")
        .switch('F', "Force", "--force")
        .switch('h', "Disable hooks", "--no-verify")
        .switch('n', "Dry run", "--dry-run")
        .switch('u', "Set upstream", "--set-upstream")
        .option('o', "Push option", "--push-option=", ReaderKind::Text)
        .action('p', "Push to upstream", &["git", "push"])
        .action('a', "Push all branches", &["git", "push", "--all"])
        .action('t', "Push tags", &["git", "push", "--tags"])
        .default_action(&["git", "push"])
}

fn stash() -> PopupSpec {
    PopupSpec::new()
        .man_page("git-stash")
        .switch('u', "Also save untracked files", "--include-untracked")
        .switch('a', "Also save untracked and ignored files", "--all")
        .switch('k', "Keep index", "--keep-index")
        .option('m', "Message", "--message=", ReaderKind::Text)
        .action('z', "Save", &["git", "stash", "push"])
        .action('p', "Pop", &["git", "stash", "pop"])
        .action('A', "Apply", &["git", "stash", "apply"])
        .action('l', "List", &["git", "stash", "list"])
        .action('s', "Show", &["git", "stash", "show", "-p"])
        .action('x', "Drop", &["git", "stash", "drop"])
        .default_action(&["git", "stash", "push"])
}

fn merge() -> PopupSpec {
    PopupSpec::new()
        .man_page("git-merge")
        .switch('f', "Fast-forward only", "--ff-only")
        .switch('n', "No fast-forward", "--no-ff")
        .switch('s', "Squash", "--squash")
        .switch('c', "Don't commit", "--no-commit")
        .option(
            'S',
            "Strategy",
            "--strategy=",
            ReaderKind::Choice(vec![
                "ort".into(),
                "recursive".into(),
                "resolve".into(),
                "octopus".into(),
                "ours".into(),
                "subtree".into(),
            ]),
        )
        .option('X', "Strategy option", "--strategy-option=", ReaderKind::Text)
        .action('m', "Merge upstream", &["git", "merge"])
        .action('a', "Abort merge", &["git", "merge", "--abort"])
        .action('C', "Continue merge", &["git", "merge", "--continue"])
}

fn rebase() -> PopupSpec {
    PopupSpec::new()
        .man_page("git-rebase")
        .switch('i', "Interactive", "--interactive")
        .switch('a', "Autosquash", "--autosquash")
        .switch('A', "Autostash", "--autostash")
        .switch('r', "Rebase merges", "--rebase-merges")
        .switch('k', "Keep base", "--keep-base")
        .switch('u', "Update refs", "--update-refs")
        .action('e', "Rebase onto upstream", &["git", "rebase"])
        .action('c', "Continue", &["git", "rebase", "--continue"])
        .action('s', "Skip", &["git", "rebase", "--skip"])
        .action('x', "Abort", &["git", "rebase", "--abort"])
}

fn reset() -> PopupSpec {
    let mut spec = PopupSpec::new()
        .man_page("git-reset")
        .action('m', "Mixed (HEAD and index)", &["git", "reset", "--mixed"])
        .action('s', "Soft (HEAD only)", &["git", "reset", "--soft"])
        .action('h', "Hard (HEAD, index and files)", &["git", "reset", "--hard"])
        .action('k', "Keep (HEAD and index, keeping uncommitted)", &["git", "reset", "--keep"]);
    spec.use_prefix = Some(UsePrefix::None);
    spec
}

fn tag() -> PopupSpec {
    PopupSpec::new()
        .man_page("git-tag")
        .switch('a', "Annotate", "--annotate")
        .switch('s', "Sign", "--sign")
        .switch('f', "Force", "--force")
        .option('m', "Message", "--message=", ReaderKind::Text)
        .action('t', "Create", &["git", "tag"])
        .action('l', "List", &["git", "tag", "--list"])
}
