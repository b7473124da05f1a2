//! Text diff rendering using the Myers algorithm from `similar`.

use std::fmt::Write as _;
use std::str::FromStr;

use serde::Deserialize;
use similar::{Algorithm, ChangeTag, TextDiff};

/// Marker opening an inserted span in [`DiffStyle::Inline`] output.
pub const INLINE_INSERT_OPEN: &str = "{+";
/// Marker closing an inserted span in [`DiffStyle::Inline`] output.
pub const INLINE_INSERT_CLOSE: &str = "+}";
/// Marker opening a deleted span in [`DiffStyle::Inline`] output.
pub const INLINE_DELETE_OPEN: &str = "[-";
/// Marker closing a deleted span in [`DiffStyle::Inline`] output.
pub const INLINE_DELETE_CLOSE: &str = "-]";

const NO_NEWLINE_MARKER: &str = "\\ No newline at end of file";

/// How insertions and deletions are marked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DiffStyle {
    /// Line-oriented: `+`/`-`/` ` prefixes under `@@` hunk headers.
    #[default]
    Lines,
    /// Character-level: `{+inserted+}` and `[-deleted-]` spans in running text.
    Inline,
}

impl FromStr for DiffStyle {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "lines" => Ok(DiffStyle::Lines),
            "inline" => Ok(DiffStyle::Inline),
            other => Err(format!("unknown diff style '{other}' (expected 'lines' or 'inline')")),
        }
    }
}

/// Rendering options shared by every file in a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DiffOptions {
    pub style: DiffStyle,
    /// Lines of context around each hunk. `None` renders the whole file as
    /// a single hunk. Ignored by [`DiffStyle::Inline`].
    pub context_lines: Option<usize>,
}

/// Render the edit script turning `old` into `new`.
///
/// Empty strings stand in for absent content. Output is a pure function of
/// the inputs and options.
pub fn render_text(old: &str, new: &str, options: &DiffOptions) -> String {
    match (options.style, options.context_lines) {
        (DiffStyle::Lines, None) => render_whole_file(old, new),
        (DiffStyle::Lines, Some(radius)) => render_hunks(old, new, radius),
        (DiffStyle::Inline, _) => render_inline(old, new),
    }
}

fn render_whole_file(old: &str, new: &str) -> String {
    let diff = TextDiff::configure()
        .algorithm(Algorithm::Myers)
        .diff_lines(old, new);

    let old_len = diff.old_slices().len();
    let new_len = diff.new_slices().len();

    let mut out = String::new();
    if old_len == 0 && new_len == 0 {
        return out;
    }

    let _ = writeln!(
        out,
        "@@ -{} +{} @@",
        hunk_range(0, old_len),
        hunk_range(0, new_len)
    );
    for change in diff.iter_all_changes() {
        push_line(&mut out, change.tag(), change.value());
    }
    out
}

fn render_hunks(old: &str, new: &str, radius: usize) -> String {
    let diff = TextDiff::configure()
        .algorithm(Algorithm::Myers)
        .diff_lines(old, new);

    let mut unified = diff.unified_diff();
    unified.context_radius(radius);

    let mut out = String::new();
    for hunk in unified.iter_hunks() {
        let _ = writeln!(out, "{}", hunk.header());
        for change in hunk.iter_changes() {
            push_line(&mut out, change.tag(), change.value());
        }
    }
    out
}

fn render_inline(old: &str, new: &str) -> String {
    let diff = TextDiff::configure()
        .algorithm(Algorithm::Myers)
        .diff_chars(old, new);

    let mut out = String::new();
    let mut open: Option<ChangeTag> = None;
    for change in diff.iter_all_changes() {
        let tag = change.tag();
        if open != Some(tag) {
            close_span(&mut out, open);
            match tag {
                ChangeTag::Insert => out.push_str(INLINE_INSERT_OPEN),
                ChangeTag::Delete => out.push_str(INLINE_DELETE_OPEN),
                ChangeTag::Equal => {}
            }
            open = Some(tag);
        }
        out.push_str(change.value());
    }
    close_span(&mut out, open);
    out
}

fn close_span(out: &mut String, tag: Option<ChangeTag>) {
    match tag {
        Some(ChangeTag::Insert) => out.push_str(INLINE_INSERT_CLOSE),
        Some(ChangeTag::Delete) => out.push_str(INLINE_DELETE_CLOSE),
        Some(ChangeTag::Equal) | None => {}
    }
}

fn push_line(out: &mut String, tag: ChangeTag, value: &str) {
    out.push(match tag {
        ChangeTag::Equal => ' ',
        ChangeTag::Delete => '-',
        ChangeTag::Insert => '+',
    });
    out.push_str(value);
    if !value.ends_with('\n') {
        out.push('\n');
        out.push_str(NO_NEWLINE_MARKER);
        out.push('\n');
    }
}

/// Unified-diff range for a hunk starting at zero-based line `start`.
fn hunk_range(start: usize, len: usize) -> String {
    match len {
        0 => format!("{start},0"),
        1 => format!("{}", start + 1),
        _ => format!("{},{}", start + 1, len),
    }
}
