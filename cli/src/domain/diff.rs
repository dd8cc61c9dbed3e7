//! Line-level diff used by the config writer's dry run.
//!
//! Longest-common-subsequence over lines, rendered as a unified diff. Lines
//! keep their terminators, so a changed line ending or a dropped final
//! newline shows up as a changed line.

use std::fmt::Write as _;

/// Lines of context around each hunk.
pub const CONTEXT_LINES: usize = 3;

/// Above this many line pairs the LCS table is skipped and the whole file is
/// reported as replaced.
const MAX_TABLE_CELLS: usize = 4_000_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineChange<'a> {
    Equal(&'a str),
    Removed(&'a str),
    Added(&'a str),
}

/// Added/removed line counts plus the rendered text.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LineDiff {
    pub added: usize,
    pub removed: usize,
    /// Unified diff text. Empty exactly when the inputs are identical.
    pub unified: String,
}

impl LineDiff {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.added == 0 && self.removed == 0
    }
}

/// Compute the line changes turning `old` into `new`.
#[must_use]
pub fn line_changes<'a>(old: &'a str, new: &'a str) -> Vec<LineChange<'a>> {
    let a: Vec<&str> = old.split_inclusive('\n').collect();
    let b: Vec<&str> = new.split_inclusive('\n').collect();

    // Common prefix and suffix are cheap and keep the table small.
    let prefix = a.iter().zip(&b).take_while(|(x, y)| x == y).count();
    let suffix = a[prefix..]
        .iter()
        .rev()
        .zip(b[prefix..].iter().rev())
        .take_while(|(x, y)| x == y)
        .count();

    let mid_a = &a[prefix..a.len() - suffix];
    let mid_b = &b[prefix..b.len() - suffix];

    let mut out: Vec<LineChange<'a>> = a[..prefix].iter().map(|l| LineChange::Equal(l)).collect();
    out.extend(middle(mid_a, mid_b));
    out.extend(a[a.len() - suffix..].iter().map(|l| LineChange::Equal(l)));
    out
}

fn middle<'a>(a: &[&'a str], b: &[&'a str]) -> Vec<LineChange<'a>> {
    if a.is_empty() || b.is_empty() || a.len().saturating_mul(b.len()) > MAX_TABLE_CELLS {
        let mut out: Vec<LineChange<'a>> = a.iter().map(|l| LineChange::Removed(l)).collect();
        out.extend(b.iter().map(|l| LineChange::Added(l)));
        return out;
    }

    // lcs[i][j] = LCS length of a[i..] and b[j..]
    let width = b.len() + 1;
    let mut lcs = vec![0usize; (a.len() + 1) * width];
    for i in (0..a.len()).rev() {
        for j in (0..b.len()).rev() {
            lcs[i * width + j] = if a[i] == b[j] {
                lcs[(i + 1) * width + j + 1] + 1
            } else {
                lcs[(i + 1) * width + j].max(lcs[i * width + j + 1])
            };
        }
    }

    let mut out = Vec::with_capacity(a.len() + b.len());
    let (mut i, mut j) = (0, 0);
    while i < a.len() && j < b.len() {
        if a[i] == b[j] {
            out.push(LineChange::Equal(a[i]));
            i += 1;
            j += 1;
        } else if lcs[(i + 1) * width + j] >= lcs[i * width + j + 1] {
            out.push(LineChange::Removed(a[i]));
            i += 1;
        } else {
            out.push(LineChange::Added(b[j]));
            j += 1;
        }
    }
    out.extend(a[i..].iter().map(|l| LineChange::Removed(l)));
    out.extend(b[j..].iter().map(|l| LineChange::Added(l)));
    out
}

/// Diff `old` against `new` and render it with `label` in the file headers.
#[must_use]
pub fn diff(old: &str, new: &str, label: &str) -> LineDiff {
    let changes = line_changes(old, new);
    let added = changes.iter().filter(|c| matches!(c, LineChange::Added(_))).count();
    let removed = changes.iter().filter(|c| matches!(c, LineChange::Removed(_))).count();
    let unified = if added + removed == 0 {
        String::new()
    } else {
        render_unified(&changes, label, CONTEXT_LINES)
    };
    LineDiff {
        added,
        removed,
        unified,
    }
}

fn render_unified(changes: &[LineChange<'_>], label: &str, context: usize) -> String {
    let mut out = format!("--- a/{label}\n+++ b/{label}\n");

    let changed: Vec<usize> = changes
        .iter()
        .enumerate()
        .filter(|(_, c)| !matches!(c, LineChange::Equal(_)))
        .map(|(i, _)| i)
        .collect();

    // Group change indices into hunk windows, merging overlapping context.
    let mut hunks: Vec<(usize, usize)> = Vec::new();
    for &idx in &changed {
        let start = idx.saturating_sub(context);
        let end = (idx + context + 1).min(changes.len());
        match hunks.last_mut() {
            Some(last) if start <= last.1 => last.1 = end,
            _ => hunks.push((start, end)),
        }
    }

    for (start, end) in hunks {
        let (old_before, new_before) = line_numbers(&changes[..start]);
        let (old_len, new_len) = line_numbers(&changes[start..end]);
        let _ = writeln!(
            out,
            "@@ -{} +{} @@",
            range(old_before, old_len),
            range(new_before, new_len)
        );
        for change in &changes[start..end] {
            let (marker, line) = match change {
                LineChange::Equal(l) => (' ', *l),
                LineChange::Removed(l) => ('-', *l),
                LineChange::Added(l) => ('+', *l),
            };
            out.push(marker);
            out.push_str(line);
            if !line.ends_with('\n') {
                out.push_str("\n\\ No newline at end of file\n");
            }
        }
    }
    out
}

/// Count old-side and new-side lines in a run of changes.
fn line_numbers(changes: &[LineChange<'_>]) -> (usize, usize) {
    changes.iter().fold((0, 0), |(o, n), c| match c {
        LineChange::Equal(_) => (o + 1, n + 1),
        LineChange::Removed(_) => (o + 1, n),
        LineChange::Added(_) => (o, n + 1),
    })
}

fn range(before: usize, len: usize) -> String {
    if len == 0 {
        format!("{before},0")
    } else {
        format!("{},{len}", before + 1)
    }
}
