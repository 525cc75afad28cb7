use serde::Serialize;

/// How far ahead the walk looks for a resync point, in each direction
pub const LOOKAHEAD_WINDOW: usize = 50;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EditOp {
    Insert,
    Delete,
    Replace,
}

/// One line-range edit, addressed against the original lines.
///
/// - `Insert`: `payload` goes before original line `at_line`
///   (`len + 1` appends).
/// - `Delete`: removes `payload.len()` lines starting at `at_line`;
///   `payload` holds the removed text.
/// - `Replace`: original line `at_line` becomes the single payload line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Edit {
    pub op: EditOp,
    pub at_line: usize,
    pub payload: Vec<String>,
}

impl Edit {
    pub fn insert(at_line: usize, payload: Vec<String>) -> Self {
        Edit {
            op: EditOp::Insert,
            at_line,
            payload,
        }
    }

    pub fn delete(at_line: usize, payload: Vec<String>) -> Self {
        Edit {
            op: EditOp::Delete,
            at_line,
            payload,
        }
    }

    pub fn replace(at_line: usize, line: String) -> Self {
        Edit {
            op: EditOp::Replace,
            at_line,
            payload: vec![line],
        }
    }
}

/// Compute an edit script turning `original` into `modified`.
///
/// Greedy two-pointer walk. On a mismatch it looks up to
/// `LOOKAHEAD_WINDOW` lines ahead on both sides for the other side's
/// current line and skips to whichever resync point is closer (insert on a
/// tie). With no resync point it replaces one line. The script is always
/// correct but is not guaranteed to be minimal.
///
/// Edits come out in ascending `at_line` order; apply them back to front
/// (see `apply_edits`).
pub fn diff_lines(original: &[String], modified: &[String]) -> Vec<Edit> {
    let mut edits = Vec::new();
    let (mut i, mut j) = (0, 0);

    while i < original.len() && j < modified.len() {
        if original[i] == modified[j] {
            i += 1;
            j += 1;
            continue;
        }

        // original[i] shows up again in modified: lines before it are new
        let insert_skip = resync_distance(&original[i], &modified[j..]);
        // modified[j] shows up again in original: lines before it are gone
        let delete_skip = resync_distance(&modified[j], &original[i..]);

        match (insert_skip, delete_skip) {
            (Some(ins), Some(del)) if ins <= del => {
                edits.push(Edit::insert(i + 1, modified[j..j + ins].to_vec()));
                j += ins;
            }
            (Some(ins), None) => {
                edits.push(Edit::insert(i + 1, modified[j..j + ins].to_vec()));
                j += ins;
            }
            (_, Some(del)) => {
                edits.push(Edit::delete(i + 1, original[i..i + del].to_vec()));
                i += del;
            }
            (None, None) => {
                edits.push(Edit::replace(i + 1, modified[j].clone()));
                i += 1;
                j += 1;
            }
        }
    }

    if j < modified.len() {
        edits.push(Edit::insert(original.len() + 1, modified[j..].to_vec()));
    }
    if i < original.len() {
        edits.push(Edit::delete(i + 1, original[i..].to_vec()));
    }

    tracing::debug!(
        original = original.len(),
        modified = modified.len(),
        edits = edits.len(),
        "computed line diff"
    );
    edits
}

/// Offset (1..=LOOKAHEAD_WINDOW) at which `needle` reappears in `haystack`.
/// `haystack[0]` is the mismatched line itself, so the search starts at 1.
fn resync_distance(needle: &str, haystack: &[String]) -> Option<usize> {
    haystack
        .iter()
        .enumerate()
        .skip(1)
        .take(LOOKAHEAD_WINDOW)
        .find(|(_, line)| line.as_str() == needle)
        .map(|(offset, _)| offset)
}

// ---------------------------------------------------------------------------
// Applying
// ---------------------------------------------------------------------------

/// A mutable, line-addressable text store (1-based lines).
pub trait LineStore {
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Insert `lines` before line `before`; `len() + 1` appends.
    fn insert_lines(&mut self, before: usize, lines: &[String]);

    /// Remove `count` lines starting at `start`.
    fn delete_lines(&mut self, start: usize, count: usize);

    fn replace_line(&mut self, line: usize, text: &str);
}

impl LineStore for Vec<String> {
    fn len(&self) -> usize {
        <[String]>::len(self)
    }

    fn insert_lines(&mut self, before: usize, lines: &[String]) {
        let idx = before.saturating_sub(1).min(self.len());
        self.splice(idx..idx, lines.iter().cloned());
    }

    fn delete_lines(&mut self, start: usize, count: usize) {
        let from = start.saturating_sub(1).min(self.len());
        let to = (from + count).min(self.len());
        self.drain(from..to);
    }

    fn replace_line(&mut self, line: usize, text: &str) {
        if let Some(slot) = line.checked_sub(1).and_then(|idx| self.get_mut(idx)) {
            *slot = text.to_string();
        }
    }
}

/// Apply an edit script from `diff_lines` to a store holding the original
/// lines. Edits run back to front so the line numbers of the ones still
/// pending stay valid.
pub fn apply_edits<S: LineStore + ?Sized>(store: &mut S, edits: &[Edit]) {
    for edit in edits.iter().rev() {
        match edit.op {
            EditOp::Insert => store.insert_lines(edit.at_line, &edit.payload),
            EditOp::Delete => store.delete_lines(edit.at_line, edit.payload.len()),
            EditOp::Replace => {
                if let Some(line) = edit.payload.first() {
                    store.replace_line(edit.at_line, line);
                }
            }
        }
    }
}
