//! Source text with pending edits.
//!
//! Dependency templates never rewrite module text directly. They record
//! insertions and replacements against byte offsets of the *original*
//! source, and `render` applies them in one pass. Offsets therefore stay
//! valid no matter how many templates touch the same module.

#[derive(Debug, Clone, PartialEq, Eq)]
enum Edit {
    Insert { pos: usize, text: String },
    Replace { start: usize, end: usize, text: String },
}

impl Edit {
    fn start(&self) -> usize {
        match self {
            Edit::Insert { pos, .. } => *pos,
            Edit::Replace { start, .. } => *start,
        }
    }

    /// Inserts at a position come before a replacement starting there.
    fn rank(&self) -> u8 {
        match self {
            Edit::Insert { .. } => 0,
            Edit::Replace { .. } => 1,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ReplaceSource {
    original: String,
    edits: Vec<Edit>,
}

impl ReplaceSource {
    pub fn new(original: impl Into<String>) -> Self {
        Self {
            original: original.into(),
            edits: Vec::new(),
        }
    }

    /// Insert `text` before the byte at `pos`.
    ///
    /// Multiple inserts at the same position keep their call order.
    pub fn insert(&mut self, pos: usize, text: impl Into<String>) {
        self.edits.push(Edit::Insert {
            pos: pos.min(self.original.len()),
            text: text.into(),
        });
    }

    /// Replace the bytes in `start..end` with `text`.
    pub fn replace(&mut self, start: usize, end: usize, text: impl Into<String>) {
        let end = end.min(self.original.len());
        self.edits.push(Edit::Replace {
            start: start.min(end),
            end,
            text: text.into(),
        });
    }

    /// Apply every edit and return the resulting text.
    ///
    /// A replacement that overlaps an earlier one is dropped.
    pub fn render(&self) -> String {
        let mut ordered: Vec<&Edit> = self.edits.iter().collect();
        // Stable sort keeps call order among edits with equal keys.
        ordered.sort_by_key(|edit| (edit.start(), edit.rank()));

        let mut out = String::with_capacity(self.original.len());
        let mut cursor = 0;
        for edit in ordered {
            match edit {
                Edit::Insert { pos, text } => {
                    if *pos < cursor {
                        continue;
                    }
                    out.push_str(&self.original[cursor..*pos]);
                    out.push_str(text);
                    cursor = *pos;
                }
                Edit::Replace { start, end, text } => {
                    if *start < cursor {
                        continue;
                    }
                    out.push_str(&self.original[cursor..*start]);
                    out.push_str(text);
                    cursor = *end;
                }
            }
        }
        out.push_str(&self.original[cursor..]);
        out
    }
}
