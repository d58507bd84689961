//! Line-based batch splitting.

/// Separator token used by SQL Server tooling (`sqlcmd`, SSMS).
pub const DEFAULT_SEPARATOR: &str = "GO";

/// Turns a whole script into ordered, independently executable batches.
///
/// Implementations must be deterministic and keep source order, because later
/// batches may depend on objects created by earlier ones.
pub trait BatchSplitter {
    fn split(&self, script: &str) -> Vec<String>;
}

/// Splits on lines consisting solely of a separator token.
///
/// Matching ignores surrounding whitespace and ASCII case, so `GO`, `go` and
/// `  Go  ` all end a batch. The splitter knows nothing about SQL: a
/// separator line inside a multi-line string literal or block comment still
/// ends the batch. Scripts that need that distinction should supply their
/// own [`BatchSplitter`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeparatorSplitter {
    separator: String,
}

impl SeparatorSplitter {
    /// Creates a splitter for the given token. A blank token never matches,
    /// which leaves the whole script as a single batch.
    pub fn new(separator: impl Into<String>) -> Self {
        Self {
            separator: separator.into().trim().to_string(),
        }
    }

    pub fn separator(&self) -> &str {
        &self.separator
    }

    fn is_separator(&self, line: &str) -> bool {
        !self.separator.is_empty() && line.trim().eq_ignore_ascii_case(&self.separator)
    }
}

impl Default for SeparatorSplitter {
    fn default() -> Self {
        Self::new(DEFAULT_SEPARATOR)
    }
}

impl BatchSplitter for SeparatorSplitter {
    fn split(&self, script: &str) -> Vec<String> {
        let mut batches = Vec::new();
        let mut current = String::new();

        for line in script.lines() {
            if self.is_separator(line) {
                push_batch(&mut batches, &current);
                current.clear();
            } else {
                current.push_str(line);
                current.push('\n');
            }
        }
        push_batch(&mut batches, &current);

        batches
    }
}

/// Keeps a segment only if it has content after trimming.
fn push_batch(batches: &mut Vec<String>, segment: &str) {
    let trimmed = segment.trim();
    if !trimmed.is_empty() {
        batches.push(trimmed.to_string());
    }
}
