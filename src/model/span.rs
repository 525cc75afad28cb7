use serde::Serialize;

/// Source span of a parsed heading: inclusive, 1-based line numbers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SourceSpan {
    pub start: usize,
    pub end: usize,
}

impl SourceSpan {
    pub fn new(start: usize, end: usize) -> Self {
        SourceSpan { start, end }
    }

    pub fn contains(&self, line: usize) -> bool {
        self.start <= line && line <= self.end
    }
}
