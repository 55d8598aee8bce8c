//! Character budget for loaded content.
//!
//! The token budget is converted to characters once. Files are charged in
//! ranked order; the file that crosses the line is cut short with a
//! marker, and nothing after it gets content.

/// Appended to content that was cut short. Counted against the budget.
pub const TRUNCATION_MARKER: &str = "\n... [truncated]";

#[derive(Debug, Clone)]
pub struct ContentBudget {
    limit: Option<usize>,
    used: usize,
    exhausted: bool,
}

impl ContentBudget {
    /// `max_tokens` of None means unbounded.
    pub fn new(max_tokens: Option<usize>, chars_per_token: usize) -> Self {
        Self {
            limit: max_tokens.map(|t| t.saturating_mul(chars_per_token)),
            used: 0,
            exhausted: false,
        }
    }

    pub fn is_exhausted(&self) -> bool {
        self.exhausted
    }

    pub fn used(&self) -> usize {
        self.used
    }

    fn remaining(&self) -> Option<usize> {
        self.limit.map(|limit| limit.saturating_sub(self.used))
    }

    /// Charges `content` against the budget and returns what may be kept.
    ///
    /// Whole content when it fits, a marked prefix when it doesn't, and
    /// None once the budget is spent.
    pub fn admit(&mut self, content: String) -> Option<String> {
        if self.exhausted {
            return None;
        }
        let Some(remaining) = self.remaining() else {
            return Some(content);
        };

        let len = content.chars().count();
        if len <= remaining {
            self.used += len;
            return Some(content);
        }

        self.exhausted = true;
        let marker_len = TRUNCATION_MARKER.chars().count();
        if remaining <= marker_len {
            self.used = self.limit.unwrap_or(self.used);
            return None;
        }
        let mut cut: String = content.chars().take(remaining - marker_len).collect();
        cut.push_str(TRUNCATION_MARKER);
        self.used += remaining;
        Some(cut)
    }
}
