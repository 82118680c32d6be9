/// Configuration for [`PredicateParser`](crate::PredicateParser).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParserOptions {
    pub(crate) case_sensitive: bool,
    pub(crate) max_depth: usize,
}

impl Default for ParserOptions {
    fn default() -> Self {
        ParserOptions {
            case_sensitive: true,
            max_depth: 256,
        }
    }
}

impl ParserOptions {
    /// Case sensitivity of `matches(..)` patterns; `imatches(..)` is always
    /// case-insensitive.
    pub fn case_sensitive(self, case_sensitive: bool) -> Self {
        ParserOptions {
            case_sensitive,
            ..self
        }
    }

    /// Maximum nesting of parentheses and `!` before parsing fails.
    pub fn max_depth(self, max_depth: usize) -> Self {
        ParserOptions { max_depth, ..self }
    }

    /// Whether `matches(..)` patterns are case-sensitive.
    pub fn is_case_sensitive(&self) -> bool {
        self.case_sensitive
    }

    /// Configured nesting limit.
    pub fn depth_limit(&self) -> usize {
        self.max_depth
    }
}
