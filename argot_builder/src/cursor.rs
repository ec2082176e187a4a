use regex::{Captures, Match, Regex};

/// A diagnostic pointing into the usage text.
///
/// The `Display` renders the message, the offending source line, and a caret underline beneath `[start, end)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceError {
    message: String,
    start: usize,
    end: usize,
    source: String,
}

impl SourceError {
    pub(crate) fn new(
        message: impl Into<String>,
        start: usize,
        end: usize,
        source: impl Into<String>,
    ) -> Self {
        Self {
            message: message.into(),
            start,
            end: std::cmp::max(start, end),
            source: source.into(),
        }
    }

    /// The diagnostic message (without source context).
    pub fn message(&self) -> &str {
        &self.message
    }

    /// The byte offset at which the offending text starts.
    pub fn start(&self) -> usize {
        self.start
    }

    /// The byte offset at which the offending text ends (exclusive).
    pub fn end(&self) -> usize {
        self.end
    }

    /// The full usage text.
    pub fn source_text(&self) -> &str {
        &self.source
    }
}

impl std::fmt::Display for SourceError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let start = std::cmp::min(self.start, self.source.len());
        let line_start = self.source[..start].rfind('\n').map(|i| i + 1).unwrap_or(0);
        let line_end = self.source[start..]
            .find('\n')
            .map(|i| start + i)
            .unwrap_or(self.source.len());
        let line = &self.source[line_start..line_end];
        let column = self.source[line_start..start].chars().count();
        let end = std::cmp::max(std::cmp::min(self.end, line_end), start);
        let width = std::cmp::max(self.source[start..end].chars().count(), 1);

        write!(
            f,
            "{message}\n{line}\n{:column$}{carets}",
            "",
            message = self.message,
            carets = "^".repeat(width),
        )
    }
}

/// Stateful scanner over the usage text.
///
/// Every match is anchored at the current offset; a non-match consumes nothing.
#[derive(Debug, Clone)]
pub(crate) struct SourceCursor<'s> {
    text: &'s str,
    offset: usize,
    last_match: usize,
}

impl<'s> SourceCursor<'s> {
    pub(crate) fn new(text: &'s str) -> Self {
        Self {
            text,
            offset: 0,
            last_match: 0,
        }
    }

    pub(crate) fn text(&self) -> &'s str {
        self.text
    }

    pub(crate) fn offset(&self) -> usize {
        self.offset
    }

    pub(crate) fn last_match(&self) -> usize {
        self.last_match
    }

    fn anchored(&self, pattern: &Regex) -> Option<Match<'s>> {
        let remaining: &'s str = &self.text[self.offset..];
        // Leftmost semantics: a match starting at 0 is found before any later one.
        pattern.find(remaining).filter(|m| m.start() == 0)
    }

    /// Consume the text matched by `pattern`, returning `""` when there is no match.
    pub(crate) fn matches(&mut self, pattern: &Regex) -> &'s str {
        match self.anchored(pattern) {
            Some(m) => {
                self.last_match = self.offset;
                self.offset += m.end();
                m.as_str()
            }
            None => "",
        }
    }

    /// As [`SourceCursor::matches`], also consuming any whitespace after a successful match.
    pub(crate) fn matches_trimmed(&mut self, pattern: &Regex) -> &'s str {
        let matched = self.matches(pattern);

        if !matched.is_empty() {
            let last_match = self.last_match;
            self.trim_leading_whitespace();
            self.last_match = last_match;
        }

        matched
    }

    /// Consume the text matched by `pattern`, returning its capture groups.
    pub(crate) fn captures(&mut self, pattern: &Regex) -> Option<Captures<'s>> {
        let remaining: &'s str = &self.text[self.offset..];
        let captures = pattern.captures(remaining)?;
        let whole = captures.get(0)?;

        if whole.start() != 0 {
            return None;
        }

        self.last_match = self.offset;
        self.offset += whole.end();
        Some(captures)
    }

    pub(crate) fn starts_with(&self, pattern: &Regex) -> bool {
        self.anchored(pattern).is_some()
    }

    /// Skip whitespace (newlines included), returning whether anything was skipped.
    pub(crate) fn trim_leading_whitespace(&mut self) -> bool {
        let remaining = &self.text[self.offset..];
        let trimmed = remaining.trim_start();
        let skipped = remaining.len() - trimmed.len();
        self.offset += skipped;
        skipped > 0
    }

    pub(crate) fn at_end(&self) -> bool {
        self.offset >= self.text.len()
    }

    pub(crate) fn rollback(&mut self, offset: usize) {
        self.offset = std::cmp::min(offset, self.text.len());
        self.last_match = std::cmp::min(self.last_match, self.offset);
    }

    /// Build a diagnostic without moving the cursor.
    ///
    /// The span defaults to the last match through the current offset.
    pub(crate) fn error(
        &self,
        message: impl Into<String>,
        start: Option<usize>,
        end: Option<usize>,
    ) -> SourceError {
        let start = start.unwrap_or(self.last_match);
        let end = end.unwrap_or(std::cmp::max(self.offset, start + 1));
        SourceError::new(message, start, end, self.text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn pattern(text: &str) -> Regex {
        Regex::new(text).unwrap()
    }

    #[test]
    fn matches_anchored() {
        // Setup
        let mut cursor = SourceCursor::new("abc DEF");
        let upper = pattern("[A-Z]+");
        let lower = pattern("[a-z]+");

        // Execute & verify
        assert_eq!(cursor.matches(&upper), "");
        assert_eq!(cursor.offset(), 0);
        assert_eq!(cursor.matches(&lower), "abc");
        assert_eq!(cursor.offset(), 3);
        assert_eq!(cursor.last_match(), 0);
        assert!(!cursor.starts_with(&upper));
        assert!(cursor.trim_leading_whitespace());
        assert!(cursor.starts_with(&upper));
        assert_eq!(cursor.matches(&upper), "DEF");
        assert!(cursor.at_end());
        assert!(!cursor.trim_leading_whitespace());
    }

    #[test]
    fn matches_trimmed() {
        let mut cursor = SourceCursor::new("abc \n  def");
        let lower = pattern("[a-z]+");

        assert_eq!(cursor.matches_trimmed(&lower), "abc");
        assert_eq!(cursor.last_match(), 0);
        assert_eq!(cursor.offset(), 7);
        assert_eq!(cursor.matches_trimmed(&lower), "def");
        assert!(cursor.at_end());
    }

    #[test]
    fn captures() {
        let mut cursor = SourceCursor::new("  -- some words\nnext");
        let annotation = pattern(r"[ \t]+--[ \t]+([^\n]*)");

        let captures = cursor.captures(&annotation).unwrap();
        assert_eq!(&captures[1], "some words");
        assert_eq!(cursor.offset(), 15);
        assert!(cursor.captures(&annotation).is_none());
        assert_eq!(cursor.offset(), 15);
    }

    #[test]
    fn rollback() {
        let mut cursor = SourceCursor::new("abc def");
        let lower = pattern("[a-z]+");
        cursor.matches_trimmed(&lower);
        let checkpoint = cursor.offset();
        cursor.matches(&lower);

        cursor.rollback(checkpoint);

        assert_eq!(cursor.offset(), 4);
        assert_eq!(cursor.matches(&lower), "def");
    }

    #[test]
    fn error_does_not_move() {
        let mut cursor = SourceCursor::new("abc def");
        cursor.matches(&pattern("[a-z]+"));

        let error = cursor.error("bad", None, None);

        assert_eq!(cursor.offset(), 3);
        assert_eq!(error.start(), 0);
        assert_eq!(error.end(), 3);
        assert_eq!(error.message(), "bad");
        assert_eq!(error.source_text(), "abc def");
    }

    #[rstest]
    #[case("abc def", 0, 3, "oops\nabc def\n^^^")]
    #[case("abc def", 4, 5, "oops\nabc def\n    ^")]
    #[case("abc def", 4, 4, "oops\nabc def\n    ^")]
    #[case("abc\ndef ghi", 8, 11, "oops\ndef ghi\n    ^^^")]
    #[case("abc\ndef", 2, 6, "oops\nabc\n  ^")]
    #[case("", 0, 0, "oops\n\n^")]
    #[case("é INT", 3, 6, "oops\né INT\n  ^^^")]
    #[case("x «ü» y", 2, 6, "oops\nx «ü» y\n  ^^")]
    fn error_display(
        #[case] source: &str,
        #[case] start: usize,
        #[case] end: usize,
        #[case] expected: &str,
    ) {
        assert_eq!(
            SourceError::new("oops", start, end, source).to_string(),
            expected
        );
    }
}
