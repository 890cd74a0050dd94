/// The preprocessed input of a compilation.
///
/// Escaped line continuations (a backslash right before a line break, along
/// with the indentation of the next line) are folded away before lexing, and the whole text is
/// trimmed and terminated by a blank line. Since folding removes line breaks,
/// the source keeps track of where that happened so that offsets into the
/// folded text can still be reported as lines of the original input.
#[derive(Debug)]
pub struct Source {
    text: String,
    /// Sorted `(offset, removed)` pairs: starting at `offset` of the folded
    /// text, `removed` line breaks of the original input are gone.
    folds: Vec<(usize, usize)>,
}

impl Source {
    pub fn new(raw: &str) -> Source {
        let (folded, mut folds) = fold_continuations(raw);

        let body = folded.trim_start();
        let lead = folded.len() - body.len();
        let lead_newlines = folded[..lead].matches('\n').count();

        let body = body.trim_end();
        let mut text = String::with_capacity(body.len() + 2);
        text.push_str(body);
        text.push_str("\n\n");

        for (offset, removed) in &mut folds {
            *offset = offset.saturating_sub(lead);
            *removed += lead_newlines;
        }
        if lead_newlines > 0 {
            folds.insert(0, (0, lead_newlines));
        }

        Source { text, folds }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    /// Returns the 1-based line of the original input which contains the
    /// given offset of the folded text.
    pub fn line_of(&self, offset: usize) -> usize {
        let offset = offset.min(self.text.len());
        let breaks = self.text[..offset].matches('\n').count();
        let idx = self.folds.partition_point(|&(at, _)| at <= offset);
        let removed = idx.checked_sub(1).map_or(0, |i| self.folds[i].1);
        breaks + removed + 1
    }

    /// Returns the 1-based line and column of the given offset of the folded
    /// text.
    pub fn location_of(&self, offset: usize) -> (usize, usize) {
        let offset = offset.min(self.text.len());
        let line_start = self.text[..offset].rfind('\n').map_or(0, |i| i + 1);
        let column = self.text[line_start..offset].chars().count() + 1;
        (self.line_of(offset), column)
    }
}

/// Folds every backslash immediately followed by a line break, together with
/// the whitespace after the break. A backslash separated from the break by
/// trailing blanks is kept.
fn fold_continuations(raw: &str) -> (String, Vec<(usize, usize)>) {
    let mut out = String::with_capacity(raw.len());
    let mut folds = Vec::new();
    let mut removed = 0;
    let mut rest = raw;

    while let Some(i) = rest.find("\\\n") {
        let after = &rest[i + 1..];
        let run = after.len() - after.trim_start().len();
        out.push_str(&rest[..i]);
        removed += after[..run].matches('\n').count();
        folds.push((out.len(), removed));
        rest = &after[run..];
    }
    out.push_str(rest);

    (out, folds)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_trims_and_terminates() {
        let source = Source::new("\n\n  foo := 'a'  \n\n\n");
        assert_eq!(source.text(), "foo := 'a'\n\n");
    }

    #[test]
    fn test_folds_continuations() {
        let cases = [
            ("a \\\n   b", "a b\n\n"),
            ("a\\\n\n  b", "ab\n\n"),
            ("a\\  \n  b", "a\\  \n  b\n\n"),
            ("a\\\r\nb", "a\\\r\nb\n\n"),
            ("a\\b", "a\\b\n\n"),
            ("a \\\\\nb", "a \\b\n\n"),
            ("x := \"\\\n\"", "x := \"\"\n\n"),
        ];
        for (input, expected) in cases {
            assert_eq!(Source::new(input).text(), expected, "input: {input:?}");
        }
    }

    #[test]
    fn test_line_of_after_blank_lines_folded_away() {
        let source = Source::new("a := \\\n\n  'x'\nb := 'y'\n");
        assert_eq!(source.text(), "a := 'x'\nb := 'y'\n\n");
        let b = source.text().find('b').unwrap();
        assert_eq!(source.line_of(b), 4);
    }

    #[test]
    fn test_line_of_accounts_for_folds() {
        let raw = "\n\nfoo:\n  echo a \\\n    b\n  echo c\n";
        let source = Source::new(raw);
        assert_eq!(source.text(), "foo:\n  echo a b\n  echo c\n\n");

        let echo_c = source.text().find("echo c").unwrap();
        assert_eq!(source.line_of(0), 3);
        assert_eq!(source.line_of(echo_c), 6);
        assert_eq!(source.location_of(echo_c), (6, 3));
    }
}
