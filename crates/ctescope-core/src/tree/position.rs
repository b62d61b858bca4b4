//! Line/column to byte offset conversion.

/// Converts a stream of ascending tokenizer positions into byte offsets.
///
/// The cursor only moves forward, so converting every token of a document
/// walks the source once regardless of line length. A position behind the
/// cursor rewinds to the start of its line.
pub(crate) struct OffsetCursor<'a> {
    source: &'a str,
    line_starts: Vec<usize>,
    byte: usize,
    line: usize,
    column: usize,
}

impl<'a> OffsetCursor<'a> {
    pub(crate) fn new(source: &'a str) -> Self {
        let line_starts = std::iter::once(0)
            .chain(source.match_indices('\n').map(|(pos, _)| pos + 1))
            .collect();
        Self {
            source,
            line_starts,
            byte: 0,
            line: 1,
            column: 1,
        }
    }

    /// Same contract as [`line_col_to_offset`].
    pub(crate) fn offset(&mut self, line: usize, column: usize) -> Option<usize> {
        if line == 0 || column == 0 {
            return None;
        }
        if (line, column) < (self.line, self.column) {
            self.byte = *self.line_starts.get(line - 1)?;
            self.line = line;
            self.column = 1;
        }

        while (self.line, self.column) < (line, column) {
            let ch = self.source[self.byte..].chars().next()?;
            if ch == '\n' {
                // Past the end of the requested line.
                if self.line == line {
                    return None;
                }
                self.line += 1;
                self.column = 1;
            } else {
                self.column += 1;
            }
            self.byte += ch.len_utf8();
        }

        Some(self.byte)
    }
}

/// Converts a 1-based line and character column into a byte offset.
///
/// Both the `sqlparser` tokenizer and editors report columns in characters,
/// so multi-byte characters count as one column. A column one past the end of
/// the line addresses the line end.
pub fn line_col_to_offset(sql: &str, line: usize, column: usize) -> Option<usize> {
    if line == 0 || column == 0 {
        return None;
    }

    let mut line_start = 0;
    for _ in 1..line {
        let newline = sql.get(line_start..)?.find('\n')?;
        line_start += newline + 1;
    }

    let rest = sql.get(line_start..)?;
    let line_text = rest.split('\n').next().unwrap_or_default();
    column_to_offset(line_text, column).map(|rel| line_start + rel)
}

fn column_to_offset(line_text: &str, column: usize) -> Option<usize> {
    let index = column.checked_sub(1)?;
    match line_text.char_indices().nth(index) {
        Some((rel_offset, _)) => Some(rel_offset),
        None if index == line_text.chars().count() => Some(line_text.len()),
        None => None,
    }
}
