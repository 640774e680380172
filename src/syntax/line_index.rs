//! Byte offset ↔ line/column conversion.

use text_size::TextSize;

use crate::base::Position;

/// Maps between byte offsets and 0-indexed line/column positions.
///
/// Built once per text revision; columns are byte columns within the line,
/// matching what the pruner and the token ranges use.
#[derive(Debug, Clone)]
pub struct LineIndex {
    /// Byte offset of the start of each line. Always starts with 0.
    line_starts: Vec<TextSize>,
    len: TextSize,
}

impl LineIndex {
    pub fn new(text: &str) -> Self {
        let mut line_starts = vec![TextSize::new(0)];
        for (i, b) in text.bytes().enumerate() {
            if b == b'\n' {
                line_starts.push(TextSize::new(i as u32 + 1));
            }
        }
        Self {
            line_starts,
            len: TextSize::of(text),
        }
    }

    /// Convert a position to a byte offset.
    ///
    /// Columns past the end of a line clamp to the end of that line, the
    /// way editors report cursor columns. Returns `None` only if the line
    /// does not exist.
    pub fn offset(&self, position: Position) -> Option<TextSize> {
        let start = *self.line_starts.get(position.line)?;
        let line_end = self
            .line_starts
            .get(position.line + 1)
            .map(|next| *next - TextSize::new(1))
            .unwrap_or(self.len);
        let offset = start + TextSize::new(position.column as u32);
        Some(offset.min(line_end))
    }

    /// Convert a byte offset to a position.
    pub fn position(&self, offset: TextSize) -> Position {
        let line = self
            .line_starts
            .partition_point(|&start| start <= offset)
            .saturating_sub(1);
        let column = u32::from(offset - self.line_starts[line]) as usize;
        Position::new(line, column)
    }

    pub fn line_count(&self) -> usize {
        self.line_starts.len()
    }
}
