//! Text measurement for the demo.
//!
//! A string's byte length says nothing about how far the cursor moves when a
//! terminal prints it. This module counts the ways a string can be "long":
//! bytes, codepoints, grapheme clusters, and predicted display columns.

use serde::Serialize;
use unicode_segmentation::UnicodeSegmentation;
use unicode_width::UnicodeWidthStr;

use crate::report::CaretPosition;

/// Sample text dense with combining marks ("Zalgo" text). Nine grapheme
/// clusters, nine display columns, 44 codepoints, 84 bytes.
pub const ZALGO_SAMPLE: &str = "Ẓ̌á̲l͔̝̞̄̑͌g̖̘̘̔̔͢͞͝o̪̔T̢̙̫̈̍͞e̬͈͕͌̏͑x̺̍ṭ̓̓ͅ";

/// The sizes of a string under different units.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TextMetrics {
    /// UTF-8 encoded length.
    pub bytes: usize,
    /// Unicode scalar values.
    pub codepoints: usize,
    /// Extended grapheme clusters, what a reader would call characters.
    pub graphemes: usize,
    /// Display columns the cursor is expected to advance. Combining marks
    /// are zero wide, East Asian wide forms are two.
    pub columns: usize,
}

impl TextMetrics {
    pub fn of(text: &str) -> Self {
        Self {
            bytes: text.len(),
            codepoints: text.chars().count(),
            graphemes: text.graphemes(true).count(),
            columns: UnicodeWidthStr::width(text),
        }
    }
}

/// Horizontal distance between two probed positions.
///
/// Meaningful only when both probes landed on the same row; a wrap or a
/// scroll in between makes the delta lie, so that case is `None`.
pub fn column_advance(before: &CaretPosition, after: &CaretPosition) -> Option<i32> {
    if before.row != after.row {
        return None;
    }
    Some(i32::from(after.col) - i32::from(before.col))
}
