/*
 *   Licensed under the Apache License, Version 2.0 (the "License");
 *   you may not use this file except in compliance with the License.
 *   You may obtain a copy of the License at
 *
 *   http://www.apache.org/licenses/LICENSE-2.0
 *
 *   Unless required by applicable law or agreed to in writing, software
 *   distributed under the License is distributed on an "AS IS" BASIS,
 *   WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
 *   See the License for the specific language governing permissions and
 *   limitations under the License.
 */

//! Unit-typed text primitives.
//!
//! A single piece of user-typed text can be measured four different ways, and
//! mixing them up is the single most common source of off-by-one bugs in a
//! line editor:
//!
//! - **byte** — an index into the `String`'s UTF-8 storage.
//! - **rune** — an index into the sequence of `char`s (Unicode scalar values).
//! - **grapheme** — an index into the sequence of user-perceived characters,
//!   which may span multiple runes (`e\u{301}`, family emoji, flags).
//! - **column** — a display position; the number of terminal cells a
//!   grapheme occupies (0 for combining marks, 1 for most Latin, 2 for
//!   East-Asian wide glyphs and most emoji).
//!
//! Every index and length in this crate carries its unit in its type so that
//! a function that crosses units has to say so in its name (e.g.
//! [`rune_index_of_nth_grapheme`]) rather than silently accepting the wrong
//! kind of number.

use std::fmt;
use std::ops::{Add, AddAssign, Sub, SubAssign};
use unicode_segmentation::UnicodeSegmentation;
use unicode_width::UnicodeWidthStr;

macro_rules! index_newtype {
    ($name:ident, $repr:ty) => {
        #[derive(Copy, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
        pub struct $name(pub $repr);

        impl $name {
            #[must_use]
            pub fn new(value: $repr) -> Self {
                Self(value)
            }

            #[must_use]
            pub fn as_usize(self) -> usize {
                self.0 as usize
            }
        }

        impl From<$repr> for $name {
            fn from(value: $repr) -> Self {
                Self(value)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl Add<$repr> for $name {
            type Output = $name;
            fn add(self, rhs: $repr) -> Self::Output {
                $name(self.0 + rhs)
            }
        }

        impl AddAssign<$repr> for $name {
            fn add_assign(&mut self, rhs: $repr) {
                self.0 += rhs;
            }
        }

        impl Sub<$repr> for $name {
            type Output = $name;
            fn sub(self, rhs: $repr) -> Self::Output {
                $name(self.0.saturating_sub(rhs))
            }
        }

        impl SubAssign<$repr> for $name {
            fn sub_assign(&mut self, rhs: $repr) {
                self.0 = self.0.saturating_sub(rhs);
            }
        }
    };
}

index_newtype!(ByteIndex, usize);
index_newtype!(RuneIndex, usize);
index_newtype!(GraphemeIndex, usize);
index_newtype!(ColIndex, u16);
index_newtype!(ColWidth, u16);

impl ColWidth {
    /// The last valid column index for a region of this width, or column 0
    /// for a zero-width region.
    #[must_use]
    pub fn last_col_index(self) -> ColIndex {
        if self.0 == 0 {
            ColIndex(0)
        } else {
            ColIndex(self.0 - 1)
        }
    }
}

/// Number of runes (Unicode scalar values) in `text`.
#[must_use]
pub fn rune_count(text: &str) -> usize {
    text.chars().count()
}

/// Number of grapheme clusters (user-perceived characters) in `text`.
#[must_use]
pub fn grapheme_count(text: &str) -> usize {
    text.graphemes(true).count()
}

/// Display width of a single grapheme cluster. Combining marks contribute 0;
/// an emoji sequence counts as one grapheme at width 2.
#[must_use]
pub fn grapheme_width(grapheme: &str) -> u16 {
    let w = UnicodeWidthStr::width(grapheme);
    if w == 0 && !grapheme.is_empty() && grapheme.chars().all(|c| !c.is_control()) {
        // A standalone combining mark has width 0 by construction; anything
        // else that unicode-width reports as 0 (e.g. ZWJ emoji sequences on
        // older tables) is treated as a single wide cell so it never
        // disappears from the rendered line.
        if grapheme.chars().count() > 1 {
            return 2;
        }
    }
    w as u16
}

/// Display width (in terminal columns) of an entire string.
#[must_use]
pub fn display_width(text: &str) -> ColWidth {
    let total: u16 = text.graphemes(true).map(grapheme_width).sum();
    ColWidth(total)
}

/// The rune index immediately after the N-th grapheme cluster (0-based),
/// i.e. the rune-index boundary you'd cut at to take the first `n`
/// graphemes. Returns the rune count of `text` if `n >= grapheme_count`.
#[must_use]
pub fn rune_index_of_nth_grapheme(text: &str, n: GraphemeIndex) -> RuneIndex {
    let mut runes_seen = 0usize;
    for (count, grapheme) in text.graphemes(true).enumerate() {
        if count == n.as_usize() {
            return RuneIndex(runes_seen);
        }
        runes_seen += grapheme.chars().count();
    }
    RuneIndex(runes_seen)
}

/// The rune index of the grapheme whose cumulative display width first
/// reaches or exceeds `col`. Used to map a terminal click/caret column back
/// onto the text. Returns the rune count of `text` if `col` is beyond the
/// end of the rendered line.
#[must_use]
pub fn rune_index_of_nth_column(text: &str, col: ColWidth) -> RuneIndex {
    let mut runes_seen = 0usize;
    let mut width_seen: u16 = 0;
    for grapheme in text.graphemes(true) {
        if width_seen >= col.0 {
            return RuneIndex(runes_seen);
        }
        width_seen += grapheme_width(grapheme);
        runes_seen += grapheme.chars().count();
    }
    RuneIndex(runes_seen)
}

/// Byte offset of the `n`-th rune (0-based) in `text`, or `text.len()` if `n`
/// is at or past the end.
#[must_use]
pub fn byte_index_of_rune(text: &str, n: RuneIndex) -> usize {
    text.char_indices()
        .nth(n.as_usize())
        .map_or(text.len(), |(byte, _)| byte)
}

/// Byte offset of the `n`-th grapheme cluster (0-based) in `text`, or
/// `text.len()` if `n` is at or past the end.
#[must_use]
pub fn byte_index_of_grapheme(text: &str, n: GraphemeIndex) -> usize {
    text.grapheme_indices(true)
        .nth(n.as_usize())
        .map_or(text.len(), |(byte, _)| byte)
}

/// Byte offset of the first byte in `haystack` that is not `needle`, scanning
/// forward from the start. `None` if every byte equals `needle`.
#[must_use]
pub fn index_not_byte(haystack: &[u8], needle: u8) -> Option<usize> {
    haystack.iter().position(|&b| b != needle)
}

/// Byte offset of the first byte in `haystack` that is not present in `set`.
#[must_use]
pub fn index_not_any(haystack: &[u8], set: &[u8]) -> Option<usize> {
    haystack.iter().position(|&b| !set.contains(&b))
}

/// Byte offset of the last byte in `haystack` that is not `needle`, scanning
/// backward from the end.
#[must_use]
pub fn rindex_not_byte(haystack: &[u8], needle: u8) -> Option<usize> {
    haystack.iter().rposition(|&b| b != needle)
}

/// Byte offset of the last byte in `haystack` that is not present in `set`.
#[must_use]
pub fn rindex_not_any(haystack: &[u8], set: &[u8]) -> Option<usize> {
    haystack.iter().rposition(|&b| !set.contains(&b))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rune_vs_grapheme_count() {
        let flag = "e\u{301}"; // "é" as e + combining acute.
        assert_eq!(rune_count(flag), 2);
        assert_eq!(grapheme_count(flag), 1);
    }

    #[test]
    fn width_counts_combining_marks_as_zero() {
        let flag = "e\u{301}";
        assert_eq!(display_width(flag).0, 1);
    }

    #[test]
    fn width_counts_wide_glyphs_as_two() {
        assert_eq!(display_width("\u{4f60}").0, 2); // 你
    }

    #[test]
    fn rune_index_of_nth_grapheme_basic() {
        let s = "ab\u{e9}c"; // a, b, é (precomposed), c
        assert_eq!(rune_index_of_nth_grapheme(s, GraphemeIndex(0)), RuneIndex(0));
        assert_eq!(rune_index_of_nth_grapheme(s, GraphemeIndex(2)), RuneIndex(2));
        assert_eq!(rune_index_of_nth_grapheme(s, GraphemeIndex(4)), RuneIndex(4));
    }

    #[test]
    fn index_not_byte_scans_past_run() {
        assert_eq!(index_not_byte(b"   abc", b' '), Some(3));
        assert_eq!(index_not_byte(b"    ", b' '), None);
    }

    #[test]
    fn rindex_not_any_scans_from_end() {
        assert_eq!(rindex_not_any(b"abc   ", b" \t"), Some(2));
    }
}
