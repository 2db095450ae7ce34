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

//! The logical key catalog: a table of `(byte sequence, Key)` pairs, sorted
//! strictly longest-sequence-first so that an escape-led multi-byte
//! sequence is never mis-identified as a bare [`Key::Escape`].

use std::sync::OnceLock;

/// A logical key, independent of the wire bytes that produced it.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug)]
pub enum Key {
    Up,
    Down,
    Left,
    Right,
    ControlUp,
    ControlDown,
    ControlLeft,
    ControlRight,
    Home,
    End,
    PageUp,
    PageDown,
    Tab,
    BackTab,
    Enter,
    Backspace,
    Delete,
    Escape,
    /// `Ctrl` + an ASCII letter, stored lowercase (e.g. `Ctrl('c')`).
    Ctrl(char),
    /// No catalog entry matched; the raw bytes are passed through to the
    /// caller (text insertion or an ASCII-code binding).
    NotDefined,
}

#[derive(Clone, Copy)]
struct CatalogEntry {
    sequence: &'static [u8],
    key: Key,
}

const ESC: u8 = 0x1B;

const STATIC_ENTRIES: &[CatalogEntry] = &[
    CatalogEntry { sequence: &[ESC, b'[', b'1', b';', b'5', b'A'], key: Key::ControlUp },
    CatalogEntry { sequence: &[ESC, b'[', b'1', b';', b'5', b'B'], key: Key::ControlDown },
    CatalogEntry { sequence: &[ESC, b'[', b'1', b';', b'5', b'C'], key: Key::ControlRight },
    CatalogEntry { sequence: &[ESC, b'[', b'1', b';', b'5', b'D'], key: Key::ControlLeft },
    CatalogEntry { sequence: &[ESC, b'[', b'3', b'~'], key: Key::Delete },
    CatalogEntry { sequence: &[ESC, b'[', b'5', b'~'], key: Key::PageUp },
    CatalogEntry { sequence: &[ESC, b'[', b'6', b'~'], key: Key::PageDown },
    CatalogEntry { sequence: &[ESC, b'[', b'1', b'~'], key: Key::Home },
    CatalogEntry { sequence: &[ESC, b'[', b'4', b'~'], key: Key::End },
    CatalogEntry { sequence: &[ESC, b'[', b'A'], key: Key::Up },
    CatalogEntry { sequence: &[ESC, b'[', b'B'], key: Key::Down },
    CatalogEntry { sequence: &[ESC, b'[', b'C'], key: Key::Right },
    CatalogEntry { sequence: &[ESC, b'[', b'D'], key: Key::Left },
    CatalogEntry { sequence: &[ESC, b'[', b'H'], key: Key::Home },
    CatalogEntry { sequence: &[ESC, b'[', b'F'], key: Key::End },
    CatalogEntry { sequence: &[ESC, b'[', b'Z'], key: Key::BackTab },
    CatalogEntry { sequence: &[ESC, b'O', b'H'], key: Key::Home },
    CatalogEntry { sequence: &[ESC, b'O', b'F'], key: Key::End },
    CatalogEntry { sequence: &[0x7F], key: Key::Backspace },
    CatalogEntry { sequence: &[0x08], key: Key::Backspace },
    CatalogEntry { sequence: &[0x09], key: Key::Tab },
    CatalogEntry { sequence: &[0x0D], key: Key::Enter },
    CatalogEntry { sequence: &[0x0A], key: Key::Enter },
    CatalogEntry { sequence: &[ESC], key: Key::Escape },
];

/// Codes that already have a dedicated, more specific catalog entry above
/// and must not also get a generic `Ctrl(letter)` entry.
const RESERVED_CONTROL_CODES: [u8; 3] = [0x09, 0x0A, 0x0D];

fn build_catalog() -> Vec<CatalogEntry> {
    let mut entries: Vec<CatalogEntry> = STATIC_ENTRIES.to_vec();
    for code in 1u8..=26 {
        if RESERVED_CONTROL_CODES.contains(&code) {
            continue;
        }
        let letter = (b'a' + code - 1) as char;
        entries.push(CatalogEntry {
            sequence: control_code_slice(code),
            key: Key::Ctrl(letter),
        });
    }
    // Strictly longest-first; entries of equal length keep their relative
    // (specificity) order from `STATIC_ENTRIES` / the generation order above.
    entries.sort_by(|a, b| b.sequence.len().cmp(&a.sequence.len()));
    entries
}

/// Returns a `'static` single-byte slice for a control code without
/// allocating per call; codes 1..=26 minus the three reserved ones cover 23
/// distinct bytes, so a small static table of one-byte arrays is cheaper
/// than leaking a `Box<[u8]>` per entry.
fn control_code_slice(code: u8) -> &'static [u8] {
    static TABLE: [[u8; 1]; 27] = {
        let mut t = [[0u8; 1]; 27];
        let mut i = 0;
        while i < 27 {
            t[i] = [i as u8];
            i += 1;
        }
        t
    };
    &TABLE[code as usize]
}

static CATALOG: OnceLock<Vec<CatalogEntry>> = OnceLock::new();

fn catalog() -> &'static [CatalogEntry] {
    CATALOG.get_or_init(build_catalog)
}

/// Walks the catalog in longest-first order and returns the first entry
/// whose sequence is a prefix of `input`, along with the number of bytes
/// consumed. `None` means no catalog entry matched (`Key::NotDefined` is
/// synthesized by the caller, which also decides how many raw bytes to
/// consume in that case).
pub fn match_longest_prefix(input: &[u8]) -> Option<(Key, usize)> {
    for entry in catalog() {
        if input.starts_with(entry.sequence) {
            return Some((entry.key, entry.sequence.len()));
        }
    }
    None
}

/// `true` if `input` is a strict prefix of some catalog sequence strictly
/// longer than itself — i.e. bytes not yet read off the wire could still
/// complete a more specific key than whatever `input` alone would decode to.
/// Callers holding a byte stream (rather than one complete key at a time)
/// use this to decide whether to wait for more bytes before decoding.
#[must_use]
pub fn is_ambiguous_prefix(input: &[u8]) -> bool {
    catalog()
        .iter()
        .any(|entry| entry.sequence.len() > input.len() && entry.sequence.starts_with(input))
}

#[cfg(test)]
pub(crate) fn entries_for_test() -> &'static [CatalogEntry] {
    catalog()
}

#[cfg(test)]
impl CatalogEntry {
    pub(crate) fn sequence(&self) -> &'static [u8] {
        self.sequence
    }
    pub(crate) fn key(&self) -> Key {
        self.key
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sorted_strictly_longest_first() {
        let entries = entries_for_test();
        for w in entries.windows(2) {
            assert!(w[0].sequence().len() >= w[1].sequence().len());
        }
    }

    #[test]
    fn no_earlier_sequence_is_a_strict_prefix_of_a_later_one() {
        let entries = entries_for_test();
        for (i, a) in entries.iter().enumerate() {
            for b in &entries[i + 1..] {
                if b.sequence().len() > a.sequence().len() {
                    assert!(
                        !b.sequence().starts_with(a.sequence()),
                        "{:?} (earlier, shorter) is a strict prefix of {:?} (later, longer)",
                        a.sequence(),
                        b.sequence()
                    );
                }
            }
        }
    }

    #[test]
    fn decode_is_insensitive_to_trailing_bytes() {
        let mut input = vec![ESC, b'[', b'A'];
        let (key, len) = match_longest_prefix(&input).unwrap();
        assert_eq!(key, Key::Up);
        assert_eq!(len, 3);
        input.extend_from_slice(b"trailing garbage");
        let (key2, len2) = match_longest_prefix(&input).unwrap();
        assert_eq!(key2, Key::Up);
        assert_eq!(len2, 3);
    }

    #[test]
    fn bare_escape_does_not_steal_multi_byte_sequences() {
        let input = [ESC, b'[', b'A'];
        let (key, _) = match_longest_prefix(&input).unwrap();
        assert_eq!(key, Key::Up);
    }

    #[test]
    fn lone_escape_decodes_as_escape() {
        let input = [ESC];
        let (key, len) = match_longest_prefix(&input).unwrap();
        assert_eq!(key, Key::Escape);
        assert_eq!(len, 1);
    }

    #[test]
    fn ctrl_letters_round_trip() {
        for code in 1u8..=26 {
            if RESERVED_CONTROL_CODES.contains(&code) {
                continue;
            }
            let (key, len) = match_longest_prefix(&[code]).unwrap();
            assert_eq!(len, 1);
            assert_eq!(key, Key::Ctrl((b'a' + code - 1) as char));
        }
    }

    #[test]
    fn unknown_byte_is_not_defined() {
        assert!(match_longest_prefix(&[b'z']).is_none());
    }

    #[test]
    fn lone_escape_byte_is_an_ambiguous_prefix() {
        assert!(is_ambiguous_prefix(&[ESC]));
    }

    #[test]
    fn complete_escape_sequence_is_not_ambiguous() {
        assert!(!is_ambiguous_prefix(&[ESC, b'[', b'A']));
    }

    #[test]
    fn non_escape_byte_is_never_ambiguous() {
        assert!(!is_ambiguous_prefix(&[b'z']));
    }
}
