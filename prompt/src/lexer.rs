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

//! In-band lexical highlighting: callers color the input as the user types
//! by returning a list of byte-range tokens; the renderer paints each
//! grapheme in the style of whichever token covers its starting byte.

use prompt_core::Rgb;

/// The visual style applied to a run of input text.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub struct TokenStyle {
    pub fg: Option<Rgb>,
    pub bg: Option<Rgb>,
    pub bold: bool,
    pub underline: bool,
}

impl TokenStyle {
    #[must_use]
    pub fn fg(color: Rgb) -> Self {
        Self {
            fg: Some(color),
            ..Self::default()
        }
    }
}

/// One colored byte range within the input text. `last_byte` is exclusive.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LexToken {
    pub first_byte: usize,
    pub last_byte: usize,
    pub style: TokenStyle,
}

/// Caller-supplied highlighter, invoked synchronously on the event loop
/// thread each time the buffer changes. Tokens need not be contiguous or
/// sorted; the renderer looks up whichever token (if any) covers a given
/// byte.
pub trait Lexer {
    fn tokenize(&mut self, text: &str) -> Vec<LexToken>;
}

impl<F> Lexer for F
where
    F: FnMut(&str) -> Vec<LexToken>,
{
    fn tokenize(&mut self, text: &str) -> Vec<LexToken> {
        self(text)
    }
}

/// Emits no tokens, so the renderer falls back to the terminal's default
/// foreground for every grapheme.
#[derive(Clone, Copy, Debug, Default)]
pub struct PassthroughLexer;

impl Lexer for PassthroughLexer {
    fn tokenize(&mut self, _text: &str) -> Vec<LexToken> {
        Vec::new()
    }
}

/// Finds the style covering `byte_offset`, if any. Later tokens in `tokens`
/// win ties so callers can layer overrides by pushing them last.
#[must_use]
pub fn style_at(tokens: &[LexToken], byte_offset: usize) -> Option<TokenStyle> {
    tokens
        .iter()
        .rev()
        .find(|t| byte_offset >= t.first_byte && byte_offset < t.last_byte)
        .map(|t| t.style)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn passthrough_lexer_emits_no_tokens() {
        let mut lexer = PassthroughLexer;
        assert!(lexer.tokenize("hello").is_empty());
    }

    #[test]
    fn style_at_finds_covering_token() {
        let tokens = vec![LexToken {
            first_byte: 2,
            last_byte: 5,
            style: TokenStyle::fg(Rgb(255, 0, 0)),
        }];
        assert_eq!(style_at(&tokens, 3), Some(TokenStyle::fg(Rgb(255, 0, 0))));
        assert_eq!(style_at(&tokens, 5), None);
    }

    #[test]
    fn later_overlapping_token_wins() {
        let tokens = vec![
            LexToken {
                first_byte: 0,
                last_byte: 5,
                style: TokenStyle::fg(Rgb(1, 1, 1)),
            },
            LexToken {
                first_byte: 2,
                last_byte: 3,
                style: TokenStyle::fg(Rgb(2, 2, 2)),
            },
        ];
        assert_eq!(style_at(&tokens, 2), Some(TokenStyle::fg(Rgb(2, 2, 2))));
    }
}
