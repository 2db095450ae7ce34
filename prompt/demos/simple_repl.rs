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

//! A small REPL demonstrating history, word completion, and quoted-string
//! highlighting. Try `help`, `echo "hello world"`, Up/Down for history, and
//! Tab after typing `ec` or `hi`.

use prompt::{Completer, Document, LexToken, Lexer, Options, Prompt, Rgb, Suggestion, TokenStyle};

const COMMANDS: &[&str] = &["help", "echo", "history", "exit"];

struct WordCompleter;

impl Completer for WordCompleter {
    fn complete(&mut self, document: &Document) -> (Vec<Suggestion>, (usize, usize)) {
        let word = document.word_before_cursor(None);
        if word.is_empty() {
            return (Vec::new(), (0, 0));
        }
        let suggestions = COMMANDS
            .iter()
            .filter(|cmd| cmd.starts_with(word))
            .map(|cmd| Suggestion::new(*cmd, ""))
            .collect();
        let end = document.rune_count();
        let start = end - word.chars().count();
        (suggestions, (start, end))
    }
}

/// Highlights double-quoted spans, the way `echo "..."` arguments would be.
struct QuoteLexer;

impl Lexer for QuoteLexer {
    fn tokenize(&mut self, text: &str) -> Vec<LexToken> {
        let style = TokenStyle::fg(Rgb(0, 200, 0));
        let mut tokens = Vec::new();
        let mut start = None;
        for (i, b) in text.bytes().enumerate() {
            if b == b'"' {
                match start.take() {
                    Some(s) => tokens.push(LexToken {
                        first_byte: s,
                        last_byte: i + 1,
                        style,
                    }),
                    None => start = Some(i),
                }
            }
        }
        tokens
    }
}

#[tokio::main]
async fn main() -> Result<(), prompt::PromptError> {
    let mut options = Options::new();
    options.set_history_seed(vec!["help".to_string(), "echo \"hello\"".to_string()]);

    let mut prompt = Prompt::new("repl> ")
        .with_options(options)
        .with_completer(WordCompleter)
        .with_lexer(QuoteLexer)
        .with_executor(|line| match line.split_whitespace().next() {
            Some("exit") => {}
            Some("help") => println!("commands: {}", COMMANDS.join(", ")),
            _ => println!("you typed: {line}"),
        })
        .with_exit_checker(|text, _break_line| text.trim() == "exit");

    prompt.run().await?;
    Ok(())
}
