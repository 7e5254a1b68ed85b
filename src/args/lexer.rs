use std::collections::HashMap;

use crate::types::{QuotePair, Token};

/// Splits command input into tokens.
///
/// The lexer owns its quote configuration; `set_input` rebinds it to a new
/// string without touching the registered quotes, so one lexer can be reused
/// across many messages.
///
/// ```
/// use textpipe::args::Lexer;
/// use textpipe::types::QuotePair;
///
/// let tokens = Lexer::new()
///     .set_quotes([QuotePair::new('"', '"')])
///     .set_input(r#"ban "some user" spam"#)
///     .lex();
/// assert_eq!(tokens[1].value, "some user");
/// ```
#[derive(Debug, Clone, Default)]
pub struct Lexer {
    input: Vec<char>,
    position: usize,
    quotes: HashMap<char, char>,
}

impl Lexer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers quote pairs. Later pairs with the same open quote win.
    pub fn set_quotes<I, Q>(&mut self, quotes: I) -> &mut Self
    where
        I: IntoIterator<Item = Q>,
        Q: Into<QuotePair>,
    {
        for pair in quotes {
            let QuotePair { open, close } = pair.into();
            self.quotes.insert(open, close);
        }
        self
    }

    /// Sets the input, trimming leading whitespace, and resets the position.
    pub fn set_input(&mut self, input: &str) -> &mut Self {
        self.input = input.trim_start().chars().collect();
        self.reset()
    }

    pub fn reset(&mut self) -> &mut Self {
        self.position = 0;
        self
    }

    /// Whether the whole input has been consumed.
    pub fn is_done(&self) -> bool {
        self.position >= self.input.len()
    }

    /// Lexes the rest of the input.
    pub fn lex(&mut self) -> Vec<Token> {
        self.by_ref().collect()
    }

    fn next_token(&mut self) -> Token {
        let first = self.input[self.position];
        let maybe_quoted = !self.quotes.is_empty() && !self.is_last_character();

        if maybe_quoted {
            if let Some(&close) = self.quotes.get(&first) {
                let start = self.position;
                self.advance(1);

                if let Some(token) = self.next_quoted(first, close) {
                    return token;
                }

                // No close quote before the end of input, so the open quote is
                // just part of a word.
                self.position = start;
            }
        }

        self.next_word()
    }

    fn next_quoted(&mut self, open: char, close: char) -> Option<Token> {
        let mut value = String::new();
        let mut raw = String::new();
        raw.push(open);

        while !self.is_done() {
            let c = self.input[self.position];
            if c == close {
                self.advance(1);
                raw.push(close);
                let trailing = self.consume_whitespace();
                return Some(Token { value, raw, trailing });
            }
            self.push_char(&mut value, &mut raw);
        }

        None
    }

    fn next_word(&mut self) -> Token {
        let mut value = String::new();
        let mut raw = String::new();

        while !self.is_done() {
            if self.input[self.position].is_whitespace() {
                let trailing = self.consume_whitespace();
                return Token { value, raw, trailing };
            }
            self.push_char(&mut value, &mut raw);
        }

        Token { value, raw, trailing: String::new() }
    }

    /// Consumes one character, resolving `\c` to `c`. A backslash at the very
    /// end of input is kept literally.
    fn push_char(&mut self, value: &mut String, raw: &mut String) {
        let c = self.input[self.position];
        if c == '\\' && !self.is_last_character() {
            let escaped = self.input[self.position + 1];
            value.push(escaped);
            raw.push('\\');
            raw.push(escaped);
            self.advance(2);
        } else {
            value.push(c);
            raw.push(c);
            self.advance(1);
        }
    }

    fn consume_whitespace(&mut self) -> String {
        let mut whitespace = String::new();
        while !self.is_done() {
            let c = self.input[self.position];
            if !c.is_whitespace() {
                break;
            }
            whitespace.push(c);
            self.advance(1);
        }
        whitespace
    }

    fn advance(&mut self, n: usize) {
        self.position += n;
    }

    fn is_last_character(&self) -> bool {
        self.position + 1 == self.input.len()
    }
}

impl Iterator for Lexer {
    type Item = Token;

    fn next(&mut self) -> Option<Token> {
        if self.is_done() {
            return None;
        }
        Some(self.next_token())
    }
}
