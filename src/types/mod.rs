// src/types/mod.rs - Shared data records passed between the pipelines and their callers

use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

/// A single lexical unit of command input
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Token {
    /// Resolved value: quotes stripped and escapes resolved, no trailing whitespace
    pub value: String,
    /// Original text including quote delimiters, excluding trailing whitespace
    pub raw: String,
    /// Whitespace run following the token, empty at end of input
    pub trailing: String,
}

impl Token {
    pub fn new(value: impl Into<String>, raw: impl Into<String>, trailing: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            raw: raw.into(),
            trailing: trailing.into(),
        }
    }
}

/// Joins tokens back together using their raw text and trailing whitespace.
pub fn join_tokens<'a, I>(tokens: I) -> String
where
    I: IntoIterator<Item = &'a Token>,
{
    let mut joined = String::new();
    for token in tokens {
        joined.push_str(&token.raw);
        joined.push_str(&token.trailing);
    }
    joined
}

/// An open and close quote pair.
///
/// Both characters are expected to be a single UTF-16 code unit and to be
/// neither whitespace nor a backslash.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuotePair {
    pub open: char,
    pub close: char,
}

impl QuotePair {
    pub const fn new(open: char, close: char) -> Self {
        Self { open, close }
    }
}

impl From<(char, char)> for QuotePair {
    fn from((open, close): (char, char)) -> Self {
        Self { open, close }
    }
}

/// Registration record for a flag or an option
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlagMetadata {
    /// Logical ID reported in the parser output
    pub id: String,
    /// Surface prefixes, e.g. `["--help", "-h"]`
    pub prefixes: Vec<String>,
}

impl FlagMetadata {
    pub fn new<I, S>(id: impl Into<String>, prefixes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            id: id.into(),
            prefixes: prefixes.into_iter().map(Into::into).collect(),
        }
    }
}

/// Output of a parser run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParserOutput {
    /// Positional tokens in the order they were provided
    pub ordered: Vec<Token>,
    /// IDs of the flags present in the input
    pub flags: HashSet<String>,
    /// Option IDs mapped to their values, in input order
    pub options: HashMap<String, Vec<String>>,
}

impl ParserOutput {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn push_option_value(&mut self, id: &str, value: String) {
        self.options.entry(id.to_string()).or_default().push(value);
    }
}

/// Sentinel written for a separator that is not whitespace
pub const SYMBOL: i32 = -1;
/// Sentinel written for whitespace separators
pub const WHITESPACE: i32 = -2;

/// Normalized text produced by the moderation preprocessor
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextPreprocessorOutput {
    /// Lowercase code points, or one of the `SYMBOL`/`WHITESPACE` sentinels
    pub characters: Vec<i32>,
    /// Output index of the first separator after each word
    pub word_boundary_start_indices: Vec<usize>,
    /// Output index of the first character of the following word
    pub word_boundary_end_indices: Vec<usize>,
    /// UTF-16 offset into the normalized input for every entry of `characters`
    pub original_indices: Vec<usize>,
}

impl TextPreprocessorOutput {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.characters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.characters.is_empty()
    }

    /// Renders the output as a string, with `' '` for whitespace and `'_'` for symbols.
    ///
    /// Handy for logging and tests; matchers should use `characters` directly.
    pub fn to_display_string(&self) -> String {
        self.characters
            .iter()
            .map(|&c| match c {
                WHITESPACE => ' ',
                SYMBOL => '_',
                _ => char::from_u32(c as u32).unwrap_or(char::REPLACEMENT_CHARACTER),
            })
            .collect()
    }
}
