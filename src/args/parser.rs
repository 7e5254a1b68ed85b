use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::types::{FlagMetadata, ParserOutput, Token};

/// Separates a list of tokens into flags, options and ordered arguments.
///
/// Implementors make exactly one token-consuming decision per `next_into`
/// call and mutate the output they are handed. Parsing never fails.
pub trait Parser {
    /// Sets the tokens to parse and resets the position.
    fn set_input(&mut self, tokens: Vec<Token>) -> &mut Self;

    fn reset(&mut self);

    fn is_done(&self) -> bool;

    /// Advances by one decision. Returns `false` once the input is exhausted.
    fn next_into(&mut self, output: &mut ParserOutput) -> bool;

    /// Runs the parser over the remaining input.
    fn parse(&mut self) -> ParserOutput {
        let mut output = ParserOutput::new();
        while self.next_into(&mut output) {}
        output
    }
}

/// Registered flag and option prefixes, each mapped to its logical ID
#[derive(Debug, Clone, Default)]
pub struct FlagRegistry {
    flags: HashMap<String, String>,
    options: HashMap<String, String>,
}

impl FlagRegistry {
    pub fn register_flags<'a, I>(&mut self, flags: I)
    where
        I: IntoIterator<Item = &'a FlagMetadata>,
    {
        register(&mut self.flags, flags);
    }

    pub fn register_options<'a, I>(&mut self, options: I)
    where
        I: IntoIterator<Item = &'a FlagMetadata>,
    {
        register(&mut self.options, options);
    }

    pub fn flag_id(&self, raw: &str) -> Option<&str> {
        self.flags.get(raw).map(String::as_str)
    }

    pub fn option_id(&self, raw: &str) -> Option<&str> {
        self.options.get(raw).map(String::as_str)
    }

    /// Whether `raw` is any registered flag or option prefix.
    pub fn is_registered(&self, raw: &str) -> bool {
        self.flags.contains_key(raw) || self.options.contains_key(raw)
    }

    pub fn flags(&self) -> &HashMap<String, String> {
        &self.flags
    }

    pub fn options(&self) -> &HashMap<String, String> {
        &self.options
    }
}

fn register<'a, I>(map: &mut HashMap<String, String>, entries: I)
where
    I: IntoIterator<Item = &'a FlagMetadata>,
{
    for FlagMetadata { id, prefixes } in entries {
        for prefix in prefixes {
            map.insert(prefix.clone(), id.clone());
        }
    }
}

/// Token list plus cursor, shared by both parsing strategies
#[derive(Debug, Clone, Default)]
struct Cursor {
    input: Vec<Token>,
    position: usize,
}

impl Cursor {
    fn is_done(&self) -> bool {
        self.position >= self.input.len()
    }

    fn current(&self) -> &Token {
        &self.input[self.position]
    }

    fn advance(&mut self, n: usize) {
        self.position += n;
    }
}

macro_rules! registration_methods {
    () => {
        /// Registers flags. A prefix registered twice keeps its last ID.
        pub fn register_flags<'a, I>(&mut self, flags: I) -> &mut Self
        where
            I: IntoIterator<Item = &'a FlagMetadata>,
        {
            self.registry.register_flags(flags);
            self
        }

        /// Registers options. A prefix registered twice keeps its last ID.
        pub fn register_options<'a, I>(&mut self, options: I) -> &mut Self
        where
            I: IntoIterator<Item = &'a FlagMetadata>,
        {
            self.registry.register_options(options);
            self
        }

        /// Registered flag prefixes mapped to their IDs.
        pub fn registered_flags(&self) -> &HashMap<String, String> {
            self.registry.flags()
        }

        /// Registered option prefixes mapped to their IDs.
        pub fn registered_options(&self) -> &HashMap<String, String> {
            self.registry.options()
        }
    };
}

/// The general-purpose parser.
///
/// - A token whose raw text is an option prefix takes the next token's value.
///   An option prefix with nothing after it is discarded.
/// - A token whose raw text is a flag prefix adds the flag.
/// - Anything else is an ordered argument.
#[derive(Debug, Clone, Default)]
pub struct StandardParser {
    registry: FlagRegistry,
    cursor: Cursor,
}

impl StandardParser {
    pub fn new() -> Self {
        Self::default()
    }

    registration_methods!();

    /// `None` when the current token is not an option prefix.
    fn parse_option(&mut self, output: &mut ParserOutput) -> Option<bool> {
        let id = self.registry.option_id(&self.cursor.current().raw)?.to_string();

        self.cursor.advance(1);
        if self.cursor.is_done() {
            return Some(false);
        }

        let value = self.cursor.current().value.clone();
        output.push_option_value(&id, value);
        self.cursor.advance(1);
        Some(true)
    }

    fn parse_flag(&mut self, output: &mut ParserOutput) -> bool {
        let Some(id) = self.registry.flag_id(&self.cursor.current().raw) else {
            return false;
        };

        output.flags.insert(id.to_string());
        self.cursor.advance(1);
        true
    }

    fn parse_ordered(&mut self, output: &mut ParserOutput) {
        output.ordered.push(self.cursor.current().clone());
        self.cursor.advance(1);
    }
}

impl Parser for StandardParser {
    fn set_input(&mut self, tokens: Vec<Token>) -> &mut Self {
        self.cursor = Cursor { input: tokens, position: 0 };
        self
    }

    fn reset(&mut self) {
        self.cursor.position = 0;
    }

    fn is_done(&self) -> bool {
        self.cursor.is_done()
    }

    fn next_into(&mut self, output: &mut ParserOutput) -> bool {
        if self.cursor.is_done() {
            return false;
        }

        if self.parse_option(output).is_none() && !self.parse_flag(output) {
            self.parse_ordered(output);
        }
        true
    }
}

/// A parser for input made only of flags and options.
///
/// `--reason spamming links --duration 10 minutes` gives `reason` the value
/// `"spamming links "` and `duration` the value `"10 minutes"`: an option's
/// value runs, with the original spacing, until the next registered prefix.
/// Tokens that are neither flags nor option values are dropped, so ordered
/// arguments are never produced.
#[derive(Debug, Clone, Default)]
pub struct VariadicFlagParser {
    registry: FlagRegistry,
    cursor: Cursor,
}

impl VariadicFlagParser {
    pub fn new() -> Self {
        Self::default()
    }

    registration_methods!();

    fn parse_option(&mut self, output: &mut ParserOutput) -> Option<bool> {
        let id = self.registry.option_id(&self.cursor.current().raw)?.to_string();

        self.cursor.advance(1);
        if self.cursor.is_done() {
            return Some(false);
        }

        // The first token after the prefix always belongs to the value, even
        // if it looks like a prefix itself.
        let token = self.cursor.current();
        let mut value = format!("{}{}", token.value, token.trailing);
        self.cursor.advance(1);

        while !self.cursor.is_done() {
            let token = self.cursor.current();
            if self.registry.is_registered(&token.raw) {
                break;
            }
            value.push_str(&token.value);
            value.push_str(&token.trailing);
            self.cursor.advance(1);
        }

        output.push_option_value(&id, value);
        Some(true)
    }

    fn parse_flag(&mut self, output: &mut ParserOutput) -> bool {
        let Some(id) = self.registry.flag_id(&self.cursor.current().raw) else {
            return false;
        };

        output.flags.insert(id.to_string());
        self.cursor.advance(1);
        true
    }
}

impl Parser for VariadicFlagParser {
    fn set_input(&mut self, tokens: Vec<Token>) -> &mut Self {
        self.cursor = Cursor { input: tokens, position: 0 };
        self
    }

    fn reset(&mut self) {
        self.cursor.position = 0;
    }

    fn is_done(&self) -> bool {
        self.cursor.is_done()
    }

    fn next_into(&mut self, output: &mut ParserOutput) -> bool {
        if self.cursor.is_done() {
            return false;
        }

        if self.parse_option(output).is_none() && !self.parse_flag(output) {
            self.cursor.advance(1);
        }
        true
    }
}

/// Which parsing strategy a command uses
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParserStrategy {
    #[default]
    Standard,
    Variadic,
}

/// Either parsing strategy, chosen once when a command is set up
#[derive(Debug, Clone)]
pub enum AnyParser {
    Standard(StandardParser),
    Variadic(VariadicFlagParser),
}

impl AnyParser {
    /// Builds a parser of the given strategy with the flags and options registered.
    pub fn build(strategy: ParserStrategy, flags: &[FlagMetadata], options: &[FlagMetadata]) -> Self {
        match strategy {
            ParserStrategy::Standard => {
                let mut parser = StandardParser::new();
                parser.register_flags(flags).register_options(options);
                AnyParser::Standard(parser)
            }
            ParserStrategy::Variadic => {
                let mut parser = VariadicFlagParser::new();
                parser.register_flags(flags).register_options(options);
                AnyParser::Variadic(parser)
            }
        }
    }

    pub fn strategy(&self) -> ParserStrategy {
        match self {
            AnyParser::Standard(_) => ParserStrategy::Standard,
            AnyParser::Variadic(_) => ParserStrategy::Variadic,
        }
    }
}

impl Parser for AnyParser {
    fn set_input(&mut self, tokens: Vec<Token>) -> &mut Self {
        match self {
            AnyParser::Standard(parser) => {
                parser.set_input(tokens);
            }
            AnyParser::Variadic(parser) => {
                parser.set_input(tokens);
            }
        }
        self
    }

    fn reset(&mut self) {
        match self {
            AnyParser::Standard(parser) => parser.reset(),
            AnyParser::Variadic(parser) => parser.reset(),
        }
    }

    fn is_done(&self) -> bool {
        match self {
            AnyParser::Standard(parser) => parser.is_done(),
            AnyParser::Variadic(parser) => parser.is_done(),
        }
    }

    fn next_into(&mut self, output: &mut ParserOutput) -> bool {
        match self {
            AnyParser::Standard(parser) => parser.next_into(output),
            AnyParser::Variadic(parser) => parser.next_into(output),
        }
    }
}
