use log::debug;

use crate::args::{AnyParser, Lexer, Parser, ParserOutputWrapper, ParserStrategy};
use crate::types::{FlagMetadata, QuotePair};

/// A command pulled out of a chat message
#[derive(Debug, Clone)]
pub struct ParsedCommand {
    /// The prefix the message started with
    pub prefix: String,
    /// Command name, lowercased
    pub name: String,
    /// Everything after the name, parsed
    pub args: ParserOutputWrapper,
}

/// Lexer and parser wired together for one command surface.
///
/// Holds its own lexer and parser so the quote table and flag registrations
/// are built once and reused for every message.
#[derive(Debug, Clone)]
pub struct ArgumentPipeline {
    prefixes: Vec<String>,
    lexer: Lexer,
    parser: AnyParser,
}

impl ArgumentPipeline {
    pub fn new(lexer: Lexer, parser: AnyParser) -> Self {
        Self {
            prefixes: vec!["!".to_string()],
            lexer,
            parser,
        }
    }

    /// A pipeline with the given quotes, flags and options.
    pub fn build<I, Q>(
        quotes: I,
        strategy: ParserStrategy,
        flags: &[FlagMetadata],
        options: &[FlagMetadata],
    ) -> Self
    where
        I: IntoIterator<Item = Q>,
        Q: Into<QuotePair>,
    {
        let mut lexer = Lexer::new();
        lexer.set_quotes(quotes);
        Self::new(lexer, AnyParser::build(strategy, flags, options))
    }

    /// Replaces the command prefixes (default `!`). Empty prefixes are ignored.
    pub fn with_prefixes<I, S>(mut self, prefixes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.prefixes = prefixes
            .into_iter()
            .map(Into::into)
            .filter(|prefix: &String| !prefix.is_empty())
            .collect();
        // Longest first so `!!` wins over `!`.
        self.prefixes.sort_by(|a, b| b.len().cmp(&a.len()));
        self
    }

    pub fn prefixes(&self) -> &[String] {
        &self.prefixes
    }

    pub fn strategy(&self) -> ParserStrategy {
        self.parser.strategy()
    }

    /// Returns the prefix `content` starts with, if any.
    pub fn match_prefix(&self, content: &str) -> Option<&str> {
        self.prefixes
            .iter()
            .find(|prefix| content.starts_with(prefix.as_str()))
            .map(String::as_str)
    }

    /// Lexes and parses raw argument text.
    pub fn parse_arguments(&mut self, input: &str) -> ParserOutputWrapper {
        let tokens = self.lexer.set_input(input).lex();
        let output = self.parser.set_input(tokens).parse();
        debug!(
            "Parsed {} ordered, {} flags, {} options",
            output.ordered.len(),
            output.flags.len(),
            output.options.len()
        );
        ParserOutputWrapper::new(output)
    }

    /// Parses a chat message as a command.
    ///
    /// Returns `None` if the message does not start with a prefix or has
    /// nothing after it.
    pub fn parse_command(&mut self, content: &str) -> Option<ParsedCommand> {
        let prefix = self.match_prefix(content)?.to_string();
        let rest = &content[prefix.len()..];

        let mut tokens = self.lexer.set_input(rest).lex();
        if tokens.is_empty() {
            return None;
        }

        let name = tokens.remove(0).value.to_lowercase();
        let output = self.parser.set_input(tokens).parse();
        debug!("Parsed command '{}' with {} ordered arguments", name, output.ordered.len());

        Some(ParsedCommand {
            prefix,
            name,
            args: ParserOutputWrapper::new(output),
        })
    }
}

impl Default for ArgumentPipeline {
    fn default() -> Self {
        Self::build([QuotePair::new('"', '"')], ParserStrategy::Standard, &[], &[])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn moderation_pipeline(strategy: ParserStrategy) -> ArgumentPipeline {
        ArgumentPipeline::build(
            [('"', '"'), ('“', '”')],
            strategy,
            &[FlagMetadata::new("silent", ["--silent", "-s"])],
            &[FlagMetadata::new("reason", ["--reason", "-r"])],
        )
    }

    #[test]
    fn test_default_pipeline() {
        let mut pipeline = ArgumentPipeline::default();
        assert_eq!(pipeline.prefixes(), ["!"]);
        assert_eq!(pipeline.strategy(), ParserStrategy::Standard);

        let command = pipeline.parse_command("!Hello \"big world\"").unwrap();
        assert_eq!(command.prefix, "!");
        assert_eq!(command.name, "hello");
        let mut args = command.args;
        assert_eq!(args.next_ordered(false), Some("big world"));
        assert!(args.is_done());
    }

    #[test]
    fn test_messages_without_prefix_are_ignored() {
        let mut pipeline = ArgumentPipeline::default();
        assert!(pipeline.parse_command("hello there").is_none());
        assert!(pipeline.parse_command("!").is_none());
        assert!(pipeline.parse_command("!   ").is_none());
    }

    #[test]
    fn test_longest_prefix_wins() {
        let mut pipeline = ArgumentPipeline::default().with_prefixes(["!", "", "!!"]);
        assert_eq!(pipeline.prefixes(), ["!!", "!"]);

        let command = pipeline.parse_command("!!ping").unwrap();
        assert_eq!(command.prefix, "!!");
        assert_eq!(command.name, "ping");

        let command = pipeline.parse_command("!pong").unwrap();
        assert_eq!(command.prefix, "!");
    }

    #[test]
    fn test_standard_command() {
        let mut pipeline = moderation_pipeline(ParserStrategy::Standard);
        let mut command = pipeline
            .parse_command("!timeout someone 600 -s --reason “posting links”")
            .unwrap();

        assert_eq!(command.name, "timeout");
        assert!(command.args.has_flag("silent"));
        assert_eq!(command.args.get_option("reason"), Some("posting links"));
        assert_eq!(command.args.next_ordered(false), Some("someone"));
        assert_eq!(command.args.map_next(|v| v.parse::<u32>().ok(), false), Some(Some(600)));
        assert!(command.args.is_done());
    }

    #[test]
    fn test_variadic_command() {
        let mut pipeline = moderation_pipeline(ParserStrategy::Variadic);
        let command = pipeline.parse_command("!ban --reason spam  bot -s").unwrap();
        assert!(command.args.has_flag("silent"));
        assert_eq!(command.args.get_option("reason"), Some("spam  bot "));
        assert!(command.args.is_empty());
    }

    #[test]
    fn test_pipeline_is_reusable() {
        let mut pipeline = moderation_pipeline(ParserStrategy::Standard);
        let first = pipeline.parse_arguments("a -s b");
        let second = pipeline.parse_arguments("c");

        assert_eq!(first.len(), 2);
        assert!(first.has_flag("silent"));
        assert_eq!(second.len(), 1);
        assert!(!second.has_flag("silent"));
    }
}
