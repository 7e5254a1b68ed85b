//! # textpipe
//!
//! Text handling for chat bot commands and moderation filters.
//!
//! ## Features
//!
//! - **Command arguments**: a quote and escape aware lexer, two parsing
//!   strategies for flags, options and ordered arguments, and a cursor for
//!   consuming the result from either end with checkpoints
//! - **Moderation preprocessing**: case folding, leet-speak and lookalike
//!   substitution, run-length capping and word boundaries, mapped back to
//!   offsets in the original message
//! - **Configuration**: YAML, JSON or TOML files with validation
//!
//! ## Quick Start
//!
//! ```rust
//! use textpipe::prelude::*;
//!
//! let mut pipeline = ArgumentPipeline::build(
//!     [QuotePair::new('"', '"')],
//!     ParserStrategy::Standard,
//!     &[FlagMetadata::new("silent", ["--silent", "-s"])],
//!     &[FlagMetadata::new("reason", ["--reason"])],
//! );
//!
//! let mut command = pipeline
//!     .parse_command("!timeout someone 600 -s --reason \"spamming links\"")
//!     .unwrap();
//! assert_eq!(command.name, "timeout");
//! assert!(command.args.has_flag("silent"));
//! assert_eq!(command.args.get_option("reason"), Some("spamming links"));
//! assert_eq!(command.args.next_ordered(false), Some("someone"));
//!
//! let mut preprocessor = TextPreprocessor::default();
//! let output = preprocessor.run("SP4MMMMM h3re");
//! assert_eq!(output.to_display_string(), "spammm here");
//! ```

pub mod args;
pub mod config;
pub mod preprocessor;
pub mod types;

// Re-export commonly used items
pub mod prelude {
    pub use crate::args::{
        AnyParser, ArgumentPipeline, FindOptions, Lexer, ParsedCommand, Parser, ParserOutputWrapper,
        ParserStrategy, RetrieveManyOptions, StandardParser, TransformOptions, VariadicFlagParser,
    };
    pub use crate::config::{ConfigError, ConfigLoader, TextpipeConfig};
    pub use crate::preprocessor::{TextPreprocessor, TextPreprocessorOptions};
    pub use crate::types::{
        join_tokens, FlagMetadata, ParserOutput, QuotePair, TextPreprocessorOutput, Token, SYMBOL, WHITESPACE,
    };
}

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
