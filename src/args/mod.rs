// src/args/mod.rs - Command argument lexing, parsing and consumption

pub mod bitset;
pub mod lexer;
pub mod parser;
pub mod pipeline;
pub mod wrapper;

pub use bitset::BitSet;
pub use lexer::Lexer;
pub use parser::{AnyParser, FlagRegistry, Parser, ParserStrategy, StandardParser, VariadicFlagParser};
pub use pipeline::{ArgumentPipeline, ParsedCommand};
pub use wrapper::{FindOptions, ParserOutputWrapper, RetrieveManyOptions, TransformOptions};
