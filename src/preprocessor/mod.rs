// src/preprocessor/mod.rs - Text normalization for moderation filters

pub mod character_iterator;
pub mod dictionaries;
pub mod writer;

pub use character_iterator::CharacterIterator;
pub use writer::{PreprocessorOutputWriter, RunLengthLimits};

use log::{debug, warn};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap, HashSet};
use unicode_general_category::{get_general_category, GeneralCategory};
use unicode_normalization::UnicodeNormalization;

use crate::types::TextPreprocessorOutput;

const PIPE: u16 = b'|' as u16;
const ASCII_MAX: u16 = 126;

/// Settings for a [`TextPreprocessor`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TextPreprocessorOptions {
    /// Base letter mapped to the characters typed in its place
    pub leet_speak: BTreeMap<String, Vec<String>>,
    /// Base text mapped to lookalike characters. A base of several letters
    /// expands a single lookalike into several writes.
    pub confusables: BTreeMap<String, Vec<String>>,
    pub max_character_run_length: usize,
    pub max_character_run_length_overrides: BTreeMap<String, usize>,
    pub max_whitespace_run_length: usize,
    pub max_symbol_run_length: usize,
    /// Characters written as whitespace. `None` uses Unicode `White_Space`.
    pub whitespace_characters: Option<Vec<char>>,
    /// Characters always written as symbols
    pub symbol_characters: Vec<char>,
    /// Characters always dropped
    pub blank_characters: Vec<char>,
}

impl Default for TextPreprocessorOptions {
    fn default() -> Self {
        let limits = RunLengthLimits::default();
        Self {
            leet_speak: dictionaries::default_leet_speak(),
            confusables: dictionaries::default_confusables(),
            max_character_run_length: limits.character,
            max_character_run_length_overrides: BTreeMap::new(),
            max_whitespace_run_length: limits.whitespace,
            max_symbol_run_length: limits.symbol,
            whitespace_characters: None,
            symbol_characters: Vec::new(),
            blank_characters: Vec::new(),
        }
    }
}

/// Lookup tables built once from the options
#[derive(Debug, Clone, Default)]
struct CharacterTables {
    leet_speak: HashMap<char, char>,
    confusables: HashMap<char, char>,
    multi_confusables: HashMap<char, Vec<char>>,
    whitespace: Option<HashSet<char>>,
    symbols: HashSet<char>,
    blanks: HashSet<char>,
}

impl CharacterTables {
    fn build(options: &TextPreprocessorOptions) -> Self {
        let mut tables = Self {
            whitespace: options
                .whitespace_characters
                .as_ref()
                .map(|chars| chars.iter().copied().collect()),
            symbols: options.symbol_characters.iter().copied().collect(),
            blanks: options.blank_characters.iter().copied().collect(),
            ..Self::default()
        };

        for (base, aliases) in &options.leet_speak {
            let Some(base_char) = single_char(base) else {
                warn!("Skipping leet-speak entry '{}': base must be a single character", base);
                continue;
            };
            let base_char = lowercase(base_char);
            for alias in aliases {
                match single_char(alias) {
                    Some(alias) => {
                        tables.leet_speak.insert(alias, base_char);
                    }
                    None => warn!("Skipping leet-speak alias '{}' for '{}': not a single character", alias, base),
                }
            }
        }

        for (base, aliases) in &options.confusables {
            let base_chars: Vec<char> = base.chars().flat_map(char::to_lowercase).collect();
            if base_chars.is_empty() {
                warn!("Skipping confusable entry with an empty base");
                continue;
            }
            for alias in aliases {
                let Some(alias_char) = single_char(alias) else {
                    warn!("Skipping confusable alias '{}' for '{}': not a single character", alias, base);
                    continue;
                };
                let alias_char = lowercase(alias_char);
                if let [single] = base_chars.as_slice() {
                    tables.confusables.insert(alias_char, *single);
                    tables.multi_confusables.remove(&alias_char);
                } else {
                    tables.multi_confusables.insert(alias_char, base_chars.clone());
                    tables.confusables.remove(&alias_char);
                }
            }
        }

        debug!(
            "Built preprocessor tables: {} leet-speak, {} confusable, {} multi-character confusable",
            tables.leet_speak.len(),
            tables.confusables.len(),
            tables.multi_confusables.len()
        );
        tables
    }

    fn is_whitespace(&self, c: char) -> bool {
        match &self.whitespace {
            Some(set) => set.contains(&c),
            None => c.is_whitespace(),
        }
    }

    /// Classifies an ASCII character other than `|`.
    fn write_ascii(&self, writer: &mut PreprocessorOutputWriter, byte: u8, index: usize) {
        // Sets the lowercase bit on A-Z only.
        let byte = if byte.is_ascii_uppercase() { byte | 0x20 } else { byte };
        let c = char::from(byte);

        if self.blanks.contains(&c) {
            return;
        }
        if self.symbols.contains(&c) {
            writer.write_symbol(index);
        } else if byte.is_ascii_lowercase() {
            writer.write_alphanumeric(c, index);
        } else if let Some(&base) = self.leet_speak.get(&c) {
            writer.write_alphanumeric(base, index);
        } else if self.is_whitespace(c) {
            writer.write_whitespace(index);
        } else {
            writer.write_symbol(index);
        }
    }

    fn write_code_point(&self, writer: &mut PreprocessorOutputWriter, code_point: u32, index: usize) {
        // Unpaired surrogates.
        let Some(c) = char::from_u32(code_point) else {
            writer.write_symbol(index);
            return;
        };
        let c = lowercase(c);

        if self.blanks.contains(&c) {
            return;
        }
        if self.symbols.contains(&c) {
            writer.write_symbol(index);
        } else if c.is_ascii_lowercase() {
            writer.write_alphanumeric(c, index);
        } else if let Some(&base) = self.confusables.get(&c) {
            writer.write_alphanumeric(base, index);
        } else if let Some(bases) = self.multi_confusables.get(&c) {
            for &base in bases {
                writer.write_alphanumeric(base, index);
            }
        } else if let Some(&base) = self.leet_speak.get(&c) {
            writer.write_alphanumeric(base, index);
        } else if self.is_whitespace(c) {
            writer.write_whitespace(index);
        } else if !is_dropped_category(c) {
            writer.write_symbol(index);
        }
    }
}

/// Control, format and combining mark characters produce no output at all.
fn is_dropped_category(c: char) -> bool {
    matches!(
        get_general_category(c),
        GeneralCategory::Control
            | GeneralCategory::Format
            | GeneralCategory::NonspacingMark
            | GeneralCategory::SpacingMark
            | GeneralCategory::EnclosingMark
    )
}

fn single_char(s: &str) -> Option<char> {
    let mut chars = s.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) => Some(c),
        _ => None,
    }
}

/// Lowercases `c` when the lowercase form is a single character.
fn lowercase(c: char) -> char {
    let mut lower = c.to_lowercase();
    match (lower.next(), lower.next()) {
        (Some(l), None) => l,
        _ => c,
    }
}

/// Normalizes chat messages into the integer form moderation filters match on.
///
/// Each run applies NFKD, trims the result and then walks it once. Plain ASCII
/// takes a cheap path; the first character outside it (or a `|`, which reads
/// as an `l`) switches to full Unicode handling for the rest of the text.
/// Recorded indices are UTF-16 offsets into the NFKD form of the untrimmed
/// input, so leading whitespace still counts.
///
/// Whitespace is checked before general categories, so `\n`, `\t` and `\r`
/// become whitespace separators on both paths even though they are control
/// characters. Other control, format and mark characters are dropped.
///
/// ```
/// use textpipe::preprocessor::{TextPreprocessor, TextPreprocessorOptions};
///
/// let mut preprocessor = TextPreprocessor::new(&TextPreprocessorOptions::default());
/// let output = preprocessor.run("H3LLLLLO   w\u{03BF}rld??");
/// assert_eq!(output.to_display_string(), "helllo world_");
/// ```
#[derive(Debug, Clone)]
pub struct TextPreprocessor {
    tables: CharacterTables,
    writer: PreprocessorOutputWriter,
    iterator: CharacterIterator,
}

impl TextPreprocessor {
    pub fn new(options: &TextPreprocessorOptions) -> Self {
        let mut character_overrides = HashMap::new();
        for (c, &limit) in &options.max_character_run_length_overrides {
            match single_char(c) {
                Some(c) => {
                    character_overrides.insert(lowercase(c), limit);
                }
                None => warn!("Skipping run length override for '{}': not a single character", c),
            }
        }

        let limits = RunLengthLimits {
            character: options.max_character_run_length,
            character_overrides,
            whitespace: options.max_whitespace_run_length,
            symbol: options.max_symbol_run_length,
        };

        Self {
            tables: CharacterTables::build(options),
            writer: PreprocessorOutputWriter::new(limits),
            iterator: CharacterIterator::new(),
        }
    }

    /// Normalizes `input`, replacing the previous run's output.
    pub fn run(&mut self, input: &str) -> &TextPreprocessorOutput {
        self.writer.reset();

        let normalized: String = input.nfkd().collect();
        let text = normalized.trim_start();
        // Indices count from the untrimmed text.
        let offset = normalized[..normalized.len() - text.len()].encode_utf16().count();
        self.iterator.set_text(text.trim_end());

        let units = self.iterator.units();
        let mut index = 0;
        while index < units.len() {
            let unit = units[index];
            if unit > ASCII_MAX || unit == PIPE {
                break;
            }
            self.tables.write_ascii(&mut self.writer, unit as u8, offset + index);
            index += 1;
        }

        let fast_path_units = index;
        if index < units.len() {
            self.iterator.set_position(index);
            loop {
                let index = self.iterator.position();
                let Some(code_point) = self.iterator.next() else {
                    break;
                };
                self.tables.write_code_point(&mut self.writer, code_point, offset + index);
            }
        }

        debug!(
            "Preprocessed {} code units ({} on the ASCII path) into {} characters",
            self.iterator.units().len(),
            fast_path_units,
            self.writer.output().len()
        );
        self.writer.output()
    }

    /// The output of the last run.
    pub fn output(&self) -> &TextPreprocessorOutput {
        self.writer.output()
    }

    pub fn limits(&self) -> &RunLengthLimits {
        self.writer.limits()
    }
}

impl Default for TextPreprocessor {
    fn default() -> Self {
        Self::new(&TextPreprocessorOptions::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{SYMBOL, WHITESPACE};

    fn run(input: &str) -> TextPreprocessorOutput {
        TextPreprocessor::default().run(input).clone()
    }

    fn plain_options() -> TextPreprocessorOptions {
        TextPreprocessorOptions {
            leet_speak: BTreeMap::new(),
            confusables: BTreeMap::new(),
            ..Default::default()
        }
    }

    #[test]
    fn test_ascii_case_folding() {
        let output = run("Hello World");
        assert_eq!(output.to_display_string(), "hello world");
        assert_eq!(output.original_indices, (0..11).collect::<Vec<_>>());
    }

    #[test]
    fn test_input_is_trimmed() {
        let output = run("  hi  ");
        assert_eq!(output.to_display_string(), "hi");
        assert_eq!(output.original_indices, [2, 3]);
    }

    #[test]
    fn test_leading_whitespace_keeps_source_offsets() {
        let output = run("   bad");
        assert_eq!(output.to_display_string(), "bad");
        assert_eq!(output.original_indices, [3, 4, 5]);

        // The slow path is shifted the same way.
        let output = run("\u{2003}\t\u{043E}k");
        assert_eq!(output.to_display_string(), "ok");
        assert_eq!(output.original_indices, [2, 3]);
    }

    #[test]
    fn test_empty_input() {
        assert!(run("").is_empty());
        assert!(run("   ").is_empty());
    }

    #[test]
    fn test_leet_speak() {
        assert_eq!(run("h3ll0 w0rld").to_display_string(), "hello world");
        assert_eq!(run("$1ck").to_display_string(), "sick");
        // Digits without a mapping are separators.
        assert_eq!(run("a2b").characters, ['a' as i32, SYMBOL, 'b' as i32]);
    }

    #[test]
    fn test_repeated_letters_are_capped() {
        let mut options = TextPreprocessorOptions::default();
        options.max_character_run_length = 3;
        let mut preprocessor = TextPreprocessor::new(&options);

        let output = preprocessor.run(&"a".repeat(50));
        assert_eq!(output.characters, ['a' as i32; 3]);
        assert_eq!(output.original_indices, [0, 1, 2]);
    }

    #[test]
    fn test_run_length_overrides() {
        let mut options = TextPreprocessorOptions::default();
        options.max_character_run_length_overrides.insert("O".to_string(), 1);
        let mut preprocessor = TextPreprocessor::new(&options);
        assert_eq!(preprocessor.run("gooooal").to_display_string(), "goal");
    }

    #[test]
    fn test_whitespace_and_symbol_runs() {
        let output = run("a   b???c");
        assert_eq!(
            output.characters,
            ['a' as i32, WHITESPACE, 'b' as i32, SYMBOL, 'c' as i32]
        );
        assert_eq!(output.original_indices, [0, 1, 4, 5, 8]);
        assert_eq!(output.word_boundary_start_indices, [1, 3]);
        assert_eq!(output.word_boundary_end_indices, [2, 4]);
    }

    #[test]
    fn test_pipe_folds_to_l() {
        let piped = run("he||o");
        let plain = run("hello");
        assert_eq!(piped.characters, plain.characters);
        assert_eq!(piped.original_indices, plain.original_indices);
    }

    #[test]
    fn test_confusables_fold_to_base_letter() {
        // Cyrillic small palochka and Cyrillic o.
        let output = run("he\u{04CF}\u{04CF}\u{043E}");
        assert_eq!(output.to_display_string(), "hello");

        // Uppercase lookalikes are lowercased first.
        assert_eq!(run("\u{0421}\u{0410}T").to_display_string(), "cat");
    }

    #[test]
    fn test_ligature_expands_in_place() {
        let output = run("\u{00E6}on");
        assert_eq!(output.to_display_string(), "aeon");
        assert_eq!(output.original_indices, [0, 0, 1, 2]);
    }

    #[test]
    fn test_combining_marks_are_dropped() {
        // NFKD splits é into e and a combining acute accent.
        let output = run("caf\u{00E9}");
        assert_eq!(output.to_display_string(), "cafe");
        assert_eq!(output.original_indices, [0, 1, 2, 3]);
    }

    #[test]
    fn test_zero_width_joiners_are_dropped() {
        let output = run("b\u{200D}a\u{200D}d");
        assert_eq!(output.to_display_string(), "bad");
        assert_eq!(output.original_indices, [0, 2, 4]);

        // They do not break a run either.
        let output = run("a\u{200D}a\u{200D}a\u{200D}a\u{200D}a");
        assert_eq!(output.to_display_string(), "aaa");
    }

    #[test]
    fn test_compatibility_forms_are_decomposed() {
        assert_eq!(run("\u{FF28}\u{FF29}").to_display_string(), "hi");
        assert_eq!(run("\u{FB01}ne").to_display_string(), "fine");
    }

    #[test]
    fn test_astral_characters_use_utf16_offsets() {
        let output = run("a\u{1F389}b");
        assert_eq!(output.characters, ['a' as i32, SYMBOL, 'b' as i32]);
        assert_eq!(output.original_indices, [0, 1, 3]);
    }

    #[test]
    fn test_non_ascii_whitespace() {
        let output = run("a\u{2028}b\u{1680}c");
        assert_eq!(output.characters, ['a' as i32, WHITESPACE, 'b' as i32, WHITESPACE, 'c' as i32]);
    }

    #[test]
    fn test_newlines_are_whitespace_on_both_paths() {
        assert_eq!(run("a\nb").characters, ['a' as i32, WHITESPACE, 'b' as i32]);
        assert_eq!(run("\u{00E9}\nb").characters, ['e' as i32, WHITESPACE, 'b' as i32]);
    }

    #[test]
    fn test_other_control_characters_are_dropped() {
        let output = run("\u{00E9}\u{0007}b\u{001B}c");
        assert_eq!(output.to_display_string(), "ebc");
        assert_eq!(output.original_indices, [0, 3, 5]);
    }

    #[test]
    fn test_custom_character_sets() {
        let mut options = plain_options();
        options.symbol_characters = vec!['x'];
        options.blank_characters = vec!['-', '\u{00B7}'];
        options.whitespace_characters = Some(vec!['_']);
        let mut preprocessor = TextPreprocessor::new(&options);

        let output = preprocessor.run("a-b\u{00B7}c_d e x");
        assert_eq!(
            output.characters,
            [
                'a' as i32, 'b' as i32, 'c' as i32, WHITESPACE, 'd' as i32, SYMBOL, 'e' as i32, SYMBOL,
            ]
        );
    }

    #[test]
    fn test_plain_options_skip_substitutions() {
        let mut preprocessor = TextPreprocessor::new(&plain_options());
        // Unmapped characters all land in one symbol run.
        assert_eq!(preprocessor.run("h3||\u{043E}").characters, ['h' as i32, SYMBOL]);
    }

    #[test]
    fn test_invalid_dictionary_entries_are_skipped() {
        let mut options = plain_options();
        options.leet_speak.insert("ab".to_string(), vec!["4".to_string()]);
        options.leet_speak.insert("e".to_string(), vec!["33".to_string(), "3".to_string()]);
        options.confusables.insert("l".to_string(), vec!["||".to_string()]);
        let mut preprocessor = TextPreprocessor::new(&options);

        assert_eq!(preprocessor.run("43").characters, [SYMBOL, 'e' as i32]);
        assert_eq!(preprocessor.run("|").characters, [SYMBOL]);
    }

    #[test]
    fn test_preprocessor_is_reusable() {
        let mut preprocessor = TextPreprocessor::default();
        preprocessor.run("first message with words");
        let output = preprocessor.run("ok");
        assert_eq!(output.to_display_string(), "ok");
        assert!(output.word_boundary_start_indices.is_empty());
        assert_eq!(preprocessor.output().len(), 2);
    }
}
