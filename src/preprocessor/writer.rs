use std::collections::HashMap;

use crate::types::{TextPreprocessorOutput, SYMBOL, WHITESPACE};

/// Caps on how many times in a row each kind of output may repeat
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunLengthLimits {
    /// Repeats of the same alphanumeric character
    pub character: usize,
    /// Per-character replacements for `character`
    pub character_overrides: HashMap<char, usize>,
    pub whitespace: usize,
    pub symbol: usize,
}

impl Default for RunLengthLimits {
    fn default() -> Self {
        Self {
            character: 3,
            character_overrides: HashMap::new(),
            whitespace: 1,
            symbol: 1,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Run {
    Character(char),
    Whitespace,
    Symbol,
}

/// Builds a [`TextPreprocessorOutput`] one classified character at a time.
///
/// Runs of the same output are cut off once they hit their limit, so a
/// message of ten thousand `a`s costs no more than three. Skipped writes keep
/// the run going: only a different character or category starts a new one.
#[derive(Debug, Clone, Default)]
pub struct PreprocessorOutputWriter {
    output: TextPreprocessorOutput,
    limits: RunLengthLimits,

    run: Option<Run>,
    remaining: usize,
    last_written_alphanumeric: bool,
    pending_boundary: Option<usize>,
}

impl PreprocessorOutputWriter {
    pub fn new(limits: RunLengthLimits) -> Self {
        Self {
            limits,
            ..Self::default()
        }
    }

    pub fn limits(&self) -> &RunLengthLimits {
        &self.limits
    }

    pub fn output(&self) -> &TextPreprocessorOutput {
        &self.output
    }

    pub fn into_output(self) -> TextPreprocessorOutput {
        self.output
    }

    /// Clears the output and all run state.
    pub fn reset(&mut self) {
        self.output = TextPreprocessorOutput::new();
        self.run = None;
        self.remaining = 0;
        self.last_written_alphanumeric = false;
        self.pending_boundary = None;
    }

    /// Writes a letter. Returns `false` if the run limit suppressed it.
    pub fn write_alphanumeric(&mut self, c: char, index: usize) -> bool {
        let limit = self
            .limits
            .character_overrides
            .get(&c)
            .copied()
            .unwrap_or(self.limits.character);
        if !self.take_budget(Run::Character(c), limit) {
            return false;
        }

        let position = self.output.characters.len();
        if let Some(start) = self.pending_boundary.take() {
            self.output.word_boundary_start_indices.push(start);
            self.output.word_boundary_end_indices.push(position);
        }

        self.push(c as i32, index);
        self.last_written_alphanumeric = true;
        true
    }

    pub fn write_whitespace(&mut self, index: usize) -> bool {
        self.write_separator(Run::Whitespace, self.limits.whitespace, WHITESPACE, index)
    }

    pub fn write_symbol(&mut self, index: usize) -> bool {
        self.write_separator(Run::Symbol, self.limits.symbol, SYMBOL, index)
    }

    fn write_separator(&mut self, run: Run, limit: usize, sentinel: i32, index: usize) -> bool {
        if !self.take_budget(run, limit) {
            return false;
        }

        if self.last_written_alphanumeric {
            self.pending_boundary = Some(self.output.characters.len());
        }

        self.push(sentinel, index);
        self.last_written_alphanumeric = false;
        true
    }

    fn take_budget(&mut self, run: Run, limit: usize) -> bool {
        if self.run != Some(run) {
            self.run = Some(run);
            self.remaining = limit;
        }

        if self.remaining == 0 {
            return false;
        }
        self.remaining -= 1;
        true
    }

    fn push(&mut self, value: i32, index: usize) {
        self.output.characters.push(value);
        self.output.original_indices.push(index);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn writer() -> PreprocessorOutputWriter {
        PreprocessorOutputWriter::new(RunLengthLimits::default())
    }

    #[test]
    fn test_character_run_is_capped() {
        let mut writer = writer();
        for i in 0..50 {
            writer.write_alphanumeric('a', i);
        }
        assert_eq!(writer.output().characters, ['a' as i32; 3]);
        assert_eq!(writer.output().original_indices, [0, 1, 2]);
    }

    #[test]
    fn test_different_character_starts_new_run() {
        let mut writer = writer();
        for (i, c) in "aaaabbbbaaaa".chars().enumerate() {
            writer.write_alphanumeric(c, i);
        }
        assert_eq!(writer.output().to_display_string(), "aaabbbaaa");
        assert_eq!(writer.output().original_indices, [0, 1, 2, 4, 5, 6, 8, 9, 10]);
    }

    #[test]
    fn test_character_overrides() {
        let mut limits = RunLengthLimits::default();
        limits.character_overrides.insert('o', 1);
        let mut writer = PreprocessorOutputWriter::new(limits);
        for (i, c) in "gooood".chars().enumerate() {
            writer.write_alphanumeric(c, i);
        }
        assert_eq!(writer.output().to_display_string(), "god");
    }

    #[test]
    fn test_separator_runs_are_capped() {
        let mut writer = writer();
        writer.write_alphanumeric('a', 0);
        writer.write_whitespace(1);
        writer.write_whitespace(2);
        assert!(!writer.write_whitespace(3));
        writer.write_symbol(4);
        assert!(!writer.write_symbol(5));
        writer.write_alphanumeric('b', 6);

        assert_eq!(writer.output().characters, ['a' as i32, WHITESPACE, SYMBOL, 'b' as i32]);
        assert_eq!(writer.output().original_indices, [0, 1, 4, 6]);
    }

    #[test]
    fn test_word_boundaries() {
        let mut writer = writer();
        writer.write_alphanumeric('h', 0);
        writer.write_alphanumeric('i', 1);
        writer.write_symbol(2);
        writer.write_whitespace(3);
        writer.write_alphanumeric('y', 4);
        writer.write_alphanumeric('o', 5);
        writer.write_whitespace(6);

        let output = writer.output();
        assert_eq!(output.to_display_string(), "hi_ yo ");
        assert_eq!(output.word_boundary_start_indices, [2]);
        assert_eq!(output.word_boundary_end_indices, [4]);
    }

    #[test]
    fn test_leading_separators_open_no_boundary() {
        let mut writer = writer();
        writer.write_whitespace(0);
        writer.write_alphanumeric('a', 1);
        assert!(writer.output().word_boundary_start_indices.is_empty());
    }

    #[test]
    fn test_reset() {
        let mut writer = writer();
        writer.write_alphanumeric('a', 0);
        writer.write_alphanumeric('a', 1);
        writer.write_alphanumeric('a', 2);
        writer.write_whitespace(3);
        writer.reset();
        assert!(writer.output().is_empty());

        // The run budget starts over too.
        writer.write_alphanumeric('a', 0);
        writer.write_alphanumeric('a', 1);
        writer.write_alphanumeric('a', 2);
        assert_eq!(writer.into_output().len(), 3);
    }
}
