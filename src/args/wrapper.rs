use std::future::Future;

use crate::args::bitset::BitSet;
use crate::types::{ParserOutput, Token};

/// Options for [`ParserOutputWrapper::retrieve_many`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RetrieveManyOptions {
    /// Scan from the end toward the start
    pub from_end: bool,
    /// Maximum number of tokens; `None` is unbounded
    pub limit: Option<usize>,
    /// Where to start scanning; defaults to the cursor of the scan direction
    pub start_position: Option<usize>,
}

/// Options for the combinators that transform many tokens
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TransformOptions {
    /// Mark tokens as used even when the transform fails
    pub always_use: bool,
    /// Maximum number of successful values; `None` is unbounded
    pub limit: Option<usize>,
    /// Where to start scanning; defaults to the forward cursor
    pub start_position: Option<usize>,
}

/// Options for `find_map` and `find_parse`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FindOptions {
    pub always_use: bool,
    pub start_position: Option<usize>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct WrapperState {
    used: BitSet,
    /// Forward cursor. Every index below it is used.
    position: usize,
    /// One past the backward cursor. Every index at or above it is used.
    back: usize,
}

/// A cursor over a finished [`ParserOutput`].
///
/// Ordered tokens can be consumed from either end. Every token is handed out
/// at most once: an index claimed by any operation is skipped by all later
/// ones. `save` and `reset` give a single level of checkpointing so argument
/// binding can try an interpretation and roll it back.
///
/// All consuming operations take `&mut self`; the async variants still finish
/// awaiting each transform before looking at the next token.
#[derive(Debug, Clone)]
pub struct ParserOutputWrapper {
    output: ParserOutput,
    state: WrapperState,
    saved: Option<WrapperState>,
}

impl ParserOutputWrapper {
    pub fn new(output: ParserOutput) -> Self {
        let len = output.ordered.len();
        Self {
            output,
            state: WrapperState {
                used: BitSet::with_capacity(len),
                position: 0,
                back: len,
            },
            saved: None,
        }
    }

    pub fn parser_output(&self) -> &ParserOutput {
        &self.output
    }

    pub fn into_parser_output(self) -> ParserOutput {
        self.output
    }

    /// Total number of ordered tokens, used or not.
    pub fn len(&self) -> usize {
        self.output.ordered.len()
    }

    pub fn is_empty(&self) -> bool {
        self.output.ordered.is_empty()
    }

    /// Whether every ordered token has been used.
    pub fn is_done(&self) -> bool {
        self.state.used.len() >= self.len()
    }

    /// Number of ordered tokens not yet used.
    pub fn remaining(&self) -> usize {
        self.len() - self.state.used.len()
    }

    /// The forward cursor.
    pub fn position(&self) -> usize {
        self.state.position
    }

    /// The backward cursor, or `None` once it has moved past the first token.
    pub fn position_from_end(&self) -> Option<usize> {
        self.state.back.checked_sub(1)
    }

    pub fn is_used(&self, position: usize) -> bool {
        self.state.used.contains(position)
    }

    pub fn has_flag(&self, id: &str) -> bool {
        self.output.flags.contains(id)
    }

    /// The last value given for an option.
    pub fn get_option(&self, id: &str) -> Option<&str> {
        self.get_option_all(id)
            .and_then(|values| values.last())
            .map(String::as_str)
    }

    /// Every value given for an option, in input order.
    pub fn get_option_all(&self, id: &str) -> Option<&[String]> {
        self.output
            .options
            .get(id)
            .filter(|values| !values.is_empty())
            .map(Vec::as_slice)
    }

    /// Takes the value of the next unused token from the requested end.
    pub fn next_ordered(&mut self, from_end: bool) -> Option<&str> {
        if self.is_done() {
            return None;
        }

        let index = if from_end {
            let index = self.next_unused_backward()?;
            self.mark_as_used(index);
            self.state.back = index;
            index
        } else {
            let index = self.next_unused_forward()?;
            self.claim_forward(index);
            index
        };

        Some(&self.output.ordered[index].value)
    }

    /// Takes up to `limit` unused tokens, scanning from `start_position`
    /// toward the end of the scan direction.
    ///
    /// The tokens are returned in their original order even when scanning
    /// from the end.
    pub fn retrieve_many(&mut self, options: RetrieveManyOptions) -> Vec<Token> {
        let limit = options.limit.unwrap_or(usize::MAX);
        if self.is_done() || limit == 0 {
            return Vec::new();
        }

        let mut tokens = Vec::new();
        if options.from_end {
            let start = match options.start_position {
                Some(start) => start.min(self.len() - 1),
                None => match self.position_from_end() {
                    Some(start) => start,
                    None => return tokens,
                },
            };

            for i in (0..=start).rev() {
                if self.state.used.contains(i) {
                    continue;
                }
                self.mark_as_used(i);
                tokens.push(self.output.ordered[i].clone());
                if tokens.len() == limit {
                    break;
                }
            }

            // Collected back to front.
            tokens.reverse();
            return tokens;
        }

        let start = options.start_position.unwrap_or(self.state.position);
        for i in start..self.len() {
            if self.state.used.contains(i) {
                continue;
            }
            self.mark_as_used(i);
            tokens.push(self.output.ordered[i].clone());
            if tokens.len() == limit {
                break;
            }
        }
        tokens
    }

    /// Applies `f` to the next unused token.
    ///
    /// The token is used, and the forward cursor moves past it, only if `f`
    /// returns `Some` or `always_use` is set. Returns `None` when no tokens
    /// are left.
    pub fn map_next<T, F>(&mut self, f: F, always_use: bool) -> Option<Option<T>>
    where
        F: FnOnce(&str) -> Option<T>,
    {
        let index = self.next_unused_forward()?;
        let result = f(&self.output.ordered[index].value);
        if always_use || result.is_some() {
            self.claim_forward(index);
        }
        Some(result)
    }

    pub async fn map_next_async<T, F, Fut>(&mut self, f: F, always_use: bool) -> Option<Option<T>>
    where
        F: FnOnce(String) -> Fut,
        Fut: Future<Output = Option<T>>,
    {
        let index = self.next_unused_forward()?;
        let result = f(self.output.ordered[index].value.clone()).await;
        if always_use || result.is_some() {
            self.claim_forward(index);
        }
        Some(result)
    }

    /// Like [`map_next`](Self::map_next) for transforms that report an error.
    pub fn parse_next<T, E, F>(&mut self, f: F, always_use: bool) -> Option<Result<T, E>>
    where
        F: FnOnce(&str) -> Result<T, E>,
    {
        let index = self.next_unused_forward()?;
        let result = f(&self.output.ordered[index].value);
        if always_use || result.is_ok() {
            self.claim_forward(index);
        }
        Some(result)
    }

    pub async fn parse_next_async<T, E, F, Fut>(&mut self, f: F, always_use: bool) -> Option<Result<T, E>>
    where
        F: FnOnce(String) -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        let index = self.next_unused_forward()?;
        let result = f(self.output.ordered[index].value.clone()).await;
        if always_use || result.is_ok() {
            self.claim_forward(index);
        }
        Some(result)
    }

    /// Transforms unused tokens from the start position until one fails.
    ///
    /// The failing token stays unused unless `always_use` is set. The forward
    /// cursor does not move.
    pub fn map_while<T, F>(&mut self, mut f: F, options: TransformOptions) -> Vec<T>
    where
        F: FnMut(&str) -> Option<T>,
    {
        let mut mapped = Vec::new();
        let limit = options.limit.unwrap_or(usize::MAX);
        if self.is_done() || limit == 0 {
            return mapped;
        }

        let start = options.start_position.unwrap_or(self.state.position);
        for i in start..self.len() {
            if self.state.used.contains(i) {
                continue;
            }

            let result = f(&self.output.ordered[i].value);
            if options.always_use || result.is_some() {
                self.mark_as_used(i);
            }
            let Some(value) = result else {
                return mapped;
            };

            mapped.push(value);
            if mapped.len() == limit {
                break;
            }
        }
        mapped
    }

    pub async fn map_while_async<T, F, Fut>(&mut self, mut f: F, options: TransformOptions) -> Vec<T>
    where
        F: FnMut(String) -> Fut,
        Fut: Future<Output = Option<T>>,
    {
        let mut mapped = Vec::new();
        let limit = options.limit.unwrap_or(usize::MAX);
        if self.is_done() || limit == 0 {
            return mapped;
        }

        let start = options.start_position.unwrap_or(self.state.position);
        for i in start..self.len() {
            if self.state.used.contains(i) {
                continue;
            }

            let result = f(self.output.ordered[i].value.clone()).await;
            if options.always_use || result.is_some() {
                self.mark_as_used(i);
            }
            let Some(value) = result else {
                return mapped;
            };

            mapped.push(value);
            if mapped.len() == limit {
                break;
            }
        }
        mapped
    }

    /// Returns the first unused token that `f` transforms successfully.
    pub fn find_map<T, F>(&mut self, mut f: F, options: FindOptions) -> Option<T>
    where
        F: FnMut(&str) -> Option<T>,
    {
        if self.is_done() {
            return None;
        }

        let start = options.start_position.unwrap_or(self.state.position);
        for i in start..self.len() {
            if self.state.used.contains(i) {
                continue;
            }

            let result = f(&self.output.ordered[i].value);
            if options.always_use || result.is_some() {
                self.mark_as_used(i);
            }
            if result.is_some() {
                return result;
            }
        }
        None
    }

    pub async fn find_map_async<T, F, Fut>(&mut self, mut f: F, options: FindOptions) -> Option<T>
    where
        F: FnMut(String) -> Fut,
        Fut: Future<Output = Option<T>>,
    {
        if self.is_done() {
            return None;
        }

        let start = options.start_position.unwrap_or(self.state.position);
        for i in start..self.len() {
            if self.state.used.contains(i) {
                continue;
            }

            let result = f(self.output.ordered[i].value.clone()).await;
            if options.always_use || result.is_some() {
                self.mark_as_used(i);
            }
            if result.is_some() {
                return result;
            }
        }
        None
    }

    /// Returns the first unused token that `f` parses successfully, or every
    /// error met along the way, in scan order.
    pub fn find_parse<T, E, F>(&mut self, mut f: F, options: FindOptions) -> Result<T, Vec<E>>
    where
        F: FnMut(&str) -> Result<T, E>,
    {
        let mut errors = Vec::new();
        if self.is_done() {
            return Err(errors);
        }

        let start = options.start_position.unwrap_or(self.state.position);
        for i in start..self.len() {
            if self.state.used.contains(i) {
                continue;
            }

            let result = f(&self.output.ordered[i].value);
            if options.always_use || result.is_ok() {
                self.mark_as_used(i);
            }
            match result {
                Ok(value) => return Ok(value),
                Err(error) => errors.push(error),
            }
        }
        Err(errors)
    }

    pub async fn find_parse_async<T, E, F, Fut>(&mut self, mut f: F, options: FindOptions) -> Result<T, Vec<E>>
    where
        F: FnMut(String) -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        let mut errors = Vec::new();
        if self.is_done() {
            return Err(errors);
        }

        let start = options.start_position.unwrap_or(self.state.position);
        for i in start..self.len() {
            if self.state.used.contains(i) {
                continue;
            }

            let result = f(self.output.ordered[i].value.clone()).await;
            if options.always_use || result.is_ok() {
                self.mark_as_used(i);
            }
            match result {
                Ok(value) => return Ok(value),
                Err(error) => errors.push(error),
            }
        }
        Err(errors)
    }

    /// Collects every unused token that `f` transforms successfully, without
    /// stopping at failures.
    pub fn filter_map<T, F>(&mut self, mut f: F, options: TransformOptions) -> Vec<T>
    where
        F: FnMut(&str) -> Option<T>,
    {
        let mut values = Vec::new();
        let limit = options.limit.unwrap_or(usize::MAX);
        if self.is_done() || limit == 0 {
            return values;
        }

        let start = options.start_position.unwrap_or(self.state.position);
        for i in start..self.len() {
            if self.state.used.contains(i) {
                continue;
            }

            let result = f(&self.output.ordered[i].value);
            if options.always_use || result.is_some() {
                self.mark_as_used(i);
            }
            if let Some(value) = result {
                values.push(value);
                if values.len() == limit {
                    break;
                }
            }
        }
        values
    }

    pub async fn filter_map_async<T, F, Fut>(&mut self, mut f: F, options: TransformOptions) -> Vec<T>
    where
        F: FnMut(String) -> Fut,
        Fut: Future<Output = Option<T>>,
    {
        let mut values = Vec::new();
        let limit = options.limit.unwrap_or(usize::MAX);
        if self.is_done() || limit == 0 {
            return values;
        }

        let start = options.start_position.unwrap_or(self.state.position);
        for i in start..self.len() {
            if self.state.used.contains(i) {
                continue;
            }

            let result = f(self.output.ordered[i].value.clone()).await;
            if options.always_use || result.is_some() {
                self.mark_as_used(i);
            }
            if let Some(value) = result {
                values.push(value);
                if values.len() == limit {
                    break;
                }
            }
        }
        values
    }

    /// Marks an ordered index as used.
    ///
    /// # Panics
    ///
    /// Panics if `position` is not an index of the ordered tokens.
    pub fn mark_as_used(&mut self, position: usize) {
        assert!(
            position < self.len(),
            "cannot mark position {} as used: only {} ordered tokens",
            position,
            self.len()
        );
        self.state.used.insert(position);
    }

    /// Marks the token at the forward cursor as used.
    ///
    /// # Panics
    ///
    /// Panics if the forward cursor is already past the last token.
    pub fn mark_current_as_used(&mut self) {
        self.mark_as_used(self.state.position);
    }

    /// Saves the cursors and used indices, replacing any earlier save.
    pub fn save(&mut self) {
        self.saved = Some(self.state.clone());
    }

    /// Restores the last save and clears it. Does nothing without a save.
    pub fn reset(&mut self) {
        if let Some(state) = self.saved.take() {
            self.state = state;
        }
    }

    /// Whether a saved state is waiting to be restored.
    pub fn has_saved_state(&self) -> bool {
        self.saved.is_some()
    }

    /// Moves the forward cursor onto the next unused index.
    fn next_unused_forward(&mut self) -> Option<usize> {
        if self.is_done() {
            return None;
        }
        while self.state.position < self.len() && self.state.used.contains(self.state.position) {
            self.state.position += 1;
        }
        (self.state.position < self.len()).then_some(self.state.position)
    }

    /// Moves the backward cursor onto the next unused index.
    fn next_unused_backward(&mut self) -> Option<usize> {
        while self.state.back > 0 && self.state.used.contains(self.state.back - 1) {
            self.state.back -= 1;
        }
        self.state.back.checked_sub(1)
    }

    fn claim_forward(&mut self, index: usize) {
        self.mark_as_used(index);
        self.state.position = index + 1;
    }
}

impl From<ParserOutput> for ParserOutputWrapper {
    fn from(output: ParserOutput) -> Self {
        Self::new(output)
    }
}
