/// Decodes UTF-16 code units into Unicode scalar values.
///
/// A high surrogate followed by a low surrogate is combined into one value.
/// Any other unit, unpaired surrogates included, comes out as itself.
#[derive(Debug, Clone, Default)]
pub struct CharacterIterator {
    units: Vec<u16>,
    position: usize,
}

impl CharacterIterator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the text and moves back to the start.
    pub fn set_text(&mut self, text: &str) -> &mut Self {
        self.units.clear();
        self.units.extend(text.encode_utf16());
        self.reset()
    }

    /// Replaces the text with raw code units, which may hold unpaired surrogates.
    #[cfg(test)]
    pub(crate) fn set_units(&mut self, units: Vec<u16>) -> &mut Self {
        self.units = units;
        self.reset()
    }

    pub fn units(&self) -> &[u16] {
        &self.units
    }

    /// Moves to a code unit offset.
    pub fn set_position(&mut self, position: usize) -> &mut Self {
        self.position = position;
        self
    }

    /// Current offset in code units.
    pub fn position(&self) -> usize {
        self.position
    }

    pub fn reset(&mut self) -> &mut Self {
        self.position = 0;
        self
    }

    pub fn is_done(&self) -> bool {
        self.position >= self.units.len()
    }
}

impl Iterator for CharacterIterator {
    type Item = u32;

    fn next(&mut self) -> Option<u32> {
        if self.is_done() {
            return None;
        }

        let unit = self.units[self.position];
        if is_high_surrogate(unit) {
            if let Some(&next) = self.units.get(self.position + 1) {
                if is_low_surrogate(next) {
                    self.position += 2;
                    let code_point = (u32::from(unit) - 0xD800) * 0x400 + (u32::from(next) - 0xDC00) + 0x10000;
                    return Some(code_point);
                }
            }
        }

        self.position += 1;
        Some(u32::from(unit))
    }
}

fn is_high_surrogate(unit: u16) -> bool {
    (0xD800..=0xDBFF).contains(&unit)
}

fn is_low_surrogate(unit: u16) -> bool {
    (0xDC00..=0xDFFF).contains(&unit)
}
