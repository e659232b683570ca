//! PDF signature byte ranges
//!
//! A detached PDF signature covers the entire file except the hex string
//! holding the signature itself. The covered region is stored in the
//! signature dictionary as `[offset1 length1 offset2 length2]`.

use std::ops::Range;

use crate::error::{SigningError, SigningResult};

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct ByteRange {
    values: [usize; 4],
}

impl ByteRange {
    pub fn new(values: [usize; 4]) -> Self {
        Self { values }
    }

    pub fn values(&self) -> &[usize; 4] {
        &self.values
    }

    fn first(&self) -> Range<usize> {
        self.values[0]..self.values[0] + self.values[1]
    }

    fn second(&self) -> Range<usize> {
        self.values[2]..self.values[2] + self.values[3]
    }

    /// Render the range as a space-separated list padded to exactly
    /// `fixed_width` characters.
    ///
    /// The rendered list is patched over a placeholder of the same width in
    /// the serialized PDF, so it must not exceed it.
    pub fn to_list(&self, fixed_width: usize) -> SigningResult<String> {
        let list = self
            .values
            .iter()
            .map(|v| v.to_string())
            .collect::<Vec<_>>()
            .join(" ");
        if list.len() > fixed_width {
            return Err(SigningError::SignatureGenerationFailed(format!(
                "Byte range `{}` does not fit in {} characters",
                list, fixed_width
            )));
        }
        Ok(format!("{}{}", list, " ".repeat(fixed_width - list.len())))
    }

    /// Concatenate the two covered regions of `data`.
    pub fn covered_bytes(&self, data: &[u8]) -> SigningResult<Vec<u8>> {
        let first = data.get(self.first()).ok_or_else(|| {
            SigningError::SignatureGenerationFailed(
                "Byte range start lies outside the document".to_string(),
            )
        })?;
        let second = data.get(self.second()).ok_or_else(|| {
            SigningError::SignatureGenerationFailed(
                "Byte range tail lies outside the document".to_string(),
            )
        })?;

        let mut covered = Vec::with_capacity(first.len() + second.len());
        covered.extend_from_slice(first);
        covered.extend_from_slice(second);
        Ok(covered)
    }
}
