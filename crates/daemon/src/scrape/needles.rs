// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Byte-boundary-safe pattern matching.
//!
//! Terminal output arrives in arbitrary chunks, so a needle can straddle
//! two reads. The rolling tail keeps the last bytes of everything seen and
//! prepends them to each chunk before scanning.

/// Covers the longest prompt needle plus interleaved escape sequences.
pub const TAIL_CAP: usize = 256;

/// Rolling tail of previously seen bytes.
pub struct RollingTail {
    tail: Vec<u8>,
    cap: usize,
}

impl RollingTail {
    pub fn new(cap: usize) -> Self {
        Self { tail: Vec::with_capacity(cap), cap }
    }

    /// Concatenate the retained tail with `chunk` for scanning, then retain
    /// the last `cap` bytes of the combination.
    pub fn absorb(&mut self, chunk: &[u8]) -> Vec<u8> {
        let mut combined = Vec::with_capacity(self.tail.len() + chunk.len());
        combined.extend_from_slice(&self.tail);
        combined.extend_from_slice(chunk);

        let keep_from = combined.len().saturating_sub(self.cap);
        self.tail.clear();
        self.tail.extend_from_slice(&combined[keep_from..]);
        combined
    }
}

impl Default for RollingTail {
    fn default() -> Self {
        Self::new(TAIL_CAP)
    }
}

/// Case-insensitive needle search on ANSI-stripped text.
pub fn text_contains(window: &[u8], needle: &str) -> bool {
    let text = crate::probe::parse::strip_ansi(window).to_lowercase();
    text.contains(&needle.to_lowercase())
}
