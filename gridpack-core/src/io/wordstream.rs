// Gridpack
// Copyright (c) 2024 The Gridpack Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! An append-only stream of 32-bit words with an independent read index.
//!
//! The pipeline uses word streams to carry filter metadata and, for out-of-place forward runs,
//! the transformed payload itself.

use crate::errors::{capacity_error, decode_error, invalid_input_error, Result};

/// Marker carried by every valid word stream.
pub const WORDSTREAM_MARKER: u32 = 0xDEAD_BEEF;

/// An append-only 32-bit word stream.
#[derive(Clone, Debug)]
pub struct WordStream {
    buf: Vec<u32>,
    limit: usize,
    out: usize,
    can_realloc: bool,
    valid: u32,
}

impl WordStream {
    /// Create an empty stream holding at most `capacity` words. A stream created with
    /// `can_realloc` grows on demand; a fixed stream refuses writes past its capacity.
    pub fn new(capacity: usize, can_realloc: bool) -> WordStream {
        WordStream {
            buf: Vec::with_capacity(capacity),
            limit: capacity,
            out: 0,
            can_realloc,
            valid: WORDSTREAM_MARKER,
        }
    }

    /// Wrap existing words into a stream positioned for reading.
    pub fn from_words(words: Vec<u32>) -> WordStream {
        let limit = words.len();
        WordStream { buf: words, limit, out: 0, can_realloc: true, valid: WORDSTREAM_MARKER }
    }

    /// True when the stream carries the validity marker.
    pub fn is_valid(&self) -> bool {
        self.valid == WORDSTREAM_MARKER
    }

    /// Number of words appended so far.
    pub fn words_used(&self) -> usize {
        self.buf.len()
    }

    /// Number of words between the read index and the end of the stream.
    pub fn words_left(&self) -> usize {
        self.buf.len() - self.out
    }

    /// The words appended so far.
    pub fn as_words(&self) -> &[u32] {
        &self.buf
    }

    /// Append a single word.
    pub fn push(&mut self, word: u32) -> Result<()> {
        self.reserve(1)?;
        self.buf.push(word);
        Ok(())
    }

    /// Append a slice of words.
    pub fn insert(&mut self, words: &[u32]) -> Result<()> {
        self.reserve(words.len())?;
        self.buf.extend_from_slice(words);
        Ok(())
    }

    /// Read the next word, advancing the read index.
    pub fn read(&mut self) -> Result<u32> {
        if self.out >= self.buf.len() {
            return decode_error("wordstream: read past end of stream");
        }
        let w = self.buf[self.out];
        self.out += 1;
        Ok(w)
    }

    /// Read `n` words, advancing the read index.
    pub fn read_slice(&mut self, n: usize) -> Result<&[u32]> {
        if self.out + n > self.buf.len() {
            return decode_error("wordstream: read past end of stream");
        }
        let s = &self.buf[self.out..self.out + n];
        self.out += n;
        Ok(s)
    }

    /// Move the read index back to the start of the stream.
    pub fn rewind_read(&mut self) {
        self.out = 0;
    }

    /// Forget all contents and reset both indices.
    pub fn reset(&mut self) {
        self.buf.clear();
        self.out = 0;
    }

    /// Raise the capacity of a growable stream. Fixed streams refuse, as do shrink requests.
    pub fn resize(&mut self, capacity: usize) -> Result<()> {
        if !self.can_realloc {
            return invalid_input_error("wordstream: fixed stream cannot be resized");
        }
        if capacity < self.buf.len() {
            return invalid_input_error("wordstream: resize cannot shrink the stream");
        }
        self.limit = capacity;
        self.buf.reserve(capacity - self.buf.len());
        Ok(())
    }

    fn reserve(&mut self, n: usize) -> Result<()> {
        if self.buf.len() + n > self.limit {
            if !self.can_realloc {
                return capacity_error("wordstream: stream full");
            }
            self.limit = (self.buf.len() + n).max(self.limit * 2);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verify_append_then_read() {
        let mut ws = WordStream::new(16, false);
        ws.insert(&[1, 2, 3]).unwrap();
        ws.push(4).unwrap();
        assert_eq!(ws.words_used(), 4);
        assert_eq!(ws.words_left(), 4);
        assert_eq!(ws.read().unwrap(), 1);
        assert_eq!(ws.read_slice(2).unwrap(), &[2, 3]);
        assert_eq!(ws.read().unwrap(), 4);
        assert!(ws.read().is_err());

        ws.rewind_read();
        assert_eq!(ws.read().unwrap(), 1);

        ws.reset();
        assert_eq!(ws.words_used(), 0);
        assert!(ws.read().is_err());
    }

    #[test]
    fn verify_capacity_rules() {
        let mut ws = WordStream::new(2, false);
        ws.insert(&[1, 2]).unwrap();
        assert!(ws.push(3).is_err());
        assert!(ws.resize(8).is_err());

        let mut ws = WordStream::new(2, true);
        ws.insert(&[1, 2, 3, 4, 5]).unwrap();
        assert_eq!(ws.words_used(), 5);
        assert!(ws.resize(3).is_err());
        ws.resize(64).unwrap();
    }

    #[test]
    fn verify_from_words() {
        let ws = WordStream::from_words(vec![7, 8]);
        assert!(ws.is_valid());
        assert_eq!(ws.words_left(), 2);
        assert_eq!(ws.as_words(), &[7, 8]);
    }
}
