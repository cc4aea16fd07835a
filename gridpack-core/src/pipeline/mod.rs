// Gridpack
// Copyright (c) 2024 The Gridpack Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The `pipeline` module chains reversible filters over a buffer of 32-bit elements.
//!
//! Running a chain forward transforms the buffer step by step while each filter appends the
//! metadata its inverse will need to a word stream; the stream is finished with a terminator
//! record carrying the output array descriptor, followed by the transformed payload. Running the
//! stream in reverse walks the records back-to-front, handing each filter its own metadata to
//! undo its transform, and returns the restored array.

mod dims;
mod meta;
mod registry;
mod scale;

pub use dims::{
    decode_shape, decode_terminator, dimensions_meta, encode_shape, terminator_meta,
    FILTER_ID_DIMENSIONS, FILTER_ID_TERMINATOR, MAX_SHAPE_WORDS,
};
pub use meta::{FilterMeta, MetaFlags};
pub use registry::FilterRegistry;
pub use scale::{ScaleOffsetFilter, FILTER_ID_SCALE_OFFSET};

use log::trace;

use crate::array::ArrayDescriptor;
use crate::errors::{decode_error, invalid_input_error, Error, Result};
use crate::io::WordStream;

/// The working buffer a filter chain transforms.
///
/// The buffer owns enough words for the worst-case step of the chain; `used` tracks how many
/// words currently carry data.
#[derive(Clone, Debug)]
pub struct PipeBuffer {
    words: Vec<u32>,
    used: usize,
}

impl PipeBuffer {
    /// Wrap existing words; all of them count as used.
    pub fn from_words(words: Vec<u32>) -> PipeBuffer {
        let used = words.len();
        PipeBuffer { words, used }
    }

    /// The words currently carrying data.
    pub fn used_words(&self) -> &[u32] {
        &self.words[..self.used]
    }

    /// Mutable view of the words currently carrying data.
    pub fn used_words_mut(&mut self) -> &mut [u32] {
        &mut self.words[..self.used]
    }

    /// Number of words currently carrying data.
    pub fn used(&self) -> usize {
        self.used
    }

    /// Resize the data region, growing the backing storage with zeros when needed.
    pub fn set_used(&mut self, used: usize) {
        if used > self.words.len() {
            self.words.resize(used, 0);
        }
        self.used = used;
    }

    /// Make room for at least `words` words without changing the data region.
    pub fn reserve_words(&mut self, words: usize) {
        if words > self.words.len() {
            self.words.resize(words, 0);
        }
    }

    /// Replace the contents with the given words.
    pub fn replace(&mut self, words: &[u32]) {
        self.reserve_words(words.len());
        self.words[..words.len()].copy_from_slice(words);
        self.used = words.len();
    }

    /// Give up the buffer, truncated to the used region.
    pub fn into_words(mut self) -> Vec<u32> {
        self.words.truncate(self.used);
        self.words
    }
}

/// A reversible transformation over a buffer of 32-bit elements.
///
/// The four methods mirror the four request modes a filter must serve. `validate` must be free
/// of side effects. The metadata a filter appends during `forward` is exactly the record its
/// `reverse` consumes.
pub trait PipeFilter: Send + Sync {
    /// The id this filter answers to (0 < id < 255).
    fn id(&self) -> u8;

    /// Short display name.
    fn name(&self) -> &'static str;

    /// Check the input metadata and return the size, in words, of the inverse metadata record
    /// that a forward run will emit.
    fn validate(&self, meta: &FilterMeta) -> Result<usize>;

    /// Worst-case byte count of this filter's forward output for the given array.
    fn forward_size(&self, meta: &FilterMeta, desc: &ArrayDescriptor) -> Result<usize>;

    /// Transform the buffer forward and append the inverse metadata record to `out`.
    /// Returns the number of payload bytes now used.
    fn forward(
        &self,
        meta: &FilterMeta,
        desc: &ArrayDescriptor,
        buf: &mut PipeBuffer,
        out: &mut WordStream,
    ) -> Result<usize>;

    /// Consume this filter's inverse metadata and transform the buffer backward.
    /// Returns the number of payload bytes now used.
    fn reverse(
        &self,
        meta: &FilterMeta,
        desc: &ArrayDescriptor,
        buf: &mut PipeBuffer,
    ) -> Result<usize>;
}

/// Validate a whole chain without touching any buffer.
///
/// Returns the total size, in words, of the inverse metadata the chain will emit.
pub fn validate_filter_chain(registry: &FilterRegistry, chain: &[FilterMeta]) -> Result<usize> {
    let mut total = 0;
    for meta in chain {
        let filter = registry.get(meta.id).ok_or(Error::UnknownFilter(meta.id))?;
        total += filter.validate(meta)?;
    }
    Ok(total)
}

/// Run a filter chain forward over `data`.
///
/// Each filter is validated, sized, then executed; its inverse metadata lands in `out` in chain
/// order. The stream is finished with the terminator record (carrying `desc`) and the
/// transformed payload. Returns the number of words appended to `out`.
///
/// A failing step normally aborts the chain. When the first record carries
/// [`MetaFlags::BEST_EFFORT`], the filters applied so far are kept and the stream is finished
/// early instead.
pub fn run_pipe_filters(
    registry: &FilterRegistry,
    desc: &ArrayDescriptor,
    data: &[u32],
    chain: &[FilterMeta],
    out: &mut WordStream,
) -> Result<usize> {
    desc.validate()?;
    if data.len() != desc.len() {
        return invalid_input_error("pipeline: data length does not match the descriptor");
    }
    let best_effort =
        chain.first().map(|m| m.flags.contains(MetaFlags::BEST_EFFORT)).unwrap_or(false);

    let start = out.words_used();
    let mut buf = PipeBuffer::from_words(data.to_vec());

    for meta in chain {
        let status = match registry.get(meta.id) {
            Some(filter) => filter
                .validate(meta)
                .and_then(|_| filter.forward_size(meta, desc))
                .and_then(|worst| {
                    buf.reserve_words((worst + 3) / 4);
                    filter.forward(meta, desc, &mut buf, out)
                }),
            None => Err(Error::UnknownFilter(meta.id)),
        };
        match status {
            Ok(nbytes) => trace!("filter id {} forward: {} bytes", meta.id, nbytes),
            Err(_) if best_effort => {
                trace!("filter id {} failed, finishing the stream early", meta.id);
                break;
            }
            Err(err) => return Err(err),
        }
    }

    terminator_meta(desc)?.write_to(out)?;
    out.insert(buf.used_words())?;
    Ok(out.words_used() - start)
}

/// Run the inverse of a forward chain from the word stream it produced.
///
/// Records are read up to the terminator, the remaining words are taken as the payload, and the
/// recorded filters are undone back-to-front. Returns the restored array descriptor and data.
pub fn reverse_pipe_filters(
    registry: &FilterRegistry,
    stream: &mut WordStream,
) -> Result<(ArrayDescriptor, Vec<u32>)> {
    let mut records = Vec::new();
    let desc = loop {
        let meta = FilterMeta::read_from(stream)?;
        if meta.id == FILTER_ID_TERMINATOR {
            break decode_terminator(&meta)?;
        }
        records.push(meta);
    };

    let payload = stream.read_slice(stream.words_left())?.to_vec();
    let mut buf = PipeBuffer::from_words(payload);

    for meta in records.iter().rev() {
        let filter = registry.get(meta.id).ok_or(Error::UnknownFilter(meta.id))?;
        let nbytes = filter.reverse(meta, &desc, &mut buf)?;
        trace!("filter '{}' (id {}) reverse: {} bytes", filter.name(), meta.id, nbytes);
    }

    if buf.used() != desc.len() {
        return decode_error("pipeline: restored data does not match the descriptor");
    }
    Ok((desc, buf.into_words()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::array::ElementKind;

    fn registry() -> FilterRegistry {
        let mut reg = FilterRegistry::new();
        reg.register(Box::new(ScaleOffsetFilter)).unwrap();
        reg
    }

    #[test]
    fn verify_chain_round_trip() {
        let reg = registry();
        let desc = ArrayDescriptor::new(ElementKind::Signed, &[3, 4]);
        let data: Vec<u32> = (0..12).map(|i| (i as i32 - 6) as u32).collect();

        let chain = [
            FilterMeta::with_args(FILTER_ID_SCALE_OFFSET, &[3, 17]),
            FilterMeta::with_args(FILTER_ID_SCALE_OFFSET, &[2, 1u32.wrapping_neg()]),
        ];

        let mut out = WordStream::new(64, true);
        run_pipe_filters(&reg, &desc, &data, &chain, &mut out).unwrap();

        let (back_desc, back) = reverse_pipe_filters(&reg, &mut out).unwrap();
        assert_eq!(back_desc.shape.as_slice(), &[3, 4]);
        assert_eq!(back_desc.kind, ElementKind::Signed);
        assert_eq!(back, data);
    }

    #[test]
    fn verify_empty_chain_is_a_copy() {
        let reg = registry();
        let desc = ArrayDescriptor::new(ElementKind::Raw, &[5]);
        let data = vec![10, 20, 30, 40, 50];

        let mut out = WordStream::new(64, true);
        run_pipe_filters(&reg, &desc, &data, &[], &mut out).unwrap();
        let (_, back) = reverse_pipe_filters(&reg, &mut out).unwrap();
        assert_eq!(back, data);
    }

    #[test]
    fn verify_unknown_filter_aborts() {
        let reg = registry();
        let desc = ArrayDescriptor::new(ElementKind::Signed, &[4]);
        let chain = [FilterMeta::with_args(77, &[1])];
        let mut out = WordStream::new(64, true);
        let err = run_pipe_filters(&reg, &desc, &[1, 2, 3, 4], &chain, &mut out);
        assert!(matches!(err, Err(Error::UnknownFilter(77))));
    }

    #[test]
    fn verify_validation_failure_aborts() {
        let reg = registry();
        let desc = ArrayDescriptor::new(ElementKind::Signed, &[4]);
        // Factor of zero fails validation.
        let chain = [FilterMeta::with_args(FILTER_ID_SCALE_OFFSET, &[0, 5])];
        let mut out = WordStream::new(64, true);
        assert!(run_pipe_filters(&reg, &desc, &[1, 2, 3, 4], &chain, &mut out).is_err());

        assert!(validate_filter_chain(&reg, &chain).is_err());
        let good = [FilterMeta::with_args(FILTER_ID_SCALE_OFFSET, &[2, 5])];
        assert_eq!(validate_filter_chain(&reg, &good).unwrap(), 3);
    }

    #[test]
    fn verify_best_effort_finishes_the_stream() {
        let reg = registry();
        let desc = ArrayDescriptor::new(ElementKind::Signed, &[4]);
        let data = [5u32, 6, 7, 8];

        let mut first = FilterMeta::with_args(FILTER_ID_SCALE_OFFSET, &[3, 0]);
        first.flags = MetaFlags::BEST_EFFORT;
        // The second step references an unregistered filter.
        let chain = [first, FilterMeta::with_args(99, &[])];

        let mut out = WordStream::new(64, true);
        run_pipe_filters(&reg, &desc, &data, &chain, &mut out).unwrap();

        // The surviving prefix of the chain still reverses cleanly.
        let (_, back) = reverse_pipe_filters(&reg, &mut out).unwrap();
        assert_eq!(back, data);
    }
}
