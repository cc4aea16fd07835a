// Gridpack
// Copyright (c) 2024 The Gridpack Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Packed variable-length encoding of array shapes.
//!
//! A shape is written as a 3-bit dimension count and a 2-bit width code (8, 16, 24 or 40 bits
//! per extent, chosen from the largest extent; the widest tier exists for the 2^24 boundary),
//! followed by the extents themselves, all packed big-endian. Depending on dimension count and
//! width the payload occupies exactly 1, 2, 3, 4, 6, or 7 words; 5 words is unreachable.

use smallvec::SmallVec;

use crate::array::{ArrayDescriptor, ArrayShape, ElementKind, MAX_ARRAY_DIMENSIONS};
use crate::errors::{decode_error, invalid_input_error, Result};
use crate::io::{BitStream, ByteOrder, StreamMode};
use crate::pipeline::FilterMeta;

/// Reserved id of the dimensions sentinel filter.
pub const FILTER_ID_DIMENSIONS: u8 = 0;

/// Reserved id of the pipeline terminator record.
pub const FILTER_ID_TERMINATOR: u8 = 255;

/// Maximum number of words an encoded shape occupies.
pub const MAX_SHAPE_WORDS: usize = 7;

fn width_code(extent: u32) -> u32 {
    match extent {
        0..=0xff => 0,
        0x100..=0xffff => 1,
        0x1_0000..=0xff_ffff => 2,
        _ => 3,
    }
}

fn width_bits(code: u32) -> u32 {
    if code == 3 {
        40
    }
    else {
        (code + 1) * 8
    }
}

/// Pack a shape into its variable-length word representation.
pub fn encode_shape(shape: &[u32]) -> Result<SmallVec<[u32; MAX_SHAPE_WORDS]>> {
    if shape.is_empty() || shape.len() > MAX_ARRAY_DIMENSIONS {
        return invalid_input_error("pipeline: dimension count must be 1..=5");
    }
    let code = shape.iter().copied().map(width_code).max().unwrap();
    let width = width_bits(code);

    let mut bs = BitStream::new(ByteOrder::BigEndian, MAX_SHAPE_WORDS, StreamMode::Write);
    bs.put_bits(shape.len() as u32, 3)?;
    bs.put_bits(code, 2)?;
    for &extent in shape {
        if width == 40 {
            // A 40-bit field is two inserts; the top byte of an extent is always zero.
            bs.put_bits(0, 8)?;
            bs.put_bits(extent, 32)?;
        }
        else {
            bs.put_bits(extent, width)?;
        }
    }
    bs.flush()?;
    Ok(SmallVec::from_slice(bs.as_words()))
}

/// The inverse of [`encode_shape`].
pub fn decode_shape(words: &[u32]) -> Result<ArrayShape> {
    let mut bs = BitStream::from_words(ByteOrder::BigEndian, words.to_vec());
    let ndims = bs.get_bits(3)? as usize;
    if ndims < 1 || ndims > MAX_ARRAY_DIMENSIONS {
        return decode_error("pipeline: invalid dimension count");
    }
    let width = width_bits(bs.get_bits(2)?);
    let mut shape = ArrayShape::new();
    for _ in 0..ndims {
        let extent = if width == 40 {
            if bs.get_bits(8)? != 0 {
                return decode_error("pipeline: extent exceeds 32 bits");
            }
            bs.get_bits(32)?
        }
        else {
            bs.get_bits(width)?
        };
        shape.push(extent);
    }
    Ok(shape)
}

/// Build the dimensions sentinel record (filter id 0) for a shape.
pub fn dimensions_meta(shape: &[u32]) -> Result<FilterMeta> {
    Ok(FilterMeta::with_args(FILTER_ID_DIMENSIONS, &encode_shape(shape)?))
}

/// Build the pipeline terminator record (filter id 255) carrying the output array descriptor.
pub fn terminator_meta(desc: &ArrayDescriptor) -> Result<FilterMeta> {
    let mut args: SmallVec<[u32; 8]> = SmallVec::new();
    args.push((desc.kind.code() << 8) | desc.elem_size);
    args.extend_from_slice(&encode_shape(&desc.shape)?);
    let mut meta = FilterMeta::new(FILTER_ID_TERMINATOR);
    meta.args = args;
    Ok(meta)
}

/// Recover the array descriptor from a terminator record.
pub fn decode_terminator(meta: &FilterMeta) -> Result<ArrayDescriptor> {
    if meta.id != FILTER_ID_TERMINATOR {
        return decode_error("pipeline: not a terminator record");
    }
    if meta.args.len() < 2 {
        return decode_error("pipeline: truncated terminator record");
    }
    let prop = meta.args[0];
    let kind = ElementKind::from_code((prop >> 8) & 0xff)?;
    let elem_size = prop & 0xff;
    let shape = decode_shape(&meta.args[1..])?;
    let desc = ArrayDescriptor { kind, elem_size, shape, tile: None };
    desc.validate()?;
    Ok(desc)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verify_shape_round_trip_ladder() {
        // Extent ladder spanning every width class, over every dimension count.
        let ladder = [63u32, 255, 1023, 4095, 65535, 16_777_215, 16_777_216];
        for &base in &ladder {
            for ndims in 1..=MAX_ARRAY_DIMENSIONS {
                let shape: Vec<u32> = (0..ndims as u32).map(|k| base.saturating_sub(k)).collect();
                let words = encode_shape(&shape).unwrap();
                assert!(words.len() <= MAX_SHAPE_WORDS);
                let back = decode_shape(&words).unwrap();
                assert_eq!(back.as_slice(), shape.as_slice(), "base {} d {}", base, ndims);
            }
        }
    }

    #[test]
    fn verify_shape_word_counts() {
        // 5 bits of header + ndims * width, rounded up to whole words.
        assert_eq!(encode_shape(&[255]).unwrap().len(), 1);
        assert_eq!(encode_shape(&[255, 255, 255]).unwrap().len(), 1);
        assert_eq!(encode_shape(&[65535, 65535]).unwrap().len(), 2);
        assert_eq!(encode_shape(&[16_777_215; 5]).unwrap().len(), 4);
        assert_eq!(encode_shape(&[16_777_216; 4]).unwrap().len(), 6);
        assert_eq!(encode_shape(&[16_777_216; 5]).unwrap().len(), 7);
    }

    #[test]
    fn verify_shape_word_count_menu() {
        // Across every dimension count and width tier the payload occupies exactly
        // 1, 2, 3, 4, 6, or 7 words; 5 words is never produced.
        let mut seen = [false; 8];
        for &extent in &[2u32, 255, 256, 65535, 65536, 16_777_215, 16_777_216] {
            for ndims in 1..=MAX_ARRAY_DIMENSIONS {
                let shape = vec![extent; ndims];
                let words = encode_shape(&shape).unwrap().len();
                seen[words] = true;
            }
        }
        assert_eq!(seen, [false, true, true, true, true, false, true, true]);
    }

    #[test]
    fn verify_shape_rejects_bad_counts() {
        assert!(encode_shape(&[]).is_err());
        assert!(encode_shape(&[1; 6]).is_err());
    }

    #[test]
    fn verify_terminator_round_trip() {
        let desc = ArrayDescriptor::new(ElementKind::Float, &[37, 12]);
        let meta = terminator_meta(&desc).unwrap();
        assert_eq!(meta.id, FILTER_ID_TERMINATOR);
        let back = decode_terminator(&meta).unwrap();
        assert_eq!(back.kind, ElementKind::Float);
        assert_eq!(back.elem_size, 4);
        assert_eq!(back.shape.as_slice(), &[37, 12]);
    }
}
