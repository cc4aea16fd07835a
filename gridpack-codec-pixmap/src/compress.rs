// Gridpack
// Copyright (c) 2024 The Gridpack Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Mask-driven store-compress and load-expand over 32-bit words.
//!
//! Each 32-bit mask governs 32 elements. Two index conventions exist: with a big-endian mask,
//! element 0 is controlled by bit 31; with a little-endian mask, element 0 is controlled by
//! bit 0. The two never mix on one stream. The byte-permutation SIMD kernels of the reference
//! implementation are a performance aid only; these scalar loops are the contract.

use gridpack_core::errors::{invalid_input_error, Result};
use gridpack_core::io::ByteOrder;

/// Store the mask-selected elements of a 32-element slice contiguously, big-endian convention.
/// Returns the number of elements stored.
fn compress_store_32_be(src: &[u32], dst: &mut [u32], be_mask: u32) -> usize {
    let mut mask = be_mask;
    let mut n = 0;
    for &v in src.iter().take(32) {
        dst[n] = v;
        n += (mask >> 31) as usize;
        mask <<= 1;
    }
    n
}

/// Store the mask-selected elements of a 32-element slice contiguously, little-endian
/// convention. Returns the number of elements stored.
fn compress_store_32_le(src: &[u32], dst: &mut [u32], le_mask: u32) -> usize {
    let mut mask = le_mask;
    let mut n = 0;
    for &v in src.iter().take(32) {
        dst[n] = v;
        n += (mask & 1) as usize;
        mask >>= 1;
    }
    n
}

/// Store-compress up to 31 elements, big-endian convention.
pub fn compress_store_n_be(src: &[u32], dst: &mut [u32], be_mask: u32, n: usize) -> Result<usize> {
    if n > 31 {
        return invalid_input_error("compress: partial store handles at most 31 elements");
    }
    let mut mask = be_mask;
    let mut stored = 0;
    for &v in src.iter().take(n) {
        dst[stored] = v;
        stored += (mask >> 31) as usize;
        mask <<= 1;
    }
    Ok(stored)
}

/// Store-compress up to 31 elements, little-endian convention.
pub fn compress_store_n_le(src: &[u32], dst: &mut [u32], le_mask: u32, n: usize) -> Result<usize> {
    if n > 31 {
        return invalid_input_error("compress: partial store handles at most 31 elements");
    }
    let mut mask = le_mask;
    let mut stored = 0;
    for &v in src.iter().take(n) {
        dst[stored] = v;
        stored += (mask & 1) as usize;
        mask >>= 1;
    }
    Ok(stored)
}

/// Expand a compressed stream over 32 elements, replacing only the mask-selected positions and
/// leaving the rest untouched. Returns the number of source elements consumed.
fn expand_replace_32(src: &[u32], dst: &mut [u32], mask: u32, order: ByteOrder) -> usize {
    let mut consumed = 0;
    for (i, d) in dst.iter_mut().enumerate().take(32) {
        let bit = mask_bit(mask, i, order);
        if bit {
            *d = src[consumed];
            consumed += 1;
        }
    }
    consumed
}

/// Expand a compressed stream over 32 elements, writing `fill` at unselected positions.
/// Returns the number of source elements consumed.
fn expand_fill_32(src: &[u32], dst: &mut [u32], mask: u32, fill: u32, order: ByteOrder) -> usize {
    let mut consumed = 0;
    for (i, d) in dst.iter_mut().enumerate().take(32) {
        if mask_bit(mask, i, order) {
            *d = src[consumed];
            consumed += 1;
        }
        else {
            *d = fill;
        }
    }
    consumed
}

/// Partial-length expand-replace, little-endian convention.
pub fn expand_replace_n_le(src: &[u32], dst: &mut [u32], le_mask: u32, n: usize) -> Result<usize> {
    if n > 31 {
        return invalid_input_error("compress: partial expand handles at most 31 elements");
    }
    let mut consumed = 0;
    for (i, d) in dst.iter_mut().enumerate().take(n) {
        if (le_mask >> i) & 1 != 0 {
            *d = src[consumed];
            consumed += 1;
        }
    }
    Ok(consumed)
}

/// Partial-length expand-fill, little-endian convention.
pub fn expand_fill_n_le(
    src: &[u32],
    dst: &mut [u32],
    le_mask: u32,
    fill: u32,
    n: usize,
) -> Result<usize> {
    if n > 31 {
        return invalid_input_error("compress: partial expand handles at most 31 elements");
    }
    let mut consumed = 0;
    for (i, d) in dst.iter_mut().enumerate().take(n) {
        if (le_mask >> i) & 1 != 0 {
            *d = src[consumed];
            consumed += 1;
        }
        else {
            *d = fill;
        }
    }
    Ok(consumed)
}

#[inline(always)]
fn mask_bit(mask: u32, i: usize, order: ByteOrder) -> bool {
    match order {
        ByteOrder::BigEndian => (mask >> (31 - i)) & 1 != 0,
        ByteOrder::LittleEndian => (mask >> i) & 1 != 0,
    }
}

/// Keep `src` where the mask selects, `fill` elsewhere (little-endian convention).
pub fn masked_fill_le(src: &[u32], dst: &mut [u32], le_mask: u32, fill: u32) {
    for (i, (d, &s)) in dst.iter_mut().zip(src.iter()).enumerate().take(32) {
        *d = if (le_mask >> i) & 1 != 0 { s } else { fill };
    }
}

/// Keep `src` where the mask selects, `other` elsewhere (little-endian convention).
pub fn masked_merge_le(src: &[u32], dst: &mut [u32], le_mask: u32, other: &[u32]) {
    for (i, (d, &s)) in dst.iter_mut().zip(src.iter()).enumerate().take(32) {
        *d = if (le_mask >> i) & 1 != 0 { s } else { other[i] };
    }
}

/// Store-compress a whole array driven by one mask word per 32 elements.
/// Returns the number of elements stored into `dst`.
pub fn compress_store(
    src: &[u32],
    dst: &mut [u32],
    masks: &[u32],
    order: ByteOrder,
) -> Result<usize> {
    let needed = (src.len() + 31) / 32;
    if masks.len() < needed {
        return invalid_input_error("compress: not enough mask words");
    }
    let selected = count_selected(src.len(), masks, order);
    if dst.len() < selected {
        return invalid_input_error("compress: destination array too small");
    }

    let mut stored = 0;
    for (chunk, &mask) in src.chunks(32).zip(masks.iter()) {
        if chunk.len() == 32 {
            stored += match order {
                ByteOrder::BigEndian => compress_store_32_be(chunk, &mut dst[stored..], mask),
                ByteOrder::LittleEndian => compress_store_32_le(chunk, &mut dst[stored..], mask),
            };
        }
        else {
            stored += match order {
                ByteOrder::BigEndian => {
                    compress_store_n_be(chunk, &mut dst[stored..], mask, chunk.len())?
                }
                ByteOrder::LittleEndian => {
                    compress_store_n_le(chunk, &mut dst[stored..], mask, chunk.len())?
                }
            };
        }
    }
    Ok(stored)
}

/// Expand a compressed stream back over `dst`, replacing only selected positions.
/// Returns the number of compressed elements consumed.
pub fn expand_replace(
    src: &[u32],
    dst: &mut [u32],
    masks: &[u32],
    order: ByteOrder,
) -> Result<usize> {
    let needed = (dst.len() + 31) / 32;
    if masks.len() < needed {
        return invalid_input_error("compress: not enough mask words");
    }
    if src.len() < count_selected(dst.len(), masks, order) {
        return invalid_input_error("compress: compressed stream too short");
    }

    let mut consumed = 0;
    for (chunk, &mask) in dst.chunks_mut(32).zip(masks.iter()) {
        let n = chunk.len();
        if n == 32 {
            consumed += expand_replace_32(&src[consumed..], chunk, mask, order);
        }
        else {
            let le_mask = to_le_mask(mask, order);
            consumed += expand_replace_n_le(&src[consumed..], chunk, le_mask, n)?;
        }
    }
    Ok(consumed)
}

/// Expand a compressed stream back over `dst`, filling unselected positions with `fill`.
/// Returns the number of compressed elements consumed.
pub fn expand_fill(
    src: &[u32],
    dst: &mut [u32],
    masks: &[u32],
    fill: u32,
    order: ByteOrder,
) -> Result<usize> {
    let needed = (dst.len() + 31) / 32;
    if masks.len() < needed {
        return invalid_input_error("compress: not enough mask words");
    }
    if src.len() < count_selected(dst.len(), masks, order) {
        return invalid_input_error("compress: compressed stream too short");
    }

    let mut consumed = 0;
    for (chunk, &mask) in dst.chunks_mut(32).zip(masks.iter()) {
        let n = chunk.len();
        if n == 32 {
            consumed += expand_fill_32(&src[consumed..], chunk, mask, fill, order);
        }
        else {
            let le_mask = to_le_mask(mask, order);
            consumed += expand_fill_n_le(&src[consumed..], chunk, le_mask, fill, n)?;
        }
    }
    Ok(consumed)
}

fn count_selected(len: usize, masks: &[u32], order: ByteOrder) -> usize {
    let mut total = 0;
    for (start, &mask) in (0..len).step_by(32).zip(masks.iter()) {
        let n = (len - start).min(32);
        let le = to_le_mask(mask, order);
        total += (le & low_mask(n)).count_ones() as usize;
    }
    total
}

fn low_mask(n: usize) -> u32 {
    if n >= 32 {
        u32::MAX
    }
    else {
        (1u32 << n) - 1
    }
}

fn to_le_mask(mask: u32, order: ByteOrder) -> u32 {
    match order {
        ByteOrder::BigEndian => mask.reverse_bits(),
        ByteOrder::LittleEndian => mask,
    }
}
