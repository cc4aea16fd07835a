// Gridpack
// Copyright (c) 2024 The Gridpack Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! One-bit-per-element presence maps and their run-length coding.
//!
//! Bits are stored big-endian within each 32-bit word: element 0 maps to the MSB of word 0.
//!
//! The RLE scheme opens with four header bits selecting the policy, then codes alternating runs
//! and closes with a guard bit inverted from the last run. A run of N zeros under *full*
//! encoding is a lead `0`, then one `0` per group of NG zeros (NG is 8 or 12), a `1` separator,
//! one `0` per group of three, a `1` separator, and single `0`s for the remainder; *simple*
//! encoding is the lead plus one bit per remaining element. Runs of ones mirror the scheme with
//! inverted bits and separators.

use bitflags::bitflags;

use gridpack_core::errors::{decode_error, invalid_input_error, Result};

bitflags! {
    /// RLE policy selection, as carried by the four stream header bits.
    #[derive(Copy, Clone, Debug, PartialEq, Eq, Default)]
    pub struct RleHint: u32 {
        /// Full (grouped) encoding for runs of ones.
        const FULL_1 = 0x1;
        /// Full (grouped) encoding for runs of zeros.
        const FULL_0 = 0x2;
        /// Groups of 12 rather than 8 for runs of ones.
        const NG12_1 = 0x4;
        /// Groups of 12 rather than 8 for runs of zeros.
        const NG12_0 = 0x8;
    }
}

/// Comparison operator selecting which elements set their pixmap bit.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum CmpOp {
    /// Masked equality.
    Eq,
    /// Signed less-than.
    LtSigned,
    /// Signed greater-than.
    GtSigned,
    /// Unsigned less-than.
    LtUnsigned,
    /// Unsigned greater-than.
    GtUnsigned,
}

/// A bit map over an array, possibly run-length encoded.
#[derive(Clone, Debug)]
pub struct Pixmap {
    /// Bits per element (1 for presence maps).
    bits: u32,
    /// Number of elements described.
    elem: usize,
    /// Encoded length in bits; 0 when the map is not encoded.
    nrle: usize,
    /// Number of bits set.
    pop1: usize,
    /// Number of full words with every bit set.
    all1: usize,
    /// Number of full words with no bit set.
    zero: usize,
    data: Vec<u32>,
}

/// Number of data words a presence map of `elem` bits occupies.
fn map_words(elem: usize) -> usize {
    (elem + 31) / 32
}

impl Pixmap {
    /// Create an empty pixmap able to describe `nelem` elements of `bits` bits each.
    pub fn new(nelem: usize, bits: u32) -> Pixmap {
        Pixmap {
            bits,
            elem: 0,
            nrle: 0,
            pop1: 0,
            all1: 0,
            zero: 0,
            data: vec![0; map_words(nelem * bits as usize) + 1],
        }
    }

    /// Bits per element.
    pub fn bits(&self) -> u32 {
        self.bits
    }

    /// Number of elements described.
    pub fn len(&self) -> usize {
        self.elem
    }

    /// True when no elements are described.
    pub fn is_empty(&self) -> bool {
        self.elem == 0
    }

    /// True when the contents are run-length encoded.
    pub fn is_encoded(&self) -> bool {
        self.nrle != 0
    }

    /// Encoded length in bits (0 when not encoded).
    pub fn rle_len(&self) -> usize {
        self.nrle
    }

    /// Number of bits set in the map.
    pub fn popcount(&self) -> usize {
        self.pop1
    }

    /// Number of full words with every bit set.
    pub fn all_ones_words(&self) -> usize {
        self.all1
    }

    /// Number of full words with no bit set.
    pub fn all_zero_words(&self) -> usize {
        self.zero
    }

    /// The backing words.
    pub fn as_words(&self) -> &[u32] {
        &self.data
    }

    /// Rebuild a pixmap from its stored parts (e.g. out of a metadata record).
    pub fn from_parts(elem: usize, nrle: usize, words: &[u32]) -> Pixmap {
        let mut data = words.to_vec();
        data.resize(data.len().max(map_words(elem) + 1), 0);
        let pop1 = if nrle == 0 {
            count_ones(&data, elem)
        }
        else {
            0
        };
        Pixmap { bits: 1, elem, nrle, pop1, all1: 0, zero: 0, data }
    }

    /// An independent copy.
    pub fn duplicate(&self) -> Pixmap {
        self.clone()
    }

    /// Build a presence map with a predicate over each element.
    fn build_with(n: usize, pred: impl Fn(usize) -> bool) -> Pixmap {
        let mut map = Pixmap::new(n, 1);
        map.elem = n;

        let mut pop1 = 0;
        let mut all1 = 0;
        let mut zero = 0;
        for (w, word) in map.data.iter_mut().enumerate().take(map_words(n)) {
            let lo = w * 32;
            let hi = (lo + 32).min(n);
            let mut result = 0u32;
            for i in lo..hi {
                if pred(i) {
                    result |= 1 << (31 - (i - lo));
                }
            }
            pop1 += result.count_ones() as usize;
            if hi - lo == 32 {
                // Whole-word statistics only count full slices.
                all1 += (result == u32::MAX) as usize;
                zero += (result == 0) as usize;
            }
            *word = result;
        }
        map.pop1 = pop1;
        map.all1 = all1;
        map.zero = zero;
        map
    }

    /// Set bits where `(v & !mmask) == (special & !mmask)`. Works for any 32-bit data.
    pub fn from_eq_mask(src: &[u32], special: u32, mmask: u32) -> Pixmap {
        let mask = !mmask;
        let wanted = special & mask;
        Pixmap::build_with(src.len(), |i| src[i] & mask == wanted)
    }

    /// Set bits by comparing signed or unsigned integers against `special`.
    ///
    /// `mmask` is honored for equality comparisons only, as in [`Pixmap::from_eq_mask`].
    pub fn from_cmp_i32(src: &[i32], special: i32, mmask: i32, op: CmpOp) -> Pixmap {
        // Complementing the sign bit turns an unsigned compare into a signed one.
        let msb = i32::MIN;
        match op {
            CmpOp::Eq => Pixmap::from_eq_mask(
                bytemuck::cast_slice(src),
                special as u32,
                mmask as u32,
            ),
            CmpOp::LtSigned => Pixmap::build_with(src.len(), |i| src[i] < special),
            CmpOp::GtSigned => Pixmap::build_with(src.len(), |i| src[i] > special),
            CmpOp::LtUnsigned => {
                Pixmap::build_with(src.len(), |i| (src[i] ^ msb) < (special ^ msb))
            }
            CmpOp::GtUnsigned => {
                Pixmap::build_with(src.len(), |i| (src[i] ^ msb) > (special ^ msb))
            }
        }
    }

    /// Set bits by comparing floats against `special`. Equality on floats is not meaningful
    /// here; use [`Pixmap::from_eq_mask`] on the raw bits instead.
    pub fn from_cmp_f32(src: &[f32], special: f32, op: CmpOp) -> Result<Pixmap> {
        match op {
            CmpOp::LtSigned | CmpOp::LtUnsigned => {
                Ok(Pixmap::build_with(src.len(), |i| src[i] < special))
            }
            CmpOp::GtSigned | CmpOp::GtUnsigned => {
                Ok(Pixmap::build_with(src.len(), |i| src[i] > special))
            }
            CmpOp::Eq => invalid_input_error("pixmap: float equality wants the bit-mask builder"),
        }
    }

    #[inline(always)]
    fn bit(&self, i: usize) -> u32 {
        (self.data[i / 32] >> (31 - (i % 32))) & 1
    }

    /// Suggest an RLE policy from the run structure of the map.
    ///
    /// Very sparse maps pick full encoding outright; otherwise the average run lengths over the
    /// first half of the map decide between simple and full, and between 8- and 12-groups.
    pub fn encode_hint(&self) -> Result<RleHint> {
        if self.bits != 1 {
            return invalid_input_error("pixmap: hints need a 1-bit map");
        }
        let total = self.elem;
        if (total >> 4) > self.pop1 {
            let mut mode = RleHint::FULL_0;
            if (total >> 6) > self.pop1 {
                mode |= RleHint::NG12_0;
            }
            return Ok(mode);
        }
        let pop0 = total - self.pop1;
        if (total >> 4) > pop0 {
            let mut mode = RleHint::FULL_1;
            if (total >> 6) > pop0 {
                mode |= RleHint::NG12_1;
            }
            return Ok(mode);
        }

        // Average run lengths over the first half of the map.
        let scan = (total / 2).max(1).min(total);
        let mut count = [0usize; 2];
        let mut lseq = [0usize; 2];
        let mut cur = self.bit(0) as usize;
        let mut run = 0usize;
        for i in 0..scan {
            let b = self.bit(i) as usize;
            if b == cur {
                run += 1;
            }
            else {
                count[cur] += 1;
                lseq[cur] += run;
                cur = b;
                run = 1;
            }
        }
        count[cur] += 1;
        lseq[cur] += run;

        let avg0 = if count[0] > 0 { lseq[0] / count[0] } else { 0 };
        let avg1 = if count[1] > 0 { lseq[1] / count[1] } else { 0 };
        let mut mode = RleHint::empty();
        if avg0 > 4 {
            mode |= RleHint::FULL_0;
        }
        if avg1 > 4 {
            mode |= RleHint::FULL_1;
        }
        if avg0 > 48 {
            mode |= RleHint::NG12_0;
        }
        if avg1 > 48 {
            mode |= RleHint::NG12_1;
        }
        Ok(mode)
    }

    /// Run-length encode the map. `hint` of `None` uses full 12/3 encoding for zeros and simple
    /// encoding for ones.
    pub fn rle_encode(&self, hint: Option<RleHint>) -> Result<Pixmap> {
        if self.bits != 1 {
            return invalid_input_error("pixmap: encoding needs a 1-bit map");
        }
        if self.is_encoded() {
            return invalid_input_error("pixmap: map is already encoded");
        }
        if self.elem == 0 {
            return invalid_input_error("pixmap: empty map");
        }
        let mode = hint.unwrap_or(RleHint::FULL_0 | RleHint::NG12_0);
        let ng0 = group_size(mode, RleHint::FULL_0, RleHint::NG12_0);
        let ng1 = group_size(mode, RleHint::FULL_1, RleHint::NG12_1);

        // Worst case three emitted bits per element, plus header and guard.
        let mut out = Pixmap::new(3 * self.elem + 8, 1);
        out.elem = self.elem;

        let mut writer = BitWriter::new(&mut out.data);
        writer.put(mode.bits(), 4);
        let header_bits = 4;

        let mut last_type = 0u32;
        let mut i = 0;
        while i < self.elem {
            let b = self.bit(i);
            let mut len = 1;
            while i + len < self.elem && self.bit(i + len) == b {
                len += 1;
            }
            i += len;
            last_type = b;
            emit_run(&mut writer, b, len, if b == 0 { ng0 } else { ng1 });
        }
        // Inverted guard bit makes the final run self-terminating.
        writer.put(1 - last_type, 1);

        let emitted = writer.finish();
        out.nrle = emitted - header_bits - 1;
        out.pop1 = self.pop1;
        Ok(out)
    }

    /// Decode a run-length encoded map back to its plain form.
    pub fn rle_decode(&self) -> Result<Pixmap> {
        if self.bits != 1 {
            return invalid_input_error("pixmap: decoding needs a 1-bit map");
        }
        if !self.is_encoded() {
            return invalid_input_error("pixmap: map is not encoded");
        }

        let mut reader = BitReader::new(&self.data);
        let mode = RleHint::from_bits_truncate(reader.get(4)?);
        let ng0 = group_size(mode, RleHint::FULL_0, RleHint::NG12_0);
        let ng1 = group_size(mode, RleHint::FULL_1, RleHint::NG12_1);

        let mut out = Pixmap::new(self.elem, 1);
        out.elem = self.elem;
        let mut writer = BitWriter::new(&mut out.data);

        let budget = self.nrle as isize;
        let mut left = budget;
        let mut get = |reader: &mut BitReader<'_>, left: &mut isize| -> Result<u32> {
            *left -= 1;
            reader.get(1)
        };

        let mut bit = get(&mut reader, &mut left)?;
        // An initial 1 skips straight to the ones run.
        let mut decode_zeros = bit == 0;
        loop {
            if decode_zeros {
                writer.zeros(1);
                bit = get(&mut reader, &mut left)?;
                if ng0 > 0 {
                    while bit == 0 {
                        writer.zeros(ng0);
                        bit = get(&mut reader, &mut left)?;
                    }
                    bit = get(&mut reader, &mut left)?;
                    while bit == 0 {
                        writer.zeros(3);
                        bit = get(&mut reader, &mut left)?;
                    }
                    bit = get(&mut reader, &mut left)?;
                }
                while bit == 0 {
                    writer.zeros(1);
                    bit = get(&mut reader, &mut left)?;
                }
            }
            else {
                writer.ones(1);
                bit = get(&mut reader, &mut left)?;
                if ng1 > 0 {
                    while bit == 1 {
                        writer.ones(ng1);
                        bit = get(&mut reader, &mut left)?;
                    }
                    bit = get(&mut reader, &mut left)?;
                    while bit == 1 {
                        writer.ones(3);
                        bit = get(&mut reader, &mut left)?;
                    }
                    bit = get(&mut reader, &mut left)?;
                }
                while bit == 1 {
                    writer.ones(1);
                    bit = get(&mut reader, &mut left)?;
                }
            }
            // The guard bit is not part of the budget: a negative balance means the run above
            // was terminated by the guard, a balance of zero means the last counted bit opens
            // one final run of length one.
            if left < 0 {
                break;
            }
            decode_zeros = !decode_zeros;
        }

        let written = writer.finish();
        if written != self.elem {
            return decode_error("pixmap: RLE stream does not match the element count");
        }

        out.pop1 = count_ones(&out.data, out.elem);
        Ok(out)
    }

    /// Write `plug` into `dst` at every 1-position; 0-positions keep whatever the caller seeded.
    ///
    /// An encoded map is decoded on the fly. Returns the number of positions examined.
    pub fn restore_into(&self, dst: &mut [u32], plug: u32) -> Result<usize> {
        if self.bits != 1 {
            return invalid_input_error("pixmap: restoration needs a 1-bit map");
        }
        if dst.len() < self.elem {
            return invalid_input_error("pixmap: destination array too small");
        }
        if self.is_encoded() {
            return self.rle_decode()?.restore_into(dst, plug);
        }
        for (w, chunk) in dst.chunks_mut(32).enumerate().take(map_words(self.elem)) {
            let token = self.data[w];
            if token == 0 {
                continue;
            }
            let hi = chunk.len().min(self.elem - w * 32);
            for (i, v) in chunk.iter_mut().enumerate().take(hi) {
                if token & (1 << (31 - i)) != 0 {
                    *v = plug;
                }
            }
        }
        Ok(self.elem)
    }
}

fn count_ones(words: &[u32], elem: usize) -> usize {
    let full = elem / 32;
    let mut pop = words[..full].iter().map(|w| w.count_ones() as usize).sum();
    if elem % 32 != 0 {
        let keep = !(u32::MAX >> (elem % 32));
        pop += (words[full] & keep).count_ones() as usize;
    }
    pop
}

fn group_size(mode: RleHint, full: RleHint, ng12: RleHint) -> usize {
    if mode.contains(full) {
        if mode.contains(ng12) {
            12
        }
        else {
            8
        }
    }
    else {
        0
    }
}

/// Emit one run of `len` bits of value `b`. `ng` of 0 selects simple encoding.
fn emit_run(w: &mut BitWriter<'_>, b: u32, mut len: usize, ng: usize) {
    w.put(b, 1);
    len -= 1;
    if ng > 0 {
        while len >= ng {
            w.put(b, 1);
            len -= ng;
        }
        w.put(1 - b, 1);
        while len >= 3 {
            w.put(b, 1);
            len -= 3;
        }
        w.put(1 - b, 1);
    }
    while len > 0 {
        w.put(b, 1);
        len -= 1;
    }
}

/// MSB-first bit writer over a word buffer. Bits past the buffer end are counted but dropped,
/// so a malformed stream cannot run the writer out of bounds.
struct BitWriter<'a> {
    words: &'a mut [u32],
    acc: u64,
    filled: u32,
    pos: usize,
    emitted: usize,
}

impl<'a> BitWriter<'a> {
    fn new(words: &'a mut [u32]) -> BitWriter<'a> {
        BitWriter { words, acc: 0, filled: 0, pos: 0, emitted: 0 }
    }

    fn put(&mut self, v: u32, nbits: u32) {
        self.acc = (self.acc << nbits) | u64::from(v & !(u32::MAX << nbits));
        self.filled += nbits;
        self.emitted += nbits as usize;
        while self.filled >= 32 {
            self.filled -= 32;
            if self.pos < self.words.len() {
                self.words[self.pos] = (self.acc >> self.filled) as u32;
            }
            self.pos += 1;
        }
    }

    /// Append `n` zero bits.
    fn zeros(&mut self, n: usize) {
        for _ in 0..n {
            self.put(0, 1);
        }
    }

    /// Append `n` one bits.
    fn ones(&mut self, n: usize) {
        for _ in 0..n {
            self.put(1, 1);
        }
    }

    /// Flush the partial word and return the number of bits written.
    fn finish(self) -> usize {
        if self.filled > 0 && self.pos < self.words.len() {
            self.words[self.pos] = (self.acc as u32) << (32 - self.filled);
        }
        self.emitted
    }
}

/// MSB-first bit reader over a word buffer.
struct BitReader<'a> {
    words: &'a [u32],
    pos: usize,
}

impl<'a> BitReader<'a> {
    fn new(words: &'a [u32]) -> BitReader<'a> {
        BitReader { words, pos: 0 }
    }

    fn get(&mut self, nbits: u32) -> Result<u32> {
        let mut v = 0;
        for _ in 0..nbits {
            let w = self.pos / 32;
            if w >= self.words.len() {
                return decode_error("pixmap: RLE stream underflow");
            }
            v = (v << 1) | ((self.words[w] >> (31 - (self.pos % 32))) & 1);
            self.pos += 1;
        }
        Ok(v)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use rand::rngs::SmallRng;
    use rand::{Rng, SeedableRng};

    fn bits_of(map: &Pixmap) -> Vec<u32> {
        (0..map.len()).map(|i| map.bit(i)).collect()
    }

    #[test]
    fn verify_eq_builder() {
        let data: Vec<u32> = (0..100).map(|i| if i % 7 == 0 { 999 } else { i }).collect();
        let map = Pixmap::from_eq_mask(&data, 999, 0);
        assert_eq!(map.len(), 100);
        assert_eq!(map.popcount(), 15);
        for (i, &v) in data.iter().enumerate() {
            assert_eq!(map.bit(i) == 1, v == 999);
        }

        // Low bits ignored through the mask.
        let map = Pixmap::from_eq_mask(&[0x10, 0x17, 0x20], 0x10, 0x7);
        assert_eq!(bits_of(&map), &[1, 1, 0]);
    }

    #[test]
    fn verify_cmp_builders() {
        let data: Vec<i32> = (-5..5).collect();
        let lt = Pixmap::from_cmp_i32(&data, 0, 0, CmpOp::LtSigned);
        assert_eq!(lt.popcount(), 5);
        let gt = Pixmap::from_cmp_i32(&data, 0, 0, CmpOp::GtSigned);
        assert_eq!(gt.popcount(), 4);

        // Unsigned comparison sees negatives as huge.
        let ltu = Pixmap::from_cmp_i32(&data, 3, 0, CmpOp::LtUnsigned);
        assert_eq!(ltu.popcount(), 3);

        let f = [1.5f32, -2.0, 0.0, 7.25];
        let fgt = Pixmap::from_cmp_f32(&f, 1.0, CmpOp::GtSigned).unwrap();
        assert_eq!(bits_of(&fgt), &[1, 0, 0, 1]);
        assert!(Pixmap::from_cmp_f32(&f, 1.0, CmpOp::Eq).is_err());
    }

    #[test]
    fn verify_word_statistics() {
        let mut data = vec![0u32; 96];
        for v in data.iter_mut().take(32) {
            *v = 5;
        }
        let map = Pixmap::from_eq_mask(&data, 5, 0);
        assert_eq!(map.all_ones_words(), 1);
        assert_eq!(map.all_zero_words(), 2);
    }

    fn rle_round_trip(map: &Pixmap, hint: Option<RleHint>) {
        let encoded = map.rle_encode(hint).unwrap();
        assert!(encoded.is_encoded());
        let decoded = encoded.rle_decode().unwrap();
        assert_eq!(decoded.len(), map.len());
        assert_eq!(bits_of(&decoded), bits_of(map), "hint {:?}", hint);
        assert_eq!(decoded.popcount(), map.popcount());
    }

    #[test]
    fn verify_rle_round_trip_sparse() {
        // Ones every 31 positions plus a few extremes: long zero runs.
        let n = 4095;
        let map = Pixmap::build_with(n, |i| i % 31 == 0 || i >= n - 3);
        for hint in [
            None,
            Some(RleHint::FULL_0 | RleHint::NG12_0),
            Some(RleHint::FULL_0),
            Some(RleHint::empty()),
            Some(RleHint::FULL_0 | RleHint::FULL_1 | RleHint::NG12_0 | RleHint::NG12_1),
        ] {
            rle_round_trip(&map, hint);
        }
    }

    #[test]
    fn verify_rle_round_trip_dense() {
        let map = Pixmap::build_with(4000, |i| i % 5 != 0);
        for hint in [None, Some(RleHint::FULL_1), Some(RleHint::FULL_1 | RleHint::NG12_1)] {
            rle_round_trip(&map, hint);
        }
    }

    #[test]
    fn verify_rle_round_trip_random() {
        let mut rng = SmallRng::seed_from_u64(0x00c0_ffee);
        for _ in 0..20 {
            let n = rng.random_range(1..3000);
            let density = rng.random_range(0..=100);
            let raw: Vec<bool> = (0..n).map(|_| rng.random_range(0..100) < density).collect();
            let map = Pixmap::build_with(n, |i| raw[i]);
            let hint = map.encode_hint().unwrap();
            rle_round_trip(&map, Some(hint));
        }
    }

    #[test]
    fn verify_rle_all_zeros_and_all_ones() {
        let zeros = Pixmap::build_with(2048, |_| false);
        let encoded = zeros.rle_encode(None).unwrap();
        // 2048 zeros in 12-groups is a short stream.
        assert!(encoded.rle_len() < 256);
        rle_round_trip(&zeros, None);

        let ones = Pixmap::build_with(2048, |_| true);
        rle_round_trip(&ones, Some(RleHint::FULL_1 | RleHint::NG12_1));
        rle_round_trip(&ones, None);
    }

    #[test]
    fn verify_rle_single_element() {
        rle_round_trip(&Pixmap::build_with(1, |_| true), None);
        rle_round_trip(&Pixmap::build_with(1, |_| false), None);
    }

    #[test]
    fn verify_rle_trailing_single_runs() {
        // A final run of length one is the nastiest tail shape for the decoder.
        for hint in [None, Some(RleHint::empty()), Some(RleHint::FULL_0 | RleHint::FULL_1)] {
            rle_round_trip(&Pixmap::build_with(3, |i| i != 1), hint);
            rle_round_trip(&Pixmap::build_with(3, |i| i == 1), hint);
            rle_round_trip(&Pixmap::build_with(65, |i| i == 64), hint);
            rle_round_trip(&Pixmap::build_with(65, |i| i != 64), hint);
        }
    }

    #[test]
    fn verify_encode_hint_fast_paths() {
        // Fewer than 1/64 ones: full 12/3 encoding for zeros.
        let sparse = Pixmap::build_with(6400, |i| i % 100 == 0);
        assert_eq!(sparse.encode_hint().unwrap(), RleHint::FULL_0 | RleHint::NG12_0);

        // Fewer than 1/64 zeros: the mirror image.
        let dense = Pixmap::build_with(6400, |i| i % 100 != 0);
        assert_eq!(dense.encode_hint().unwrap(), RleHint::FULL_1 | RleHint::NG12_1);

        // Balanced short runs: simple encoding on both sides.
        let balanced = Pixmap::build_with(4096, |i| (i / 2) % 2 == 0);
        assert_eq!(balanced.encode_hint().unwrap(), RleHint::empty());
    }

    #[test]
    fn verify_restore_into() {
        let n = 200;
        let map = Pixmap::build_with(n, |i| i % 13 == 0);
        let mut dst: Vec<u32> = (0..n as u32).collect();
        map.restore_into(&mut dst, 0xdead).unwrap();
        for (i, &v) in dst.iter().enumerate() {
            if i % 13 == 0 {
                assert_eq!(v, 0xdead);
            }
            else {
                assert_eq!(v, i as u32);
            }
        }

        // Restoring straight from the encoded form behaves identically.
        let encoded = map.rle_encode(None).unwrap();
        let mut dst2: Vec<u32> = (0..n as u32).collect();
        encoded.restore_into(&mut dst2, 0xdead).unwrap();
        assert_eq!(dst, dst2);
    }

    #[test]
    fn verify_from_parts_round_trip() {
        let map = Pixmap::build_with(500, |i| i % 3 == 0);
        let encoded = map.rle_encode(None).unwrap();
        let rebuilt = Pixmap::from_parts(encoded.len(), encoded.rle_len(), encoded.as_words());
        let decoded = rebuilt.rle_decode().unwrap();
        assert_eq!(bits_of(&decoded), bits_of(&map));
    }

    #[test]
    fn verify_misuse_is_rejected() {
        let map = Pixmap::build_with(64, |i| i == 0);
        let encoded = map.rle_encode(None).unwrap();
        assert!(encoded.rle_encode(None).is_err());
        assert!(map.rle_decode().is_err());

        let mut small = [0u32; 1];
        assert!(map.restore_into(&mut small, 1).is_err());
    }
}
