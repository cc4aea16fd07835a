// Gridpack
// Copyright (c) 2024 The Gridpack Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The 4x4 float block codec.
//!
//! Sixteen floats are split into sign, exponent and mantissa. Exponents are stored as deltas
//! from the block minimum; the sign bit is dropped when the whole block shares one sign; the
//! mantissa keeps whatever bits remain of the budget, rounded. Each value becomes one token of
//! `nbits` bits, and a block on the wire is `nbits + 1` 16-bit tokens:
//!
//! ```text
//!  header (16 bits): emin:8 | spare:3 | sign:1 | sbits:1 | ebits:3
//!  data: 16 tokens of nbits bits each, packed big-endian
//! ```
//!
//! Partial blocks at array edges are padded with the block's first value, which costs nothing
//! in the exponent range.

use gridpack_core::errors::{invalid_input_error, unsupported_error, Result};
use gridpack_core::util::bits::{bit_width, rmask32};
use gridpack_core::util::ieee;

/// Smallest usable token width.
pub const FLOAT_BLOCK_MIN_NBITS: u32 = 3;

/// Largest usable token width.
pub const FLOAT_BLOCK_MAX_NBITS: u32 = 23;

/// Number of 16-bit stream tokens one block occupies.
pub fn float_block_stream_len(nbits: u32) -> usize {
    nbits.clamp(FLOAT_BLOCK_MIN_NBITS, FLOAT_BLOCK_MAX_NBITS) as usize + 1
}

/// Encode a 4x4 block of floats using `nbits` bits per value.
///
/// `f` is indexed as `f[j * lni + i]`; `ni` and `nj` give the useful extent (at most 4 each).
/// Returns the number of 16-bit tokens written and the block header.
pub fn float_block_encode_4x4(
    f: &[f32],
    lni: usize,
    nbits: u32,
    stream: &mut [u16],
    ni: usize,
    nj: usize,
) -> Result<(usize, u16)> {
    let nbits = nbits.clamp(FLOAT_BLOCK_MIN_NBITS, FLOAT_BLOCK_MAX_NBITS);
    let ni = ni.min(4);
    let nj = nj.min(4);
    if ni == 0 || nj == 0 {
        return invalid_input_error("float block: empty block");
    }
    if (nj - 1) * lni + ni > f.len() {
        return invalid_input_error("float block: source array too small");
    }
    if stream.len() < nbits as usize + 1 {
        return invalid_input_error("float block: output stream too small");
    }

    // Gather, padding a partial block with its first value.
    let mut fl = [f[0]; 16];
    for j in 0..nj {
        for i in 0..ni {
            fl[j * 4 + i] = f[j * lni + i];
        }
    }

    // Sign analysis: 0 bits when uniform, 1 bit per value otherwise.
    let neg_count = fl.iter().filter(|v| ieee::is_negative(v.to_bits())).count();
    let sbits = if neg_count == 0 || neg_count == 16 { 0u32 } else { 1 };
    let block_sign = if sbits == 0 && neg_count == 16 { 1u32 } else { 0 };

    let mut emin = 255u32;
    let mut emax = 0u32;
    for v in &fl {
        let e = ieee::biased_exponent(v.to_bits());
        emin = emin.min(e);
        emax = emax.max(e);
    }
    let ebits = bit_width(emax - emin);
    if ebits > 7 {
        return unsupported_error("float block: exponent spread exceeds 2^127");
    }
    if nbits < ebits + sbits {
        return invalid_input_error("float block: no mantissa bits left");
    }
    let mbits = nbits - ebits - sbits;
    let round = if mbits >= 23 { 0 } else { 1u32 << (22 - mbits) };

    let header = ((emin << 8) | (block_sign << 4) | (sbits << 3) | ebits) as u16;
    stream[0] = header;

    // Token: [sign?][delta exponent][rounded mantissa], nbits wide.
    let mut acc = 0u64;
    let mut filled = 0u32;
    let mut pos = 1;
    for v in &fl {
        let u = v.to_bits();
        let mant = (ieee::mantissa(u) + round).min(ieee::MANT_MASK);
        let dexp = ieee::biased_exponent(u) - emin;
        let mut token = (mant | (dexp << 23)) << (9 - sbits - ebits) >> (32 - nbits);
        if sbits != 0 {
            token |= (u >> 31) << (nbits - 1);
        }

        acc = (acc << nbits) | u64::from(token);
        filled += nbits;
        while filled >= 16 {
            filled -= 16;
            stream[pos] = (acc >> filled) as u16;
            pos += 1;
        }
    }
    if filled > 0 {
        stream[pos] = ((acc << (16 - filled)) & 0xffff) as u16;
        pos += 1;
    }
    debug_assert_eq!(pos, nbits as usize + 1);
    Ok((pos, header))
}

/// Decode a block encoded with [`float_block_encode_4x4`] into a contiguous 4x4 array.
///
/// Returns the number of 16-bit tokens consumed and the block header.
pub fn float_block_decode_4x4(
    f: &mut [f32; 16],
    nbits: u32,
    stream: &[u16],
) -> Result<(usize, u16)> {
    let nbits = nbits.clamp(FLOAT_BLOCK_MIN_NBITS, FLOAT_BLOCK_MAX_NBITS);
    if stream.len() < nbits as usize + 1 {
        return invalid_input_error("float block: input stream too small");
    }

    let header = stream[0];
    let ebits = u32::from(header) & 7;
    let sbits = (u32::from(header) >> 3) & 1;
    let esign = (u32::from(header) >> 4) & 1;
    let emin = u32::from(header) >> 8;
    if nbits < ebits + sbits {
        return invalid_input_error("float block: no mantissa bits left");
    }
    let mbits = nbits - ebits - sbits;
    let maskm = rmask32(mbits);
    let maske = rmask32(ebits);
    // With a uniform sign the header bit applies to every value.
    let sign = if sbits == 0 { esign } else { 0 };

    let mut acc = 0u64;
    let mut avail = 0u32;
    let mut pos = 1;
    for out in f.iter_mut() {
        while avail < nbits {
            acc = (acc << 16) | u64::from(stream[pos]);
            pos += 1;
            avail += 16;
        }
        avail -= nbits;
        let mut s = ((acc >> avail) as u32) & rmask32(nbits);

        let mut t = (s & maskm) << (23 - mbits);
        s >>= mbits;
        t |= (emin + (s & maske)) << 23;
        s >>= ebits;
        s |= sign;
        t |= s << 31;
        *out = f32::from_bits(t);
    }
    Ok((nbits as usize + 1, header))
}

/// Encode a whole 2D float array as 4x4 blocks, row-major. Returns the 16-bit tokens written.
pub fn float_array_encode_4x4(
    f: &[f32],
    lni: usize,
    ni: usize,
    nj: usize,
    stream: &mut [u16],
    nbits: u32,
) -> Result<usize> {
    let mut used = 0;
    for j0 in (0..nj).step_by(4) {
        for i0 in (0..ni).step_by(4) {
            let (n, _) = float_block_encode_4x4(
                &f[j0 * lni + i0..],
                lni,
                nbits,
                &mut stream[used..],
                ni - i0,
                nj - j0,
            )?;
            used += n;
        }
    }
    Ok(used)
}

/// Decode a whole array encoded with [`float_array_encode_4x4`]. Returns the tokens consumed.
pub fn float_array_decode_4x4(
    r: &mut [f32],
    lni: usize,
    ni: usize,
    nj: usize,
    stream: &[u16],
    nbits: u32,
) -> Result<usize> {
    let mut used = 0;
    let mut local = [0.0f32; 16];
    for j0 in (0..nj).step_by(4) {
        for i0 in (0..ni).step_by(4) {
            let (n, _) = float_block_decode_4x4(&mut local, nbits, &stream[used..])?;
            used += n;
            for j in 0..4.min(nj - j0) {
                for i in 0..4.min(ni - i0) {
                    r[(j0 + j) * lni + i0 + i] = local[j * 4 + i];
                }
            }
        }
    }
    Ok(used)
}

/// Decode a rectangular window out of a block stream produced by [`float_array_encode_4x4`]
/// over a virtual array of row length `gni`.
///
/// The window starts at `(ix0, jx0)` and spans `ni` by `nj` values; `r` is indexed with row
/// length `lni`. Only the blocks overlapping the window are decoded.
pub fn float_array_section_4x4(
    r: &mut [f32],
    gni: usize,
    lni: usize,
    ni: usize,
    nj: usize,
    ix0: usize,
    jx0: usize,
    stream: &[u16],
    nbits: u32,
) -> Result<()> {
    if ni == 0 || nj == 0 {
        return invalid_input_error("float section: empty window");
    }
    let bsize = float_block_stream_len(nbits);
    let nbi = (gni + 3) / 4;
    let ixn = ix0 + ni - 1;
    let jxn = jx0 + nj - 1;

    let mut local = [0.0f32; 16];
    for bj in jx0 / 4..=jxn / 4 {
        let j0 = bj * 4;
        for bi in ix0 / 4..=ixn / 4 {
            let i0 = bi * 4;
            let start = (bi + bj * nbi) * bsize;
            if start + bsize > stream.len() {
                return invalid_input_error("float section: stream too small for the window");
            }
            float_block_decode_4x4(&mut local, nbits, &stream[start..])?;

            let il = i0.max(ix0);
            let ih = (i0 + 3).min(ixn);
            let jl = j0.max(jx0);
            let jh = (j0 + 3).min(jxn);
            for j in jl..=jh {
                for i in il..=ih {
                    r[(j - jx0) * lni + (i - ix0)] = local[(j - j0) * 4 + (i - i0)];
                }
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Worst-case restore error: one LSB of the retained mantissa at the block's top exponent.
    fn error_bound(f: &[f32; 16], nbits: u32) -> f32 {
        let mut emin = 255u32;
        let mut emax = 0u32;
        let mut mixed = false;
        let neg = f.iter().filter(|v| ieee::is_negative(v.to_bits())).count();
        if neg != 0 && neg != 16 {
            mixed = true;
        }
        for v in f {
            let e = ieee::biased_exponent(v.to_bits());
            emin = emin.min(e);
            emax = emax.max(e);
        }
        let ebits = bit_width(emax - emin);
        let mbits = nbits - ebits - mixed as u32;
        (2.0f32).powi(emax as i32 - 127) * (2.0f32).powi(-(mbits as i32 - 1))
    }

    fn round_trip(f: &[f32; 16], nbits: u32) -> [f32; 16] {
        let mut stream = [0u16; 24];
        let (n, _) = float_block_encode_4x4(f, 4, nbits, &mut stream, 4, 4).unwrap();
        assert_eq!(n, nbits.clamp(3, 23) as usize + 1);
        let mut out = [0.0f32; 16];
        let (m, _) = float_block_decode_4x4(&mut out, nbits, &stream).unwrap();
        assert_eq!(m, n);
        out
    }

    #[test]
    fn verify_block_round_trip_all_widths() {
        // Exponent spread of one octave so even the smallest budget keeps a mantissa bit.
        let mut f = [0.0f32; 16];
        for (k, v) in f.iter_mut().enumerate() {
            *v = 16.0 + k as f32 * 3.0 + 0.625;
        }
        for nbits in 3..=23 {
            let out = round_trip(&f, nbits);
            let bound = error_bound(&f, nbits);
            for (x, y) in f.iter().zip(&out) {
                assert!((x - y).abs() <= bound, "nbits {}: {} vs {} (bound {})", nbits, x, y, bound);
            }
        }
    }

    #[test]
    fn verify_mixed_sign_block() {
        let mut f = [0.0f32; 16];
        for (k, v) in f.iter_mut().enumerate() {
            *v = (k as f32 - 7.5) * 3.25;
        }
        let out = round_trip(&f, 16);
        let bound = error_bound(&f, 16);
        for (x, y) in f.iter().zip(&out) {
            assert!((x - y).abs() <= bound, "{} vs {}", x, y);
            assert_eq!(x.is_sign_negative(), y.is_sign_negative());
        }
    }

    #[test]
    fn verify_all_negative_block() {
        let f = [-2.5f32; 16];
        let out = round_trip(&f, 12);
        for y in &out {
            assert!((y + 2.5).abs() < 0.001);
            assert!(y.is_sign_negative());
        }
    }

    #[test]
    fn verify_uniform_exponent_block() {
        // Shared exponent: every budget bit goes to the mantissa.
        let f = [1.5f32, 1.25, 1.75, 1.0625, 1.5, 1.25, 1.75, 1.0625, 1.5, 1.25, 1.75, 1.0625,
            1.5, 1.25, 1.75, 1.0625];
        let out = round_trip(&f, 8);
        for (x, y) in f.iter().zip(&out) {
            assert!((x - y).abs() <= 1.0 / 128.0, "{} vs {}", x, y);
        }
    }

    #[test]
    fn verify_array_round_trip_with_partial_blocks() {
        let (ni, nj) = (10, 7);
        let mut f = vec![0.0f32; ni * nj];
        for j in 0..nj {
            for i in 0..ni {
                f[j * ni + i] = (i as f32 + 1.0) * 16.0 + j as f32;
            }
        }
        let nbits = 18;
        let blocks = ((ni + 3) / 4) * ((nj + 3) / 4);
        let mut stream = vec![0u16; blocks * (nbits as usize + 1)];
        let used = float_array_encode_4x4(&f, ni, ni, nj, &mut stream, nbits).unwrap();
        assert_eq!(used, stream.len());

        let mut r = vec![0.0f32; ni * nj];
        let got = float_array_decode_4x4(&mut r, ni, ni, nj, &stream, nbits).unwrap();
        assert_eq!(got, used);
        for (x, y) in f.iter().zip(&r) {
            assert!((x - y).abs() <= 0.25, "{} vs {}", x, y);
        }
    }

    #[test]
    fn verify_section_decode() {
        let (gni, gnj) = (16, 12);
        let mut f = vec![0.0f32; gni * gnj];
        for j in 0..gnj {
            for i in 0..gni {
                f[j * gni + i] = 100.0 + (j * gni + i) as f32;
            }
        }
        let nbits = 20;
        let blocks = (gni / 4) * (gnj / 4);
        let mut stream = vec![0u16; blocks * (nbits as usize + 1)];
        float_array_encode_4x4(&f, gni, gni, gnj, &mut stream, nbits).unwrap();

        // A 5x3 window straddling block boundaries.
        let (ni, nj, ix0, jx0) = (5, 3, 3, 2);
        let mut r = vec![0.0f32; ni * nj];
        float_array_section_4x4(&mut r, gni, ni, ni, nj, ix0, jx0, &stream, nbits).unwrap();
        for j in 0..nj {
            for i in 0..ni {
                let want = f[(jx0 + j) * gni + ix0 + i];
                let got = r[j * ni + i];
                assert!((want - got).abs() <= 0.5, "({}, {}): {} vs {}", i, j, want, got);
            }
        }
    }

    #[test]
    fn verify_rejects_extreme_spread() {
        let mut f = [1.0e-30f32; 16];
        f[3] = 1.0e30;
        let mut stream = [0u16; 24];
        assert!(float_block_encode_4x4(&f, 4, 16, &mut stream, 4, 4).is_err());
    }

    #[test]
    fn verify_nbits_is_clamped() {
        let f = [3.0f32; 16];
        let mut stream = [0u16; 24];
        let (n, _) = float_block_encode_4x4(&f, 4, 1, &mut stream, 4, 4).unwrap();
        assert_eq!(n, 4);
        let (n, _) = float_block_encode_4x4(&f, 4, 30, &mut stream, 4, 4).unwrap();
        assert_eq!(n, 24);
    }
}
