// Gridpack
// Copyright (c) 2024 The Gridpack Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The integer tile codec.
//!
//! A tile holds 1 to 64 signed 32-bit values cut from a 2D array. Values are mapped to zigzag
//! form (or to plain magnitudes when the whole tile shares one sign), the tile minimum is
//! subtracted when that saves at least a bit, and a short/full token scheme shaves the cost of
//! tiles dominated by small values. A 16-bit header describes it all to the decoder:
//!
//! ```text
//!  bits  : field
//!  15..10: number of values minus one (npij)
//!   9.. 8: sign code (01 all >= 0, 10 all < 0, 11 mixed, 00 zero tile)
//!   7.. 6: encoding (0 flat, 1 short/full, 2 zero/full, 3 constant)
//!   5.. 1: bits per token minus one
//!   0    : minimum was subtracted and is stored
//! ```

use gridpack_core::errors::{capacity_error, decode_error, invalid_input_error, Result};
use gridpack_core::io::BitStream;
use gridpack_core::util::bits::{bit_width, from_zigzag, rmask32, to_zigzag};

/// Most values a single tile can hold.
pub const MAX_TILE_VALUES: usize = 64;

/// Sign layout of a tile.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum SignCode {
    /// Constant zero tile; no sign information at all.
    Zero,
    /// Every value is >= 0; magnitudes are stored without a sign bit.
    AllPositive,
    /// Every value is < 0; magnitudes are stored without a sign bit.
    AllNegative,
    /// Mixed signs; zigzag with the sign in the LSB.
    Mixed,
}

impl SignCode {
    fn code(&self) -> u32 {
        match *self {
            SignCode::Zero => 0,
            SignCode::AllPositive => 1,
            SignCode::AllNegative => 2,
            SignCode::Mixed => 3,
        }
    }

    fn from_code(code: u32) -> SignCode {
        match code & 3 {
            1 => SignCode::AllPositive,
            2 => SignCode::AllNegative,
            3 => SignCode::Mixed,
            _ => SignCode::Zero,
        }
    }
}

/// Token layout of a tile.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Encoding {
    /// Every token at full width.
    Flat,
    /// `0` + short token, or `1` + full token.
    ShortFull,
    /// `0` alone for zero, or `1` + full token.
    ZeroFull,
    /// A single value covers the whole tile.
    Constant,
}

impl Encoding {
    fn code(&self) -> u32 {
        match *self {
            Encoding::Flat => 0,
            Encoding::ShortFull => 1,
            Encoding::ZeroFull => 2,
            Encoding::Constant => 3,
        }
    }

    fn from_code(code: u32) -> Encoding {
        match code & 3 {
            1 => Encoding::ShortFull,
            2 => Encoding::ZeroFull,
            3 => Encoding::Constant,
            _ => Encoding::Flat,
        }
    }
}

/// The 16-bit tile header.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct TileHeader {
    /// Number of values minus one (0..=63).
    pub npij: u8,
    pub sign: SignCode,
    pub encoding: Encoding,
    /// Bits per full token minus one.
    pub nbts: u8,
    /// The tile minimum was subtracted and is stored after the header.
    pub min0: bool,
}

impl TileHeader {
    /// Pack into the 16-bit wire form.
    pub fn pack(&self) -> u16 {
        ((u16::from(self.npij) & 0x3f) << 10
            | (self.sign.code() as u16) << 8
            | (self.encoding.code() as u16) << 6
            | (u16::from(self.nbts) & 0x1f) << 1
            | self.min0 as u16) as u16
    }

    /// Unpack from the 16-bit wire form.
    pub fn unpack(w: u16) -> TileHeader {
        TileHeader {
            npij: ((w >> 10) & 0x3f) as u8,
            sign: SignCode::from_code(u32::from(w >> 8) & 3),
            encoding: Encoding::from_code(u32::from(w >> 6) & 3),
            nbts: ((w >> 1) & 0x1f) as u8,
            min0: (w & 1) != 0,
        }
    }
}

/// Everything the encoder decided about one tile.
///
/// Packs to an opaque 64-bit value: header in the top 16 bits, then the minimum, the short
/// token width and the short token count.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct TileProps {
    pub header: TileHeader,
    /// Tile minimum (zigzag domain); the constant value for constant tiles.
    pub min: u32,
    /// Width of short tokens (0 when unused).
    pub bshort: u8,
    /// Number of values that fit a short token.
    pub nshort: u8,
}

impl TileProps {
    /// Pack into the opaque 64-bit form.
    pub fn to_u64(&self) -> u64 {
        (u64::from(self.header.pack()) << 48)
            | (u64::from(self.min) << 16)
            | (u64::from(self.bshort) << 8)
            | u64::from(self.nshort)
    }

    /// Unpack from the opaque 64-bit form.
    pub fn from_u64(v: u64) -> TileProps {
        TileProps {
            header: TileHeader::unpack((v >> 48) as u16),
            min: (v >> 16) as u32,
            bshort: ((v >> 8) & 0xff) as u8,
            nshort: (v & 0xff) as u8,
        }
    }
}

/// Gather a tile from `f` and work out how to encode it.
///
/// `f` is indexed as `f[j * lni + i]` for `i < ni`, `j < nj`. On return `tile[..ni * nj]` holds
/// the values ready for the token loop: zigzag mapped, sign bit dropped for uniform-sign tiles,
/// and the minimum already subtracted when the header says so.
pub fn gather_tile_properties(
    f: &[i32],
    ni: usize,
    lni: usize,
    nj: usize,
    tile: &mut [u32; MAX_TILE_VALUES],
) -> Result<TileProps> {
    let nij = ni * nj;
    if ni == 0 || nj == 0 || nij > MAX_TILE_VALUES {
        return invalid_input_error("tile: dimensions must satisfy 1 <= ni*nj <= 64");
    }
    if (nj - 1) * lni + ni > f.len() {
        return invalid_input_error("tile: source array too small");
    }

    let mut neg = 0xffff_ffffu32;
    let mut pos = 0xffff_ffffu32;
    for j in 0..nj {
        for i in 0..ni {
            let v = f[j * lni + i] as u32;
            neg &= v;
            pos &= !v;
            tile[j * ni + i] = to_zigzag(v as i32);
        }
    }
    let neg = neg >> 31 == 1;
    let pos = pos >> 31 == 1;

    let mut max = 0u32;
    let mut min = u32::MAX;
    for &t in tile[..nij].iter() {
        max = max.max(t);
        min = min.min(t);
    }

    let mut header = TileHeader {
        npij: (nij - 1) as u8,
        sign: SignCode::Mixed,
        encoding: Encoding::Flat,
        nbts: 0,
        min0: false,
    };

    if max == min {
        // One value for the whole tile, kept in full zigzag form.
        return Ok(constant_tile_scheme(header, min));
    }

    // Subtracting the minimum must save at least one bit to pay for storing it.
    let nbits = bit_width(max);
    if bit_width(max - min) < nbits {
        max -= min;
        for t in tile[..nij].iter_mut() {
            *t -= min;
        }
        header.min0 = true;
    }
    let mut nbits = bit_width(max);

    if neg || pos {
        // Uniform sign lives in the header; the zigzag LSB is redundant.
        nbits -= 1;
        min >>= 1;
        for t in tile[..nij].iter_mut() {
            *t >>= 1;
        }
        header.sign = if neg { SignCode::AllNegative } else { SignCode::AllPositive };
    }
    if min == 0 {
        header.min0 = false;
    }
    header.nbts = (nbits - 1) as u8;

    // Full-width tokens leave no room for a short/full tag bit.
    if nbits >= 32 {
        return Ok(TileProps { header, min, bshort: 0, nshort: 0 });
    }

    // Try the zero-token policy and four short-token widths around nbits/2.
    let nb0 = (nbits + 2) >> 1;
    let mut nzero = 0u32;
    for &t in tile[..nij].iter() {
        if t == 0 {
            nzero += 1;
        }
    }
    let flat_cost = nij as u32 * nbits;
    let mut best_cost = flat_cost;
    let mut best: Option<(u32, u32)> = None;

    let zero_cost = nzero + (nij as u32 - nzero) * (nbits + 1);
    if zero_cost < best_cost {
        best_cost = zero_cost;
        best = Some((0, nzero));
    }
    for cand in [nb0, nb0.wrapping_sub(1), nb0 + 1, nb0.wrapping_sub(2)] {
        // A candidate width below one would be meaningless; skip it.
        if cand < 1 || cand >= nbits {
            continue;
        }
        let mask = !rmask32(cand);
        let mut nshort = 0u32;
        for &t in tile[..nij].iter() {
            if t & mask == 0 {
                nshort += 1;
            }
        }
        let cost = 5 + nshort * (cand + 1) + (nij as u32 - nshort) * (nbits + 1);
        if cost < best_cost {
            best_cost = cost;
            best = Some((cand, nshort));
        }
    }

    let mut props = TileProps { header, min, bshort: 0, nshort: 0 };
    if let Some((bshort, nshort)) = best {
        props.header.encoding =
            if bshort == 0 { Encoding::ZeroFull } else { Encoding::ShortFull };
        props.bshort = bshort as u8;
        props.nshort = nshort as u8;
    }
    Ok(props)
}

fn constant_tile_scheme(mut header: TileHeader, min: u32) -> TileProps {
    header.encoding = Encoding::Constant;
    header.min0 = false;
    if min == 0 {
        header.sign = SignCode::Zero;
        header.nbts = 0;
    }
    else {
        header.sign = SignCode::Mixed;
        header.nbts = (bit_width(min) - 1) as u8;
    }
    TileProps { header, min, bshort: 0, nshort: 0 }
}

/// Encode a gathered tile into a big-endian bit stream. Returns the bits inserted.
pub fn encode_contiguous(
    props: &TileProps,
    s: &mut BitStream,
    tile: &[u32; MAX_TILE_VALUES],
) -> Result<u32> {
    let h = &props.header;
    let nij = usize::from(h.npij) + 1;
    let nbits = u32::from(h.nbts) + 1;
    let nbits0 = u32::from(props.bshort);
    let nshort = u32::from(props.nshort);

    // How many bits this tile needs, worst case, before touching the stream.
    let mut needed = if nbits0 != 0 { 21 } else { 16 };
    if h.min0 {
        needed += 5 + bit_width(props.min);
    }
    let tokens = if h.encoding == Encoding::Constant { 1 } else { nij as u32 };
    needed += nbits0 * nshort + nbits * (tokens - nshort.min(tokens));
    if h.encoding == Encoding::ShortFull || h.encoding == Encoding::ZeroFull {
        needed += tokens;
    }
    match s.available_space() {
        Some(space) if space as u32 >= needed => (),
        Some(_) => return capacity_error("tile: not enough room in stream"),
        None => return invalid_input_error("tile: stream not in insert mode"),
    }

    let mut nbtot = 16;
    s.put_bits(u32::from(h.pack()), 16)?;
    if h.encoding == Encoding::ShortFull {
        s.put_bits(nbits0, 5)?;
        nbtot += 5;
    }

    if h.encoding == Encoding::Constant {
        if props.min != 0 {
            s.put_bits(props.min, nbits)?;
            nbtot += nbits;
        }
        s.push()?;
        return Ok(nbtot);
    }

    if h.min0 {
        let nbitsm = bit_width(props.min);
        s.put_bits(nbitsm - 1, 5)?;
        s.put_bits(props.min, nbitsm)?;
        nbtot += nbitsm + 5;
    }

    match h.encoding {
        Encoding::Flat => {
            for &w in tile[..nij].iter() {
                s.put_bits(w, nbits)?;
                nbtot += nbits;
            }
        }
        Encoding::ShortFull => {
            let mask = !rmask32(nbits0);
            let full_flag = 1 << nbits;
            for &w in tile[..nij].iter() {
                if w & mask == 0 {
                    s.put_bits(w, nbits0 + 1)?;
                    nbtot += nbits0 + 1;
                }
                else {
                    s.put_bits(w | full_flag, nbits + 1)?;
                    nbtot += nbits + 1;
                }
            }
        }
        Encoding::ZeroFull => {
            let full_flag = 1 << nbits;
            for &w in tile[..nij].iter() {
                if w == 0 {
                    s.put_bits(0, 1)?;
                    nbtot += 1;
                }
                else {
                    s.put_bits(w | full_flag, nbits + 1)?;
                    nbtot += nbits + 1;
                }
            }
        }
        Encoding::Constant => unreachable!(),
    }

    s.push()?;
    Ok(nbtot)
}

/// Gather, analyze and encode one tile. Returns the bits inserted into the stream.
pub fn encode_tile(
    f: &[i32],
    ni: usize,
    lni: usize,
    nj: usize,
    s: &mut BitStream,
) -> Result<u32> {
    let mut tile = [0u32; MAX_TILE_VALUES];
    let props = gather_tile_properties(f, ni, lni, nj, &mut tile)?;
    encode_contiguous(&props, s, &tile)
}

/// Encode a whole 2D array as 8x8 tiles, row-major. Returns the total bits inserted.
pub fn encode_as_tiles(f: &[i32], ni: usize, lni: usize, nj: usize, s: &mut BitStream) -> Result<u32> {
    let mut nbtot = 0;
    for j0 in (0..nj).step_by(8) {
        let nj0 = (nj - j0).min(8);
        for i0 in (0..ni).step_by(8) {
            let ni0 = (ni - i0).min(8);
            nbtot += encode_tile(&f[j0 * lni + i0..], ni0, lni, nj0, s)?;
        }
    }
    Ok(nbtot)
}

/// Decode one tile into `f` (same indexing as the encoder). Returns the bits consumed and the
/// number of values the tile claimed to hold.
pub fn decode_tile(
    f: &mut [i32],
    ni: usize,
    lni: usize,
    nj: usize,
    s: &mut BitStream,
) -> Result<(u32, usize)> {
    if !s.is_valid() {
        return invalid_input_error("tile: invalid bit stream");
    }
    let header = TileHeader::unpack(s.get_bits(16)? as u16);
    let mut nbtot = 16;
    let nij = usize::from(header.npij) + 1;
    if ni * nj != nij {
        return decode_error("tile: dimension mismatch");
    }
    let nbits = u32::from(header.nbts) + 1;

    let mut nbits0 = 0;
    if header.encoding == Encoding::ShortFull {
        nbits0 = s.get_bits(5)?;
        nbtot += 5;
    }

    if header.encoding == Encoding::Constant {
        let value = if header.sign == SignCode::Mixed {
            let w = s.get_bits(nbits)?;
            nbtot += nbits;
            from_zigzag(w)
        }
        else {
            0
        };
        for j in 0..nj {
            for i in 0..ni {
                f[j * lni + i] = value;
            }
        }
        return Ok((nbtot, nij));
    }

    let mut min = 0;
    if header.min0 {
        let nbitsm = s.get_bits(5)? + 1;
        min = s.get_bits(nbitsm)?;
        nbtot += nbitsm + 5;
    }

    let mut fe = [0u32; MAX_TILE_VALUES];
    match header.encoding {
        Encoding::Flat => {
            for w in fe[..nij].iter_mut() {
                *w = s.get_bits(nbits)? + min;
                nbtot += nbits;
            }
        }
        Encoding::ShortFull => {
            for w in fe[..nij].iter_mut() {
                let width = if s.get_bits(1)? != 0 { nbits } else { nbits0 };
                *w = s.get_bits(width)? + min;
                nbtot += width + 1;
            }
        }
        Encoding::ZeroFull => {
            for w in fe[..nij].iter_mut() {
                if s.get_bits(1)? != 0 {
                    *w = s.get_bits(nbits)? + min;
                    nbtot += nbits + 1;
                }
                else {
                    *w = min;
                    nbtot += 1;
                }
            }
        }
        Encoding::Constant => unreachable!(),
    }

    for j in 0..nj {
        for i in 0..ni {
            let w = fe[j * ni + i];
            f[j * lni + i] = match header.sign {
                SignCode::AllPositive => w as i32,
                SignCode::AllNegative => !(w as i32),
                _ => from_zigzag(w),
            };
        }
    }
    Ok((nbtot, nij))
}

/// Decode a whole array encoded with [`encode_as_tiles`]. Returns the total bits consumed.
pub fn decode_as_tiles(
    f: &mut [i32],
    ni: usize,
    lni: usize,
    nj: usize,
    s: &mut BitStream,
) -> Result<u32> {
    let mut nbtot = 0;
    for j0 in (0..nj).step_by(8) {
        let nj0 = (nj - j0).min(8);
        for i0 in (0..ni).step_by(8) {
            let ni0 = (ni - i0).min(8);
            let (nbits, nptsij) = decode_tile(&mut f[j0 * lni + i0..], ni0, lni, nj0, s)?;
            if nptsij != ni0 * nj0 {
                return decode_error("tile: tile size does not match the walk");
            }
            nbtot += nbits;
        }
    }
    Ok(nbtot)
}

#[cfg(test)]
mod tests {
    use super::*;
    use gridpack_core::io::{ByteOrder, StreamMode};

    fn stream() -> BitStream {
        BitStream::new(ByteOrder::BigEndian, 512, StreamMode::ReadWrite)
    }

    fn round_trip(f: &[i32], ni: usize, lni: usize, nj: usize) -> Vec<i32> {
        let mut s = stream();
        let put = encode_tile(f, ni, lni, nj, &mut s).unwrap();
        s.rewind(false);
        let mut out = vec![0i32; f.len()];
        let (got, nptsij) = decode_tile(&mut out, ni, lni, nj, &mut s).unwrap();
        assert_eq!(put, got);
        assert_eq!(nptsij, ni * nj);
        out
    }

    #[test]
    fn verify_header_round_trip() {
        let h = TileHeader {
            npij: 63,
            sign: SignCode::Mixed,
            encoding: Encoding::ShortFull,
            nbts: 17,
            min0: true,
        };
        assert_eq!(TileHeader::unpack(h.pack()), h);

        let p = TileProps { header: h, min: 0xabcd_1234, bshort: 7, nshort: 41 };
        assert_eq!(TileProps::from_u64(p.to_u64()), p);
    }

    #[test]
    fn verify_4x4_gradient_tile() {
        // t[j][i] = 1000*i + j over a 4x4 tile.
        let mut f = vec![0i32; 16];
        for j in 0..4 {
            for i in 0..4 {
                f[j * 4 + i] = 1000 * i as i32 + j as i32;
            }
        }
        assert_eq!(round_trip(&f, 4, 4, 4), f);
    }

    #[test]
    fn verify_8x8_mixed_sign_tile() {
        let mut f = vec![0i32; 64];
        for (k, v) in f.iter_mut().enumerate() {
            *v = (k as i32 - 31) * 7;
        }
        assert_eq!(round_trip(&f, 8, 8, 8), f);
    }

    #[test]
    fn verify_all_negative_tile() {
        let f: Vec<i32> = (0..64).map(|k| -1 - k * 3).collect();
        assert_eq!(round_trip(&f, 8, 8, 8), f);
    }

    #[test]
    fn verify_constant_tiles() {
        let f = vec![42i32; 16];
        let mut s = stream();
        let bits = encode_tile(&f, 4, 4, 4, &mut s).unwrap();
        // Header plus the single constant value.
        assert_eq!(bits, 16 + bit_width(to_zigzag(42)));
        s.rewind(false);
        let mut out = vec![0i32; 16];
        decode_tile(&mut out, 4, 4, 4, &mut s).unwrap();
        assert_eq!(out, f);

        let f = vec![0i32; 16];
        let mut s = stream();
        assert_eq!(encode_tile(&f, 4, 4, 4, &mut s).unwrap(), 16);
        s.rewind(false);
        let mut out = vec![-1i32; 16];
        decode_tile(&mut out, 4, 4, 4, &mut s).unwrap();
        assert_eq!(out, f);

        let f = vec![-5i32; 9];
        assert_eq!(round_trip(&f, 3, 3, 3), f);
    }

    #[test]
    fn verify_short_token_policy_pays_off() {
        // Mostly tiny values with a few large outliers: short/full must beat flat.
        let mut f = vec![1i32; 64];
        f[5] = 100_000;
        f[40] = 99_999;
        let mut tile = [0u32; MAX_TILE_VALUES];
        let props = gather_tile_properties(&f, 8, 8, 8, &mut tile).unwrap();
        assert_eq!(props.header.encoding, Encoding::ShortFull);

        assert_eq!(round_trip(&f, 8, 8, 8), f);
    }

    #[test]
    fn verify_zero_token_policy() {
        let mut f = vec![0i32; 64];
        f[3] = 77_777;
        f[60] = 77_778;
        let mut tile = [0u32; MAX_TILE_VALUES];
        let props = gather_tile_properties(&f, 8, 8, 8, &mut tile).unwrap();
        assert_eq!(props.header.encoding, Encoding::ZeroFull);

        assert_eq!(round_trip(&f, 8, 8, 8), f);
    }

    #[test]
    fn verify_minimum_subtraction() {
        let f: Vec<i32> = (0..16).map(|k| 100_000 + k).collect();
        let mut tile = [0u32; MAX_TILE_VALUES];
        let props = gather_tile_properties(&f, 4, 4, 4, &mut tile).unwrap();
        assert!(props.header.min0);
        assert_eq!(round_trip(&f, 4, 4, 4), f);
    }

    #[test]
    fn verify_odd_shapes() {
        for (ni, nj) in [(1, 1), (3, 2), (5, 7), (8, 1), (1, 8), (7, 8)] {
            let lni = ni;
            let f: Vec<i32> = (0..ni * nj).map(|k| (k as i32 * 37 % 113) - 50).collect();
            assert_eq!(round_trip(&f, ni, lni, nj), f, "{}x{}", ni, nj);
        }
    }

    #[test]
    fn verify_strided_tile() {
        // A 4x4 tile cut out of a wider row.
        let lni = 10;
        let mut f = vec![-999i32; lni * 4];
        for j in 0..4 {
            for i in 0..4 {
                f[j * lni + i] = (j * 4 + i) as i32;
            }
        }
        let mut s = stream();
        encode_tile(&f, 4, lni, 4, &mut s).unwrap();
        s.rewind(false);
        let mut out = vec![-999i32; lni * 4];
        decode_tile(&mut out, 4, lni, 4, &mut s).unwrap();
        for j in 0..4 {
            for i in 0..4 {
                assert_eq!(out[j * lni + i], f[j * lni + i]);
            }
        }
        // Values outside the tile stay untouched.
        assert_eq!(out[4], -999);
    }

    #[test]
    fn verify_whole_array_tiling() {
        let (ni, nj) = (37, 23);
        let f: Vec<i32> = (0..ni * nj).map(|k| (k as i32).wrapping_mul(2654435761u32 as i32) >> 16).collect();
        let mut s = BitStream::new(ByteOrder::BigEndian, 4096, StreamMode::ReadWrite);
        let put = encode_as_tiles(&f, ni, ni, nj, &mut s).unwrap();
        s.rewind(false);
        let mut out = vec![0i32; ni * nj];
        let got = decode_as_tiles(&mut out, ni, ni, nj, &mut s).unwrap();
        assert_eq!(put, got);
        assert_eq!(out, f);
    }

    #[test]
    fn verify_dimension_mismatch_is_detected() {
        let f = vec![5i32; 16];
        let mut s = stream();
        encode_tile(&f, 4, 4, 4, &mut s).unwrap();
        s.rewind(false);
        let mut out = vec![0i32; 16];
        assert!(decode_tile(&mut out, 8, 8, 2, &mut s).is_err());
    }

    #[test]
    fn verify_capacity_precheck() {
        let f: Vec<i32> = (0..64).map(|k| k * 1001).collect();
        let mut s = BitStream::new(ByteOrder::BigEndian, 2, StreamMode::ReadWrite);
        assert!(encode_tile(&f, 8, 8, 8, &mut s).is_err());
    }

    #[test]
    fn verify_encoded_cost_never_exceeds_flat() {
        // Whatever the policy, the bill must not exceed header overhead plus flat tokens.
        let patterns: [&dyn Fn(usize) -> i32; 4] = [
            &|k| k as i32,
            &|k| if k % 9 == 0 { 1 << 20 } else { 3 },
            &|k| -((k * k) as i32),
            &|k| ((k as i32) % 5) - 2,
        ];
        for gen in patterns {
            let f: Vec<i32> = (0..64).map(gen).collect();
            let mut tile = [0u32; MAX_TILE_VALUES];
            let props = gather_tile_properties(&f, 8, 8, 8, &mut tile).unwrap();
            let mut s = stream();
            let bits = encode_contiguous(&props, &mut s, &tile).unwrap();
            let nbits = u32::from(props.header.nbts) + 1;
            assert!(bits <= 21 + 5 + 32 + 64 * nbits, "pattern cost {}", bits);
        }
    }
}
