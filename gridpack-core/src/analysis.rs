// Gridpack
// Copyright (c) 2024 The Gridpack Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The `analysis` module scans 32-bit arrays for the extrema and sign properties the quantizers
//! and tile encoders key their decisions on.
//!
//! Floats are processed entirely in integer mode: ordering is obtained through the monotone
//! fake-signed transform, which sidesteps NaN comparison semantics while preserving IEEE order.

use crate::util::ieee;

/// Extrema and sign properties of a 32-bit array.
///
/// For float arrays, `mins` and `maxs` hold the raw IEEE bit patterns of the minimum and maximum
/// values; `mina`, `min0` and `maxa` hold magnitudes (sign cleared). For integer arrays, `mins`
/// and `maxs` are the signed extrema and the magnitude fields hold absolute values.
#[derive(Copy, Clone, Debug, Default)]
pub struct Extrema {
    /// Minimum signed value (bit pattern for floats).
    pub mins: i32,
    /// Maximum signed value (bit pattern for floats).
    pub maxs: i32,
    /// Smallest absolute value.
    pub mina: u32,
    /// Smallest non-zero absolute value (saturated when the array is all zeros).
    pub min0: u32,
    /// Largest absolute value.
    pub maxa: u32,
    /// All values are >= 0.
    pub allp: bool,
    /// All values are < 0.
    pub allm: bool,
}

impl Extrema {
    /// Minimum value reinterpreted as a float.
    pub fn min_f32(&self) -> f32 {
        f32::from_bits(self.mins as u32)
    }

    /// Maximum value reinterpreted as a float.
    pub fn max_f32(&self) -> f32 {
        f32::from_bits(self.maxs as u32)
    }

    /// True when the array carried a single repeated magnitude.
    pub fn is_constant(&self) -> bool {
        self.mina == self.maxa
    }
}

/// Identifies array elements to exclude from analysis, and what to study in their place.
///
/// An element `v` is missing when `(v & !mask) == (special & !mask)`. When no replacement is
/// supplied, the first non-missing element of the array is promoted to the replacement; if every
/// element is missing, the first element is used, which degenerates the scan to a constant.
#[derive(Copy, Clone, Debug)]
pub struct MissingSpec {
    /// The "missing" bit pattern.
    pub special: u32,
    /// Bits set here are ignored when matching `special`.
    pub mask: u32,
    /// Replacement value studied in place of missing elements.
    pub replace: Option<u32>,
}

impl MissingSpec {
    fn masked_special(&self) -> u32 {
        self.special & !self.mask
    }

    #[inline(always)]
    fn matches(&self, v: u32) -> bool {
        (v & !self.mask) == self.masked_special()
    }

    /// The replacement value: explicit, or promoted from the first non-missing element.
    fn replacement(&self, data: &[u32]) -> u32 {
        match self.replace {
            Some(r) => r,
            None => {
                let mut good = data[0];
                for &v in data {
                    good = v;
                    if !self.matches(v) {
                        break;
                    }
                }
                good
            }
        }
    }
}

/// Replace every missing element of `data` with the replacement value, in place.
///
/// Returns the number of elements examined. A mask of all ones (everything ignored) or a missing
/// replacement makes the request meaningless and nothing is done.
pub fn replace_missing(data: &mut [u32], missing: &MissingSpec) -> usize {
    if missing.mask == 0xffff_ffff {
        return 0;
    }
    let repl = match missing.replace {
        Some(r) => r,
        None => return 0,
    };
    for v in data.iter_mut() {
        if missing.matches(*v) {
            *v = repl;
        }
    }
    data.len()
}

/// Extrema of an unsigned 32-bit integer array.
pub fn uint32_extrema(data: &[u32]) -> Extrema {
    uint32_extrema_missing(data, None)
}

/// Extrema of an unsigned 32-bit integer array, missing values accounted for.
pub fn uint32_extrema_missing(data: &[u32], missing: Option<&MissingSpec>) -> Extrema {
    let mut mina = u32::MAX;
    let mut min0 = u32::MAX;
    let mut maxa = 0u32;

    // A mask of all ones would match everything; that disables the check.
    let repl = missing.filter(|m| m.mask != u32::MAX).map(|m| (m, m.replacement(data)));
    for &v in data {
        let tu = match repl {
            Some((m, good)) if m.matches(v) => good,
            _ => v,
        };
        let t0 = if tu == 0 { 0xffff_fffe } else { tu };
        mina = mina.min(tu);
        min0 = min0.min(t0);
        maxa = maxa.max(tu);
    }

    // Signed extrema make no sense for unsigned data; flag everything non-negative.
    Extrema { mins: 0, maxs: 0, mina, min0, maxa, allp: true, allm: false }
}

/// Extrema of a signed 32-bit integer array.
pub fn int32_extrema(data: &[i32]) -> Extrema {
    int32_extrema_missing(data, None)
}

/// Extrema of a signed 32-bit integer array, missing values accounted for.
pub fn int32_extrema_missing(data: &[i32], missing: Option<&MissingSpec>) -> Extrema {
    let mut mina = u32::MAX;
    let mut min0 = u32::MAX;
    let mut maxs = i32::MIN;
    let mut mins = i32::MAX;

    let udata = bytemuck::cast_slice::<i32, u32>(data);
    let repl =
        missing.filter(|m| m.mask != u32::MAX).map(|m| (m, m.replacement(udata) as i32));
    for &v in data {
        let ts = match repl {
            Some((m, good)) if m.matches(v as u32) => good,
            _ => v,
        };
        let tu = ts.unsigned_abs();
        let t0 = if tu == 0 { 0xffff_fffe } else { tu };
        mina = mina.min(tu);
        min0 = min0.min(t0);
        maxs = maxs.max(ts);
        mins = mins.min(ts);
    }

    let maxa = mins.unsigned_abs().max(maxs.unsigned_abs());
    Extrema { mins, maxs, mina, min0, maxa, allp: mins >= 0, allm: maxs < 0 }
}

/// Extrema of an IEEE-754 binary32 array.
pub fn ieee32_extrema(data: &[f32]) -> Extrema {
    ieee32_extrema_missing(data, None)
}

/// Extrema of an IEEE-754 binary32 array, missing values accounted for.
pub fn ieee32_extrema_missing(data: &[f32], missing: Option<&MissingSpec>) -> Extrema {
    let udata = bytemuck::cast_slice::<f32, u32>(data);

    let mut mina = u32::MAX;
    let mut min0 = 0x7fff_ffff;
    let mut maxs = i32::MIN;
    let mut mins = i32::MAX;

    let repl = missing.filter(|m| m.mask != u32::MAX).map(|m| (m, m.replacement(udata)));
    for &w in udata {
        let tu = match repl {
            Some((m, good)) if m.matches(w) => good,
            _ => w,
        };
        let ts = ieee::fake_signed(tu);
        let ta = ieee::abs_bits(tu);
        let t0 = if ta == 0 { 0x7fff_ffff } else { ta };
        mina = mina.min(ta);
        min0 = min0.min(t0);
        maxs = maxs.max(ts);
        mins = mins.min(ts);
    }

    // Back from the order-preserving transform to IEEE bit patterns.
    let mins = ieee::from_fake_signed(mins) as i32;
    let maxs = ieee::from_fake_signed(maxs) as i32;
    let maxa = ieee::abs_bits(mins as u32).max(ieee::abs_bits(maxs as u32));
    Extrema {
        mins,
        maxs,
        mina,
        min0,
        maxa,
        allp: !ieee::is_negative(mins as u32),
        allm: ieee::is_negative(maxs as u32),
    }
}

/// Magnitude-only scan of an IEEE-754 binary32 array.
///
/// Tracks the smallest and largest absolute values and detects the all-negative and
/// all-non-negative conditions with running AND / OR folds over the raw words; `+0.0` does not
/// break an all-negative run. The signed extrema fields are dummies (`1.0` / `-1.0`) as in a
/// pure magnitude scan they carry no information.
pub fn ieee32_extrema_abs(data: &[f32]) -> Extrema {
    let udata = bytemuck::cast_slice::<f32, u32>(data);

    let mut ands = udata[0];
    let mut ors = udata[0];
    let mut mina = ieee::abs_bits(udata[0]);
    let mut maxa = mina;

    for &w in udata {
        let ta = if w == 0 { 0x8000_0000 } else { w };
        ands |= ta;
        ors |= w;
        let to = ieee::abs_bits(w);
        mina = mina.min(to);
        maxa = maxa.max(to);
    }

    Extrema {
        mins: 1.0f32.to_bits() as i32,
        maxs: (-1.0f32).to_bits() as i32,
        mina,
        min0: 0,
        maxa,
        allp: (ors >> 31) == 0,
        allm: (ands >> 31) == 1,
    }
}
