// Gridpack
// Copyright (c) 2024 The Gridpack Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Pseudo-logarithmic quantization for values spanning many orders of magnitude.
//!
//! The IEEE bit pattern of a positive float is a piecewise-linear approximation of its base-2
//! logarithm, so quantizing the bit-pattern domain linearly yields near-constant *relative*
//! error across the whole exponent span. The quantization domain runs from the exponent of the
//! smallest non-zero magnitude to one past the largest.
//!
//! The `qzero` parameter marks the magnitude below which values stop being significant. A
//! negative `qzero` requests clipping: magnitudes below `|qzero|` quantize to zero and restore
//! as exactly `0.0`. A non-negative `qzero` keeps the full span encoded; a quantized zero then
//! restores to the smallest value of the domain.

use gridpack_core::analysis::Extrema;
use gridpack_core::errors::{invalid_input_error, Result};
use gridpack_core::util::bits::rmask32;
use gridpack_core::util::ieee;

/// Descriptor of a pseudo-logarithmic quantization.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct FakeLog {
    /// The `qzero` parameter, as IEEE bits (its sign selects the zero-clipping behaviour).
    pub qmin: u32,
    /// Biased exponent of the largest magnitude.
    pub emax: u8,
    /// Biased exponent of the smallest non-zero magnitude.
    pub emin: u8,
    /// Biased exponent of `|qzero|`, the smallest significant magnitude.
    pub elow: u8,
    /// Total bits per packed value, sign included.
    pub nbts: u8,
    /// True when `emin < elow`: clipping may occur.
    pub clip: bool,
    /// All values are >= 0.
    pub allp: bool,
    /// All values are < 0.
    pub allm: bool,
}

impl FakeLog {
    /// Build a descriptor from an extrema record and the target bit width.
    pub fn prep(l: &Extrema, npts: usize, nbits: u32, qzero: f32) -> Result<FakeLog> {
        if npts == 0 {
            return invalid_input_error("quant: empty input array");
        }
        if nbits == 0 {
            return invalid_input_error("quant: fake-log needs a bit width");
        }
        let pos_neg = !(l.allp || l.allm);
        if nbits.min(31) <= pos_neg as u32 {
            return invalid_input_error("quant: bit width leaves no magnitude bits");
        }

        let emax = ieee::biased_exponent(l.maxa) as u8;
        // min0 saturates when the array is all zeros; pin the domain at zero then.
        let emin = if l.maxa == 0 { 0 } else { ieee::biased_exponent(l.min0) as u8 };
        let elow = if qzero != 0.0 {
            ieee::biased_exponent(ieee::abs_bits(qzero.to_bits())) as u8
        }
        else {
            emin
        };

        Ok(FakeLog {
            qmin: qzero.to_bits(),
            emax,
            emin,
            elow,
            nbts: nbits.min(31) as u8,
            clip: emin < elow,
            allp: l.allp,
            allm: l.allm,
        })
    }

    fn pos_neg(&self) -> bool {
        !(self.allp || self.allm)
    }

    fn base(&self) -> u32 {
        u32::from(self.emin) << 23
    }

    /// Bit-pattern width of the quantization domain.
    fn span(&self) -> u32 {
        (u32::from(self.emax).saturating_sub(u32::from(self.emin)) + 1) << 23
    }

    fn scale(&self) -> f64 {
        let magbits = u32::from(self.nbts) - self.pos_neg() as u32;
        f64::from(rmask32(magbits)) / f64::from(self.span())
    }

    /// True when quantized zeros restore as exact zero.
    fn clips_to_zero(&self) -> bool {
        f32::from_bits(self.qmin) < 0.0
    }

    /// Pack the array into per-element integers of `nbts` bits.
    pub fn quantize(&self, f: &[f32], q: &mut [u32]) {
        let pos_neg = self.pos_neg();
        let magbits = u32::from(self.nbts) - pos_neg as u32;
        let limit = rmask32(magbits);
        let base = self.base();
        let scale = self.scale();
        let cutoff = if self.clips_to_zero() { u32::from(self.elow) << 23 } else { 0 };

        for (v, out) in f.iter().zip(q.iter_mut()) {
            let u = v.to_bits();
            let sign = u >> 31;
            let mag = ieee::abs_bits(u);
            if mag < cutoff {
                *out = 0;
                continue;
            }
            let l = mag.saturating_sub(base);
            let t = ((f64::from(l) * scale + 0.5) as u32).min(limit);
            *out = if pos_neg { (t << 1) | sign } else { t };
        }
    }

    /// Restore the array from packed integers.
    pub fn restore(&self, f: &mut [f32], q: &[u32]) {
        let pos_neg = self.pos_neg();
        let base = self.base();
        let span = self.span();
        let scale = self.scale();
        let zero_restores_zero = self.clips_to_zero() || self.emax == 0;

        for (out, &qv) in f.iter_mut().zip(q.iter()) {
            let (t, sign) = if pos_neg { (qv >> 1, qv & 1) } else { (qv, self.allm as u32) };
            let mag = if t == 0 {
                if zero_restores_zero {
                    0
                }
                else {
                    base
                }
            }
            else {
                let l = ((f64::from(t) / scale) as u32).min(span);
                (base + l).min(ieee::ABS_MASK)
            };
            *out = f32::from_bits(mag | (sign << 31));
        }
    }

    /// Serialize to the 64-bit wire value.
    pub fn to_bits(&self) -> u64 {
        u64::from(self.qmin)
            | (u64::from(self.emax) << 32)
            | (u64::from(self.emin) << 40)
            | (u64::from(self.elow) << 48)
            | (u64::from(self.nbts & 0x1f) << 56)
            | ((self.clip as u64) << 61)
            | ((self.allp as u64) << 62)
            | ((self.allm as u64) << 63)
    }

    /// Deserialize from the 64-bit wire value.
    pub fn from_bits(bits: u64) -> FakeLog {
        FakeLog {
            qmin: bits as u32,
            emax: ((bits >> 32) & 0xff) as u8,
            emin: ((bits >> 40) & 0xff) as u8,
            elow: ((bits >> 48) & 0xff) as u8,
            nbts: ((bits >> 56) & 0x1f) as u8,
            clip: (bits >> 61) & 1 != 0,
            allp: (bits >> 62) & 1 != 0,
            allm: (bits >> 63) & 1 != 0,
        }
    }
}
