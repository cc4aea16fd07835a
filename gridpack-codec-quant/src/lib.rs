// Gridpack
// Copyright (c) 2024 The Gridpack Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Quantizers for IEEE-754 binary32 arrays.
//!
//! Four mutually independent models share a three-step contract: `prep` turns an extrema record
//! and a user preference (target bit width, or allowed error) into a descriptor; `quantize`
//! packs the array into per-element integers; `restore` rebuilds the array from the integers
//! and the descriptor alone.
//!
//! Every descriptor serializes to a single 64-bit value. The wire value carries no explicit
//! type tag: callers are responsible for pairing each descriptor with the correct inverse.

#![warn(rust_2018_idioms)]
#![forbid(unsafe_code)]
#![allow(clippy::comparison_chain)]
#![allow(clippy::excessive_precision)]
#![allow(clippy::identity_op)]
#![allow(clippy::manual_range_contains)]

use gridpack_core::analysis::{ieee32_extrema_missing, MissingSpec};
use gridpack_core::errors::{invalid_input_error, Result};

mod fakelog;
mod filter;
mod linear;

pub use fakelog::FakeLog;
pub use filter::{QuantFilter, FILTER_ID_QUANT};
pub use linear::{Linear0, Linear1, Linear2};

/// Selects one of the four quantization models.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum QuantMode {
    /// Linear type 0: constant quantum, offset from the smallest magnitude.
    #[default]
    Linear0,
    /// Linear type 1: power-of-two quantum, quantum-aligned offset.
    Linear1,
    /// Linear type 2: mantissas normalized to the largest exponent.
    Linear2,
    /// Pseudo-logarithmic quantization for wide dynamic ranges.
    FakeLog,
}

impl QuantMode {
    /// A stable small integer code used on the wire.
    pub fn code(&self) -> u32 {
        match *self {
            QuantMode::Linear0 => 0,
            QuantMode::Linear1 => 1,
            QuantMode::Linear2 => 2,
            QuantMode::FakeLog => 3,
        }
    }

    /// The inverse of [`QuantMode::code`].
    pub fn from_code(code: u32) -> Result<QuantMode> {
        match code {
            0 => Ok(QuantMode::Linear0),
            1 => Ok(QuantMode::Linear1),
            2 => Ok(QuantMode::Linear2),
            3 => Ok(QuantMode::FakeLog),
            _ => invalid_input_error("quant: invalid mode code"),
        }
    }
}

/// Options controlling quantization.
#[derive(Copy, Clone, Debug, Default)]
pub struct QuantOptions {
    /// The model to use. `None` selects linear type 0.
    pub mode: Option<QuantMode>,
    /// Target bits per value (0 lets `quantum` drive the choice).
    pub nbits: u32,
    /// Allowed quantization step (0.0 lets `nbits` drive the choice).
    pub quantum: f32,
    /// Fake-log only: magnitudes below `|qzero|` are insignificant; a negative value clips them
    /// to exact zero on restore.
    pub qzero: f32,
    /// Optional missing-value handling for the analysis pass.
    pub missing: Option<MissingSpec>,
}

/// A prepared quantization descriptor, tagged by model.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum QuantDescriptor {
    Linear0(Linear0),
    Linear1(Linear1),
    Linear2(Linear2),
    FakeLog(FakeLog),
}

impl QuantDescriptor {
    /// The model this descriptor belongs to.
    pub fn mode(&self) -> QuantMode {
        match *self {
            QuantDescriptor::Linear0(_) => QuantMode::Linear0,
            QuantDescriptor::Linear1(_) => QuantMode::Linear1,
            QuantDescriptor::Linear2(_) => QuantMode::Linear2,
            QuantDescriptor::FakeLog(_) => QuantMode::FakeLog,
        }
    }

    /// Serialize to the 64-bit wire value. The value carries no type tag.
    pub fn to_bits(&self) -> u64 {
        match *self {
            QuantDescriptor::Linear0(d) => d.to_bits(),
            QuantDescriptor::Linear1(d) => d.to_bits(),
            QuantDescriptor::Linear2(d) => d.to_bits(),
            QuantDescriptor::FakeLog(d) => d.to_bits(),
        }
    }

    /// Deserialize a wire value under the interpretation the caller knows to be correct.
    pub fn from_bits(mode: QuantMode, bits: u64) -> QuantDescriptor {
        match mode {
            QuantMode::Linear0 => QuantDescriptor::Linear0(Linear0::from_bits(bits)),
            QuantMode::Linear1 => QuantDescriptor::Linear1(Linear1::from_bits(bits)),
            QuantMode::Linear2 => QuantDescriptor::Linear2(Linear2::from_bits(bits)),
            QuantMode::FakeLog => QuantDescriptor::FakeLog(FakeLog::from_bits(bits)),
        }
    }
}

/// Quantize a float array into `q` and return the descriptor driving the inverse.
pub fn ieee_quantize(f: &[f32], q: &mut [u32], opts: &QuantOptions) -> Result<QuantDescriptor> {
    if f.is_empty() {
        return invalid_input_error("quant: empty input array");
    }
    if q.len() != f.len() {
        return invalid_input_error("quant: output length does not match input");
    }

    let l = ieee32_extrema_missing(f, opts.missing.as_ref());

    match opts.mode.unwrap_or_default() {
        QuantMode::Linear0 => {
            let d = Linear0::prep(&l, f.len(), opts.nbits, opts.quantum)?;
            d.quantize(f, q);
            Ok(QuantDescriptor::Linear0(d))
        }
        QuantMode::Linear1 => {
            let d = Linear1::prep(&l, f.len(), opts.nbits, opts.quantum)?;
            d.quantize(f, q);
            Ok(QuantDescriptor::Linear1(d))
        }
        QuantMode::Linear2 => {
            let d = Linear2::prep(&l, f.len(), opts.nbits, opts.quantum)?;
            d.quantize(f, q);
            Ok(QuantDescriptor::Linear2(d))
        }
        QuantMode::FakeLog => {
            let d = FakeLog::prep(&l, f.len(), opts.nbits, opts.qzero)?;
            d.quantize(f, q);
            Ok(QuantDescriptor::FakeLog(d))
        }
    }
}

/// Restore a float array from quantized integers and a descriptor.
pub fn ieee_restore(f: &mut [f32], q: &[u32], desc: &QuantDescriptor) -> Result<()> {
    if f.len() != q.len() {
        return invalid_input_error("quant: output length does not match input");
    }
    match *desc {
        QuantDescriptor::Linear0(d) => d.restore(f, q),
        QuantDescriptor::Linear1(d) => d.restore(f, q),
        QuantDescriptor::Linear2(d) => d.restore(f, q),
        QuantDescriptor::FakeLog(d) => d.restore(f, q),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verify_default_mode_is_linear0() {
        let f = [1.0f32, 2.0, 3.0];
        let mut q = [0u32; 3];
        let d = ieee_quantize(&f, &mut q, &QuantOptions { nbits: 8, ..Default::default() });
        assert!(matches!(d.unwrap(), QuantDescriptor::Linear0(_)));
    }

    #[test]
    fn verify_bad_arguments() {
        let mut q = [0u32; 3];
        assert!(ieee_quantize(&[], &mut q, &QuantOptions::default()).is_err());

        let f = [1.0f32, 2.0, 3.0];
        let mut short = [0u32; 2];
        let opts = QuantOptions { nbits: 8, ..Default::default() };
        assert!(ieee_quantize(&f, &mut short, &opts).is_err());

        // Neither a bit width nor a quantum: nothing to go on.
        assert!(ieee_quantize(&f, &mut q, &QuantOptions::default()).is_err());
    }

    #[test]
    fn verify_wire_round_trip() {
        let f: Vec<f32> = (0..64).map(|i| 0.25 * i as f32 - 3.0).collect();
        let mut q = vec![0u32; 64];
        for mode in
            [QuantMode::Linear0, QuantMode::Linear1, QuantMode::Linear2, QuantMode::FakeLog]
        {
            let opts = QuantOptions { mode: Some(mode), nbits: 12, ..Default::default() };
            let d = ieee_quantize(&f, &mut q, &opts).unwrap();
            let bits = d.to_bits();
            assert_eq!(QuantDescriptor::from_bits(mode, bits), d);
            assert_eq!(d.mode(), mode);
        }
    }
}
