// Gridpack
// Copyright (c) 2024 The Gridpack Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The quantizer pipeline filter, id 100.
//!
//! Forward metadata: `[quantum (f32 bits), nbits, mode code]`. The buffer is quantized in place
//! (floats become packed integers of the same word count) and the inverse record carries the
//! mode code and the 64-bit descriptor. Reverse restores the floats from the descriptor alone.

use log::warn;

use gridpack_core::array::ArrayDescriptor;
use gridpack_core::errors::{invalid_input_error, Result};
use gridpack_core::io::WordStream;
use gridpack_core::pipeline::{FilterMeta, PipeBuffer, PipeFilter};

use crate::{ieee_quantize, ieee_restore, QuantDescriptor, QuantMode, QuantOptions};

/// Id of the quantizer filter.
pub const FILTER_ID_QUANT: u8 = 100;

/// Quantizes a float buffer into packed integers, reversibly.
pub struct QuantFilter;

impl QuantFilter {
    fn params(meta: &FilterMeta) -> Result<QuantOptions> {
        if meta.args.len() < 3 {
            return invalid_input_error("quant filter: metadata needs quantum, nbits and mode");
        }
        let quantum = f32::from_bits(meta.args[0]);
        let nbits = meta.args[1];
        let mode = QuantMode::from_code(meta.args[2])?;
        if nbits == 0 && quantum <= 0.0 {
            return invalid_input_error("quant filter: need a bit width or a quantum");
        }
        if nbits > 31 {
            return invalid_input_error("quant filter: bit width exceeds 31");
        }
        Ok(QuantOptions { mode: Some(mode), nbits, quantum, qzero: quantum, missing: None })
    }
}

impl PipeFilter for QuantFilter {
    fn id(&self) -> u8 {
        FILTER_ID_QUANT
    }

    fn name(&self) -> &'static str {
        "quant"
    }

    fn validate(&self, meta: &FilterMeta) -> Result<usize> {
        Self::params(meta)?;
        // Prologue, mode code, and the two descriptor halves.
        Ok(4)
    }

    fn forward_size(&self, _meta: &FilterMeta, desc: &ArrayDescriptor) -> Result<usize> {
        Ok(desc.len() * 4)
    }

    fn forward(
        &self,
        meta: &FilterMeta,
        desc: &ArrayDescriptor,
        buf: &mut PipeBuffer,
        out: &mut WordStream,
    ) -> Result<usize> {
        let opts = Self::params(meta)?;
        let data = buf.used_words_mut();
        let floats: &[f32] = bytemuck::cast_slice(data);

        let mut q = vec![0u32; floats.len()];
        let qdesc = ieee_quantize(floats, &mut q, &opts)?;
        data.copy_from_slice(&q);

        let bits = qdesc.to_bits();
        let inv = [qdesc.mode().code(), (bits >> 32) as u32, bits as u32];
        FilterMeta::with_args(self.id(), &inv).write_to(out)?;
        Ok(desc.len() * 4)
    }

    fn reverse(
        &self,
        meta: &FilterMeta,
        desc: &ArrayDescriptor,
        buf: &mut PipeBuffer,
    ) -> Result<usize> {
        if meta.args.len() < 3 {
            return invalid_input_error("quant filter: truncated inverse metadata");
        }
        let mode = QuantMode::from_code(meta.args[0])?;
        let bits = (u64::from(meta.args[1]) << 32) | u64::from(meta.args[2]);
        let qdesc = QuantDescriptor::from_bits(mode, bits);

        if buf.used() != desc.len() {
            warn!("quant filter: payload length {} does not match array {}", buf.used(), desc.len());
        }
        let data = buf.used_words_mut();
        let q = data.to_vec();
        let floats: &mut [f32] = bytemuck::cast_slice_mut(data);
        ieee_restore(floats, &q, &qdesc)?;
        Ok(desc.len() * 4)
    }
}
