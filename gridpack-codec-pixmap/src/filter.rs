// Gridpack
// Copyright (c) 2024 The Gridpack Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The presence-pixmap pipeline filter, id 120.
//!
//! Forward metadata: `[special, mmask, plug]`. The filter flags every element matching the
//! special pattern, substitutes `plug` for them so downstream transforms see a smooth field,
//! and records the RLE-encoded pixmap in its inverse metadata. Reverse plants the special value
//! back at every flagged position.

use log::trace;

use gridpack_core::array::ArrayDescriptor;
use gridpack_core::errors::{invalid_input_error, Result};
use gridpack_core::io::WordStream;
use gridpack_core::pipeline::{FilterMeta, PipeBuffer, PipeFilter};

use crate::pixmap::Pixmap;

/// Id of the presence-pixmap filter.
pub const FILTER_ID_PIXMAP: u8 = 120;

/// Records and restores special-valued elements through a pipeline run.
pub struct PixmapFilter;

impl PixmapFilter {
    fn params(meta: &FilterMeta) -> Result<(u32, u32, u32)> {
        if meta.args.len() < 3 {
            return invalid_input_error("pixmap filter: metadata needs special, mask and plug");
        }
        if meta.args[1] == u32::MAX {
            return invalid_input_error("pixmap filter: mask ignores every bit");
        }
        Ok((meta.args[0], meta.args[1], meta.args[2]))
    }
}

impl PipeFilter for PixmapFilter {
    fn id(&self) -> u8 {
        FILTER_ID_PIXMAP
    }

    fn name(&self) -> &'static str {
        "pixmap"
    }

    fn validate(&self, meta: &FilterMeta) -> Result<usize> {
        Self::params(meta)?;
        // Fixed part of the inverse record; the encoded map words come on top of this.
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
        let (special, mmask, plug) = Self::params(meta)?;
        let data = buf.used_words_mut();

        let map = Pixmap::from_eq_mask(data, special, mmask);
        let hint = map.encode_hint()?;
        let encoded = map.rle_encode(Some(hint))?;
        trace!(
            "pixmap filter: {} of {} elements special, {} RLE bits",
            map.popcount(),
            map.len(),
            encoded.rle_len()
        );

        // Hide the special values from downstream filters.
        map.restore_into(data, plug)?;

        let rle_words = (encoded.rle_len() + 4 + 1 + 31) / 32;
        let mut args: Vec<u32> = Vec::with_capacity(3 + rle_words);
        args.push(special);
        args.push(encoded.len() as u32);
        args.push(encoded.rle_len() as u32);
        args.extend_from_slice(&encoded.as_words()[..rle_words]);
        FilterMeta::with_args(self.id(), &args).write_to(out)?;
        Ok(desc.len() * 4)
    }

    fn reverse(
        &self,
        meta: &FilterMeta,
        desc: &ArrayDescriptor,
        buf: &mut PipeBuffer,
    ) -> Result<usize> {
        if meta.args.len() < 3 {
            return invalid_input_error("pixmap filter: truncated inverse metadata");
        }
        let special = meta.args[0];
        let elem = meta.args[1] as usize;
        let nrle = meta.args[2] as usize;
        if elem != desc.len() {
            return invalid_input_error("pixmap filter: map does not match the descriptor");
        }

        let map = Pixmap::from_parts(elem, nrle, &meta.args[3..]);
        map.restore_into(buf.used_words_mut(), special)?;
        Ok(desc.len() * 4)
    }
}
