// Gridpack
// Copyright (c) 2024 The Gridpack Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The scale-and-offset filter, id 254.
//!
//! Forward multiplies every 32-bit element by a factor and adds an offset; reverse undoes both.
//! Mostly useful for exercising chain plumbing, which is exactly how the test suites use it.

use crate::array::ArrayDescriptor;
use crate::errors::{invalid_input_error, Result};
use crate::io::WordStream;
use crate::pipeline::{FilterMeta, PipeBuffer, PipeFilter};

/// Id of the scale-and-offset filter.
pub const FILTER_ID_SCALE_OFFSET: u8 = 254;

/// A reversible integer scale-and-offset transform.
pub struct ScaleOffsetFilter;

impl ScaleOffsetFilter {
    fn params(meta: &FilterMeta) -> Result<(i32, i32)> {
        if meta.args.len() < 2 {
            return invalid_input_error("scale-offset: metadata needs factor and offset");
        }
        let factor = meta.args[0] as i32;
        let offset = meta.args[1] as i32;
        if factor == 0 {
            return invalid_input_error("scale-offset: factor must not be zero");
        }
        Ok((factor, offset))
    }
}

impl PipeFilter for ScaleOffsetFilter {
    fn id(&self) -> u8 {
        FILTER_ID_SCALE_OFFSET
    }

    fn name(&self) -> &'static str {
        "scale-offset"
    }

    fn validate(&self, meta: &FilterMeta) -> Result<usize> {
        Self::params(meta)?;
        Ok(3)
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
        let (factor, offset) = Self::params(meta)?;
        for w in buf.used_words_mut() {
            *w = ((*w as i32).wrapping_mul(factor).wrapping_add(offset)) as u32;
        }
        FilterMeta::with_args(self.id(), &[factor as u32, offset as u32]).write_to(out)?;
        Ok(desc.len() * 4)
    }

    fn reverse(
        &self,
        meta: &FilterMeta,
        desc: &ArrayDescriptor,
        buf: &mut PipeBuffer,
    ) -> Result<usize> {
        let (factor, offset) = Self::params(meta)?;
        for w in buf.used_words_mut() {
            *w = ((*w as i32).wrapping_sub(offset) / factor) as u32;
        }
        Ok(desc.len() * 4)
    }
}
