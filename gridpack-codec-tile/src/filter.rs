// Gridpack
// Copyright (c) 2024 The Gridpack Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The tile codec pipeline filter, id 110.
//!
//! Forward tiles the buffer as 8x8 integer tiles into a big-endian bit stream that replaces the
//! payload; the inverse record carries the encoded bit count. Reverse rebuilds the array from
//! the tile stream.

use log::trace;

use gridpack_core::array::ArrayDescriptor;
use gridpack_core::errors::{decode_error, invalid_input_error, Result};
use gridpack_core::io::{BitStream, ByteOrder, StreamMode, WordStream};
use gridpack_core::pipeline::{FilterMeta, PipeBuffer, PipeFilter};

use crate::tile::{decode_as_tiles, encode_as_tiles};

/// Id of the tile codec filter.
pub const FILTER_ID_TILE: u8 = 110;

/// Encodes an integer buffer as minimum-bit tiles, reversibly.
pub struct TileFilter;

fn plane(desc: &ArrayDescriptor) -> (usize, usize) {
    let ni = desc.shape[0] as usize;
    let nj = desc.shape[1..].iter().map(|&n| n as usize).product::<usize>().max(1);
    (ni, nj)
}

fn worst_case_words(ni: usize, nj: usize) -> usize {
    // 33 bits per value, plus header, short width and minimum for every 8x8 tile.
    let ntiles = ((ni + 7) / 8) * ((nj + 7) / 8);
    (ni * nj * 33 + ntiles * 58 + 31) / 32 + 1
}

impl PipeFilter for TileFilter {
    fn id(&self) -> u8 {
        FILTER_ID_TILE
    }

    fn name(&self) -> &'static str {
        "tile"
    }

    fn validate(&self, _meta: &FilterMeta) -> Result<usize> {
        // Prologue plus the encoded bit count.
        Ok(2)
    }

    fn forward_size(&self, _meta: &FilterMeta, desc: &ArrayDescriptor) -> Result<usize> {
        let (ni, nj) = plane(desc);
        Ok(worst_case_words(ni, nj) * 4)
    }

    fn forward(
        &self,
        _meta: &FilterMeta,
        desc: &ArrayDescriptor,
        buf: &mut PipeBuffer,
        out: &mut WordStream,
    ) -> Result<usize> {
        let (ni, nj) = plane(desc);
        if buf.used() != ni * nj {
            return invalid_input_error("tile filter: buffer does not match the descriptor");
        }

        let data: Vec<i32> = buf.used_words().iter().map(|&w| w as i32).collect();
        let mut s = BitStream::new(
            ByteOrder::BigEndian,
            worst_case_words(ni, nj),
            StreamMode::Write,
        );
        let nbits = encode_as_tiles(&data, ni, ni, nj, &mut s)?;
        s.flush()?;
        trace!("tile filter: {} values -> {} bits", ni * nj, nbits);

        buf.replace(s.as_words());
        FilterMeta::with_args(self.id(), &[nbits]).write_to(out)?;
        Ok(buf.used() * 4)
    }

    fn reverse(
        &self,
        meta: &FilterMeta,
        desc: &ArrayDescriptor,
        buf: &mut PipeBuffer,
    ) -> Result<usize> {
        if meta.args.is_empty() {
            return invalid_input_error("tile filter: truncated inverse metadata");
        }
        let expected_bits = meta.args[0];
        let (ni, nj) = plane(desc);

        let mut s = BitStream::from_words(ByteOrder::BigEndian, buf.used_words().to_vec());
        let mut data = vec![0i32; ni * nj];
        let nbits = decode_as_tiles(&mut data, ni, ni, nj, &mut s)?;
        if nbits != expected_bits {
            return decode_error("tile filter: bit count does not match the record");
        }

        let words: Vec<u32> = data.iter().map(|&v| v as u32).collect();
        buf.replace(&words);
        Ok(buf.used() * 4)
    }
}
